//! Platform plumbing shared by the session store: persistence adapters,
//! the clock seam and timestamp formatting.

pub mod clock;
pub mod format;
pub mod platform;
pub mod storage;
