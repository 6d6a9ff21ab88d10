//! Durable storage for the current target: `window.localStorage` in the
//! browser, a per-key file in the project data directory on desktop.

use crate::core::storage::Storage;
use crate::error::StorageError;

#[cfg(not(target_arch = "wasm32"))]
pub use native::{data_dir, export_dir, FileStorage};

#[cfg(target_arch = "wasm32")]
pub use web::LocalStorage;

#[cfg(not(target_arch = "wasm32"))]
pub type DefaultStorage = FileStorage;

#[cfg(target_arch = "wasm32")]
pub type DefaultStorage = LocalStorage;

/// Open the durable medium appropriate for this platform.
pub fn default_storage() -> Result<DefaultStorage, StorageError> {
    #[cfg(not(target_arch = "wasm32"))]
    {
        FileStorage::in_data_dir()
    }

    #[cfg(target_arch = "wasm32")]
    {
        LocalStorage::new()
    }
}

/// Short platform tag used in logs.
pub fn platform_string() -> &'static str {
    #[cfg(target_arch = "wasm32")]
    {
        "web"
    }

    #[cfg(not(target_arch = "wasm32"))]
    {
        "desktop"
    }
}

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use std::fs;
    use std::io::{self, Write};
    use std::path::{Path, PathBuf};

    use super::*;

    fn project_dirs() -> Result<directories::ProjectDirs, StorageError> {
        directories::ProjectDirs::from("com", "Credence", "Credence").ok_or_else(|| {
            StorageError::ReadFailure {
                key: String::new(),
                reason: "Unable to determine data directory".to_string(),
            }
        })
    }

    pub fn data_dir() -> Result<PathBuf, StorageError> {
        Ok(project_dirs()?.data_dir().to_path_buf())
    }

    pub fn export_dir() -> Result<PathBuf, StorageError> {
        Ok(project_dirs()?.data_dir().join("exports"))
    }

    /// Stores each key as `<dir>/<encoded key>.json`. ASCII letters, digits
    /// and `-` are kept; every other byte becomes `_` plus two hex digits, so
    /// distinct keys never share a file.
    #[derive(Debug, Clone)]
    pub struct FileStorage {
        dir: PathBuf,
        quota_bytes: Option<usize>,
    }

    impl FileStorage {
        pub fn new(dir: impl Into<PathBuf>) -> Self {
            Self {
                dir: dir.into(),
                quota_bytes: None,
            }
        }

        pub fn in_data_dir() -> Result<Self, StorageError> {
            Ok(Self::new(data_dir()?))
        }

        /// Refuse single writes larger than `bytes`.
        pub fn with_quota(mut self, bytes: usize) -> Self {
            self.quota_bytes = Some(bytes);
            self
        }

        pub fn dir(&self) -> &Path {
            &self.dir
        }

        pub fn path_for(&self, key: &str) -> PathBuf {
            let mut name = String::with_capacity(key.len());
            for byte in key.bytes() {
                if byte.is_ascii_alphanumeric() || byte == b'-' {
                    name.push(char::from(byte));
                } else {
                    name.push_str(&format!("_{byte:02X}"));
                }
            }
            self.dir.join(format!("{name}.json"))
        }

        fn write_atomically(&self, path: &Path, value: &str) -> io::Result<()> {
            fs::create_dir_all(&self.dir)?;
            let tmp = path.with_extension("json.tmp");
            let mut file = fs::File::create(&tmp)?;
            file.write_all(value.as_bytes())?;
            file.sync_all()?;
            fs::rename(&tmp, path)
        }
    }

    impl Storage for FileStorage {
        fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
            match fs::read_to_string(self.path_for(key)) {
                Ok(contents) => Ok(Some(contents)),
                Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
                Err(err) => Err(StorageError::ReadFailure {
                    key: key.to_string(),
                    reason: err.to_string(),
                }),
            }
        }

        fn write(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
            if let Some(limit) = self.quota_bytes {
                if value.len() > limit {
                    return Err(StorageError::CapacityExceeded {
                        key: key.to_string(),
                        attempted: value.len(),
                        limit: Some(limit),
                    });
                }
            }
            let path = self.path_for(key);
            self.write_atomically(&path, value)
                .map_err(|err| StorageError::WriteFailure {
                    key: key.to_string(),
                    reason: err.to_string(),
                })
        }

        fn remove(&mut self, key: &str) -> Result<(), StorageError> {
            match fs::remove_file(self.path_for(key)) {
                Ok(()) => Ok(()),
                Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
                Err(err) => Err(StorageError::WriteFailure {
                    key: key.to_string(),
                    reason: err.to_string(),
                }),
            }
        }
    }

}

#[cfg(target_arch = "wasm32")]
mod web {
    use wasm_bindgen::{JsCast, JsValue};

    use super::*;

    /// `window.localStorage`.
    #[derive(Debug, Clone)]
    pub struct LocalStorage {
        inner: web_sys::Storage,
    }

    impl LocalStorage {
        pub fn new() -> Result<Self, StorageError> {
            let unavailable = |reason: &str| StorageError::ReadFailure {
                key: String::new(),
                reason: reason.to_string(),
            };
            let window = web_sys::window().ok_or_else(|| unavailable("window unavailable"))?;
            let inner = window
                .local_storage()
                .map_err(|err| unavailable(&describe(&err)))?
                .ok_or_else(|| unavailable("localStorage unavailable"))?;
            Ok(Self { inner })
        }
    }

    impl Storage for LocalStorage {
        fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
            self.inner
                .get_item(key)
                .map_err(|err| StorageError::ReadFailure {
                    key: key.to_string(),
                    reason: describe(&err),
                })
        }

        fn write(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
            self.inner.set_item(key, value).map_err(|err| {
                if is_quota_error(&err) {
                    StorageError::CapacityExceeded {
                        key: key.to_string(),
                        attempted: value.len(),
                        limit: None,
                    }
                } else {
                    StorageError::WriteFailure {
                        key: key.to_string(),
                        reason: describe(&err),
                    }
                }
            })
        }

        fn remove(&mut self, key: &str) -> Result<(), StorageError> {
            self.inner
                .remove_item(key)
                .map_err(|err| StorageError::WriteFailure {
                    key: key.to_string(),
                    reason: describe(&err),
                })
        }
    }

    // Firefox reports the legacy name.
    fn is_quota_error(err: &JsValue) -> bool {
        err.dyn_ref::<web_sys::DomException>()
            .map(|exception| {
                let name = exception.name();
                name == "QuotaExceededError" || name == "NS_ERROR_DOM_QUOTA_REACHED"
            })
            .unwrap_or(false)
    }

    fn describe(err: &JsValue) -> String {
        err.dyn_ref::<web_sys::DomException>()
            .map(|exception| format!("{}: {}", exception.name(), exception.message()))
            .or_else(|| err.as_string())
            .unwrap_or_else(|| "unknown JavaScript error".to_string())
    }
}
