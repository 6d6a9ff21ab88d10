//! Full-fidelity session snapshots and their delivery as a download.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::core::format;
use crate::error::StoreError;
use crate::session::analytics::{statistics, SessionStatistics};
use crate::session::record::AnalysisRecord;

pub const EXPORT_MIME: &str = "application/json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportMetadata {
    /// RFC 3339 time the snapshot was taken.
    pub export_date: String,
    pub total_analyses: usize,
    pub statistics: SessionStatistics,
}

/// Snapshot of every stored analysis plus derived statistics. Parsing the
/// JSON form back yields the same records in the same order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionExport {
    pub metadata: ExportMetadata,
    pub analyses: Vec<AnalysisRecord>,
}

impl SessionExport {
    pub fn new(analyses: Vec<AnalysisRecord>, exported_at: OffsetDateTime) -> Self {
        Self {
            metadata: ExportMetadata {
                export_date: format::format_rfc3339(exported_at),
                total_analyses: analyses.len(),
                statistics: statistics(&analyses),
            },
            analyses,
        }
    }

    pub fn from_json(raw: &str) -> Result<Self, StoreError> {
        serde_json::from_str(raw).map_err(|err| StoreError::Import(err.to_string()))
    }

    pub fn to_json_pretty(&self) -> Result<String, StoreError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// `session-<YYYY-MM-DD>.json`, dated by the export time.
    pub fn filename(&self) -> String {
        let date = self
            .metadata
            .export_date
            .split('T')
            .next()
            .unwrap_or("export");
        format!("session-{date}.json")
    }

    pub fn to_artifact(&self) -> Result<ExportArtifact, StoreError> {
        Ok(ExportArtifact {
            filename: self.filename(),
            mime: EXPORT_MIME,
            contents: self.to_json_pretty()?,
        })
    }
}

/// A named, downloadable document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportArtifact {
    pub filename: String,
    pub mime: &'static str,
    pub contents: String,
}

/// Hand the artifact to the user: a browser download on the web, a file in
/// the export directory on desktop. Returns the saved path when there is one.
pub fn deliver(artifact: &ExportArtifact) -> Result<Option<String>, StoreError> {
    #[cfg(target_arch = "wasm32")]
    {
        download_in_browser(artifact)?;
        Ok(None)
    }

    #[cfg(not(target_arch = "wasm32"))]
    {
        let dir = crate::core::platform::export_dir()?;
        deliver_to(&dir, artifact).map(Some)
    }
}

/// Write the artifact into `dir`, creating it if needed.
#[cfg(not(target_arch = "wasm32"))]
pub fn deliver_to(dir: &std::path::Path, artifact: &ExportArtifact) -> Result<String, StoreError> {
    use std::fs;

    let delivery_error = |err: std::io::Error| StoreError::Delivery(err.to_string());
    fs::create_dir_all(dir).map_err(delivery_error)?;
    let path = dir.join(&artifact.filename);
    fs::write(&path, artifact.contents.as_bytes()).map_err(delivery_error)?;
    tracing::debug!(path = %path.display(), "session export written");
    Ok(path.to_string_lossy().to_string())
}

#[cfg(target_arch = "wasm32")]
fn download_in_browser(artifact: &ExportArtifact) -> Result<(), StoreError> {
    use wasm_bindgen::{JsCast, JsValue};
    use web_sys::{Blob, BlobPropertyBag, HtmlAnchorElement, Url};

    let fail = |reason: &str| StoreError::Delivery(reason.to_string());

    let parts = js_sys::Array::new();
    parts.push(&JsValue::from_str(&artifact.contents));
    let opts = BlobPropertyBag::new();
    opts.set_type(artifact.mime);
    let blob = Blob::new_with_str_sequence_and_options(&parts, &opts)
        .map_err(|_| fail("Failed to create blob"))?;
    let url =
        Url::create_object_url_with_blob(&blob).map_err(|_| fail("Unable to create download"))?;

    let document = web_sys::window()
        .and_then(|w| w.document())
        .ok_or_else(|| fail("Document unavailable"))?;
    let anchor: HtmlAnchorElement = document
        .create_element("a")
        .map_err(|_| fail("Unable to create anchor"))?
        .dyn_into()
        .map_err(|_| fail("Anchor cast failed"))?;
    anchor.set_href(&url);
    anchor.set_download(&artifact.filename);
    anchor.style().set_property("display", "none").ok();

    document
        .body()
        .ok_or_else(|| fail("Missing body"))?
        .append_child(&anchor)
        .ok();
    anchor.click();
    anchor.remove();
    Url::revoke_object_url(&url).ok();
    Ok(())
}
