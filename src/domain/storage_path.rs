use std::fmt;

use uuid::Uuid;

const UPLOAD_PREFIX: &str = "financial_document_";
const UPLOAD_EXTENSION: &str = "pdf";

/// Location of a staged upload, relative to the staging store root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoragePath(String);

impl StoragePath {
    /// A fresh, collision-free path for a new upload.
    pub fn for_upload() -> Self {
        Self::for_file_id(Uuid::new_v4())
    }

    pub fn for_file_id(file_id: Uuid) -> Self {
        Self(format!("{}{}.{}", UPLOAD_PREFIX, file_id, UPLOAD_EXTENSION))
    }

    pub fn from_raw(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StoragePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
