use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

pub const PDF_CONTENT_TYPE: &str = "application/pdf";

/// A user-selected document: display name, declared content type, and bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentFile {
    pub name: String,
    /// Declared MIME type. Empty when unknown.
    pub content_type: String,
    #[serde(skip)]
    pub bytes: Vec<u8>,
}

impl DocumentFile {
    /// Builds a document, deriving the declared type from the name.
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let name = name.into();
        let content_type = content_type_for_name(&name).to_string();
        Self {
            name,
            content_type,
            bytes,
        }
    }

    /// Overrides the declared content type.
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self
    }

    /// Reads a document from disk.
    pub async fn from_path(path: &Path) -> Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self::new(name, bytes))
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Declared type by extension. Only `.pdf` maps to the PDF type.
pub fn content_type_for_name(name: &str) -> &'static str {
    let ext = Path::new(name)
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase());

    match ext.as_deref() {
        Some("pdf") => PDF_CONTENT_TYPE,
        Some("txt") => "text/plain",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("html") | Some("htm") => "text/html",
        Some("json") => "application/json",
        _ => "",
    }
}
