//! PDF validation
//! Advisory client-side check that a selected document is a loadable PDF

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::ValidationError;
use crate::types::{DocumentFile, PDF_CONTENT_TYPE};

/// Facts gathered from a PDF that passed validation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PdfAcceptance {
    pub version: String,
    pub page_count: usize,
}

/// Checks presence, declared type, and parseability, in that order.
///
/// Image-only documents are accepted; nothing here looks at page content.
pub fn validate_pdf(file: Option<&DocumentFile>) -> Result<PdfAcceptance, ValidationError> {
    let file = file.ok_or(ValidationError::NoFile)?;

    if file.content_type != PDF_CONTENT_TYPE {
        debug!(name = %file.name, content_type = %file.content_type, "rejected non-PDF type");
        return Err(ValidationError::NotPdf {
            content_type: file.content_type.clone(),
        });
    }

    parse(&file.bytes).map_err(|e| {
        warn!(name = %file.name, error = %e, "PDF failed to load");
        e
    })
}

#[cfg(feature = "pdf-parse")]
fn parse(bytes: &[u8]) -> Result<PdfAcceptance, ValidationError> {
    let doc = lopdf::Document::load_from(bytes).map_err(|e| ValidationError::Unparseable {
        reason: e.to_string(),
    })?;

    if !doc.trailer.has(b"Root") {
        return Err(ValidationError::Unparseable {
            reason: "trailer has no document catalog".into(),
        });
    }

    Ok(PdfAcceptance {
        version: doc.version.clone(),
        page_count: doc.get_pages().len(),
    })
}

#[cfg(not(feature = "pdf-parse"))]
fn parse(_bytes: &[u8]) -> Result<PdfAcceptance, ValidationError> {
    Err(ValidationError::ParserUnavailable)
}
