//! Request attachments

use base64::prelude::*;

use crate::SmtpResult;

/// Content type for `.pdf` filenames
pub const PDF_CONTENT_TYPE: &str = "application/pdf";
/// Content type for everything else
pub const BINARY_CONTENT_TYPE: &str = "application/octet-stream";

/// Guess the attachment content type from its filename
pub fn attachment_content_type(filename: &str) -> &'static str {
    if filename.ends_with(".pdf") {
        PDF_CONTENT_TYPE
    } else {
        BINARY_CONTENT_TYPE
    }
}

/// A decoded attachment ready to be placed in a message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingAttachment {
    /// Filename to display
    pub filename: String,
    /// MIME type (e.g., "application/pdf")
    pub mime_type: String,
    /// Raw file data
    pub data: Vec<u8>,
}

impl OutgoingAttachment {
    /// Create an attachment, deriving the MIME type from the filename
    pub fn new(filename: impl Into<String>, data: Vec<u8>) -> Self {
        let filename = filename.into();
        let mime_type = attachment_content_type(&filename).to_string();
        Self {
            filename,
            mime_type,
            data,
        }
    }

    /// Decode the optional `filename`/`attachment` pair of a request
    ///
    /// Yields `None` unless both are present and non-empty.
    pub fn from_request(
        filename: Option<&str>,
        encoded: Option<&str>,
    ) -> SmtpResult<Option<Self>> {
        match (filename, encoded) {
            (Some(name), Some(data)) if !name.is_empty() && !data.is_empty() => {
                let decoded = BASE64_STANDARD.decode(data.trim())?;
                Ok(Some(Self::new(name, decoded)))
            }
            _ => Ok(None),
        }
    }
}
