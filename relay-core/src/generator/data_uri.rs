use crate::error::{RelayError, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;

/// A parsed `data:<mediatype>;base64,<payload>` URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUri<'a> {
    pub media_type: &'a str,
    pub payload: &'a str,
}

impl<'a> DataUri<'a> {
    /// `None` when `url` is not a base64 data URI; such attachments are skipped, not rejected.
    pub fn parse(url: &'a str) -> Option<Self> {
        let rest = url.strip_prefix("data:")?;
        let (header, payload) = rest.split_once(',')?;
        let media_type = header.strip_suffix(";base64")?;

        if media_type.is_empty() || payload.is_empty() {
            return None;
        }

        Some(Self { media_type, payload })
    }

    pub fn decode(&self) -> Result<Vec<u8>> {
        let compact: String = self.payload.chars().filter(|c| !c.is_whitespace()).collect();
        STANDARD
            .decode(compact.as_bytes())
            .map_err(|e| RelayError::Generation(format!("invalid base64 payload: {}", e)))
    }
}
