//! Inline media payloads.
//!
//! Images and videos travel to the model as base64 without the data-URI
//! prefix; the browser sends and receives full data URIs.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type MediaResult<T> = Result<T, MediaError>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MediaError {
    #[error("Malformed data URI: {0}")]
    MalformedDataUri(String),

    #[error("Invalid base64 payload: {0}")]
    InvalidBase64(String),

    #[error("Expected {expected} media, got {mime_type}")]
    WrongKind {
        expected: MediaKind,
        mime_type: String,
    },

    #[error("Media payload is empty")]
    Empty,
}

/// Broad media family, derived from the MIME type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Video => "video",
        }
    }
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Base64 media payload with its MIME type.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct InlineMedia {
    pub mime_type: String,
    /// Base64 data, no `data:` prefix
    pub data: String,
}

// Payloads can be megabytes of base64; keep them out of logs.
impl std::fmt::Debug for InlineMedia {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InlineMedia")
            .field("mime_type", &self.mime_type)
            .field("data_len", &self.data.len())
            .finish()
    }
}

impl InlineMedia {
    pub fn new(mime_type: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            mime_type: mime_type.into(),
            data: data.into(),
        }
    }

    /// Encode raw bytes.
    pub fn from_bytes(mime_type: impl Into<String>, bytes: &[u8]) -> MediaResult<Self> {
        if bytes.is_empty() {
            return Err(MediaError::Empty);
        }
        Ok(Self::new(mime_type, STANDARD.encode(bytes)))
    }

    /// Parse `data:<mime>;base64,<payload>`, keeping only the payload.
    pub fn from_data_uri(uri: &str) -> MediaResult<Self> {
        let rest = uri
            .trim()
            .strip_prefix("data:")
            .ok_or_else(|| MediaError::MalformedDataUri("missing data: scheme".to_string()))?;

        let (header, payload) = rest
            .split_once(',')
            .ok_or_else(|| MediaError::MalformedDataUri("missing ',' separator".to_string()))?;

        let mime_type = header
            .strip_suffix(";base64")
            .ok_or_else(|| MediaError::MalformedDataUri("payload is not base64".to_string()))?;

        if mime_type.is_empty() || !mime_type.contains('/') {
            return Err(MediaError::MalformedDataUri(format!(
                "invalid MIME type '{}'",
                mime_type
            )));
        }
        if payload.is_empty() {
            return Err(MediaError::Empty);
        }

        STANDARD
            .decode(payload)
            .map_err(|e| MediaError::InvalidBase64(e.to_string()))?;

        Ok(Self::new(mime_type, payload))
    }

    pub fn to_data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }

    pub fn kind(&self) -> Option<MediaKind> {
        if self.mime_type.starts_with("image/") {
            Some(MediaKind::Image)
        } else if self.mime_type.starts_with("video/") {
            Some(MediaKind::Video)
        } else {
            None
        }
    }

    /// Fail unless the MIME type belongs to `expected`.
    pub fn ensure_kind(&self, expected: MediaKind) -> MediaResult<()> {
        if self.kind() == Some(expected) {
            Ok(())
        } else {
            Err(MediaError::WrongKind {
                expected,
                mime_type: self.mime_type.clone(),
            })
        }
    }

    /// Size of the decoded payload in bytes.
    pub fn decoded_len(&self) -> usize {
        let padding = self.data.bytes().rev().take_while(|b| *b == b'=').count();
        ((self.data.len() / 4) * 3).saturating_sub(padding.min(2))
    }
}
