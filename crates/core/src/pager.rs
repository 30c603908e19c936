//! Keyset pagination primitives.
//!
//! A page token is an opaque, tamper-evident encoding of the last row a client
//! has seen. Stores never deal with tokens: the service decodes the token into
//! an immutable [`Cursor`], wraps it in a [`PageRequest`], and the store turns
//! that into a strict "sort key < cursor key" predicate.
//!
//! Token layout: `base64url(json || hmac_sha256(key, json))` without padding.
//! The JSON carries the listing kind (`k`), so a token only resumes the
//! listing that issued it.

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;

use crate::error::DomainError;

type HmacSha256 = Hmac<Sha256>;

const TAG_LEN: usize = 32;

/// Page size applied when the client sends none (or zero).
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Upper bound on any page, whatever the client asks for.
pub const MAX_PAGE_SIZE: u32 = 100;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CursorError {
    #[error("invalid page token")]
    InvalidPageToken,

    #[error("cursor key rejected: {0}")]
    InvalidKey(String),
}

impl From<CursorError> for DomainError {
    fn from(err: CursorError) -> Self {
        match err {
            CursorError::InvalidPageToken => {
                DomainError::invalid_field("pageToken", "Page token is invalid.")
            }
            CursorError::InvalidKey(msg) => DomainError::internal(msg),
        }
    }
}

/// Which listing minted a cursor. Each listing has its own sort key, so a
/// token is only valid for the listing that issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CursorKind {
    #[serde(rename = "emp")]
    Employee,
    #[serde(rename = "card")]
    Card,
}

/// Decoded last-seen sort key of a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cursor {
    #[serde(rename = "k")]
    kind: CursorKind,
    id: String,
    #[serde(rename = "t")]
    created_at: DateTime<Utc>,
}

impl Cursor {
    pub fn new(kind: CursorKind, id: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            kind,
            id: id.into(),
            created_at,
        }
    }

    pub fn kind(&self) -> CursorKind {
        self.kind
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// Signs and verifies page tokens with a server-side key.
#[derive(Clone)]
pub struct CursorCodec {
    mac: HmacSha256,
}

impl core::fmt::Debug for CursorCodec {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CursorCodec").finish_non_exhaustive()
    }
}

impl CursorCodec {
    pub fn new(key: impl Into<Vec<u8>>) -> Result<Self, CursorError> {
        let key = key.into();
        if key.is_empty() {
            return Err(CursorError::InvalidKey("cursor key must not be empty".into()));
        }
        let mac = <HmacSha256 as Mac>::new_from_slice(&key)
            .map_err(|e| CursorError::InvalidKey(e.to_string()))?;
        Ok(Self { mac })
    }

    pub fn encode(
        &self,
        kind: CursorKind,
        id: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> String {
        self.encode_cursor(&Cursor::new(kind, id, created_at))
    }

    pub fn encode_cursor(&self, cursor: &Cursor) -> String {
        // Serializing a tag, a string and a timestamp cannot fail.
        let mut payload = serde_json::to_vec(cursor).unwrap_or_default();
        let mut mac = self.mac.clone();
        mac.update(&payload);
        payload.extend_from_slice(&mac.finalize().into_bytes());
        URL_SAFE_NO_PAD.encode(payload)
    }

    pub fn decode(&self, token: &str) -> Result<Cursor, CursorError> {
        let raw = URL_SAFE_NO_PAD
            .decode(token.trim())
            .map_err(|_| CursorError::InvalidPageToken)?;
        if raw.len() <= TAG_LEN {
            return Err(CursorError::InvalidPageToken);
        }
        let (payload, tag) = raw.split_at(raw.len() - TAG_LEN);

        let mut mac = self.mac.clone();
        mac.update(payload);
        mac.verify_slice(tag)
            .map_err(|_| CursorError::InvalidPageToken)?;

        serde_json::from_slice(payload).map_err(|_| CursorError::InvalidPageToken)
    }
}

/// Clamp a client-supplied page size.
pub fn page_size(requested: Option<i64>) -> u32 {
    match requested {
        None => DEFAULT_PAGE_SIZE,
        Some(n) if n <= 0 => DEFAULT_PAGE_SIZE,
        Some(n) => n.min(i64::from(MAX_PAGE_SIZE)) as u32,
    }
}

/// What a store needs to produce one page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    size: u32,
    after: Option<Cursor>,
}

impl PageRequest {
    /// First page of the given (already clamped) size.
    pub fn first(size: u32) -> Self {
        Self {
            size: size.clamp(1, MAX_PAGE_SIZE),
            after: None,
        }
    }

    /// Build from raw client input, decoding the token if one was sent.
    ///
    /// A token minted by a different listing is rejected like a forged one.
    pub fn from_client(
        codec: &CursorCodec,
        kind: CursorKind,
        page_size_raw: Option<i64>,
        page_token: Option<&str>,
    ) -> Result<Self, CursorError> {
        let mut request = Self::first(page_size(page_size_raw));
        if let Some(token) = page_token.filter(|t| !t.trim().is_empty()) {
            let cursor = codec.decode(token)?;
            if cursor.kind() != kind {
                return Err(CursorError::InvalidPageToken);
            }
            request.after = Some(cursor);
        }
        Ok(request)
    }

    pub fn after(mut self, cursor: Cursor) -> Self {
        self.after = Some(cursor);
        self
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn cursor(&self) -> Option<&Cursor> {
        self.after.as_ref()
    }
}

/// One page of results plus the token for the next one.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Empty when there are no further pages.
    pub next_page_token: String,
}

impl<T> Page<T> {
    /// Wrap store rows. A next token is emitted only when the page is full.
    pub fn from_rows<F>(
        items: Vec<T>,
        request: &PageRequest,
        codec: &CursorCodec,
        key: F,
    ) -> Self
    where
        F: Fn(&T) -> Cursor,
    {
        let next_page_token = match items.last() {
            Some(last) if items.len() == request.size() as usize => {
                codec.encode_cursor(&key(last))
            }
            _ => String::new(),
        };
        Self {
            items,
            next_page_token,
        }
    }
}
