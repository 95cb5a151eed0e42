//! Per-source decoders.
//!
//! Each decoder reads exactly one part of an [`ExtractionContext`] and is a
//! pure function: no I/O, no mutation. A source that carries nothing yields
//! [`Decoded::Absent`] rather than an error, so a request type never fails
//! because a source it does not read is empty.
//!
//! Query, path and header values are all strings on the wire. They go
//! through `serde_urlencoded`, which coerces them into the target field
//! types (`"42"` into `u64`, `"true"` into `bool`, and so on).

use crate::{ExtractionContext, ExtractionError, ExtractionSource};
use serde::de::DeserializeOwned;

/// Default maximum body size (1 MB).
pub const DEFAULT_BODY_LIMIT: usize = 1024 * 1024;

/// Outcome of a decoder that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decoded<T> {
    /// The source carried nothing to decode.
    Absent,
    /// The source decoded into a value.
    Bound(T),
}

impl<T> Decoded<T> {
    /// Converts into an `Option`, mapping `Absent` to `None`.
    pub fn into_option(self) -> Option<T> {
        match self {
            Self::Absent => None,
            Self::Bound(value) => Some(value),
        }
    }

    /// Returns `true` if the source carried nothing.
    pub const fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }
}

/// Decodes the JSON body, up to the context's body limit.
///
/// # Example
///
/// ```rust
/// use storefront_extract::{decode_body, Decoded, ExtractionContext};
/// use serde::Deserialize;
///
/// #[derive(Debug, Deserialize, PartialEq)]
/// struct NewProduct {
///     name: String,
/// }
///
/// let ctx = ExtractionContext::builder().body(r#"{"name": "Lamp"}"#).build();
/// let decoded = decode_body::<NewProduct>(&ctx).unwrap();
/// assert_eq!(decoded, Decoded::Bound(NewProduct { name: "Lamp".into() }));
///
/// let empty = ExtractionContext::builder().build();
/// assert!(decode_body::<NewProduct>(&empty).unwrap().is_absent());
/// ```
pub fn decode_body<T: DeserializeOwned>(
    ctx: &ExtractionContext,
) -> Result<Decoded<T>, ExtractionError> {
    decode_body_with_limit(ctx, ctx.body_limit())
}

/// Decodes the JSON body with a custom size limit.
///
/// An empty or whitespace-only body is `Absent`. A declared content type
/// other than JSON is rejected before parsing.
pub fn decode_body_with_limit<T: DeserializeOwned>(
    ctx: &ExtractionContext,
    limit: usize,
) -> Result<Decoded<T>, ExtractionError> {
    let body = ctx.body();
    if ctx.is_body_empty() {
        return Ok(Decoded::Absent);
    }
    if body.len() > limit {
        return Err(ExtractionError::payload_too_large(limit, body.len()));
    }
    if let Some(content_type) = ctx.content_type() {
        if !is_json(content_type) {
            return Err(ExtractionError::unsupported_media_type(content_type));
        }
    }

    serde_json::from_slice(body)
        .map(Decoded::Bound)
        .map_err(|e| ExtractionError::malformed(ExtractionSource::Body, e.to_string()))
}

/// Decodes the query string.
pub fn decode_query<T: DeserializeOwned>(
    ctx: &ExtractionContext,
) -> Result<Decoded<T>, ExtractionError> {
    let Some(query) = ctx.query_string() else {
        return Ok(Decoded::Absent);
    };

    serde_urlencoded::from_str(query)
        .map(Decoded::Bound)
        .map_err(|e| ExtractionError::malformed(ExtractionSource::Query, e.to_string()))
}

/// Decodes the path parameters captured by the router.
///
/// Captured segments are raw URL text, so each value is percent-decoded
/// first. A value that does not decode to UTF-8 is malformed.
pub fn decode_path<T: DeserializeOwned>(
    ctx: &ExtractionContext,
) -> Result<Decoded<T>, ExtractionError> {
    let params = ctx.path_params();
    if params.is_empty() {
        return Ok(Decoded::Absent);
    }

    let decoded = params
        .iter()
        .map(|(name, value)| {
            urlencoding::decode(value)
                .map(|value| (name, value))
                .map_err(|e| {
                    ExtractionError::malformed(
                        ExtractionSource::Path,
                        format!("parameter '{name}': {e}"),
                    )
                })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let pairs: Vec<(&str, &str)> = decoded
        .iter()
        .map(|(name, value)| (*name, value.as_ref()))
        .collect();
    reencode(ExtractionSource::Path, &pairs)
}

/// Decodes the request headers.
///
/// Field names match lowercase header names, so request types use
/// `#[serde(rename = "x-correlation-id")]` and similar. Only the first value
/// of a repeated header is seen. Values that are not visible ASCII are
/// skipped.
pub fn decode_headers<T: DeserializeOwned>(
    ctx: &ExtractionContext,
) -> Result<Decoded<T>, ExtractionError> {
    let headers = ctx.headers();
    if headers.is_empty() {
        return Ok(Decoded::Absent);
    }

    let pairs: Vec<(&str, &str)> = headers
        .keys()
        .filter_map(|name| {
            let value = headers.get(name)?.to_str().ok()?;
            Some((name.as_str(), value))
        })
        .collect();
    reencode(ExtractionSource::Header, &pairs)
}

fn reencode<T: DeserializeOwned>(
    source: ExtractionSource,
    pairs: &[(&str, &str)],
) -> Result<Decoded<T>, ExtractionError> {
    let encoded = serde_urlencoded::to_string(pairs)
        .map_err(|e| ExtractionError::malformed(source, e.to_string()))?;

    serde_urlencoded::from_str(&encoded)
        .map(Decoded::Bound)
        .map_err(|e| ExtractionError::malformed(source, e.to_string()))
}

fn is_json(content_type: &str) -> bool {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    essence == "application/json" || essence.ends_with("+json")
}
