//! Sequential multi-source binding.

use crate::{
    decode_body_with_limit, decode_headers, decode_path, decode_query, Decoded, ExtractionContext,
    ExtractionError, ExtractionSource,
};
use serde::de::DeserializeOwned;

/// A request type that can be bound from an inbound request.
///
/// Binding starts from `Self::default()` and calls the hooks in order:
/// body, query, path, headers. Each hook sees a [`Source`] that can only
/// decode its own part of the request, so a field can only be assigned by
/// the hooks that choose to assign it. A hook left at its default never
/// reads its source: an unused body is ignored even when it is malformed.
///
/// The first hook to return an error stops binding.
pub trait Bind: Default + Send + 'static {
    /// Binds fields owned by the JSON body.
    fn bind_body(&mut self, _source: &Source<'_>) -> Result<(), ExtractionError> {
        Ok(())
    }

    /// Binds fields owned by the query string.
    fn bind_query(&mut self, _source: &Source<'_>) -> Result<(), ExtractionError> {
        Ok(())
    }

    /// Binds fields owned by the path parameters.
    fn bind_path(&mut self, _source: &Source<'_>) -> Result<(), ExtractionError> {
        Ok(())
    }

    /// Binds fields owned by the headers.
    fn bind_headers(&mut self, _source: &Source<'_>) -> Result<(), ExtractionError> {
        Ok(())
    }
}

impl Bind for storefront_core::Empty {}

/// One source of an inbound request, as seen by a [`Bind`] hook.
#[derive(Debug, Clone, Copy)]
pub struct Source<'a> {
    ctx: &'a ExtractionContext,
    kind: ExtractionSource,
    body_limit: usize,
}

impl<'a> Source<'a> {
    fn new(ctx: &'a ExtractionContext, kind: ExtractionSource, body_limit: usize) -> Self {
        Self {
            ctx,
            kind,
            body_limit,
        }
    }

    /// Returns which source this is.
    #[must_use]
    pub fn kind(&self) -> ExtractionSource {
        self.kind
    }

    /// Decodes this source into `T`.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<Decoded<T>, ExtractionError> {
        match self.kind {
            ExtractionSource::Body => decode_body_with_limit(self.ctx, self.body_limit),
            ExtractionSource::Query => decode_query(self.ctx),
            ExtractionSource::Path => decode_path(self.ctx),
            ExtractionSource::Header => decode_headers(self.ctx),
        }
    }

    /// Decodes this source into `T`, treating an empty source as an error.
    pub fn require<T: DeserializeOwned>(&self) -> Result<T, ExtractionError> {
        self.decode()?
            .into_option()
            .ok_or_else(|| ExtractionError::missing(self.kind))
    }
}

/// Binds `T` from `ctx` with the context's body limit.
///
/// # Errors
///
/// Returns the first [`ExtractionError`] raised by a hook. Hooks after the
/// failing one do not run.
pub fn bind<T: Bind>(ctx: &ExtractionContext) -> Result<T, ExtractionError> {
    bind_with_limit(ctx, ctx.body_limit())
}

/// Binds `T` from `ctx` with a custom body limit.
pub fn bind_with_limit<T: Bind>(
    ctx: &ExtractionContext,
    body_limit: usize,
) -> Result<T, ExtractionError> {
    let mut value = T::default();
    for kind in ExtractionSource::ORDER {
        let source = Source::new(ctx, kind, body_limit);
        match kind {
            ExtractionSource::Body => value.bind_body(&source)?,
            ExtractionSource::Query => value.bind_query(&source)?,
            ExtractionSource::Path => value.bind_path(&source)?,
            ExtractionSource::Header => value.bind_headers(&source)?,
        }
    }
    Ok(value)
}
