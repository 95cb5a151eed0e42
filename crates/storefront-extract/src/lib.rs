//! # Storefront Extract
//!
//! Binds one inbound request into a typed value.
//!
//! A request type implements [`Bind`] and overrides one hook per source it
//! reads. [`bind`] starts from `T::default()` and runs the hooks in a fixed
//! order, stopping at the first error:
//!
//! | Order | Hook | Source | Decoder |
//! |-------|------|--------|---------|
//! | 1 | [`Bind::bind_body`] | JSON body | [`decode_body`] |
//! | 2 | [`Bind::bind_query`] | Query string | [`decode_query`] |
//! | 3 | [`Bind::bind_path`] | Path parameters | [`decode_path`] |
//! | 4 | [`Bind::bind_headers`] | Headers | [`decode_headers`] |
//!
//! Every decoder is a pure function returning [`Decoded::Absent`] when its
//! source carries nothing, [`Decoded::Bound`] on success, or an
//! [`ExtractionError`] naming the source.
//!
//! ## Example
//!
//! ```rust
//! use storefront_extract::{bind, Bind, ExtractionContext, ExtractionError, Source};
//! use serde::Deserialize;
//!
//! #[derive(Default)]
//! struct GetProduct {
//!     id: String,
//!     verbose: bool,
//! }
//!
//! #[derive(Deserialize)]
//! struct IdParam {
//!     id: String,
//! }
//!
//! #[derive(Deserialize)]
//! struct Flags {
//!     #[serde(default)]
//!     verbose: bool,
//! }
//!
//! impl Bind for GetProduct {
//!     fn bind_query(&mut self, source: &Source<'_>) -> Result<(), ExtractionError> {
//!         if let Some(flags) = source.decode::<Flags>()?.into_option() {
//!             self.verbose = flags.verbose;
//!         }
//!         Ok(())
//!     }
//!
//!     fn bind_path(&mut self, source: &Source<'_>) -> Result<(), ExtractionError> {
//!         self.id = source.require::<IdParam>()?.id;
//!         Ok(())
//!     }
//! }
//!
//! let ctx = ExtractionContext::builder()
//!     .uri(http::Uri::from_static("/products/42?verbose=true"))
//!     .path_param("id", "42")
//!     .build();
//!
//! let req: GetProduct = bind(&ctx).unwrap();
//! assert_eq!(req.id, "42");
//! assert!(req.verbose);
//! ```

#![doc(html_root_url = "https://docs.rs/storefront-extract/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod bind;
mod context;
mod decode;
mod error;
mod params;

pub use bind::{bind, bind_with_limit, Bind, Source};
pub use context::{ExtractionContext, ExtractionContextBuilder};
pub use decode::{
    decode_body, decode_body_with_limit, decode_headers, decode_path, decode_query, Decoded,
    DEFAULT_BODY_LIMIT,
};
pub use error::{ExtractionError, ExtractionSource};
pub use params::Params;
