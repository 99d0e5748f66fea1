//! Credential source contract consumed by the injector.

// self
use crate::_prelude::*;

/// Raw credential metadata: header name to ordered values.
pub type RawMetadata = BTreeMap<String, Vec<String>>;

/// Boxed future returned by [`CredentialSource::metadata_for_audience`].
///
/// `Ok(None)` means the source has nothing to attach; the call proceeds without headers.
pub type MetadataFuture<'a> =
	Pin<Box<dyn Future<Output = Result<Option<Arc<RawMetadata>>, BoxError>> + 'a + Send>>;

/// Supplier of request metadata for a given audience.
///
/// Implementations usually cache internally and may hit the network on a miss. Returning the
/// same `Arc` for unchanged credentials lets [`CredentialMetadataInjector`] skip re-encoding;
/// a new `Arc` (even with equal contents) is treated as a new snapshot.
///
/// [`CredentialMetadataInjector`]: crate::credentials::CredentialMetadataInjector
pub trait CredentialSource
where
	Self: Send + Sync,
{
	/// Fetches metadata for `audience`.
	fn metadata_for_audience<'a>(&'a self, audience: &'a Url) -> MetadataFuture<'a>;
}
