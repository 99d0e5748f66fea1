//! Non-blocking credential metadata injection with per-snapshot header caching.
//!
//! Each call to [`CredentialMetadataInjector::apply_metadata`] is scheduled on the
//! caller-supplied [`CallExecutor`]: the audience is derived, the [`CredentialSource`] is
//! awaited, and the resulting headers (or an `UNAUTHENTICATED` status) are delivered to the
//! call's [`MetadataApplier`]. Concurrent calls fetch independently; only the final
//! compare-and-replace of the cached header set is serialized, and no I/O happens under that
//! lock.

// std
use std::panic::AssertUnwindSafe;
// crates.io
use futures_util::FutureExt;
// self
use crate::{
	_prelude::*,
	credentials::{
		CallExecutor, CredentialSource, EncodeError, HeaderSet, RawMetadata, encode_metadata,
		service_audience,
	},
	obs::{self, CacheResult, InjectionOutcome, InjectionSpan},
	service::MethodKey,
	status::Status,
};

/// Failures raised while attaching credentials to a call.
#[derive(Debug, ThisError)]
pub enum AuthError {
	/// The channel has no authority to derive an audience from.
	#[error("Channel has no authority.")]
	MissingAuthority,
	/// The authority cannot appear in a URI authority position.
	#[error("Authority `{authority}` is malformed: {reason}.")]
	MalformedAuthority {
		/// Authority as supplied.
		authority: String,
		/// Why it was rejected.
		reason: &'static str,
	},
	/// The audience URI could not be constructed from the authority.
	#[error("Unable to construct service audience for authority `{authority}`.")]
	InvalidAudience {
		/// Authority as supplied.
		authority: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// The credential source failed.
	#[error("Credential source failed to produce metadata for `{audience}`.")]
	Fetch {
		/// Audience the metadata was requested for.
		audience: String,
		/// Source-specific failure.
		#[source]
		source: BoxError,
	},
	/// The fetched metadata could not be encoded into headers.
	#[error(transparent)]
	Encode(#[from] EncodeError),
	/// Resolving credentials panicked inside the executor task.
	#[error("Credential resolution panicked: {message}.")]
	Panicked {
		/// Panic payload, when it was a string.
		message: String,
	},
}
impl AuthError {
	fn from_panic(payload: Box<dyn Any + Send>) -> Self {
		let message = payload
			.downcast_ref::<&str>()
			.map(|message| (*message).to_owned())
			.or_else(|| payload.downcast_ref::<String>().cloned())
			.unwrap_or_else(|| "non-string panic payload".into());

		Self::Panicked { message }
	}
}
impl From<AuthError> for Status {
	fn from(e: AuthError) -> Self {
		let description = match &e {
			AuthError::MissingAuthority => "Channel has no authority",
			AuthError::MalformedAuthority { .. } | AuthError::InvalidAudience { .. } =>
				"Unable to construct service URI for auth",
			AuthError::Fetch { .. } => "Credential source failed",
			AuthError::Encode(_) => "Credential metadata could not be encoded",
			AuthError::Panicked { .. } => "Credential resolution panicked",
		};

		Status::unauthenticated().with_description(description).with_cause(e)
	}
}

/// Per-call inputs for credential injection.
#[derive(Clone, Debug)]
pub struct CallContext {
	/// Authority (`host[:port]`) of the channel the call is sent on.
	pub authority: Option<String>,
	/// Called method.
	pub method: MethodKey,
}
impl CallContext {
	/// Creates a context for `method` without an authority.
	pub fn new(method: MethodKey) -> Self {
		Self { authority: None, method }
	}

	/// Sets the channel authority.
	pub fn with_authority(mut self, authority: impl Into<String>) -> Self {
		self.authority = Some(authority.into());

		self
	}
}

/// Continuation receiving the outcome of one injection.
///
/// Delivery consumes the applier, so each call observes exactly one outcome.
pub trait MetadataApplier
where
	Self: 'static + Send,
{
	/// Receives the headers to attach, or the status the call must fail with.
	fn deliver(self, outcome: Result<Arc<HeaderSet>, Status>);
}
impl<F> MetadataApplier for F
where
	F: 'static + Send + FnOnce(Result<Arc<HeaderSet>, Status>),
{
	fn deliver(self, outcome: Result<Arc<HeaderSet>, Status>) {
		self(outcome)
	}
}

/// Encoded headers together with the upstream snapshot they were built from.
#[derive(Clone, Debug)]
pub struct CachedHeaderSet {
	/// Snapshot returned by the credential source; compared by pointer identity.
	pub source: Option<Arc<RawMetadata>>,
	/// Headers encoded from `source`.
	pub headers: Arc<HeaderSet>,
}
impl CachedHeaderSet {
	/// Returns true when `raw` is the very snapshot these headers were encoded from.
	pub fn is_from(&self, raw: Option<&Arc<RawMetadata>>) -> bool {
		match (self.source.as_ref(), raw) {
			(Some(cached), Some(raw)) => Arc::ptr_eq(cached, raw),
			(None, None) => true,
			_ => false,
		}
	}
}

/// Attaches credential metadata to outgoing calls without blocking the caller.
///
/// One injector serves one credential configuration. Clones share the source and the header
/// cache.
pub struct CredentialMetadataInjector<S>
where
	S: ?Sized + CredentialSource,
{
	source: Arc<S>,
	cache: Arc<Mutex<Option<CachedHeaderSet>>>,
}
impl<S> CredentialMetadataInjector<S>
where
	S: 'static + ?Sized + CredentialSource,
{
	/// Creates an injector backed by `source` with an empty cache.
	pub fn new(source: Arc<S>) -> Self {
		Self { source, cache: Default::default() }
	}

	/// Credential source backing this injector.
	pub fn source(&self) -> &Arc<S> {
		&self.source
	}

	/// Snapshot of the currently cached header set, if any fetch has succeeded.
	pub fn cached(&self) -> Option<CachedHeaderSet> {
		self.cache.lock().clone()
	}

	/// Schedules credential injection for one call on `executor`.
	///
	/// Never blocks and never fails synchronously: every outcome, including a missing or
	/// malformed authority, reaches `applier` from inside the executor. A panic raised while
	/// resolving credentials is caught and delivered as an `UNAUTHENTICATED` failure.
	pub fn apply_metadata<E, A>(&self, context: CallContext, executor: &E, applier: A)
	where
		E: ?Sized + CallExecutor,
		A: MetadataApplier,
	{
		let source = self.source.clone();
		let cache = self.cache.clone();

		obs::record_injection_outcome(InjectionOutcome::Attempt);
		executor.execute(Box::pin(async move {
			let span = InjectionSpan::new(context.method.full_name(), "apply_metadata");
			let outcome =
				AssertUnwindSafe(span.instrument(resolve_headers(&*source, &cache, &context)))
					.catch_unwind()
					.await
					.unwrap_or_else(|payload| Err(AuthError::from_panic(payload)));

			match outcome {
				Ok(headers) => {
					obs::record_injection_outcome(InjectionOutcome::Applied);
					applier.deliver(Ok(headers));
				},
				Err(e) => {
					span.record_failure(&e);
					obs::record_injection_outcome(InjectionOutcome::Failed);
					applier.deliver(Err(e.into()));
				},
			}
		}));
	}
}
impl<S> Clone for CredentialMetadataInjector<S>
where
	S: ?Sized + CredentialSource,
{
	fn clone(&self) -> Self {
		Self { source: self.source.clone(), cache: self.cache.clone() }
	}
}
impl<S> Debug for CredentialMetadataInjector<S>
where
	S: ?Sized + CredentialSource,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("CredentialMetadataInjector")
			.field("cached", &self.cache.lock().is_some())
			.finish()
	}
}

async fn resolve_headers<S>(
	source: &S,
	cache: &Mutex<Option<CachedHeaderSet>>,
	context: &CallContext,
) -> Result<Arc<HeaderSet>, AuthError>
where
	S: ?Sized + CredentialSource,
{
	let audience = service_audience(context.authority.as_deref(), &context.method)?;
	let raw = source
		.metadata_for_audience(&audience)
		.await
		.map_err(|source| AuthError::Fetch { audience: audience.to_string(), source })?;

	swap_cached_headers(cache, raw).map_err(AuthError::from)
}

fn swap_cached_headers(
	cache: &Mutex<Option<CachedHeaderSet>>,
	raw: Option<Arc<RawMetadata>>,
) -> Result<Arc<HeaderSet>, EncodeError> {
	let mut cached = cache.lock();

	if let Some(current) = cached.as_ref().filter(|current| current.is_from(raw.as_ref())) {
		obs::record_cache_result(CacheResult::Hit);

		return Ok(current.headers.clone());
	}

	let headers = Arc::new(encode_metadata(raw.as_deref())?);

	obs::record_cache_result(CacheResult::Miss);
	*cached = Some(CachedHeaderSet { source: raw, headers: headers.clone() });

	Ok(headers)
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::{_preludet::*, credentials::HeaderValue, status::Code};

	#[test]
	fn identical_snapshots_reuse_encoded_headers() {
		let cache = Mutex::new(None);
		let raw = raw_metadata([("authorization", &["Bearer a"][..])]);
		let first =
			swap_cached_headers(&cache, Some(raw.clone())).expect("First swap should encode.");
		let second = swap_cached_headers(&cache, Some(raw)).expect("Second swap should hit.");

		assert!(Arc::ptr_eq(&first, &second));
	}

	#[test]
	fn new_snapshots_replace_the_cache() {
		let cache = Mutex::new(None);
		let first = swap_cached_headers(
			&cache,
			Some(raw_metadata([("authorization", &["Bearer a"][..])])),
		)
		.expect("First swap should encode.");
		let second = swap_cached_headers(
			&cache,
			Some(raw_metadata([("authorization", &["Bearer a"][..])])),
		)
		.expect("Equal but distinct snapshot should encode again.");

		assert!(!Arc::ptr_eq(&first, &second));
		assert_eq!(first, second);

		let empty = swap_cached_headers(&cache, None).expect("Absent metadata should encode.");

		assert!(empty.is_empty());
		assert!(
			cache.lock().as_ref().expect("Cache should be populated.").is_from(None),
			"Absent metadata should become the cached snapshot."
		);
	}

	#[test]
	fn encoding_failures_leave_the_cache_untouched() {
		let cache = Mutex::new(None);
		let good = raw_metadata([("token", &["xyz"][..])]);

		swap_cached_headers(&cache, Some(good.clone())).expect("Valid snapshot should encode.");

		let err = swap_cached_headers(&cache, Some(raw_metadata([("token-bin", &["%"][..])])))
			.expect_err("Invalid base64 should fail.");

		assert!(matches!(err, EncodeError::InvalidBinaryValue { .. }));
		assert!(
			cache.lock().as_ref().expect("Cache should be populated.").is_from(Some(&good)),
			"Failed encodes must not replace the cached snapshot."
		);
	}

	#[test]
	fn auth_errors_map_to_unauthenticated_with_cause() {
		let status = Status::from(AuthError::MissingAuthority);

		assert_eq!(status.code, Code::Unauthenticated);
		assert_eq!(status.description.as_deref(), Some("Channel has no authority"));
		assert_eq!(
			StdError::source(&status).map(ToString::to_string).as_deref(),
			Some("Channel has no authority.")
		);
	}

	#[test]
	fn panic_payloads_become_auth_errors() {
		let from_str = AuthError::from_panic(Box::new("source bug"));
		let from_string = AuthError::from_panic(Box::new(String::from("encoder bug")));
		let opaque = AuthError::from_panic(Box::new(7_u8));

		assert_eq!(from_str.to_string(), "Credential resolution panicked: source bug.");
		assert!(matches!(from_string, AuthError::Panicked { message } if message == "encoder bug"));
		assert!(matches!(opaque, AuthError::Panicked { .. }));
		assert_eq!(Status::from(opaque).code, Code::Unauthenticated);
	}

	#[tokio::test]
	async fn resolve_headers_encodes_fetched_metadata() {
		let source = StaticSource::new(raw_metadata([("token-bin", &["QUJD"][..])]));
		let cache = Mutex::new(None);
		let context =
			CallContext::new(unary("pkg.Service/Method")).with_authority("api.example.com");
		let headers = resolve_headers(&source, &cache, &context)
			.await
			.expect("Static source should produce headers.");

		assert_eq!(headers.get("token-bin").and_then(HeaderValue::as_bytes), Some(&b"ABC"[..]));
		assert_eq!(source.fetch_count(), 1);
	}
}
