//! Validated RPC method registries and non-blocking, caching call-credential metadata injection.
//!
//! [`registry`] binds typed handlers to a declared [`service::ServiceContract`] and refuses to
//! freeze unless every contract method is bound to the contract's own descriptor instance.
//! [`credentials`] derives a per-service audience for each outgoing call, fetches credential
//! metadata on a caller-supplied executor, and caches the encoded headers per upstream snapshot.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod credentials;
pub mod error;
pub mod obs;
pub mod registry;
pub mod service;
pub mod status;
#[cfg(any(test, feature = "test"))]
pub mod _preludet {
	//! Convenience re-exports and fixtures for tests; enabled via `cfg(test)` or the `test`
	//! crate feature.

	// std
	use std::sync::atomic::{AtomicUsize, Ordering};

	pub use crate::_prelude::*;

	// self
	use crate::{
		credentials::{CredentialSource, MetadataFuture, RawMetadata},
		service::{MethodDescriptor, MethodKey, ServiceContract},
	};

	/// Credential source that always returns the same metadata snapshot and counts fetches.
	#[derive(Debug)]
	pub struct StaticSource {
		/// Snapshot handed out on every fetch.
		pub metadata: Arc<RawMetadata>,
		/// Number of completed fetches.
		pub fetches: AtomicUsize,
	}
	impl StaticSource {
		/// Wraps the provided snapshot.
		pub fn new(metadata: Arc<RawMetadata>) -> Self {
			Self { metadata, fetches: AtomicUsize::new(0) }
		}

		/// Returns the number of fetches observed so far.
		pub fn fetch_count(&self) -> usize {
			self.fetches.load(Ordering::SeqCst)
		}
	}
	impl CredentialSource for StaticSource {
		fn metadata_for_audience<'a>(&'a self, _: &'a Url) -> MetadataFuture<'a> {
			Box::pin(async move {
				self.fetches.fetch_add(1, Ordering::SeqCst);

				Ok(Some(self.metadata.clone()))
			})
		}
	}

	/// Builds a raw metadata snapshot from `(key, values)` pairs.
	pub fn raw_metadata<'a, I>(entries: I) -> Arc<RawMetadata>
	where
		I: IntoIterator<Item = (&'a str, &'a [&'a str])>,
	{
		Arc::new(
			entries
				.into_iter()
				.map(|(key, values)| {
					(key.to_owned(), values.iter().map(|value| (*value).to_owned()).collect())
				})
				.collect(),
		)
	}

	/// Builds a unary method key, panicking on invalid fixture names.
	pub fn unary(full_name: &str) -> MethodKey {
		MethodDescriptor::unary(full_name)
			.expect("Method fixture name should be valid.")
			.into_key()
	}

	/// Builds a contract for `service` declaring the provided method names (without prefix).
	pub fn contract(service: &str, methods: &[&str]) -> ServiceContract {
		ServiceContract::new(
			service,
			methods.iter().map(|method| unary(&format!("{service}/{method}"))),
		)
		.expect("Contract fixture should be valid.")
	}
}

mod _prelude {
	pub use std::{
		any::Any,
		collections::{BTreeMap, HashMap},
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use parking_lot::Mutex;
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use url::Url;

	pub use crate::error::{BoxError, Result};
}

#[cfg(feature = "tokio")] pub use tokio;
pub use url;
#[cfg(test)] use color_eyre as _;
