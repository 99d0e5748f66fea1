//! Optional observability helpers for credential injection.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `rpc_bindings.call_credentials` with the
//!   `method` (fully-qualified name) and `stage` (call site) fields.
//! - Enable `metrics` to increment the `rpc_bindings_call_credentials_total` counter for every
//!   attempt/application/failure, labeled by `outcome`, and the `rpc_bindings_header_cache_total`
//!   counter labeled by `result` (`hit` or `miss`).

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Outcome labels recorded for each injection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum InjectionOutcome {
	/// A call asked for metadata.
	Attempt,
	/// Headers were delivered.
	Applied,
	/// A failure status was delivered.
	Failed,
}
impl InjectionOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			InjectionOutcome::Attempt => "attempt",
			InjectionOutcome::Applied => "applied",
			InjectionOutcome::Failed => "failed",
		}
	}
}
impl Display for InjectionOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Whether encoded headers were reused or rebuilt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CacheResult {
	/// The upstream snapshot was unchanged; cached headers were reused.
	Hit,
	/// A new snapshot was encoded and cached.
	Miss,
}
impl CacheResult {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			CacheResult::Hit => "hit",
			CacheResult::Miss => "miss",
		}
	}
}
impl Display for CacheResult {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
