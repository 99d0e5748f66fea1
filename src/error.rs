//! Crate-level error types shared across the registry, descriptor, and credential layers.

// self
use crate::_prelude::*;

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Boxed error used where collaborators surface arbitrary failures.
pub type BoxError = Box<dyn StdError + Send + Sync>;

/// Canonical error exposed by public APIs.
///
/// Registry and descriptor variants describe service-wiring defects found at start-up and are
/// never retried. Credential variants only appear when callers convert an injection failure
/// back out of its [`Status`](crate::status::Status).
#[derive(Debug, ThisError)]
pub enum Error {
	/// Method name failed validation.
	#[error(transparent)]
	MethodName(#[from] crate::service::MethodNameError),
	/// Service contract is malformed.
	#[error(transparent)]
	Contract(#[from] crate::service::ContractError),
	/// Bindings do not match the service contract.
	#[error(transparent)]
	Registry(#[from] crate::registry::RegistryError),
	/// Credential metadata could not be attached to a call.
	#[error(transparent)]
	Auth(#[from] crate::credentials::AuthError),
	/// Credential metadata could not be encoded into headers.
	#[error(transparent)]
	Encode(#[from] crate::credentials::EncodeError),
}
