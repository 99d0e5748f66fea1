//! Call status codes and the [`Status`] value delivered to RPC continuations.

// self
use crate::_prelude::*;

/// Canonical RPC status codes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Code {
	/// Not an error.
	Ok,
	/// The operation was cancelled.
	Cancelled,
	/// Unknown error.
	Unknown,
	/// The client supplied an invalid argument.
	InvalidArgument,
	/// The deadline expired before the operation completed.
	DeadlineExceeded,
	/// A requested entity was not found.
	NotFound,
	/// The entity the client attempted to create already exists.
	AlreadyExists,
	/// The caller lacks permission for the operation.
	PermissionDenied,
	/// A resource has been exhausted.
	ResourceExhausted,
	/// The system is not in a state required for the operation.
	FailedPrecondition,
	/// The operation was aborted.
	Aborted,
	/// The operation was attempted past the valid range.
	OutOfRange,
	/// The operation is not implemented or supported.
	Unimplemented,
	/// Internal invariant broken.
	Internal,
	/// The service is currently unavailable.
	Unavailable,
	/// Unrecoverable data loss or corruption.
	DataLoss,
	/// The request lacks valid authentication credentials.
	Unauthenticated,
}
impl Code {
	/// Returns the canonical upper-case label.
	pub const fn as_str(self) -> &'static str {
		match self {
			Code::Ok => "OK",
			Code::Cancelled => "CANCELLED",
			Code::Unknown => "UNKNOWN",
			Code::InvalidArgument => "INVALID_ARGUMENT",
			Code::DeadlineExceeded => "DEADLINE_EXCEEDED",
			Code::NotFound => "NOT_FOUND",
			Code::AlreadyExists => "ALREADY_EXISTS",
			Code::PermissionDenied => "PERMISSION_DENIED",
			Code::ResourceExhausted => "RESOURCE_EXHAUSTED",
			Code::FailedPrecondition => "FAILED_PRECONDITION",
			Code::Aborted => "ABORTED",
			Code::OutOfRange => "OUT_OF_RANGE",
			Code::Unimplemented => "UNIMPLEMENTED",
			Code::Internal => "INTERNAL",
			Code::Unavailable => "UNAVAILABLE",
			Code::DataLoss => "DATA_LOSS",
			Code::Unauthenticated => "UNAUTHENTICATED",
		}
	}
}
impl Display for Code {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome of an RPC-level operation: a [`Code`], an optional description, and the optional
/// error that caused it.
#[derive(Clone)]
pub struct Status {
	/// Status code.
	pub code: Code,
	/// Human-readable detail.
	pub description: Option<String>,
	/// Underlying failure, shared so the status stays cheap to clone.
	pub cause: Option<Arc<dyn StdError + Send + Sync>>,
}
impl Status {
	/// Creates a status carrying only a code.
	pub fn new(code: Code) -> Self {
		Self { code, description: None, cause: None }
	}

	/// `UNAUTHENTICATED` status.
	pub fn unauthenticated() -> Self {
		Self::new(Code::Unauthenticated)
	}

	/// `UNIMPLEMENTED` status.
	pub fn unimplemented() -> Self {
		Self::new(Code::Unimplemented)
	}

	/// Attaches a description.
	pub fn with_description(mut self, description: impl Into<String>) -> Self {
		self.description = Some(description.into());

		self
	}

	/// Attaches the causing error.
	pub fn with_cause(mut self, cause: impl 'static + StdError + Send + Sync) -> Self {
		self.cause = Some(Arc::new(cause));

		self
	}

	/// Returns true when the code is [`Code::Ok`].
	pub fn is_ok(&self) -> bool {
		self.code == Code::Ok
	}
}
impl Debug for Status {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Status")
			.field("code", &self.code)
			.field("description", &self.description)
			.field("cause", &self.cause.as_ref().map(ToString::to_string))
			.finish()
	}
}
impl Display for Status {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		match &self.description {
			Some(description) => write!(f, "{}: {description}", self.code),
			None => Display::fmt(&self.code, f),
		}
	}
}
impl StdError for Status {
	fn source(&self) -> Option<&(dyn StdError + 'static)> {
		self.cause.as_deref().map(|cause| cause as &(dyn StdError + 'static))
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[derive(Debug, ThisError)]
	#[error("upstream exploded")]
	struct Upstream;

	#[test]
	fn status_formats_code_and_description() {
		let status = Status::unauthenticated().with_description("no authority");

		assert_eq!(status.to_string(), "UNAUTHENTICATED: no authority");
		assert_eq!(Status::unimplemented().to_string(), "UNIMPLEMENTED");
		assert!(Status::new(Code::Ok).is_ok());
	}

	#[test]
	fn status_exposes_cause_as_source() {
		let status = Status::unauthenticated().with_cause(Upstream);
		let source = StdError::source(&status).expect("Status should expose its cause.");

		assert_eq!(source.to_string(), "upstream exploded");
	}
}
