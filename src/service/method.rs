//! Fully-qualified method names, method descriptors, and identity-carrying method keys.

// std
use std::{borrow::Borrow, ops::Deref};
// crates.io
use serde::{Deserializer, Serializer};
// self
use crate::_prelude::*;

/// Separator between the service and method parts of a fully-qualified name.
pub const METHOD_SEPARATOR: char = '/';

/// Error returned when a fully-qualified method name fails validation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, ThisError)]
pub enum MethodNameError {
	/// The name was empty.
	#[error("Method name cannot be empty.")]
	Empty,
	/// The name contains whitespace characters.
	#[error("Method name `{name}` contains whitespace.")]
	ContainsWhitespace {
		/// Offending name.
		name: String,
	},
	/// The name does not contain exactly one separator.
	#[error("Method name `{name}` must have the form `<service>/<method>`.")]
	MissingSeparator {
		/// Offending name.
		name: String,
	},
	/// The service part before the separator is empty.
	#[error("Method name `{name}` has an empty service part.")]
	EmptyService {
		/// Offending name.
		name: String,
	},
	/// The method part after the separator is empty.
	#[error("Method name `{name}` has an empty method part.")]
	EmptyMethod {
		/// Offending name.
		name: String,
	},
}

/// Returns the service part of a fully-qualified method name (everything before the first
/// separator), or `None` when the name has no separator.
pub fn extract_service_name(full_name: &str) -> Option<&str> {
	full_name.split_once(METHOD_SEPARATOR).map(|(service, _)| service)
}

/// Validated `<service>/<method>` name.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MethodName(String);
impl MethodName {
	/// Creates a new name after validation.
	pub fn new(value: impl AsRef<str>) -> Result<Self, MethodNameError> {
		let view = value.as_ref();

		validate_name(view)?;

		Ok(Self(view.to_owned()))
	}

	/// Service part of the name.
	pub fn service(&self) -> &str {
		self.split_parts().0
	}

	/// Method part of the name.
	pub fn method(&self) -> &str {
		self.split_parts().1
	}

	fn split_parts(&self) -> (&str, &str) {
		// Validation guarantees a single separator.
		self.0.split_once(METHOD_SEPARATOR).unwrap_or((&self.0, ""))
	}
}
impl Deref for MethodName {
	type Target = str;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
impl AsRef<str> for MethodName {
	fn as_ref(&self) -> &str {
		&self.0
	}
}
impl Borrow<str> for MethodName {
	fn borrow(&self) -> &str {
		&self.0
	}
}
impl From<MethodName> for String {
	fn from(value: MethodName) -> Self {
		value.0
	}
}
impl TryFrom<String> for MethodName {
	type Error = MethodNameError;

	fn try_from(value: String) -> Result<Self, Self::Error> {
		validate_name(&value)?;

		Ok(Self(value))
	}
}
impl FromStr for MethodName {
	type Err = MethodNameError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::new(s)
	}
}
impl Debug for MethodName {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "Method({})", self.0)
	}
}
impl Display for MethodName {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.0)
	}
}

/// Call shape of an RPC method.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MethodKind {
	#[default]
	/// One request, one response.
	Unary,
	/// Request stream, one response.
	ClientStreaming,
	/// One request, response stream.
	ServerStreaming,
	/// Request and response streams.
	BidiStreaming,
}
impl MethodKind {
	/// Returns a stable label suitable for logs.
	pub const fn as_str(self) -> &'static str {
		match self {
			MethodKind::Unary => "unary",
			MethodKind::ClientStreaming => "client_streaming",
			MethodKind::ServerStreaming => "server_streaming",
			MethodKind::BidiStreaming => "bidi_streaming",
		}
	}

	/// Returns true when the client sends exactly one message.
	pub const fn client_sends_one(self) -> bool {
		matches!(self, MethodKind::Unary | MethodKind::ServerStreaming)
	}

	/// Returns true when the server sends exactly one message.
	pub const fn server_sends_one(self) -> bool {
		matches!(self, MethodKind::Unary | MethodKind::ClientStreaming)
	}
}
impl Display for MethodKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Immutable description of a single RPC method.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MethodDescriptor {
	/// Fully-qualified `<service>/<method>` name.
	pub name: MethodName,
	/// Call shape.
	#[serde(default)]
	pub kind: MethodKind,
	/// Whether repeated invocations have no additional effect.
	#[serde(default)]
	pub idempotent: bool,
	/// Whether the method has no side effects at all.
	#[serde(default)]
	pub safe: bool,
}
impl MethodDescriptor {
	/// Creates a descriptor with the provided name and call shape.
	pub fn new(name: impl AsRef<str>, kind: MethodKind) -> Result<Self, MethodNameError> {
		Ok(Self { name: MethodName::new(name)?, kind, idempotent: false, safe: false })
	}

	/// Creates a unary descriptor.
	pub fn unary(name: impl AsRef<str>) -> Result<Self, MethodNameError> {
		Self::new(name, MethodKind::Unary)
	}

	/// Marks the method as idempotent.
	pub fn idempotent(mut self, idempotent: bool) -> Self {
		self.idempotent = idempotent;

		self
	}

	/// Marks the method as safe; safe methods are idempotent as well.
	pub fn safe(mut self, safe: bool) -> Self {
		self.safe = safe;
		self.idempotent |= safe;

		self
	}

	/// Freezes the descriptor into a shareable [`MethodKey`].
	pub fn into_key(self) -> MethodKey {
		MethodKey(Arc::new(self))
	}
}

/// Shared handle to a [`MethodDescriptor`].
///
/// Clones point at the same descriptor instance. `==` compares descriptors structurally, while
/// [`MethodKey::same_instance`] checks that two keys were cloned from one another.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct MethodKey(Arc<MethodDescriptor>);
impl MethodKey {
	/// Fully-qualified method name.
	pub fn full_name(&self) -> &str {
		&self.0.name
	}

	/// Service part of the fully-qualified name.
	pub fn service_name(&self) -> &str {
		self.0.name.service()
	}

	/// Underlying descriptor.
	pub fn descriptor(&self) -> &MethodDescriptor {
		&self.0
	}

	/// Returns true when both keys refer to the same descriptor instance.
	pub fn same_instance(&self, other: &MethodKey) -> bool {
		Arc::ptr_eq(&self.0, &other.0)
	}
}
impl From<MethodDescriptor> for MethodKey {
	fn from(value: MethodDescriptor) -> Self {
		value.into_key()
	}
}
impl Deref for MethodKey {
	type Target = MethodDescriptor;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
impl Debug for MethodKey {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("MethodKey").field(&self.0.name.as_ref()).field(&self.0.kind).finish()
	}
}
impl Display for MethodKey {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.full_name())
	}
}
impl Serialize for MethodKey {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		self.0.serialize(serializer)
	}
}
impl<'de> Deserialize<'de> for MethodKey {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: Deserializer<'de>,
	{
		MethodDescriptor::deserialize(deserializer).map(MethodDescriptor::into_key)
	}
}

fn validate_name(view: &str) -> Result<(), MethodNameError> {
	if view.is_empty() {
		return Err(MethodNameError::Empty);
	}
	if view.chars().any(char::is_whitespace) {
		return Err(MethodNameError::ContainsWhitespace { name: view.to_owned() });
	}

	let Some((service, method)) = view.split_once(METHOD_SEPARATOR) else {
		return Err(MethodNameError::MissingSeparator { name: view.to_owned() });
	};

	if method.contains(METHOD_SEPARATOR) {
		return Err(MethodNameError::MissingSeparator { name: view.to_owned() });
	}
	if service.is_empty() {
		return Err(MethodNameError::EmptyService { name: view.to_owned() });
	}
	if method.is_empty() {
		return Err(MethodNameError::EmptyMethod { name: view.to_owned() });
	}

	Ok(())
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn names_split_into_service_and_method() {
		let name = MethodName::new("pkg.Service/Method").expect("Method fixture should be valid.");

		assert_eq!(name.service(), "pkg.Service");
		assert_eq!(name.method(), "Method");
		assert_eq!(extract_service_name("pkg.Service/Method"), Some("pkg.Service"));
		assert_eq!(extract_service_name("no-separator"), None);
	}

	#[test]
	fn malformed_names_are_rejected() {
		assert_eq!(MethodName::new(""), Err(MethodNameError::Empty));
		assert!(matches!(
			MethodName::new("pkg.Service"),
			Err(MethodNameError::MissingSeparator { .. })
		));
		assert!(matches!(
			MethodName::new("a/b/c"),
			Err(MethodNameError::MissingSeparator { .. })
		));
		assert!(matches!(MethodName::new("/Method"), Err(MethodNameError::EmptyService { .. })));
		assert!(matches!(MethodName::new("pkg.Service/"), Err(MethodNameError::EmptyMethod { .. })));
		assert!(matches!(
			MethodName::new("pkg.Service/Do It"),
			Err(MethodNameError::ContainsWhitespace { .. })
		));
	}

	#[test]
	fn keys_compare_structurally_but_track_identity() {
		let key = MethodDescriptor::unary("pkg.Service/Method")
			.expect("Method fixture should be valid.")
			.into_key();
		let clone = key.clone();
		let look_alike = MethodDescriptor::unary("pkg.Service/Method")
			.expect("Method fixture should be valid.")
			.into_key();

		assert_eq!(key, look_alike);
		assert!(key.same_instance(&clone));
		assert!(!key.same_instance(&look_alike));
	}

	#[test]
	fn safe_implies_idempotent() {
		let descriptor = MethodDescriptor::new("pkg.Service/Get", MethodKind::ServerStreaming)
			.expect("Method fixture should be valid.")
			.safe(true);

		assert!(descriptor.idempotent);
		assert!(descriptor.kind.client_sends_one());
		assert!(!descriptor.kind.server_sends_one());
	}

	#[test]
	fn serde_round_trip_enforces_validation() {
		let key: MethodKey =
			serde_json::from_str(r#"{"name":"pkg.Service/Method","kind":"bidi_streaming"}"#)
				.expect("Descriptor should deserialize successfully.");

		assert_eq!(key.full_name(), "pkg.Service/Method");
		assert_eq!(key.kind, MethodKind::BidiStreaming);
		assert!(!key.idempotent);
		assert!(serde_json::from_str::<MethodKey>(r#"{"name":"pkg.Service"}"#).is_err());
	}
}
