//! Wire header model and the raw-metadata encoder.

// std
use std::ops::Deref;
// crates.io
use base64::{
	Engine as _, alphabet,
	engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
};
// self
use crate::{_prelude::*, credentials::RawMetadata};

/// Key suffix marking binary-valued headers.
pub const BINARY_HEADER_SUFFIX: &str = "-bin";

// Credential libraries are inconsistent about padding; accept both forms.
const BINARY_VALUE_ENGINE: GeneralPurpose = GeneralPurpose::new(
	&alphabet::STANDARD,
	GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Errors raised while encoding credential metadata into headers.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum EncodeError {
	/// The header key is empty or contains characters outside `[0-9a-z_.-]`.
	#[error("Header key `{key}` is invalid.")]
	InvalidKey {
		/// Offending key as supplied.
		key: String,
	},
	/// A `-bin` value is not valid base64.
	#[error("Value for binary header `{key}` is not valid base64.")]
	InvalidBinaryValue {
		/// Header key.
		key: String,
		/// Decoder failure.
		#[source]
		source: base64::DecodeError,
	},
	/// A text value was inserted under a binary key or vice versa.
	#[error("Header `{key}` does not accept {kind} values.")]
	ValueKindMismatch {
		/// Header key.
		key: String,
		/// Rejected value kind.
		kind: &'static str,
	},
}

/// Normalized (lower-case) header key.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HeaderKey(String);
impl HeaderKey {
	/// Lower-cases and validates `name`.
	pub fn new(name: impl AsRef<str>) -> Result<Self, EncodeError> {
		let normalized = name.as_ref().to_ascii_lowercase();
		let valid = !normalized.is_empty()
			&& normalized
				.bytes()
				.all(|b| b.is_ascii_digit() || b.is_ascii_lowercase() || b"-_.".contains(&b));

		if valid {
			Ok(Self(normalized))
		} else {
			Err(EncodeError::InvalidKey { key: name.as_ref().to_owned() })
		}
	}

	/// Returns true when the key carries binary values.
	pub fn is_binary(&self) -> bool {
		self.0.ends_with(BINARY_HEADER_SUFFIX)
	}
}
impl Deref for HeaderKey {
	type Target = str;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
impl AsRef<str> for HeaderKey {
	fn as_ref(&self) -> &str {
		&self.0
	}
}
impl Debug for HeaderKey {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "HeaderKey({})", self.0)
	}
}
impl Display for HeaderKey {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.0)
	}
}

/// Single header value.
#[derive(Clone, PartialEq, Eq, Hash)]
pub enum HeaderValue {
	/// ASCII text value, sent as-is.
	Text(String),
	/// Raw bytes, base64-encoded again by the transport.
	Binary(Vec<u8>),
}
impl HeaderValue {
	/// Text view, if this is a text value.
	pub fn as_text(&self) -> Option<&str> {
		match self {
			Self::Text(text) => Some(text),
			Self::Binary(_) => None,
		}
	}

	/// Byte view, if this is a binary value.
	pub fn as_bytes(&self) -> Option<&[u8]> {
		match self {
			Self::Text(_) => None,
			Self::Binary(bytes) => Some(bytes),
		}
	}

	const fn kind(&self) -> &'static str {
		match self {
			Self::Text(_) => "text",
			Self::Binary(_) => "binary",
		}
	}
}
impl Debug for HeaderValue {
	// Header values are usually bearer tokens.
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		match self {
			Self::Text(_) => f.debug_tuple("Text").field(&"<redacted>").finish(),
			Self::Binary(bytes) => f.debug_tuple("Binary").field(&bytes.len()).finish(),
		}
	}
}

/// Header key paired with one value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HeaderEntry {
	/// Header key.
	pub key: HeaderKey,
	/// Header value.
	pub value: HeaderValue,
}

/// Ordered multimap of outgoing headers.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HeaderSet {
	entries: Vec<HeaderEntry>,
}
impl HeaderSet {
	/// Appends a value; existing values under the same key are kept.
	pub fn insert(&mut self, key: HeaderKey, value: HeaderValue) -> Result<(), EncodeError> {
		if key.is_binary() != matches!(value, HeaderValue::Binary(_)) {
			return Err(EncodeError::ValueKindMismatch { key: key.0, kind: value.kind() });
		}

		self.entries.push(HeaderEntry { key, value });

		Ok(())
	}

	/// Last value inserted under `key`.
	pub fn get(&self, key: &str) -> Option<&HeaderValue> {
		self.get_all(key).next_back()
	}

	/// Every value under `key`, in insertion order.
	pub fn get_all<'a>(&'a self, key: &str) -> impl DoubleEndedIterator<Item = &'a HeaderValue> {
		self.entries
			.iter()
			.filter(move |entry| entry.key.eq_ignore_ascii_case(key))
			.map(|entry| &entry.value)
	}

	/// Returns true if at least one value exists under `key`.
	pub fn contains_key(&self, key: &str) -> bool {
		self.get_all(key).next().is_some()
	}

	/// Iterator over all entries in insertion order.
	pub fn iter(&self) -> impl Iterator<Item = &HeaderEntry> {
		self.entries.iter()
	}

	/// Number of entries (not distinct keys).
	pub fn len(&self) -> usize {
		self.entries.len()
	}

	/// Returns true when no headers are present.
	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}
}
impl<'a> IntoIterator for &'a HeaderSet {
	type IntoIter = std::slice::Iter<'a, HeaderEntry>;
	type Item = &'a HeaderEntry;

	fn into_iter(self) -> Self::IntoIter {
		self.entries.iter()
	}
}

/// Encodes raw credential metadata into wire headers.
///
/// Keys ending in [`BINARY_HEADER_SUFFIX`] have every value base64-decoded into a binary entry;
/// other values are inserted as text unchanged. Each value becomes its own entry, following the
/// mapping's key order and each key's value order. `None` encodes to an empty set.
pub fn encode_metadata(raw: Option<&RawMetadata>) -> Result<HeaderSet, EncodeError> {
	let mut headers = HeaderSet::default();
	let Some(raw) = raw else {
		return Ok(headers);
	};

	for (name, values) in raw {
		let key = HeaderKey::new(name)?;

		for value in values {
			let value = if key.is_binary() {
				HeaderValue::Binary(BINARY_VALUE_ENGINE.decode(value).map_err(|source| {
					EncodeError::InvalidBinaryValue { key: key.to_string(), source }
				})?)
			} else {
				HeaderValue::Text(value.clone())
			};

			headers.insert(key.clone(), value)?;
		}
	}

	Ok(headers)
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::_preludet::raw_metadata;

	#[test]
	fn binary_keys_are_base64_decoded() {
		let raw = raw_metadata([("token-bin", &["QUJD"][..]), ("token", &["xyz"][..])]);
		let headers = encode_metadata(Some(&raw)).expect("Metadata fixture should encode.");

		assert_eq!(headers.get("token-bin").and_then(HeaderValue::as_bytes), Some(&b"ABC"[..]));
		assert_eq!(headers.get("token").and_then(HeaderValue::as_text), Some("xyz"));
		assert_eq!(headers.len(), 2);
	}

	#[test]
	fn multiple_values_become_separate_entries() {
		let raw = raw_metadata([("x-scope", &["a", "b"][..]), ("trace-bin", &["AQ==", "Ag"][..])]);
		let headers = encode_metadata(Some(&raw)).expect("Metadata fixture should encode.");
		let scopes =
			headers.get_all("x-scope").filter_map(HeaderValue::as_text).collect::<Vec<_>>();
		let traces =
			headers.get_all("trace-bin").filter_map(HeaderValue::as_bytes).collect::<Vec<_>>();

		assert_eq!(scopes, ["a", "b"]);
		assert_eq!(traces, [&[1_u8][..], &[2_u8][..]]);
		assert_eq!(headers.get("x-scope").and_then(HeaderValue::as_text), Some("b"));
	}

	#[test]
	fn lookups_outlive_the_key_they_were_made_with() {
		let raw = raw_metadata([("authorization", &["Bearer a"][..])]);
		let headers = encode_metadata(Some(&raw)).expect("Metadata fixture should encode.");
		let value = {
			let key = String::from("Authorization");

			headers.get(&key)
		};

		assert_eq!(value.and_then(HeaderValue::as_text), Some("Bearer a"));
	}

	#[test]
	fn absent_metadata_encodes_to_nothing() {
		assert!(encode_metadata(None).expect("Absent metadata should encode.").is_empty());
		assert!(
			encode_metadata(Some(&RawMetadata::new()))
				.expect("Empty metadata should encode.")
				.is_empty()
		);
	}

	#[test]
	fn keys_are_normalized_and_validated() {
		let raw = raw_metadata([("Authorization", &["Bearer abc"][..])]);
		let headers = encode_metadata(Some(&raw)).expect("Mixed-case key should normalize.");
		let entry = headers.iter().next().expect("One entry should be present.");

		assert_eq!(&*entry.key, "authorization");
		assert!(matches!(
			encode_metadata(Some(&raw_metadata([("bad key", &["v"][..])]))),
			Err(EncodeError::InvalidKey { .. })
		));
		assert!(matches!(
			encode_metadata(Some(&raw_metadata([("token-bin", &["%%%"][..])]))),
			Err(EncodeError::InvalidBinaryValue { .. })
		));
	}

	#[test]
	fn header_set_rejects_mismatched_value_kinds() {
		let mut headers = HeaderSet::default();
		let key = HeaderKey::new("token-bin").expect("Key fixture should be valid.");

		assert!(matches!(
			headers.insert(key, HeaderValue::Text("plain".into())),
			Err(EncodeError::ValueKindMismatch { kind: "text", .. })
		));
		assert!(headers.is_empty());
	}

	#[test]
	fn header_values_are_redacted_in_debug_output() {
		let value = HeaderValue::Text("Bearer secret".into());

		assert_eq!(format!("{value:?}"), "Text(\"<redacted>\")");
	}
}
