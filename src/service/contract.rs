//! Immutable service contracts listing the methods a service declares.

// std
use std::collections::HashSet;
// crates.io
use serde::Deserializer;
// self
use crate::{_prelude::*, service::MethodKey};

/// Errors raised while constructing or loading a [`ServiceContract`].
#[derive(Debug, ThisError)]
pub enum ContractError {
	/// The service name was empty.
	#[error("Service name cannot be empty.")]
	EmptyServiceName,
	/// A declared method belongs to another service.
	#[error("Method `{method}` does not belong to service `{service}`.")]
	ForeignMethod {
		/// Declared service name.
		service: String,
		/// Offending fully-qualified method name.
		method: String,
	},
	/// A method name was declared twice.
	#[error("Method `{method}` is declared more than once.")]
	DuplicateMethod {
		/// Offending fully-qualified method name.
		method: String,
	},
	/// The JSON document could not be parsed.
	#[error("Service contract JSON is malformed at `{path}`.")]
	Parse {
		/// JSON path of the offending field.
		path: String,
		/// Underlying parsing failure.
		#[source]
		source: serde_json::Error,
	},
}

/// Declared service name plus its methods in declaration order.
///
/// Contracts are built once at service-definition time. The [`MethodKey`]s they hold are the
/// canonical descriptor instances; server bindings must reuse them (see
/// [`ServiceMethodRegistryBuilder`](crate::registry::ServiceMethodRegistryBuilder)).
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ServiceContract {
	name: String,
	methods: Vec<MethodKey>,
}
impl ServiceContract {
	/// Creates a contract after validating the name and the declared methods.
	pub fn new<I>(name: impl Into<String>, methods: I) -> Result<Self, ContractError>
	where
		I: IntoIterator<Item = MethodKey>,
	{
		let contract = Self { name: name.into(), methods: methods.into_iter().collect() };

		contract.validate()?;

		Ok(contract)
	}

	/// Parses a contract from JSON, reporting the path of the first malformed field.
	pub fn from_json(payload: &str) -> Result<Self, ContractError> {
		let mut deserializer = serde_json::Deserializer::from_str(payload);

		serde_path_to_error::deserialize(&mut deserializer).map_err(|e| ContractError::Parse {
			path: e.path().to_string(),
			source: e.into_inner(),
		})
	}

	/// Declared service name.
	pub fn name(&self) -> &str {
		&self.name
	}

	/// Declared methods in contract order.
	pub fn methods(&self) -> &[MethodKey] {
		&self.methods
	}

	/// Returns the contract's own descriptor instance for `full_name`, if declared.
	pub fn method(&self, full_name: &str) -> Option<&MethodKey> {
		self.methods.iter().find(|method| method.full_name() == full_name)
	}

	fn validate(&self) -> Result<(), ContractError> {
		if self.name.is_empty() {
			return Err(ContractError::EmptyServiceName);
		}

		let mut seen = HashSet::with_capacity(self.methods.len());

		for method in &self.methods {
			if method.service_name() != self.name {
				return Err(ContractError::ForeignMethod {
					service: self.name.clone(),
					method: method.full_name().to_owned(),
				});
			}
			if !seen.insert(method.full_name()) {
				return Err(ContractError::DuplicateMethod {
					method: method.full_name().to_owned(),
				});
			}
		}

		Ok(())
	}
}
impl<'de> Deserialize<'de> for ServiceContract {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: Deserializer<'de>,
	{
		#[derive(Deserialize)]
		struct Raw {
			name: String,
			#[serde(default)]
			methods: Vec<MethodKey>,
		}

		let raw = Raw::deserialize(deserializer)?;

		Self::new(raw.name, raw.methods).map_err(serde::de::Error::custom)
	}
}
