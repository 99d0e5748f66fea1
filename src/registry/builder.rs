// self
use crate::{
	_prelude::*,
	registry::{BoundMethod, ServerCallHandler, ServiceMethodRegistry},
	service::{MethodKey, ServiceContract},
};

/// Errors raised while binding methods or freezing a registry.
///
/// Every variant describes a service-wiring defect; none of them are worth retrying.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum RegistryError {
	/// The method belongs to another service.
	#[error(
		"Service name mismatch. Expected service name: `{expected}`. Actual method name: `{method}`."
	)]
	ContractMismatch {
		/// Service name declared by the contract.
		expected: String,
		/// Fully-qualified name of the rejected method.
		method: String,
	},
	/// A handler is already bound under the same name.
	#[error("Method by same name already registered: `{method}`.")]
	DuplicateBinding {
		/// Fully-qualified method name.
		method: String,
	},
	/// A contract method has no handler.
	#[error("No method bound for contract entry `{method}`.")]
	MissingBinding {
		/// Fully-qualified method name.
		method: String,
	},
	/// The bound descriptor is not the contract's own instance.
	#[error("Bound method for `{method}` is not the same instance as the contract's descriptor.")]
	DescriptorIdentityMismatch {
		/// Fully-qualified method name.
		method: String,
	},
	/// A binding has no matching contract entry.
	#[error("No contract entry matches bound method `{method}`.")]
	UnknownBinding {
		/// Fully-qualified method name.
		method: String,
	},
}

/// Accumulates bindings for a [`ServiceMethodRegistry`].
///
/// Bindings are keyed by fully-qualified name in sorted order, so when several bindings fall
/// outside the contract [`build`](Self::build) reports the lexicographically smallest one.
#[derive(Debug)]
pub struct ServiceMethodRegistryBuilder {
	contract: ServiceContract,
	bindings: BTreeMap<String, BoundMethod>,
}
impl ServiceMethodRegistryBuilder {
	/// Creates an empty builder for the provided contract.
	pub fn new(contract: ServiceContract) -> Self {
		Self { contract, bindings: BTreeMap::new() }
	}

	/// Contract the bindings are validated against.
	pub fn contract(&self) -> &ServiceContract {
		&self.contract
	}

	/// Bindings accepted so far, sorted by fully-qualified name.
	pub fn bindings(&self) -> impl Iterator<Item = &BoundMethod> {
		self.bindings.values()
	}

	/// Binds `handler` to `method`.
	pub fn add_method<Req, Resp, H>(
		self,
		method: MethodKey,
		handler: H,
	) -> Result<Self, RegistryError>
	where
		Req: 'static,
		Resp: 'static,
		H: 'static + ServerCallHandler<Req, Resp>,
	{
		self.add_bound_method(BoundMethod::new(method, handler))
	}

	/// Adds a pre-built binding.
	pub fn add_bound_method(mut self, bound: BoundMethod) -> Result<Self, RegistryError> {
		let name = bound.name().to_owned();

		if bound.method().service_name() != self.contract.name() {
			return Err(RegistryError::ContractMismatch {
				expected: self.contract.name().to_owned(),
				method: name,
			});
		}
		if self.bindings.contains_key(&name) {
			return Err(RegistryError::DuplicateBinding { method: name });
		}

		self.bindings.insert(name, bound);

		Ok(self)
	}

	/// Validates the bindings against the contract and freezes them.
	pub fn build(self) -> Result<ServiceMethodRegistry, RegistryError> {
		let mut unmatched = self
			.bindings
			.iter()
			.map(|(name, bound)| (name.as_str(), bound))
			.collect::<BTreeMap<_, _>>();

		for declared in self.contract.methods() {
			let bound = unmatched.remove(declared.full_name()).ok_or_else(|| {
				RegistryError::MissingBinding { method: declared.full_name().to_owned() }
			})?;

			if !bound.method().same_instance(declared) {
				return Err(RegistryError::DescriptorIdentityMismatch {
					method: declared.full_name().to_owned(),
				});
			}
		}

		if let Some((name, _)) = unmatched.first_key_value() {
			return Err(RegistryError::UnknownBinding { method: (*name).to_owned() });
		}

		Ok(ServiceMethodRegistry {
			contract: self.contract,
			methods: self.bindings.into_iter().collect(),
		})
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::{_preludet::*, status::Status};

	async fn noop(_: ()) -> Result<(), Status> {
		Ok(())
	}

	#[test]
	fn add_method_rejects_foreign_services_and_duplicates() {
		let contract = contract("pkg.Service", &["A"]);
		let declared = contract.methods()[0].clone();
		let err = ServiceMethodRegistry::builder(contract.clone())
			.add_method(unary("other.Service/A"), noop)
			.expect_err("Foreign method should be rejected.");

		assert_eq!(
			err,
			RegistryError::ContractMismatch {
				expected: "pkg.Service".into(),
				method: "other.Service/A".into(),
			}
		);

		let err = ServiceMethodRegistry::builder(contract)
			.add_method(declared.clone(), noop)
			.and_then(|builder| builder.add_method(declared, noop))
			.expect_err("Second binding under the same name should be rejected.");

		assert_eq!(err, RegistryError::DuplicateBinding { method: "pkg.Service/A".into() });
	}

	#[test]
	fn accepted_bindings_are_only_reachable_through_validation() {
		let contract = contract("pkg.Service", &["B", "A"]);
		let [b, a] = [contract.methods()[0].clone(), contract.methods()[1].clone()];
		let builder = ServiceMethodRegistry::builder(contract)
			.add_method(b, noop)
			.and_then(|builder| builder.add_method(a, noop))
			.expect("Declared methods should be accepted.");
		let names = builder.bindings().map(BoundMethod::name).collect::<Vec<_>>();

		assert_eq!(builder.contract().name(), "pkg.Service");
		assert_eq!(names, ["pkg.Service/A", "pkg.Service/B"]);
		assert!(matches!(
			builder.add_method(unary("other.Service/A"), noop),
			Err(RegistryError::ContractMismatch { .. })
		));
	}

	#[test]
	fn build_reports_missing_bindings_in_contract_order() {
		let contract = contract("pkg.Service", &["B", "A"]);
		let err = ServiceMethodRegistry::builder(contract)
			.build()
			.expect_err("Unbound contract methods should be rejected.");

		assert_eq!(err, RegistryError::MissingBinding { method: "pkg.Service/B".into() });
	}

	#[test]
	fn build_rejects_look_alike_descriptors() {
		let contract = contract("pkg.Service", &["A"]);
		let look_alike = unary("pkg.Service/A");

		assert_eq!(&look_alike, &contract.methods()[0]);

		let err = ServiceMethodRegistry::builder(contract)
			.add_method(look_alike, noop)
			.expect("Structurally valid binding should be accepted.")
			.build()
			.expect_err("Look-alike descriptor should be rejected.");

		assert_eq!(
			err,
			RegistryError::DescriptorIdentityMismatch { method: "pkg.Service/A".into() }
		);
	}

	#[test]
	fn build_reports_smallest_unknown_binding() {
		let contract = contract("pkg.Service", &["A"]);
		let declared = contract.methods()[0].clone();
		let err = ServiceMethodRegistry::builder(contract)
			.add_method(unary("pkg.Service/Zeta"), noop)
			.and_then(|builder| builder.add_method(declared, noop))
			.and_then(|builder| builder.add_method(unary("pkg.Service/Beta"), noop))
			.expect("Bindings under the contract's service should be accepted.")
			.build()
			.expect_err("Extra bindings should be rejected.");

		assert_eq!(err, RegistryError::UnknownBinding { method: "pkg.Service/Beta".into() });
	}
}
