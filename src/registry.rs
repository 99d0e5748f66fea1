//! Server-side method registries binding typed handlers to a [`ServiceContract`].
//!
//! Registries are assembled through [`ServiceMethodRegistryBuilder`], which refuses to freeze
//! unless the bindings cover the contract exactly and reuse the contract's own descriptor
//! instances. Once built, a [`ServiceMethodRegistry`] is immutable and can be shared by any
//! number of dispatching threads without locking.

/// Builder API that validates bindings against a service contract.
pub mod builder;

pub use builder::*;

// std
use std::any;
// self
use crate::{
	_prelude::*,
	service::{MethodKey, ServiceContract},
	status::Status,
};

/// Boxed future returned by [`ServerCallHandler::call`].
pub type HandlerFuture<'a, Resp> = Pin<Box<dyn Future<Output = Result<Resp, Status>> + 'a + Send>>;

/// Typed handler invoked by the transport layer for a single method.
///
/// Async closures `Fn(Req) -> impl Future<Output = Result<Resp, Status>>` implement the trait
/// directly.
pub trait ServerCallHandler<Req, Resp>
where
	Self: Send + Sync,
{
	/// Handles one decoded request.
	fn call(&self, request: Req) -> HandlerFuture<'_, Resp>;
}
impl<Req, Resp, F, Fut> ServerCallHandler<Req, Resp> for F
where
	F: Send + Sync + Fn(Req) -> Fut,
	Fut: 'static + Send + Future<Output = Result<Resp, Status>>,
{
	fn call(&self, request: Req) -> HandlerFuture<'_, Resp> {
		Box::pin(self(request))
	}
}

/// Typed handler reference recovered from a [`BoundMethod`].
pub type SharedHandler<Req, Resp> = Arc<dyn ServerCallHandler<Req, Resp>>;

/// A method descriptor paired with its type-erased handler.
#[derive(Clone)]
pub struct BoundMethod {
	method: MethodKey,
	handler: Arc<dyn Any + Send + Sync>,
	request_type: &'static str,
	response_type: &'static str,
}
impl BoundMethod {
	/// Binds `handler` to `method`.
	pub fn new<Req, Resp, H>(method: MethodKey, handler: H) -> Self
	where
		Req: 'static,
		Resp: 'static,
		H: 'static + ServerCallHandler<Req, Resp>,
	{
		let handler: SharedHandler<Req, Resp> = Arc::new(handler);

		Self {
			method,
			handler: Arc::new(handler),
			request_type: any::type_name::<Req>(),
			response_type: any::type_name::<Resp>(),
		}
	}

	/// Returns a copy bound to a different handler; the descriptor instance is kept.
	pub fn with_handler<Req, Resp, H>(&self, handler: H) -> Self
	where
		Req: 'static,
		Resp: 'static,
		H: 'static + ServerCallHandler<Req, Resp>,
	{
		Self::new(self.method.clone(), handler)
	}

	/// Bound method descriptor.
	pub fn method(&self) -> &MethodKey {
		&self.method
	}

	/// Fully-qualified method name.
	pub fn name(&self) -> &str {
		self.method.full_name()
	}

	/// Recovers the typed handler, or `None` when `Req`/`Resp` do not match the bound types.
	pub fn handler<Req, Resp>(&self) -> Option<SharedHandler<Req, Resp>>
	where
		Req: 'static,
		Resp: 'static,
	{
		self.handler.downcast_ref::<SharedHandler<Req, Resp>>().cloned()
	}
}
impl Debug for BoundMethod {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("BoundMethod")
			.field("method", &self.method)
			.field("request_type", &self.request_type)
			.field("response_type", &self.response_type)
			.finish()
	}
}

/// Frozen mapping from fully-qualified method names to bound methods.
#[derive(Clone, Debug)]
pub struct ServiceMethodRegistry {
	contract: ServiceContract,
	methods: HashMap<String, BoundMethod>,
}
impl ServiceMethodRegistry {
	/// Creates a new builder for the provided contract.
	pub fn builder(contract: ServiceContract) -> ServiceMethodRegistryBuilder {
		ServiceMethodRegistryBuilder::new(contract)
	}

	/// Contract the registry was validated against.
	pub fn contract(&self) -> &ServiceContract {
		&self.contract
	}

	/// Declared service name.
	pub fn service_name(&self) -> &str {
		self.contract.name()
	}

	/// Looks up a method by its fully-qualified name (no leading slash).
	pub fn lookup(&self, full_name: &str) -> Option<&BoundMethod> {
		self.methods.get(full_name)
	}

	/// Like [`lookup`](Self::lookup), but maps a miss to an `UNIMPLEMENTED` status for the
	/// caller to send back.
	pub fn lookup_or_unimplemented(&self, full_name: &str) -> Result<&BoundMethod, Status> {
		self.lookup(full_name).ok_or_else(|| {
			Status::unimplemented().with_description(format!("Method not found: {full_name}."))
		})
	}

	/// Iterator over every bound method, in no particular order.
	pub fn methods(&self) -> impl Iterator<Item = &BoundMethod> {
		self.methods.values()
	}

	/// Number of bound methods.
	pub fn len(&self) -> usize {
		self.methods.len()
	}

	/// Returns true when the contract declares no methods.
	pub fn is_empty(&self) -> bool {
		self.methods.is_empty()
	}
}
