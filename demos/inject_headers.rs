//! Builds a validated registry for a small service and attaches credentials to one of its calls.

// std
use std::{
	sync::{
		Arc,
		atomic::{AtomicU64, Ordering},
	},
	time::{SystemTime, UNIX_EPOCH},
};
// crates.io
use color_eyre::{Result, eyre::eyre};
use parking_lot::Mutex;
use tokio::sync::oneshot;
// self
use rpc_bindings::{
	credentials::{
		CallContext, CredentialMetadataInjector, CredentialSource, HeaderSet, MetadataFuture,
		RawMetadata, TokioExecutor,
	},
	registry::{BoundMethod, ServiceMethodRegistry},
	service::ServiceContract,
	status::Status,
	url::Url,
};

type Outcome = Result<Arc<HeaderSet>, Status>;

const CONTRACT: &str = r#"{
	"name": "demo.Greeter",
	"methods": [
		{ "name": "demo.Greeter/SayHello", "safe": true },
		{ "name": "demo.Greeter/Chat", "kind": "bidi_streaming" }
	]
}"#;

/// Issues a fresh token on every other fetch so the demo shows both cache hits and misses.
#[derive(Default)]
struct RotatingSource {
	fetches: AtomicU64,
	current: Mutex<Option<Arc<RawMetadata>>>,
}
impl CredentialSource for RotatingSource {
	fn metadata_for_audience<'a>(&'a self, audience: &'a Url) -> MetadataFuture<'a> {
		Box::pin(async move {
			let fetch = self.fetches.fetch_add(1, Ordering::SeqCst);
			let mut current = self.current.lock();

			if fetch.is_multiple_of(2) || current.is_none() {
				let issued_at = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs();
				let mut raw = RawMetadata::new();

				raw.insert("authorization".into(), vec![format!("Bearer demo-{fetch}-{issued_at}")]);
				raw.insert("x-audience".into(), vec![audience.to_string()]);
				raw.insert("trace-bin".into(), vec!["ZGVtbw".into()]);
				*current = Some(Arc::new(raw));
			}

			Ok(current.clone())
		})
	}
}

async fn say_hello(name: String) -> Result<String, Status> {
	Ok(format!("Hello, {name}!"))
}

async fn chat(message: String) -> Result<String, Status> {
	Ok(message)
}

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let contract = ServiceContract::from_json(CONTRACT)?;
	let mut builder = ServiceMethodRegistry::builder(contract.clone());

	for method in contract.methods() {
		builder = match method.name.method() {
			"SayHello" => builder.add_method(method.clone(), say_hello)?,
			_ => builder.add_method(method.clone(), chat)?,
		};
	}

	let registry = builder.build()?;
	let hello = registry
		.lookup_or_unimplemented("demo.Greeter/SayHello")?
		.handler::<String, String>()
		.ok_or_else(|| eyre!("SayHello is bound with unexpected types"))?;

	println!("registry: {:?}", registry.methods().map(BoundMethod::name).collect::<Vec<_>>());
	println!("handler: {}", hello.call("rpc-bindings".into()).await?);

	let executor = TokioExecutor::try_current().ok_or_else(|| eyre!("no tokio runtime"))?;
	let injector = CredentialMetadataInjector::new(Arc::new(RotatingSource::default()));
	let say_hello = registry.lookup_or_unimplemented("demo.Greeter/SayHello")?.method().clone();

	for authority in ["api.example.com", "api.example.com:443", "api.example.com:8443"] {
		let (tx, rx) = oneshot::channel();

		injector.apply_metadata(
			CallContext::new(say_hello.clone()).with_authority(authority),
			&executor,
			move |outcome: Outcome| {
				let _ = tx.send(outcome);
			},
		);

		let headers = rx.await??;

		println!("{authority}:");

		for entry in headers.iter() {
			println!("  {} = {:?}", entry.key, entry.value);
		}
	}

	let (tx, rx) = oneshot::channel();

	injector.apply_metadata(CallContext::new(say_hello), &executor, move |outcome: Outcome| {
		let _ = tx.send(outcome);
	});

	if let Err(status) = rx.await? {
		println!("without authority: {status}");
	}

	Ok(())
}
