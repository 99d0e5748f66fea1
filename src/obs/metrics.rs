// self
use crate::obs::{CacheResult, InjectionOutcome};

/// Records an injection outcome via the global metrics recorder (when enabled).
pub fn record_injection_outcome(outcome: InjectionOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!("rpc_bindings_call_credentials_total", "outcome" => outcome.as_str())
			.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = outcome;
	}
}

/// Records a header cache lookup via the global metrics recorder (when enabled).
pub fn record_cache_result(result: CacheResult) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!("rpc_bindings_header_cache_total", "result" => result.as_str())
			.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = result;
	}
}
