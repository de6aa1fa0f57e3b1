// self
use crate::{
	_prelude::*,
	obs::{CredentialOutcome, RequestOutcome},
};

/// Records a request outcome via the global metrics recorder (when enabled).
pub fn record_request_outcome(method: &Method, outcome: RequestOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"asc_client_request_total",
			"method" => method.as_str().to_owned(),
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (method, outcome);
	}
}

/// Records a signing outcome via the global metrics recorder (when enabled).
pub fn record_credential_outcome(outcome: CredentialOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!("asc_client_token_mint_total", "outcome" => outcome.as_str()).increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = outcome;
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn recorders_noop_without_metrics() {
		record_request_outcome(&Method::GET, RequestOutcome::Failure);
		record_credential_outcome(CredentialOutcome::Minted);
	}
}
