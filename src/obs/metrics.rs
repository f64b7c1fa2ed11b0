// self
use crate::{obs::CallOutcome, oauth::GrantType, session::Verb};

/// Records an executor outcome via the global metrics recorder (when enabled).
pub fn record_call_outcome(verb: Verb, outcome: CallOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"bookshare_api_call_total",
			"verb" => verb.as_str(),
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (verb, outcome);
	}
}

/// Records an OAuth grant outcome via the global metrics recorder (when enabled).
pub fn record_oauth_outcome(grant: GrantType, outcome: CallOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"bookshare_api_oauth_total",
			"grant" => grant.as_str(),
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (grant, outcome);
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn recording_without_recorder_is_noop() {
		record_call_outcome(Verb::Post, CallOutcome::SoftFailure);
		record_oauth_outcome(GrantType::RefreshToken, CallOutcome::Failure);
	}
}
