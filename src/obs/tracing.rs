// crates.io
use tracing::{Instrument, Span, instrument::Instrumented};
// self
use crate::{_prelude::*, oauth::GrantType, session::Verb};

/// A span builder used by the executor and the OAuth manager.
#[derive(Clone, Debug)]
pub struct CallSpan {
	span: Span,
}
impl CallSpan {
	/// Span for one executor call.
	pub fn api(verb: Verb, action: &str) -> Self {
		Self { span: tracing::info_span!("bookshare_api.call", verb = verb.as_str(), action) }
	}

	/// Span for one OAuth grant.
	pub fn oauth(grant: GrantType) -> Self {
		Self { span: tracing::info_span!("bookshare_api.oauth", grant = grant.as_str()) }
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> Instrumented<Fut>
	where
		Fut: Future,
	{
		fut.instrument(self.span.clone())
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[tokio::test]
	async fn instrument_wraps_future() {
		let span = CallSpan::api(Verb::Get, "/v2/titles");
		let value = CallSpan::instrument(&span, async { 42 }).await;

		assert_eq!(value, 42);
	}
}
