//! Observability helpers for service calls and OAuth grants.
//!
//! Every executor call runs inside a `bookshare_api.call` span carrying `verb` and `action`
//! fields, and every OAuth grant inside a `bookshare_api.oauth` span carrying `grant`.
//!
//! # Feature Flags
//!
//! - Enable `metrics` to increment `bookshare_api_call_total` (labeled by `verb` + `outcome`)
//!   and `bookshare_api_oauth_total` (labeled by `grant` + `outcome`).

mod metrics;
mod tracing;

pub use self::{metrics::*, tracing::*};

// self
use crate::_prelude::*;

/// Outcome labels recorded for each call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CallOutcome {
	/// Entry to the executor.
	Attempt,
	/// Usable response.
	Success,
	/// Success status carrying an error page instead of data.
	SoftFailure,
	/// Error status or transport failure.
	Failure,
}
impl CallOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			CallOutcome::Attempt => "attempt",
			CallOutcome::Success => "success",
			CallOutcome::SoftFailure => "soft_failure",
			CallOutcome::Failure => "failure",
		}
	}
}
impl Display for CallOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
