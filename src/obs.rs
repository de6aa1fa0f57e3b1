//! Optional observability helpers for the request pipeline.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to run every request inside an `asc_client.request` span (`method`, `path`
//!   fields) and every signing operation inside an `asc_client.credential` span (`kid` field).
//! - Enable `metrics` to increment `asc_client_request_total` (labels `method` + `outcome`) and
//!   `asc_client_token_mint_total` (label `outcome`).
//!
//! Nothing is emitted when both features are disabled.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Outcome labels recorded for each request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RequestOutcome {
	/// Entry to the executor.
	Attempt,
	/// Status below 400.
	Success,
	/// Status 400 or above.
	ApiError,
	/// Network, timeout, or deadline failure.
	TransportError,
	/// Any other failure (credential, configuration, encoding).
	Failure,
}
impl RequestOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			RequestOutcome::Attempt => "attempt",
			RequestOutcome::Success => "success",
			RequestOutcome::ApiError => "api_error",
			RequestOutcome::TransportError => "transport_error",
			RequestOutcome::Failure => "failure",
		}
	}

	/// Classifies a finished request.
	pub fn of<T>(result: &Result<T>) -> Self {
		match result {
			Ok(_) => Self::Success,
			Err(Error::Api(_)) => Self::ApiError,
			Err(Error::Transport(_)) => Self::TransportError,
			Err(_) => Self::Failure,
		}
	}
}
impl Display for RequestOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each signing operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CredentialOutcome {
	/// A credential was minted.
	Minted,
	/// Signing failed.
	Failure,
}
impl CredentialOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			CredentialOutcome::Minted => "minted",
			CredentialOutcome::Failure => "failure",
		}
	}
}
impl Display for CredentialOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
