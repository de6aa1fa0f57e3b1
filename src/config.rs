//! Validated client configuration.
//!
//! [`ClientConfig`] carries the knobs of the request pipeline: the service base URL, the credential
//! lifetime, the refresh buffer, the per-request timeout, and the `User-Agent` header. Build it with
//! [`ClientConfig::builder`] so invariants are checked once, up front.

// self
use crate::{
	_prelude::*,
	auth::{DEFAULT_REFRESH_BUFFER, DEFAULT_TOKEN_DURATION},
};

/// Production App Store Connect API root.
pub const DEFAULT_BASE_URL: &str = "https://api.appstoreconnect.apple.com/v1";
/// Default per-request timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::seconds(30);
/// Longest credential lifetime the service accepts.
pub const MAX_TOKEN_DURATION: Duration = Duration::minutes(20);
/// Default `User-Agent` header.
pub const DEFAULT_USER_AGENT: &str = concat!("asc-client/", env!("CARGO_PKG_VERSION"));

/// Errors raised while validating a [`ClientConfig`].
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum ClientConfigError {
	/// Base URL is not valid.
	#[error("Base URL `{url}` is invalid: {reason}.")]
	InvalidBaseUrl {
		/// Offending URL.
		url: String,
		/// Why the URL was rejected.
		reason: &'static str,
	},
	/// Token duration is zero, negative, or beyond the service maximum.
	#[error("Token duration must be positive and at most {max}.")]
	TokenDurationOutOfRange {
		/// Maximum accepted duration.
		max: Duration,
	},
	/// Refresh buffer is negative or not shorter than the token duration.
	#[error("Refresh buffer must be non-negative and shorter than the token duration.")]
	RefreshBufferOutOfRange,
	/// Request timeout is zero or negative.
	#[error("Request timeout must be positive.")]
	NonPositiveTimeout,
	/// `User-Agent` value cannot be sent as a header.
	#[error("User agent must be non-empty visible ASCII.")]
	InvalidUserAgent,
}

/// Immutable configuration consumed by [`ApiClient`](crate::http::ApiClient).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientConfig {
	/// API root that request paths are appended to.
	pub base_url: Url,
	/// Lifetime of minted credentials.
	pub token_duration: Duration,
	/// Margin before expiry at which the cached credential is refreshed.
	pub refresh_buffer: Duration,
	/// Per-request timeout.
	pub request_timeout: Duration,
	/// `User-Agent` header value.
	pub user_agent: String,
}
impl ClientConfig {
	/// Creates a builder seeded with the defaults.
	pub fn builder() -> ClientConfigBuilder {
		ClientConfigBuilder::default()
	}

	fn validate(&self) -> Result<(), ClientConfigError> {
		validate_base_url(&self.base_url)?;

		if !self.token_duration.is_positive() || self.token_duration > MAX_TOKEN_DURATION {
			return Err(ClientConfigError::TokenDurationOutOfRange { max: MAX_TOKEN_DURATION });
		}
		if self.refresh_buffer.is_negative() || self.refresh_buffer >= self.token_duration {
			return Err(ClientConfigError::RefreshBufferOutOfRange);
		}
		if !self.request_timeout.is_positive() {
			return Err(ClientConfigError::NonPositiveTimeout);
		}
		if self.user_agent.is_empty()
			|| !self.user_agent.bytes().all(|b| b == b' ' || b.is_ascii_graphic())
		{
			return Err(ClientConfigError::InvalidUserAgent);
		}

		Ok(())
	}
}
impl Default for ClientConfig {
	fn default() -> Self {
		Self {
			base_url: default_base_url(),
			token_duration: DEFAULT_TOKEN_DURATION,
			refresh_buffer: DEFAULT_REFRESH_BUFFER,
			request_timeout: DEFAULT_REQUEST_TIMEOUT,
			user_agent: DEFAULT_USER_AGENT.into(),
		}
	}
}

/// Builder for [`ClientConfig`] values.
#[derive(Clone, Debug, Default)]
pub struct ClientConfigBuilder {
	config: ClientConfig,
}
impl ClientConfigBuilder {
	/// Sets the API root.
	pub fn base_url(mut self, url: Url) -> Self {
		self.config.base_url = url;

		self
	}

	/// Sets the credential lifetime.
	pub fn token_duration(mut self, duration: Duration) -> Self {
		self.config.token_duration = duration;

		self
	}

	/// Sets the refresh buffer.
	pub fn refresh_buffer(mut self, buffer: Duration) -> Self {
		self.config.refresh_buffer = buffer;

		self
	}

	/// Sets the per-request timeout.
	pub fn request_timeout(mut self, timeout: Duration) -> Self {
		self.config.request_timeout = timeout;

		self
	}

	/// Sets the `User-Agent` header.
	pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
		self.config.user_agent = user_agent.into();

		self
	}

	/// Consumes the builder and validates the resulting configuration.
	pub fn build(self) -> Result<ClientConfig, ClientConfigError> {
		self.config.validate()?;

		Ok(self.config)
	}
}

fn default_base_url() -> Url {
	Url::parse(DEFAULT_BASE_URL).expect("Default base URL is a valid absolute URL.")
}

fn validate_base_url(url: &Url) -> Result<(), ClientConfigError> {
	let reject = |reason| Err(ClientConfigError::InvalidBaseUrl { url: url.to_string(), reason });

	if !matches!(url.scheme(), "http" | "https") {
		return reject("scheme must be http or https");
	}
	if url.cannot_be_a_base() || url.host().is_none() {
		return reject("URL must be absolute with a host");
	}
	if url.query().is_some() || url.fragment().is_some() {
		return reject("URL must not carry a query or fragment");
	}

	Ok(())
}
