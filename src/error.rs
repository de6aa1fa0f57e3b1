//! Crate-level error types shared by the signer, the credential cache, and the request executor.

// self
use crate::{_prelude::*, http::ErrorObject};

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Private key material could not be loaded.
	#[error(transparent)]
	KeyLoad(#[from] KeyLoadError),
	/// Credential signing failed.
	#[error(transparent)]
	Signing(#[from] SigningError),
	/// Transport failure (DNS, TCP, TLS, timeout, deadline).
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// The service rejected the request.
	#[error(transparent)]
	Api(#[from] ApiError),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Issuer or key identifier failed validation.
	#[error(transparent)]
	Identifier(#[from] crate::auth::IdentifierError),

	/// Request body could not be encoded as JSON.
	#[error("Request body could not be encoded as JSON.")]
	Encode {
		/// Underlying serializer failure.
		#[source]
		source: serde_json::Error,
	},
	/// Successful response body did not match the expected shape.
	#[error("Response body could not be decoded at `{path}`.")]
	Decode {
		/// JSON path of the offending value.
		path: String,
		/// Underlying deserializer failure.
		#[source]
		source: serde_json::Error,
	},
}
impl Error {
	/// Returns `true` when repeating the same call may succeed.
	///
	/// Transport failures and `429`/`5xx` responses qualify; everything else (bad keys, `4xx`
	/// rejections, decoding problems) will fail again unchanged.
	pub fn is_retryable(&self) -> bool {
		match self {
			Self::Transport(_) => true,
			Self::Api(err) => err.is_retryable(),
			_ => false,
		}
	}

	/// Returns the HTTP status code when the service answered with an error response.
	pub fn status(&self) -> Option<u16> {
		match self {
			Self::Api(err) => Some(err.status),
			_ => None,
		}
	}
}
impl From<serde_path_to_error::Error<serde_json::Error>> for Error {
	fn from(e: serde_path_to_error::Error<serde_json::Error>) -> Self {
		let path = e.path().to_string();

		Self::Decode { path, source: e.into_inner() }
	}
}

/// Failures raised while loading the private signing key.
#[derive(Debug, ThisError)]
pub enum KeyLoadError {
	/// Key material is not a PEM document.
	#[error("Private key is not a valid PEM document.")]
	InvalidPem {
		/// Underlying UTF-8 or PEM decoding failure.
		#[source]
		source: BoxError,
	},
	/// PEM document carries a label other than `PRIVATE KEY`.
	#[error("Private key PEM label `{label}` is not `PRIVATE KEY`; a PKCS#8 key is required.")]
	UnexpectedLabel {
		/// Label found in the PEM armor.
		label: String,
	},
	/// PKCS#8 document is not a P-256 elliptic-curve key.
	#[error("Private key is not a PKCS#8 P-256 elliptic-curve key.")]
	UnsupportedKey {
		/// Underlying PKCS#8 decoding failure.
		#[source]
		source: p256::pkcs8::Error,
	},
	/// Key file could not be read.
	#[error("Private key file could not be read.")]
	Io(#[from] std::io::Error),
}

/// Failures raised while minting a credential.
#[derive(Debug, ThisError)]
pub enum SigningError {
	/// The ECDSA signature operation failed.
	#[error("ECDSA signing operation failed.")]
	Signature {
		/// Underlying signature failure.
		#[source]
		source: p256::ecdsa::Error,
	},
	/// Header or claims could not be encoded.
	#[error("Credential claims could not be encoded.")]
	Claims {
		/// Underlying serializer failure.
		#[source]
		source: serde_json::Error,
	},
}

/// Transport-level failures; safe to retry with backoff.
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the service.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// The request did not complete within its timeout.
	#[error("Request timed out before the service responded.")]
	Timeout {
		/// Transport-specific timeout error.
		#[source]
		source: BoxError,
	},
	/// The caller-supplied deadline had already passed, or the timeout was not positive, when the
	/// request was issued.
	#[error("Request deadline elapsed before the request was sent.")]
	DeadlineElapsed,
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}

	/// Returns `true` for timeouts and elapsed deadlines.
	pub fn is_timeout(&self) -> bool {
		matches!(self, Self::Timeout { .. } | Self::DeadlineElapsed)
	}
}
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		if e.is_timeout() { Self::Timeout { source: Box::new(e) } } else { Self::network(e) }
	}
}

/// Error response returned by the service (`status >= 400`).
#[derive(Debug, ThisError)]
#[error("Service responded with HTTP {status}: {message}")]
pub struct ApiError {
	/// HTTP status code.
	pub status: u16,
	/// Human-readable summary extracted from the error envelope, or the raw body text.
	pub message: String,
	/// Structured entries from the JSON:API error envelope, when present.
	pub errors: Vec<ErrorObject>,
	/// Retry-After hint from upstream, if supplied.
	pub retry_after: Option<Duration>,
}
impl ApiError {
	/// Returns `true` for throttling (`429`) and server-side (`5xx`) failures.
	pub fn is_retryable(&self) -> bool {
		self.status == 429 || self.status >= 500
	}
}

/// Configuration and validation failures.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// Request path cannot be joined onto the base URL.
	#[error("Request path `{path}` does not form a valid URL.")]
	InvalidPath {
		/// Offending request path.
		path: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Absolute request URL points outside the configured service origin.
	#[error("Request URL `{url}` is not on the configured service origin.")]
	ForeignOrigin {
		/// Rejected URL.
		url: String,
	},
	/// Configuration knobs failed validation.
	#[error(transparent)]
	Client(#[from] crate::config::ClientConfigError),
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
