//! JSON:API error envelope (`{"errors":[...]}`) parsing and summarizing.

// self
use crate::{_prelude::*, error::ApiError};

/// One entry of the service's error envelope.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ErrorObject {
	/// Unique identifier of this occurrence.
	pub id: Option<String>,
	/// HTTP status code, as a string.
	pub status: Option<String>,
	/// Machine-readable error code (e.g. `PARAMETER_ERROR.INVALID`).
	pub code: Option<String>,
	/// Short summary.
	pub title: Option<String>,
	/// Occurrence-specific explanation.
	pub detail: Option<String>,
	/// Part of the request that caused the error.
	pub source: Option<ErrorSource>,
}
impl ErrorObject {
	/// Renders the entry as `title: detail`, or whichever half is present.
	pub fn summary(&self) -> Option<String> {
		let title = self.title.as_deref().map(str::trim).filter(|s| !s.is_empty());
		let detail = self.detail.as_deref().map(str::trim).filter(|s| !s.is_empty());

		match (title, detail) {
			(Some(title), Some(detail)) => Some(format!("{title}: {detail}")),
			(Some(only), None) | (None, Some(only)) => Some(only.to_owned()),
			(None, None) => None,
		}
	}
}

/// Location of the offending input.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ErrorSource {
	/// JSON pointer into the request document.
	pub pointer: Option<String>,
	/// Offending query parameter.
	pub parameter: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ErrorEnvelope {
	errors: Vec<ErrorObject>,
}

/// Builds the [`ApiError`] for a response with `status >= 400`.
///
/// The message joins every entry summary with `"; "`; when the body is not an envelope or carries
/// no usable entries, the raw body text is used instead (or the canonical reason phrase when the
/// body is blank).
pub(crate) fn api_error(status: u16, body: &[u8], retry_after: Option<Duration>) -> ApiError {
	let errors = serde_json::from_slice::<ErrorEnvelope>(body)
		.map(|envelope| envelope.errors)
		.unwrap_or_default();
	let message = errors.iter().filter_map(ErrorObject::summary).collect::<Vec<_>>().join("; ");
	let message = if !message.is_empty() {
		message
	} else {
		let raw = String::from_utf8_lossy(body);

		if raw.trim().is_empty() { reason_phrase(status) } else { raw.into_owned() }
	};

	ApiError { status, message, errors, retry_after }
}

fn reason_phrase(status: u16) -> String {
	reqwest::StatusCode::from_u16(status)
		.ok()
		.and_then(|code| code.canonical_reason())
		.unwrap_or("Unknown status")
		.to_owned()
}
