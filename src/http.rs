//! Authenticated request executor.
//!
//! [`ApiClient`] performs one HTTP exchange per call: it borrows a bearer token from the shared
//! [`CredentialCache`], joins the request path onto the configured base URL, sends the JSON body
//! (if any), and returns the raw response bytes. Responses with `status >= 400` become
//! [`ApiError`]s; network failures, timeouts, and elapsed deadlines become [`TransportError`]s.
//! Nothing is retried here; [`Error::is_retryable`] tells callers which failures are worth
//! repeating.

mod envelope;

pub use envelope::*;

// crates.io
use reqwest::{
	StatusCode,
	header::{ACCEPT, CONTENT_TYPE, HeaderMap, RETRY_AFTER},
};
use time::format_description::well_known::Rfc2822;
// self
use crate::{
	_prelude::*,
	auth::{CredentialCache, CredentialIdentity, CredentialSigner},
	config::ClientConfig,
	error::{ApiError, ConfigError, TransportError},
	obs::{self, ObsSpan, RequestOutcome},
};

const JSON_MEDIA_TYPE: &str = "application/json";

/// One outbound call: verb, path, query, optional JSON body, and per-call time limits.
#[derive(Clone, Debug)]
pub struct ApiRequest {
	/// HTTP verb.
	pub method: Method,
	/// Path relative to the base URL (`/apps/123`), or an absolute URL on the same origin (such as
	/// a pagination `links.next` value).
	pub path: String,
	/// Query parameters, URL-encoded in order.
	pub query: Vec<(String, String)>,
	/// Encoded JSON body.
	pub body: Option<Vec<u8>>,
	/// Overrides the configured request timeout.
	pub timeout: Option<Duration>,
	/// Absolute instant after which the call must not be attempted or continued.
	pub deadline: Option<OffsetDateTime>,
}
impl ApiRequest {
	/// Creates a request without query, body, or time limits.
	pub fn new(method: Method, path: impl Into<String>) -> Self {
		Self {
			method,
			path: path.into(),
			query: Vec::new(),
			body: None,
			timeout: None,
			deadline: None,
		}
	}

	/// Appends one query parameter.
	pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
		self.query.push((key.into(), value.into()));

		self
	}

	/// Appends several query parameters.
	pub fn with_query_pairs<I, K, V>(mut self, pairs: I) -> Self
	where
		I: IntoIterator<Item = (K, V)>,
		K: Into<String>,
		V: Into<String>,
	{
		self.query.extend(pairs.into_iter().map(|(k, v)| (k.into(), v.into())));

		self
	}

	/// Encodes `body` as the JSON request body.
	pub fn with_json<B>(mut self, body: &B) -> Result<Self>
	where
		B: ?Sized + Serialize,
	{
		self.body = Some(serde_json::to_vec(body).map_err(|source| Error::Encode { source })?);

		Ok(self)
	}

	/// Overrides the configured timeout for this call.
	pub fn with_timeout(mut self, timeout: Duration) -> Self {
		self.timeout = Some(timeout);

		self
	}

	/// Bounds this call by an absolute deadline.
	pub fn with_deadline(mut self, deadline: OffsetDateTime) -> Self {
		self.deadline = Some(deadline);

		self
	}

	fn effective_timeout(
		&self,
		default: Duration,
		now: OffsetDateTime,
	) -> Result<Duration, TransportError> {
		let timeout = self.timeout.unwrap_or(default);

		if !timeout.is_positive() {
			return Err(TransportError::DeadlineElapsed);
		}

		let Some(deadline) = self.deadline else {
			return Ok(timeout);
		};
		let remaining = deadline - now;

		if !remaining.is_positive() {
			return Err(TransportError::DeadlineElapsed);
		}

		Ok(timeout.min(remaining))
	}
}

/// Authenticated client for the JSON:API service.
///
/// Cloning is cheap: clones share the reqwest connection pool and the credential cache.
#[derive(Clone)]
pub struct ApiClient {
	http: ReqwestClient,
	config: Arc<ClientConfig>,
	credentials: Arc<CredentialCache>,
}
impl ApiClient {
	/// Creates a client over an existing credential cache.
	pub fn new(config: ClientConfig, credentials: Arc<CredentialCache>) -> Result<Self> {
		let http = ReqwestClient::builder()
			.user_agent(config.user_agent.clone())
			.build()
			.map_err(ConfigError::http_client_build)?;

		Ok(Self::with_http_client(config, credentials, http))
	}

	/// Creates a client that reuses a caller-provided reqwest [`ReqwestClient`].
	///
	/// The configured `User-Agent` is only applied by [`ApiClient::new`].
	pub fn with_http_client(
		config: ClientConfig,
		credentials: Arc<CredentialCache>,
		http: ReqwestClient,
	) -> Self {
		Self { http, config: Arc::new(config), credentials }
	}

	/// Wires signer, cache, and transport for one identity from a single configuration.
	pub fn connect(
		config: ClientConfig,
		identity: CredentialIdentity,
		pem: impl AsRef<[u8]>,
	) -> Result<Self> {
		let signer = CredentialSigner::with_identity(identity, pem)?
			.with_token_duration(config.token_duration);
		let cache = CredentialCache::new(signer).with_refresh_buffer(config.refresh_buffer);

		Self::new(config, Arc::new(cache))
	}

	/// Configuration in effect.
	pub fn config(&self) -> &ClientConfig {
		&self.config
	}

	/// Credential cache shared by every clone of this client.
	pub fn credentials(&self) -> &Arc<CredentialCache> {
		&self.credentials
	}

	/// Performs one authenticated exchange and returns the raw response body.
	pub async fn execute(&self, request: ApiRequest) -> Result<Vec<u8>> {
		let span = ObsSpan::request(&request.method, &request.path);
		let method = request.method.clone();

		obs::record_request_outcome(&method, RequestOutcome::Attempt);

		let result = span.instrument(self.dispatch(request)).await;

		obs::record_request_outcome(&method, RequestOutcome::of(&result));

		result
	}

	/// Performs the exchange and decodes a successful body into `T`.
	pub async fn execute_json<T>(&self, request: ApiRequest) -> Result<T>
	where
		T: DeserializeOwned,
	{
		let body = self.execute(request).await?;

		decode(&body)
	}

	/// `GET path?query`.
	pub async fn get(&self, path: &str, query: &[(&str, &str)]) -> Result<Vec<u8>> {
		self.execute(ApiRequest::new(Method::GET, path).with_query_pairs(query.iter().copied()))
			.await
	}

	/// `POST path` with a JSON body.
	pub async fn post<B>(&self, path: &str, body: &B) -> Result<Vec<u8>>
	where
		B: ?Sized + Serialize,
	{
		self.execute(ApiRequest::new(Method::POST, path).with_json(body)?).await
	}

	/// `PATCH path` with a JSON body.
	pub async fn patch<B>(&self, path: &str, body: &B) -> Result<Vec<u8>>
	where
		B: ?Sized + Serialize,
	{
		self.execute(ApiRequest::new(Method::PATCH, path).with_json(body)?).await
	}

	/// `DELETE path`; the response body is discarded.
	pub async fn delete(&self, path: &str) -> Result<()> {
		self.execute(ApiRequest::new(Method::DELETE, path)).await.map(drop)
	}

	/// `GET path?query`, decoded into `T`.
	pub async fn get_json<T>(&self, path: &str, query: &[(&str, &str)]) -> Result<T>
	where
		T: DeserializeOwned,
	{
		decode(&self.get(path, query).await?)
	}

	/// `POST path` with a JSON body, decoded into `T`.
	pub async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T>
	where
		B: ?Sized + Serialize,
		T: DeserializeOwned,
	{
		decode(&self.post(path, body).await?)
	}

	/// `PATCH path` with a JSON body, decoded into `T`.
	pub async fn patch_json<B, T>(&self, path: &str, body: &B) -> Result<T>
	where
		B: ?Sized + Serialize,
		T: DeserializeOwned,
	{
		decode(&self.patch(path, body).await?)
	}

	async fn dispatch(&self, request: ApiRequest) -> Result<Vec<u8>> {
		let timeout =
			request.effective_timeout(self.config.request_timeout, OffsetDateTime::now_utc())?;
		let url = self.endpoint(&request.path, &request.query)?;
		let token = self.credentials.token()?;
		let mut builder = self
			.http
			.request(request.method, url)
			.bearer_auth(token.expose())
			.header(CONTENT_TYPE, JSON_MEDIA_TYPE)
			.header(ACCEPT, JSON_MEDIA_TYPE)
			.timeout(timeout.unsigned_abs());

		if let Some(body) = request.body {
			builder = builder.body(body);
		}

		let response = builder.send().await.map_err(TransportError::from)?;
		let status = response.status();
		let retry_after = parse_retry_after(response.headers());
		let body = response.bytes().await.map_err(TransportError::from)?.to_vec();

		if status.as_u16() < 400 {
			return Ok(body);
		}
		if status == StatusCode::UNAUTHORIZED {
			self.credentials.invalidate_if(&token);
		}

		Err(envelope::api_error(status.as_u16(), &body, retry_after).into())
	}

	fn endpoint(&self, path: &str, query: &[(String, String)]) -> Result<Url> {
		let invalid = |source| ConfigError::InvalidPath { path: path.to_owned(), source };
		let mut url = match Url::parse(path) {
			Ok(absolute) => {
				if absolute.origin() != self.config.base_url.origin() {
					return Err(ConfigError::ForeignOrigin { url: absolute.to_string() }.into());
				}

				absolute
			},
			Err(url::ParseError::RelativeUrlWithoutBase) => {
				let base = self.config.base_url.as_str().trim_end_matches('/');
				let relative = path.trim_start_matches('/');

				Url::parse(&format!("{base}/{relative}")).map_err(invalid)?
			},
			Err(source) => return Err(invalid(source).into()),
		};

		if !query.is_empty() {
			url.query_pairs_mut().extend_pairs(query);
		}

		Ok(url)
	}
}
impl Debug for ApiClient {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ApiClient")
			.field("config", &self.config)
			.field("credentials", &self.credentials)
			.finish()
	}
}

fn decode<T>(body: &[u8]) -> Result<T>
where
	T: DeserializeOwned,
{
	let de = &mut serde_json::Deserializer::from_slice(body);

	Ok(serde_path_to_error::deserialize(de)?)
}

fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
	let value = headers.get(RETRY_AFTER)?;
	let raw = value.to_str().ok()?.trim();

	if let Ok(secs) = raw.parse::<u32>() {
		return Some(Duration::seconds(i64::from(secs)));
	}
	if let Ok(moment) = OffsetDateTime::parse(raw, &Rfc2822) {
		let delta = moment - OffsetDateTime::now_utc();

		if delta.is_positive() {
			return Some(delta);
		}
	}

	None
}
