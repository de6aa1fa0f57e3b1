// std
use std::{collections::HashSet, sync::Arc};
// crates.io
use time::Duration;
// self
use asc_client::{
	auth::{CredentialCache, CredentialClaims, CredentialIdentity, CredentialSigner},
	config::ClientConfig,
	error::{Error, KeyLoadError},
	http::ApiClient,
};

const P256_PEM: &str = include_str!("fixtures/p256.pem");
const P256_SEC1_PEM: &str = include_str!("fixtures/p256_sec1.pem");

fn identity() -> CredentialIdentity {
	CredentialIdentity::parse("57246542-96fe-1a63-e053-0824d011072a", "2X9R4HXF34")
		.expect("Identity fixture should be valid.")
}

#[tokio::test]
async fn concurrent_tasks_observe_a_single_token() {
	const TASKS: usize = 64;

	let signer =
		CredentialSigner::with_identity(identity(), P256_PEM).expect("P-256 fixture should load.");
	let cache = Arc::new(CredentialCache::new(signer));
	let handles = (0..TASKS)
		.map(|_| {
			let cache = cache.clone();

			tokio::spawn(async move { cache.token().map(|token| token.expose().to_owned()) })
		})
		.collect::<Vec<_>>();
	let mut tokens = HashSet::new();

	for handle in handles {
		tokens.insert(handle.await.expect("Task should not panic.").expect("Lookup should mint."));
	}

	assert_eq!(tokens.len(), 1);
	assert_eq!(cache.metrics().mints(), 1);
	assert_eq!(cache.metrics().hits() as usize, TASKS - 1);
}

#[test]
fn connect_applies_configured_lifetimes() {
	let config = ClientConfig::builder()
		.token_duration(Duration::minutes(10))
		.refresh_buffer(Duration::minutes(1))
		.build()
		.expect("Configuration should validate.");
	let client = ApiClient::connect(config, identity(), P256_PEM).expect("Client should connect.");
	let cache = client.credentials();

	assert_eq!(cache.refresh_buffer(), Duration::minutes(1));
	assert_eq!(cache.signer().token_duration(), Duration::minutes(10));

	let token = cache.token().expect("Lookup should mint.");
	let claims = CredentialClaims::peek(token.expose()).expect("Token should carry claims.");

	assert_eq!(claims.exp - claims.iat, 600);
	assert_eq!(claims.iss, "57246542-96fe-1a63-e053-0824d011072a");
}

#[test]
fn connect_rejects_sec1_keys() {
	let err = ApiClient::connect(ClientConfig::default(), identity(), P256_SEC1_PEM)
		.expect_err("SEC1 keys must be rejected.");

	assert!(
		matches!(err, Error::KeyLoad(KeyLoadError::UnexpectedLabel { ref label }) if label == "EC PRIVATE KEY"),
		"{err:?}"
	);
}
