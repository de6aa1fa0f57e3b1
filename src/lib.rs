//! Authenticated App Store Connect request pipeline: ES256 token minting, race-free credential
//! caching, and JSON:API error normalization on top of reqwest.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod config;
pub mod error;
pub mod http;
pub mod obs;
#[cfg(any(test, feature = "test"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for tests; enabled via `cfg(test)` or the `test` crate
	//! feature.

	pub use crate::_prelude::*;

	// self
	use crate::{
		auth::{CredentialCache, CredentialSigner, IssuerId, KeyId},
		config::ClientConfig,
		http::ApiClient,
	};

	/// PKCS#8 P-256 private key used across tests.
	pub const TEST_P256_PEM: &str = include_str!("../tests/fixtures/p256.pem");
	/// PKCS#8 P-384 private key; valid EC material on the wrong curve.
	pub const TEST_P384_PEM: &str = include_str!("../tests/fixtures/p384.pem");
	/// PKCS#8 Ed25519 private key; valid PKCS#8 material that is not an EC key.
	pub const TEST_ED25519_PEM: &str = include_str!("../tests/fixtures/ed25519.pem");
	/// SEC1 (`EC PRIVATE KEY`) encoding of [`TEST_P256_PEM`].
	pub const TEST_P256_SEC1_PEM: &str = include_str!("../tests/fixtures/p256_sec1.pem");

	/// Issuer identifier embedded in test credentials.
	pub const TEST_ISSUER: &str = "57246542-96fe-1a63-e053-0824d011072a";
	/// Key identifier embedded in test credentials.
	pub const TEST_KEY_ID: &str = "2X9R4HXF34";

	/// Builds a signer over the shared P-256 fixture.
	pub fn test_signer() -> CredentialSigner {
		CredentialSigner::from_pem(
			IssuerId::new(TEST_ISSUER).expect("Issuer fixture should be valid."),
			KeyId::new(TEST_KEY_ID).expect("Key identifier fixture should be valid."),
			TEST_P256_PEM,
		)
		.expect("P-256 fixture should load.")
	}

	/// Builds a cold credential cache over [`test_signer`].
	pub fn test_cache() -> Arc<CredentialCache> {
		Arc::new(CredentialCache::new(test_signer()))
	}

	/// Builds an [`ApiClient`] that talks to `base_url` (typically an `httpmock` server).
	pub fn build_test_client(base_url: &str) -> (ApiClient, Arc<CredentialCache>) {
		let config = ClientConfig::builder()
			.base_url(Url::parse(base_url).expect("Mock base URL should parse."))
			.build()
			.expect("Test client configuration should be valid.");
		let cache = test_cache();
		let client = ApiClient::new(config, cache.clone()).expect("Test client should build.");

		(client, cache)
	}
}

mod _prelude {
	pub use std::{
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		str::FromStr,
		sync::Arc,
	};

	pub use parking_lot::RwLock;
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError, Method};
	pub use serde::{Deserialize, Serialize, de::DeserializeOwned};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

pub use reqwest;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _, tokio as _};
