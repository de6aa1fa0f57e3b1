//! ES256 credential minting.
//!
//! [`CredentialSigner`] owns the P-256 private key of one API key and produces compact
//! `header.payload.signature` credentials:
//!
//! - header `{"alg":"ES256","typ":"JWT","kid":<key id>}`;
//! - payload `{"iss":<issuer id>,"iat":<unix>,"exp":<unix>,"aud":"appstoreconnect-v1"}`;
//! - signature: ECDSA P-256 over the SHA-256 digest of `header "." payload`, encoded as the
//!   fixed-width `r ‖ s` pair (32 big-endian bytes each).
//!
//! Every segment is base64url-encoded without padding. Minting only borrows `&self`, so one signer
//! can serve any number of concurrent callers.

// std
use std::path::Path;
// crates.io
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use p256::{
	ecdsa::{Signature, SigningKey, VerifyingKey, signature::hazmat::PrehashSigner},
	pkcs8::{DecodePrivateKey, der::SecretDocument},
};
use sha2::{Digest, Sha256};
// self
use crate::{
	_prelude::*,
	auth::{BearerToken, CredentialIdentity, IssuerId, KeyId, SignedCredential},
	error::{KeyLoadError, SigningError},
	obs::{self, CredentialOutcome, ObsSpan},
};

/// Audience every credential is minted for.
pub const AUDIENCE: &str = "appstoreconnect-v1";
/// JWS algorithm advertised in the header.
pub const ALGORITHM: &str = "ES256";
/// Default lifetime of a minted credential.
pub const DEFAULT_TOKEN_DURATION: Duration = Duration::minutes(15);
/// Byte length of a fixed-width P-256 signature (`r ‖ s`).
pub const SIGNATURE_LEN: usize = 64;

const PKCS8_PEM_LABEL: &str = "PRIVATE KEY";
const SCALAR_LEN: usize = SIGNATURE_LEN / 2;

/// JOSE header of a minted credential. Field order is the serialized order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialHeader {
	/// Signing algorithm (`ES256`).
	pub alg: String,
	/// Token type (`JWT`).
	pub typ: String,
	/// Key identifier.
	pub kid: String,
}

/// Claims of a minted credential. Field order is the serialized order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialClaims {
	/// Issuer identifier.
	pub iss: String,
	/// Issued-at, unix seconds.
	pub iat: i64,
	/// Expiry, unix seconds.
	pub exp: i64,
	/// Audience.
	pub aud: String,
}
impl CredentialClaims {
	/// Decodes the claims segment of a compact credential without checking its signature.
	///
	/// Returns `None` when `token` is not a three-segment credential or the payload is not valid
	/// base64url JSON.
	pub fn peek(token: &str) -> Option<Self> {
		let mut segments = token.split('.');
		let (_, payload, _) = (segments.next()?, segments.next()?, segments.next()?);

		if segments.next().is_some() {
			return None;
		}

		serde_json::from_slice(&URL_SAFE_NO_PAD.decode(payload).ok()?).ok()
	}
}

/// Mints ES256 credentials for one [`CredentialIdentity`].
pub struct CredentialSigner {
	identity: CredentialIdentity,
	key: SigningKey,
	token_duration: Duration,
}
impl CredentialSigner {
	/// Loads a PEM-encoded PKCS#8 P-256 private key for the given issuer/key pair.
	pub fn from_pem(issuer_id: IssuerId, key_id: KeyId, pem: impl AsRef<[u8]>) -> Result<Self> {
		Self::with_identity(CredentialIdentity::new(issuer_id, key_id), pem)
	}

	/// Reads the key from a `.p8` file downloaded from the service.
	pub fn from_pem_file(
		issuer_id: IssuerId,
		key_id: KeyId,
		path: impl AsRef<Path>,
	) -> Result<Self> {
		let pem = std::fs::read(path).map_err(KeyLoadError::from)?;

		Self::from_pem(issuer_id, key_id, pem)
	}

	/// Loads the key for an already-paired identity.
	pub fn with_identity(identity: CredentialIdentity, pem: impl AsRef<[u8]>) -> Result<Self> {
		let key = load_signing_key(pem.as_ref())?;

		Ok(Self { identity, key, token_duration: DEFAULT_TOKEN_DURATION })
	}

	/// Overrides the credential lifetime (defaults to 15 minutes).
	pub fn with_token_duration(mut self, duration: Duration) -> Self {
		self.token_duration = duration;

		self
	}

	/// Identity embedded into every credential.
	pub fn identity(&self) -> &CredentialIdentity {
		&self.identity
	}

	/// Issuer identifier (`iss`).
	pub fn issuer_id(&self) -> &IssuerId {
		&self.identity.issuer_id
	}

	/// Key identifier (`kid`).
	pub fn key_id(&self) -> &KeyId {
		&self.identity.key_id
	}

	/// Lifetime applied to minted credentials.
	pub fn token_duration(&self) -> Duration {
		self.token_duration
	}

	/// Public half of the signing key.
	pub fn verifying_key(&self) -> &VerifyingKey {
		self.key.verifying_key()
	}

	/// Mints a credential issued at the current UTC instant.
	pub fn mint(&self) -> Result<SignedCredential> {
		self.mint_at(OffsetDateTime::now_utc())
	}

	/// Mints a credential issued at `now`, truncated to whole seconds.
	pub fn mint_at(&self, now: OffsetDateTime) -> Result<SignedCredential> {
		let _span = ObsSpan::credential(self.key_id()).entered();
		let result = self.mint_inner(now);

		match &result {
			Ok(_) => obs::record_credential_outcome(CredentialOutcome::Minted),
			Err(_) => obs::record_credential_outcome(CredentialOutcome::Failure),
		}

		result
	}

	fn mint_inner(&self, now: OffsetDateTime) -> Result<SignedCredential> {
		let issued_at = now - Duration::nanoseconds(i64::from(now.nanosecond()));
		let expires_at = issued_at + self.token_duration;
		let header = CredentialHeader {
			alg: ALGORITHM.into(),
			typ: "JWT".into(),
			kid: self.identity.key_id.to_string(),
		};
		let claims = CredentialClaims {
			iss: self.identity.issuer_id.to_string(),
			iat: issued_at.unix_timestamp(),
			exp: expires_at.unix_timestamp(),
			aud: AUDIENCE.into(),
		};
		let signing_input = format!("{}.{}", encode_json(&header)?, encode_json(&claims)?);
		let signature = self.sign(signing_input.as_bytes())?;
		let token = BearerToken::new(format!("{signing_input}.{}", base64url(signature)));

		Ok(SignedCredential { token, issued_at, expires_at })
	}

	fn sign(&self, signing_input: &[u8]) -> Result<[u8; SIGNATURE_LEN], SigningError> {
		let digest = Sha256::digest(signing_input);
		let signature: Signature = self
			.key
			.sign_prehash(digest.as_slice())
			.map_err(|source| SigningError::Signature { source })?;

		Ok(fixed_width(&signature))
	}
}
impl Debug for CredentialSigner {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("CredentialSigner")
			.field("identity", &self.identity)
			.field("key", &"<redacted>")
			.field("token_duration", &self.token_duration)
			.finish()
	}
}

/// Base64url without padding; the empty input encodes to the empty string.
pub fn base64url(bytes: impl AsRef<[u8]>) -> String {
	URL_SAFE_NO_PAD.encode(bytes)
}

fn encode_json<T>(value: &T) -> Result<String, SigningError>
where
	T: Serialize,
{
	let json = serde_json::to_vec(value).map_err(|source| SigningError::Claims { source })?;

	Ok(base64url(json))
}

fn fixed_width(signature: &Signature) -> [u8; SIGNATURE_LEN] {
	let (r, s) = signature.split_bytes();
	let mut out = [0_u8; SIGNATURE_LEN];

	// Field bytes are already left zero-padded to the scalar width.
	out[..SCALAR_LEN].copy_from_slice(&r);
	out[SCALAR_LEN..].copy_from_slice(&s);

	out
}

fn load_signing_key(pem: &[u8]) -> Result<SigningKey, KeyLoadError> {
	let text =
		std::str::from_utf8(pem).map_err(|e| KeyLoadError::InvalidPem { source: Box::new(e) })?;
	let (label, document) = SecretDocument::from_pem(text)
		.map_err(|e| KeyLoadError::InvalidPem { source: Box::new(e) })?;

	if label != PKCS8_PEM_LABEL {
		return Err(KeyLoadError::UnexpectedLabel { label: label.to_owned() });
	}

	SigningKey::from_pkcs8_der(document.as_bytes())
		.map_err(|source| KeyLoadError::UnsupportedKey { source })
}
