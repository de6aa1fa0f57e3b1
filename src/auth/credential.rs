//! Bearer token wrapper and the immutable record describing one minted credential.

// self
use crate::_prelude::*;

/// Redacted bearer token keeping signed credentials out of logs.
#[derive(Clone, PartialEq, Eq)]
pub struct BearerToken(Arc<str>);
impl BearerToken {
	/// Wraps a compact-serialized credential.
	pub fn new(value: impl Into<Arc<str>>) -> Self {
		Self(value.into())
	}

	/// Returns the compact credential. Callers must avoid logging this string.
	pub fn expose(&self) -> &str {
		&self.0
	}
}
impl AsRef<str> for BearerToken {
	fn as_ref(&self) -> &str {
		self.expose()
	}
}
impl Debug for BearerToken {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("BearerToken").field(&"<redacted>").finish()
	}
}
impl Display for BearerToken {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}

/// Credential produced by one signing operation.
///
/// Records are replaced wholesale on refresh; `expires_at` always equals the `exp` claim
/// embedded in `token`.
#[derive(Clone, PartialEq, Eq)]
pub struct SignedCredential {
	/// Compact `header.payload.signature` credential.
	pub token: BearerToken,
	/// Value of the `iat` claim.
	pub issued_at: OffsetDateTime,
	/// Value of the `exp` claim.
	pub expires_at: OffsetDateTime,
}
impl SignedCredential {
	/// Returns `true` while the credential may still be handed out at `instant`, i.e. it outlives
	/// `instant` by more than `refresh_buffer`.
	pub fn is_fresh_at(&self, instant: OffsetDateTime, refresh_buffer: Duration) -> bool {
		instant + refresh_buffer < self.expires_at
	}

	/// Returns `true` once `instant` reached the real expiry.
	pub fn is_expired_at(&self, instant: OffsetDateTime) -> bool {
		instant >= self.expires_at
	}

	/// Remaining lifetime at `instant`, clamped at zero.
	pub fn remaining_at(&self, instant: OffsetDateTime) -> Duration {
		let remaining = self.expires_at - instant;

		if remaining.is_negative() { Duration::ZERO } else { remaining }
	}
}
impl Debug for SignedCredential {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("SignedCredential")
			.field("token", &"<redacted>")
			.field("issued_at", &self.issued_at)
			.field("expires_at", &self.expires_at)
			.finish()
	}
}
