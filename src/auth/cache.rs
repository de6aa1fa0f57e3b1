//! Shared credential cache with double-checked refresh.
//!
//! [`CredentialCache`] hands out the cached credential while it outlives "now" by more than the
//! refresh buffer. Lookups take the shared side of a [`RwLock`]; only a stale lookup escalates to
//! the exclusive side, re-checks staleness (another caller may have refreshed in between), and
//! mints at most once per staleness event.

mod metrics;

pub use metrics::CacheMetrics;

// self
use crate::{
	_prelude::*,
	auth::{BearerToken, CredentialSigner, SignedCredential},
};

/// Margin before the real expiry at which a cached credential is treated as stale.
pub const DEFAULT_REFRESH_BUFFER: Duration = Duration::minutes(2);

/// Caches the credential minted by one [`CredentialSigner`].
///
/// Construct one cache per identity and share it behind an [`Arc`].
pub struct CredentialCache {
	signer: CredentialSigner,
	refresh_buffer: Duration,
	current: RwLock<Option<SignedCredential>>,
	metrics: CacheMetrics,
}
impl CredentialCache {
	/// Creates a cold cache over `signer`.
	pub fn new(signer: CredentialSigner) -> Self {
		Self {
			signer,
			refresh_buffer: DEFAULT_REFRESH_BUFFER,
			current: RwLock::new(None),
			metrics: CacheMetrics::default(),
		}
	}

	/// Overrides the refresh buffer (defaults to 2 minutes).
	///
	/// The buffer should stay below the signer's token duration, otherwise every lookup mints.
	pub fn with_refresh_buffer(mut self, buffer: Duration) -> Self {
		self.refresh_buffer = if buffer.is_negative() { Duration::ZERO } else { buffer };

		self
	}

	/// Signer backing the cache.
	pub fn signer(&self) -> &CredentialSigner {
		&self.signer
	}

	/// Refresh buffer applied to freshness checks.
	pub fn refresh_buffer(&self) -> Duration {
		self.refresh_buffer
	}

	/// Lookup and mint counters.
	pub fn metrics(&self) -> &CacheMetrics {
		&self.metrics
	}

	/// Returns a usable bearer token, minting one when the cached credential is stale.
	pub fn token(&self) -> Result<BearerToken> {
		self.token_at(OffsetDateTime::now_utc())
	}

	/// Same as [`token`](Self::token) with an explicit clock reading.
	pub fn token_at(&self, now: OffsetDateTime) -> Result<BearerToken> {
		if let Some(token) = self.fresh_token(self.current.read().as_ref(), now) {
			return Ok(token);
		}

		let mut current = self.current.write();

		if let Some(token) = self.fresh_token(current.as_ref(), now) {
			return Ok(token);
		}

		let credential = self.signer.mint_at(now).inspect_err(|_| self.metrics.record_failure())?;
		let token = credential.token.clone();

		*current = Some(credential);

		self.metrics.record_mint();

		Ok(token)
	}

	/// Snapshot of the cached credential, if any.
	pub fn current(&self) -> Option<SignedCredential> {
		self.current.read().clone()
	}

	/// Drops the cached credential so the next lookup mints a new one.
	pub fn invalidate(&self) {
		*self.current.write() = None;
	}

	/// Drops the cached credential only while it still holds `rejected`.
	///
	/// Returns `true` when the record was cleared. A credential minted after `rejected` was handed
	/// out is left untouched.
	pub fn invalidate_if(&self, rejected: &BearerToken) -> bool {
		let mut current = self.current.write();

		if current.as_ref().is_some_and(|c| c.token == *rejected) {
			*current = None;

			return true;
		}

		false
	}

	fn fresh_token(
		&self,
		credential: Option<&SignedCredential>,
		now: OffsetDateTime,
	) -> Option<BearerToken> {
		let credential = credential.filter(|c| c.is_fresh_at(now, self.refresh_buffer))?;

		self.metrics.record_hit();

		Some(credential.token.clone())
	}
}
impl Debug for CredentialCache {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		let now = OffsetDateTime::now_utc();
		let current = self.current.read();

		f.debug_struct("CredentialCache")
			.field("signer", &self.signer)
			.field("refresh_buffer", &self.refresh_buffer)
			.field("current", &*current)
			.field("remaining", &current.as_ref().map(|c| c.remaining_at(now)))
			.field("expired", &current.as_ref().is_some_and(|c| c.is_expired_at(now)))
			.finish()
	}
}

#[cfg(test)]
mod tests {
	// std
	use std::{collections::HashSet, sync::Barrier, thread};
	// crates.io
	use time::macros;
	// self
	use super::*;
	use crate::_preludet::{test_cache, test_signer};

	#[test]
	fn reuses_token_inside_refresh_window() {
		let cache = test_cache();
		let t0 = macros::datetime!(2025-03-01 12:00 UTC);
		let first = cache.token_at(t0).expect("Cold lookup should mint.");
		let second = cache
			.token_at(t0 + Duration::minutes(12) + Duration::seconds(59))
			.expect("Warm lookup should reuse the cached token.");

		assert_eq!(first.expose(), second.expose());
		assert_eq!(cache.metrics().mints(), 1);
		assert_eq!(cache.metrics().hits(), 1);
	}

	#[test]
	fn refreshes_once_refresh_boundary_is_crossed() {
		let cache = test_cache();
		let t0 = macros::datetime!(2025-03-01 12:00 UTC);
		let first = cache.token_at(t0).expect("Cold lookup should mint.");
		let first_expiry =
			cache.current().expect("Cache should hold the minted credential.").expires_at;
		let second =
			cache.token_at(t0 + Duration::minutes(13)).expect("Stale lookup should mint again.");
		let second_expiry =
			cache.current().expect("Cache should hold the refreshed credential.").expires_at;

		assert_ne!(first, second);
		assert!(second_expiry > first_expiry);
		assert_eq!(first_expiry, t0 + Duration::minutes(15));
		assert_eq!(cache.metrics().mints(), 2);
	}

	#[test]
	fn cached_expiry_matches_embedded_claim() {
		let cache = test_cache();
		let token = cache.token().expect("Lookup should mint.");
		let claims = crate::auth::CredentialClaims::peek(token.expose())
			.expect("Cached token should expose claims.");
		let current = cache.current().expect("Cache should hold the minted credential.");

		assert_eq!(current.expires_at.unix_timestamp(), claims.exp);
		assert_eq!(current.token, token);
	}

	#[test]
	fn invalidate_forces_a_new_mint() {
		let cache = test_cache();
		let t0 = macros::datetime!(2025-03-01 12:00 UTC);
		let first = cache.token_at(t0).expect("Cold lookup should mint.");

		cache.invalidate();

		assert!(cache.current().is_none());

		let second =
			cache.token_at(t0 + Duration::seconds(1)).expect("Lookup after invalidation should mint.");

		assert_ne!(first, second);
		assert_eq!(cache.metrics().mints(), 2);
	}

	#[test]
	fn invalidate_if_spares_newer_credentials() {
		let cache = test_cache();
		let t0 = macros::datetime!(2025-03-01 12:00 UTC);
		let first = cache.token_at(t0).expect("Cold lookup should mint.");

		cache.invalidate();

		let second =
			cache.token_at(t0 + Duration::seconds(1)).expect("Lookup after invalidation should mint.");

		assert!(!cache.invalidate_if(&first), "Stale rejection must not clear a newer credential.");
		assert_eq!(cache.current().map(|c| c.token), Some(second.clone()));
		assert!(cache.invalidate_if(&second));
		assert!(cache.current().is_none());
		assert!(!cache.invalidate_if(&second), "Empty cache has nothing to clear.");
	}

	#[test]
	fn debug_reports_remaining_lifetime_without_token() {
		let cache = test_cache();
		let token = cache.token().expect("Lookup should mint.");
		let rendered = format!("{cache:?}");

		assert!(rendered.contains("remaining: Some("));
		assert!(rendered.contains("expired: false"));
		assert!(!rendered.contains(token.expose()));
	}

	#[test]
	fn custom_refresh_buffer_moves_the_boundary() {
		let cache = CredentialCache::new(test_signer()).with_refresh_buffer(Duration::minutes(5));
		let t0 = macros::datetime!(2025-03-01 12:00 UTC);
		let first = cache.token_at(t0).expect("Cold lookup should mint.");

		assert_eq!(
			cache.token_at(t0 + Duration::minutes(9)).expect("Lookup should reuse the token."),
			first
		);
		assert_ne!(
			cache.token_at(t0 + Duration::minutes(10)).expect("Lookup should refresh."),
			first
		);
	}

	#[test]
	fn concurrent_cold_lookups_mint_exactly_once() {
		const CALLERS: usize = 100;

		let cache = test_cache();
		let barrier = Barrier::new(CALLERS);
		let tokens = thread::scope(|scope| {
			let handles = (0..CALLERS)
				.map(|_| {
					scope.spawn(|| {
						barrier.wait();

						cache.token()
					})
				})
				.collect::<Vec<_>>();

			handles
				.into_iter()
				.map(|handle| handle.join().expect("Caller thread should not panic."))
				.collect::<Vec<_>>()
		});
		let distinct = tokens
			.into_iter()
			.map(|token| token.expect("No caller should observe an error.").expose().to_owned())
			.collect::<HashSet<_>>();

		assert_eq!(distinct.len(), 1);
		assert_eq!(cache.metrics().mints(), 1);
		assert_eq!(cache.metrics().failures(), 0);
	}
}
