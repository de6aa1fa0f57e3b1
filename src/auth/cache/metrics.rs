// std
use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters for credential cache lookups.
#[derive(Debug, Default)]
pub struct CacheMetrics {
	hits: AtomicU64,
	mints: AtomicU64,
	failures: AtomicU64,
}
impl CacheMetrics {
	/// Returns the number of lookups served from the cached credential.
	pub fn hits(&self) -> u64 {
		self.hits.load(Ordering::Relaxed)
	}

	/// Returns the number of credentials minted (one per staleness event).
	pub fn mints(&self) -> u64 {
		self.mints.load(Ordering::Relaxed)
	}

	/// Returns the number of failed mint attempts.
	pub fn failures(&self) -> u64 {
		self.failures.load(Ordering::Relaxed)
	}

	pub(crate) fn record_hit(&self) {
		self.hits.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_mint(&self) {
		self.mints.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_failure(&self) {
		self.failures.fetch_add(1, Ordering::Relaxed);
	}
}
