//! Thread-safe in-memory [`TokenCache`] for single-process deployments and tests.

// self
use crate::{
	_prelude::*,
	auth::CachedToken,
	cache::{CacheEntry, CacheFuture, CacheKey, TokenCache},
};

type CacheMap = Arc<RwLock<HashMap<CacheKey, CacheEntry>>>;

/// In-process cache shared by every manager holding a clone of it.
#[derive(Clone, Debug, Default)]
pub struct MemoryCache(CacheMap);
impl MemoryCache {
	/// Number of entries currently held, including ones past their TTL.
	pub fn len(&self) -> usize {
		self.0.read().len()
	}

	/// Returns `true` when the cache holds no entries.
	pub fn is_empty(&self) -> bool {
		self.0.read().is_empty()
	}

	fn get_now(map: &CacheMap, key: &CacheKey) -> Option<CachedToken> {
		let now = OffsetDateTime::now_utc();
		{
			let guard = map.read();

			match guard.get(key) {
				Some(entry) if entry.is_live_at(now) => return Some(entry.token.clone()),
				Some(_) => {},
				None => return None,
			}
		}

		let mut guard = map.write();

		if guard.get(key).is_some_and(|entry| !entry.is_live_at(now)) {
			guard.remove(key);
		}

		None
	}
}
impl TokenCache for MemoryCache {
	fn get<'a>(&'a self, key: &'a CacheKey) -> CacheFuture<'a, Option<CachedToken>> {
		let map = self.0.clone();

		Box::pin(async move { Ok(Self::get_now(&map, key)) })
	}

	fn put<'a>(
		&'a self,
		key: &'a CacheKey,
		value: CachedToken,
		ttl: Duration,
	) -> CacheFuture<'a, ()> {
		let map = self.0.clone();

		Box::pin(async move {
			map.write().insert(key.clone(), CacheEntry::new(value, ttl));

			Ok(())
		})
	}

	fn forget<'a>(&'a self, key: &'a CacheKey) -> CacheFuture<'a, bool> {
		let map = self.0.clone();

		Box::pin(async move { Ok(map.write().remove(key).is_some()) })
	}
}
