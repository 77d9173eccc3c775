//! Token cache contract, credential-derived cache keys, and built-in backends.
//!
//! The token manager's only persistence dependency is [`TokenCache`]: `get`, `put` with a
//! time-to-live, and `forget`. Backends are swappable without touching the manager; the
//! in-process [`MemoryCache`] and the JSON-file-backed [`FileCache`] ship with the crate.

pub mod file;
pub mod memory;

pub use file::FileCache;
pub use memory::MemoryCache;

// crates.io
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use sha2::{Digest, Sha256};
// self
use crate::{
	_prelude::*,
	auth::{CachedToken, ClientId},
};

/// Boxed future returned by [`TokenCache`] operations.
pub type CacheFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, CacheError>> + 'a + Send>>;

/// Key-value storage for cached tokens.
pub trait TokenCache
where
	Self: Send + Sync,
{
	/// Returns the live entry stored under `key`, if any.
	fn get<'a>(&'a self, key: &'a CacheKey) -> CacheFuture<'a, Option<CachedToken>>;

	/// Stores or replaces the entry under `key`; the backend may drop it after `ttl`.
	fn put<'a>(&'a self, key: &'a CacheKey, value: CachedToken, ttl: Duration)
	-> CacheFuture<'a, ()>;

	/// Deletes the entry under `key`, returning whether one existed.
	fn forget<'a>(&'a self, key: &'a CacheKey) -> CacheFuture<'a, bool>;
}

/// Error type produced by [`TokenCache`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum CacheError {
	/// Serialization failures surfaced by the backend.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}

/// Cache key derived from a credential set.
///
/// The key is `"{prefix}:{digest}"` where `digest` is the unpadded URL-safe base64 SHA-256 of
/// the client id. Identical client ids always map to the same key; distinct client ids never
/// collide, and the raw id never appears in the backend.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CacheKey(String);
impl CacheKey {
	/// Prefix used when the configuration does not override it.
	pub const DEFAULT_PREFIX: &'static str = "digikey_access_token";

	/// Derives the key for `client_id` under `prefix`.
	pub fn for_client(prefix: &str, client_id: &ClientId) -> Self {
		let digest = Sha256::digest(client_id.as_bytes());

		Self(format!("{prefix}:{}", URL_SAFE_NO_PAD.encode(digest)))
	}

	/// Returns the key string.
	pub fn as_str(&self) -> &str {
		&self.0
	}
}
impl Display for CacheKey {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.0)
	}
}

/// Stored value plus the instant the backend may discard it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
	/// Cached token.
	pub token: CachedToken,
	/// Instant after which the backend treats the entry as absent.
	pub evict_at: OffsetDateTime,
}
impl CacheEntry {
	pub(crate) fn new(token: CachedToken, ttl: Duration) -> Self {
		Self { token, evict_at: OffsetDateTime::now_utc() + ttl }
	}

	pub(crate) fn is_live_at(&self, instant: OffsetDateTime) -> bool {
		instant < self.evict_at
	}
}
