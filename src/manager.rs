//! OAuth 2.0 client-credentials token lifecycle: acquire, cache, validate, invalidate.
//!
//! A [`TokenManager`] owns one credential set. Its cached token lives in a pluggable
//! [`TokenCache`] under a key derived from the client id, so managers built from the same
//! credentials share a token while different credentials never observe each other's.
//!
//! Expiry is computed from the instant the token request is sent, before any network latency,
//! minus an optional safety margin. The stored expiry is therefore never later than the
//! server-side one.
//!
//! Without single-flight, concurrent callers that all miss the cache each acquire a token and
//! the last write wins. [`TokenManager::with_single_flight`] serializes acquisitions for one
//! manager instead.

// crates.io
use oauth2::AsyncHttpClient;
// self
use crate::{
	_prelude::*,
	auth::{AccessToken, CachedToken, Credentials, ScopeSet},
	cache::{CacheKey, TokenCache},
	clock::{Clock, SystemClock},
	error::AuthenticationError,
	http::HttpTransport,
	oauth::{self, TransportErrorMapper, TransportStage},
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
};
#[cfg(feature = "reqwest")]
use crate::{http::ReqwestHttpClient, oauth::ReqwestTransportErrorMapper};

/// Lifetime assumed when the token endpoint omits `expires_in`.
pub const DEFAULT_TOKEN_TTL: Duration = Duration::seconds(3600);
/// Upper bound applied to any token lifetime, reported or configured.
pub const MAX_TOKEN_TTL: Duration = Duration::days(365);

/// Owns the client-credentials flow for a single credential set.
pub struct TokenManager<C, M>
where
	C: HttpTransport,
	M: TransportErrorMapper<C::TransportError>,
{
	credentials: Credentials,
	token_url: Url,
	scope: ScopeSet,
	cache: Arc<dyn TokenCache>,
	cache_key: CacheKey,
	http_client: Arc<C>,
	error_mapper: Arc<M>,
	clock: Arc<dyn Clock>,
	default_ttl: Duration,
	expiry_margin: Duration,
	single_flight: bool,
	flight: AsyncMutex<()>,
}
impl<C, M> TokenManager<C, M>
where
	C: HttpTransport,
	M: TransportErrorMapper<C::TransportError>,
{
	/// Creates a manager that exchanges `credentials` at `token_url` over `http_client`.
	pub fn with_http_client(
		credentials: Credentials,
		token_url: Url,
		cache: Arc<dyn TokenCache>,
		http_client: impl Into<Arc<C>>,
		error_mapper: impl Into<Arc<M>>,
	) -> Self {
		let cache_key = CacheKey::for_client(CacheKey::DEFAULT_PREFIX, &credentials.client_id);

		Self {
			credentials,
			token_url,
			scope: ScopeSet::default(),
			cache,
			cache_key,
			http_client: http_client.into(),
			error_mapper: error_mapper.into(),
			clock: Arc::new(SystemClock),
			default_ttl: DEFAULT_TOKEN_TTL,
			expiry_margin: Duration::ZERO,
			single_flight: false,
			flight: AsyncMutex::new(()),
		}
	}

	/// Scopes requested with every token exchange; empty omits the parameter.
	pub fn with_scope(mut self, scope: ScopeSet) -> Self {
		self.scope = scope;

		self
	}

	/// Lifetime used when the response lacks a positive `expires_in`; capped at
	/// [`MAX_TOKEN_TTL`].
	pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
		self.default_ttl = ttl.min(MAX_TOKEN_TTL);

		self
	}

	/// Extra safety margin subtracted from every computed expiry.
	pub fn with_expiry_margin(mut self, margin: Duration) -> Self {
		self.expiry_margin = if margin.is_negative() { Duration::ZERO } else { margin };

		self
	}

	/// Overrides the time source used for expiry decisions.
	pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
		self.clock = clock;

		self
	}

	/// Serializes concurrent acquisitions behind an async mutex when enabled.
	pub fn with_single_flight(mut self, enabled: bool) -> Self {
		self.single_flight = enabled;

		self
	}

	/// Replaces the cache key prefix (the hashed client id suffix is kept).
	pub fn with_cache_prefix(mut self, prefix: &str) -> Self {
		self.cache_key = CacheKey::for_client(prefix, &self.credentials.client_id);

		self
	}

	/// Credential set this manager authenticates with.
	pub fn credentials(&self) -> &Credentials {
		&self.credentials
	}

	/// Cache entry the token is stored under.
	pub fn cache_key(&self) -> &CacheKey {
		&self.cache_key
	}

	/// Token endpoint URL.
	pub fn token_url(&self) -> &Url {
		&self.token_url
	}

	/// Returns a token that is valid right now, acquiring a fresh one when needed.
	pub async fn get_valid_token(&self) -> Result<AccessToken> {
		if let Some(token) = self.cached_token().await? {
			return Ok(token.access_token);
		}
		if !self.single_flight {
			return self.acquire_token().await;
		}

		let _flight = self.flight.lock().await;

		// Another caller may have finished acquiring while this one waited.
		if let Some(token) = self.cached_token().await? {
			return Ok(token.access_token);
		}

		self.acquire_token().await
	}

	/// Performs the client-credentials exchange unconditionally and caches the result.
	///
	/// The cache is written only after the response has been fully validated.
	pub async fn acquire_token(&self) -> Result<AccessToken> {
		const KIND: FlowKind = FlowKind::TokenAcquire;

		let span = FlowSpan::new(KIND, "acquire_token");
		let status_span = span.clone();

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				let request =
					oauth::build_token_request(&self.token_url, &self.credentials, &self.scope)?;
				let requested_at = self.clock.now();
				let handle = self.http_client.handle();
				let response = handle.call(request).await.map_err(|e| {
					status_span.record_status(0);
					obs::record_http_status(KIND, 0);

					self.error_mapper.map_transport_error(TransportStage::TokenEndpoint, e)
				})?;

				status_span.record_status(response.status().as_u16());
				obs::record_http_status(KIND, response.status().as_u16());

				let grant = oauth::parse_token_response(&response)?;
				let ttl = grant.expires_in.unwrap_or(self.default_ttl).min(MAX_TOKEN_TTL);
				let expires_at = requested_at
					.checked_add(ttl)
					.and_then(|at| at.checked_sub(self.expiry_margin))
					.ok_or(AuthenticationError::ExpiryOutOfRange)?;
				let token = CachedToken::new(grant.access_token, expires_at);
				let cache_ttl = expires_at - requested_at;

				if cache_ttl.is_positive() {
					self.cache.put(&self.cache_key, token.clone(), cache_ttl).await?;
				}

				Ok(token.access_token)
			})
			.await;

		match &result {
			Ok(_) => obs::record_flow_outcome(KIND, FlowOutcome::Success),
			Err(_) => obs::record_flow_outcome(KIND, FlowOutcome::Failure),
		}

		result
	}

	/// Returns `true` when a cached token exists and has not yet expired.
	pub async fn has_valid_token(&self) -> Result<bool> {
		Ok(self.cached_token().await?.is_some())
	}

	/// Deletes the cached token; the next [`get_valid_token`](Self::get_valid_token) acquires.
	pub async fn invalidate(&self) -> Result<()> {
		const KIND: FlowKind = FlowKind::TokenInvalidate;

		let span = FlowSpan::new(KIND, "invalidate");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				self.cache.forget(&self.cache_key).await?;

				Ok(())
			})
			.await;

		match &result {
			Ok(_) => obs::record_flow_outcome(KIND, FlowOutcome::Success),
			Err(_) => obs::record_flow_outcome(KIND, FlowOutcome::Failure),
		}

		result
	}

	async fn cached_token(&self) -> Result<Option<CachedToken>> {
		let cached = self.cache.get(&self.cache_key).await?;
		let now = self.clock.now();

		Ok(cached.filter(|token| token.is_valid_at(now)))
	}
}
#[cfg(feature = "reqwest")]
impl TokenManager<ReqwestHttpClient, ReqwestTransportErrorMapper> {
	/// Creates a manager backed by a default reqwest client.
	pub fn new(credentials: Credentials, token_url: Url, cache: Arc<dyn TokenCache>) -> Self {
		Self::with_http_client(
			credentials,
			token_url,
			cache,
			ReqwestHttpClient::default(),
			ReqwestTransportErrorMapper,
		)
	}
}
impl<C, M> Debug for TokenManager<C, M>
where
	C: HttpTransport,
	M: TransportErrorMapper<C::TransportError>,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenManager")
			.field("client_id", &self.credentials.client_id)
			.field("token_url", &self.token_url.as_str())
			.field("scope", &self.scope)
			.field("cache_key", &self.cache_key)
			.field("default_ttl", &self.default_ttl)
			.field("expiry_margin", &self.expiry_margin)
			.field("single_flight", &self.single_flight)
			.finish()
	}
}

/// Maps a token failure to the authentication category callers branch on.
pub(crate) fn into_authentication_error(err: Error) -> AuthenticationError {
	match err {
		Error::Authentication(inner) => inner,
		other => AuthenticationError::TokenUnavailable { source: Box::new(other) },
	}
}
