//! Explicit wiring from [`ClientConfig`] to a ready-to-use reqwest-backed client.
//!
//! There is no process-wide default instance: the builder constructs the transport, the
//! [`TokenManager`], the [`RequestMediator`], and the [`ProductClient`] in order and hands each
//! its collaborators by `Arc`.

// self
use crate::{
	_prelude::*,
	cache::{MemoryCache, TokenCache},
	clock::{Clock, SystemClock},
	config::ClientConfig,
	http::ReqwestHttpClient,
	manager::TokenManager,
	mediator::{DecodedResponse, RequestContext, RequestMediator},
	oauth::ReqwestTransportErrorMapper,
	product::ProductClient,
	retry::{self, RetryPolicy},
};

/// Reqwest-backed token manager.
pub type ReqwestTokenManager = TokenManager<ReqwestHttpClient, ReqwestTransportErrorMapper>;
/// Reqwest-backed request mediator.
pub type ReqwestRequestMediator = RequestMediator<ReqwestHttpClient, ReqwestTransportErrorMapper>;
/// Reqwest-backed product client.
pub type ReqwestProductClient = ProductClient<ReqwestHttpClient, ReqwestTransportErrorMapper>;

/// Assembles a [`DigiKeyClient`] from configuration plus optional overrides.
pub struct ClientBuilder {
	config: ClientConfig,
	http_client: Option<ReqwestHttpClient>,
	cache: Option<Arc<dyn TokenCache>>,
	clock: Option<Arc<dyn Clock>>,
	expiry_margin: Duration,
	single_flight: bool,
}
impl ClientBuilder {
	/// Starts from `config`; the transport is built from `config.http` unless overridden.
	pub fn new(config: ClientConfig) -> Self {
		Self {
			config,
			http_client: None,
			cache: None,
			clock: None,
			expiry_margin: Duration::ZERO,
			single_flight: false,
		}
	}

	/// Uses a pre-built reqwest client instead of one derived from `config.http`.
	pub fn with_http_client(mut self, http_client: ReqwestHttpClient) -> Self {
		self.http_client = Some(http_client);

		self
	}

	/// Stores tokens in `cache` instead of a private [`MemoryCache`].
	pub fn with_cache(mut self, cache: Arc<dyn TokenCache>) -> Self {
		self.cache = Some(cache);

		self
	}

	/// Overrides the time source used for expiry decisions.
	pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
		self.clock = Some(clock);

		self
	}

	/// Safety margin subtracted from every token expiry.
	pub fn with_expiry_margin(mut self, margin: Duration) -> Self {
		self.expiry_margin = margin;

		self
	}

	/// Serializes concurrent token acquisitions.
	pub fn with_single_flight(mut self, enabled: bool) -> Self {
		self.single_flight = enabled;

		self
	}

	/// Validates the configuration and wires every component.
	pub fn build(self) -> Result<DigiKeyClient> {
		let config = self.config;

		config.validate()?;

		let http_client = Arc::new(match self.http_client {
			Some(http_client) => http_client,
			None => ReqwestHttpClient::from_config(&config.http)?,
		});
		let error_mapper = Arc::new(ReqwestTransportErrorMapper);
		let cache = self.cache.unwrap_or_else(|| Arc::new(MemoryCache::default()));
		let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
		let manager: Arc<ReqwestTokenManager> = Arc::new(
			TokenManager::with_http_client(
				config.credentials()?,
				config.token_url()?,
				cache,
				http_client.clone(),
				error_mapper.clone(),
			)
			.with_scope(config.oauth.scope.clone())
			.with_default_ttl(config.cache.token_ttl())
			.with_cache_prefix(&config.cache.token_key)
			.with_expiry_margin(self.expiry_margin)
			.with_single_flight(self.single_flight)
			.with_clock(clock),
		);
		let mediator: Arc<ReqwestRequestMediator> = Arc::new(
			RequestMediator::with_http_client(
				manager.clone(),
				config.api_base_url()?,
				http_client,
				error_mapper,
			)
			.with_locale(config.locale.clone()),
		);
		let products = ProductClient::new(mediator.clone());
		let retry_policy = RetryPolicy::from_config(&config.http);

		Ok(DigiKeyClient { manager, mediator, products, retry_policy })
	}
}

impl Debug for ClientBuilder {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ClientBuilder")
			.field("config", &self.config)
			.field("http_client", &self.http_client)
			.field("custom_cache", &self.cache.is_some())
			.field("clock", &self.clock)
			.field("expiry_margin", &self.expiry_margin)
			.field("single_flight", &self.single_flight)
			.finish()
	}
}

/// Fully wired client: token manager, mediator, and product endpoints.
#[derive(Clone, Debug)]
pub struct DigiKeyClient {
	manager: Arc<ReqwestTokenManager>,
	mediator: Arc<ReqwestRequestMediator>,
	products: ReqwestProductClient,
	retry_policy: RetryPolicy,
}
impl DigiKeyClient {
	/// Starts a [`ClientBuilder`].
	pub fn builder(config: ClientConfig) -> ClientBuilder {
		ClientBuilder::new(config)
	}

	/// Builds a client from `DIGIKEY_*` environment variables with default collaborators.
	pub fn from_env() -> Result<Self> {
		ClientBuilder::new(ClientConfig::from_env()?).build()
	}

	/// Token manager shared by every call.
	pub fn manager(&self) -> &Arc<ReqwestTokenManager> {
		&self.manager
	}

	/// Request mediator shared by every call.
	pub fn mediator(&self) -> &Arc<ReqwestRequestMediator> {
		&self.mediator
	}

	/// Product-information endpoints.
	pub fn products(&self) -> &ReqwestProductClient {
		&self.products
	}

	/// Retry policy derived from `http.retry_attempts`.
	pub fn retry_policy(&self) -> &RetryPolicy {
		&self.retry_policy
	}

	/// Executes `request` with the configured retry policy, waiting via `sleep`.
	pub async fn execute_with_retry<S, Fut>(
		&self,
		request: RequestContext,
		sleep: S,
	) -> Result<DecodedResponse>
	where
		S: Fn(std::time::Duration) -> Fut,
		Fut: Future<Output = ()>,
	{
		retry::execute_with_retry(&self.mediator, request, &self.retry_policy, sleep).await
	}
}
