//! DigiKey product-information client built around a cached OAuth 2.0 client-credentials token
//! and a request mediator that turns every HTTP outcome into a typed, branchable error.

#![deny(clippy::all, missing_docs)]

pub mod auth;
pub mod cache;
#[cfg(feature = "reqwest")]
pub mod client;
pub mod clock;
pub mod config;
pub mod error;
pub mod http;
pub mod manager;
pub mod mediator;
pub mod oauth;
pub mod obs;
pub mod product;
pub mod rate_limit;
pub mod retry;
#[cfg(all(any(test, feature = "test"), feature = "reqwest"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests; enabled via `cfg(test)` or the
	//! `test` crate feature.

	pub use crate::_prelude::*;

	// self
	pub use crate::clock::ManualClock;
	use crate::{
		auth::{Credentials, ScopeSet},
		cache::{MemoryCache, TokenCache},
		clock::Clock,
		config::LocaleConfig,
		http::ReqwestHttpClient,
		manager::TokenManager,
		mediator::RequestMediator,
		oauth::ReqwestTransportErrorMapper,
	};

	/// Token manager type alias used by reqwest-backed integration tests.
	pub type ReqwestTestManager = TokenManager<ReqwestHttpClient, ReqwestTransportErrorMapper>;
	/// Mediator type alias used by reqwest-backed integration tests.
	pub type ReqwestTestMediator = RequestMediator<ReqwestHttpClient, ReqwestTransportErrorMapper>;

	/// Default lifetime applied when the mock token endpoint omits `expires_in`.
	pub const TEST_DEFAULT_TTL: Duration = Duration::seconds(3600);

	/// Builds a reqwest HTTP client with short timeouts that trusts the self-signed certificate of
	/// `httpmock`'s HTTPS listener.
	pub fn test_reqwest_http_client() -> ReqwestHttpClient {
		let client = ReqwestClient::builder()
			.timeout(std::time::Duration::from_secs(5))
			.connect_timeout(std::time::Duration::from_secs(2))
			.redirect(reqwest::redirect::Policy::none())
			.danger_accept_invalid_certs(true)
			.danger_accept_invalid_hostnames(true)
			.build()
			.expect("Failed to build Reqwest client for tests.");

		ReqwestHttpClient::with_client(client)
	}

	/// Constructs a [`TokenManager`] backed by the provided cache and clock, pointed at
	/// `token_url`.
	pub fn build_test_manager(
		token_url: &str,
		client_id: &str,
		client_secret: &str,
		cache: Arc<dyn TokenCache>,
		clock: Arc<dyn Clock>,
	) -> ReqwestTestManager {
		let credentials = Credentials::new(client_id, client_secret)
			.expect("Test credentials should be valid.");
		let token_url = Url::parse(token_url).expect("Test token URL should parse.");

		TokenManager::with_http_client(
			credentials,
			token_url,
			cache,
			test_reqwest_http_client(),
			Arc::new(ReqwestTransportErrorMapper),
		)
		.with_scope(ScopeSet::default())
		.with_default_ttl(TEST_DEFAULT_TTL)
		.with_clock(clock)
	}

	/// Builds a manager + mediator pair sharing an in-memory cache and a manual clock.
	///
	/// The token endpoint lives at `{server}/token` and the API base at `{server}/products/v4`.
	pub fn build_test_mediator(
		server_base: &str,
		client_id: &str,
		client_secret: &str,
	) -> (Arc<ReqwestTestManager>, ReqwestTestMediator, Arc<MemoryCache>, Arc<ManualClock>) {
		let cache = Arc::new(MemoryCache::default());
		let clock = Arc::new(ManualClock::default());
		let manager = Arc::new(build_test_manager(
			&format!("{server_base}/token"),
			client_id,
			client_secret,
			cache.clone(),
			clock.clone(),
		));
		let base_url = Url::parse(&format!("{server_base}/products/v4"))
			.expect("Test API base URL should parse.");
		let mediator = RequestMediator::with_http_client(
			manager.clone(),
			base_url,
			test_reqwest_http_client(),
			Arc::new(ReqwestTransportErrorMapper),
		)
		.with_locale(LocaleConfig::default());

		(manager, mediator, cache, clock)
	}
}

mod _prelude {
	pub use std::{
		collections::{BTreeMap, HashMap},
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use serde_json::Value as JsonValue;
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use serde_json;
pub use url;
#[cfg(all(test, feature = "reqwest"))] use {color_eyre as _, httpmock as _};
