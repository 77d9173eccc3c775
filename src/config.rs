//! Typed client configuration with environment loading.
//!
//! Every field has a default matching DigiKey's production API, so a configuration needs only
//! credentials to be usable. [`ClientConfig::from_env`] reads `DIGIKEY_*` variables;
//! [`ClientConfig::from_lookup`] accepts any lookup function so tests never touch the process
//! environment.

// self
use crate::{
	_prelude::*,
	auth::{Credentials, ScopeSet},
	error::ConfigError,
	manager::MAX_TOKEN_TTL,
};

/// Production product-information API base.
pub const DEFAULT_BASE_URL: &str = "https://api.digikey.com/products/v4";
/// Sandbox product-information API base.
pub const DEFAULT_SANDBOX_URL: &str = "https://sandbox-api.digikey.com/products/v4";
/// OAuth 2.0 token endpoint.
pub const DEFAULT_TOKEN_URL: &str = "https://api.digikey.com/v1/oauth2/token";

/// Complete client configuration.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
	/// OAuth client identifier.
	pub client_id: String,
	/// OAuth client secret.
	pub client_secret: String,
	/// Production API base URL.
	pub base_url: String,
	/// Sandbox API base URL.
	pub sandbox_url: String,
	/// Routes API calls to [`sandbox_url`](Self::sandbox_url) when set.
	pub use_sandbox: bool,
	/// Token endpoint settings.
	pub oauth: OAuthConfig,
	/// Locale headers sent with every API call.
	pub locale: LocaleConfig,
	/// Customer number sent as `X-DIGIKEY-Customer-Id`.
	pub customer_id: Option<String>,
	/// Token cache settings.
	pub cache: CacheConfig,
	/// Transport settings.
	pub http: HttpConfig,
}
impl ClientConfig {
	/// Creates a configuration with defaults for everything but the credentials.
	pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
		Self { client_id: client_id.into(), client_secret: client_secret.into(), ..Default::default() }
	}

	/// Loads the configuration from `DIGIKEY_*` environment variables.
	pub fn from_env() -> Result<Self, ConfigError> {
		Self::from_lookup(|key| std::env::var(key).ok())
	}

	/// Loads the configuration through `lookup`, falling back to defaults for unset keys.
	pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
	where
		F: Fn(&str) -> Option<String>,
	{
		let get = |key: &str| lookup(key).map(|v| v.trim().to_owned()).filter(|v| !v.is_empty());
		let mut config = Self::default();

		if let Some(v) = get("DIGIKEY_CLIENT_ID") {
			config.client_id = v;
		}
		if let Some(v) = get("DIGIKEY_CLIENT_SECRET") {
			config.client_secret = v;
		}
		if let Some(v) = get("DIGIKEY_BASE_URL") {
			config.base_url = v;
		}
		if let Some(v) = get("DIGIKEY_SANDBOX_URL") {
			config.sandbox_url = v;
		}
		if let Some(v) = get("DIGIKEY_USE_SANDBOX") {
			config.use_sandbox = parse_bool("DIGIKEY_USE_SANDBOX", &v)?;
		}
		if let Some(v) = get("DIGIKEY_TOKEN_URL") {
			config.oauth.token_url = v;
		}
		if let Some(v) = get("DIGIKEY_SCOPE") {
			config.oauth.scope = ScopeSet::new(v.split_whitespace());
		}
		if let Some(v) = get("DIGIKEY_LOCALE_LANGUAGE") {
			config.locale.language = v;
		}
		if let Some(v) = get("DIGIKEY_LOCALE_CURRENCY") {
			config.locale.currency = v;
		}
		if let Some(v) = get("DIGIKEY_LOCALE_SITE") {
			config.locale.site = v;
		}

		config.customer_id = get("DIGIKEY_CUSTOMER_ID");

		if let Some(v) = get("DIGIKEY_TOKEN_CACHE_KEY") {
			config.cache.token_key = v;
		}
		if let Some(v) = get("DIGIKEY_TOKEN_CACHE_TTL") {
			config.cache.token_ttl_seconds = parse_number("DIGIKEY_TOKEN_CACHE_TTL", &v)?;
		}
		if let Some(v) = get("DIGIKEY_HTTP_TIMEOUT") {
			config.http.timeout_s = parse_number("DIGIKEY_HTTP_TIMEOUT", &v)?;
		}
		if let Some(v) = get("DIGIKEY_HTTP_CONNECT_TIMEOUT") {
			config.http.connect_timeout_s = parse_number("DIGIKEY_HTTP_CONNECT_TIMEOUT", &v)?;
		}
		if let Some(v) = get("DIGIKEY_HTTP_RETRY_ATTEMPTS") {
			config.http.retry_attempts = parse_number("DIGIKEY_HTTP_RETRY_ATTEMPTS", &v)?;
		}

		Ok(config)
	}

	/// Checks that credentials are present, URLs parse, and durations are positive.
	pub fn validate(&self) -> Result<(), ConfigError> {
		if self.client_id.trim().is_empty() {
			return Err(ConfigError::Missing { key: "client_id" });
		}
		if self.client_secret.trim().is_empty() {
			return Err(ConfigError::Missing { key: "client_secret" });
		}

		parse_url("base_url", &self.base_url)?;
		parse_url("sandbox_url", &self.sandbox_url)?;
		self.token_url()?;
		self.credentials()?;

		if self.cache.token_key.trim().is_empty() {
			return Err(ConfigError::Missing { key: "cache.token_key" });
		}
		if self.cache.token_ttl_seconds == 0 {
			return Err(invalid("cache.token_ttl_seconds", "must be greater than zero"));
		}
		if self.cache.token_ttl_seconds > MAX_TOKEN_TTL.whole_seconds().unsigned_abs() {
			return Err(invalid(
				"cache.token_ttl_seconds",
				format!("must not exceed {} seconds", MAX_TOKEN_TTL.whole_seconds()),
			));
		}
		if self.http.timeout_s == 0 {
			return Err(invalid("http.timeout_s", "must be greater than zero"));
		}
		if self.http.connect_timeout_s == 0 {
			return Err(invalid("http.connect_timeout_s", "must be greater than zero"));
		}

		Ok(())
	}

	/// API base URL, honoring [`use_sandbox`](Self::use_sandbox).
	pub fn api_base_url(&self) -> Result<Url, ConfigError> {
		if self.use_sandbox {
			parse_url("sandbox_url", &self.sandbox_url)
		} else {
			parse_url("base_url", &self.base_url)
		}
	}

	/// Parsed token endpoint URL.
	pub fn token_url(&self) -> Result<Url, ConfigError> {
		parse_url("oauth.token_url", &self.oauth.token_url)
	}

	/// Validated credential set, bound to the customer number when one is configured.
	pub fn credentials(&self) -> Result<Credentials, ConfigError> {
		let credentials = Credentials::new(&self.client_id, self.client_secret.clone())?;

		match self.customer_id.as_deref().map(str::trim).filter(|id| !id.is_empty()) {
			Some(customer_id) => Ok(credentials.with_customer_id(customer_id)?),
			None => Ok(credentials),
		}
	}
}
impl Default for ClientConfig {
	fn default() -> Self {
		Self {
			client_id: String::new(),
			client_secret: String::new(),
			base_url: DEFAULT_BASE_URL.into(),
			sandbox_url: DEFAULT_SANDBOX_URL.into(),
			use_sandbox: false,
			oauth: OAuthConfig::default(),
			locale: LocaleConfig::default(),
			customer_id: None,
			cache: CacheConfig::default(),
			http: HttpConfig::default(),
		}
	}
}
impl Debug for ClientConfig {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ClientConfig")
			.field("client_id", &self.client_id)
			.field("client_secret", &"<redacted>")
			.field("base_url", &self.base_url)
			.field("sandbox_url", &self.sandbox_url)
			.field("use_sandbox", &self.use_sandbox)
			.field("oauth", &self.oauth)
			.field("locale", &self.locale)
			.field("customer_id", &self.customer_id)
			.field("cache", &self.cache)
			.field("http", &self.http)
			.finish()
	}
}

/// Token endpoint settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OAuthConfig {
	/// Token endpoint URL.
	pub token_url: String,
	/// Requested scopes; a single string is split on whitespace.
	pub scope: ScopeSet,
}
impl Default for OAuthConfig {
	fn default() -> Self {
		Self { token_url: DEFAULT_TOKEN_URL.into(), scope: ScopeSet::default() }
	}
}

/// Locale sent as `X-DIGIKEY-Locale-*` headers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocaleConfig {
	/// `X-DIGIKEY-Locale-Language`.
	pub language: String,
	/// `X-DIGIKEY-Locale-Currency`.
	pub currency: String,
	/// `X-DIGIKEY-Locale-Site`.
	pub site: String,
}
impl Default for LocaleConfig {
	fn default() -> Self {
		Self { language: "en".into(), currency: "USD".into(), site: "US".into() }
	}
}

/// Token cache settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
	/// Cache key prefix; the hashed client id is appended.
	pub token_key: String,
	/// Lifetime assumed when the token endpoint omits `expires_in`.
	pub token_ttl_seconds: u64,
}
impl CacheConfig {
	/// [`token_ttl_seconds`](Self::token_ttl_seconds) as a duration.
	pub fn token_ttl(&self) -> Duration {
		Duration::seconds(i64::try_from(self.token_ttl_seconds).unwrap_or(i64::MAX))
	}
}
impl Default for CacheConfig {
	fn default() -> Self {
		Self { token_key: crate::cache::CacheKey::DEFAULT_PREFIX.into(), token_ttl_seconds: 3600 }
	}
}

/// Transport settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
	/// Total request timeout in seconds.
	pub timeout_s: u64,
	/// Connect timeout in seconds.
	pub connect_timeout_s: u64,
	/// Attempts made by the caller-side retry decorator, including the first.
	pub retry_attempts: u32,
}
impl HttpConfig {
	/// Total request timeout.
	pub fn timeout(&self) -> std::time::Duration {
		std::time::Duration::from_secs(self.timeout_s)
	}

	/// Connect timeout.
	pub fn connect_timeout(&self) -> std::time::Duration {
		std::time::Duration::from_secs(self.connect_timeout_s)
	}
}
impl Default for HttpConfig {
	fn default() -> Self {
		Self { timeout_s: 30, connect_timeout_s: 10, retry_attempts: 3 }
	}
}

fn parse_url(key: &'static str, value: &str) -> Result<Url, ConfigError> {
	let url = Url::parse(value).map_err(|source| ConfigError::InvalidUrl { key, source })?;

	if url.cannot_be_a_base() {
		return Err(ConfigError::CannotBeBase { url: value.into() });
	}

	Ok(url)
}

fn parse_bool(key: &'static str, value: &str) -> Result<bool, ConfigError> {
	match value.to_ascii_lowercase().as_str() {
		"1" | "true" | "yes" | "on" => Ok(true),
		"0" | "false" | "no" | "off" => Ok(false),
		_ => Err(invalid(key, "expected a boolean")),
	}
}

fn parse_number<T>(key: &'static str, value: &str) -> Result<T, ConfigError>
where
	T: FromStr,
	T::Err: Display,
{
	value.parse().map_err(|e: T::Err| invalid(key, e.to_string()))
}

fn invalid(key: &'static str, reason: impl Into<String>) -> ConfigError {
	ConfigError::Invalid { key, reason: reason.into() }
}
