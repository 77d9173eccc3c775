// std
use std::sync::atomic::{AtomicUsize, Ordering};
// crates.io
use httpmock::prelude::*;
// self
use digikey_client::{
	_preludet::*,
	auth::{CachedToken, CustomerId},
	cache::{CacheError, CacheFuture, CacheKey, MemoryCache, TokenCache},
	config::LocaleConfig,
	error::{ApiError, AuthenticationError, Error},
	http::ReqwestHttpClient,
	mediator::{RequestContext, RequestMediator},
	oauth::ReqwestTransportErrorMapper,
};

const CLIENT_ID: &str = "abc";
const CLIENT_SECRET: &str = "xyz";

async fn mock_token<'a>(server: &'a MockServer, token: &'static str) -> httpmock::Mock<'a> {
	server
		.mock_async(move |when, then| {
			when.method(POST).path("/token");
			then.status(200)
				.header("content-type", "application/json")
				.body(format!("{{\"access_token\":\"{token}\",\"expires_in\":3600}}"));
		})
		.await
}

/// Cache that counts `forget` calls and can be told to fail them.
#[derive(Debug, Default)]
struct RecordingCache {
	inner: MemoryCache,
	forgets: AtomicUsize,
	fail_forget: bool,
}
impl TokenCache for RecordingCache {
	fn get<'a>(&'a self, key: &'a CacheKey) -> CacheFuture<'a, Option<CachedToken>> {
		self.inner.get(key)
	}

	fn put<'a>(
		&'a self,
		key: &'a CacheKey,
		value: CachedToken,
		ttl: Duration,
	) -> CacheFuture<'a, ()> {
		self.inner.put(key, value, ttl)
	}

	fn forget<'a>(&'a self, key: &'a CacheKey) -> CacheFuture<'a, bool> {
		self.forgets.fetch_add(1, Ordering::SeqCst);

		if self.fail_forget {
			return Box::pin(async {
				Err(CacheError::Backend { message: "cache unavailable".into() })
			});
		}

		self.inner.forget(key)
	}
}

fn mediator_with_cache(
	server: &MockServer,
	cache: Arc<RecordingCache>,
) -> (Arc<ReqwestTestManager>, ReqwestTestMediator) {
	let manager = Arc::new(build_test_manager(
		&server.url("/token"),
		CLIENT_ID,
		CLIENT_SECRET,
		cache,
		Arc::new(ManualClock::default()),
	));
	let base_url = Url::parse(&server.url("/products/v4")).expect("API base URL should parse.");
	let mediator = RequestMediator::with_http_client(
		manager.clone(),
		base_url,
		test_reqwest_http_client(),
		Arc::new(ReqwestTransportErrorMapper),
	);

	(manager, mediator)
}

#[tokio::test]
async fn success_sends_auth_and_locale_headers() {
	let server = MockServer::start_async().await;
	let token = mock_token(&server, "T1").await;
	let api = server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/products/v4/search/manufacturers")
				.header("authorization", "Bearer T1")
				.header("accept", "application/json")
				.header("content-type", "application/json")
				.header("x-digikey-client-id", "abc")
				.header("x-digikey-locale-site", "US")
				.header("x-digikey-locale-language", "en")
				.header("x-digikey-locale-currency", "USD")
				.header_missing("x-digikey-customer-id");
			then.status(200)
				.header("content-type", "application/json")
				.header("X-RateLimit-Limit", "1000")
				.header("X-RateLimit-Remaining", "999")
				.header("X-RateLimit-Reset", "60")
				.header("X-RateLimit-Window", "1m")
				.body("{\"Manufacturers\":[{\"Id\":1,\"Name\":\"Acme\"}]}");
		})
		.await;
	let (_, mediator, _, _) = build_test_mediator(&server.base_url(), CLIENT_ID, CLIENT_SECRET);
	let response = mediator
		.execute(RequestContext::get("search/manufacturers"))
		.await
		.expect("Successful calls should decode.");

	assert_eq!(response.status, 200);
	assert_eq!(response.body["Manufacturers"][0]["Name"], "Acme");

	let rate_limit = response.rate_limit.expect("Rate-limit headers should be attached.");

	assert_eq!(rate_limit.limit, Some(1000));
	assert_eq!(rate_limit.remaining, Some(999));
	assert_eq!(rate_limit.reset, Some(60));
	assert_eq!(rate_limit.window.as_deref(), Some("1m"));

	token.assert_async().await;
	api.assert_async().await;
}

#[tokio::test]
async fn unauthorized_invalidates_token_before_propagating() {
	let server = MockServer::start_async().await;
	let token = mock_token(&server, "T1").await;
	let api = server
		.mock_async(|when, then| {
			when.method(GET).path("/products/v4/search/categories");
			then.status(401)
				.header("content-type", "application/json")
				.body("{\"message\":\"invalid token\"}");
		})
		.await;
	let cache = Arc::new(RecordingCache::default());
	let (manager, mediator) = mediator_with_cache(&server, cache.clone());
	let err = mediator
		.execute(RequestContext::get("search/categories"))
		.await
		.expect_err("401 responses must fail.");

	match &err {
		Error::Authentication(AuthenticationError::Rejected {
			message,
			status,
			details,
			invalidation_error,
		}) => {
			assert_eq!(message, "invalid token");
			assert_eq!(*status, 401);
			assert_eq!(details["message"], "invalid token");
			assert!(invalidation_error.is_none());
		},
		other => panic!("Unexpected error: {other:?}"),
	}

	assert_eq!(err.to_string(), "invalid token");
	assert_eq!(cache.forgets.load(Ordering::SeqCst), 1);
	assert!(!manager.has_valid_token().await.expect("Cache lookup should succeed."));

	token.assert_calls_async(1).await;
	api.assert_calls_async(1).await;

	// The next call authenticates again.
	let _ = mediator.execute(RequestContext::get("search/categories")).await;

	token.assert_calls_async(2).await;
	assert_eq!(cache.forgets.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn failed_invalidation_travels_with_the_401() {
	let server = MockServer::start_async().await;
	let _token = mock_token(&server, "T1").await;
	let _api = server
		.mock_async(|when, then| {
			when.method(GET).path("/products/v4/search/categories");
			then.status(401).body("");
		})
		.await;
	let cache = Arc::new(RecordingCache { fail_forget: true, ..Default::default() });
	let (_, mediator) = mediator_with_cache(&server, cache.clone());
	let err = mediator
		.execute(RequestContext::get("search/categories"))
		.await
		.expect_err("401 responses must fail.");

	match err {
		Error::Authentication(AuthenticationError::Rejected {
			message,
			details,
			invalidation_error,
			..
		}) => {
			assert_eq!(message, "Client error occurred");
			assert_eq!(details, serde_json::json!({}));
			assert_eq!(
				invalidation_error,
				Some(CacheError::Backend { message: "cache unavailable".into() })
			);
		},
		other => panic!("Unexpected error: {other:?}"),
	}

	assert_eq!(cache.forgets.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn server_errors_leave_token_untouched() {
	let server = MockServer::start_async().await;
	let token = mock_token(&server, "T1").await;
	let _api = server
		.mock_async(|when, then| {
			when.method(GET).path("/products/v4/search/categories/7");
			then.status(500)
				.header("content-type", "application/json")
				.body("{\"message\":\"downstream unavailable\"}");
		})
		.await;
	let (manager, mediator, _, _) = build_test_mediator(&server.base_url(), CLIENT_ID, CLIENT_SECRET);
	let err = mediator
		.execute(RequestContext::get("search/categories/7"))
		.await
		.expect_err("500 responses must fail.");

	match &err {
		Error::Api(ApiError::Status { message, status, .. }) => {
			assert_eq!(message, "downstream unavailable");
			assert_eq!(*status, 500);
		},
		other => panic!("Unexpected error: {other:?}"),
	}

	assert_eq!(err.status_code(), Some(500));
	assert!(manager.has_valid_token().await.expect("Cache lookup should succeed."));

	mediator
		.execute(RequestContext::get("search/categories/7"))
		.await
		.expect_err("500 responses must fail again.");

	token.assert_calls_async(1).await;
}

#[tokio::test]
async fn rate_limits_are_distinct_and_not_retried() {
	let server = MockServer::start_async().await;
	let _token = mock_token(&server, "T1").await;
	let api = server
		.mock_async(|when, then| {
			when.method(GET).path("/products/v4/search/manufacturers");
			then.status(429)
				.header("content-type", "application/json")
				.header("Retry-After", "7")
				.header("X-RateLimit-Remaining", "0")
				.body("{\"message\":\"Too many requests\"}");
		})
		.await;
	let (manager, mediator, _, _) = build_test_mediator(&server.base_url(), CLIENT_ID, CLIENT_SECRET);
	let err = mediator
		.execute(RequestContext::get("search/manufacturers"))
		.await
		.expect_err("429 responses must fail.");

	assert!(err.is_rate_limited());
	assert!(!err.is_authentication());

	match err {
		Error::RateLimited(limited) => {
			assert_eq!(limited.message, "Too many requests");
			assert_eq!(limited.retry_after, Some(Duration::seconds(7)));
			assert_eq!(limited.rate_limit.and_then(|limit| limit.remaining), Some(0));
		},
		other => panic!("Unexpected error: {other:?}"),
	}

	assert!(manager.has_valid_token().await.expect("Cache lookup should succeed."));

	api.assert_calls_async(1).await;
}

#[tokio::test]
async fn malformed_success_body_is_an_api_error() {
	let server = MockServer::start_async().await;
	let _token = mock_token(&server, "T1").await;
	let _api = server
		.mock_async(|when, then| {
			when.method(GET).path("/products/v4/search/manufacturers");
			then.status(200).header("content-type", "application/json").body("{\"Manufacturers\":");
		})
		.await;
	let (_, mediator, _, _) = build_test_mediator(&server.base_url(), CLIENT_ID, CLIENT_SECRET);
	let err = mediator
		.execute(RequestContext::get("search/manufacturers"))
		.await
		.expect_err("Malformed bodies must never decode silently.");

	assert!(matches!(err, Error::Api(ApiError::InvalidResponse { status: 200, .. })));
}

#[tokio::test]
async fn non_json_client_errors_use_fallbacks() {
	let server = MockServer::start_async().await;
	let _token = mock_token(&server, "T1").await;
	let _api = server
		.mock_async(|when, then| {
			when.method(GET).path("/products/v4/search/missing/productdetails");
			then.status(404).header("content-type", "text/html").body("<h1>Not Found</h1>");
		})
		.await;
	let (_, mediator, _, _) = build_test_mediator(&server.base_url(), CLIENT_ID, CLIENT_SECRET);
	let err = mediator
		.execute(RequestContext::get("search/missing/productdetails"))
		.await
		.expect_err("404 responses must fail.");

	match err {
		Error::Api(ApiError::Status { message, status, details }) => {
			assert_eq!(message, "Client error occurred");
			assert_eq!(status, 404);
			assert_eq!(details, serde_json::json!({}));
		},
		other => panic!("Unexpected error: {other:?}"),
	}
}

#[tokio::test]
async fn token_failure_never_reaches_the_api() {
	let server = MockServer::start_async().await;
	let _token = server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(500).body("upstream down");
		})
		.await;
	let api = server
		.mock_async(|when, then| {
			when.path_includes("/products/v4");
			then.status(200).body("{}");
		})
		.await;
	let (_, mediator, _, _) = build_test_mediator(&server.base_url(), CLIENT_ID, CLIENT_SECRET);
	let err = mediator
		.execute(RequestContext::get("search/manufacturers"))
		.await
		.expect_err("Token failures must fail the call.");

	assert!(matches!(err, Error::Authentication(AuthenticationError::TokenEndpoint { status: 500, .. })));

	api.assert_calls_async(0).await;
}

#[tokio::test]
async fn transport_failures_report_status_zero() {
	let server = MockServer::start_async().await;
	let _token = mock_token(&server, "T1").await;
	let manager = Arc::new(build_test_manager(
		&server.url("/token"),
		CLIENT_ID,
		CLIENT_SECRET,
		Arc::new(MemoryCache::default()),
		Arc::new(ManualClock::default()),
	));
	let mediator: RequestMediator<ReqwestHttpClient, ReqwestTransportErrorMapper> =
		RequestMediator::with_http_client(
			manager,
			Url::parse("http://127.0.0.1:9/products/v4").expect("API base URL should parse."),
			test_reqwest_http_client(),
			Arc::new(ReqwestTransportErrorMapper),
		);
	let err = mediator
		.execute(RequestContext::get("search/manufacturers"))
		.await
		.expect_err("Closed ports must fail.");

	assert!(matches!(err, Error::Api(ApiError::Transport { .. })));
	assert_eq!(err.status_code(), Some(0));
}

#[tokio::test]
async fn customer_and_locale_overrides_are_sent() {
	let server = MockServer::start_async().await;
	let _token = mock_token(&server, "T1").await;
	let api = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/products/v4/search/keyword")
				.header("x-digikey-customer-id", "1234")
				.header("x-digikey-locale-site", "DE")
				.header("x-digikey-locale-currency", "EUR")
				.json_body(serde_json::json!({ "Keywords": "resistor", "Limit": 5 }));
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"ProductsCount\":0,\"Products\":[]}");
		})
		.await;
	let (_, mediator, _, _) = build_test_mediator(&server.base_url(), CLIENT_ID, CLIENT_SECRET);
	let mediator = mediator.with_customer_id(Some(
		CustomerId::new("1234").expect("Customer fixture should be valid."),
	));
	let locale = LocaleConfig { site: "DE".into(), currency: "EUR".into(), ..Default::default() };
	let request = RequestContext::post("search/keyword")
		.with_body(serde_json::json!({ "Keywords": "resistor", "Limit": 5 }))
		.with_locale(locale);
	let response = mediator.execute(request).await.expect("Keyword search should succeed.");

	assert_eq!(response.into_json()["ProductsCount"], 0);

	api.assert_async().await;
}

#[tokio::test]
async fn empty_success_body_decodes_to_null() {
	let server = MockServer::start_async().await;
	let _token = mock_token(&server, "T1").await;
	let _api = server
		.mock_async(|when, then| {
			when.method(DELETE).path("/products/v4/search/cache");
			then.status(204);
		})
		.await;
	let (_, mediator, _, _) = build_test_mediator(&server.base_url(), CLIENT_ID, CLIENT_SECRET);
	let response = mediator.delete("search/cache").await.expect("Empty bodies should decode.");

	assert_eq!(response.status, 204);
	assert_eq!(response.body, JsonValue::Null);
}

#[tokio::test]
async fn get_helper_appends_query_pairs() {
	let server = MockServer::start_async().await;
	let _token = mock_token(&server, "T1").await;
	let api = server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/products/v4/search/P5/pricing")
				.query_param("requestedquantity", "10");
			then.status(200).header("content-type", "application/json").body("[]");
		})
		.await;
	let (_, mediator, _, _) = build_test_mediator(&server.base_url(), CLIENT_ID, CLIENT_SECRET);
	let response = mediator
		.get("/search/P5/pricing", &[("requestedquantity", "10")])
		.await
		.expect("GET helper should succeed.");

	assert_eq!(response.body, serde_json::json!([]));

	api.assert_async().await;
}
