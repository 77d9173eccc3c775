// std
use std::{env, fs, process};
// crates.io
use httpmock::prelude::*;
// self
use digikey_client::{
	_preludet::*,
	auth::ScopeSet,
	cache::{CacheKey, FileCache, MemoryCache, TokenCache},
	error::{AuthenticationError, Error},
	manager::MAX_TOKEN_TTL,
};

const CLIENT_ID: &str = "abc";
const CLIENT_SECRET: &str = "xyz";

fn manager_for(
	server: &MockServer,
	client_id: &str,
	cache: Arc<dyn TokenCache>,
) -> (ReqwestTestManager, Arc<ManualClock>) {
	let clock = Arc::new(ManualClock::default());
	let manager =
		build_test_manager(&server.url("/token"), client_id, CLIENT_SECRET, cache, clock.clone());

	(manager, clock)
}

#[tokio::test]
async fn token_is_reused_until_expiry() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/token")
				.header("content-type", "application/x-www-form-urlencoded")
				.body_includes("grant_type=client_credentials")
				.body_includes("client_id=abc")
				.body_includes("client_secret=xyz")
				.body_excludes("scope=");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access_token\":\"T1\",\"expires_in\":60}");
		})
		.await;
	let (manager, clock) = manager_for(&server, CLIENT_ID, Arc::new(MemoryCache::default()));
	let first = manager.get_valid_token().await.expect("Initial acquisition should succeed.");
	let second = manager.get_valid_token().await.expect("Cached token should be returned.");

	assert_eq!(first.expose(), "T1");
	assert_eq!(second.expose(), "T1");

	mock.assert_calls_async(1).await;

	clock.advance(Duration::seconds(61));

	let third = manager.get_valid_token().await.expect("Expired token should be replaced.");

	assert_eq!(third.expose(), "T1");

	mock.assert_calls_async(2).await;
}

#[tokio::test]
async fn validity_boundary_follows_expires_in() {
	let server = MockServer::start_async().await;
	let _mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access_token\":\"T1\",\"token_type\":\"Bearer\",\"expires_in\":3600}");
		})
		.await;
	let (manager, clock) = manager_for(&server, CLIENT_ID, Arc::new(MemoryCache::default()));

	assert!(!manager.has_valid_token().await.expect("Cache lookup should succeed."));

	manager.acquire_token().await.expect("Acquisition should succeed.");
	clock.advance(Duration::seconds(3599));

	assert!(manager.has_valid_token().await.expect("Cache lookup should succeed."));

	clock.advance(Duration::seconds(2));

	assert!(!manager.has_valid_token().await.expect("Cache lookup should succeed."));
}

#[tokio::test]
async fn missing_expires_in_uses_default_ttl() {
	let server = MockServer::start_async().await;
	let _mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access_token\":\"T1\"}");
		})
		.await;
	let (manager, clock) = manager_for(&server, CLIENT_ID, Arc::new(MemoryCache::default()));

	manager.get_valid_token().await.expect("Acquisition should succeed.");
	clock.advance(TEST_DEFAULT_TTL - Duration::seconds(1));

	assert!(manager.has_valid_token().await.expect("Cache lookup should succeed."));

	clock.advance(Duration::seconds(2));

	assert!(!manager.has_valid_token().await.expect("Cache lookup should succeed."));
}

#[tokio::test]
async fn expiry_margin_shortens_validity() {
	let server = MockServer::start_async().await;
	let _mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access_token\":\"T1\",\"expires_in\":60}");
		})
		.await;
	let (manager, clock) = manager_for(&server, CLIENT_ID, Arc::new(MemoryCache::default()));
	let manager = manager.with_expiry_margin(Duration::seconds(10));

	manager.get_valid_token().await.expect("Acquisition should succeed.");
	clock.advance(Duration::seconds(49));

	assert!(manager.has_valid_token().await.expect("Cache lookup should succeed."));

	clock.advance(Duration::seconds(2));

	assert!(!manager.has_valid_token().await.expect("Cache lookup should succeed."));
}

#[tokio::test]
async fn invalidate_forces_fresh_acquisition() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access_token\":\"T1\",\"expires_in\":3600}");
		})
		.await;
	let (manager, _clock) = manager_for(&server, CLIENT_ID, Arc::new(MemoryCache::default()));

	manager.get_valid_token().await.expect("Acquisition should succeed.");
	manager.invalidate().await.expect("Invalidation should succeed.");

	assert!(!manager.has_valid_token().await.expect("Cache lookup should succeed."));

	manager.get_valid_token().await.expect("Re-acquisition should succeed.");

	mock.assert_calls_async(2).await;

	// Invalidating an empty cache is not an error.
	manager.invalidate().await.expect("Invalidation should succeed.");
	manager.invalidate().await.expect("Repeated invalidation should succeed.");
}

#[tokio::test]
async fn configured_scope_is_sent_space_joined() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/token").body_includes("scope=productinformation+ordering");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access_token\":\"scoped\",\"expires_in\":60}");
		})
		.await;
	let (manager, _clock) = manager_for(&server, CLIENT_ID, Arc::new(MemoryCache::default()));
	let manager = manager.with_scope(ScopeSet::new([" productinformation", "", "ordering "]));
	let token = manager.get_valid_token().await.expect("Scoped acquisition should succeed.");

	assert_eq!(token.expose(), "scoped");

	mock.assert_async().await;
}

#[tokio::test]
async fn managers_share_tokens_per_client_id_only() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access_token\":\"shared\",\"expires_in\":600}");
		})
		.await;
	let cache: Arc<dyn TokenCache> = Arc::new(MemoryCache::default());
	let (first, _) = manager_for(&server, CLIENT_ID, cache.clone());
	let (second, _) = manager_for(&server, CLIENT_ID, cache.clone());
	let (other_tenant, _) = manager_for(&server, "tenant-b", cache.clone());

	assert_eq!(first.cache_key(), second.cache_key());
	assert_ne!(first.cache_key(), other_tenant.cache_key());

	first.get_valid_token().await.expect("First manager should acquire.");
	second.get_valid_token().await.expect("Second manager should reuse the shared token.");

	mock.assert_calls_async(1).await;

	assert!(!other_tenant.has_valid_token().await.expect("Cache lookup should succeed."));

	other_tenant.get_valid_token().await.expect("Other tenant should acquire its own token.");

	mock.assert_calls_async(2).await;
}

#[tokio::test]
async fn single_flight_acquires_once() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(200)
				.header("content-type", "application/json")
				.delay(std::time::Duration::from_millis(100))
				.body("{\"access_token\":\"guarded\",\"expires_in\":600}");
		})
		.await;
	let (manager, _clock) = manager_for(&server, CLIENT_ID, Arc::new(MemoryCache::default()));
	let manager = manager.with_single_flight(true);
	let (first, second) = tokio::join!(manager.get_valid_token(), manager.get_valid_token());

	assert_eq!(first.expect("First caller should succeed.").expose(), "guarded");
	assert_eq!(second.expect("Second caller should succeed.").expose(), "guarded");

	mock.assert_calls_async(1).await;
}

#[tokio::test]
async fn token_endpoint_errors_leave_cache_empty() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(401).header("content-type", "application/json").body(
				"{\"error\":\"invalid_client\",\"error_description\":\"The client is unknown\"}",
			);
		})
		.await;
	let cache = Arc::new(MemoryCache::default());
	let (manager, _clock) = manager_for(&server, CLIENT_ID, cache.clone());
	let err = manager.get_valid_token().await.expect_err("Rejected credentials must fail.");

	match &err {
		Error::Authentication(AuthenticationError::TokenEndpoint { message, status, .. }) => {
			assert_eq!(message, "The client is unknown");
			assert_eq!(*status, 401);
		},
		other => panic!("Unexpected error: {other:?}"),
	}

	assert!(err.is_authentication());
	assert!(cache.is_empty());

	mock.assert_async().await;
}

#[tokio::test]
async fn malformed_token_responses_are_authentication_errors() {
	let server = MockServer::start_async().await;
	let _missing = server
		.mock_async(|when, then| {
			when.method(POST).path("/token").body_includes("client_id=no-token");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"token_type\":\"Bearer\",\"expires_in\":60}");
		})
		.await;
	let _garbled = server
		.mock_async(|when, then| {
			when.method(POST).path("/token").body_includes("client_id=garbled");
			then.status(200).header("content-type", "application/json").body("<html>oops</html>");
		})
		.await;
	let (no_token, _) = manager_for(&server, "no-token", Arc::new(MemoryCache::default()));
	let (garbled, _) = manager_for(&server, "garbled", Arc::new(MemoryCache::default()));
	let missing_err = no_token.get_valid_token().await.expect_err("Missing token must fail.");
	let garbled_err = garbled.get_valid_token().await.expect_err("Non-JSON bodies must fail.");

	assert!(matches!(
		missing_err,
		Error::Authentication(AuthenticationError::MissingAccessToken)
	));
	assert!(matches!(
		garbled_err,
		Error::Authentication(AuthenticationError::TokenResponseParse { status: 200, .. })
	));
	assert!(!no_token.has_valid_token().await.expect("Cache lookup should succeed."));
}

#[tokio::test]
async fn unreachable_token_endpoint_is_a_transport_failure() {
	let clock = Arc::new(ManualClock::default());
	let manager = build_test_manager(
		"http://127.0.0.1:9/token",
		CLIENT_ID,
		CLIENT_SECRET,
		Arc::new(MemoryCache::default()),
		clock,
	);
	let err = manager.get_valid_token().await.expect_err("Closed ports must fail.");

	assert!(matches!(err, Error::Authentication(AuthenticationError::TokenTransport { .. })));
	assert_eq!(err.status_code(), None);
}

#[tokio::test]
async fn file_cache_shares_tokens_across_instances() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access_token\":\"persisted\",\"expires_in\":600}");
		})
		.await;
	let path = env::temp_dir().join(format!(
		"digikey_client_token_manager_it_{}_{}.json",
		process::id(),
		OffsetDateTime::now_utc().unix_timestamp_nanos(),
	));
	let writer = FileCache::open(&path).expect("File cache should open.");
	let (first, _) = manager_for(&server, CLIENT_ID, Arc::new(writer));

	first.get_valid_token().await.expect("First process should acquire.");

	let reader = FileCache::open(&path).expect("File cache should reopen.");
	let key = CacheKey::for_client(
		CacheKey::DEFAULT_PREFIX,
		&first.credentials().client_id,
	);

	assert!(reader.get(&key).await.expect("File cache read should succeed.").is_some());

	let (second, _) = manager_for(&server, CLIENT_ID, Arc::new(reader));
	let token = second.get_valid_token().await.expect("Second process should reuse the token.");

	assert_eq!(token.expose(), "persisted");

	mock.assert_calls_async(1).await;

	fs::remove_file(&path).unwrap_or_else(|e| {
		panic!("Failed to remove temporary file cache snapshot {}: {e}", path.display())
	});
}

#[tokio::test]
async fn oversized_expires_in_is_capped() {
	let server = MockServer::start_async().await;
	let _mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access_token\":\"T1\",\"expires_in\":99999999999999}");
		})
		.await;
	let (manager, clock) = manager_for(&server, CLIENT_ID, Arc::new(MemoryCache::default()));
	let token = manager.acquire_token().await.expect("Huge lifetimes should be capped, not fail.");

	assert_eq!(token.expose(), "T1");

	clock.advance(MAX_TOKEN_TTL - Duration::seconds(1));

	assert!(manager.has_valid_token().await.expect("Cache lookup should succeed."));

	clock.advance(Duration::seconds(1));

	assert!(!manager.has_valid_token().await.expect("Cache lookup should succeed."));
}

#[tokio::test]
async fn oversized_default_ttl_is_capped() {
	let server = MockServer::start_async().await;
	let _mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(200).header("content-type", "application/json").body("{\"access_token\":\"T1\"}");
		})
		.await;
	let clock = Arc::new(ManualClock::default());
	let manager = build_test_manager(
		&server.url("/token"),
		CLIENT_ID,
		CLIENT_SECRET,
		Arc::new(MemoryCache::default()),
		clock.clone(),
	)
	.with_default_ttl(Duration::seconds(i64::MAX));

	manager.get_valid_token().await.expect("Huge default lifetimes should be capped, not fail.");
	clock.advance(MAX_TOKEN_TTL);

	assert!(!manager.has_valid_token().await.expect("Cache lookup should succeed."));
}
