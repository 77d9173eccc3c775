//! Runs a keyword search against a local mock of the DigiKey API, showing that the second call
//! reuses the cached client-credentials token.

// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
use serde_json::json;
// self
use digikey_client::{
	client::DigiKeyClient, config::ClientConfig, http::ReqwestHttpClient, reqwest::Client,
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/v1/oauth2/token");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access_token\":\"demo-access\",\"token_type\":\"Bearer\",\"expires_in\":599}");
		})
		.await;
	let search_mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/products/v4/search/keyword")
				.header("authorization", "Bearer demo-access");
			then.status(200)
				.header("content-type", "application/json")
				.header("X-RateLimit-Limit", "1000")
				.header("X-RateLimit-Remaining", "998")
				.json_body(json!({
					"ProductsCount": 1,
					"Products": [{ "ManufacturerProductNumber": "LM358DR" }]
				}));
		})
		.await;
	let mut config = ClientConfig::new("demo-client", "demo-secret");

	config.base_url = server.url("/products/v4");
	config.oauth.token_url = server.url("/v1/oauth2/token");

	// httpmock serves HTTPS with a self-signed certificate.
	let http_client = ReqwestHttpClient::with_client(
		Client::builder()
			.danger_accept_invalid_certs(true)
			.danger_accept_invalid_hostnames(true)
			.build()?,
	);
	let client = DigiKeyClient::builder(config).with_http_client(http_client).build()?;
	let query = json!({ "Keywords": "LM358", "Limit": 10, "Offset": 0 });

	for _ in 0..2 {
		let response = client.products().search_keyword(&query).await?;

		println!("Products found: {}.", response.body["ProductsCount"]);

		if let Some(rate_limit) = response.rate_limit {
			println!("Requests remaining: {:?}.", rate_limit.remaining);
		}
	}

	token_mock.assert_calls_async(1).await;
	search_mock.assert_calls_async(2).await;

	Ok(())
}
