//! Request mediation: auth + locale headers in, typed errors out.
//!
//! [`RequestMediator::execute`] is the single path every API call takes:
//!
//! 1. Obtain a valid token from the [`TokenManager`]; failure surfaces as an authentication error
//!    and the API is never contacted.
//! 2. Send the request with `Accept`/`Content-Type: application/json`, the client id, locale,
//!    customer, and bearer headers.
//! 3. Decode 2xx bodies as JSON with rate-limit metadata alongside. Classify everything else:
//!    401 invalidates the cached token before propagating, 429 is reported as
//!    [`RateLimitedError`], and other statuses become [`ApiError`].
//!
//! The mediator never retries; see [`crate::retry`] for a caller-side decorator.

pub mod request;
pub mod response;

pub use request::*;
pub use response::*;

// crates.io
use oauth2::{
	AsyncHttpClient, HttpRequest, HttpResponse,
	http::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue},
};
// self
use crate::{
	_prelude::*,
	auth::{AccessToken, CustomerId},
	cache::CacheError,
	config::LocaleConfig,
	error::{ApiError, AuthenticationError, ConfigError, RateLimitedError},
	http::{self, HttpTransport},
	manager::{self, TokenManager},
	oauth::{TransportErrorMapper, TransportStage},
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	rate_limit::{self, RateLimit},
};
#[cfg(feature = "reqwest")]
use crate::{http::ReqwestHttpClient, oauth::ReqwestTransportErrorMapper};

const JSON: &str = "application/json";
const CLIENT_ID_HEADER: &str = "x-digikey-client-id";
const CUSTOMER_ID_HEADER: &str = "x-digikey-customer-id";
const LOCALE_SITE_HEADER: &str = "x-digikey-locale-site";
const LOCALE_LANGUAGE_HEADER: &str = "x-digikey-locale-language";
const LOCALE_CURRENCY_HEADER: &str = "x-digikey-locale-currency";

/// Wraps API calls with authentication and error translation.
pub struct RequestMediator<C, M>
where
	C: HttpTransport,
	M: TransportErrorMapper<C::TransportError>,
{
	manager: Arc<TokenManager<C, M>>,
	base_url: Url,
	http_client: Arc<C>,
	error_mapper: Arc<M>,
	locale: LocaleConfig,
	customer_id: Option<CustomerId>,
}
impl<C, M> RequestMediator<C, M>
where
	C: HttpTransport,
	M: TransportErrorMapper<C::TransportError>,
{
	/// Creates a mediator that sends requests below `base_url` over `http_client`.
	///
	/// The customer number defaults to the one bound to the manager's credentials.
	pub fn with_http_client(
		manager: Arc<TokenManager<C, M>>,
		base_url: Url,
		http_client: impl Into<Arc<C>>,
		error_mapper: impl Into<Arc<M>>,
	) -> Self {
		let customer_id = manager.credentials().customer_id.clone();

		Self {
			manager,
			base_url,
			http_client: http_client.into(),
			error_mapper: error_mapper.into(),
			locale: LocaleConfig::default(),
			customer_id,
		}
	}

	/// Locale sent with every call unless a request overrides it.
	pub fn with_locale(mut self, locale: LocaleConfig) -> Self {
		self.locale = locale;

		self
	}

	/// Customer number sent with every call unless a request overrides it.
	pub fn with_customer_id(mut self, customer_id: Option<CustomerId>) -> Self {
		self.customer_id = customer_id;

		self
	}

	/// Token manager backing this mediator.
	pub fn manager(&self) -> &Arc<TokenManager<C, M>> {
		&self.manager
	}

	/// API base URL.
	pub fn base_url(&self) -> &Url {
		&self.base_url
	}

	/// Issues `request` and returns the decoded response or a classified error.
	pub async fn execute(&self, request: RequestContext) -> Result<DecodedResponse> {
		const KIND: FlowKind = FlowKind::ApiRequest;

		let span = FlowSpan::new(KIND, "execute");
		let status_span = span.clone();

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				let url = self.request_url(&request)?;
				let token = self
					.manager
					.get_valid_token()
					.await
					.map_err(manager::into_authentication_error)?;
				let http_request = self.build_request(&request, url, &token)?;
				let handle = self.http_client.handle();
				let response = handle.call(http_request).await.map_err(|e| {
					status_span.record_status(0);
					obs::record_http_status(KIND, 0);

					self.error_mapper.map_transport_error(TransportStage::Api, e)
				})?;

				status_span.record_status(response.status().as_u16());
				obs::record_http_status(KIND, response.status().as_u16());

				self.classify(response).await
			})
			.await;

		match &result {
			Ok(_) => obs::record_flow_outcome(KIND, FlowOutcome::Success),
			Err(_) => obs::record_flow_outcome(KIND, FlowOutcome::Failure),
		}

		result
	}

	/// `GET path?query`.
	pub async fn get(&self, path: &str, query: &[(&str, &str)]) -> Result<DecodedResponse> {
		let request = query
			.iter()
			.fold(RequestContext::get(path), |request, (key, value)| request.with_query(*key, value));

		self.execute(request).await
	}

	/// `POST path` with a JSON body.
	pub async fn post<B>(&self, path: &str, body: &B) -> Result<DecodedResponse>
	where
		B: ?Sized + Serialize,
	{
		self.execute(RequestContext::post(path).with_json(body)?).await
	}

	/// `PUT path` with a JSON body.
	pub async fn put<B>(&self, path: &str, body: &B) -> Result<DecodedResponse>
	where
		B: ?Sized + Serialize,
	{
		self.execute(RequestContext::put(path).with_json(body)?).await
	}

	/// `DELETE path`.
	pub async fn delete(&self, path: &str) -> Result<DecodedResponse> {
		self.execute(RequestContext::delete(path)).await
	}

	fn request_url(&self, request: &RequestContext) -> Result<Url> {
		let mut url = self.base_url.clone();

		url.path_segments_mut()
			.map_err(|_| ConfigError::CannotBeBase { url: self.base_url.to_string() })?
			.pop_if_empty()
			.extend(&request.segments);

		if !request.query.is_empty() {
			let mut pairs = url.query_pairs_mut();

			for (key, value) in &request.query {
				pairs.append_pair(key, value);
			}
		}

		Ok(url)
	}

	fn build_request(
		&self,
		request: &RequestContext,
		url: Url,
		token: &AccessToken,
	) -> Result<HttpRequest> {
		let body = match &request.body {
			Some(body) => serde_json::to_vec(body)
				.map_err(|source| ConfigError::BodySerialize { source })?,
			None => Vec::new(),
		};
		let mut http_request = oauth2::http::Request::builder()
			.method(request.method.to_http())
			.uri(url.as_str())
			.body(body)
			.map_err(ConfigError::from)?;
		let locale = request.locale.as_ref().unwrap_or(&self.locale);
		let customer_id = request.customer_id.as_ref().or(self.customer_id.as_ref());
		let headers = http_request.headers_mut();

		headers.insert(ACCEPT, HeaderValue::from_static(JSON));
		headers.insert(CONTENT_TYPE, HeaderValue::from_static(JSON));
		insert_header(headers, CLIENT_ID_HEADER, &self.manager.credentials().client_id)?;
		insert_header(headers, LOCALE_SITE_HEADER, &locale.site)?;
		insert_header(headers, LOCALE_LANGUAGE_HEADER, &locale.language)?;
		insert_header(headers, LOCALE_CURRENCY_HEADER, &locale.currency)?;

		if let Some(customer_id) = customer_id {
			insert_header(headers, CUSTOMER_ID_HEADER, customer_id)?;
		}
		for (name, value) in &request.headers {
			insert_header(headers, name, value)?;
		}

		let mut bearer = HeaderValue::from_str(&token.bearer())
			.map_err(|_| ConfigError::InvalidHeader { name: AUTHORIZATION.to_string() })?;

		bearer.set_sensitive(true);
		headers.insert(AUTHORIZATION, bearer);

		Ok(http_request)
	}

	async fn classify(&self, raw: HttpResponse) -> Result<DecodedResponse> {
		let status = raw.status().as_u16();

		if raw.status().is_success() {
			return Ok(response::decode_success(&raw)?);
		}

		let details = http::error_details(raw.body());
		let message = response::failure_message(status, &details);

		match status {
			401 => {
				let invalidation_error = match self.manager.invalidate().await {
					Ok(()) => None,
					Err(Error::Cache(e)) => Some(e),
					Err(e) => Some(CacheError::Backend { message: e.to_string() }),
				};

				Err(AuthenticationError::Rejected { message, status, details, invalidation_error }
					.into())
			},
			429 => Err(RateLimitedError {
				message,
				retry_after: rate_limit::parse_retry_after(raw.headers()),
				rate_limit: RateLimit::from_headers(raw.headers()),
				details,
			}
			.into()),
			_ => Err(ApiError::Status { message, status, details }.into()),
		}
	}
}
#[cfg(feature = "reqwest")]
impl RequestMediator<ReqwestHttpClient, ReqwestTransportErrorMapper> {
	/// Creates a mediator sharing the default reqwest client with `manager`.
	pub fn new(
		manager: Arc<TokenManager<ReqwestHttpClient, ReqwestTransportErrorMapper>>,
		base_url: Url,
	) -> Self {
		Self::with_http_client(manager, base_url, ReqwestHttpClient::default(), ReqwestTransportErrorMapper)
	}
}
impl<C, M> Debug for RequestMediator<C, M>
where
	C: HttpTransport,
	M: TransportErrorMapper<C::TransportError>,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("RequestMediator")
			.field("manager", &self.manager)
			.field("base_url", &self.base_url.as_str())
			.field("locale", &self.locale)
			.field("customer_id", &self.customer_id)
			.finish()
	}
}

fn insert_header(headers: &mut HeaderMap, name: &str, value: &str) -> Result<(), ConfigError> {
	let invalid = || ConfigError::InvalidHeader { name: name.to_owned() };
	let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|_| invalid())?;
	let header_value = HeaderValue::from_str(value).map_err(|_| invalid())?;

	headers.insert(header_name, header_value);

	Ok(())
}
