//! Per-call request description handed to the mediator.

// crates.io
use oauth2::http::Method;
// self
use crate::{_prelude::*, auth::CustomerId, config::LocaleConfig, error::ConfigError};

/// HTTP methods the API surface uses.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RequestMethod {
	/// `GET`
	Get,
	/// `POST`
	Post,
	/// `PUT`
	Put,
	/// `DELETE`
	Delete,
}
impl RequestMethod {
	/// Returns the canonical method token.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Get => "GET",
			Self::Post => "POST",
			Self::Put => "PUT",
			Self::Delete => "DELETE",
		}
	}

	pub(crate) fn to_http(self) -> Method {
		match self {
			Self::Get => Method::GET,
			Self::Post => Method::POST,
			Self::Put => Method::PUT,
			Self::Delete => Method::DELETE,
		}
	}
}
impl Display for RequestMethod {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Everything the mediator needs to issue one API call; built fresh per call.
///
/// Paths are relative to the configured API base and stored as raw segments, which are
/// percent-encoded when the final URL is assembled. A product number containing `/` therefore
/// stays a single segment.
#[derive(Clone, Debug, PartialEq)]
pub struct RequestContext {
	/// HTTP method.
	pub method: RequestMethod,
	/// Raw (unencoded) path segments below the API base.
	pub segments: Vec<String>,
	/// Query pairs appended in order.
	pub query: Vec<(String, String)>,
	/// JSON request body.
	pub body: Option<JsonValue>,
	/// Extra headers; they replace defaults with the same name, except `Authorization`.
	pub headers: Vec<(String, String)>,
	/// Locale override for this call only.
	pub locale: Option<LocaleConfig>,
	/// Customer number override for this call only.
	pub customer_id: Option<CustomerId>,
}
impl RequestContext {
	/// Creates a request for `path`, split on `/` with empty segments dropped.
	pub fn new(method: RequestMethod, path: &str) -> Self {
		Self::from_segments(method, path.split('/').filter(|segment| !segment.is_empty()))
	}

	/// Creates a request from raw path segments; each is encoded as a single segment.
	pub fn from_segments<I, S>(method: RequestMethod, segments: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		Self {
			method,
			segments: segments.into_iter().map(Into::into).collect(),
			query: Vec::new(),
			body: None,
			headers: Vec::new(),
			locale: None,
			customer_id: None,
		}
	}

	/// Shorthand for a `GET` of `path`.
	pub fn get(path: &str) -> Self {
		Self::new(RequestMethod::Get, path)
	}

	/// Shorthand for a `POST` to `path`.
	pub fn post(path: &str) -> Self {
		Self::new(RequestMethod::Post, path)
	}

	/// Shorthand for a `PUT` to `path`.
	pub fn put(path: &str) -> Self {
		Self::new(RequestMethod::Put, path)
	}

	/// Shorthand for a `DELETE` of `path`.
	pub fn delete(path: &str) -> Self {
		Self::new(RequestMethod::Delete, path)
	}

	/// Appends a query pair.
	pub fn with_query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
		self.query.push((key.into(), value.to_string()));

		self
	}

	/// Sets a pre-built JSON body.
	pub fn with_body(mut self, body: JsonValue) -> Self {
		self.body = Some(body);

		self
	}

	/// Serializes `body` into the JSON request body.
	pub fn with_json<T>(self, body: &T) -> Result<Self, ConfigError>
	where
		T: ?Sized + Serialize,
	{
		let body =
			serde_json::to_value(body).map_err(|source| ConfigError::BodySerialize { source })?;

		Ok(self.with_body(body))
	}

	/// Adds an extra header.
	pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.headers.push((name.into(), value.into()));

		self
	}

	/// Overrides the locale headers for this call.
	pub fn with_locale(mut self, locale: LocaleConfig) -> Self {
		self.locale = Some(locale);

		self
	}

	/// Overrides the customer number for this call.
	pub fn with_customer_id(mut self, customer_id: CustomerId) -> Self {
		self.customer_id = Some(customer_id);

		self
	}

	/// Slash-joined path, for logs and diagnostics.
	pub fn path(&self) -> String {
		format!("/{}", self.segments.join("/"))
	}
}
