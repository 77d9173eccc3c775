//! Thin pass-through bindings for the product-information endpoints.
//!
//! Every method builds a [`RequestContext`] and hands it to the shared [`RequestMediator`];
//! bodies come back as JSON inside [`DecodedResponse`]. Product numbers are encoded as single
//! path segments, so numbers containing `/` or spaces are safe to pass verbatim.

// self
use crate::{
	_prelude::*,
	http::HttpTransport,
	mediator::{DecodedResponse, RequestContext, RequestMethod, RequestMediator},
	oauth::TransportErrorMapper,
};

const SEARCH: &str = "search";
const REQUESTED_QUANTITY: &str = "requestedquantity";

/// Product-information API surface.
pub struct ProductClient<C, M>
where
	C: HttpTransport,
	M: TransportErrorMapper<C::TransportError>,
{
	mediator: Arc<RequestMediator<C, M>>,
}
impl<C, M> ProductClient<C, M>
where
	C: HttpTransport,
	M: TransportErrorMapper<C::TransportError>,
{
	/// Wraps a shared mediator.
	pub fn new(mediator: Arc<RequestMediator<C, M>>) -> Self {
		Self { mediator }
	}

	/// Mediator backing this client.
	pub fn mediator(&self) -> &Arc<RequestMediator<C, M>> {
		&self.mediator
	}

	/// `POST /search/keyword`.
	pub async fn search_keyword<B>(&self, body: &B) -> Result<DecodedResponse>
	where
		B: ?Sized + Serialize,
	{
		let request = RequestContext::from_segments(RequestMethod::Post, [SEARCH, "keyword"])
			.with_json(body)?;

		self.mediator.execute(request).await
	}

	/// `GET /search/{productNumber}/productdetails`; `includes`/`excludes` are comma-joined.
	pub async fn product_details(
		&self,
		product_number: &str,
		includes: &[&str],
		excludes: &[&str],
	) -> Result<DecodedResponse> {
		let mut request = product_request(product_number, "productdetails");

		if !includes.is_empty() {
			request = request.with_query("includes", includes.join(","));
		}
		if !excludes.is_empty() {
			request = request.with_query("excludes", excludes.join(","));
		}

		self.mediator.execute(request).await
	}

	/// `GET /search/manufacturers`.
	pub async fn manufacturers(&self) -> Result<DecodedResponse> {
		self.get([SEARCH, "manufacturers"]).await
	}

	/// `GET /search/categories`.
	pub async fn categories(&self) -> Result<DecodedResponse> {
		self.get([SEARCH, "categories"]).await
	}

	/// `GET /search/categories/{categoryId}`.
	pub async fn category(&self, category_id: u64) -> Result<DecodedResponse> {
		self.get([SEARCH.to_owned(), "categories".into(), category_id.to_string()]).await
	}

	/// `GET /search/{productNumber}/digireelpricing?requestedquantity=…`.
	pub async fn digireel_pricing(
		&self,
		product_number: &str,
		requested_quantity: u64,
	) -> Result<DecodedResponse> {
		let request = product_request(product_number, "digireelpricing")
			.with_query(REQUESTED_QUANTITY, requested_quantity);

		self.mediator.execute(request).await
	}

	/// `GET /search/{productNumber}/recommendedproducts`.
	pub async fn recommended_products(&self, product_number: &str) -> Result<DecodedResponse> {
		self.mediator.execute(product_request(product_number, "recommendedproducts")).await
	}

	/// `GET /search/{productNumber}/substitutions`.
	pub async fn substitutions(&self, product_number: &str) -> Result<DecodedResponse> {
		self.mediator.execute(product_request(product_number, "substitutions")).await
	}

	/// `GET /search/{productNumber}/associations`.
	pub async fn associations(&self, product_number: &str) -> Result<DecodedResponse> {
		self.mediator.execute(product_request(product_number, "associations")).await
	}

	/// `GET /search/packagetypebyquantity/{productNumber}?requestedquantity=…`.
	///
	/// DigiKey marks this endpoint deprecated.
	pub async fn package_type_by_quantity(
		&self,
		product_number: &str,
		requested_quantity: u64,
	) -> Result<DecodedResponse> {
		let request = RequestContext::from_segments(
			RequestMethod::Get,
			[SEARCH, "packagetypebyquantity", product_number],
		)
		.with_query(REQUESTED_QUANTITY, requested_quantity);

		self.mediator.execute(request).await
	}

	/// `GET /search/{productNumber}/media`.
	pub async fn media(&self, product_number: &str) -> Result<DecodedResponse> {
		self.mediator.execute(product_request(product_number, "media")).await
	}

	/// `GET /search/{productNumber}/pricing?requestedquantity=…`.
	pub async fn pricing(
		&self,
		product_number: &str,
		requested_quantity: u64,
	) -> Result<DecodedResponse> {
		let request = product_request(product_number, "pricing")
			.with_query(REQUESTED_QUANTITY, requested_quantity);

		self.mediator.execute(request).await
	}

	async fn get<I, S>(&self, segments: I) -> Result<DecodedResponse>
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.mediator.execute(RequestContext::from_segments(RequestMethod::Get, segments)).await
	}
}
impl<C, M> Clone for ProductClient<C, M>
where
	C: HttpTransport,
	M: TransportErrorMapper<C::TransportError>,
{
	fn clone(&self) -> Self {
		Self { mediator: self.mediator.clone() }
	}
}
impl<C, M> Debug for ProductClient<C, M>
where
	C: HttpTransport,
	M: TransportErrorMapper<C::TransportError>,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ProductClient").field("mediator", &self.mediator).finish()
	}
}

fn product_request(product_number: &str, resource: &str) -> RequestContext {
	RequestContext::from_segments(RequestMethod::Get, [SEARCH, product_number, resource])
}
