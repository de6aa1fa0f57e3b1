//! Demonstrates listing apps page by page against a local mock of the service.
//!
//! The client signs one credential, reuses it for every page, and follows `links.next` until the
//! collection is exhausted.

// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
use serde::Deserialize;
use serde_json::json;
// self
use asc_client::{
	auth::CredentialIdentity,
	config::ClientConfig,
	http::{ApiClient, ApiRequest},
	reqwest::Method,
	url::Url,
};

#[derive(Debug, Deserialize)]
struct Page {
	data: Vec<App>,
	links: Links,
}

#[derive(Debug, Deserialize)]
struct Links {
	next: Option<String>,
}

#[derive(Debug, Deserialize)]
struct App {
	id: String,
	attributes: AppAttributes,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AppAttributes {
	name: String,
	bundle_id: String,
}

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let second_page = server.url("/v1/apps?cursor=Mg");
	let first = server
		.mock_async(|when, then| {
			when.method(GET).path("/v1/apps").query_param("limit", "1");
			then.status(200).json_body(json!({
				"data": [{ "type": "apps", "id": "1", "attributes": { "name": "Notes", "bundleId": "com.example.notes" } }],
				"links": { "self": server.url("/v1/apps?limit=1"), "next": second_page }
			}));
		})
		.await;
	let second = server
		.mock_async(|when, then| {
			when.method(GET).path("/v1/apps").query_param("cursor", "Mg");
			then.status(200).json_body(json!({
				"data": [{ "type": "apps", "id": "2", "attributes": { "name": "Tasks", "bundleId": "com.example.tasks" } }],
				"links": { "self": server.url("/v1/apps?cursor=Mg") }
			}));
		})
		.await;
	let config = ClientConfig::builder().base_url(Url::parse(&server.url("/v1"))?).build()?;
	let identity = CredentialIdentity::parse("57246542-96fe-1a63-e053-0824d011072a", "2X9R4HXF34")?;
	let client =
		ApiClient::connect(config, identity, include_str!("../tests/fixtures/p256.pem"))?;
	let mut request = Some(ApiRequest::new(Method::GET, "/apps").with_query("limit", "1"));

	while let Some(current) = request.take() {
		let page = client.execute_json::<Page>(current).await?;

		for app in page.data {
			println!("{} {} ({})", app.id, app.attributes.name, app.attributes.bundle_id);
		}

		request = page.links.next.map(|next| ApiRequest::new(Method::GET, next));
	}

	first.assert_async().await;
	second.assert_async().await;

	println!("Credentials minted: {}", client.credentials().metrics().mints());

	Ok(())
}
