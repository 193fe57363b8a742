//! Client for the spreadsheet web app that holds the orders.
//!
//! Reads are `GET <url>?action=list&sheet=..&limit=..`; writes are `POST`s whose body is JSON sent as `text/plain`,
//! which is what the web app expects. Every request carries the shared secret when one is configured. Whatever the
//! HTTP status, the app may answer `{"ok": false, "error": ...}`, which is treated as a failure.

use axum::async_trait;
use serde::Serialize;
use serde_json::Value;

use crate::config::StoreConfig;
use crate::error::MissingConfig;
use crate::order::{row, NewOrder, Order, OrderStatus};

pub const DEFAULT_LIST_LIMIT: u32 = 300;
pub const MAX_LIST_LIMIT: u32 = 500;

/// Clamps a `limit` query parameter to `1..=500`. Anything that is not a number gets the default.
pub fn clamp_limit(raw: Option<&str>) -> u32 {
	match raw.map(str::trim).filter(|raw| !raw.is_empty()) {
		None => DEFAULT_LIST_LIMIT,
		Some(raw) => match raw.parse::<f64>() {
			Ok(limit) if limit.is_finite() => limit.clamp(1.0, f64::from(MAX_LIST_LIMIT)) as u32,
			_ => DEFAULT_LIST_LIMIT,
		},
	}
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error(transparent)]
	Config(#[from] MissingConfig),
	#[error("encoding request: {0}")]
	Encode(#[from] serde_json::Error),
	#[error("request failed: {0}")]
	Transport(#[from] reqwest::Error),
	#[error("store answered {status}")]
	Status {
		status: http::StatusCode,
		details: Value,
	},
	#[error("store answered with something that is not JSON")]
	NotJson { body: String },
	#[error("{message}")]
	Rejected { message: String, response: Value },
}

impl Error {
	/// What the store said, for callers that pass it on.
	pub fn details(&self) -> Option<Value> {
		match self {
			Self::Status { details, .. } => Some(details.clone()),
			Self::NotJson { body } => Some(Value::String(body.clone())),
			Self::Rejected { response, .. } => Some(response.clone()),
			Self::Config(_) | Self::Encode(_) | Self::Transport(_) => None,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Listing {
	pub orders: Vec<Order>,
	/// As reported by the store, which may count more rows than it returned.
	pub count: u64,
}

#[async_trait]
pub trait OrderStore: Send + Sync {
	async fn list(&self, limit: u32) -> Result<Listing, Error>;

	async fn update_status(&self, id: &str, status: OrderStatus) -> Result<Value, Error>;

	async fn append(&self, order: &NewOrder) -> Result<Value, Error>;
}

pub struct SheetClient {
	http: reqwest::Client,
	config: StoreConfig,
}

#[derive(Serialize)]
struct AppendOrder<'a> {
	#[serde(skip_serializing_if = "Option::is_none")]
	secret: Option<&'a str>,
	#[serde(flatten)]
	order: &'a NewOrder,
	stato: OrderStatus,
}

#[derive(Serialize)]
struct UpdateStatus<'a> {
	action: &'static str,
	id: &'a str,
	stato: OrderStatus,
	#[serde(skip_serializing_if = "Option::is_none")]
	secret: Option<&'a str>,
}

impl SheetClient {
	pub fn new(http: reqwest::Client, config: StoreConfig) -> Self {
		Self { http, config }
	}

	async fn post(&self, url: &str, body: &impl Serialize) -> Result<Value, Error> {
		let body = serde_json::to_string(body)?;
		let response = self
			.http
			.post(url)
			.header(http::header::CONTENT_TYPE, mime::TEXT_PLAIN_UTF_8.as_ref())
			.timeout(self.config.timeout())
			.body(body)
			.send()
			.await?;
		let status = response.status();
		let text = response.text().await?;
		interpret(status, text, false)
	}
}

fn interpret(status: http::StatusCode, text: String, require_json: bool) -> Result<Value, Error> {
	let parsed: Option<Value> = serde_json::from_str(&text).ok();

	if !status.is_success() {
		return Err(Error::Status {
			status,
			details: parsed.unwrap_or(Value::String(text)),
		});
	}

	match parsed {
		Some(value) if value.get("ok") == Some(&Value::Bool(false)) => Err(Error::Rejected {
			message: value
				.get("error")
				.and_then(Value::as_str)
				.unwrap_or("the store refused the request")
				.to_owned(),
			response: value,
		}),
		Some(value) => Ok(value),
		None if require_json => Err(Error::NotJson { body: text }),
		None => Ok(Value::String(text)),
	}
}

#[async_trait]
impl OrderStore for SheetClient {
	async fn list(&self, limit: u32) -> Result<Listing, Error> {
		let url = self.config.url()?;

		let mut query = vec![
			("action", "list".to_owned()),
			("sheet", self.config.sheet.clone()),
			("limit", limit.to_string()),
		];
		if let Some(secret) = self.config.secret() {
			query.push(("secret", secret.to_owned()));
		}

		let response = self
			.http
			.get(url)
			.query(&query)
			.timeout(self.config.timeout())
			.send()
			.await?;
		let status = response.status();
		let value = interpret(status, response.text().await?, true)?;

		let rows = value
			.get("rows")
			.and_then(Value::as_array)
			.map(Vec::as_slice)
			.unwrap_or_default();
		let orders = row::decode_all(rows, self.config.utc_offset());
		let count = value
			.get("count")
			.and_then(Value::as_u64)
			.unwrap_or(rows.len() as u64);
		tracing::debug!(returned = orders.len(), count, "listed orders");

		Ok(Listing { orders, count })
	}

	async fn update_status(&self, id: &str, status: OrderStatus) -> Result<Value, Error> {
		let url = self.config.url()?;
		let result = self
			.post(
				url,
				&UpdateStatus {
					action: "updateStatus",
					id,
					stato: status,
					secret: self.config.secret(),
				},
			)
			.await?;
		tracing::info!(%id, %status, "order status updated");
		Ok(result)
	}

	async fn append(&self, order: &NewOrder) -> Result<Value, Error> {
		let url = self.config.orders_url()?;
		let result = self
			.post(
				url,
				&AppendOrder {
					secret: self.config.secret(),
					order,
					stato: OrderStatus::New,
				},
			)
			.await?;
		tracing::info!(kind = %order.kind, channel = %order.channel, "order appended");
		Ok(result)
	}
}

#[cfg(test)]
mod test {
	use serde_json::json;
	use time::macros::{date, time};
	use wiremock::matchers::{method, path, query_param};
	use wiremock::{Mock, MockServer, ResponseTemplate};

	use super::*;
	use crate::order::OrderKind;

	fn client(server: &MockServer, secret: Option<&str>) -> SheetClient {
		SheetClient::new(
			reqwest::Client::new(),
			StoreConfig {
				url: Some(format!("{}/exec", server.uri())),
				secret: secret.map(str::to_owned),
				utc_offset_minutes: 0,
				..StoreConfig::default()
			},
		)
	}

	async fn posted_json(server: &MockServer) -> Value {
		let requests = server.received_requests().await.unwrap();
		assert_eq!(requests.len(), 1);
		serde_json::from_slice(&requests[0].body).unwrap()
	}

	fn order() -> NewOrder {
		NewOrder {
			name: "Giulia".to_owned(),
			phone: "3271234567".to_owned(),
			kind: OrderKind::Delivery,
			date: date!(2024 - 05 - 01),
			time: time!(19:30),
			allergens: String::new(),
			order: "2 margherite".to_owned(),
			address: "Via Roma 1".to_owned(),
			channel: "APP".to_owned(),
			notes: String::new(),
		}
	}

	#[test]
	fn limits() {
		assert_eq!(clamp_limit(None), 300);
		assert_eq!(clamp_limit(Some("")), 300);
		assert_eq!(clamp_limit(Some("abc")), 300);
		assert_eq!(clamp_limit(Some("0")), 1);
		assert_eq!(clamp_limit(Some("-20")), 1);
		assert_eq!(clamp_limit(Some("42")), 42);
		assert_eq!(clamp_limit(Some("9000")), 500);
	}

	#[tokio::test]
	async fn list_decodes_rows() {
		let server = MockServer::start().await;
		Mock::given(method("GET"))
			.and(path("/exec"))
			.and(query_param("action", "list"))
			.and(query_param("sheet", "Ordini"))
			.and(query_param("limit", "50"))
			.and(query_param("secret", "shh"))
			.respond_with(ResponseTemplate::new(200).set_body_json(json!({
				"ok": true,
				"count": 7,
				"rows": [
					["t2", "Marco", "", "ASPORTO", "2024-05-02", "20:00"],
					{"Timestamp": "t1", "Nome": "Giulia", "Data": "2024-05-01", "Ora": "19:30", "ID": "x1"},
				],
			})))
			.expect(1)
			.mount(&server)
			.await;

		let listing = client(&server, Some("shh")).list(50).await.unwrap();
		assert_eq!(listing.count, 7);
		let names: Vec<_> = listing.orders.iter().map(|order| order.name.as_str()).collect();
		assert_eq!(names, ["Giulia", "Marco"]);
		assert_eq!(listing.orders[0].id, "x1");
	}

	#[tokio::test]
	async fn list_without_count_counts_rows() {
		let server = MockServer::start().await;
		Mock::given(method("GET"))
			.respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true, "rows": [["t"]]})))
			.mount(&server)
			.await;

		let listing = client(&server, None).list(10).await.unwrap();
		assert_eq!(listing.count, 1);
	}

	#[tokio::test]
	async fn list_failures() {
		let server = MockServer::start().await;
		Mock::given(method("GET"))
			.and(query_param("limit", "1"))
			.respond_with(ResponseTemplate::new(200).set_body_string("<html>login</html>"))
			.mount(&server)
			.await;
		Mock::given(method("GET"))
			.and(query_param("limit", "2"))
			.respond_with(
				ResponseTemplate::new(200).set_body_json(json!({"ok": false, "error": "bad secret"})),
			)
			.mount(&server)
			.await;
		Mock::given(method("GET"))
			.and(query_param("limit", "3"))
			.respond_with(ResponseTemplate::new(500).set_body_string("boom"))
			.mount(&server)
			.await;

		let client = client(&server, None);
		assert!(matches!(client.list(1).await, Err(Error::NotJson { .. })));
		match client.list(2).await {
			Err(Error::Rejected { message, .. }) => assert_eq!(message, "bad secret"),
			other => panic!("unexpected {other:?}"),
		}
		match client.list(3).await {
			Err(error @ Error::Status { .. }) => {
				assert_eq!(error.details(), Some(Value::String("boom".to_owned())))
			}
			other => panic!("unexpected {other:?}"),
		}
	}

	#[tokio::test]
	async fn update_status_posts_action() {
		let server = MockServer::start().await;
		Mock::given(method("POST"))
			.and(path("/exec"))
			.respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true, "row": 4})))
			.mount(&server)
			.await;

		let result = client(&server, Some("shh"))
			.update_status("x1", OrderStatus::Confirmed)
			.await
			.unwrap();
		assert_eq!(result, json!({"ok": true, "row": 4}));
		assert_eq!(
			posted_json(&server).await,
			json!({"action": "updateStatus", "id": "x1", "stato": "CONFERMATO", "secret": "shh"})
		);
	}

	#[tokio::test]
	async fn update_status_rejected() {
		let server = MockServer::start().await;
		Mock::given(method("POST"))
			.respond_with(
				ResponseTemplate::new(200).set_body_json(json!({"ok": false, "error": "id not found"})),
			)
			.mount(&server)
			.await;

		let error = client(&server, None)
			.update_status("nope", OrderStatus::Cancelled)
			.await
			.unwrap_err();
		assert_eq!(error.to_string(), "id not found");
		assert_eq!(error.details(), Some(json!({"ok": false, "error": "id not found"})));
	}

	#[tokio::test]
	async fn append_sends_new_order() {
		let server = MockServer::start().await;
		Mock::given(method("POST"))
			.and(path("/exec"))
			.respond_with(ResponseTemplate::new(200).set_body_string("OK"))
			.mount(&server)
			.await;

		let result = client(&server, Some("shh")).append(&order()).await.unwrap();
		assert_eq!(result, Value::String("OK".to_owned()));
		assert_eq!(
			posted_json(&server).await,
			json!({
				"secret": "shh",
				"nome": "Giulia",
				"telefono": "3271234567",
				"tipo": "CONSEGNA",
				"data": "2024-05-01",
				"ora": "19:30",
				"allergeni": "",
				"ordine": "2 margherite",
				"indirizzo": "Via Roma 1",
				"canale": "APP",
				"note": "",
				"stato": "NUOVO",
			})
		);
	}

	#[tokio::test]
	async fn append_goes_to_orders_url() {
		let server = MockServer::start().await;
		Mock::given(method("POST"))
			.and(path("/orders"))
			.respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
			.expect(1)
			.mount(&server)
			.await;

		let client = SheetClient::new(
			reqwest::Client::new(),
			StoreConfig {
				url: Some(format!("{}/exec", server.uri())),
				orders_url: Some(format!("{}/orders", server.uri())),
				..StoreConfig::default()
			},
		);
		client.append(&order()).await.unwrap();
		assert!(posted_json(&server).await.get("secret").is_none());
	}

	#[tokio::test]
	async fn missing_url_is_a_configuration_error() {
		let client = SheetClient::new(reqwest::Client::new(), StoreConfig::default());
		assert!(matches!(client.list(10).await, Err(Error::Config(_))));
		assert!(matches!(
			client.update_status("x", OrderStatus::New).await,
			Err(Error::Config(_))
		));
		assert!(matches!(client.append(&order()).await, Err(Error::Config(_))));
	}
}
