use std::sync::Arc;

use axum::response::{ErrorResponse, IntoResponse, Response};
use axum::{extract, Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::config::Config;
use crate::error::{self, MissingConfig};
use crate::helpers::auth::Staff;
use crate::order::{OrderRequest, OrderStatus, Submission, ValidationError};
use crate::store::{self, OrderStore};

#[derive(Debug)]
pub enum Submitted {
	/// Caught by the honeypot and dropped.
	Skipped,
	Stored(Value),
}

#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
	#[error(transparent)]
	Config(#[from] MissingConfig),
	#[error(transparent)]
	Invalid(#[from] ValidationError),
	#[error(transparent)]
	Store(#[from] store::Error),
}

impl IntoResponse for SubmitError {
	fn into_response(self) -> Response {
		match self {
			Self::Config(missing) => missing.into_response(),
			Self::Invalid(invalid) => error::BadRequest(invalid.to_string().into()).into_response(),
			Self::Store(store) => error::Store(store).into_response(),
		}
	}
}

/// Validates a customer's order and appends it to the sheet. Shared by the JSON endpoint and the form on the index.
///
/// A server with nowhere to append orders refuses every submission, valid or not.
pub async fn submit(
	config: &Config,
	store: &dyn OrderStore,
	request: OrderRequest,
) -> Result<Submitted, SubmitError> {
	config.store.orders_url()?;
	match request.validate()? {
		Submission::Spam => {
			tracing::info!("dropped an order that filled in the honeypot");
			Ok(Submitted::Skipped)
		}
		Submission::Order(order) => Ok(Submitted::Stored(store.append(&order).await?)),
	}
}

pub async fn post_handler(
	extract::Extension(config): extract::Extension<Arc<Config>>,
	extract::Extension(store): extract::Extension<Arc<dyn OrderStore>>,
	request: Option<Json<OrderRequest>>,
) -> Result<impl IntoResponse, ErrorResponse> {
	let Json(request) = request.ok_or(error::BadRequest("missing JSON body".into()))?;

	Ok(Json(match submit(&config, &*store, request).await? {
		Submitted::Skipped => json!({ "ok": true, "skipped": true }),
		Submitted::Stored(response) => json!({ "ok": true, "message": "Ricevuto ✅", "response": response }),
	}))
}

pub async fn get_handler() -> impl IntoResponse {
	Json(json!({ "ok": true }))
}

#[derive(Deserialize)]
pub struct StatusRequest {
	#[serde(default, deserialize_with = "crate::helpers::lenient::string")]
	id: Option<String>,
	#[serde(default, deserialize_with = "crate::helpers::lenient::string")]
	stato: Option<String>,
}

pub async fn status_handler(
	Staff(session): Staff,
	extract::Extension(store): extract::Extension<Arc<dyn OrderStore>>,
	request: Option<Json<StatusRequest>>,
) -> Result<impl IntoResponse, ErrorResponse> {
	let Json(StatusRequest { id, stato }) =
		request.ok_or(error::BadRequest("missing JSON body".into()))?;

	let id = id.as_deref().map(str::trim).unwrap_or_default();
	if id.is_empty() {
		return Err(error::BadRequest("missing id".into()).into());
	}
	let status: OrderStatus = stato
		.as_deref()
		.unwrap_or_default()
		.parse()
		.map_err(|_| error::BadRequest("invalid status".into()))?;

	let result = store
		.update_status(id, status)
		.await
		.map_err(error::Store)?;
	tracing::info!(id, status = status.as_str(), session = session.issued_at(), "order status changed");
	Ok(Json(json!({ "ok": true, "result": result })))
}

pub fn configure() -> Router {
	Router::new()
		.route("/", axum::routing::get(get_handler).post(post_handler))
		.route("/status", axum::routing::post(status_handler))
}

#[cfg(test)]
mod test {
	use http::StatusCode;
	use serde_json::json;

	use crate::order::OrderKind;
	use crate::testing::{self, Harness};

	fn order() -> serde_json::Value {
		json!({
			"nome": "Giulia",
			"telefono": 3271234567u64,
			"tipo": "consegna",
			"data": "2024-05-01",
			"ora": "19:30",
			"ordine": "2 margherite",
			"indirizzo": "Via Roma 1",
		})
	}

	#[tokio::test]
	async fn liveness() {
		let harness = Harness::new();
		let response = harness.get("/api/orders", None).await;
		assert_eq!(response.status, StatusCode::OK);
		assert_eq!(response.json(), json!({"ok": true}));
	}

	#[tokio::test]
	async fn order_is_appended() {
		let harness = Harness::new();
		let response = harness.post_json("/api/orders", order(), None).await;
		assert_eq!(response.status, StatusCode::OK);
		assert_eq!(
			response.json(),
			json!({"ok": true, "message": "Ricevuto ✅", "response": {"ok": true}})
		);

		let appended = harness.store.appended();
		assert_eq!(appended.len(), 1);
		assert_eq!(appended[0].kind, OrderKind::Delivery);
		assert_eq!(appended[0].phone, "3271234567");
		assert_eq!(appended[0].channel, "APP");
	}

	#[tokio::test]
	async fn honeypot_is_skipped() {
		let harness = Harness::new();
		let mut body = order();
		body["honeypot"] = json!("https://spam.example");
		let response = harness.post_json("/api/orders", body, None).await;
		assert_eq!(response.status, StatusCode::OK);
		assert_eq!(response.json(), json!({"ok": true, "skipped": true}));
		assert!(harness.store.appended().is_empty());
	}

	#[tokio::test]
	async fn invalid_orders_are_refused() {
		let harness = Harness::new();
		let mut body = order();
		body["indirizzo"] = json!("  ");
		let response = harness.post_json("/api/orders", body, None).await;
		assert_eq!(response.status, StatusCode::BAD_REQUEST);
		assert_eq!(response.json()["ok"], json!(false));

		let response = harness.post_raw("/api/orders", "not json", None).await;
		assert_eq!(response.status, StatusCode::BAD_REQUEST);
		assert!(harness.store.appended().is_empty());
	}

	#[tokio::test]
	async fn unconfigured_store_refuses_everything() {
		let mut config = testing::config();
		config.store.url = None;
		config.store.orders_url = None;
		let harness = Harness::with_config(config);

		let mut invalid = order();
		invalid["indirizzo"] = json!("");
		let mut spam = order();
		spam["honeypot"] = json!("https://spam.example");
		for body in [order(), invalid, spam] {
			let response = harness.post_json("/api/orders", body, None).await;
			assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
			assert_eq!(response.json()["ok"], json!(false));
		}
		assert!(harness.store.appended().is_empty());
	}

	#[tokio::test]
	async fn store_failure_is_a_bad_gateway() {
		let harness = Harness::new();
		harness.store.fail_with(|| crate::store::Error::Status {
			status: StatusCode::INTERNAL_SERVER_ERROR,
			details: json!("sheet is down"),
		});
		let response = harness.post_json("/api/orders", order(), None).await;
		assert_eq!(response.status, StatusCode::BAD_GATEWAY);
		assert_eq!(response.json()["details"], json!("sheet is down"));
	}

	#[tokio::test]
	async fn status_update_needs_staff() {
		let harness = Harness::new();
		let body = json!({"id": "x1", "stato": "confermata"});

		let response = harness.post_json("/api/orders/status", body.clone(), None).await;
		assert_eq!(response.status, StatusCode::UNAUTHORIZED);
		assert!(harness.store.updates().is_empty());

		let cookie = harness.session_cookie();
		let response = harness.post_json("/api/orders/status", body, Some(&cookie)).await;
		assert_eq!(response.status, StatusCode::OK);
		assert_eq!(response.json(), json!({"ok": true, "result": {"ok": true}}));
		assert_eq!(
			harness.store.updates(),
			[("x1".to_owned(), crate::order::OrderStatus::Confirmed)]
		);
	}

	#[tokio::test]
	async fn status_update_validation() {
		let harness = Harness::new();
		let cookie = harness.session_cookie();

		let response = harness
			.post_json("/api/orders/status", json!({"id": " ", "stato": "NUOVO"}), Some(&cookie))
			.await;
		assert_eq!(response.status, StatusCode::BAD_REQUEST);
		assert_eq!(response.json()["error"], json!("missing id"));

		let response = harness
			.post_json("/api/orders/status", json!({"id": "x1", "stato": "IN FORNO"}), Some(&cookie))
			.await;
		assert_eq!(response.status, StatusCode::BAD_REQUEST);
		assert!(harness.store.updates().is_empty());
	}

	#[tokio::test]
	async fn rejected_status_update() {
		let harness = Harness::new();
		harness.store.fail_with(|| crate::store::Error::Rejected {
			message: "id not found".to_owned(),
			response: json!({"ok": false, "error": "id not found"}),
		});
		let cookie = harness.session_cookie();
		let response = harness
			.post_json("/api/orders/status", json!({"id": "x9", "stato": "ANNULLATO"}), Some(&cookie))
			.await;
		assert_eq!(response.status, StatusCode::BAD_GATEWAY);
		assert_eq!(response.json()["error"], json!("order store: id not found"));
	}
}
