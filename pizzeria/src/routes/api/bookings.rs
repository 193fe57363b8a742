use std::sync::Arc;

use axum::response::{ErrorResponse, IntoResponse};
use axum::{extract, Json, Router};
use serde::Deserialize;
use serde_json::json;

use crate::error;
use crate::helpers::auth::Staff;
use crate::store::{self, OrderStore};

#[derive(Deserialize)]
pub struct Query {
	limit: Option<String>,
}

pub async fn get_handler(
	_: Staff,
	extract::Query(Query { limit }): extract::Query<Query>,
	extract::Extension(store): extract::Extension<Arc<dyn OrderStore>>,
) -> Result<impl IntoResponse, ErrorResponse> {
	let limit = store::clamp_limit(limit.as_deref());
	let listing = store.list(limit).await.map_err(error::Store)?;

	Ok(Json(json!({
		"ok": true,
		"rows": listing.orders,
		"count": listing.count,
	})))
}

pub fn configure() -> Router {
	Router::new().route("/", axum::routing::get(get_handler))
}
