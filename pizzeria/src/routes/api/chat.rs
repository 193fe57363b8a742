use std::sync::Arc;

use axum::response::{ErrorResponse, IntoResponse};
use axum::{extract, Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::chat::{self, ChatProvider};
use crate::config::Config;
use crate::error;

#[derive(Deserialize)]
pub struct ChatRequest {
	#[serde(default, deserialize_with = "crate::helpers::lenient::string")]
	message: Option<String>,
	#[serde(default)]
	history: Value,
}

pub async fn post_handler(
	extract::Extension(config): extract::Extension<Arc<Config>>,
	extract::Extension(provider): extract::Extension<Arc<dyn ChatProvider>>,
	request: Option<Json<ChatRequest>>,
) -> Result<impl IntoResponse, ErrorResponse> {
	config.chat.api_key()?;

	let (message, history) = match request {
		Some(Json(ChatRequest { message, history })) => (message, history),
		None => (None, Value::Null),
	};
	let message = message.as_deref().map(str::trim).unwrap_or_default();
	if message.is_empty() {
		return Err(error::BadRequest("missing message".into()).into());
	}
	let history = history.as_array().map(Vec::as_slice).unwrap_or_default();

	let reply = chat::answer(
		&*provider,
		config.chat.system_prompt(&config.restaurant_name),
		history,
		message,
		config.chat.max_history,
	)
	.await
	.map_err(error::Chat)?;

	Ok(Json(json!({ "reply": reply })))
}

pub fn configure() -> Router {
	Router::new().route("/", axum::routing::post(post_handler))
}
