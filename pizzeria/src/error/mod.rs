use std::borrow::Cow;

use axum::response::{IntoResponse, Response};
use http::StatusCode;

mod template;
pub use template::{default_handler, error_page};

#[derive(Debug, Clone, Copy, thiserror::Error)]
#[error("{0} is not configured")]
pub struct MissingConfig(pub &'static str);

#[derive(Debug, thiserror::Error)]
#[error("wrong password")]
pub struct WrongPassword;

#[derive(Debug, thiserror::Error)]
#[error("not authorized")]
pub struct Unauthorized;

#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct BadRequest(pub Cow<'static, str>);

#[derive(Debug, thiserror::Error)]
#[error("order store: {0}")]
pub struct Store(#[source] pub crate::store::Error);

#[derive(Debug, thiserror::Error)]
#[error("assistant: {0}")]
pub struct Chat(#[source] pub crate::chat::Error);

/// `{"ok": false, "error": ..., "details": ...}` with the given status.
pub fn json_error(
	error: &dyn std::error::Error,
	status_code: StatusCode,
	details: Option<serde_json::Value>,
) -> Response {
	if status_code.is_server_error() {
		tracing::warn!(status = %status_code, error = %error, "request failed");
	}

	let mut body = serde_json::json!({ "ok": false, "error": error.to_string() });
	if let Some(details) = details {
		body["details"] = details;
	}
	(status_code, axum::Json(body)).into_response()
}

macro_rules! impl_response {
	($struct_name:ident, $status:ident) => {
		impl axum::response::IntoResponse for $struct_name {
			fn into_response(self) -> axum::response::Response {
				crate::error::json_error(&self, http::StatusCode::$status, None)
			}
		}
	};
}

impl_response!(MissingConfig, INTERNAL_SERVER_ERROR);
impl_response!(WrongPassword, UNAUTHORIZED);
impl_response!(Unauthorized, UNAUTHORIZED);
impl_response!(BadRequest, BAD_REQUEST);

impl Store {
	pub fn status_code(&self) -> StatusCode {
		match self.0 {
			crate::store::Error::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
			_ => StatusCode::BAD_GATEWAY,
		}
	}
}

impl IntoResponse for Store {
	fn into_response(self) -> Response {
		json_error(&self, self.status_code(), self.0.details())
	}
}

impl Chat {
	pub fn status_code(&self) -> StatusCode {
		match self.0 {
			crate::chat::Error::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
			_ => StatusCode::BAD_GATEWAY,
		}
	}
}

impl IntoResponse for Chat {
	fn into_response(self) -> Response {
		json_error(&self, self.status_code(), None)
	}
}
