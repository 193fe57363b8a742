use axum::response::{IntoResponse, Response};
use http::StatusCode;

#[derive(askama::Template)]
#[template(path = "error.html")]
struct Template {
	code: u16,
	description: Option<&'static str>,
	associated_error: String,
}
crate::helpers::impl_into_response!(Template);

pub fn error_page(error: &dyn std::error::Error, status_code: StatusCode) -> Response {
	if status_code.is_server_error() {
		tracing::warn!(status = %status_code, error = %error, "page failed");
	}

	let template = Template {
		code: status_code.as_u16(),
		description: status_code.canonical_reason(),
		associated_error: error.to_string(),
	};

	IntoResponse::into_response((status_code, template))
}

pub async fn default_handler() -> (StatusCode, impl IntoResponse) {
	let template = Template {
		code: 404,
		description: StatusCode::NOT_FOUND.canonical_reason(),
		associated_error: "Page not found".to_owned(),
	};

	(StatusCode::NOT_FOUND, template)
}
