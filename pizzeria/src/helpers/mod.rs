pub mod auth;
pub mod cookie;
pub mod lenient;
pub mod percent;

/// This is temporary while askama fixes their issues with deriving `axum::IntoResponse`
macro_rules! impl_into_response {
	($name:ident) => {
		impl axum::response::IntoResponse for $name {
			fn into_response(self) -> axum::response::Response {
				match askama::Template::render(&self) {
					Ok(page) => (
						[(http::header::CONTENT_TYPE, <$name as askama::Template>::MIME_TYPE)],
						page,
					)
						.into_response(),
					Err(err) => {
						tracing::error!(error = %err, "rendering template");
						(http::StatusCode::INTERNAL_SERVER_ERROR, err.to_string()).into_response()
					}
				}
			}
		}
	};
}
pub(crate) use impl_into_response;
