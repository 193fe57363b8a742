use axum::response::{IntoResponseParts, ResponseParts};
use cookie::{Cookie, SameSite};

use crate::config::AdminConfig;
use crate::token;

/// Simple wrapper around `cookie::Cookie` that implements `axum::response::IntoResponseParts`
#[derive(Debug)]
pub struct Part(pub Cookie<'static>);

impl IntoResponseParts for Part {
	type Error = std::convert::Infallible;

	fn into_response_parts(self, mut res: ResponseParts) -> Result<ResponseParts, Self::Error> {
		res.headers_mut().append(http::header::SET_COOKIE, self.encode());
		Ok(res)
	}
}

impl From<Cookie<'static>> for Part {
	fn from(inner: Cookie<'static>) -> Self {
		Self(inner)
	}
}

impl Part {
	pub fn encode(&self) -> http::HeaderValue {
		// names come from the configuration and values are tokens, both plain ASCII
		self.0
			.to_string()
			.parse()
			.expect("cookie encodes to a valid header value")
	}

	fn base(admin: &AdminConfig, value: String) -> cookie::CookieBuilder<'static> {
		Cookie::build(admin.cookie_name.clone(), value)
			.path("/")
			.http_only(true)
			.same_site(SameSite::Lax)
			.secure(admin.secure_cookies)
	}

	/// Carries a freshly issued session token for as long as the token is valid.
	pub fn session(admin: &AdminConfig, token: String) -> Self {
		Self(
			Self::base(admin, token)
				.max_age(time::Duration::seconds(token::VALIDITY_SECS))
				.finish(),
		)
	}

	pub fn removal(admin: &AdminConfig) -> Self {
		Self(
			Self::base(admin, String::new())
				.max_age(time::Duration::ZERO)
				.finish(),
		)
	}
}
