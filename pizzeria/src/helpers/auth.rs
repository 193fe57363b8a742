use std::sync::Arc;

use axum::async_trait;
use axum::body::Body;
use axum::extract::{FromRequest, RequestParts};
use axum::response::{IntoResponse, Redirect, Response};
use headers::HeaderMapExt as _;
use http::{HeaderMap, StatusCode};

use crate::config::Config;
use crate::error::{self, MissingConfig, Unauthorized};
use crate::helpers::cookie::Part as CookiePart;
use crate::token::Session;

pub static LOGIN_PAGE: &str = "/pannello/login";

/// Why a request did not get through the staff gate.
#[derive(Debug)]
pub enum Failure {
	/// The server cannot check anyone until the signing secret is set.
	Config(MissingConfig),
	/// `clear` is set when a cookie was presented and refused, so the browser drops it.
	Denied { clear: Option<CookiePart> },
}

pub fn presented_token(config: &Config, headers: &HeaderMap) -> Option<String> {
	headers
		.typed_get::<headers::Cookie>()
		.and_then(|cookies| cookies.get(&config.admin.cookie_name).map(str::to_owned))
}

/// Checks the session cookie in `headers`.
pub fn session(config: &Config, headers: &HeaderMap) -> Result<Session, Failure> {
	let authority = config.admin.authority().map_err(Failure::Config)?;
	let token = presented_token(config, headers).ok_or(Failure::Denied { clear: None })?;
	match authority.check(&token) {
		Ok(session) => {
			tracing::trace!(
				issued_at = session.issued_at(),
				expires_at = session.expires_at(),
				"staff session"
			);
			Ok(session)
		}
		Err(rejection) => {
			tracing::debug!(%rejection, "refused session token");
			Err(Failure::Denied {
				clear: Some(CookiePart::removal(&config.admin)),
			})
		}
	}
}

fn config(req: &RequestParts<Body>) -> Arc<Config> {
	Arc::clone(
		req.extensions()
			.get::<Arc<Config>>()
			.expect("Could not get config from app data"),
	)
}

/// A staff member calling the JSON API.
pub struct Staff(pub Session);

pub struct ApiRejection(Failure);

impl IntoResponse for ApiRejection {
	fn into_response(self) -> Response {
		match self.0 {
			Failure::Config(missing) => missing.into_response(),
			Failure::Denied { clear } => (clear, Unauthorized).into_response(),
		}
	}
}

#[async_trait]
impl FromRequest<Body> for Staff {
	type Rejection = ApiRejection;

	async fn from_request(req: &mut RequestParts<Body>) -> Result<Self, Self::Rejection> {
		session(&config(req), req.headers())
			.map(Self)
			.map_err(ApiRejection)
	}
}

/// A staff member browsing the panel. Anyone else is sent to the login page.
pub struct StaffPage(pub Session);

pub struct PageRejection(Failure);

impl IntoResponse for PageRejection {
	fn into_response(self) -> Response {
		match self.0 {
			Failure::Config(missing) => error::error_page(&missing, StatusCode::INTERNAL_SERVER_ERROR),
			Failure::Denied { clear } => (clear, Redirect::to(LOGIN_PAGE)).into_response(),
		}
	}
}

#[async_trait]
impl FromRequest<Body> for StaffPage {
	type Rejection = PageRejection;

	async fn from_request(req: &mut RequestParts<Body>) -> Result<Self, Self::Rejection> {
		session(&config(req), req.headers())
			.map(Self)
			.map_err(PageRejection)
	}
}
