use std::sync::Arc;

use axum::response::{ErrorResponse, IntoResponse, Redirect, Response};
use axum::{extract, Json, Router};
use serde::Deserialize;
use serde_json::json;
use subtle::ConstantTimeEq as _;

use crate::config::Config;
use crate::error::{self, MissingConfig};
use crate::helpers::auth;
use crate::helpers::cookie::Part as CookiePart;

#[derive(Deserialize)]
pub struct LoginRequest {
	#[serde(default, deserialize_with = "crate::helpers::lenient::string")]
	password: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum LoginError {
	#[error(transparent)]
	Config(#[from] MissingConfig),
	#[error(transparent)]
	WrongPassword(#[from] error::WrongPassword),
}

impl IntoResponse for LoginError {
	fn into_response(self) -> Response {
		match self {
			Self::Config(missing) => missing.into_response(),
			Self::WrongPassword(wrong) => wrong.into_response(),
		}
	}
}

/// Checks the password and, on success, hands out a session cookie. Shared with the panel's login form.
pub fn log_in(config: &Config, password: &str) -> Result<CookiePart, LoginError> {
	let expected = config.admin.password()?;
	let authority = config.admin.authority()?;

	if !bool::from(password.as_bytes().ct_eq(expected.as_bytes())) {
		tracing::info!("staff login refused");
		return Err(error::WrongPassword.into());
	}

	tracing::info!("staff logged in");
	Ok(CookiePart::session(&config.admin, authority.issue()))
}

pub async fn login_handler(
	extract::Extension(config): extract::Extension<Arc<Config>>,
	request: Option<Json<LoginRequest>>,
) -> Result<impl IntoResponse, ErrorResponse> {
	let password = request
		.and_then(|Json(request)| request.password)
		.unwrap_or_default();
	let cookie = log_in(&config, &password)?;
	Ok((cookie, Json(json!({ "ok": true }))))
}

pub async fn logout_post_handler(
	extract::Extension(config): extract::Extension<Arc<Config>>,
) -> impl IntoResponse {
	(CookiePart::removal(&config.admin), Json(json!({ "ok": true })))
}

pub async fn logout_get_handler(
	extract::Extension(config): extract::Extension<Arc<Config>>,
) -> impl IntoResponse {
	(CookiePart::removal(&config.admin), Redirect::to(auth::LOGIN_PAGE))
}

pub async fn me_handler(
	extract::Extension(config): extract::Extension<Arc<Config>>,
	headers: http::HeaderMap,
) -> impl IntoResponse {
	// an unconfigured server has nobody logged in
	let authenticated = config.admin.authority().map_or(false, |authority| {
		authority.verify(auth::presented_token(&config, &headers).as_deref())
	});
	Json(json!({ "authenticated": authenticated }))
}

pub fn configure() -> Router {
	Router::new()
		.route("/login", axum::routing::post(login_handler))
		.route(
			"/logout",
			axum::routing::get(logout_get_handler).post(logout_post_handler),
		)
		.route("/me", axum::routing::get(me_handler))
		.route("/bookings", axum::routing::get(super::bookings::get_handler))
}
