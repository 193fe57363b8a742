use std::sync::Arc;

use axum::response::{IntoResponse, Redirect, Response};
use axum::{extract, Router};
use http::StatusCode;
use serde::Deserialize;
use subtle::ConstantTimeEq as _;

use crate::config::Config;
use crate::error;
use crate::helpers::auth;
use crate::routes::api::{log_in, LoginError};

#[derive(askama::Template)]
#[template(path = "login.html")]
struct Template {
	restaurant_name: String,
	error: Option<String>,
	key: Option<String>,
}
crate::helpers::impl_into_response!(Template);

#[derive(Deserialize)]
pub struct Query {
	key: Option<String>,
}

/// The page only exists for those who have the link. Without a configured key nobody does.
fn unlocked(config: &Config, presented: Option<&str>) -> bool {
	let (Ok(expected), Some(presented)) = (config.admin.link_key(), presented.map(str::trim)) else {
		return false;
	};
	bool::from(presented.as_bytes().ct_eq(expected.as_bytes()))
}

pub async fn get_handler(
	extract::Query(Query { key }): extract::Query<Query>,
	extract::Extension(config): extract::Extension<Arc<Config>>,
	headers: http::HeaderMap,
) -> Response {
	if !unlocked(&config, key.as_deref()) {
		return error::default_handler().await.into_response();
	}
	if auth::session(&config, &headers).is_ok() {
		return Redirect::to("/pannello").into_response();
	}

	Template {
		restaurant_name: config.restaurant_name.clone(),
		error: None,
		key,
	}
	.into_response()
}

#[derive(Deserialize)]
pub struct LoginForm {
	#[serde(default)]
	password: String,
	key: Option<String>,
}

pub async fn post_handler(
	extract::Extension(config): extract::Extension<Arc<Config>>,
	extract::Form(LoginForm { password, key }): extract::Form<LoginForm>,
) -> Response {
	if !unlocked(&config, key.as_deref()) {
		return error::default_handler().await.into_response();
	}

	match log_in(&config, &password) {
		Ok(cookie) => (cookie, Redirect::to("/pannello")).into_response(),
		Err(LoginError::Config(missing)) => {
			error::error_page(&missing, StatusCode::INTERNAL_SERVER_ERROR)
		}
		Err(LoginError::WrongPassword(wrong)) => (
			StatusCode::UNAUTHORIZED,
			Template {
				restaurant_name: config.restaurant_name.clone(),
				error: Some(wrong.to_string()),
				key,
			},
		)
			.into_response(),
	}
}

pub fn configure() -> Router {
	Router::new().route("/", axum::routing::get(get_handler).post(post_handler))
}
