use std::sync::Arc;

use axum::{Extension, Router};

use crate::chat::ChatProvider;
use crate::config::Config;
use crate::store::OrderStore;

mod api;
mod pannello;
mod root;

macro_rules! sub {
	($app:ident, $name:ident) => {
		$app = $app.nest(concat!("/", stringify!($name)), $name::configure())
	};
	($app:ident; $($name:ident),+) => {
		$(sub!($app, $name));+
	};
}
pub(crate) use sub;

macro_rules! merge {
	($app:ident, $name:ident) => {
		$app = $app.merge($name::configure());
	};
	($app:ident; $($name:ident),+) => {
		$(merge!($app, $name));+
	};
}

pub fn configure() -> Router {
	let mut app = Router::new();

	merge!(app; root);
	sub!(app; api, pannello);

	app.fallback(axum::handler::Handler::into_service(
		crate::error::default_handler,
	))
}

/// The whole site with its collaborators attached.
pub fn app(
	config: Arc<Config>,
	store: Arc<dyn OrderStore>,
	chat: Arc<dyn ChatProvider>,
) -> Router {
	configure()
		.layer(Extension(store))
		.layer(Extension(chat))
		.layer(Extension(config))
}
