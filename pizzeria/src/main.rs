#![deny(
	absolute_paths_not_starting_with_crate,
	future_incompatible,
	keyword_idents,
	macro_use_extern_crate,
	meta_variable_misuse,
	missing_abi,
	missing_copy_implementations,
	non_ascii_idents,
	nonstandard_style,
	noop_method_call,
	rust_2018_idioms
)]
#![forbid(unsafe_code)]

use std::sync::Arc;

use crate::chat::ChatProvider;
use crate::store::OrderStore;

mod chat;
mod config;
mod error;
mod helpers;
mod messaging;
mod order;
mod routes;
mod store;
#[cfg(test)]
mod testing;
mod timestamp;
mod token;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("reading configuration: {0}")]
	Config(#[from] figment::Error),
	#[error("building HTTP client: {0}")]
	HttpClient(#[from] reqwest::Error),
	#[error("running server: {0}")]
	RunServer(#[from] hyper::Error),
}

#[tokio::main]
async fn main() -> Result<(), Error> {
	let config = Arc::new(config::config()?);

	init_logging(config.log_level);
	warn_about_missing_config(&config);

	let http = reqwest::Client::builder()
		.user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
		.build()?;
	let store: Arc<dyn OrderStore> = Arc::new(store::SheetClient::new(
		http.clone(),
		config.store.clone(),
	));
	let chat: Arc<dyn ChatProvider> = Arc::new(chat::OpenAi::new(http, config.chat.clone()));

	let app = routes::app(Arc::clone(&config), store, chat)
		.layer(tower_http::trace::TraceLayer::new_for_http());

	tracing::info!(address = %config.address, "listening");
	axum::Server::bind(&config.address)
		.serve(app.into_make_service())
		.await?;
	Ok(())
}

/// The server starts without these; the affected endpoints answer 500 until they are set.
fn warn_about_missing_config(config: &config::Config) {
	let missing = [
		config.admin.password().err(),
		config.admin.authority().err(),
		config.admin.link_key().err(),
		config.store.url().err(),
		config.chat.api_key().err(),
	];
	for missing in missing.into_iter().flatten() {
		tracing::warn!(%missing, "incomplete configuration");
	}
}

fn init_logging(log_level: config::LogLevel) {
	use tracing_subscriber::filter::FilterFn;
	use tracing_subscriber::layer::{Layer, SubscriberExt};
	use tracing_subscriber::util::SubscriberInitExt;

	let filter = FilterFn::new(move |metadata| {
		let internal = metadata.module_path().map_or(false, |path| {
			path == env!("CARGO_PKG_NAME")
				|| path
					.strip_prefix(env!("CARGO_PKG_NAME"))
					.map_or(false, |rest| rest.starts_with("::"))
		});
		let required_level = if internal {
			log_level.internal
		} else {
			log_level.external
		};
		metadata.level() <= &required_level
	});

	let layer = tracing_subscriber::fmt::layer()
		.with_file(true)
		.with_line_number(true)
		.with_writer(std::io::stderr);

	tracing_subscriber::registry()
		.with(layer.with_filter(filter))
		.init();
}
