use axum::Router;

use super::sub;

mod admin;
mod bookings;
mod chat;
pub(super) mod orders;

pub use admin::{log_in, LoginError};

pub fn configure() -> Router {
	let mut app = Router::new();

	sub!(app; admin, bookings, chat, orders);

	app
}
