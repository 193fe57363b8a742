use std::sync::Arc;

use axum::response::{IntoResponse, Redirect, Response};
use axum::{extract, Router};
use headers::HeaderMapExt as _;
use http::StatusCode;
use serde::Deserialize;

use crate::config::Config;
use crate::error;
use crate::helpers::auth::StaffPage;
use crate::messaging;
use crate::order::{Counts, Filter, Order, OrderKind, OrderStatus};
use crate::store::{self, OrderStore};

use super::sub;

mod login;

/// Seconds between reloads of the panel.
const REFRESH_SECS: u32 = 15;

const ACTIONS: [OrderStatus; 3] = [
	OrderStatus::Confirmed,
	OrderStatus::Delivered,
	OrderStatus::Cancelled,
];

struct Row {
	order: Order,
	/// `tel:` target, empty when there is nothing to call.
	tel: String,
	/// Status changes open WhatsApp in a new tab when the customer can be reached there.
	whatsapp: bool,
}

impl Row {
	fn new(order: &Order) -> Self {
		Self {
			tel: messaging::normalize_phone(&order.phone),
			whatsapp: messaging::whatsapp_phone(&order.phone).is_some(),
			order: order.clone(),
		}
	}

	fn status_class(&self) -> &'static str {
		match self.order.status() {
			Some(OrderStatus::Confirmed) => "badge green",
			Some(OrderStatus::Delivered) => "badge yellow",
			Some(OrderStatus::Cancelled) => "badge red",
			Some(OrderStatus::New) | None => "badge blue",
		}
	}

	fn kind_class(&self) -> &'static str {
		match self.order.kind.parse() {
			Ok(OrderKind::Delivery) => "badge deliver",
			Ok(OrderKind::Takeaway) => "badge take",
			Ok(OrderKind::Table) | Err(_) => "badge table",
		}
	}
}

#[derive(askama::Template)]
#[template(path = "panel.html")]
struct Template {
	restaurant_name: String,
	refresh_secs: u32,
	filter: Filter,
	kinds: [OrderKind; 3],
	statuses: [OrderStatus; 4],
	actions: [OrderStatus; 3],
	counts: Counts,
	rows: Vec<Row>,
	error: Option<String>,
}
crate::helpers::impl_into_response!(Template);

pub async fn get_handler(
	_: StaffPage,
	extract::Query(filter): extract::Query<Filter>,
	extract::Extension(config): extract::Extension<Arc<Config>>,
	extract::Extension(store): extract::Extension<Arc<dyn OrderStore>>,
) -> Response {
	let (orders, status_code, error) = match store.list(store::DEFAULT_LIST_LIMIT).await {
		Ok(listing) => (listing.orders, StatusCode::OK, None),
		Err(failure) => {
			let failure = error::Store(failure);
			tracing::warn!(error = %failure, "could not load the panel");
			(Vec::new(), failure.status_code(), Some(failure.to_string()))
		}
	};

	let template = Template {
		restaurant_name: config.restaurant_name.clone(),
		refresh_secs: REFRESH_SECS,
		counts: Counts::of(&orders),
		rows: filter.apply(&orders).into_iter().map(Row::new).collect(),
		filter,
		kinds: OrderKind::ALL,
		statuses: OrderStatus::ALL,
		actions: ACTIONS,
		error,
	};
	(status_code, template).into_response()
}

/// What the panel knows about the order whose status is changing, enough to write to the customer.
#[derive(Deserialize)]
pub struct StatusForm {
	#[serde(default)]
	id: String,
	#[serde(default)]
	stato: String,
	#[serde(default)]
	nome: String,
	#[serde(default)]
	telefono: String,
	#[serde(default)]
	tipo: String,
	#[serde(default)]
	data: String,
	#[serde(default)]
	ora: String,
	#[serde(default)]
	ordine: String,
	#[serde(default)]
	allergeni: String,
	#[serde(default)]
	indirizzo: String,
}

impl StatusForm {
	fn into_order(self, status: OrderStatus) -> Order {
		Order {
			id: self.id,
			timestamp: String::new(),
			name: self.nome,
			phone: self.telefono,
			kind: self.tipo,
			date: self.data,
			time: self.ora,
			allergens: self.allergeni,
			order: self.ordine,
			address: self.indirizzo,
			status: status.as_str().to_owned(),
			channel: String::new(),
			notes: String::new(),
		}
	}
}

pub async fn status_handler(
	StaffPage(session): StaffPage,
	extract::Extension(store): extract::Extension<Arc<dyn OrderStore>>,
	headers: http::HeaderMap,
	extract::Form(form): extract::Form<StatusForm>,
) -> Response {
	let id = form.id.trim().to_owned();
	if id.is_empty() {
		return error::error_page(&error::BadRequest("missing id".into()), StatusCode::BAD_REQUEST);
	}
	let status: OrderStatus = match form.stato.parse() {
		Ok(status) => status,
		Err(invalid) => return error::error_page(&invalid, StatusCode::BAD_REQUEST),
	};

	if let Err(failure) = store.update_status(&id, status).await {
		let failure = error::Store(failure);
		return error::error_page(&failure, failure.status_code());
	}
	tracing::info!(%id, status = status.as_str(), session = session.issued_at(), "order status changed");

	let mobile = headers
		.typed_get::<headers::UserAgent>()
		.map_or(false, |agent| messaging::is_mobile(agent.as_str()));
	let order = form.into_order(status);
	let url = messaging::status_message(&order, status)
		.and_then(|message| messaging::whatsapp_url(&order.phone, &message, mobile));

	match url {
		Some(url) => Redirect::to(&url).into_response(),
		None => Redirect::to("/pannello").into_response(),
	}
}

pub fn configure() -> Router {
	let mut app = Router::new()
		.route("/", axum::routing::get(get_handler))
		.route("/stato", axum::routing::post(status_handler));

	sub!(app; login);

	app
}
