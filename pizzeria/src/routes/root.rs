use std::sync::Arc;

use axum::response::{IntoResponse, Response};
use axum::{extract, Router};

use crate::config::Config;
use crate::order::{OrderKind, OrderRequest, ValidationError};
use crate::routes::api::orders::{self, SubmitError, Submitted};
use crate::store::OrderStore;

#[derive(askama::Template)]
#[template(path = "index.html")]
struct Template {
	restaurant_name: String,
	kinds: [OrderKind; 3],
	success: Option<&'static str>,
	error: Option<String>,
}
crate::helpers::impl_into_response!(Template);

impl Template {
	fn new(config: &Config) -> Self {
		Self {
			restaurant_name: config.restaurant_name.clone(),
			kinds: OrderKind::ALL,
			success: None,
			error: None,
		}
	}

	fn greeting(&self) -> String {
		format!(
			"Ciao! Sono il bot di {} 🍕\nPosso aiutarti con: orari, asporto/consegna, tempi, allergeni e come scrivere l'ordine.\nPer ordinare usa il modulo qui sopra 🙂",
			self.restaurant_name
		)
	}
}

/// What the customer reads on the form. The JSON API keeps the English text.
fn explain(invalid: &ValidationError) -> &'static str {
	match invalid {
		ValidationError::MissingFields => {
			"Campi obbligatori mancanti (nome, telefono, tipo, data, ora, ordine)."
		}
		ValidationError::InvalidKind => "Tipo di ordine non valido: scegli Tavolo, Asporto o Consegna.",
		ValidationError::InvalidDate => "Data non valida.",
		ValidationError::InvalidTime => "Ora non valida.",
		ValidationError::MissingAddress => "Per la consegna serve l'indirizzo.",
	}
}

static UNAVAILABLE: &str = "Non siamo riusciti a inviare l'ordine. Riprova tra poco o chiamaci.";

static ORDER_SENT: &str = "✅ Ordine inviato! Ti confermiamo su WhatsApp/telefono.";

pub async fn get_handler(
	extract::Extension(config): extract::Extension<Arc<Config>>,
) -> impl IntoResponse {
	Template::new(&config)
}

pub async fn post_handler(
	extract::Extension(config): extract::Extension<Arc<Config>>,
	extract::Extension(store): extract::Extension<Arc<dyn OrderStore>>,
	extract::Form(request): extract::Form<OrderRequest>,
) -> Response {
	let mut template = Template::new(&config);
	match orders::submit(&config, &*store, request).await {
		// the honeypot gets the same answer as a real order
		Ok(Submitted::Skipped | Submitted::Stored(_)) => {
			template.success = Some(ORDER_SENT);
			template.into_response()
		}
		Err(SubmitError::Config(missing)) => {
			tracing::error!(error = %missing, "order form cannot forward orders");
			template.error = Some(UNAVAILABLE.to_owned());
			(http::StatusCode::INTERNAL_SERVER_ERROR, template).into_response()
		}
		Err(SubmitError::Invalid(invalid)) => {
			template.error = Some(explain(&invalid).to_owned());
			(http::StatusCode::BAD_REQUEST, template).into_response()
		}
		Err(SubmitError::Store(failure)) => {
			let failure = crate::error::Store(failure);
			tracing::warn!(error = %failure, "order form could not reach the store");
			template.error = Some(UNAVAILABLE.to_owned());
			(failure.status_code(), template).into_response()
		}
	}
}

pub fn configure() -> Router {
	Router::new().route("/", axum::routing::get(get_handler).post(post_handler))
}

#[cfg(test)]
mod test {
	use http::StatusCode;

	use crate::testing::{self, Harness};

	const FORM: &str = "nome=Giulia&telefono=3271234567&tipo=ASPORTO&data=2024-05-01&ora=19%3A30&ordine=2+margherite&honeypot=";

	#[tokio::test]
	async fn index_page() {
		let harness = Harness::new();
		let response = harness.get("/", None).await;
		assert_eq!(response.status, StatusCode::OK);
		let page = response.text();
		assert!(page.contains(&harness.config.restaurant_name));
		assert!(page.contains("name=\"honeypot\""));
		assert!(page.contains("/api/chat"));
	}

	#[tokio::test]
	async fn form_submission() {
		let harness = Harness::new();
		let response = harness.post_form("/", FORM, None, None).await;
		assert_eq!(response.status, StatusCode::OK);
		assert!(response.text().contains("Ordine inviato"));
		assert_eq!(harness.store.appended().len(), 1);
		assert_eq!(harness.store.appended()[0].order, "2 margherite");
	}

	#[tokio::test]
	async fn form_errors() {
		let harness = Harness::new();
		let response = harness
			.post_form("/", &FORM.replace("ASPORTO", "CONSEGNA"), None, None)
			.await;
		assert_eq!(response.status, StatusCode::BAD_REQUEST);
		let page = response.text();
		assert!(page.contains("Per la consegna serve"));
		assert!(!page.contains("delivery orders need an address"));

		let response = harness
			.post_form("/", &FORM.replace("2024-05-01", "2024-02-30"), None, None)
			.await;
		assert_eq!(response.status, StatusCode::BAD_REQUEST);
		assert!(response.text().contains("Data non valida."));

		let response = harness
			.post_form("/", &format!("{FORM}bot"), None, None)
			.await;
		assert_eq!(response.status, StatusCode::OK);
		assert!(harness.store.appended().is_empty());
	}

	#[tokio::test]
	async fn unconfigured_store() {
		let mut config = testing::config();
		config.store.url = None;
		let harness = Harness::with_config(config);
		let response = harness.post_form("/", FORM, None, None).await;
		assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
		assert!(response.text().contains("Riprova tra poco"));
		assert!(harness.store.appended().is_empty());
	}
}
