//! Phone numbers and the WhatsApp messages staff send when an order changes status.

use std::sync::LazyLock;

use regex::Regex;

use crate::helpers::percent;
use crate::order::{Order, OrderStatus};

/// Keeps digits and `+`, which is also what `tel:` links want.
pub fn normalize_phone(raw: &str) -> String {
	raw.chars()
		.filter(|c| c.is_ascii_digit() || *c == '+')
		.collect()
}

/// The number in the international form WhatsApp expects, without `+` or `00`. Bare ten digit numbers are assumed
/// to be Italian.
pub fn whatsapp_phone(raw: &str) -> Option<String> {
	let phone = normalize_phone(raw).replace('+', "");
	let phone = phone.strip_prefix("00").unwrap_or(&phone);
	if phone.is_empty() {
		return None;
	}
	if !phone.starts_with("39") && phone.len() == 10 {
		return Some(format!("39{phone}"));
	}
	Some(phone.to_owned())
}

static MOBILE: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"(?i)Android|iPhone|iPad|iPod").expect("literal pattern"));

pub fn is_mobile(user_agent: &str) -> bool {
	MOBILE.is_match(user_agent)
}

/// Phones open the app through `wa.me`; everything else goes to WhatsApp Web.
pub fn whatsapp_url(phone: &str, text: &str, mobile: bool) -> Option<String> {
	let phone = whatsapp_phone(phone)?;
	let text = percent::encode(text);
	Some(if mobile {
		format!("https://wa.me/{phone}?text={text}")
	} else {
		format!("https://web.whatsapp.com/send?phone={phone}&text={text}")
	})
}

/// The message for the customer. New orders have nothing to announce.
pub fn status_message(order: &Order, status: OrderStatus) -> Option<String> {
	let (headline, closing) = match status {
		OrderStatus::New => return None,
		OrderStatus::Confirmed => ("✅ CONFERMATO!", "Perfetto, il tuo ordine è confermato. 🍕"),
		OrderStatus::Delivered => ("🚚 CONSEGNATO!", "Grazie! Buon appetito 😄"),
		OrderStatus::Cancelled => ("❌ ANNULLATO", "Purtroppo non riusciamo a gestire l'ordine ora."),
	};

	let mut summary = format!(
		"Ciao {}! 👋\nOrdine {} ore {}\nTipo: {}\nOrdine: {}\n",
		order.name,
		order.display_date(),
		order.time,
		order.kind,
		order.order,
	);
	if !order.allergens.is_empty() {
		summary.push_str(&format!("Allergeni: {}\n", order.allergens));
	}
	if !order.address.is_empty() {
		summary.push_str(&format!("Indirizzo: {}\n", order.address));
	}

	Some(format!("{headline}\n{summary}\n{closing}"))
}
