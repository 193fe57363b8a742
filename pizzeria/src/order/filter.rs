use serde::Deserialize;

use super::{Order, OrderStatus};

/// The staff panel's search box and selectors. Empty values and `TUTTI` mean "any".
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct Filter {
	pub q: String,
	pub tipo: String,
	pub stato: String,
	/// Inclusive `YYYY-MM-DD` bounds.
	pub from: String,
	pub to: String,
}

static ANY: &str = "TUTTI";

fn selected(value: &str) -> Option<String> {
	let value = value.trim().to_uppercase();
	(!value.is_empty() && value != ANY).then_some(value)
}

impl Filter {
	pub fn is_empty(&self) -> bool {
		self.q.trim().is_empty()
			&& selected(&self.tipo).is_none()
			&& selected(&self.stato).is_none()
			&& self.from.trim().is_empty()
			&& self.to.trim().is_empty()
	}

	pub fn matches(&self, order: &Order) -> bool {
		if selected(&self.tipo).map_or(false, |kind| order.kind != kind) {
			return false;
		}
		if let Some(status) = selected(&self.stato) {
			let wanted = status
				.parse::<OrderStatus>()
				.map_or(status, |status| status.as_str().to_owned());
			if order.status != wanted {
				return false;
			}
		}

		// orders without a usable date are never hidden by the date range
		let (from, to) = (self.from.trim(), self.to.trim());
		if !order.date.is_empty() {
			if !from.is_empty() && order.date.as_str() < from {
				return false;
			}
			if !to.is_empty() && order.date.as_str() > to {
				return false;
			}
		}

		let query = self.q.trim().to_lowercase();
		query.is_empty() || haystack(order).contains(&query)
	}

	pub fn apply<'a>(&self, orders: &'a [Order]) -> Vec<&'a Order> {
		orders.iter().filter(|order| self.matches(order)).collect()
	}
}

fn haystack(order: &Order) -> String {
	[
		&order.name,
		&order.phone,
		&order.kind,
		&order.date,
		&order.time,
		&order.order,
		&order.allergens,
		&order.address,
		&order.status,
		&order.channel,
		&order.notes,
		&order.id,
	]
	.map(String::as_str)
	.join(" ")
	.to_lowercase()
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Counts {
	pub total: usize,
	pub new: usize,
	pub confirmed: usize,
	pub delivered: usize,
	pub cancelled: usize,
}

impl Counts {
	pub fn of(orders: &[Order]) -> Self {
		orders.iter().fold(
			Self {
				total: orders.len(),
				..Self::default()
			},
			|mut counts, order| {
				match order.status() {
					Some(OrderStatus::New) => counts.new += 1,
					Some(OrderStatus::Confirmed) => counts.confirmed += 1,
					Some(OrderStatus::Delivered) => counts.delivered += 1,
					Some(OrderStatus::Cancelled) => counts.cancelled += 1,
					None => {}
				}
				counts
			},
		)
	}
}
