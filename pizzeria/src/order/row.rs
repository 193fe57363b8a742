//! Decoding of the rows returned by the sheet's `list` action.
//!
//! Depending on how the web app is deployed, a row is either an array of cells in column order or an object keyed by
//! column header. Both shapes go through [`Order::from_row`], which reads each field through the [`Column`] table:
//! the position for arrays, the header names (first exact, then ignoring case) for objects.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value};
use time::UtcOffset;

use super::OrderStatus;
use crate::timestamp::{self, html_date, html_time, italian_date};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
	Timestamp,
	Name,
	Phone,
	Kind,
	Date,
	Time,
	Allergens,
	Order,
	Address,
	Status,
	Channel,
	Notes,
	Id,
}

impl Column {
	pub const fn index(self) -> usize {
		self as usize
	}

	pub const fn keys(self) -> &'static [&'static str] {
		match self {
			Self::Timestamp => &["Timestamp"],
			Self::Name => &["Nome", "name"],
			Self::Phone => &["Telefono", "phone"],
			Self::Kind => &["Tipo", "type"],
			Self::Date => &["Data", "date", "dataISO"],
			Self::Time => &["Ora", "time"],
			Self::Allergens => &["Allergeni", "allergens"],
			Self::Order => &["Ordine", "order"],
			Self::Address => &["Indirizzo", "address"],
			Self::Status => &["Stato", "status"],
			Self::Channel => &["Bot o Manuale", "canale", "source"],
			Self::Notes => &["Note", "notes"],
			Self::Id => &["ID", "id"],
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Order {
	pub id: String,
	pub timestamp: String,
	pub name: String,
	pub phone: String,
	/// Uppercased, `TAVOLO` when the cell is empty. Unknown kinds are kept as written.
	pub kind: String,
	/// `YYYY-MM-DD` when the cell could be understood, the raw text otherwise.
	pub date: String,
	/// `HH:mm` when the cell could be understood, the raw text otherwise.
	pub time: String,
	pub allergens: String,
	pub order: String,
	pub address: String,
	/// The canonical status name, `NUOVO` when the cell is empty. Unknown statuses are kept uppercased.
	pub status: String,
	pub channel: String,
	pub notes: String,
}

impl Order {
	pub fn from_row(row: &Value, index: usize, offset: UtcOffset) -> Self {
		let timestamp = cell(row, Column::Timestamp);
		let id = match cell(row, Column::Id) {
			id if id.is_empty() => format!("fallback-{timestamp}-{index}"),
			id => id,
		};
		let kind = match cell(row, Column::Kind).to_uppercase() {
			kind if kind.is_empty() => super::OrderKind::Table.as_str().to_owned(),
			kind => kind,
		};

		Self {
			id,
			name: cell(row, Column::Name),
			phone: cell(row, Column::Phone),
			kind,
			date: normalize_date(&cell(row, Column::Date), offset),
			time: normalize_time(&cell(row, Column::Time), offset),
			allergens: cell(row, Column::Allergens),
			order: cell(row, Column::Order),
			address: cell(row, Column::Address),
			status: normalize_status(&cell(row, Column::Status)),
			channel: cell(row, Column::Channel).to_uppercase(),
			notes: cell(row, Column::Notes),
			timestamp,
		}
	}

	pub fn status(&self) -> Option<OrderStatus> {
		self.status.parse().ok()
	}

	pub fn display_date(&self) -> String {
		timestamp::display_date(&self.date)
	}

	fn sort_key(&self) -> String {
		format!("{} {}", self.date, self.time).trim().to_owned()
	}
}

/// Decodes every row and puts them in service order: by date and time, then by when they were submitted.
pub fn decode_all(rows: &[Value], offset: UtcOffset) -> Vec<Order> {
	let mut orders: Vec<Order> = rows
		.iter()
		.enumerate()
		.map(|(index, row)| Order::from_row(row, index, offset))
		.collect();
	orders.sort_by(|a, b| {
		a.sort_key()
			.cmp(&b.sort_key())
			.then_with(|| a.timestamp.cmp(&b.timestamp))
	});
	orders
}

pub fn cell(row: &Value, column: Column) -> String {
	let value = match row {
		Value::Array(cells) => cells.get(column.index()),
		Value::Object(fields) => lookup(fields, column.keys()),
		_ => None,
	};
	value.map(cell_text).unwrap_or_default()
}

fn lookup<'a>(fields: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
	let present = |value: &&Value| !value.is_null();
	keys
		.iter()
		.find_map(|key| fields.get(*key).filter(present))
		.or_else(|| {
			keys.iter().find_map(|key| {
				fields
					.iter()
					.find(|(name, value)| name.eq_ignore_ascii_case(key) && present(value))
					.map(|(_, value)| value)
			})
		})
}

fn cell_text(value: &Value) -> String {
	// integers beyond this lose precision as f64
	const MAX_EXACT: f64 = 9_007_199_254_740_992.0;

	match value {
		Value::Null => String::new(),
		Value::String(text) => text.trim().to_owned(),
		Value::Number(number) => match number.as_f64() {
			// phone numbers stored as numbers come back as `3271234567.0` from some deployments
			Some(float) if number.is_f64() && float.fract() == 0.0 && float.abs() < MAX_EXACT => {
				(float as i64).to_string()
			}
			_ => number.to_string(),
		},
		other => other.to_string(),
	}
}

pub fn normalize_status(raw: &str) -> String {
	let raw = raw.trim();
	if raw.is_empty() {
		return OrderStatus::New.as_str().to_owned();
	}
	raw.parse::<OrderStatus>()
		.map_or_else(|_| raw.to_uppercase(), |status| status.as_str().to_owned())
}

pub fn normalize_date(raw: &str, offset: UtcOffset) -> String {
	let raw = raw.trim();
	if raw.is_empty() || html_date::parse(raw).is_some() {
		return raw.to_owned();
	}
	if let Some(date) = italian_date::parse(raw) {
		return html_date::format(date);
	}
	if let Some((date, _)) = timestamp::parse_rfc3339(raw, offset) {
		return html_date::format(date);
	}
	raw.to_owned()
}

static EXACT_TIME: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"^\d{2}:\d{2}$").expect("literal pattern"));
static EMBEDDED_TIME: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"(\d{1,2}):(\d{2})").expect("literal pattern"));

/// Time cells arrive as `19:30`, `7:30 PM`, or as full timestamps on the sheet's epoch day (`1899-12-30T18:30:00Z`).
/// The clock reading written in the text wins; a timestamp is only converted when no `H:mm` can be found in it.
pub fn normalize_time(raw: &str, offset: UtcOffset) -> String {
	let raw = raw.trim();
	if raw.is_empty() || EXACT_TIME.is_match(raw) {
		return raw.to_owned();
	}
	if let Some(captures) = EMBEDDED_TIME.captures(raw) {
		let hours: u8 = captures[1].parse().unwrap_or_default();
		return format!("{hours:02}:{}", &captures[2]);
	}
	if let Some((_, time)) = timestamp::parse_rfc3339(raw, offset) {
		return html_time::format(time);
	}
	raw.to_owned()
}
