//! Orders as customers submit them and as the sheet hands them back.
//!
//! Kinds and statuses travel to and from the sheet under their Italian names (`TAVOLO`, `CONFERMATO`, ...), which is
//! what the sheet's columns and the staff already use.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use time::{Date, Time};

use crate::timestamp::{html_date, html_time};

pub mod filter;
pub mod row;

pub use filter::{Counts, Filter};
pub use row::Order;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum OrderKind {
	#[serde(rename = "TAVOLO")]
	Table,
	#[serde(rename = "ASPORTO")]
	Takeaway,
	#[serde(rename = "CONSEGNA")]
	Delivery,
}

impl OrderKind {
	pub const ALL: [Self; 3] = [Self::Table, Self::Takeaway, Self::Delivery];

	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Table => "TAVOLO",
			Self::Takeaway => "ASPORTO",
			Self::Delivery => "CONSEGNA",
		}
	}

	pub const fn label(self) -> &'static str {
		match self {
			Self::Table => "Tavolo",
			Self::Takeaway => "Asporto",
			Self::Delivery => "Consegna",
		}
	}
}

impl Display for OrderKind {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

#[derive(Debug, thiserror::Error)]
#[error("unknown order type {0:?}")]
pub struct UnknownKind(pub String);

impl FromStr for OrderKind {
	type Err = UnknownKind;

	fn from_str(raw: &str) -> Result<Self, Self::Err> {
		match raw.trim().to_uppercase().as_str() {
			"TAVOLO" | "TABLE" => Ok(Self::Table),
			"ASPORTO" | "TAKEAWAY" => Ok(Self::Takeaway),
			"CONSEGNA" | "DELIVERY" => Ok(Self::Delivery),
			_ => Err(UnknownKind(raw.to_owned())),
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum OrderStatus {
	#[serde(rename = "NUOVO")]
	New,
	#[serde(rename = "CONFERMATO")]
	Confirmed,
	#[serde(rename = "CONSEGNATO")]
	Delivered,
	#[serde(rename = "ANNULLATO")]
	Cancelled,
}

impl OrderStatus {
	pub const ALL: [Self; 4] = [Self::New, Self::Confirmed, Self::Delivered, Self::Cancelled];

	pub const fn as_str(self) -> &'static str {
		match self {
			Self::New => "NUOVO",
			Self::Confirmed => "CONFERMATO",
			Self::Delivered => "CONSEGNATO",
			Self::Cancelled => "ANNULLATO",
		}
	}

	pub const fn label(self) -> &'static str {
		match self {
			Self::New => "Nuovo",
			Self::Confirmed => "Confermato",
			Self::Delivered => "Consegnato",
			Self::Cancelled => "Annullato",
		}
	}
}

impl Display for OrderStatus {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

#[derive(Debug, thiserror::Error)]
#[error("unknown order status {0:?}")]
pub struct UnknownStatus(pub String);

impl FromStr for OrderStatus {
	type Err = UnknownStatus;

	fn from_str(raw: &str) -> Result<Self, Self::Err> {
		match raw.trim().to_uppercase().as_str() {
			"NUOVO" | "NUOVA" | "NEW" => Ok(Self::New),
			"CONFERMATO" | "CONFERMATA" | "CONFIRMED" => Ok(Self::Confirmed),
			"CONSEGNATO" | "CONSEGNATA" | "DELIVERED" => Ok(Self::Delivered),
			"ANNULLATO" | "ANNULLATA" | "CANCELLED" | "CANCELED" => Ok(Self::Cancelled),
			_ => Err(UnknownStatus(raw.to_owned())),
		}
	}
}

/// An order as submitted by the public form or the JSON endpoint, before validation.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct OrderRequest {
	#[serde(rename = "nome", deserialize_with = "crate::helpers::lenient::string")]
	pub name: Option<String>,
	#[serde(rename = "telefono", deserialize_with = "crate::helpers::lenient::string")]
	pub phone: Option<String>,
	#[serde(rename = "tipo", deserialize_with = "crate::helpers::lenient::string")]
	pub kind: Option<String>,
	#[serde(rename = "data", deserialize_with = "crate::helpers::lenient::string")]
	pub date: Option<String>,
	#[serde(rename = "ora", deserialize_with = "crate::helpers::lenient::string")]
	pub time: Option<String>,
	#[serde(rename = "allergeni", deserialize_with = "crate::helpers::lenient::string")]
	pub allergens: Option<String>,
	#[serde(rename = "ordine", deserialize_with = "crate::helpers::lenient::string")]
	pub order: Option<String>,
	#[serde(rename = "indirizzo", deserialize_with = "crate::helpers::lenient::string")]
	pub address: Option<String>,
	#[serde(rename = "note", deserialize_with = "crate::helpers::lenient::string")]
	pub notes: Option<String>,
	#[serde(rename = "canale", deserialize_with = "crate::helpers::lenient::string")]
	pub channel: Option<String>,
	/// Hidden form field. People leave it empty; bots fill it in.
	#[serde(deserialize_with = "crate::helpers::lenient::string")]
	pub honeypot: Option<String>,
}

/// A validated order, ready to be appended to the sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewOrder {
	#[serde(rename = "nome")]
	pub name: String,
	#[serde(rename = "telefono")]
	pub phone: String,
	#[serde(rename = "tipo")]
	pub kind: OrderKind,
	#[serde(rename = "data", serialize_with = "html_date::serialize")]
	pub date: Date,
	#[serde(rename = "ora", serialize_with = "html_time::serialize")]
	pub time: Time,
	#[serde(rename = "allergeni")]
	pub allergens: String,
	#[serde(rename = "ordine")]
	pub order: String,
	#[serde(rename = "indirizzo")]
	pub address: String,
	#[serde(rename = "canale")]
	pub channel: String,
	#[serde(rename = "note")]
	pub notes: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
	/// The honeypot was filled in. Answer as if it worked and drop it.
	Spam,
	Order(NewOrder),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
	#[error("missing required fields (nome, telefono, tipo, data, ora, ordine)")]
	MissingFields,
	#[error("invalid order type, use TAVOLO / ASPORTO / CONSEGNA")]
	InvalidKind,
	#[error("invalid date format (YYYY-MM-DD)")]
	InvalidDate,
	#[error("invalid time format (HH:mm)")]
	InvalidTime,
	#[error("delivery orders need an address")]
	MissingAddress,
}

pub static DEFAULT_CHANNEL: &str = "APP";

fn trimmed(field: Option<String>) -> String {
	field.as_deref().map(str::trim).unwrap_or_default().to_owned()
}

impl OrderRequest {
	pub fn validate(self) -> Result<Submission, ValidationError> {
		if self
			.honeypot
			.as_deref()
			.map_or(false, |honeypot| !honeypot.trim().is_empty())
		{
			return Ok(Submission::Spam);
		}

		let name = trimmed(self.name);
		let phone = trimmed(self.phone);
		let kind = trimmed(self.kind);
		let date = trimmed(self.date);
		let time = trimmed(self.time);
		let order = trimmed(self.order);
		let address = trimmed(self.address);
		let channel = match trimmed(self.channel) {
			channel if channel.is_empty() => DEFAULT_CHANNEL.to_owned(),
			channel => channel.to_uppercase(),
		};

		if [&name, &phone, &kind, &date, &time, &order]
			.iter()
			.any(|field| field.is_empty())
		{
			return Err(ValidationError::MissingFields);
		}
		let kind: OrderKind = kind.parse().map_err(|_| ValidationError::InvalidKind)?;
		let date = html_date::parse(&date).ok_or(ValidationError::InvalidDate)?;
		let time = html_time::parse(&time).ok_or(ValidationError::InvalidTime)?;
		if kind == OrderKind::Delivery && address.is_empty() {
			return Err(ValidationError::MissingAddress);
		}

		Ok(Submission::Order(NewOrder {
			name,
			phone,
			kind,
			date,
			time,
			allergens: trimmed(self.allergens),
			order,
			address,
			channel,
			notes: trimmed(self.notes),
		}))
	}
}
