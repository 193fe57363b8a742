use time::{Date, OffsetDateTime, Time, UtcOffset};

/// Seconds since the Unix epoch.
pub type UnixTime = i64;

pub fn now_unix() -> UnixTime {
	OffsetDateTime::now_utc().unix_timestamp()
}

/// `YYYY-MM-DD`, as produced by `<input type="date">`
pub mod html_date {
	use time::format_description::FormatItem;
	use time::macros::format_description;
	use time::Date;

	pub static FORMAT: &[FormatItem<'static>] = format_description!("[year]-[month]-[day]");

	pub fn parse(raw: &str) -> Option<Date> {
		Date::parse(raw, FORMAT).ok()
	}

	pub fn format(date: Date) -> String {
		// the format only has numeric components, which cannot fail to format
		date.format(FORMAT).unwrap_or_default()
	}

	/// for `#[serde(serialize_with)]`
	pub fn serialize<S: serde::Serializer>(date: &Date, serializer: S) -> Result<S::Ok, S::Error> {
		serializer.serialize_str(&format(*date))
	}
}

/// `HH:mm`, as produced by `<input type="time">`
pub mod html_time {
	use time::format_description::FormatItem;
	use time::macros::format_description;
	use time::Time;

	pub static FORMAT: &[FormatItem<'static>] = format_description!("[hour]:[minute]");

	pub fn parse(raw: &str) -> Option<Time> {
		Time::parse(raw, FORMAT).ok()
	}

	pub fn format(time: Time) -> String {
		time.format(FORMAT).unwrap_or_default()
	}

	/// for `#[serde(serialize_with)]`
	pub fn serialize<S: serde::Serializer>(time: &Time, serializer: S) -> Result<S::Ok, S::Error> {
		serializer.serialize_str(&format(*time))
	}
}

/// `DD/MM/YYYY`, the way dates are written in the sheet and in messages to customers.
pub mod italian_date {
	use time::format_description::FormatItem;
	use time::macros::format_description;
	use time::Date;

	pub static FORMAT: &[FormatItem<'static>] = format_description!("[day]/[month]/[year]");

	pub fn parse(raw: &str) -> Option<Date> {
		Date::parse(raw, FORMAT).ok()
	}

	pub fn format(date: Date) -> String {
		date.format(FORMAT).unwrap_or_default()
	}
}

/// Parses an RFC 3339 timestamp and shifts it to `offset`.
pub fn parse_rfc3339(raw: &str, offset: UtcOffset) -> Option<(Date, Time)> {
	let parsed = OffsetDateTime::parse(raw, &time::format_description::well_known::Rfc3339).ok()?;
	let local = parsed.to_offset(offset);
	Some((local.date(), local.time()))
}

/// Renders an ISO date for humans, falling back to the raw text (or a dash when empty).
pub fn display_date(iso: &str) -> String {
	if iso.is_empty() {
		return "—".to_owned();
	}
	html_date::parse(iso).map_or_else(|| iso.to_owned(), italian_date::format)
}

#[cfg(test)]
mod test {
	use time::macros::{date, offset, time};

	use super::*;

	#[test]
	fn html_formats() {
		assert_eq!(html_date::parse("2024-05-01"), Some(date!(2024 - 05 - 01)));
		assert_eq!(html_date::parse("2024-13-01"), None);
		assert_eq!(html_date::parse("01/05/2024"), None);
		assert_eq!(html_time::parse("19:30"), Some(time!(19:30)));
		assert_eq!(html_time::parse("9:30"), None);
		assert_eq!(html_time::format(time!(07:05)), "07:05");
	}

	#[test]
	fn rfc3339_is_shifted() {
		assert_eq!(
			parse_rfc3339("2024-04-30T22:00:00.000Z", offset!(+2)),
			Some((date!(2024 - 05 - 01), time!(00:00)))
		);
		assert_eq!(parse_rfc3339("yesterday", offset!(UTC)), None);
	}

	#[test]
	fn display() {
		assert_eq!(display_date("2024-05-01"), "01/05/2024");
		assert_eq!(display_date("sometime"), "sometime");
		assert_eq!(display_date(""), "—");
	}
}
