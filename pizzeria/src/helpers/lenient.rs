//! Deserializers that take whatever scalar arrives and keep its text.
//!
//! Values from the environment are parsed before they reach us, so a numeric password arrives as a number, and
//! JSON clients happily send phone numbers as numbers too.

use serde::{Deserialize, Deserializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
	String(String),
	Signed(i64),
	Unsigned(u64),
	Float(f64),
	Bool(bool),
}

impl From<Scalar> for String {
	fn from(scalar: Scalar) -> Self {
		match scalar {
			Scalar::String(string) => string,
			Scalar::Signed(number) => number.to_string(),
			Scalar::Unsigned(number) => number.to_string(),
			Scalar::Float(number) => number.to_string(),
			Scalar::Bool(boolean) => boolean.to_string(),
		}
	}
}

/// for `#[serde(deserialize_with)]` on `Option<String>` fields
pub fn string<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
	Ok(Option::<Scalar>::deserialize(d)?.map(String::from))
}

#[cfg(test)]
mod test {
	#[derive(serde::Deserialize, Debug, PartialEq)]
	struct Holder {
		#[serde(default, deserialize_with = "super::string")]
		value: Option<String>,
	}

	fn parse(json: &str) -> Option<String> {
		serde_json::from_str::<Holder>(json).unwrap().value
	}

	#[test]
	fn scalars_become_text() {
		assert_eq!(parse(r#"{"value": "3271234567"}"#).as_deref(), Some("3271234567"));
		assert_eq!(parse(r#"{"value": 3271234567}"#).as_deref(), Some("3271234567"));
		assert_eq!(parse(r#"{"value": -4}"#).as_deref(), Some("-4"));
		assert_eq!(parse(r#"{"value": true}"#).as_deref(), Some("true"));
		assert_eq!(parse(r#"{"value": null}"#), None);
		assert_eq!(parse(r#"{}"#), None);
	}

	#[test]
	fn objects_are_refused() {
		assert!(serde_json::from_str::<Holder>(r#"{"value": {"a": 1}}"#).is_err());
	}
}
