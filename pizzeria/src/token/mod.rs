//! Staff session tokens.
//!
//! A token is `<issued_at>.<signature>`, where `issued_at` is the login time in Unix seconds and `signature` is
//! the lowercase hex HMAC-SHA256 of the `issued_at` field under the signing secret. Nothing is stored server-side:
//! a token stays valid until its window elapses or the secret changes, and logging out only removes the cookie.

use crate::timestamp::{self, UnixTime};

pub mod sign;
pub use sign::Key;

pub const VALIDITY_SECS: i64 = 7 * 24 * 60 * 60;

pub static DEFAULT_COOKIE_NAME: &str = "admin_session";

/// Why a token was not accepted. Callers only ever answer "unauthorized"; the distinction is for logs and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Rejection {
	#[error("malformed token")]
	Malformed,
	#[error("signature mismatch")]
	SignatureMismatch,
	#[error("token expired")]
	Expired,
	#[error("token issued in the future")]
	IssuedInFuture,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Session {
	issued_at: UnixTime,
}

impl Session {
	pub fn issued_at(&self) -> UnixTime {
		self.issued_at
	}

	pub fn expires_at(&self) -> UnixTime {
		self.issued_at.saturating_add(VALIDITY_SECS)
	}
}

#[derive(Clone, Debug)]
pub struct Authority {
	key: Key,
}

impl Authority {
	pub fn new(key: Key) -> Self {
		Self { key }
	}

	/// The caller must already have checked the staff password.
	pub fn issue(&self) -> String {
		self.issue_at(timestamp::now_unix())
	}

	pub fn issue_at(&self, now: UnixTime) -> String {
		let issued_at = now.to_string();
		let signature = self.key.sign(issued_at.as_bytes());
		format!("{issued_at}.{}", hex::encode(signature))
	}

	pub fn verify(&self, token: Option<&str>) -> bool {
		self.verify_at(token, timestamp::now_unix())
	}

	pub fn verify_at(&self, token: Option<&str>, now: UnixTime) -> bool {
		token.map_or(false, |token| self.check_at(token, now).is_ok())
	}

	pub fn check(&self, token: &str) -> Result<Session, Rejection> {
		self.check_at(token, timestamp::now_unix())
	}

	pub fn check_at(&self, token: &str, now: UnixTime) -> Result<Session, Rejection> {
		let (issued_at_field, signature_field) = token.split_once('.').ok_or(Rejection::Malformed)?;

		// the MAC covers the field as written, so only the canonical spelling may parse
		if issued_at_field.is_empty() || !issued_at_field.bytes().all(|b| b.is_ascii_digit()) {
			return Err(Rejection::Malformed);
		}
		let issued_at: UnixTime = issued_at_field.parse().map_err(|_| Rejection::Malformed)?;
		let signature = decode_signature(signature_field).ok_or(Rejection::Malformed)?;

		if !self.key.verify(issued_at_field.as_bytes(), &signature) {
			return Err(Rejection::SignatureMismatch);
		}

		let age = now.saturating_sub(issued_at);
		if age < 0 {
			Err(Rejection::IssuedInFuture)
		} else if age > VALIDITY_SECS {
			Err(Rejection::Expired)
		} else {
			Ok(Session { issued_at })
		}
	}
}

fn decode_signature(field: &str) -> Option<[u8; sign::SIGNATURE_LEN]> {
	// uppercase hex would decode to the same bytes; refuse it so that each token has exactly one spelling
	if field.len() != sign::SIGNATURE_LEN * 2
		|| !field
			.bytes()
			.all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
	{
		return None;
	}
	let mut signature = [0; sign::SIGNATURE_LEN];
	hex::decode_to_slice(field, &mut signature).ok()?;
	Some(signature)
}
