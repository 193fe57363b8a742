use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq as _;

type HmacSha256 = Hmac<Sha256>;

pub const SIGNATURE_LEN: usize = 32;

/// A prepared HMAC-SHA256 key. Cloning it is cheap, so every signature starts from a copy of the keyed state.
#[derive(Clone)]
pub struct Key(HmacSha256);

impl std::fmt::Debug for Key {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str("Key(..)")
	}
}

impl Key {
	/// `None` for an empty secret.
	pub fn new(secret: &[u8]) -> Option<Self> {
		if secret.is_empty() {
			return None;
		}
		HmacSha256::new_from_slice(secret).ok().map(Self)
	}

	pub fn sign(&self, message: &[u8]) -> [u8; SIGNATURE_LEN] {
		let mut mac = self.0.clone();
		mac.update(message);
		let mut signature = [0; SIGNATURE_LEN];
		signature.copy_from_slice(&mac.finalize().into_bytes());
		signature
	}

	/// Compares without an early exit, so the time taken does not depend on where the first mismatch is.
	pub fn verify(&self, message: &[u8], presented: &[u8]) -> bool {
		bool::from(self.sign(message)[..].ct_eq(presented))
	}
}
