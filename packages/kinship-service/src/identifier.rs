use serde::{Deserialize, Serialize};
use serde_json::Number;

use crate::{Error, Result};

/// Phone numbers arrive either as JSON strings or as bare JSON numbers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PhoneNumberInput {
	Text(String),
	Number(Number),
}
impl PhoneNumberInput {
	fn into_text(self) -> String {
		match self {
			Self::Text(text) => text,
			Self::Number(number) => number_text(&number),
		}
	}
}
impl From<&str> for PhoneNumberInput {
	fn from(text: &str) -> Self {
		Self::Text(text.to_string())
	}
}
impl From<i64> for PhoneNumberInput {
	fn from(number: i64) -> Self {
		Self::Number(number.into())
	}
}

/// Normalized identifiers of one submission. At least one is present.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Identifiers {
	pub email: Option<String>,
	pub phone_number: Option<String>,
}
impl Identifiers {
	/// Trims both values, drops empty ones, and rejects a submission with neither.
	pub fn normalize(
		email: Option<String>,
		phone_number: Option<PhoneNumberInput>,
	) -> Result<Self> {
		let email = email.and_then(non_empty);
		let phone_number = phone_number.map(PhoneNumberInput::into_text).and_then(non_empty);

		if email.is_none() && phone_number.is_none() {
			return Err(Error::InvalidRequest {
				message: "Either email or phoneNumber must be provided.".to_string(),
			});
		}

		Ok(Self { email, phone_number })
	}

	/// Serialization keys for the submitted identifiers.
	///
	/// Two submissions that share an identifier share a key, so their transactions run one after
	/// the other.
	pub fn lock_keys(&self) -> Vec<i64> {
		let mut keys = Vec::with_capacity(2);

		if let Some(email) = self.email.as_deref() {
			keys.push(lock_key("email", email));
		}
		if let Some(phone_number) = self.phone_number.as_deref() {
			keys.push(lock_key("phone", phone_number));
		}

		keys
	}
}

fn non_empty(value: String) -> Option<String> {
	let trimmed = value.trim();

	if trimmed.is_empty() {
		return None;
	}
	if trimmed.len() == value.len() {
		return Some(value);
	}

	Some(trimmed.to_string())
}

// Whole floats below 1e21 print without a fraction or exponent, like a JavaScript number would.
fn number_text(number: &Number) -> String {
	if number.is_f64()
		&& let Some(value) = number.as_f64()
		&& value.fract() == 0.0
		&& value.abs() < 1e21
	{
		return format!("{value:.0}");
	}

	number.to_string()
}

fn lock_key(kind: &str, value: &str) -> i64 {
	let mut hasher = blake3::Hasher::new();

	hasher.update(kind.as_bytes());
	hasher.update(b":");
	hasher.update(value.as_bytes());

	let digest = hasher.finalize();
	let mut prefix = [0_u8; 8];

	prefix.copy_from_slice(&digest.as_bytes()[..8]);

	i64::from_be_bytes(prefix)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn blank_values_count_as_absent() {
		let ids = Identifiers::normalize(Some("  ".to_string()), Some("123456".into())).unwrap();

		assert_eq!(ids.email, None);
		assert_eq!(ids.phone_number.as_deref(), Some("123456"));

		let err = Identifiers::normalize(Some(String::new()), Some(" ".into())).unwrap_err();

		assert!(matches!(err, Error::InvalidRequest { .. }));
	}

	#[test]
	fn neither_identifier_is_rejected() {
		let err = Identifiers::normalize(None, None).unwrap_err();

		assert_eq!(
			err.to_string(),
			"Invalid request: Either email or phoneNumber must be provided."
		);
	}

	#[test]
	fn integer_phone_numbers_become_text() {
		let ids = Identifiers::normalize(None, Some(717171.into())).unwrap();

		assert_eq!(ids.phone_number.as_deref(), Some("717171"));
	}

	#[test]
	fn out_of_range_and_float_phone_numbers_become_text() {
		for (raw, expected) in [
			("18446744073709551615", "18446744073709551615"),
			("100000000000000000000", "100000000000000000000"),
			("123456.0", "123456"),
			("1.5", "1.5"),
		] {
			let input: PhoneNumberInput = serde_json::from_str(raw).unwrap();
			let ids = Identifiers::normalize(None, Some(input)).unwrap();

			assert_eq!(ids.phone_number.as_deref(), Some(expected), "Raw input {raw}.");
		}
	}

	#[test]
	fn values_are_trimmed_but_not_case_folded() {
		let ids =
			Identifiers::normalize(Some(" Lorraine@HillValley.edu ".to_string()), None).unwrap();

		assert_eq!(ids.email.as_deref(), Some("Lorraine@HillValley.edu"));
	}

	#[test]
	fn lock_keys_separate_identifier_kinds() {
		let ids = Identifiers {
			email: Some("123456".to_string()),
			phone_number: Some("123456".to_string()),
		};
		let keys = ids.lock_keys();

		assert_eq!(keys.len(), 2);
		assert_ne!(keys[0], keys[1]);
	}

	#[test]
	fn lock_keys_are_stable() {
		let ids =
			Identifiers { email: Some("mcfly@hillvalley.edu".to_string()), phone_number: None };

		assert_eq!(ids.lock_keys(), ids.clone().lock_keys());
		assert_eq!(ids.lock_keys().len(), 1);
	}

	#[test]
	fn phone_number_input_accepts_strings_and_integers() {
		let text: PhoneNumberInput = serde_json::from_str("\"123456\"").unwrap();
		let number: PhoneNumberInput = serde_json::from_str("123456").unwrap();

		assert_eq!(text, PhoneNumberInput::Text("123456".to_string()));
		assert_eq!(number, PhoneNumberInput::from(123456));
	}
}
