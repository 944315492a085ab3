use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use kinship_storage::models::Contact;

/// Consolidated view of one contact cluster.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
	pub primary_contact_id: i64,
	/// Unique emails, the primary's first, the rest in closure order.
	pub emails: Vec<String>,
	/// Unique phone numbers, ordered like `emails`.
	pub phone_numbers: Vec<String>,
	/// Every member except the primary, in closure order.
	pub secondary_contact_ids: Vec<i64>,
}
impl Identity {
	/// Identity of a contact that was just created as a fresh primary.
	pub fn from_primary(contact: &Contact) -> Self {
		Self {
			primary_contact_id: contact.id,
			emails: contact.email.iter().cloned().collect(),
			phone_numbers: contact.phone_number.iter().cloned().collect(),
			secondary_contact_ids: Vec::new(),
		}
	}

	/// Aggregates a materialized closure. `members` must be in closure order.
	pub fn build(primary_id: i64, members: &[Contact]) -> Self {
		let primary = members.iter().find(|contact| contact.id == primary_id);
		let mut emails = UniqueValues::default();
		let mut phone_numbers = UniqueValues::default();
		let mut secondary_contact_ids = Vec::with_capacity(members.len().saturating_sub(1));

		if let Some(primary) = primary {
			emails.push(primary.email.as_deref());
			phone_numbers.push(primary.phone_number.as_deref());
		}

		for contact in members {
			emails.push(contact.email.as_deref());
			phone_numbers.push(contact.phone_number.as_deref());

			if contact.id != primary_id {
				secondary_contact_ids.push(contact.id);
			}
		}

		Self {
			primary_contact_id: primary_id,
			emails: emails.values,
			phone_numbers: phone_numbers.values,
			secondary_contact_ids,
		}
	}
}

#[derive(Default)]
struct UniqueValues {
	values: Vec<String>,
	seen: HashSet<String>,
}
impl UniqueValues {
	fn push(&mut self, value: Option<&str>) {
		let Some(value) = value else {
			return;
		};

		if self.seen.insert(value.to_string()) {
			self.values.push(value.to_string());
		}
	}
}
