use std::collections::HashSet;

use kinship_storage::{
	Result,
	models::{Contact, NewContact},
	store::ContactTx,
};

use crate::Identifiers;

/// Whether the submission carries an email or a phone number absent from every cluster member.
pub fn is_novel(members: &[Contact], ids: &Identifiers) -> bool {
	let emails =
		members.iter().filter_map(|contact| contact.email.as_deref()).collect::<HashSet<_>>();
	let phone_numbers = members
		.iter()
		.filter_map(|contact| contact.phone_number.as_deref())
		.collect::<HashSet<_>>();
	let new_email = ids.email.as_deref().is_some_and(|email| !emails.contains(email));
	let new_phone_number =
		ids.phone_number.as_deref().is_some_and(|phone| !phone_numbers.contains(phone));

	new_email || new_phone_number
}

/// Records the submission as one secondary of `primary_id` when it is novel.
///
/// The new contact carries both submitted identifiers, not only the unseen one.
pub async fn record_if_novel(
	tx: &mut dyn ContactTx,
	members: &[Contact],
	ids: &Identifiers,
	primary_id: i64,
) -> Result<Option<Contact>> {
	if !is_novel(members, ids) {
		return Ok(None);
	}

	let contact = tx
		.insert(&NewContact::secondary(ids.email.clone(), ids.phone_number.clone(), primary_id))
		.await?;

	tracing::info!(
		primary_contact_id = primary_id,
		contact_id = contact.id,
		"Recorded new identifiers as secondary contact."
	);

	Ok(Some(contact))
}
