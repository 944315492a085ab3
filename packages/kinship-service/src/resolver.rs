use std::collections::HashSet;

use kinship_storage::{Result, models::Contact, store::ContactTx};

use crate::Identifiers;

/// Roots of every cluster the identifiers touch, deduplicated by id, in match order.
pub async fn resolve_candidate_primaries(
	tx: &mut dyn ContactTx,
	ids: &Identifiers,
) -> Result<Vec<Contact>> {
	let matches =
		tx.find_by_identifiers(ids.email.as_deref(), ids.phone_number.as_deref()).await?;
	let mut seen = HashSet::with_capacity(matches.len());
	let mut roots = Vec::new();

	for contact in matches {
		let root = resolve_root(tx, contact).await?;

		if seen.insert(root.id) {
			roots.push(root);
		}
	}

	Ok(roots)
}

/// Follows `linked_id` until a primary.
///
/// A link that does not resolve to a live contact ends the walk at the last contact reached, which
/// then acts as the root. A revisited id ends it the same way.
pub async fn resolve_root(tx: &mut dyn ContactTx, contact: Contact) -> Result<Contact> {
	let mut visited = HashSet::from([contact.id]);
	let mut current = contact;

	while let Some(parent_id) = current.linked_id() {
		if !visited.insert(parent_id) {
			tracing::warn!(contact_id = current.id, parent_id, "Contact link cycle detected.");

			break;
		}

		let Some(parent) = tx.find_by_id(parent_id).await? else {
			tracing::warn!(
				contact_id = current.id,
				parent_id,
				"Contact links to a missing parent."
			);

			break;
		};

		current = parent;
	}

	Ok(current)
}
