use kinship_storage::{
	Result,
	models::{Contact, Link},
	store::ContactTx,
};

use crate::selector::Selection;

/// Demotes every losing primary under the canonical one and returns the merged closure.
///
/// With `flatten` set, every member of the merged cluster ends up linked directly to the
/// canonical primary. Without it, former children of a losing primary keep pointing at it.
pub async fn merge(
	tx: &mut dyn ContactTx,
	selection: &Selection,
	flatten: bool,
) -> Result<Vec<Contact>> {
	let canonical_id = selection.canonical.id;

	for losing in &selection.losing {
		tx.update_precedence(losing.id, Link::Secondary { linked_id: canonical_id }).await?;

		let relinked = if flatten { tx.relink_children(losing.id, canonical_id).await? } else { 0 };

		tracing::info!(
			primary_contact_id = canonical_id,
			demoted_contact_id = losing.id,
			relinked,
			"Merged contact cluster."
		);
	}

	let mut members = tx.closure_from(canonical_id).await?;

	if flatten {
		flatten_members(tx, canonical_id, &mut members).await?;
	}

	Ok(members)
}

// Catches chains deeper than one level left behind by earlier unflattened merges.
async fn flatten_members(
	tx: &mut dyn ContactTx,
	canonical_id: i64,
	members: &mut [Contact],
) -> Result<()> {
	let direct = Link::Secondary { linked_id: canonical_id };

	for member in members.iter_mut() {
		if member.id == canonical_id || member.link == direct {
			continue;
		}

		tx.update_precedence(member.id, direct).await?;

		tracing::debug!(
			primary_contact_id = canonical_id,
			contact_id = member.id,
			"Relinked nested secondary contact."
		);

		member.link = direct;
	}

	Ok(())
}
