use kinship_storage::{Error, Result, models::Contact};

/// Outcome of ordering the candidate primaries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
	pub canonical: Contact,
	/// Remaining candidates, oldest first. Each one is demoted under `canonical`.
	pub losing: Vec<Contact>,
}
impl Selection {
	pub fn needs_merge(&self) -> bool {
		!self.losing.is_empty()
	}

	pub fn candidate_ids(&self) -> Vec<i64> {
		std::iter::once(&self.canonical).chain(&self.losing).map(|contact| contact.id).collect()
	}

	/// Checks that no candidate changed between resolution and row locking.
	pub fn ensure_unchanged(&self, locked: &[Contact]) -> Result<()> {
		for candidate in std::iter::once(&self.canonical).chain(&self.losing) {
			let current = locked.iter().find(|contact| contact.id == candidate.id);

			match current {
				Some(current) if current.link == candidate.link => {},
				Some(_) =>
					return Err(Error::Conflict(format!(
						"Contact {} was relinked concurrently.",
						candidate.id
					))),
				None =>
					return Err(Error::Conflict(format!(
						"Contact {} was removed concurrently.",
						candidate.id
					))),
			}
		}

		Ok(())
	}
}

/// Orders candidates by creation time, then id. The first one is canonical.
///
/// Returns `None` for an empty candidate set.
pub fn select(mut candidates: Vec<Contact>) -> Option<Selection> {
	candidates.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
	candidates.dedup_by_key(|contact| contact.id);

	let mut ordered = candidates.into_iter();
	let canonical = ordered.next()?;

	Some(Selection { canonical, losing: ordered.collect() })
}
