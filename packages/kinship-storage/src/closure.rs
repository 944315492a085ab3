//! Cluster closure over contacts already loaded in memory.
//!
//! The closure of a root is the root plus every non-deleted contact whose `linked_id` chain reaches
//! it. Deleted contacts are skipped and do not connect their children to the root.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::models::Contact;

/// Walks the adjacency index of `contacts` breadth-first from `root_id`.
///
/// Returns an empty closure when the root is absent or deleted.
pub fn collect(root_id: i64, contacts: &[Contact]) -> Vec<Contact> {
	let mut by_id = HashMap::with_capacity(contacts.len());
	let mut children: HashMap<i64, Vec<i64>> = HashMap::new();

	for contact in contacts.iter().filter(|contact| !contact.is_deleted()) {
		by_id.insert(contact.id, contact);

		if let Some(parent) = contact.linked_id() {
			children.entry(parent).or_default().push(contact.id);
		}
	}

	let Some(root) = by_id.get(&root_id) else {
		return Vec::new();
	};
	let mut out = vec![(*root).clone()];
	let mut seen = HashSet::from([root_id]);
	let mut queue = VecDeque::from([root_id]);

	while let Some(parent) = queue.pop_front() {
		let Some(child_ids) = children.get(&parent) else {
			continue;
		};

		for child_id in child_ids {
			if !seen.insert(*child_id) {
				continue;
			}
			if let Some(child) = by_id.get(child_id) {
				out.push((*child).clone());
				queue.push_back(*child_id);
			}
		}
	}

	sort(&mut out);

	out
}

/// Orders closure members by creation time, then id.
pub fn sort(contacts: &mut [Contact]) {
	contacts.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
}

#[cfg(test)]
mod tests {
	use time::{Duration, OffsetDateTime, macros::datetime};

	use super::*;
	use crate::models::Link;

	fn at(minutes: i64) -> OffsetDateTime {
		datetime!(2023-04-01 00:00 UTC) + Duration::minutes(minutes)
	}

	fn contact(id: i64, link: Link, minutes: i64) -> Contact {
		Contact {
			id,
			email: Some(format!("c{id}@example.com")),
			phone_number: None,
			link,
			created_at: at(minutes),
			updated_at: at(minutes),
			deleted_at: None,
		}
	}

	fn ids(contacts: &[Contact]) -> Vec<i64> {
		contacts.iter().map(|contact| contact.id).collect()
	}

	#[test]
	fn collects_chains_in_creation_order() {
		let contacts = vec![
			contact(1, Link::Primary, 0),
			contact(2, Link::Secondary { linked_id: 1 }, 30),
			contact(3, Link::Secondary { linked_id: 2 }, 10),
			contact(4, Link::Primary, 5),
			contact(5, Link::Secondary { linked_id: 4 }, 6),
		];

		assert_eq!(ids(&collect(1, &contacts)), vec![1, 3, 2]);
		assert_eq!(ids(&collect(4, &contacts)), vec![4, 5]);
	}

	#[test]
	fn deleted_members_cut_reachability() {
		let mut deleted = contact(2, Link::Secondary { linked_id: 1 }, 1);

		deleted.deleted_at = Some(at(2));

		let contacts = vec![
			contact(1, Link::Primary, 0),
			deleted,
			contact(3, Link::Secondary { linked_id: 2 }, 3),
			contact(4, Link::Secondary { linked_id: 1 }, 4),
		];

		assert_eq!(ids(&collect(1, &contacts)), vec![1, 4]);
	}

	#[test]
	fn missing_or_deleted_root_yields_nothing() {
		let mut root = contact(1, Link::Primary, 0);

		root.deleted_at = Some(at(1));

		assert!(collect(1, &[root]).is_empty());
		assert!(collect(42, &[contact(1, Link::Primary, 0)]).is_empty());
	}

	#[test]
	fn equal_timestamps_order_by_id() {
		let contacts = vec![
			contact(7, Link::Primary, 0),
			contact(9, Link::Secondary { linked_id: 7 }, 5),
			contact(8, Link::Secondary { linked_id: 7 }, 5),
		];

		assert_eq!(ids(&collect(7, &contacts)), vec![7, 8, 9]);
	}

	#[test]
	fn cycles_terminate() {
		let contacts = vec![
			contact(1, Link::Primary, 0),
			contact(2, Link::Secondary { linked_id: 3 }, 1),
			contact(3, Link::Secondary { linked_id: 2 }, 2),
			contact(4, Link::Secondary { linked_id: 1 }, 3),
		];

		assert_eq!(ids(&collect(1, &contacts)), vec![1, 4]);
	}
}
