//! In-memory contact store.
//!
//! Transactions are fully serialized: `begin` waits for the previous transaction to finish, works
//! on a private copy of the data, and publishes it only on commit.

use std::{
	collections::{BTreeMap, VecDeque},
	sync::{
		Arc, Mutex as StdMutex,
		atomic::{AtomicUsize, Ordering},
	},
};

use time::{Duration, OffsetDateTime, macros::datetime};
use tokio::sync::{Mutex, OwnedMutexGuard};

use kinship_storage::{
	Error, Result, closure,
	models::{Contact, Link, NewContact},
	store::{BoxFuture, ContactStore, ContactTx},
};

const EPOCH: OffsetDateTime = datetime!(2023-04-01 00:00 UTC);

/// Failure injected into the next commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
	/// A transient serialization conflict.
	Conflict,
	/// A non-retryable store failure.
	Unavailable,
}

#[derive(Debug, Clone, Default)]
struct State {
	contacts: BTreeMap<i64, Contact>,
	next_id: i64,
	ticks: i64,
}
impl State {
	fn now(&mut self) -> OffsetDateTime {
		self.ticks += 1;

		EPOCH + Duration::seconds(self.ticks)
	}

	fn store(&mut self, contact: &NewContact, created_at: OffsetDateTime) -> Result<Contact> {
		contact.validate()?;

		self.next_id += 1;

		let stored = Contact {
			id: self.next_id,
			email: contact.email.clone(),
			phone_number: contact.phone_number.clone(),
			link: contact.link,
			created_at,
			updated_at: created_at,
			deleted_at: None,
		};

		self.contacts.insert(stored.id, stored.clone());

		Ok(stored)
	}

	fn relink(&mut self, id: i64, link: Link, now: OffsetDateTime) {
		if let Some(contact) = self.contacts.get_mut(&id) {
			contact.link = link;
			contact.updated_at = now;
		}
	}

	fn live(&self, id: i64) -> Option<&Contact> {
		self.contacts.get(&id).filter(|contact| !contact.is_deleted())
	}
}

#[derive(Clone, Default)]
pub struct MemoryStore {
	state: Arc<Mutex<State>>,
	failures: Arc<StdMutex<VecDeque<FailureKind>>>,
	interleaved: Arc<StdMutex<VecDeque<(i64, Link)>>>,
	begins: Arc<AtomicUsize>,
	commits: Arc<AtomicUsize>,
}
impl MemoryStore {
	pub fn new() -> Self {
		Self::default()
	}

	/// Stores a contact directly, outside any identify call.
	pub async fn seed(&self, contact: NewContact) -> Contact {
		let mut state = self.state.lock().await;
		let created_at = state.now();

		state.store(&contact, created_at).expect("Seeded contact must carry an identifier.")
	}

	/// Stores a contact with an explicit creation time.
	pub async fn seed_at(&self, contact: NewContact, created_at: OffsetDateTime) -> Contact {
		let mut state = self.state.lock().await;

		state.store(&contact, created_at).expect("Seeded contact must carry an identifier.")
	}

	pub async fn soft_delete(&self, id: i64) {
		let mut state = self.state.lock().await;
		let now = state.now();

		if let Some(contact) = state.contacts.get_mut(&id) {
			contact.deleted_at = Some(now);
		}
	}

	/// Every stored contact, deleted ones included, ordered by id.
	pub async fn contacts(&self) -> Vec<Contact> {
		self.state.lock().await.contacts.values().cloned().collect()
	}

	pub async fn contact(&self, id: i64) -> Option<Contact> {
		self.state.lock().await.contacts.get(&id).cloned()
	}

	pub async fn len(&self) -> usize {
		self.state.lock().await.contacts.len()
	}

	pub async fn is_empty(&self) -> bool {
		self.len().await == 0
	}

	/// Makes the next commits fail in order, one failure per commit.
	pub fn fail_commits(&self, kinds: impl IntoIterator<Item = FailureKind>) {
		self.failures.lock().unwrap_or_else(|err| err.into_inner()).extend(kinds);
	}

	/// Commits a link change right before the next row lock, as if a concurrent transaction had
	/// merged the contact between resolution and locking.
	pub fn relink_before_row_lock(&self, id: i64, link: Link) {
		self.interleaved.lock().unwrap_or_else(|err| err.into_inner()).push_back((id, link));
	}

	pub fn begins(&self) -> usize {
		self.begins.load(Ordering::SeqCst)
	}

	pub fn commits(&self) -> usize {
		self.commits.load(Ordering::SeqCst)
	}

	fn next_failure(&self) -> Option<FailureKind> {
		self.failures.lock().unwrap_or_else(|err| err.into_inner()).pop_front()
	}

	fn next_interleaved(&self) -> Option<(i64, Link)> {
		self.interleaved.lock().unwrap_or_else(|err| err.into_inner()).pop_front()
	}
}

impl ContactStore for MemoryStore {
	fn begin(&self) -> BoxFuture<'_, Result<Box<dyn ContactTx>>> {
		Box::pin(async move {
			let guard = self.state.clone().lock_owned().await;
			let working = guard.clone();

			self.begins.fetch_add(1, Ordering::SeqCst);

			Ok(Box::new(MemoryTx { guard, working, store: self.clone() }) as Box<dyn ContactTx>)
		})
	}
}

struct MemoryTx {
	guard: OwnedMutexGuard<State>,
	working: State,
	store: MemoryStore,
}

impl ContactTx for MemoryTx {
	fn lock_keys<'a>(&'a mut self, _keys: &'a [i64]) -> BoxFuture<'a, Result<()>> {
		Box::pin(async { Ok(()) })
	}

	fn find_by_identifiers<'a>(
		&'a mut self,
		email: Option<&'a str>,
		phone_number: Option<&'a str>,
	) -> BoxFuture<'a, Result<Vec<Contact>>> {
		let mut found = self
			.working
			.contacts
			.values()
			.filter(|contact| !contact.is_deleted())
			.filter(|contact| {
				let email_match = email.is_some() && contact.email.as_deref() == email;
				let phone_match =
					phone_number.is_some() && contact.phone_number.as_deref() == phone_number;

				email_match || phone_match
			})
			.cloned()
			.collect::<Vec<_>>();

		closure::sort(&mut found);

		Box::pin(async move { Ok(found) })
	}

	fn find_by_id(&mut self, id: i64) -> BoxFuture<'_, Result<Option<Contact>>> {
		let found = self.working.live(id).cloned();

		Box::pin(async move { Ok(found) })
	}

	fn lock_contacts<'a>(&'a mut self, ids: &'a [i64]) -> BoxFuture<'a, Result<Vec<Contact>>> {
		if let Some((id, link)) = self.store.next_interleaved() {
			let now = self.working.now();

			self.guard.relink(id, link, now);
			self.working.relink(id, link, now);
		}

		let mut found =
			ids.iter().filter_map(|id| self.working.live(*id).cloned()).collect::<Vec<_>>();

		found.sort_by_key(|contact| contact.id);
		found.dedup_by_key(|contact| contact.id);

		Box::pin(async move { Ok(found) })
	}

	fn insert<'a>(&'a mut self, contact: &'a NewContact) -> BoxFuture<'a, Result<Contact>> {
		let created_at = self.working.now();
		let result = self.working.store(contact, created_at);

		Box::pin(async move { result })
	}

	fn update_precedence(&mut self, id: i64, link: Link) -> BoxFuture<'_, Result<()>> {
		let now = self.working.now();
		let result = match self.working.contacts.get_mut(&id) {
			Some(contact) if !contact.is_deleted() => {
				contact.link = link;
				contact.updated_at = now;

				Ok(())
			},
			_ => Err(Error::NotFound(format!("Contact {id}."))),
		};

		Box::pin(async move { result })
	}

	fn relink_children(&mut self, from_id: i64, to_id: i64) -> BoxFuture<'_, Result<u64>> {
		let now = self.working.now();
		let mut moved = 0;

		for contact in self.working.contacts.values_mut() {
			if contact.is_deleted() || contact.link != (Link::Secondary { linked_id: from_id }) {
				continue;
			}

			contact.link = Link::Secondary { linked_id: to_id };
			contact.updated_at = now;
			moved += 1;
		}

		Box::pin(async move { Ok(moved) })
	}

	fn closure_from(&mut self, root_id: i64) -> BoxFuture<'_, Result<Vec<Contact>>> {
		let contacts = self.working.contacts.values().cloned().collect::<Vec<_>>();
		let members = closure::collect(root_id, &contacts);

		Box::pin(async move { Ok(members) })
	}

	fn commit(self: Box<Self>) -> BoxFuture<'static, Result<()>> {
		let MemoryTx { mut guard, working, store } = *self;

		Box::pin(async move {
			match store.next_failure() {
				Some(FailureKind::Conflict) =>
					return Err(Error::Conflict("Injected serialization conflict.".to_string())),
				Some(FailureKind::Unavailable) =>
					return Err(Error::Sqlx(sqlx::Error::PoolTimedOut)),
				None => {},
			}

			*guard = working;

			store.commits.fetch_add(1, Ordering::SeqCst);

			Ok(())
		})
	}
}
