//! The contact store contract consumed by the identify engine.
//!
//! Every read and write of one identify attempt runs inside a single [`ContactTx`]. Dropping a
//! transaction without calling [`ContactTx::commit`] discards all of its writes.

use std::{future::Future, pin::Pin};

use crate::{
	Result,
	models::{Contact, Link, NewContact},
};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub trait ContactStore
where
	Self: Send + Sync,
{
	fn begin(&self) -> BoxFuture<'_, Result<Box<dyn ContactTx>>>;
}

pub trait ContactTx
where
	Self: Send,
{
	/// Blocks until this transaction holds every key. Keys stay held until commit or rollback.
	fn lock_keys<'a>(&'a mut self, keys: &'a [i64]) -> BoxFuture<'a, Result<()>>;

	/// Non-deleted contacts whose email or phone number equals the given value.
	fn find_by_identifiers<'a>(
		&'a mut self,
		email: Option<&'a str>,
		phone_number: Option<&'a str>,
	) -> BoxFuture<'a, Result<Vec<Contact>>>;

	/// Deleted contacts are reported as absent.
	fn find_by_id(&mut self, id: i64) -> BoxFuture<'_, Result<Option<Contact>>>;

	/// Row-locks the given contacts and returns their current non-deleted state.
	fn lock_contacts<'a>(&'a mut self, ids: &'a [i64]) -> BoxFuture<'a, Result<Vec<Contact>>>;

	fn insert<'a>(&'a mut self, contact: &'a NewContact) -> BoxFuture<'a, Result<Contact>>;

	fn update_precedence(&mut self, id: i64, link: Link) -> BoxFuture<'_, Result<()>>;

	fn relink_children(&mut self, from_id: i64, to_id: i64) -> BoxFuture<'_, Result<u64>>;

	/// The root plus every non-deleted contact whose link chain reaches it, oldest first.
	fn closure_from(&mut self, root_id: i64) -> BoxFuture<'_, Result<Vec<Contact>>>;

	fn commit(self: Box<Self>) -> BoxFuture<'static, Result<()>>;
}
