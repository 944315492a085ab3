use sqlx::{Postgres, Transaction};

use crate::{
	Result,
	db::Db,
	models::{Contact, Link, NewContact},
	queries,
	store::{BoxFuture, ContactStore, ContactTx},
};

pub struct PgContactTx {
	tx: Transaction<'static, Postgres>,
}

impl ContactStore for Db {
	fn begin(&self) -> BoxFuture<'_, Result<Box<dyn ContactTx>>> {
		Box::pin(async move {
			let tx = self.pool.begin().await?;

			Ok(Box::new(PgContactTx { tx }) as Box<dyn ContactTx>)
		})
	}
}

impl ContactTx for PgContactTx {
	fn lock_keys<'a>(&'a mut self, keys: &'a [i64]) -> BoxFuture<'a, Result<()>> {
		Box::pin(queries::advisory_xact_lock(&mut *self.tx, keys))
	}

	fn find_by_identifiers<'a>(
		&'a mut self,
		email: Option<&'a str>,
		phone_number: Option<&'a str>,
	) -> BoxFuture<'a, Result<Vec<Contact>>> {
		Box::pin(queries::find_by_identifiers(&mut *self.tx, email, phone_number))
	}

	fn find_by_id(&mut self, id: i64) -> BoxFuture<'_, Result<Option<Contact>>> {
		Box::pin(queries::find_by_id(&mut *self.tx, id))
	}

	fn lock_contacts<'a>(&'a mut self, ids: &'a [i64]) -> BoxFuture<'a, Result<Vec<Contact>>> {
		Box::pin(queries::lock_contacts(&mut *self.tx, ids))
	}

	fn insert<'a>(&'a mut self, contact: &'a NewContact) -> BoxFuture<'a, Result<Contact>> {
		Box::pin(queries::insert_contact(&mut *self.tx, contact))
	}

	fn update_precedence(&mut self, id: i64, link: Link) -> BoxFuture<'_, Result<()>> {
		Box::pin(queries::update_precedence(&mut *self.tx, id, link))
	}

	fn relink_children(&mut self, from_id: i64, to_id: i64) -> BoxFuture<'_, Result<u64>> {
		Box::pin(queries::relink_children(&mut *self.tx, from_id, to_id))
	}

	fn closure_from(&mut self, root_id: i64) -> BoxFuture<'_, Result<Vec<Contact>>> {
		Box::pin(queries::closure_from(&mut *self.tx, root_id))
	}

	fn commit(self: Box<Self>) -> BoxFuture<'static, Result<()>> {
		Box::pin(async move {
			self.tx.commit().await?;

			Ok(())
		})
	}
}
