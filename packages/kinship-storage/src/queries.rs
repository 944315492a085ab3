use std::collections::HashSet;

use sqlx::{Executor, PgConnection, Postgres};

use crate::{
	Error, Result, closure,
	models::{self, Contact, ContactRow, Link, NewContact},
};

pub async fn find_by_identifiers<'e, E>(
	executor: E,
	email: Option<&str>,
	phone_number: Option<&str>,
) -> Result<Vec<Contact>>
where
	E: Executor<'e, Database = Postgres>,
{
	if email.is_none() && phone_number.is_none() {
		return Ok(Vec::new());
	}

	let rows: Vec<ContactRow> = sqlx::query_as(
		"\
SELECT *
FROM contacts
WHERE deleted_at IS NULL
	AND (email = $1 OR phone_number = $2)
ORDER BY created_at, id",
	)
	.bind(email)
	.bind(phone_number)
	.fetch_all(executor)
	.await?;

	models::rows_into_contacts(rows)
}

pub async fn find_by_id<'e, E>(executor: E, id: i64) -> Result<Option<Contact>>
where
	E: Executor<'e, Database = Postgres>,
{
	let row: Option<ContactRow> =
		sqlx::query_as("SELECT * FROM contacts WHERE id = $1 AND deleted_at IS NULL")
			.bind(id)
			.fetch_optional(executor)
			.await?;

	row.map(Contact::try_from).transpose()
}

/// Row-locks the given contacts until the surrounding transaction ends.
pub async fn lock_contacts<'e, E>(executor: E, ids: &[i64]) -> Result<Vec<Contact>>
where
	E: Executor<'e, Database = Postgres>,
{
	if ids.is_empty() {
		return Ok(Vec::new());
	}

	let rows: Vec<ContactRow> = sqlx::query_as(
		"\
SELECT *
FROM contacts
WHERE id = ANY($1) AND deleted_at IS NULL
ORDER BY id
FOR UPDATE",
	)
	.bind(ids)
	.fetch_all(executor)
	.await?;

	models::rows_into_contacts(rows)
}

pub async fn insert_contact<'e, E>(executor: E, contact: &NewContact) -> Result<Contact>
where
	E: Executor<'e, Database = Postgres>,
{
	contact.validate()?;

	let row: ContactRow = sqlx::query_as(
		"\
INSERT INTO contacts (email, phone_number, linked_id, link_precedence)
VALUES ($1, $2, $3, $4)
RETURNING *",
	)
	.bind(contact.email.as_deref())
	.bind(contact.phone_number.as_deref())
	.bind(contact.link.linked_id())
	.bind(contact.link.precedence().as_str())
	.fetch_one(executor)
	.await?;

	Contact::try_from(row)
}

pub async fn update_precedence<'e, E>(executor: E, id: i64, link: Link) -> Result<()>
where
	E: Executor<'e, Database = Postgres>,
{
	let result = sqlx::query(
		"\
UPDATE contacts
SET
	link_precedence = $1,
	linked_id = $2,
	updated_at = clock_timestamp()
WHERE id = $3 AND deleted_at IS NULL",
	)
	.bind(link.precedence().as_str())
	.bind(link.linked_id())
	.bind(id)
	.execute(executor)
	.await?;

	if result.rows_affected() == 0 {
		return Err(Error::NotFound(format!("Contact {id}.")));
	}

	Ok(())
}

/// Repoints every live secondary linked to `from_id` at `to_id`. Returns the number of rows moved.
pub async fn relink_children<'e, E>(executor: E, from_id: i64, to_id: i64) -> Result<u64>
where
	E: Executor<'e, Database = Postgres>,
{
	let result = sqlx::query(
		"\
UPDATE contacts
SET
	linked_id = $2,
	updated_at = clock_timestamp()
WHERE linked_id = $1
	AND link_precedence = 'secondary'
	AND deleted_at IS NULL",
	)
	.bind(from_id)
	.bind(to_id)
	.execute(executor)
	.await?;

	Ok(result.rows_affected())
}

/// Breadth-first closure walk, one query per depth level.
pub async fn closure_from(conn: &mut PgConnection, root_id: i64) -> Result<Vec<Contact>> {
	let Some(root) = find_by_id(&mut *conn, root_id).await? else {
		return Ok(Vec::new());
	};
	let mut seen = HashSet::from([root.id]);
	let mut frontier = vec![root.id];
	let mut out = vec![root];

	while !frontier.is_empty() {
		let rows: Vec<ContactRow> = sqlx::query_as(
			"\
SELECT *
FROM contacts
WHERE linked_id = ANY($1) AND deleted_at IS NULL",
		)
		.bind(frontier.as_slice())
		.fetch_all(&mut *conn)
		.await?;

		frontier.clear();

		for contact in models::rows_into_contacts(rows)? {
			if seen.insert(contact.id) {
				frontier.push(contact.id);
				out.push(contact);
			}
		}
	}

	closure::sort(&mut out);

	Ok(out)
}

/// Takes transaction-scoped advisory locks in ascending key order.
pub async fn advisory_xact_lock(conn: &mut PgConnection, keys: &[i64]) -> Result<()> {
	let mut keys = keys.to_vec();

	keys.sort_unstable();
	keys.dedup();

	for key in keys {
		sqlx::query("SELECT pg_advisory_xact_lock($1)").bind(key).execute(&mut *conn).await?;
	}

	Ok(())
}
