use std::{fmt, str::FromStr};

use time::OffsetDateTime;

use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkPrecedence {
	Primary,
	Secondary,
}
impl LinkPrecedence {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Primary => "primary",
			Self::Secondary => "secondary",
		}
	}
}
impl FromStr for LinkPrecedence {
	type Err = Error;

	fn from_str(raw: &str) -> Result<Self> {
		match raw {
			"primary" => Ok(Self::Primary),
			"secondary" => Ok(Self::Secondary),
			other => Err(Error::InvalidArgument(format!("Unknown link precedence {other:?}."))),
		}
	}
}
impl fmt::Display for LinkPrecedence {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Position of a contact inside its cluster.
///
/// A primary never carries a link and a secondary always does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Link {
	Primary,
	Secondary { linked_id: i64 },
}
impl Link {
	pub fn from_parts(precedence: LinkPrecedence, linked_id: Option<i64>) -> Result<Self> {
		match (precedence, linked_id) {
			(LinkPrecedence::Primary, None) => Ok(Self::Primary),
			(LinkPrecedence::Secondary, Some(linked_id)) => Ok(Self::Secondary { linked_id }),
			(LinkPrecedence::Primary, Some(linked_id)) => Err(Error::InvalidArgument(format!(
				"Primary contact must not link to {linked_id}."
			))),
			(LinkPrecedence::Secondary, None) => Err(Error::InvalidArgument(
				"Secondary contact must carry a linked id.".to_string(),
			)),
		}
	}

	pub fn precedence(self) -> LinkPrecedence {
		match self {
			Self::Primary => LinkPrecedence::Primary,
			Self::Secondary { .. } => LinkPrecedence::Secondary,
		}
	}

	pub fn linked_id(self) -> Option<i64> {
		match self {
			Self::Primary => None,
			Self::Secondary { linked_id } => Some(linked_id),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contact {
	pub id: i64,
	pub email: Option<String>,
	pub phone_number: Option<String>,
	pub link: Link,
	pub created_at: OffsetDateTime,
	pub updated_at: OffsetDateTime,
	pub deleted_at: Option<OffsetDateTime>,
}
impl Contact {
	pub fn is_primary(&self) -> bool {
		matches!(self.link, Link::Primary)
	}

	pub fn linked_id(&self) -> Option<i64> {
		self.link.linked_id()
	}

	pub fn is_deleted(&self) -> bool {
		self.deleted_at.is_some()
	}
}

#[derive(Debug, sqlx::FromRow)]
pub struct ContactRow {
	pub id: i64,
	pub email: Option<String>,
	pub phone_number: Option<String>,
	pub linked_id: Option<i64>,
	pub link_precedence: String,
	pub created_at: OffsetDateTime,
	pub updated_at: OffsetDateTime,
	pub deleted_at: Option<OffsetDateTime>,
}
impl TryFrom<ContactRow> for Contact {
	type Error = Error;

	fn try_from(row: ContactRow) -> Result<Self> {
		let precedence = row.link_precedence.parse::<LinkPrecedence>()?;
		let link = Link::from_parts(precedence, row.linked_id).map_err(|err| match err {
			Error::InvalidArgument(message) =>
				Error::InvalidArgument(format!("Contact {}: {message}", row.id)),
			other => other,
		})?;

		Ok(Self {
			id: row.id,
			email: row.email,
			phone_number: row.phone_number,
			link,
			created_at: row.created_at,
			updated_at: row.updated_at,
			deleted_at: row.deleted_at,
		})
	}
}

/// Fields for a contact that has not been stored yet. Id and timestamps are assigned on insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewContact {
	pub email: Option<String>,
	pub phone_number: Option<String>,
	pub link: Link,
}
impl NewContact {
	pub fn primary(email: Option<String>, phone_number: Option<String>) -> Self {
		Self { email, phone_number, link: Link::Primary }
	}

	pub fn secondary(email: Option<String>, phone_number: Option<String>, linked_id: i64) -> Self {
		Self { email, phone_number, link: Link::Secondary { linked_id } }
	}

	pub fn validate(&self) -> Result<()> {
		if self.email.is_none() && self.phone_number.is_none() {
			return Err(Error::InvalidArgument(
				"Contact must carry an email or a phone number.".to_string(),
			));
		}

		Ok(())
	}
}

pub(crate) fn rows_into_contacts(rows: Vec<ContactRow>) -> Result<Vec<Contact>> {
	rows.into_iter().map(Contact::try_from).collect()
}
