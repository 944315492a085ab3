const SERIALIZATION_FAILURE: &str = "40001";
const DEADLOCK_DETECTED: &str = "40P01";

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error(transparent)]
	Sqlx(#[from] sqlx::Error),
	#[error("Invalid argument: {0}")]
	InvalidArgument(String),
	#[error("Not found: {0}")]
	NotFound(String),
	#[error("Conflict: {0}")]
	Conflict(String),
}
impl Error {
	/// Whether re-running the whole transaction may succeed.
	pub fn is_transient(&self) -> bool {
		match self {
			Self::Conflict(_) => true,
			Self::Sqlx(sqlx::Error::Database(err)) =>
				matches!(err.code().as_deref(), Some(SERIALIZATION_FAILURE | DEADLOCK_DETECTED)),
			_ => false,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn conflict_is_transient() {
		assert!(Error::Conflict("primary 7 was demoted".to_string()).is_transient());
	}

	#[test]
	fn other_errors_are_not_transient() {
		assert!(!Error::NotFound("contact 1".to_string()).is_transient());
		assert!(!Error::InvalidArgument("bad precedence".to_string()).is_transient());
		assert!(!Error::Sqlx(sqlx::Error::PoolTimedOut).is_transient());
		assert!(!Error::Sqlx(sqlx::Error::RowNotFound).is_transient());
	}
}
