pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Invalid request: {message}")]
	InvalidRequest { message: String },
	#[error("Conflict: {message}")]
	Conflict { message: String },
	#[error("Identify timed out after {timeout_ms} ms.")]
	Timeout { timeout_ms: u64 },
	#[error("Storage error: {message}")]
	Storage { message: String },
}
impl From<kinship_storage::Error> for Error {
	fn from(err: kinship_storage::Error) -> Self {
		if err.is_transient() {
			return Self::Conflict { message: err.to_string() };
		}

		Self::Storage { message: err.to_string() }
	}
}
