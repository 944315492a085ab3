use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	#[serde(default)]
	pub identify: Identify,
	pub security: Security,
}

#[derive(Debug, Deserialize)]
pub struct Service {
	pub http_bind: String,
	pub log_level: String,
}

#[derive(Debug, Deserialize)]
pub struct Storage {
	pub postgres: Postgres,
}

#[derive(Debug, Deserialize)]
pub struct Postgres {
	pub dsn: String,
	pub pool_max_conns: u32,
}

/// Tuning for the identify transaction.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Identify {
	/// Extra attempts after a transient transaction conflict. Zero disables retry.
	pub max_retries: u32,
	pub base_backoff_ms: u64,
	pub max_backoff_ms: u64,
	/// Upper bound for one identify call, retries included.
	pub timeout_ms: u64,
	/// Repoint the children of a demoted primary directly at the surviving primary.
	pub flatten_on_merge: bool,
}
impl Default for Identify {
	fn default() -> Self {
		Self {
			max_retries: 3,
			base_backoff_ms: 50,
			max_backoff_ms: 2_000,
			timeout_ms: 10_000,
			flatten_on_merge: true,
		}
	}
}

#[derive(Debug, Deserialize)]
pub struct Security {
	pub bind_localhost_only: bool,
}
