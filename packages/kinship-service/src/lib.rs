//! Identity reconciliation over partial contact submissions.
//!
//! Contacts that share an email or a phone number belong to one cluster with a single primary.
//! [`KinshipService::identify`] resolves the clusters a submission touches, merges them under the
//! oldest primary, records genuinely new identifiers as a secondary, and returns the consolidated
//! identity.

pub mod identifier;
pub mod identify;
pub mod identity;
pub mod merger;
pub mod novelty;
pub mod resolver;
pub mod selector;

mod error;

pub use error::{Error, Result};
pub use identifier::{Identifiers, PhoneNumberInput};
pub use identify::{IdentifyRequest, IdentifyResponse};
pub use identity::Identity;

use std::sync::Arc;

use kinship_config::Identify;
use kinship_storage::store::ContactStore;

pub struct KinshipService {
	pub cfg: Identify,
	pub store: Arc<dyn ContactStore>,
}
impl KinshipService {
	pub fn new(cfg: Identify, store: Arc<dyn ContactStore>) -> Self {
		Self { cfg, store }
	}
}
