use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time;

use kinship_config::Identify;
use kinship_storage::models::NewContact;

use crate::{
	Error, Identifiers, Identity, KinshipService, PhoneNumberInput, Result, merger, novelty,
	resolver, selector,
};

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentifyRequest {
	#[serde(default)]
	pub email: Option<String>,
	#[serde(default)]
	pub phone_number: Option<PhoneNumberInput>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentifyResponse {
	pub contact: Identity,
}

impl KinshipService {
	/// Reconciles one submission against the stored clusters.
	///
	/// The whole read-merge-insert sequence runs in one store transaction, re-run from scratch on
	/// transient conflicts.
	pub async fn identify(&self, req: IdentifyRequest) -> Result<IdentifyResponse> {
		let ids = Identifiers::normalize(req.email, req.phone_number)?;
		let timeout_ms = self.cfg.timeout_ms;

		match time::timeout(Duration::from_millis(timeout_ms), self.identify_with_retry(&ids)).await
		{
			Ok(result) => result.map(|contact| IdentifyResponse { contact }),
			Err(_) => {
				tracing::error!(timeout_ms, "Identify timed out.");

				Err(Error::Timeout { timeout_ms })
			},
		}
	}

	async fn identify_with_retry(&self, ids: &Identifiers) -> Result<Identity> {
		let mut attempt = 0;

		loop {
			match self.identify_once(ids).await {
				Ok(identity) => return Ok(identity),
				Err(err) if err.is_transient() && attempt < self.cfg.max_retries => {
					attempt += 1;

					let backoff = backoff_for_attempt(&self.cfg, attempt);

					tracing::warn!(
						error = %err,
						attempt,
						backoff_ms = backoff.as_millis() as u64,
						"Identify transaction conflicted. Retrying."
					);

					time::sleep(backoff).await;
				},
				Err(err) => {
					tracing::error!(
						error = %err,
						attempts = attempt + 1,
						email = ids.email.as_deref(),
						phone_number = ids.phone_number.as_deref(),
						"Identify failed."
					);

					return Err(err.into());
				},
			}
		}
	}

	async fn identify_once(&self, ids: &Identifiers) -> kinship_storage::Result<Identity> {
		let mut tx = self.store.begin().await?;

		tx.lock_keys(&ids.lock_keys()).await?;

		let candidates = resolver::resolve_candidate_primaries(tx.as_mut(), ids).await?;
		let Some(selection) = selector::select(candidates) else {
			let contact = tx
				.insert(&NewContact::primary(ids.email.clone(), ids.phone_number.clone()))
				.await?;

			tx.commit().await?;

			tracing::info!(primary_contact_id = contact.id, "Created primary contact.");

			return Ok(Identity::from_primary(&contact));
		};
		let locked = tx.lock_contacts(&selection.candidate_ids()).await?;

		selection.ensure_unchanged(&locked)?;

		let primary_id = selection.canonical.id;
		let members = if selection.needs_merge() {
			merger::merge(tx.as_mut(), &selection, self.cfg.flatten_on_merge).await?
		} else {
			tx.closure_from(primary_id).await?
		};
		let inserted = novelty::record_if_novel(tx.as_mut(), &members, ids, primary_id).await?;
		let members =
			if inserted.is_some() { tx.closure_from(primary_id).await? } else { members };

		tx.commit().await?;

		Ok(Identity::build(primary_id, &members))
	}
}

/// Exponential backoff for the given 1-based retry attempt, capped at `max_backoff_ms`.
pub(crate) fn backoff_for_attempt(cfg: &Identify, attempt: u32) -> Duration {
	let exp = attempt.max(1).saturating_sub(1).min(16);
	let base = cfg.base_backoff_ms.saturating_mul(1_u64 << exp);

	Duration::from_millis(base.min(cfg.max_backoff_ms))
}
