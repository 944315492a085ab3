use std::sync::Arc;

use kinship_service::KinshipService;
use kinship_storage::db::Db;

#[derive(Clone)]
pub struct AppState {
	pub service: Arc<KinshipService>,
}
impl AppState {
	pub async fn new(config: kinship_config::Config) -> color_eyre::Result<Self> {
		let db = Db::connect(&config.storage.postgres).await?;

		db.ensure_schema().await?;

		let service = KinshipService::new(config.identify, Arc::new(db));

		Ok(Self::from_service(service))
	}

	pub fn from_service(service: KinshipService) -> Self {
		Self { service: Arc::new(service) }
	}
}
