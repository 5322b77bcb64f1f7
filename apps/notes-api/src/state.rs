use std::sync::Arc;

use notes_service::NotesService;
use notes_storage::db::Db;

#[derive(Clone)]
pub struct AppState {
	pub service: Arc<NotesService>,
}
impl AppState {
	pub async fn new(config: notes_config::Config) -> color_eyre::Result<Self> {
		let db = Db::connect(&config.storage.postgres).await?;

		db.ensure_schema().await?;

		Ok(Self::from_service(NotesService::new(config, db)))
	}

	pub fn from_service(service: NotesService) -> Self {
		Self { service: Arc::new(service) }
	}
}
