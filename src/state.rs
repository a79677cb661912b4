use std::sync::Arc;

use tracing::info;

use crate::config::{Config, Storage};
use crate::db::Database;
use crate::error::AppResult;
use crate::seed;

pub struct AppState {
    pub db: Database,
    pub config: Config,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    /// Opens and migrates the configured database. In-memory databases
    /// always get the demo data, since they start empty on every run.
    pub fn new(config: Config) -> AppResult<SharedState> {
        let db = match &config.storage {
            Storage::File(path) => {
                info!("Opening database at {}", path.display());
                Database::open(path)?
            }
            Storage::Memory => {
                info!("Using in-memory database");
                Database::open_in_memory()?
            }
        };
        db.initialize()?;

        if config.seed_demo || config.storage == Storage::Memory {
            seed::seed_demo(&db)?;
        }

        Ok(Arc::new(Self { db, config }))
    }
}
