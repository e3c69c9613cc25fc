use std::sync::Arc;

use goals_core::WeekPolicy;
use storage::repository::Storage;

use crate::Clock;
use crate::error::AppServicesError;
use crate::week_summary::WeekSummaryService;

/// Assembles app-facing services over one storage backend.
#[derive(Clone)]
pub struct AppServices {
    storage: Storage,
    week_summary: Arc<WeekSummaryService>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails.
    pub async fn new_sqlite(
        db_url: &str,
        clock: Clock,
        policy: WeekPolicy,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Ok(Self::from_storage(storage, clock, policy))
    }

    #[must_use]
    pub fn in_memory(clock: Clock, policy: WeekPolicy) -> Self {
        Self::from_storage(Storage::in_memory(), clock, policy)
    }

    fn from_storage(storage: Storage, clock: Clock, policy: WeekPolicy) -> Self {
        let week_summary = Arc::new(WeekSummaryService::from_storage(clock, policy, &storage));
        Self {
            storage,
            week_summary,
        }
    }

    #[must_use]
    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    #[must_use]
    pub fn week_summary(&self) -> Arc<WeekSummaryService> {
        Arc::clone(&self.week_summary)
    }
}
