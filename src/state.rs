use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::config::AppConfig;
use crate::error::AppError;
use crate::reference::ReferenceData;
use crate::source::{DataSource, Snapshot};

pub struct AppState {
    pub reference: ReferenceData,
    pub config: AppConfig,
    pub source: Box<dyn DataSource + Send + Sync>,
    pub snapshot: Mutex<Option<Arc<Snapshot>>>,
}

impl AppState {
    pub fn new(
        reference: ReferenceData,
        config: AppConfig,
        source: Box<dyn DataSource + Send + Sync>,
    ) -> Self {
        AppState {
            reference,
            config,
            source,
            snapshot: Mutex::new(None),
        }
    }
}

pub trait SnapshotAccess {
    /// The current snapshot, reloaded from the source once it is older than
    /// the configured refresh interval.
    fn snapshot(&self) -> Result<Arc<Snapshot>, AppError>;

    /// Forces the next `snapshot()` call to reload.
    fn invalidate(&self) -> Result<(), AppError>;
}

impl SnapshotAccess for AppState {
    fn snapshot(&self) -> Result<Arc<Snapshot>, AppError> {
        let mut guard = self
            .snapshot
            .lock()
            .map_err(|e| AppError::Custom(format!("Mutex poisoned: {}", e)))?;

        let ttl = Duration::from_secs(self.config.refresh_interval_secs);
        if let Some(current) = guard.as_ref() {
            if current.loaded_at.elapsed() < ttl {
                return Ok(Arc::clone(current));
            }
        }

        let fresh = Arc::new(self.source.load()?);
        log::info!(
            "Données chargées depuis {}: {} tickets, {} acompanhamentos",
            self.source.describe(),
            fresh.tickets.len(),
            fresh.activities.len()
        );
        if !fresh.warnings.is_empty() {
            log::warn!("{} avertissement(s) de lecture", fresh.warnings.len());
        }
        *guard = Some(Arc::clone(&fresh));
        Ok(fresh)
    }

    fn invalidate(&self) -> Result<(), AppError> {
        let mut guard = self
            .snapshot
            .lock()
            .map_err(|e| AppError::Custom(format!("Mutex poisoned: {}", e)))?;
        *guard = None;
        Ok(())
    }
}
