//! Repository layer: one entry point for every catalog operation.
//!
//! [`Repository`] owns a handle to a [`ConnectionManager`] and the
//! per-entity repositories built on it. Domain modules extend it with
//! pass-through methods so callers only ever hold a `Repository`.

pub mod categories;
pub mod equipment;
pub mod packages;
pub mod statistics;

use std::sync::Arc;

use crate::db::{ConnectionManager, Executor, PoolStatus};

/// Main repository struct holding the connection manager
#[derive(Clone)]
pub struct Repository {
    manager: Arc<dyn ConnectionManager>,
    pub equipment: equipment::EquipmentRepository,
    pub categories: categories::CategoriesRepository,
    pub packages: packages::PackagesRepository,
    pub statistics: statistics::StatisticsRepository,
}

impl Repository {
    /// Create a new repository over the given connection manager
    pub fn new(manager: Arc<dyn ConnectionManager>) -> Self {
        let db = Executor::new(manager.clone());
        Self {
            equipment: equipment::EquipmentRepository::new(db.clone()),
            categories: categories::CategoriesRepository::new(db.clone()),
            packages: packages::PackagesRepository::new(db.clone()),
            statistics: statistics::StatisticsRepository::new(db),
            manager,
        }
    }

    pub async fn health_check(&self) -> bool {
        self.manager.health_check().await
    }

    pub fn pool_status(&self) -> PoolStatus {
        self.manager.status()
    }

    /// Close every pooled connection
    pub async fn shutdown(&self) {
        tracing::info!("Closing database connections");
        self.manager.close_all().await;
    }
}
