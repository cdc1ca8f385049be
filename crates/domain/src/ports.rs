//! Port definitions (traits) for external dependencies
//!
//! These traits define the boundaries between the domain and external systems.
//! Adapters implement these traits to connect to real infrastructure.

use async_trait::async_trait;
use thiserror::Error;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::model::{Crop, EntityKind, Farm, Harvest, Producer};

/// Error type for store operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(String),
    /// A store-level uniqueness constraint rejected the write
    #[error("Conflict: {0}")]
    Conflict(String),
    /// The row being updated or deleted does not exist
    #[error("Not found: {0}")]
    NotFound(String),
    /// The parent a written row points at does not exist
    #[error("Missing parent: {0}")]
    MissingParent(EntityKind),
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Port for persisting the producer → farm → harvest → crop hierarchy
///
/// Lookups return `Ok(None)` for a missing id. Writes receive fully built
/// records; the store does not run business rules beyond its own uniqueness
/// constraint on `Producer::document`, which it reports as
/// [`StoreError::Conflict`]. A write whose parent row is absent fails with
/// [`StoreError::MissingParent`]; an update or delete of an absent row fails
/// with [`StoreError::NotFound`].
///
/// Deletes cascade: removing a producer, farm or harvest also removes every
/// record beneath it.
#[async_trait]
pub trait RegistryStore: Send + Sync {
    async fn get_producer(&self, id: Uuid) -> Result<Option<Producer>, StoreError>;

    /// Find a producer holding exactly `document`, ignoring `exclude` if given
    async fn find_producer_by_document(
        &self,
        document: &str,
        exclude: Option<Uuid>,
    ) -> Result<Option<Producer>, StoreError>;

    /// All producers, newest first
    async fn list_producers(&self) -> Result<Vec<Producer>, StoreError>;

    async fn insert_producer(&self, producer: &Producer) -> Result<Producer, StoreError>;

    async fn update_producer(&self, producer: &Producer) -> Result<Producer, StoreError>;

    async fn delete_producer(&self, id: Uuid) -> Result<(), StoreError>;

    async fn get_farm(&self, id: Uuid) -> Result<Option<Farm>, StoreError>;

    /// All farms, newest first
    async fn list_farms(&self) -> Result<Vec<Farm>, StoreError>;

    /// Farms owned by one producer, newest first
    async fn list_farms_by_producer(&self, producer_id: Uuid) -> Result<Vec<Farm>, StoreError>;

    async fn insert_farm(&self, farm: &Farm) -> Result<Farm, StoreError>;

    async fn update_farm(&self, farm: &Farm) -> Result<Farm, StoreError>;

    async fn delete_farm(&self, id: Uuid) -> Result<(), StoreError>;

    async fn get_harvest(&self, id: Uuid) -> Result<Option<Harvest>, StoreError>;

    /// All harvests, by year descending then newest first
    async fn list_harvests(&self) -> Result<Vec<Harvest>, StoreError>;

    /// Harvests of one farm, same ordering as `list_harvests`
    async fn list_harvests_by_farm(&self, farm_id: Uuid) -> Result<Vec<Harvest>, StoreError>;

    async fn insert_harvest(&self, harvest: &Harvest) -> Result<Harvest, StoreError>;

    async fn update_harvest(&self, harvest: &Harvest) -> Result<Harvest, StoreError>;

    async fn delete_harvest(&self, id: Uuid) -> Result<(), StoreError>;

    async fn get_crop(&self, id: Uuid) -> Result<Option<Crop>, StoreError>;

    /// All crops, newest first
    async fn list_crops(&self) -> Result<Vec<Crop>, StoreError>;

    /// Crops of one harvest, newest first
    async fn list_crops_by_harvest(&self, harvest_id: Uuid) -> Result<Vec<Crop>, StoreError>;

    async fn insert_crop(&self, crop: &Crop) -> Result<Crop, StoreError>;

    async fn update_crop(&self, crop: &Crop) -> Result<Crop, StoreError>;

    async fn delete_crop(&self, id: Uuid) -> Result<(), StoreError>;
}

/// Port for the grouping/summation queries behind the dashboard
///
/// Sums are `None` when there is nothing to sum.
#[async_trait]
pub trait ReportStore: Send + Sync {
    async fn count_producers(&self) -> Result<i64, StoreError>;

    async fn count_farms(&self) -> Result<i64, StoreError>;

    async fn count_crops(&self) -> Result<i64, StoreError>;

    async fn sum_total_area(&self) -> Result<Option<f64>, StoreError>;

    /// `(state, farm count)`, descending by count
    async fn farms_by_state(&self) -> Result<Vec<(String, i64)>, StoreError>;

    /// `(crop name, summed area)`, descending by area
    async fn crop_area_by_name(&self) -> Result<Vec<(String, Option<f64>)>, StoreError>;

    /// `(arable, vegetation)` summed across all farms
    async fn land_use_sums(&self) -> Result<(Option<f64>, Option<f64>), StoreError>;
}

/// Port for time/clock operations (enables deterministic testing)
pub trait Clock: Send + Sync {
    /// Get the current time
    fn now(&self) -> OffsetDateTime;
}

/// Real clock implementation
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}
