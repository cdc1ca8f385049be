//! Fakes shared by the use case tests

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use time::OffsetDateTime;
use time::macros::datetime;
use uuid::Uuid;

use crate::model::{Crop, EntityKind, Farm, Harvest, Producer};
use crate::ports::{Clock, RegistryStore, ReportStore, StoreError};

pub struct FakeClock {
    pub time: OffsetDateTime,
}

impl FakeClock {
    pub fn fixed() -> Self {
        Self {
            time: datetime!(2024-03-01 12:00 UTC),
        }
    }
}

impl Clock for FakeClock {
    fn now(&self) -> OffsetDateTime {
        self.time
    }
}

/// Map-backed store that counts mutations
#[derive(Default)]
pub struct FakeStore {
    pub producers: Mutex<HashMap<Uuid, Producer>>,
    pub farms: Mutex<HashMap<Uuid, Farm>>,
    pub harvests: Mutex<HashMap<Uuid, Harvest>>,
    pub crops: Mutex<HashMap<Uuid, Crop>>,
    pub writes: AtomicUsize,
    /// Reject the next producer write as if a concurrent writer won the race
    pub conflict_on_next_write: AtomicBool,
    /// Rows that disappear right after their next read, as if another
    /// request deleted them
    pub vanish_after_read: Mutex<HashSet<Uuid>>,
    vanished: Mutex<HashSet<Uuid>>,
}

impl FakeStore {
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn record_write(&self) -> Result<(), StoreError> {
        if self.conflict_on_next_write.swap(false, Ordering::SeqCst) {
            return Err(StoreError::Conflict("producers.document".to_string()));
        }
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn read<T: Clone>(&self, map: &Mutex<HashMap<Uuid, T>>, id: Uuid) -> Option<T> {
        let mut map = map.lock().unwrap();
        if self.vanish_after_read.lock().unwrap().remove(&id) {
            self.vanished.lock().unwrap().insert(id);
            return map.remove(&id);
        }
        map.get(&id).cloned()
    }

    fn require_parent(&self, kind: EntityKind, id: Uuid) -> Result<(), StoreError> {
        if self.vanished.lock().unwrap().contains(&id) {
            return Err(StoreError::MissingParent(kind));
        }
        Ok(())
    }
}

fn put<T: Clone>(map: &Mutex<HashMap<Uuid, T>>, id: Uuid, value: &T) -> T {
    map.lock().unwrap().insert(id, value.clone());
    value.clone()
}

fn replace<T: Clone>(map: &Mutex<HashMap<Uuid, T>>, id: Uuid, value: &T) -> Result<T, StoreError> {
    let mut map = map.lock().unwrap();
    match map.get_mut(&id) {
        Some(slot) => {
            *slot = value.clone();
            Ok(value.clone())
        }
        None => Err(StoreError::NotFound(id.to_string())),
    }
}

fn remove<T>(map: &Mutex<HashMap<Uuid, T>>, id: Uuid) -> Result<(), StoreError> {
    map.lock()
        .unwrap()
        .remove(&id)
        .map(|_| ())
        .ok_or_else(|| StoreError::NotFound(id.to_string()))
}

#[async_trait]
impl RegistryStore for FakeStore {
    async fn get_producer(&self, id: Uuid) -> Result<Option<Producer>, StoreError> {
        Ok(self.read(&self.producers, id))
    }

    async fn find_producer_by_document(
        &self,
        document: &str,
        exclude: Option<Uuid>,
    ) -> Result<Option<Producer>, StoreError> {
        Ok(self
            .producers
            .lock()
            .unwrap()
            .values()
            .find(|p| p.document == document && Some(p.id) != exclude)
            .cloned())
    }

    async fn list_producers(&self) -> Result<Vec<Producer>, StoreError> {
        Ok(self.producers.lock().unwrap().values().cloned().collect())
    }

    async fn insert_producer(&self, producer: &Producer) -> Result<Producer, StoreError> {
        self.record_write()?;
        Ok(put(&self.producers, producer.id, producer))
    }

    async fn update_producer(&self, producer: &Producer) -> Result<Producer, StoreError> {
        self.record_write()?;
        replace(&self.producers, producer.id, producer)
    }

    async fn delete_producer(&self, id: Uuid) -> Result<(), StoreError> {
        self.record_write()?;
        remove(&self.producers, id)
    }

    async fn get_farm(&self, id: Uuid) -> Result<Option<Farm>, StoreError> {
        Ok(self.read(&self.farms, id))
    }

    async fn list_farms(&self) -> Result<Vec<Farm>, StoreError> {
        Ok(self.farms.lock().unwrap().values().cloned().collect())
    }

    async fn list_farms_by_producer(&self, producer_id: Uuid) -> Result<Vec<Farm>, StoreError> {
        Ok(self
            .farms
            .lock()
            .unwrap()
            .values()
            .filter(|f| f.producer_id == producer_id)
            .cloned()
            .collect())
    }

    async fn insert_farm(&self, farm: &Farm) -> Result<Farm, StoreError> {
        self.require_parent(EntityKind::Producer, farm.producer_id)?;
        self.record_write()?;
        Ok(put(&self.farms, farm.id, farm))
    }

    async fn update_farm(&self, farm: &Farm) -> Result<Farm, StoreError> {
        self.require_parent(EntityKind::Producer, farm.producer_id)?;
        self.record_write()?;
        replace(&self.farms, farm.id, farm)
    }

    async fn delete_farm(&self, id: Uuid) -> Result<(), StoreError> {
        self.record_write()?;
        remove(&self.farms, id)
    }

    async fn get_harvest(&self, id: Uuid) -> Result<Option<Harvest>, StoreError> {
        Ok(self.read(&self.harvests, id))
    }

    async fn list_harvests(&self) -> Result<Vec<Harvest>, StoreError> {
        Ok(self.harvests.lock().unwrap().values().cloned().collect())
    }

    async fn list_harvests_by_farm(&self, farm_id: Uuid) -> Result<Vec<Harvest>, StoreError> {
        Ok(self
            .harvests
            .lock()
            .unwrap()
            .values()
            .filter(|h| h.farm_id == farm_id)
            .cloned()
            .collect())
    }

    async fn insert_harvest(&self, harvest: &Harvest) -> Result<Harvest, StoreError> {
        self.require_parent(EntityKind::Farm, harvest.farm_id)?;
        self.record_write()?;
        Ok(put(&self.harvests, harvest.id, harvest))
    }

    async fn update_harvest(&self, harvest: &Harvest) -> Result<Harvest, StoreError> {
        self.require_parent(EntityKind::Farm, harvest.farm_id)?;
        self.record_write()?;
        replace(&self.harvests, harvest.id, harvest)
    }

    async fn delete_harvest(&self, id: Uuid) -> Result<(), StoreError> {
        self.record_write()?;
        remove(&self.harvests, id)
    }

    async fn get_crop(&self, id: Uuid) -> Result<Option<Crop>, StoreError> {
        Ok(self.read(&self.crops, id))
    }

    async fn list_crops(&self) -> Result<Vec<Crop>, StoreError> {
        Ok(self.crops.lock().unwrap().values().cloned().collect())
    }

    async fn list_crops_by_harvest(&self, harvest_id: Uuid) -> Result<Vec<Crop>, StoreError> {
        Ok(self
            .crops
            .lock()
            .unwrap()
            .values()
            .filter(|c| c.harvest_id == harvest_id)
            .cloned()
            .collect())
    }

    async fn insert_crop(&self, crop: &Crop) -> Result<Crop, StoreError> {
        self.require_parent(EntityKind::Harvest, crop.harvest_id)?;
        self.record_write()?;
        Ok(put(&self.crops, crop.id, crop))
    }

    async fn update_crop(&self, crop: &Crop) -> Result<Crop, StoreError> {
        self.require_parent(EntityKind::Harvest, crop.harvest_id)?;
        self.record_write()?;
        replace(&self.crops, crop.id, crop)
    }

    async fn delete_crop(&self, id: Uuid) -> Result<(), StoreError> {
        self.record_write()?;
        remove(&self.crops, id)
    }
}

/// Report store returning canned figures
#[derive(Default)]
pub struct FakeReports {
    pub producers: i64,
    pub farms: i64,
    pub crops: i64,
    pub total_area: Option<f64>,
    pub by_state: Vec<(String, i64)>,
    pub by_crop: Vec<(String, Option<f64>)>,
    pub land_use: (Option<f64>, Option<f64>),
}

#[async_trait]
impl ReportStore for FakeReports {
    async fn count_producers(&self) -> Result<i64, StoreError> {
        Ok(self.producers)
    }

    async fn count_farms(&self) -> Result<i64, StoreError> {
        Ok(self.farms)
    }

    async fn count_crops(&self) -> Result<i64, StoreError> {
        Ok(self.crops)
    }

    async fn sum_total_area(&self) -> Result<Option<f64>, StoreError> {
        Ok(self.total_area)
    }

    async fn farms_by_state(&self) -> Result<Vec<(String, i64)>, StoreError> {
        Ok(self.by_state.clone())
    }

    async fn crop_area_by_name(&self) -> Result<Vec<(String, Option<f64>)>, StoreError> {
        Ok(self.by_crop.clone())
    }

    async fn land_use_sums(&self) -> Result<(Option<f64>, Option<f64>), StoreError> {
        Ok(self.land_use)
    }
}
