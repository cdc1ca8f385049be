//! In-memory registry store for tests and the `--memory` server mode

use async_trait::async_trait;
use agro_registry_domain::{
    Crop, EntityKind, Farm, Harvest, Producer, RegistryStore, ReportStore, StoreError,
};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use uuid::Uuid;

#[derive(Default)]
struct Tables {
    producers: HashMap<Uuid, Producer>,
    farms: HashMap<Uuid, Farm>,
    harvests: HashMap<Uuid, Harvest>,
    crops: HashMap<Uuid, Crop>,
}

impl Tables {
    fn document_taken(&self, document: &str, except: Uuid) -> bool {
        self.producers
            .values()
            .any(|p| p.document == document && p.id != except)
    }

    fn remove_harvest_tree(&mut self, harvest_id: Uuid) {
        self.crops.retain(|_, c| c.harvest_id != harvest_id);
        self.harvests.remove(&harvest_id);
    }

    fn remove_farm_tree(&mut self, farm_id: Uuid) {
        let harvest_ids: Vec<Uuid> = self
            .harvests
            .values()
            .filter(|h| h.farm_id == farm_id)
            .map(|h| h.id)
            .collect();
        for harvest_id in harvest_ids {
            self.remove_harvest_tree(harvest_id);
        }
        self.farms.remove(&farm_id);
    }

    fn remove_producer_tree(&mut self, producer_id: Uuid) {
        let farm_ids: Vec<Uuid> = self
            .farms
            .values()
            .filter(|f| f.producer_id == producer_id)
            .map(|f| f.id)
            .collect();
        for farm_id in farm_ids {
            self.remove_farm_tree(farm_id);
        }
        self.producers.remove(&producer_id);
    }
}

/// In-memory store implementation
///
/// All tables sit behind one lock so cascading deletes and the document
/// uniqueness check are atomic with the write they guard.
pub struct InMemoryRegistryStore {
    tables: RwLock<Tables>,
}

impl InMemoryRegistryStore {
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(Tables::default()),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Tables>, StoreError> {
        self.tables
            .read()
            .map_err(|e| StoreError::Database(e.to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Tables>, StoreError> {
        self.tables
            .write()
            .map_err(|e| StoreError::Database(e.to_string()))
    }
}

impl Default for InMemoryRegistryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn document_conflict(document: &str) -> StoreError {
    StoreError::Conflict(format!("document {} already stored", document))
}

fn missing(id: Uuid) -> StoreError {
    StoreError::NotFound(id.to_string())
}

fn newest_first<T>(mut rows: Vec<T>, key: impl Fn(&T) -> (time::OffsetDateTime, Uuid)) -> Vec<T> {
    rows.sort_by(|a, b| key(b).cmp(&key(a)));
    rows
}

fn harvest_order(mut rows: Vec<Harvest>) -> Vec<Harvest> {
    rows.sort_by(|a, b| {
        b.year
            .cmp(&a.year)
            .then(b.created_at.cmp(&a.created_at))
            .then(b.id.cmp(&a.id))
    });
    rows
}

#[async_trait]
impl RegistryStore for InMemoryRegistryStore {
    async fn get_producer(&self, id: Uuid) -> Result<Option<Producer>, StoreError> {
        Ok(self.read()?.producers.get(&id).cloned())
    }

    async fn find_producer_by_document(
        &self,
        document: &str,
        exclude: Option<Uuid>,
    ) -> Result<Option<Producer>, StoreError> {
        Ok(self
            .read()?
            .producers
            .values()
            .find(|p| p.document == document && Some(p.id) != exclude)
            .cloned())
    }

    async fn list_producers(&self) -> Result<Vec<Producer>, StoreError> {
        let rows: Vec<Producer> = self.read()?.producers.values().cloned().collect();
        Ok(newest_first(rows, |p| (p.created_at, p.id)))
    }

    async fn insert_producer(&self, producer: &Producer) -> Result<Producer, StoreError> {
        let mut tables = self.write()?;
        if tables.document_taken(&producer.document, producer.id) {
            return Err(document_conflict(&producer.document));
        }
        tables.producers.insert(producer.id, producer.clone());
        Ok(producer.clone())
    }

    async fn update_producer(&self, producer: &Producer) -> Result<Producer, StoreError> {
        let mut tables = self.write()?;
        if !tables.producers.contains_key(&producer.id) {
            return Err(missing(producer.id));
        }
        if tables.document_taken(&producer.document, producer.id) {
            return Err(document_conflict(&producer.document));
        }
        tables.producers.insert(producer.id, producer.clone());
        Ok(producer.clone())
    }

    async fn delete_producer(&self, id: Uuid) -> Result<(), StoreError> {
        let mut tables = self.write()?;
        if !tables.producers.contains_key(&id) {
            return Err(missing(id));
        }
        tables.remove_producer_tree(id);
        Ok(())
    }

    async fn get_farm(&self, id: Uuid) -> Result<Option<Farm>, StoreError> {
        Ok(self.read()?.farms.get(&id).cloned())
    }

    async fn list_farms(&self) -> Result<Vec<Farm>, StoreError> {
        let rows: Vec<Farm> = self.read()?.farms.values().cloned().collect();
        Ok(newest_first(rows, |f| (f.created_at, f.id)))
    }

    async fn list_farms_by_producer(&self, producer_id: Uuid) -> Result<Vec<Farm>, StoreError> {
        let rows: Vec<Farm> = self
            .read()?
            .farms
            .values()
            .filter(|f| f.producer_id == producer_id)
            .cloned()
            .collect();
        Ok(newest_first(rows, |f| (f.created_at, f.id)))
    }

    async fn insert_farm(&self, farm: &Farm) -> Result<Farm, StoreError> {
        let mut tables = self.write()?;
        if !tables.producers.contains_key(&farm.producer_id) {
            return Err(StoreError::MissingParent(EntityKind::Producer));
        }
        tables.farms.insert(farm.id, farm.clone());
        Ok(farm.clone())
    }

    async fn update_farm(&self, farm: &Farm) -> Result<Farm, StoreError> {
        let mut tables = self.write()?;
        if !tables.farms.contains_key(&farm.id) {
            return Err(missing(farm.id));
        }
        if !tables.producers.contains_key(&farm.producer_id) {
            return Err(StoreError::MissingParent(EntityKind::Producer));
        }
        tables.farms.insert(farm.id, farm.clone());
        Ok(farm.clone())
    }

    async fn delete_farm(&self, id: Uuid) -> Result<(), StoreError> {
        let mut tables = self.write()?;
        if !tables.farms.contains_key(&id) {
            return Err(missing(id));
        }
        tables.remove_farm_tree(id);
        Ok(())
    }

    async fn get_harvest(&self, id: Uuid) -> Result<Option<Harvest>, StoreError> {
        Ok(self.read()?.harvests.get(&id).cloned())
    }

    async fn list_harvests(&self) -> Result<Vec<Harvest>, StoreError> {
        Ok(harvest_order(
            self.read()?.harvests.values().cloned().collect(),
        ))
    }

    async fn list_harvests_by_farm(&self, farm_id: Uuid) -> Result<Vec<Harvest>, StoreError> {
        Ok(harvest_order(
            self.read()?
                .harvests
                .values()
                .filter(|h| h.farm_id == farm_id)
                .cloned()
                .collect(),
        ))
    }

    async fn insert_harvest(&self, harvest: &Harvest) -> Result<Harvest, StoreError> {
        let mut tables = self.write()?;
        if !tables.farms.contains_key(&harvest.farm_id) {
            return Err(StoreError::MissingParent(EntityKind::Farm));
        }
        tables.harvests.insert(harvest.id, harvest.clone());
        Ok(harvest.clone())
    }

    async fn update_harvest(&self, harvest: &Harvest) -> Result<Harvest, StoreError> {
        let mut tables = self.write()?;
        if !tables.harvests.contains_key(&harvest.id) {
            return Err(missing(harvest.id));
        }
        if !tables.farms.contains_key(&harvest.farm_id) {
            return Err(StoreError::MissingParent(EntityKind::Farm));
        }
        tables.harvests.insert(harvest.id, harvest.clone());
        Ok(harvest.clone())
    }

    async fn delete_harvest(&self, id: Uuid) -> Result<(), StoreError> {
        let mut tables = self.write()?;
        if !tables.harvests.contains_key(&id) {
            return Err(missing(id));
        }
        tables.remove_harvest_tree(id);
        Ok(())
    }

    async fn get_crop(&self, id: Uuid) -> Result<Option<Crop>, StoreError> {
        Ok(self.read()?.crops.get(&id).cloned())
    }

    async fn list_crops(&self) -> Result<Vec<Crop>, StoreError> {
        let rows: Vec<Crop> = self.read()?.crops.values().cloned().collect();
        Ok(newest_first(rows, |c| (c.created_at, c.id)))
    }

    async fn list_crops_by_harvest(&self, harvest_id: Uuid) -> Result<Vec<Crop>, StoreError> {
        let rows: Vec<Crop> = self
            .read()?
            .crops
            .values()
            .filter(|c| c.harvest_id == harvest_id)
            .cloned()
            .collect();
        Ok(newest_first(rows, |c| (c.created_at, c.id)))
    }

    async fn insert_crop(&self, crop: &Crop) -> Result<Crop, StoreError> {
        let mut tables = self.write()?;
        if !tables.harvests.contains_key(&crop.harvest_id) {
            return Err(StoreError::MissingParent(EntityKind::Harvest));
        }
        tables.crops.insert(crop.id, crop.clone());
        Ok(crop.clone())
    }

    async fn update_crop(&self, crop: &Crop) -> Result<Crop, StoreError> {
        let mut tables = self.write()?;
        if !tables.crops.contains_key(&crop.id) {
            return Err(missing(crop.id));
        }
        if !tables.harvests.contains_key(&crop.harvest_id) {
            return Err(StoreError::MissingParent(EntityKind::Harvest));
        }
        tables.crops.insert(crop.id, crop.clone());
        Ok(crop.clone())
    }

    async fn delete_crop(&self, id: Uuid) -> Result<(), StoreError> {
        self.write()?
            .crops
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| missing(id))
    }
}

#[async_trait]
impl ReportStore for InMemoryRegistryStore {
    async fn count_producers(&self) -> Result<i64, StoreError> {
        Ok(self.read()?.producers.len() as i64)
    }

    async fn count_farms(&self) -> Result<i64, StoreError> {
        Ok(self.read()?.farms.len() as i64)
    }

    async fn count_crops(&self) -> Result<i64, StoreError> {
        Ok(self.read()?.crops.len() as i64)
    }

    async fn sum_total_area(&self) -> Result<Option<f64>, StoreError> {
        let tables = self.read()?;
        if tables.farms.is_empty() {
            return Ok(None);
        }
        Ok(Some(tables.farms.values().map(|f| f.total_area).sum()))
    }

    async fn farms_by_state(&self) -> Result<Vec<(String, i64)>, StoreError> {
        let mut counts: HashMap<String, i64> = HashMap::new();
        for farm in self.read()?.farms.values() {
            *counts.entry(farm.state.clone()).or_default() += 1;
        }

        let mut rows: Vec<_> = counts.into_iter().collect();
        rows.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        Ok(rows)
    }

    async fn crop_area_by_name(&self) -> Result<Vec<(String, Option<f64>)>, StoreError> {
        let mut sums: HashMap<String, f64> = HashMap::new();
        for crop in self.read()?.crops.values() {
            *sums.entry(crop.name.clone()).or_default() += crop.area;
        }

        let mut rows: Vec<_> = sums.into_iter().collect();
        rows.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });
        Ok(rows.into_iter().map(|(name, area)| (name, Some(area))).collect())
    }

    async fn land_use_sums(&self) -> Result<(Option<f64>, Option<f64>), StoreError> {
        let tables = self.read()?;
        if tables.farms.is_empty() {
            return Ok((None, None));
        }
        let arable = tables.farms.values().map(|f| f.arable_area).sum();
        let vegetation = tables.farms.values().map(|f| f.vegetation_area).sum();
        Ok((Some(arable), Some(vegetation)))
    }
}
