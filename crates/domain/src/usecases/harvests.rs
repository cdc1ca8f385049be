//! Harvest service: farm reference around CRUD

use std::sync::Arc;
use uuid::Uuid;

use crate::{
    error::ServiceError,
    model::{EntityKind, Harvest, HarvestPatch, NewHarvest},
    ports::{Clock, RegistryStore},
    usecases::guards::ReferenceGuard,
};

pub struct HarvestService<St: RegistryStore + ?Sized> {
    store: Arc<St>,
    clock: Arc<dyn Clock>,
}

impl<St: RegistryStore + ?Sized> HarvestService<St> {
    pub fn new(store: Arc<St>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    pub async fn create(&self, input: NewHarvest) -> Result<Harvest, ServiceError> {
        ReferenceGuard::new(self.store.as_ref())
            .farm(input.farm_id)
            .await?;

        let now = self.clock.now();
        let harvest = Harvest {
            id: Uuid::new_v4(),
            farm_id: input.farm_id,
            year: input.year,
            season: input.season,
            created_at: now,
            updated_at: now,
        };

        let created = self.store.insert_harvest(&harvest).await?;
        tracing::info!(
            harvest_id = %created.id,
            farm_id = %created.farm_id,
            year = created.year,
            "Created harvest"
        );
        Ok(created)
    }

    pub async fn list(&self) -> Result<Vec<Harvest>, ServiceError> {
        Ok(self.store.list_harvests().await?)
    }

    pub async fn get(&self, id: Uuid) -> Result<Harvest, ServiceError> {
        ReferenceGuard::new(self.store.as_ref()).harvest(id).await
    }

    pub async fn update(&self, id: Uuid, patch: HarvestPatch) -> Result<Harvest, ServiceError> {
        let guard = ReferenceGuard::new(self.store.as_ref());
        let mut harvest = guard.harvest(id).await?;

        if let Some(farm_id) = patch.farm_id {
            guard.farm(farm_id).await?;
        }

        patch.apply_to(&mut harvest);
        harvest.updated_at = self.clock.now();

        let updated = self
            .store
            .update_harvest(&harvest)
            .await
            .map_err(|e| ServiceError::from_write(EntityKind::Harvest, e))?;
        tracing::info!(harvest_id = %id, "Updated harvest");
        Ok(updated)
    }

    /// Delete a harvest together with its crops
    pub async fn delete(&self, id: Uuid) -> Result<(), ServiceError> {
        ReferenceGuard::new(self.store.as_ref()).harvest(id).await?;

        self.store
            .delete_harvest(id)
            .await
            .map_err(|e| ServiceError::from_write(EntityKind::Harvest, e))?;
        tracing::info!(harvest_id = %id, "Deleted harvest");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DocumentType, NewFarm, NewProducer};
    use crate::usecases::farms::FarmService;
    use crate::usecases::producers::ProducerService;
    use crate::usecases::testing::{FakeClock, FakeStore};
    use time::macros::datetime;

    struct Fixture {
        harvests: HarvestService<FakeStore>,
        store: Arc<FakeStore>,
        farm_a: Uuid,
        farm_b: Uuid,
    }

    async fn fixture() -> Fixture {
        let store = Arc::new(FakeStore::default());
        let clock: Arc<dyn Clock> = Arc::new(FakeClock::fixed());

        let producer = ProducerService::new(Arc::clone(&store), Arc::clone(&clock))
            .create(NewProducer {
                name: "Agropecuária Três Irmãos Ltda".to_string(),
                document_type: DocumentType::Cnpj,
                document: "12.345.678/0001-95".to_string(),
            })
            .await
            .unwrap();

        let farms = FarmService::new(Arc::clone(&store), Arc::clone(&clock));
        let mut farm_ids = Vec::new();
        for name in ["Fazenda Três Irmãos", "Fazenda Nova Esperança"] {
            let farm = farms
                .create(NewFarm {
                    producer_id: producer.id,
                    name: name.to_string(),
                    city: "Sorriso".to_string(),
                    state: "MT".to_string(),
                    total_area: 1000.0,
                    arable_area: 800.0,
                    vegetation_area: 200.0,
                })
                .await
                .unwrap();
            farm_ids.push(farm.id);
        }

        Fixture {
            harvests: HarvestService::new(Arc::clone(&store), clock),
            store,
            farm_a: farm_ids[0],
            farm_b: farm_ids[1],
        }
    }

    fn new_harvest(farm_id: Uuid) -> NewHarvest {
        NewHarvest {
            farm_id,
            year: 2024,
            season: "Safra".to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_for_existing_farm() {
        let fx = fixture().await;

        let harvest = fx.harvests.create(new_harvest(fx.farm_a)).await.unwrap();

        assert_eq!(harvest.farm_id, fx.farm_a);
        assert_eq!(harvest.season, "Safra");
    }

    #[tokio::test]
    async fn test_create_for_missing_farm_fails() {
        let fx = fixture().await;
        let writes_before = fx.store.writes();

        let result = fx.harvests.create(new_harvest(Uuid::new_v4())).await;

        assert!(matches!(result, Err(ServiceError::NotFound(EntityKind::Farm))));
        assert_eq!(fx.store.writes(), writes_before);
    }

    #[tokio::test]
    async fn test_move_to_missing_farm_leaves_harvest_unchanged() {
        let fx = fixture().await;
        let harvest = fx.harvests.create(new_harvest(fx.farm_a)).await.unwrap();

        let patch = HarvestPatch {
            farm_id: Some(Uuid::new_v4()),
            season: Some("Safrinha".to_string()),
            ..Default::default()
        };
        let result = fx.harvests.update(harvest.id, patch).await;

        assert!(matches!(result, Err(ServiceError::NotFound(EntityKind::Farm))));
        let stored = fx.harvests.get(harvest.id).await.unwrap();
        assert_eq!(stored.farm_id, fx.farm_a);
        assert_eq!(stored.season, "Safra");
    }

    #[tokio::test]
    async fn test_move_to_existing_farm_is_visible_on_read() {
        let fx = fixture().await;
        let harvest = fx.harvests.create(new_harvest(fx.farm_a)).await.unwrap();

        let patch = HarvestPatch {
            farm_id: Some(fx.farm_b),
            ..Default::default()
        };
        fx.harvests.update(harvest.id, patch).await.unwrap();

        let stored = fx.harvests.get(harvest.id).await.unwrap();
        assert_eq!(stored.farm_id, fx.farm_b);
        assert_eq!(stored.year, 2024);
    }

    #[tokio::test]
    async fn test_create_when_farm_deleted_after_check() {
        let fx = fixture().await;
        fx.store.vanish_after_read.lock().unwrap().insert(fx.farm_a);

        let result = fx.harvests.create(new_harvest(fx.farm_a)).await;

        assert!(matches!(result, Err(ServiceError::NotFound(EntityKind::Farm))));
        assert!(fx.store.harvests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_move_when_target_farm_deleted_after_check() {
        let fx = fixture().await;
        let harvest = fx.harvests.create(new_harvest(fx.farm_a)).await.unwrap();
        fx.store.vanish_after_read.lock().unwrap().insert(fx.farm_b);

        let patch = HarvestPatch {
            farm_id: Some(fx.farm_b),
            ..Default::default()
        };
        let result = fx.harvests.update(harvest.id, patch).await;

        assert!(matches!(result, Err(ServiceError::NotFound(EntityKind::Farm))));
        assert_eq!(fx.harvests.get(harvest.id).await.unwrap().farm_id, fx.farm_a);
    }

    #[tokio::test]
    async fn test_patch_without_farm_skips_farm_lookup() {
        // The stored harvest points at a farm that does not exist; a patch
        // that leaves farm_id alone must not re-check it.
        let store = Arc::new(FakeStore::default());
        let id = Uuid::new_v4();
        let at = datetime!(2023-10-01 00:00 UTC);
        store.harvests.lock().unwrap().insert(
            id,
            Harvest {
                id,
                farm_id: Uuid::new_v4(),
                year: 2023,
                season: "Safra".to_string(),
                created_at: at,
                updated_at: at,
            },
        );
        let harvests = HarvestService::new(Arc::clone(&store), Arc::new(FakeClock::fixed()));

        let patch = HarvestPatch {
            year: Some(2024),
            ..Default::default()
        };
        let updated = harvests.update(id, patch).await.unwrap();

        assert_eq!(updated.year, 2024);
        assert_eq!(updated.season, "Safra");
    }

    #[tokio::test]
    async fn test_update_missing_harvest_fails() {
        let fx = fixture().await;

        let patch = HarvestPatch {
            season: Some("Outono".to_string()),
            ..Default::default()
        };
        let result = fx.harvests.update(Uuid::new_v4(), patch).await;

        assert!(matches!(
            result,
            Err(ServiceError::NotFound(EntityKind::Harvest))
        ));
    }

    #[tokio::test]
    async fn test_delete() {
        let fx = fixture().await;
        let harvest = fx.harvests.create(new_harvest(fx.farm_a)).await.unwrap();

        fx.harvests.delete(harvest.id).await.unwrap();
        let writes_after = fx.store.writes();

        assert!(matches!(
            fx.harvests.delete(harvest.id).await,
            Err(ServiceError::NotFound(EntityKind::Harvest))
        ));
        assert_eq!(fx.store.writes(), writes_after);
    }
}
