//! Farm service: area invariant and producer reference around CRUD

use std::sync::Arc;
use uuid::Uuid;

use crate::{
    error::ServiceError,
    model::{EntityKind, Farm, FarmPatch, NewFarm},
    policy::check_farm_areas,
    ports::{Clock, RegistryStore},
    usecases::guards::ReferenceGuard,
};

pub struct FarmService<St: RegistryStore + ?Sized> {
    store: Arc<St>,
    clock: Arc<dyn Clock>,
}

impl<St: RegistryStore + ?Sized> FarmService<St> {
    pub fn new(store: Arc<St>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    pub async fn create(&self, input: NewFarm) -> Result<Farm, ServiceError> {
        check_farm_areas(input.total_area, input.arable_area, input.vegetation_area)?;

        ReferenceGuard::new(self.store.as_ref())
            .producer(input.producer_id)
            .await?;

        let now = self.clock.now();
        let farm = Farm {
            id: Uuid::new_v4(),
            producer_id: input.producer_id,
            name: input.name,
            city: input.city,
            state: input.state,
            total_area: input.total_area,
            arable_area: input.arable_area,
            vegetation_area: input.vegetation_area,
            created_at: now,
            updated_at: now,
        };

        let created = self.store.insert_farm(&farm).await?;
        tracing::info!(
            farm_id = %created.id,
            producer_id = %created.producer_id,
            "Created farm"
        );
        Ok(created)
    }

    pub async fn list(&self) -> Result<Vec<Farm>, ServiceError> {
        Ok(self.store.list_farms().await?)
    }

    pub async fn get(&self, id: Uuid) -> Result<Farm, ServiceError> {
        ReferenceGuard::new(self.store.as_ref()).farm(id).await
    }

    /// Apply a partial update. The area invariant is checked on the merged
    /// record, so a patch touching one area is judged against the stored
    /// values of the other two.
    pub async fn update(&self, id: Uuid, patch: FarmPatch) -> Result<Farm, ServiceError> {
        let guard = ReferenceGuard::new(self.store.as_ref());
        let mut farm = guard.farm(id).await?;

        if let Some(producer_id) = patch.producer_id {
            guard.producer(producer_id).await?;
        }

        patch.apply_to(&mut farm);
        check_farm_areas(farm.total_area, farm.arable_area, farm.vegetation_area)?;
        farm.updated_at = self.clock.now();

        let updated = self
            .store
            .update_farm(&farm)
            .await
            .map_err(|e| ServiceError::from_write(EntityKind::Farm, e))?;
        tracing::info!(farm_id = %id, "Updated farm");
        Ok(updated)
    }

    /// Delete a farm together with its harvests and crops
    pub async fn delete(&self, id: Uuid) -> Result<(), ServiceError> {
        ReferenceGuard::new(self.store.as_ref()).farm(id).await?;

        self.store
            .delete_farm(id)
            .await
            .map_err(|e| ServiceError::from_write(EntityKind::Farm, e))?;
        tracing::info!(farm_id = %id, "Deleted farm");
        Ok(())
    }
}
