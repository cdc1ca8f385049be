//! Producer service: document normalization and uniqueness around CRUD

use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    error::ServiceError,
    model::{
        EntityKind, Farm, FarmDetail, HarvestDetail, NewProducer, Producer, ProducerDetail,
        ProducerPatch, ProducerSummary,
    },
    policy::normalize_document,
    ports::{Clock, RegistryStore},
    usecases::guards::{DocumentGuard, ReferenceGuard},
};

pub struct ProducerService<St: RegistryStore + ?Sized> {
    store: Arc<St>,
    clock: Arc<dyn Clock>,
}

impl<St: RegistryStore + ?Sized> ProducerService<St> {
    pub fn new(store: Arc<St>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Register a producer under its normalized document
    pub async fn create(&self, input: NewProducer) -> Result<Producer, ServiceError> {
        let document = normalize_document(&input.document);

        DocumentGuard::new(self.store.as_ref())
            .check_available(&document)
            .await?;

        let now = self.clock.now();
        let producer = Producer {
            id: Uuid::new_v4(),
            name: input.name,
            document_type: input.document_type,
            document,
            created_at: now,
            updated_at: now,
        };

        let created = self.store.insert_producer(&producer).await?;
        tracing::info!(producer_id = %created.id, "Created producer");
        Ok(created)
    }

    /// Every producer, newest first, each with its farms
    pub async fn list(&self) -> Result<Vec<ProducerSummary>, ServiceError> {
        let producers = self.store.list_producers().await?;

        let mut farms_by_owner: HashMap<Uuid, Vec<Farm>> = HashMap::new();
        for farm in self.store.list_farms().await? {
            farms_by_owner.entry(farm.producer_id).or_default().push(farm);
        }

        Ok(producers
            .into_iter()
            .map(|producer| ProducerSummary {
                farms: farms_by_owner.remove(&producer.id).unwrap_or_default(),
                producer,
            })
            .collect())
    }

    pub async fn get(&self, id: Uuid) -> Result<Producer, ServiceError> {
        ReferenceGuard::new(self.store.as_ref()).producer(id).await
    }

    /// Load a producer together with its farms, harvests and crops
    pub async fn detail(&self, id: Uuid) -> Result<ProducerDetail, ServiceError> {
        let producer = self.get(id).await?;

        let mut farms = Vec::new();
        for farm in self.store.list_farms_by_producer(id).await? {
            let mut harvests = Vec::new();
            for harvest in self.store.list_harvests_by_farm(farm.id).await? {
                let crops = self.store.list_crops_by_harvest(harvest.id).await?;
                harvests.push(HarvestDetail { harvest, crops });
            }
            farms.push(FarmDetail { farm, harvests });
        }

        Ok(ProducerDetail { producer, farms })
    }

    pub async fn update(&self, id: Uuid, patch: ProducerPatch) -> Result<Producer, ServiceError> {
        let guard = ReferenceGuard::new(self.store.as_ref());
        let mut producer = guard.producer(id).await?;

        let patch = ProducerPatch {
            document: patch.document.as_deref().map(normalize_document),
            ..patch
        };

        if let Some(document) = &patch.document {
            DocumentGuard::new(self.store.as_ref())
                .check_available_excluding(document, id)
                .await?;
        }

        patch.apply_to(&mut producer);
        producer.updated_at = self.clock.now();

        let updated = self
            .store
            .update_producer(&producer)
            .await
            .map_err(|e| ServiceError::from_write(EntityKind::Producer, e))?;
        tracing::info!(producer_id = %id, "Updated producer");
        Ok(updated)
    }

    /// Delete a producer and, through the store, everything it owns
    pub async fn delete(&self, id: Uuid) -> Result<(), ServiceError> {
        ReferenceGuard::new(self.store.as_ref()).producer(id).await?;

        self.store
            .delete_producer(id)
            .await
            .map_err(|e| ServiceError::from_write(EntityKind::Producer, e))?;
        tracing::info!(producer_id = %id, "Deleted producer");
        Ok(())
    }
}
