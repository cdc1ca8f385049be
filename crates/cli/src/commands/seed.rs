//! Seed command - load the sample dataset through the services

use anyhow::{Context, Result};
use agro_registry_domain::usecases::{
    CropService, DashboardService, FarmService, HarvestService, ProducerService,
};
use agro_registry_domain::{
    Clock, DocumentType, NewCrop, NewFarm, NewHarvest, NewProducer, RegistryStore, ReportStore,
    SystemClock,
};
use std::path::PathBuf;
use std::sync::Arc;
use uuid::Uuid;

use crate::args::SeedArgs;
use crate::config::AppConfig;

/// (name, document type, document)
const PRODUCERS: [(&str, DocumentType, &str); 5] = [
    ("João Silva Santos", DocumentType::Cpf, "12345678901"),
    ("Maria Oliveira Costa", DocumentType::Cpf, "98765432100"),
    ("Agropecuária Três Irmãos Ltda", DocumentType::Cnpj, "12345678000195"),
    ("Fazendas Reunidas do Cerrado S.A.", DocumentType::Cnpj, "98765432000176"),
    ("Carlos Eduardo Ferreira", DocumentType::Cpf, "11122233344"),
];

/// (producer index, name, city, state, total, arable, vegetation)
const FARMS: [(usize, &str, &str, &str, f64, f64, f64); 8] = [
    (0, "Fazenda São João", "Ribeirão Preto", "SP", 150.0, 120.0, 30.0),
    (0, "Sítio Boa Vista", "Franca", "SP", 80.0, 60.0, 20.0),
    (1, "Fazenda Santa Maria", "Uberlândia", "MG", 200.0, 160.0, 40.0),
    (2, "Fazenda Três Irmãos", "Sorriso", "MT", 1000.0, 800.0, 200.0),
    (2, "Fazenda Nova Esperança", "Lucas do Rio Verde", "MT", 750.0, 600.0, 150.0),
    (3, "Fazenda Cerrado Grande", "Luís Eduardo Magalhães", "BA", 2000.0, 1600.0, 400.0),
    (3, "Fazenda Planalto", "Barreiras", "BA", 1500.0, 1200.0, 300.0),
    (4, "Fazenda Bela Vista", "Rio Verde", "GO", 300.0, 240.0, 60.0),
];

/// (farm index, year, season)
const HARVESTS: [(usize, i32, &str); 11] = [
    (0, 2023, "Safra"),
    (0, 2023, "Safrinha"),
    (1, 2023, "Safra"),
    (2, 2023, "Safra"),
    (3, 2023, "Safra"),
    (3, 2023, "Safrinha"),
    (4, 2024, "Safra"),
    (5, 2024, "Safra"),
    (5, 2024, "Safrinha"),
    (6, 2024, "Safra"),
    (7, 2024, "Safra"),
];

/// (harvest index, name, area)
const CROPS: [(usize, &str, f64); 25] = [
    (0, "Soja", 80.0),
    (0, "Milho", 40.0),
    (1, "Milho", 60.0),
    (1, "Feijão", 20.0),
    (2, "Café", 35.0),
    (2, "Cana-de-açúcar", 25.0),
    (3, "Soja", 100.0),
    (3, "Milho", 60.0),
    (4, "Soja", 400.0),
    (4, "Algodão", 200.0),
    (4, "Milho", 200.0),
    (5, "Milho", 300.0),
    (5, "Feijão", 100.0),
    (6, "Soja", 350.0),
    (6, "Algodão", 250.0),
    (7, "Soja", 800.0),
    (7, "Algodão", 400.0),
    (7, "Milho", 400.0),
    (8, "Milho", 600.0),
    (8, "Feijão", 200.0),
    (9, "Soja", 600.0),
    (9, "Milho", 400.0),
    (9, "Algodão", 200.0),
    (10, "Soja", 150.0),
    (10, "Milho", 90.0),
];

/// Record counts after a seed run
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SeedSummary {
    pub producers: i64,
    pub farms: i64,
    pub harvests: usize,
    pub crops: i64,
    pub total_hectares: f64,
}

pub async fn execute(args: SeedArgs, config_path: Option<PathBuf>) -> Result<()> {
    let config = AppConfig::load(config_path.as_deref())?;
    let store = super::open_store(&config).await?;

    let summary = seed_registry(store, Arc::new(SystemClock), args.reset).await?;

    println!("Seed complete");
    println!("  Producers:  {}", summary.producers);
    println!("  Farms:      {}", summary.farms);
    println!("  Harvests:   {}", summary.harvests);
    println!("  Crops:      {}", summary.crops);
    println!("  Total area: {} hectares", summary.total_hectares);

    Ok(())
}

/// Insert the sample dataset, optionally wiping existing producers first.
///
/// Every record goes through its service so the integrity guards run.
pub(crate) async fn seed_registry<S>(
    store: Arc<S>,
    clock: Arc<dyn Clock>,
    reset: bool,
) -> Result<SeedSummary>
where
    S: RegistryStore + ReportStore + 'static,
{
    let producers = ProducerService::new(Arc::clone(&store), Arc::clone(&clock));
    let farms = FarmService::new(Arc::clone(&store), Arc::clone(&clock));
    let harvests = HarvestService::new(Arc::clone(&store), Arc::clone(&clock));
    let crops = CropService::new(Arc::clone(&store), clock);

    let existing = producers.list().await?;
    if !existing.is_empty() {
        if !reset {
            anyhow::bail!(
                "Registry already holds {} producers. Use --reset to replace them.",
                existing.len()
            );
        }
        for summary in existing {
            producers.delete(summary.producer.id).await?;
        }
        tracing::info!("Cleared existing registry");
    }

    let mut producer_ids: Vec<Uuid> = Vec::with_capacity(PRODUCERS.len());
    for (name, document_type, document) in PRODUCERS {
        let producer = producers
            .create(NewProducer {
                name: name.to_string(),
                document_type,
                document: document.to_string(),
            })
            .await
            .with_context(|| format!("Failed to seed producer {}", name))?;
        producer_ids.push(producer.id);
    }

    let mut farm_ids: Vec<Uuid> = Vec::with_capacity(FARMS.len());
    for (owner, name, city, state, total, arable, vegetation) in FARMS {
        let farm = farms
            .create(NewFarm {
                producer_id: producer_ids[owner],
                name: name.to_string(),
                city: city.to_string(),
                state: state.to_string(),
                total_area: total,
                arable_area: arable,
                vegetation_area: vegetation,
            })
            .await
            .with_context(|| format!("Failed to seed farm {}", name))?;
        farm_ids.push(farm.id);
    }

    let mut harvest_ids: Vec<Uuid> = Vec::with_capacity(HARVESTS.len());
    for (farm, year, season) in HARVESTS {
        let harvest = harvests
            .create(NewHarvest {
                farm_id: farm_ids[farm],
                year,
                season: season.to_string(),
            })
            .await
            .with_context(|| format!("Failed to seed harvest {} {}", season, year))?;
        harvest_ids.push(harvest.id);
    }

    for (harvest, name, area) in CROPS {
        crops
            .create(NewCrop {
                harvest_id: harvest_ids[harvest],
                name: name.to_string(),
                area,
            })
            .await
            .with_context(|| format!("Failed to seed crop {}", name))?;
    }

    let stats = DashboardService::new(store).stats().await?;
    let summary = SeedSummary {
        producers: stats.total_producers,
        farms: stats.total_farms,
        harvests: harvests.list().await?.len(),
        crops: stats.total_crops,
        total_hectares: stats.total_hectares,
    };

    tracing::info!(
        producers = summary.producers,
        farms = summary.farms,
        harvests = summary.harvests,
        crops = summary.crops,
        "Seeded registry"
    );
    Ok(summary)
}
