//! Domain models and value objects

use serde::{Deserialize, Serialize};
use std::fmt;
use time::OffsetDateTime;
use uuid::Uuid;

/// The four record kinds managed by the registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Producer,
    Farm,
    Harvest,
    Crop,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Producer => "producer",
            EntityKind::Farm => "farm",
            EntityKind::Harvest => "harvest",
            EntityKind::Crop => "crop",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of national tax identifier held by a producer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DocumentType {
    /// Individual taxpayer (11 digits)
    #[serde(rename = "CPF")]
    Cpf,
    /// Organization taxpayer (14 digits)
    #[serde(rename = "CNPJ")]
    Cnpj,
}

impl DocumentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentType::Cpf => "CPF",
            DocumentType::Cnpj => "CNPJ",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "CPF" => Some(DocumentType::Cpf),
            "CNPJ" => Some(DocumentType::Cnpj),
            _ => None,
        }
    }
}

/// A rural producer, owner of farms
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Producer {
    pub id: Uuid,
    pub name: String,
    pub document_type: DocumentType,
    /// Digits-only tax identifier, unique across producers
    pub document: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// A farm owned by a producer. Areas are in hectares.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Farm {
    pub id: Uuid,
    pub producer_id: Uuid,
    pub name: String,
    pub city: String,
    /// Two-letter state code
    pub state: String,
    pub total_area: f64,
    pub arable_area: f64,
    pub vegetation_area: f64,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// A growing period on a farm
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Harvest {
    pub id: Uuid,
    pub farm_id: Uuid,
    pub year: i32,
    /// Free-form label such as "Safra" or "Safrinha"
    pub season: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// A crop planted during a harvest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Crop {
    pub id: Uuid,
    pub harvest_id: Uuid,
    pub name: String,
    /// Planted area in hectares
    pub area: f64,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Input for registering a producer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProducer {
    pub name: String,
    pub document_type: DocumentType,
    /// Raw tax identifier, punctuation allowed
    pub document: String,
}

/// Input for registering a farm
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewFarm {
    pub producer_id: Uuid,
    pub name: String,
    pub city: String,
    pub state: String,
    pub total_area: f64,
    pub arable_area: f64,
    pub vegetation_area: f64,
}

/// Input for registering a harvest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewHarvest {
    pub farm_id: Uuid,
    pub year: i32,
    pub season: String,
}

/// Input for registering a crop
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCrop {
    pub harvest_id: Uuid,
    pub name: String,
    pub area: f64,
}

/// Partial producer update; absent fields keep their stored value
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProducerPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub document_type: Option<DocumentType>,
    #[serde(default)]
    pub document: Option<String>,
}

impl ProducerPatch {
    pub fn apply_to(&self, producer: &mut Producer) {
        if let Some(name) = &self.name {
            producer.name = name.clone();
        }
        if let Some(document_type) = self.document_type {
            producer.document_type = document_type;
        }
        if let Some(document) = &self.document {
            producer.document = document.clone();
        }
    }
}

/// Partial farm update; absent fields keep their stored value
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FarmPatch {
    #[serde(default)]
    pub producer_id: Option<Uuid>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub total_area: Option<f64>,
    #[serde(default)]
    pub arable_area: Option<f64>,
    #[serde(default)]
    pub vegetation_area: Option<f64>,
}

impl FarmPatch {
    pub fn apply_to(&self, farm: &mut Farm) {
        if let Some(producer_id) = self.producer_id {
            farm.producer_id = producer_id;
        }
        if let Some(name) = &self.name {
            farm.name = name.clone();
        }
        if let Some(city) = &self.city {
            farm.city = city.clone();
        }
        if let Some(state) = &self.state {
            farm.state = state.clone();
        }
        if let Some(total_area) = self.total_area {
            farm.total_area = total_area;
        }
        if let Some(arable_area) = self.arable_area {
            farm.arable_area = arable_area;
        }
        if let Some(vegetation_area) = self.vegetation_area {
            farm.vegetation_area = vegetation_area;
        }
    }
}

/// Partial harvest update; absent fields keep their stored value
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HarvestPatch {
    #[serde(default)]
    pub farm_id: Option<Uuid>,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub season: Option<String>,
}

impl HarvestPatch {
    pub fn apply_to(&self, harvest: &mut Harvest) {
        if let Some(farm_id) = self.farm_id {
            harvest.farm_id = farm_id;
        }
        if let Some(year) = self.year {
            harvest.year = year;
        }
        if let Some(season) = &self.season {
            harvest.season = season.clone();
        }
    }
}

/// Partial crop update; absent fields keep their stored value
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CropPatch {
    #[serde(default)]
    pub harvest_id: Option<Uuid>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub area: Option<f64>,
}

impl CropPatch {
    pub fn apply_to(&self, crop: &mut Crop) {
        if let Some(harvest_id) = self.harvest_id {
            crop.harvest_id = harvest_id;
        }
        if let Some(name) = &self.name {
            crop.name = name.clone();
        }
        if let Some(area) = self.area {
            crop.area = area;
        }
    }
}

/// A producer with the farms it owns, as listed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProducerSummary {
    #[serde(flatten)]
    pub producer: Producer,
    pub farms: Vec<Farm>,
}

/// A producer with its full ownership tree
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProducerDetail {
    #[serde(flatten)]
    pub producer: Producer,
    pub farms: Vec<FarmDetail>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FarmDetail {
    #[serde(flatten)]
    pub farm: Farm,
    pub harvests: Vec<HarvestDetail>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HarvestDetail {
    #[serde(flatten)]
    pub harvest: Harvest,
    pub crops: Vec<Crop>,
}

/// Headline dashboard figures
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardStats {
    pub total_farms: i64,
    pub total_hectares: f64,
    pub total_producers: i64,
    pub total_crops: i64,
}

/// Farm count for one state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateCount {
    pub state: String,
    pub count: i64,
}

/// Planted area summed over every crop with the same name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CropArea {
    pub crop: String,
    pub area: f64,
}

/// Land use category across all farms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LandUseKind {
    Arable,
    Vegetation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LandUse {
    pub kind: LandUseKind,
    pub area: f64,
}
