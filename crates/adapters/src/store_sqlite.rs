//! SQLite registry store implementation

use async_trait::async_trait;
use agro_registry_domain::{
    Crop, DocumentType, EntityKind, Farm, Harvest, Producer, RegistryStore, ReportStore,
    StoreError,
};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteQueryResult};
use sqlx::SqlitePool;
use std::path::Path;
use std::str::FromStr;
use time::macros::format_description;
use time::{OffsetDateTime, PrimitiveDateTime, UtcOffset};
use uuid::Uuid;

type ProducerRow = (String, String, String, String, String, String);
type FarmRow = (
    String,
    String,
    String,
    String,
    String,
    f64,
    f64,
    f64,
    String,
    String,
);
type HarvestRow = (String, String, i64, String, String, String);
type CropRow = (String, String, String, f64, String, String);

const PRODUCER_COLUMNS: &str = "id, name, document_type, document, created_at, updated_at";
const FARM_COLUMNS: &str = "id, producer_id, name, city, state, total_area, arable_area, \
                            vegetation_area, created_at, updated_at";
const HARVEST_COLUMNS: &str = "id, farm_id, year, season, created_at, updated_at";
const CROP_COLUMNS: &str = "id, harvest_id, name, area, created_at, updated_at";

/// SQLite-backed registry store
///
/// Foreign keys are declared `ON DELETE CASCADE` and enforced on every
/// connection, which gives the cascading delete contract of the port.
pub struct SqliteRegistryStore {
    pool: SqlitePool,
}

impl SqliteRegistryStore {
    /// Open (creating if needed) a database file and apply the schema
    pub async fn new(db_path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let db_path = db_path.as_ref();

        // Create parent directories if needed
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    StoreError::Database(format!("Failed to create directory: {}", e))
                })?;
            }
        }

        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(db_error)?;

        let store = Self { pool };
        store.run_migrations().await?;

        tracing::debug!(path = %db_path.display(), "Opened SQLite registry");
        Ok(store)
    }

    /// Create an in-memory SQLite store (for testing)
    pub async fn in_memory() -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(db_error)?
            .foreign_keys(true);

        // A single connection that never idles out, or the database vanishes
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .map_err(db_error)?;

        let store = Self { pool };
        store.run_migrations().await?;

        Ok(store)
    }

    /// Open an existing database file without creating it or touching the
    /// schema
    pub async fn open_existing(db_path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::new()
            .filename(db_path.as_ref())
            .create_if_missing(false)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(db_error)?;

        Ok(Self { pool })
    }

    /// Cheap round trip used by `doctor`
    pub async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(())
    }

    async fn run_migrations(&self) -> Result<(), StoreError> {
        let statements = [
            r#"
            CREATE TABLE IF NOT EXISTS producers (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                document_type TEXT NOT NULL,
                document TEXT NOT NULL UNIQUE,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS farms (
                id TEXT PRIMARY KEY,
                producer_id TEXT NOT NULL REFERENCES producers(id) ON DELETE CASCADE,
                name TEXT NOT NULL,
                city TEXT NOT NULL,
                state TEXT NOT NULL,
                total_area REAL NOT NULL,
                arable_area REAL NOT NULL,
                vegetation_area REAL NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS harvests (
                id TEXT PRIMARY KEY,
                farm_id TEXT NOT NULL REFERENCES farms(id) ON DELETE CASCADE,
                year INTEGER NOT NULL,
                season TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS crops (
                id TEXT PRIMARY KEY,
                harvest_id TEXT NOT NULL REFERENCES harvests(id) ON DELETE CASCADE,
                name TEXT NOT NULL,
                area REAL NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            "#,
            "CREATE INDEX IF NOT EXISTS idx_farms_producer ON farms(producer_id)",
            "CREATE INDEX IF NOT EXISTS idx_harvests_farm ON harvests(farm_id)",
            "CREATE INDEX IF NOT EXISTS idx_crops_harvest ON crops(harvest_id)",
        ];

        for statement in statements {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(db_error)?;
        }

        Ok(())
    }
}

fn db_error(e: sqlx::Error) -> StoreError {
    StoreError::Database(e.to_string())
}

/// Map write failures, surfacing the uniqueness constraint distinctly
fn write_error(e: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db) = &e {
        if db.is_unique_violation() {
            return StoreError::Conflict(db.message().to_string());
        }
    }
    db_error(e)
}

/// Map write failures on a table whose only foreign key points at `parent`
fn child_write_error(parent: EntityKind) -> impl Fn(sqlx::Error) -> StoreError {
    move |e| {
        if let sqlx::Error::Database(db) = &e {
            if db.is_foreign_key_violation() {
                return StoreError::MissingParent(parent);
            }
        }
        write_error(e)
    }
}

fn expect_row(result: SqliteQueryResult, id: Uuid) -> Result<(), StoreError> {
    if result.rows_affected() == 0 {
        return Err(StoreError::NotFound(id.to_string()));
    }
    Ok(())
}

// Fixed width so that text ordering matches time ordering
fn format_timestamp(at: OffsetDateTime) -> Result<String, StoreError> {
    at.to_offset(UtcOffset::UTC)
        .format(format_description!(
            "[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:6]Z"
        ))
        .map_err(|e| StoreError::Serialization(e.to_string()))
}

fn parse_timestamp(value: &str) -> Result<OffsetDateTime, StoreError> {
    PrimitiveDateTime::parse(
        value,
        format_description!("[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:6]Z"),
    )
    .map(PrimitiveDateTime::assume_utc)
    .map_err(|e| StoreError::Serialization(e.to_string()))
}

fn parse_id(value: &str) -> Result<Uuid, StoreError> {
    Uuid::parse_str(value).map_err(|e| StoreError::Serialization(e.to_string()))
}

fn producer_from_row(row: ProducerRow) -> Result<Producer, StoreError> {
    let (id, name, document_type, document, created_at, updated_at) = row;
    let document_type = DocumentType::parse(&document_type).ok_or_else(|| {
        StoreError::Serialization(format!("unknown document type: {}", document_type))
    })?;

    Ok(Producer {
        id: parse_id(&id)?,
        name,
        document_type,
        document,
        created_at: parse_timestamp(&created_at)?,
        updated_at: parse_timestamp(&updated_at)?,
    })
}

fn farm_from_row(row: FarmRow) -> Result<Farm, StoreError> {
    let (
        id,
        producer_id,
        name,
        city,
        state,
        total_area,
        arable_area,
        vegetation_area,
        created_at,
        updated_at,
    ) = row;

    Ok(Farm {
        id: parse_id(&id)?,
        producer_id: parse_id(&producer_id)?,
        name,
        city,
        state,
        total_area,
        arable_area,
        vegetation_area,
        created_at: parse_timestamp(&created_at)?,
        updated_at: parse_timestamp(&updated_at)?,
    })
}

fn harvest_from_row(row: HarvestRow) -> Result<Harvest, StoreError> {
    let (id, farm_id, year, season, created_at, updated_at) = row;
    let year = i32::try_from(year).map_err(|e| StoreError::Serialization(e.to_string()))?;

    Ok(Harvest {
        id: parse_id(&id)?,
        farm_id: parse_id(&farm_id)?,
        year,
        season,
        created_at: parse_timestamp(&created_at)?,
        updated_at: parse_timestamp(&updated_at)?,
    })
}

fn crop_from_row(row: CropRow) -> Result<Crop, StoreError> {
    let (id, harvest_id, name, area, created_at, updated_at) = row;

    Ok(Crop {
        id: parse_id(&id)?,
        harvest_id: parse_id(&harvest_id)?,
        name,
        area,
        created_at: parse_timestamp(&created_at)?,
        updated_at: parse_timestamp(&updated_at)?,
    })
}

#[async_trait]
impl RegistryStore for SqliteRegistryStore {
    async fn get_producer(&self, id: Uuid) -> Result<Option<Producer>, StoreError> {
        let row: Option<ProducerRow> =
            sqlx::query_as(&format!("SELECT {PRODUCER_COLUMNS} FROM producers WHERE id = ?"))
                .bind(id.to_string())
                .fetch_optional(&self.pool)
                .await
                .map_err(db_error)?;

        row.map(producer_from_row).transpose()
    }

    async fn find_producer_by_document(
        &self,
        document: &str,
        exclude: Option<Uuid>,
    ) -> Result<Option<Producer>, StoreError> {
        let row: Option<ProducerRow> = sqlx::query_as(&format!(
            "SELECT {PRODUCER_COLUMNS} FROM producers \
             WHERE document = ? AND (? IS NULL OR id <> ?) LIMIT 1"
        ))
        .bind(document)
        .bind(exclude.map(|id| id.to_string()))
        .bind(exclude.map(|id| id.to_string()))
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;

        row.map(producer_from_row).transpose()
    }

    async fn list_producers(&self) -> Result<Vec<Producer>, StoreError> {
        let rows: Vec<ProducerRow> = sqlx::query_as(&format!(
            "SELECT {PRODUCER_COLUMNS} FROM producers ORDER BY created_at DESC, rowid DESC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        rows.into_iter().map(producer_from_row).collect()
    }

    async fn insert_producer(&self, producer: &Producer) -> Result<Producer, StoreError> {
        sqlx::query(
            r#"
            INSERT INTO producers (id, name, document_type, document, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(producer.id.to_string())
        .bind(&producer.name)
        .bind(producer.document_type.as_str())
        .bind(&producer.document)
        .bind(format_timestamp(producer.created_at)?)
        .bind(format_timestamp(producer.updated_at)?)
        .execute(&self.pool)
        .await
        .map_err(write_error)?;

        Ok(producer.clone())
    }

    async fn update_producer(&self, producer: &Producer) -> Result<Producer, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE producers
            SET name = ?, document_type = ?, document = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&producer.name)
        .bind(producer.document_type.as_str())
        .bind(&producer.document)
        .bind(format_timestamp(producer.updated_at)?)
        .bind(producer.id.to_string())
        .execute(&self.pool)
        .await
        .map_err(write_error)?;

        expect_row(result, producer.id)?;
        Ok(producer.clone())
    }

    async fn delete_producer(&self, id: Uuid) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM producers WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(write_error)?;

        expect_row(result, id)
    }

    async fn get_farm(&self, id: Uuid) -> Result<Option<Farm>, StoreError> {
        let row: Option<FarmRow> =
            sqlx::query_as(&format!("SELECT {FARM_COLUMNS} FROM farms WHERE id = ?"))
                .bind(id.to_string())
                .fetch_optional(&self.pool)
                .await
                .map_err(db_error)?;

        row.map(farm_from_row).transpose()
    }

    async fn list_farms(&self) -> Result<Vec<Farm>, StoreError> {
        let rows: Vec<FarmRow> = sqlx::query_as(&format!(
            "SELECT {FARM_COLUMNS} FROM farms ORDER BY created_at DESC, rowid DESC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        rows.into_iter().map(farm_from_row).collect()
    }

    async fn list_farms_by_producer(&self, producer_id: Uuid) -> Result<Vec<Farm>, StoreError> {
        let rows: Vec<FarmRow> = sqlx::query_as(&format!(
            "SELECT {FARM_COLUMNS} FROM farms WHERE producer_id = ? \
             ORDER BY created_at DESC, rowid DESC"
        ))
        .bind(producer_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        rows.into_iter().map(farm_from_row).collect()
    }

    async fn insert_farm(&self, farm: &Farm) -> Result<Farm, StoreError> {
        sqlx::query(
            r#"
            INSERT INTO farms
            (id, producer_id, name, city, state, total_area, arable_area, vegetation_area,
             created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(farm.id.to_string())
        .bind(farm.producer_id.to_string())
        .bind(&farm.name)
        .bind(&farm.city)
        .bind(&farm.state)
        .bind(farm.total_area)
        .bind(farm.arable_area)
        .bind(farm.vegetation_area)
        .bind(format_timestamp(farm.created_at)?)
        .bind(format_timestamp(farm.updated_at)?)
        .execute(&self.pool)
        .await
        .map_err(child_write_error(EntityKind::Producer))?;

        Ok(farm.clone())
    }

    async fn update_farm(&self, farm: &Farm) -> Result<Farm, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE farms
            SET producer_id = ?, name = ?, city = ?, state = ?,
                total_area = ?, arable_area = ?, vegetation_area = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(farm.producer_id.to_string())
        .bind(&farm.name)
        .bind(&farm.city)
        .bind(&farm.state)
        .bind(farm.total_area)
        .bind(farm.arable_area)
        .bind(farm.vegetation_area)
        .bind(format_timestamp(farm.updated_at)?)
        .bind(farm.id.to_string())
        .execute(&self.pool)
        .await
        .map_err(child_write_error(EntityKind::Producer))?;

        expect_row(result, farm.id)?;
        Ok(farm.clone())
    }

    async fn delete_farm(&self, id: Uuid) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM farms WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(write_error)?;

        expect_row(result, id)
    }

    async fn get_harvest(&self, id: Uuid) -> Result<Option<Harvest>, StoreError> {
        let row: Option<HarvestRow> =
            sqlx::query_as(&format!("SELECT {HARVEST_COLUMNS} FROM harvests WHERE id = ?"))
                .bind(id.to_string())
                .fetch_optional(&self.pool)
                .await
                .map_err(db_error)?;

        row.map(harvest_from_row).transpose()
    }

    async fn list_harvests(&self) -> Result<Vec<Harvest>, StoreError> {
        let rows: Vec<HarvestRow> = sqlx::query_as(&format!(
            "SELECT {HARVEST_COLUMNS} FROM harvests \
             ORDER BY year DESC, created_at DESC, rowid DESC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        rows.into_iter().map(harvest_from_row).collect()
    }

    async fn list_harvests_by_farm(&self, farm_id: Uuid) -> Result<Vec<Harvest>, StoreError> {
        let rows: Vec<HarvestRow> = sqlx::query_as(&format!(
            "SELECT {HARVEST_COLUMNS} FROM harvests WHERE farm_id = ? \
             ORDER BY year DESC, created_at DESC, rowid DESC"
        ))
        .bind(farm_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        rows.into_iter().map(harvest_from_row).collect()
    }

    async fn insert_harvest(&self, harvest: &Harvest) -> Result<Harvest, StoreError> {
        sqlx::query(
            r#"
            INSERT INTO harvests (id, farm_id, year, season, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(harvest.id.to_string())
        .bind(harvest.farm_id.to_string())
        .bind(harvest.year)
        .bind(&harvest.season)
        .bind(format_timestamp(harvest.created_at)?)
        .bind(format_timestamp(harvest.updated_at)?)
        .execute(&self.pool)
        .await
        .map_err(child_write_error(EntityKind::Farm))?;

        Ok(harvest.clone())
    }

    async fn update_harvest(&self, harvest: &Harvest) -> Result<Harvest, StoreError> {
        let result = sqlx::query(
            "UPDATE harvests SET farm_id = ?, year = ?, season = ?, updated_at = ? WHERE id = ?",
        )
        .bind(harvest.farm_id.to_string())
        .bind(harvest.year)
        .bind(&harvest.season)
        .bind(format_timestamp(harvest.updated_at)?)
        .bind(harvest.id.to_string())
        .execute(&self.pool)
        .await
        .map_err(child_write_error(EntityKind::Farm))?;

        expect_row(result, harvest.id)?;
        Ok(harvest.clone())
    }

    async fn delete_harvest(&self, id: Uuid) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM harvests WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(write_error)?;

        expect_row(result, id)
    }

    async fn get_crop(&self, id: Uuid) -> Result<Option<Crop>, StoreError> {
        let row: Option<CropRow> =
            sqlx::query_as(&format!("SELECT {CROP_COLUMNS} FROM crops WHERE id = ?"))
                .bind(id.to_string())
                .fetch_optional(&self.pool)
                .await
                .map_err(db_error)?;

        row.map(crop_from_row).transpose()
    }

    async fn list_crops(&self) -> Result<Vec<Crop>, StoreError> {
        let rows: Vec<CropRow> = sqlx::query_as(&format!(
            "SELECT {CROP_COLUMNS} FROM crops ORDER BY created_at DESC, rowid DESC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        rows.into_iter().map(crop_from_row).collect()
    }

    async fn list_crops_by_harvest(&self, harvest_id: Uuid) -> Result<Vec<Crop>, StoreError> {
        let rows: Vec<CropRow> = sqlx::query_as(&format!(
            "SELECT {CROP_COLUMNS} FROM crops WHERE harvest_id = ? \
             ORDER BY created_at DESC, rowid DESC"
        ))
        .bind(harvest_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        rows.into_iter().map(crop_from_row).collect()
    }

    async fn insert_crop(&self, crop: &Crop) -> Result<Crop, StoreError> {
        sqlx::query(
            r#"
            INSERT INTO crops (id, harvest_id, name, area, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(crop.id.to_string())
        .bind(crop.harvest_id.to_string())
        .bind(&crop.name)
        .bind(crop.area)
        .bind(format_timestamp(crop.created_at)?)
        .bind(format_timestamp(crop.updated_at)?)
        .execute(&self.pool)
        .await
        .map_err(child_write_error(EntityKind::Harvest))?;

        Ok(crop.clone())
    }

    async fn update_crop(&self, crop: &Crop) -> Result<Crop, StoreError> {
        let result = sqlx::query(
            "UPDATE crops SET harvest_id = ?, name = ?, area = ?, updated_at = ? WHERE id = ?",
        )
        .bind(crop.harvest_id.to_string())
        .bind(&crop.name)
        .bind(crop.area)
        .bind(format_timestamp(crop.updated_at)?)
        .bind(crop.id.to_string())
        .execute(&self.pool)
        .await
        .map_err(child_write_error(EntityKind::Harvest))?;

        expect_row(result, crop.id)?;
        Ok(crop.clone())
    }

    async fn delete_crop(&self, id: Uuid) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM crops WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(write_error)?;

        expect_row(result, id)
    }
}

#[async_trait]
impl ReportStore for SqliteRegistryStore {
    async fn count_producers(&self) -> Result<i64, StoreError> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM producers")
            .fetch_one(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(count.0)
    }

    async fn count_farms(&self) -> Result<i64, StoreError> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM farms")
            .fetch_one(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(count.0)
    }

    async fn count_crops(&self) -> Result<i64, StoreError> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM crops")
            .fetch_one(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(count.0)
    }

    async fn sum_total_area(&self) -> Result<Option<f64>, StoreError> {
        let sum: (Option<f64>,) = sqlx::query_as("SELECT SUM(total_area) FROM farms")
            .fetch_one(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(sum.0)
    }

    async fn farms_by_state(&self) -> Result<Vec<(String, i64)>, StoreError> {
        sqlx::query_as(
            r#"
            SELECT state, COUNT(*) AS farm_count
            FROM farms
            GROUP BY state
            ORDER BY farm_count DESC, state ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)
    }

    async fn crop_area_by_name(&self) -> Result<Vec<(String, Option<f64>)>, StoreError> {
        sqlx::query_as(
            r#"
            SELECT name, SUM(area) AS planted
            FROM crops
            GROUP BY name
            ORDER BY planted DESC, name ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)
    }

    async fn land_use_sums(&self) -> Result<(Option<f64>, Option<f64>), StoreError> {
        sqlx::query_as("SELECT SUM(arable_area), SUM(vegetation_area) FROM farms")
            .fetch_one(&self.pool)
            .await
            .map_err(db_error)
    }
}
