use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::{types::Json, PgPool};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::repo_types::{Plant, PlantRow};
use crate::store::{StoreError, StoreResult};

#[async_trait]
pub trait PlantStore: Send + Sync {
    /// Active plants, oldest first.
    async fn list_active(&self) -> StoreResult<Vec<Plant>>;
    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Plant>>;
    async fn insert(&self, plant: Plant) -> StoreResult<Plant>;
    async fn update(&self, plant: Plant) -> StoreResult<Plant>;
}

const PLANT_COLUMNS: &str = r#"
    id, name, plant_type, plant_characteristics, care_requirements,
    age_range, growth_stages, is_active, created_at, updated_at
"#;

#[derive(Clone)]
pub struct PgPlantStore {
    db: PgPool,
}

impl PgPlantStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl PlantStore for PgPlantStore {
    async fn list_active(&self) -> StoreResult<Vec<Plant>> {
        let sql = format!(
            "SELECT {PLANT_COLUMNS} FROM plants WHERE is_active ORDER BY created_at ASC"
        );
        let rows = sqlx::query_as::<_, PlantRow>(&sql)
            .fetch_all(&self.db)
            .await?;
        Ok(rows.into_iter().map(Plant::from).collect())
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Plant>> {
        let sql = format!("SELECT {PLANT_COLUMNS} FROM plants WHERE id = $1");
        let row = sqlx::query_as::<_, PlantRow>(&sql)
            .bind(id)
            .fetch_optional(&self.db)
            .await?;
        Ok(row.map(Plant::from))
    }

    async fn insert(&self, plant: Plant) -> StoreResult<Plant> {
        let sql = format!(
            r#"
            INSERT INTO plants ({PLANT_COLUMNS})
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {PLANT_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, PlantRow>(&sql)
            .bind(plant.id)
            .bind(&plant.name)
            .bind(&plant.plant_type)
            .bind(&plant.plant_characteristics)
            .bind(Json(&plant.care_requirements))
            .bind(&plant.age_range)
            .bind(&plant.growth_stages)
            .bind(plant.is_active)
            .bind(plant.created_at)
            .bind(plant.updated_at)
            .fetch_one(&self.db)
            .await?;
        Ok(row.into())
    }

    async fn update(&self, plant: Plant) -> StoreResult<Plant> {
        let sql = format!(
            r#"
            UPDATE plants
            SET name = $2, plant_type = $3, plant_characteristics = $4,
                care_requirements = $5, age_range = $6, growth_stages = $7,
                is_active = $8, updated_at = $9
            WHERE id = $1
            RETURNING {PLANT_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, PlantRow>(&sql)
            .bind(plant.id)
            .bind(&plant.name)
            .bind(&plant.plant_type)
            .bind(&plant.plant_characteristics)
            .bind(Json(&plant.care_requirements))
            .bind(&plant.age_range)
            .bind(&plant.growth_stages)
            .bind(plant.is_active)
            .bind(plant.updated_at)
            .fetch_optional(&self.db)
            .await?;
        row.map(Plant::from).ok_or(StoreError::Stale)
    }
}

/// Process-local [`PlantStore`].
#[derive(Default)]
pub struct MemoryPlantStore {
    plants: RwLock<HashMap<Uuid, Plant>>,
}

impl MemoryPlantStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PlantStore for MemoryPlantStore {
    async fn list_active(&self) -> StoreResult<Vec<Plant>> {
        let mut active: Vec<Plant> = self
            .plants
            .read()
            .await
            .values()
            .filter(|p| p.is_active)
            .cloned()
            .collect();
        active.sort_by_key(|p| p.created_at);
        Ok(active)
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Plant>> {
        Ok(self.plants.read().await.get(&id).cloned())
    }

    async fn insert(&self, plant: Plant) -> StoreResult<Plant> {
        self.plants.write().await.insert(plant.id, plant.clone());
        Ok(plant)
    }

    async fn update(&self, plant: Plant) -> StoreResult<Plant> {
        let mut plants = self.plants.write().await;
        match plants.get_mut(&plant.id) {
            Some(slot) => {
                *slot = plant.clone();
                Ok(plant)
            }
            None => Err(StoreError::Stale),
        }
    }
}
