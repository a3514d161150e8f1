use time::OffsetDateTime;
use tracing::info;
use uuid::Uuid;

use super::dto::{CreatePlantRequest, PlantRemovedResponse, UpdatePlantRequest};
use super::repo_types::Plant;
use crate::{error::AppError, state::AppState};

fn required(value: &str, field: &str) -> Result<String, AppError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::InvalidData(format!("{field} is required")));
    }
    Ok(trimmed.to_string())
}

fn plant_not_found() -> AppError {
    AppError::NotFound("Plant not found".into())
}

async fn load_plant(state: &AppState, id: Uuid) -> Result<Plant, AppError> {
    state
        .plants
        .find_by_id(id)
        .await?
        .ok_or_else(plant_not_found)
}

pub async fn list(state: &AppState) -> Result<Vec<Plant>, AppError> {
    Ok(state.plants.list_active().await?)
}

pub async fn get(state: &AppState, id: Uuid) -> Result<Plant, AppError> {
    load_plant(state, id).await
}

pub async fn create(state: &AppState, req: CreatePlantRequest) -> Result<Plant, AppError> {
    let name = required(&req.name, "Plant name")?;
    let plant_type = required(&req.plant_type, "Plant type")?;

    let mut plant = Plant::new(name, plant_type, OffsetDateTime::now_utc());
    plant.plant_characteristics = req.plant_characteristics;
    plant.care_requirements = req.care_requirements.unwrap_or_default();
    plant.age_range = req.age_range;
    plant.growth_stages = req.growth_stages.unwrap_or_default();

    let plant = state.plants.insert(plant).await?;
    info!(plant_id = %plant.id, name = %plant.name, "plant created");
    Ok(plant)
}

pub async fn update(
    state: &AppState,
    id: Uuid,
    req: UpdatePlantRequest,
) -> Result<Plant, AppError> {
    let mut plant = load_plant(state, id).await?;

    if let Some(name) = req.name {
        plant.name = required(&name, "Plant name")?;
    }
    if let Some(plant_type) = req.plant_type {
        plant.plant_type = required(&plant_type, "Plant type")?;
    }
    if let Some(characteristics) = req.plant_characteristics {
        plant.plant_characteristics = Some(characteristics);
    }
    if let Some(care) = req.care_requirements {
        plant.care_requirements.merge(care);
    }
    if let Some(age_range) = req.age_range {
        plant.age_range = Some(age_range);
    }
    if let Some(stages) = req.growth_stages {
        plant.growth_stages = stages;
    }
    plant.updated_at = OffsetDateTime::now_utc();

    let plant = state.plants.update(plant).await?;
    info!(plant_id = %plant.id, "plant updated");
    Ok(plant)
}

pub async fn remove(state: &AppState, id: Uuid) -> Result<PlantRemovedResponse, AppError> {
    let mut plant = load_plant(state, id).await?;
    plant.is_active = false;
    plant.updated_at = OffsetDateTime::now_utc();
    state.plants.update(plant).await?;

    info!(plant_id = %id, "plant removed");
    Ok(PlantRemovedResponse {
        message: "Plant removed".into(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plants::repo_types::CareRequirements;

    fn create_req(name: &str, plant_type: &str) -> CreatePlantRequest {
        CreatePlantRequest {
            name: name.into(),
            plant_type: plant_type.into(),
            plant_characteristics: None,
            care_requirements: Some(CareRequirements {
                watering: Some("daily".into()),
                ..Default::default()
            }),
            age_range: None,
            growth_stages: Some(vec!["seedling".into(), "mature".into()]),
        }
    }

    #[tokio::test]
    async fn create_requires_name_and_type() {
        let state = AppState::fake();
        assert!(matches!(
            create(&state, create_req(" ", "herb")).await,
            Err(AppError::InvalidData(_))
        ));
        assert!(matches!(
            create(&state, create_req("Basil", "")).await,
            Err(AppError::InvalidData(_))
        ));
        let basil = create(&state, create_req("Basil", "herb")).await.unwrap();
        assert!(basil.is_active);
        assert_eq!(basil.growth_stages.len(), 2);
    }

    #[tokio::test]
    async fn update_is_partial() {
        let state = AppState::fake();
        let basil = create(&state, create_req("Basil", "herb")).await.unwrap();

        let updated = update(
            &state,
            basil.id,
            UpdatePlantRequest {
                age_range: Some("0-6 months".into()),
                care_requirements: Some(CareRequirements {
                    fertilization: Some("biweekly".into()),
                    ..Default::default()
                }),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(updated.name, "Basil");
        assert_eq!(updated.age_range.as_deref(), Some("0-6 months"));
        assert_eq!(updated.care_requirements.watering.as_deref(), Some("daily"));
        assert_eq!(
            updated.care_requirements.fertilization.as_deref(),
            Some("biweekly")
        );
        assert_eq!(updated.growth_stages, basil.growth_stages);
    }

    #[tokio::test]
    async fn remove_is_soft() {
        let state = AppState::fake();
        let basil = create(&state, create_req("Basil", "herb")).await.unwrap();
        let out = remove(&state, basil.id).await.unwrap();
        assert_eq!(out.message, "Plant removed");

        assert!(list(&state).await.unwrap().is_empty());
        let still_there = get(&state, basil.id).await.unwrap();
        assert!(!still_there.is_active);
    }

    #[tokio::test]
    async fn unknown_plant_is_not_found() {
        let state = AppState::fake();
        let id = Uuid::new_v4();
        assert!(matches!(get(&state, id).await, Err(AppError::NotFound(_))));
        assert!(matches!(remove(&state, id).await, Err(AppError::NotFound(_))));
        assert!(matches!(
            update(&state, id, UpdatePlantRequest::default()).await,
            Err(AppError::NotFound(_))
        ));
    }
}
