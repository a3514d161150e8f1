use serde::{Deserialize, Serialize};

use super::repo_types::CareRequirements;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePlantRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub plant_type: String,
    pub plant_characteristics: Option<String>,
    pub care_requirements: Option<CareRequirements>,
    pub age_range: Option<String>,
    pub growth_stages: Option<Vec<String>>,
}

/// Partial update; omitted fields are left untouched.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePlantRequest {
    pub name: Option<String>,
    pub plant_type: Option<String>,
    pub plant_characteristics: Option<String>,
    pub care_requirements: Option<CareRequirements>,
    pub age_range: Option<String>,
    pub growth_stages: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
pub struct PlantRemovedResponse {
    pub message: String,
}
