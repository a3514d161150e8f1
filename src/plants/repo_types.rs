use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CareRequirements {
    pub watering: Option<String>,
    pub fertilization: Option<String>,
    pub pest_control: Option<String>,
}

impl CareRequirements {
    /// Overwrites only the fields present in `patch`.
    pub fn merge(&mut self, patch: CareRequirements) {
        if patch.watering.is_some() {
            self.watering = patch.watering;
        }
        if patch.fertilization.is_some() {
            self.fertilization = patch.fertilization;
        }
        if patch.pest_control.is_some() {
            self.pest_control = patch.pest_control;
        }
    }
}

/// A catalog entry. Removal only clears `is_active`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Plant {
    pub id: Uuid,
    pub name: String,
    pub plant_type: String,
    pub plant_characteristics: Option<String>,
    pub care_requirements: CareRequirements,
    pub age_range: Option<String>,
    pub growth_stages: Vec<String>,
    pub is_active: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl Plant {
    pub fn new(name: String, plant_type: String, now: OffsetDateTime) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            plant_type,
            plant_characteristics: None,
            care_requirements: CareRequirements::default(),
            age_range: None,
            growth_stages: Vec::new(),
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, FromRow)]
pub struct PlantRow {
    pub id: Uuid,
    pub name: String,
    pub plant_type: String,
    pub plant_characteristics: Option<String>,
    pub care_requirements: Json<CareRequirements>,
    pub age_range: Option<String>,
    pub growth_stages: Vec<String>,
    pub is_active: bool,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl From<PlantRow> for Plant {
    fn from(r: PlantRow) -> Self {
        Self {
            id: r.id,
            name: r.name,
            plant_type: r.plant_type,
            plant_characteristics: r.plant_characteristics,
            care_requirements: r.care_requirements.0,
            age_range: r.age_range,
            growth_stages: r.growth_stages,
            is_active: r.is_active,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn care_merge_keeps_untouched_fields() {
        let mut care = CareRequirements {
            watering: Some("weekly".into()),
            fertilization: Some("monthly".into()),
            pest_control: None,
        };
        care.merge(CareRequirements {
            pest_control: Some("neem oil".into()),
            ..Default::default()
        });
        assert_eq!(care.watering.as_deref(), Some("weekly"));
        assert_eq!(care.fertilization.as_deref(), Some("monthly"));
        assert_eq!(care.pest_control.as_deref(), Some("neem oil"));
    }

    #[test]
    fn serializes_camel_case() {
        let plant = Plant::new("Basil".into(), "herb".into(), OffsetDateTime::now_utc());
        let json = serde_json::to_value(&plant).unwrap();
        assert_eq!(json["plantType"], "herb");
        assert_eq!(json["isActive"], true);
        assert!(json["growthStages"].as_array().unwrap().is_empty());
        assert!(json.get("careRequirements").is_some());
    }
}
