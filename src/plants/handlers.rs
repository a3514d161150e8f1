use axum::{
    extract::State,
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use super::dto::{CreatePlantRequest, PlantRemovedResponse, UpdatePlantRequest};
use super::repo_types::Plant;
use super::services;
use crate::{
    error::{AppError, AppJson, AppPath},
    state::AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/plants", get(list_plants).post(create_plant))
        .route(
            "/plants/:id",
            get(get_plant).put(update_plant).delete(remove_plant),
        )
}

#[instrument(skip(state))]
pub async fn list_plants(State(state): State<AppState>) -> Result<Json<Vec<Plant>>, AppError> {
    services::list(&state).await.map(Json)
}

#[instrument(skip(state))]
pub async fn get_plant(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<Plant>, AppError> {
    services::get(&state, id).await.map(Json)
}

#[instrument(skip(state, payload))]
pub async fn create_plant(
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreatePlantRequest>,
) -> Result<(StatusCode, Json<Plant>), AppError> {
    let plant = services::create(&state, payload).await?;
    Ok((StatusCode::CREATED, Json(plant)))
}

#[instrument(skip(state, payload))]
pub async fn update_plant(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
    AppJson(payload): AppJson<UpdatePlantRequest>,
) -> Result<Json<Plant>, AppError> {
    services::update(&state, id, payload).await.map(Json)
}

#[instrument(skip(state))]
pub async fn remove_plant(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<PlantRemovedResponse>, AppError> {
    services::remove(&state, id).await.map(Json)
}

#[cfg(test)]
mod tests {
    use axum::{
        body::{to_bytes, Body},
        http::{header, Method, Request},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::app::build_app;

    async fn call(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let req = Request::builder().method(method).uri(uri);
        let req = match body {
            Some(b) => req
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(b.to_string()))
                .unwrap(),
            None => req.body(Body::empty()).unwrap(),
        };
        let res = app.clone().oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    #[tokio::test]
    async fn catalog_lifecycle() {
        let app = build_app(AppState::fake());

        let (status, created) = call(
            &app,
            Method::POST,
            "/api/plants",
            Some(json!({
                "name": "Lavender",
                "plantType": "shrub",
                "careRequirements": {"watering": "sparingly"},
                "growthStages": ["cutting", "flowering"]
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["careRequirements"]["watering"], "sparingly");
        let uri = format!("/api/plants/{}", created["id"].as_str().unwrap());

        let (status, updated) =
            call(&app, Method::PUT, &uri, Some(json!({"ageRange": "1-3 years"}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["ageRange"], "1-3 years");
        assert_eq!(updated["name"], "Lavender");

        let (status, listed) = call(&app, Method::GET, "/api/plants", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(listed.as_array().unwrap().len(), 1);

        let (status, body) = call(&app, Method::DELETE, &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Plant removed");

        let (_, listed) = call(&app, Method::GET, "/api/plants", None).await;
        assert!(listed.as_array().unwrap().is_empty());
        let (status, fetched) = call(&app, Method::GET, &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched["isActive"], false);
    }

    #[tokio::test]
    async fn missing_plant_and_blank_fields() {
        let app = build_app(AppState::fake());
        let uri = format!("/api/plants/{}", Uuid::new_v4());
        let (status, body) = call(&app, Method::GET, &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Plant not found");

        let (status, _) = call(
            &app,
            Method::POST,
            "/api/plants",
            Some(json!({"name": "", "plantType": "herb"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn malformed_plant_id_is_400_with_message() {
        let app = build_app(AppState::fake());
        for method in [Method::GET, Method::DELETE] {
            let (status, body) = call(&app, method, "/api/plants/not-a-uuid", None).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert!(body["message"].as_str().unwrap().contains("UUID"));
        }

        let (status, body) = call(
            &app,
            Method::PUT,
            "/api/plants/not-a-uuid",
            Some(json!({"name": "Sage"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["message"].is_string());
    }
}
