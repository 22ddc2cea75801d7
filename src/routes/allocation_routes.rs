use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};

use crate::controllers::allocation_controller::AllocationController;
use crate::dto::allocation_dto::{
    AllocationResponse, CreateAllocationRequest, HistoryQuery, UpdateAllocationRequest,
};
use crate::state::AppState;
use crate::utils::errors::{bad_request_error, AppError};

pub fn create_allocation_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_allocation))
        .route("/history", get(allocation_history))
        .route(
            "/:id",
            get(get_allocation)
                .patch(update_allocation)
                .delete(delete_allocation),
        )
}

// Un body mal formado es un 400, no el 422 por defecto de axum
fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| bad_request_error(&rejection.body_text()))
}

async fn create_allocation(
    State(state): State<AppState>,
    payload: Result<Json<CreateAllocationRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<AllocationResponse>), AppError> {
    let request = body(payload)?;
    let controller = AllocationController::new(state.manager.clone());
    let response = controller.create(request).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

async fn get_allocation(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<AllocationResponse>, AppError> {
    let controller = AllocationController::new(state.manager.clone());
    let response = controller.get_by_id(&id).await?;
    Ok(Json(response))
}

async fn update_allocation(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateAllocationRequest>, JsonRejection>,
) -> Result<Json<AllocationResponse>, AppError> {
    let request = body(payload)?;
    let controller = AllocationController::new(state.manager.clone());
    let response = controller.update(&id, request).await?;
    Ok(Json(response))
}

async fn delete_allocation(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let controller = AllocationController::new(state.manager.clone());
    controller.delete(&id).await?;
    Ok(Json(serde_json::json!({
        "success": true,
        "message": "Allocation deleted successfully"
    })))
}

async fn allocation_history(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<AllocationResponse>>, AppError> {
    let controller = AllocationController::new(state.manager.clone());
    let response = controller.history(query).await?;
    Ok(Json(response))
}
