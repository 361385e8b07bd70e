use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, patch, post, put},
    Json, Router,
};
use tracing::error;
use uuid::Uuid;

use crate::controllers::travel_controller::TravelController;
use crate::dto::{
    travel_dto::{
        ArrivalQuery, BulkArrivalResponse, CreateTravelRequest, TravelFilter, TravelResponse,
        UpdateTravelRequest,
    },
    ApiResponse, ValidatedJson,
};
use crate::middleware::{
    auth::{guarded, Principal},
    request_meta::RequestMeta,
};
use crate::models::user::Role;
use crate::state::AppState;
use crate::utils::errors::AppError;

const ADMIN: &[Role] = &[Role::Admin];

/// `:id` es el número de viaje, el id del schedule o el UUID del viaje
/// según la ruta; un solo nombre de parámetro por segmento.
pub fn create_travel_router(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/", post(create_travel))
        .route(
            "/",
            guarded(
                state,
                &[Role::Transporter, Role::School, Role::Admin],
                get(list_travels),
            ),
        )
        .route("/:id", get(get_travel))
        .route("/:id", guarded(state, ADMIN, put(update_travel)))
        .route("/:id", guarded(state, ADMIN, delete(delete_travel)))
        .route(
            "/:id/boarding",
            guarded(state, &[Role::Transporter], patch(confirm_boarding)),
        )
        .route(
            "/:id/arrived-at-destination",
            guarded(state, &[Role::Transporter], patch(arrived_at_destination)),
        )
        .route(
            "/:id/arrived-at-school",
            guarded(state, &[Role::School], patch(arrived_at_school)),
        )
        .route("/:id/verify-payment", post(verify_payment))
}

/// La espera del pago corre en su propia tarea: si el cliente corta la
/// conexión, el viaje igual termina de confirmarse.
async fn create_travel(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<CreateTravelRequest>,
) -> Result<(StatusCode, Json<ApiResponse<TravelResponse>>), AppError> {
    let controller = TravelController::new(&state);
    let travel = tokio::spawn(async move { controller.create_travel(request).await })
        .await
        .map_err(|e| {
            error!("❌ Travel creation task aborted: {}", e);
            AppError::Internal(e.to_string())
        })??;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success_with_message(
            travel,
            "Travel booked and payment confirmed",
        )),
    ))
}

async fn list_travels(
    State(state): State<AppState>,
    principal: Principal,
    Query(filter): Query<TravelFilter>,
) -> Result<Json<ApiResponse<Vec<TravelResponse>>>, AppError> {
    let controller = TravelController::new(&state);
    let travels = controller.get_all_travels(&principal, filter).await?;
    Ok(Json(ApiResponse::list(travels)))
}

async fn get_travel(
    State(state): State<AppState>,
    Path(travel_number): Path<String>,
) -> Result<Json<ApiResponse<TravelResponse>>, AppError> {
    let controller = TravelController::new(&state);
    let travel = controller.get_travel(&travel_number).await?;
    Ok(Json(ApiResponse::success(travel)))
}

async fn update_travel(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(request): ValidatedJson<UpdateTravelRequest>,
) -> Result<Json<ApiResponse<TravelResponse>>, AppError> {
    let controller = TravelController::new(&state);
    let travel = controller.update_travel(id, request).await?;
    Ok(Json(ApiResponse::success(travel)))
}

async fn delete_travel(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    let controller = TravelController::new(&state);
    controller.delete_travel(id).await?;
    Ok(Json(ApiResponse::message("Travel deleted")))
}

async fn confirm_boarding(
    State(state): State<AppState>,
    principal: Principal,
    meta: RequestMeta,
    Path(travel_number): Path<String>,
) -> Result<Json<ApiResponse<TravelResponse>>, AppError> {
    let controller = TravelController::new(&state);
    let travel = controller
        .confirm_boarding(&principal, &travel_number, &meta)
        .await?;
    Ok(Json(ApiResponse::success_with_message(travel, "Boarding confirmed")))
}

async fn arrived_at_destination(
    State(state): State<AppState>,
    principal: Principal,
    meta: RequestMeta,
    Path(schedule_id): Path<Uuid>,
    Query(query): Query<ArrivalQuery>,
) -> Result<Json<ApiResponse<BulkArrivalResponse>>, AppError> {
    let controller = TravelController::new(&state);
    let result = controller
        .arrived_at_destination(&principal, schedule_id, query.time_slot, &meta)
        .await?;
    Ok(Json(ApiResponse::success(result)))
}

async fn arrived_at_school(
    State(state): State<AppState>,
    principal: Principal,
    meta: RequestMeta,
    Path(travel_number): Path<String>,
) -> Result<Json<ApiResponse<TravelResponse>>, AppError> {
    let controller = TravelController::new(&state);
    let travel = controller
        .arrived_at_school(&principal, &travel_number, &meta)
        .await?;
    Ok(Json(ApiResponse::success_with_message(travel, "Arrival at school confirmed")))
}

async fn verify_payment(
    State(state): State<AppState>,
    Path(travel_number): Path<String>,
) -> Result<Json<ApiResponse<TravelResponse>>, AppError> {
    let controller = TravelController::new(&state);
    let travel = controller.verify_transaction(&travel_number).await?;
    Ok(Json(ApiResponse::success_with_message(travel, "Payment confirmed")))
}
