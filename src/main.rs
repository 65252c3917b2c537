mod billing;
mod db;
mod error;
mod gifts;
mod models;
mod orders;
mod scheduling;
mod validation;

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{delete, get, patch, post, put},
    Router,
};
use sqlx::PgPool;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;
use uuid::Uuid;

use billing::{BillRepository, BillingService, HolidayRepository, LogPrinter, PriceRepository,
    PrintQueue, PromotionRepository};
use error::ApiError;
use gifts::{GiftRepository, GiftService};
use models::{CreateRoom, Room, UpdateRoom};
use orders::{FnbOrderRepository, MenuRepository, OrderHistoryRepository, OrderService};
use scheduling::{ScheduleRepository, ScheduleService};
use validator::Validate;

/// OpenAPI documentation structure
#[derive(OpenApi)]
#[openapi(
    paths(
        create_room,
        get_all_rooms,
        get_room_by_id,
        update_room,
        delete_room,
    ),
    components(
        schemas(Room, CreateRoom, UpdateRoom)
    ),
    tags(
        (name = "rooms", description = "Karaoke room management endpoints")
    ),
    info(
        title = "Karaoke Venue API",
        version = "1.0.0",
        description = "RESTful API for karaoke room bookings, orders and billing",
    )
)]
struct ApiDoc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub schedule_service: ScheduleService,
    pub gift_service: GiftService,
    pub order_service: OrderService,
    pub menu_repo: MenuRepository,
    pub billing_service: BillingService,
    pub print_queue: PrintQueue,
}

impl AppState {
    fn new(db: PgPool, print_queue: PrintQueue) -> Self {
        let schedule_repo = ScheduleRepository::new(db.clone());
        let menu_repo = MenuRepository::new(db.clone());
        let order_repo = FnbOrderRepository::new(db.clone());
        let history_repo = OrderHistoryRepository::new(db.clone());

        let schedule_service = ScheduleService::new(schedule_repo.clone(), db.clone());
        let gift_service = GiftService::new(GiftRepository::new(db.clone()), schedule_repo.clone());
        let order_service = OrderService::new(
            menu_repo.clone(),
            order_repo.clone(),
            history_repo,
            schedule_repo.clone(),
        );
        let billing_service = BillingService::new(
            db.clone(),
            PriceRepository::new(db.clone()),
            HolidayRepository::new(db.clone()),
            PromotionRepository::new(db.clone()),
            BillRepository::new(db.clone()),
            schedule_repo,
            order_repo,
            order_service.clone(),
        );

        Self {
            db,
            schedule_service,
            gift_service,
            order_service,
            menu_repo,
            billing_service,
            print_queue,
        }
    }
}

/// Handler for POST /api/rooms
/// Creates a new karaoke room
#[utoipa::path(
    post,
    path = "/api/rooms",
    request_body = CreateRoom,
    responses(
        (status = 201, description = "Room created successfully", body = Room),
        (status = 400, description = "Invalid input data", body = String, example = json!({"error": "Room type must be one of small, medium, large, vip"})),
        (status = 409, description = "Room name already taken", body = String, example = json!({"error": "Room with name 'Room 301' already exists"})),
        (status = 500, description = "Internal server error", body = String, example = json!({"error": "Database error"}))
    ),
    tag = "rooms"
)]
async fn create_room(
    State(state): State<AppState>,
    Json(payload): Json<CreateRoom>,
) -> Result<(StatusCode, Json<Room>), ApiError> {
    tracing::debug!("Creating new room: {}", payload.room_name);

    payload.validate()?;

    if db::check_duplicate_room(&state.db, &payload.room_name).await? {
        tracing::warn!("Attempt to create duplicate room: {}", payload.room_name);
        return Err(ApiError::Conflict {
            message: format!("Room with name '{}' already exists", payload.room_name),
        });
    }

    let room = sqlx::query_as::<_, Room>(
        r#"
        INSERT INTO rooms (room_name, room_type)
        VALUES ($1, $2)
        RETURNING id, room_name, room_type, created_at
        "#,
    )
    .bind(&payload.room_name)
    .bind(payload.room_type.to_lowercase())
    .fetch_one(&state.db)
    .await?;

    tracing::info!("Successfully created room with id: {}", room.id);
    Ok((StatusCode::CREATED, Json(room)))
}

/// Handler for GET /api/rooms
/// Retrieves all karaoke rooms
#[utoipa::path(
    get,
    path = "/api/rooms",
    responses(
        (status = 200, description = "List of all rooms", body = Vec<Room>),
        (status = 500, description = "Internal server error", body = String, example = json!({"error": "Database error"}))
    ),
    tag = "rooms"
)]
async fn get_all_rooms(State(state): State<AppState>) -> Result<Json<Vec<Room>>, ApiError> {
    tracing::debug!("Fetching all rooms");

    let rooms = sqlx::query_as::<_, Room>(
        r#"
        SELECT id, room_name, room_type, created_at
        FROM rooms
        ORDER BY room_name
        "#,
    )
    .fetch_all(&state.db)
    .await?;

    tracing::debug!("Retrieved {} rooms", rooms.len());
    Ok(Json(rooms))
}

/// Handler for GET /api/rooms/:id
/// Retrieves a specific room by ID
#[utoipa::path(
    get,
    path = "/api/rooms/{id}",
    params(
        ("id" = Uuid, Path, description = "Room ID")
    ),
    responses(
        (status = 200, description = "Room found", body = Room),
        (status = 404, description = "Room not found", body = String, example = json!({"error": "Room with id ... not found"})),
        (status = 500, description = "Internal server error", body = String, example = json!({"error": "Database error"}))
    ),
    tag = "rooms"
)]
async fn get_room_by_id(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Room>, ApiError> {
    tracing::debug!("Fetching room with id: {}", id);

    let room = sqlx::query_as::<_, Room>(
        r#"
        SELECT id, room_name, room_type, created_at
        FROM rooms
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| {
        tracing::debug!("Room with id {} not found", id);
        ApiError::NotFound {
            resource: "Room".to_string(),
            id: id.to_string(),
        }
    })?;

    Ok(Json(room))
}

/// Handler for PUT /api/rooms/:id
/// Updates an existing room
#[utoipa::path(
    put,
    path = "/api/rooms/{id}",
    params(
        ("id" = Uuid, Path, description = "Room ID")
    ),
    request_body = UpdateRoom,
    responses(
        (status = 200, description = "Room updated successfully", body = Room),
        (status = 400, description = "Invalid input data", body = String, example = json!({"error": "Room type must be one of small, medium, large, vip"})),
        (status = 404, description = "Room not found", body = String, example = json!({"error": "Room with id ... not found"})),
        (status = 409, description = "Room name already taken", body = String, example = json!({"error": "Room with name 'Room 301' already exists"})),
        (status = 500, description = "Internal server error", body = String, example = json!({"error": "Database error"}))
    ),
    tag = "rooms"
)]
async fn update_room(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateRoom>,
) -> Result<Json<Room>, ApiError> {
    tracing::debug!("Updating room with id: {}", id);

    payload.validate()?;

    // A transaction keeps the duplicate check and the update atomic
    let mut tx = state.db.begin().await?;

    let existing = sqlx::query_as::<_, Room>(
        "SELECT id, room_name, room_type, created_at FROM rooms WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| {
        tracing::debug!("Room with id {} not found for update", id);
        ApiError::NotFound {
            resource: "Room".to_string(),
            id: id.to_string(),
        }
    })?;

    if let Some(ref new_name) = payload.room_name {
        if new_name != &existing.room_name {
            let duplicate_exists: Option<bool> = sqlx::query_scalar(
                "SELECT EXISTS(SELECT 1 FROM rooms WHERE room_name = $1 AND id != $2)",
            )
            .bind(new_name)
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;

            if duplicate_exists.unwrap_or(false) {
                tracing::warn!("Attempt to rename room {} to duplicate name: {}", id, new_name);
                return Err(ApiError::Conflict {
                    message: format!("Room with name '{}' already exists", new_name),
                });
            }
        }
    }

    let updated_room = sqlx::query_as::<_, Room>(
        r#"
        UPDATE rooms
        SET room_name = $1,
            room_type = $2
        WHERE id = $3
        RETURNING id, room_name, room_type, created_at
        "#,
    )
    .bind(payload.room_name.unwrap_or(existing.room_name))
    .bind(
        payload
            .room_type
            .map(|t| t.to_lowercase())
            .unwrap_or(existing.room_type),
    )
    .bind(id)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    tracing::info!("Successfully updated room with id: {}", id);
    Ok(Json(updated_room))
}

/// Handler for DELETE /api/rooms/:id
/// Deletes a room
#[utoipa::path(
    delete,
    path = "/api/rooms/{id}",
    params(
        ("id" = Uuid, Path, description = "Room ID")
    ),
    responses(
        (status = 204, description = "Room deleted successfully"),
        (status = 404, description = "Room not found", body = String, example = json!({"error": "Room with id ... not found"})),
        (status = 500, description = "Internal server error", body = String, example = json!({"error": "Database error"}))
    ),
    tag = "rooms"
)]
async fn delete_room(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    tracing::debug!("Deleting room with id: {}", id);

    let result = sqlx::query("DELETE FROM rooms WHERE id = $1")
        .bind(id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        tracing::debug!("Room with id {} not found for deletion", id);
        return Err(ApiError::NotFound {
            resource: "Room".to_string(),
            id: id.to_string(),
        });
    }

    tracing::info!("Successfully deleted room with id: {}", id);
    Ok(StatusCode::NO_CONTENT)
}

/// Creates and configures the application router
/// Maps all API endpoints to their handlers and adds CORS middleware
fn create_router(db: PgPool, print_queue: PrintQueue) -> Router {
    use tower_http::cors::{Any, CorsLayer};

    let state = AppState::new(db, print_queue);

    // Configure CORS to allow all origins, methods, and headers
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Swagger UI
        .merge(SwaggerUi::new("/swagger-ui")
            .url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Rooms
        .route("/api/rooms", post(create_room))
        .route("/api/rooms", get(get_all_rooms))
        .route("/api/rooms/:id", get(get_room_by_id))
        .route("/api/rooms/:id", put(update_room))
        .route("/api/rooms/:id", delete(delete_room))
        .route("/api/rooms/:room_id/schedules", get(scheduling::get_room_schedules_handler))
        // Schedules
        .route("/api/schedules", post(scheduling::create_schedule_handler))
        .route("/api/schedules/:schedule_id", get(scheduling::get_schedule_handler))
        .route("/api/schedules/:schedule_id", put(scheduling::update_schedule_handler))
        .route("/api/schedules/:schedule_id", delete(scheduling::delete_schedule_handler))
        .route("/api/schedules/:schedule_id/status", patch(scheduling::update_schedule_status_handler))
        // Gifts
        .route("/api/gifts", post(gifts::create_gift_handler))
        .route("/api/gifts", get(gifts::list_gifts_handler))
        .route("/api/gifts/:gift_id", get(gifts::get_gift_handler))
        .route("/api/gifts/:gift_id", put(gifts::update_gift_handler))
        .route("/api/gifts/:gift_id", delete(gifts::delete_gift_handler))
        .route("/api/schedules/:schedule_id/gift/claim", post(gifts::claim_gift_handler))
        // Menu and orders
        .route("/api/menu", get(orders::get_menu_handler))
        .route("/api/menu/items", get(orders::get_menu_items_handler))
        .route("/api/schedules/:schedule_id/order", put(orders::upsert_order_handler))
        .route("/api/schedules/:schedule_id/order", get(orders::get_order_handler))
        .route("/api/schedules/:schedule_id/order/history", get(orders::get_order_history_handler))
        // Billing
        .route("/api/schedules/:schedule_id/bill", get(billing::get_bill_handler))
        .route("/api/schedules/:schedule_id/bill", post(billing::record_bill_handler))
        .route("/api/schedules/:schedule_id/bill/recorded", get(billing::get_recorded_bill_handler))
        .route("/api/schedules/:schedule_id/bill/print", post(billing::print_bill_handler))
        .route("/api/bills/:bill_id/payment", put(billing::set_payment_method_handler))
        .route("/api/bills/clean-duplicates", post(billing::clean_duplicate_bills_handler))
        .route("/api/bills/clean-non-finished", post(billing::clean_non_finished_bills_handler))
        .route("/api/promotions", get(billing::list_promotions_handler))
        // Revenue
        .route("/api/revenue", get(billing::revenue_handler))
        .route("/api/revenue/range", get(billing::revenue_range_handler))
        .layer(cors)
        .with_state(state)
}

#[tokio::main]
async fn main() {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    // Initialize tracing subscriber for logging
    // This enables the error!, warn!, info!, debug!, and trace! macros
    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .init();

    tracing::info!("Karaoke Venue API - Starting...");

    // Get configuration from environment variables
    let database_url = std::env::var("DATABASE_URL")
        .expect("DATABASE_URL must be set in environment");
    let host = std::env::var("HOST")
        .unwrap_or_else(|_| "0.0.0.0".to_string());
    let port = std::env::var("PORT")
        .unwrap_or_else(|_| "8080".to_string());

    // Create database connection pool
    tracing::info!("Connecting to database...");
    let db_pool = db::create_pool(&database_url)
        .await
        .expect("Failed to create database pool");

    // Run SQLx migrations on startup
    tracing::info!("Running database migrations...");
    sqlx::migrate!("./migrations")
        .run(&db_pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Migrations completed successfully");

    // Start the receipt print worker
    let print_queue = PrintQueue::spawn(Arc::new(LogPrinter));

    // Create the application router
    let app = create_router(db_pool, print_queue);

    // Start the Axum server
    let addr = format!("{}:{}", host, port);
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind to address");

    tracing::info!("Karaoke Venue API is running on http://{}", addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui", addr);

    axum::serve(listener, app)
        .await
        .expect("Server error");
}
