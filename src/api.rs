//! REST API for the load planner.
//!
//! Provides HTTP endpoints for the presentation layer (3D view, tables, import
//! dialogs). Uses Axum as the web framework and supports CORS.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Json, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::{
    Router,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
#[allow(unused_imports)]
use serde_json::json;
use std::sync::OnceLock;
use tokio::sync::mpsc;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::ReceiverStream;
use tower_http::cors::{Any, CorsLayer};
use utoipa::{OpenApi, ToSchema};

use crate::config::{ApiConfig, OptimizerConfig};
use crate::import::{DroppedRow, parse_rows};
use crate::interaction::{check_collision, drag_to, snap};
use crate::model::{
    CargoItem, Container, Dimensions, ItemRow, ValidationError, expand_rows_to_items,
};
use crate::optimizer::{PackingResult, SortStrategy, TrialSummary, auto_pack_with_config, auto_pack_with_progress};
use crate::report::LoadReport;
use crate::staging::arrange_staging_with;
use crate::types::Vec3;

#[derive(Clone)]
struct ApiState {
    optimizer_config: OptimizerConfig,
}

static OPENAPI_DOC: OnceLock<utoipa::openapi::OpenApi> = OnceLock::new();

const SWAGGER_UI_HTML: &str = r##"<!DOCTYPE html>
<html lang="en">
    <head>
        <meta charset="utf-8" />
        <title>load-planner API Docs</title>
        <link
            rel="stylesheet"
            href="https://unpkg.com/swagger-ui-dist@5.17.14/swagger-ui.css"
            integrity="sha384-wxLW6kwyHktdDGr6Pv1zgm/VGJh99lfUbzSn6HNHBENZlCN7W602k9VkGdxuFvPn"
            crossorigin="anonymous"
        />
    </head>
    <body>
        <div id="swagger-ui"></div>
        <script
            src="https://unpkg.com/swagger-ui-dist@5.17.14/swagger-ui-bundle.js"
            integrity="sha384-wmyclcVGX/WhUkdkATwhaK1X1JtiNrr2EoYJ+diV3vj4v6OC5yCeSu+yW13SYJep"
            crossorigin="anonymous"
        ></script>
        <script>
            window.onload = function () {
                window.ui = SwaggerUIBundle({
                    url: "/docs/openapi.json",
                    dom_id: "#swagger-ui",
                });
            };
        </script>
    </body>
    </html>"##;

fn openapi_doc() -> &'static utoipa::openapi::OpenApi {
    OPENAPI_DOC.get_or_init(ApiDoc::openapi)
}

/// Request for expanding item rows.
#[derive(Deserialize, ToSchema)]
pub struct ExpandRequest {
    pub rows: Vec<ItemRow>,
}

/// Request for importing delimited text.
#[derive(Deserialize, ToSchema)]
#[schema(example = json!({ "text": "DRW-1;1200;800;1000;250;4;Pallet", "delimiter": ";" }))]
pub struct ImportRequest {
    pub text: String,
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub delimiter: Option<char>,
}

/// Request carrying a container and its items (staging and packing).
#[derive(Deserialize, ToSchema)]
#[schema(
    example = json!({
        "container": {
            "name": "Truck",
            "dims": { "length": 13600.0, "width": 2450.0, "height": 2700.0 },
            "max_weight": 24000.0
        },
        "items": [
            {
                "id": "DRW-1-1",
                "drawing_number": "DRW-1",
                "dims": { "length": 1200.0, "width": 800.0, "height": 1000.0 },
                "weight": 250.0
            }
        ]
    })
)]
pub struct LayoutRequest {
    pub container: Container,
    pub items: Vec<CargoItem>,
}

#[derive(Debug)]
enum LayoutValidationError {
    InvalidContainer(ValidationError),
    InvalidItem(String, ValidationError),
}

impl LayoutRequest {
    fn validate(&self) -> Result<(), LayoutValidationError> {
        self.container
            .validate()
            .map_err(LayoutValidationError::InvalidContainer)?;
        for item in &self.items {
            item.dims
                .validate()
                .map_err(|err| LayoutValidationError::InvalidItem(item.id.clone(), err))?;
        }
        Ok(())
    }
}

/// Request for a collision check.
#[derive(Deserialize, ToSchema)]
pub struct CollisionRequest {
    pub item: CargoItem,
    #[serde(default)]
    pub others: Vec<CargoItem>,
}

/// Request for snapping a candidate position.
#[derive(Deserialize, ToSchema)]
pub struct SnapRequest {
    pub position: Vec3,
    pub dims: Dimensions,
    #[serde(default)]
    pub others: Vec<CargoItem>,
    pub self_id: String,
    /// Overrides the configured snap distance
    #[serde(default)]
    pub threshold: Option<f64>,
}

/// Request for moving an item (snap + collision check).
#[derive(Deserialize, ToSchema)]
pub struct MoveRequest {
    pub item: CargoItem,
    pub position: Vec3,
    #[serde(default)]
    pub others: Vec<CargoItem>,
}

#[derive(Serialize, ToSchema)]
pub struct ItemsResponse {
    pub items: Vec<CargoItem>,
}

#[derive(Serialize, ToSchema)]
pub struct ImportResponse {
    pub items: Vec<CargoItem>,
    pub dropped: Vec<DroppedRow>,
}

/// Result of an auto-pack run.
#[derive(Serialize, ToSchema)]
pub struct PackResponse {
    /// Placed items followed by staged items
    pub items: Vec<CargoItem>,
    pub report: LoadReport,
    pub trials: Vec<TrialSummary>,
    pub winning_trial: usize,
}

impl PackResponse {
    /// Creates a PackResponse from a PackingResult.
    pub fn from_packing_result(result: PackingResult) -> Self {
        let PackingResult {
            items,
            trials,
            winning_trial,
            report,
        } = result;
        Self {
            items,
            report,
            trials,
            winning_trial,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct CollisionResponse {
    pub collides: bool,
}

#[derive(Serialize, ToSchema)]
pub struct SnapResponse {
    pub position: Vec3,
}

#[derive(Serialize, ToSchema)]
pub struct MoveResponse {
    pub item: CargoItem,
}

#[derive(Serialize, ToSchema)]
struct ErrorResponse {
    error: String,
    details: String,
}

impl ErrorResponse {
    fn new(error: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: details.into(),
        }
    }
}

fn error_response(
    status: StatusCode,
    error: impl Into<String>,
    details: impl Into<String>,
) -> Response {
    (status, Json(ErrorResponse::new(error, details))).into_response()
}

fn json_deserialize_error(err: JsonRejection) -> Response {
    error_response(
        StatusCode::UNPROCESSABLE_ENTITY,
        "Invalid JSON data",
        err.to_string(),
    )
}

fn validation_error(details: impl Into<String>) -> Response {
    error_response(
        StatusCode::UNPROCESSABLE_ENTITY,
        "Invalid input data",
        details,
    )
}

fn container_config_error(details: impl Into<String>) -> Response {
    error_response(
        StatusCode::UNPROCESSABLE_ENTITY,
        "Invalid container configuration",
        details,
    )
}

fn staging_warning(result: &PackingResult, container_name: &str) -> Option<String> {
    if result.staged_count() == 0 {
        return None;
    }
    Some(format!(
        "{} of {} items did not fit into '{}' and were staged",
        result.staged_count(),
        result.items.len(),
        container_name
    ))
}

fn report_pack_result(result: &PackingResult, container_name: &str) {
    println!(
        "📦 Result: {} placed, {} staged, {:.1}% utilization",
        result.placed_count(),
        result.staged_count(),
        result.report.utilization_percent
    );
    if let Some(warning) = staging_warning(result, container_name) {
        eprintln!("⚠️ {}", warning);
    }
}

fn parse_payload<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, Response> {
    match payload {
        Ok(Json(payload)) => Ok(payload),
        Err(err) => Err(json_deserialize_error(err)),
    }
}

fn parse_layout_request(
    payload: Result<Json<LayoutRequest>, JsonRejection>,
) -> Result<LayoutRequest, Response> {
    let request = parse_payload(payload)?;
    match request.validate() {
        Ok(()) => Ok(request),
        Err(LayoutValidationError::InvalidContainer(err)) => {
            Err(container_config_error(err.to_string()))
        }
        Err(LayoutValidationError::InvalidItem(id, err)) => {
            Err(validation_error(format!("Item '{}': {}", id, err)))
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handle_expand,
        handle_import,
        handle_staging,
        handle_pack,
        handle_pack_stream,
        handle_collision,
        handle_snap,
        handle_move
    ),
    components(
        schemas(
            ExpandRequest,
            ImportRequest,
            LayoutRequest,
            CollisionRequest,
            SnapRequest,
            MoveRequest,
            ItemsResponse,
            ImportResponse,
            PackResponse,
            CollisionResponse,
            SnapResponse,
            MoveResponse,
            ErrorResponse,
            CargoItem,
            Container,
            Dimensions,
            ItemRow,
            DroppedRow,
            LoadReport,
            TrialSummary,
            SortStrategy,
            Vec3
        )
    ),
    tags(
        (name = "items", description = "Creating cargo items"),
        (name = "packing", description = "Endpoints for packing optimization"),
        (name = "interaction", description = "Manual repositioning")
    )
)]
struct ApiDoc;

fn router(state: ApiState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    Router::new()
        .route("/items/expand", post(handle_expand))
        .route("/items/import", post(handle_import))
        .route("/staging", post(handle_staging))
        .route("/pack", post(handle_pack))
        .route("/pack_stream", post(handle_pack_stream))
        .route("/interaction/collision", post(handle_collision))
        .route("/interaction/snap", post(handle_snap))
        .route("/interaction/move", post(handle_move))
        .route("/docs/openapi.json", get(serve_openapi_json))
        .route("/docs", get(serve_openapi_ui))
        .layer(cors)
        .with_state(state)
}

/// Starts the API server.
///
/// Blocks until the server is terminated.
pub async fn start_api_server(config: ApiConfig, optimizer_config: OptimizerConfig) {
    let app = router(ApiState { optimizer_config });

    let addr = config.socket_addr();
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(err) => {
            eprintln!("❌ Could not bind API server to {}: {}", addr, err);
            return;
        }
    };

    let display_host = config.display_host().to_string();
    println!(
        "🚀 Server running on http://{}:{}",
        display_host,
        config.port()
    );
    if config.binds_to_all_interfaces() && config.uses_default_host() {
        println!("💡 Local access: http://localhost:{}", config.port());
    }
    println!("📦 API Endpoints:");
    println!("   - POST /items/expand");
    println!("   - POST /items/import");
    println!("   - POST /staging");
    println!("   - POST /pack");
    println!("   - POST /pack_stream");
    println!("   - POST /interaction/collision");
    println!("   - POST /interaction/snap");
    println!("   - POST /interaction/move");
    println!("📑 Documentation:");
    println!("   - GET /docs");
    println!("   - GET /docs/openapi.json");

    if let Err(err) = axum::serve(listener, app).await {
        eprintln!("❌ API server terminated with an error: {err}");
    }
}

/// Handler for POST /items/expand.
///
/// Expands each row into `quantity` independent items.
#[utoipa::path(
    post,
    path = "/items/expand",
    request_body = ExpandRequest,
    responses(
        (status = 200, description = "Expanded items", body = ItemsResponse),
        (status = UNPROCESSABLE_ENTITY, description = "Invalid rows", body = ErrorResponse)
    ),
    tag = "items"
)]
async fn handle_expand(payload: Result<Json<ExpandRequest>, JsonRejection>) -> Response {
    let request = match parse_payload(payload) {
        Ok(request) => request,
        Err(response) => return response,
    };

    if let Some((row, err)) = request
        .rows
        .iter()
        .find_map(|row| row.validate().err().map(|err| (row, err)))
    {
        return validation_error(format!("Row '{}': {}", row.drawing_number, err));
    }

    let items = expand_rows_to_items(&request.rows);
    println!(
        "📥 Expanded {} rows into {} items",
        request.rows.len(),
        items.len()
    );
    (StatusCode::OK, Json(ItemsResponse { items })).into_response()
}

/// Handler for POST /items/import.
///
/// Parses delimited text. Malformed rows are reported, not fatal.
#[utoipa::path(
    post,
    path = "/items/import",
    request_body = ImportRequest,
    responses(
        (status = 200, description = "Imported items and dropped rows", body = ImportResponse),
        (status = UNPROCESSABLE_ENTITY, description = "Invalid JSON", body = ErrorResponse)
    ),
    tag = "items"
)]
async fn handle_import(payload: Result<Json<ImportRequest>, JsonRejection>) -> Response {
    let request = match parse_payload(payload) {
        Ok(request) => request,
        Err(response) => return response,
    };

    let report = parse_rows(&request.text, request.delimiter);
    let items = expand_rows_to_items(&report.rows);
    println!(
        "📥 Imported {} rows ({} items), {} dropped",
        report.rows.len(),
        items.len(),
        report.dropped.len()
    );
    let response = ImportResponse {
        items,
        dropped: report.dropped,
    };
    (StatusCode::OK, Json(response)).into_response()
}

/// Handler for POST /staging.
///
/// Lays out all items in the staging area next to the container.
#[utoipa::path(
    post,
    path = "/staging",
    request_body = LayoutRequest,
    responses(
        (status = 200, description = "Items in staging layout", body = ItemsResponse),
        (status = UNPROCESSABLE_ENTITY, description = "Invalid request or container", body = ErrorResponse)
    ),
    tag = "packing"
)]
async fn handle_staging(
    State(state): State<ApiState>,
    payload: Result<Json<LayoutRequest>, JsonRejection>,
) -> Response {
    let request = match parse_layout_request(payload) {
        Ok(request) => request,
        Err(response) => return response,
    };

    let layout = state.optimizer_config.packing_config().staging;
    let items = arrange_staging_with(request.items, &request.container, &layout);
    (StatusCode::OK, Json(ItemsResponse { items })).into_response()
}

/// Handler for POST /pack.
///
/// Runs the multi-start packer. The response contains as many items as the request.
#[utoipa::path(
    post,
    path = "/pack",
    request_body = LayoutRequest,
    responses(
        (status = 200, description = "Packed and staged items", body = PackResponse),
        (status = UNPROCESSABLE_ENTITY, description = "Invalid request or container", body = ErrorResponse)
    ),
    tag = "packing"
)]
async fn handle_pack(
    State(state): State<ApiState>,
    payload: Result<Json<LayoutRequest>, JsonRejection>,
) -> Response {
    let LayoutRequest { container, items } = match parse_layout_request(payload) {
        Ok(request) => request,
        Err(response) => return response,
    };

    println!(
        "📥 New pack request: {} items into '{}'",
        items.len(),
        container.name
    );
    let container_name = container.name.clone();
    let config = state.optimizer_config.packing_config();
    let result = match tokio::task::spawn_blocking(move || {
        auto_pack_with_config(items, &container, &config)
    })
    .await
    {
        Ok(result) => result,
        Err(err) => {
            return error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Packing failed",
                err.to_string(),
            );
        }
    };
    report_pack_result(&result, &container_name);

    let response = PackResponse::from_packing_result(result);
    (StatusCode::OK, Json(response)).into_response()
}

/// Handler for POST /pack_stream endpoint (SSE).
///
/// Streams pack events as Server-Sent Events (text/event-stream).
#[utoipa::path(
    post,
    path = "/pack_stream",
    request_body = LayoutRequest,
    responses(
        (
            status = 200,
            description = "Streams pack events in real-time",
            content_type = "text/event-stream",
            body = String
        ),
        (status = UNPROCESSABLE_ENTITY, description = "Invalid request or container", body = ErrorResponse)
    ),
    tag = "packing"
)]
async fn handle_pack_stream(
    State(state): State<ApiState>,
    payload: Result<Json<LayoutRequest>, JsonRejection>,
) -> Response {
    let LayoutRequest { container, items } = match parse_layout_request(payload) {
        Ok(request) => request,
        Err(response) => return response,
    };

    let (tx, rx) = mpsc::channel::<String>(32);
    let config = state.optimizer_config.packing_config();

    tokio::task::spawn_blocking(move || {
        let result = auto_pack_with_progress(items, &container, &config, |evt| {
            if let Ok(json) = serde_json::to_string(evt) {
                // A closed receiver only means the client went away.
                let _ = tx.blocking_send(json);
            }
        });
        report_pack_result(&result, &container.name);
    });

    let stream = ReceiverStream::new(rx)
        .map(|msg| Ok::<_, std::convert::Infallible>(Event::default().data(msg)));
    Sse::new(stream)
        .keep_alive(
            KeepAlive::new()
                .interval(std::time::Duration::from_secs(10))
                .text("keep-alive"),
        )
        .into_response()
}

/// Handler for POST /interaction/collision.
#[utoipa::path(
    post,
    path = "/interaction/collision",
    request_body = CollisionRequest,
    responses(
        (status = 200, description = "Collision state", body = CollisionResponse),
        (status = UNPROCESSABLE_ENTITY, description = "Invalid JSON", body = ErrorResponse)
    ),
    tag = "interaction"
)]
async fn handle_collision(
    State(state): State<ApiState>,
    payload: Result<Json<CollisionRequest>, JsonRejection>,
) -> Response {
    let request = match parse_payload(payload) {
        Ok(request) => request,
        Err(response) => return response,
    };

    let eps = state.optimizer_config.interaction_config().collision_epsilon;
    let collides = check_collision(&request.item, &request.others, eps);
    (StatusCode::OK, Json(CollisionResponse { collides })).into_response()
}

/// Handler for POST /interaction/snap.
#[utoipa::path(
    post,
    path = "/interaction/snap",
    request_body = SnapRequest,
    responses(
        (status = 200, description = "Snapped position", body = SnapResponse),
        (status = UNPROCESSABLE_ENTITY, description = "Invalid JSON", body = ErrorResponse)
    ),
    tag = "interaction"
)]
async fn handle_snap(
    State(state): State<ApiState>,
    payload: Result<Json<SnapRequest>, JsonRejection>,
) -> Response {
    let request = match parse_payload(payload) {
        Ok(request) => request,
        Err(response) => return response,
    };

    let threshold = request
        .threshold
        .unwrap_or_else(|| state.optimizer_config.interaction_config().snap_threshold);
    let position = snap(
        request.position,
        &request.dims,
        &request.others,
        &request.self_id,
        threshold,
    );
    (StatusCode::OK, Json(SnapResponse { position })).into_response()
}

/// Handler for POST /interaction/move.
///
/// Snaps the requested position and updates the item's `valid` flag.
#[utoipa::path(
    post,
    path = "/interaction/move",
    request_body = MoveRequest,
    responses(
        (status = 200, description = "Moved item", body = MoveResponse),
        (status = UNPROCESSABLE_ENTITY, description = "Invalid JSON", body = ErrorResponse)
    ),
    tag = "interaction"
)]
async fn handle_move(
    State(state): State<ApiState>,
    payload: Result<Json<MoveRequest>, JsonRejection>,
) -> Response {
    let MoveRequest {
        mut item,
        position,
        others,
    } = match parse_payload(payload) {
        Ok(request) => request,
        Err(response) => return response,
    };

    let config = state.optimizer_config.interaction_config();
    drag_to(&mut item, position, &others, &config);
    (StatusCode::OK, Json(MoveResponse { item })).into_response()
}

async fn serve_openapi_json() -> impl IntoResponse {
    Json(openapi_doc())
}

async fn serve_openapi_ui() -> impl IntoResponse {
    Html(SWAGGER_UI_HTML)
}
