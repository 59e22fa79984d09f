mod config;
mod graph;
mod qr;
mod store;
mod validate;

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::Html,
    routing::{get, post},
};
use config::Config;
use serde::{Deserialize, Serialize};
use std::{net::SocketAddr, sync::Arc};
use store::{JsonFileStore, UserRecord, UserStore};
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use validate::{Submission, validate};

const FORM_PAGE: &str = include_str!("../static/form.html");
const NETWORK_PAGE: &str = include_str!("../static/network.html");

#[derive(Clone)]
struct AppState {
    store: Arc<dyn UserStore>,
    config: Arc<Config>,
}

type ApiError = (StatusCode, Json<ErrorBody>);

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

#[derive(Debug, Serialize)]
struct SubmitResponse {
    message: String,
}

#[derive(Debug, Serialize)]
struct QrResponse {
    image: String,
}

#[derive(Debug, Serialize)]
struct StoreDump {
    count: usize,
    users: Vec<UserRecord>,
}

#[derive(Deserialize)]
struct DataQuery {
    r#type: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .map_err(|_| "invalid MINGLE_HOST or MINGLE_PORT")?;

    let state = AppState {
        store: Arc::new(JsonFileStore::new(&config.data_path)),
        config: Arc::new(config),
    };
    let app = router(state);

    tracing::info!("listening on http://{}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(form_page))
        .route("/submit", post(submit))
        .route("/network", get(network_page))
        .route("/data", get(graph_data))
        .route("/qrcode", get(qr_image))
        .route("/view-data", get(view_data))
        .with_state(state)
}

async fn form_page() -> Html<&'static str> {
    Html(FORM_PAGE)
}

async fn network_page() -> Html<&'static str> {
    Html(NETWORK_PAGE)
}

async fn submit(
    State(state): State<AppState>,
    Json(payload): Json<Submission>,
) -> Result<Json<SubmitResponse>, ApiError> {
    let rules = state.config.rules.clone();
    let nickname = run_store(state.store.clone(), move |store| {
        let users = store.load();
        let record =
            validate(&rules, &payload, &users).map_err(|error| bad_request(error.to_string()))?;
        let nickname = record.nickname.clone();
        store.append(record).map_err(|error| {
            tracing::error!(%error, "failed to persist submission");
            internal_error(error.to_string())
        })?;
        Ok(nickname)
    })
    .await?;

    tracing::info!(%nickname, "profile accepted");
    Ok(Json(SubmitResponse {
        message: "Submission received!".to_string(),
    }))
}

async fn graph_data(
    State(state): State<AppState>,
    Query(query): Query<DataQuery>,
) -> Result<Json<graph::GraphData>, ApiError> {
    let mode = query.r#type.unwrap_or_else(|| "interests".to_string());
    let threshold = state.config.similarity_threshold;
    run_store(state.store.clone(), move |store| {
        let users = store.load();
        match mode.as_str() {
            "interests" => Ok(Json(graph::interest_graph(&users, threshold))),
            "province" => Ok(Json(graph::province_graph(&users))),
            other => Err(bad_request(format!("unknown graph type {other:?}"))),
        }
    })
    .await
}

async fn qr_image(State(state): State<AppState>) -> Result<Json<QrResponse>, ApiError> {
    let image = qr::data_url(&state.config.public_url)
        .map_err(|error| internal_error(error.to_string()))?;
    Ok(Json(QrResponse { image }))
}

async fn view_data(State(state): State<AppState>) -> Result<Json<StoreDump>, ApiError> {
    run_store(state.store.clone(), move |store| {
        let users = store.load();
        Ok(Json(StoreDump {
            count: users.len(),
            users,
        }))
    })
    .await
}

async fn run_store<T, F>(store: Arc<dyn UserStore>, operation: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&dyn UserStore) -> Result<T, ApiError> + Send + 'static,
{
    tokio::task::spawn_blocking(move || operation(store.as_ref()))
        .await
        .map_err(|error| internal_error(error.to_string()))?
}

fn bad_request(message: String) -> ApiError {
    (StatusCode::BAD_REQUEST, Json(ErrorBody { error: message }))
}

fn internal_error(message: String) -> ApiError {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorBody { error: message }),
    )
}
