use std::{sync::Arc, time::Duration};

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

/// Widgets per page on `GET /v1/widgets`.
pub const PAGE_SIZE: usize = 2;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Widget {
    pub id: Uuid,
    pub name: String,
}

#[derive(Deserialize)]
pub struct CreateWidget {
    pub name: String,
}

#[derive(Deserialize)]
pub struct PageQuery {
    pub cursor: Option<usize>,
}

#[derive(Deserialize)]
pub struct DelayQuery {
    pub delay_ms: Option<u64>,
}

pub type Db = Arc<RwLock<Vec<Widget>>>;

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(Vec::new()));
    Router::new()
        .route("/v1/widgets", get(list_widgets).post(create_widget))
        .route("/v1/widgets/{id}", get(get_widget))
        .route("/v1/whoami", get(whoami))
        .route("/v1/slow", get(slow))
        .route("/v1/empty", get(empty))
        .route("/v1/garbage", get(garbage))
        .route("/v1/invalid", get(invalid))
        .route("/v1/weird", get(weird))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

fn ok_object(object: Value) -> Json<Value> {
    Json(json!({ "meta": { "status": "ok" }, "object": object }))
}

fn error_envelope(status: StatusCode, message: &str) -> (StatusCode, Json<Value>) {
    (
        status,
        Json(json!({ "meta": { "status": "error" }, "error": { "message": message } })),
    )
}

fn page_url(cursor: usize) -> String {
    format!("/v1/widgets?cursor={cursor}")
}

async fn list_widgets(State(db): State<Db>, Query(query): Query<PageQuery>) -> Json<Value> {
    let widgets = db.read().await;
    let start = query.cursor.unwrap_or(0).min(widgets.len());
    let end = (start + PAGE_SIZE).min(widgets.len());
    let next = (end < widgets.len()).then(|| page_url(end));
    let previous = (start > 0).then(|| page_url(start.saturating_sub(PAGE_SIZE)));
    let page = &widgets[start..end];
    Json(json!({
        "meta": { "status": "ok", "next": next, "previous": previous },
        "objects": page,
    }))
}

async fn create_widget(
    State(db): State<Db>,
    Json(input): Json<CreateWidget>,
) -> (StatusCode, Json<Value>) {
    let widget = Widget {
        id: Uuid::new_v4(),
        name: input.name,
    };
    tracing::info!(id = %widget.id, "created widget");
    db.write().await.push(widget.clone());
    (StatusCode::CREATED, ok_object(json!(widget)))
}

async fn get_widget(State(db): State<Db>, Path(id): Path<Uuid>) -> impl IntoResponse {
    let widgets = db.read().await;
    match widgets.iter().find(|w| w.id == id) {
        Some(widget) => (StatusCode::OK, ok_object(json!(widget))),
        None => error_envelope(StatusCode::NOT_FOUND, &format!("Widget {id} not found")),
    }
}

async fn whoami(headers: HeaderMap) -> Json<Value> {
    let authorization = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());
    ok_object(json!({ "authorization": authorization }))
}

async fn slow(Query(query): Query<DelayQuery>) -> Json<Value> {
    tokio::time::sleep(Duration::from_millis(query.delay_ms.unwrap_or(1_000))).await;
    ok_object(json!("finally"))
}

async fn empty() -> StatusCode {
    StatusCode::OK
}

async fn garbage() -> &'static str {
    "not json"
}

async fn invalid() -> Json<Value> {
    Json(json!({ "meta": {} }))
}

async fn weird() -> Json<Value> {
    Json(json!({ "meta": { "status": "weird" } }))
}
