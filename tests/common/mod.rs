//! An in-process roster service for integration tests, served by axum on
//! an ephemeral port.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, patch};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{Value, json};

#[derive(Default)]
struct Db {
    influencers: Vec<Value>,
    managers: Vec<Value>,
    filters: Vec<String>,
    next_id: u64,
}

/// Handle to a running test service.
#[derive(Clone)]
pub struct TestServer {
    pub base_url: String,
    db: Arc<Mutex<Db>>,
}

impl TestServer {
    /// Every `filter` query the service has received, in order.
    pub fn filters(&self) -> Vec<String> {
        self.db.lock().expect("db lock").filters.clone()
    }

    pub fn list_calls(&self) -> usize {
        self.filters().len()
    }
}

/// Start a service seeded with Ann Lee (id 1, one Instagram account) and
/// managers Mia (5) and Raj (6).
pub async fn spawn_server() -> TestServer {
    let db = Arc::new(Mutex::new(Db {
        influencers: vec![json!({
            "id": 1,
            "firstName": "Ann",
            "lastName": "Lee",
            "socialMediaAccounts": [{ "platform": "instagram", "username": "annlee" }],
            "manager": null
        })],
        managers: vec![json!({ "id": 5, "name": "Mia" }), json!({ "id": 6, "name": "Raj" })],
        filters: Vec::new(),
        next_id: 1,
    }));

    let app = Router::new()
        .route("/influencers", get(list_influencers).post(create_influencer))
        .route("/influencers/{id}/manager", patch(assign_manager))
        .route("/managers", get(list_managers))
        .with_state(db.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test listener");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("test server");
    });

    TestServer {
        base_url: format!("http://{addr}"),
        db,
    }
}

fn error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

fn full_name(influencer: &Value) -> String {
    format!(
        "{} {}",
        influencer["firstName"].as_str().unwrap_or_default(),
        influencer["lastName"].as_str().unwrap_or_default()
    )
    .to_lowercase()
}

#[derive(Deserialize)]
struct ListQuery {
    #[serde(default)]
    filter: String,
}

async fn list_influencers(
    State(db): State<Arc<Mutex<Db>>>,
    Query(query): Query<ListQuery>,
) -> Response {
    let mut db = db.lock().expect("db lock");
    db.filters.push(query.filter.clone());

    match query.filter.as_str() {
        "explode" => return error(StatusCode::INTERNAL_SERVER_ERROR, "database unavailable"),
        "myspace" => {
            return Json(json!([{
                "id": 99,
                "firstName": "Tom",
                "lastName": "Anderson",
                "socialMediaAccounts": [{ "platform": "myspace", "username": "tom" }]
            }]))
            .into_response();
        }
        _ => {}
    }

    let needle = query.filter.to_lowercase();
    let matched: Vec<Value> = db
        .influencers
        .iter()
        .filter(|i| full_name(i).contains(&needle))
        .cloned()
        .collect();
    Json(Value::Array(matched)).into_response()
}

async fn list_managers(State(db): State<Arc<Mutex<Db>>>) -> Response {
    let db = db.lock().expect("db lock");
    Json(Value::Array(db.managers.clone())).into_response()
}

async fn create_influencer(State(db): State<Arc<Mutex<Db>>>, Json(body): Json<Value>) -> Response {
    let first = body["firstName"].as_str().unwrap_or_default().to_string();
    match first.as_str() {
        "Crash" => return (StatusCode::INTERNAL_SERVER_ERROR, "oops").into_response(),
        "Taken" => return error(StatusCode::BAD_REQUEST, "Influencer already exists"),
        _ => {}
    }

    let mut db = db.lock().expect("db lock");
    db.next_id += 1;
    let created = json!({
        "id": db.next_id,
        "firstName": first,
        "lastName": body["lastName"],
        "socialMediaAccounts": body["socialMediaAccounts"],
        "manager": null
    });
    db.influencers.push(created.clone());
    (StatusCode::CREATED, Json(created)).into_response()
}

async fn assign_manager(
    State(db): State<Arc<Mutex<Db>>>,
    Path(id): Path<u64>,
    Json(body): Json<Value>,
) -> Response {
    let mut db = db.lock().expect("db lock");
    let manager = match body.get("managerId") {
        Some(Value::Null) => Value::Null,
        Some(Value::Number(n)) => {
            let found = db
                .managers
                .iter()
                .find(|m| m["id"].as_u64() == n.as_u64())
                .cloned();
            match found {
                Some(manager) => manager,
                None => return error(StatusCode::NOT_FOUND, "manager not found"),
            }
        }
        _ => return error(StatusCode::BAD_REQUEST, "managerId is required"),
    };

    let Some(influencer) = db
        .influencers
        .iter_mut()
        .find(|i| i["id"].as_u64() == Some(id))
    else {
        return error(StatusCode::NOT_FOUND, "influencer not found");
    };
    influencer["manager"] = manager;
    Json(influencer.clone()).into_response()
}
