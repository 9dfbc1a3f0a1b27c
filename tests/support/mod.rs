//! In-process stand-in for a DTS server
//!
//! `StubServer` serves an axum `Router` on a local port and records every
//! request it sees through a middleware layer. `FakeDts` is a small stateful
//! router that behaves like the real service closely enough to drive the
//! client through the whole transfer lifecycle.

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    body::{self, Body},
    extract::{Path, Query, Request, State},
    http::{header::AUTHORIZATION, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use uuid::Uuid;

pub const API_KEY: &str = "test-developer-token";
pub const ORCID: &str = "0000-0002-1825-0097";
pub const SERVICE_NAME: &str = "DTS";
pub const SERVICE_VERSION: &str = "0.8.2";

/// One request as the server saw it
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
}

impl Recorded {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap_or(Value::Null)
    }

    pub fn query_pairs(&self) -> Vec<(String, String)> {
        self.query
            .as_deref()
            .map(|q| url::form_urlencoded::parse(q.as_bytes()).into_owned().collect())
            .unwrap_or_default()
    }

    pub fn query_param(&self, name: &str) -> Option<String> {
        self.query_pairs()
            .into_iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v)
    }
}

type RequestLog = Arc<Mutex<Vec<Recorded>>>;

pub struct StubServer {
    addr: SocketAddr,
    requests: RequestLog,
    task: JoinHandle<()>,
}

impl StubServer {
    /// Serves `app` on an ephemeral local port
    pub async fn start(app: Router) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let requests = RequestLog::default();

        let app = app.layer(middleware::from_fn_with_state(requests.clone(), record));
        let task = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self {
            addr,
            requests,
            task,
        }
    }

    /// Answers every request with the same status and body
    pub async fn fixed(status: u16, body: Value) -> Self {
        let app = Router::new().fallback(move || async move { reply(status, body) });
        Self::start(app).await
    }

    /// Root URL of the server, without a trailing slash
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }

    pub fn requests_to(&self, path: &str) -> Vec<Recorded> {
        self.requests()
            .into_iter()
            .filter(|r| r.path == path)
            .collect()
    }
}

impl Drop for StubServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn record(State(log): State<RequestLog>, request: Request, next: Next) -> Response {
    let (parts, body) = request.into_parts();
    let bytes = match body::to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(_) => return StatusCode::BAD_REQUEST.into_response(),
    };

    let headers = parts
        .headers
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_string(), v.to_string()))
        })
        .collect();

    log.lock().unwrap().push(Recorded {
        method: parts.method.to_string(),
        path: parts.uri.path().to_string(),
        query: parts.uri.query().map(str::to_string),
        headers,
        body: bytes.to_vec(),
    });

    next.run(Request::from_parts(parts, Body::from(bytes))).await
}

pub fn reply(status: u16, body: Value) -> Response {
    let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(body)).into_response()
}

/// Authorization header value the fake service accepts
pub fn expected_bearer() -> String {
    use base64::Engine;
    format!(
        "Bearer {}",
        base64::engine::general_purpose::STANDARD.encode(format!("{}\n", API_KEY))
    )
}

async fn require_bearer(request: Request, next: Next) -> Response {
    let presented = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok());
    if presented != Some(expected_bearer().as_str()) {
        return reply(401, json!({"error": "invalid token"}));
    }
    next.run(request).await
}

#[derive(Debug, Default)]
struct FakeTransfer {
    num_files: u64,
    polls: u64,
    cancelled: bool,
}

/// Stateful DTS simulation
#[derive(Debug, Default)]
pub struct FakeDts {
    transfers: Mutex<HashMap<String, FakeTransfer>>,
}

type Dts = State<Arc<FakeDts>>;

impl FakeDts {
    pub async fn start() -> (StubServer, Arc<FakeDts>) {
        let state = Arc::new(FakeDts::default());
        let app = Router::new()
            .route("/", get(handshake))
            .route("/api/v1/databases", get(databases))
            .route("/api/v1/files", axum::routing::post(search))
            .route("/api/v1/files/by-id", get(by_id))
            .route("/api/v1/transfers", axum::routing::post(submit))
            .route("/api/v1/transfers/{id}", get(status).delete(cancel))
            .fallback(|| async { reply(404, json!({"error": "no such endpoint"})) })
            .with_state(state.clone())
            .layer(middleware::from_fn(require_bearer));

        (StubServer::start(app).await, state)
    }

    pub fn transfer_count(&self) -> usize {
        self.transfers.lock().unwrap().len()
    }
}

async fn handshake() -> Response {
    reply(200, json!({"name": SERVICE_NAME, "version": SERVICE_VERSION}))
}

async fn databases() -> Response {
    reply(
        200,
        json!([
            {
                "id": "jdp",
                "name": "JGI Data Portal",
                "organization": "Joint Genome Institute",
                "url": "https://data.jgi.doe.gov"
            },
            {
                "id": "kbase",
                "name": "KBase Workspace Service",
                "organization": "KBase",
                "url": "https://kbase.us"
            }
        ]),
    )
}

async fn search(Json(body): Json<Value>) -> Response {
    let database = body["database"].as_str().unwrap_or_default();
    match database {
        "jdp" | "kbase" => {}
        "broken" => return reply(500, json!({"error": "database offline"})),
        _ => return reply(404, json!({"error": "unknown database"})),
    }

    let offset = body["offset"].as_u64().unwrap_or(0);
    let limit = body["limit"].as_u64().unwrap_or(3).min(3);
    let resources: Vec<Value> = (offset..offset + limit)
        .map(|i| resource(database, &format!("{:024x}", i)))
        .collect();
    reply(200, json!({ "resources": resources }))
}

async fn by_id(Query(params): Query<HashMap<String, String>>) -> Response {
    let database = params.get("database").cloned().unwrap_or_default();
    let resources: Vec<Value> = params
        .get("ids")
        .map(String::as_str)
        .unwrap_or_default()
        .split(',')
        .filter(|id| !id.is_empty())
        .map(|id| {
            let local = id.split_once(':').map(|(_, l)| l).unwrap_or(id);
            resource(&database, local)
        })
        .collect();
    reply(200, json!({ "resources": resources }))
}

async fn submit(State(dts): Dts, Json(body): Json<Value>) -> Response {
    let files = match body["file_ids"].as_array() {
        Some(files) if !files.is_empty() => files.len() as u64,
        _ => return reply(400, json!({"error": "file_ids required"})),
    };
    if body["source"].as_str().is_none() || body["destination"].as_str().is_none() {
        return reply(400, json!({"error": "source and destination required"}));
    }

    let id = Uuid::new_v4().to_string();
    dts.transfers.lock().unwrap().insert(
        id.clone(),
        FakeTransfer {
            num_files: files,
            ..Default::default()
        },
    );

    if body["description"] == "slow" {
        tokio::time::sleep(Duration::from_secs(2)).await;
    }
    reply(201, json!({ "id": id }))
}

/// staging, then one more file per poll while active, then finalizing
async fn status(State(dts): Dts, Path(id): Path<String>) -> Response {
    let mut transfers = dts.transfers.lock().unwrap();
    let Some(transfer) = transfers.get_mut(&id) else {
        return reply(404, json!({"error": "transfer not found"}));
    };

    let poll = transfer.polls;
    transfer.polls += 1;

    let (state, done) = if transfer.cancelled {
        ("inactive", poll.min(transfer.num_files))
    } else if poll == 0 {
        ("staging", 0)
    } else if poll <= transfer.num_files {
        ("active", poll - 1)
    } else {
        ("finalizing", transfer.num_files)
    };

    reply(
        200,
        json!({
            "id": id,
            "status": state,
            "num_files": transfer.num_files,
            "num_files_transferred": done,
        }),
    )
}

async fn cancel(State(dts): Dts, Path(id): Path<String>) -> Response {
    match dts.transfers.lock().unwrap().get_mut(&id) {
        Some(transfer) => {
            transfer.cancelled = true;
            StatusCode::ACCEPTED.into_response()
        }
        None => reply(404, json!({"error": "transfer not found"})),
    }
}

fn resource(database: &str, local_id: &str) -> Value {
    let prefix = database.to_ascii_uppercase();
    json!({
        "id": format!("{}:{}", prefix, local_id),
        "name": format!("{}.fasta", local_id),
        "path": format!("{}/{}.fasta", database, local_id),
        "format": "fasta",
        "media_type": "text/plain",
        "bytes": 1024,
        "hash": "d41d8cd98f00b204e9800998ecf8427e",
        "extra": {"project_id": "1234"}
    })
}
