use std::collections::VecDeque;
use std::io;
use std::sync::Arc;
use std::sync::Mutex;

use async_trait::async_trait;
use pretty_assertions::assert_eq;
use serde_json::json;
use serde_json::Value;
use tokio::sync::oneshot;

use nbhub_core::config::AppConfig;
use nbhub_core::models::WorkspaceKind;
use nbhub_core::persistence::MemoryStorage;
use nbhub_core::persistence::PersistenceError;
use nbhub_core::persistence::StateStorage;
use nbhub_core::persistence::PERSIST_KEY;
use nbhub_core::store::Store;
use nbhub_core::ApiFailure;
use nbhub_core::AuthScheme;
use nbhub_core::Reduction;
use nbhub_core::RootState;
use nbhub_core::SessionContext;
use nbhub_core::StoreHandle;
use nbhub_exec::ApiResponse;
use nbhub_exec::AppContext;
use nbhub_exec::Credentials;
use nbhub_exec::HttpClient;
use nbhub_exec::Method;
use nbhub_exec::MultipartFile;
use nbhub_exec::NewProject;
use nbhub_exec::Outcome;
use nbhub_exec::ProjectUpdate;
use nbhub_exec::RequestBody;
use nbhub_exec::RequestDescriptor;

struct Reply {
    result: Result<ApiResponse, ApiFailure>,
    wait_for: Option<oneshot::Receiver<()>>,
    release: Option<oneshot::Sender<()>>,
}

impl Reply {
    fn ok(body: Value) -> Self {
        Self {
            result: Ok(ApiResponse::new(200, body)),
            wait_for: None,
            release: None,
        }
    }

    fn fail(status: u16, body: Value) -> Self {
        Self {
            result: Err(ApiFailure::new(Some(status), body)),
            wait_for: None,
            release: None,
        }
    }

    fn wait_for(mut self, gate: oneshot::Receiver<()>) -> Self {
        self.wait_for = Some(gate);
        self
    }

    fn release(mut self, gate: oneshot::Sender<()>) -> Self {
        self.release = Some(gate);
        self
    }
}

/// Answers requests from a queue, in send order, and records what was sent.
struct ScriptedClient {
    replies: Mutex<VecDeque<Reply>>,
    requests: Mutex<Vec<RequestDescriptor>>,
}

impl ScriptedClient {
    fn new(replies: Vec<Reply>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    fn requests(&self) -> Vec<RequestDescriptor> {
        self.requests.lock().expect("requests").clone()
    }
}

#[async_trait]
impl HttpClient for ScriptedClient {
    async fn send(&self, request: RequestDescriptor) -> Result<ApiResponse, ApiFailure> {
        self.requests.lock().expect("requests").push(request);
        let reply = self
            .replies
            .lock()
            .expect("replies")
            .pop_front()
            .expect("unscripted request");
        if let Some(gate) = reply.release {
            let _ = gate.send(());
        }
        if let Some(gate) = reply.wait_for {
            let _ = gate.await;
        }
        reply.result
    }
}

struct Harness {
    ctx: AppContext<ScriptedClient>,
    client: Arc<ScriptedClient>,
    storage: Arc<MemoryStorage>,
}

impl Harness {
    fn new(replies: Vec<Reply>) -> Self {
        Self::with_config(replies, AppConfig::default())
    }

    fn with_config(replies: Vec<Reply>, config: AppConfig) -> Self {
        Self::build(replies, config, None)
    }

    /// Keeps the session token in `tokens` instead of the shared storage.
    fn with_token_storage(replies: Vec<Reply>, tokens: Arc<dyn StateStorage>) -> Self {
        Self::build(replies, AppConfig::default(), Some(tokens))
    }

    fn build(
        replies: Vec<Reply>,
        mut config: AppConfig,
        tokens: Option<Arc<dyn StateStorage>>,
    ) -> Self {
        config.session.auth_scheme = AuthScheme::Jwt;
        let storage = Arc::new(MemoryStorage::new());
        let shared: Arc<dyn StateStorage> = storage.clone();
        let tokens = tokens.unwrap_or_else(|| Arc::clone(&shared));
        let session = SessionContext::new(tokens, config.session.auth_scheme);
        let store = StoreHandle::new(Store::new(shared));
        store.rehydrate().expect("rehydrate");
        let client = Arc::new(ScriptedClient::new(replies));
        let ctx = AppContext::new(store, Arc::clone(&client), session, config);
        Self {
            ctx,
            client,
            storage,
        }
    }

    fn state(&self) -> RootState {
        self.ctx.store.snapshot()
    }

    /// Action types dispatched after the first `skip` entries.
    fn actions_after(&self, skip: usize) -> Vec<String> {
        self.ctx.store.action_types().into_iter().skip(skip).collect()
    }

    fn mark(&self) -> usize {
        self.ctx.store.action_types().len()
    }

    async fn signed_in(&self) {
        let outcome = self
            .ctx
            .login(Credentials {
                username: "alice".to_string(),
                password: "secret".to_string(),
            })
            .await;
        assert_eq!(outcome, Outcome::Succeeded);
    }
}

/// Storage whose writes always fail, like a read-only profile directory.
#[derive(Default)]
struct ReadOnlyStorage {
    inner: MemoryStorage,
}

impl StateStorage for ReadOnlyStorage {
    fn get(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        self.inner.get(key)
    }

    fn set(&self, key: &str, _value: &str) -> Result<(), PersistenceError> {
        Err(PersistenceError::Io {
            path: key.into(),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "read-only"),
        })
    }

    fn remove(&self, key: &str) -> Result<(), PersistenceError> {
        self.inner.remove(key)
    }

    fn clear(&self) -> Result<(), PersistenceError> {
        self.inner.clear()
    }
}

fn login_reply() -> Reply {
    Reply::ok(json!({ "token": "abc", "account_id": "42" }))
}

fn project_list(ids: &[&str]) -> Value {
    Value::Array(
        ids.iter()
            .map(|id| json!({ "id": id, "name": format!("project {id}") }))
            .collect(),
    )
}

fn project_ids(state: &RootState) -> Vec<String> {
    state
        .home
        .projects
        .items
        .iter()
        .map(|project| project.id.clone())
        .collect()
}

#[tokio::test]
async fn login_persists_token_then_follows_next() {
    let harness = Harness::new(vec![login_reply()]);
    harness.ctx.navigate("/login?next=%2Falice%2Fprojects%2Fp1");
    let mark = harness.mark();

    harness.signed_in().await;

    assert_eq!(
        harness.actions_after(mark),
        vec!["LOGIN_REQUEST", "LOGIN_SUCCESS", "LOCATION_CHANGE"]
    );
    assert_eq!(
        harness.storage.get("token").expect("get"),
        Some("abc".to_string())
    );
    assert_eq!(
        harness.ctx.session.authorization_header(),
        Some("JWT abc".to_string())
    );

    let state = harness.state();
    assert_eq!(state.auth.username.as_deref(), Some("alice"));
    assert!(state.auth.token_present);
    assert_eq!(state.routing.location, "/alice/projects/p1");
    assert!(harness.storage.get(PERSIST_KEY).expect("get").is_some());

    let requests = harness.client.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, Method::Post);
    assert!(!requests[0].authenticated);
}

#[tokio::test]
async fn login_without_next_lands_home() {
    let harness = Harness::new(vec![login_reply()]);
    harness.ctx.navigate("/login");

    harness.signed_in().await;

    assert_eq!(harness.state().routing.location, "/");
}

#[tokio::test]
async fn failed_login_keeps_session_empty() {
    let harness = Harness::new(vec![Reply::fail(
        400,
        json!({ "non_field_errors": ["Unable to log in with provided credentials."] }),
    )]);
    harness.ctx.navigate("/login");

    let outcome = harness
        .ctx
        .login(Credentials {
            username: "alice".to_string(),
            password: "wrong".to_string(),
        })
        .await;

    assert_eq!(outcome, Outcome::Failed);
    assert!(!harness.ctx.session.token_present());
    let state = harness.state();
    assert_eq!(
        state.auth.login.error_message.as_deref(),
        Some("Unable to log in with provided credentials.")
    );
    assert_eq!(state.routing.location, "/login");
}

#[tokio::test]
async fn failed_add_project_surfaces_field_error() {
    let harness = Harness::new(vec![
        login_reply(),
        Reply::fail(400, json!({ "name": ["duplicate"] })),
    ]);
    harness.signed_in().await;
    let location = harness.state().routing.location;
    let mark = harness.mark();

    let outcome = harness
        .ctx
        .add_project(
            "alice",
            NewProject {
                name: "thesis".to_string(),
                ..NewProject::default()
            },
        )
        .await;

    assert_eq!(outcome, Outcome::Failed);
    assert_eq!(
        harness.actions_after(mark),
        vec!["ADD_PROJECT_REQUEST", "ADD_PROJECT_FAILURE"]
    );
    let state = harness.state();
    assert!(state.home.add_project.failed);
    assert_eq!(state.home.add_project.error_message.as_deref(), Some("duplicate"));
    assert_eq!(state.routing.location, location);

    let requests = harness.client.requests();
    assert!(requests[1].authenticated);
    assert_eq!(
        requests[1].body,
        RequestBody::Json(json!({ "name": "thesis", "private": false }))
    );
}

#[tokio::test]
async fn add_project_opens_the_new_project() {
    let harness = Harness::new(vec![
        login_reply(),
        Reply::ok(json!({ "id": "p9", "name": "thesis" })),
    ]);
    harness.signed_in().await;

    let outcome = harness
        .ctx
        .add_project(
            "alice",
            NewProject {
                name: "thesis".to_string(),
                ..NewProject::default()
            },
        )
        .await;

    assert!(outcome.is_success());
    let state = harness.state();
    assert_eq!(project_ids(&state), vec!["p9"]);
    assert_eq!(state.routing.location, "/alice/projects/p9");
}

#[tokio::test]
async fn list_fetch_replaces_items() {
    let harness = Harness::new(vec![
        Reply::ok(project_list(&["a"])),
        Reply::ok(project_list(&["b", "c"])),
    ]);

    harness.ctx.fetch_projects("alice").await;
    assert_eq!(project_ids(&harness.state()), vec!["a"]);

    harness.ctx.fetch_projects("alice").await;
    assert_eq!(project_ids(&harness.state()), vec!["b", "c"]);
}

#[tokio::test]
async fn out_of_order_list_response_is_discarded() {
    let (release, gate) = oneshot::channel();
    let harness = Harness::new(vec![
        Reply::ok(project_list(&["old"])).wait_for(gate),
        Reply::ok(project_list(&["new"])).release(release),
    ]);
    let mark = harness.mark();

    let (first, second) = tokio::join!(
        harness.ctx.fetch_projects("alice"),
        harness.ctx.fetch_projects("alice")
    );

    assert_eq!(first, Outcome::Succeeded);
    assert_eq!(second, Outcome::Succeeded);
    assert_eq!(
        harness.actions_after(mark),
        vec![
            "FETCH_PROJECTS_REQUEST",
            "FETCH_PROJECTS_REQUEST",
            "FETCH_PROJECTS_SUCCESS",
            "FETCH_PROJECTS_SUCCESS",
        ]
    );
    let reductions: Vec<Reduction> = harness.ctx.store.with(|store| {
        store
            .actions()
            .iter()
            .skip(mark)
            .map(|record| record.reduction)
            .collect()
    });
    assert_eq!(
        reductions,
        vec![
            Reduction::Applied,
            Reduction::Applied,
            Reduction::Applied,
            Reduction::Stale,
        ]
    );
    assert_eq!(project_ids(&harness.state()), vec!["new"]);
}

#[tokio::test]
async fn logout_resets_everything() {
    let harness = Harness::new(vec![login_reply(), Reply::ok(project_list(&["a", "b"]))]);
    harness.signed_in().await;
    harness.ctx.fetch_projects("alice").await;
    let mark = harness.mark();

    harness.ctx.logout();

    assert_eq!(harness.actions_after(mark), vec!["LOGOUT", "LOCATION_CHANGE"]);
    let state = harness.state();
    let mut expected = RootState::default();
    expected.routing.location = "/login".to_string();
    expected.routing.previous = state.routing.previous.clone();
    assert_eq!(state, expected);
    assert!(!harness.ctx.session.token_present());
    assert!(harness.storage.is_empty());
}

#[tokio::test]
async fn unauthorized_keeps_banner_by_default() {
    let harness = Harness::new(vec![
        login_reply(),
        Reply::fail(401, json!({ "detail": "Signature has expired." })),
    ]);
    harness.signed_in().await;
    let location = harness.state().routing.location;

    let outcome = harness.ctx.fetch_projects("alice").await;

    assert_eq!(outcome, Outcome::Failed);
    assert!(harness.ctx.session.token_present());
    let state = harness.state();
    assert_eq!(
        state.home.projects.list.error_message.as_deref(),
        Some("Signature has expired.")
    );
    assert_eq!(state.routing.location, location);
}

#[tokio::test]
async fn unauthorized_logs_out_when_enabled() {
    let mut config = AppConfig::default();
    config.session.logout_on_unauthorized = true;
    let harness = Harness::with_config(
        vec![
            login_reply(),
            Reply::fail(401, json!({ "detail": "Signature has expired." })),
        ],
        config,
    );
    harness.signed_in().await;
    let mark = harness.mark();

    harness.ctx.fetch_projects("alice").await;

    assert_eq!(
        harness.actions_after(mark),
        vec![
            "FETCH_PROJECTS_REQUEST",
            "FETCH_PROJECTS_FAILURE",
            "LOGOUT",
            "LOCATION_CHANGE",
        ]
    );
    assert!(!harness.ctx.session.token_present());
    assert_eq!(harness.state().routing.location, "/login");
}

#[tokio::test]
async fn add_server_uses_configured_image_and_refetches() {
    let harness = Harness::new(vec![
        Reply::ok(json!({ "id": "s1", "name": "lab", "status": "pending" })),
        Reply::ok(json!([
            { "id": "s0", "name": "old", "status": "running" },
            { "id": "s1", "name": "lab", "status": "starting" },
        ])),
    ]);

    let outcome = harness
        .ctx
        .add_server("alice", "p1", "lab", WorkspaceKind::Jupyter)
        .await;

    assert!(outcome.is_success());
    let requests = harness.client.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].method, Method::Post);
    assert_eq!(
        requests[0].body,
        RequestBody::Json(json!({
            "name": "lab",
            "image_name": AppConfig::default().images.jupyter,
        }))
    );
    assert_eq!(requests[1].method, Method::Get);
    assert_eq!(requests[1].url, harness.ctx.endpoints.servers("alice", "p1"));

    let servers: Vec<String> = harness
        .state()
        .project
        .servers
        .items
        .iter()
        .map(|server| server.id.clone())
        .collect();
    assert_eq!(servers, vec!["s0", "s1"]);
}

#[tokio::test]
async fn failed_start_skips_refetch() {
    let harness = Harness::new(vec![Reply::fail(409, json!({ "detail": "Already running." }))]);

    let outcome = harness.ctx.start_server("alice", "p1", "s1").await;

    assert_eq!(outcome, Outcome::Failed);
    assert_eq!(harness.client.requests().len(), 1);
    assert_eq!(
        harness.state().project.start_server.error_message.as_deref(),
        Some("Already running.")
    );
}

#[tokio::test]
async fn server_status_is_keyed_by_requested_id() {
    let harness = Harness::new(vec![
        Reply::ok(json!([{ "id": "s1", "name": "lab", "status": "starting" }])),
        Reply::ok(json!({ "status": "running" })),
    ]);
    harness.ctx.fetch_servers("alice", "p1").await;

    let outcome = harness.ctx.fetch_server_status("alice", "p1", "s1").await;

    assert!(outcome.is_success());
    let state = harness.state();
    assert_eq!(
        state.project.servers.items[0].status,
        nbhub_core::models::ServerStatus::Running
    );
}

#[tokio::test]
async fn upload_sends_multipart_and_refetches_files() {
    let harness = Harness::new(vec![
        Reply::ok(json!([{ "id": "f1", "name": "data.csv" }])),
        Reply::ok(json!([
            { "id": "f0", "name": "notes.md" },
            { "id": "f1", "name": "data.csv" },
        ])),
    ]);
    let file = MultipartFile::new("data.csv", b"a,b\n1,2\n".to_vec());

    let outcome = harness
        .ctx
        .upload_files("alice", "p1", vec![file.clone()])
        .await;

    assert!(outcome.is_success());
    let requests = harness.client.requests();
    assert_eq!(requests[0].body, RequestBody::Multipart(vec![file]));
    assert_eq!(requests[1].method, Method::Get);
    assert_eq!(harness.state().project.files.len(), 2);
}

#[tokio::test]
async fn delete_project_returns_home() {
    let harness = Harness::new(vec![Reply {
        result: Ok(ApiResponse::new(204, Value::Null)),
        wait_for: None,
        release: None,
    }]);
    harness.ctx.navigate("/alice/projects/p1");

    let outcome = harness.ctx.delete_project("alice", "p1").await;

    assert!(outcome.is_success());
    assert_eq!(harness.state().routing.location, "/");
    assert_eq!(harness.client.requests()[0].method, Method::Delete);
}

#[tokio::test]
async fn transport_failure_uses_network_message() {
    let harness = Harness::new(vec![Reply {
        result: Err(ApiFailure::transport("connection refused")),
        wait_for: None,
        release: None,
    }]);

    harness.ctx.fetch_teams("alice").await;

    assert_eq!(
        harness.state().home.teams.list.error_message.as_deref(),
        Some(nbhub_core::NETWORK_FAILURE_MESSAGE)
    );
}

#[tokio::test]
async fn logout_during_fetch_discards_the_late_response() {
    let (started, request_sent) = oneshot::channel();
    let (respond, gate) = oneshot::channel();
    let harness = Harness::new(vec![
        login_reply(),
        Reply::ok(project_list(&["a", "b"]))
            .release(started)
            .wait_for(gate),
    ]);
    harness.signed_in().await;
    let mark = harness.mark();

    tokio::join!(harness.ctx.fetch_projects("alice"), async {
        let _ = request_sent.await;
        harness.ctx.logout();
        let _ = respond.send(());
    });

    assert_eq!(
        harness.actions_after(mark),
        vec![
            "FETCH_PROJECTS_REQUEST",
            "LOGOUT",
            "LOCATION_CHANGE",
            "FETCH_PROJECTS_SUCCESS",
        ]
    );
    let late = harness.ctx.store.with(|store| {
        store
            .actions()
            .iter()
            .last()
            .map(|record| record.reduction)
    });
    assert_eq!(late, Some(Reduction::Stale));

    let state = harness.state();
    assert!(project_ids(&state).is_empty());
    assert!(!state.home.projects.fetched);
    assert!(!state.home.projects.list.succeeded);
    assert!(!state.auth.token_present);
    assert_eq!(state.routing.location, "/login");
    assert!(harness.storage.is_empty());
}

#[tokio::test]
async fn project_edits_update_the_listing() {
    let harness = Harness::new(vec![
        Reply::ok(project_list(&["p1", "p2"])),
        Reply::ok(json!({ "id": "p2", "name": "lab notes" })),
        Reply {
            result: Ok(ApiResponse::new(204, Value::Null)),
            wait_for: None,
            release: None,
        },
    ]);
    harness.ctx.fetch_projects("alice").await;

    let renamed = harness
        .ctx
        .update_project(
            "alice",
            "p2",
            ProjectUpdate {
                name: Some("lab notes".to_string()),
                ..ProjectUpdate::default()
            },
        )
        .await;
    let deleted = harness.ctx.delete_project("alice", "p1").await;

    assert!(renamed.is_success());
    assert!(deleted.is_success());
    let state = harness.state();
    assert_eq!(project_ids(&state), vec!["p2"]);
    assert_eq!(state.home.projects.items[0].name, "lab notes");
}

#[tokio::test]
async fn unsaved_session_reports_a_local_failure() {
    let harness = Harness::with_token_storage(
        vec![login_reply()],
        Arc::new(ReadOnlyStorage::default()),
    );
    harness.ctx.navigate("/login");

    let outcome = harness
        .ctx
        .login(Credentials {
            username: "alice".to_string(),
            password: "secret".to_string(),
        })
        .await;

    assert_eq!(outcome, Outcome::Failed);
    let state = harness.state();
    assert!(!state.auth.token_present);
    let message = state.auth.login.error_message.unwrap_or_default();
    assert!(message.starts_with("Could not save the session"), "{message}");
    assert_ne!(message, nbhub_core::NETWORK_FAILURE_MESSAGE);
    assert_eq!(state.routing.location, "/login");
}
