pub(super) use serde_json::json;
pub(super) use serde_json::Value;

pub(super) use super::failure_message;
pub(super) use super::reduce;
pub(super) use super::reduce_auth;
pub(super) use super::reduce_home;
pub(super) use super::reduce_project;
pub(super) use super::reduce_settings;
pub(super) use super::Reduction;
pub(super) use super::GENERIC_FAILURE_MESSAGE;
pub(super) use super::NETWORK_FAILURE_MESSAGE;
pub(super) use crate::actions::AppAction;
pub(super) use crate::actions::AuthAction;
pub(super) use crate::actions::AuthOp;
pub(super) use crate::actions::FormAction;
pub(super) use crate::actions::HomeAction;
pub(super) use crate::actions::HomeOp;
pub(super) use crate::actions::Op;
pub(super) use crate::actions::ProjectAction;
pub(super) use crate::actions::ProjectOp;
pub(super) use crate::actions::RequestId;
pub(super) use crate::actions::RoutingAction;
pub(super) use crate::actions::SettingsAction;
pub(super) use crate::actions::SettingsOp;
pub(super) use crate::models::LoginSuccess;
pub(super) use crate::models::Project;
pub(super) use crate::models::Server;
pub(super) use crate::models::ServerStatus;
pub(super) use crate::models::ServerStatusReport;
pub(super) use crate::persistence::PersistedAuth;
pub(super) use crate::persistence::PersistedSlice;
pub(super) use crate::state::ApiFailure;
pub(super) use crate::state::Banner;
pub(super) use crate::state::RootState;

mod idempotence;
mod identity;

fn state() -> RootState {
    RootState::default()
}

fn rid(n: u64) -> RequestId {
    RequestId(n)
}

fn project(id: &str, name: &str) -> Project {
    Project {
        id: id.to_string(),
        name: name.to_string(),
        description: String::new(),
        private: false,
        owner: Some("alice".to_string()),
        collaborators: Vec::new(),
    }
}

fn server(id: &str, status: ServerStatus) -> Server {
    Server {
        id: id.to_string(),
        name: format!("server-{id}"),
        status,
        image_name: Some("jupyter/minimal-notebook".to_string()),
        endpoint: None,
    }
}

fn login_success(token: &str) -> LoginSuccess {
    LoginSuccess {
        token: token.to_string(),
        account_id: Some("42".to_string()),
        username: Some("alice".to_string()),
    }
}

fn failure(status: u16, body: Value) -> ApiFailure {
    ApiFailure::new(Some(status), body)
}

fn bad_request(field: &str, message: &str) -> ApiFailure {
    failure(400, json!({ field: [message] }))
}

fn run(state: &mut RootState, actions: Vec<AppAction>) {
    for action in actions {
        reduce(state, &action);
    }
}

/// A populated tree touching every slice.
fn populated() -> RootState {
    let mut state = state();
    run(
        &mut state,
        vec![
            AuthAction::Login(Op::Request { request_id: rid(1) }).into(),
            AuthAction::Login(Op::Success {
                request_id: rid(1),
                data: login_success("abc"),
            })
            .into(),
            HomeAction::FetchProjects(Op::Request { request_id: rid(2) }).into(),
            HomeAction::FetchProjects(Op::Success {
                request_id: rid(2),
                data: vec![project("p1", "thesis"), project("p2", "course")],
            })
            .into(),
            ProjectAction::FetchServers(Op::Request { request_id: rid(3) }).into(),
            ProjectAction::FetchServers(Op::Success {
                request_id: rid(3),
                data: vec![server("s1", ServerStatus::Running)],
            })
            .into(),
            SettingsAction::DeleteCard(Op::Request { request_id: rid(4) }).into(),
            SettingsAction::DeleteCard(Op::Failure {
                request_id: rid(4),
                error: failure(404, json!({ "detail": "Not found." })),
            })
            .into(),
            RoutingAction::LocationChanged {
                path: "/alice/projects/p1".to_string(),
            }
            .into(),
            FormAction::Change {
                form: "project".to_string(),
                field: "name".to_string(),
                value: "draft".to_string(),
            }
            .into(),
        ],
    );
    state
}
