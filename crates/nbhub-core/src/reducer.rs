use serde_json::Value;
use tracing::debug;

use super::actions::AppAction;
use super::actions::AuthAction;
use super::actions::AuthOp;
use super::actions::FormAction;
use super::actions::HomeAction;
use super::actions::HomeOp;
use super::actions::Op;
use super::actions::ProjectAction;
use super::actions::ProjectOp;
use super::actions::RoutingAction;
use super::actions::SettingsAction;
use super::actions::SettingsOp;
use super::models::Identified;
use super::models::LoginSuccess;
use super::models::ServerStatus;
use super::state::ApiFailure;
use super::state::AuthState;
use super::state::Collection;
use super::state::FormEntry;
use super::state::FormState;
use super::state::HomeState;
use super::state::OpStatus;
use super::state::ProjectState;
use super::state::RootState;
use super::state::RoutingState;
use super::state::SettingsState;

pub const GENERIC_FAILURE_MESSAGE: &str = "Something went wrong. Please try again.";
pub const NETWORK_FAILURE_MESSAGE: &str =
    "Unable to reach the server. Check your connection and try again.";

/// What a reducer did with an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reduction {
    /// The action is not addressed to this slice; state is untouched.
    Ignored,
    /// A response older than the latest request of its family was dropped.
    Stale,
    Applied,
}

impl Reduction {
    fn merge(self, other: Self) -> Self {
        match (self, other) {
            (Self::Applied, _) | (_, Self::Applied) => Self::Applied,
            (Self::Stale, _) | (_, Self::Stale) => Self::Stale,
            _ => Self::Ignored,
        }
    }
}

/// Root reducer. Every domain reducer sees every action and answers only to
/// its own variants plus `Rehydrate` / `Logout`.
pub fn reduce(state: &mut RootState, action: &AppAction) -> Reduction {
    let project = reduce_project(&mut state.project, action);
    if project == Reduction::Applied {
        sync_project_listing(&mut state.home, action);
    }
    [
        reduce_auth(&mut state.auth, action),
        reduce_home(&mut state.home, action),
        project,
        reduce_settings(&mut state.settings, action),
        reduce_routing(&mut state.routing, action),
        reduce_forms(&mut state.forms, action),
    ]
    .into_iter()
    .fold(Reduction::Ignored, Reduction::merge)
}

/// Mirrors accepted single-project edits into the home listing so the list
/// never shows a deleted project or a stale name.
fn sync_project_listing(home: &mut HomeState, action: &AppAction) {
    match action {
        AppAction::Project(ProjectAction::UpdateProject(Op::Success { data, .. })) => {
            home.projects.upsert(data.clone());
        }
        AppAction::Project(ProjectAction::DeleteProject(Op::Success { data, .. })) => {
            home.projects.remove(data);
        }
        _ => {}
    }
}

pub fn reduce_auth(state: &mut AuthState, action: &AppAction) -> Reduction {
    match action {
        AppAction::Auth(action) => match action {
            AuthAction::Login(op) => fold_session(state, AuthOp::Login, op),
            AuthAction::TokenLogin(op) => fold_session(state, AuthOp::TokenLogin, op),
            AuthAction::Register(op) => {
                let family = AuthOp::Register;
                settle(advance(state.status_mut(family), family.label(), auth_fields(family), op))
            }
            AuthAction::ResetPassword(op) => {
                let family = AuthOp::ResetPassword;
                settle(advance(state.status_mut(family), family.label(), auth_fields(family), op))
            }
            AuthAction::Dismiss(family) => {
                state.status_mut(*family).dismiss();
                Reduction::Applied
            }
        },
        AppAction::Rehydrate(slice) => {
            state.account_id = slice.auth.account_id.clone();
            state.username = slice.auth.username.clone();
            state.token_present = slice.auth.authenticated;
            Reduction::Applied
        }
        AppAction::Logout => {
            *state = AuthState::default();
            Reduction::Applied
        }
        _ => Reduction::Ignored,
    }
}

fn fold_session(state: &mut AuthState, family: AuthOp, op: &Op<LoginSuccess>) -> Reduction {
    match advance(state.status_mut(family), family.label(), auth_fields(family), op) {
        Phase::Succeeded(login) => {
            state.token_present = true;
            state.account_id = login.account_id.clone();
            state.username = login.username.clone();
            Reduction::Applied
        }
        phase => settle(phase),
    }
}

pub fn reduce_home(state: &mut HomeState, action: &AppAction) -> Reduction {
    match action {
        AppAction::Home(action) => match action {
            HomeAction::FetchProjects(op) => {
                fold_list(&mut state.projects, HomeOp::FetchProjects.label(), op)
            }
            HomeAction::AddProject(op) => {
                let family = HomeOp::AddProject;
                match advance(state.status_mut(family), family.label(), home_fields(family), op) {
                    Phase::Succeeded(project) => {
                        state.projects.append(project.clone());
                        Reduction::Applied
                    }
                    phase => settle(phase),
                }
            }
            HomeAction::FetchTeams(op) => {
                fold_list(&mut state.teams, HomeOp::FetchTeams.label(), op)
            }
            HomeAction::AddTeam(op) => {
                let family = HomeOp::AddTeam;
                match advance(state.status_mut(family), family.label(), home_fields(family), op) {
                    Phase::Succeeded(team) => {
                        state.teams.append(team.clone());
                        Reduction::Applied
                    }
                    phase => settle(phase),
                }
            }
            HomeAction::Dismiss(family) => {
                state.status_mut(*family).dismiss();
                Reduction::Applied
            }
        },
        AppAction::Logout => {
            *state = HomeState::default();
            Reduction::Applied
        }
        _ => Reduction::Ignored,
    }
}

pub fn reduce_project(state: &mut ProjectState, action: &AppAction) -> Reduction {
    let AppAction::Project(action) = action else {
        if matches!(action, AppAction::Logout) {
            *state = ProjectState::default();
            return Reduction::Applied;
        }
        return Reduction::Ignored;
    };

    match action {
        ProjectAction::FetchProject(op) | ProjectAction::UpdateProject(op) => {
            let family = if matches!(action, ProjectAction::FetchProject(_)) {
                ProjectOp::FetchProject
            } else {
                ProjectOp::UpdateProject
            };
            match advance(state.status_mut(family), family.label(), project_fields(family), op) {
                Phase::Succeeded(project) => {
                    state.current = Some(project.clone());
                    Reduction::Applied
                }
                phase => settle(phase),
            }
        }
        ProjectAction::DeleteProject(op) => {
            let family = ProjectOp::DeleteProject;
            match advance(state.status_mut(family), family.label(), project_fields(family), op) {
                Phase::Succeeded(id) => {
                    if state.current.as_ref().is_some_and(|project| project.id() == id) {
                        state.current = None;
                        state.servers.items.clear();
                        state.files.items.clear();
                    }
                    Reduction::Applied
                }
                phase => settle(phase),
            }
        }
        ProjectAction::FetchServers(op) => {
            fold_list(&mut state.servers, ProjectOp::FetchServers.label(), op)
        }
        ProjectAction::AddServer(op) => {
            let family = ProjectOp::AddServer;
            match advance(state.status_mut(family), family.label(), project_fields(family), op) {
                Phase::Succeeded(server) => {
                    state.servers.append(server.clone());
                    Reduction::Applied
                }
                phase => settle(phase),
            }
        }
        ProjectAction::StartServer(op) => {
            fold_server_transition(state, ProjectOp::StartServer, ServerStatus::Starting, op)
        }
        ProjectAction::StopServer(op) => {
            fold_server_transition(state, ProjectOp::StopServer, ServerStatus::Stopping, op)
        }
        ProjectAction::FetchServerStatus(op) => {
            let family = ProjectOp::FetchServerStatus;
            match advance(state.status_mut(family), family.label(), project_fields(family), op) {
                Phase::Succeeded(report) => {
                    match state.servers.get_mut(&report.id) {
                        Some(server) => server.status = report.status,
                        None => debug!(server = %report.id, "status for unknown server ignored"),
                    }
                    Reduction::Applied
                }
                phase => settle(phase),
            }
        }
        ProjectAction::DeleteServer(op) => {
            let family = ProjectOp::DeleteServer;
            match advance(state.status_mut(family), family.label(), project_fields(family), op) {
                Phase::Succeeded(id) => {
                    state.servers.remove(id);
                    Reduction::Applied
                }
                phase => settle(phase),
            }
        }
        ProjectAction::FetchFiles(op) => {
            fold_list(&mut state.files, ProjectOp::FetchFiles.label(), op)
        }
        ProjectAction::UploadFiles(op) => {
            let family = ProjectOp::UploadFiles;
            match advance(state.status_mut(family), family.label(), project_fields(family), op) {
                Phase::Succeeded(files) => {
                    for file in files {
                        state.files.upsert(file.clone());
                    }
                    Reduction::Applied
                }
                phase => settle(phase),
            }
        }
        ProjectAction::Dismiss(family) => {
            state.status_mut(*family).dismiss();
            Reduction::Applied
        }
    }
}

fn fold_server_transition(
    state: &mut ProjectState,
    family: ProjectOp,
    next: ServerStatus,
    op: &Op<String>,
) -> Reduction {
    match advance(state.status_mut(family), family.label(), project_fields(family), op) {
        Phase::Succeeded(id) => {
            if let Some(server) = state.servers.get_mut(id) {
                server.status = next;
            }
            Reduction::Applied
        }
        phase => settle(phase),
    }
}

pub fn reduce_settings(state: &mut SettingsState, action: &AppAction) -> Reduction {
    let AppAction::Settings(action) = action else {
        if matches!(action, AppAction::Logout) {
            *state = SettingsState::default();
            return Reduction::Applied;
        }
        return Reduction::Ignored;
    };

    match action {
        SettingsAction::FetchProfile(op) | SettingsAction::UpdateProfile(op) => {
            let family = if matches!(action, SettingsAction::FetchProfile(_)) {
                SettingsOp::FetchProfile
            } else {
                SettingsOp::UpdateProfile
            };
            match advance(state.status_mut(family), family.label(), settings_fields(family), op) {
                Phase::Succeeded(profile) => {
                    state.profile = Some(profile.clone());
                    Reduction::Applied
                }
                phase => settle(phase),
            }
        }
        SettingsAction::FetchApplications(op) => fold_list(
            &mut state.applications,
            SettingsOp::FetchApplications.label(),
            op,
        ),
        SettingsAction::AddApplication(op) => {
            let family = SettingsOp::AddApplication;
            match advance(state.status_mut(family), family.label(), settings_fields(family), op) {
                Phase::Succeeded(app) => {
                    state.applications.append(app.clone());
                    Reduction::Applied
                }
                phase => settle(phase),
            }
        }
        SettingsAction::DeleteApplication(op) => {
            let family = SettingsOp::DeleteApplication;
            match advance(state.status_mut(family), family.label(), settings_fields(family), op) {
                Phase::Succeeded(id) => {
                    state.applications.remove(id);
                    Reduction::Applied
                }
                phase => settle(phase),
            }
        }
        SettingsAction::FetchCards(op) => {
            fold_list(&mut state.cards, SettingsOp::FetchCards.label(), op)
        }
        SettingsAction::AddCard(op) => {
            let family = SettingsOp::AddCard;
            match advance(state.status_mut(family), family.label(), settings_fields(family), op) {
                Phase::Succeeded(card) => {
                    state.cards.append(card.clone());
                    Reduction::Applied
                }
                phase => settle(phase),
            }
        }
        SettingsAction::DeleteCard(op) => {
            let family = SettingsOp::DeleteCard;
            match advance(state.status_mut(family), family.label(), settings_fields(family), op) {
                Phase::Succeeded(id) => {
                    state.cards.remove(id);
                    Reduction::Applied
                }
                phase => settle(phase),
            }
        }
        SettingsAction::FetchSubscription(op) => {
            let family = SettingsOp::FetchSubscription;
            match advance(state.status_mut(family), family.label(), settings_fields(family), op) {
                Phase::Succeeded(subscription) => {
                    state.subscription = Some(subscription.clone());
                    Reduction::Applied
                }
                phase => settle(phase),
            }
        }
        SettingsAction::Dismiss(family) => {
            state.status_mut(*family).dismiss();
            Reduction::Applied
        }
    }
}

pub fn reduce_routing(state: &mut RoutingState, action: &AppAction) -> Reduction {
    match action {
        AppAction::Routing(RoutingAction::LocationChanged { path }) => {
            if state.location != *path {
                let previous = std::mem::replace(&mut state.location, path.clone());
                state.previous = Some(previous);
            }
            Reduction::Applied
        }
        AppAction::Logout => {
            *state = RoutingState::default();
            Reduction::Applied
        }
        _ => Reduction::Ignored,
    }
}

pub fn reduce_forms(state: &mut FormState, action: &AppAction) -> Reduction {
    match action {
        AppAction::Form(FormAction::Initialize { form, values }) => {
            state.forms.insert(
                form.clone(),
                FormEntry {
                    initial: values.clone(),
                    values: values.clone(),
                    pristine: true,
                },
            );
            Reduction::Applied
        }
        AppAction::Form(FormAction::Change { form, field, value }) => {
            let entry = state.forms.entry(form.clone()).or_insert_with(|| FormEntry {
                pristine: true,
                ..FormEntry::default()
            });
            entry.values.insert(field.clone(), value.clone());
            entry.pristine = entry.values == entry.initial;
            Reduction::Applied
        }
        AppAction::Form(FormAction::Reset { form }) => {
            if let Some(entry) = state.forms.get_mut(form) {
                entry.values = entry.initial.clone();
                entry.pristine = true;
            }
            Reduction::Applied
        }
        AppAction::Logout => {
            *state = FormState::default();
            Reduction::Applied
        }
        _ => Reduction::Ignored,
    }
}

enum Phase<'a, T> {
    Requested,
    Succeeded(&'a T),
    Failed,
    Stale,
}

/// Folds the bookkeeping half of an operation into its status. The payload of
/// an accepted SUCCESS is handed back for the caller to apply.
fn advance<'a, T>(
    status: &mut OpStatus,
    family: &str,
    fields: &[&str],
    op: &'a Op<T>,
) -> Phase<'a, T> {
    match op {
        Op::Request { request_id } => {
            status.begin(*request_id);
            Phase::Requested
        }
        Op::Success { request_id, data } => {
            if !status.accepts(*request_id) {
                debug!(
                    family,
                    request = %request_id,
                    latest = %status.latest_request,
                    "discarding stale success"
                );
                return Phase::Stale;
            }
            status.succeed();
            Phase::Succeeded(data)
        }
        Op::Failure { request_id, error } => {
            if !status.accepts(*request_id) {
                debug!(
                    family,
                    request = %request_id,
                    latest = %status.latest_request,
                    "discarding stale failure"
                );
                return Phase::Stale;
            }
            status.fail(error.clone(), failure_message(error, fields));
            Phase::Failed
        }
    }
}

fn settle<T>(phase: Phase<'_, T>) -> Reduction {
    match phase {
        Phase::Stale => Reduction::Stale,
        Phase::Requested | Phase::Succeeded(_) | Phase::Failed => Reduction::Applied,
    }
}

/// List fetches clear items on REQUEST and replace them wholesale on SUCCESS.
fn fold_list<T: Identified + Clone>(
    collection: &mut Collection<T>,
    family: &str,
    op: &Op<Vec<T>>,
) -> Reduction {
    match advance(&mut collection.list, family, &[], op) {
        Phase::Requested => {
            collection.items.clear();
            Reduction::Applied
        }
        Phase::Succeeded(items) => {
            collection.replace(items.clone());
            Reduction::Applied
        }
        phase => settle(phase),
    }
}

/// Human-readable message for a failed operation.
///
/// Looks at the operation's own field names first, then the backend's
/// catch-all keys. A string value is used as is; an array yields its first
/// string element.
pub fn failure_message(error: &ApiFailure, fields: &[&str]) -> String {
    if error.status.is_none() && !error.local {
        return NETWORK_FAILURE_MESSAGE.to_string();
    }

    if let Value::String(text) = &error.body {
        if !text.trim().is_empty() {
            return text.clone();
        }
    }

    let Value::Object(map) = &error.body else {
        return GENERIC_FAILURE_MESSAGE.to_string();
    };

    fields
        .iter()
        .copied()
        .chain(["non_field_errors", "detail", "message"])
        .find_map(|key| map.get(key).and_then(message_text))
        .unwrap_or_else(|| GENERIC_FAILURE_MESSAGE.to_string())
}

fn message_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) if !text.trim().is_empty() => Some(text.clone()),
        Value::Array(items) => items.iter().find_map(message_text),
        _ => None,
    }
}

fn auth_fields(family: AuthOp) -> &'static [&'static str] {
    match family {
        AuthOp::Login => &["username", "password"],
        AuthOp::TokenLogin => &["token"],
        AuthOp::Register => &["username", "email", "password"],
        AuthOp::ResetPassword => &["email"],
    }
}

fn home_fields(family: HomeOp) -> &'static [&'static str] {
    match family {
        HomeOp::AddProject | HomeOp::AddTeam => &["name"],
        HomeOp::FetchProjects | HomeOp::FetchTeams => &[],
    }
}

fn project_fields(family: ProjectOp) -> &'static [&'static str] {
    match family {
        ProjectOp::UpdateProject => &["name", "description"],
        ProjectOp::AddServer => &["name", "image_name"],
        ProjectOp::UploadFiles => &["files", "file"],
        _ => &[],
    }
}

fn settings_fields(family: SettingsOp) -> &'static [&'static str] {
    match family {
        SettingsOp::UpdateProfile => &["username", "email", "first_name", "last_name"],
        SettingsOp::AddApplication => &["name", "redirect_uris"],
        SettingsOp::AddCard => &["card", "number"],
        _ => &[],
    }
}

#[cfg(test)]
mod tests;
