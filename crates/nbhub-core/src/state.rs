use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use super::actions::AuthOp;
use super::actions::HomeOp;
use super::actions::ProjectOp;
use super::actions::RequestId;
use super::actions::SettingsOp;
use super::models::Identified;
use super::models::BillingCard;
use super::models::OAuthApplication;
use super::models::Project;
use super::models::ProjectFile;
use super::models::Server;
use super::models::Subscription;
use super::models::Team;
use super::models::UserProfile;
use super::routes::HOME_ROUTE;

/// Normalized rejection produced by the HTTP boundary.
///
/// `status` is `None` for transport failures (connection refused, timeout,
/// undecodable response) and for local failures, which never reached the
/// network at all.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiFailure {
    pub status: Option<u16>,
    pub body: Value,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub local: bool,
}

impl ApiFailure {
    pub fn new(status: Option<u16>, body: Value) -> Self {
        Self {
            status,
            body,
            local: false,
        }
    }

    pub fn transport(detail: impl Into<String>) -> Self {
        Self::new(None, serde_json::json!({ "detail": detail.into() }))
    }

    /// A failure on this side of the wire: the request could not be built or
    /// its result could not be kept.
    pub fn local(detail: impl Into<String>) -> Self {
        Self {
            local: true,
            ..Self::transport(detail)
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status == Some(401)
    }
}

/// Banner-facing bookkeeping for one operation family.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OpStatus {
    pub in_flight: bool,
    pub succeeded: bool,
    pub failed: bool,
    pub error: Option<ApiFailure>,
    pub error_message: Option<String>,
    pub latest_request: RequestId,
}

impl OpStatus {
    pub fn begin(&mut self, request_id: RequestId) {
        self.latest_request = self.latest_request.max(request_id);
        self.in_flight = true;
        self.succeeded = false;
        self.failed = false;
    }

    /// Responses older than the latest request of this family are stale.
    pub fn accepts(&self, request_id: RequestId) -> bool {
        request_id >= self.latest_request
    }

    pub fn succeed(&mut self) {
        self.in_flight = false;
        self.succeeded = true;
        self.failed = false;
    }

    pub fn fail(&mut self, error: ApiFailure, message: String) {
        self.in_flight = false;
        self.succeeded = false;
        self.failed = true;
        self.error = Some(error);
        self.error_message = Some(message);
    }

    /// Closes the banner. The error record stays for diagnostics.
    pub fn dismiss(&mut self) {
        self.succeeded = false;
        self.failed = false;
    }

    pub fn banner(&self) -> Option<Banner<'_>> {
        if self.failed {
            return Some(Banner::Failure(
                self.error_message
                    .as_deref()
                    .unwrap_or(crate::reducer::GENERIC_FAILURE_MESSAGE),
            ));
        }
        if self.succeeded {
            return Some(Banner::Success);
        }
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Banner<'a> {
    Success,
    Failure(&'a str),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Collection<T> {
    pub items: Vec<T>,
    pub fetched: bool,
    pub list: OpStatus,
}

impl<T> Default for Collection<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            fetched: false,
            list: OpStatus::default(),
        }
    }
}

impl<T: Identified> Collection<T> {
    pub fn replace(&mut self, items: Vec<T>) {
        self.items = items;
        self.fetched = true;
    }

    pub fn append(&mut self, item: T) {
        self.items.push(item);
    }

    pub fn upsert(&mut self, item: T) {
        if let Some(existing) = self.items.iter_mut().find(|it| it.id() == item.id()) {
            *existing = item;
        } else {
            self.items.push(item);
        }
    }

    pub fn remove(&mut self, id: &str) {
        self.items.retain(|item| item.id() != id);
    }

    pub fn get(&self, id: &str) -> Option<&T> {
        self.items.iter().find(|item| item.id() == id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut T> {
        self.items.iter_mut().find(|item| item.id() == id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuthState {
    pub account_id: Option<String>,
    pub username: Option<String>,
    pub token_present: bool,
    pub login: OpStatus,
    pub token_login: OpStatus,
    pub register: OpStatus,
    pub reset_password: OpStatus,
}

impl AuthState {
    pub fn login_in_progress(&self) -> bool {
        self.login.in_flight || self.token_login.in_flight
    }

    pub fn last_error(&self) -> Option<&str> {
        self.login
            .error_message
            .as_deref()
            .or(self.token_login.error_message.as_deref())
    }

    pub fn status(&self, op: AuthOp) -> &OpStatus {
        match op {
            AuthOp::Login => &self.login,
            AuthOp::TokenLogin => &self.token_login,
            AuthOp::Register => &self.register,
            AuthOp::ResetPassword => &self.reset_password,
        }
    }

    pub fn status_mut(&mut self, op: AuthOp) -> &mut OpStatus {
        match op {
            AuthOp::Login => &mut self.login,
            AuthOp::TokenLogin => &mut self.token_login,
            AuthOp::Register => &mut self.register,
            AuthOp::ResetPassword => &mut self.reset_password,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct HomeState {
    pub projects: Collection<Project>,
    pub add_project: OpStatus,
    pub teams: Collection<Team>,
    pub add_team: OpStatus,
}

impl HomeState {
    pub fn status(&self, op: HomeOp) -> &OpStatus {
        match op {
            HomeOp::FetchProjects => &self.projects.list,
            HomeOp::AddProject => &self.add_project,
            HomeOp::FetchTeams => &self.teams.list,
            HomeOp::AddTeam => &self.add_team,
        }
    }

    pub fn status_mut(&mut self, op: HomeOp) -> &mut OpStatus {
        match op {
            HomeOp::FetchProjects => &mut self.projects.list,
            HomeOp::AddProject => &mut self.add_project,
            HomeOp::FetchTeams => &mut self.teams.list,
            HomeOp::AddTeam => &mut self.add_team,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectState {
    pub current: Option<Project>,
    pub detail: OpStatus,
    pub update: OpStatus,
    pub delete: OpStatus,
    pub servers: Collection<Server>,
    pub add_server: OpStatus,
    pub start_server: OpStatus,
    pub stop_server: OpStatus,
    pub server_status: OpStatus,
    pub delete_server: OpStatus,
    pub files: Collection<ProjectFile>,
    pub upload_files: OpStatus,
}

impl ProjectState {
    pub fn status(&self, op: ProjectOp) -> &OpStatus {
        match op {
            ProjectOp::FetchProject => &self.detail,
            ProjectOp::UpdateProject => &self.update,
            ProjectOp::DeleteProject => &self.delete,
            ProjectOp::FetchServers => &self.servers.list,
            ProjectOp::AddServer => &self.add_server,
            ProjectOp::StartServer => &self.start_server,
            ProjectOp::StopServer => &self.stop_server,
            ProjectOp::FetchServerStatus => &self.server_status,
            ProjectOp::DeleteServer => &self.delete_server,
            ProjectOp::FetchFiles => &self.files.list,
            ProjectOp::UploadFiles => &self.upload_files,
        }
    }

    pub fn status_mut(&mut self, op: ProjectOp) -> &mut OpStatus {
        match op {
            ProjectOp::FetchProject => &mut self.detail,
            ProjectOp::UpdateProject => &mut self.update,
            ProjectOp::DeleteProject => &mut self.delete,
            ProjectOp::FetchServers => &mut self.servers.list,
            ProjectOp::AddServer => &mut self.add_server,
            ProjectOp::StartServer => &mut self.start_server,
            ProjectOp::StopServer => &mut self.stop_server,
            ProjectOp::FetchServerStatus => &mut self.server_status,
            ProjectOp::DeleteServer => &mut self.delete_server,
            ProjectOp::FetchFiles => &mut self.files.list,
            ProjectOp::UploadFiles => &mut self.upload_files,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SettingsState {
    pub profile: Option<UserProfile>,
    pub fetch_profile: OpStatus,
    pub update_profile: OpStatus,
    pub applications: Collection<OAuthApplication>,
    pub add_application: OpStatus,
    pub delete_application: OpStatus,
    pub cards: Collection<BillingCard>,
    pub add_card: OpStatus,
    pub delete_card: OpStatus,
    pub subscription: Option<Subscription>,
    pub fetch_subscription: OpStatus,
}

impl SettingsState {
    pub fn status(&self, op: SettingsOp) -> &OpStatus {
        match op {
            SettingsOp::FetchProfile => &self.fetch_profile,
            SettingsOp::UpdateProfile => &self.update_profile,
            SettingsOp::FetchApplications => &self.applications.list,
            SettingsOp::AddApplication => &self.add_application,
            SettingsOp::DeleteApplication => &self.delete_application,
            SettingsOp::FetchCards => &self.cards.list,
            SettingsOp::AddCard => &self.add_card,
            SettingsOp::DeleteCard => &self.delete_card,
            SettingsOp::FetchSubscription => &self.fetch_subscription,
        }
    }

    pub fn status_mut(&mut self, op: SettingsOp) -> &mut OpStatus {
        match op {
            SettingsOp::FetchProfile => &mut self.fetch_profile,
            SettingsOp::UpdateProfile => &mut self.update_profile,
            SettingsOp::FetchApplications => &mut self.applications.list,
            SettingsOp::AddApplication => &mut self.add_application,
            SettingsOp::DeleteApplication => &mut self.delete_application,
            SettingsOp::FetchCards => &mut self.cards.list,
            SettingsOp::AddCard => &mut self.add_card,
            SettingsOp::DeleteCard => &mut self.delete_card,
            SettingsOp::FetchSubscription => &mut self.fetch_subscription,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutingState {
    pub location: String,
    pub previous: Option<String>,
}

impl Default for RoutingState {
    fn default() -> Self {
        Self {
            location: HOME_ROUTE.to_string(),
            previous: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormEntry {
    pub initial: BTreeMap<String, String>,
    pub values: BTreeMap<String, String>,
    pub pristine: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormState {
    pub forms: BTreeMap<String, FormEntry>,
}

impl FormState {
    pub fn is_pristine(&self, form: &str) -> bool {
        self.forms.get(form).map_or(true, |entry| entry.pristine)
    }
}

/// The single state tree. Each slice is owned by exactly one domain reducer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RootState {
    pub auth: AuthState,
    pub home: HomeState,
    pub project: ProjectState,
    pub settings: SettingsState,
    pub routing: RoutingState,
    pub forms: FormState,
}

impl RootState {
    pub fn new() -> Self {
        Self::default()
    }
}
