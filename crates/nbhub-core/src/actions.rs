use std::collections::BTreeMap;
use std::fmt;

use super::models::BillingCard;
use super::models::LoginSuccess;
use super::models::OAuthApplication;
use super::models::Project;
use super::models::ProjectFile;
use super::models::RegisteredUser;
use super::models::Server;
use super::models::ServerStatusReport;
use super::models::Subscription;
use super::models::Team;
use super::models::UserProfile;
use super::persistence::PersistedSlice;
use super::state::ApiFailure;

/// Token handed out by the store for every action creator invocation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestId(pub u64);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "req-{}", self.0)
    }
}

/// The requested / succeeded / failed triple every remote operation emits.
#[derive(Debug, Clone, PartialEq)]
pub enum Op<T> {
    Request { request_id: RequestId },
    Success { request_id: RequestId, data: T },
    Failure { request_id: RequestId, error: ApiFailure },
}

impl<T> Op<T> {
    pub fn request_id(&self) -> RequestId {
        match self {
            Self::Request { request_id }
            | Self::Success { request_id, .. }
            | Self::Failure { request_id, .. } => *request_id,
        }
    }

    pub fn phase_label(&self) -> &'static str {
        match self {
            Self::Request { .. } => "REQUEST",
            Self::Success { .. } => "SUCCESS",
            Self::Failure { .. } => "FAILURE",
        }
    }

    pub fn is_request(&self) -> bool {
        matches!(self, Self::Request { .. })
    }
}

fn op_type_name<T>(family: &str, op: &Op<T>) -> String {
    format!("{family}_{}", op.phase_label())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthOp {
    Login,
    TokenLogin,
    Register,
    ResetPassword,
}

impl AuthOp {
    pub fn label(self) -> &'static str {
        match self {
            Self::Login => "LOGIN",
            Self::TokenLogin => "TOKEN_LOGIN",
            Self::Register => "REGISTER",
            Self::ResetPassword => "RESET_PASSWORD",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AuthAction {
    Login(Op<LoginSuccess>),
    TokenLogin(Op<LoginSuccess>),
    Register(Op<RegisteredUser>),
    ResetPassword(Op<()>),
    Dismiss(AuthOp),
}

impl AuthAction {
    pub fn type_name(&self) -> String {
        match self {
            Self::Login(op) => op_type_name(AuthOp::Login.label(), op),
            Self::TokenLogin(op) => op_type_name(AuthOp::TokenLogin.label(), op),
            Self::Register(op) => op_type_name(AuthOp::Register.label(), op),
            Self::ResetPassword(op) => op_type_name(AuthOp::ResetPassword.label(), op),
            Self::Dismiss(family) => format!("DISMISS_{}", family.label()),
        }
    }

    fn request_id(&self) -> Option<RequestId> {
        match self {
            Self::Login(op) | Self::TokenLogin(op) => Some(op.request_id()),
            Self::Register(op) => Some(op.request_id()),
            Self::ResetPassword(op) => Some(op.request_id()),
            Self::Dismiss(_) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HomeOp {
    FetchProjects,
    AddProject,
    FetchTeams,
    AddTeam,
}

impl HomeOp {
    pub fn label(self) -> &'static str {
        match self {
            Self::FetchProjects => "FETCH_PROJECTS",
            Self::AddProject => "ADD_PROJECT",
            Self::FetchTeams => "FETCH_TEAMS",
            Self::AddTeam => "ADD_TEAM",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum HomeAction {
    FetchProjects(Op<Vec<Project>>),
    AddProject(Op<Project>),
    FetchTeams(Op<Vec<Team>>),
    AddTeam(Op<Team>),
    Dismiss(HomeOp),
}

impl HomeAction {
    pub fn type_name(&self) -> String {
        match self {
            Self::FetchProjects(op) => op_type_name(HomeOp::FetchProjects.label(), op),
            Self::AddProject(op) => op_type_name(HomeOp::AddProject.label(), op),
            Self::FetchTeams(op) => op_type_name(HomeOp::FetchTeams.label(), op),
            Self::AddTeam(op) => op_type_name(HomeOp::AddTeam.label(), op),
            Self::Dismiss(family) => format!("DISMISS_{}", family.label()),
        }
    }

    fn request_id(&self) -> Option<RequestId> {
        match self {
            Self::FetchProjects(op) => Some(op.request_id()),
            Self::AddProject(op) => Some(op.request_id()),
            Self::FetchTeams(op) => Some(op.request_id()),
            Self::AddTeam(op) => Some(op.request_id()),
            Self::Dismiss(_) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProjectOp {
    FetchProject,
    UpdateProject,
    DeleteProject,
    FetchServers,
    AddServer,
    StartServer,
    StopServer,
    FetchServerStatus,
    DeleteServer,
    FetchFiles,
    UploadFiles,
}

impl ProjectOp {
    pub fn label(self) -> &'static str {
        match self {
            Self::FetchProject => "FETCH_PROJECT",
            Self::UpdateProject => "UPDATE_PROJECT",
            Self::DeleteProject => "DELETE_PROJECT",
            Self::FetchServers => "FETCH_SERVERS",
            Self::AddServer => "ADD_SERVER",
            Self::StartServer => "START_SERVER",
            Self::StopServer => "STOP_SERVER",
            Self::FetchServerStatus => "FETCH_SERVER_STATUS",
            Self::DeleteServer => "DELETE_SERVER",
            Self::FetchFiles => "FETCH_FILES",
            Self::UploadFiles => "UPLOAD_FILES",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ProjectAction {
    FetchProject(Op<Project>),
    UpdateProject(Op<Project>),
    /// Success carries the id of the removed project.
    DeleteProject(Op<String>),
    FetchServers(Op<Vec<Server>>),
    AddServer(Op<Server>),
    StartServer(Op<String>),
    StopServer(Op<String>),
    FetchServerStatus(Op<ServerStatusReport>),
    DeleteServer(Op<String>),
    FetchFiles(Op<Vec<ProjectFile>>),
    UploadFiles(Op<Vec<ProjectFile>>),
    Dismiss(ProjectOp),
}

impl ProjectAction {
    pub fn type_name(&self) -> String {
        match self {
            Self::FetchProject(op) => op_type_name(ProjectOp::FetchProject.label(), op),
            Self::UpdateProject(op) => op_type_name(ProjectOp::UpdateProject.label(), op),
            Self::DeleteProject(op) => op_type_name(ProjectOp::DeleteProject.label(), op),
            Self::FetchServers(op) => op_type_name(ProjectOp::FetchServers.label(), op),
            Self::AddServer(op) => op_type_name(ProjectOp::AddServer.label(), op),
            Self::StartServer(op) => op_type_name(ProjectOp::StartServer.label(), op),
            Self::StopServer(op) => op_type_name(ProjectOp::StopServer.label(), op),
            Self::FetchServerStatus(op) => {
                op_type_name(ProjectOp::FetchServerStatus.label(), op)
            }
            Self::DeleteServer(op) => op_type_name(ProjectOp::DeleteServer.label(), op),
            Self::FetchFiles(op) => op_type_name(ProjectOp::FetchFiles.label(), op),
            Self::UploadFiles(op) => op_type_name(ProjectOp::UploadFiles.label(), op),
            Self::Dismiss(family) => format!("DISMISS_{}", family.label()),
        }
    }

    fn request_id(&self) -> Option<RequestId> {
        match self {
            Self::FetchProject(op) | Self::UpdateProject(op) => Some(op.request_id()),
            Self::DeleteProject(op)
            | Self::StartServer(op)
            | Self::StopServer(op)
            | Self::DeleteServer(op) => Some(op.request_id()),
            Self::FetchServers(op) => Some(op.request_id()),
            Self::AddServer(op) => Some(op.request_id()),
            Self::FetchServerStatus(op) => Some(op.request_id()),
            Self::FetchFiles(op) | Self::UploadFiles(op) => Some(op.request_id()),
            Self::Dismiss(_) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SettingsOp {
    FetchProfile,
    UpdateProfile,
    FetchApplications,
    AddApplication,
    DeleteApplication,
    FetchCards,
    AddCard,
    DeleteCard,
    FetchSubscription,
}

impl SettingsOp {
    pub fn label(self) -> &'static str {
        match self {
            Self::FetchProfile => "FETCH_PROFILE",
            Self::UpdateProfile => "UPDATE_PROFILE",
            Self::FetchApplications => "FETCH_APPLICATIONS",
            Self::AddApplication => "ADD_APPLICATION",
            Self::DeleteApplication => "DELETE_APPLICATION",
            Self::FetchCards => "FETCH_CARDS",
            Self::AddCard => "ADD_CARD",
            Self::DeleteCard => "DELETE_CARD",
            Self::FetchSubscription => "FETCH_SUBSCRIPTION",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SettingsAction {
    FetchProfile(Op<UserProfile>),
    UpdateProfile(Op<UserProfile>),
    FetchApplications(Op<Vec<OAuthApplication>>),
    AddApplication(Op<OAuthApplication>),
    DeleteApplication(Op<String>),
    FetchCards(Op<Vec<BillingCard>>),
    AddCard(Op<BillingCard>),
    DeleteCard(Op<String>),
    FetchSubscription(Op<Subscription>),
    Dismiss(SettingsOp),
}

impl SettingsAction {
    pub fn type_name(&self) -> String {
        match self {
            Self::FetchProfile(op) => op_type_name(SettingsOp::FetchProfile.label(), op),
            Self::UpdateProfile(op) => op_type_name(SettingsOp::UpdateProfile.label(), op),
            Self::FetchApplications(op) => {
                op_type_name(SettingsOp::FetchApplications.label(), op)
            }
            Self::AddApplication(op) => op_type_name(SettingsOp::AddApplication.label(), op),
            Self::DeleteApplication(op) => {
                op_type_name(SettingsOp::DeleteApplication.label(), op)
            }
            Self::FetchCards(op) => op_type_name(SettingsOp::FetchCards.label(), op),
            Self::AddCard(op) => op_type_name(SettingsOp::AddCard.label(), op),
            Self::DeleteCard(op) => op_type_name(SettingsOp::DeleteCard.label(), op),
            Self::FetchSubscription(op) => {
                op_type_name(SettingsOp::FetchSubscription.label(), op)
            }
            Self::Dismiss(family) => format!("DISMISS_{}", family.label()),
        }
    }

    fn request_id(&self) -> Option<RequestId> {
        match self {
            Self::FetchProfile(op) | Self::UpdateProfile(op) => Some(op.request_id()),
            Self::FetchApplications(op) => Some(op.request_id()),
            Self::AddApplication(op) => Some(op.request_id()),
            Self::DeleteApplication(op) | Self::DeleteCard(op) => Some(op.request_id()),
            Self::FetchCards(op) => Some(op.request_id()),
            Self::AddCard(op) => Some(op.request_id()),
            Self::FetchSubscription(op) => Some(op.request_id()),
            Self::Dismiss(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoutingAction {
    LocationChanged { path: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormAction {
    Initialize {
        form: String,
        values: BTreeMap<String, String>,
    },
    Change {
        form: String,
        field: String,
        value: String,
    },
    Reset {
        form: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum AppAction {
    Auth(AuthAction),
    Home(HomeAction),
    Project(ProjectAction),
    Settings(SettingsAction),
    Routing(RoutingAction),
    Form(FormAction),
    Rehydrate(PersistedSlice),
    /// Global reset. The store discards the whole tree before reducing it.
    Logout,
}

impl AppAction {
    pub fn type_name(&self) -> String {
        match self {
            Self::Auth(action) => action.type_name(),
            Self::Home(action) => action.type_name(),
            Self::Project(action) => action.type_name(),
            Self::Settings(action) => action.type_name(),
            Self::Routing(RoutingAction::LocationChanged { .. }) => "LOCATION_CHANGE".to_string(),
            Self::Form(FormAction::Initialize { .. }) => "FORM_INITIALIZE".to_string(),
            Self::Form(FormAction::Change { .. }) => "FORM_CHANGE".to_string(),
            Self::Form(FormAction::Reset { .. }) => "FORM_RESET".to_string(),
            Self::Rehydrate(_) => "REHYDRATE".to_string(),
            Self::Logout => "LOGOUT".to_string(),
        }
    }

    pub fn request_id(&self) -> Option<RequestId> {
        match self {
            Self::Auth(action) => action.request_id(),
            Self::Home(action) => action.request_id(),
            Self::Project(action) => action.request_id(),
            Self::Settings(action) => action.request_id(),
            Self::Routing(_) | Self::Form(_) | Self::Rehydrate(_) | Self::Logout => None,
        }
    }
}

impl From<AuthAction> for AppAction {
    fn from(action: AuthAction) -> Self {
        Self::Auth(action)
    }
}

impl From<HomeAction> for AppAction {
    fn from(action: HomeAction) -> Self {
        Self::Home(action)
    }
}

impl From<ProjectAction> for AppAction {
    fn from(action: ProjectAction) -> Self {
        Self::Project(action)
    }
}

impl From<SettingsAction> for AppAction {
    fn from(action: SettingsAction) -> Self {
        Self::Settings(action)
    }
}

impl From<RoutingAction> for AppAction {
    fn from(action: RoutingAction) -> Self {
        Self::Routing(action)
    }
}

impl From<FormAction> for AppAction {
    fn from(action: FormAction) -> Self {
        Self::Form(action)
    }
}
