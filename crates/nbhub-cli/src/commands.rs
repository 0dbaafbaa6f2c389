use std::io;
use std::path::Path;
use std::sync::Arc;

use anyhow::anyhow;
use anyhow::bail;
use anyhow::Context;
use anyhow::Result;
use serde::Serialize;
use serde_json::json;
use tracing::debug;

use nbhub_core::guard::decide;
use nbhub_core::models::WorkspaceKind;
use nbhub_core::persistence::FileStorage;
use nbhub_core::persistence::StateStorage;
use nbhub_core::routes::project_path;
use nbhub_core::routes::token_exchange_path;
use nbhub_core::routes::HOME_ROUTE;
use nbhub_core::routes::LOGIN_ROUTE;
use nbhub_core::routes::REGISTER_ROUTE;
use nbhub_core::routes::RESET_PASSWORD_ROUTE;
use nbhub_core::store::Store;
use nbhub_core::AppConfig;
use nbhub_core::AuthOp;
use nbhub_core::Banner;
use nbhub_core::GuardDecision;
use nbhub_core::HomeOp;
use nbhub_core::OpStatus;
use nbhub_core::ProjectOp;
use nbhub_core::RootState;
use nbhub_core::SessionContext;
use nbhub_core::SettingsOp;
use nbhub_core::StoreHandle;
use nbhub_core::GENERIC_FAILURE_MESSAGE;
use nbhub_exec::AppContext;
use nbhub_exec::Credentials;
use nbhub_exec::MultipartFile;
use nbhub_exec::NewApplication;
use nbhub_exec::NewCard;
use nbhub_exec::NewProject;
use nbhub_exec::NewTeam;
use nbhub_exec::Outcome;
use nbhub_exec::ProfileUpdate;
use nbhub_exec::ProjectUpdate;
use nbhub_exec::Registration;
use nbhub_exec::ReqwestClient;

use crate::AppsCommand;
use crate::BillingCommand;
use crate::Cli;
use crate::Command;
use crate::FilesCommand;
use crate::ProfileCommand;
use crate::ProjectsCommand;
use crate::ServersCommand;
use crate::TeamsCommand;

const SETTINGS_ROUTE: &str = "/settings";
const BILLING_ROUTE: &str = "/billing";

type Ctx = AppContext<ReqwestClient>;

/// Which operation's status carries the banner for a command.
#[derive(Debug, Clone, Copy)]
enum Family {
    Auth(AuthOp),
    Home(HomeOp),
    Project(ProjectOp),
    Settings(SettingsOp),
}

impl Family {
    fn status(self, state: &RootState) -> &OpStatus {
        match self {
            Self::Auth(op) => state.auth.status(op),
            Self::Home(op) => state.home.status(op),
            Self::Project(op) => state.project.status(op),
            Self::Settings(op) => state.settings.status(op),
        }
    }
}

/// Loads config, opens durable storage, restores the session and waits for
/// rehydration before any creator runs.
fn boot(config_path: Option<&Path>) -> Result<Ctx> {
    let config = AppConfig::load(config_path).context("loading config")?;
    let storage: Arc<dyn StateStorage> = Arc::new(
        FileStorage::open(&config.storage.state_path).context("opening state storage")?,
    );

    let session = SessionContext::new(Arc::clone(&storage), config.session.auth_scheme);
    session.restore().context("restoring session")?;

    let store = StoreHandle::new(Store::new(storage));
    store.rehydrate().context("rehydrating state")?;

    let client = ReqwestClient::new(&config.api, session.clone())?;
    debug!(base_url = %config.api.base_url, "booted");
    Ok(AppContext::new(store, Arc::new(client), session, config))
}

pub async fn run(cli: Cli) -> Result<()> {
    let ctx = boot(cli.config.as_deref())?;
    let namespace = cli.namespace;

    match cli.command {
        Command::Login { username, password } => {
            enter(&ctx, LOGIN_ROUTE)?;
            let password = password_or_stdin(password)?;
            let outcome = ctx.login(Credentials { username, password }).await;
            settle(&ctx, outcome, Family::Auth(AuthOp::Login))?;
            whoami(&ctx)
        }
        Command::TokenLogin { token } => {
            enter(&ctx, &token_exchange_path(&token))?;
            let outcome = ctx.token_login(&token).await;
            settle(&ctx, outcome, Family::Auth(AuthOp::TokenLogin))?;
            whoami(&ctx)
        }
        Command::Register {
            username,
            email,
            password,
        } => {
            enter(&ctx, REGISTER_ROUTE)?;
            let password = password_or_stdin(password)?;
            let outcome = ctx
                .register(Registration {
                    username,
                    email,
                    password,
                })
                .await;
            settle(&ctx, outcome, Family::Auth(AuthOp::Register))?;
            println!("registered; sign in with `nbhub login`");
            Ok(())
        }
        Command::ResetPassword { email } => {
            enter(&ctx, RESET_PASSWORD_ROUTE)?;
            let outcome = ctx.reset_password(&email).await;
            settle(&ctx, outcome, Family::Auth(AuthOp::ResetPassword))?;
            println!("reset instructions sent to {email}");
            Ok(())
        }
        Command::Logout => {
            ctx.logout();
            println!("logged out");
            Ok(())
        }
        Command::Whoami => whoami(&ctx),
        Command::Route { path } => {
            let decision = decide(ctx.store.guard_input(), &path);
            match decision {
                GuardDecision::Render => println!("render {path}"),
                GuardDecision::Redirect { to } => println!("redirect {to}"),
                GuardDecision::Pending => println!("pending"),
            }
            Ok(())
        }
        Command::Projects { action } => {
            let namespace = resolve_namespace(&ctx, namespace)?;
            projects(&ctx, &namespace, action).await
        }
        Command::Servers { action } => {
            let namespace = resolve_namespace(&ctx, namespace)?;
            servers(&ctx, &namespace, action).await
        }
        Command::Files { action } => {
            let namespace = resolve_namespace(&ctx, namespace)?;
            files(&ctx, &namespace, action).await
        }
        Command::Teams { action } => {
            let namespace = resolve_namespace(&ctx, namespace)?;
            teams(&ctx, &namespace, action).await
        }
        Command::Apps { action } => {
            let namespace = resolve_namespace(&ctx, namespace)?;
            apps(&ctx, &namespace, action).await
        }
        Command::Billing { action } => {
            let namespace = resolve_namespace(&ctx, namespace)?;
            billing(&ctx, &namespace, action).await
        }
        Command::Profile { action } => {
            let namespace = resolve_namespace(&ctx, namespace)?;
            profile(&ctx, &namespace, action).await
        }
    }
}

async fn projects(ctx: &Ctx, namespace: &str, action: ProjectsCommand) -> Result<()> {
    match action {
        ProjectsCommand::List => {
            enter(ctx, HOME_ROUTE)?;
            let outcome = ctx.fetch_projects(namespace).await;
            settle(ctx, outcome, Family::Home(HomeOp::FetchProjects))?;
            print_slice(ctx, |state| &state.home.projects.items)
        }
        ProjectsCommand::Show { project } => {
            enter(ctx, &project_path(namespace, &project))?;
            let outcome = ctx.fetch_project(namespace, &project).await;
            settle(ctx, outcome, Family::Project(ProjectOp::FetchProject))?;
            print_slice(ctx, |state| &state.project.current)
        }
        ProjectsCommand::Create {
            name,
            description,
            private,
        } => {
            enter(ctx, HOME_ROUTE)?;
            let outcome = ctx
                .add_project(
                    namespace,
                    NewProject {
                        name,
                        description,
                        private,
                    },
                )
                .await;
            settle(ctx, outcome, Family::Home(HomeOp::AddProject))?;
            print_slice(ctx, |state| &state.home.projects.items)
        }
        ProjectsCommand::Update {
            project,
            name,
            description,
            private,
        } => {
            enter(ctx, &project_path(namespace, &project))?;
            let update = ProjectUpdate {
                name,
                description,
                private,
            };
            let outcome = ctx.update_project(namespace, &project, update).await;
            settle(ctx, outcome, Family::Project(ProjectOp::UpdateProject))?;
            print_slice(ctx, |state| &state.project.current)
        }
        ProjectsCommand::Delete { project } => {
            enter(ctx, &project_path(namespace, &project))?;
            let outcome = ctx.delete_project(namespace, &project).await;
            settle(ctx, outcome, Family::Project(ProjectOp::DeleteProject))?;
            println!("deleted project {project}");
            Ok(())
        }
    }
}

async fn servers(ctx: &Ctx, namespace: &str, action: ServersCommand) -> Result<()> {
    match action {
        ServersCommand::List { project } => {
            enter(ctx, &project_path(namespace, &project))?;
            let outcome = ctx.fetch_servers(namespace, &project).await;
            settle(ctx, outcome, Family::Project(ProjectOp::FetchServers))?;
        }
        ServersCommand::Create {
            project,
            name,
            kind,
        } => {
            let kind = WorkspaceKind::parse(&kind)
                .ok_or_else(|| anyhow!("unknown server kind: {kind}"))?;
            enter(ctx, &project_path(namespace, &project))?;
            let outcome = ctx.add_server(namespace, &project, &name, kind).await;
            settle(ctx, outcome, Family::Project(ProjectOp::AddServer))?;
        }
        ServersCommand::Start { project, server } => {
            enter(ctx, &project_path(namespace, &project))?;
            let outcome = ctx.start_server(namespace, &project, &server).await;
            settle(ctx, outcome, Family::Project(ProjectOp::StartServer))?;
        }
        ServersCommand::Stop { project, server } => {
            enter(ctx, &project_path(namespace, &project))?;
            let outcome = ctx.stop_server(namespace, &project, &server).await;
            settle(ctx, outcome, Family::Project(ProjectOp::StopServer))?;
        }
        ServersCommand::Status { project, server } => {
            enter(ctx, &project_path(namespace, &project))?;
            let listed = ctx.fetch_servers(namespace, &project).await;
            settle(ctx, listed, Family::Project(ProjectOp::FetchServers))?;
            let outcome = ctx.fetch_server_status(namespace, &project, &server).await;
            settle(ctx, outcome, Family::Project(ProjectOp::FetchServerStatus))?;
        }
        ServersCommand::Delete { project, server } => {
            enter(ctx, &project_path(namespace, &project))?;
            let outcome = ctx.delete_server(namespace, &project, &server).await;
            settle(ctx, outcome, Family::Project(ProjectOp::DeleteServer))?;
        }
    }
    print_slice(ctx, |state| &state.project.servers.items)
}

async fn files(ctx: &Ctx, namespace: &str, action: FilesCommand) -> Result<()> {
    match action {
        FilesCommand::List { project } => {
            enter(ctx, &project_path(namespace, &project))?;
            let outcome = ctx.fetch_files(namespace, &project).await;
            settle(ctx, outcome, Family::Project(ProjectOp::FetchFiles))?;
        }
        FilesCommand::Upload { project, paths } => {
            enter(ctx, &project_path(namespace, &project))?;
            let mut uploads = Vec::with_capacity(paths.len());
            for path in &paths {
                let file = MultipartFile::read(path)
                    .await
                    .with_context(|| format!("reading {}", path.display()))?;
                uploads.push(file);
            }
            let outcome = ctx.upload_files(namespace, &project, uploads).await;
            settle(ctx, outcome, Family::Project(ProjectOp::UploadFiles))?;
        }
    }
    print_slice(ctx, |state| &state.project.files.items)
}

async fn teams(ctx: &Ctx, namespace: &str, action: TeamsCommand) -> Result<()> {
    enter(ctx, HOME_ROUTE)?;
    match action {
        TeamsCommand::List => {
            let outcome = ctx.fetch_teams(namespace).await;
            settle(ctx, outcome, Family::Home(HomeOp::FetchTeams))?;
        }
        TeamsCommand::Create { name, description } => {
            let outcome = ctx.add_team(namespace, NewTeam { name, description }).await;
            settle(ctx, outcome, Family::Home(HomeOp::AddTeam))?;
        }
    }
    print_slice(ctx, |state| &state.home.teams.items)
}

async fn apps(ctx: &Ctx, namespace: &str, action: AppsCommand) -> Result<()> {
    enter(ctx, SETTINGS_ROUTE)?;
    match action {
        AppsCommand::List => {
            let outcome = ctx.fetch_applications(namespace).await;
            settle(ctx, outcome, Family::Settings(SettingsOp::FetchApplications))?;
        }
        AppsCommand::Create {
            name,
            redirect_uris,
        } => {
            let application = NewApplication {
                name,
                redirect_uris,
            };
            let outcome = ctx.add_application(namespace, application).await;
            settle(ctx, outcome, Family::Settings(SettingsOp::AddApplication))?;
        }
        AppsCommand::Delete { application } => {
            let outcome = ctx.delete_application(namespace, &application).await;
            settle(ctx, outcome, Family::Settings(SettingsOp::DeleteApplication))?;
        }
    }
    print_slice(ctx, |state| &state.settings.applications.items)
}

async fn billing(ctx: &Ctx, namespace: &str, action: BillingCommand) -> Result<()> {
    enter(ctx, BILLING_ROUTE)?;
    match action {
        BillingCommand::Cards => {
            let outcome = ctx.fetch_cards(namespace).await;
            settle(ctx, outcome, Family::Settings(SettingsOp::FetchCards))?;
        }
        BillingCommand::AddCard { token } => {
            let outcome = ctx.add_card(namespace, NewCard { token }).await;
            settle(ctx, outcome, Family::Settings(SettingsOp::AddCard))?;
        }
        BillingCommand::DeleteCard { card } => {
            let outcome = ctx.delete_card(namespace, &card).await;
            settle(ctx, outcome, Family::Settings(SettingsOp::DeleteCard))?;
        }
        BillingCommand::Subscription => {
            let outcome = ctx.fetch_subscription(namespace).await;
            settle(ctx, outcome, Family::Settings(SettingsOp::FetchSubscription))?;
            return print_slice(ctx, |state| &state.settings.subscription);
        }
    }
    print_slice(ctx, |state| &state.settings.cards.items)
}

async fn profile(ctx: &Ctx, namespace: &str, action: ProfileCommand) -> Result<()> {
    enter(ctx, SETTINGS_ROUTE)?;
    match action {
        ProfileCommand::Show => {
            let outcome = ctx.fetch_profile(namespace).await;
            settle(ctx, outcome, Family::Settings(SettingsOp::FetchProfile))?;
        }
        ProfileCommand::Update {
            email,
            first_name,
            last_name,
        } => {
            let update = ProfileUpdate {
                email,
                first_name,
                last_name,
            };
            let outcome = ctx.update_profile(namespace, update).await;
            settle(ctx, outcome, Family::Settings(SettingsOp::UpdateProfile))?;
        }
    }
    print_slice(ctx, |state| &state.settings.profile)
}

/// Records the location and applies the route guard to it.
fn enter(ctx: &Ctx, location: &str) -> Result<()> {
    ctx.navigate(location);
    match decide(ctx.store.guard_input(), location) {
        GuardDecision::Render => Ok(()),
        GuardDecision::Redirect { to } if to.starts_with(LOGIN_ROUTE) => {
            ctx.navigate(to);
            bail!("not signed in; run `nbhub login` first")
        }
        GuardDecision::Redirect { to } => {
            ctx.navigate(to);
            bail!("already signed in; run `nbhub logout` first")
        }
        GuardDecision::Pending => bail!("persisted state is not loaded yet"),
    }
}

/// Turns a FAILURE into an error carrying the banner text.
fn settle(ctx: &Ctx, outcome: Outcome, family: Family) -> Result<()> {
    if outcome.is_success() {
        return Ok(());
    }
    let message = ctx.store.read(|state| match family.status(state).banner() {
        Some(Banner::Failure(message)) => message.to_string(),
        _ => GENERIC_FAILURE_MESSAGE.to_string(),
    });
    bail!(message)
}

fn resolve_namespace(ctx: &Ctx, explicit: Option<String>) -> Result<String> {
    explicit
        .or_else(|| ctx.namespace())
        .ok_or_else(|| anyhow!("no namespace; sign in or pass --namespace"))
}

fn whoami(ctx: &Ctx) -> Result<()> {
    let identity = ctx.store.read(|state| {
        json!({
            "username": state.auth.username,
            "account_id": state.auth.account_id,
            "authenticated": state.auth.token_present,
        })
    });
    print_json(&identity)
}

fn print_slice<T: Serialize>(ctx: &Ctx, select: impl FnOnce(&RootState) -> &T) -> Result<()> {
    let rendered = ctx
        .store
        .read(|state| serde_json::to_string_pretty(select(state)))?;
    println!("{rendered}");
    Ok(())
}

fn print_json(value: &serde_json::Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn password_or_stdin(password: Option<String>) -> Result<String> {
    if let Some(password) = password {
        return Ok(password);
    }
    let mut line = String::new();
    io::stdin()
        .read_line(&mut line)
        .context("reading password from stdin")?;
    let password = line.trim_end_matches(['\r', '\n']).to_string();
    if password.is_empty() {
        bail!("password is required");
    }
    Ok(password)
}
