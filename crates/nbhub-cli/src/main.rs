use std::path::PathBuf;

use clap::Parser;
use clap::Subcommand;

mod commands;
mod logging;

#[derive(Parser)]
#[command(name = "nbhub")]
#[command(version, about = "Command-line client for the notebook hub", long_about = None)]
struct Cli {
    /// Config file (TOML or YAML). Falls back to NBHUB_CONFIG, then defaults.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Resource namespace. Defaults to the signed-in username.
    #[arg(long, global = true)]
    namespace: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Sign in with username and password
    Login {
        #[arg(long)]
        username: String,
        /// Read from stdin when omitted
        #[arg(long)]
        password: Option<String>,
    },
    /// Sign in with a single-use token from an emailed link
    TokenLogin { token: String },
    /// Create an account
    Register {
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: Option<String>,
    },
    /// Request a password reset email
    ResetPassword {
        #[arg(long)]
        email: String,
    },
    /// Forget the session and all persisted state
    Logout,
    /// Show the persisted identity
    Whoami,
    /// Show what the route guard decides for a location
    Route { path: String },
    Projects {
        #[command(subcommand)]
        action: ProjectsCommand,
    },
    Servers {
        #[command(subcommand)]
        action: ServersCommand,
    },
    Files {
        #[command(subcommand)]
        action: FilesCommand,
    },
    Teams {
        #[command(subcommand)]
        action: TeamsCommand,
    },
    Apps {
        #[command(subcommand)]
        action: AppsCommand,
    },
    Billing {
        #[command(subcommand)]
        action: BillingCommand,
    },
    Profile {
        #[command(subcommand)]
        action: ProfileCommand,
    },
}

#[derive(Subcommand)]
enum ProjectsCommand {
    List,
    Show {
        project: String,
    },
    Create {
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long)]
        private: bool,
    },
    Update {
        project: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        private: Option<bool>,
    },
    Delete {
        project: String,
    },
}

#[derive(Subcommand)]
enum ServersCommand {
    List {
        project: String,
    },
    Create {
        project: String,
        #[arg(long)]
        name: String,
        /// jupyter, rstudio, restful or cron
        #[arg(long, default_value = "jupyter")]
        kind: String,
    },
    Start {
        project: String,
        server: String,
    },
    Stop {
        project: String,
        server: String,
    },
    Status {
        project: String,
        server: String,
    },
    Delete {
        project: String,
        server: String,
    },
}

#[derive(Subcommand)]
enum FilesCommand {
    List {
        project: String,
    },
    Upload {
        project: String,
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
}

#[derive(Subcommand)]
enum TeamsCommand {
    List,
    Create {
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "")]
        description: String,
    },
}

#[derive(Subcommand)]
enum AppsCommand {
    List,
    Create {
        #[arg(long)]
        name: String,
        #[arg(long = "redirect-uri")]
        redirect_uris: Vec<String>,
    },
    Delete {
        application: String,
    },
}

#[derive(Subcommand)]
enum BillingCommand {
    Cards,
    AddCard {
        /// Token issued by the payment provider
        #[arg(long)]
        token: String,
    },
    DeleteCard {
        card: String,
    },
    Subscription,
}

#[derive(Subcommand)]
enum ProfileCommand {
    Show,
    Update {
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        first_name: Option<String>,
        #[arg(long)]
        last_name: Option<String>,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    logging::init_logging();
    let cli = Cli::parse();
    if let Err(err) = commands::run(cli).await {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
