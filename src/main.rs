use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use cloud_explorer::routes::EXPLORER_ROUTE;
use cloud_explorer::{
    ApiClient, ApiError, ClientConfig, ConfigError, ExplorerTarget, FileStorage, Navigation, NavigationError,
    Navigator, RouteTable, SessionContext,
};

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Navigation(#[from] NavigationError),
    #[error("not logged in; run `cloud-explorer login` first")]
    NotLoggedIn,
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "cloud-explorer", about = "Cloud file explorer session client")]
struct Cli {
    #[arg(long, env = "CLOUD_API_BASE_URL")]
    base_url: Option<String>,

    #[arg(long, env = "CLOUD_SESSION_FILE")]
    session_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Exchange credentials for a token and store it.
    Login {
        #[arg(long)]
        username: String,
        #[arg(long, env = "CLOUD_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Forget the stored session.
    Logout,
    /// Show the stored session.
    Status,
    /// Navigate to a route by name through the guard.
    Open { route: String },
    /// List a directory in the file explorer.
    Ls {
        #[arg(long)]
        adapter: Option<String>,
        #[arg(long)]
        path: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let mut config = ClientConfig::from_env()?;
    if let Some(base_url) = cli.base_url.as_deref() {
        config.base_url = ClientConfig::new(base_url, &config.session_file)?.base_url;
    }
    if let Some(session_file) = cli.session_file {
        config.session_file = session_file;
    }

    // Session state must exist before anything can navigate.
    let context = SessionContext::new();
    context.initialize(Arc::new(FileStorage::new(&config.session_file)));
    let navigator = Navigator::new(RouteTable::standard(), context.clone());
    let client = ApiClient::new(&config, context.clone(), navigator)?;

    tracing::info!(base_url = %config.base_url, session_file = %config.session_file.display(), "client ready");

    let result = run(cli.command, &client).await;
    context.teardown();
    result
}

async fn run(command: Command, client: &ApiClient) -> Result<(), CliError> {
    match command {
        Command::Login { username, password } => {
            client.login(&username, &password).await?;
            println!("logged in as {username}");
        }
        Command::Logout => {
            client.logout();
            println!("logged out");
        }
        Command::Status => {
            let session = client.session()?.snapshot();
            if session.is_authenticated() {
                let who = if session.principal_name.is_empty() { "<unknown>" } else { &session.principal_name };
                println!("authenticated as {who}");
            } else {
                println!("not authenticated");
            }
        }
        Command::Open { route } => report(&client.navigator().push(&route)?),
        Command::Ls { adapter, path } => {
            if let Navigation::Redirected { .. } = client.navigator().push(EXPLORER_ROUTE)? {
                return Err(CliError::NotLoggedIn);
            }
            let listing = client.list(&ExplorerTarget { adapter, path }).await?;
            println!("{}", serde_json::to_string_pretty(&listing)?);
        }
    }
    Ok(())
}

fn report(navigation: &Navigation) {
    match navigation {
        Navigation::Entered(route) => println!("entered {} ({})", route.name, route.path),
        Navigation::Redirected { from, to } => {
            println!("{from} requires login; redirected to {} ({})", to.name, to.path);
        }
    }
}
