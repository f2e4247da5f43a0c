use clap::{
    CommandFactory, Parser, Subcommand,
    builder::{
        Styles,
        styling::{AnsiColor, Effects},
    },
};
use clap_complete::{Shell, generate};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use moodtune::{cli, config, error};

fn styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::White.on_default() | Effects::BOLD)
        .usage(AnsiColor::White.on_default() | Effects::BOLD)
        .literal(AnsiColor::BrightBlue.on_default())
        .placeholder(AnsiColor::BrightGreen.on_default())
}

#[derive(Parser, Debug, Clone)]
#[clap(
  version = env!("CARGO_PKG_VERSION"),
  name=env!("CARGO_PKG_NAME"),
  bin_name=env!("CARGO_PKG_NAME"),
  author=env!("CARGO_PKG_AUTHORS"),
  about=env!("CARGO_PKG_DESCRIPTION"),
  styles=styles(),
)]
struct Cli {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Run the HTTP server
    Serve(ServeOptions),

    /// Inspect or remove stored sessions
    Sessions(SessionsOptions),

    /// Get shell completions
    Completions(CompletionsOption),
}

#[derive(Parser, Debug, Clone)]
pub struct ServeOptions {
    /// Listen address, overrides SERVER_ADDRESS
    #[clap(long)]
    pub addr: Option<String>,

    /// Keep session state in memory instead of the data directory
    #[clap(long)]
    pub memory: bool,

    /// Open the Spotify login page in the browser once started
    #[clap(long)]
    pub open: bool,
}

#[derive(Parser, Debug, Clone)]
#[command(about = "Inspect or remove stored sessions")]
pub struct SessionsOptions {
    /// Defaults to `list`
    #[command(subcommand)]
    pub command: Option<SessionsSubcommand>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum SessionsSubcommand {
    /// List stored sessions
    List,

    /// Show the analyzed tracks of a session
    Show { id: String },

    /// Remove a session and all its state
    Clear { id: String },

    /// Remove sessions idle longer than MOODTUNE_SESSION_TTL_MINUTES
    Purge,
}

#[derive(Parser, Debug, Clone)]
pub struct CompletionsOption {
    shell: Shell,
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("moodtune=info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[tokio::main]
async fn main() {
    if let Err(e) = config::load_env().await {
        error!("Cannot load environment. Err: {}", e);
    }

    let cli = Cli::parse();

    match cli.command {
        Command::Serve(opt) => {
            init_tracing();
            cli::serve(opt.addr, opt.memory, opt.open).await
        }
        Command::Sessions(opt) => match opt.command {
            None | Some(SessionsSubcommand::List) => cli::list_sessions().await,
            Some(SessionsSubcommand::Show { id }) => cli::show_session(&id).await,
            Some(SessionsSubcommand::Clear { id }) => cli::clear_session(&id).await,
            Some(SessionsSubcommand::Purge) => cli::purge_sessions().await,
        },
        Command::Completions(opt) => {
            let mut cmd = Cli::command_for_update();
            let name = cmd.get_name().to_string();
            generate(opt.shell, &mut cmd, name, &mut std::io::stdout())
        }
    }
}
