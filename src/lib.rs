//! moodtune library
//!
//! Session-scoped mood matching for Spotify listeners: a client pushes a mood
//! target (tempo and valence), and the engine answers with the cached track
//! whose analysis sits closest to it, falling back to a Spotify
//! recommendation seeded from the listener's top artists.
//!
//! # Modules
//!
//! - `api` - HTTP handlers and the session extractor
//! - `cli` - Command-line interface implementations
//! - `config` - Configuration management and environment variables
//! - `engine` - Matcher, recommender and analysis library over the stores
//! - `errors` - Engine error type
//! - `llm` - Track mood estimation through a chat completion service
//! - `management` - Per-session stores (tokens, mood, history, analysis)
//! - `server` - Router assembly and the HTTP server loop
//! - `spotify` - Spotify accounts and Web API clients
//! - `types` - Data structures and type definitions
//! - `utils` - PKCE, state and session id generation
//!
//! # Example
//!
//! ```
//! use moodtune::{config, cli};
//!
//! #[tokio::main]
//! async fn main() -> moodtune::Res<()> {
//!     config::load_env().await?;
//!     cli::list_sessions().await;
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod llm;
pub mod management;
pub mod server;
pub mod spotify;
pub mod types;
pub mod utils;

/// Result alias used by the CLI layer, where errors from the engine, IO and
/// the HTTP clients meet and only need to be printed.
pub type Res<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Prints a console status line with a blue `o` marker.
///
/// ```ignore
/// info!("Listening on {}", addr);
/// ```
#[macro_export]
macro_rules! info {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "o".blue().bold(), std::format_args!($($arg)*));
  })
}

/// Prints a console line with a green check mark.
#[macro_export]
macro_rules! success {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "✓".green().bold(), std::format_args!($($arg)*));
  })
}

/// Prints a red `!` line and exits the process with status 1.
///
/// Only for CLI paths where nothing sensible can follow, e.g. a missing
/// client id at startup. The expansion has type `!`, so it can sit in a `match`
/// arm that would otherwise need a value.
///
/// ```ignore
/// let config = match Config::from_env() {
///     Ok(c) => c,
///     Err(e) => error!("Cannot load configuration. Err: {}", e),
/// };
/// ```
#[macro_export]
macro_rules! error {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "!".red().bold(), std::format_args!($($arg)*));
    std::process::exit(1);
  })
}

/// Prints a yellow `!` line for recoverable problems.
#[macro_export]
macro_rules! warning {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "!".yellow().bold(), std::format_args!($($arg)*));
  })
}
