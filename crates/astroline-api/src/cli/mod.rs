//! CLI command definitions for the `astroline` binary.
//!
//! Uses clap derive macros for argument parsing. `serve` runs the REST API;
//! the remaining commands inspect stored sessions directly.

pub mod session;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

/// Astrology chat assistant service.
#[derive(Parser)]
#[command(name = "astroline", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for debug, -vv for trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Export tracing spans through OpenTelemetry (stdout exporter).
    #[arg(long, global = true)]
    pub otel: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the REST API server.
    Serve {
        /// Port to listen on.
        #[arg(long, short, default_value = "8000")]
        port: u16,

        /// Host to bind to.
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Gemini API key.
        #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
        gemini_api_key: Option<String>,

        /// Shared secret used to verify HS256 bearer tokens.
        #[arg(long, env = "JWT_SECRET", hide_env_values = true)]
        jwt_secret: String,
    },

    /// List an owner's chat sessions.
    #[command(alias = "ls")]
    Sessions {
        /// Owner identity (the token subject).
        owner: String,

        /// Include ended sessions.
        #[arg(long)]
        all: bool,
    },

    /// Print the transcript of one session.
    History {
        /// Owner identity (the token subject).
        owner: String,

        /// Session ID.
        session_id: String,
    },

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_serve_with_flags() {
        let cli = Cli::try_parse_from([
            "astroline",
            "-v",
            "serve",
            "--port",
            "9000",
            "--jwt-secret",
            "s3cret",
            "--gemini-api-key",
            "key",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 1);
        match cli.command {
            Commands::Serve {
                port,
                host,
                gemini_api_key,
                jwt_secret,
            } => {
                assert_eq!(port, 9000);
                assert_eq!(host, "127.0.0.1");
                assert_eq!(gemini_api_key.as_deref(), Some("key"));
                assert_eq!(jwt_secret, "s3cret");
            }
            _ => panic!("expected serve"),
        }
    }

    #[test]
    fn test_parse_sessions_with_global_json() {
        let cli = Cli::try_parse_from(["astroline", "sessions", "user-42", "--all", "--json"]).unwrap();
        assert!(cli.json);
        assert!(matches!(
            cli.command,
            Commands::Sessions { ref owner, all: true } if owner == "user-42"
        ));
    }
}
