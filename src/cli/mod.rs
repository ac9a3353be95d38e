use anyhow::Context as _;
use clap::{Parser, Subcommand};

use crate::auth::{generate_jwt, Claims};
use crate::config::AppConfig;

#[derive(Parser)]
#[command(name = "content-api")]
#[command(about = "Content API - GraphQL endpoint with out-of-band image uploads")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Run the HTTP server (default)")]
    Serve {
        #[arg(long, help = "Port to listen on, overrides PORT")]
        port: Option<u16>,
    },

    #[command(about = "Mint a bearer token signed with the configured secret")]
    Token {
        #[arg(help = "User id to embed in the token")]
        user_id: String,
        #[arg(long, help = "Optional email claim")]
        email: Option<String>,
    },
}

pub async fn run(cli: Cli, mut config: AppConfig) -> anyhow::Result<()> {
    match cli.command.unwrap_or(Commands::Serve { port: None }) {
        Commands::Serve { port } => {
            if let Some(port) = port {
                config.server.port = port;
            }
            crate::app::serve(config).await
        }
        Commands::Token { user_id, email } => {
            if config.is_production() {
                tracing::warn!("minting a token with the production secret");
            }
            let claims = Claims::new(user_id, email, &config.security);
            let token = generate_jwt(&claims, &config.security).context("failed to sign token")?;
            println!("{token}");
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_serve() {
        let cli = Cli::try_parse_from(["content-api"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn parses_token_command() {
        let cli = Cli::try_parse_from(["content-api", "token", "u-7", "--email", "x@example.com"]).unwrap();
        match cli.command {
            Some(Commands::Token { user_id, email }) => {
                assert_eq!(user_id, "u-7");
                assert_eq!(email.as_deref(), Some("x@example.com"));
            }
            _ => panic!("expected token command"),
        }
    }

    #[test]
    fn parses_serve_port() {
        let cli = Cli::try_parse_from(["content-api", "serve", "--port", "4100"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Serve { port: Some(4100) })));
    }
}
