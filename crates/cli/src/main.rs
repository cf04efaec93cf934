//! Kanak Jewels CLI - database migrations and back-office setup.
//!
//! # Usage
//!
//! ```bash
//! # Run storefront database migrations
//! kanak-cli migrate
//!
//! # Create an admin account
//! kanak-cli admin create -e admin@kanakjewels.in -n "Store Admin" -p 'long-password'
//!
//! # Promote an existing customer to admin
//! kanak-cli admin create -e owner@kanakjewels.in -n "Owner" --promote
//!
//! # Load categories, products, market rates and tutorials
//! kanak-cli seed catalog seed/catalog.yaml
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "kanak-cli")]
#[command(author, version, about = "Kanak Jewels CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run storefront database migrations
    Migrate,
    /// Manage admin users
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
    /// Load data from YAML files
    Seed {
        #[command(subcommand)]
        target: SeedTarget,
    },
}

#[derive(Subcommand)]
enum AdminAction {
    /// Create an admin account, or promote an existing user
    Create {
        /// Admin email address
        #[arg(short, long)]
        email: String,

        /// Admin display name
        #[arg(short, long)]
        name: String,

        /// Login password (optional with --promote, where it resets the password)
        #[arg(short, long, required_unless_present = "promote")]
        password: Option<String>,

        /// Promote an existing account instead of failing when the email is taken
        #[arg(long)]
        promote: bool,
    },
}

#[derive(Subcommand)]
enum SeedTarget {
    /// Upsert catalog data from a YAML file
    Catalog {
        /// Path to the YAML file
        file: String,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("kanak_cli=info,kanak_storefront=info")),
        )
        .init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Admin { action } => match action {
            AdminAction::Create {
                email,
                name,
                password,
                promote,
            } => {
                commands::admin::create_user(&email, &name, password.as_deref(), promote).await?;
            }
        },
        Commands::Seed { target } => match target {
            SeedTarget::Catalog { file } => {
                commands::seed::catalog(&file).await?;
            }
        },
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_password_required_unless_promoting() {
        let missing = Cli::try_parse_from(["kanak-cli", "admin", "create", "-e", "a@b.in", "-n", "A"]);
        assert!(missing.is_err());

        let promote = Cli::try_parse_from([
            "kanak-cli", "admin", "create", "-e", "a@b.in", "-n", "A", "--promote",
        ]);
        assert!(promote.is_ok());
    }
}
