//! RocketShoes CLI - Cart inspection and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Show the persisted cart
//! rs-cli cart show
//!
//! # Add one unit of product 5
//! rs-cli cart add 5
//!
//! # Set product 5 to three units (checked against live stock)
//! rs-cli cart set 5 3
//!
//! # Remove product 5
//! rs-cli cart remove 5
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use rocketshoes_core::ProductId;

use commands::cart::CartAction;

mod commands;

#[derive(Parser)]
#[command(name = "rs-cli")]
#[command(author, version, about = "RocketShoes CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Inspect or change the persisted cart
    Cart {
        #[command(subcommand)]
        action: CartCommand,
    },
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
enum CartCommand {
    /// Show cart contents and totals
    Show,
    /// Add one unit of a product
    Add {
        /// Product ID
        id: ProductId,
    },
    /// Remove a product
    Remove {
        /// Product ID
        id: ProductId,
    },
    /// Set the amount of a product already in the cart
    Set {
        /// Product ID
        id: ProductId,
        /// New amount; values below 1 are ignored
        #[arg(allow_negative_numbers = true)]
        amount: i64,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Cart { action } => match action {
            CartCommand::Show => commands::cart::show().await?,
            CartCommand::Add { id } => commands::cart::apply(CartAction::Add(id)).await?,
            CartCommand::Remove { id } => commands::cart::apply(CartAction::Remove(id)).await?,
            CartCommand::Set { id, amount } => {
                commands::cart::apply(CartAction::Set(id, amount)).await?;
            }
        },
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> CartCommand {
        let cli = Cli::try_parse_from(args).unwrap();
        match cli.command {
            Commands::Cart { action } => action,
        }
    }

    #[test]
    fn test_parses_cart_commands() {
        assert_eq!(parse(&["rs-cli", "cart", "show"]), CartCommand::Show);
        assert_eq!(
            parse(&["rs-cli", "cart", "add", "5"]),
            CartCommand::Add {
                id: ProductId::new(5)
            }
        );
        assert_eq!(
            parse(&["rs-cli", "cart", "set", "5", "-1"]),
            CartCommand::Set {
                id: ProductId::new(5),
                amount: -1
            }
        );
    }

    #[test]
    fn test_rejects_non_numeric_id() {
        assert!(Cli::try_parse_from(["rs-cli", "cart", "remove", "abc"]).is_err());
    }
}
