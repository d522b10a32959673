//! # docket
//!
//! Command-line entry point of the console.
//!
//! ```bash
//! docket list
//! docket show 7f1c…            # paginated text preview
//! docket next-number QN
//! docket new --type TI --client "Acme" --item svc-bh-150=12.5 --item tst-gsa=4
//! docket check
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use tracing::info;

use docket_console::commands::{self, NewDocument};
use docket_console::config::ConsoleConfig;
use docket_console::{init_tracing, AppState, SessionContext};
use docket_core::{DocumentType, Money};

#[derive(Debug, Parser)]
#[command(name = "docket", version, about = "Quotation and invoice console")]
struct Cli {
    /// Config file (default: ./docket.toml if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Operator email, used as document author and in notifications
    #[arg(long, global = true, env = "DOCKET_USER", default_value = "operator@localhost")]
    user: String,

    /// Operator display name
    #[arg(long, global = true, env = "DOCKET_USER_NAME")]
    user_name: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List stored documents
    List,

    /// Show the printed pages of a document
    Show { id: String },

    /// Preview the next number for a document type (QN, TI, PI, PO, DC)
    NextNumber {
        document_type: DocumentType,
        /// Date whose month scopes the number (YYYY-MM-DD, default today)
        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// Create and save a document from catalog entries
    New {
        #[arg(long = "type", default_value = "QN")]
        document_type: DocumentType,
        #[arg(long)]
        client: String,
        /// Address line (repeatable)
        #[arg(long = "address")]
        address: Vec<String>,
        #[arg(long)]
        subject: Option<String>,
        /// Catalog entry as ID=QUANTITY (repeatable)
        #[arg(long = "item", value_parser = parse_item)]
        items: Vec<(String, Decimal)>,
        /// Discount percentage
        #[arg(long)]
        discount: Option<f64>,
        /// Amount already received, in rupees (Tax Invoice)
        #[arg(long)]
        payment: Option<Decimal>,
    },

    /// Check that the storage backends answer
    Check,
}

fn parse_item(raw: &str) -> Result<(String, Decimal), String> {
    let (id, quantity) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected ID=QUANTITY, got '{}'", raw))?;
    let quantity: Decimal = quantity
        .trim()
        .parse()
        .map_err(|_| format!("invalid quantity '{}'", quantity))?;
    Ok((id.trim().to_string(), quantity))
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    match run(Cli::parse()).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let config = ConsoleConfig::load(cli.config.as_deref()).context("loading configuration")?;
    let state = AppState::connect(config).await?;
    let session = SessionContext::new(cli.user, cli.user_name);
    info!(user = %session.user_email, "Console started");

    let code = match cli.command {
        Command::List => {
            let documents = commands::list_documents(&state).await?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&documents)?);
            } else {
                for doc in &documents {
                    println!(
                        "{:<36}  {:<18}  {:<22}  {:<28}  {:>16}",
                        doc.id,
                        doc.document_type.label(),
                        doc.document_number.as_deref().unwrap_or("-"),
                        doc.client_name,
                        doc.grand_total.to_string(),
                    );
                }
                println!("{} document(s)", documents.len());
            }
            ExitCode::SUCCESS
        }

        Command::Show { id } => {
            if cli.json {
                let (layout, _) = commands::layout_document(&state, &id).await?;
                println!("{}", serde_json::to_string_pretty(&layout)?);
            } else {
                println!("{}", commands::show_document(&state, &id).await?);
            }
            ExitCode::SUCCESS
        }

        Command::NextNumber { document_type, date } => {
            let preview = commands::next_number(&state, document_type, date).await?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&preview)?);
            } else {
                println!("{}", preview.number);
                if let Some(warning) = &preview.warning {
                    eprintln!("warning: {:?}", warning);
                }
            }
            ExitCode::SUCCESS
        }

        Command::New {
            document_type,
            client,
            address,
            subject,
            items,
            discount,
            payment,
        } => {
            let input = NewDocument {
                document_type,
                client_name: client,
                client_address: address,
                subject,
                items,
                discount_percent: discount,
                payment: payment.map(Money::from_decimal),
            };
            let report = commands::new_document(&state, &session, input).await?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!(
                    "Saved {} {} ({})",
                    report.record.document_type.label(),
                    report.record.document_number.as_deref().unwrap_or("-"),
                    report.record.id
                );
                for warning in &report.warnings {
                    eprintln!("warning: {:?}", warning);
                }
            }
            ExitCode::SUCCESS
        }

        Command::Check => {
            let health = commands::check(&state).await;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&health)?);
            } else {
                println!(
                    "documents ({}): {}",
                    health.documents_backend,
                    if health.documents_ok { "ok" } else { "FAILED" }
                );
                println!("catalog: {}", if health.catalog_ok { "ok" } else { "FAILED" });
                for error in &health.errors {
                    eprintln!("  {}", error);
                }
            }
            if health.is_healthy() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
    };

    state.shutdown().await;
    Ok(code)
}
