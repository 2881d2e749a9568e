use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use inquire::CustomUserError;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod app;
mod catalog;
mod cli;
mod config;
mod errors;
mod extract;
mod matcher;
mod patterns;
#[cfg(test)]
mod tests;
mod transport;
mod web;

use app::App;
use config::Config;
use matcher::{Constraints, ScoredPattern};
use patterns::{PatternLink, YARN_WEIGHTS};

const NO_MATCHES: &str =
    "No strong matches. Try a broader yarn type (e.g. wool) or a neighboring yarn weight.";

fn init_logging() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "yarnmatch=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() -> anyhow::Result<()> {
    let args = cli::Args::parse();
    init_logging();

    let config = Config::load_with(config::base_path()?)?;

    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to build runtime")?
        .block_on(run(args.command, config))
}

async fn run(command: cli::Command, config: Config) -> anyhow::Result<()> {
    let app = Arc::new(App::from_config(&config)?);

    match command {
        cli::Command::Match {
            amount,
            unit,
            yarn_type,
            yarn_weight,
            interactive,
            json,
            source,
        } => {
            let loaded = app.init(!source.offline).await;
            eprintln!("{}", app.status().status);
            loaded?;

            let (amount, yarn_type, yarn_weight) = if interactive {
                prompt_missing(amount, yarn_type, yarn_weight, app.yarn_types())?
            } else {
                (
                    amount.unwrap_or_default(),
                    yarn_type.unwrap_or_default(),
                    yarn_weight.unwrap_or_default(),
                )
            };

            let constraints = Constraints::parse(&amount, unit, &yarn_type, &yarn_weight);
            let results = app.rank(&constraints);

            if json {
                println!("{}", serde_json::to_string_pretty(&results)?);
            } else {
                print_results(&results);
            }
            Ok(())
        }

        cli::Command::Refresh {} => {
            let refreshed = app.refresh().await;
            println!("{}", app.status().status);
            refreshed?;
            Ok(())
        }

        cli::Command::Links {} => {
            let loader = app.loader();
            let listing = loader.transport().fetch_text(&config.listing_url).await?;
            let links = loader.link_extractor().extract(&listing);
            println!("{}", serde_json::to_string_pretty(&links)?);
            Ok(())
        }

        cli::Command::Inspect { url, title } => {
            let link = PatternLink { title, url };
            let result = app.loader().extract_candidate(&link).await;
            let record = extract::degrade(result, &link);
            println!("{}", serde_json::to_string_pretty(&record)?);
            Ok(())
        }

        cli::Command::Daemon { addr, source } => {
            if let Err(err) = app.init(!source.offline).await {
                log::error!("{err}");
            }
            web::serve(app, &addr).await
        }
    }
}

fn prompt_missing(
    amount: Option<String>,
    yarn_type: Option<String>,
    yarn_weight: Option<String>,
    known_types: Vec<String>,
) -> anyhow::Result<(String, String, String)> {
    let amount = match amount {
        Some(amount) => amount,
        None => inquire::Text::new("How much yarn do you have?").prompt()?,
    };

    let yarn_type = match yarn_type {
        Some(yarn_type) => yarn_type,
        None => {
            let suggest = move |input: &str| -> Result<Vec<String>, CustomUserError> {
                let input = input.trim().to_lowercase();
                Ok(known_types
                    .iter()
                    .filter(|t| t.to_lowercase().contains(&input))
                    .cloned()
                    .collect())
            };
            inquire::Text::new("Yarn type:")
                .with_autocomplete(suggest)
                .prompt()?
        }
    };

    let yarn_weight = match yarn_weight {
        Some(yarn_weight) => yarn_weight,
        None => inquire::Select::new("Yarn weight:", YARN_WEIGHTS.to_vec())
            .prompt()?
            .to_string(),
    };

    Ok((amount, yarn_type, yarn_weight))
}

fn print_results(results: &[ScoredPattern]) {
    println!("{} shown", results.len());

    if results.is_empty() {
        println!("{NO_MATCHES}");
        return;
    }

    for ScoredPattern { score, record } in results {
        let amount = match record.amount_min {
            0 => "?".to_string(),
            n => n.to_string(),
        };
        println!();
        println!("{score:>3}  {}", record.title);
        println!(
            "     type: {}, weight: {}, min: {amount}{}, source confidence: {}",
            record.yarn_type, record.yarn_weight, record.amount_unit, record.confidence
        );
        if !record.notes.is_empty() {
            println!("     {}", record.notes);
        }
        println!("     {}", record.url);
    }
}
