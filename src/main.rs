use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use nestegg::api::{ProjectArgs, ServeArgs, rate_source, render_report};
use nestegg::core::compute;
use nestegg::rates::CachedRates;

#[derive(Parser, Debug)]
#[command(
    name = "nestegg",
    about = "Month-by-month savings goal projection with compound interest"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the web form and JSON API
    Serve(ServeArgs),
    /// Run a single projection and print the result
    Project(ProjectArgs),
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("nestegg=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let outcome = match cli.command {
        Command::Serve(args) => nestegg::api::run_http_server(args.into())
            .await
            .map_err(|e| format!("Server error: {e}")),
        Command::Project(args) => project(args).await,
    };

    if let Err(msg) = outcome {
        eprintln!("{msg}");
        std::process::exit(1);
    }
}

async fn project(args: ProjectArgs) -> Result<(), String> {
    let result = compute(&args.projection_input()).map_err(|e| format!("Invalid input: {e}"))?;

    let display_currency = args.display_currency.unwrap_or(args.currency);
    let shown = if display_currency == args.currency {
        result
    } else {
        let cache = CachedRates::with_defaults(rate_source(args.rates_url.as_deref(), args.rates_file.as_ref()));
        let snapshot = cache.get_rates(args.currency).await;
        let factor = snapshot
            .rates
            .factor(args.currency, display_currency)
            .map_err(|e| format!("Cannot convert to {display_currency}: {e}"))?;
        tracing::info!(origin = ?snapshot.origin, factor, "converted projection to {display_currency}");
        result.scaled(factor)
    };

    if args.json {
        let json = serde_json::to_string_pretty(&shown).map_err(|e| e.to_string())?;
        println!("{json}");
    } else {
        print!("{}", render_report(&shown, display_currency));
    }
    Ok(())
}
