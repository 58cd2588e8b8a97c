use std::fmt::Write as _;
use std::net::IpAddr;
use std::path::PathBuf;
use std::time::Duration;

use chrono::NaiveDate;
use clap::Args;

use crate::core::{ProjectionInput, ProjectionResult};
use crate::rates::{
    ConfiguredSource, Currency, DEFAULT_FETCH_TIMEOUT, DEFAULT_RATE_TTL, FileRateSource,
    HttpRateSource, StaticRates, format_amount,
};

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind: IpAddr,
    pub port: u16,
    pub base_currency: Currency,
    pub rates_url: Option<String>,
    pub rates_file: Option<PathBuf>,
    pub rate_ttl: Duration,
    pub rate_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: IpAddr::from([0, 0, 0, 0]),
            port: 8080,
            base_currency: Currency::Eur,
            rates_url: None,
            rates_file: None,
            rate_ttl: DEFAULT_RATE_TTL,
            rate_timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }
}

impl ServerConfig {
    pub fn rate_source(&self) -> ConfiguredSource {
        rate_source(self.rates_url.as_deref(), self.rates_file.as_ref())
    }
}

pub fn rate_source(rates_url: Option<&str>, rates_file: Option<&PathBuf>) -> ConfiguredSource {
    match (rates_url, rates_file) {
        (Some(url), _) => ConfiguredSource::Http(HttpRateSource::new(url)),
        (None, Some(path)) => ConfiguredSource::File(FileRateSource::new(path)),
        (None, None) => ConfiguredSource::Static(StaticRates),
    }
}

#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    #[arg(long, default_value_t = 8080)]
    pub port: u16,
    #[arg(long, default_value = "0.0.0.0", help = "Address to bind the HTTP listener to")]
    pub bind: IpAddr,
    #[arg(
        long,
        default_value_t = Currency::Eur,
        help = "Currency assumed for projection amounts when a request names none"
    )]
    pub base_currency: Currency,
    #[arg(
        long,
        conflicts_with = "rates_file",
        help = "Exchange-rate endpoint queried as ?base=EUR&symbols=..., e.g. https://api.exchangerate.host/latest"
    )]
    pub rates_url: Option<String>,
    #[arg(
        long,
        help = "JSON exchange-rate file ({\"base\": \"EUR\", \"rates\": {...}}); built-in rates when omitted"
    )]
    pub rates_file: Option<PathBuf>,
    #[arg(long, default_value_t = 3600, help = "Seconds to reuse fetched exchange rates")]
    pub rate_ttl_secs: u64,
    #[arg(long, default_value_t = 5000, help = "Milliseconds to wait for the rate source")]
    pub rate_timeout_ms: u64,
}

impl From<ServeArgs> for ServerConfig {
    fn from(args: ServeArgs) -> Self {
        Self {
            bind: args.bind,
            port: args.port,
            base_currency: args.base_currency,
            rates_url: args.rates_url,
            rates_file: args.rates_file,
            rate_ttl: Duration::from_secs(args.rate_ttl_secs),
            rate_timeout: Duration::from_millis(args.rate_timeout_ms),
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct ProjectArgs {
    #[arg(long, allow_negative_numbers = true)]
    pub starting_balance: f64,
    #[arg(long, allow_negative_numbers = true)]
    pub monthly_income: f64,
    #[arg(long, allow_negative_numbers = true)]
    pub monthly_expenses: f64,
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    pub additional_deposit: f64,
    #[arg(
        long,
        default_value_t = 0.0,
        allow_negative_numbers = true,
        help = "Annual interest rate in percent, e.g. 1.2"
    )]
    pub interest_rate: f64,
    #[arg(long, allow_negative_numbers = true)]
    pub target: f64,
    #[arg(long, help = "First month of the projection, YYYY-MM-DD")]
    pub start_date: Option<NaiveDate>,
    #[arg(long, default_value_t = Currency::Eur)]
    pub currency: Currency,
    #[arg(long, help = "Show amounts converted into this currency")]
    pub display_currency: Option<Currency>,
    #[arg(
        long,
        conflicts_with = "rates_file",
        help = "Exchange-rate endpoint used for --display-currency"
    )]
    pub rates_url: Option<String>,
    #[arg(long, help = "JSON exchange-rate file used for --display-currency")]
    pub rates_file: Option<PathBuf>,
    #[arg(long, help = "Print the result as JSON instead of a table")]
    pub json: bool,
}

impl ProjectArgs {
    pub fn projection_input(&self) -> ProjectionInput {
        ProjectionInput {
            starting_balance: self.starting_balance,
            periodic_income: self.monthly_income,
            periodic_expenses: self.monthly_expenses,
            additional_deposit: self.additional_deposit,
            annual_interest_rate_percent: self.interest_rate,
            target_balance: self.target,
            start_date: self.start_date,
        }
    }
}

pub fn render_report(result: &ProjectionResult, currency: Currency) -> String {
    let mut out = String::new();
    let months = result
        .periods_needed
        .count()
        .map(|n| n.to_string())
        .unwrap_or_else(|| "unreachable".to_string());

    let _ = writeln!(out, "{}", result.summary);
    let _ = writeln!(out, "Months needed:        {months}");
    if let Some(date) = result.end_date {
        let _ = writeln!(out, "Target date:          {date}");
    }
    let _ = writeln!(out, "Final balance:        {}", format_amount(result.final_balance, currency));
    let _ = writeln!(
        out,
        "Total contributions:  {}",
        format_amount(result.total_contributions, currency)
    );
    let _ = writeln!(
        out,
        "Total interest:       {}",
        format_amount(result.total_interest_earned, currency)
    );

    if result.ledger.is_empty() {
        return out;
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "{:>6}  {:<10}  {:>18}", "Month", "Date", "Balance");
    for entry in &result.ledger {
        let date = entry.date.map(|d| d.to_string()).unwrap_or_else(|| "-".to_string());
        let _ = writeln!(
            out,
            "{:>6}  {:<10}  {:>18}",
            entry.period_index,
            date,
            format_amount(entry.balance, currency)
        );
    }
    out
}
