use std::path::PathBuf;
use std::process;

use clap::Parser;
use comfy_table::{modifiers, presets, ContentArrangement, Table};
use terminal_size::{terminal_size, Width};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use rackbeat_units::config::{self, DEFAULT_TIMEOUT_SECS, TOKEN_ENV_VAR};
use rackbeat_units::models::ExportSummary;
use rackbeat_units::{api, run_export, ExportError, ExportSettings};

/// Exit status when `--fail-on-errors` is set and a product failed.
const EXIT_PRODUCT_FAILURES: i32 = 2;

#[derive(Parser)]
#[command(
    name = "rackbeat-units",
    author,
    version,
    about = "Export Rackbeat product units to CSV",
    long_about = r#"Fetch the unit-of-measure records of every product number in a CSV file from the Rackbeat API and write them to a semicolon-separated CSV (product_number;unit;unitname;quantity).

The input may be comma, semicolon or tab separated, with or without a header row. Products whose lookup fails are reported and skipped.

Examples:
  1) Token from the environment:
      RACKBEAT_BEARER_TOKEN=... rackbeat-units --input products.csv --output units.csv
  2) Explicit token, quiet run with a progress bar:
      rackbeat-units --token ... --input products.csv --silent
"#
)]
struct Cli {
    /// Bearer token for the Rackbeat API (falls back to RACKBEAT_BEARER_TOKEN)
    #[arg(long)]
    token: Option<String>,
    /// CSV file containing product numbers
    #[arg(long)]
    input: PathBuf,
    /// Output CSV path (default: product_units.csv next to the input)
    #[arg(long)]
    output: Option<PathBuf>,
    /// HTTP timeout in seconds
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
    timeout: f64,
    /// Path to .env file
    #[arg(long)]
    env_file: Option<String>,
    /// Exit with status 2 if any product could not be fetched
    #[arg(long)]
    fail_on_errors: bool,
    /// Disable colorized output
    #[arg(long)]
    no_color: bool,
    /// Disable request/response logging
    #[arg(long)]
    silent: bool,
}

fn fail(err: &ExportError) -> ! {
    tracing::debug!(?err, "Export failed");
    eprintln!("{} {}", yansi::Paint::new("Error:").red().bold(), err);
    process::exit(1);
}

fn print_summary(summary: &ExportSummary) {
    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL);
    table.apply_modifier(modifiers::UTF8_ROUND_CORNERS);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    if let Some((Width(w), _)) = terminal_size() {
        table.set_width(w.saturating_sub(4));
    }

    table.set_header(vec!["Field", "Value"]);
    table.add_row(vec!["Processed products".to_string(), summary.products_processed.to_string()]);
    table.add_row(vec!["Output rows written".to_string(), summary.rows_written.to_string()]);
    table.add_row(vec!["Failed products".to_string(), summary.failures.len().to_string()]);
    table.add_row(vec!["Output file".to_string(), summary.output_path.display().to_string()]);
    println!("\n{table}\n");

    if summary.has_failures() {
        eprintln!(
            "{}",
            yansi::Paint::new(format!("Errors: {}", summary.failures.len())).yellow().bold()
        );
        for failure in &summary.failures {
            eprintln!("- {}", failure.reason);
        }
    }
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    if cli.no_color {
        yansi::whenever(yansi::Condition::NEVER);
    }

    if cli.silent {
        api::set_silent(true);
    }

    config::load_env_file(cli.env_file.as_deref());

    let token = match config::resolve_token(cli.token.as_deref(), std::env::var(TOKEN_ENV_VAR).ok()) {
        Ok(t) => t,
        Err(e) => fail(&e),
    };
    let timeout = match config::timeout_from_secs(cli.timeout) {
        Ok(t) => t,
        Err(e) => fail(&e),
    };

    let settings = ExportSettings {
        token,
        output_path: config::resolve_output_path(&cli.input, cli.output.as_deref()),
        input_path: cli.input,
        api_base_url: config::get_api_base_url(),
        timeout,
        show_progress: cli.silent,
    };

    let summary = match run_export(&settings).await {
        Ok(summary) => summary,
        Err(e) => fail(&e),
    };

    print_summary(&summary);

    if cli.fail_on_errors && summary.has_failures() {
        process::exit(EXIT_PRODUCT_FAILURES);
    }
}
