use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use hibp_check::{Error, Report, watch};
use hibp_range::{BreachMatcher, DEFAULT_RANGE_URL, HttpRangeClient, RANGE_URL_ENV};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "hibp-check")]
#[command(about = "Check a password against Have I Been Pwned without sending it anywhere")]
struct Args {
    /// Base URL of the range API or a relay
    #[arg(long, global = true, env = RANGE_URL_ENV, default_value = DEFAULT_RANGE_URL)]
    range_url: String,

    /// Request timeout in seconds
    #[arg(long, global = true, default_value = "10")]
    timeout_secs: u64,

    /// Do not ask for padded range responses
    #[arg(long, global = true)]
    no_padding: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Rate one password and look it up
    Check {
        /// The password; read from the first line of stdin when omitted
        password: Option<String>,

        /// Output format
        #[arg(long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },

    /// Treat each stdin line as the password changing and show the latest result
    Watch,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Format {
    Text,
    Json,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode, Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let client = HttpRangeClient::new(&args.range_url, Duration::from_secs(args.timeout_secs))?
        .padding(!args.no_padding);

    match args.command {
        Command::Check { password, format } => {
            let password = match password {
                Some(password) => password,
                None => BufReader::new(tokio::io::stdin())
                    .lines()
                    .next_line()
                    .await?
                    .ok_or(Error::MissingPassword)?,
            };

            let check = BreachMatcher::new(&client).check_password(&password).await;
            let report = Report::new(&password, check);

            match format {
                Format::Text => println!("{report}"),
                Format::Json => println!("{}", serde_json::to_string_pretty(&report)?),
            }

            // Exit status 2 when the lookup itself failed.
            Ok(if report.failed() { ExitCode::from(2) } else { ExitCode::SUCCESS })
        }
        Command::Watch => {
            let input = BufReader::new(tokio::io::stdin());
            watch(Arc::new(client), input, &mut std::io::stdout()).await?;
            Ok(ExitCode::SUCCESS)
        }
    }
}
