use std::ffi::OsString;

use clap::Parser;
use colored::Colorize;
use log::{debug, info};

use tfbaseline_backend::{AwsApi, BaselineConfig, EXIT_FAILURE, Event, Provisioner, SetupError};

const USAGE: &str = "Usage: terraform-baseline-setup <bucket_name> <table_name> <region>";

/// Program name plus the three positional arguments
const EXPECTED_ARGC: usize = 4;

#[derive(Parser, Debug)]
#[command(name = "terraform-baseline-setup")]
#[command(about = "Provision the S3 bucket and DynamoDB lock table for a Terraform remote-state backend", long_about = None)]
#[command(disable_help_flag = true, disable_version_flag = true)]
struct Cli {
    /// Name of the S3 bucket that stores state files
    #[arg(allow_hyphen_values = true)]
    bucket_name: String,
    /// Name of the DynamoDB table used for state locking
    #[arg(allow_hyphen_values = true)]
    table_name: String,
    /// AWS region to create both resources in
    #[arg(allow_hyphen_values = true)]
    region: String,
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = match parse_args(std::env::args_os().collect()) {
        Ok(cli) => cli,
        Err(code) => {
            println!("{}", USAGE);
            std::process::exit(code);
        }
    };

    if let Err(e) = run(cli).await {
        report_error(&e);
        std::process::exit(e.exit_code());
    }
}

/// Parse `argv`, or return the exit status for a usage error
///
/// Only the argument count decides validity; values are not inspected.
fn parse_args(argv: Vec<OsString>) -> Result<Cli, i32> {
    if argv.len() != EXPECTED_ARGC {
        debug!("expected {} arguments, got {}", EXPECTED_ARGC - 1, argv.len().saturating_sub(1));
        return Err(EXIT_FAILURE);
    }

    Cli::try_parse_from(argv).map_err(|e| {
        debug!("invalid arguments: {}", e);
        EXIT_FAILURE
    })
}

async fn run(cli: Cli) -> Result<(), SetupError> {
    let config = BaselineConfig::from_env(cli.bucket_name, cli.table_name, cli.region)?;
    let api = AwsApi::from_config(&config).await;

    let outcome = Provisioner::new(&api, &config).run(print_event).await?;
    info!("finished: {:?}", outcome);

    Ok(())
}

fn print_event(event: &Event) {
    let line = event.to_string();
    match event {
        Event::CredentialsValid | Event::BucketCreated { .. } | Event::TableCreated { .. } => {
            println!("{}", line.green())
        }
        Event::TableAlreadyExists { .. } | Event::CreationSkipped => println!("{}", line.yellow()),
        Event::TableCreationFailed { .. } => println!("{}", line.red()),
    }
}

fn report_error(e: &SetupError) {
    if e.is_unhandled() {
        eprintln!("{}", e);
    } else {
        println!("{}", e.to_string().red());
    }
}
