use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use chrono::Local;
use clap::{Parser, Subcommand};
use payslip_engine::config::{Config, DatabaseConfig};
use payslip_engine::payslips::{
    GenerationRequest, GenerationSummary, PayrollRepositories, PayslipCalculationService,
    PayslipGenerationJob,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Debug, Parser)]
#[command(name = "payslip-engine", version, about = "Payslip calculation engine")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Generate payslips for a month (defaults to the previous month)
    Generate {
        #[arg(long)]
        year: Option<i32>,

        #[arg(long, value_parser = clap::value_parser!(u32).range(1..=12))]
        month: Option<u32>,

        /// Only employees of this company
        #[arg(long)]
        company: Option<i64>,

        /// Only this employee
        #[arg(long)]
        employee: Option<i64>,

        /// Recalculate payslips that already exist for the month
        #[arg(long)]
        force: bool,

        /// Apply database migrations before generating
        #[arg(long)]
        migrate: bool,
    },

    /// Apply database migrations and exit
    Migrate,
}

fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("payslip_engine={}", config.app.log_level).into());

    let registry = tracing_subscriber::registry().with(filter);
    if config.app.log_format.eq_ignore_ascii_case("json") {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

fn print_summary(summary: &GenerationSummary) {
    println!("Payslip generation for {}-{:02}", summary.year, summary.month);
    println!("  processed: {}", summary.processed);
    println!("  skipped:   {}", summary.skipped);
    println!("  failed:    {}", summary.failed);
    println!("  total net: {}", summary.total_net_salary);

    for failure in &summary.failures {
        println!(
            "  ! {} ({}): {}",
            failure.employee_name, failure.employee_id, failure.error
        );
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let config = Config::from_env().context("Failed to load configuration")?;
    config.validate().context("Configuration validation failed")?;

    init_tracing(&config);
    tracing::info!(env = config.app.env.as_str(), "Starting payslip engine");

    let pool = config
        .database
        .create_pool()
        .await
        .context("Failed to create database pool")?;

    tracing::info!(
        pool_size = config.database.pool_size,
        max_connections = config.database.max_connections,
        "Database pool initialized"
    );

    match cli.command {
        Command::Migrate => {
            DatabaseConfig::migrate(&pool)
                .await
                .context("Failed to apply migrations")?;
            tracing::info!("Migrations applied");
            Ok(ExitCode::SUCCESS)
        }
        Command::Generate {
            year,
            month,
            company,
            employee,
            force,
            migrate,
        } => {
            if migrate {
                DatabaseConfig::migrate(&pool)
                    .await
                    .context("Failed to apply migrations")?;
            }

            let request = GenerationRequest::resolve(year, month, Local::now().date_naive())
                .for_company(company)
                .for_employee(employee)
                .forced(force);

            let payroll = Arc::new(config.payroll.clone());
            let repositories = PayrollRepositories::mysql(pool);
            let calculation = Arc::new(PayslipCalculationService::new(
                repositories.clone(),
                payroll,
            ));
            let job = PayslipGenerationJob::new(&repositories, calculation);

            let summary = job
                .run(&request)
                .await
                .context("Payslip generation failed")?;
            print_summary(&summary);

            Ok(if summary.has_failures() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            })
        }
    }
}
