//! `tavola`: command-line front end to the schedule and availability engine.

mod config;

use std::path::PathBuf;

use anyhow::Context;
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::info;

use tavola_adapters::clock::SystemClock;
use tavola_adapters::persistence::{legacy, SqliteDb};
use tavola_app::availability_service::AvailabilityService;
use tavola_app::schedule_service::ScheduleService;
use tavola_core::availability::Evaluator;
use tavola_core::ids::{ResourceId, UserId};
use tavola_core::schedule::{ResourceRef, ScheduleType};
use tavola_ports::types::{AvailabilityTarget, BulkOperation};

use crate::config::{AppConfig, LogFormat};

#[derive(Parser, Debug)]
#[command(name = "tavola")]
#[command(about = "Operating hours, availability and approvals for restaurant resources")]
#[command(version)]
struct Cli {
    /// Database URL (overrides config)
    #[arg(long, env = "TAVOLA__DATABASE_URL")]
    database_url: Option<String>,

    /// Days scanned ahead for the next status change (overrides config)
    #[arg(long, env = "TAVOLA__ENGINE__LOOKAHEAD_DAYS")]
    lookahead_days: Option<u32>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Evaluate one schedule at an instant
    Status {
        schedule_id: String,
        /// RFC 3339 instant (default: now)
        #[arg(long)]
        at: Option<DateTime<Utc>>,
    },

    /// Evaluate the schedule governing a resource at an instant
    ResourceStatus {
        /// RESTAURANT, VENUE, KITCHEN, CATEGORY, MENU_ITEM or BUSINESS
        kind: String,
        resource_id: String,
        #[arg(long)]
        at: Option<DateTime<Utc>>,
    },

    /// Import schedules exported by the old dashboard (one object or an array)
    Import { path: PathBuf },

    /// List conflicts a schedule would raise if approved
    Conflicts { schedule_id: String },

    /// Apply approve, reject, activate or deactivate to many schedules
    Bulk {
        operation: String,
        #[arg(required = true)]
        ids: Vec<String>,
        /// Rejection reason, approval comment or deactivation note
        #[arg(long)]
        reason: Option<String>,
        /// Acting user id
        #[arg(long, env = "TAVOLA_ACTOR")]
        actor: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load().unwrap_or_else(|e| {
        eprintln!("failed to load config, using defaults: {e}");
        AppConfig::default()
    });
    if let Some(url) = cli.database_url {
        config.database_url = url;
    }
    if let Some(days) = cli.lookahead_days {
        config.engine.lookahead_days = days;
    }

    init_tracing(config.log.format);
    info!(
        database_url = %config.database_url,
        lookahead_days = config.engine.lookahead_days,
        "configuration loaded"
    );

    let db = SqliteDb::new(&config.database_url)
        .await
        .context("opening schedule store")?;
    let schedules = ScheduleService::new(db.clone(), SystemClock);
    let availability = AvailabilityService::new(
        db.clone(),
        SystemClock,
        Evaluator::new(config.engine.lookahead_days),
    );

    match cli.command {
        Command::Status { schedule_id, at } => {
            let result = availability
                .evaluate(&AvailabilityTarget::Schedule(schedule_id), at)
                .await?;
            print_json(&result)
        }
        Command::ResourceStatus {
            kind,
            resource_id,
            at,
        } => {
            let resource = ResourceRef::new(
                ScheduleType::parse(&kind)?,
                ResourceId::parse(&resource_id)?,
            );
            let result = availability
                .evaluate(&AvailabilityTarget::Resource(resource), at)
                .await?;
            print_json(&result)
        }
        Command::Import { path } => {
            let raw = std::fs::read_to_string(&path)
                .with_context(|| format!("reading {}", path.display()))?;
            // Validate the whole file before storing any of it.
            legacy::decode_all(&raw)?;

            let value: serde_json::Value = serde_json::from_str(&raw)?;
            let records = match value {
                serde_json::Value::Array(records) => records,
                record => vec![record],
            };
            let mut imported = Vec::with_capacity(records.len());
            for record in records {
                let schedule = db.store_legacy(&record.to_string()).await?;
                imported.push(schedule.id().to_string());
            }
            info!(count = imported.len(), "legacy schedules imported");
            print_json(&imported)
        }
        Command::Conflicts { schedule_id } => {
            let conflicts = schedules.detect_conflicts(&schedule_id).await?;
            print_json(&conflicts)
        }
        Command::Bulk {
            operation,
            ids,
            reason,
            actor,
        } => {
            let operation = BulkOperation::parse(&operation)
                .with_context(|| format!("unknown bulk operation {operation}"))?;
            let actor = UserId::parse(&actor)?;
            let results = schedules
                .bulk_apply(&ids, operation, &actor, reason.as_deref())
                .await;
            print_json(&results)?;

            let failed = results.iter().filter(|r| !r.is_success()).count();
            if failed > 0 {
                anyhow::bail!("{failed} of {} schedules failed to {operation}", results.len());
            }
            Ok(())
        }
    }
}

fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "tavola=info".into());
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.pretty().init(),
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
