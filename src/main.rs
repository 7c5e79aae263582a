use std::{collections::HashMap, sync::Arc};

use clap::Parser;
use post_lifetime::{
    admin::TrashReporter,
    clock::{Clock, SystemClock},
    config::{DatabaseConfig, LifetimeConfig},
    engine::{ADMIN_EMAIL_OPTION, RunState, TransitionEngine},
    notify::LogNotifier,
    observability,
    schedule::{InMemoryScheduler, Registrar, TenantId, start_lifetime_worker},
    store::{OptionStore, SqliteStore},
};

#[derive(Parser, Debug)]
#[command(version, about = "Content lifetime engine", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Path to the TOML config file. A missing file means defaults.
    #[arg(short, long, global = true, default_value = "post-lifetime.toml")]
    config: String,
}

#[derive(clap::Subcommand, Debug)]
enum Command {
    /// Run a single lifecycle pass and exit.
    Run,
    /// Register the daily job and drive it until interrupted.
    Worker,
    /// Print the trashed-items report as JSON.
    Report,
    /// Create or update the database schema and exit.
    Migrate,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let config = if std::path::Path::new(&args.config).exists() {
        LifetimeConfig::load(&args.config).expect("Failed to load config")
    } else {
        LifetimeConfig::default()
    };

    observability::init_tracing(&config.logging);

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let DatabaseConfig::Sqlite(sqlite) = &config.database;
    let store = Arc::new(
        SqliteStore::connect(sqlite, clock.clone())
            .await
            .expect("Failed to open database"),
    );
    store
        .run_migrations()
        .await
        .expect("Failed to run migrations");

    if matches!(args.command, Command::Migrate) {
        tracing::info!("Migrations complete");
        return;
    }

    let options: Arc<dyn OptionStore> = store.clone();
    if let Some(admin_email) = &config.site.admin_email {
        let existing = options
            .get_option(ADMIN_EMAIL_OPTION)
            .await
            .expect("Failed to read admin email option");
        if existing.is_none() {
            options
                .set_option(ADMIN_EMAIL_OPTION, admin_email)
                .await
                .expect("Failed to seed admin email option");
        }
    }

    let engine = Arc::new(
        TransitionEngine::new(
            store.clone(),
            options.clone(),
            store.clone(),
            Arc::new(LogNotifier),
            clock.clone(),
        )
        .with_lock_duration(config.job.lock_duration())
        .with_edit_url(config.site.edit_url.clone()),
    );

    match args.command {
        Command::Run => {
            let result = engine.process().await;
            match result.state {
                RunState::Completed => tracing::info!(
                    trashed = result.trashed,
                    notices_sent = result.notices_sent,
                    purged = result.purged,
                    "Lifecycle run complete"
                ),
                RunState::Skipped => {
                    tracing::warn!("Lifecycle run skipped, another run holds the lock");
                }
            }
        }
        Command::Worker => {
            let tenants: Vec<TenantId> = config
                .job
                .tenants
                .iter()
                .map(|t| TenantId::new(t.clone()))
                .collect();
            let scheduler = Arc::new(InMemoryScheduler::new(tenants.clone()));
            Registrar::new(scheduler.clone(), clock.clone())
                .schedule()
                .await
                .expect("Failed to schedule lifecycle job");

            let engines: HashMap<TenantId, Arc<TransitionEngine>> = tenants
                .into_iter()
                .map(|tenant| (tenant, engine.clone()))
                .collect();

            tokio::select! {
                _ = start_lifetime_worker(
                    engines,
                    scheduler,
                    clock.clone(),
                    config.job.poll_interval(),
                ) => {}
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("Shutting down");
                }
            }
        }
        Command::Report => {
            let reporter =
                TrashReporter::new(store.clone(), options.clone(), config.site.edit_url.clone());
            let report = reporter.build().await.expect("Failed to build trash report");
            println!(
                "{}",
                serde_json::to_string_pretty(&report).expect("Failed to serialize report")
            );
        }
        Command::Migrate => unreachable!(),
    }
}
