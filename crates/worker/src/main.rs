// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! MaveJobs worker (mjw)
//!
//! Background process that polls the work queue and executes registered
//! job functions against the shared store.

use std::sync::Arc;
use std::time::Duration;

use mj_adapters::{
    HttpAlleleRegistry, HttpClinvarClient, HttpGnomadClient, HttpLdhClient, HttpUniprotClient,
    HttpVariantMapper, JsonScoreDataParser, LocalObjectStore, MemoryQueue,
};
use mj_core::{SystemClock, UuidIdGen};
use mj_engine::{jobs, BlockingPool, Clients, Config, JobContext, JobRegistry, Worker};
use mj_storage::Session;
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::Notify;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Per-request timeout applied to every outbound HTTP client
const CLIENT_TIMEOUT: Duration = Duration::from_secs(30);

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

fn build_clients(config: &Config) -> Result<Clients, Box<dyn std::error::Error>> {
    let mapper_url = env_or("VRS_MAPPER_ENDPOINT", "http://localhost:8004");
    let registry_url = config
        .car_submission_endpoint
        .clone()
        .unwrap_or_else(|| "https://reg.genome.network".to_string());
    let ldh_url = config
        .ldh_submission_endpoint
        .clone()
        .unwrap_or_else(|| "https://ldh.clinicalgenome.org".to_string());
    let gnomad_url = env_or("GNOMAD_ENDPOINT", "https://gnomad.broadinstitute.org/api");
    let uniprot_url = env_or("UNIPROT_ENDPOINT", "https://rest.uniprot.org");
    let clinvar_url = env_or(
        "CLINVAR_ENDPOINT",
        "https://ftp.ncbi.nlm.nih.gov/pub/clinvar/tab_delimited/archive",
    );
    let uploads_root = env_or("UPLOADS_ROOT", "/var/lib/mavejobs/uploads");

    Ok(Clients {
        mapper: Arc::new(HttpVariantMapper::new(mapper_url, CLIENT_TIMEOUT)?),
        allele_registry: Arc::new(HttpAlleleRegistry::new(registry_url, CLIENT_TIMEOUT)?),
        ldh: Arc::new(HttpLdhClient::new(
            ldh_url,
            std::env::var("LDH_USERNAME").ok(),
            std::env::var("LDH_PASSWORD").ok(),
            CLIENT_TIMEOUT,
        )?),
        gnomad: Arc::new(HttpGnomadClient::new(gnomad_url, CLIENT_TIMEOUT)?),
        uniprot: Arc::new(HttpUniprotClient::new(uniprot_url, CLIENT_TIMEOUT)?),
        clinvar: Arc::new(HttpClinvarClient::new(clinvar_url, CLIENT_TIMEOUT)?),
        objects: Arc::new(LocalObjectStore::new(uploads_root)),
        scores: Arc::new(JsonScoreDataParser),
    })
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env();

    // Non-blocking file logging when MJW_LOG_FILE is set, stderr otherwise
    let _log_guard = match std::env::var("MJW_LOG_FILE").ok().filter(|v| !v.is_empty()) {
        Some(path) => {
            let path = std::path::PathBuf::from(path);
            let directory = path.parent().map(|p| p.to_path_buf()).unwrap_or_default();
            let file_name = path
                .file_name()
                .map(|f| f.to_string_lossy().into_owned())
                .unwrap_or_else(|| "mjw.log".to_string());
            let appender = tracing_appender::rolling::never(directory, file_name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::fmt()
                .with_env_filter(EnvFilter::from_default_env())
                .with_writer(writer)
                .with_ansi(false)
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(EnvFilter::from_default_env())
                .init();
            None
        }
    };

    info!("Starting MaveJobs worker");

    let db = match &config.journal_path {
        Some(path) => Session::open(path)?,
        None => Session::in_memory(),
    };
    let clock = Arc::new(SystemClock);
    let queue = Arc::new(MemoryQueue::new(clock.clone()));
    let clients = build_clients(&config)?;

    let ctx = JobContext {
        db,
        queue,
        clock,
        ids: Arc::new(UuidIdGen),
        pool: BlockingPool::new(config.blocking_pool_size),
        clients,
        config: Arc::new(config),
    };

    let mut registry = JobRegistry::new();
    jobs::register_all(&mut registry);
    let worker = Worker::new(ctx, Arc::new(registry));

    // Shutdown on SIGINT/SIGTERM; in-flight dispatches finish first
    let shutdown = Arc::new(Notify::new());
    {
        let shutdown = shutdown.clone();
        let mut sigint = signal(SignalKind::interrupt())?;
        let mut sigterm = signal(SignalKind::terminate())?;
        tokio::spawn(async move {
            tokio::select! {
                _ = sigint.recv() => info!("received SIGINT"),
                _ = sigterm.recv() => info!("received SIGTERM"),
            }
            shutdown.notify_one();
        });
    }

    worker.run(shutdown).await;
    info!("MaveJobs worker stopped");
    Ok(())
}
