pub mod api;
pub mod clipboard;
pub mod cli;
pub mod commands;
pub mod config;
pub mod generation;
pub mod history;
pub mod models;
pub mod settings;
pub mod shell;
pub mod state;
pub mod storage;

use crate::api::{GenerativeApiProvider, OpenAICompatibleProvider};
use crate::cli::Cli;
use crate::config::AppConfig;
use crate::state::AppState;
use crate::storage::{KeyValueStore, MemoryStore, SqliteStore};
use anyhow::Context;
use clap::Parser;
use std::sync::Arc;

/// Binary entry point: parse arguments, wire the state, run one command or the shell.
pub fn run() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let mut config = AppConfig::from_env()?;
    if let Some(data_dir) = cli.data_dir.clone() {
        config.data_dir = data_dir;
    }

    let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;
    runtime.block_on(async move {
        let store: Arc<dyn KeyValueStore> = if cli.memory {
            log::info!("Using in-memory store; nothing will be persisted");
            Arc::new(MemoryStore::new())
        } else {
            Arc::new(SqliteStore::open(&config.data_dir).await?)
        };

        let api_provider: Arc<dyn GenerativeApiProvider> =
            Arc::new(OpenAICompatibleProvider::new(&config.api_url, &config.model));

        let state = AppState::new(store, api_provider, config);
        cli::dispatch(&state, cli.command).await
    })
}
