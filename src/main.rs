mod cli;
mod todo;

use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use serde_json::json;
use speculate::config::Config;
use speculate::logging::init_tracing;
use speculate::OptimisticStore;

use crate::cli::Args;
use crate::todo::{NewTodo, TodoBackend, TodoReducer};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
    .context("failed to load config")?;
    let executor = args.executor_config(&config.executor);

    let backend = TodoBackend::new(Duration::from_millis(args.latency_ms), args.fail.clone());
    let store = OptimisticStore::builder(TodoReducer, Vec::new(), move |todo: NewTodo| {
        backend.save(todo)
    })
    .config(&executor)
    .on_error(|id, err| tracing::warn!(action = %id, error = %err, "Save failed"))
    .build()?;

    let printer = store.subscribe(|state| {
        match serde_json::to_string(&json!({ "projected": state })) {
            Ok(line) => println!("{line}"),
            Err(err) => tracing::error!(error = %err, "Failed to encode projected state"),
        }
    });

    let handles: Vec<_> = args
        .items
        .iter()
        .map(|text| store.dispatch(NewTodo { text: text.clone() }))
        .collect();

    let settled = async {
        for handle in handles {
            let id = handle.id();
            match handle.await {
                Ok(saved) => tracing::info!(action = %id, todo_id = saved.id, "Saved"),
                Err(err) => {
                    tracing::info!(action = %id, error_type = err.error_type(), "Not saved")
                }
            }
        }
    };

    tokio::select! {
        _ = settled => {}
        signal = tokio::signal::ctrl_c() => {
            signal.context("failed to listen for Ctrl-C")?;
            tracing::info!(pending = store.pending_actions().len(), "Interrupted, resetting");
            store.reset();
        }
    }

    printer.unsubscribe();

    let summary = json!({
        "base": store.base_state(),
        "stats": store.stats(),
    });
    println!("{}", serde_json::to_string(&summary)?);

    Ok(())
}
