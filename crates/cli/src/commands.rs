//! Subcommand execution.

use std::io::Write;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use scribe_core::channel::Channel;
use scribe_core::status::TaskStatus;
use scribe_store::SqliteStore;
use scribe_tasks::api::TaskApi;
use scribe_tasks::jobs::JobRequest;
use scribe_tasks::{TaskError, TaskManager, TaskObserver, TrackOutcome, Tracker};

use crate::args::{Cli, Command, RunArgs};
use crate::config::ClientConfig;
use crate::console::ConsoleObserver;

/// Exit status after Ctrl-C, as shells report SIGINT.
const INTERRUPTED: u8 = 130;

/// Run one CLI invocation.
pub async fn run(cli: Cli, config: ClientConfig) -> anyhow::Result<ExitCode> {
    let store = SqliteStore::open(&config.store_url)
        .await
        .with_context(|| format!("Failed to open task store {}", config.store_url))?;

    let client = reqwest::Client::builder()
        .timeout(config.request_timeout())
        .build()
        .context("Failed to build HTTP client")?;
    let api = TaskApi::with_client(client, &config.api_url)?
        .with_submit_timeout(config.submit_timeout());

    tracing::debug!(
        api_url = %config.api_url,
        store_url = %config.store_url,
        poll_interval_ms = config.poll.interval.as_millis() as u64,
        "Client configured",
    );

    let tracker = Tracker::new(Arc::new(api), Arc::new(store.clone()), config.poll);
    let manager = TaskManager::new(tracker);
    let observer: Arc<dyn TaskObserver> = Arc::new(ConsoleObserver::new(std::io::stdout()));

    let code = execute(&manager, cli.command, observer).await;
    store.close().await;
    code
}

async fn execute(
    manager: &TaskManager,
    command: Command,
    observer: Arc<dyn TaskObserver>,
) -> anyhow::Result<ExitCode> {
    let tracker = manager.tracker();
    match command {
        Command::Resume { channels } => {
            let started = if channels.is_empty() {
                manager.resume_all(observer).await?
            } else {
                let mut started = Vec::new();
                for channel in channels {
                    if manager.resume(channel.clone(), Arc::clone(&observer)).await {
                        started.push(channel);
                    }
                }
                started
            };
            if started.is_empty() {
                println!("Nothing to resume");
                return Ok(ExitCode::SUCCESS);
            }
            Ok(follow(manager, &started).await)
        }
        Command::Status { task_id } => {
            let record = tracker.snapshot(&task_id).await?;
            println!("{}", serde_json::to_string_pretty(&record)?);
            Ok(ExitCode::SUCCESS)
        }
        Command::List => {
            let entries = tracker.store().entries().await?;
            let mut out = std::io::stdout().lock();
            for (channel, task_id) in entries {
                writeln!(out, "{channel}\t{task_id}")?;
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Forget { channel } => {
            match tracker.store().get(&channel).await? {
                Some(task_id) => {
                    tracker.store().set(&channel, None).await?;
                    tracing::info!(channel = %channel, task_id = %task_id, "Forgot task");
                    println!("Forgot {task_id} on {channel}");
                }
                None => println!("No task persisted for {channel}"),
            }
            Ok(ExitCode::SUCCESS)
        }
        submitting => match submitting.job()? {
            Some((request, run)) => submit(manager, request, run, observer).await,
            None => Ok(ExitCode::SUCCESS),
        },
    }
}

async fn submit(
    manager: &TaskManager,
    request: JobRequest,
    run: RunArgs,
    observer: Arc<dyn TaskObserver>,
) -> anyhow::Result<ExitCode> {
    if run.detach {
        let task_id = manager
            .tracker()
            .submit(&request.channel, &request.endpoint, request.payload)
            .await?;
        println!("Submitted {task_id} on {}", request.channel);
        println!("Follow it with `scribe resume {}`", request.channel);
        return Ok(ExitCode::SUCCESS);
    }

    let (channel, task_id) = manager.track_job(request, observer).await?;
    println!("Submitted {task_id} on {channel}");
    Ok(follow(manager, &[channel]).await)
}

/// Wait for the loops on `channels`, or stop them all on Ctrl-C.
///
/// Interrupting leaves every task id persisted, so `scribe resume`
/// picks them up again.
async fn follow(manager: &TaskManager, channels: &[Channel]) -> ExitCode {
    let outcomes = async {
        let mut failed = false;
        for channel in channels {
            failed |= !report(channel, manager.wait(channel).await);
        }
        failed
    };

    tokio::select! {
        failed = outcomes => {
            if failed { ExitCode::FAILURE } else { ExitCode::SUCCESS }
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Interrupted; task ids stay persisted");
            manager.shutdown().await;
            eprintln!("Interrupted. Run `scribe resume` to continue tracking.");
            ExitCode::from(INTERRUPTED)
        }
    }
}

/// Print how a channel's loop ended. Returns whether it succeeded.
fn report(channel: &Channel, result: Result<Option<TrackOutcome>, TaskError>) -> bool {
    match result {
        Ok(Some(TrackOutcome::Completed(record) | TrackOutcome::Finalized(record))) => {
            record.status != TaskStatus::Error
        }
        Ok(Some(TrackOutcome::Unresolvable { task_id })) => {
            eprintln!("[{channel}] task {task_id} is no longer known to the server; cleared");
            true
        }
        Ok(Some(TrackOutcome::Idle)) => {
            eprintln!("[{channel}] nothing to resume");
            true
        }
        Ok(Some(TrackOutcome::Abandoned)) | Ok(None) => true,
        Err(TaskError::PollFailed {
            task_id, message, ..
        }) => {
            eprintln!(
                "[{channel}] lost contact while polling {task_id}: {message}. \
                 Run `scribe resume {channel}` to retry."
            );
            false
        }
        Err(e) => {
            eprintln!("[{channel}] {e}");
            false
        }
    }
}
