//! Terminal rendering of task progress.

use std::collections::HashMap;
use std::io::Write;
use std::sync::{Mutex, PoisonError};

use scribe_core::channel::Channel;
use scribe_core::status::{StatusRecord, TaskStatus};
use scribe_tasks::TaskObserver;

/// Observer that prints progress to a writer, one line per change.
///
/// Status or progress changes print a status line. Logs are a full
/// snapshot on every poll; only lines not shown yet are printed, and the
/// whole snapshot is reprinted when it no longer extends what was shown.
pub struct ConsoleObserver<W> {
    inner: Mutex<Console<W>>,
}

struct Console<W> {
    out: W,
    views: HashMap<Channel, View>,
}

/// What was last shown for a channel.
#[derive(Default)]
struct View {
    status: Option<TaskStatus>,
    progress: u8,
    logs: Vec<String>,
}

impl<W: Write + Send> ConsoleObserver<W> {
    pub fn new(out: W) -> Self {
        Self {
            inner: Mutex::new(Console {
                out,
                views: HashMap::new(),
            }),
        }
    }

    pub fn into_inner(self) -> W {
        self.inner
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
            .out
    }
}

impl<W: Write> Console<W> {
    fn line(&mut self, channel: &Channel, text: std::fmt::Arguments<'_>) {
        if let Err(e) = writeln!(self.out, "[{channel}] {text}") {
            tracing::debug!(error = %e, "Console write failed");
        }
    }
}

impl<W: Write + Send> TaskObserver for ConsoleObserver<W> {
    fn on_update(&self, channel: &Channel, record: &StatusRecord) {
        let mut console = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let view = console.views.remove(channel).unwrap_or_default();

        if view.status.as_ref() != Some(&record.status) || view.progress != record.progress {
            console.line(
                channel,
                format_args!("{} {:>3}%", record.status, record.progress),
            );
        }

        let fresh = if record.logs.starts_with(&view.logs) {
            &record.logs[view.logs.len()..]
        } else {
            &record.logs[..]
        };
        for log in fresh {
            console.line(channel, format_args!("  | {log}"));
        }

        console.views.insert(
            channel.clone(),
            View {
                status: Some(record.status.clone()),
                progress: record.progress,
                logs: record.logs.clone(),
            },
        );
    }

    fn on_terminal(&self, channel: &Channel, record: &StatusRecord) {
        let mut console = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        console.views.remove(channel);

        match &record.status {
            TaskStatus::Error => {
                let reason = record.error.as_deref().unwrap_or("no error message");
                console.line(channel, format_args!("failed: {reason}"));
            }
            _ => {
                console.line(channel, format_args!("finished"));
                if let Some(result) = &record.result {
                    let pretty = serde_json::to_string_pretty(result)
                        .unwrap_or_else(|_| result.to_string());
                    if let Err(e) = writeln!(console.out, "{pretty}") {
                        tracing::debug!(error = %e, "Console write failed");
                    }
                }
            }
        }
    }
}
