//! Command-line arguments.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use scribe_core::channel::Channel;
use scribe_core::types::TaskId;
use scribe_tasks::jobs::{JobRequest, TranscriptionOptions};
use scribe_tasks::payload::{FileInput, Payload};

#[derive(Debug, Parser)]
#[command(
    name = "scribe",
    version,
    about = "Submit long-running jobs to a scribe server and follow them to completion"
)]
pub struct Cli {
    /// Server base URL (overrides `SCRIBE_API_URL`).
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Task identity database (overrides `SCRIBE_STORE_URL`).
    #[arg(long, global = true)]
    pub store_url: Option<String>,

    /// Milliseconds between status polls (overrides `SCRIBE_POLL_INTERVAL_MS`).
    #[arg(long, global = true, value_parser = clap::value_parser!(u64).range(1..))]
    pub poll_interval_ms: Option<u64>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Submit a job to any endpoint and track it on a channel.
    Submit(SubmitArgs),

    /// Transcribe an audio file.
    Transcribe {
        audio: PathBuf,
        /// Spoken language, e.g. `en`.
        #[arg(long)]
        language: Option<String>,
        /// Transcription model.
        #[arg(long)]
        model: Option<String>,
        #[command(flatten)]
        run: RunArgs,
    },

    /// Run speaker diarization on an audio file.
    Diarize {
        audio: PathBuf,
        /// Expected number of speakers.
        #[arg(long)]
        speakers: Option<u32>,
        #[command(flatten)]
        run: RunArgs,
    },

    /// Install a model on the server.
    InstallModel {
        name: String,
        #[command(flatten)]
        run: RunArgs,
    },

    /// Download a translation model onto the server.
    DownloadTranslation {
        name: String,
        #[command(flatten)]
        run: RunArgs,
    },

    /// Resume tracking persisted tasks (every channel when none given).
    Resume { channels: Vec<Channel> },

    /// Print one status sample for a task without tracking it.
    Status {
        #[arg(value_parser = parse_task_id)]
        task_id: TaskId,
    },

    /// List channels with a persisted task.
    List,

    /// Drop the persisted task of a channel without contacting the server.
    Forget { channel: Channel },
}

#[derive(Debug, Clone, Copy, Default, Args)]
pub struct RunArgs {
    /// Return right after submission; resume later with `scribe resume`.
    #[arg(long)]
    pub detach: bool,
}

#[derive(Debug, Args)]
pub struct SubmitArgs {
    /// Channel the task is tracked under.
    pub channel: Channel,

    /// Job endpoint path, e.g. `/api/transcribe`.
    #[arg(long)]
    pub endpoint: String,

    /// JSON request body.
    #[arg(long, value_parser = parse_json, conflicts_with_all = ["form", "file"])]
    pub json: Option<serde_json::Value>,

    /// Form field as `key=value`; repeatable.
    #[arg(long, value_parser = parse_key_value)]
    pub form: Vec<(String, String)>,

    /// File upload as `field=path`; repeatable. Sends a multipart body.
    #[arg(long, value_parser = parse_key_value)]
    pub file: Vec<(String, String)>,

    #[command(flatten)]
    pub run: RunArgs,
}

impl SubmitArgs {
    /// Request body: JSON, multipart when files are given, else a form,
    /// else empty.
    pub fn payload(&self) -> Payload {
        if let Some(body) = &self.json {
            return Payload::Json(body.clone());
        }
        if !self.file.is_empty() {
            return Payload::Multipart {
                fields: self.form.clone(),
                files: self
                    .file
                    .iter()
                    .map(|(field, path)| FileInput::new(field.as_str(), path.as_str()))
                    .collect(),
            };
        }
        if !self.form.is_empty() {
            return Payload::Form(self.form.clone());
        }
        Payload::Empty
    }

    pub fn job_request(&self) -> JobRequest {
        JobRequest::new(self.channel.clone(), self.endpoint.as_str(), self.payload())
    }
}

impl Command {
    /// The job to submit and how to run it, for submitting commands.
    pub fn job(&self) -> Result<Option<(JobRequest, RunArgs)>, scribe_core::error::CoreError> {
        let job = match self {
            Command::Submit(args) => (args.job_request(), args.run),
            Command::Transcribe {
                audio,
                language,
                model,
                run,
            } => (
                JobRequest::transcription(
                    audio,
                    TranscriptionOptions {
                        language: language.clone(),
                        model: model.clone(),
                    },
                ),
                *run,
            ),
            Command::Diarize {
                audio,
                speakers,
                run,
            } => (JobRequest::diarization(audio, *speakers), *run),
            Command::InstallModel { name, run } => (JobRequest::model_install(name)?, *run),
            Command::DownloadTranslation { name, run } => {
                (JobRequest::translation_download(name)?, *run)
            }
            Command::Resume { .. }
            | Command::Status { .. }
            | Command::List
            | Command::Forget { .. } => return Ok(None),
        };
        Ok(Some(job))
    }
}

/// Parse `key=value`. The value may itself contain `=`.
pub fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got `{raw}`"))?;
    if key.is_empty() {
        return Err(format!("missing key in `{raw}`"));
    }
    Ok((key.to_string(), value.to_string()))
}

fn parse_json(raw: &str) -> Result<serde_json::Value, String> {
    serde_json::from_str(raw).map_err(|e| format!("invalid JSON: {e}"))
}

fn parse_task_id(raw: &str) -> Result<TaskId, String> {
    TaskId::new(raw).map_err(|e| e.to_string())
}
