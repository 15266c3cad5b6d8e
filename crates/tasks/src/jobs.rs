//! Requests for the server's well-known job kinds.

use std::path::PathBuf;

use scribe_core::channel::Channel;
use scribe_core::error::CoreError;
use serde_json::json;

use crate::payload::{FileInput, Payload};

pub const TRANSCRIBE_ENDPOINT: &str = "/api/transcribe";
pub const DIARIZE_ENDPOINT: &str = "/api/diarize";
pub const MODEL_INSTALL_ENDPOINT: &str = "/api/models/install";
pub const TRANSLATION_DOWNLOAD_ENDPOINT: &str = "/api/translation/download";

/// Multipart field carrying the uploaded audio.
const AUDIO_FIELD: &str = "file";

/// A job ready for submission: where to send it and which channel
/// tracks it.
#[derive(Debug, Clone, PartialEq)]
pub struct JobRequest {
    pub channel: Channel,
    pub endpoint: String,
    pub payload: Payload,
}

/// Options for a transcription job.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TranscriptionOptions {
    /// Spoken language hint, e.g. `en`. The server detects it when absent.
    pub language: Option<String>,
    /// Model to transcribe with. The server default when absent.
    pub model: Option<String>,
}

impl JobRequest {
    pub fn new(channel: Channel, endpoint: impl Into<String>, payload: Payload) -> Self {
        Self {
            channel,
            endpoint: endpoint.into(),
            payload,
        }
    }

    /// Transcribe an audio file.
    pub fn transcription(audio: impl Into<PathBuf>, options: TranscriptionOptions) -> Self {
        let mut fields = Vec::new();
        if let Some(language) = options.language {
            fields.push(("language".to_string(), language));
        }
        if let Some(model) = options.model {
            fields.push(("model".to_string(), model));
        }

        Self::new(
            Channel::transcription(),
            TRANSCRIBE_ENDPOINT,
            Payload::Multipart {
                fields,
                files: vec![FileInput::new(AUDIO_FIELD, audio)],
            },
        )
    }

    /// Run speaker diarization on an audio file.
    pub fn diarization(audio: impl Into<PathBuf>, speakers: Option<u32>) -> Self {
        let fields = speakers
            .map(|n| vec![("num_speakers".to_string(), n.to_string())])
            .unwrap_or_default();

        Self::new(
            Channel::diarization(),
            DIARIZE_ENDPOINT,
            Payload::Multipart {
                fields,
                files: vec![FileInput::new(AUDIO_FIELD, audio)],
            },
        )
    }

    /// Install a model on the server.
    pub fn model_install(model: &str) -> Result<Self, CoreError> {
        Ok(Self::new(
            Channel::model_install(model)?,
            MODEL_INSTALL_ENDPOINT,
            Payload::Json(json!({ "model": model })),
        ))
    }

    /// Download a translation model onto the server.
    pub fn translation_download(model: &str) -> Result<Self, CoreError> {
        Ok(Self::new(
            Channel::translation_download(model)?,
            TRANSLATION_DOWNLOAD_ENDPOINT,
            Payload::Json(json!({ "model": model })),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transcription_uploads_audio_with_options() {
        let request = JobRequest::transcription(
            "/tmp/meeting.wav",
            TranscriptionOptions {
                language: Some("de".into()),
                model: None,
            },
        );

        assert_eq!(request.channel, Channel::transcription());
        assert_eq!(request.endpoint, TRANSCRIBE_ENDPOINT);
        assert_eq!(
            request.payload,
            Payload::Multipart {
                fields: vec![("language".into(), "de".into())],
                files: vec![FileInput::new("file", "/tmp/meeting.wav")],
            }
        );
    }

    #[test]
    fn diarization_passes_speaker_count() {
        let request = JobRequest::diarization("a.wav", Some(3));
        assert_eq!(request.channel, Channel::diarization());
        match request.payload {
            Payload::Multipart { fields, files } => {
                assert_eq!(fields, vec![("num_speakers".into(), "3".into())]);
                assert_eq!(files.len(), 1);
            }
            other => panic!("Expected multipart payload, got {other:?}"),
        }
    }

    #[test]
    fn model_install_tracks_per_model_channel() {
        let request = JobRequest::model_install("nllb").unwrap();
        assert_eq!(request.channel.as_str(), "model-install:nllb");
        assert_eq!(request.payload, Payload::Json(json!({"model": "nllb"})));
    }

    #[test]
    fn translation_download_rejects_unsafe_model_name() {
        assert!(JobRequest::translation_download("../etc").is_err());
        let request = JobRequest::translation_download("opus-mt-en-de").unwrap();
        assert_eq!(request.endpoint, TRANSLATION_DOWNLOAD_ENDPOINT);
    }
}
