//! Infrastructure layer: job storage, user index, remote transcription, config.

pub mod config;
pub mod jobs;
pub mod transcription;
