use std::time::Duration;

use thiserror::Error;

/// Everything that can end an invocation after the arguments were accepted.
/// Argument errors are reported by clap before any of this runs.
#[derive(Debug, Error)]
pub enum WakeupError {
    #[error("timed out connecting to MQTT broker ({}s)", .0.as_secs())]
    ConnectTimeout(Duration),

    #[error("failed to publish wakeup message: {0}")]
    Publish(#[from] rumqttc::ClientError),

    #[error("failed to encode wakeup message: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("interrupted by user")]
    Interrupted,

    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}
