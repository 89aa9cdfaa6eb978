// `app.rs` composes one invocation: open the session, wait for the broker,
// publish the wakeup, and tear down. An interrupt (Ctrl-C) races the whole
// flow; whichever way it ends, the session is shut down before the exit code
// is chosen.
use std::future::Future;
use std::io;
use std::process::ExitCode;

use tokio::signal;

use crate::cli::Args;
use crate::config::{self, SessionSettings};
use crate::console::Console;
use crate::error::WakeupError;
use crate::mqtt::MqttSession;
use crate::wakeup::WakeupRequest;

pub async fn run(args: Args) -> ExitCode {
    let mut console = Console::stdio();
    console.say(format_args!("MQTT wakeup sender"));
    console.say(format_args!("{}", "=".repeat(50)));

    let settings = args.session_settings();
    let request = args.wakeup_request();

    match execute_until(&settings, &request, &mut console, signal::ctrl_c()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(_) => ExitCode::FAILURE,
    }
}

/// Connect, publish, shut down, stopping early if `interrupt` resolves
/// first. Failures are reported on `console` and returned so callers only
/// need to pick the exit code.
pub async fn execute_until<F>(
    settings: &SessionSettings,
    request: &WakeupRequest,
    console: &mut Console,
    interrupt: F,
) -> Result<(), WakeupError>
where
    F: Future<Output = io::Result<()>>,
{
    console.say(format_args!("Connecting to MQTT broker {}...", settings.endpoint()));
    let mut session = MqttSession::open(settings);

    let outcome = tokio::select! {
        res = deliver(&mut session, settings, request, console) => res,
        res = interrupt => match res {
            Ok(()) => Err(WakeupError::Interrupted),
            Err(e) => Err(anyhow::Error::new(e)
                .context("failed to listen for interrupt signal")
                .into()),
        },
    };

    match &outcome {
        Ok(()) => console.say(format_args!("Wakeup message sent")),
        Err(WakeupError::Interrupted) => console.complain(format_args!("\nInterrupted by user")),
        Err(e) => console.complain(format_args!("Error: {e}")),
    }

    session.shutdown().await;
    console.say(format_args!("Disconnected from MQTT broker"));

    outcome
}

async fn deliver(
    session: &mut MqttSession,
    settings: &SessionSettings,
    request: &WakeupRequest,
    console: &mut Console,
) -> Result<(), WakeupError> {
    if !session.wait_connected(settings.connect_timeout).await {
        return Err(WakeupError::ConnectTimeout(settings.connect_timeout));
    }
    console.say(format_args!("Connected to MQTT broker {}", settings.endpoint()));

    publish_wakeup(session, request, console).await?;

    // Give the broker a moment to acknowledge before we disconnect.
    if !session.wait_acked(1, config::DELIVERY_GRACE).await {
        tracing::debug!("no PUBACK within delivery grace period");
    }
    Ok(())
}

/// Build the wakeup for `request`, stamped with the current time, and
/// publish it at QoS 1.
pub async fn publish_wakeup(
    session: &MqttSession,
    request: &WakeupRequest,
    console: &mut Console,
) -> Result<(), WakeupError> {
    let topic = request.topic();
    let payload = request
        .message(chrono::Utc::now().timestamp())
        .to_payload()?;

    session.publish(&topic, payload.clone()).await?;

    console.say(format_args!("Published wakeup message to topic: {topic}"));
    console.say(format_args!("Payload: {payload}"));
    Ok(())
}
