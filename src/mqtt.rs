// MQTT session used for one wakeup. This owns the `rumqttc` client and the
// background task that drives its event loop. The task publishes the link
// status (connected flag, PUBACK count) over a watch channel so the main flow
// can wait on it with a timeout instead of polling a shared flag.
use std::time::Duration;

use rumqttc::{
    AsyncClient, ConnectReturnCode, Event, EventLoop, Incoming, MqttOptions, Outgoing, QoS,
};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time;
use tracing::{debug, error, info, trace, warn};

use crate::config::{self, SessionSettings};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinkStatus {
    pub connected: bool,
    pub acked: usize,
}

/// One broker connection, alive for the duration of the invocation.
///
/// Call [`MqttSession::shutdown`] on every exit path. Dropping the session
/// without it aborts the event loop without a DISCONNECT.
pub struct MqttSession {
    client: AsyncClient,
    status: watch::Receiver<LinkStatus>,
    event_loop_handle: Option<JoinHandle<()>>,
}

impl MqttSession {
    /// Create the client and start the background event loop. The TCP
    /// connection and CONNECT are driven by the loop, so this never fails;
    /// an unreachable broker shows up as a [`wait_connected`] timeout.
    ///
    /// [`wait_connected`]: MqttSession::wait_connected
    pub fn open(settings: &SessionSettings) -> Self {
        let mut options =
            MqttOptions::new(settings.client_id.as_str(), settings.host.as_str(), settings.port);
        options.set_keep_alive(settings.keep_alive);
        if let Some(creds) = &settings.credentials {
            options.set_credentials(creds.username.as_str(), creds.password.as_str());
            debug!(username = %creds.username, "using MQTT credentials");
        }

        let (client, eventloop) = AsyncClient::new(options, config::REQUEST_CAPACITY);
        let (status_tx, status) = watch::channel(LinkStatus::default());
        let handle = tokio::spawn(drive_event_loop(eventloop, status_tx));

        Self {
            client,
            status,
            event_loop_handle: Some(handle),
        }
    }

    pub fn status(&self) -> LinkStatus {
        *self.status.borrow()
    }

    pub fn is_connected(&self) -> bool {
        self.status().connected
    }

    /// Wait for the broker's CONNACK. Returns `false` if it did not arrive
    /// within `timeout`.
    pub async fn wait_connected(&mut self, timeout: Duration) -> bool {
        matches!(
            time::timeout(timeout, self.status.wait_for(|s| s.connected)).await,
            Ok(Ok(_))
        )
    }

    /// Hand a message to the client's outbound queue. `Ok` means the request
    /// was accepted, not that the broker has it yet.
    pub async fn publish(&self, topic: &str, payload: String) -> Result<(), rumqttc::ClientError> {
        self.client
            .publish(topic, QoS::AtLeastOnce, false, payload.into_bytes())
            .await
    }

    /// Wait until at least `count` PUBACKs have arrived, or `timeout` passes.
    pub async fn wait_acked(&mut self, count: usize, timeout: Duration) -> bool {
        matches!(
            time::timeout(timeout, self.status.wait_for(|s| s.acked >= count)).await,
            Ok(Ok(_))
        )
    }

    /// Stop the event loop and close the connection if one is up. Consumes
    /// the session, so it runs at most once.
    pub async fn shutdown(mut self) {
        let Some(mut handle) = self.event_loop_handle.take() else {
            return;
        };

        if self.is_connected() {
            if let Err(e) = self.client.disconnect().await {
                warn!(error = %e, "failed to request MQTT disconnect");
            } else if time::timeout(config::SHUTDOWN_GRACE, &mut handle).await.is_err() {
                warn!("MQTT event loop did not finish after disconnect");
            }
        }

        handle.abort();
        debug!("MQTT session closed");
    }
}

impl Drop for MqttSession {
    fn drop(&mut self) {
        if let Some(handle) = self.event_loop_handle.take() {
            error!("MqttSession dropped without shutdown(); aborting event loop");
            handle.abort();
        }
    }
}

/// Poll the event loop until our own DISCONNECT goes out. Errors are logged
/// and retried after a back-off; `rumqttc` reconnects on the next poll.
async fn drive_event_loop(mut eventloop: EventLoop, status: watch::Sender<LinkStatus>) {
    loop {
        match eventloop.poll().await {
            Ok(Event::Incoming(Incoming::ConnAck(ack))) => {
                if ack.code == ConnectReturnCode::Success {
                    info!("connected to MQTT broker");
                    status.send_modify(|s| s.connected = true);
                } else {
                    warn!(code = ?ack.code, "MQTT broker refused connection");
                }
            }
            Ok(Event::Incoming(Incoming::PubAck(ack))) => {
                debug!(pkid = ack.pkid, "publish acknowledged");
                status.send_modify(|s| s.acked += 1);
            }
            Ok(Event::Incoming(Incoming::Disconnect)) => {
                warn!("MQTT broker closed the session");
                status.send_modify(|s| s.connected = false);
            }
            Ok(Event::Outgoing(Outgoing::Disconnect)) => {
                debug!("disconnect sent, stopping event loop");
                status.send_modify(|s| s.connected = false);
                break;
            }
            Ok(event) => trace!(?event, "mqtt event"),
            Err(e) => {
                if status.borrow().connected {
                    warn!(error = %e, "lost connection to MQTT broker");
                    status.send_modify(|s| s.connected = false);
                } else {
                    warn!(error = %e, "mqtt loop error");
                }
                // Back off on errors to avoid busy loops.
                time::sleep(config::LOOP_ERROR_BACKOFF).await;
            }
        }
    }
}
