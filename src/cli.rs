use std::ffi::OsString;

use clap::Parser;

use crate::config::{self, SessionSettings};
use crate::wakeup::{self, WakeupRequest};

/// Send a wakeup message to a device over MQTT
#[derive(Parser, Debug, Clone)]
#[command(name = "mqtt-wakeup", version)]
pub struct Args {
    /// Device to wake
    #[arg(long)]
    pub device_id: String,

    /// MQTT broker host
    #[arg(long, env = config::ENV_HOST, default_value = config::DEFAULT_HOST)]
    pub server: String,

    /// MQTT broker port
    #[arg(long, env = config::ENV_PORT, default_value_t = config::DEFAULT_PORT)]
    pub port: u16,

    /// MQTT username
    #[arg(long, env = config::ENV_USER, default_value = "")]
    pub username: String,

    /// MQTT password
    #[arg(long, env = config::ENV_PASS, default_value = "", hide_env_values = true)]
    pub password: String,

    /// Topic to publish to (default: device/<device_id>/wakeup)
    #[arg(long)]
    pub topic: Option<String>,

    /// Reason reported to the device
    #[arg(long, default_value = wakeup::DEFAULT_REASON)]
    pub reason: String,

    /// MQTT client id (default: mqtt-wakeup-<pid>)
    #[arg(long)]
    pub client_id: Option<String>,
}

impl Args {
    pub fn try_parse_args<I, T>(argv: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        Self::try_parse_from(argv)
    }

    pub fn session_settings(&self) -> SessionSettings {
        let mut settings = SessionSettings::new(self.server.clone(), self.port);
        if let Some(id) = self.client_id.as_deref().filter(|id| !id.is_empty()) {
            settings.client_id = id.to_string();
        }
        settings.credentials = config::credentials_from(&self.username, &self.password);
        settings
    }

    pub fn wakeup_request(&self) -> WakeupRequest {
        let mut request = WakeupRequest::new(self.device_id.clone());
        request.reason = self.reason.clone();
        request.topic = self.topic.clone();
        request
    }
}
