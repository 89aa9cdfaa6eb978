// Connection settings for the single MQTT session this tool opens. Values
// come from the command line (see `cli.rs`), with the broker address and
// credentials falling back to the usual MQTT_* environment variables.
use std::time::Duration;

pub const ENV_HOST: &str = "MQTT_HOST";
pub const ENV_PORT: &str = "MQTT_PORT";
pub const ENV_USER: &str = "MQTT_USER";
pub const ENV_PASS: &str = "MQTT_PASS";

pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 1883;

/// How long to wait for the broker's CONNACK before giving up.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
pub const KEEP_ALIVE: Duration = Duration::from_secs(60);
/// Pause after a successful publish; ends early once the PUBACK arrives.
pub const DELIVERY_GRACE: Duration = Duration::from_secs(1);
pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(1);
pub const LOOP_ERROR_BACKOFF: Duration = Duration::from_secs(1);
pub const REQUEST_CAPACITY: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub host: String,
    pub port: u16,
    pub client_id: String,
    pub credentials: Option<Credentials>,
    pub keep_alive: Duration,
    pub connect_timeout: Duration,
}

impl SessionSettings {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            client_id: default_client_id(),
            credentials: None,
            keep_alive: KEEP_ALIVE,
            connect_timeout: CONNECT_TIMEOUT,
        }
    }

    /// `host:port`, as shown in console output.
    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Process-unique so two invocations never kick each other off the broker.
pub fn default_client_id() -> String {
    format!("mqtt-wakeup-{}", std::process::id())
}

/// Credentials are only sent when a username was given. A password on its
/// own is ignored with a warning.
pub fn credentials_from(username: &str, password: &str) -> Option<Credentials> {
    match (username.is_empty(), password.is_empty()) {
        (false, _) => Some(Credentials {
            username: username.to_string(),
            password: password.to_string(),
        }),
        (true, false) => {
            tracing::warn!("MQTT password given without a username; connecting without authentication");
            None
        }
        (true, true) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credentials_need_a_username() {
        assert_eq!(credentials_from("", ""), None);
        assert_eq!(credentials_from("", "secret"), None);
        assert_eq!(
            credentials_from("alice", ""),
            Some(Credentials {
                username: "alice".into(),
                password: String::new(),
            })
        );
    }

    #[test]
    fn new_settings_use_fixed_timeouts() {
        let settings = SessionSettings::new("broker.local", 8883);
        assert_eq!(settings.endpoint(), "broker.local:8883");
        assert_eq!(settings.connect_timeout, Duration::from_secs(5));
        assert_eq!(settings.keep_alive, Duration::from_secs(60));
        assert!(settings.client_id.starts_with("mqtt-wakeup-"));
        assert!(settings.credentials.is_none());
    }
}
