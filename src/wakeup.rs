// The wakeup request and its wire form. The payload is a single JSON object
// published once per invocation:
//
//   {"type": "wakeup", "device_id": "...", "reason": "...", "timestamp": 1700000000}
//
// Field order and the `", "` / `": "` separators are part of the format
// devices already parse, so encoding goes through `SpacedFormatter` instead
// of serde_json's compact output. Non-ASCII text is written as-is.
use std::io;

use serde::Serialize;
use serde_json::ser::Formatter;

pub const DEFAULT_REASON: &str = "remote_wakeup";
const MESSAGE_TYPE: &str = "wakeup";

/// What to wake and why. Built once from the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WakeupRequest {
    pub device_id: String,
    pub reason: String,
    pub topic: Option<String>,
}

impl WakeupRequest {
    pub fn new(device_id: impl Into<String>) -> Self {
        Self {
            device_id: device_id.into(),
            reason: DEFAULT_REASON.to_string(),
            topic: None,
        }
    }

    /// The explicit topic if one was given, `device/{device_id}/wakeup`
    /// otherwise. An empty override counts as none.
    pub fn topic(&self) -> String {
        match self.topic.as_deref() {
            Some(topic) if !topic.is_empty() => topic.to_string(),
            _ => format!("device/{}/wakeup", self.device_id),
        }
    }

    pub fn message(&self, timestamp: i64) -> WakeupMessage<'_> {
        WakeupMessage {
            kind: MESSAGE_TYPE,
            device_id: &self.device_id,
            reason: &self.reason,
            timestamp,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct WakeupMessage<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    device_id: &'a str,
    reason: &'a str,
    timestamp: i64,
}

impl WakeupMessage<'_> {
    pub fn to_payload(&self) -> Result<String, serde_json::Error> {
        let mut buf = Vec::with_capacity(128);
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, SpacedFormatter);
        self.serialize(&mut ser)?;
        // serde_json only ever writes valid UTF-8
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}

/// Compact JSON with a space after every `,` and `:`.
struct SpacedFormatter;

impl Formatter for SpacedFormatter {
    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first { Ok(()) } else { writer.write_all(b", ") }
    }

    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first { Ok(()) } else { writer.write_all(b", ") }
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        writer.write_all(b": ")
    }
}
