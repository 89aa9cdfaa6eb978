// Minimal in-process MQTT 3.1.1 broker for tests. Accepts a single client,
// answers CONNECT (optionally), PUBLISH at QoS 1 and PINGREQ, and reports
// what it saw over a channel.
use std::io;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;

const CONNECT: u8 = 1;
const PUBLISH: u8 = 3;
const PINGREQ: u8 = 12;
const DISCONNECT: u8 = 14;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrokerEvent {
    Connected,
    Published {
        topic: String,
        qos: u8,
        payload: Vec<u8>,
    },
    Disconnected,
    /// The client's socket is gone, after a DISCONNECT or not.
    Closed,
}

pub struct MockBroker {
    port: u16,
    events: mpsc::UnboundedReceiver<BrokerEvent>,
}

impl MockBroker {
    /// With `ack_connect` false the broker reads CONNECT and never answers.
    pub async fn start(ack_connect: bool) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let (tx, events) = mpsc::unbounded_channel();

        tokio::spawn(async move {
            if let Ok((stream, _)) = listener.accept().await {
                let _ = serve(stream, ack_connect, &tx).await;
                let _ = tx.send(BrokerEvent::Closed);
            }
        });

        Self { port, events }
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Everything seen until the client went away.
    pub async fn collect_events(&mut self) -> Vec<BrokerEvent> {
        let mut seen = Vec::new();
        while let Ok(Some(event)) =
            tokio::time::timeout(Duration::from_secs(5), self.events.recv()).await
        {
            let done = event == BrokerEvent::Closed;
            seen.push(event);
            if done {
                break;
            }
        }
        seen
    }
}

async fn serve(
    mut stream: TcpStream,
    ack_connect: bool,
    tx: &mpsc::UnboundedSender<BrokerEvent>,
) -> io::Result<()> {
    loop {
        let header = stream.read_u8().await?;
        let len = read_remaining_length(&mut stream).await?;
        let mut body = vec![0u8; len];
        stream.read_exact(&mut body).await?;

        match header >> 4 {
            CONNECT => {
                let _ = tx.send(BrokerEvent::Connected);
                if ack_connect {
                    stream.write_all(&[0x20, 0x02, 0x00, 0x00]).await?;
                }
            }
            PUBLISH => {
                let qos = (header >> 1) & 0x03;
                let topic_len = u16::from_be_bytes([body[0], body[1]]) as usize;
                let topic = String::from_utf8_lossy(&body[2..2 + topic_len]).into_owned();
                let mut offset = 2 + topic_len;
                if qos > 0 {
                    stream
                        .write_all(&[0x40, 0x02, body[offset], body[offset + 1]])
                        .await?;
                    offset += 2;
                }
                let _ = tx.send(BrokerEvent::Published {
                    topic,
                    qos,
                    payload: body[offset..].to_vec(),
                });
            }
            PINGREQ => stream.write_all(&[0xD0, 0x00]).await?,
            DISCONNECT => {
                let _ = tx.send(BrokerEvent::Disconnected);
                return Ok(());
            }
            _ => {}
        }
    }
}

async fn read_remaining_length<R: AsyncRead + Unpin>(reader: &mut R) -> io::Result<usize> {
    let mut value = 0usize;
    let mut multiplier = 1usize;
    loop {
        let byte = reader.read_u8().await?;
        value += (byte & 0x7F) as usize * multiplier;
        if byte & 0x80 == 0 {
            return Ok(value);
        }
        multiplier *= 128;
    }
}
