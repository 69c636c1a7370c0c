/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Drives one [`Session`] over one byte stream.
//!
//! [`run_connection`] owns the stream. Frames read off it go to
//! [`Session::next_raw`], messages the session sends arrive through a
//! [`ChannelResponder`] and are written in order, and a timer calls
//! [`Session::tick`]. The loop ends when either side closes the connection.

use crate::codec::{CodecError, FixCodec};
use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use rivetfix_session::{Responder, Session};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tokio_util::codec::{FramedRead, FramedWrite};
use tracing::{debug, info, warn};

/// Why a connection ended abnormally.
#[derive(Debug, Error)]
pub enum ConnectionError {
    /// The inbound stream could not be framed.
    #[error("framing error: {0}")]
    Codec(#[from] CodecError),
}

/// Settings of the connection driver.
#[derive(Debug, Clone, Copy)]
pub struct ConnectionOptions {
    /// Period of [`Session::tick`] calls.
    pub tick_interval: Duration,
}

impl Default for ConnectionOptions {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_secs(1),
        }
    }
}

impl ConnectionOptions {
    #[must_use]
    pub const fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval = interval;
        self
    }
}

#[derive(Debug)]
enum Outbound {
    Data(Bytes),
    Disconnect,
}

/// [`Responder`] that queues work for the connection task.
#[derive(Debug, Clone)]
pub struct ChannelResponder {
    tx: mpsc::UnboundedSender<Outbound>,
    remote_address: Option<String>,
}

impl Responder for ChannelResponder {
    fn send(&self, data: Bytes) -> bool {
        self.tx.send(Outbound::Data(data)).is_ok()
    }

    fn disconnect(&self) {
        let _ = self.tx.send(Outbound::Disconnect);
    }

    fn remote_address(&self) -> Option<String> {
        self.remote_address.clone()
    }
}

/// Binds `session` to `stream` until the connection closes.
///
/// # Arguments
/// * `session` - Session that owns the protocol state
/// * `stream` - Connected byte stream, e.g. a `TcpStream`
/// * `remote_address` - Peer address for the session log
/// * `options` - Driver settings
///
/// # Errors
/// [`ConnectionError::Codec`] when the peer sends bytes that cannot be
/// framed. The session is disconnected before the error is returned.
pub async fn run_connection<S>(
    session: Arc<Session>,
    stream: S,
    remote_address: Option<String>,
    options: ConnectionOptions,
) -> Result<(), ConnectionError>
where
    S: AsyncRead + AsyncWrite + Send + 'static,
{
    let id = session.session_id().to_string();
    let max_message_size = session.config().max_message_size;
    let (reader, writer) = tokio::io::split(stream);
    let mut frames = FramedRead::new(
        reader,
        FixCodec::new().with_max_message_size(max_message_size),
    );
    let mut sink = FramedWrite::new(writer, FixCodec::new());

    let (tx, mut rx) = mpsc::unbounded_channel();
    session.set_responder(Arc::new(ChannelResponder {
        tx,
        remote_address: remote_address.clone(),
    }));
    info!(session = %id, remote = ?remote_address, "connection established");

    let mut ticker = tokio::time::interval(options.tick_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let result = loop {
        tokio::select! {
            frame = frames.next() => match frame {
                Some(Ok(data)) => session.next_raw(data).await,
                Some(Err(err)) => {
                    warn!(session = %id, error = %err, "dropping connection");
                    session.disconnect(&format!("Framing error: {err}"), true).await;
                    break Err(err.into());
                }
                None => {
                    session.disconnect("Connection closed by counterparty", false).await;
                    break Ok(());
                }
            },
            outbound = rx.recv() => match outbound {
                Some(Outbound::Data(data)) => {
                    if let Err(err) = sink.send(data).await {
                        warn!(session = %id, error = %err, "write failed");
                        session.disconnect(&format!("Write failed: {err}"), true).await;
                        break Ok(());
                    }
                }
                Some(Outbound::Disconnect) | None => break Ok(()),
            },
            _ = ticker.tick() => session.tick().await,
        }
    };

    // Messages queued before the disconnect, such as a final Logout.
    while let Ok(Outbound::Data(data)) = rx.try_recv() {
        if sink.send(data).await.is_err() {
            break;
        }
    }
    if let Err(err) = sink.close().await {
        debug!(session = %id, error = %err, "close failed");
    }
    info!(session = %id, "connection closed");
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rivetfix_core::message::MsgType;
    use rivetfix_core::tags;
    use rivetfix_core::types::{CompId, FixVersion, TimestampPrecision};
    use rivetfix_session::{SessionConfig, SessionId};
    use rivetfix_store::MemoryStore;
    use rivetfix_tagvalue::Message;
    use tokio::io::AsyncWriteExt;

    async fn acceptor() -> Arc<Session> {
        let id = SessionId::new(
            FixVersion::Fix44,
            CompId::new("SERVER").unwrap(),
            CompId::new("CLIENT").unwrap(),
        );
        let session = Session::builder(SessionConfig::new(id))
            .with_store(Arc::new(MemoryStore::new()))
            .build()
            .await
            .unwrap();
        Arc::new(session)
    }

    fn client_message(msg_type: MsgType, seq: u64) -> Message {
        let mut message = Message::with_type(&msg_type);
        let header = message.header_mut();
        header.set_str(tags::BEGIN_STRING, "FIX.4.4");
        header.set_str(tags::SENDER_COMP_ID, "CLIENT");
        header.set_str(tags::TARGET_COMP_ID, "SERVER");
        header.set_u64(tags::MSG_SEQ_NUM, seq);
        header.set_utc_timestamp(tags::SENDING_TIME, &Utc::now(), TimestampPrecision::Millis);
        message
    }

    fn logon() -> Bytes {
        let mut logon = client_message(MsgType::Logon, 1);
        logon.body_mut().set_u64(tags::ENCRYPT_METHOD, 0);
        logon.body_mut().set_u64(tags::HEART_BT_INT, 30);
        logon.to_bytes().unwrap()
    }

    #[tokio::test]
    async fn test_logon_and_logout_over_stream() {
        let session = acceptor().await;
        let (server, client) = tokio::io::duplex(4096);
        let driver = tokio::spawn(run_connection(
            session.clone(),
            server,
            Some("test-peer".to_string()),
            ConnectionOptions::default(),
        ));

        let (client_read, mut client_write) = tokio::io::split(client);
        let mut replies = FramedRead::new(client_read, FixCodec::new());

        client_write.write_all(&logon()).await.unwrap();
        let reply = replies.next().await.unwrap().unwrap();
        let reply = Message::from_bytes(&reply).unwrap();
        assert_eq!(reply.msg_type_str().unwrap(), "A");
        assert!(session.is_logged_on());

        let logout = client_message(MsgType::Logout, 2).to_bytes().unwrap();
        client_write.write_all(&logout).await.unwrap();
        let reply = replies.next().await.unwrap().unwrap();
        let reply = Message::from_bytes(&reply).unwrap();
        assert_eq!(reply.msg_type_str().unwrap(), "5");

        driver.await.unwrap().unwrap();
        assert!(!session.has_responder());
        assert_eq!(session.expected_target_num(), 3);
    }

    #[tokio::test]
    async fn test_garbage_ends_connection() {
        let session = acceptor().await;
        let (server, mut client) = tokio::io::duplex(4096);
        let driver = tokio::spawn(run_connection(
            session.clone(),
            server,
            None,
            ConnectionOptions::default(),
        ));

        client
            .write_all(b"GET / HTTP/1.1\r\nHost: example\r\n\r\n")
            .await
            .unwrap();
        let result = driver.await.unwrap();
        assert!(matches!(
            result,
            Err(ConnectionError::Codec(CodecError::InvalidBeginString))
        ));
        assert!(!session.has_responder());
    }

    #[tokio::test]
    async fn test_peer_close_disconnects_session() {
        let session = acceptor().await;
        let (server, client) = tokio::io::duplex(4096);
        let driver = tokio::spawn(run_connection(
            session.clone(),
            server,
            None,
            ConnectionOptions::default(),
        ));
        drop(client);

        driver.await.unwrap().unwrap();
        assert!(!session.has_responder());
    }
}
