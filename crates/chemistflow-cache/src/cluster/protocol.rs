//! Peer wire protocol.
//!
//! Frames are sent with a 4-byte length prefix (big-endian u32) followed
//! by the JSON-encoded message:
//!
//! ```text
//! [4-byte length] [JSON data]
//! ```

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use chemistflow_common::error::ClusterError;
use serde::{Deserialize, Serialize};

use super::store::{CacheKind, VersionedEntry};

/// Maximum frame size (16 MB). Domain objects are far smaller; the limit
/// guards the length-prefixed read against hostile or corrupt prefixes.
pub const MAX_FRAME_SIZE: usize = 16 * 1024 * 1024;

/// Messages exchanged between cluster peers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PeerMessage {
    /// Liveness probe.
    Ping,
    Pong,
    /// A node announcing itself; the receiver adds it to its peer set.
    Join { node: String },
    /// Reply to `Join` carrying the receiver's known peers, so the
    /// joiner learns the rest of the cluster from any single seed.
    JoinAck { peers: Vec<String> },
    /// A node leaving gracefully.
    Leave { node: String },
    /// Push one versioned entry to a replica.
    Replicate {
        kind: CacheKind,
        key: i64,
        entry: VersionedEntry,
    },
    ReplicateAck,
    /// Ask a replica for its entry for a key.
    Fetch { kind: CacheKind, key: i64 },
    FetchReply { entry: Option<VersionedEntry> },
}

/// Writes one frame to the stream.
pub async fn send_frame(stream: &mut TcpStream, msg: &PeerMessage) -> Result<(), ClusterError> {
    let data = serde_json::to_vec(msg)?;
    if data.len() > MAX_FRAME_SIZE {
        return Err(ClusterError::FrameTooLarge(data.len(), MAX_FRAME_SIZE));
    }
    let len = data.len() as u32;
    stream.write_all(&len.to_be_bytes()).await?;
    stream.write_all(&data).await?;
    stream.flush().await?;
    Ok(())
}

/// Reads one frame from the stream.
pub async fn recv_frame(stream: &mut TcpStream) -> Result<PeerMessage, ClusterError> {
    let mut len_buf = [0u8; 4];
    stream.read_exact(&mut len_buf).await?;
    let len = u32::from_be_bytes(len_buf) as usize;
    if len > MAX_FRAME_SIZE {
        return Err(ClusterError::FrameTooLarge(len, MAX_FRAME_SIZE));
    }
    let mut buf = vec![0u8; len];
    stream.read_exact(&mut buf).await?;
    Ok(serde_json::from_slice(&buf)?)
}

/// Connects to a peer, honoring the caller's deadline via
/// [`tokio::time::timeout`] at the call site.
pub async fn connect(addr: &str) -> Result<TcpStream, ClusterError> {
    TcpStream::connect(addr)
        .await
        .map_err(|e| ClusterError::Connection(format!("failed to connect to {}: {}", addr, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::store::Version;
    use serde_json::json;
    use tokio::net::TcpListener;

    #[test]
    fn test_message_json_tags() {
        let encoded = serde_json::to_value(PeerMessage::Ping).unwrap();
        assert_eq!(encoded, json!({"type": "ping"}));

        let encoded = serde_json::to_value(PeerMessage::Join {
            node: "127.0.0.1:25520".to_string(),
        })
        .unwrap();
        assert_eq!(encoded, json!({"type": "join", "node": "127.0.0.1:25520"}));
    }

    #[test]
    fn test_replicate_round_trip() {
        let msg = PeerMessage::Replicate {
            kind: CacheKind::ReactionDetails,
            key: 42,
            entry: VersionedEntry {
                value: json!({"reaction": {"reactionId": 42, "reactionName": "R"}}),
                version: Version {
                    counter: 3,
                    node: "127.0.0.1:25520".to_string(),
                },
            },
        };
        let text = serde_json::to_string(&msg).unwrap();
        let back: PeerMessage = serde_json::from_str(&text).unwrap();
        assert_eq!(back, msg);
    }

    #[tokio::test]
    async fn test_frame_round_trip_over_socket() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();

        let server = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let msg = recv_frame(&mut stream).await.unwrap();
            send_frame(&mut stream, &PeerMessage::Pong).await.unwrap();
            msg
        });

        let mut stream = connect(&addr).await.unwrap();
        send_frame(&mut stream, &PeerMessage::Ping).await.unwrap();
        let reply = recv_frame(&mut stream).await.unwrap();

        assert_eq!(reply, PeerMessage::Pong);
        assert_eq!(server.await.unwrap(), PeerMessage::Ping);
    }

    #[tokio::test]
    async fn test_oversized_length_prefix_is_rejected() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();

        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let bogus = (MAX_FRAME_SIZE as u32 + 1).to_be_bytes();
            stream.write_all(&bogus).await.unwrap();
        });

        let mut stream = connect(&addr).await.unwrap();
        let result = recv_frame(&mut stream).await;
        assert!(matches!(result, Err(ClusterError::FrameTooLarge(_, _))));
    }

    #[tokio::test]
    async fn test_connect_refused_maps_to_connection_error() {
        // bind then drop to get a port nothing listens on
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        drop(listener);

        let result = connect(&addr).await;
        assert!(matches!(result, Err(ClusterError::Connection(_))));
    }
}
