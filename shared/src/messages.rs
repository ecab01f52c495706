//! Admin protocol spoken between the harness and cluster nodes
//!
//! Messages are bincode-serialized and framed with a u32 big-endian length
//! prefix. The same framing is used by the harness, the shutdown helper,
//! and the fake test nodes.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::errors::WireError;
use crate::types::{NodeStatus, SharedError, ShutdownAck};

/// Upper bound on a single admin frame; these messages are tiny
pub const MAX_FRAME_LEN: usize = 64 * 1024;

/// Command sent to a node's admin endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AdminRequest {
    /// Cheap liveness probe; also reports the node's current role
    Status,
    /// Ask the node to shut itself down
    Shutdown { force: bool },
}

/// Reply a node sends back on its admin connection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AdminResponse {
    Status(NodeStatus),
    ShutdownAck(ShutdownAck),
    /// The node understood the command but refused it
    Rejected(SharedError),
}

/// Write one length-prefixed bincode frame
pub async fn write_frame<W, T>(writer: &mut W, message: &T) -> Result<(), WireError>
where
    W: AsyncWrite + Unpin,
    T: Serialize,
{
    let data = bincode::serialize(message)?;
    if data.len() > MAX_FRAME_LEN {
        return Err(WireError::FrameTooLarge(data.len()));
    }
    writer.write_all(&(data.len() as u32).to_be_bytes()).await?;
    writer.write_all(&data).await?;
    writer.flush().await?;
    Ok(())
}

/// Read one length-prefixed bincode frame
pub async fn read_frame<R, T>(reader: &mut R) -> Result<T, WireError>
where
    R: AsyncRead + Unpin,
    T: DeserializeOwned,
{
    let mut len_bytes = [0u8; 4];
    reader.read_exact(&mut len_bytes).await?;
    let len = u32::from_be_bytes(len_bytes) as usize;
    if len > MAX_FRAME_LEN {
        return Err(WireError::FrameTooLarge(len));
    }
    let mut data = vec![0u8; len];
    reader.read_exact(&mut data).await?;
    Ok(bincode::deserialize(&data)?)
}
