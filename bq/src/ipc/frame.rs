//! Line framing shared by both ends of the socket
//!
//! A frame is one JSON document followed by `\n`, at most
//! [`MAX_MESSAGE_SIZE`](super::MAX_MESSAGE_SIZE) bytes including the newline.

use eyre::{Context, Result, bail};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};

use super::MAX_MESSAGE_SIZE;

/// Read one frame and decode it as `T`
///
/// Never buffers more than `MAX_MESSAGE_SIZE + 1` bytes, so an oversized or
/// unterminated peer cannot grow memory without bound.
pub async fn read_frame<T, R>(reader: R) -> Result<T>
where
    T: DeserializeOwned,
    R: AsyncRead + Unpin,
{
    let mut limited = BufReader::new(reader).take(MAX_MESSAGE_SIZE as u64 + 1);
    let mut buf = Vec::new();
    let n = limited.read_until(b'\n', &mut buf).await.context("Failed to read frame")?;

    if n == 0 {
        bail!("Connection closed before a frame arrived");
    }
    if n > MAX_MESSAGE_SIZE {
        bail!("Frame exceeds {} bytes", MAX_MESSAGE_SIZE);
    }

    serde_json::from_slice(buf.trim_ascii()).context("Failed to decode frame")
}

/// Encode `value` and write it as one frame
pub async fn write_frame<T, W>(mut writer: W, value: &T) -> Result<()>
where
    T: Serialize,
    W: AsyncWrite + Unpin,
{
    let mut buf = serde_json::to_vec(value).context("Failed to encode frame")?;
    buf.push(b'\n');
    if buf.len() > MAX_MESSAGE_SIZE {
        bail!("Frame of {} bytes exceeds {} bytes", buf.len(), MAX_MESSAGE_SIZE);
    }

    writer.write_all(&buf).await.context("Failed to write frame")?;
    writer.flush().await.context("Failed to flush frame")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};
    use tokio::io::duplex;

    #[tokio::test]
    async fn test_frame_crosses_a_pipe() {
        let (mut a, mut b) = duplex(1024);
        write_frame(&mut a, &json!({"type": "Ping"})).await.unwrap();
        let got: Value = read_frame(&mut b).await.unwrap();
        assert_eq!(got, json!({"type": "Ping"}));
    }

    #[tokio::test]
    async fn test_oversized_frame_rejected_on_read() {
        let (mut a, mut b) = duplex(MAX_MESSAGE_SIZE * 2);
        let payload = format!("\"{}\"\n", "x".repeat(MAX_MESSAGE_SIZE));
        a.write_all(payload.as_bytes()).await.unwrap();
        drop(a);

        let err = read_frame::<Value, _>(&mut b).await.unwrap_err();
        assert!(err.to_string().contains("exceeds"), "got: {}", err);
    }

    #[tokio::test]
    async fn test_oversized_frame_rejected_on_write() {
        let (mut a, _b) = duplex(16);
        let big = "y".repeat(MAX_MESSAGE_SIZE);
        assert!(write_frame(&mut a, &big).await.is_err());
    }

    #[tokio::test]
    async fn test_closed_peer_is_error() {
        let (a, mut b) = duplex(16);
        drop(a);
        assert!(read_frame::<Value, _>(&mut b).await.is_err());
    }
}
