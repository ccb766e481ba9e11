//! Length-prefixed modified UTF-8 framing.
//!
//! Each request is a big-endian `u16` byte count followed by the string in
//! the modified UTF-8 form produced by Java's `DataOutputStream::writeUTF`:
//! the string is treated as UTF-16 code units, `U+0000` takes two bytes and
//! supplementary characters are written as two three-byte surrogates.

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::FrameError;

/// Largest encoded body a 16-bit prefix can announce
pub const MAX_FRAME_LEN: usize = u16::MAX as usize;

/// Encode a string as modified UTF-8 without the length prefix
pub fn encode(s: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(s.len());
    for unit in s.encode_utf16() {
        match unit {
            0x0001..=0x007F => out.push(unit as u8),
            0x0000 | 0x0080..=0x07FF => {
                out.push(0xC0 | (unit >> 6) as u8);
                out.push(0x80 | (unit & 0x3F) as u8);
            }
            _ => {
                out.push(0xE0 | (unit >> 12) as u8);
                out.push(0x80 | ((unit >> 6) & 0x3F) as u8);
                out.push(0x80 | (unit & 0x3F) as u8);
            }
        }
    }
    out
}

/// Decode a modified UTF-8 body into a string
pub fn decode(bytes: &[u8]) -> Result<String, FrameError> {
    let mut units = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        let lead = bytes[i];
        match lead >> 4 {
            0x0..=0x7 => {
                units.push(u16::from(lead));
                i += 1;
            }
            0xC | 0xD => {
                let b1 = continuation(bytes, i, 1)?;
                units.push((u16::from(lead & 0x1F) << 6) | u16::from(b1 & 0x3F));
                i += 2;
            }
            0xE => {
                let b1 = continuation(bytes, i, 1)?;
                let b2 = continuation(bytes, i, 2)?;
                units.push(
                    (u16::from(lead & 0x0F) << 12)
                        | (u16::from(b1 & 0x3F) << 6)
                        | u16::from(b2 & 0x3F),
                );
                i += 3;
            }
            _ => return Err(FrameError::Malformed { offset: i }),
        }
    }
    String::from_utf16(&units).map_err(|_| FrameError::InvalidUtf16)
}

fn continuation(bytes: &[u8], start: usize, n: usize) -> Result<u8, FrameError> {
    match bytes.get(start + n) {
        Some(&b) if b & 0xC0 == 0x80 => Ok(b),
        Some(_) => Err(FrameError::Malformed { offset: start + n }),
        None => Err(FrameError::Malformed { offset: start }),
    }
}

/// Read exactly one framed string
pub async fn read_frame<R>(reader: &mut R) -> Result<String, FrameError>
where
    R: AsyncRead + Unpin,
{
    let mut prefix = [0u8; 2];
    read_full(reader, &mut prefix).await?;
    let len = usize::from(u16::from_be_bytes(prefix));

    let mut body = vec![0u8; len];
    read_full(reader, &mut body).await?;
    decode(&body)
}

/// Write one framed string and flush it
pub async fn write_frame<W>(writer: &mut W, s: &str) -> Result<(), FrameError>
where
    W: AsyncWrite + Unpin,
{
    let body = encode(s);
    if body.len() > MAX_FRAME_LEN {
        return Err(FrameError::TooLong(body.len()));
    }
    writer.write_all(&(body.len() as u16).to_be_bytes()).await?;
    writer.write_all(&body).await?;
    writer.flush().await?;
    Ok(())
}

/// Like `read_exact`, but reports how far it got when the peer hangs up early
async fn read_full<R>(reader: &mut R, buf: &mut [u8]) -> Result<(), FrameError>
where
    R: AsyncRead + Unpin,
{
    let mut filled = 0;
    while filled < buf.len() {
        let n = reader.read(&mut buf[filled..]).await?;
        if n == 0 {
            return Err(FrameError::Truncated {
                expected: buf.len(),
                received: filled,
            });
        }
        filled += n;
    }
    Ok(())
}
