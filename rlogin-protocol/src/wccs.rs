//! Window-change control sequence (WCCS) encoding.
//!
//! The WCCS is the fixed 12-byte in-band message a client sends to tell the
//! server its terminal size (RFC 1282, "Window Size Changes"): a 4-byte
//! magic cookie followed by rows, columns, and the pixel dimensions, each as
//! a 16-bit little-endian unsigned integer.

use crate::io::RloginOutStream;
use rlogin_common::WindowSize;
use tokio::io::AsyncWrite;

/// The magic cookie opening every window-change control sequence.
pub const WCCS_MAGIC: [u8; 4] = [0xFF, 0xFF, 0x73, 0x73];

/// Total length of an encoded window-change control sequence.
pub const WCCS_LEN: usize = 12;

/// Encode a window-change control sequence for the given terminal size.
pub fn encode_window_change(size: WindowSize) -> [u8; WCCS_LEN] {
    let mut seq = [0u8; WCCS_LEN];
    seq[..4].copy_from_slice(&WCCS_MAGIC);
    seq[4..6].copy_from_slice(&size.rows.to_le_bytes());
    seq[6..8].copy_from_slice(&size.columns.to_le_bytes());
    seq[8..10].copy_from_slice(&size.pixels_x.to_le_bytes());
    seq[10..12].copy_from_slice(&size.pixels_y.to_le_bytes());
    seq
}

/// Write a window-change control sequence and flush.
///
/// # Errors
///
/// Returns an error if the underlying write fails.
pub async fn write_window_change<W: AsyncWrite + Unpin>(
    outstream: &mut RloginOutStream<W>,
    size: WindowSize,
) -> std::io::Result<()> {
    outstream.write_bytes(&WCCS_MAGIC);
    outstream.write_u16_le(size.rows);
    outstream.write_u16_le(size.columns);
    outstream.write_u16_le(size.pixels_x);
    outstream.write_u16_le(size.pixels_y);
    outstream.flush().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::RloginInStream;

    #[test]
    fn test_encode_default_geometry() {
        let seq = encode_window_change(WindowSize::new(24, 80, 640, 480));
        assert_eq!(
            seq,
            [0xFF, 0xFF, 0x73, 0x73, 0x18, 0x00, 0x50, 0x00, 0x80, 0x02, 0xE0, 0x01]
        );
    }

    #[test]
    fn test_fields_are_little_endian() {
        let seq = encode_window_change(WindowSize::new(0x0102, 0x0304, 0x0506, 0x0708));
        assert_eq!(&seq[4..], &[0x02, 0x01, 0x04, 0x03, 0x06, 0x05, 0x08, 0x07]);
    }

    #[tokio::test]
    async fn test_write_window_change_matches_encode() {
        let (client, server) = tokio::io::duplex(64);
        let mut output = RloginOutStream::new(client);
        let mut input = RloginInStream::new(server);

        let size = WindowSize::new(50, 132, 1280, 1024);
        write_window_change(&mut output, size).await.unwrap();

        let chunk = input.read_chunk().await.unwrap().unwrap();
        assert_eq!(&chunk[..], &encode_window_change(size));
    }
}
