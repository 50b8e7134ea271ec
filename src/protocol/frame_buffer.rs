//! Frame buffer for accumulating partial reads.
//!
//! Uses `bytes::BytesMut` as an owned arena consumed from the front, so
//! extracting a frame never copies the rest of the buffer.
//!
//! Two framing strategies, chosen per frame:
//! - **Length-delimited**: the header block has a `content-length:<digits>`
//!   line. The body is exactly that many bytes (it may contain `\0`), and the
//!   terminator byte follows it.
//! - **Sentinel-delimited**: the frame ends at the first `\0`.
//!
//! Leading `\n` bytes (keep-alives) are skipped before each frame.
//!
//! # Example
//!
//! ```
//! use stomp_wire_client::protocol::FrameBuffer;
//!
//! let mut buffer = FrameBuffer::new();
//! buffer.append(b"MESSAGE1\n\nBODY1\n\0MESSAGE2\n\nBO");
//!
//! assert!(buffer.contains_complete_frame());
//! let frame = buffer.extract_next_frame().unwrap().unwrap();
//! assert_eq!(&frame[..], b"MESSAGE1\n\nBODY1\n");
//!
//! assert!(!buffer.contains_complete_frame());
//! assert!(buffer.extract_next_frame().unwrap().is_none());
//! ```

use bytes::{Buf, Bytes, BytesMut};

use super::wire_format::{declared_content_length, HEADER_SEPARATOR, NEWLINE, NULL_BYTE};
use crate::error::{Result, StompError};

/// Default initial capacity of the read arena.
pub const DEFAULT_BUFFER_CAPACITY: usize = 8 * 1024;

/// Where the next complete frame ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Framing {
    /// Frame is `len` bytes, then one terminator byte.
    Length { len: usize },
    /// Frame ends at the `\0` at `nul`.
    Sentinel { nul: usize },
    /// Declared `content-length` overflows the address space.
    Invalid { content_length: usize },
}

/// Progress of the boundary scan over the next frame.
///
/// Offsets other than `pos` and `skip` are relative to the frame start,
/// after the leading newlines.
#[derive(Debug, Clone, Copy, Default)]
struct Scan {
    /// Leading newlines before the frame.
    skip: usize,
    /// A byte other than `\n` has been seen.
    started: bool,
    /// Next unexamined buffer index.
    pos: usize,
    /// Header separator offset.
    sep: Option<usize>,
    /// Frame length declared by `content-length`.
    declared: Option<usize>,
    located: Option<Framing>,
}

/// Buffer for accumulating incoming bytes and extracting complete frames.
///
/// The boundary scan resumes where the previous append left off, so a frame
/// arriving in many small reads is examined once.
pub struct FrameBuffer {
    /// Accumulated bytes from socket reads.
    buffer: BytesMut,
    scan: Scan,
}

impl FrameBuffer {
    /// Create a new frame buffer with default capacity.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_BUFFER_CAPACITY)
    }

    /// Create a new frame buffer with a custom initial capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: BytesMut::with_capacity(capacity),
            scan: Scan::default(),
        }
    }

    /// Append raw bytes. Nothing is consumed; only the boundary scan advances.
    pub fn append(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
        self.advance_scan();
    }

    /// Whether a complete frame is buffered.
    ///
    /// Never consumes anything; repeated calls give the same answer. A frame
    /// whose declared length can't be represented also counts, so that
    /// [`extract_next_frame`](Self::extract_next_frame) reports it.
    pub fn contains_complete_frame(&self) -> bool {
        self.scan.located.is_some()
    }

    /// Remove and return the next complete frame without its terminator.
    ///
    /// Returns `Ok(None)` if no complete frame is buffered.
    ///
    /// # Errors
    ///
    /// Returns a protocol error when the declared `content-length` is wrong:
    /// the byte after the body is not the `\0` terminator, or the length
    /// overflows. The buffer can't be resynchronized after that.
    pub fn extract_next_frame(&mut self) -> Result<Option<Bytes>> {
        let Some(framing) = self.scan.located else {
            return Ok(None);
        };
        let skip = self.scan.skip;

        let frame = match framing {
            Framing::Invalid { content_length } => {
                return Err(StompError::protocol(format!(
                    "Declared content-length {content_length} is out of range"
                )));
            }
            Framing::Length { len } => {
                let terminator = self.buffer[skip + len];
                if terminator != NULL_BYTE {
                    return Err(StompError::protocol(format!(
                        "Frame terminator missing after declared content-length (found byte 0x{terminator:02X})"
                    )));
                }
                self.buffer.advance(skip);
                self.buffer.split_to(len).freeze()
            }
            Framing::Sentinel { nul } => {
                self.buffer.advance(skip);
                self.buffer.split_to(nul).freeze()
            }
        };

        // The terminator
        self.buffer.advance(1);

        self.scan = Scan::default();
        self.advance_scan();

        Ok(Some(frame))
    }

    /// Append data and extract every complete frame.
    ///
    /// Convenience for callers that don't interleave reads and extraction.
    pub fn push(&mut self, data: &[u8]) -> Result<Vec<Bytes>> {
        self.append(data);

        let mut frames = Vec::new();
        while let Some(frame) = self.extract_next_frame()? {
            frames.push(frame);
        }
        Ok(frames)
    }

    /// Examine bytes not seen yet and locate the next frame end, if any.
    fn advance_scan(&mut self) {
        let scan = &mut self.scan;
        let buf = &self.buffer[..];
        if scan.located.is_some() {
            return;
        }

        while !scan.started && scan.pos < buf.len() {
            if buf[scan.pos] == NEWLINE {
                scan.pos += 1;
                scan.skip = scan.pos;
            } else {
                scan.started = true;
            }
        }

        // Header block: ends at the blank line, or at a `\0` before it.
        while scan.started && scan.sep.is_none() && scan.pos < buf.len() {
            let i = scan.pos;
            match buf[i] {
                NULL_BYTE => {
                    scan.located = Some(Framing::Sentinel { nul: i - scan.skip });
                    return;
                }
                NEWLINE if i > scan.skip && buf[i - 1] == NEWLINE => {
                    let sep = i - 1 - scan.skip;
                    scan.sep = Some(sep);
                    if let Some(content_length) =
                        declared_content_length(&buf[scan.skip..scan.skip + sep])
                    {
                        match sep
                            .checked_add(HEADER_SEPARATOR.len())
                            .and_then(|n| n.checked_add(content_length))
                        {
                            Some(len) => scan.declared = Some(len),
                            None => {
                                scan.located = Some(Framing::Invalid { content_length });
                                return;
                            }
                        }
                    }
                }
                _ => {}
            }
            scan.pos += 1;
        }

        if scan.sep.is_none() {
            return;
        }

        match scan.declared {
            // Body plus its terminator byte must both be here.
            Some(len) => {
                if buf.len() - scan.skip > len {
                    scan.located = Some(Framing::Length { len });
                }
            }
            None => match buf[scan.pos..].iter().position(|&b| b == NULL_BYTE) {
                Some(offset) => {
                    scan.located = Some(Framing::Sentinel {
                        nul: scan.pos + offset - scan.skip,
                    });
                }
                None => scan.pos = buf.len(),
            },
        }
    }

    /// Buffered bytes, unconsumed.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer
    }

    /// Get the number of buffered bytes.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Check if the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Drop everything buffered.
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.scan = Scan::default();
    }
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{Command, Frame};

    fn extract_all(buffer: &mut FrameBuffer) -> Vec<Bytes> {
        let mut frames = Vec::new();
        while buffer.contains_complete_frame() {
            frames.push(buffer.extract_next_frame().unwrap().unwrap());
        }
        frames
    }

    #[test]
    fn test_append_does_not_parse() {
        let mut buffer = FrameBuffer::new();
        assert!(buffer.is_empty());

        buffer.append(b"MESSAGE\n\n");
        assert_eq!(buffer.as_bytes(), b"MESSAGE\n\n");

        buffer.append(b"Body\n");
        assert_eq!(buffer.as_bytes(), b"MESSAGE\n\nBody\n");

        buffer.append(b"\0MESSAGE2\0");
        assert_eq!(buffer.as_bytes(), b"MESSAGE\n\nBody\n\0MESSAGE2\0");
    }

    #[test]
    fn test_contains_complete_frame_waits_for_terminator() {
        let mut buffer = FrameBuffer::new();
        assert!(!buffer.contains_complete_frame());

        buffer.append(b"MESSAGE\n\n");
        assert!(!buffer.contains_complete_frame());

        buffer.append(b"Body\n");
        assert!(!buffer.contains_complete_frame());

        buffer.append(b"\0MESSAGE2\0");
        assert!(buffer.contains_complete_frame());
    }

    #[test]
    fn test_sentinel_frames_extracted_in_order() {
        let mut buffer = FrameBuffer::new();
        buffer.append(b"MESSAGE1\n\nBODY1\n\0");
        buffer.append(b"MESSAGE2\n\nBODY2\n\0");
        buffer.append(b"MESSAGE3\n\nBODY3\n\0");

        let first = buffer.extract_next_frame().unwrap().unwrap();
        assert_eq!(&first[..], b"MESSAGE1\n\nBODY1\n");
        assert_eq!(buffer.as_bytes(), b"MESSAGE2\n\nBODY2\n\0MESSAGE3\n\nBODY3\n\0");

        let second = buffer.extract_next_frame().unwrap().unwrap();
        assert_eq!(&second[..], b"MESSAGE2\n\nBODY2\n");
        assert_eq!(buffer.as_bytes(), b"MESSAGE3\n\nBODY3\n\0");

        let third = buffer.extract_next_frame().unwrap().unwrap();
        assert_eq!(&third[..], b"MESSAGE3\n\nBODY3\n");
        assert!(buffer.is_empty());

        // Refill after draining
        buffer.append(b"MESSAGE4\n\nBODY4\n\0");
        let fourth = buffer.extract_next_frame().unwrap().unwrap();
        assert_eq!(&fourth[..], b"MESSAGE4\n\nBODY4\n");
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_two_sentinel_frames_leave_empty_buffer() {
        let mut buffer = FrameBuffer::new();
        buffer.append(b"MESSAGE1\n\nBODY1\n\0MESSAGE2\n\nBODY2\n\0");

        let frames = extract_all(&mut buffer);
        assert_eq!(frames.len(), 2);
        assert_eq!(&frames[0][..], b"MESSAGE1\n\nBODY1\n");
        assert_eq!(&frames[1][..], b"MESSAGE2\n\nBODY2\n");
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_empty_buffer_extraction() {
        let mut buffer = FrameBuffer::new();
        assert!(buffer.extract_next_frame().unwrap().is_none());

        buffer.append(b"");
        assert!(buffer.extract_next_frame().unwrap().is_none());
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_leading_newlines_skipped() {
        let mut buffer = FrameBuffer::new();
        buffer.append(b"\n\n\nMESSAGE\n\nhi\0\n");

        let frame = buffer.extract_next_frame().unwrap().unwrap();
        assert_eq!(&frame[..], b"MESSAGE\n\nhi");
        assert_eq!(buffer.as_bytes(), b"\n");
        assert!(!buffer.contains_complete_frame());
    }

    #[test]
    fn test_length_delimited_body_with_embedded_nul() {
        let mut buffer = FrameBuffer::new();
        buffer.append(b"MESSAGE\ncontent-length:8\n\nab\0cd\0ef\0");

        assert!(buffer.contains_complete_frame());
        let frame = buffer.extract_next_frame().unwrap().unwrap();
        assert_eq!(&frame[..], b"MESSAGE\ncontent-length:8\n\nab\0cd\0ef");
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_length_delimited_split_at_every_offset() {
        let frame = Frame::new(Command::Message)
            .with_header("message-id", "1")
            .with_body(&b"\0\x01binary\0\n\n"[..])
            .with_content_length();
        let bytes = frame.encode();

        for split in 1..bytes.len() {
            let mut buffer = FrameBuffer::new();
            buffer.append(&bytes[..split]);
            assert!(
                !buffer.contains_complete_frame(),
                "complete with only {split} of {} bytes",
                bytes.len()
            );

            buffer.append(&bytes[split..]);
            let frames = extract_all(&mut buffer);
            assert_eq!(frames.len(), 1, "split at {split}");
            assert_eq!(&frames[0][..], &bytes[..bytes.len() - 1]);
            assert!(buffer.is_empty());
        }
    }

    #[test]
    fn test_contains_complete_frame_is_idempotent() {
        let mut buffer = FrameBuffer::new();
        buffer.append(b"\nMESSAGE\ncontent-length:3\n\na\0b\0RECEIPT\n\n\0");
        let snapshot = buffer.as_bytes().to_vec();

        for _ in 0..5 {
            assert!(buffer.contains_complete_frame());
            assert_eq!(buffer.as_bytes(), &snapshot[..]);
        }

        let frames = extract_all(&mut buffer);
        assert_eq!(frames.len(), 2);
        for _ in 0..5 {
            assert!(!buffer.contains_complete_frame());
        }
    }

    #[test]
    fn test_chunk_boundary_independence() {
        let mut stream = Vec::new();
        stream.extend_from_slice(b"\n\n");
        stream.extend(
            Frame::new(Command::Message)
                .with_header("foo", "meta")
                .with_body(&b"lorem ipsum \n\n \0 dolore sitamet"[..])
                .with_content_length()
                .encode(),
        );
        stream.extend_from_slice(b"\n\n\n");
        stream.extend_from_slice(b"MESSAGE\ndestination:/queue/a\n\nplain text\n\0");
        stream.extend(
            Frame::new(Command::Message)
                .with_header("beta", "treu")
                .with_header("mod", "")
                .with_body(&b"lorem forem \n\n, none \0"[..])
                .with_content_length()
                .encode(),
        );
        stream.extend_from_slice(b"RECEIPT\nreceipt-id:77\n\n\0\n");

        let mut whole = FrameBuffer::new();
        whole.append(&stream);
        let expected = extract_all(&mut whole);
        assert_eq!(expected.len(), 4);

        for chunk_size in 1..=stream.len() {
            let mut buffer = FrameBuffer::new();
            let mut frames = Vec::new();
            for chunk in stream.chunks(chunk_size) {
                buffer.append(chunk);
                frames.extend(extract_all(&mut buffer));
            }
            assert_eq!(frames, expected, "chunk size {chunk_size}");
        }
    }

    #[test]
    fn test_mixed_complete_and_partial() {
        let mut buffer = FrameBuffer::new();

        let frames = buffer
            .push(b"MESSAGE\n\nfirst\0MESSAGE\ncontent-length:6\n\nsec")
            .unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(&frames[0][..], b"MESSAGE\n\nfirst");

        let frames = buffer.push(b"ond\0").unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(&frames[0][..], b"MESSAGE\ncontent-length:6\n\nsecond");
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_content_length_too_short_is_fatal() {
        let mut buffer = FrameBuffer::new();
        // Declares 3 bytes, sends 5
        buffer.append(b"MESSAGE\ncontent-length:3\n\nabcde\0");

        assert!(buffer.contains_complete_frame());
        let err = buffer.extract_next_frame().unwrap_err();
        assert!(err.to_string().contains("content-length"));
    }

    #[test]
    fn test_content_length_overflow_is_fatal() {
        let mut buffer = FrameBuffer::new();
        buffer.append(format!("MESSAGE\ncontent-length:{}\n\nx\0", usize::MAX).as_bytes());

        // Reported, not waited for
        assert!(buffer.contains_complete_frame());
        assert!(buffer.contains_complete_frame());

        let err = buffer.extract_next_frame().unwrap_err();
        assert!(err.to_string().contains("out of range"));

        // Still reported on the next attempt
        assert!(buffer.extract_next_frame().is_err());
    }

    #[test]
    fn test_scan_resumes_across_appends() {
        let body = vec![b'x'; 64 * 1024];
        let bytes = Frame::new(Command::Message).with_body(body.clone()).encode();

        let mut buffer = FrameBuffer::new();
        buffer.append(b"\n\n");
        for chunk in bytes.chunks(16) {
            assert!(!buffer.contains_complete_frame());
            buffer.append(chunk);
        }
        buffer.append(b"MESSAGE\n\nnext");

        let frames = extract_all(&mut buffer);
        assert_eq!(frames.len(), 1);
        assert_eq!(Frame::decode(&frames[0]).unwrap().body(), &body[..]);

        // The remainder is rescanned from its own start
        assert_eq!(buffer.as_bytes(), b"MESSAGE\n\nnext");
        buffer.append(b"\0");
        assert_eq!(&buffer.extract_next_frame().unwrap().unwrap()[..], b"MESSAGE\n\nnext");
    }

    #[test]
    fn test_nul_before_separator_is_sentinel_frame() {
        let mut buffer = FrameBuffer::new();
        buffer.append(b"RECEIPT\nreceipt-id:1\0MESSAGE\ncontent-length:2\n\nok\0");

        let frames = extract_all(&mut buffer);
        assert_eq!(frames.len(), 2);
        assert_eq!(&frames[0][..], b"RECEIPT\nreceipt-id:1");
        assert_eq!(&frames[1][..], b"MESSAGE\ncontent-length:2\n\nok");
    }

    #[test]
    fn test_content_length_in_body_is_ignored() {
        let mut buffer = FrameBuffer::new();
        buffer.append(b"MESSAGE\n\ncontent-length:100\0");

        let frame = buffer.extract_next_frame().unwrap().unwrap();
        assert_eq!(&frame[..], b"MESSAGE\n\ncontent-length:100");
    }

    #[test]
    fn test_large_length_delimited_body() {
        let body = vec![0u8; 256 * 1024];
        let bytes = Frame::new(Command::Message)
            .with_body(body.clone())
            .with_content_length()
            .encode();

        let mut buffer = FrameBuffer::new();
        let mut frames = Vec::new();
        for chunk in bytes.chunks(1024) {
            frames.extend(buffer.push(chunk).unwrap());
        }

        assert_eq!(frames.len(), 1);
        let decoded = Frame::decode(&frames[0]).unwrap();
        assert_eq!(decoded.body(), &body[..]);
    }

    #[test]
    fn test_clear() {
        let mut buffer = FrameBuffer::new();
        buffer.append(b"MESSAGE\n\npartial");
        assert_eq!(buffer.len(), 16);

        buffer.clear();
        assert!(buffer.is_empty());
        assert!(!buffer.contains_complete_frame());
    }
}
