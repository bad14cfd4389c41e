//! zlib-stream transport compression
//!
//! With `compress=zlib-stream` the server sends one zlib stream for the
//! whole connection, split over binary frames. A message is complete when
//! the accumulated bytes end with the sync-flush marker; the inflater keeps
//! its dictionary across messages, so one decoder lives per connection.

use flate2::{Decompress, FlushDecompress, Status};

/// Sync-flush marker terminating every complete message
pub const ZLIB_SUFFIX: [u8; 4] = [0x00, 0x00, 0xFF, 0xFF];

/// Initial output buffer size relative to the compressed input
const INFLATE_RATIO: usize = 4;

/// Errors while inflating a message
#[derive(Debug, thiserror::Error)]
pub enum CompressionError {
    #[error("inflate failed: {0}")]
    Inflate(#[from] flate2::DecompressError),

    #[error("inflated message is not UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("inflater made no progress")]
    Stalled,
}

/// Per-connection zlib-stream decoder
pub struct ZlibStreamDecoder {
    inflater: Decompress,
    pending: Vec<u8>,
}

impl ZlibStreamDecoder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inflater: Decompress::new(true),
            pending: Vec::new(),
        }
    }

    /// Feed one binary frame; returns the message text once complete
    ///
    /// # Errors
    /// Returns an error if the stream is corrupt
    pub fn push(&mut self, chunk: &[u8]) -> Result<Option<String>, CompressionError> {
        self.pending.extend_from_slice(chunk);
        if !self.pending.ends_with(&ZLIB_SUFFIX) {
            return Ok(None);
        }

        let input = std::mem::take(&mut self.pending);
        let inflated = self.inflate(&input)?;
        Ok(Some(String::from_utf8(inflated)?))
    }

    fn inflate(&mut self, mut input: &[u8]) -> Result<Vec<u8>, CompressionError> {
        let mut out = Vec::with_capacity(input.len().saturating_mul(INFLATE_RATIO).max(1024));

        loop {
            let in_before = self.inflater.total_in();
            let out_before = out.len();

            let status = self
                .inflater
                .decompress_vec(input, &mut out, FlushDecompress::Sync)?;

            let consumed = usize::try_from(self.inflater.total_in() - in_before)
                .unwrap_or(input.len())
                .min(input.len());
            input = &input[consumed..];

            let output_full = out.len() == out.capacity();
            if status == Status::StreamEnd || (input.is_empty() && !output_full) {
                return Ok(out);
            }
            if consumed == 0 && out.len() == out_before && !output_full {
                return Err(CompressionError::Stalled);
            }
            if output_full {
                out.reserve(out.capacity());
            }
        }
    }
}

impl Default for ZlibStreamDecoder {
    fn default() -> Self {
        Self::new()
    }
}
