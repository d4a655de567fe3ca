//! Checksummed single-frame files.
//!
//! Snapshot files hold exactly one frame (little-endian):
//! ┌────────────┬────────────┬───────────┐
//! │ u32 len    │ u32 crc32  │ payload…  │
//! └────────────┴────────────┴───────────┘
//! Writes go to a sibling temporary file that is renamed over the target, so a reader never
//! observes a half-written snapshot.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use crc32fast::Hasher;

use crate::error::{FrameError, FrameResult};

pub const FRAME_HEADER_SIZE: usize = 8;

pub fn checksum(payload: &[u8]) -> u32 {
    let mut hasher = Hasher::new();
    hasher.update(payload);
    hasher.finalize()
}

/// Encodes `payload` as `[len][crc32][payload]`.
pub fn encode_frame(payload: &[u8]) -> Vec<u8> {
    let mut data = Vec::with_capacity(FRAME_HEADER_SIZE + payload.len());
    data.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    data.extend_from_slice(&checksum(payload).to_le_bytes());
    data.extend_from_slice(payload);
    data
}

/// Reads one frame from `reader` and verifies its checksum.
///
/// Returns `Ok(None)` on a clean end of input before the header.
pub fn read_frame<R: Read>(reader: &mut R) -> FrameResult<Option<Vec<u8>>> {
    let mut header = [0u8; FRAME_HEADER_SIZE];
    if let Err(e) = reader.read_exact(&mut header) {
        if e.kind() == std::io::ErrorKind::UnexpectedEof {
            return Ok(None);
        }
        return Err(FrameError::Io(e));
    }
    let (len_bytes, checksum_bytes) = header.split_at(4);
    let len = u32::from_le_bytes(len_bytes.try_into().map_err(|_| FrameError::Truncated)?);
    let expected = u32::from_le_bytes(
        checksum_bytes
            .try_into()
            .map_err(|_| FrameError::Truncated)?,
    );

    let mut payload = vec![0u8; len as usize];
    reader.read_exact(&mut payload).map_err(|e| {
        if e.kind() == std::io::ErrorKind::UnexpectedEof {
            FrameError::Truncated
        } else {
            FrameError::Io(e)
        }
    })?;
    if checksum(&payload) != expected {
        return Err(FrameError::ChecksumMismatch);
    }
    Ok(Some(payload))
}

/// Atomically replaces `path` with a single frame holding `payload`.
pub fn write_frame_file(path: &Path, payload: &[u8]) -> FrameResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let tmp_path = path.with_extension("tmp");
    {
        let mut writer = BufWriter::new(File::create(&tmp_path)?);
        writer.write_all(&encode_frame(payload))?;
        writer.flush()?;
        writer.get_ref().sync_all()?;
    }
    fs::rename(&tmp_path, path)?;
    Ok(())
}

/// Reads the single frame stored in `path`.
pub fn read_frame_file(path: &Path) -> FrameResult<Vec<u8>> {
    let mut reader = BufReader::new(File::open(path)?);
    read_frame(&mut reader)?.ok_or(FrameError::Truncated)
}
