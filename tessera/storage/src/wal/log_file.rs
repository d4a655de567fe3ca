// Append-only redo log file.
//
// Log record layout (little-endian):
// ┌────────────┬────────────┬───────────┐
// │ u32 len    │ u32 crc32  │ payload…  │
// └────────────┴────────────┴───────────┘
// - `len`    : number of bytes in payload
// - `crc32`  : checksum of payload for corruption detection
//
use std::fs::{File, OpenOptions};
use std::io::{BufReader, BufWriter, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use tessera_common::error::FrameError;
use tessera_common::frame::{FRAME_HEADER_SIZE, encode_frame, read_frame};
use tracing::warn;

use super::record::RedoEntry;
use crate::error::{StorageResult, WalError};

pub struct WalFile {
    file: BufWriter<File>,
    path: PathBuf,
}

impl WalFile {
    /// Open existing log or create a new one at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> StorageResult<Self> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent).map_err(WalError::Io)?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .read(true)
            .open(&path)
            .map_err(WalError::Io)?;
        file.seek(SeekFrom::End(0)).map_err(WalError::Io)?;
        Ok(Self {
            file: BufWriter::new(file),
            path: path.as_ref().to_path_buf(),
        })
    }

    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append a record and buffer it. Call `flush` to fsync.
    ///
    /// If the write fails, the file is truncated back to where the record started so the log
    /// never ends with a partial record written by this process.
    pub fn append(&mut self, entry: &RedoEntry) -> StorageResult<()> {
        let data = encode_frame(&entry.to_bytes()?);
        let original_pos = self.file.stream_position().map_err(WalError::Io)?;
        if let Err(e) = self.file.write_all(&data) {
            self.file
                .seek(SeekFrom::Start(original_pos))
                .map_err(WalError::Io)?;
            self.file
                .get_ref()
                .set_len(original_pos)
                .map_err(WalError::Io)?;
            return Err(WalError::Io(e).into());
        }
        Ok(())
    }

    /// Flush internal buffer and fsync to guarantee durability.
    pub fn flush(&mut self) -> StorageResult<()> {
        self.file.flush().map_err(WalError::Io)?;
        self.file.get_ref().sync_data().map_err(WalError::Io)?;
        Ok(())
    }

    /// Reads every record from the start of the file.
    ///
    /// A torn record at the tail, left by a crash in the middle of an append, ends the log and
    /// is cut off so later appends follow the last whole record. A checksum mismatch anywhere
    /// is an error.
    pub fn read_all(&mut self) -> StorageResult<Vec<RedoEntry>> {
        self.file.flush().map_err(WalError::Io)?;
        let mut reader = self.file.get_ref().try_clone().map_err(WalError::Io)?;
        reader.seek(SeekFrom::Start(0)).map_err(WalError::Io)?;
        let mut reader = BufReader::new(reader);

        let mut entries = Vec::new();
        let mut valid_len = 0u64;
        loop {
            match read_frame(&mut reader) {
                Ok(Some(payload)) => {
                    valid_len += (FRAME_HEADER_SIZE + payload.len()) as u64;
                    entries.push(RedoEntry::from_bytes(&payload)?);
                }
                Ok(None) | Err(FrameError::Truncated) => break,
                Err(e) => return Err(WalError::from(e).into()),
            }
        }
        let file_len = self.file.get_ref().metadata().map_err(WalError::Io)?.len();
        if valid_len < file_len {
            warn!(path = %self.path.display(), valid_len, "cutting torn record at WAL tail");
            self.file.get_ref().set_len(valid_len).map_err(WalError::Io)?;
        }
        // The cloned handle shares the cursor, so move it back to the end.
        self.file.seek(SeekFrom::End(0)).map_err(WalError::Io)?;
        entries.sort_by_key(|entry| entry.lsn);
        Ok(entries)
    }

    /// Drops every record.
    pub fn clear(&mut self) -> StorageResult<()> {
        self.file.flush().map_err(WalError::Io)?;
        self.file.get_ref().set_len(0).map_err(WalError::Io)?;
        self.file.seek(SeekFrom::Start(0)).map_err(WalError::Io)?;
        self.file.get_ref().sync_all().map_err(WalError::Io)?;
        Ok(())
    }
}
