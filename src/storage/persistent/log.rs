//! Append-only record log.
//!
//! Every inserted row is framed, appended and (optionally) fsynced before the
//! insert is acknowledged. Opening the log replays all frames. A frame cut
//! short by a crash mid-write is dropped and the file is trimmed back to the
//! last complete frame. Anything else aborts the open and leaves the file
//! untouched: a checksum failure, a header from another version, or an
//! incomplete frame that is too large to be a row or is followed by
//! complete frames (a damaged length field).
//!
//! # File Format
//! ```text
//! [MAGIC: 4 bytes][VERSION: 1 byte]
//! [FRAME 1: RecordRow]
//! [FRAME 2: RecordRow]
//! ...
//! ```

use std::fs::{File, OpenOptions};
use std::io::{
    BufReader, BufWriter, Error as IoError, ErrorKind, Read, Result as IoResult, Seek, SeekFrom,
    Write,
};
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::storage::RecordRow;

use super::codec;

/// Allowance for the non-history columns of a row and its JSON keys.
const ROW_SLACK_BYTES: u64 = 16 * 1024;

/// Largest frame a single insert can leave behind. `history_data` is
/// embedded as a JSON string, so escaping can double it.
fn max_frame_bytes(max_history_bytes: usize) -> u64 {
    (codec::FRAME_OVERHEAD as u64)
        .saturating_add((max_history_bytes as u64).saturating_mul(2))
        .saturating_add(ROW_SLACK_BYTES)
}

fn invalid(message: String) -> IoError {
    IoError::new(ErrorKind::InvalidData, message)
}

/// Outcome of replaying an existing log.
#[derive(Debug, Default)]
pub struct Replay {
    /// Rows in the order they were appended.
    pub rows: Vec<RecordRow>,
    /// Bytes discarded from an incomplete trailing frame.
    pub trimmed_bytes: u64,
}

/// Durable, append-only sequence of [`RecordRow`] frames.
#[derive(Debug)]
pub struct RecordLog {
    path: PathBuf,
    writer: BufWriter<File>,
    sync_on_write: bool,
    frames: u64,
}

impl RecordLog {
    /// Open or create the log at `path`, replaying its contents.
    ///
    /// `max_history_bytes` bounds how large a torn final frame can be.
    pub fn open(path: &Path, sync_on_write: bool, max_history_bytes: usize) -> IoResult<(Self, Replay)> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;

        let replay = if file.metadata()?.len() < codec::HEADER_LEN {
            // Fresh file, or a crash before the header was complete
            file.set_len(0)?;
            let mut file = &file;
            codec::write_header(&mut file)?;
            if sync_on_write {
                file.sync_all()?;
            }
            Replay::default()
        } else {
            Self::replay(&file, max_frame_bytes(max_history_bytes))?
        };

        let frames = replay.rows.len() as u64;
        let writer = BufWriter::new(OpenOptions::new().append(true).open(path)?);

        Ok((
            Self {
                path: path.to_path_buf(),
                writer,
                sync_on_write,
                frames,
            },
            replay,
        ))
    }

    fn replay(file: &File, max_frame: u64) -> IoResult<Replay> {
        let file_size = file.metadata()?.len();
        let mut reader = BufReader::new(file);
        let version = codec::read_header(&mut reader)?;
        if version != codec::CODEC_VERSION {
            return Err(invalid(format!(
                "unsupported record log version: {version} (expected {})",
                codec::CODEC_VERSION
            )));
        }

        let mut replay = Replay::default();
        loop {
            let offset = reader.stream_position()?;
            if offset >= file_size {
                break;
            }

            match codec::decode_frame::<RecordRow>(&mut reader) {
                Ok(row) => replay.rows.push(row),
                Err(e) if e.kind() == ErrorKind::UnexpectedEof => {
                    Self::check_torn_tail(&mut reader, offset, file_size, max_frame)?;
                    replay.trimmed_bytes = file_size - offset;
                    warn!(
                        offset,
                        trimmed_bytes = replay.trimmed_bytes,
                        "record log ends in an incomplete frame, trimming"
                    );
                    file.set_len(offset)?;
                    file.sync_all()?;
                    break;
                }
                Err(e) => return Err(e),
            }
        }

        Ok(replay)
    }

    /// Accepts the bytes from `offset` to the end as the remains of one
    /// interrupted append, or fails with `InvalidData`.
    fn check_torn_tail(
        reader: &mut BufReader<&File>,
        offset: u64,
        file_size: u64,
        max_frame: u64,
    ) -> IoResult<()> {
        let tail_len = file_size - offset;
        if tail_len > max_frame {
            return Err(invalid(format!(
                "incomplete frame at offset {offset} spans {tail_len} bytes, more than any row (max {max_frame})"
            )));
        }

        reader.seek(SeekFrom::Start(offset))?;
        let mut tail = Vec::new();
        reader.read_to_end(&mut tail)?;

        if let Some(next) = (1..tail.len()).find(|&i| codec::starts_with_frame(&tail[i..])) {
            return Err(invalid(format!(
                "frame at offset {offset} is damaged: a complete frame follows at offset {}",
                offset + next as u64
            )));
        }
        Ok(())
    }

    /// Append a row. The row is durable once this returns if `sync_on_write` is set.
    pub fn append(&mut self, row: &RecordRow) -> IoResult<()> {
        let frame = codec::encode_frame(row)?;
        self.writer.write_all(&frame)?;
        self.writer.flush()?;
        if self.sync_on_write {
            self.writer.get_ref().sync_all()?;
        }
        self.frames += 1;
        Ok(())
    }

    /// Number of frames in the log.
    #[must_use]
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Size of the log file in bytes.
    pub fn size_bytes(&self) -> IoResult<u64> {
        Ok(std::fs::metadata(&self.path)?.len())
    }

    /// Path of the log file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tempfile::tempdir;

    use crate::storage::SubmissionId;

    const LIMIT: usize = 64 * 1024;

    fn row(user: &str) -> RecordRow {
        RecordRow {
            id: SubmissionId::new(),
            user_name: user.to_string(),
            answer: "Dehydration".to_string(),
            history_data: Some("[]".to_string()),
            submit_time: Utc::now(),
        }
    }

    #[test]
    fn test_append_and_replay() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("records.log");

        let written = vec![row("a"), row("b")];
        {
            let (mut log, replay) = RecordLog::open(&path, false, LIMIT).unwrap();
            assert!(replay.rows.is_empty());
            for r in &written {
                log.append(r).unwrap();
            }
            assert_eq!(log.frames(), 2);
        }

        let (log, replay) = RecordLog::open(&path, false, LIMIT).unwrap();
        assert_eq!(replay.rows, written);
        assert_eq!(replay.trimmed_bytes, 0);
        assert_eq!(log.frames(), 2);
    }

    #[test]
    fn test_incomplete_tail_is_trimmed() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("records.log");

        let first = row("kept");
        let good_len;
        {
            let (mut log, _) = RecordLog::open(&path, true, LIMIT).unwrap();
            log.append(&first).unwrap();
            good_len = log.size_bytes().unwrap();
            log.append(&row("lost")).unwrap();
        }

        let full = std::fs::metadata(&path).unwrap().len();
        let file = OpenOptions::new().write(true).open(&path).unwrap();
        file.set_len(full - 4).unwrap();
        drop(file);

        let (mut log, replay) = RecordLog::open(&path, true, LIMIT).unwrap();
        assert_eq!(replay.rows, vec![first]);
        assert_eq!(replay.trimmed_bytes, full - 4 - good_len);
        assert_eq!(log.size_bytes().unwrap(), good_len);

        // Appends after trimming land on a clean frame boundary
        let next = row("next");
        log.append(&next).unwrap();
        drop(log);
        let (_, replay) = RecordLog::open(&path, true, LIMIT).unwrap();
        assert_eq!(replay.rows.len(), 2);
        assert_eq!(replay.rows[1], next);
    }

    #[test]
    fn test_damaged_length_fails_instead_of_trimming() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("records.log");
        {
            let (mut log, _) = RecordLog::open(&path, true, LIMIT).unwrap();
            for name in ["a", "b", "c"] {
                log.append(&row(name)).unwrap();
            }
        }

        // Third byte of the first frame's length field
        let mut bytes = std::fs::read(&path).unwrap();
        let before = bytes.len() as u64;
        bytes[codec::HEADER_LEN as usize + 3] ^= 0xFF;
        std::fs::write(&path, &bytes).unwrap();

        let err = RecordLog::open(&path, true, LIMIT).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidData);
        assert!(err.to_string().contains("damaged"));
        assert_eq!(std::fs::metadata(&path).unwrap().len(), before);
    }

    #[test]
    fn test_oversized_incomplete_tail_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("records.log");
        drop(RecordLog::open(&path, true, LIMIT).unwrap());

        // A frame header declaring 8 MiB followed by more bytes than a row can hold
        let mut bytes = std::fs::read(&path).unwrap();
        bytes.push(codec::CODEC_VERSION);
        bytes.extend_from_slice(&(8u32 * 1024 * 1024).to_le_bytes());
        bytes.resize(bytes.len() + 512 * 1024, b' ');
        std::fs::write(&path, &bytes).unwrap();

        let err = RecordLog::open(&path, true, LIMIT).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidData);
        assert_eq!(std::fs::metadata(&path).unwrap().len(), bytes.len() as u64);
    }

    #[test]
    fn test_rejects_other_header_version() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("records.log");
        let mut bytes = codec::MAGIC.to_vec();
        bytes.push(codec::CODEC_VERSION + 1);
        std::fs::write(&path, bytes).unwrap();

        let err = RecordLog::open(&path, false, LIMIT).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidData);
        assert!(err.to_string().contains("version"));
    }

    #[test]
    fn test_partial_header_is_reset() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("records.log");
        std::fs::write(&path, b"HQ").unwrap();

        let (log, replay) = RecordLog::open(&path, false, LIMIT).unwrap();
        assert!(replay.rows.is_empty());
        assert_eq!(log.size_bytes().unwrap(), codec::HEADER_LEN);
    }
}
