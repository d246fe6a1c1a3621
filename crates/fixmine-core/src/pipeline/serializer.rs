/*!
# Record Serializer

Persists the raw record stream as consecutive bincode values, optionally
zstd-compressed. The destination is opened when the serializer is built so
that an unwritable path fails the run before any mining starts.
*/

use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::Consumer;
use crate::rules::ClassifiedRecord;

/// Compression applied to the record log
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Compression {
    #[default]
    None,
    Zstd {
        level: i32,
    },
}

impl Compression {
    pub const DEFAULT_ZSTD_LEVEL: i32 = 3;

    pub fn zstd() -> Self {
        Compression::Zstd {
            level: Self::DEFAULT_ZSTD_LEVEL,
        }
    }

    pub fn is_compressed(&self) -> bool {
        !matches!(self, Compression::None)
    }
}

enum Sink {
    Plain(BufWriter<File>),
    Zstd(zstd::stream::write::Encoder<'static, BufWriter<File>>),
}

impl Sink {
    fn open(path: &Path, compression: Compression) -> io::Result<Self> {
        let file = BufWriter::new(File::create(path)?);
        Ok(match compression {
            Compression::None => Sink::Plain(file),
            Compression::Zstd { level } => Sink::Zstd(zstd::stream::write::Encoder::new(file, level)?),
        })
    }

    /// Write the compression trailer, if any, and flush to the file
    fn finish(self) -> io::Result<()> {
        match self {
            Sink::Plain(mut file) => file.flush(),
            Sink::Zstd(encoder) => encoder.finish()?.flush(),
        }
    }
}

impl Write for Sink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Sink::Plain(file) => file.write(buf),
            Sink::Zstd(encoder) => encoder.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Sink::Plain(file) => file.flush(),
            Sink::Zstd(encoder) => encoder.flush(),
        }
    }
}

/// Consumer writing every record it receives to one file
pub struct RecordSerializer {
    path: PathBuf,
    sink: Option<Sink>,
    written: u64,
}

impl RecordSerializer {
    /// Open (create or truncate) the destination right away
    pub fn create(path: impl AsRef<Path>, compression: Compression) -> crate::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let sink = Sink::open(&path, compression)?;
        debug!(path = %path.display(), ?compression, "record log opened");
        Ok(Self {
            path,
            sink: Some(sink),
            written: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn written(&self) -> u64 {
        self.written
    }

    fn close(&mut self) -> io::Result<()> {
        match self.sink.take() {
            Some(sink) => sink.finish(),
            None => Ok(()),
        }
    }
}

impl Consumer for RecordSerializer {
    fn name(&self) -> &str {
        "serializer"
    }

    fn consume(&mut self, record: ClassifiedRecord) -> anyhow::Result<()> {
        let Some(sink) = self.sink.as_mut() else {
            anyhow::bail!("record log {} is already closed", self.path.display());
        };
        bincode::serialize_into(sink, &record)?;
        self.written += 1;
        Ok(())
    }

    fn cleanup(&mut self) -> anyhow::Result<()> {
        self.close()?;
        debug!(path = %self.path.display(), records = self.written, "record log closed");
        Ok(())
    }
}

impl Drop for RecordSerializer {
    fn drop(&mut self) {
        // Reached without cleanup when a write failed; still close the stream.
        if let Err(e) = self.close() {
            warn!(path = %self.path.display(), "failed to close record log: {e}");
        }
    }
}

/// Iterates the records of a log written by [`RecordSerializer`]
pub struct RecordReader {
    reader: Box<dyn BufRead + Send>,
    failed: bool,
}

impl RecordReader {
    /// `compression` must match the setting the log was written with
    pub fn open(path: impl AsRef<Path>, compression: Compression) -> crate::Result<Self> {
        let file = File::open(path.as_ref())?;
        let reader: Box<dyn BufRead + Send> = match compression {
            Compression::None => Box::new(BufReader::new(file)),
            Compression::Zstd { .. } => Box::new(BufReader::new(zstd::stream::read::Decoder::new(file)?)),
        };
        Ok(Self { reader, failed: false })
    }

    /// Read the whole log into memory
    pub fn read_all(path: impl AsRef<Path>, compression: Compression) -> crate::Result<Vec<ClassifiedRecord>> {
        Self::open(path, compression)?.collect()
    }
}

impl Iterator for RecordReader {
    type Item = crate::Result<ClassifiedRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }

        let at_end = match self.reader.fill_buf() {
            Ok(buf) => buf.is_empty(),
            Err(e) => {
                self.failed = true;
                return Some(Err(e.into()));
            }
        };
        if at_end {
            return None;
        }

        let record = bincode::deserialize_from(&mut self.reader).map_err(crate::MinerError::from);
        self.failed = record.is_err();
        Some(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::Rule;

    fn records() -> Vec<ClassifiedRecord> {
        vec![
            ClassifiedRecord::new(Rule::MissingBreakInCase, "p1"),
            ClassifiedRecord::new(
                Rule::PreconditionGuardInserted {
                    parameter: "input".to_string(),
                },
                "p2",
            ),
        ]
    }

    fn write(path: &Path, compression: Compression, records: &[ClassifiedRecord]) {
        let mut serializer = RecordSerializer::create(path, compression).unwrap();
        for record in records {
            serializer.consume(record.clone()).unwrap();
        }
        serializer.cleanup().unwrap();
        assert_eq!(serializer.written(), records.len() as u64);
    }

    #[test]
    fn test_plain_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("records.bin");
        write(&path, Compression::None, &records());

        assert_eq!(RecordReader::read_all(&path, Compression::None).unwrap(), records());
    }

    #[test]
    fn test_compressed_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("records.bin.zst");
        write(&path, Compression::zstd(), &records());

        assert_eq!(RecordReader::read_all(&path, Compression::zstd()).unwrap(), records());
    }

    #[test]
    fn test_destination_opened_eagerly() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("eager.bin");
        let _serializer = RecordSerializer::create(&path, Compression::None).unwrap();
        assert!(path.exists());

        let missing = dir.path().join("no-such-dir").join("records.bin");
        assert!(RecordSerializer::create(missing, Compression::None).is_err());
    }

    #[test]
    fn test_drop_closes_compressed_stream() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dropped.bin.zst");
        {
            let mut serializer = RecordSerializer::create(&path, Compression::zstd()).unwrap();
            serializer.consume(records()[0].clone()).unwrap();
        }
        assert_eq!(RecordReader::read_all(&path, Compression::zstd()).unwrap(), records()[..1]);
    }

    #[test]
    fn test_truncated_log_reports_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("short.bin");
        write(&path, Compression::None, &records());

        let bytes = std::fs::read(&path).unwrap();
        std::fs::write(&path, &bytes[..bytes.len() - 2]).unwrap();

        let results: Vec<_> = RecordReader::open(&path, Compression::None).unwrap().collect();
        assert_eq!(results.len(), 2);
        assert!(results[0].is_ok());
        assert!(results[1].is_err());
    }
}
