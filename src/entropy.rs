//! Destinations for device-generated entropy and the streaming loop that fills them.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument, warn};

use crate::engine::{interleave, Device};
use crate::error::{ProtocolError, Result};
use crate::messages::{builders, MessageKind};
use crate::wire::Frame;

/// Where the stream's entropy chunks go. Implementations own durable writes.
pub trait EntropySink {
    fn write_chunk(&mut self, chunk: &[u8]) -> io::Result<()>;

    /// Flush and seal the destination once the stream ends.
    fn finish(&mut self) -> io::Result<()> {
        Ok(())
    }

    /// Bytes durably stored so far, or `None` for a pure stream.
    fn persisted_len(&self) -> io::Result<Option<u64>> {
        Ok(None)
    }
}

impl EntropySink for Vec<u8> {
    fn write_chunk(&mut self, chunk: &[u8]) -> io::Result<()> {
        self.extend_from_slice(chunk);
        Ok(())
    }

    fn persisted_len(&self) -> io::Result<Option<u64>> {
        Ok(Some(self.len() as u64))
    }
}

/// Sink writing to a file that ends up read-only.
pub struct FileSink {
    path: PathBuf,
    file: Option<File>,
}

impl FileSink {
    /// Truncate or create `path`, making an existing read-only file writable first.
    #[allow(clippy::permissions_set_readonly_false)]
    pub fn create(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Ok(meta) = fs::metadata(&path) {
            let mut perms = meta.permissions();
            perms.set_readonly(false);
            if let Err(e) = fs::set_permissions(&path, perms) {
                warn!("could not make {} writable: {}", path.display(), e);
            }
        }
        let file = File::create(&path)?;
        Ok(Self {
            path,
            file: Some(file),
        })
    }
}

impl EntropySink for FileSink {
    fn write_chunk(&mut self, chunk: &[u8]) -> io::Result<()> {
        match self.file.as_mut() {
            Some(file) => file.write_all(chunk),
            None => Err(io::Error::new(io::ErrorKind::Other, "entropy file already sealed")),
        }
    }

    fn finish(&mut self) -> io::Result<()> {
        let Some(mut file) = self.file.take() else {
            return Ok(());
        };
        file.flush()?;
        file.sync_all()?;
        drop(file);
        let mut perms = fs::metadata(&self.path)?.permissions();
        perms.set_readonly(true);
        fs::set_permissions(&self.path, perms)
    }

    fn persisted_len(&self) -> io::Result<Option<u64>> {
        Ok(Some(fs::metadata(&self.path)?.len()))
    }
}

/// Raw bytes to standard output. No size check applies.
#[derive(Debug, Default)]
pub struct StdoutSink;

impl EntropySink for StdoutSink {
    fn write_chunk(&mut self, chunk: &[u8]) -> io::Result<()> {
        io::stdout().lock().write_all(chunk)
    }

    fn finish(&mut self) -> io::Result<()> {
        io::stdout().flush()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntropyTarget {
    Stdout,
    File(PathBuf),
}

impl EntropyTarget {
    /// `"-"` selects standard output; anything else is a path.
    pub fn parse(target: &str) -> Self {
        if target == "-" {
            EntropyTarget::Stdout
        } else {
            EntropyTarget::File(PathBuf::from(target))
        }
    }

    pub fn open(&self) -> io::Result<Box<dyn EntropySink>> {
        Ok(match self {
            EntropyTarget::Stdout => Box::new(StdoutSink),
            EntropyTarget::File(path) => Box::new(FileSink::create(path)?),
        })
    }
}

/// Pull `total` bytes of entropy from the device into `sink` over one connection.
///
/// Bytes already handed to the sink stay there when a later round fails; the
/// error carries how many of them the sink accepted.
#[instrument(level = "info", skip(device, sink, builder))]
pub(crate) fn stream<F>(
    device: &mut Device,
    total: u32,
    sink: &mut dyn EntropySink,
    builder: F,
) -> Result<()>
where
    F: Fn(u32) -> Vec<Frame>,
{
    let config = device.interleave_config();
    let session = device.session()?;
    let transport = session.transport()?;

    let mut received: u32 = 0;
    let outcome = (|| -> Result<()> {
        while received < total {
            let first = session.exchange(&builder(total - received))?;
            let reply = interleave::drive(transport, first, config)?;
            if !reply.is(MessageKind::Entropy) {
                return Err(ProtocolError::UnexpectedResponse(reply.kind()));
            }
            let chunk = builders::decode_entropy(&reply)?;
            if chunk.is_empty() {
                return Err(ProtocolError::EmptyEntropy);
            }
            sink.write_chunk(&chunk).map_err(ProtocolError::Sink)?;
            received = received.saturating_add(chunk.len() as u32);
            debug!(received, total, "entropy chunk stored");
        }
        Ok(())
    })();

    let sealed = sink.finish().map_err(ProtocolError::Sink);
    if let Err(source) = outcome {
        if let Err(e) = sealed {
            warn!("sealing entropy sink after failure: {}", e);
        }
        return Err(ProtocolError::EntropyInterrupted {
            received,
            source: Box::new(source),
        });
    }
    sealed?;
    drop(session);

    if let Some(actual) = sink.persisted_len().map_err(ProtocolError::Sink)? {
        if actual != u64::from(total) {
            return Err(ProtocolError::SizeMismatch {
                expected: u64::from(total),
                actual,
            });
        }
    }
    info!(total, "entropy stream complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dash_means_stdout() {
        assert_eq!(EntropyTarget::parse("-"), EntropyTarget::Stdout);
        assert_eq!(
            EntropyTarget::parse("out.bin"),
            EntropyTarget::File(PathBuf::from("out.bin"))
        );
    }

    #[test]
    fn file_sink_seals_read_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("entropy.bin");

        let mut sink = FileSink::create(&path).unwrap();
        sink.write_chunk(&[1, 2, 3]).unwrap();
        sink.write_chunk(&[4]).unwrap();
        sink.finish().unwrap();

        assert_eq!(sink.persisted_len().unwrap(), Some(4));
        assert!(fs::metadata(&path).unwrap().permissions().readonly());
        assert!(sink.write_chunk(&[5]).is_err());

        // a second run must be able to overwrite the sealed file
        let mut again = FileSink::create(&path).unwrap();
        again.write_chunk(&[9; 8]).unwrap();
        again.finish().unwrap();
        assert_eq!(fs::read(&path).unwrap(), vec![9; 8]);
    }
}
