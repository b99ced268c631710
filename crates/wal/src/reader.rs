use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

use crate::{WalError, WalRecord, RECORD_BYTES};

/// Sequential WAL reader that yields verified records.
///
/// Generic over any `Read` implementor so tests can feed an in-memory buffer.
///
/// A short fragment, or a failed record followed by less than one full
/// record, is a torn final write: replay stops before it and succeeds. A
/// failed record with a full record after it means the log itself is damaged
/// and replay fails.
pub struct WalReader<R: Read> {
    rdr: BufReader<R>,
}

impl WalReader<File> {
    /// Opens an existing WAL file for sequential replay.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<WalReader<File>, WalError> {
        let f = File::open(path)?;
        Ok(WalReader {
            rdr: BufReader::new(f),
        })
    }
}

impl<R: Read> WalReader<R> {
    pub fn from_reader(reader: R) -> Self {
        WalReader {
            rdr: BufReader::new(reader),
        }
    }

    /// Calls `apply` for every valid record in order.
    ///
    /// Returns the byte length of the valid prefix, which is where a caller
    /// would truncate the log after a torn final write.
    pub fn replay<F>(&mut self, mut apply: F) -> Result<u64, WalError>
    where
        F: FnMut(WalRecord),
    {
        let mut offset = 0u64;
        let mut buf = [0u8; RECORD_BYTES];

        loop {
            let n = read_full(&mut self.rdr, &mut buf)?;
            if n == 0 {
                return Ok(offset);
            }
            if n < RECORD_BYTES {
                tracing::warn!(offset, bytes = n, "wal ends with a partial record");
                return Ok(offset);
            }

            match WalRecord::decode(&buf) {
                Ok(rec) => {
                    apply(rec);
                    offset += RECORD_BYTES as u64;
                }
                Err(e) => {
                    // Less than one full record after it means the bad record
                    // was part of the last, interrupted write.
                    let trailing = read_full(&mut self.rdr, &mut buf)?;
                    if trailing < RECORD_BYTES {
                        tracing::warn!(offset, error = %e, trailing, "wal ends with a torn record");
                        return Ok(offset);
                    }
                    return Err(WalError::CorruptInterior {
                        offset,
                        source: Box::new(e),
                    });
                }
            }
        }
    }

    /// Replays everything into a vector.
    pub fn read_all(&mut self) -> Result<Vec<WalRecord>, WalError> {
        let mut recs = Vec::new();
        self.replay(|r| recs.push(r))?;
        Ok(recs)
    }
}

/// Reads until `buf` is full or EOF, returning the number of bytes read.
fn read_full<R: Read>(r: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match r.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
