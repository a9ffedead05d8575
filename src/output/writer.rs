//! JSON-lines encoding of the record stream

use crate::output::events::Record;
use std::io::{self, Write};
use tokio::sync::mpsc;

/// Writes one record as a single JSON line and flushes it
pub fn write_record<W: Write>(out: &mut W, record: &Record) -> io::Result<()> {
    let line = serde_json::to_string(record).map_err(io::Error::from)?;
    out.write_all(line.as_bytes())?;
    out.write_all(b"\n")?;
    out.flush()
}

/// Writes every record from `records` to `out` until all emitters are dropped
///
/// Returns the number of records written.
pub async fn forward_records<W: Write>(
    mut records: mpsc::UnboundedReceiver<Record>,
    mut out: W,
) -> io::Result<usize> {
    let mut written = 0;
    while let Some(record) = records.recv().await {
        write_record(&mut out, &record)?;
        written += 1;
    }
    Ok(written)
}
