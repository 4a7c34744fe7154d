use super::Record;
use crate::error::Result;
use std::io::Write;

/// One compact JSON object, no trailing newline.
pub fn to_line(record: &Record<'_>) -> std::result::Result<String, serde_json::Error> {
    serde_json::to_string(record)
}

/// Streams one record per line, flushing after each so consumers see
/// results as soon as an artifact finishes.
pub struct NdjsonWriter<W: Write> {
    out: W,
}

impl<W: Write> NdjsonWriter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn write(&mut self, record: &Record<'_>) -> Result<()> {
        serde_json::to_writer(&mut self.out, record)?;
        self.out.write_all(b"\n")?;
        self.out.flush()?;
        Ok(())
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }
}
