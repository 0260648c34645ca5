//! Protocol framing IO.
//! - read_message: one JSON message per line, invalid UTF-8 replaced
//! - write_message: emit payload + newline
//! - write_protocol_log: optional transcript logging

use std::fs::File;
use std::io::{self, BufRead, BufWriter, Write};

pub(super) fn read_message<R: BufRead>(reader: &mut R) -> io::Result<Option<String>> {
    let mut line = Vec::new();
    loop {
        line.clear();
        let bytes = reader.read_until(b'\n', &mut line)?;
        if bytes == 0 {
            return Ok(None);
        }
        let text = String::from_utf8_lossy(&line);
        let trimmed = text.trim_end_matches(['\r', '\n']);
        if !trimmed.trim().is_empty() {
            return Ok(Some(trimmed.to_string()));
        }
    }
}

pub(super) fn write_message<W: Write>(writer: &mut W, payload: &str) -> io::Result<()> {
    writer.write_all(payload.as_bytes())?;
    writer.write_all(b"\n")?;
    writer.flush()
}

pub(super) fn write_protocol_log(
    logger: &mut BufWriter<File>,
    direction: &str,
    payload: &str,
) -> io::Result<()> {
    writeln!(logger, "{direction} {payload}")?;
    logger.flush()
}
