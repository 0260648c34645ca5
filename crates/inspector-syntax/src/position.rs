//! Offset ⇄ line/column conversion.
//!
//! `"\r\n"` is a single line terminator; a lone `'\r'` or `'\n'` also ends a
//! line. Lines and columns are zero-based and columns count characters since
//! the last terminator.
//!
//! An offset that falls between the `'\r'` and `'\n'` of a CRLF pair is
//! reported on the line the pair terminates, one column past the `'\r'`.

use thiserror::Error;

/// Position conversion failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PositionError {
    /// The offset lies past the end of the text.
    #[error("offset {offset} is out of range (text length {len})")]
    OutOfRange { offset: usize, len: usize },

    /// The line/column pair does not address a position inside the text.
    #[error("line {line}, column {column} is not a position in the text")]
    InvalidPosition { line: usize, column: usize },
}

/// Convert a character offset into a `(line, column)` pair by scanning `text`.
///
/// `offset == len` is valid and addresses the position after the last
/// character.
pub fn offset_to_line_column(text: &str, offset: usize) -> Result<(usize, usize), PositionError> {
    let mut line = 0;
    let mut column = 0;
    let mut consumed = 0;
    let mut chars = text.chars().peekable();

    while consumed < offset {
        let Some(ch) = chars.next() else {
            return Err(PositionError::OutOfRange {
                offset,
                len: consumed,
            });
        };
        consumed += 1;
        match ch {
            '\r' if chars.peek() == Some(&'\n') => {
                if consumed == offset {
                    column += 1;
                } else {
                    chars.next();
                    consumed += 1;
                    line += 1;
                    column = 0;
                }
            }
            '\r' | '\n' => {
                line += 1;
                column = 0;
            }
            _ => column += 1,
        }
    }

    Ok((line, column))
}

/// Convert a `(line, column)` pair into a character offset by scanning `text`.
///
/// A column may address any character of the line, including its terminator
/// characters. On the last line the column may equal the line length, which
/// yields the text length.
pub fn line_column_to_offset(text: &str, line: usize, column: usize) -> Result<usize, PositionError> {
    let invalid = PositionError::InvalidPosition { line, column };
    let mut chars = text.chars().peekable();
    let mut offset = 0;
    let mut current = 0;

    while current < line {
        let ch = chars.next().ok_or(invalid)?;
        offset += 1;
        match ch {
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                    offset += 1;
                }
                current += 1;
            }
            '\n' => current += 1,
            _ => {}
        }
    }

    // Highest column that still lands on this line.
    let mut last_column = 0;
    loop {
        match chars.next() {
            None => break,
            Some('\r') => {
                if chars.peek() == Some(&'\n') {
                    last_column += 1;
                }
                break;
            }
            Some('\n') => break,
            Some(_) => last_column += 1,
        }
    }

    if column <= last_column {
        Ok(offset + column)
    } else {
        Err(invalid)
    }
}

/// Line start table for one text.
///
/// Building the index costs one pass over the text; afterwards both
/// conversions are a binary search or a table lookup. Results are identical
/// to [`offset_to_line_column`] and [`line_column_to_offset`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineIndex {
    starts: Vec<usize>,
    len: usize,
}

impl LineIndex {
    #[must_use]
    pub fn new(text: &str) -> Self {
        let mut starts = vec![0];
        let mut chars = text.chars().peekable();
        let mut offset = 0;
        while let Some(ch) = chars.next() {
            offset += 1;
            match ch {
                '\r' => {
                    if chars.peek() == Some(&'\n') {
                        chars.next();
                        offset += 1;
                    }
                    starts.push(offset);
                }
                '\n' => starts.push(offset),
                _ => {}
            }
        }
        Self {
            starts,
            len: offset,
        }
    }

    /// Length of the indexed text in characters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[must_use]
    pub fn line_count(&self) -> usize {
        self.starts.len()
    }

    /// Position one past the last character.
    #[must_use]
    pub fn end_position(&self) -> (usize, usize) {
        let last = self.starts.len() - 1;
        (last, self.len - self.starts[last])
    }

    pub fn offset_to_line_column(&self, offset: usize) -> Result<(usize, usize), PositionError> {
        if offset > self.len {
            return Err(PositionError::OutOfRange {
                offset,
                len: self.len,
            });
        }
        let line = match self.starts.binary_search(&offset) {
            Ok(line) => line,
            Err(next) => next - 1,
        };
        Ok((line, offset - self.starts[line]))
    }

    pub fn line_column_to_offset(&self, line: usize, column: usize) -> Result<usize, PositionError> {
        let invalid = PositionError::InvalidPosition { line, column };
        let start = *self.starts.get(line).ok_or(invalid)?;
        let next = self.starts.get(line + 1).copied().unwrap_or(self.len + 1);
        if column < next - start {
            Ok(start + column)
        } else {
            Err(invalid)
        }
    }
}
