use super::error::ConfigError;
use super::limits::{COMMENT_CHAR, MAX_LINE_LEN};
use std::io::{BufRead, Read};

const HT: u8 = b'\t';
const CR: u8 = b'\r';
const LF: u8 = b'\n';

/// One logical configuration line together with the physical line number
/// it started on, for precise diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    pub text: String,
    pub line_no: usize,
}

/// Extracts logical configuration lines from a byte stream.
///
/// Comment lines (`#`-prefixed), blank lines and leading tabs are skipped.
/// Content lines are capped at [`MAX_LINE_LEN`] characters; running past
/// the cap without a terminator, or hitting EOF while still searching for
/// a line, aborts the whole load. The stream is released when the reader
/// is dropped, on every exit path.
pub struct LineReader<R> {
    inner: R,
    line_no: usize,
}

impl<R: BufRead> LineReader<R> {
    pub fn new(inner: R) -> Self {
        Self { inner, line_no: 1 }
    }

    fn read_byte(&mut self, field: &'static str) -> Result<Option<u8>, ConfigError> {
        let mut byte = [0u8; 1];
        loop {
            return match self.inner.read(&mut byte) {
                Ok(0) => Ok(None),
                Ok(_) => {
                    if byte[0] == LF {
                        self.line_no += 1;
                    }
                    Ok(Some(byte[0]))
                }
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => Err(ConfigError::Io { field, source: e }),
            };
        }
    }

    /// Return the next non-comment, non-blank logical line.
    ///
    /// `field` labels the configuration field being read and is carried
    /// into every error this call can produce.
    pub fn next_line(&mut self, field: &'static str) -> Result<Line, ConfigError> {
        let mut chr = self
            .read_byte(field)?
            .ok_or(ConfigError::PrematureEof { field })?;

        // Skip comment lines and runs of terminators/tabs
        while chr == COMMENT_CHAR || chr == HT || chr == CR || chr == LF {
            // To the end of the current line
            while chr != CR && chr != LF {
                chr = self
                    .read_byte(field)?
                    .ok_or(ConfigError::PrematureEof { field })?;
            }
            // Past any run of terminators
            while chr == CR || chr == LF {
                chr = self
                    .read_byte(field)?
                    .ok_or(ConfigError::PrematureEof { field })?;
            }
        }

        let start_line = self.line_no;
        let mut buf = Vec::with_capacity(MAX_LINE_LEN);

        while buf.len() < MAX_LINE_LEN {
            if chr == CR || chr == LF {
                break;
            }
            buf.push(chr);

            // EOF after buffered content terminates the line normally
            chr = match self.read_byte(field)? {
                Some(c) => c,
                None => break,
            };

            if buf.len() == MAX_LINE_LEN && chr != CR && chr != LF {
                return Err(ConfigError::LineTooLong {
                    field,
                    line: String::from_utf8_lossy(&buf).into_owned(),
                    max: MAX_LINE_LEN,
                });
            }
        }

        Ok(Line {
            text: String::from_utf8_lossy(&buf).into_owned(),
            line_no: start_line,
        })
    }
}
