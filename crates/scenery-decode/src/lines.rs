//! Line-oriented record reading shared by all definition grammars.

use std::fs;
use std::path::Path;
use std::str::FromStr;

use crate::error::{DecodeError, DecodeResult};

/// Read a definition file as Latin-1 text.
///
/// Every byte maps to the code point of the same value, so files written by
/// old tools with non-UTF-8 names still decode.
pub(crate) fn read_latin1(path: &Path) -> DecodeResult<String> {
    let bytes = fs::read(path).map_err(|source| DecodeError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(bytes.iter().map(|&b| char::from(b)).collect())
}

/// Cursor over the lines of a definition file, tracking line numbers.
pub(crate) struct Lines<'a> {
    inner: std::str::Lines<'a>,
    line: usize,
}

impl<'a> Lines<'a> {
    pub(crate) fn new(text: &'a str) -> Self {
        Self {
            inner: text.lines(),
            line: 0,
        }
    }

    /// 1-based number of the line most recently returned.
    pub(crate) fn line(&self) -> usize {
        self.line
    }

    pub(crate) fn error(&self, reason: impl Into<String>) -> DecodeError {
        DecodeError::format(self.line, reason)
    }

    pub(crate) fn next_line(&mut self) -> Option<&'a str> {
        let next = self.inner.next()?;
        self.line += 1;
        Some(next)
    }

    /// Next line, which must exist.
    pub(crate) fn continuation(&mut self) -> DecodeResult<&'a str> {
        match self.next_line() {
            Some(line) => Ok(line),
            None => Err(DecodeError::format(self.line + 1, "unexpected end of file")),
        }
    }

    /// Next non-blank line split into a record, or `None` at end of file.
    ///
    /// With `strip_comments`, anything from `#` onwards is dropped first.
    pub(crate) fn record(&mut self, strip_comments: bool) -> Option<Record<'a>> {
        loop {
            let text = self.next_line()?;
            let text = if strip_comments {
                strip_comment(text)
            } else {
                text
            };
            let record = Record::new(text, self.line);
            if !record.is_empty() {
                return Some(record);
            }
        }
    }

    /// Next line as a record, which must exist (blank lines included).
    pub(crate) fn continuation_record(&mut self) -> DecodeResult<Record<'a>> {
        let text = self.continuation()?;
        Ok(Record::new(text, self.line))
    }

    /// Check the `I`/`A` line-ending marker that opens every definition.
    pub(crate) fn expect_marker(&mut self) -> DecodeResult<()> {
        let first = self.continuation()?;
        match first.trim().chars().next() {
            Some('I' | 'A') => Ok(()),
            _ => Err(self.error("missing I/A header")),
        }
    }
}

/// Everything before the first `#`.
pub(crate) fn strip_comment(line: &str) -> &str {
    line.split('#').next().unwrap_or_default()
}

/// One whitespace-separated line.
#[derive(Debug, Clone)]
pub(crate) struct Record<'a> {
    pub(crate) line: usize,
    text: &'a str,
    tokens: Vec<&'a str>,
}

impl<'a> Record<'a> {
    pub(crate) fn new(text: &'a str, line: usize) -> Self {
        Self {
            line,
            text,
            tokens: text.split_whitespace().collect(),
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub(crate) fn len(&self) -> usize {
        self.tokens.len()
    }

    /// First token, or `""` for a blank line.
    pub(crate) fn keyword(&self) -> &'a str {
        self.tokens.first().copied().unwrap_or_default()
    }

    /// Text after the keyword, trimmed.
    pub(crate) fn rest(&self) -> &'a str {
        self.text
            .trim_start()
            .get(self.keyword().len()..)
            .unwrap_or_default()
            .trim()
    }

    pub(crate) fn token(&self, index: usize) -> DecodeResult<&'a str> {
        self.tokens.get(index).copied().ok_or_else(|| {
            DecodeError::format(
                self.line,
                format!("{} needs at least {} fields", self.keyword(), index + 1),
            )
        })
    }

    pub(crate) fn parse<T: FromStr>(&self, index: usize) -> DecodeResult<T> {
        let token = self.token(index)?;
        token
            .parse()
            .map_err(|_| DecodeError::format(self.line, format!("bad number {token:?}")))
    }

    pub(crate) fn f32(&self, index: usize) -> DecodeResult<f32> {
        self.parse(index)
    }

    /// A float used as a divisor, so it must be nonzero.
    pub(crate) fn divisor(&self, index: usize) -> DecodeResult<f32> {
        let value = self.f32(index)?;
        if value == 0.0 {
            return Err(DecodeError::format(
                self.line,
                format!("{} must not be zero", self.keyword()),
            ));
        }
        Ok(value)
    }

    /// Integer that may be written with a fractional part, truncated.
    pub(crate) fn truncated(&self, index: usize) -> DecodeResult<i32> {
        self.f32(index).map(|value| value as i32)
    }

    /// Three consecutive floats starting at `index`.
    pub(crate) fn vec3(&self, index: usize) -> DecodeResult<glam::Vec3> {
        Ok(glam::Vec3::new(
            self.f32(index)?,
            self.f32(index + 1)?,
            self.f32(index + 2)?,
        ))
    }
}
