//! Line-oriented text view of content streams
//!
//! Content streams are byte sequences. They are viewed as UTF-8 when valid and
//! as Latin-1 otherwise, so that every stream survives decode/encode unchanged.

use crate::error::EditError;
use crate::request::SubstitutionRequest;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
    Utf8,
    Latin1,
}

/// Decoded content stream text plus the encoding it came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentText {
    pub text: String,
    pub encoding: TextEncoding,
}

impl ContentText {
    pub fn decode(bytes: &[u8]) -> Self {
        match std::str::from_utf8(bytes) {
            Ok(text) => Self {
                text: text.to_string(),
                encoding: TextEncoding::Utf8,
            },
            Err(_) => Self {
                text: bytes.iter().map(|&b| char::from(b)).collect(),
                encoding: TextEncoding::Latin1,
            },
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>, EditError> {
        match self.encoding {
            TextEncoding::Utf8 => Ok(self.text.clone().into_bytes()),
            TextEncoding::Latin1 => self
                .text
                .chars()
                .map(|c| {
                    u8::try_from(c).map_err(|_| {
                        EditError::UnsupportedStructure(format!(
                            "character {:?} cannot be written to a Latin-1 content stream",
                            c
                        ))
                    })
                })
                .collect(),
        }
    }

    /// Apply `request` line by line; see [`substitute_lines`].
    pub fn substitute(&self, request: &SubstitutionRequest) -> (Self, usize) {
        let (text, count) = substitute_lines(&self.text, request);
        (
            Self {
                text,
                encoding: self.encoding,
            },
            count,
        )
    }
}

/// Split on `\r\n`, `\n` or `\r`. A trailing terminator does not start a new
/// line.
pub fn split_lines(text: &str) -> Vec<&str> {
    let bytes = text.as_bytes();
    let mut lines = Vec::new();
    let mut start = 0;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'\n' => {
                lines.push(&text[start..i]);
                i += 1;
                start = i;
            }
            b'\r' => {
                lines.push(&text[start..i]);
                i += if bytes.get(i + 1) == Some(&b'\n') { 2 } else { 1 };
                start = i;
            }
            _ => i += 1,
        }
    }

    if start < bytes.len() {
        lines.push(&text[start..]);
    }
    lines
}

/// Replace every non-overlapping occurrence of each search string, pair by
/// pair in request order, then rejoin the lines with `\n`.
///
/// Returns the new text and the number of occurrences replaced.
pub fn substitute_lines(text: &str, request: &SubstitutionRequest) -> (String, usize) {
    let mut replaced = 0;

    let lines: Vec<String> = split_lines(text)
        .into_iter()
        .map(|line| {
            let mut line = line.to_string();
            for sub in request.iter() {
                if line.contains(sub.search.as_str()) {
                    replaced += line.matches(sub.search.as_str()).count();
                    line = line.replace(sub.search.as_str(), &sub.replacement);
                }
            }
            line
        })
        .collect();

    (lines.join("\n"), replaced)
}
