//! Response line tokenizer.
//!
//! A line is split on its first space only. The left part, minus one
//! trailing colon, is the key; the remainder is the value, or empty when
//! the line has no space:
//!
//! | line                    | key      | value               |
//! |-------------------------|----------|---------------------|
//! | `volume: 50`            | `volume` | `50`                |
//! | `OK`                    | `OK`     | (empty)             |
//! | `ACK [5@0] {x} unknown` | `ACK`    | `[5@0] {x} unknown` |
//! | `title: A: B`           | `title`  | `A: B`              |

use std::fmt;

use super::{ACK, OK};
use crate::error::{Error, Result};

/// One tokenized response line.
#[derive(Clone, Debug, Default, Eq, PartialEq, Hash)]
pub struct Line {
    /// Field name or control token.
    pub key: String,
    /// Everything after the first space.
    pub value: String,
}

impl Line {
    /// Tokenizes a single line. A trailing `\n` is stripped first.
    ///
    /// No validation of the key takes place.
    #[must_use]
    pub fn parse(line: &str) -> Self {
        let line = line.strip_suffix('\n').unwrap_or(line);
        let (head, value) = line.split_once(' ').unwrap_or((line, ""));
        let key = head.strip_suffix(':').unwrap_or(head);

        Self {
            key: key.to_owned(),
            value: value.to_owned(),
        }
    }

    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.key == OK
    }

    #[must_use]
    pub fn is_ack(&self) -> bool {
        self.key == ACK
    }

    /// Whether this is the empty line that trails a binary frame.
    #[must_use]
    pub fn is_separator(&self) -> bool {
        self.key.is_empty() && self.value.is_empty()
    }

    /// Parses the value as a non-negative integer, such as a byte count.
    ///
    /// # Errors
    ///
    /// Returns a format error naming the field when the value is not a
    /// non-negative integer.
    pub fn integer(&self) -> Result<usize> {
        self.value.parse::<usize>().map_err(|e| {
            Error::format(format!(
                "field {} has invalid value {:?}: {e}",
                self.key, self.value
            ))
        })
    }
}

impl fmt::Display for Line {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.value.is_empty() {
            write!(f, "{}", self.key)
        } else {
            write!(f, "{}: {}", self.key, self.value)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn splits_on_first_space() {
        let line = Line::parse("title: Tomorrow Never Knows: Remastered\n");
        assert_eq!(line.key, "title");
        assert_eq!(line.value, "Tomorrow Never Knows: Remastered");
    }

    #[test]
    fn bare_tokens_have_empty_value() {
        let line = Line::parse("OK\n");
        assert!(line.is_ok());
        assert_eq!(line.value, "");

        let line = Line::parse("OK MPD 0.23.5\n");
        assert!(line.is_ok());
        assert_eq!(line.value, "MPD 0.23.5");
    }

    #[test]
    fn ack_keeps_full_message() {
        let line = Line::parse("ACK [5@0] {foo} unknown command \"foo\"\n");
        assert!(line.is_ack());
        assert_eq!(line.value, "[5@0] {foo} unknown command \"foo\"");
    }

    #[test]
    fn strips_only_one_colon_and_one_newline() {
        let line = Line::parse("odd:: value\n");
        assert_eq!(line.key, "odd:");
        assert_eq!(line.value, "value");

        let line = Line::parse("key: value\r\n");
        assert_eq!(line.value, "value\r");
    }

    #[test]
    fn empty_line_is_separator() {
        assert!(Line::parse("\n").is_separator());
        assert!(!Line::parse("OK\n").is_separator());
    }

    #[test]
    fn integer_values() {
        assert_eq!(Line::parse("binary: 8192").integer().unwrap(), 8192);

        let err = Line::parse("size: lots").integer().unwrap_err();
        assert_eq!(err.kind, ErrorKind::Format);
        assert!(err.to_string().contains("size"));

        let err = Line::parse("binary: -1").integer().unwrap_err();
        assert_eq!(err.kind, ErrorKind::Format);
    }

    #[test]
    fn display_restores_wire_form() {
        assert_eq!(Line::parse("volume: 50\n").to_string(), "volume: 50");
        assert_eq!(Line::parse("OK\n").to_string(), "OK");
    }
}
