use std::borrow::Cow;
use std::fmt::{Display, Formatter, Result as FormatResult};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Line-ending policy applied to copied text.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LineEnding {
    Lf,
    Crlf,
}

impl FromStr for LineEnding {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("lf") {
            Ok(LineEnding::Lf)
        } else if s.eq_ignore_ascii_case("crlf") {
            Ok(LineEnding::Crlf)
        } else {
            Err(format!("unknown line ending '{s}' (expected lf or crlf)"))
        }
    }
}

impl Display for LineEnding {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> FormatResult {
        match self {
            LineEnding::Lf => write!(formatter, "lf"),
            LineEnding::Crlf => write!(formatter, "crlf"),
        }
    }
}

/// Rewrite line endings of `text` according to `policy`.
///
/// - `Lf`: `\r\n` and bare `\r` become `\n`
/// - `Crlf`: bare `\r` and bare `\n` become `\r\n`, existing `\r\n` is kept
/// - `None`: text is returned untouched
pub fn convert_line_ending(text: &str, policy: Option<LineEnding>) -> Cow<'_, str> {
    match policy {
        None => Cow::Borrowed(text),
        Some(LineEnding::Lf) => {
            if !text.contains('\r') {
                return Cow::Borrowed(text);
            }
            Cow::Owned(text.replace("\r\n", "\n").replace('\r', "\n"))
        }
        Some(LineEnding::Crlf) => Cow::Owned(to_crlf(text)),
    }
}

fn to_crlf(text: &str) -> String {
    let mut converted = String::with_capacity(text.len() + text.len() / 16);
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\r' => {
                converted.push_str("\r\n");
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
            }
            '\n' => converted.push_str("\r\n"),
            other => converted.push(other),
        }
    }

    converted
}
