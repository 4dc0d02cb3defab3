//! Removal of terminal escape sequences from console output.
//!
//! The Zephyr logger colors its output (`<err>` red, `<wrn>` yellow) and the
//! shell emits cursor control around the prompt. Everything downstream matches
//! on plain text, so every line passes through [`strip_ansi`] first.
//!
//! Only 7-bit C1 sequences are recognized:
//!
//! ```text
//! ESC  [@-_]  [0-?]*  [ -/]*  [@-~]
//!      Fe     params  inter.  final
//! ```

use regex::Regex;
use std::borrow::Cow;
use std::sync::LazyLock;

static ANSI_ESCAPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"\x1B",     // ESC
        r"[@-_]",    // 7-bit C1 Fe
        r"[0-?]*",   // parameter bytes
        r"[ -/]*",   // intermediate bytes
        r"[@-~]",    // final byte
    ))
    .expect("valid regex")
});

/// Strip every ANSI/C1 escape sequence from `line`.
///
/// Returns the input borrowed when there is nothing to strip, which is the
/// common case for uncolored lines.
///
/// ```
/// use keykeeper_protocol::strip_ansi;
///
/// let line = "\x1b[1;32m<inf> app: Connected\x1b[0m";
/// assert_eq!(strip_ansi(line), "<inf> app: Connected");
/// assert_eq!(strip_ansi("plain"), "plain");
/// ```
pub fn strip_ansi(line: &str) -> Cow<'_, str> {
    if !line.contains('\x1B') {
        return Cow::Borrowed(line);
    }
    ANSI_ESCAPE.replace_all(line, "")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("\x1b[0m", "")]
    #[case("\x1b[1;31m<err> fail\x1b[0m", "<err> fail")]
    #[case("\x1b[8Duart:~$ \x1b[J", "uart:~$ ")]
    #[case("a\x1b[?25hb", "ab")]
    #[case("x\x1b[1 qy", "xy")] // intermediate byte
    fn test_strip_sequences(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(strip_ansi(input), expected);
    }

    #[test]
    fn test_plain_text_is_borrowed() {
        let out = strip_ansi("<inf> app: Battery Level: 87%");
        assert!(matches!(out, Cow::Borrowed(_)));
    }

    #[test]
    fn test_idempotent() {
        let once = strip_ansi("\x1b[1;32mdone\x1b[0m").into_owned();
        assert_eq!(strip_ansi(&once), once);
    }

    #[test]
    fn test_lone_escape_is_kept() {
        // Not a complete sequence: no Fe byte follows.
        assert_eq!(strip_ansi("abc\x1b"), "abc\x1b");
    }
}
