//! Best-effort escaping of text embedded in quoted SQL literals.
//!
//! This is a single-pass escaper, not a full literal encoder: it does not
//! track multi-byte boundaries, and the skip-after-backslash rule below can
//! misfire on a genuine backslash followed by a special character.

/// Escape `input` for inclusion inside a quoted SQL string literal.
///
/// Quote, double-quote, and backslash get a protecting backslash unless the
/// preceding character is already a backslash; newline, carriage return, tab,
/// form feed, and vertical tab are rewritten to their two-character letter
/// forms (`\n`, `\r`, `\t`, `\f`, `\v`) under the same rule. Everything else
/// passes through unchanged.
///
/// The skip-after-backslash rule is inherited behavior: `escape("\\'")`
/// leaves the quote bare because the backslash before it suppresses the
/// protecting backslash. Callers that need round-trip-exact encoding should
/// not feed pre-escaped text through this function.
pub fn escape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut prev: Option<char> = None;
    for c in input.chars() {
        match c {
            '\'' | '"' | '\\' | '\n' | '\r' | '\t' | '\x0c' | '\x0b' => {
                if prev != Some('\\') {
                    out.push('\\');
                }
                match c {
                    '\n' => out.push('n'),
                    '\r' => out.push('r'),
                    '\t' => out.push('t'),
                    '\x0c' => out.push('f'),
                    '\x0b' => out.push('v'),
                    other => out.push(other),
                }
            }
            other => out.push(other),
        }
        prev = Some(c);
    }
    out
}
