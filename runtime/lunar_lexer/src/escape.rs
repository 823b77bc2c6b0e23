//! Decoding of quoted and long-bracket string literals.

/// Decode the body of a quoted string (without the quotes).
///
/// Returns `None` on a malformed escape.
pub(crate) fn unescape(body: &str) -> Option<String> {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        let escaped = chars.next()?;
        match escaped {
            'n' => out.push('\n'),
            't' => out.push('\t'),
            'r' => out.push('\r'),
            'a' => out.push('\u{7}'),
            'b' => out.push('\u{8}'),
            'f' => out.push('\u{c}'),
            'v' => out.push('\u{b}'),
            '\\' => out.push('\\'),
            '"' => out.push('"'),
            '\'' => out.push('\''),
            '\n' => out.push('\n'),
            'z' => {
                while chars.peek().is_some_and(|c| c.is_ascii_whitespace()) {
                    chars.next();
                }
            }
            'x' => {
                let hi = chars.next()?.to_digit(16)?;
                let lo = chars.next()?.to_digit(16)?;
                out.push(char::from(u8::try_from(hi * 16 + lo).ok()?));
            }
            d if d.is_ascii_digit() => {
                let mut code = d.to_digit(10)?;
                for _ in 0..2 {
                    match chars.peek().and_then(|c| c.to_digit(10)) {
                        Some(next) => {
                            code = code * 10 + next;
                            chars.next();
                        }
                        None => break,
                    }
                }
                out.push(char::from(u8::try_from(code).ok()?));
            }
            _ => return None,
        }
    }
    Some(out)
}

/// Level of a long bracket opening at the start of `s` (`[[` is 0, `[=[` is 1).
pub(crate) fn long_bracket_level(s: &str) -> Option<usize> {
    let bytes = s.as_bytes();
    if bytes.first() != Some(&b'[') {
        return None;
    }
    let level = bytes[1..].iter().take_while(|&&b| b == b'=').count();
    (bytes.get(1 + level) == Some(&b'[')).then_some(level)
}

/// Closing bracket for a given level, e.g. `]==]`.
pub(crate) fn long_bracket_close(level: usize) -> String {
    format!("]{}]", "=".repeat(level))
}
