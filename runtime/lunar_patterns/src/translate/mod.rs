//! Pattern to regex source translation.

use tracing::trace;

use crate::PatternError;

/// Kind of a capture group, in group order.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CaptureKind {
    /// `(...)`, captures the matched text.
    Text,
    /// `()`, captures the current position.
    Position,
}

/// Output of [`translate`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Translation {
    /// Regex source, ready for `RegexBuilder`.
    pub regex: String,
    /// One entry per capture group.
    pub captures: Vec<CaptureKind>,
}

/// Regex class for a magic class letter (`a` for `%a`), `None` if `c` is
/// not a class letter.
///
/// Every expansion is a bracket class so it can be nested inside a
/// negated set.
pub fn class_expansion(c: char) -> Option<&'static str> {
    let class = match c {
        'a' => "[a-zA-Z]",
        'A' => "[^a-zA-Z]",
        'l' => "[a-z]",
        'L' => "[^a-z]",
        'u' => "[A-Z]",
        'U' => "[^A-Z]",
        'p' => r"[!-/:-@\[-\x60{-~]",
        'P' => r"[^!-/:-@\[-\x60{-~]",
        'w' => "[a-zA-Z0-9]",
        'W' => "[^a-zA-Z0-9]",
        'd' => "[0-9]",
        'D' => "[^0-9]",
        's' => r"[\t\n\v\f\r ]",
        'S' => r"[^\t\n\v\f\r ]",
        'c' => r"[\x00-\x1F\x7F]",
        'C' => r"[^\x00-\x1F\x7F]",
        'x' => "[0-9A-Fa-f]",
        'X' => "[^0-9A-Fa-f]",
        'z' => r"[\x00]",
        'Z' => r"[^\x00]",
        _ => return None,
    };
    Some(class)
}

/// What the previously emitted item was; decides whether a quantifier
/// character quantifies or is literal.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Last {
    Start,
    /// A single-character item: literal, class, set, or `.`.
    Item,
    Open,
    Close,
    Anchor,
    Quantifier,
}

struct Translator {
    chars: Vec<char>,
    pos: usize,
    out: String,
    depth: usize,
    captures: Vec<CaptureKind>,
    last: Last,
}

/// Translate a pattern into regex source.
pub fn translate(pattern: &str) -> Result<Translation, PatternError> {
    let mut translator = Translator {
        chars: pattern.chars().collect(),
        pos: 0,
        out: String::with_capacity(pattern.len() * 2),
        depth: 0,
        captures: Vec::new(),
        last: Last::Start,
    };
    translator.run()?;
    trace!(pattern, regex = %translator.out, "translated pattern");
    Ok(Translation {
        regex: translator.out,
        captures: translator.captures,
    })
}

fn escape(c: char) -> String {
    let mut buf = [0u8; 4];
    regex::escape(c.encode_utf8(&mut buf))
}

impl Translator {
    fn peek(&self, ahead: usize) -> Option<char> {
        self.chars.get(self.pos + ahead).copied()
    }

    fn run(&mut self) -> Result<(), PatternError> {
        let len = self.chars.len();
        while let Some(c) = self.peek(0) {
            match c {
                '%' => self.escape_sequence()?,
                '[' => {
                    self.pos += 1;
                    let set = self.set()?;
                    self.emit_item(&set);
                }
                '(' if self.peek(1) == Some(')') => {
                    self.pos += 2;
                    self.out.push_str("()");
                    self.captures.push(CaptureKind::Position);
                    self.last = Last::Close;
                }
                '(' => {
                    self.pos += 1;
                    self.depth += 1;
                    self.out.push('(');
                    self.captures.push(CaptureKind::Text);
                    self.last = Last::Open;
                }
                ')' if self.depth > 0 => {
                    self.pos += 1;
                    self.depth -= 1;
                    self.out.push(')');
                    self.last = Last::Close;
                }
                '^' if self.pos == 0 => {
                    self.pos += 1;
                    self.out.push('^');
                    self.last = Last::Anchor;
                }
                '$' if self.pos + 1 == len => {
                    self.pos += 1;
                    self.out.push('$');
                    self.last = Last::Anchor;
                }
                '?' | '*' | '+' | '-' if self.last == Last::Item => {
                    self.pos += 1;
                    match c {
                        '-' => self.out.push_str("*?"),
                        other => self.out.push(other),
                    }
                    self.last = Last::Quantifier;
                }
                '.' => {
                    self.pos += 1;
                    self.emit_item(".");
                }
                other => {
                    self.pos += 1;
                    self.emit_item(&escape(other));
                }
            }
        }
        if self.depth > 0 {
            return Err(PatternError::Malformed("unfinished capture"));
        }
        Ok(())
    }

    fn emit_item(&mut self, item: &str) {
        self.out.push_str(item);
        self.last = Last::Item;
    }

    /// `%x` outside a set. The `%` is at the current position.
    fn escape_sequence(&mut self) -> Result<(), PatternError> {
        let Some(next) = self.peek(1) else {
            return Err(PatternError::Malformed("ends with '%'"));
        };
        self.pos += 2;
        match next {
            'b' => Err(PatternError::NotImplemented("balanced match %b")),
            'f' => Err(PatternError::NotImplemented("frontier pattern %f")),
            '0'..='9' => Err(PatternError::NotImplemented("back-reference %n")),
            _ => {
                match class_expansion(next) {
                    Some(class) => self.emit_item(class),
                    None => self.emit_item(&escape(next)),
                }
                Ok(())
            }
        }
    }

    /// Body of a set; the `[` has been consumed.
    fn set(&mut self) -> Result<String, PatternError> {
        const MISSING: PatternError = PatternError::Malformed("missing ']'");

        let negated = self.peek(0) == Some('^');
        if negated {
            self.pos += 1;
        }

        let mut literals = String::new();
        let mut classes: Vec<&'static str> = Vec::new();
        let mut first = true;

        loop {
            let c = self.peek(0).ok_or(MISSING)?;
            if c == ']' && !first {
                self.pos += 1;
                break;
            }
            first = false;

            if c == '%' {
                let next = self.peek(1).ok_or(MISSING)?;
                self.pos += 2;
                match class_expansion(next) {
                    Some(class) => classes.push(class),
                    None => literals.push_str(&escape(next)),
                }
                continue;
            }

            match (self.peek(1), self.peek(2)) {
                (Some('-'), Some(end)) if end != ']' => {
                    literals.push_str(&escape(c));
                    literals.push('-');
                    literals.push_str(&escape(end));
                    self.pos += 3;
                }
                _ => {
                    literals.push_str(&escape(c));
                    self.pos += 1;
                }
            }
        }

        if negated {
            let mut out = String::from("[^");
            out.push_str(&literals);
            for class in &classes {
                out.push_str(class);
            }
            out.push(']');
            return Ok(out);
        }

        let mut pieces: Vec<String> = classes.iter().map(|c| (*c).to_string()).collect();
        if !literals.is_empty() {
            pieces.push(format!("[{literals}]"));
        }
        Ok(match pieces.len() {
            1 => pieces.remove(0),
            _ => format!("(?:{})", pieces.join("|")),
        })
    }
}

#[cfg(test)]
mod tests;
