//! Key events delivered by the host and how a suspended program consumes them.
use crate::console::Console;

/// A single key press.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputEvent {
    Char(char),
    Enter,
    Tab,
    /// Backspace or Delete.
    Backspace,
    Escape,
}

impl InputEvent {
    /// Maps a key name (`"Enter"`, `"a"`, ...) to an event. Unknown named keys give `None`.
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "Enter" => Some(InputEvent::Enter),
            "Tab" => Some(InputEvent::Tab),
            "Backspace" | "Delete" => Some(InputEvent::Backspace),
            "Escape" => Some(InputEvent::Escape),
            _ => {
                let mut chars = key.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Some(InputEvent::Char(c)),
                    _ => None,
                }
            }
        }
    }

    /// The character a key stands for when a program asks for a single character.
    pub fn as_char(self) -> Option<char> {
        match self {
            InputEvent::Char(c) => Some(c),
            InputEvent::Enter => Some('\n'),
            InputEvent::Tab => Some('\t'),
            InputEvent::Backspace => Some('\u{8}'),
            InputEvent::Escape => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LineKind {
    /// Any characters, committed verbatim.
    Text,
    /// Digits, a leading `-` and a single `.`, committed as a float.
    Decimal,
    /// Digits only, committed as a non-negative integer (empty means 0).
    Digits,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputMode {
    /// The next key is the input.
    Char,
    /// Keys are echoed until Enter.
    Line(LineKind),
}

/// A committed input value handed to the language.
#[derive(Clone, Debug, PartialEq)]
pub enum InputValue {
    Char(char),
    Text(String),
    Number(f64),
}

/// What a key did to a suspended program.
#[derive(Clone, Debug, PartialEq)]
pub enum Feed {
    Ignored,
    /// The key changed the pending line.
    Pending,
    Commit(InputValue),
}

/// A program parked on an input request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Suspension {
    mode: InputMode,
    /// Number of echoed characters belonging to this request.
    pending: usize,
}

impl Suspension {
    pub fn new(mode: InputMode) -> Self {
        Suspension { mode, pending: 0 }
    }

    pub fn mode(&self) -> InputMode {
        self.mode
    }

    pub fn pending(&self) -> usize {
        self.pending
    }

    /// Applies one key. Line modes echo accepted characters into `console`.
    /// Escape is never consumed here; the engine handles it first.
    pub fn feed(&mut self, event: InputEvent, console: &mut Console) -> Feed {
        let kind = match self.mode {
            InputMode::Char => {
                return match event.as_char() {
                    Some(c) => Feed::Commit(InputValue::Char(c)),
                    None => Feed::Ignored,
                };
            }
            InputMode::Line(kind) => kind,
        };

        match event {
            InputEvent::Escape => Feed::Ignored,
            InputEvent::Backspace => {
                if self.pending > 0 && console.pop_echo().is_some() {
                    self.pending -= 1;
                    Feed::Pending
                } else {
                    Feed::Ignored
                }
            }
            InputEvent::Enter => {
                let line: String = console.echo().to_string();
                self.pending = 0;
                Feed::Commit(match kind {
                    LineKind::Text => InputValue::Text(line),
                    LineKind::Decimal => InputValue::Number(line.parse().unwrap_or(f64::NAN)),
                    LineKind::Digits if line.is_empty() => InputValue::Number(0.0),
                    LineKind::Digits => InputValue::Number(line.parse().unwrap_or(0.0)),
                })
            }
            InputEvent::Tab | InputEvent::Char(_) => {
                let Some(c) = event.as_char() else {
                    return Feed::Ignored;
                };
                if !self.accepts(kind, c, console.echo()) {
                    return Feed::Ignored;
                }
                console.push_echo(c);
                self.pending += 1;
                Feed::Pending
            }
        }
    }

    fn accepts(&self, kind: LineKind, c: char, line: &str) -> bool {
        match kind {
            LineKind::Text => true,
            LineKind::Digits => c.is_ascii_digit(),
            LineKind::Decimal => {
                c.is_ascii_digit()
                    || (c == '-' && self.pending == 0)
                    || (c == '.' && !line.contains('.'))
            }
        }
    }
}
