//! The output surface of a running program.
//!
//! Committed program output and the echo of a line that is still being typed
//! are kept apart; a host renders their concatenation.

/// A change to the console, in the order it happened.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConsoleEvent {
    Appended(String),
    /// Output was shortened to `len` characters.
    Truncated { len: usize },
    Cleared,
    /// The pending input echo was replaced by this text.
    EchoChanged(String),
    /// A typed line was committed. When `kept`, an `Appended` with the same
    /// text follows.
    Committed { line: String, kept: bool },
}

#[derive(Clone, Debug, Default)]
pub struct Console {
    output: String,
    echo: String,
    error: Option<String>,
    events: Vec<ConsoleEvent>,
}

impl Console {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn output(&self) -> &str {
        &self.output
    }

    pub fn echo(&self) -> &str {
        &self.echo
    }

    /// Message of the last failed run, if any.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Output followed by the pending echo, as a host would display it.
    pub fn rendered(&self) -> String {
        let mut text = String::with_capacity(self.output.len() + self.echo.len());
        text.push_str(&self.output);
        text.push_str(&self.echo);
        text
    }

    pub fn append(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        self.output.push_str(text);
        self.events.push(ConsoleEvent::Appended(text.to_string()));
    }

    pub fn push_char(&mut self, c: char) {
        self.append(c.encode_utf8(&mut [0; 4]));
    }

    /// Length of the output in characters.
    pub fn char_len(&self) -> usize {
        self.output.chars().count()
    }

    pub fn char_at(&self, index: usize) -> Option<char> {
        self.output.chars().nth(index)
    }

    /// Shortens the output to at most `len` characters.
    pub fn truncate_to(&mut self, len: usize) {
        let Some((byte, _)) = self.output.char_indices().nth(len) else {
            return;
        };
        self.output.truncate(byte);
        self.events.push(ConsoleEvent::Truncated { len });
    }

    /// Removes up to `count` characters from the end of the output.
    pub fn truncate_chars(&mut self, count: usize) {
        let len = self.char_len();
        self.truncate_to(len.saturating_sub(count));
    }

    pub fn clear(&mut self) {
        if self.output.is_empty() {
            return;
        }
        self.output.clear();
        self.events.push(ConsoleEvent::Cleared);
    }

    pub(crate) fn push_echo(&mut self, c: char) {
        self.echo.push(c);
        self.events.push(ConsoleEvent::EchoChanged(self.echo.clone()));
    }

    pub(crate) fn pop_echo(&mut self) -> Option<char> {
        let c = self.echo.pop()?;
        self.events.push(ConsoleEvent::EchoChanged(self.echo.clone()));
        Some(c)
    }

    /// Takes the pending echo; it stays visible as output only if `keep` is set.
    pub(crate) fn commit_echo(&mut self, keep: bool) -> String {
        let echo = self.take_echo();
        if !echo.is_empty() {
            self.events.push(ConsoleEvent::Committed { line: echo.clone(), kept: keep });
            if keep {
                self.append(&echo);
            }
        }
        echo
    }

    pub(crate) fn discard_echo(&mut self) {
        self.take_echo();
    }

    fn take_echo(&mut self) -> String {
        let echo = std::mem::take(&mut self.echo);
        if !echo.is_empty() {
            self.events.push(ConsoleEvent::EchoChanged(String::new()));
        }
        echo
    }

    pub(crate) fn set_error(&mut self, message: String) {
        self.error = Some(message);
    }

    /// Starts a new run: empty output, no error.
    pub(crate) fn reset(&mut self) {
        self.discard_echo();
        self.clear();
        self.error = None;
    }

    pub(crate) fn drain_events(&mut self) -> Vec<ConsoleEvent> {
        std::mem::take(&mut self.events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_counts_characters() {
        let mut console = Console::new();
        console.append("žluťoučký");
        console.truncate_chars(3);
        assert_eq!(console.output(), "žluťou");
        console.truncate_chars(100);
        assert_eq!(console.output(), "");
        assert_eq!(
            console.drain_events(),
            vec![
                ConsoleEvent::Appended("žluťoučký".to_string()),
                ConsoleEvent::Truncated { len: 6 },
                ConsoleEvent::Truncated { len: 0 },
            ]
        );
    }

    #[test]
    fn test_echo_is_separate_from_output() {
        let mut console = Console::new();
        console.append("n = ");
        console.push_echo('4');
        console.push_echo('2');
        assert_eq!(console.output(), "n = ");
        assert_eq!(console.rendered(), "n = 42");
        assert_eq!(console.pop_echo(), Some('2'));
        assert_eq!(console.commit_echo(true), "4");
        assert_eq!(console.output(), "n = 4");
        assert_eq!(console.echo(), "");

        console.push_echo('7');
        console.discard_echo();
        assert_eq!(console.rendered(), "n = 4");
    }

    #[test]
    fn test_commit_events() {
        let mut console = Console::new();
        console.push_echo('5');
        console.commit_echo(true);
        console.push_echo('6');
        console.commit_echo(false);
        console.push_echo('7');
        console.discard_echo();
        assert_eq!(
            console.drain_events(),
            vec![
                ConsoleEvent::EchoChanged("5".to_string()),
                ConsoleEvent::EchoChanged(String::new()),
                ConsoleEvent::Committed { line: "5".to_string(), kept: true },
                ConsoleEvent::Appended("5".to_string()),
                ConsoleEvent::EchoChanged("6".to_string()),
                ConsoleEvent::EchoChanged(String::new()),
                ConsoleEvent::Committed { line: "6".to_string(), kept: false },
                ConsoleEvent::EchoChanged("7".to_string()),
                ConsoleEvent::EchoChanged(String::new()),
            ]
        );
        assert_eq!(console.output(), "5");
    }

    #[test]
    fn test_char_at() {
        let mut console = Console::new();
        console.append("abc");
        assert_eq!(console.char_at(0), Some('a'));
        assert_eq!(console.char_at(2), Some('c'));
        assert_eq!(console.char_at(3), None);
    }
}
