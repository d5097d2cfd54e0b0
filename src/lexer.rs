//! Splits a raw input line into argument words following POSIX-like quoting rules.

/// Kind of quote that was left open at the end of a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuoteKind {
    /// `'...`
    Single,
    /// `"...`
    Double,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LexingState {
    Unquoted,
    SingleQuoted,
    DoubleQuoted,
}

struct LexingFSM {
    input: Vec<char>,
    pos: usize,
    state: LexingState,
    current: String,
}

impl LexingFSM {
    fn new(line: &str) -> Self {
        LexingFSM {
            input: line.chars().collect(),
            pos: 0,
            state: LexingState::Unquoted,
            current: String::new(),
        }
    }

    /// Runs the machine to the end of input and returns the collected words.
    ///
    /// Quote state switches never split a word; the current word is flushed only on
    /// unquoted whitespace and at end of input.
    fn make_tokens(&mut self) -> Vec<String> {
        let mut out = Vec::new();

        while let Some(ch) = self.read_char() {
            match self.state {
                LexingState::Unquoted => self.handle_unquoted(ch, &mut out),
                LexingState::SingleQuoted => self.handle_single_quote(ch),
                LexingState::DoubleQuoted => self.handle_double_quote(ch),
            }
        }

        // An unterminated quote keeps whatever it absorbed.
        self.flush(&mut out);
        out
    }

    fn read_char(&mut self) -> Option<char> {
        let ch = self.input.get(self.pos).copied();
        if ch.is_some() {
            self.pos += 1;
        }
        ch
    }

    fn peek_char(&self) -> Option<char> {
        self.input.get(self.pos).copied()
    }

    fn flush(&mut self, out: &mut Vec<String>) {
        if !self.current.is_empty() {
            out.push(std::mem::take(&mut self.current));
        }
    }

    fn handle_unquoted(&mut self, ch: char, out: &mut Vec<String>) {
        match ch {
            ' ' | '\t' => self.flush(out),
            '\\' => match self.read_char() {
                Some(escaped) => self.current.push(escaped),
                None => self.current.push('\\'),
            },
            '\'' => self.state = LexingState::SingleQuoted,
            '"' => self.state = LexingState::DoubleQuoted,
            c => self.current.push(c),
        }
    }

    fn handle_single_quote(&mut self, ch: char) {
        match ch {
            '\'' => self.state = LexingState::Unquoted,
            c => self.current.push(c),
        }
    }

    fn handle_double_quote(&mut self, ch: char) {
        match ch {
            '"' => self.state = LexingState::Unquoted,
            '\\' => match self.peek_char() {
                Some(next @ ('\\' | '$' | '"' | '\n')) => {
                    self.read_char();
                    self.current.push(next);
                }
                _ => self.current.push('\\'),
            },
            c => self.current.push(c),
        }
    }
}

/// Splits `line` into words.
///
/// Never fails: an unterminated quote absorbs the rest of the line into the last word.
/// Use [`find_unterminated_quote`] to detect that case.
pub fn tokenize(line: &str) -> Vec<String> {
    LexingFSM::new(line).make_tokens()
}

/// Reports the quote left open at the end of `line`, if any.
pub fn find_unterminated_quote(line: &str) -> Option<QuoteKind> {
    let mut lexer = LexingFSM::new(line);
    let _ = lexer.make_tokens();
    match lexer.state {
        LexingState::Unquoted => None,
        LexingState::SingleQuoted => Some(QuoteKind::Single),
        LexingState::DoubleQuoted => Some(QuoteKind::Double),
    }
}
