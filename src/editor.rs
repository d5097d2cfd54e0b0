//! Raw-mode line editor with incremental tab-completion.
//!
//! The terminal neither echoes nor line-buffers while a line is being read, so every
//! visible change (echo, erase, bell, completion) is written here explicitly.

use crate::completion::{self, CandidateSource, CompletionAction, CompletionState};
use crate::io_adapters::ByteSource;
use anyhow::Result;
use std::io::Write;

/// Audible alert.
pub const BELL: &[u8] = b"\x07";
/// Moves back one column, blanks it, and moves back again.
pub const ERASE: &[u8] = b"\x08 \x08";

const CTRL_D: u8 = 0x04;
const BACKSPACE: u8 = 0x08;
const DELETE: u8 = 0x7f;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Key {
    Enter,
    Tab,
    Backspace,
    CtrlD,
    EndOfInput,
    Control,
    Byte(u8),
}

impl Key {
    fn classify(byte: u8) -> Self {
        match byte {
            b'\n' | b'\r' => Key::Enter,
            b'\t' => Key::Tab,
            BACKSPACE | DELETE => Key::Backspace,
            CTRL_D => Key::CtrlD,
            0x00..=0x1f => Key::Control,
            b => Key::Byte(b),
        }
    }
}

/// Reads lines from a [`ByteSource`], one keystroke at a time.
///
/// Holds the tab-press state for the whole session, so a repeated tab is recognised
/// even when it lands on a fresh line.
pub struct LineEditor<S> {
    source: S,
    prompt: String,
    completion: CompletionState,
}

impl<S: ByteSource> LineEditor<S> {
    pub fn new(source: S, prompt: impl Into<String>) -> Self {
        Self {
            source,
            prompt: prompt.into(),
            completion: CompletionState::default(),
        }
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn completion_state(&self) -> &CompletionState {
        &self.completion
    }

    /// Print the prompt and read one line.
    ///
    /// Returns `Ok(None)` when input ends (end of stream or Ctrl-D) before anything
    /// was typed. Raw mode is held only while this call runs and is restored on every
    /// exit path, including errors.
    ///
    /// # Errors
    ///
    /// Fails when the terminal cannot be switched to raw mode or on I/O errors.
    pub fn read_line(
        &mut self,
        out: &mut dyn Write,
        candidates: &dyn CandidateSource,
    ) -> Result<Option<String>> {
        out.write_all(self.prompt.as_bytes())?;
        out.flush()?;

        let _raw = self.source.raw_mode()?;
        let mut buffer = String::new();
        // Bytes of a multi-byte character that has not been completed yet.
        let mut pending = Vec::new();

        loop {
            let key = match self.source.next_byte()? {
                Some(byte) => Key::classify(byte),
                None => Key::EndOfInput,
            };
            if !matches!(key, Key::Byte(_)) {
                pending.clear();
            }

            match key {
                Key::Enter => {
                    out.write_all(b"\n")?;
                    out.flush()?;
                    return Ok(Some(buffer));
                }
                Key::CtrlD if buffer.is_empty() => {
                    out.write_all(b"\n")?;
                    out.flush()?;
                    return Ok(None);
                }
                Key::EndOfInput => {
                    out.write_all(b"\n")?;
                    out.flush()?;
                    return Ok(if buffer.is_empty() { None } else { Some(buffer) });
                }
                Key::Tab => self.complete(&mut buffer, out, candidates)?,
                Key::Backspace => {
                    if buffer.pop().is_some() {
                        out.write_all(ERASE)?;
                    }
                }
                Key::CtrlD | Key::Control => {}
                Key::Byte(b) => {
                    if let Some(ch) = decode_byte(&mut pending, b) {
                        buffer.push_str(&ch);
                        out.write_all(ch.as_bytes())?;
                    }
                }
            }
            out.flush()?;
        }
    }

    fn complete(
        &mut self,
        buffer: &mut String,
        out: &mut dyn Write,
        candidates: &dyn CandidateSource,
    ) -> Result<()> {
        let done = completion::complete(buffer, &mut self.completion, candidates);
        match &done.action {
            CompletionAction::Bell => out.write_all(BELL)?,
            CompletionAction::Extend { missing } => out.write_all(missing.as_bytes())?,
            CompletionAction::List(names) => {
                write!(out, "\n{}\n{}{}", names.join("  "), self.prompt, done.line)?
            }
        }
        *buffer = done.line;
        Ok(())
    }
}

/// Add `byte` to the partial character in `pending` and return the character once it
/// is complete.
///
/// A byte that cannot continue the pending sequence is retried as the start of a new
/// character. A byte that cannot start one is dropped.
fn decode_byte(pending: &mut Vec<u8>, byte: u8) -> Option<String> {
    pending.push(byte);
    match std::str::from_utf8(pending) {
        Ok(ch) => {
            let ch = ch.to_owned();
            pending.clear();
            Some(ch)
        }
        Err(e) if e.error_len().is_some() => {
            let retry = pending.len() > 1;
            pending.clear();
            if retry { decode_byte(pending, byte) } else { None }
        }
        Err(_) => None,
    }
}
