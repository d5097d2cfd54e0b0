use crate::raw_mode::RawModeGuard;
use std::collections::VecDeque;
use std::io::{self, Read};

/// Source of raw input bytes for the line editor, read one at a time.
pub trait ByteSource {
    /// Block until the next byte arrives. `Ok(None)` means end of input.
    fn next_byte(&mut self) -> io::Result<Option<u8>>;

    /// Put the underlying terminal into raw mode until the guard is dropped.
    ///
    /// Sources that are not backed by a terminal keep the default no-op guard.
    fn raw_mode(&self) -> io::Result<RawModeGuard> {
        Ok(RawModeGuard::inactive())
    }
}

/// Unbuffered reader over the process's standard input.
#[derive(Debug, Default)]
pub struct StdinBytes;

impl ByteSource for StdinBytes {
    fn next_byte(&mut self) -> io::Result<Option<u8>> {
        let mut byte = [0u8; 1];
        loop {
            match io::stdin().lock().read(&mut byte) {
                Ok(0) => return Ok(None),
                Ok(_) => return Ok(Some(byte[0])),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
    }

    fn raw_mode(&self) -> io::Result<RawModeGuard> {
        RawModeGuard::enable()
    }
}

/// Memory-backed byte source that replays a fixed script of keystrokes.
#[derive(Debug, Clone, Default)]
pub struct ScriptedBytes {
    bytes: VecDeque<u8>,
}

impl ScriptedBytes {
    /// Create a source that yields `bytes` in order and then reports end of input.
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        let bytes: Vec<u8> = bytes.into();
        Self {
            bytes: bytes.into(),
        }
    }

    /// Bytes not consumed yet.
    pub fn remaining(&self) -> usize {
        self.bytes.len()
    }
}

impl ByteSource for ScriptedBytes {
    fn next_byte(&mut self) -> io::Result<Option<u8>> {
        Ok(self.bytes.pop_front())
    }
}
