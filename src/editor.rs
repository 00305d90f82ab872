//! Raw-mode line input with in-place editing.

use log::{debug, warn};
use nix::sys::termios::{self, LocalFlags, SetArg, SpecialCharacterIndices, Termios};
use std::io::{self, Read, Write};

/// Longest line the editor accepts; input past it is cut off.
pub const LINE_CAPACITY: usize = 4096;

const CTRL_D: u8 = 0x04;
const BACKSPACE: u8 = 0x08;
const TAB: u8 = 0x09;
const ESC: u8 = 0x1b;
const DEL: u8 = 0x7f;

/// Result of one [`LineEditor::read_line`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    /// A finished line, without its newline.
    Line(String),
    /// Ctrl-D or end of input: the user wants to leave the shell.
    Exit,
}

/// Terminal settings with canonical mode and echo switched off.
///
/// The previous settings are restored when the guard is dropped. When
/// standard input is not a terminal the guard does nothing.
pub struct RawMode {
    original: Option<Termios>,
}

impl RawMode {
    pub fn acquire() -> Self {
        let stdin = io::stdin();
        let original = match termios::tcgetattr(&stdin) {
            Ok(original) => original,
            Err(err) => {
                debug!("standard input is not a terminal ({}), keeping its mode", err);
                return Self { original: None };
            }
        };

        let mut raw = original.clone();
        raw.local_flags.remove(LocalFlags::ICANON | LocalFlags::ECHO);
        raw.control_chars[SpecialCharacterIndices::VMIN as usize] = 1;
        raw.control_chars[SpecialCharacterIndices::VTIME as usize] = 0;
        if let Err(err) = termios::tcsetattr(&stdin, SetArg::TCSANOW, &raw) {
            warn!("can't switch terminal to raw mode: {}", err);
            return Self { original: None };
        }
        debug!("terminal in raw mode");
        Self {
            original: Some(original),
        }
    }
}

impl Drop for RawMode {
    fn drop(&mut self) {
        if let Some(original) = self.original.take() {
            if let Err(err) = termios::tcsetattr(io::stdin(), SetArg::TCSANOW, &original) {
                warn!("can't restore terminal mode: {}", err);
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Escape {
    None,
    Started,
    Sequence,
}

/// Reads lines from the keyboard, remembering the last one for up-arrow recall.
#[derive(Debug, Default)]
pub struct LineEditor {
    previous: String,
}

impl LineEditor {
    pub fn new() -> Self {
        Self::default()
    }

    /// The line that up-arrow brings back.
    pub fn previous_line(&self) -> &str {
        &self.previous
    }

    /// Reads one line from standard input with the terminal in raw mode.
    ///
    /// The terminal is restored before this returns, on every path.
    pub fn read_line(&mut self) -> io::Result<Input> {
        let _raw = RawMode::acquire();
        let stdin = io::stdin();
        let stdout = io::stdout();
        self.read_line_from(&mut stdin.lock(), &mut stdout.lock())
    }

    /// Reads one line from `input`, echoing edits to `echo`.
    pub fn read_line_from<R: Read, W: Write>(
        &mut self,
        input: &mut R,
        echo: &mut W,
    ) -> io::Result<Input> {
        let mut buf: Vec<u8> = Vec::with_capacity(LINE_CAPACITY);
        let mut escape = Escape::None;

        loop {
            let Some(byte) = next_byte(input)? else {
                return Ok(Input::Exit);
            };

            match escape {
                Escape::Started => {
                    escape = if byte == b'[' {
                        Escape::Sequence
                    } else {
                        Escape::None
                    };
                    continue;
                }
                // Parameter bytes keep the sequence open, anything else ends it.
                Escape::Sequence if (0x30..=0x3f).contains(&byte) => continue,
                Escape::Sequence => {
                    escape = Escape::None;
                    if byte == b'A' {
                        self.recall(&mut buf, echo)?;
                    }
                    continue;
                }
                Escape::None => {}
            }

            match byte {
                TAB => {
                    buf.push(b'?');
                    echo.write_all(b"?\n")?;
                    break;
                }
                DEL => {
                    if pop_char(&mut buf) {
                        erase(echo, 1)?;
                    }
                }
                ESC => escape = Escape::Started,
                CTRL_D => {
                    echo.flush()?;
                    return Ok(Input::Exit);
                }
                b'\n' | b'\r' => {
                    echo.write_all(b"\n")?;
                    break;
                }
                byte if byte >= 0x20 => {
                    buf.push(byte);
                    echo.write_all(&[byte])?;
                    if buf.len() >= LINE_CAPACITY {
                        break;
                    }
                }
                _ => {}
            }
            echo.flush()?;
        }
        echo.flush()?;

        let line = match String::from_utf8(buf) {
            Ok(line) => line,
            Err(err) => String::from_utf8_lossy(err.as_bytes()).into_owned(),
        };
        self.previous.clone_from(&line);
        Ok(Input::Line(line))
    }

    /// Replaces the buffer, on screen and in memory, with the previous line.
    fn recall<W: Write>(&self, buf: &mut Vec<u8>, echo: &mut W) -> io::Result<()> {
        let shown = String::from_utf8_lossy(buf).chars().count();
        erase(echo, shown)?;
        buf.clear();
        let previous = self.previous.as_bytes();
        buf.extend_from_slice(&previous[..previous.len().min(LINE_CAPACITY)]);
        echo.write_all(buf)?;
        Ok(())
    }
}

fn next_byte<R: Read>(input: &mut R) -> io::Result<Option<u8>> {
    let mut byte = [0u8; 1];
    loop {
        match input.read(&mut byte) {
            Ok(0) => return Ok(None),
            Ok(_) => return Ok(Some(byte[0])),
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => return Err(err),
        }
    }
}

/// Removes the last UTF-8 character. Returns false on an empty buffer.
fn pop_char(buf: &mut Vec<u8>) -> bool {
    while let Some(byte) = buf.pop() {
        if byte & 0xc0 != 0x80 {
            return true;
        }
    }
    false
}

/// Moves back over `count` cells, blanking each one.
fn erase<W: Write>(echo: &mut W, count: usize) -> io::Result<()> {
    for _ in 0..count {
        echo.write_all(&[BACKSPACE, b' ', BACKSPACE])?;
    }
    Ok(())
}
