// rust-ed - Memory-safe replacement for GNU ed
// Copyright (C) 2025 Brian Boynton, MD
//
// This file is part of rust-ed.
//
// rust-ed is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// rust-ed is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with rust-ed.  If not, see <https://www.gnu.org/licenses/>.

//! Pretty-printer and file/pipe I/O adapter. Reads and writes now go
//! through the scratch-store-backed [`EdBuffer`] instead of a `Vec<String>`.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::process::{Command, Stdio};

use crate::buffer::EdBuffer;
use crate::error::EdError;

/// Matches ed.h's `Pflags` bit layout exactly.
pub const PF_L: u32 = 0x01;
pub const PF_N: u32 = 0x02;
pub const PF_P: u32 = 0x04;

/// Optional pre-print transform, grounding the original's `sh.cpp`/`sh.h`
/// syntax-highlight collaborator. A failing or absent highlighter falls
/// back to passing bytes through unchanged -- failures are never surfaced
/// to the user as an editor error.
pub trait Highlighter {
    fn highlight(&self, bytes: &[u8], lang: &str) -> Vec<u8>;
}

pub struct NoHighlighter;
impl Highlighter for NoHighlighter {
    fn highlight(&self, bytes: &[u8], _lang: &str) -> Vec<u8> {
        bytes.to_vec()
    }
}

pub fn escchar(ch: u8) -> Option<char> {
    match ch {
        0x07 => Some('a'),
        0x08 => Some('b'),
        0x0c => Some('f'),
        b'\n' => Some('n'),
        b'\r' => Some('r'),
        b'\t' => Some('t'),
        0x0b => Some('v'),
        _ => None,
    }
}

/// Escapes one line's bytes for `l` mode: named escapes for the common
/// control codes, 3-digit octal for anything else non-printable, a
/// trailing `$`, long lines broken with a trailing `\` continuation.
pub fn format_list_line(bytes: &[u8], width: usize) -> String {
    let mut out = String::new();
    let mut col = 0;
    for &b in bytes {
        let piece = if b == b'\\' {
            "\\\\".to_string()
        } else if let Some(c) = escchar(b) {
            format!("\\{}", c)
        } else if b < 0x20 || b >= 0x7f {
            format!("\\{:03o}", b)
        } else {
            (b as char).to_string()
        };
        if width > 0 && col + piece.len() > width {
            out.push_str("\\\n");
            col = 0;
        }
        col += piece.len();
        out.push_str(&piece);
    }
    out.push('$');
    out
}

/// Renders one line with the given suffix flags and writes it to `out`.
pub fn print_line(
    buffer: &mut EdBuffer,
    addr: usize,
    flags: u32,
    highlighter: &dyn Highlighter,
    lang: Option<&str>,
    out: &mut dyn Write,
) -> Result<(), EdError> {
    let text = buffer.line_text(addr)?;
    let text = match lang {
        Some(l) => highlighter.highlight(&text, l),
        None => text,
    };
    let mut rendered = String::new();
    if flags & PF_N != 0 {
        rendered.push_str(&format!("{}\t", addr));
    }
    if flags & PF_L != 0 {
        rendered.push_str(&format_list_line(&text, 80));
    } else {
        rendered.push_str(&String::from_utf8_lossy(&text));
    }
    writeln!(out, "{}", rendered).map_err(|e| EdError::Io("write output".into(), e.to_string()))
}

/// Prints `[from, to]`, leaving `current_addr` at `to`.
pub fn print_lines(
    buffer: &mut EdBuffer,
    from: usize,
    to: usize,
    flags: u32,
    highlighter: &dyn Highlighter,
    lang: Option<&str>,
    out: &mut dyn Write,
) -> Result<(), EdError> {
    if from == 0 || from > to || to > buffer.last_addr() {
        return Err(EdError::InvalidAddress);
    }
    for addr in from..=to {
        print_line(buffer, addr, flags, highlighter, lang, out)?;
    }
    buffer.set_current_addr(to);
    Ok(())
}

fn strip_crlf(line: &mut Vec<u8>, strip_cr: bool) {
    if strip_cr && line.last() == Some(&b'\r') {
        line.pop();
    }
}

/// Reads lines from `reader` into `buffer` after `addr`, returning the byte
/// count read. If the final line read lacked a trailing newline, records it
/// via `buffer.set_unterminated`.
fn read_lines_into(
    buffer: &mut EdBuffer,
    mut addr: usize,
    reader: &mut dyn BufRead,
    strip_cr: bool,
) -> Result<usize, EdError> {
    let mut total = 0usize;
    let mut texts = Vec::new();
    let mut saw_nul = false;
    let mut last_unterminated = false;
    loop {
        let mut raw = Vec::new();
        let n = reader
            .read_until(b'\n', &mut raw)
            .map_err(|e| EdError::Io("read file".into(), e.to_string()))?;
        if n == 0 {
            break;
        }
        total += n;
        let terminated = raw.last() == Some(&b'\n');
        if terminated {
            raw.pop();
        }
        strip_crlf(&mut raw, strip_cr);
        if raw.contains(&0) {
            saw_nul = true;
        }
        last_unterminated = !terminated;
        texts.push(raw);
        if last_unterminated {
            break;
        }
    }
    let count = texts.len();
    if count > 0 {
        let last_handle = buffer.append_lines(addr, &texts)?;
        addr += count;
        if last_unterminated {
            buffer.set_unterminated(Some(last_handle));
        }
    }
    if saw_nul {
        buffer.set_binary(true);
    }
    let _ = addr;
    Ok(total)
}

/// Reads `filename` (or, if it starts with `!`, a shell command's stdout)
/// into `buffer` after `addr`. Returns the byte count, matching GNU ed's
/// "print the byte count after a read" behavior (suppressed by the caller
/// when scripted).
pub fn read_file(
    buffer: &mut EdBuffer,
    filename: &str,
    addr: usize,
    strip_cr: bool,
) -> Result<usize, EdError> {
    if let Some(cmd) = filename.strip_prefix('!') {
        let output = Command::new("/bin/sh")
            .arg("-c")
            .arg(cmd)
            .output()
            .map_err(|e| EdError::Io("run shell command".into(), e.to_string()))?;
        let mut reader: &[u8] = &output.stdout;
        return read_lines_into(buffer, addr, &mut reader, strip_cr);
    }
    let file = File::open(filename)
        .map_err(|e| EdError::Io(filename.to_string(), e.to_string()))?;
    let mut reader = BufReader::new(file);
    read_lines_into(buffer, addr, &mut reader, strip_cr)
}

/// Writes `[from, to]` to `filename` (or a shell command's stdin, if it
/// starts with `!`). `append` selects `W` (append) vs `w` (truncate).
pub fn write_file(
    buffer: &mut EdBuffer,
    filename: &str,
    from: usize,
    to: usize,
    append: bool,
) -> Result<usize, EdError> {
    if let Some(cmd) = filename.strip_prefix('!') {
        let mut child = Command::new("/bin/sh")
            .arg("-c")
            .arg(cmd)
            .stdin(Stdio::piped())
            .spawn()
            .map_err(|e| EdError::Io("run shell command".into(), e.to_string()))?;
        let total = {
            let stdin = child.stdin.as_mut().expect("piped stdin");
            write_stream(buffer, from, to, stdin)?
        };
        child
            .wait()
            .map_err(|e| EdError::Io("run shell command".into(), e.to_string()))?;
        return Ok(total);
    }
    let file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(!append)
        .append(append)
        .open(filename)
        .map_err(|e| EdError::Io(filename.to_string(), e.to_string()))?;
    let mut writer = BufWriter::new(file);
    let total = write_stream(buffer, from, to, &mut writer)?;
    writer
        .flush()
        .map_err(|e| EdError::Io(filename.to_string(), e.to_string()))?;
    Ok(total)
}

fn write_stream(
    buffer: &mut EdBuffer,
    from: usize,
    to: usize,
    out: &mut dyn Write,
) -> Result<usize, EdError> {
    if from == 0 && to == 0 {
        return Ok(0);
    }
    if from > to || to > buffer.last_addr() {
        return Err(EdError::InvalidAddress);
    }
    let mut total = 0;
    for addr in from..=to {
        let text = buffer.line_text(addr)?;
        out.write_all(&text)
            .map_err(|e| EdError::Io("write file".into(), e.to_string()))?;
        total += text.len();
        let is_last_unterminated = addr == buffer.last_addr() && buffer.is_unterminated_last_line();
        if !is_last_unterminated {
            out.write_all(b"\n")
                .map_err(|e| EdError::Io("write file".into(), e.to_string()))?;
            total += 1;
        }
    }
    Ok(total)
}
