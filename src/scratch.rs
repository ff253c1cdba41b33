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

//! Out-of-core byte storage for line text. Lines are never kept in memory
//! once written here; the line list only remembers `(pos, len)`.

use std::io::{Read, Seek, SeekFrom, Write};

use tempfile::tempfile;

use crate::error::EdError;

/// Byte offset and length of one line's text in the scratch file.
pub type Pos = u64;

/// Append-only scratch store, one per editing session. Mirrors
/// `open_sbuf`/`close_sbuf`/`get_sbuf_line`/`put_sbuf_line` from GNU ed's
/// io.c: a private unlinked temp file, with a "must reseek before the next
/// append" flag that tracks whether a read perturbed the file offset, and
/// a tracked cursor position so a read that's already positioned correctly
/// (e.g. re-reading the line just read) skips its own seek too.
pub struct Scratch {
    file: std::fs::File,
    end: Pos,
    cursor: Pos,
    seek_dirty: bool,
}

impl Scratch {
    /// Opens a fresh scratch file. The file is unlinked immediately on most
    /// platforms by `tempfile`'s guarantee; it is never visible under a
    /// path and is removed when this value (or the process) goes away.
    pub fn open() -> Result<Self, EdError> {
        let file = tempfile().map_err(|e| EdError::Io("open scratch file".into(), e.to_string()))?;
        Ok(Scratch {
            file,
            end: 0,
            cursor: 0,
            seek_dirty: false,
        })
    }

    /// Appends `bytes`, returning the `(pos, len)` descriptor for them.
    /// Reseeks to end-of-file first if a prior read left the file offset
    /// somewhere else.
    pub fn append(&mut self, bytes: &[u8]) -> Result<(Pos, u32), EdError> {
        if self.seek_dirty {
            self.file
                .seek(SeekFrom::End(0))
                .map_err(|e| EdError::Io("write scratch file".into(), e.to_string()))?;
            self.seek_dirty = false;
        }
        let pos = self.end;
        self.file
            .write_all(bytes)
            .map_err(|e| EdError::Io("write scratch file".into(), e.to_string()))?;
        self.end += bytes.len() as u64;
        self.cursor = self.end;
        let len = bytes
            .len()
            .try_into()
            .map_err(|_| EdError::LineCountOverflow)?;
        Ok((pos, len))
    }

    /// Reads back exactly the bytes previously appended at `(pos, len)`.
    /// Only seeks if the current offset differs from `pos` (get_sbuf_line's
    /// `sfpos != lp->pos` check); marks the "must reseek" flag on the way
    /// out, since a future append can no longer assume it's at end-of-file.
    pub fn read(&mut self, pos: Pos, len: u32) -> Result<Vec<u8>, EdError> {
        if self.cursor != pos {
            self.file
                .seek(SeekFrom::Start(pos))
                .map_err(|e| EdError::Io("read scratch file".into(), e.to_string()))?;
        }
        self.seek_dirty = true;
        let mut buf = vec![0u8; len as usize];
        self.file
            .read_exact(&mut buf)
            .map_err(|e| EdError::Io("read scratch file".into(), e.to_string()))?;
        self.cursor = pos + len as u64;
        Ok(buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_then_read_round_trips() {
        let mut s = Scratch::open().unwrap();
        let (pos1, len1) = s.append(b"hello").unwrap();
        let (pos2, len2) = s.append(b"world").unwrap();
        assert_eq!(s.read(pos1, len1).unwrap(), b"hello");
        assert_eq!(s.read(pos2, len2).unwrap(), b"world");
    }

    #[test]
    fn repeated_read_of_same_span_stays_correct() {
        let mut s = Scratch::open().unwrap();
        let (pos, len) = s.append(b"repeat me").unwrap();
        assert_eq!(s.read(pos, len).unwrap(), b"repeat me");
        assert_eq!(s.read(pos, len).unwrap(), b"repeat me");
    }

    #[test]
    fn interleaved_reads_and_appends_stay_consistent() {
        let mut s = Scratch::open().unwrap();
        let (p1, l1) = s.append(b"first line").unwrap();
        assert_eq!(s.read(p1, l1).unwrap(), b"first line");
        let (p2, l2) = s.append(b"second line").unwrap();
        assert_eq!(s.read(p1, l1).unwrap(), b"first line");
        assert_eq!(s.read(p2, l2).unwrap(), b"second line");
    }
}
