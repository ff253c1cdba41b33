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

//! Active set for the `g`/`v`/`G`/`V` global commands: the set of lines a
//! global command will visit, plus the pruning hook that keeps iteration
//! coherent when the command list deletes or moves lines out from under
//! it.
//!
//! Stored by line [`Handle`](crate::buffer::Handle) rather than by address
//! -- addresses shift under mutation, handles don't -- and owned by the
//! editor session instead of a process-global static, so it composes with
//! the arena-based buffer redesign.

use crate::buffer::{EdBuffer, Handle};
use crate::error::EdError;

pub struct ActiveSet {
    entries: Vec<Option<Handle>>,
    idx: usize,
    idxm: usize,
}

impl ActiveSet {
    pub fn new() -> Self {
        ActiveSet {
            entries: Vec::new(),
            idx: 0,
            idxm: 0,
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.idx = 0;
        self.idxm = 0;
    }

    pub fn push(&mut self, h: Handle) -> Result<(), EdError> {
        if self.entries.len() >= 10_000_000 {
            return Err(EdError::LineCountOverflow);
        }
        self.entries.push(Some(h));
        Ok(())
    }

    /// Builds the active set by scanning `[first, last]`, testing each
    /// line's text against `matches`. `invert` selects `v`/`V` semantics
    /// (keep non-matching lines).
    pub fn build(
        &mut self,
        buffer: &mut EdBuffer,
        first: usize,
        last: usize,
        mut matches: impl FnMut(&[u8]) -> bool,
        invert: bool,
    ) -> Result<(), EdError> {
        self.clear();
        for addr in first..=last {
            let text = buffer.line_text(addr)?;
            let is_match = matches(&text);
            if is_match != invert {
                let h = buffer.handle_at(addr).ok_or(EdError::InvalidAddress)?;
                self.push(h)?;
            }
        }
        Ok(())
    }

    /// Returns the next non-null entry's current address, advancing past
    /// it. `None` once exhausted.
    pub fn next(&mut self, buffer: &EdBuffer) -> Option<usize> {
        while self.idx < self.entries.len() {
            let cur = self.idx;
            self.idx += 1;
            if let Some(h) = self.entries[cur] {
                if let Some(addr) = buffer.addr_of(h) {
                    return Some(addr);
                }
            }
        }
        None
    }

    /// Pruning hook: called after a sub-command in the global command list
    /// deletes or moves lines, so entries pointing at one of those lines
    /// are nulled out rather than revisited at a stale address. `handles`
    /// is the chain of lines the sub-command actually unlinked or
    /// relocated, per `original_source/src/global.c`'s
    /// `unset_active_nodes(bp, ep)` (which matches by node pointer, not by
    /// address, and only over the removed/moved range).
    pub fn unset_handles(&mut self, handles: &[Handle]) {
        for target in handles {
            let len = self.entries.len();
            if len == 0 {
                return;
            }
            for _ in 0..len {
                if self.idxm >= len {
                    self.idxm = 0;
                }
                if self.entries[self.idxm] == Some(*target) {
                    self.entries[self.idxm] = None;
                    break;
                }
                self.idxm += 1;
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for ActiveSet {
    fn default() -> Self {
        Self::new()
    }
}
