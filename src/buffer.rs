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

//! Line buffer: arena-owned line descriptors addressed by stable handle,
//! a circular doubly-linked line list with a positional cache, a yank
//! buffer, a mark table, and the single-level undo journal.
//!
//! The line list never owns raw pointers (see buffer.c's `line_t` /
//! `q_forw`/`q_back`): every link is a `Handle` into `EdBuffer::arena`, and
//! a node is only ever reclaimed when the undo journal's `clear()` drops the
//! last reference to it.

use crate::error::EdError;
use crate::scratch::{Pos, Scratch};

/// Stable index into the line arena. `0` is always the sentinel head.
pub type Handle = usize;

const HEAD: Handle = 0;

#[derive(Clone, Copy)]
struct LineNode {
    pos: Pos,
    len: u32,
    prev: Handle,
    next: Handle,
}

/// Safety limits to prevent resource exhaustion (matching GNU ed behavior).
pub struct SafetyLimits {
    pub max_file_size: usize,
    pub max_line_length: usize,
    pub max_buffer_lines: usize,
    pub max_recursion_depth: usize,
}

impl Default for SafetyLimits {
    fn default() -> Self {
        Self {
            max_file_size: 1024 * 1024 * 1024,
            max_line_length: 1024 * 1024,
            max_buffer_lines: 10_000_000,
            max_recursion_depth: 1000,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum AtomKind {
    Add,
    Del,
    Mov,
    VMov,
}

/// One reversible journal entry. `before` is the handle immediately
/// preceding `[head..tail]` at the position this atom would restore on
/// undo; unused (and ignored) for `Add`.
struct UndoAtom {
    kind: AtomKind,
    head: Handle,
    tail: Handle,
    before: Handle,
}

struct Snapshot {
    current_addr: usize,
    last_addr: usize,
    modified: bool,
}

/// Line buffer with GNU ed semantics, backed by a scratch file and an
/// arena of stable-handle line descriptors instead of an in-memory
/// `VecDeque<String>`.
pub struct EdBuffer {
    scratch: Scratch,
    arena: Vec<Option<LineNode>>,
    free: Vec<Handle>,

    current_addr_: usize,
    last_addr_: usize,
    modified_: bool,
    isbinary_: bool,
    pub filename: Option<String>,
    pub limits: SafetyLimits,

    // position cache: (handle, address)
    cache: Option<(Handle, usize)>,

    atoms: Vec<UndoAtom>,
    snapshot: Option<Snapshot>,

    yank_head: Handle,
    yank_tail_cache: Option<(Handle, usize)>,
    yank_count: usize,

    marks: [Option<Handle>; 26],

    unterminated: Option<Handle>,

    // global-command pruning: set while a `g`/`v`/`G`/`V` command list is
    // running, so delete_lines/move_lines record the ranges they unlink or
    // relocate for the active set to null out (original_source/buffer.c's
    // `isglobal` parameter and its `unset_active_nodes` calls).
    in_global: bool,
    pruned: Vec<(Handle, Handle)>,
}

impl EdBuffer {
    pub fn new(scratch: Scratch) -> Self {
        let mut arena = Vec::new();
        arena.push(Some(LineNode {
            pos: 0,
            len: 0,
            prev: HEAD,
            next: HEAD,
        }));
        Self {
            scratch,
            arena,
            free: Vec::new(),
            current_addr_: 0,
            last_addr_: 0,
            modified_: false,
            isbinary_: false,
            filename: None,
            limits: SafetyLimits::default(),
            cache: None,
            atoms: Vec::new(),
            snapshot: None,
            yank_head: HEAD,
            yank_tail_cache: None,
            yank_count: 0,
            marks: [None; 26],
            unterminated: None,
            in_global: false,
            pruned: Vec::new(),
        }
    }

    /// Marks the start of a `g`/`v`/`G`/`V` command list's execution, so
    /// subsequent `delete_lines`/`move_lines` calls record the ranges they
    /// affect instead of discarding them.
    pub fn begin_global(&mut self) {
        self.in_global = true;
        self.pruned.clear();
    }

    /// Ends global-command tracking and discards anything unread.
    pub fn end_global(&mut self) {
        self.in_global = false;
        self.pruned.clear();
    }

    /// Drains the ranges recorded since the last call (or since
    /// `begin_global`), each a `(head, tail)` handle pair following `next`.
    pub fn take_pruned(&mut self) -> Vec<(Handle, Handle)> {
        std::mem::take(&mut self.pruned)
    }

    /// Collects the handles from `head` to `tail` inclusive, following
    /// `next`. Used to resolve a pruned range into the handles an
    /// [`ActiveSet`](crate::global::ActiveSet) should null out.
    pub fn range_handles(&self, head: Handle, tail: Handle) -> Vec<Handle> {
        let mut out = Vec::new();
        let mut h = head;
        loop {
            out.push(h);
            if h == tail {
                break;
            }
            h = self.node(h).next;
        }
        out
    }

    // ---- simple accessors, matching the teacher's naming ----

    pub fn current_addr(&self) -> usize {
        self.current_addr_
    }

    pub fn set_current_addr(&mut self, addr: usize) {
        self.current_addr_ = addr;
    }

    pub fn inc_current_addr(&mut self) -> usize {
        if self.current_addr_ < self.last_addr_ {
            self.current_addr_ += 1;
        }
        self.current_addr_
    }

    pub fn last_addr(&self) -> usize {
        self.last_addr_
    }

    pub fn isbinary(&self) -> bool {
        self.isbinary_
    }

    pub fn set_binary(&mut self, b: bool) {
        self.isbinary_ = b;
    }

    pub fn modified(&self) -> bool {
        self.modified_
    }

    pub fn set_modified(&mut self, m: bool) {
        self.modified_ = m;
    }

    /// Records which line, if any, was read from its source file without a
    /// trailing newline (original_source/src/io.c's `unterminated_line`).
    pub fn set_unterminated(&mut self, h: Option<Handle>) {
        self.unterminated = h;
    }

    /// True if the tracked unterminated line is still the buffer's last
    /// line -- once anything is appended after it, it no longer governs
    /// how the buffer is written back out.
    pub fn is_unterminated_last_line(&self) -> bool {
        match self.unterminated {
            Some(h) => self.addr_of(h) == Some(self.last_addr_),
            None => false,
        }
    }

    pub fn valid_addr(&self, addr: usize) -> bool {
        addr <= self.last_addr_
    }

    pub fn valid_addr_range(&self, first: usize, second: usize) -> bool {
        first >= 1 && first <= second && second <= self.last_addr_
    }

    // ---- line list lookups ----

    fn node(&self, h: Handle) -> &LineNode {
        self.arena[h].as_ref().expect("dangling line handle")
    }

    fn node_mut(&mut self, h: Handle) -> &mut LineNode {
        self.arena[h].as_mut().expect("dangling line handle")
    }

    /// Resolves an address to its line handle by walking from whichever of
    /// {head, tail (via last_addr), cache} is fewest steps away.
    pub fn handle_at(&mut self, addr: usize) -> Option<Handle> {
        if addr == 0 {
            return Some(HEAD);
        }
        if addr > self.last_addr_ {
            return None;
        }

        // Candidates: walk forward from the sentinel head, or from the
        // cache (forward or backward, whichever direction `addr` lies).
        // There is no dedicated tail handle to walk backward from -- the
        // cache is what makes repeated nearby lookups cheap instead.
        let mut best: (usize, Handle, usize) = (addr, HEAD, 0);
        if let Some((h, a)) = self.cache {
            let delta = if a > addr { a - addr } else { addr - a };
            if delta < best.0 {
                best = (delta, h, a);
            }
        }
        let (_, mut h, mut a) = best;

        while a < addr {
            h = self.node(h).next;
            a += 1;
        }
        while a > addr {
            h = self.node(h).prev;
            a -= 1;
        }
        self.cache = Some((h, addr));
        Some(h)
    }

    /// Linear scan used to validate marks and recompute an address from a
    /// handle that may no longer be linked (`None` in that case).
    pub fn addr_of(&self, target: Handle) -> Option<usize> {
        let mut h = HEAD;
        let mut addr = 0;
        loop {
            h = self.node(h).next;
            if h == HEAD {
                return None;
            }
            addr += 1;
            if h == target {
                return Some(addr);
            }
        }
    }

    fn alloc_node(&mut self, pos: Pos, len: u32) -> Handle {
        let node = LineNode {
            pos,
            len,
            prev: HEAD,
            next: HEAD,
        };
        if let Some(h) = self.free.pop() {
            self.arena[h] = Some(node);
            h
        } else {
            self.arena.push(Some(node));
            self.arena.len() - 1
        }
    }

    /// Reads a line's text out of the scratch store.
    pub fn line_text(&mut self, addr: usize) -> Result<Vec<u8>, EdError> {
        let h = self.handle_at(addr).ok_or(EdError::InvalidAddress)?;
        let (pos, len) = {
            let n = self.node(h);
            (n.pos, n.len)
        };
        self.scratch.read(pos, len)
    }

    // ---- structural primitives (insert_after / unlink / splice_before) ----

    /// Inserts one line of text after `addr` (0 = before the first line).
    /// Returns the new line's handle. Journals an `Add` atom (or extends
    /// the most recent one -- see `extend_tail`).
    pub fn insert_after(&mut self, addr: usize, text: &[u8]) -> Result<Handle, EdError> {
        if self.last_addr_ + 1 > self.limits.max_buffer_lines {
            return Err(EdError::LineCountOverflow);
        }
        let (pos, len) = self.scratch.append(text)?;
        let before = self.handle_at(addr).ok_or(EdError::InvalidAddress)?;
        let after = self.node(before).next;
        let h = self.alloc_node(pos, len);
        self.node_mut(h).prev = before;
        self.node_mut(h).next = after;
        self.node_mut(before).next = h;
        self.node_mut(after).prev = h;
        self.last_addr_ += 1;
        self.cache = Some((h, addr + 1));
        Ok(h)
    }

    /// Unlinks `[head..tail]` (inclusive, following `next`) from whichever
    /// list currently holds them and returns the handle that used to
    /// precede `head` (needed so the caller can journal where to restore
    /// them).
    fn unlink_range(&mut self, head: Handle, tail: Handle) -> Handle {
        let before = self.node(head).prev;
        let after = self.node(tail).next;
        self.node_mut(before).next = after;
        self.node_mut(after).prev = before;
        self.cache = None;
        before
    }

    /// Splices an already-detached `[head..tail]` chain back in,
    /// immediately after `before` (0 = at the very front).
    fn splice_before(&mut self, before: Handle, head: Handle, tail: Handle) {
        let after = self.node(before).next;
        self.node_mut(before).next = head;
        self.node_mut(head).prev = before;
        self.node_mut(tail).next = after;
        self.node_mut(after).prev = tail;
        self.cache = None;
    }

    fn count_range(&self, head: Handle, tail: Handle) -> usize {
        let mut n = 1;
        let mut h = head;
        while h != tail {
            h = self.node(h).next;
            n += 1;
        }
        n
    }

    // ---- undo journal ----

    /// Takes the `(current_addr, last_addr, modified)` snapshot for a new
    /// top-level mutating command and clears the previous command's atoms.
    /// Called once per command, once per whole global -- not once per line
    /// visited inside a global.
    pub fn begin_command(&mut self) {
        self.atoms.clear();
        self.snapshot = Some(Snapshot {
            current_addr: self.current_addr_,
            last_addr: self.last_addr_,
            modified: self.modified_,
        });
    }

    fn push_atom(&mut self, kind: AtomKind, head: Handle, tail: Handle, before: Handle) {
        self.atoms.push(UndoAtom {
            kind,
            head,
            tail,
            before,
        });
    }

    /// Advances the tail of the most recently pushed `Add` atom -- used
    /// when one logical command appends several lines (multi-line `a`,
    /// substitution expanding into more than one output line).
    fn extend_tail(&mut self, new_tail: Handle) {
        if let Some(atom) = self.atoms.last_mut() {
            if atom.kind == AtomKind::Add {
                atom.tail = new_tail;
                return;
            }
        }
        // no pending Add atom: this insert stands alone
        self.atoms.push(UndoAtom {
            kind: AtomKind::Add,
            head: new_tail,
            tail: new_tail,
            before: HEAD,
        });
    }

    /// Deletes `[first, last]` (1-based, inclusive). Journals a `Del` atom.
    pub fn delete_lines(&mut self, first: usize, last: usize) -> Result<(), EdError> {
        if !self.valid_addr_range(first, last) {
            return Err(EdError::InvalidAddress);
        }
        let head = self.handle_at(first).ok_or(EdError::InvalidAddress)?;
        let tail = self.handle_at(last).ok_or(EdError::InvalidAddress)?;
        if self.in_global {
            self.pruned.push((head, tail));
        }
        let n = self.count_range(head, tail);
        let before = self.unlink_range(head, tail);
        self.last_addr_ -= n;
        self.current_addr_ = first.saturating_sub(1).min(self.last_addr_);
        self.push_atom(AtomKind::Del, head, tail, before);
        self.modified_ = true;
        self.unmark_range(head, tail);
        Ok(())
    }

    /// Inserts `texts` after `addr`, one line each, as a single undoable
    /// unit. Returns the handle of the last inserted line.
    pub fn append_lines(&mut self, addr: usize, texts: &[Vec<u8>]) -> Result<Handle, EdError> {
        let mut at = addr;
        let mut last_h = self.handle_at(addr).ok_or(EdError::InvalidAddress)?;
        for (i, text) in texts.iter().enumerate() {
            let h = self.insert_after(at, text)?;
            if i == 0 {
                self.push_atom(AtomKind::Add, h, h, self.handle_at(addr).unwrap_or(HEAD));
            } else {
                self.extend_tail(h);
            }
            last_h = h;
            at += 1;
        }
        self.modified_ = true;
        Ok(last_h)
    }

    /// Moves `[first, last]` to after `dest`. `dest` must not fall inside
    /// the source range.
    pub fn move_lines(&mut self, first: usize, last: usize, dest: usize) -> Result<(), EdError> {
        if !self.valid_addr_range(first, last) {
            return Err(EdError::InvalidAddress);
        }
        if dest >= first.saturating_sub(1) && dest <= last {
            return Err(EdError::DestinationInSource);
        }
        let head = self.handle_at(first).ok_or(EdError::InvalidAddress)?;
        let tail = self.handle_at(last).ok_or(EdError::InvalidAddress)?;
        let old_before = self.unlink_range(head, tail);
        let dest_addr = if dest > last { dest - self.count_range(head, tail) } else { dest };
        let dest_handle = self.handle_at(dest_addr).ok_or(EdError::InvalidAddress)?;
        self.splice_before(dest_handle, head, tail);
        self.push_atom(AtomKind::Mov, head, tail, old_before);
        if self.in_global {
            self.pruned.push((head, tail));
        }
        self.current_addr_ = dest_addr + self.count_range(head, tail);
        self.modified_ = true;
        Ok(())
    }

    /// Copies `[first, last]` after `dest`, duplicating descriptors (not
    /// scratch bytes -- the text is immutable once written, so the copy
    /// just references the same `(pos, len)` pairs).
    pub fn copy_lines(&mut self, first: usize, last: usize, dest: usize) -> Result<(), EdError> {
        if !self.valid_addr_range(first, last) {
            return Err(EdError::InvalidAddress);
        }
        let mut src_h = self.handle_at(first).ok_or(EdError::InvalidAddress)?;
        let mut at = dest;
        let mut first_new: Option<Handle> = None;
        for _ in first..=last {
            let (pos, len) = {
                let n = self.node(src_h);
                (n.pos, n.len)
            };
            let before = self.handle_at(at).ok_or(EdError::InvalidAddress)?;
            let after = self.node(before).next;
            let h = self.alloc_node(pos, len);
            self.node_mut(h).prev = before;
            self.node_mut(h).next = after;
            self.node_mut(before).next = h;
            self.node_mut(after).prev = h;
            self.last_addr_ += 1;
            self.cache = None;
            if first_new.is_none() {
                first_new = Some(h);
                self.push_atom(AtomKind::Add, h, h, before);
            } else {
                self.extend_tail(h);
            }
            at += 1;
            src_h = self.node(src_h).next;
        }
        self.current_addr_ = at - 1;
        self.modified_ = true;
        Ok(())
    }

    /// Joins `[first, last]` into one line, separated by a single newline
    /// at each original boundary.
    pub fn join_lines(&mut self, first: usize, last: usize) -> Result<(), EdError> {
        if first == last {
            return Ok(());
        }
        if !self.valid_addr_range(first, last) {
            return Err(EdError::InvalidAddress);
        }
        let mut joined = Vec::new();
        for addr in first..=last {
            if addr != first {
                joined.push(b'\n');
            }
            joined.extend(self.line_text(addr)?);
        }
        self.delete_lines(first, last)?;
        let h = self.insert_after(first - 1, &joined)?;
        self.extend_tail(h);
        self.current_addr_ = first;
        Ok(())
    }

    /// Yanks `[first, last]` into the yank buffer (cleared first), as
    /// copies referencing the same scratch bytes.
    pub fn yank_lines(&mut self, first: usize, last: usize) -> Result<(), EdError> {
        if !self.valid_addr_range(first, last) {
            return Err(EdError::InvalidAddress);
        }
        self.clear_yank();
        let mut src_h = self.handle_at(first).ok_or(EdError::InvalidAddress)?;
        let mut prev = HEAD;
        let mut head_new = HEAD;
        for i in first..=last {
            let (pos, len) = {
                let n = self.node(src_h);
                (n.pos, n.len)
            };
            let h = self.alloc_node(pos, len);
            if i == first {
                head_new = h;
            } else {
                self.node_mut(prev).next = h;
                self.node_mut(h).prev = prev;
            }
            prev = h;
            self.yank_count += 1;
            if i < last {
                src_h = self.node(src_h).next;
            }
        }
        self.yank_head = head_new;
        self.yank_tail_cache = Some((prev, self.yank_count));
        Ok(())
    }

    fn clear_yank(&mut self) {
        let mut h = self.yank_head;
        for _ in 0..self.yank_count {
            let next = self.node(h).next;
            self.free_node(h);
            h = next;
        }
        self.yank_head = HEAD;
        self.yank_tail_cache = None;
        self.yank_count = 0;
    }

    fn free_node(&mut self, h: Handle) {
        self.arena[h] = None;
        self.free.push(h);
    }

    /// Appends the yank buffer's contents after `addr` (the `x` command).
    pub fn put_yank_after(&mut self, addr: usize) -> Result<(), EdError> {
        if self.yank_count == 0 {
            return Err(EdError::NothingToPut);
        }
        let texts: Vec<Vec<u8>> = {
            let mut out = Vec::with_capacity(self.yank_count);
            let mut h = self.yank_head;
            for _ in 0..self.yank_count {
                let (pos, len) = {
                    let n = self.node(h);
                    (n.pos, n.len)
                };
                out.push(self.scratch.read(pos, len)?);
                h = self.node(h).next;
            }
            out
        };
        let last_h = self.append_lines(addr, &texts)?;
        self.current_addr_ = self.addr_of(last_h).unwrap_or(addr + texts.len());
        Ok(())
    }

    // ---- marks ----

    pub fn mark_line(&mut self, addr: usize, mark: char) -> Result<(), EdError> {
        let idx = mark_index(mark)?;
        let h = self.handle_at(addr).ok_or(EdError::InvalidAddress)?;
        self.marks[idx] = Some(h);
        Ok(())
    }

    pub fn marked_addr(&mut self, mark: char) -> Result<usize, EdError> {
        let idx = mark_index(mark)?;
        let h = self.marks[idx].ok_or(EdError::InvalidAddress)?;
        self.addr_of(h).ok_or(EdError::InvalidAddress)
    }

    fn unmark_range(&mut self, head: Handle, tail: Handle) {
        let mut in_range = std::collections::HashSet::new();
        let mut h = head;
        loop {
            in_range.insert(h);
            if h == tail {
                break;
            }
            h = self.node(h).next;
        }
        for slot in self.marks.iter_mut() {
            if let Some(h) = slot {
                if in_range.contains(h) {
                    *slot = None;
                }
            }
        }
        if let Some(h) = self.unterminated {
            if in_range.contains(&h) {
                self.unterminated = None;
            }
        }
    }

    // ---- undo ----

    pub fn undo(&mut self) -> Result<(), EdError> {
        let snapshot = self.snapshot.take().ok_or(EdError::NothingToUndo)?;
        let cur = Snapshot {
            current_addr: self.current_addr_,
            last_addr: self.last_addr_,
            modified: self.modified_,
        };
        let atoms = std::mem::take(&mut self.atoms);
        let mut redo = Vec::with_capacity(atoms.len());
        for atom in atoms.into_iter().rev() {
            redo.push(self.undo_one(atom));
        }
        self.atoms = redo;
        self.snapshot = Some(cur);
        self.current_addr_ = snapshot.current_addr;
        self.last_addr_ = snapshot.last_addr;
        self.modified_ = snapshot.modified;
        Ok(())
    }

    fn undo_one(&mut self, atom: UndoAtom) -> UndoAtom {
        match atom.kind {
            AtomKind::Add | AtomKind::Mov => {
                let cur_before = self.node(atom.head).prev;
                let n = self.count_range(atom.head, atom.tail);
                self.unlink_range(atom.head, atom.tail);
                match atom.kind {
                    AtomKind::Add => {
                        self.last_addr_ -= n;
                    }
                    AtomKind::Mov => {
                        self.splice_before(atom.before, atom.head, atom.tail);
                    }
                    _ => unreachable!(),
                }
                UndoAtom {
                    kind: if atom.kind == AtomKind::Add {
                        AtomKind::Del
                    } else {
                        AtomKind::VMov
                    },
                    head: atom.head,
                    tail: atom.tail,
                    before: cur_before,
                }
            }
            AtomKind::Del | AtomKind::VMov => {
                let n = self.count_range(atom.head, atom.tail);
                self.splice_before(atom.before, atom.head, atom.tail);
                if atom.kind == AtomKind::Del {
                    self.last_addr_ += n;
                }
                UndoAtom {
                    kind: if atom.kind == AtomKind::Del {
                        AtomKind::Add
                    } else {
                        AtomKind::Mov
                    },
                    head: atom.head,
                    tail: atom.tail,
                    before: HEAD,
                }
            }
        }
    }

    /// Drops arena nodes referenced only by `Del` atoms -- the arena's
    /// reclamation point per the handle-based redesign.
    pub fn clear_undo_stack(&mut self) {
        let atoms = std::mem::take(&mut self.atoms);
        for atom in atoms {
            if matches!(atom.kind, AtomKind::Del | AtomKind::VMov) {
                let mut h = atom.head;
                loop {
                    let next = self.node(h).next;
                    self.free_node(h);
                    if h == atom.tail {
                        break;
                    }
                    h = next;
                }
            }
        }
        self.snapshot = None;
    }
}

fn mark_index(mark: char) -> Result<usize, EdError> {
    if mark.is_ascii_lowercase() {
        Ok(mark as usize - 'a' as usize)
    } else {
        Err(EdError::InvalidAddress)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fresh() -> EdBuffer {
        EdBuffer::new(Scratch::open().unwrap())
    }

    #[test]
    fn insert_and_read_back() {
        let mut b = fresh();
        b.begin_command();
        b.append_lines(0, &[b"one".to_vec(), b"two".to_vec()]).unwrap();
        assert_eq!(b.last_addr(), 2);
        assert_eq!(b.line_text(1).unwrap(), b"one");
        assert_eq!(b.line_text(2).unwrap(), b"two");
    }

    #[test]
    fn addr_of_is_stable_after_insert() {
        let mut b = fresh();
        b.begin_command();
        b.append_lines(0, &[b"a".to_vec(), b"b".to_vec(), b"c".to_vec()]).unwrap();
        for addr in 1..=3 {
            let h = b.handle_at(addr).unwrap();
            assert_eq!(b.addr_of(h), Some(addr));
        }
    }

    #[test]
    fn delete_then_undo_restores_state() {
        let mut b = fresh();
        b.begin_command();
        b.append_lines(0, &[b"a".to_vec(), b"b".to_vec(), b"c".to_vec()]).unwrap();
        b.clear_undo_stack();

        b.begin_command();
        b.delete_lines(2, 2).unwrap();
        assert_eq!(b.last_addr(), 2);
        assert_eq!(b.line_text(1).unwrap(), b"a");
        assert_eq!(b.line_text(2).unwrap(), b"c");

        b.undo().unwrap();
        assert_eq!(b.last_addr(), 3);
        assert_eq!(b.line_text(1).unwrap(), b"a");
        assert_eq!(b.line_text(2).unwrap(), b"b");
        assert_eq!(b.line_text(3).unwrap(), b"c");
    }

    #[test]
    fn yank_then_put_increases_last_addr_by_yank_count() {
        let mut b = fresh();
        b.begin_command();
        b.append_lines(0, &[b"x".to_vec(), b"y".to_vec()]).unwrap();
        b.clear_undo_stack();

        b.yank_lines(1, 2).unwrap();
        b.begin_command();
        b.put_yank_after(2).unwrap();
        assert_eq!(b.last_addr(), 4);
        assert_eq!(b.line_text(3).unwrap(), b"x");
        assert_eq!(b.line_text(4).unwrap(), b"y");
    }

    #[test]
    fn mark_survives_edits_elsewhere_but_dies_with_its_line() {
        let mut b = fresh();
        b.begin_command();
        b.append_lines(0, &[b"a".to_vec(), b"b".to_vec(), b"c".to_vec()]).unwrap();
        b.clear_undo_stack();
        b.mark_line(3, 'x').unwrap();

        b.begin_command();
        b.insert_after(0, b"zero").unwrap();
        b.clear_undo_stack();
        assert_eq!(b.marked_addr('x').unwrap(), 4);

        b.begin_command();
        b.delete_lines(4, 4).unwrap();
        assert!(b.marked_addr('x').is_err());
    }

    #[test]
    fn move_rejects_destination_inside_source() {
        let mut b = fresh();
        b.begin_command();
        b.append_lines(0, &[b"a".to_vec(), b"b".to_vec(), b"c".to_vec()]).unwrap();
        b.clear_undo_stack();
        b.begin_command();
        assert!(b.move_lines(1, 3, 2).is_err());
    }
}
