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

//! SIGHUP/SIGINT/SIGWINCH wiring and the reentrancy-guard bracketing that
//! defers signal delivery away from structural mutation.
//!
//! The actual OS-level handlers (registered via `nix::sys::signal::sigaction`)
//! do nothing but set an `AtomicBool` pending flag -- the only thing that is
//! genuinely async-signal-safe. The real work (writing the recovery file,
//! raising `EdError::Interrupted`) happens in [`enable_interrupts`], called
//! at the safe point where the reentrancy-guard depth returns to zero.

use std::env;
use std::io::Write;
use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};

use nix::sys::signal::{sigaction, SaFlags, SigAction, SigHandler, SigSet, Signal};

use crate::buffer::EdBuffer;
use crate::error::EdError;

static GUARD_DEPTH: AtomicI32 = AtomicI32::new(0);
static SIGHUP_PENDING: AtomicBool = AtomicBool::new(false);
static SIGINT_PENDING: AtomicBool = AtomicBool::new(false);

static USER_LINES: AtomicI32 = AtomicI32::new(-1);
static WINDOW_LINES: AtomicI32 = AtomicI32::new(22);
static WINDOW_COLUMNS: AtomicI32 = AtomicI32::new(76);

extern "C" fn on_sighup(_signum: i32) {
    SIGHUP_PENDING.store(true, Ordering::SeqCst);
}

extern "C" fn on_sigint(_signum: i32) {
    SIGINT_PENDING.store(true, Ordering::SeqCst);
}

extern "C" fn on_sigwinch(_signum: i32) {
    if let Some((rows, cols)) = query_window_size() {
        if rows > 2 && rows < 600 {
            WINDOW_LINES.store(rows - 2, Ordering::SeqCst);
        }
        if cols > 8 && cols < 1800 {
            WINDOW_COLUMNS.store(cols - 4, Ordering::SeqCst);
        }
    }
}

fn query_window_size() -> Option<(i32, i32)> {
    #[repr(C)]
    struct Winsize {
        ws_row: libc::c_ushort,
        ws_col: libc::c_ushort,
        ws_xpixel: libc::c_ushort,
        ws_ypixel: libc::c_ushort,
    }
    let mut ws = Winsize {
        ws_row: 0,
        ws_col: 0,
        ws_xpixel: 0,
        ws_ypixel: 0,
    };
    let rc = unsafe { libc::ioctl(libc::STDOUT_FILENO, libc::TIOCGWINSZ, &mut ws) };
    if rc == 0 {
        Some((ws.ws_row as i32, ws.ws_col as i32))
    } else {
        None
    }
}

/// Installs the three handlers. Skipped if stdin isn't a tty, matching the
/// original's choice not to bother with window-resize handling in
/// batch/script mode.
pub fn install() {
    if nix::unistd::isatty(0).unwrap_or(false) {
        let _ = unsafe {
            sigaction(
                Signal::SIGWINCH,
                &SigAction::new(SigHandler::Handler(on_sigwinch), SaFlags::empty(), SigSet::empty()),
            )
        };
        on_sigwinch(0);
    }
    let _ = unsafe {
        sigaction(
            Signal::SIGHUP,
            &SigAction::new(SigHandler::Handler(on_sighup), SaFlags::empty(), SigSet::empty()),
        )
    };
    let _ = unsafe {
        sigaction(
            Signal::SIGINT,
            &SigAction::new(SigHandler::Handler(on_sigint), SaFlags::empty(), SigSet::empty()),
        )
    };
    let _ = unsafe { sigaction(Signal::SIGPIPE, &SigAction::new(SigHandler::SigIgn, SaFlags::empty(), SigSet::empty())) };
}

pub fn disable_interrupts() {
    GUARD_DEPTH.fetch_add(1, Ordering::SeqCst);
}

/// Decrements the reentrancy guard; at depth zero, services any pending
/// hangup (writes the recovery file and exits -- never returns) or
/// interrupt (clears the flag and returns `Err(Interrupted)`).
pub fn enable_interrupts(buffer: &mut EdBuffer) -> Result<(), EdError> {
    let depth = GUARD_DEPTH.fetch_sub(1, Ordering::SeqCst) - 1;
    if depth > 0 {
        return Ok(());
    }
    GUARD_DEPTH.store(0, Ordering::SeqCst);

    if SIGHUP_PENDING.swap(false, Ordering::SeqCst) {
        write_recovery_file(buffer);
        std::process::exit(1);
    }
    if SIGINT_PENDING.swap(false, Ordering::SeqCst) {
        return Err(EdError::Interrupted);
    }
    Ok(())
}

fn write_recovery_file(buffer: &mut EdBuffer) {
    if buffer.last_addr() == 0 || !buffer.modified() {
        std::process::exit(0);
    }
    if try_write_recovery(buffer, "ed.hup") {
        std::process::exit(0);
    }
    if let Ok(home) = env::var("HOME") {
        let path = if home.ends_with('/') {
            format!("{}ed.hup", home)
        } else {
            format!("{}/ed.hup", home)
        };
        if try_write_recovery(buffer, &path) {
            std::process::exit(0);
        }
    }
    std::process::exit(1);
}

fn try_write_recovery(buffer: &mut EdBuffer, path: &str) -> bool {
    let mut out = match std::fs::File::create(path) {
        Ok(f) => f,
        Err(_) => return false,
    };
    for addr in 1..=buffer.last_addr() {
        let text = match buffer.line_text(addr) {
            Ok(t) => t,
            Err(_) => return false,
        };
        if out.write_all(&text).is_err() || out.write_all(b"\n").is_err() {
            return false;
        }
    }
    true
}

pub fn set_window_lines(lines: i32) {
    USER_LINES.store(lines, Ordering::SeqCst);
}

pub fn window_columns() -> i32 {
    WINDOW_COLUMNS.load(Ordering::SeqCst)
}

pub fn window_lines() -> i32 {
    let mut user_lines = USER_LINES.load(Ordering::SeqCst);
    if user_lines < 0 {
        if let Ok(s) = env::var("LINES") {
            if let Ok(n) = s.parse::<i32>() {
                if n > 0 {
                    user_lines = n;
                    USER_LINES.store(n, Ordering::SeqCst);
                }
            }
        }
        if user_lines < 0 {
            user_lines = 0;
            USER_LINES.store(0, Ordering::SeqCst);
        }
    }
    if user_lines > 0 {
        user_lines
    } else {
        WINDOW_LINES.load(Ordering::SeqCst)
    }
}
