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

/// Error handling for rust-ed - taxonomy: parse / semantic / resource /
/// state / fatal, plus the `Quit`/`Interrupted` control-flow signals.

#[derive(Debug, thiserror::Error)]
pub enum EdError {
    // --- parse ---
    #[error("unknown command")]
    UnknownCommand,
    #[error("invalid address")]
    InvalidAddress,
    #[error("invalid command suffix")]
    InvalidSuffix,
    #[error("unbalanced delimiters")]
    UnbalancedDelimiters,
    #[error("line too long")]
    TrailingBackslash,
    #[error("no previous command")]
    NoPreviousCommand,

    // --- semantic ---
    #[error("no current filename")]
    NoFilename,
    #[error("no previous pattern")]
    NoPreviousPattern,
    #[error("nothing to put")]
    NothingToPut,
    #[error("nothing to undo")]
    NothingToUndo,
    #[error("invalid destination")]
    DestinationInSource,
    #[error("no match")]
    NoMatch,
    #[error("invalid filename")]
    InvalidFilename,

    // --- resource ---
    #[error("out of memory")]
    OutOfMemory,
    #[error("cannot {0}: {1}")]
    Io(String, String),
    #[error("line count overflow")]
    LineCountOverflow,
    #[error("infinite substitution loop")]
    InfiniteSubstitutionLoop,

    // --- state ---
    #[error("warning: file modified")]
    WarningUnsavedChanges,
    #[error("restricted mode: not allowed")]
    Restricted,

    // --- fatal ---
    #[error("cannot open scratch file")]
    ScratchFileUnopenable,
    #[error("internal invariant violated: {0}")]
    Invariant(String),

    // --- control flow, not printed as "?" ---
    #[error("")]
    Quit,
    #[error("interrupt")]
    Interrupted,
}

impl EdError {
    /// Exit code this error would produce if it escaped the dispatcher loop
    /// uncaught (it normally doesn't -- see main.rs's top-level handling).
    pub fn exit_code(&self) -> i32 {
        match self {
            EdError::ScratchFileUnopenable => 1,
            EdError::Invariant(_) => 3,
            EdError::Quit => 0,
            _ => 1,
        }
    }

    /// True for the handful of variants that drive control flow instead of
    /// being reported as `?`.
    pub fn is_control_flow(&self) -> bool {
        matches!(self, EdError::Quit | EdError::Interrupted)
    }

    /// True for the "state" category: sticky, first occurrence only.
    pub fn is_sticky_warning(&self) -> bool {
        matches!(self, EdError::WarningUnsavedChanges)
    }
}

pub type EdResult<T> = Result<T, EdError>;
