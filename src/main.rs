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

//! Entry point: CLI parsing, process-global configuration flags, and
//! hand-off to the session loop in `main_loop`.
//!
//! This file owns argument parsing, the process-wide flag accessors and
//! the initial-buffer setup; the full editing grammar and command table
//! live in `main_loop`.

use std::io::Write;
use std::process;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use clap::Parser;

mod buffer;
mod error;
mod global;
mod io;
mod main_loop;
mod regex;
mod scratch;
mod signal;

use self::io as ioadapt_mod;
use buffer::EdBuffer;
use main_loop::Editor;
use scratch::Scratch;

static EXTENDED_REGEXP: AtomicBool = AtomicBool::new(false);
static RESTRICTED: AtomicBool = AtomicBool::new(false);
static SCRIPTED: AtomicBool = AtomicBool::new(false);
static STRIP_CR: AtomicBool = AtomicBool::new(false);
static TRADITIONAL: AtomicBool = AtomicBool::new(false);
static QUIET: AtomicBool = AtomicBool::new(false);
static SAFE_NAMES: AtomicBool = AtomicBool::new(true);
static PROMPT_ON: AtomicBool = AtomicBool::new(false);
static VERBOSE: AtomicBool = AtomicBool::new(false);
static LOOSE_EXIT: AtomicBool = AtomicBool::new(false);
static PROMPT: Mutex<String> = Mutex::new(String::new());

const DEFAULT_PROMPT: &str = "*";
static PROGRAM_NAME: &str = "ed-rust";

pub fn extended_regexp() -> bool {
    EXTENDED_REGEXP.load(Ordering::Relaxed)
}

pub fn restricted() -> bool {
    RESTRICTED.load(Ordering::Relaxed)
}

pub fn safe_names_enabled() -> bool {
    SAFE_NAMES.load(Ordering::Relaxed)
}

pub fn scripted() -> bool {
    SCRIPTED.load(Ordering::Relaxed)
}

pub fn strip_cr() -> bool {
    STRIP_CR.load(Ordering::Relaxed)
}

pub fn traditional() -> bool {
    TRADITIONAL.load(Ordering::Relaxed)
}

pub fn quiet() -> bool {
    QUIET.load(Ordering::Relaxed)
}

pub fn verbose() -> bool {
    VERBOSE.load(Ordering::Relaxed)
}

pub fn loose_exit() -> bool {
    LOOSE_EXIT.load(Ordering::Relaxed)
}

pub fn prompt_on() -> bool {
    PROMPT_ON.load(Ordering::Relaxed)
}

pub fn toggle_prompt() {
    let current = PROMPT_ON.load(Ordering::Relaxed);
    PROMPT_ON.store(!current, Ordering::Relaxed);
}

pub fn prompt() -> String {
    PROMPT.lock().expect("prompt mutex poisoned").clone()
}

pub fn set_prompt(s: String) {
    *PROMPT.lock().expect("prompt mutex poisoned") = s;
}

/// Command-line options, matching GNU ed's own flag set.
#[derive(Parser)]
#[command(name = PROGRAM_NAME, version, about = "Memory-safe, drop-in replacement for GNU ed")]
struct Cli {
    /// Use extended regular expressions
    #[arg(short = 'E', long = "extended-regexp")]
    extended_regexp: bool,

    /// Run in compatibility mode
    #[arg(short = 'G', long = "traditional")]
    traditional: bool,

    /// Syntax-highlight printed lines as LANG
    #[arg(short = 'H', long = "highlight", value_name = "LANG")]
    highlight: Option<String>,

    /// Exit with status 0 even if a command fails
    #[arg(short = 'l', long = "loose-exit-status")]
    loose: bool,

    /// Use STRING as an interactive prompt
    #[arg(short = 'p', long = "prompt", value_name = "STRING")]
    prompt: Option<String>,

    /// Suppress diagnostics written to stderr
    #[arg(short = 'q', long = "quiet", alias = "silent")]
    quiet: bool,

    /// Run in restricted mode
    #[arg(short = 'r', long = "restricted")]
    restricted: bool,

    /// Suppress byte counts and '!' prompt
    #[arg(short = 's', long = "script")]
    scripted: bool,

    /// Be verbose about errors
    #[arg(short = 'v', long = "verbose")]
    verbose: bool,

    /// Strip carriage returns at the end of text lines
    #[arg(long = "strip-trailing-cr")]
    strip_trailing_cr: bool,

    /// Allow control characters in file names
    #[arg(long = "unsafe-names")]
    unsafe_names: bool,

    /// [+line] file
    #[arg(value_name = "ARGS", num_args = 0..=2)]
    positional: Vec<String>,
}

fn show_error(msg: &str) {
    if !quiet() {
        eprintln!("{}: {}", PROGRAM_NAME, msg);
    }
}

/// Splits the optional `[+line] file` positional pair into its two parts.
fn split_positional(args: &[String]) -> (Option<&str>, Option<&str>) {
    match args {
        [] => (None, None),
        [one] if one.starts_with('+') => (Some(one.as_str()), None),
        [one] => (None, Some(one.as_str())),
        [spec, file, ..] => (Some(spec.as_str()), Some(file.as_str())),
    }
}

fn load_initial_file(ed: &mut Editor, filename: &str) -> bool {
    ed.buffer.begin_command();
    match ioadapt_mod::read_file(&mut ed.buffer, filename, 0, ed.strip_cr) {
        Ok(n) => {
            ed.buffer.clear_undo_stack();
            if !filename.starts_with('!') {
                ed.buffer.filename = Some(filename.to_string());
            }
            ed.buffer.set_modified(false);
            let last = ed.buffer.last_addr();
            ed.buffer.set_current_addr(last);
            if !ed.scripted {
                println!("{}", n);
            }
            true
        }
        Err(e) => {
            ed.buffer.clear_undo_stack();
            show_error(&e.to_string());
            false
        }
    }
}

fn main() {
    let cli = Cli::parse();
    env_logger::init();

    EXTENDED_REGEXP.store(cli.extended_regexp, Ordering::Relaxed);
    TRADITIONAL.store(cli.traditional, Ordering::Relaxed);
    RESTRICTED.store(cli.restricted, Ordering::Relaxed);
    SCRIPTED.store(cli.scripted, Ordering::Relaxed);
    STRIP_CR.store(cli.strip_trailing_cr, Ordering::Relaxed);
    QUIET.store(cli.quiet, Ordering::Relaxed);
    SAFE_NAMES.store(!cli.unsafe_names, Ordering::Relaxed);
    VERBOSE.store(cli.verbose, Ordering::Relaxed);
    LOOSE_EXIT.store(cli.loose, Ordering::Relaxed);

    let prompt_string = cli.prompt.clone().unwrap_or_else(|| DEFAULT_PROMPT.to_string());
    set_prompt(prompt_string);
    if cli.prompt.is_some() {
        toggle_prompt();
    }

    signal::install();

    let scratch = match Scratch::open() {
        Ok(s) => s,
        Err(e) => {
            show_error(&e.to_string());
            process::exit(1);
        }
    };

    let mut ed = Editor::new(EdBuffer::new(scratch), cli.extended_regexp);
    ed.verbose = cli.verbose;
    ed.scripted = cli.scripted;
    ed.restricted = cli.restricted;
    ed.strip_cr = cli.strip_trailing_cr;
    ed.loose_exit = cli.loose;
    ed.lang = cli.highlight.clone();

    let (line_spec, filename) = split_positional(&cli.positional);
    let mut had_error = false;

    if let Some(fname) = filename {
        if !load_initial_file(&mut ed, fname) {
            had_error = true;
        }
    }

    if let Some(spec) = line_spec {
        if let Err(e) = main_loop::goto_line_spec(&mut ed, spec) {
            show_error(&e.to_string());
            had_error = true;
        }
    }

    let stdin = std::io::stdin();
    let mut reader = stdin.lock();
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    let mut exit_code = main_loop::run(&mut ed, &mut reader, &mut out);
    if had_error && exit_code == 0 {
        exit_code = 2;
    }
    let _ = out.flush();
    process::exit(exit_code);
}
