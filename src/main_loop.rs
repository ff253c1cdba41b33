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

//! Address grammar, suffix parsing and the command dispatch table: the
//! editor session loop that ties the line buffer, regex engine, active
//! set and I/O adapter together.

use std::io::{BufRead, Write};

use regex::Regex;

use crate::buffer::EdBuffer;
use crate::error::{EdError, EdResult};
use crate::global::ActiveSet;
use crate::io as ioadapt;
use crate::io::{Highlighter, NoHighlighter, PF_L, PF_N, PF_P};
use crate::regex::{extract_pattern, extract_replacement, RegexEngine};
use crate::scratch::Scratch;
use crate::signal;

/// Everything one editing session needs beyond the line buffer itself.
pub struct Editor {
    pub buffer: EdBuffer,
    pub regex: RegexEngine,
    pub highlighter: Box<dyn Highlighter>,
    pub lang: Option<String>,
    pub last_error: Option<EdError>,
    pub verbose: bool,
    pub scripted: bool,
    pub restricted: bool,
    pub strip_cr: bool,
    pub loose_exit: bool,
    pub warned_modified: bool,
}

impl Editor {
    pub fn new(buffer: EdBuffer, extended_regexp: bool) -> Self {
        Editor {
            buffer,
            regex: RegexEngine::new(extended_regexp),
            highlighter: Box::new(NoHighlighter),
            lang: None,
            last_error: None,
            verbose: false,
            scripted: false,
            restricted: false,
            strip_cr: false,
            loose_exit: false,
            warned_modified: false,
        }
    }
}

// ---------------------------------------------------------------------
// Address grammar
// ---------------------------------------------------------------------

/// Result of parsing a composite address expression: `count` is 0 (no
/// address given, `first`/`second` default to the current address), 1
/// (a single address, `first == second`) or 2 (a range).
#[derive(Clone, Copy)]
pub struct AddrRange {
    pub first: usize,
    pub second: usize,
    pub count: usize,
}

fn skip_spaces(s: &str) -> &str {
    s.trim_start_matches(' ')
}

fn parse_number(s: &str) -> (Option<i64>, &str) {
    let digits: usize = s.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits == 0 {
        (None, s)
    } else {
        let n = s[..digits].parse::<i64>().unwrap_or(i64::MAX);
        (Some(n), &s[digits..])
    }
}

/// Forward (`/`) or backward (`?`) regex search from the current address,
/// wrapping around the buffer. An empty pattern reuses the last search.
fn search_line(ed: &mut Editor, pattern: &str, forward: bool) -> EdResult<usize> {
    let re = ed.regex.search_regex(pattern, false)?;
    let last = ed.buffer.last_addr();
    if last == 0 {
        return Err(EdError::NoMatch);
    }
    let mut addr = ed.buffer.current_addr();
    for _ in 0..last {
        addr = if forward {
            if addr >= last { 1 } else { addr + 1 }
        } else if addr <= 1 {
            last
        } else {
            addr - 1
        };
        let text = ed.buffer.line_text(addr)?;
        if re.is_match(&String::from_utf8_lossy(&text)) {
            return Ok(addr);
        }
    }
    Err(EdError::NoMatch)
}

/// Parses one address term: `.`, `$`, `'x`, `/re/`, `?re?`, a decimal
/// number, or nothing at all (`None`, leaving `s` untouched).
fn parse_address_term<'a>(ed: &mut Editor, s: &'a str) -> EdResult<(Option<i64>, &'a str)> {
    let s = skip_spaces(s);
    match s.chars().next() {
        None => Ok((None, s)),
        Some('.') => Ok((Some(ed.buffer.current_addr() as i64), &s[1..])),
        Some('$') => Ok((Some(ed.buffer.last_addr() as i64), &s[1..])),
        Some('\'') => {
            let rest = &s[1..];
            let mark = rest.chars().next().ok_or(EdError::InvalidAddress)?;
            let addr = ed.buffer.marked_addr(mark)?;
            Ok((Some(addr as i64), &rest[mark.len_utf8()..]))
        }
        Some(delim @ ('/' | '?')) => {
            let rest = &s[delim.len_utf8()..];
            let (pattern, after) = extract_pattern(rest, delim)?;
            let after = after.strip_prefix(delim).unwrap_or(after);
            let addr = search_line(ed, &pattern, delim == '/')?;
            Ok((Some(addr as i64), after))
        }
        Some(c) if c.is_ascii_digit() => {
            let (n, rest) = parse_number(s);
            Ok((n, rest))
        }
        _ => Ok((None, s)),
    }
}

/// One address term plus any chained `+N`/`-N`/bare `+`/`-` offsets.
fn parse_address<'a>(ed: &mut Editor, s: &'a str) -> EdResult<(Option<usize>, &'a str)> {
    let (base, mut rest) = parse_address_term(ed, s)?;
    let mut had = base.is_some();
    let mut val = base.unwrap_or(ed.buffer.current_addr() as i64);
    loop {
        let trimmed = skip_spaces(rest);
        match trimmed.chars().next() {
            Some('+') => {
                had = true;
                let (n, after) = parse_number(&trimmed[1..]);
                val += n.unwrap_or(1);
                rest = after;
            }
            Some('-') | Some('^') => {
                had = true;
                let (n, after) = parse_number(&trimmed[1..]);
                val -= n.unwrap_or(1);
                rest = after;
            }
            _ => break,
        }
    }
    if !had {
        return Ok((None, s));
    }
    if val < 0 {
        return Err(EdError::InvalidAddress);
    }
    Ok((Some(val as usize), rest))
}

/// Parses a full `addr1,addr2` / `addr1;addr2` / `%` expression (at most
/// one separator; GNU ed's "keep the last two of a chain" behavior for
/// more than one separator is not reproduced here).
fn parse_address_range<'a>(ed: &mut Editor, s: &'a str) -> EdResult<(AddrRange, &'a str)> {
    let (a1, rest) = parse_address(ed, s)?;
    if let Some(a) = a1 {
        if !ed.buffer.valid_addr(a) {
            return Err(EdError::InvalidAddress);
        }
    }
    let trimmed = skip_spaces(rest);
    match trimmed.chars().next() {
        Some(sep @ (',' | ';' | '%')) => {
            let rest = &trimmed[sep.len_utf8()..];
            if sep == ';' {
                if let Some(a) = a1 {
                    ed.buffer.set_current_addr(a);
                }
            }
            if sep == '%' {
                return Ok((
                    AddrRange { first: 1, second: ed.buffer.last_addr(), count: 2 },
                    rest,
                ));
            }
            let default_lo = if sep == ';' { ed.buffer.current_addr() } else { 1 };
            let lo = a1.unwrap_or(default_lo);
            let (a2, rest2) = parse_address(ed, rest)?;
            if let Some(a) = a2 {
                if !ed.buffer.valid_addr(a) {
                    return Err(EdError::InvalidAddress);
                }
            }
            let hi = a2.unwrap_or_else(|| ed.buffer.last_addr());
            if lo > hi {
                return Err(EdError::InvalidAddress);
            }
            Ok((AddrRange { first: lo, second: hi, count: 2 }, rest2))
        }
        _ => match a1 {
            Some(a) => Ok((AddrRange { first: a, second: a, count: 1 }, rest)),
            None => {
                let cur = ed.buffer.current_addr();
                Ok((AddrRange { first: cur, second: cur, count: 0 }, rest))
            }
        },
    }
}

/// Sets the current address from a `+line`/`+/RE`/`+?RE` command-line
/// prefix (the file-argument line spec).
pub fn goto_line_spec(ed: &mut Editor, spec: &str) -> EdResult<()> {
    let spec = spec.strip_prefix('+').unwrap_or(spec);
    if spec.is_empty() {
        let addr = ed.buffer.last_addr();
        ed.buffer.set_current_addr(addr);
        return Ok(());
    }
    let (addr, rest) = parse_address(ed, spec)?;
    if !rest.is_empty() {
        return Err(EdError::InvalidAddress);
    }
    let addr = addr.ok_or(EdError::InvalidAddress)?;
    if !ed.buffer.valid_addr(addr) {
        return Err(EdError::InvalidAddress);
    }
    ed.buffer.set_current_addr(addr);
    Ok(())
}

fn default_pair(range: &AddrRange, fallback: usize) -> (usize, usize) {
    if range.count == 0 {
        (fallback, fallback)
    } else {
        (range.first, range.second)
    }
}

// ---------------------------------------------------------------------
// Input acquisition (§4.8)
// ---------------------------------------------------------------------

/// Reads one logical command line, joining physical lines whose newline
/// is preceded by an odd number of backslashes (the escaping backslash is
/// stripped, the lines are joined with an embedded `\n`).
fn read_logical_line(reader: &mut dyn BufRead) -> std::io::Result<Option<String>> {
    let mut logical = String::new();
    loop {
        let mut buf = String::new();
        let n = reader.read_line(&mut buf)?;
        if n == 0 {
            return Ok(if logical.is_empty() { None } else { Some(logical) });
        }
        let had_nl = buf.ends_with('\n');
        if had_nl {
            buf.pop();
        }
        let trailing_bs = buf.chars().rev().take_while(|&c| c == '\\').count();
        if had_nl && trailing_bs % 2 == 1 {
            buf.pop();
            logical.push_str(&buf);
            logical.push('\n');
            continue;
        }
        logical.push_str(&buf);
        return Ok(Some(logical));
    }
}

/// Reads an `a`/`i`/`c` text block: raw lines up to (and excluding) one
/// consisting of a lone `.`, or EOF.
fn read_text_block(reader: &mut dyn BufRead) -> EdResult<Vec<Vec<u8>>> {
    let mut lines = Vec::new();
    loop {
        let mut raw = Vec::new();
        let n = reader
            .read_until(b'\n', &mut raw)
            .map_err(|e| EdError::Io("read input".into(), e.to_string()))?;
        if n == 0 {
            break;
        }
        if raw.last() == Some(&b'\n') {
            raw.pop();
        }
        if raw == b"." {
            break;
        }
        lines.push(raw);
    }
    Ok(lines)
}

// ---------------------------------------------------------------------
// Suffix parsing
// ---------------------------------------------------------------------

fn parse_print_suffix(s: &str) -> EdResult<u32> {
    let mut flags = 0u32;
    for c in s.trim().chars() {
        let bit = match c {
            'l' => PF_L,
            'n' => PF_N,
            'p' => PF_P,
            _ => return Err(EdError::InvalidSuffix),
        };
        if flags & bit != 0 {
            return Err(EdError::InvalidSuffix);
        }
        flags |= bit;
    }
    Ok(flags)
}

fn maybe_print(ed: &mut Editor, flags: u32, out: &mut dyn Write) -> EdResult<()> {
    if flags != 0 {
        let addr = ed.buffer.current_addr();
        ioadapt::print_line(&mut ed.buffer, addr, flags, ed.highlighter.as_ref(), ed.lang.as_deref(), out)?;
    }
    Ok(())
}

struct SubstFlags {
    global: bool,
    count: usize,
    reuse: bool,
    ci: bool,
    print: u32,
}

fn parse_subst_suffixes(s: &str) -> EdResult<SubstFlags> {
    let mut f = SubstFlags { global: false, count: 0, reuse: false, ci: false, print: 0 };
    let mut chars = s.chars().peekable();
    while let Some(&c) = chars.peek() {
        match c {
            'g' => {
                f.global = true;
                chars.next();
            }
            'r' => {
                f.reuse = true;
                chars.next();
            }
            'i' | 'I' => {
                f.ci = true;
                chars.next();
            }
            'p' => {
                f.print |= PF_P;
                chars.next();
            }
            'l' => {
                f.print |= PF_L;
                chars.next();
            }
            'n' => {
                f.print |= PF_N;
                chars.next();
            }
            ' ' => {
                chars.next();
            }
            d if d.is_ascii_digit() => {
                let mut num = String::new();
                while let Some(&d) = chars.peek() {
                    if d.is_ascii_digit() {
                        num.push(d);
                        chars.next();
                    } else {
                        break;
                    }
                }
                f.count = num.parse().unwrap_or(0);
            }
            _ => return Err(EdError::InvalidSuffix),
        }
    }
    Ok(f)
}

// ---------------------------------------------------------------------
// Substitution
// ---------------------------------------------------------------------

fn execute_substitute(ed: &mut Editor, args: &str, range: AddrRange, out: &mut dyn Write) -> EdResult<()> {
    let (first, last) = default_pair(&range, ed.buffer.current_addr());
    if ed.buffer.last_addr() > 0 && !ed.buffer.valid_addr_range(first.max(1), last) {
        return Err(EdError::InvalidAddress);
    }

    let (pattern_and_repl, suffix_src): (Option<(String, String)>, &str) = match args.chars().next() {
        None => (None, args),
        Some(delim) if !delim.is_ascii_alphanumeric() && delim != '\\' && delim != ' ' => {
            let after_delim = &args[delim.len_utf8()..];
            let (pattern, after_pat) = extract_pattern(after_delim, delim)?;
            let after_pat = after_pat
                .strip_prefix(delim)
                .ok_or(EdError::UnbalancedDelimiters)?;
            let (replacement_raw, after_repl) = extract_replacement(after_pat, delim, false);
            (Some((pattern, replacement_raw)), after_repl)
        }
        _ => (None, args),
    };

    let flags = parse_subst_suffixes(suffix_src)?;

    let regex: Regex = match &pattern_and_repl {
        Some((pattern, _)) => ed.regex.subst_regex(pattern, flags.ci, flags.reuse)?,
        None => {
            if flags.ci {
                return Err(EdError::InvalidSuffix);
            }
            ed.regex.subst_regex("", false, flags.reuse)?
        }
    };

    let template_in = match &pattern_and_repl {
        Some((_, r)) => r.clone(),
        None => "%".to_string(),
    };
    let resolved = ed.regex.replacement(&template_in)?;
    ed.regex.set_replacement(resolved.clone());

    let binary = ed.buffer.isbinary();
    ed.buffer.begin_command();
    let mut addr = first;
    let mut end = last;
    let mut touched = 0usize;
    let mut any = false;
    while addr <= end && addr <= ed.buffer.last_addr() {
        let text = ed.buffer.line_text(addr)?;
        match ed
            .regex
            .substitute_line(&text, &regex, &resolved, flags.count, flags.global, binary)?
        {
            None => addr += 1,
            Some(new_lines) => {
                any = true;
                let n = new_lines.len();
                ed.buffer.delete_lines(addr, addr)?;
                ed.buffer.append_lines(addr - 1, &new_lines)?;
                end = ((end as i64) + n as i64 - 1).max(0) as usize;
                touched = addr + n - 1;
                addr += n;
            }
        }
    }
    ed.buffer.clear_undo_stack();

    if !any {
        return Err(EdError::NoMatch);
    }
    ed.buffer.set_current_addr(touched);
    maybe_print(ed, flags.print, out)
}

// ---------------------------------------------------------------------
// Global commands (g/v/G/V)
// ---------------------------------------------------------------------

fn execute_command_list(ed: &mut Editor, list: &str, reader: &mut dyn BufRead, out: &mut dyn Write) -> EdResult<()> {
    for line in list.split('\n') {
        if line.trim().is_empty() {
            continue;
        }
        execute_line(ed, line, reader, out)?;
    }
    Ok(())
}

fn execute_global(
    ed: &mut Editor,
    args: &str,
    range: AddrRange,
    kind: char,
    reader: &mut dyn BufRead,
    out: &mut dyn Write,
) -> EdResult<()> {
    let (first, last) = if range.count == 0 {
        (1, ed.buffer.last_addr())
    } else {
        (range.first, range.second)
    };
    if first == 0 || first > last || last > ed.buffer.last_addr() {
        return Err(EdError::InvalidAddress);
    }
    let delim = args.chars().next().ok_or(EdError::InvalidSuffix)?;
    let rest = &args[delim.len_utf8()..];
    let (pattern, after) = extract_pattern(rest, delim)?;
    let after = after.strip_prefix(delim).unwrap_or(after);

    let invert = kind == 'v' || kind == 'V';
    let interactive = kind == 'G' || kind == 'V';

    let re = ed.regex.search_regex(&pattern, false)?;
    let mut active = ActiveSet::new();
    active.build(&mut ed.buffer, first, last, |line| re.is_match(&String::from_utf8_lossy(line)), invert)?;

    let command_list = if after.trim().is_empty() { None } else { Some(after.to_string()) };

    ed.buffer.begin_command();
    ed.buffer.begin_global();
    log::debug!("global command dispatching over active set");

    let result: EdResult<()> = (|| {
        loop {
            let addr = match active.next(&ed.buffer) {
                Some(a) => a,
                None => break,
            };
            ed.buffer.set_current_addr(addr);

            if interactive {
                maybe_print(ed, PF_P, out)?;
                let line = match read_logical_line(reader).map_err(|e| EdError::Io("read input".into(), e.to_string()))? {
                    Some(l) => l,
                    None => break,
                };
                let line = line.trim_end_matches('\n');
                if line.trim().is_empty() {
                    continue;
                }
                if line == "&" {
                    if let Some(list) = &command_list {
                        execute_command_list(ed, list, reader, out)?;
                    }
                    continue;
                }
                execute_command_list(ed, line, reader, out)?;
            } else {
                match &command_list {
                    None => maybe_print(ed, PF_P, out)?,
                    Some(list) => execute_command_list(ed, list, reader, out)?,
                }
            }
            for (head, tail) in ed.buffer.take_pruned() {
                let handles = ed.buffer.range_handles(head, tail);
                active.unset_handles(&handles);
            }
        }
        Ok(())
    })();

    ed.buffer.end_global();
    ed.buffer.clear_undo_stack();
    result
}

// ---------------------------------------------------------------------
// File I/O commands
// ---------------------------------------------------------------------

fn check_restricted(ed: &Editor, name: &str) -> EdResult<()> {
    if ed.restricted && (name.starts_with('!') || name.contains("..") || name.contains('/')) {
        return Err(EdError::Restricted);
    }
    Ok(())
}

fn resolve_filename(ed: &Editor, args: &str) -> EdResult<String> {
    let name = args.trim();
    if !name.is_empty() {
        return Ok(name.to_string());
    }
    ed.buffer.filename.clone().ok_or(EdError::NoFilename)
}

fn execute_edit(ed: &mut Editor, args: &str, force: bool, out: &mut dyn Write) -> EdResult<()> {
    if !force && ed.buffer.modified() && !ed.warned_modified {
        ed.warned_modified = true;
        return Err(EdError::WarningUnsavedChanges);
    }
    ed.warned_modified = false;
    let fname = resolve_filename(ed, args)?;
    check_restricted(ed, &fname)?;

    let scratch = Scratch::open()?;
    ed.buffer = EdBuffer::new(scratch);
    ed.buffer.begin_command();
    let n = ioadapt::read_file(&mut ed.buffer, &fname, 0, ed.strip_cr)?;
    ed.buffer.clear_undo_stack();
    if !fname.starts_with('!') {
        ed.buffer.filename = Some(fname);
    }
    ed.buffer.set_modified(false);
    let last = ed.buffer.last_addr();
    ed.buffer.set_current_addr(last);
    if !ed.scripted {
        writeln!(out, "{}", n).map_err(|e| EdError::Io("write output".into(), e.to_string()))?;
    }
    Ok(())
}

fn execute_read(ed: &mut Editor, args: &str, range: AddrRange, out: &mut dyn Write) -> EdResult<()> {
    let addr = if range.count == 0 { ed.buffer.last_addr() } else { range.second };
    let fname = resolve_filename(ed, args)?;
    check_restricted(ed, &fname)?;

    ed.buffer.begin_command();
    let n = ioadapt::read_file(&mut ed.buffer, &fname, addr, ed.strip_cr)?;
    ed.buffer.clear_undo_stack();
    if ed.buffer.filename.is_none() && !fname.starts_with('!') {
        ed.buffer.filename = Some(fname);
    }
    if !ed.scripted {
        writeln!(out, "{}", n).map_err(|e| EdError::Io("write output".into(), e.to_string()))?;
    }
    Ok(())
}

fn execute_write(ed: &mut Editor, args: &str, range: AddrRange, append: bool, out: &mut dyn Write) -> EdResult<()> {
    let (first, last) = if range.count == 0 {
        (1, ed.buffer.last_addr())
    } else {
        (range.first, range.second)
    };
    let fname = resolve_filename(ed, args)?;
    check_restricted(ed, &fname)?;

    let n = ioadapt::write_file(&mut ed.buffer, &fname, first, last, append)?;
    if first == 1 && last == ed.buffer.last_addr() {
        ed.buffer.set_modified(false);
    }
    if ed.buffer.filename.is_none() && !fname.starts_with('!') {
        ed.buffer.filename = Some(fname);
    }
    if !ed.scripted {
        writeln!(out, "{}", n).map_err(|e| EdError::Io("write output".into(), e.to_string()))?;
    }
    Ok(())
}

fn execute_filename(ed: &mut Editor, args: &str, out: &mut dyn Write) -> EdResult<()> {
    let name = args.trim();
    if !name.is_empty() {
        check_restricted(ed, name)?;
        ed.buffer.filename = Some(name.to_string());
    }
    let fname = ed.buffer.filename.as_deref().ok_or(EdError::NoFilename)?;
    writeln!(out, "{}", fname).map_err(|e| EdError::Io("write output".into(), e.to_string()))
}

fn execute_shell(ed: &mut Editor, args: &str, out: &mut dyn Write) -> EdResult<()> {
    if ed.restricted {
        return Err(EdError::Restricted);
    }
    let cmd = args.trim();
    if cmd.is_empty() {
        return Err(EdError::NoPreviousCommand);
    }
    std::process::Command::new("/bin/sh")
        .arg("-c")
        .arg(cmd)
        .status()
        .map_err(|e| EdError::Io("run shell command".into(), e.to_string()))?;
    if !ed.scripted {
        writeln!(out, "!").map_err(|e| EdError::Io("write output".into(), e.to_string()))?;
    }
    Ok(())
}

// ---------------------------------------------------------------------
// Top-level dispatch
// ---------------------------------------------------------------------

fn print_current(ed: &mut Editor, out: &mut dyn Write) -> EdResult<()> {
    let addr = ed.buffer.current_addr();
    ioadapt::print_line(&mut ed.buffer, addr, 0, ed.highlighter.as_ref(), ed.lang.as_deref(), out)
}

fn dispatch_blank(ed: &mut Editor, out: &mut dyn Write) -> EdResult<()> {
    let next = ed.buffer.current_addr() + 1;
    if next > ed.buffer.last_addr() || next == 0 {
        return Err(EdError::InvalidAddress);
    }
    ed.buffer.set_current_addr(next);
    print_current(ed, out)
}

fn dispatch_command_inner(
    ed: &mut Editor,
    cmd: char,
    args: &str,
    range: AddrRange,
    reader: &mut dyn BufRead,
    out: &mut dyn Write,
) -> EdResult<()> {
    match cmd {
        'a' => {
            let addr = if range.count == 0 { ed.buffer.current_addr() } else { range.second };
            let lines = read_text_block(reader)?;
            ed.buffer.begin_command();
            let last = ed.buffer.append_lines(addr, &lines)?;
            ed.buffer.clear_undo_stack();
            ed.buffer.set_current_addr(ed.buffer.addr_of(last).unwrap_or(addr));
            Ok(())
        }
        'i' => {
            let target = if range.count == 0 { ed.buffer.current_addr() } else { range.second };
            let addr = target.saturating_sub(1);
            let lines = read_text_block(reader)?;
            ed.buffer.begin_command();
            let last = ed.buffer.append_lines(addr, &lines)?;
            ed.buffer.clear_undo_stack();
            ed.buffer.set_current_addr(ed.buffer.addr_of(last).unwrap_or(addr));
            Ok(())
        }
        'c' => {
            let (first, last) = default_pair(&range, ed.buffer.current_addr());
            let lines = read_text_block(reader)?;
            ed.buffer.begin_command();
            ed.buffer.delete_lines(first, last)?;
            let at = first - 1;
            let h = ed.buffer.append_lines(at, &lines)?;
            ed.buffer.clear_undo_stack();
            ed.buffer.set_current_addr(ed.buffer.addr_of(h).unwrap_or(at));
            Ok(())
        }
        'd' => {
            let (first, last) = default_pair(&range, ed.buffer.current_addr());
            let flags = parse_print_suffix(args)?;
            ed.buffer.begin_command();
            ed.buffer.delete_lines(first, last)?;
            ed.buffer.clear_undo_stack();
            maybe_print(ed, flags, out)
        }
        'j' => {
            let (first, last) = if range.count == 0 {
                (ed.buffer.current_addr(), ed.buffer.current_addr() + 1)
            } else {
                (range.first, range.second)
            };
            let flags = parse_print_suffix(args)?;
            ed.buffer.begin_command();
            ed.buffer.join_lines(first, last)?;
            ed.buffer.clear_undo_stack();
            maybe_print(ed, flags, out)
        }
        'm' | 't' => {
            let (first, last) = default_pair(&range, ed.buffer.current_addr());
            let (dest_range, rest) = parse_address_range(ed, args)?;
            if dest_range.count == 0 && !args.trim().is_empty() {
                return Err(EdError::InvalidAddress);
            }
            let flags = parse_print_suffix(rest)?;
            ed.buffer.begin_command();
            if cmd == 'm' {
                ed.buffer.move_lines(first, last, dest_range.second)?;
            } else {
                ed.buffer.copy_lines(first, last, dest_range.second)?;
            }
            ed.buffer.clear_undo_stack();
            maybe_print(ed, flags, out)
        }
        'y' => {
            let (first, last) = default_pair(&range, ed.buffer.current_addr());
            let flags = parse_print_suffix(args)?;
            ed.buffer.yank_lines(first, last)?;
            maybe_print(ed, flags, out)
        }
        'x' => {
            let addr = if range.count == 0 { ed.buffer.current_addr() } else { range.second };
            let flags = parse_print_suffix(args)?;
            ed.buffer.begin_command();
            ed.buffer.put_yank_after(addr)?;
            ed.buffer.clear_undo_stack();
            maybe_print(ed, flags, out)
        }
        's' => execute_substitute(ed, args, range, out),
        'g' | 'v' | 'G' | 'V' => execute_global(ed, args, range, cmd, reader, out),
        'k' => {
            let addr = if range.count == 0 { ed.buffer.current_addr() } else { range.second };
            let mark = args.trim().chars().next().ok_or(EdError::InvalidAddress)?;
            ed.buffer.mark_line(addr, mark)
        }
        'l' | 'n' | 'p' => {
            let (first, last) = default_pair(&range, ed.buffer.current_addr());
            let base = match cmd {
                'l' => PF_L,
                'n' => PF_N,
                _ => PF_P,
            };
            let flags = base | parse_print_suffix(args)?;
            ioadapt::print_lines(&mut ed.buffer, first, last, flags, ed.highlighter.as_ref(), ed.lang.as_deref(), out)
        }
        'z' => {
            let addr = if range.count == 0 { ed.buffer.current_addr() + 1 } else { range.second };
            if addr == 0 || addr > ed.buffer.last_addr() {
                return Err(EdError::InvalidAddress);
            }
            let (n, _) = parse_number(args.trim());
            let window = n.map(|x| x.max(1) as usize).unwrap_or_else(|| signal::window_lines().max(1) as usize);
            let last = (addr + window - 1).min(ed.buffer.last_addr());
            ioadapt::print_lines(&mut ed.buffer, addr, last, 0, ed.highlighter.as_ref(), ed.lang.as_deref(), out)
        }
        '=' => {
            let addr = if range.count == 0 { ed.buffer.last_addr() } else { range.second };
            writeln!(out, "{}", addr).map_err(|e| EdError::Io("write output".into(), e.to_string()))
        }
        'u' => ed.buffer.undo(),
        'h' => {
            if range.count > 0 {
                return Err(EdError::InvalidAddress);
            }
            if let Some(e) = &ed.last_error {
                writeln!(out, "{}", e).map_err(|e| EdError::Io("write output".into(), e.to_string()))?;
            }
            Ok(())
        }
        'H' => {
            if range.count > 0 {
                return Err(EdError::InvalidAddress);
            }
            ed.verbose = !ed.verbose;
            if ed.verbose {
                if let Some(e) = &ed.last_error {
                    writeln!(out, "{}", e).map_err(|e| EdError::Io("write output".into(), e.to_string()))?;
                }
            }
            Ok(())
        }
        'P' => {
            if range.count > 0 {
                return Err(EdError::InvalidAddress);
            }
            crate::toggle_prompt();
            Ok(())
        }
        'w' => execute_write(ed, args, range, false, out),
        'W' => execute_write(ed, args, range, true, out),
        'r' => execute_read(ed, args, range, out),
        'e' => execute_edit(ed, args, false, out),
        'E' => execute_edit(ed, args, true, out),
        'f' => execute_filename(ed, args, out),
        '!' => execute_shell(ed, args, out),
        '#' => Ok(()),
        'q' => {
            if range.count > 0 {
                return Err(EdError::InvalidAddress);
            }
            if ed.buffer.modified() && !ed.warned_modified {
                ed.warned_modified = true;
                return Err(EdError::WarningUnsavedChanges);
            }
            Err(EdError::Quit)
        }
        'Q' => {
            if range.count > 0 {
                return Err(EdError::InvalidAddress);
            }
            Err(EdError::Quit)
        }
        _ => Err(EdError::UnknownCommand),
    }
}

fn dispatch_command(
    ed: &mut Editor,
    cmd: char,
    args: &str,
    range: AddrRange,
    reader: &mut dyn BufRead,
    out: &mut dyn Write,
) -> EdResult<()> {
    signal::disable_interrupts();
    let result = dispatch_command_inner(ed, cmd, args, range, reader, out);
    let guard = signal::enable_interrupts(&mut ed.buffer);
    result.and(guard)
}

/// Parses and executes one already-newline-stripped logical command line.
fn execute_line(ed: &mut Editor, line: &str, reader: &mut dyn BufRead, out: &mut dyn Write) -> EdResult<()> {
    if line.trim().is_empty() {
        return dispatch_blank(ed, out);
    }
    let (range, rest) = parse_address_range(ed, line)?;
    if rest.trim().is_empty() {
        if range.count == 0 {
            return dispatch_blank(ed, out);
        }
        ed.buffer.set_current_addr(range.second);
        return print_current(ed, out);
    }
    let rest = skip_spaces(rest);
    let cmd = rest.chars().next().unwrap();
    let args = &rest[cmd.len_utf8()..];
    dispatch_command(ed, cmd, args, range, reader, out)
}

/// The editor's main loop: reads logical command lines from `reader`
/// until EOF or a `q`/`Q` command, reporting errors as `?` unless `-v`
/// requested the detailed message too.
pub fn run(ed: &mut Editor, reader: &mut dyn BufRead, out: &mut dyn Write) -> i32 {
    let mut exit_code = 0;
    loop {
        if crate::prompt_on() {
            let _ = write!(out, "{}", crate::prompt());
            let _ = out.flush();
        }
        let line = match read_logical_line(reader) {
            Ok(Some(l)) => l,
            Ok(None) => {
                if ed.buffer.modified() {
                    exit_code = 2;
                }
                break;
            }
            Err(e) => {
                log::warn!("input error: {}", e);
                exit_code = 1;
                break;
            }
        };
        let trimmed = line.trim_end_matches('\n');
        match execute_line(ed, trimmed, reader, out) {
            Ok(()) => {}
            Err(EdError::Quit) => break,
            Err(e) => {
                log::debug!("command error: {}", e);
                eprintln!("?");
                if ed.verbose {
                    eprintln!("{}", e);
                }
                ed.last_error = Some(e);
            }
        }
    }
    let _ = out.flush();
    if ed.loose_exit {
        0
    } else {
        exit_code
    }
}
