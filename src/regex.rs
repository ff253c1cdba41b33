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

//! Pattern compilation cache and the substitution engine (`s` command's
//! per-line rewrite: `&`/`\N` template expansion, zero-width-match loop
//! detection, NUL<->newline transliteration in binary mode).
//!
//! The teacher's file-scope `static Mutex<...>` slots are replaced with
//! fields owned by [`RegexEngine`], one per editing session, per the
//! "no static scratch buffers" redesign note.

use regex::Regex;

use crate::error::EdError;

fn islf_or_nul(ch: u8) -> bool {
    ch == b'\n' || ch == 0
}

fn translit_text(p: &mut [u8], from: u8, to: u8) {
    for byte in p.iter_mut() {
        if *byte == from {
            *byte = to;
        }
    }
}

pub fn newline_to_nul(s: &mut [u8]) {
    translit_text(s, b'\n', b'\0');
}

pub fn nul_to_newline(s: &mut [u8]) {
    translit_text(s, b'\0', b'\n');
}

/// Scans a `[...]` bracket expression starting just after the opening `[`,
/// returning the index of the closing `]` relative to that same slice.
fn parse_char_class(p: &str) -> Option<usize> {
    let bytes = p.as_bytes();
    let mut i = 0;
    if i < bytes.len() && bytes[i] == b'^' {
        i += 1;
    }
    if i < bytes.len() && bytes[i] == b']' {
        i += 1;
    }
    while i < bytes.len() && bytes[i] != b']' && !islf_or_nul(bytes[i]) {
        if bytes[i] == b'[' && i + 1 < bytes.len() {
            let d = bytes[i + 1];
            if d == b'.' || d == b':' || d == b'=' {
                i += 1;
                let mut c = bytes[i + 1];
                i += 1;
                while i < bytes.len() && (bytes[i] != b']' || c != d) {
                    c = bytes[i];
                    if islf_or_nul(c) {
                        return None;
                    }
                    i += 1;
                }
            }
        }
        i += 1;
    }
    if i < bytes.len() && bytes[i] == b']' {
        Some(i)
    } else {
        None
    }
}

/// Extracts a pattern up to the next unescaped `delimiter`, honoring
/// bracket expressions so a delimiter inside `[...]` doesn't end the
/// pattern early. Returns `(pattern, rest_of_input)`.
pub fn extract_pattern(input: &str, delimiter: char) -> Result<(String, &str), EdError> {
    let bytes = input.as_bytes();
    let mut i = 0;
    while i < bytes.len() && bytes[i] != delimiter as u8 && !islf_or_nul(bytes[i]) {
        if bytes[i] == b'[' {
            match parse_char_class(&input[i + 1..]) {
                Some(end) => i += end + 2,
                None => return Err(EdError::UnbalancedDelimiters),
            }
        } else if bytes[i] == b'\\' {
            i += 1;
            if i >= bytes.len() || islf_or_nul(bytes[i]) {
                return Err(EdError::TrailingBackslash);
            }
            i += 1;
        } else {
            i += 1;
        }
    }
    Ok((input[..i].to_string(), &input[i..]))
}

/// Extracts a replacement template up to the next unescaped `delimiter` or
/// bare newline. In a global command-list context an escaped newline
/// (`\` immediately followed by `\n`) continues the template across input
/// lines instead of ending it.
pub fn extract_replacement(input: &str, delimiter: char, in_global: bool) -> (String, &str) {
    let bytes = input.as_bytes();
    let mut out = String::new();
    let mut i = 0;
    while i < bytes.len() {
        let c = bytes[i];
        if c == delimiter as u8 {
            i += 1;
            break;
        }
        if c == b'\n' {
            break;
        }
        if c == b'\\' && i + 1 < bytes.len() {
            if bytes[i + 1] == b'\n' && in_global {
                out.push('\n');
                i += 2;
                continue;
            }
            out.push(bytes[i] as char);
            out.push(bytes[i + 1] as char);
            i += 2;
            continue;
        }
        out.push(c as char);
        i += 1;
    }
    (out, &input[i..])
}

/// Compiled-pattern cache: up to three slots active at once ("last
/// search", "last substitution", and the replacement template), so the
/// two can coexist without recompiling every command.
pub struct RegexEngine {
    last_search: Option<(String, Regex)>,
    last_subst: Option<(String, Regex)>,
    last_replacement: Option<String>,
    pub extended: bool,
}

impl RegexEngine {
    pub fn new(extended: bool) -> Self {
        RegexEngine {
            last_search: None,
            last_subst: None,
            last_replacement: None,
            extended,
        }
    }

    /// Rewrites the small set of basic-RE-only constructs this crate
    /// supports (`\(` `\)` grouping, `\{` `\}` intervals) into the
    /// `regex` crate's native (extended-like) syntax when `-G` is active.
    fn normalize_pattern(&self, pat: &str) -> String {
        if self.extended {
            return pat.to_string();
        }
        let mut out = String::with_capacity(pat.len());
        let mut chars = pat.chars().peekable();
        while let Some(c) = chars.next() {
            if c == '\\' {
                match chars.peek() {
                    Some('(') | Some(')') | Some('{') | Some('}') | Some('|') | Some('+')
                    | Some('?') => {
                        out.push(chars.next().unwrap());
                    }
                    Some(&next) => {
                        out.push('\\');
                        out.push(next);
                        chars.next();
                    }
                    None => out.push('\\'),
                }
            } else if "(){}|+?".contains(c) {
                out.push('\\');
                out.push(c);
            } else {
                out.push(c);
            }
        }
        out
    }

    fn compile(&self, pattern: &str, case_insensitive: bool) -> Result<Regex, EdError> {
        let normalized = self.normalize_pattern(pattern);
        let pat = if case_insensitive {
            format!("(?i){}", normalized)
        } else {
            normalized
        };
        Regex::new(&pat).map_err(|_| EdError::InvalidAddress)
    }

    /// Resolves a (possibly empty) pattern string to a compiled regex,
    /// updating the "last search" slot. An empty pattern reuses it.
    pub fn search_regex(&mut self, pattern: &str, case_insensitive: bool) -> Result<Regex, EdError> {
        if pattern.is_empty() {
            if case_insensitive {
                return Err(EdError::InvalidSuffix);
            }
            return self
                .last_search
                .as_ref()
                .map(|(_, r)| r.clone())
                .ok_or(EdError::NoPreviousPattern);
        }
        let re = self.compile(pattern, case_insensitive)?;
        self.last_search = Some((pattern.to_string(), re.clone()));
        Ok(re)
    }

    /// Same as `search_regex` but for the distinct "last substitution"
    /// slot, which may alias the search slot (`r` suffix on `s`).
    pub fn subst_regex(&mut self, pattern: &str, case_insensitive: bool, reuse_search: bool) -> Result<Regex, EdError> {
        if reuse_search {
            let re = self
                .last_search
                .as_ref()
                .map(|(_, r)| r.clone())
                .ok_or(EdError::NoPreviousPattern)?;
            self.last_subst = Some((String::new(), re.clone()));
            return Ok(re);
        }
        if pattern.is_empty() {
            if case_insensitive {
                return Err(EdError::InvalidSuffix);
            }
            return self
                .last_subst
                .as_ref()
                .map(|(_, r)| r.clone())
                .or_else(|| self.last_search.as_ref().map(|(_, r)| r.clone()))
                .ok_or(EdError::NoPreviousPattern);
        }
        let re = self.compile(pattern, case_insensitive)?;
        self.last_subst = Some((pattern.to_string(), re.clone()));
        self.last_search = Some((pattern.to_string(), re.clone()));
        Ok(re)
    }

    pub fn has_subst_regex(&self) -> bool {
        self.last_subst.is_some()
    }

    pub fn set_replacement(&mut self, template: String) {
        self.last_replacement = Some(template);
    }

    pub fn replacement(&self, template: &str) -> Result<String, EdError> {
        if template == "%" {
            return self
                .last_replacement
                .clone()
                .ok_or(EdError::NoPreviousPattern);
        }
        Ok(template.to_string())
    }

    /// Expands a replacement template against one match: `&` = whole
    /// match, `\N` = capture group N (empty if it didn't participate),
    /// `\\` = literal backslash. A literal, unescaped newline in the
    /// template is passed straight through -- see the "split the line"
    /// open question -- and handled by the caller.
    fn expand(template: &str, caps: &regex::Captures) -> String {
        let mut out = String::new();
        let mut chars = template.chars().peekable();
        while let Some(c) = chars.next() {
            if c == '&' {
                out.push_str(caps.get(0).map_or("", |m| m.as_str()));
            } else if c == '\\' {
                match chars.next() {
                    Some(d) if d.is_ascii_digit() => {
                        let n = d.to_digit(10).unwrap() as usize;
                        if let Some(m) = caps.get(n) {
                            out.push_str(m.as_str());
                        }
                    }
                    Some('\\') => out.push('\\'),
                    Some(other) => out.push(other),
                    None => {}
                }
            } else {
                out.push(c);
            }
        }
        out
    }

    /// Rewrites one line's text against `regex`/`replacement`. `snum == 0`
    /// replaces every match (`g`), `snum == N > 0` replaces only the Nth.
    /// Returns `None` if the pattern never matched. A result may contain
    /// more than one element if the replacement held a literal newline.
    pub fn substitute_line(
        &self,
        text: &[u8],
        regex: &Regex,
        replacement: &str,
        snum: usize,
        global: bool,
        binary: bool,
    ) -> Result<Option<Vec<Vec<u8>>>, EdError> {
        let mut work = text.to_vec();
        if binary {
            nul_to_newline(&mut work);
        }
        let s = String::from_utf8_lossy(&work).into_owned();

        let mut rebuilt = String::new();
        let mut last_end = 0;
        let mut count = 0;
        let mut any = false;
        let mut search_from = 0;
        // original_source/src/regex.c's `line_replace`: once a global
        // substitution has produced one zero-width match, a second
        // anywhere later in the same line is a real infinite loop
        // (`s/x*/Y/g`), not just a pathological one -- `s/^/#/g` only
        // ever produces the one, so it stays valid.
        let mut zero_width_seen = false;

        loop {
            let m = match regex.captures_at(&s, search_from) {
                Some(m) => m,
                None => break,
            };
            let whole = m.get(0).unwrap();
            count += 1;

            let do_replace = if snum == 0 { global || count == 1 } else { count == snum };

            if !do_replace {
                if whole.end() == whole.start() {
                    search_from = next_char_boundary(&s, whole.end());
                    if search_from > s.len() {
                        break;
                    }
                    continue;
                }
                search_from = whole.end();
                continue;
            }

            if global && whole.end() == whole.start() {
                if zero_width_seen {
                    return Err(EdError::InfiniteSubstitutionLoop);
                }
                zero_width_seen = true;
            }

            rebuilt.push_str(&s[last_end..whole.start()]);
            rebuilt.push_str(&Self::expand(replacement, &m));
            last_end = whole.end();
            any = true;

            if whole.end() == whole.start() {
                if whole.end() < s.len() {
                    let next = next_char_boundary(&s, whole.end());
                    rebuilt.push_str(&s[whole.end()..next]);
                    last_end = next;
                    search_from = next;
                } else {
                    search_from = s.len() + 1;
                }
            } else {
                search_from = whole.end();
            }

            if snum != 0 && !global && count == snum {
                break;
            }
            if search_from > s.len() {
                break;
            }
        }

        if !any {
            return Ok(None);
        }
        rebuilt.push_str(&s[last_end..]);

        let mut out_bytes = rebuilt.into_bytes();
        if binary {
            newline_to_nul(&mut out_bytes);
            return Ok(Some(vec![out_bytes]));
        }
        let lines: Vec<Vec<u8>> = out_bytes
            .split(|&b| b == b'\n')
            .map(|s| s.to_vec())
            .collect();
        Ok(Some(lines))
    }
}

fn next_char_boundary(s: &str, from: usize) -> usize {
    let mut i = from + 1;
    while i < s.len() && !s.is_char_boundary(i) {
        i += 1;
    }
    i
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn global_replace_all_matches() {
        let eng = RegexEngine::new(true);
        let re = Regex::new("o").unwrap();
        let out = eng
            .substitute_line(b"foo boo", &re, "0", 0, true, false)
            .unwrap()
            .unwrap();
        assert_eq!(out, vec![b"f00 b00".to_vec()]);
    }

    #[test]
    fn nth_occurrence_only() {
        let eng = RegexEngine::new(true);
        let re = Regex::new("o").unwrap();
        let out = eng
            .substitute_line(b"foo boo", &re, "0", 2, false, false)
            .unwrap()
            .unwrap();
        assert_eq!(out, vec![b"fo0 boo".to_vec()]);
    }

    #[test]
    fn backreference_and_ampersand() {
        let eng = RegexEngine::new(true);
        let re = Regex::new("(a)(b)").unwrap();
        let out = eng
            .substitute_line(b"ab", &re, "[&]\\2-\\1", 0, false, false)
            .unwrap()
            .unwrap();
        assert_eq!(out, vec![b"[ab]b-a".to_vec()]);
    }

    #[test]
    fn zero_width_anchor_matches_once_per_line() {
        let eng = RegexEngine::new(true);
        let re = Regex::new("^").unwrap();
        let out = eng
            .substitute_line(b"hello", &re, "#", 0, true, false)
            .unwrap()
            .unwrap();
        assert_eq!(out, vec![b"#hello".to_vec()]);
    }

    #[test]
    fn zero_width_pattern_matching_everywhere_errors() {
        let eng = RegexEngine::new(true);
        let re = Regex::new("x*").unwrap();
        let err = eng
            .substitute_line(b"abc", &re, "Y", 0, true, false)
            .unwrap_err();
        assert!(matches!(err, EdError::InfiniteSubstitutionLoop));
    }

    #[test]
    fn no_match_returns_none() {
        let eng = RegexEngine::new(true);
        let re = Regex::new("z").unwrap();
        assert!(eng
            .substitute_line(b"abc", &re, "x", 0, true, false)
            .unwrap()
            .is_none());
    }
}
