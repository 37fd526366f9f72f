// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Hook scripts: inline lines from the host document plus lines read from
//! `pre.*.sh` / `post.*.sh` files. Blank lines and shell comments are
//! stripped in both cases.

use serde::de::Deserializer;
use serde::Deserialize;

/// A set of script lines, fed to `/bin/sh -esx` on the remote host.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Script {
    inline: Vec<String>,
    files: Vec<String>,
}

impl Script {
    /// Combined inline and file-derived lines, in that order.
    pub fn lines(&self) -> Vec<String> {
        let mut buf = Vec::with_capacity(self.inline.len() + self.files.len());
        buf.extend(self.inline.iter().cloned());
        buf.extend(self.files.iter().cloned());
        buf
    }

    pub fn is_empty(&self) -> bool {
        self.inline.is_empty() && self.files.is_empty()
    }

    /// Append cleaned lines read from a hook file.
    pub(crate) fn push_file_lines(&mut self, lines: Vec<String>) {
        self.files.extend(lines);
    }

    /// Prepend the globals' lines, keeping inline and file lines separate.
    pub(crate) fn prepend(&mut self, globals: &Script) {
        if !globals.inline.is_empty() {
            let mut inline = globals.inline.clone();
            inline.append(&mut self.inline);
            self.inline = inline;
        }
        if !globals.files.is_empty() {
            let mut files = globals.files.clone();
            files.append(&mut self.files);
            self.files = files;
        }
    }

    #[cfg(test)]
    pub(crate) fn from_inline(lines: &[&str]) -> Self {
        Self { inline: lines.iter().map(|l| l.to_string()).collect(), files: Vec::new() }
    }
}

impl<'de> Deserialize<'de> for Script {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Script { inline: clean_lines(&raw), files: Vec::new() })
    }
}

/// Strip blank lines and `#` comments, trimming surrounding whitespace.
pub(crate) fn clean_lines(input: &str) -> Vec<String> {
    input
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
#[path = "script_tests.rs"]
mod tests;
