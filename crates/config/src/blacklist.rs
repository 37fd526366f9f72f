// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Sanitizer for user-supplied rsync arguments.
//!
//! Arguments on this list are either constructed internally or would alter
//! rsync's behaviour in unwanted ways, so they are removed from the extra
//! arguments a job config may carry.

use globset::Glob;

/// An rsync argument that may exist in long and short form (`--long` vs
/// `-l`). If the argument swallows the next token, `takes_arg` is true.
///
/// `long` can be a simple match pattern (`*` = any run, `?` = one char).
struct BlacklistArg {
    long: &'static str,
    short: Option<&'static str>,
    takes_arg: bool,
}

const fn flag(long: &'static str) -> BlacklistArg {
    BlacklistArg { long, short: None, takes_arg: false }
}

const fn flag_short(long: &'static str, short: &'static str) -> BlacklistArg {
    BlacklistArg { long, short: Some(short), takes_arg: false }
}

const fn opt(long: &'static str) -> BlacklistArg {
    BlacklistArg { long, short: None, takes_arg: true }
}

const fn opt_short(long: &'static str, short: &'static str) -> BlacklistArg {
    BlacklistArg { long, short: Some(short), takes_arg: true }
}

/// This list is not exhaustive.
const BLACKLIST: &[BlacklistArg] = &[
    opt("--debug"),                            // generates too much noise
    opt("--info"),                             // we already set -v, which influences both --debug and --info
    flag_short("--verbose", "-v"),             // should not be set multiple times (noise)
    flag("--delete*"),                         // we're enforcing --delete --delete-excluded --delete-delay
    flag("--del"),                             // shorthand for some other --delete-* flags
    opt_short("--rsh", "-e"),                  // is constructed separately
    flag_short("--quiet", "-q"),               // we actually want some output
    flag("--force"),                           // irrelevant when --delete is set
    opt("--include"),                          // is constructed separately
    opt("--exclude"),                          // is constructed separately
    opt_short("--filter", "-f"),               // overrides --include/--exclude
    flag_short("--itemize-changes", "-i"),     // defines a machine readable output
    opt("--out-format"),                       // would override --itemize-changes
    flag("--partial"),                         // "keep partially transferred files". nope.
    flag_short("--progress", "-P"),            // ANSI escape sequences for a human-readable progress meter
    flag("--daemon"),                          // VERY bad idea to daemonize the rsync instance
];

impl BlacklistArg {
    /// Returns how many following tokens to swallow when `arg` matches,
    /// `None` when it does not.
    fn matches(&self, arg: &str) -> Option<usize> {
        if let Some(short) = self.short {
            if arg == short {
                return Some(self.consumed());
            }
            if self.takes_arg && arg.starts_with(short) {
                // gotcha: -s42 does not swallow the next token
                return Some(0);
            }
        }

        if arg == self.long {
            return Some(self.consumed());
        }
        if self.long.contains('*') || self.long.contains('?') {
            if glob_match(self.long, arg) {
                return Some(self.consumed());
            }
        } else if self.takes_arg && arg.starts_with(self.long) && arg.as_bytes().get(self.long.len()) == Some(&b'=') {
            // gotcha: --long=arg does not swallow the next token
            return Some(0);
        }

        None
    }

    fn consumed(&self) -> usize {
        usize::from(self.takes_arg)
    }
}

fn glob_match(pattern: &str, arg: &str) -> bool {
    Glob::new(pattern).map(|g| g.compile_matcher().is_match(arg)).unwrap_or(false)
}

/// Remove blacklisted values from user-supplied rsync arguments, to prevent
/// you from shooting yourself in the foot.
pub fn sanitize(args: &[String]) -> Vec<String> {
    let mut out = Vec::with_capacity(args.len());

    let mut i = 0;
    while i < args.len() {
        let arg = &args[i];
        match BLACKLIST.iter().find_map(|rule| rule.matches(arg)) {
            Some(consumed) => i += 1 + consumed,
            None => {
                out.push(arg.clone());
                i += 1;
            }
        }
    }
    out
}

#[cfg(test)]
#[path = "blacklist_tests.rs"]
mod tests;
