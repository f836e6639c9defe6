//! Textual command surface.
//!
//! Commands arrive as `argv` token vectors of the form
//! `<kind> <fullname> <sub-cmd> [options…]`.  This module holds what every
//! kind shares: the tokenizer, name escaping, integer parsing with typed
//! width checks, the add/delete prefix convention for name-list values,
//! and the per-invocation [`OutConfigs`] scratch record the option
//! handlers and the show path communicate through.

pub mod dispatch;
pub mod result;

pub use result::CmdResult;

use crate::error::{DatastoreError, Result};

/// Sub-command spellings shared by every kind.
pub const CREATE_SUB_CMD: &str = "create";
pub const CONFIG_SUB_CMD: &str = "config";
pub const ENABLE_SUB_CMD: &str = "enable";
pub const DISABLE_SUB_CMD: &str = "disable";
pub const DESTROY_SUB_CMD: &str = "destroy";
pub const STATS_SUB_CMD: &str = "stats";
pub const SHOW_OPT_CURRENT: &str = "current";
pub const SHOW_OPT_MODIFIED: &str = "modified";

// ---------------------------------------------------------------------------
// OutConfigs
// ---------------------------------------------------------------------------

/// Per-invocation scratch shared between sub-command parsing and the show
/// renderer.
#[derive(Debug, Default)]
pub struct OutConfigs {
    /// Show-field selection.  `0` means "mutate, don't show"; an option
    /// seen without a value under `config` stores its field bit here.
    pub flags: u64,
    /// The invocation is a `config` sub-command (read-back allowed).
    pub is_config: bool,
    /// Show the `modified` view instead of `current`.
    pub is_show_modified: bool,
    /// Fullnames of the Confs to render.
    pub list: Vec<String>,
    /// Pre-rendered stats payload (stats sub-command only).
    pub stats: Option<serde_json::Value>,
}

/// Field bits present on every kind.
pub const FLAG_ALL: u64 = u64::MAX;

// ---------------------------------------------------------------------------
// Tokenizer
// ---------------------------------------------------------------------------

/// Split one command line into argv tokens.
///
/// Double and single quotes group words; inside double quotes, `\"` and
/// `\\` escape.  An unquoted `#` starts a comment running to end of line.
pub fn tokenize(line: &str) -> Result<Vec<String>> {
    let mut tokens = Vec::new();
    let mut cur = String::new();
    let mut in_token = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            c if c.is_whitespace() => {
                if in_token {
                    tokens.push(std::mem::take(&mut cur));
                    in_token = false;
                }
            }
            '#' if !in_token => break,
            '"' => {
                in_token = true;
                loop {
                    match chars.next() {
                        Some('"') => break,
                        Some('\\') => match chars.next() {
                            Some(e @ ('"' | '\\')) => cur.push(e),
                            Some(other) => {
                                cur.push('\\');
                                cur.push(other);
                            }
                            None => {
                                return Err(DatastoreError::invalid_args(
                                    "Unterminated escape.",
                                ));
                            }
                        },
                        Some(other) => cur.push(other),
                        None => {
                            return Err(DatastoreError::invalid_args("Unterminated quote."));
                        }
                    }
                }
            }
            '\'' => {
                in_token = true;
                loop {
                    match chars.next() {
                        Some('\'') => break,
                        Some(other) => cur.push(other),
                        None => {
                            return Err(DatastoreError::invalid_args("Unterminated quote."));
                        }
                    }
                }
            }
            other => {
                in_token = true;
                cur.push(other);
            }
        }
    }
    if in_token {
        tokens.push(cur);
    }
    Ok(tokens)
}

/// Quote a name for re-serialisation when it contains whitespace, quotes,
/// or anything else the tokenizer treats specially.
pub fn escape_name(name: &str) -> String {
    if name.is_empty()
        || name.contains(char::is_whitespace)
        || name.contains('"')
        || name.contains('\'')
        || name.contains('#')
    {
        let mut out = String::with_capacity(name.len() + 2);
        out.push('"');
        for c in name.chars() {
            if c == '"' || c == '\\' {
                out.push('\\');
            }
            out.push(c);
        }
        out.push('"');
        out
    } else {
        name.to_string()
    }
}

// ---------------------------------------------------------------------------
// Name-list value prefixes
// ---------------------------------------------------------------------------

/// Operation requested by a name-list option value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameOp {
    Add,
    Delete,
}

/// Strip the add/delete prefix from a name-list value.  `+` (or nothing)
/// adds; `~` or `-` deletes.
pub fn opt_name_get(token: &str) -> (NameOp, &str) {
    if let Some(rest) = token.strip_prefix('+') {
        (NameOp::Add, rest)
    } else if let Some(rest) = token.strip_prefix('~') {
        (NameOp::Delete, rest)
    } else if let Some(rest) = token.strip_prefix('-') {
        (NameOp::Delete, rest)
    } else {
        (NameOp::Add, token)
    }
}

// ---------------------------------------------------------------------------
// Option-value plumbing
// ---------------------------------------------------------------------------

/// Consume the value token of an option.
///
/// Returns `Ok(None)` when the option is the last token of a `config`
/// sub-command: the handler records `flag` as show-requested and the
/// dispatcher renders a read-back instead of mutating.
pub fn take_opt_value(
    args: &mut std::slice::Iter<'_, String>,
    configs: &mut OutConfigs,
    flag: u64,
) -> Result<Option<String>> {
    match args.next() {
        Some(v) => Ok(Some(v.clone())),
        None if configs.is_config => {
            configs.flags = flag;
            Ok(None)
        }
        None => Err(DatastoreError::invalid_args("Bad opt value.")),
    }
}

fn bad_value(token: &str) -> DatastoreError {
    DatastoreError::out_of_range(format!("Bad opt value = {token}."))
}

pub fn parse_u8(token: &str) -> Result<u8> {
    token.parse().map_err(|_| bad_value(token))
}

pub fn parse_u16(token: &str) -> Result<u16> {
    token.parse().map_err(|_| bad_value(token))
}

pub fn parse_u32(token: &str) -> Result<u32> {
    token.parse().map_err(|_| bad_value(token))
}

pub fn parse_u64(token: &str) -> Result<u64> {
    token.parse().map_err(|_| bad_value(token))
}
