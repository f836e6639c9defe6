//! Namespaced object identity.
//!
//! Every configuration object is addressed by a *fullname*
//! `namespace:local` with `:` as the fixed delimiter.  Objects in the
//! default namespace carry an empty namespace part, so their fullnames
//! start with the delimiter (`:port01`).  Local names are user-chosen,
//! non-empty printable strings that must not contain the delimiter.

use crate::error::{DatastoreError, Result};

/// Fixed delimiter between namespace and local name.
pub const NS_DELIMITER: char = ':';

/// Upper bound on a fullname, namespace and delimiter included.
pub const MAX_FULLNAME_LEN: usize = 96;

// ---------------------------------------------------------------------------
// Fullname helpers
// ---------------------------------------------------------------------------

/// Join a namespace and a local name into a fullname.
pub fn fullname(ns: &str, local: &str) -> Result<String> {
    if local.is_empty() {
        return Err(DatastoreError::invalid_args("Empty name."));
    }
    if local.contains(NS_DELIMITER) {
        return Err(DatastoreError::invalid_args(format!(
            "Bad name = {local}."
        )));
    }
    if !local.chars().all(|c| c.is_ascii_graphic() || c == ' ') {
        return Err(DatastoreError::invalid_args(format!(
            "Bad name = {local}."
        )));
    }
    let full = format!("{ns}{NS_DELIMITER}{local}");
    if full.len() > MAX_FULLNAME_LEN {
        return Err(DatastoreError::too_long(format!("Bad name = {local}.")));
    }
    Ok(full)
}

/// Split a fullname into `(namespace, local)`.
pub fn split_fullname(name: &str) -> (&str, &str) {
    match name.find(NS_DELIMITER) {
        Some(pos) => (&name[..pos], &name[pos + 1..]),
        None => ("", name),
    }
}

/// Rebuild a fullname under a different namespace, keeping the local part.
pub fn replace_namespace(name: &str, new_ns: &str) -> Result<String> {
    let (_, local) = split_fullname(name);
    fullname(new_ns, local)
}

/// Canonicalise a user-supplied name token: a token carrying the delimiter
/// is re-validated as-is, a bare local name is placed under `current_ns`.
pub fn resolve(current_ns: &str, token: &str) -> Result<String> {
    match token.find(NS_DELIMITER) {
        Some(pos) => fullname(&token[..pos], &token[pos + 1..]),
        None => fullname(current_ns, token),
    }
}

// ---------------------------------------------------------------------------
// NameList
// ---------------------------------------------------------------------------

/// A bag of fullnames that preserves insertion order for serialisation but
/// compares as a set: two lists are equal when they hold the same members,
/// order ignored.  Members are unique (`add` refuses duplicates).
#[derive(Debug, Clone, Default)]
pub struct NameList {
    names: Vec<String>,
}

impl NameList {
    pub fn new() -> Self {
        Self { names: Vec::new() }
    }

    /// Append a name.  Fails with `AlreadyExists` if it is a member.
    pub fn add(&mut self, name: &str) -> Result<()> {
        if self.contains(name) {
            return Err(DatastoreError::already_exists(format!(
                "name = {name}."
            )));
        }
        self.names.push(name.to_string());
        Ok(())
    }

    /// Remove a name.  Fails with `NotFound` if it is not a member.
    pub fn remove(&mut self, name: &str) -> Result<()> {
        match self.names.iter().position(|n| n == name) {
            Some(pos) => {
                self.names.remove(pos);
                Ok(())
            }
            None => Err(DatastoreError::not_found(format!("name = {name}."))),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Deep clone, optionally rewriting every member under a new namespace.
    pub fn duplicate(&self, ns: Option<&str>) -> Result<Self> {
        let mut dup = Self::new();
        for name in self.iter() {
            match ns {
                Some(ns) => dup.add(&replace_namespace(name, ns)?)?,
                None => dup.add(name)?,
            }
        }
        Ok(dup)
    }
}

impl PartialEq for NameList {
    fn eq(&self, other: &Self) -> bool {
        self.names.len() == other.names.len()
            && self.names.iter().all(|n| other.contains(n))
    }
}

impl Eq for NameList {}
