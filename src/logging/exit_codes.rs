//! Named process exit codes

use std::collections::BTreeMap;

/// Name of the fallback entry used for unknown names
pub const SUCCESS: &str = "SUCCESS";
/// Name conventionally used for failures
pub const ERROR: &str = "ERROR";
/// Name conventionally used for orderly shutdowns
pub const SHUTDOWN: &str = "SHUTDOWN";

/// Outcome of looking up an exit code by name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// The name was found in the table
    Known(i32),
    /// The name was unknown; the `SUCCESS` code was substituted
    Fallback(i32),
}

impl Resolution {
    /// The exit code to terminate with
    pub fn code(&self) -> i32 {
        match self {
            Resolution::Known(code) | Resolution::Fallback(code) => *code,
        }
    }
}

/// Immutable mapping from symbolic name to process exit code
///
/// Always contains a `SUCCESS` entry, which is the fallback for unknown names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExitCodeTable {
    codes: BTreeMap<String, i32>,
}

impl ExitCodeTable {
    /// Table with only the `SUCCESS` entry
    pub fn minimal() -> Self {
        let mut codes = BTreeMap::new();
        codes.insert(SUCCESS.to_string(), 0);
        Self { codes }
    }

    /// Add or replace an entry
    pub fn with_code(mut self, name: impl Into<String>, code: i32) -> Self {
        self.codes.insert(name.into(), code);
        self
    }

    /// Add or replace several entries
    pub fn with_codes<I, S>(self, entries: I) -> Self
    where
        I: IntoIterator<Item = (S, i32)>,
        S: Into<String>,
    {
        entries
            .into_iter()
            .fold(self, |table, (name, code)| table.with_code(name, code))
    }

    /// Look up a code by exact name
    pub fn get(&self, name: &str) -> Option<i32> {
        self.codes.get(name).copied()
    }

    /// Code substituted for unknown names
    pub fn fallback_code(&self) -> i32 {
        self.codes.get(SUCCESS).copied().unwrap_or(0)
    }

    /// Resolve a name, falling back to `SUCCESS` when it is not in the table
    pub fn resolve(&self, name: &str) -> Resolution {
        match self.get(name) {
            Some(code) => Resolution::Known(code),
            None => Resolution::Fallback(self.fallback_code()),
        }
    }

    /// Iterate over entries in name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, i32)> {
        self.codes.iter().map(|(name, code)| (name.as_str(), *code))
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    /// Always false: the `SUCCESS` entry cannot be removed
    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }
}

impl Default for ExitCodeTable {
    /// `ERROR` = -1, `SHUTDOWN` = 0, `SUCCESS` = 0
    fn default() -> Self {
        Self::minimal().with_code(ERROR, -1).with_code(SHUTDOWN, 0)
    }
}
