//! Permissions and Grants
//!
//! A permission string is `<category>.<action>`, e.g. `read.invoices`.
//! Grants are stored per category; the action `*` grants the whole category.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

pub const DELIMITER: char = '.';
pub const WILDCARD: &str = "*";

/// Parsed permission string
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Permission<'a> {
    category: &'a str,
    action: Option<&'a str>,
}

impl<'a> Permission<'a> {
    /// Split at the first delimiter
    ///
    /// A string without delimiter is a bare category: it is only covered by
    /// that category's wildcard.
    pub fn parse(raw: &'a str) -> Self {
        match raw.split_once(DELIMITER) {
            Some((category, action)) => Self {
                category,
                action: Some(action),
            },
            None => Self {
                category: raw,
                action: None,
            },
        }
    }

    pub fn category(&self) -> &'a str {
        self.category
    }

    pub fn action(&self) -> Option<&'a str> {
        self.action
    }
}

impl fmt::Display for Permission<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.action {
            Some(action) => write!(f, "{}{}{}", self.category, DELIMITER, action),
            None => f.write_str(self.category),
        }
    }
}

/// Granted permissions, stored as `{category: [actions]}`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionSet(BTreeMap<String, BTreeSet<String>>);

impl PermissionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a grant; `read.*` or `read` alone grant the whole category
    pub fn grant(&mut self, raw: &str) {
        let permission = Permission::parse(raw);
        let action = permission.action().unwrap_or(WILDCARD);
        self.0
            .entry(permission.category().to_string())
            .or_default()
            .insert(action.to_string());
    }

    pub fn revoke(&mut self, raw: &str) {
        let permission = Permission::parse(raw);
        let action = permission.action().unwrap_or(WILDCARD);
        if let Some(actions) = self.0.get_mut(permission.category()) {
            actions.remove(action);
            if actions.is_empty() {
                self.0.remove(permission.category());
            }
        }
    }

    /// Exact grant, or the wildcard of the permission's category
    pub fn allows(&self, raw: &str) -> bool {
        let permission = Permission::parse(raw);
        let Some(actions) = self.0.get(permission.category()) else {
            return false;
        };
        actions.contains(WILDCARD)
            || permission
                .action()
                .is_some_and(|action| actions.contains(action))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Flattened `category.action` strings
    pub fn iter(&self) -> impl Iterator<Item = String> + '_ {
        self.0.iter().flat_map(|(category, actions)| {
            actions
                .iter()
                .map(move |action| format!("{category}{DELIMITER}{action}"))
        })
    }
}

impl<S: AsRef<str>> FromIterator<S> for PermissionSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = Self::new();
        for raw in iter {
            set.grant(raw.as_ref());
        }
        set
    }
}
