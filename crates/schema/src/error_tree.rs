//! Field error trees
//!
//! Services report field errors as flat `(dotted path, message)` pairs. An
//! `ErrorTree` nests them by splitting each path on its first dot, so a
//! group renderer can hand every child exactly the part of the tree that
//! concerns it.

use serde_json::{Map, Value};

/// One entry of an error tree
#[derive(Debug, Clone, PartialEq)]
pub enum ErrorEntry {
    /// Message for a leaf
    Message(String),
    /// Errors for the children of a group
    Nested(ErrorTree),
}

impl ErrorEntry {
    /// Get the message, if this entry is one
    pub fn as_message(&self) -> Option<&str> {
        match self {
            ErrorEntry::Message(msg) => Some(msg),
            ErrorEntry::Nested(_) => None,
        }
    }

    /// Get the nested tree, if this entry is one
    pub fn as_nested(&self) -> Option<&ErrorTree> {
        match self {
            ErrorEntry::Nested(tree) => Some(tree),
            ErrorEntry::Message(_) => None,
        }
    }
}

/// Field errors keyed by child name, in insertion order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ErrorTree {
    entries: Vec<(String, ErrorEntry)>,
}

impl ErrorTree {
    /// Create an empty tree
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a tree from `(dotted path, message)` pairs
    ///
    /// When two pairs address the same path the later one wins.
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut tree = Self::new();
        for (path, message) in pairs {
            tree.insert(path.as_ref(), message);
        }
        tree
    }

    /// Build a tree from a service payload of `[[path, message], ...]`
    ///
    /// Returns `None` when the payload does not have that shape.
    pub fn from_response(payload: &Value) -> Option<Self> {
        let pairs = payload.as_array()?;
        let mut tree = Self::new();
        for pair in pairs {
            let pair = pair.as_array()?;
            let (path, message) = match pair.as_slice() {
                [Value::String(path), message] => (path, message),
                _ => return None,
            };
            let message = match message {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            tree.insert(path, message);
        }
        Some(tree)
    }

    /// Insert a message at a dotted path
    pub fn insert(&mut self, path: &str, message: impl Into<String>) {
        match path.split_once('.') {
            None => self.set(path, ErrorEntry::Message(message.into())),
            Some((head, rest)) => {
                let existing = self
                    .entries
                    .iter_mut()
                    .find(|(k, _)| k == head)
                    .map(|(_, entry)| entry);
                if let Some(ErrorEntry::Nested(tree)) = existing {
                    tree.insert(rest, message);
                    return;
                }
                let mut nested = ErrorTree::new();
                nested.insert(rest, message);
                self.set(head, ErrorEntry::Nested(nested));
            }
        }
    }

    fn set(&mut self, key: &str, entry: ErrorEntry) {
        match self.entries.iter_mut().find(|(k, _)| k == key) {
            Some(slot) => slot.1 = entry,
            None => self.entries.push((key.to_string(), entry)),
        }
    }

    /// Entry for a direct child
    pub fn get(&self, key: &str) -> Option<&ErrorEntry> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, e)| e)
    }

    /// Message at a dotted path
    pub fn message_at(&self, path: &str) -> Option<&str> {
        match path.split_once('.') {
            None => self.get(path)?.as_message(),
            Some((head, rest)) => self.get(head)?.as_nested()?.message_at(rest),
        }
    }

    /// Entries in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ErrorEntry)> {
        self.entries.iter().map(|(k, e)| (k.as_str(), e))
    }

    /// Number of direct entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Flatten back to `(dotted path, message)` pairs
    pub fn flatten(&self) -> Vec<(String, String)> {
        let mut out = Vec::new();
        for (key, entry) in &self.entries {
            match entry {
                ErrorEntry::Message(msg) => out.push((key.clone(), msg.clone())),
                ErrorEntry::Nested(tree) => out.extend(
                    tree.flatten()
                        .into_iter()
                        .map(|(p, m)| (format!("{}.{}", key, p), m)),
                ),
            }
        }
        out
    }

    /// Nested JSON object form
    pub fn to_json(&self) -> Value {
        let mut map = Map::new();
        for (key, entry) in &self.entries {
            let value = match entry {
                ErrorEntry::Message(msg) => Value::String(msg.clone()),
                ErrorEntry::Nested(tree) => tree.to_json(),
            };
            map.insert(key.clone(), value);
        }
        Value::Object(map)
    }
}

// ============================================================================
// Tests
// ============================================================================
