//! Validation result tree.

use indexmap::IndexMap;
use serde::Serialize;

/// Failure messages for one field: a flat list, or the messages of a nested
/// schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FieldMessages {
    List(Vec<String>),
    Nested(Messages),
}

/// Field name → messages, in schema declaration order.
///
/// Fields that passed (or were absent and optional) have no entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Messages(IndexMap<String, FieldMessages>);

/// Outcome of validating one input record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
    success: bool,
    messages: Messages,
}

impl FieldMessages {
    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            FieldMessages::List(list) => Some(list),
            FieldMessages::Nested(_) => None,
        }
    }

    pub fn as_nested(&self) -> Option<&Messages> {
        match self {
            FieldMessages::Nested(nested) => Some(nested),
            FieldMessages::List(_) => None,
        }
    }

    fn is_clean(&self) -> bool {
        match self {
            FieldMessages::List(list) => list.is_empty(),
            FieldMessages::Nested(nested) => nested.is_clean(),
        }
    }
}

impl Messages {
    pub fn get(&self, field: &str) -> Option<&FieldMessages> {
        self.0.get(field)
    }

    /// Message list at a field path, e.g. `["details", "foo"]`.
    pub fn at(&self, path: &[&str]) -> Option<&[String]> {
        let (last, parents) = path.split_last()?;
        let mut node = self;
        for field in parents {
            node = node.get(field)?.as_nested()?;
        }
        node.get(last)?.as_list()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldMessages)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// No failure message anywhere in the tree.
    pub fn is_clean(&self) -> bool {
        self.0.values().all(FieldMessages::is_clean)
    }

    pub(crate) fn insert(&mut self, field: impl Into<String>, messages: FieldMessages) {
        self.0.insert(field.into(), messages);
    }
}

impl ValidationResult {
    pub fn new(messages: Messages) -> Self {
        Self {
            success: messages.is_clean(),
            messages,
        }
    }

    pub fn success(&self) -> bool {
        self.success
    }

    pub fn messages(&self) -> &Messages {
        &self.messages
    }

    pub fn messages_at(&self, path: &[&str]) -> Option<&[String]> {
        self.messages.at(path)
    }

    pub fn into_messages(self) -> Messages {
        self.messages
    }
}
