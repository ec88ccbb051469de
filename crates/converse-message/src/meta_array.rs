use serde::{Deserialize, Serialize};

/// One user-defined key with an ordered list of string values.
///
/// A message holds these as an ordered sequence; insertion order is part
/// of the canonical record and survives serialization. Keys are not
/// required to be unique across the sequence.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MessageMetaArray {
    pub key: String,
    pub value: Vec<String>,
}

impl MessageMetaArray {
    pub fn new(key: impl Into<String>, value: Vec<String>) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }
}
