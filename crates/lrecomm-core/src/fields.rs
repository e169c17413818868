// SPDX-FileCopyrightText: 2026 Lrecomm Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The extensible field table carried by messaging-protocol messages.
//!
//! Fields are keyed by a small integer. Values are a minimal dynamic type
//! covering what the audio and attachment fields need: integers, byte
//! strings, text, and nested lists.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Reserved key holding `[mode_code, payload]` for voice messages.
pub const FIELD_AUDIO: u8 = 7;

/// Reserved key holding a list of `[filename, bytes]` pairs.
pub const FIELD_FILE_ATTACHMENTS: u8 = 9;

/// A dynamically typed field value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldValue {
    Int(i64),
    Bytes(#[serde(with = "base64_bytes")] Vec<u8>),
    Text(String),
    List(Vec<FieldValue>),
}

impl FieldValue {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            FieldValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            FieldValue::Bytes(v) => Some(v),
            _ => None,
        }
    }

    /// Text, or bytes that happen to be valid UTF-8.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(v) => Some(v),
            FieldValue::Bytes(v) => std::str::from_utf8(v).ok(),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[FieldValue]> {
        match self {
            FieldValue::List(v) => Some(v),
            _ => None,
        }
    }
}

/// Ordered map of field key to value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldTable(BTreeMap<u8, FieldValue>);

impl FieldTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: u8) -> Option<&FieldValue> {
        self.0.get(&key)
    }

    pub fn insert(&mut self, key: u8, value: FieldValue) -> Option<FieldValue> {
        self.0.insert(key, value)
    }

    pub fn contains(&self, key: u8) -> bool {
        self.0.contains_key(&key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

pub(crate) mod base64_bytes {
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        STANDARD.decode(s).map_err(serde::de::Error::custom)
    }
}

pub(crate) mod base64_opt {
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        bytes: &Option<Vec<u8>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match bytes {
            Some(b) => serializer.serialize_some(&STANDARD.encode(b)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Vec<u8>>, D::Error> {
        let s = Option::<String>::deserialize(deserializer)?;
        s.map(|s| STANDARD.decode(s).map_err(serde::de::Error::custom))
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn audio_field_json_uses_base64_and_numeric_keys() {
        let mut table = FieldTable::new();
        table.insert(
            FIELD_AUDIO,
            FieldValue::List(vec![FieldValue::Int(4), FieldValue::Bytes(vec![1, 2, 3])]),
        );
        let json = serde_json::to_string(&table).unwrap();
        assert_eq!(json, r#"{"7":{"list":[{"int":4},{"bytes":"AQID"}]}}"#);

        let back: FieldTable = serde_json::from_str(&json).unwrap();
        assert_eq!(back, table);
    }

    #[test]
    fn accessors_reject_other_shapes() {
        let v = FieldValue::Text("hi".into());
        assert_eq!(v.as_text(), Some("hi"));
        assert!(v.as_int().is_none());
        assert!(v.as_bytes().is_none());
        assert!(v.as_list().is_none());
        assert_eq!(FieldValue::Bytes(b"name.txt".to_vec()).as_text(), Some("name.txt"));
    }
}
