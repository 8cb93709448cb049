use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// Policy controlling which keys of a mapping level may be removed, and how
/// the policy carries into nested mappings.
///
/// JSON form: `"all" | "none" | "same_layer" | [ "key" | ["key", <filter>] ]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShatterFilter {
    /// Every key at this level.
    AllowAll,
    /// No key at this level.
    DenyAll,
    /// Keys at this level, without descending into nested mappings.
    SameLayer,
    /// Only the listed keys. First entry wins when a key is listed twice.
    Keys(Vec<FilterEntry>),
}

/// One entry of a list-form filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterEntry {
    pub key: String,
    /// Filter applied inside `key` when it holds a nested mapping. `None`
    /// means the enclosing filter is reused unchanged.
    pub sub_filter: Option<ShatterFilter>,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum FilterError {
    #[error("unknown filter policy \"{0}\" (expected \"all\", \"none\" or \"same_layer\")")]
    UnknownPolicy(String),
    #[error("filter must be a policy string or a list, got {0}")]
    UnexpectedType(&'static str),
    #[error("filter entry {0} must be a key or a [key, filter] pair")]
    MalformedEntry(usize),
    #[error("in sub-filter for \"{key}\": {source}")]
    Nested {
        key: String,
        #[source]
        source: Box<FilterError>,
    },
}

impl FilterEntry {
    pub fn bare(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            sub_filter: None,
        }
    }

    pub fn nested(key: impl Into<String>, sub_filter: ShatterFilter) -> Self {
        Self {
            key: key.into(),
            sub_filter: Some(sub_filter),
        }
    }
}

impl ShatterFilter {
    /// List-form filter made of bare keys only.
    pub fn keys<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Keys(keys.into_iter().map(|k| FilterEntry::bare(k)).collect())
    }

    fn entry(&self, key: &str) -> Option<&FilterEntry> {
        match self {
            Self::Keys(entries) => entries.iter().find(|e| e.key == key),
            _ => None,
        }
    }

    /// Filter that applies inside the nested mapping stored under `key`.
    ///
    /// A `[key, filter]` pair yields its sub-filter; anything else (a bare
    /// entry, no entry, or a policy) carries the filter down unchanged.
    pub fn resolve_sub_filter(&self, key: &str) -> &ShatterFilter {
        match self.entry(key).and_then(|e| e.sub_filter.as_ref()) {
            Some(sub) => sub,
            None => self,
        }
    }

    /// Read as an `affected` filter: may `key` be deleted at this level?
    pub fn admits(&self, key: &str) -> bool {
        match self {
            Self::DenyAll => false,
            Self::Keys(_) => self.entry(key).is_some(),
            Self::AllowAll | Self::SameLayer => true,
        }
    }

    /// Read as an `unaffected` filter: is `key` shielded from every removal,
    /// nested ones included? Only bare entries shield a key outright; a
    /// `[key, filter]` pair only narrows what happens inside it.
    pub fn protects(&self, key: &str) -> bool {
        match self {
            Self::AllowAll => true,
            Self::Keys(_) => matches!(self.entry(key), Some(e) if e.sub_filter.is_none()),
            Self::DenyAll | Self::SameLayer => false,
        }
    }

    /// Whether descending with this as the `affected` filter can yield
    /// anything at all.
    pub fn permits_removal(&self) -> bool {
        match self {
            Self::DenyAll => false,
            Self::Keys(entries) => !entries.is_empty(),
            Self::AllowAll | Self::SameLayer => true,
        }
    }

    /// Parse the JSON form. Malformed entries are rejected rather than
    /// silently ignored.
    pub fn from_value(value: &Value) -> Result<Self, FilterError> {
        match value {
            Value::String(policy) => match policy.as_str() {
                "all" => Ok(Self::AllowAll),
                "none" => Ok(Self::DenyAll),
                "same_layer" => Ok(Self::SameLayer),
                other => Err(FilterError::UnknownPolicy(other.to_string())),
            },
            Value::Array(items) => items
                .iter()
                .enumerate()
                .map(|(index, item)| parse_entry(index, item))
                .collect::<Result<Vec<_>, _>>()
                .map(Self::Keys),
            Value::Null => Err(FilterError::UnexpectedType("null")),
            Value::Bool(_) => Err(FilterError::UnexpectedType("a boolean")),
            Value::Number(_) => Err(FilterError::UnexpectedType("a number")),
            Value::Object(_) => Err(FilterError::UnexpectedType("an object")),
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            Self::AllowAll => Value::from("all"),
            Self::DenyAll => Value::from("none"),
            Self::SameLayer => Value::from("same_layer"),
            Self::Keys(entries) => Value::Array(
                entries
                    .iter()
                    .map(|e| match &e.sub_filter {
                        None => Value::from(e.key.as_str()),
                        Some(sub) => Value::Array(vec![Value::from(e.key.as_str()), sub.to_value()]),
                    })
                    .collect(),
            ),
        }
    }
}

fn parse_entry(index: usize, item: &Value) -> Result<FilterEntry, FilterError> {
    match item {
        Value::String(key) => Ok(FilterEntry::bare(key.as_str())),
        Value::Array(pair) => match pair.as_slice() {
            [Value::String(key), sub] => {
                let sub_filter = ShatterFilter::from_value(sub).map_err(|e| FilterError::Nested {
                    key: key.clone(),
                    source: Box::new(e),
                })?;
                Ok(FilterEntry::nested(key.as_str(), sub_filter))
            }
            _ => Err(FilterError::MalformedEntry(index)),
        },
        _ => Err(FilterError::MalformedEntry(index)),
    }
}

impl Serialize for ShatterFilter {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ShatterFilter {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::from_value(&value).map_err(serde::de::Error::custom)
    }
}
