use serde::Serialize;
use serde_json::{Map, Value};

use super::filter::ShatterFilter;

/// How far below the top level removals may reach.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Depth {
    Unlimited,
    Levels(u32),
}

impl Depth {
    fn allows_descent(self) -> bool {
        self != Self::Levels(0)
    }

    fn below(self) -> Self {
        match self {
            Self::Levels(n) => Self::Levels(n.saturating_sub(1)),
            Self::Unlimited => Self::Unlimited,
        }
    }
}

/// Negative values mean unlimited.
impl From<i64> for Depth {
    fn from(depth: i64) -> Self {
        if depth < 0 {
            Self::Unlimited
        } else {
            Self::Levels(u32::try_from(depth).unwrap_or(u32::MAX))
        }
    }
}

/// Parameters of one [`shatter`] run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShatterOptions {
    pub depth: Depth,
    /// Keys that are candidates for removal.
    pub affected: ShatterFilter,
    /// Keys that must survive. Takes priority over `affected`.
    pub unaffected: ShatterFilter,
}

impl Default for ShatterOptions {
    fn default() -> Self {
        Self {
            depth: Depth::Levels(0),
            affected: ShatterFilter::AllowAll,
            unaffected: ShatterFilter::DenyAll,
        }
    }
}

impl ShatterOptions {
    /// Negative means unlimited.
    pub fn depth(mut self, depth: i64) -> Self {
        self.depth = Depth::from(depth);
        self
    }

    pub fn affected(mut self, filter: ShatterFilter) -> Self {
        self.affected = filter;
        self
    }

    pub fn unaffected(mut self, filter: ShatterFilter) -> Self {
        self.unaffected = filter;
        self
    }
}

/// A copy of the input with exactly one field removed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Variant {
    /// Key path of the removed field, outermost key first.
    pub removed: Vec<String>,
    pub document: Map<String, Value>,
}

/// Lazily enumerate the corrupted variants of `document`.
///
/// For each key, in document order: a protected key yields nothing. Otherwise
/// the variants of its nested mapping come first (when depth and filters allow
/// descent), then the variant with the key itself deleted (when the filters
/// allow a same-layer deletion). The input is only borrowed; every variant is
/// a fresh copy.
pub fn shatter<'a>(document: &'a Map<String, Value>, options: &'a ShatterOptions) -> Shatter<'a> {
    Shatter {
        stack: vec![Frame::new(
            document,
            options.depth,
            &options.affected,
            &options.unaffected,
            None,
        )],
    }
}

/// Iterator returned by [`shatter`]. Single pass; dropping it early is fine.
pub struct Shatter<'a> {
    stack: Vec<Frame<'a>>,
}

/// One mapping level being walked.
struct Frame<'a> {
    map: &'a Map<String, Value>,
    entries: serde_json::map::Iter<'a>,
    /// Key in the parent mapping that holds `map`.
    via: Option<&'a String>,
    /// Key whose same-layer deletion is still owed, set while its nested
    /// variants are being produced.
    pending: Option<&'a String>,
    depth: Depth,
    affected: &'a ShatterFilter,
    unaffected: &'a ShatterFilter,
}

impl<'a> Frame<'a> {
    fn new(
        map: &'a Map<String, Value>,
        depth: Depth,
        affected: &'a ShatterFilter,
        unaffected: &'a ShatterFilter,
        via: Option<&'a String>,
    ) -> Self {
        Self {
            map,
            entries: map.iter(),
            via,
            pending: None,
            depth,
            affected,
            unaffected,
        }
    }

    fn protects(&self, key: &str) -> bool {
        self.unaffected.protects(key) || *self.affected == ShatterFilter::DenyAll
    }

    fn deletes(&self, key: &str) -> bool {
        *self.unaffected != ShatterFilter::SameLayer && self.affected.admits(key)
    }

    fn descend(&self, key: &'a String, value: &'a Value) -> Option<Frame<'a>> {
        if !self.depth.allows_descent() || *self.affected == ShatterFilter::SameLayer {
            return None;
        }
        let Value::Object(child) = value else {
            return None;
        };

        let affected = self.affected.resolve_sub_filter(key);
        if !affected.permits_removal() {
            return None;
        }
        let unaffected = self.unaffected.resolve_sub_filter(key);

        Some(Frame::new(child, self.depth.below(), affected, unaffected, Some(key)))
    }
}

impl<'a> Shatter<'a> {
    /// Drop the removal paths and yield documents only.
    pub fn documents(self) -> impl Iterator<Item = Map<String, Value>> + 'a {
        self.map(|variant| variant.document)
    }

    /// Build the variant deleting `key` from the innermost frame, rewrapped
    /// through every enclosing level.
    fn emit(&self, key: &'a String) -> Option<Variant> {
        let (innermost, ancestors) = self.stack.split_last()?;

        let mut document = without(innermost.map, key);
        let mut removed = vec![key.clone()];
        let mut via = innermost.via;

        for frame in ancestors.iter().rev() {
            let parent_key = via?;
            document = replaced(frame.map, parent_key, document);
            removed.push(parent_key.clone());
            via = frame.via;
        }

        removed.reverse();
        Some(Variant { removed, document })
    }
}

impl<'a> Iterator for Shatter<'a> {
    type Item = Variant;

    fn next(&mut self) -> Option<Variant> {
        loop {
            let frame = self.stack.last_mut()?;

            if let Some(key) = frame.pending.take() {
                if frame.deletes(key) {
                    return self.emit(key);
                }
                continue;
            }

            match frame.entries.next() {
                None => {
                    self.stack.pop();
                }
                Some((key, value)) => {
                    if frame.protects(key) {
                        continue;
                    }
                    frame.pending = Some(key);
                    if let Some(child) = frame.descend(key, value) {
                        self.stack.push(child);
                    }
                }
            }
        }
    }
}

impl std::iter::FusedIterator for Shatter<'_> {}

fn without(map: &Map<String, Value>, key: &str) -> Map<String, Value> {
    map.iter()
        .filter(|(k, _)| k.as_str() != key)
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}

/// Copy of `map` with `key` bound to `nested`; the old value under `key` is
/// never cloned.
fn replaced(map: &Map<String, Value>, key: &str, nested: Map<String, Value>) -> Map<String, Value> {
    let mut nested = Some(Value::Object(nested));
    map.iter()
        .map(|(k, v)| {
            let value = match nested.take() {
                Some(value) if k == key => value,
                taken => {
                    nested = taken;
                    v.clone()
                }
            };
            (k.clone(), value)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("not an object: {other}"),
        }
    }

    #[test]
    fn replaced_keeps_key_order_and_siblings() {
        let parent = object(json!({"a": 1, "b": {"c": 2, "d": 3}, "e": [4]}));
        let copy = replaced(&parent, "b", object(json!({"d": 3})));

        assert_eq!(Value::Object(copy.clone()), json!({"a": 1, "b": {"d": 3}, "e": [4]}));
        assert_eq!(copy.keys().collect::<Vec<_>>(), vec!["a", "b", "e"]);
        assert_eq!(parent["b"], json!({"c": 2, "d": 3}));
    }

    #[test]
    fn replaced_ignores_absent_key() {
        let parent = object(json!({"a": 1}));
        assert_eq!(replaced(&parent, "z", Map::new()), parent);
    }
}
