//! Primary-key lookup over fixture rows.
//!
//! Built fresh for every `get`, so it never goes stale against the fixture
//! store.

use crate::call::Arg;
use mockalchemy_core::{Error, KeyError, KeyErrorKind, Result, Row, Value};
use std::collections::HashMap;

/// A `get` key: a scalar, a positional tuple, or column-named values.
#[derive(Debug, Clone, PartialEq)]
pub enum Key {
    Scalar(Value),
    Tuple(Vec<Value>),
    Named(Vec<(String, Value)>),
}

impl Key {
    /// Build a named key from `(column, value)` pairs.
    pub fn named<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        Key::Named(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl From<Value> for Key {
    fn from(v: Value) -> Self {
        Key::Scalar(v)
    }
}

impl From<i32> for Key {
    fn from(v: i32) -> Self {
        Key::Scalar(v.into())
    }
}

impl From<i64> for Key {
    fn from(v: i64) -> Self {
        Key::Scalar(v.into())
    }
}

impl From<&str> for Key {
    fn from(v: &str) -> Self {
        Key::Scalar(v.into())
    }
}

impl From<String> for Key {
    fn from(v: String) -> Self {
        Key::Scalar(v.into())
    }
}

impl From<Vec<Value>> for Key {
    fn from(values: Vec<Value>) -> Self {
        Key::Tuple(values)
    }
}

impl<A: Into<Value>, B: Into<Value>> From<(A, B)> for Key {
    fn from((a, b): (A, B)) -> Self {
        Key::Tuple(vec![a.into(), b.into()])
    }
}

impl<A: Into<Value>, B: Into<Value>, C: Into<Value>> From<(A, B, C)> for Key {
    fn from((a, b, c): (A, B, C)) -> Self {
        Key::Tuple(vec![a.into(), b.into(), c.into()])
    }
}

impl From<&Key> for Arg {
    fn from(key: &Key) -> Self {
        match key {
            Key::Scalar(v) => Arg::Value(v.clone()),
            Key::Tuple(values) => Arg::List(values.iter().cloned().map(Arg::Value).collect()),
            Key::Named(pairs) => Arg::map(pairs.iter().map(|(k, v)| (k.clone(), v.clone()))),
        }
    }
}

/// Hash a primary-key tuple.
fn hash_pk_values(values: &[Value]) -> u64 {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::Hasher;

    let mut hasher = DefaultHasher::new();
    for v in values {
        hash_single_value(v, &mut hasher);
    }
    hasher.finish()
}

/// Hash a single Value into the hasher.
///
/// Integers and doubles hash apart; they only need to agree with `Value`'s
/// `PartialEq`, which never equates the two variants.
fn hash_single_value(v: &Value, hasher: &mut impl std::hash::Hasher) {
    use std::hash::Hash;

    match v {
        Value::Null => 0u8.hash(hasher),
        Value::Bool(b) => {
            1u8.hash(hasher);
            b.hash(hasher);
        }
        Value::Int(i) => {
            2u8.hash(hasher);
            i.hash(hasher);
        }
        Value::Double(f) => {
            3u8.hash(hasher);
            f.to_bits().hash(hasher);
        }
        Value::Text(s) => {
            4u8.hash(hasher);
            s.hash(hasher);
        }
        Value::Bytes(b) => {
            5u8.hash(hasher);
            b.hash(hasher);
        }
        Value::Json(j) => {
            6u8.hash(hasher);
            j.to_string().hash(hasher);
        }
        Value::Array(items) => {
            7u8.hash(hasher);
            items.len().hash(hasher);
            for item in items {
                hash_single_value(item, hasher);
            }
        }
    }
}

/// Rows keyed by primary-key tuple.
#[derive(Debug, Default)]
pub struct IdentityMap {
    primary_key: Vec<String>,
    entries: HashMap<u64, Vec<(Vec<Value>, Row)>>,
    len: usize,
}

impl IdentityMap {
    /// Key every row by its primary-key values in declared order.
    ///
    /// Later rows with the same key replace earlier ones. Column projections
    /// and entities without a declared primary key cannot be keyed.
    #[allow(clippy::result_large_err)]
    pub fn build<'a>(rows: impl IntoIterator<Item = &'a Row>) -> Result<Self> {
        let mut map = IdentityMap::default();
        for row in rows {
            let record = row.as_record().ok_or_else(|| {
                KeyError::new(
                    KeyErrorKind::NoPrimaryKey,
                    format!("row {row} has no primary key"),
                )
            })?;
            let pk = record.primary_key_values().ok_or_else(|| {
                KeyError::new(
                    KeyErrorKind::NoPrimaryKey,
                    format!("entity '{}' declares no primary key", record.table_name()),
                )
            })?;
            if map.primary_key.is_empty() {
                map.primary_key = record.table().primary_key_columns().to_vec();
            }
            map.insert(pk, row.clone());
        }
        tracing::trace!(rows = map.len, "Built identity map");
        Ok(map)
    }

    fn insert(&mut self, pk: Vec<Value>, row: Row) {
        let bucket = self.entries.entry(hash_pk_values(&pk)).or_default();
        match bucket.iter_mut().find(|(existing, _)| *existing == pk) {
            Some(slot) => slot.1 = row,
            None => {
                bucket.push((pk, row));
                self.len += 1;
            }
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Declared primary-key columns of the keyed entity.
    pub fn primary_key(&self) -> &[String] {
        &self.primary_key
    }

    /// Look up by a full primary-key tuple.
    pub fn lookup(&self, pk: &[Value]) -> Option<&Row> {
        self.entries
            .get(&hash_pk_values(pk))?
            .iter()
            .find(|(existing, _)| existing.as_slice() == pk)
            .map(|(_, row)| row)
    }
}

/// Resolve `key` against `map`.
///
/// A scalar is a one-element tuple; named keys are reordered to the declared
/// primary key. An empty map resolves every key to `None`.
#[allow(clippy::result_large_err)]
pub fn get_item_attr<'m>(map: &'m IdentityMap, key: &Key) -> Result<Option<&'m Row>> {
    if map.is_empty() {
        return Ok(None);
    }
    let pk = map.primary_key();
    let values = match key {
        Key::Scalar(v) => vec![v.clone()],
        Key::Tuple(values) => values.clone(),
        Key::Named(pairs) => {
            if let Some((unknown, _)) = pairs.iter().find(|(k, _)| !pk.contains(k)) {
                return Err(Error::InvalidKey(KeyError::new(
                    KeyErrorKind::UnknownColumn,
                    format!("'{unknown}' is not a primary key column"),
                )));
            }
            pk.iter()
                .map(|column| {
                    pairs
                        .iter()
                        .find(|(k, _)| k == column)
                        .map(|(_, v)| v.clone())
                        .ok_or_else(|| {
                            Error::InvalidKey(KeyError::new(
                                KeyErrorKind::Arity,
                                format!("missing primary key column '{column}'"),
                            ))
                        })
                })
                .collect::<Result<Vec<_>>>()?
        }
    };
    if values.len() != pk.len() {
        return Err(Error::InvalidKey(KeyError::new(
            KeyErrorKind::Arity,
            format!(
                "expected {} primary key value(s), got {}",
                pk.len(),
                values.len()
            ),
        )));
    }
    Ok(map.lookup(&values))
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockalchemy_core::{Record, Table};
    use std::sync::Arc;

    fn some_table() -> Arc<Table> {
        Table::new("some_table")
            .primary_key("pk1")
            .primary_key("pk2")
            .column("name")
            .shared()
    }

    fn row(pk1: i64, pk2: i64, name: &str) -> Row {
        Row::Entity(Record::new(
            some_table(),
            vec![pk1.into(), pk2.into(), name.into()],
        ))
    }

    #[test]
    fn test_build_keys_by_primary_key() {
        let rows = vec![row(1, 1, "a"), row(2, 1, "b")];
        let map = IdentityMap::build(&rows).unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(map.primary_key(), ["pk1", "pk2"]);
        assert_eq!(map.lookup(&[2.into(), 1.into()]), Some(&rows[1]));
    }

    #[test]
    fn test_later_duplicate_wins() {
        let rows = vec![row(1, 1, "a"), row(1, 1, "b")];
        let map = IdentityMap::build(&rows).unwrap();
        assert_eq!(map.len(), 1);
        let hit = get_item_attr(&map, &Key::from((1, 1))).unwrap().unwrap();
        assert_eq!(hit.get("name"), Some(&Value::from("b")));
    }

    #[test]
    fn test_key_forms_agree() {
        let rows = vec![row(1, 2, "a")];
        let map = IdentityMap::build(&rows).unwrap();

        let by_tuple = get_item_attr(&map, &Key::from((1, 2))).unwrap();
        let by_name = get_item_attr(&map, &Key::named([("pk2", 2), ("pk1", 1)])).unwrap();
        assert_eq!(by_tuple, by_name);
        assert!(by_tuple.is_some());
        assert_eq!(get_item_attr(&map, &Key::from((2, 1))).unwrap(), None);
    }

    #[test]
    fn test_scalar_key() {
        let table = Table::new("model_table")
            .primary_key("pk1")
            .column("name")
            .shared();
        let rows = vec![Row::Entity(Record::new(table, vec![3.into(), "x".into()]))];
        let map = IdentityMap::build(&rows).unwrap();
        assert!(get_item_attr(&map, &Key::from(3)).unwrap().is_some());
        assert!(get_item_attr(&map, &Key::from(4)).unwrap().is_none());
    }

    #[test]
    fn test_invalid_keys() {
        let rows = vec![row(1, 2, "a")];
        let map = IdentityMap::build(&rows).unwrap();

        let err = get_item_attr(&map, &Key::from(1)).unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidKey(KeyError { kind: KeyErrorKind::Arity, .. })
        ));

        let err = get_item_attr(&map, &Key::named([("name", "a")])).unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidKey(KeyError { kind: KeyErrorKind::UnknownColumn, .. })
        ));
    }

    #[test]
    fn test_tuple_rows_cannot_be_keyed() {
        let rows = vec![Row::tuple(["test"])];
        let err = IdentityMap::build(&rows).unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidKey(KeyError { kind: KeyErrorKind::NoPrimaryKey, .. })
        ));
    }

    #[test]
    fn test_empty_map_misses() {
        let map = IdentityMap::build(&[]).unwrap();
        assert!(get_item_attr(&map, &Key::from(1)).unwrap().is_none());
    }
}
