use serde_json::{Number, Value};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

/// Records bucketed by key. Iteration yields keys in ascending order and each
/// bucket keeps its members in input order.
pub type Grouped<K, R> = BTreeMap<K, Vec<R>>;

/// Groups `records` by the key `key_fn` derives from each one.
///
/// Every record lands in exactly one bucket, buckets preserve input order, and
/// buckets are ordered by `K`'s own ordering.
pub fn group_by<R, K, I, F>(records: I, key_fn: F) -> Grouped<K, R>
where
    I: IntoIterator<Item = R>,
    K: Ord,
    F: Fn(&R) -> K,
{
    let mut grouped: Grouped<K, R> = BTreeMap::new();
    for record in records {
        let key = key_fn(&record);
        grouped.entry(key).or_default().push(record);
    }
    grouped
}

/// Groups opaque JSON records by the value stored under `field`.
///
/// Records without the field (or records that are not objects) share the
/// absent key instead of being rejected.
pub fn group_by_field<I>(records: I, field: &str) -> Grouped<GroupKey, Value>
where
    I: IntoIterator<Item = Value>,
{
    group_by(records, |record| GroupKey::of_field(record, field))
}

/// Key derived from a JSON field, ordered by its text form.
///
/// Numbers compare as text, so `"10"` sorts before `"9"`. The absent key sorts
/// after every present key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GroupKey {
    text: String,
    kind: KeyKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
enum KeyKind {
    Absent,
    Null,
    Bool,
    Number,
    Text,
    Array,
    Object,
}

impl GroupKey {
    pub fn absent() -> Self {
        Self {
            text: String::new(),
            kind: KeyKind::Absent,
        }
    }

    pub fn of_field(record: &Value, field: &str) -> Self {
        record
            .get(field)
            .map(Self::from_value)
            .unwrap_or_else(Self::absent)
    }

    pub fn from_value(value: &Value) -> Self {
        let (text, kind) = match value {
            Value::Null => ("null".to_string(), KeyKind::Null),
            Value::Bool(flag) => (flag.to_string(), KeyKind::Bool),
            Value::Number(number) => (number_text(number), KeyKind::Number),
            Value::String(text) => (text.clone(), KeyKind::Text),
            Value::Array(_) => (value.to_string(), KeyKind::Array),
            Value::Object(_) => (value.to_string(), KeyKind::Object),
        };
        Self { text, kind }
    }

    pub fn is_absent(&self) -> bool {
        self.kind == KeyKind::Absent
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }
}

/// Shortest text form of a number; integral floats drop their fraction, so
/// `1.0` and `1` share the text `"1"`.
fn number_text(number: &Number) -> String {
    if number.is_i64() || number.is_u64() {
        return number.to_string();
    }
    match number.as_f64() {
        Some(value) if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e21 => {
            format!("{value:.0}")
        }
        Some(value) => value.to_string(),
        None => number.to_string(),
    }
}

impl From<&str> for GroupKey {
    fn from(value: &str) -> Self {
        Self {
            text: value.to_string(),
            kind: KeyKind::Text,
        }
    }
}

impl Ord for GroupKey {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.is_absent(), other.is_absent()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            (false, false) => self
                .text
                .cmp(&other.text)
                .then_with(|| self.kind.cmp(&other.kind)),
        }
    }
}

impl PartialOrd for GroupKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_absent() {
            write!(f, "<absent>")
        } else {
            write!(f, "{}", self.text)
        }
    }
}
