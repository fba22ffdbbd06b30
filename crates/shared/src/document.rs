use std::cmp::Ordering;

use serde::{Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};
use strum::{AsRefStr, Display, EnumString, VariantArray};

/// Field map of a stored document. Keys may be dotted paths (`habitLogs.abc`)
/// when used as a partial update.
pub type Fields = Map<String, Value>;

#[derive(
    EnumString, VariantArray, Display, AsRefStr, Clone, Copy, Debug, PartialEq, Eq, Hash,
)]
#[strum(serialize_all = "snake_case")]
pub enum Collection {
    Habits,
    DailyPlans,
    AnnualPlans,
    MonthlyPlans,
    WeeklyPlans,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Document {
    pub id: String,
    pub fields: Fields,
}

impl Document {
    pub fn new(id: impl Into<String>, fields: Fields) -> Self {
        Self {
            id: id.into(),
            fields,
        }
    }

    pub fn decode<T: DeserializeOwned>(&self) -> crate::Result<T> {
        Ok(serde_json::from_value(Value::Object(self.fields.clone()))?)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Op {
    Eq,
    Gte,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Filter {
    pub field: String,
    pub op: Op,
    pub value: Value,
}

impl Filter {
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            op: Op::Eq,
            value: value.into(),
        }
    }

    pub fn gte(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            op: Op::Gte,
            value: value.into(),
        }
    }

    pub fn matches(&self, fields: &Fields) -> bool {
        let Some(value) = fields.get(&self.field) else {
            return false;
        };

        match self.op {
            Op::Eq => value == &self.value,
            Op::Gte => matches!(
                compare(value, &self.value),
                Some(Ordering::Greater | Ordering::Equal)
            ),
        }
    }
}

/// Returns true when every filter matches (logical AND).
pub fn matches_all(filters: &[Filter], fields: &Fields) -> bool {
    filters.iter().all(|f| f.matches(fields))
}

fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        (Value::Number(a), Value::Number(b)) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

/// Applies a partial update to `target`.
///
/// A plain key replaces the whole top-level value. A dotted key walks (and
/// creates) nested objects and only replaces the last segment, leaving sibling
/// keys untouched.
pub fn apply_fields(target: &mut Fields, fields: &Fields) {
    for (path, value) in fields {
        let mut segments = path.split('.').peekable();
        let mut current = &mut *target;

        while let Some(segment) = segments.next() {
            if segments.peek().is_none() {
                current.insert(segment.to_owned(), value.clone());
                break;
            }

            let entry = current
                .entry(segment.to_owned())
                .or_insert_with(|| Value::Object(Map::new()));

            if !entry.is_object() {
                *entry = Value::Object(Map::new());
            }

            current = match entry {
                Value::Object(map) => map,
                _ => unreachable!("entry was just replaced by an object"),
            };
        }
    }
}

pub fn to_fields<T: Serialize>(value: &T) -> crate::Result<Fields> {
    match serde_json::to_value(value)? {
        Value::Object(fields) => Ok(fields),
        other => crate::bail!("expected an object, got {other}"),
    }
}
