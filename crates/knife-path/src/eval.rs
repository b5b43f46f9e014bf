use std::borrow::Cow;
use std::fmt;

use tracing::trace;

use crate::error::PathError;
use crate::fold::Constant;
use crate::parser::{Parser, Step};
use crate::value::{FloatKind, FromValue, KeyType, Mapping, Value};

/// A parsed navigation expression, reusable across roots
#[derive(Debug, Clone, PartialEq)]
pub struct Path {
    source: String,
    steps: Vec<Step>,
}

impl Path {
    pub fn parse(source: &str) -> Result<Self, PathError> {
        trace!(path = source, "parsing path");
        let steps = Parser::new(source)?.parse_path()?;
        Ok(Self {
            source: source.to_string(),
            steps,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Walk the path from `root`; the leading identifier is a member of `root`
    pub fn eval(&self, root: &Value) -> Result<Value, PathError> {
        let mut current: Cow<'_, Value> = Cow::Borrowed(root);
        for step in &self.steps {
            let next = match &current {
                Cow::Borrowed(value) => apply(*value, step)?,
                Cow::Owned(value) => Cow::Owned(apply(value, step)?.into_owned()),
            };
            current = next;
        }
        Ok(current.into_owned())
    }

    /// Store the result in `dest` when it has the destination's type.
    ///
    /// A result of another type leaves `dest` untouched and is not an error.
    pub fn eval_into<T: FromValue>(&self, root: &Value, dest: &mut T) -> Result<(), PathError> {
        let value = self.eval(root)?;
        if let Some(v) = T::from_value(&value) {
            *dest = v;
        }
        Ok(())
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl std::str::FromStr for Path {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Path::parse(s)
    }
}

/// Parse `expr` and evaluate it against `root`
pub fn evaluate(expr: &str, root: &Value) -> Result<Value, PathError> {
    Path::parse(expr)?.eval(root)
}

/// Parse `expr` and store its result in `dest` when assignable
pub fn evaluate_into<T: FromValue>(
    expr: &str,
    root: &Value,
    dest: &mut T,
) -> Result<(), PathError> {
    Path::parse(expr)?.eval_into(root, dest)
}

fn apply<'a>(value: &'a Value, step: &Step) -> Result<Cow<'a, Value>, PathError> {
    let value = value.direct();
    match step {
        Step::Select(name) => select(value, name),
        Step::Index(key) => index(value, key),
    }
}

fn select<'a>(value: &'a Value, name: &str) -> Result<Cow<'a, Value>, PathError> {
    match value {
        Value::Record(record) => record
            .get(name)
            .map(Cow::Borrowed)
            .ok_or_else(|| PathError::NotFound(format!("field {} in {}", name, record.name))),
        Value::Object(object) => object.field(name).map(Cow::Owned).ok_or_else(|| {
            PathError::NotFound(format!("field {} in {}", name, object.type_name()))
        }),
        Value::Map(mapping) if mapping.key_type() == KeyType::String => Ok(mapping
            .get_str(name)
            .map_or(Cow::Owned(Value::Null), Cow::Borrowed)),
        other => Err(PathError::mismatch(format!(
            "cannot select {} on {}",
            name,
            other.type_name()
        ))),
    }
}

fn index<'a>(value: &'a Value, key: &Constant) -> Result<Cow<'a, Value>, PathError> {
    match value {
        Value::Seq(items) => {
            let i = sequence_index(key)?;
            items
                .get(i)
                .map(Cow::Borrowed)
                .ok_or(PathError::OutOfRange {
                    index: i as u64,
                    len: items.len(),
                })
        }
        Value::Map(mapping) => {
            let key = map_key(mapping, key)?;
            Ok(mapping
                .get(&key)
                .map_or(Cow::Owned(Value::Null), Cow::Borrowed))
        }
        other => Err(PathError::mismatch(format!(
            "cannot index {} with {}",
            other.type_name(),
            key
        ))),
    }
}

fn sequence_index(key: &Constant) -> Result<usize, PathError> {
    let i = key.as_integer().ok_or_else(|| {
        PathError::mismatch(format!("index {} ({}) must be integer", key, key.kind_name()))
    })?;
    if i < 0 {
        return Err(PathError::mismatch(format!(
            "index {} must be non-negative",
            i
        )));
    }
    i64::try_from(i)
        .ok()
        .and_then(|i| usize::try_from(i).ok())
        .ok_or_else(|| PathError::overflow(format!("index {} overflows int", i)))
}

/// Convert a folded constant to a key of the mapping's declared key type
fn map_key(mapping: &Mapping, key: &Constant) -> Result<Value, PathError> {
    let key_type = mapping.key_type();
    let incompatible = || {
        PathError::mismatch(format!(
            "cannot use {} ({}) as {} key",
            key,
            key.kind_name(),
            key_type
        ))
    };
    let unrepresentable =
        || PathError::overflow(format!("{} cannot be represented as {}", key, key_type));

    match key_type {
        KeyType::Int(kind) => {
            let i = key.as_integer().ok_or_else(incompatible)?;
            let (min, max) = kind.bounds();
            if i < i128::from(min) || i > i128::from(max) {
                return Err(unrepresentable());
            }
            Ok(Value::Int(kind, i as i64))
        }
        KeyType::Uint(kind) => {
            let i = key.as_integer().ok_or_else(incompatible)?;
            if i < 0 || i > i128::from(kind.max()) {
                return Err(unrepresentable());
            }
            Ok(Value::Uint(kind, i as u64))
        }
        KeyType::Float(kind) => {
            if !key.is_numeric() {
                return Err(incompatible());
            }
            let value = match kind {
                FloatKind::Float64 => key.to_f64_exact(),
                FloatKind::Float32 => key.to_f32_exact().map(f64::from),
            };
            value
                .map(|v| Value::Float(kind, v))
                .ok_or_else(unrepresentable)
        }
        KeyType::String => match key {
            Constant::String(s) => Ok(Value::String(s.clone())),
            _ => Err(incompatible()),
        },
        KeyType::Bool => match key {
            Constant::Bool(b) => Ok(Value::Bool(*b)),
            _ => Err(incompatible()),
        },
        KeyType::Other => Err(PathError::mismatch(format!(
            "mappings keyed by {} cannot be indexed",
            key_type
        ))),
    }
}
