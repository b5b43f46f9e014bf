//! Built-in template primitives
//!
//! Kind views (`struct`, `map`, ...) unwrap named types and yield null when
//! the argument has another kind, so templates can use them as tests.

use anyhow::{anyhow, bail, ensure, Context, Result};
use knife_core::TypeKind;
use knife_path::{Mapping, Value};
use regex::Regex;
use tracing::warn;

use crate::template::{FuncMap, TemplateData};
use crate::view::{Entity, EntityView, PositionView};

fn arity(name: &str, args: &[Value], expected: usize) -> Result<()> {
    ensure!(
        args.len() == expected,
        "{}: expected {} argument(s), got {}",
        name,
        expected,
        args.len()
    );
    Ok(())
}

fn string_arg<'a>(name: &str, value: &'a Value) -> Result<&'a str> {
    value
        .as_str()
        .ok_or_else(|| anyhow!("{}: expected string, got {}", name, value.type_name()))
}

fn entity<'a>(name: &str, value: &'a Value) -> Option<&'a EntityView> {
    let view = EntityView::from_value(value);
    if view.is_none() && !value.is_null() {
        warn!(function = name, argument = %value.type_name(), "argument is not a domain entity");
    }
    view
}

fn wrap(view: &EntityView, entity: Entity) -> Value {
    Value::object(EntityView::new(view.session().clone(), entity))
}

/// Underlying type of `value` if its kind satisfies `want`
fn kind_view(name: &str, value: &Value, want: fn(&TypeKind) -> bool) -> Value {
    let Some(view) = entity(name, value) else {
        return Value::Null;
    };
    match view.session().under(view) {
        Some(node) if node.kind().is_some_and(want) => wrap(view, Entity::Type(node.id())),
        _ => Value::Null,
    }
}

fn named(value: &Value) -> Value {
    let Some(view) = entity("named", value) else {
        return Value::Null;
    };
    let session = view.session();
    match session.to_named(view) {
        Some(_) => match knife_core::AsType::type_id(view, session) {
            Some(id) => wrap(view, Entity::Type(id)),
            None => Value::Null,
        },
        None => Value::Null,
    }
}

fn under(value: &Value) -> Value {
    let Some(view) = entity("under", value) else {
        return Value::Null;
    };
    view.session()
        .under(view)
        .map_or(Value::Null, |node| wrap(view, Entity::Type(node.id())))
}

fn methods(value: &Value) -> Value {
    let Some(view) = entity("methods", value) else {
        return Value::Null;
    };
    Value::Map(Mapping::strings(
        view.session()
            .methods(view)
            .into_iter()
            .map(|(name, obj)| (name, wrap(view, Entity::Object(obj.id())))),
    ))
}

fn implements(x: &Value, iface: &Value) -> bool {
    match (entity("implements", x), entity("implements", iface)) {
        (Some(x), Some(iface)) => x.session().implements(x, iface),
        _ => false,
    }
}

fn identical(x: &Value, y: &Value) -> bool {
    match (entity("identical", x), entity("identical", y)) {
        (Some(x), Some(y)) => x.session().identical(x, y),
        _ => false,
    }
}

fn pos(value: &Value) -> Value {
    let position = entity("pos", value)
        .map(|view| view.session().position(view))
        .unwrap_or_default();
    Value::object(PositionView(position))
}

fn doc(value: &Value) -> Value {
    let text = entity("doc", value)
        .map(|view| view.session().doc(view))
        .unwrap_or_default();
    Value::string(text)
}

fn is_exported(item: &Value) -> Result<bool> {
    match item.member("Exported") {
        Some(Value::Bool(b)) => Ok(b),
        _ => bail!("exported: {} has no Exported flag", item.type_name()),
    }
}

/// Keep the elements of a sequence or mapping whose `Exported` flag is set
pub fn exported(list: &Value) -> Result<Value> {
    match list.direct() {
        Value::Seq(items) => {
            let mut kept = Vec::new();
            for item in items {
                if is_exported(item)? {
                    kept.push(item.clone());
                }
            }
            Ok(Value::Seq(kept))
        }
        Value::Map(mapping) => {
            let mut kept = Mapping::new(mapping.key_type());
            for (key, item) in mapping.iter() {
                if is_exported(item)? {
                    kept.insert(key.clone(), item.clone());
                }
            }
            Ok(Value::Map(kept))
        }
        other => bail!("exported: unexpected kind {}", other.type_name()),
    }
}

/// Non-empty `Name` members of the elements, one per line
pub fn names(list: &Value) -> String {
    let items: Vec<&Value> = match list.direct() {
        Value::Seq(items) => items.iter().collect(),
        Value::Map(mapping) => mapping.values().collect(),
        _ => return String::new(),
    };
    items
        .into_iter()
        .filter_map(|item| match item.member("Name") {
            Some(Value::String(name)) if !name.is_empty() => Some(name),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn len(value: &Value) -> Result<Value> {
    let n = value
        .len()
        .ok_or_else(|| anyhow!("len: invalid type {}", value.type_name()))?;
    Ok(Value::int(i64::try_from(n)?))
}

fn cap(value: &Value) -> Result<Value> {
    match value.direct() {
        Value::Seq(items) => Ok(Value::int(i64::try_from(items.len())?)),
        other => bail!("cap: invalid type {}", other.type_name()),
    }
}

fn last(value: &Value) -> Result<Value> {
    match value.direct() {
        Value::Seq(items) => items
            .last()
            .cloned()
            .ok_or_else(|| anyhow!("last: empty collection")),
        Value::String(s) => s
            .as_bytes()
            .last()
            .map(|b| Value::string(char::from(*b).to_string()))
            .ok_or_else(|| anyhow!("last: empty string")),
        other => bail!("last: invalid type {}", other.type_name()),
    }
}

/// Operands separated by spaces, followed by a newline
fn br(args: &[Value]) -> Value {
    let line = args
        .iter()
        .map(Value::to_string)
        .collect::<Vec<_>>()
        .join(" ");
    Value::string(format!("{}\n", line))
}

fn regexp(pattern: &str, text: &str) -> Result<bool> {
    let re = Regex::new(pattern).map_err(|e| anyhow!("regexp error: {}", e))?;
    Ok(re.is_match(text))
}

fn at(root: &Value, expr: &str) -> Result<Value> {
    knife_path::evaluate(expr, root).with_context(|| format!("at {:?}", expr))
}

macro_rules! unary {
    ($map:ident, $name:literal, $body:expr) => {
        $map.insert($name, |args: &[Value]| {
            arity($name, args, 1)?;
            Ok($body(&args[0]))
        });
    };
}

macro_rules! kind {
    ($map:ident, $name:literal, $pattern:pat) => {
        $map.insert($name, |args: &[Value]| {
            arity($name, args, 1)?;
            Ok(kind_view($name, &args[0], |k| matches!(k, $pattern)))
        });
    };
}

pub(crate) fn builtins(data: &TemplateData) -> FuncMap {
    let mut map = FuncMap::new();

    let d = data.clone();
    map.insert("pkg", move |args: &[Value]| {
        arity("pkg", args, 0)?;
        Ok(d.root())
    });

    kind!(map, "array", TypeKind::Array(_));
    kind!(map, "basic", TypeKind::Basic(_));
    kind!(map, "chan", TypeKind::Chan(_));
    kind!(map, "interface", TypeKind::Interface(_));
    kind!(map, "map", TypeKind::Map(_));
    kind!(map, "pointer", TypeKind::Pointer(_));
    kind!(map, "ptr", TypeKind::Pointer(_));
    kind!(map, "signature", TypeKind::Signature(_));
    kind!(map, "slice", TypeKind::Slice(_));
    kind!(map, "struct", TypeKind::Struct(_));
    unary!(map, "named", named);
    unary!(map, "under", under);
    unary!(map, "methods", methods);
    unary!(map, "pos", pos);
    unary!(map, "doc", doc);
    map.insert("names", |args: &[Value]| {
        arity("names", args, 1)?;
        Ok(Value::string(names(&args[0])))
    });

    map.insert("exported", |args: &[Value]| {
        arity("exported", args, 1)?;
        exported(&args[0])
    });
    map.insert("len", |args: &[Value]| {
        arity("len", args, 1)?;
        len(&args[0])
    });
    map.insert("cap", |args: &[Value]| {
        arity("cap", args, 1)?;
        cap(&args[0])
    });
    map.insert("last", |args: &[Value]| {
        arity("last", args, 1)?;
        last(&args[0])
    });
    map.insert("implements", |args: &[Value]| {
        arity("implements", args, 2)?;
        Ok(Value::Bool(implements(&args[0], &args[1])))
    });
    map.insert("identical", |args: &[Value]| {
        arity("identical", args, 2)?;
        Ok(Value::Bool(identical(&args[0], &args[1])))
    });
    map.insert("br", |args: &[Value]| Ok(br(args)));
    map.insert("regexp", |args: &[Value]| {
        arity("regexp", args, 2)?;
        let pattern = string_arg("regexp", &args[0])?;
        let text = string_arg("regexp", &args[1])?;
        Ok(Value::Bool(regexp(pattern, text)?))
    });
    map.insert("at", |args: &[Value]| {
        arity("at", args, 2)?;
        at(&args[0], string_arg("at", &args[1])?)
    });

    let d = data.clone();
    map.insert("objectof", move |args: &[Value]| {
        arity("objectof", args, 1)?;
        Ok(d.object_of(string_arg("objectof", &args[0])?))
    });
    let d = data.clone();
    map.insert("typeof", move |args: &[Value]| {
        arity("typeof", args, 1)?;
        Ok(d.type_of(string_arg("typeof", &args[0])?))
    });
    let d = data.clone();
    map.insert("data", move |args: &[Value]| {
        arity("data", args, 1)?;
        Ok(d.data(string_arg("data", &args[0])?))
    });

    map
}

#[cfg(test)]
mod tests {
    use super::*;
    use knife_path::Record;

    fn item(name: &str, exported: bool) -> Value {
        Value::from(
            Record::new("Func")
                .field("Name", name)
                .field("Exported", exported),
        )
    }

    #[test]
    fn test_exported_filters_sequences_and_mappings() {
        let list = Value::seq([item("Open", true), item("close", false)]);
        assert_eq!(exported(&list).unwrap(), Value::seq([item("Open", true)]));

        let map = Mapping::strings([("Open", item("Open", true)), ("close", item("close", false))]);
        let Value::Map(kept) = exported(&Value::Map(map)).unwrap() else {
            panic!("expected mapping");
        };
        assert_eq!(kept.len(), 1);
        assert!(kept.get_str("Open").is_some());

        assert!(exported(&Value::int(1)).is_err());
        assert!(exported(&Value::seq([Value::int(1)])).is_err());
    }

    #[test]
    fn test_names_skips_empty() {
        let list = Value::seq([item("A", true), item("", true), Value::int(3), item("B", false)]);
        assert_eq!(names(&list), "A\nB");
        assert_eq!(names(&Value::int(3)), "");
    }

    #[test]
    fn test_len_cap_last() {
        let seq = Value::seq([Value::int(1), Value::int(2)]);
        assert_eq!(len(&seq).unwrap(), Value::int(2));
        assert_eq!(len(&Value::string("héllo")).unwrap(), Value::int(6));
        assert!(len(&Value::int(1)).unwrap_err().to_string().contains("len: invalid type"));
        assert_eq!(cap(&seq).unwrap(), Value::int(2));
        assert!(cap(&Value::string("x")).is_err());
        assert_eq!(last(&seq).unwrap(), Value::int(2));
        assert_eq!(last(&Value::string("abc")).unwrap(), Value::string("c"));
        assert_eq!(
            last(&Value::seq([])).unwrap_err().to_string(),
            "last: empty collection"
        );
        assert_eq!(
            last(&Value::string("")).unwrap_err().to_string(),
            "last: empty string"
        );
    }

    #[test]
    fn test_br_and_regexp() {
        assert_eq!(
            br(&[Value::string("a"), Value::int(1)]),
            Value::string("a 1\n")
        );
        assert_eq!(br(&[]), Value::string("\n"));
        assert!(regexp("^New", "NewCircle").unwrap());
        assert!(!regexp("^New", "helper").unwrap());
        assert!(regexp("(", "x")
            .unwrap_err()
            .to_string()
            .starts_with("regexp error"));
    }

    #[test]
    fn test_non_entities_degrade() {
        assert_eq!(kind_view("struct", &Value::int(1), |_| true), Value::Null);
        assert_eq!(under(&Value::Null), Value::Null);
        assert!(!implements(&Value::Null, &Value::int(1)));
        assert_eq!(pos(&Value::Null).to_string(), "-");
    }
}
