use std::sync::Arc;

use knife::knife_path::Value;
use knife::{EntityView, FuncMap, Knife, KnifeConfig, TemplateData};
use knife_test_fixtures::{cyclic, shapes, ShapesFixture};
use pretty_assertions::assert_eq;
use serde_json::json;

struct Env {
    data: TemplateData,
    funcs: FuncMap,
}

impl Env {
    fn call(&self, name: &str, args: &[Value]) -> Value {
        self.funcs.call(name, args).unwrap()
    }

    fn at(&self, root: &Value, path: &str) -> Value {
        self.call("at", &[root.clone(), Value::string(path)])
    }

    fn type_of(&self, expr: &str) -> Value {
        self.call("typeof", &[Value::string(expr)])
    }

    fn string(&self, root: &Value, path: &str) -> String {
        self.at(root, path).to_string()
    }
}

fn env_with(config: KnifeConfig) -> (ShapesFixture, Env) {
    let fx = shapes();
    let knife = Knife::with_config(Arc::new(fx.graph.clone()), config);
    let data = knife.template_data(fx.shapes);
    let funcs = data.func_map();
    (fx, Env { data, funcs })
}

fn env() -> (ShapesFixture, Env) {
    env_with(KnifeConfig::default())
}

#[test]
fn test_all_primitives_registered() {
    let (_, env) = env();
    for name in [
        "pkg", "array", "basic", "chan", "interface", "map", "named", "pointer", "ptr",
        "signature", "slice", "struct", "methods", "implements", "identical", "under", "pos",
        "objectof", "typeof", "at", "exported", "names", "len", "cap", "last", "br", "data",
        "regexp", "doc",
    ] {
        assert!(env.funcs.contains(name), "missing {}", name);
    }
}

#[test]
fn test_package_root() {
    let (_, env) = env();
    let root = env.call("pkg", &[]);
    assert_eq!(root.to_string(), "example.com/shapes");
    assert_eq!(env.string(&root, "Name"), "shapes");
    assert_eq!(env.string(&root, "Imports[1].Path"), "example.com/app/vendor/github.com/acme/log");
    assert_eq!(env.call("len", &[env.at(&root, "Imports")]), Value::int(2));
    assert_eq!(env.string(&root, "FuncNames"), "[NewCircle helper]");
    assert_eq!(
        env.string(&root, r#"Types["Circle"].Type.String"#),
        "example.com/shapes.Circle"
    );
    assert_eq!(env.at(&root, r#"Consts["MaxSize"].Value"#), Value::int(1024));
    assert_eq!(env.at(&root, r#"Consts["Big"].Value"#), Value::uint(1u64 << 63));
    assert_eq!(env.string(&root, r#"Consts["Greeting"].Value"#), "hello");
    assert_eq!(env.at(&root, r#"Types["Missing"]"#), Value::Null);
}

#[test]
fn test_kind_views_unwrap_named_types() {
    let (_, env) = env();
    let circle = env.type_of("shapes.Circle");

    let st = env.call("struct", &[circle.clone()]);
    assert_eq!(st.to_string(), "struct{Radius float64}");
    assert_eq!(env.string(&st, "FieldNames"), "[Radius]");
    assert_eq!(env.call("interface", &[circle.clone()]), Value::Null);
    assert_eq!(env.call("map", &[circle.clone()]), Value::Null);

    let named = env.call("named", &[circle.clone()]);
    assert_eq!(named.to_string(), "example.com/shapes.Circle");
    assert_eq!(env.call("named", &[st.clone()]), Value::Null);
    assert_eq!(env.call("under", &[circle]).to_string(), "struct{Radius float64}");

    let shape = env.call("objectof", &[Value::string("shapes.Shape")]);
    let iface = env.call("interface", &[shape]);
    assert_eq!(env.string(&iface, "MethodNames"), "[Area Name]");
    assert_eq!(env.at(&iface, "Empty"), Value::Bool(false));

    let id = env.type_of("shapes.ID");
    assert_eq!(env.string(&env.call("basic", &[id]), "Name"), "int");

    let ptr = env.type_of("*shapes.Circle");
    for name in ["pointer", "ptr"] {
        let view = env.call(name, &[ptr.clone()]);
        assert_eq!(env.string(&view, "Elem"), "example.com/shapes.Circle");
    }

    let new_circle = env.call("objectof", &[Value::string("shapes.NewCircle")]);
    let sig = env.call("signature", &[new_circle]);
    assert_eq!(env.string(&sig, "Params[0].Name"), "r");
    assert_eq!(env.at(&sig, "Variadic"), Value::Bool(false));
}

#[test]
fn test_kind_members_on_every_type() {
    let (_, env) = env();
    let root = env.call("pkg", &[]);

    assert_eq!(
        env.string(&root, r#"Vars["Default"].Type.Struct.FieldNames"#),
        "[Radius]"
    );
    assert_eq!(
        env.string(&root, r#"Vars["Default"].Type.Underlying.String"#),
        "struct{Radius float64}"
    );
    assert_eq!(
        env.string(&root, r#"Vars["Default"].Type.Named.Object.Name"#),
        "Circle"
    );
    assert_eq!(env.at(&root, r#"Vars["Default"].Type.Map"#), Value::Null);
    assert_eq!(env.string(&root, r#"Vars["count"].Type.Underlying.Name"#), "int");
    assert_eq!(env.string(&root, r#"Vars["count"].Type.Basic.Name"#), "int");
    assert_eq!(env.at(&root, r#"Vars["count"].Type.Named"#), Value::Null);
    assert_eq!(
        env.string(&root, r#"Types["Shape"].Type.Interface.MethodNames"#),
        "[Area Name]"
    );
    assert_eq!(
        env.string(
            &root,
            r#"Funcs["NewCircle"].Type.Signature.Results[0].Type.Pointer.Elem.String"#
        ),
        "example.com/shapes.Circle"
    );

    let labeled = env.type_of("*shapes.Labeled");
    assert_eq!(env.string(&labeled, "Pointer.Elem.Struct.FieldNames"), "[Circle Label]");
    assert_eq!(env.at(&labeled, "Elem.Named.Struct.NumFields"), Value::from(2i64));
    assert_eq!(env.at(&labeled, "Named"), Value::Null);
}

#[test]
fn test_chan_and_slice_views() {
    let fx = cyclic();
    let knife = Knife::new(Arc::new(fx.graph));
    let data = knife.template_data(fx.pkg);
    let funcs = data.func_map();

    let a = data.type_of("cyc.A");
    let st = funcs.call("struct", &[a]).unwrap();
    let field_type = funcs
        .call("at", &[st, Value::string(r#"Fields["Events"].Type"#)])
        .unwrap();
    let ch = funcs.call("chan", &[field_type.clone()]).unwrap();
    let dir = funcs.call("at", &[ch.clone(), Value::string("Dir")]).unwrap();
    assert_eq!(dir, Value::string("RecvOnly"));

    let elem = funcs.call("at", &[ch, Value::string("Elem")]).unwrap();
    let slice = funcs.call("slice", &[elem]).unwrap();
    assert_eq!(slice.to_string(), "[]example.com/cyc.A");
    assert_eq!(funcs.call("array", &[field_type]).unwrap(), Value::Null);
}

#[test]
fn test_methods_implements_identical() {
    let (_, env) = env();
    let circle = env.type_of("shapes.Circle");
    let square = env.type_of("shapes.Square");
    let shape = env.type_of("shapes.Shape");

    let methods = env.call("methods", &[circle.clone()]);
    assert_eq!(
        env.call("names", &[methods.clone()]),
        Value::string("Area\nName\nScale")
    );
    let scale = methods.member("Scale").and_then(|m| m.member("Name"));
    assert_eq!(scale, Some(Value::string("Scale")));

    assert_eq!(
        env.call("implements", &[circle.clone(), shape.clone()]),
        Value::Bool(true)
    );
    assert_eq!(
        env.call("implements", &[env.type_of("shapes.ID"), shape]),
        Value::Bool(false)
    );
    assert_eq!(
        env.call("identical", &[circle.clone(), circle.clone()]),
        Value::Bool(true)
    );
    assert_eq!(env.call("identical", &[circle, square]), Value::Bool(false));
}

#[test]
fn test_positions() {
    let (_, env) = env();
    let node = env.call("objectof", &[Value::string("shapes.Node")]);
    let pos = env.call("pos", &[node.clone()]);
    assert_eq!(pos.to_string(), "shapes.go:14:6");
    assert_eq!(env.at(&pos, "Line"), Value::from(14i64));
    assert_eq!(env.string(&node, "Pos.Filename"), "shapes.go");

    let untracked = env.call("pos", &[env.type_of("shapes.Node")]);
    assert_eq!(env.at(&untracked, "IsValid"), Value::Bool(false));
}

#[test]
fn test_doc_comments() {
    let (_, env) = env();
    let doc = |expr: &str| {
        let object = env.call("objectof", &[Value::string(expr)]);
        env.call("doc", &[object])
    };
    assert_eq!(doc("shapes.NewCircle"), Value::string("NewCircle returns a circle of radius r."));
    assert_eq!(doc("shapes.Labeled"), Value::string("Labeled is a circle with a caption."));
    assert_eq!(doc("shapes.count"), Value::string("shapes built so far"));
    assert_eq!(doc("shapes.Default"), Value::string(""));
    assert_eq!(doc("io.Reader"), Value::string(""));
    assert_eq!(env.call("doc", &[Value::Null]), Value::string(""));

    let root = env.data.root();
    assert_eq!(
        env.string(&root, r#"Funcs["NewCircle"].Doc"#),
        "NewCircle returns a circle of radius r."
    );
    assert_eq!(env.string(&root, r#"Types["Circle"].Doc"#), "");
}

#[test]
fn test_lookup_functions() {
    let (_, env) = env();
    let reader = env.call("objectof", &[Value::string("io.Reader")]);
    assert_eq!(env.string(&reader, "Name"), "Reader");
    assert_eq!(env.string(&reader, "Package.Path"), "io");
    let logger = env.call("objectof", &[Value::string("github.com/acme/log.Logger")]);
    assert_eq!(env.string(&logger, "Exported"), "true");
    assert_eq!(
        env.call("objectof", &[Value::string("other.Circle")]),
        Value::Null
    );
    assert_eq!(env.type_of("*io.Reader").to_string(), "*io.Reader");
    assert_eq!(env.type_of("*shapes.Missing"), Value::Null);
    assert!(env.funcs.call("typeof", &[Value::int(1)]).is_err());
}

#[test]
fn test_exported_and_names() {
    let (_, env) = env();
    let root = env.data.root();
    let funcs = env.at(&root, "Funcs");
    let kept = env.call("exported", &[funcs]);
    assert_eq!(env.call("names", &[kept]), Value::string("NewCircle"));

    let vars = env.at(&root, "Vars");
    assert_eq!(env.call("names", &[vars]), Value::string("Default\ncount"));

    let err = env.funcs.call("exported", &[Value::int(3)]).unwrap_err();
    assert!(err.to_string().contains("unexpected kind"));
}

#[test]
fn test_exported_only_package_view() {
    let (_, env) = env_with(KnifeConfig {
        exported_only: true,
        ..KnifeConfig::default()
    });
    let root = env.call("pkg", &[]);
    assert_eq!(env.string(&root, "FuncNames"), "[NewCircle]");
    assert_eq!(env.string(&root, "VarNames"), "[Default]");
    assert_eq!(env.at(&root, r#"Funcs["helper"]"#), Value::Null);

    let view = EntityView::from_value(&root).unwrap();
    assert!(matches!(view.entity(), knife::Entity::Package(_)));
}

#[test]
fn test_collection_helpers() {
    let (_, env) = env();
    let seq = Value::seq([Value::int(1), Value::int(2), Value::int(3)]);
    assert_eq!(env.call("len", &[seq.clone()]), Value::int(3));
    assert_eq!(env.call("cap", &[seq.clone()]), Value::int(3));
    assert_eq!(env.call("last", &[seq]), Value::int(3));
    assert_eq!(env.call("last", &[Value::string("knife")]), Value::string("e"));
    assert_eq!(
        env.call("br", &[Value::string("x"), Value::Bool(true)]),
        Value::string("x true\n")
    );

    let err = env.funcs.call("len", &[Value::int(1)]).unwrap_err();
    assert!(err.to_string().starts_with("len: invalid type"));
    let err = env.funcs.call("len", &[]).unwrap_err();
    assert_eq!(err.to_string(), "len: expected 1 argument(s), got 0");
}

#[test]
fn test_data_and_regexp() {
    let mut config = KnifeConfig::default();
    config.extra.insert("owner".into(), json!("tools"));
    config.extra.insert("limits".into(), json!({"max": 3}));
    let (_, env) = env_with(config);

    assert_eq!(env.call("data", &[Value::string("owner")]), Value::string("tools"));
    let limits = env.call("data", &[Value::string("limits")]);
    assert_eq!(env.at(&limits, "max"), Value::from(3i64));
    assert_eq!(env.call("data", &[Value::string("nope")]), Value::Null);

    assert_eq!(
        env.call("regexp", &[Value::string("^New"), Value::string("NewCircle")]),
        Value::Bool(true)
    );
    let err = env
        .funcs
        .call("regexp", &[Value::string("("), Value::string("x")])
        .unwrap_err();
    assert!(err.to_string().starts_with("regexp error"));
}

#[test]
fn test_errors_carry_context() {
    let (_, env) = env();
    let root = env.data.root();

    let err = env
        .funcs
        .call("at", &[root.clone(), Value::string("Missing")])
        .unwrap_err();
    assert_eq!(err.to_string(), r#"at "Missing""#);
    assert!(err.downcast_ref::<knife::knife_path::PathError>().is_some());

    let err = env.funcs.call("nope", &[]).unwrap_err();
    assert_eq!(err.to_string(), r#"function "nope" not defined"#);

    // non-entity arguments degrade to null
    assert_eq!(env.call("struct", &[Value::int(1)]), Value::Null);
    assert_eq!(env.call("methods", &[Value::Null]), Value::Null);
}
