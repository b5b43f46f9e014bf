//! Test fixtures for knife
//!
//! Provides small, hand-built type graphs that mirror what a loader would
//! produce for a few representative Go packages, plus JSON documents for the
//! path evaluator.

use knife_graph::{
    BasicKind, ChanDir, ConstValue, FieldSpec, ObjectId, PackageId, Pos, ScopeId, TypeGraph,
    TypeId,
};
use serde_json::json;

/// Source text registered in the file set of [`shapes`]
pub const SHAPES_SOURCE: &str = r#"package shapes

import (
	"io"
	"github.com/acme/log"
)

const Pi = 3.14
const MaxSize int = 1024
const Greeting = "hello"
const Debug = false
const Big uint64 = 1 << 63

type Node struct {
	Value int `json:"value"`
	Next  *Node
}

type Shape interface {
	Area() float64
	Name() string
}

type Circle struct{ Radius float64 }

func (c Circle) Area() float64 { return 3 * c.Radius * c.Radius }
func (c Circle) Name() string  { return "circle" }
func (c *Circle) Scale(f float64) { c.Radius *= f }

type Square struct{ Side float64 }

func (s Square) Area() float64 { return s.Side * s.Side }
func (s *Square) Name() string { return "square" }
// Labeled is a circle with a caption.
type Labeled struct {
	Circle
	Label string
}

type ID int

func (id ID) String() string { return "" }

type Float = float64

var Default Circle
var count int // shapes built so far
// NewCircle returns a circle of radius r.
func NewCircle(r float64) *Circle {
	c := &Circle{Radius: r}
	return c
}

func helper() {}

func (n *Node) Append(v int) *Node { return n }
"#;

/// Import path of the vendored logging package
pub const VENDORED_LOG_PATH: &str = "example.com/app/vendor/github.com/acme/log";

/// The `shapes` package and everything it references
pub struct ShapesFixture {
    pub graph: TypeGraph,
    pub file: Pos,
    pub shapes: PackageId,
    pub io: PackageId,
    pub log: PackageId,

    pub node: TypeId,
    pub shape: TypeId,
    pub circle: TypeId,
    pub square: TypeId,
    pub labeled: TypeId,
    pub id: TypeId,
    pub reader: TypeId,
    pub logger: TypeId,

    pub new_circle: ObjectId,
    pub append: ObjectId,
    /// Body scope of `NewCircle`
    pub new_circle_scope: ScopeId,
    /// Local `c` inside `NewCircle`
    pub local_c: ObjectId,
}

impl ShapesFixture {
    /// Position of `line`:`column` in [`SHAPES_SOURCE`]
    pub fn pos(&self, line: u32, column: u32) -> Pos {
        self.graph.fset().pos(self.file, line, column)
    }
}

fn param(graph: &mut TypeGraph, pkg: Option<PackageId>, name: &str, ty: TypeId) -> ObjectId {
    graph.new_param(pkg, name, ty)
}

/// Build the `shapes` fixture.
///
/// `shapes` imports `io` (with `Reader`) and a vendored `log` package
/// (with `Logger` and `Printf`).
pub fn shapes() -> ShapesFixture {
    let mut graph = TypeGraph::new();
    let file = graph.fset_mut().add_file("shapes.go", SHAPES_SOURCE);
    let at = |graph: &TypeGraph, line: u32, column: u32| graph.fset().pos(file, line, column);

    let int = graph.basic(BasicKind::Int);
    let float64 = graph.basic(BasicKind::Float64);
    let string = graph.basic(BasicKind::String);
    let byte = graph.basic(BasicKind::Uint8);
    let error = graph.error_type();

    // package io
    let io = graph.new_package("io", "io");
    let (reader, _) = graph.new_named(io, "Reader", Pos::NONE).unwrap();
    let bytes = graph.slice(byte);
    let p = param(&mut graph, Some(io), "p", bytes);
    let n = param(&mut graph, Some(io), "n", int);
    let err = param(&mut graph, Some(io), "err", error);
    let read = graph.new_interface_method(Some(io), "Read", vec![p], vec![n, err]);
    let reader_iface = graph.interface_type(vec![read], vec![]);
    graph.set_underlying(reader, reader_iface).unwrap();

    // package log, vendored
    let log = graph.new_package("log", VENDORED_LOG_PATH);
    let (logger, _) = graph.new_named(log, "Logger", Pos::NONE).unwrap();
    let logger_struct = graph.struct_type(Some(log), vec![FieldSpec::new("prefix", string)]);
    graph.set_underlying(logger, logger_struct).unwrap();
    let any = graph
        .lookup(graph.universe(), "any")
        .map(|obj| graph.object(obj).ty)
        .unwrap();
    let anys = graph.slice(any);
    let format = param(&mut graph, Some(log), "format", string);
    let args = param(&mut graph, Some(log), "args", anys);
    let printf_sig = graph.signature(None, vec![format, args], vec![], true);
    graph.new_func(log, "Printf", printf_sig, Pos::NONE).unwrap();

    // package shapes
    let shapes = graph.new_package("shapes", "example.com/shapes");
    graph.add_import(shapes, io);
    graph.add_import(shapes, log);

    let untyped_float = graph.basic(BasicKind::UntypedFloat);
    let untyped_string = graph.basic(BasicKind::UntypedString);
    let untyped_bool = graph.basic(BasicKind::UntypedBool);
    let uint64 = graph.basic(BasicKind::Uint64);
    let pos = at(&graph, 8, 7);
    graph
        .new_const(shapes, "Pi", untyped_float, ConstValue::Float(3.14), pos)
        .unwrap();
    let pos = at(&graph, 9, 7);
    graph
        .new_const(shapes, "MaxSize", int, ConstValue::Int(1024), pos)
        .unwrap();
    let pos = at(&graph, 10, 7);
    graph
        .new_const(
            shapes,
            "Greeting",
            untyped_string,
            ConstValue::String("hello".into()),
            pos,
        )
        .unwrap();
    let pos = at(&graph, 11, 7);
    graph
        .new_const(shapes, "Debug", untyped_bool, ConstValue::Bool(false), pos)
        .unwrap();
    let pos = at(&graph, 12, 7);
    graph
        .new_const(shapes, "Big", uint64, ConstValue::Int(1i128 << 63), pos)
        .unwrap();

    // type Node struct { Value int `json:"value"`; Next *Node }
    let pos = at(&graph, 14, 6);
    let (node, _) = graph.new_named(shapes, "Node", pos).unwrap();
    let node_ptr = graph.pointer_to(node);
    let value_pos = at(&graph, 15, 2);
    let next_pos = at(&graph, 16, 2);
    let node_struct = graph.struct_type(
        Some(shapes),
        vec![
            FieldSpec::new("Value", int)
                .with_tag(r#"json:"value""#)
                .at(value_pos),
            FieldSpec::new("Next", node_ptr).at(next_pos),
        ],
    );
    graph.set_underlying(node, node_struct).unwrap();

    // type Shape interface { Area() float64; Name() string }
    let pos = at(&graph, 19, 6);
    let (shape, _) = graph.new_named(shapes, "Shape", pos).unwrap();
    let r = param(&mut graph, Some(shapes), "", float64);
    let area = graph.new_interface_method(Some(shapes), "Area", vec![], vec![r]);
    let r = param(&mut graph, Some(shapes), "", string);
    let name = graph.new_interface_method(Some(shapes), "Name", vec![], vec![r]);
    let shape_iface = graph.interface_type(vec![area, name], vec![]);
    graph.set_underlying(shape, shape_iface).unwrap();

    // type Circle struct{ Radius float64 }
    let pos = at(&graph, 24, 6);
    let (circle, _) = graph.new_named(shapes, "Circle", pos).unwrap();
    let circle_struct =
        graph.struct_type(Some(shapes), vec![FieldSpec::new("Radius", float64)]);
    graph.set_underlying(circle, circle_struct).unwrap();
    let r = param(&mut graph, Some(shapes), "", float64);
    let pos = at(&graph, 26, 17);
    graph
        .new_method(circle, "Area", false, vec![], vec![r], pos)
        .unwrap();
    let r = param(&mut graph, Some(shapes), "", string);
    let pos = at(&graph, 27, 17);
    graph
        .new_method(circle, "Name", false, vec![], vec![r], pos)
        .unwrap();
    let f = param(&mut graph, Some(shapes), "f", float64);
    let pos = at(&graph, 28, 18);
    graph
        .new_method(circle, "Scale", true, vec![f], vec![], pos)
        .unwrap();

    // type Square struct{ Side float64 }
    let pos = at(&graph, 30, 6);
    let (square, _) = graph.new_named(shapes, "Square", pos).unwrap();
    let square_struct = graph.struct_type(Some(shapes), vec![FieldSpec::new("Side", float64)]);
    graph.set_underlying(square, square_struct).unwrap();
    let r = param(&mut graph, Some(shapes), "", float64);
    let pos = at(&graph, 32, 17);
    graph
        .new_method(square, "Area", false, vec![], vec![r], pos)
        .unwrap();
    let r = param(&mut graph, Some(shapes), "", string);
    let pos = at(&graph, 33, 18);
    graph
        .new_method(square, "Name", true, vec![], vec![r], pos)
        .unwrap();

    // type Labeled struct { Circle; Label string }
    let pos = at(&graph, 35, 6);
    let (labeled, _) = graph.new_named(shapes, "Labeled", pos).unwrap();
    let labeled_struct = graph.struct_type(
        Some(shapes),
        vec![
            FieldSpec::new("Circle", circle).embedded(),
            FieldSpec::new("Label", string),
        ],
    );
    graph.set_underlying(labeled, labeled_struct).unwrap();

    // type ID int
    let pos = at(&graph, 40, 6);
    let (id, _) = graph.new_named(shapes, "ID", pos).unwrap();
    graph.set_underlying(id, int).unwrap();
    let r = param(&mut graph, Some(shapes), "", string);
    let pos = at(&graph, 42, 13);
    graph
        .new_method(id, "String", false, vec![], vec![r], pos)
        .unwrap();

    // type Float = float64
    let pos = at(&graph, 44, 6);
    graph.new_alias(shapes, "Float", float64, pos).unwrap();

    let comments = [
        ((34, 1), (34, 39), "Labeled is a circle with a caption.\n"),
        ((47, 15), (47, 37), "shapes built so far\n"),
        ((48, 1), (48, 43), "NewCircle returns a circle of radius r.\n"),
    ];
    for ((line, column), (end_line, end_column), text) in comments {
        let (pos, end) = (at(&graph, line, column), at(&graph, end_line, end_column));
        graph.fset_mut().add_comment(pos, end, text);
    }

    let pos = at(&graph, 46, 5);
    graph.new_var(shapes, "Default", circle, pos).unwrap();
    let pos = at(&graph, 47, 5);
    graph.new_var(shapes, "count", int, pos).unwrap();

    // func NewCircle(r float64) *Circle
    let circle_ptr = graph.pointer_to(circle);
    let r = param(&mut graph, Some(shapes), "r", float64);
    let res = param(&mut graph, Some(shapes), "", circle_ptr);
    let sig = graph.signature(None, vec![r], vec![res], false);
    let pos = at(&graph, 49, 6);
    let new_circle = graph.new_func(shapes, "NewCircle", sig, pos).unwrap();
    let package_scope = graph.package(shapes).scope;
    let (start, end) = (at(&graph, 49, 35), at(&graph, 52, 2));
    let new_circle_scope = graph.new_scope(Some(package_scope), start, end, "function NewCircle");
    graph.set_func_scope(new_circle, new_circle_scope).unwrap();
    let pos = at(&graph, 49, 16);
    graph
        .new_local(new_circle_scope, Some(shapes), "r", float64, pos)
        .unwrap();
    let pos = at(&graph, 50, 2);
    let local_c = graph
        .new_local(new_circle_scope, Some(shapes), "c", circle_ptr, pos)
        .unwrap();

    let sig = graph.signature(None, vec![], vec![], false);
    let pos = at(&graph, 54, 6);
    graph.new_func(shapes, "helper", sig, pos).unwrap();

    // func (n *Node) Append(v int) *Node
    let v = param(&mut graph, Some(shapes), "v", int);
    let res = param(&mut graph, Some(shapes), "", node_ptr);
    let pos = at(&graph, 56, 16);
    let append = graph
        .new_method(node, "Append", true, vec![v], vec![res], pos)
        .unwrap();

    ShapesFixture {
        graph,
        file,
        shapes,
        io,
        log,
        node,
        shape,
        circle,
        square,
        labeled,
        id,
        reader,
        logger,
        new_circle,
        append,
        new_circle_scope,
        local_c,
    }
}

/// Two packages whose structs point at each other and a channel-heavy API
pub struct CyclicFixture {
    pub graph: TypeGraph,
    pub pkg: PackageId,
    pub a: TypeId,
    pub b: TypeId,
}

/// `type A struct { B *B; Events <-chan []A }` and `type B struct { A *A }`
pub fn cyclic() -> CyclicFixture {
    let mut graph = TypeGraph::new();
    let pkg = graph.new_package("cyc", "example.com/cyc");
    let (a, _) = graph.new_named(pkg, "A", Pos::NONE).unwrap();
    let (b, _) = graph.new_named(pkg, "B", Pos::NONE).unwrap();
    let a_ptr = graph.pointer_to(a);
    let b_ptr = graph.pointer_to(b);
    let events = graph.slice(a);
    let events = graph.chan(ChanDir::Recv, events);
    let a_struct = graph.struct_type(
        Some(pkg),
        vec![FieldSpec::new("B", b_ptr), FieldSpec::new("Events", events)],
    );
    let b_struct = graph.struct_type(Some(pkg), vec![FieldSpec::new("A", a_ptr)]);
    graph.set_underlying(a, a_struct).unwrap();
    graph.set_underlying(b, b_struct).unwrap();
    CyclicFixture { graph, pkg, a, b }
}

/// A graph with `count` independent packages, each declaring a few types
pub fn many_packages(count: usize) -> TypeGraph {
    let mut graph = TypeGraph::new();
    let int = graph.basic(BasicKind::Int);
    let shared = graph.new_package("shared", "example.com/shared");
    let (base, _) = graph.new_named(shared, "Base", Pos::NONE).unwrap();
    let base_struct = graph.struct_type(Some(shared), vec![FieldSpec::new("ID", int)]);
    graph.set_underlying(base, base_struct).unwrap();

    for i in 0..count {
        let pkg = graph.new_package(format!("p{}", i), format!("example.com/p{}", i));
        graph.add_import(pkg, shared);
        let (t, _) = graph.new_named(pkg, "T", Pos::NONE).unwrap();
        let t_struct = graph.struct_type(
            Some(pkg),
            vec![
                FieldSpec::new("Base", base).embedded(),
                FieldSpec::new("Count", int),
            ],
        );
        graph.set_underlying(t, t_struct).unwrap();
        let base_ptr = graph.pointer_to(base);
        let r = graph.new_param(Some(pkg), "", base_ptr);
        graph
            .new_method(t, "Root", false, vec![], vec![r], Pos::NONE)
            .unwrap();
        graph
            .new_const(pkg, "N", int, ConstValue::Int(i as i128), Pos::NONE)
            .unwrap();
    }
    graph
}

/// Document used by the path evaluator tests
pub fn bar_document() -> serde_json::Value {
    json!({
        "Bar": { "N": [100, 200, 300] },
        "Name": "knife",
        "Tags": { "env": "prod", "team": "tools" },
        "Nested": [ { "Items": [ { "ID": 7 } ] } ],
        "Empty": []
    })
}
