//! Integration tests for end-to-end compilation.
//!
//! These tests build ASTs directly, lower them through the public driver and
//! check both the printed LLVM IR and the behaviour of the JIT-compiled code.

use chovl::{
    ast::{
        ast::{AssignableNode, Item, Node},
        control_flow::{CondExprNode, CondStatementNode},
        expressions::{
            AddressOfNode, ArrayElementNode, BinaryExprNode, CastOpNode, DereferenceNode, F32Node,
            FunctionCallNode, I32Node, VariableNode,
        },
        lists::{AssignableListNode, NodeList},
        statements::{
            ASTRootNode, BlockNode, FunctionDeclNode, FunctionDefNode, Initializer,
            MultiAssignmentNode, ParameterListNode, ParameterNode, VariableAssignmentNode,
            VariableDeclarationNode,
        },
    },
    compiler::{
        compiler::{compile, compile_to_ir, Compiler},
        options::CompilerOptions,
    },
    operators::operators::Operator,
    types::types::{PrimitiveType, Type},
};
use inkwell::{
    context::Context,
    execution_engine::ExecutionEngine,
    targets::{InitializationConfig, Target},
    OptimizationLevel,
};
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref WHITESPACE: Regex = Regex::new(r"\s+").unwrap();
}

/// Strips all whitespace so printed IR can be compared independently of layout.
fn normalize(ir: &str) -> String {
    WHITESPACE.replace_all(ir, "").to_string()
}

fn assert_ir_contains(ir: &str, expected: &str) {
    assert!(
        normalize(ir).contains(&normalize(expected)),
        "expected `{}` in:\n{}",
        expected,
        ir
    );
}

type UnaryFn = unsafe extern "C" fn(i32) -> i32;
type NullaryFn = unsafe extern "C" fn() -> i32;

fn jit<'ctx>(compiler: &Compiler<'ctx>) -> ExecutionEngine<'ctx> {
    Target::initialize_native(&InitializationConfig::default()).unwrap();
    compiler
        .module
        .create_jit_execution_engine(OptimizationLevel::None)
        .unwrap()
}

fn i32_type() -> Type {
    Type::scalar(PrimitiveType::I32)
}

fn int(value: i32) -> Box<dyn Node> {
    Box::new(I32Node::new(value))
}

fn var(name: &str) -> Box<VariableNode> {
    Box::new(VariableNode::new(name))
}

fn element(array: &str, index: Box<dyn Node>) -> Box<ArrayElementNode> {
    Box::new(ArrayElementNode::new(var(array), index))
}

fn block(body: Vec<Box<dyn Node>>) -> Box<BlockNode> {
    Box::new(BlockNode::new(NodeList::from(body), false))
}

fn declare(name: &str, type_: Type, value: Option<Initializer>) -> Box<dyn Node> {
    Box::new(VariableDeclarationNode::new(type_, name, value))
}

fn assign(target: Box<dyn AssignableNode>, value: Box<dyn Node>) -> Box<dyn Node> {
    Box::new(VariableAssignmentNode::new(target, value))
}

fn function(name: &str, parameters: Vec<(&str, Type)>, return_type: Type, body: Box<dyn Node>) -> Box<dyn Item> {
    let parameters = parameters
        .into_iter()
        .map(|(name, type_)| ParameterNode::new(name, type_))
        .collect::<Vec<ParameterNode>>();
    Box::new(FunctionDefNode::new(
        FunctionDeclNode::new(name, ParameterListNode::from(parameters), return_type),
        body,
    ))
}

fn program(items: Vec<Box<dyn Item>>) -> ASTRootNode {
    ASTRootNode::from(items)
}

/// `f(a: i32) -> i32 { a + 1 }`
fn increment() -> Box<dyn Item> {
    function(
        "f",
        vec![("a", i32_type())],
        i32_type(),
        block(vec![Box::new(BinaryExprNode::new(Operator::Add, var("a"), int(1)))]),
    )
}

#[test]
fn test_increment_ir() {
    let ir = compile_to_ir(&program(vec![increment()]), CompilerOptions::default()).unwrap();

    assert_ir_contains(&ir, "define i32 @f(i32 %a)");
    assert_ir_contains(&ir, "entry:");
    assert_ir_contains(&ir, "%a1 = alloca i32");
    assert_ir_contains(&ir, "store i32 %a, i32* %a1");
    assert_ir_contains(&ir, "%a2 = load i32, i32* %a1");
    assert_ir_contains(&ir, "%addtmp = add i32 %a2, 1");
    assert_ir_contains(&ir, "ret i32 %addtmp");
    assert_eq!(normalize(&ir).matches("alloca").count(), 1);
}

#[test]
fn test_increment_runs() {
    let context = Context::create();
    let compiler = compile(&program(vec![increment()]), CompilerOptions::default(), &context).unwrap();
    let engine = jit(&compiler);

    unsafe {
        let f = engine.get_function::<UnaryFn>("f").unwrap();
        assert_eq!(f.call(41), 42);
        assert_eq!(f.call(-1), 0);
    }
}

/// `choose(c: i32) -> i32 { if (c) 1 else 2 }`
#[test]
fn test_conditional_expression() {
    let body = block(vec![Box::new(CondExprNode::new(var("c"), int(1), Some(int(2))))]);
    let root = program(vec![function("choose", vec![("c", i32_type())], i32_type(), body)]);

    let context = Context::create();
    let compiler = compile(&root, CompilerOptions::default(), &context).unwrap();
    let ir = compiler.emit_ir();

    assert_ir_contains(&ir, "then:");
    assert_ir_contains(&ir, "else:");
    assert_ir_contains(&ir, "ifcont:");
    assert_ir_contains(&ir, "%iftmp = phi i32 [ 1, %then ], [ 2, %else ]");

    let engine = jit(&compiler);
    unsafe {
        let choose = engine.get_function::<UnaryFn>("choose").unwrap();
        assert_eq!(choose.call(5), 1);
        assert_eq!(choose.call(-3), 1);
        assert_eq!(choose.call(0), 2);
    }
}

/// `maybe(c: i32) -> i32 { if (c) 5 }` merges a zero along the skipped edge.
#[test]
fn test_conditional_expression_without_else() {
    let body = block(vec![Box::new(CondExprNode::new(var("c"), int(5), None))]);
    let root = program(vec![function("maybe", vec![("c", i32_type())], i32_type(), body)]);

    let context = Context::create();
    let compiler = compile(&root, CompilerOptions::default(), &context).unwrap();
    let ir = compiler.emit_ir();
    assert!(!normalize(&ir).contains("else:"));

    let engine = jit(&compiler);
    unsafe {
        let maybe = engine.get_function::<UnaryFn>("maybe").unwrap();
        assert_eq!(maybe.call(1), 5);
        assert_eq!(maybe.call(0), 0);
    }
}

/// Nested conditionals merge through the inner merge block.
#[test]
fn test_nested_conditionals() {
    // sign(x) -> if (x < 0) -1 else if (x > 0) 1 else 0
    let inner = CondExprNode::new(
        Box::new(BinaryExprNode::new(Operator::GreaterThan, var("x"), int(0))),
        int(1),
        Some(int(0)),
    );
    let outer = CondExprNode::new(
        Box::new(BinaryExprNode::new(Operator::LessThan, var("x"), int(0))),
        int(-1),
        Some(Box::new(inner)),
    );
    let root = program(vec![function(
        "sign",
        vec![("x", i32_type())],
        i32_type(),
        block(vec![Box::new(outer)]),
    )]);

    let context = Context::create();
    let compiler = compile(&root, CompilerOptions::default(), &context).unwrap();
    let engine = jit(&compiler);

    unsafe {
        let sign = engine.get_function::<UnaryFn>("sign").unwrap();
        assert_eq!(sign.call(-7), -1);
        assert_eq!(sign.call(0), 0);
        assert_eq!(sign.call(12), 1);
    }
}

/// `clamp(x) { y: i32 = x; if (x > 10) y = 10; y }`
#[test]
fn test_conditional_statement() {
    let body = block(vec![
        declare("y", i32_type(), Some(Initializer::Value(var("x")))),
        Box::new(CondStatementNode::new(
            Box::new(BinaryExprNode::new(Operator::GreaterThan, var("x"), int(10))),
            assign(var("y"), int(10)),
            None,
        )),
        var("y"),
    ]);
    let root = program(vec![function("clamp", vec![("x", i32_type())], i32_type(), body)]);

    let context = Context::create();
    let compiler = compile(&root, CompilerOptions::default(), &context).unwrap();
    let engine = jit(&compiler);

    unsafe {
        let clamp = engine.get_function::<UnaryFn>("clamp").unwrap();
        assert_eq!(clamp.call(3), 3);
        assert_eq!(clamp.call(30), 10);
    }
}

/// `arr: i32[3] = [0]; arr[1] = 9; arr[i]`
#[test]
fn test_array_round_trip() {
    let body = block(vec![
        declare(
            "arr",
            Type::array(PrimitiveType::I32, 3).unwrap(),
            Some(Initializer::List(NodeList::from(vec![int(0)]))),
        ),
        assign(element("arr", int(1)), int(9)),
        element("arr", var("i")),
    ]);
    let root = program(vec![function("read", vec![("i", i32_type())], i32_type(), body)]);

    let context = Context::create();
    let compiler = compile(&root, CompilerOptions::default(), &context).unwrap();
    assert_ir_contains(&compiler.emit_ir(), "alloca [3 x i32]");

    let engine = jit(&compiler);
    unsafe {
        let read = engine.get_function::<UnaryFn>("read").unwrap();
        assert_eq!(read.call(1), 9);
        assert_eq!(read.call(0), 0);
        assert_eq!(read.call(2), 0);
    }
}

fn broadcast(name: &str, values: Vec<i32>) -> Box<dyn Item> {
    let values = values.into_iter().map(int).collect::<Vec<Box<dyn Node>>>();
    let body = block(vec![
        declare("arr", Type::array(PrimitiveType::I32, 5).unwrap(), None),
        Box::new(MultiAssignmentNode::new(var("arr"), Box::new(NodeList::from(values)))),
        element("arr", var("i")),
    ]);
    function(name, vec![("i", i32_type())], i32_type(), body)
}

#[test]
fn test_multi_assignment_broadcasts_last_value() {
    let root = program(vec![broadcast("single", vec![7]), broadcast("pair", vec![1, 2])]);

    let context = Context::create();
    let compiler = compile(&root, CompilerOptions::default(), &context).unwrap();
    let engine = jit(&compiler);

    unsafe {
        let single = engine.get_function::<UnaryFn>("single").unwrap();
        let pair = engine.get_function::<UnaryFn>("pair").unwrap();

        let singles = (0..5).map(|i| single.call(i)).collect::<Vec<i32>>();
        let pairs = (0..5).map(|i| pair.call(i)).collect::<Vec<i32>>();

        assert_eq!(singles, vec![7, 7, 7, 7, 7]);
        assert_eq!(pairs, vec![1, 2, 2, 2, 2]);
    }
}

/// `(a, b) = [b, a]` swaps through the loaded values.
#[test]
fn test_assignable_list() {
    let targets = AssignableListNode::from(vec![
        var("a") as Box<dyn AssignableNode>,
        var("b") as Box<dyn AssignableNode>,
    ]);
    let body = block(vec![
        declare("a", i32_type(), Some(Initializer::Value(int(3)))),
        declare("b", i32_type(), Some(Initializer::Value(int(4)))),
        Box::new(MultiAssignmentNode::new(
            Box::new(targets),
            Box::new(NodeList::from(vec![var("b") as Box<dyn Node>, var("a")])),
        )),
        Box::new(BinaryExprNode::new(
            Operator::Sub,
            Box::new(BinaryExprNode::new(Operator::Mul, var("a"), int(10))),
            var("b"),
        )),
    ]);
    let root = program(vec![function("swap", vec![], i32_type(), body)]);

    let context = Context::create();
    let compiler = compile(&root, CompilerOptions::default(), &context).unwrap();
    let engine = jit(&compiler);

    unsafe {
        let swap = engine.get_function::<NullaryFn>("swap").unwrap();
        assert_eq!(swap.call(), 37);
    }
}

/// Inner declarations shadow outer ones only until their block ends.
#[test]
fn test_shadowing() {
    // outer() { x: i32 = 1; { x: i32 = x + 5; x = x * 2 }; x }
    let outer_body = block(vec![
        declare("x", i32_type(), Some(Initializer::Value(int(1)))),
        block(vec![
            declare(
                "x",
                i32_type(),
                Some(Initializer::Value(Box::new(BinaryExprNode::new(
                    Operator::Add,
                    var("x"),
                    int(5),
                )))),
            ),
            assign(
                var("x"),
                Box::new(BinaryExprNode::new(Operator::Mul, var("x"), int(2))),
            ),
        ]),
        var("x"),
    ]);
    // inner() { x: i32 = 1; { x: i32 = x + 5; x = x * 2 } }
    let inner_body = block(vec![
        declare("x", i32_type(), Some(Initializer::Value(int(1)))),
        block(vec![
            declare(
                "x",
                i32_type(),
                Some(Initializer::Value(Box::new(BinaryExprNode::new(
                    Operator::Add,
                    var("x"),
                    int(5),
                )))),
            ),
            assign(
                var("x"),
                Box::new(BinaryExprNode::new(Operator::Mul, var("x"), int(2))),
            ),
        ]),
    ]);
    let root = program(vec![
        function("outer", vec![], i32_type(), outer_body),
        function("inner", vec![], i32_type(), inner_body),
    ]);

    let context = Context::create();
    let compiler = compile(&root, CompilerOptions::default(), &context).unwrap();
    let engine = jit(&compiler);

    unsafe {
        let outer = engine.get_function::<NullaryFn>("outer").unwrap();
        let inner = engine.get_function::<NullaryFn>("inner").unwrap();
        assert_eq!(outer.call(), 1);
        assert_eq!(inner.call(), 12);
    }
}

/// `x: i32 = 3; p: i32* = &x; *p = 8; x`
#[test]
fn test_pointers() {
    let body = block(vec![
        declare("x", i32_type(), Some(Initializer::Value(int(3)))),
        declare(
            "p",
            Type::pointer(PrimitiveType::I32).unwrap(),
            Some(Initializer::Value(Box::new(AddressOfNode::new(var("x"))))),
        ),
        assign(Box::new(DereferenceNode::new(var("p"))), int(8)),
        var("x"),
    ]);
    let root = program(vec![function("poke", vec![], i32_type(), body)]);

    let context = Context::create();
    let compiler = compile(&root, CompilerOptions::default(), &context).unwrap();
    assert_ir_contains(&compiler.emit_ir(), "alloca i32*");

    let engine = jit(&compiler);
    unsafe {
        let poke = engine.get_function::<NullaryFn>("poke").unwrap();
        assert_eq!(poke.call(), 8);
    }
}

/// Arguments are cast to the parameter types; the result to the return type.
#[test]
fn test_calls_cast_arguments_and_results() {
    let add = function(
        "add",
        vec![("a", i32_type()), ("b", i32_type())],
        i32_type(),
        block(vec![Box::new(BinaryExprNode::new(Operator::Add, var("a"), var("b")))]),
    );
    let half = function(
        "half",
        vec![("x", Type::scalar(PrimitiveType::F32))],
        i32_type(),
        block(vec![Box::new(BinaryExprNode::new(
            Operator::Div,
            var("x"),
            Box::new(F32Node::new(2.0)),
        ))]),
    );
    let main = function(
        "main",
        vec![],
        i32_type(),
        block(vec![Box::new(FunctionCallNode::new(
            "add",
            NodeList::from(vec![
                Box::new(FunctionCallNode::new("half", NodeList::from(vec![int(9)]))) as Box<dyn Node>,
                Box::new(F32Node::new(3.9)),
            ]),
        ))]),
    );
    let root = program(vec![add, half, main]);

    let context = Context::create();
    let compiler = compile(&root, CompilerOptions::default(), &context).unwrap();
    let ir = compiler.emit_ir();
    assert_ir_contains(&ir, "%calltmp = call i32 @half(float 9.000000e+00)");
    assert_ir_contains(&ir, "fptosi float");

    let engine = jit(&compiler);
    unsafe {
        // half(9.0) = 4.5 -> 4, 3.9 -> 3
        let main = engine.get_function::<NullaryFn>("main").unwrap();
        assert_eq!(main.call(), 7);
    }
}

/// A forward declaration lets earlier functions call later definitions.
#[test]
fn test_forward_declaration() {
    let declaration = Box::new(FunctionDeclNode::new(
        "twice",
        ParameterListNode::from(vec![ParameterNode::new("n", i32_type())]),
        i32_type(),
    ));
    let caller = function(
        "caller",
        vec![],
        i32_type(),
        block(vec![Box::new(FunctionCallNode::new(
            "twice",
            NodeList::from(vec![int(21)]),
        ))]),
    );
    let definition = function(
        "twice",
        vec![("n", i32_type())],
        i32_type(),
        block(vec![Box::new(BinaryExprNode::new(Operator::Mul, var("n"), int(2)))]),
    );
    let root = program(vec![declaration, caller, definition]);

    let context = Context::create();
    let compiler = compile(&root, CompilerOptions::default(), &context).unwrap();
    assert_eq!(compiler.lowered.len(), 3);

    let ir = normalize(&compiler.emit_ir());
    assert_eq!(ir.matches("definei32@twice").count(), 1, "{}", ir);
    assert!(!ir.contains("declarei32@twice"), "{}", ir);
    let caller_at = ir.find("definei32@caller").unwrap();
    let twice_at = ir.find("definei32@twice").unwrap();
    assert!(caller_at < twice_at, "{}", ir);

    let engine = jit(&compiler);
    unsafe {
        let caller = engine.get_function::<NullaryFn>("caller").unwrap();
        assert_eq!(caller.call(), 42);
    }
}

fn twice_declaration() -> Box<dyn Item> {
    Box::new(FunctionDeclNode::new(
        "twice",
        ParameterListNode::from(vec![ParameterNode::new("n", i32_type())]),
        i32_type(),
    ))
}

fn twice_definition() -> Box<dyn Item> {
    function(
        "twice",
        vec![("n", i32_type())],
        i32_type(),
        block(vec![Box::new(BinaryExprNode::new(Operator::Mul, var("n"), int(2)))]),
    )
}

/// A declaration repeated after the definition prints nothing of its own.
#[test]
fn test_declaration_after_definition_prints_once() {
    let root = program(vec![twice_declaration(), twice_definition(), twice_declaration()]);

    let ir = normalize(&compile_to_ir(&root, CompilerOptions::default()).unwrap());

    assert_eq!(ir.matches("@twice(").count(), 1, "{}", ir);
    assert_eq!(ir.matches("definei32@twice").count(), 1, "{}", ir);
}

#[test]
fn test_undefined_declaration_prints_once() {
    let root = program(vec![twice_declaration(), twice_declaration()]);

    let ir = normalize(&compile_to_ir(&root, CompilerOptions::default()).unwrap());

    assert_eq!(ir.matches("declarei32@twice").count(), 1, "{}", ir);
    assert!(!ir.contains("define"), "{}", ir);
}

#[test]
fn test_definition_must_match_declaration() {
    let declaration = Box::new(FunctionDeclNode::new(
        "twice",
        ParameterListNode::from(vec![
            ParameterNode::new("n", i32_type()),
            ParameterNode::new("m", i32_type()),
        ]),
        i32_type(),
    ));
    let root = program(vec![declaration, twice_definition()]);

    let context = Context::create();
    let error = compile(&root, CompilerOptions::default(), &context).err().unwrap();
    assert_eq!(error.get_error_name(), "SignatureMismatch");
}

#[test]
fn test_explicit_cast() {
    let body = block(vec![Box::new(CastOpNode::new(
        i32_type(),
        Box::new(BinaryExprNode::new(
            Operator::Mul,
            Box::new(CastOpNode::new(Type::scalar(PrimitiveType::F32), var("x"))),
            Box::new(F32Node::new(1.5)),
        )),
    ))]);
    let root = program(vec![function("scale", vec![("x", i32_type())], i32_type(), body)]);

    let context = Context::create();
    let compiler = compile(&root, CompilerOptions::default(), &context).unwrap();
    assert_ir_contains(&compiler.emit_ir(), "sitofp i32");

    let engine = jit(&compiler);
    unsafe {
        let scale = engine.get_function::<UnaryFn>("scale").unwrap();
        assert_eq!(scale.call(3), 4);
        assert_eq!(scale.call(-3), -4);
    }
}

#[test]
fn test_undeclared_name_produces_no_output() {
    let root = program(vec![function(
        "broken",
        vec![],
        i32_type(),
        block(vec![var("missing") as Box<dyn Node>]),
    )]);

    let error = compile_to_ir(&root, CompilerOptions::default()).unwrap_err();
    assert_eq!(error.get_error_name(), "SymbolNotDeclared");
}

#[test]
fn test_failure_leaves_scopes_balanced() {
    let root = program(vec![function(
        "broken",
        vec![("a", i32_type())],
        i32_type(),
        block(vec![block(vec![Box::new(BinaryExprNode::new(
            Operator::Add,
            var("a"),
            Box::new(F32Node::new(1.0)),
        ))])]),
    )]);

    let context = Context::create();
    let mut compiler = Compiler::new(&context, CompilerOptions::default());

    let error = compiler.lower_root(&root).unwrap_err();
    assert_eq!(error.get_error_name(), "OperandTypeMismatch");
    assert_eq!(compiler.symbol_table.depth(), 0);
    assert!(compiler.lowered.is_empty());
}

#[test]
fn test_functions_print_in_source_order() {
    let first = function("first", vec![], i32_type(), int(1));
    let second = function("second", vec![], i32_type(), int(2));

    let ir = compile_to_ir(&program(vec![first, second]), CompilerOptions::default()).unwrap();
    let first_at = ir.find("@first").unwrap();
    let second_at = ir.find("@second").unwrap();

    assert!(first_at < second_at);
}

#[test]
fn test_native_target_option() {
    let options = CompilerOptions {
        native_target: true,
        ..CompilerOptions::default()
    }
    .with_module_name("native");

    let context = Context::create();
    let compiler = compile(&program(vec![increment()]), options, &context).unwrap();

    assert!(!compiler.module.get_triple().as_str().to_bytes().is_empty());
}
