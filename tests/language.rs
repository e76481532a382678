use rox::lox::Lox;

struct Outcome {
    output: String,
    had_error: bool,
    had_runtime_error: bool,
}

fn run(source: &str) -> Outcome {
    let mut sink: Vec<u8> = Vec::new();

    let (had_error, had_runtime_error) = {
        let mut lox = Lox::new(&mut sink);
        lox.run(source);
        (lox.had_error(), lox.had_runtime_error())
    };

    Outcome {
        output: String::from_utf8(sink).expect("interpreter output is UTF-8"),
        had_error,
        had_runtime_error,
    }
}

fn assert_output(source: &str, expected: &str) {
    let outcome = run(source);

    assert!(!outcome.had_error, "compile error for: {}", source);
    assert!(!outcome.had_runtime_error, "runtime error for: {}", source);
    assert_eq!(outcome.output, expected, "wrong output for: {}", source);
}

fn assert_compile_error(source: &str) {
    let outcome = run(source);

    assert!(outcome.had_error, "expected compile error for: {}", source);
    assert!(
        outcome.output.is_empty(),
        "nothing may execute on compile error: {}",
        source
    );
}

fn assert_runtime_error(source: &str) {
    let outcome = run(source);

    assert!(!outcome.had_error, "unexpected compile error for: {}", source);
    assert!(
        outcome.had_runtime_error,
        "expected runtime error for: {}",
        source
    );
}

// ─────────────────────────────────────────────────────────────────────────
// Expressions and operators
// ─────────────────────────────────────────────────────────────────────────

#[test]
fn arithmetic_precedence() {
    assert_output("print 1 + 2 * 3;", "7\n");
    assert_output("print (1 + 2) * 3;", "9\n");
    assert_output("print 10 / 4;", "2.5\n");
    assert_output("print 1 - 2 - 3;", "-4\n");
}

#[test]
fn number_formatting() {
    assert_output("print 3.0;", "3\n");
    assert_output("print 2.5;", "2.5\n");
    assert_output("print -0;", "-0\n");
    assert_output("print 100;", "100\n");
}

#[test]
fn unary_operators() {
    assert_output("print -(-3);", "3\n");
    assert_output("print !true;", "false\n");
    assert_output("print !nil;", "true\n");
    assert_output("print !0;", "false\n");
}

#[test]
fn comparisons() {
    assert_output("print 1 < 2;", "true\n");
    assert_output("print 2 <= 2;", "true\n");
    assert_output("print 3 > 4;", "false\n");
    assert_output("print 4 >= 5;", "false\n");
}

#[test]
fn equality_has_no_implicit_conversion() {
    assert_output("print \"0\" == 0;", "false\n");
    assert_output("print nil == nil;", "true\n");
    assert_output("print nil == false;", "false\n");
    assert_output("print \"a\" == \"a\";", "true\n");
    assert_output("print 1 != 2;", "true\n");
}

#[test]
fn string_concatenation() {
    assert_output("print \"foo\" + \"bar\";", "foobar\n");
}

#[test]
fn plus_requires_matching_operand_types() {
    assert_runtime_error("print \"x\" + 1;");
    assert_runtime_error("print 1 + nil;");
}

#[test]
fn logical_operators_return_operands() {
    assert_output("print \"a\" or \"b\";", "a\n");
    assert_output("print nil or \"b\";", "b\n");
    assert_output("print false and 3;", "false\n");
    assert_output("print 1 and 2;", "2\n");
}

#[test]
fn logical_operators_short_circuit() {
    assert_output(
        "fun boom() { return nil.x; } print true or boom();",
        "true\n",
    );
    assert_output(
        "fun boom() { return nil.x; } print false and boom();",
        "false\n",
    );
}

#[test]
fn division_by_zero_is_a_runtime_error() {
    assert_runtime_error("print 1 / 0;");
}

#[test]
fn operands_must_be_numbers() {
    assert_runtime_error("print 1 - \"a\";");
    assert_runtime_error("print \"a\" < \"b\";");
    assert_runtime_error("print -\"a\";");
}

// ─────────────────────────────────────────────────────────────────────────
// Variables and scope
// ─────────────────────────────────────────────────────────────────────────

#[test]
fn block_shadowing() {
    assert_output("var a = 1; { var a = 2; print a; } print a;", "2\n1\n");
}

#[test]
fn assignment_is_an_expression() {
    assert_output("var a; print a = 7;", "7\n");
}

#[test]
fn uninitialized_variable_is_nil() {
    assert_output("var a; print a;", "nil\n");
}

#[test]
fn undefined_variable_read_is_a_runtime_error() {
    assert_runtime_error("print missing;");
}

#[test]
fn undefined_variable_assignment_is_a_runtime_error() {
    assert_runtime_error("missing = 1;");
}

#[test]
fn inner_block_writes_outer_variable() {
    assert_output("var a = 1; { a = a + 1; } print a;", "2\n");
}

#[test]
fn globals_persist_across_runs() {
    let mut sink: Vec<u8> = Vec::new();

    {
        let mut lox = Lox::new(&mut sink);
        lox.run("var x = 42;");
        lox.run("fun twice(n) { return n + n; }");
        lox.run("print twice(x);");
        assert!(!lox.had_error() && !lox.had_runtime_error());
    }

    assert_eq!(String::from_utf8(sink).unwrap(), "84\n");
}

#[test]
fn environment_restored_after_runtime_unwind() {
    let mut sink: Vec<u8> = Vec::new();

    {
        let mut lox = Lox::new(&mut sink);

        // The error unwinds out of two nested blocks; the interpreter must
        // land back in the globals frame.
        lox.run("var a = 1; { var a = 2; { var a = 3; nil.x; } }");
        assert!(lox.had_runtime_error());

        lox.run("print a;");
    }

    assert_eq!(String::from_utf8(sink).unwrap(), "1\n");
}

#[test]
fn repl_clears_compile_errors_per_line() {
    let mut sink: Vec<u8> = Vec::new();

    {
        let mut lox = Lox::new(&mut sink);

        lox.run("var = 1;");
        assert!(lox.had_error());

        lox.reset_error();
        lox.run("print 2;");
        assert!(!lox.had_error());
    }

    assert_eq!(String::from_utf8(sink).unwrap(), "2\n");
}

// ─────────────────────────────────────────────────────────────────────────
// Control flow
// ─────────────────────────────────────────────────────────────────────────

#[test]
fn if_else() {
    assert_output("if (2 + 2 == 4) print \"yes\"; else print \"no\";", "yes\n");
    assert_output("if (2 + 2 == 5) print \"yes\"; else print \"no\";", "no\n");
}

#[test]
fn truthiness_in_conditions() {
    assert_output("if (0) print \"truthy\";", "truthy\n");
    assert_output("if (\"\") print \"truthy\";", "truthy\n");
    assert_output("if (nil) print \"t\"; else print \"falsy\";", "falsy\n");
}

#[test]
fn while_loop() {
    assert_output(
        "var i = 0; while (i < 3) { print i; i = i + 1; }",
        "0\n1\n2\n",
    );
}

#[test]
fn for_loop_desugars_to_while() {
    assert_output("for (var i = 0; i < 3; i = i + 1) print i;", "0\n1\n2\n");
}

#[test]
fn for_loop_with_existing_variable() {
    assert_output("var i = 5; for (i = 0; i < 2; i = i + 1) print i;", "0\n1\n");
}

// ─────────────────────────────────────────────────────────────────────────
// Functions and closures
// ─────────────────────────────────────────────────────────────────────────

#[test]
fn function_declaration_and_call() {
    assert_output("fun add(a, b) { return a + b; } print add(1, 2);", "3\n");
}

#[test]
fn function_without_return_yields_nil() {
    assert_output("fun f() {} print f();", "nil\n");
}

#[test]
fn return_exits_early() {
    assert_output(
        "fun f() { return 1; print \"unreachable\"; } print f();",
        "1\n",
    );
}

#[test]
fn recursion() {
    assert_output(
        "fun fib(n) { if (n < 2) return n; return fib(n - 1) + fib(n - 2); } print fib(10);",
        "55\n",
    );
}

#[test]
fn mutual_recursion_through_globals() {
    assert_output(
        "fun isEven(n) { if (n == 0) return true; return isOdd(n - 1); } \
         fun isOdd(n) { if (n == 0) return false; return isEven(n - 1); } \
         print isEven(4); print isOdd(4);",
        "true\nfalse\n",
    );
}

#[test]
fn closure_captures_defining_environment() {
    assert_output(
        "fun make() { var i = 0; fun tick() { i = i + 1; return i; } return tick; } \
         var t = make(); print t(); print t(); print t();",
        "1\n2\n3\n",
    );
}

#[test]
fn sibling_closures_share_one_environment() {
    assert_output(
        "var inc_fn; var get_fn; \
         fun make() { var n = 0; fun inc() { n = n + 1; } fun get() { return n; } \
         inc_fn = inc; get_fn = get; } \
         make(); inc_fn(); inc_fn(); print get_fn();",
        "2\n",
    );
}

#[test]
fn closure_binds_lexically_not_dynamically() {
    // The classic resolver test: `a` inside f must stay bound to the global
    // even after a shadowing local appears in the block.
    assert_output(
        "var a = \"global\"; { fun f() { print a; } f(); var a = \"block\"; f(); }",
        "global\nglobal\n",
    );
}

#[test]
fn function_values_print_by_name() {
    assert_output("fun f() {} print f;", "<fn f>\n");
    assert_output("print clock;", "<native fn>\n");
}

#[test]
fn clock_returns_a_number() {
    assert_output("print clock() > 0;", "true\n");
}

#[test]
fn arity_is_enforced() {
    assert_runtime_error("fun f(a) {} f();");
    assert_runtime_error("fun f(a) {} f(1, 2);");
    assert_runtime_error("clock(1);");
}

#[test]
fn only_callables_can_be_called() {
    assert_runtime_error("var x = 1; x();");
    assert_runtime_error("\"str\"();");
}

// ─────────────────────────────────────────────────────────────────────────
// Classes
// ─────────────────────────────────────────────────────────────────────────

#[test]
fn class_and_instance_printing() {
    assert_output("class Cake {} print Cake;", "Cake\n");
    assert_output("class Cake {} print Cake();", "Cake instance\n");
}

#[test]
fn fields_and_this() {
    assert_output(
        "class A { greet() { print \"hi \" + this.name; } } \
         var a = A(); a.name = \"Lox\"; a.greet();",
        "hi Lox\n",
    );
}

#[test]
fn fields_shadow_methods() {
    assert_output(
        "class A { f() { return \"method\"; } } var a = A(); \
         fun g() { return \"field\"; } a.f = g; print a.f();",
        "field\n",
    );
}

#[test]
fn set_returns_the_assigned_value() {
    assert_output("class A {} var a = A(); print a.x = 3;", "3\n");
}

#[test]
fn initializer_runs_on_construction() {
    assert_output(
        "class Point { init(x, y) { this.x = x; this.y = y; } } \
         var p = Point(1, 2); print p.x + p.y;",
        "3\n",
    );
}

#[test]
fn initializer_returns_this_when_reinvoked() {
    assert_output(
        "class C { init() { this.n = 1; } } var c = C(); print c.init();",
        "C instance\n",
    );
}

#[test]
fn bare_return_in_initializer_is_allowed() {
    assert_output(
        "class C { init() { this.x = 1; return; this.x = 2; } } print C().x;",
        "1\n",
    );
}

#[test]
fn methods_bind_their_receiver() {
    assert_output(
        "class Person { sayName() { print this.name; } } \
         var jane = Person(); jane.name = \"Jane\"; \
         var method = jane.sayName; method();",
        "Jane\n",
    );
}

#[test]
fn class_arity_follows_init() {
    assert_runtime_error("class C { init(a) {} } C();");
    assert_runtime_error("class C {} C(1);");
}

#[test]
fn undefined_property_is_a_runtime_error() {
    assert_runtime_error("class A {} print A().missing;");
    assert_runtime_error("nil.x;");
}

#[test]
fn only_instances_have_properties() {
    assert_runtime_error("print 1.x;");
    assert_runtime_error("var s = \"str\"; s.len = 3;");
}

// ─────────────────────────────────────────────────────────────────────────
// Inheritance
// ─────────────────────────────────────────────────────────────────────────

#[test]
fn methods_are_inherited() {
    assert_output(
        "class A { f() { print \"A\"; } } class B < A {} B().f();",
        "A\n",
    );
}

#[test]
fn subclass_overrides_method() {
    assert_output(
        "class A { f() { print \"A\"; } } class B < A { f() { print \"B\"; } } B().f();",
        "B\n",
    );
}

#[test]
fn super_calls_the_superclass_method() {
    assert_output(
        "class A { f() { print \"A\"; } } \
         class B < A { f() { super.f(); print \"B\"; } } B().f();",
        "A\nB\n",
    );
}

#[test]
fn super_skips_the_receiver_class() {
    // `this` stays bound to the C instance, but `super` in B's method must
    // dispatch to A, not back to B.
    assert_output(
        "class A { f() { print \"A\"; } } \
         class B < A { f() { super.f(); } } \
         class C < B {} C().f();",
        "A\n",
    );
}

#[test]
fn inherited_initializer_runs() {
    assert_output(
        "class A { init() { this.tag = \"from A\"; } } class B < A {} print B().tag;",
        "from A\n",
    );
}

#[test]
fn superclass_must_be_a_class() {
    assert_runtime_error("var NotAClass = 1; class C < NotAClass {}");
}

#[test]
fn undefined_super_method_is_a_runtime_error() {
    assert_runtime_error(
        "class A {} class B < A { f() { super.missing(); } } B().f();",
    );
}

// ─────────────────────────────────────────────────────────────────────────
// Static (resolver) errors
// ─────────────────────────────────────────────────────────────────────────

#[test]
fn reading_a_variable_in_its_own_initializer() {
    assert_compile_error("{ var a = a; }");
}

#[test]
fn duplicate_declaration_in_one_scope() {
    assert_compile_error("{ var a = 1; var a = 2; }");
}

#[test]
fn top_level_return() {
    assert_compile_error("return 1;");
}

#[test]
fn returning_a_value_from_an_initializer() {
    assert_compile_error("class C { init() { return 1; } }");
}

#[test]
fn this_outside_a_class() {
    assert_compile_error("print this;");
    assert_compile_error("fun f() { return this; }");
}

#[test]
fn super_outside_a_class() {
    assert_compile_error("super.f();");
}

#[test]
fn super_without_a_superclass() {
    assert_compile_error("class C { f() { super.f(); } }");
}

#[test]
fn class_inheriting_from_itself() {
    assert_compile_error("class C < C {}");
}

#[test]
fn resolver_reports_multiple_errors_in_one_pass() {
    // Both violations sit in one program; neither may hide the other, and
    // nothing may execute.
    assert_compile_error("{ var a = a; } return 1;");
}

// ─────────────────────────────────────────────────────────────────────────
// Scan and parse errors
// ─────────────────────────────────────────────────────────────────────────

#[test]
fn unterminated_string_aborts_before_evaluation() {
    assert_compile_error("print \"fine\"; \"unterminated");
}

#[test]
fn unexpected_character_aborts_before_evaluation() {
    assert_compile_error("print 1; @");
}

#[test]
fn parse_error_aborts_before_evaluation() {
    assert_compile_error("var = 1; print 2;");
    assert_compile_error("print (1;");
}

#[test]
fn comments_are_invisible_to_the_parser() {
    assert_output(
        "// leading comment\nprint /* inline */ 1; // trailing",
        "1\n",
    );
}
