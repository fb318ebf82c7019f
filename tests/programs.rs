use pretty_assertions::assert_eq;
use sapling::{parse, run_with_output, Error, ErrorKind, ParseError, RuntimeError};

fn run(source: &str) -> (String, Result<(), Error>) {
    let mut out = Vec::new();
    let result = run_with_output(source, &mut out);
    (String::from_utf8(out).expect("output is utf-8"), result)
}

fn output(source: &str) -> String {
    let (out, result) = run(source);
    result.expect("program failed");
    out
}

fn runtime_error(source: &str) -> RuntimeError {
    match run(source).1 {
        Err(Error::Runtime(e)) => e,
        other => panic!("expected runtime error, got {:?}", other),
    }
}

#[test]
fn sum_then_print() {
    assert_eq!(output("x = 3 + 4; print x;"), "7\n");
}

#[test]
fn if_with_true_condition() {
    assert_eq!(output(r#"if 1 < 2 then print "yes";"#), "yes\n");
}

#[test]
fn undefined_variable_is_fatal() {
    let err = runtime_error("print y;");
    assert_eq!(err.line, 1);
    assert_eq!(err.kind, ErrorKind::UndefinedVar("y".to_string()));
    assert_eq!(
        err.to_string(),
        "1: RUNTIME ERROR Unable to access undefined variable y"
    );
}

#[test]
fn literals_print_in_source_order() {
    let source = r#"
        a = 12;
        b = "hello, world";
        c = false;
        print a;
        print b;
        print c;
        print true;
        print -5;
    "#;
    assert_eq!(output(source), "12\nhello, world\nfalse\ntrue\n-5\n");
}

#[test]
fn reassignment_changes_type() {
    assert_eq!(output(r#"x = 1; x = "a"; print x;"#), "a\n");
    assert_eq!(output("x = \"a\"; x = x == \"a\"; print x;"), "true\n");
}

#[test]
fn read_before_assignment_cites_read_line() {
    let source = "x = 1;\nprint x;\nprint z + x;\nz = 2;\n";
    let (out, result) = run(source);
    assert_eq!(out, "1\n");
    match result {
        Err(Error::Runtime(e)) => assert_eq!(e.line, 3),
        other => panic!("expected runtime error, got {:?}", other),
    }
}

#[test]
fn if_condition_must_be_boolean() {
    let err = runtime_error("x = 1;\nif x then print x;");
    assert_eq!(err, RuntimeError::new(2, ErrorKind::InvalidCondition));
    assert_eq!(err.to_string(), "2: RUNTIME ERROR Invalid IF and THEN expression");
}

#[test]
fn false_if_has_no_side_effects() {
    let source = r#"
        x = 1;
        if x > 5 then x = 100;
        if false then print "never";
        print x;
    "#;
    assert_eq!(output(source), "1\n");
}

#[test]
fn nested_if() {
    assert_eq!(
        output("a = 3; if a > 1 then if a < 5 then print \"middle\";"),
        "middle\n"
    );
}

#[test]
fn and_evaluates_right_operand_even_when_left_is_false() {
    let err = runtime_error("ok = false;\nif ok && missing then print 1;");
    assert_eq!(err.kind, ErrorKind::UndefinedVar("missing".to_string()));
    assert_eq!(err.line, 2);
}

#[test]
fn or_evaluates_right_operand_even_when_left_is_true() {
    let err = runtime_error("if true || missing then print 1;");
    assert_eq!(err.kind, ErrorKind::UndefinedVar("missing".to_string()));
}

#[test]
fn both_sides_of_logic_may_assign() {
    let source = "r = (a = false) && (b = true); print a; print b; print r;";
    assert_eq!(output(source), "false\ntrue\nfalse\n");
}

#[test]
fn logic_operands_must_be_boolean() {
    assert_eq!(runtime_error("print 1 && true;").kind, ErrorKind::InvalidAnd);
    assert_eq!(runtime_error("print true || 0;").kind, ErrorKind::InvalidOr);
    assert_eq!(
        runtime_error("print 1 || 0;").to_string(),
        "1: RUNTIME ERROR Cannot do OR Logic"
    );
}

#[test]
fn assignment_needs_identifier_target() {
    let err = runtime_error("x = 1;\n(x) + 1 = 2;");
    assert_eq!(err, RuntimeError::new(2, ErrorKind::InvalidAssignment));
}

#[test]
fn chained_assignment() {
    assert_eq!(output("a = b = 4; print a + b;"), "8\n");
}

#[test]
fn arithmetic_and_strings() {
    let source = r#"
        print 2 + 3 * 4;
        print (2 + 3) * 4;
        print 7 / 2;
        print 10 - 2 - 3;
        print "ab" + "cd";
        print "ab" * 3;
        print 2 * "xy";
    "#;
    assert_eq!(output(source), "14\n20\n3\n5\nabcd\nababab\nxyxy\n");
}

#[test]
fn comparisons() {
    let source = r#"
        print 1 == 1;
        print 1 != 1;
        print "a" < "b";
        print 3 >= 4;
        print true == false;
    "#;
    assert_eq!(output(source), "true\nfalse\ntrue\nfalse\nfalse\n");
}

#[test]
fn type_mismatch_is_runtime_error() {
    let err = runtime_error("x = 1;\n\nprint x + \"s\";");
    assert_eq!(err.line, 3);
    assert_eq!(
        err.to_string(),
        "3: RUNTIME ERROR Type mismatch on operands of +: integer and string"
    );
}

#[test]
fn divide_by_zero() {
    assert_eq!(
        runtime_error("print 1 / 0;").to_string(),
        "1: RUNTIME ERROR Divide by zero"
    );
}

#[test]
fn output_before_error_is_kept() {
    let (out, result) = run("print 1; print 2; print 1 < \"a\"; print 3;");
    assert_eq!(out, "1\n2\n");
    assert!(matches!(result, Err(Error::Runtime(_))));
}

#[test]
fn parse_error_prevents_evaluation() {
    let (out, result) = run("print 1;\nprint 2");
    assert_eq!(out, "");
    assert!(matches!(
        result,
        Err(Error::Parse(ParseError::UnexpectedEof { line: 2, .. }))
    ));
}

#[test]
fn comments_are_ignored() {
    assert_eq!(output("# header\nx = 1; # trailing\nprint x;"), "1\n");
}

#[test]
fn tree_queries_do_not_evaluate() {
    let program = parse(r#"print "s"; print undefinedName; x = x + "t";"#).unwrap();
    assert_eq!(program.leaf_count(), 5);
    assert_eq!(program.ident_count(), 3);
    assert_eq!(program.string_count(), 2);
    let vars = program.vars();
    assert_eq!(vars.get("x"), Some(&2));
    assert_eq!(vars.get("undefinedName"), Some(&1));
}

#[test]
fn long_programs_run() {
    let mut source = String::from("n = 0;\n");
    for _ in 0..20_000 {
        source.push_str("n = n + 1;\n");
    }
    source.push_str("print n;\n");
    assert_eq!(output(&source), "20000\n");
}

#[test]
fn long_operator_chains_run() {
    let source = format!("print 1{};", " + 1".repeat(199_999));
    assert_eq!(output(&source), "200000\n");
}

#[test]
fn oversized_string_repeat_is_runtime_error() {
    let (out, result) = run("print \"ok\";\nprint \"ab\" * 9223372036854775807;");
    assert_eq!(out, "ok\n");
    match result {
        Err(Error::Runtime(e)) => assert_eq!(
            e.to_string(),
            "2: RUNTIME ERROR String repetition too large: 9223372036854775807 times"
        ),
        other => panic!("expected runtime error, got {:?}", other),
    }
}

#[test]
fn deep_nesting_is_parse_error() {
    let source = format!("print {}1{};", "(".repeat(5000), ")".repeat(5000));
    let (out, result) = run(&source);
    assert_eq!(out, "");
    match result {
        Err(Error::Parse(e)) => assert_eq!(e.to_string(), "1: Expression too deeply nested"),
        other => panic!("expected parse error, got {:?}", other),
    }
}
