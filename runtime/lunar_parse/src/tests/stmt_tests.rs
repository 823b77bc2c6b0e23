use lunar_ir::{ExprKind, StmtKind};
use pretty_assertions::assert_eq;

use super::{parse_err, parse_ok, single, var};

#[test]
fn test_local_and_assignment() {
    let block = parse_ok("local a, b = 1\na, b.c = b, a");
    assert_eq!(block.stmts.len(), 2);
    match &block.stmts[0].kind {
        StmtKind::Local { names, values } => {
            assert_eq!(names.len(), 2);
            assert_eq!(values.len(), 1);
        }
        other => panic!("unexpected {other:?}"),
    }
    match &block.stmts[1].kind {
        StmtKind::Assign { targets, values } => {
            assert_eq!(var(&targets[0]), "a");
            assert!(matches!(targets[1].kind, ExprKind::Index { .. }));
            assert_eq!(values.len(), 2);
        }
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(block.stmts[1].span.line, 2);
}

#[test]
fn test_if_chain() {
    let stmt = single("if a then x() elseif b then y() elseif c then else z() end");
    let StmtKind::If {
        branches,
        else_block,
    } = stmt.kind
    else {
        panic!("not an if");
    };
    assert_eq!(branches.len(), 3);
    assert!(branches[2].1.stmts.is_empty());
    assert_eq!(else_block.map(|b| b.stmts.len()), Some(1));
}

#[test]
fn test_numeric_for_with_step() {
    let stmt = single("for i = 10, 1, -1 do end");
    let StmtKind::NumericFor { var, step, .. } = stmt.kind else {
        panic!("not a numeric for");
    };
    assert_eq!(&*var, "i");
    assert!(step.is_some());
}

#[test]
fn test_generic_for() {
    let stmt = single("for k, v in pairs(t) do print(k, v) end");
    let StmtKind::GenericFor { names, exprs, body } = stmt.kind else {
        panic!("not a generic for");
    };
    assert_eq!(names.len(), 2);
    assert_eq!(exprs.len(), 1);
    assert_eq!(body.stmts.len(), 1);
}

#[test]
fn test_function_declaration_desugars() {
    let stmt = single("function a.b:c(x) return self end");
    let StmtKind::Assign { targets, values } = stmt.kind else {
        panic!("not an assignment");
    };
    assert!(matches!(targets[0].kind, ExprKind::Index { .. }));
    let ExprKind::Function(def) = &values[0].kind else {
        panic!("not a function");
    };
    let params: Vec<&str> = def.params.iter().map(AsRef::as_ref).collect();
    assert_eq!(params, vec!["self", "x"]);
    assert_eq!(def.name.as_deref(), Some("a.b:c"));
}

#[test]
fn test_local_function() {
    let stmt = single("local function fact(n) if n <= 1 then return 1 end return n * fact(n - 1) end");
    assert!(matches!(stmt.kind, StmtKind::LocalFunction { .. }));
}

#[test]
fn test_repeat_until() {
    let stmt = single("repeat local x = 1 until x == 1");
    assert!(matches!(stmt.kind, StmtKind::Repeat { .. }));
}

#[test]
fn test_semicolons_and_do_block() {
    let block = parse_ok(";;do local x = 2; end;");
    assert_eq!(block.stmts.len(), 1);
    assert!(matches!(block.stmts[0].kind, StmtKind::Do(_)));
}

#[test]
fn test_goto_parses_as_unsupported() {
    let block = parse_ok("::top:: goto top");
    assert_eq!(block.stmts.len(), 2);
    assert_eq!(block.stmts[0].kind, StmtKind::Unsupported("label"));
    assert_eq!(block.stmts[1].kind, StmtKind::Unsupported("goto"));
}

#[test]
fn test_return_must_end_block() {
    let err = parse_err("return 1 x = 2");
    assert_eq!(err.message, "'<eof>' expected near 'x'");
}

#[test]
fn test_break_outside_loop() {
    let err = parse_err("break");
    assert_eq!(err.message, "no loop to break");
    parse_ok("while true do break end");
    parse_ok("for i = 1, 2 do if i then break end end");
}

#[test]
fn test_break_does_not_cross_function_boundary() {
    let err = parse_err("while true do local f = function() break end end");
    assert_eq!(err.message, "no loop to break");
}

#[test]
fn test_missing_end_reports_opener() {
    let err = parse_err("function f()\n  return 1\n");
    assert_eq!(err.line, 3);
    assert!(err.message.contains("to close 'function' at line 1"), "{}", err.message);
}

#[test]
fn test_expression_statement_must_be_call() {
    let err = parse_err("x");
    assert!(err.message.starts_with("syntax error"), "{}", err.message);
}

#[test]
fn test_lex_errors_surface_as_parse_errors() {
    let err = parse_err("x = 'unterminated");
    assert_eq!(err.line, 1);
}
