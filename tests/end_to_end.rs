//! Scenario-level integration tests: small programs built straight from the
//! AST constructors, run end to end through `Checker::check_word`.

use semcore::ast::*;
use semcore::checker::{Checker, CheckerConfig};
use semcore::error::ErrorKind;
use semcore::meta::{Meta, MetaKind};
use semcore::scope::Scope;
use semcore::value::Value;
use std::cell::Cell;
use std::collections::HashMap;
use std::rc::Rc;

#[derive(Default)]
struct TestScope {
    names: HashMap<String, IdHandle>,
}

impl TestScope {
    fn new() -> Self {
        TestScope::default()
    }

    fn declare(&mut self, name: &str, meta: Meta) -> IdHandle {
        let id = Rc::new(Id::Var {
            name: name.to_string(),
            pos: Pos::new(0, 0),
            meta: std::cell::RefCell::new(meta),
            is_used: Cell::new(false),
        });
        self.names.insert(name.to_string(), id.clone());
        id
    }
}

impl Scope for TestScope {
    fn lookup_name(&self, _scope_frame: u64, _seq_no: usize, name: &str) -> Option<IdHandle> {
        self.names.get(name).cloned()
    }
    fn lookup_param(&self, func: &IdHandle, name: &str) -> Option<IdHandle> {
        func.params().iter().find(|p| p.name() == name).cloned()
    }
    fn lookup_field(&self, aggregate: &IdHandle, name: &str) -> Option<IdHandle> {
        aggregate.fields().iter().find(|f| f.name() == name).cloned()
    }
    fn is_contract(&self, id: &IdHandle) -> bool {
        id.is_contract()
    }
    fn is_struct(&self, id: &IdHandle) -> bool {
        id.is_struct()
    }
    fn is_func(&self, id: &IdHandle) -> bool {
        id.is_func()
    }
}

fn func_id(name: &str, returns: Meta) -> IdHandle {
    Rc::new(Id::Func {
        name: name.to_string(),
        pos: Pos::new(0, 0),
        is_used: Cell::new(false),
        params: vec![],
        returns,
    })
}

fn word_with_one_stmt(stmt: Stmt, returns: Meta) -> WordDef {
    let mut body = Blk::new(BlkKind::Func, Pos::new(0, 0));
    body.stmts.push(stmt);
    WordDef { id: func_id("w", returns), body }
}

#[test]
fn int32_assignment_of_two_untyped_literals_folds_to_a_value_node() {
    let mut scope = TestScope::new();
    scope.declare("x", Meta::of(MetaKind::Int32));

    let sum = exp_new_op(OpKind::Add, exp_new_lit_int(1, Pos::new(0, 10)), Some(exp_new_lit_int(2, Pos::new(0, 14))), Pos::new(0, 10));
    let stmt = stmt_new_assign(exp_new_id("x", Pos::new(0, 0)), sum, Pos::new(0, 0));
    let mut word = word_with_one_stmt(stmt, Meta::void());

    let mut checker = Checker::new(&scope, CheckerConfig::new());
    let errors = checker.check_word(&mut word);
    assert!(errors.is_empty(), "{errors:?}");

    let StmtKind::Assign { r, .. } = &word.body.stmts[0].kind else { panic!("expected assign") };
    match &r.kind {
        ExpKind::Val(Value::Int { magnitude, negative }) => {
            assert_eq!(*magnitude, 3);
            assert!(!negative);
        }
        other => panic!("expected a folded literal, got {other:?}"),
    }
}

#[test]
fn assigning_200_to_an_int8_overflows() {
    let mut scope = TestScope::new();
    scope.declare("x", Meta::of(MetaKind::Int8));

    let stmt = stmt_new_assign(exp_new_id("x", Pos::new(0, 0)), exp_new_lit_int(200, Pos::new(0, 8)), Pos::new(0, 0));
    let mut word = word_with_one_stmt(stmt, Meta::void());

    let mut checker = Checker::new(&scope, CheckerConfig::new());
    let errors = checker.check_word(&mut word);
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].kind, ErrorKind::NumericOverflow);
    assert_eq!(errors[0].pos, Pos::new(0, 8));
}

#[test]
fn map_subscript_assignment_checks_the_value_type_not_just_the_key() {
    let mut scope = TestScope::new();
    scope.declare("m", Meta::map(Meta::string(), Meta::string()));

    let subscript = exp_new_array(
        Some(exp_new_id("m", Pos::new(0, 0))),
        Some(exp_new_val(Value::Str("k".to_string()), Pos::new(0, 2))),
        Pos::new(0, 0),
    )
    .expect("both operands present");
    let stmt = stmt_new_assign(subscript, exp_new_lit_int(1, Pos::new(0, 10)), Pos::new(0, 0));
    let mut word = word_with_one_stmt(stmt, Meta::void());

    let mut checker = Checker::new(&scope, CheckerConfig::new());
    let errors = checker.check_word(&mut word);
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].kind, ErrorKind::MismatchedType);
    assert_eq!(errors[0].args, vec!["string".to_string(), "int64".to_string()]);
}

#[test]
fn returning_a_bool_from_an_int32_function_is_rejected() {
    let scope = TestScope::new();
    let cond = exp_new_val(Value::Bool(true), Pos::new(0, 7));
    let stmt = stmt_new_return(Some(cond), Pos::new(0, 0));
    let mut word = word_with_one_stmt(stmt, Meta::of(MetaKind::Int32));

    let mut checker = Checker::new(&scope, CheckerConfig::new());
    let errors = checker.check_word(&mut word);
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].kind, ErrorKind::MismatchedType);
    assert_eq!(errors[0].pos, Pos::new(0, 7));
}

#[test]
fn dividing_by_a_literal_zero_reports_the_divisor_position_without_folding() {
    let mut scope = TestScope::new();
    scope.declare("x", Meta::of(MetaKind::Int32));

    let div = exp_new_op(
        OpKind::Div,
        exp_new_lit_int(1, Pos::new(0, 8)),
        Some(exp_new_lit_int(0, Pos::new(0, 12))),
        Pos::new(0, 8),
    );
    let stmt = stmt_new_assign(exp_new_id("x", Pos::new(0, 0)), div, Pos::new(0, 0));
    let mut word = word_with_one_stmt(stmt, Meta::void());

    let mut checker = Checker::new(&scope, CheckerConfig::new());
    let errors = checker.check_word(&mut word);
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].kind, ErrorKind::DivideByZero);
    assert_eq!(errors[0].pos, Pos::new(0, 12));

    let StmtKind::Assign { r, .. } = &word.body.stmts[0].kind else { panic!("expected assign") };
    assert!(matches!(r.kind, ExpKind::Op { .. }), "a failed fold must leave the Op node in place");
}

#[test]
fn tuple_assignment_with_a_mismatched_element_count_is_rejected() {
    let mut scope = TestScope::new();
    scope.declare("a", Meta::of(MetaKind::Int32));
    scope.declare("b", Meta::of(MetaKind::Int32));

    let lhs = exp_new_tuple(vec![exp_new_id("a", Pos::new(0, 0)), exp_new_id("b", Pos::new(0, 0))], Pos::new(0, 0));
    let rhs = exp_new_tuple(
        vec![exp_new_lit_int(1, Pos::new(0, 10)), exp_new_lit_int(2, Pos::new(0, 12)), exp_new_lit_int(3, Pos::new(0, 14))],
        Pos::new(0, 10),
    );
    let stmt = stmt_new_assign(lhs, rhs, Pos::new(0, 0));
    let mut word = word_with_one_stmt(stmt, Meta::void());

    let mut checker = Checker::new(&scope, CheckerConfig::new());
    let errors = checker.check_word(&mut word);
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].kind, ErrorKind::MismatchedElemCnt);
    assert_eq!(errors[0].args, vec!["2".to_string(), "3".to_string()]);
}

#[test]
fn checking_continues_past_a_failed_sibling_statement() {
    let scope = TestScope::new();
    let mut body = Blk::new(BlkKind::Func, Pos::new(0, 0));
    body.stmts.push(stmt_new_exp(exp_new_id("missing", Pos::new(1, 0)), Pos::new(1, 0)));
    body.stmts.push(stmt_new_exp(exp_new_lit_int(1, Pos::new(2, 0)), Pos::new(2, 0)));

    let mut word = WordDef { id: func_id("w", Meta::void()), body };
    let mut checker = Checker::new(&scope, CheckerConfig::new());
    let errors = checker.check_word(&mut word);

    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].kind, ErrorKind::UndefinedId);
    let StmtKind::Exp(second) = &word.body.stmts[1].kind else { panic!("expected exp stmt") };
    assert_eq!(second.meta().kind(), MetaKind::Int64);
}
