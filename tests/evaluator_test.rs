use dscript::{
    interpreter::{BufferedContext, Evaluator, Process, ProcessConfig},
    lexer::Span,
    script::{
        expression::{Binary, BinaryOperator, Constant, LogicalOperator, Member, Name, ShortCircuit},
        Expression, ExpressionRef, Script,
    },
    value::{
        error::{RuntimeError, RuntimeErrorKind},
        Namespace, Value,
    },
};
use pretty_assertions::assert_eq;
use std::{cell::RefCell, rc::Rc};

/// Records the record scope it was evaluated in.
#[derive(Debug)]
struct ScopeRecorder {
    seen: Rc<RefCell<Vec<Option<Namespace>>>>,
}

impl Expression for ScopeRecorder {
    fn evaluate(
        &self,
        evaluator: &mut Evaluator,
        _process: &mut Process,
    ) -> Result<Option<Value>, RuntimeError> {
        self.seen.borrow_mut().push(evaluator.names().cloned());
        Ok(Some(Value::None))
    }
}

/// Produces no value and schedules nothing.
#[derive(Debug)]
struct Silent;

impl Expression for Silent {
    fn evaluate(
        &self,
        _evaluator: &mut Evaluator,
        _process: &mut Process,
    ) -> Result<Option<Value>, RuntimeError> {
        Ok(None)
    }
}

fn constant(script: &mut Script, value: impl Into<Value>) -> ExpressionRef {
    script.push_expression(Constant {
        value: value.into(),
        span: Span::default(),
    })
}

fn name(script: &mut Script, name: &str) -> ExpressionRef {
    script.push_expression(Name {
        name: name.into(),
        span: Span::default(),
    })
}

fn binary(
    script: &mut Script,
    operator: BinaryOperator,
    lhs: ExpressionRef,
    rhs: ExpressionRef,
) -> ExpressionRef {
    script.push_expression(Binary {
        operator,
        lhs,
        rhs,
        span: Span::default(),
    })
}

fn process() -> Process {
    Process::new(BufferedContext::new(), ProcessConfig::default())
}

#[test]
fn evaluates_in_post_order() -> Result<(), RuntimeError> {
    let mut script = Script::new();
    let two = constant(&mut script, 2.0);
    let three = constant(&mut script, 3.0);
    let four = constant(&mut script, 4.0);
    let product = binary(&mut script, BinaryOperator::Multiply, three, four);
    let sum = binary(&mut script, BinaryOperator::Add, two, product);
    let difference = binary(&mut script, BinaryOperator::Subtract, sum, two);

    let mut process = process();
    let mut evaluator = Evaluator::new(Rc::new(script), vec![process.globals().clone()]);

    let value = evaluator.evaluate(sum, &mut process)?;
    assert_eq!(value.to_string(), "14");
    assert!(!evaluator.has_result());
    assert_eq!(evaluator.pending(), 0);
    assert!(evaluator.names().is_none());
    assert_eq!(evaluator.current(), None);

    let value = evaluator.evaluate(difference, &mut process)?;
    assert_eq!(value.to_string(), "12");
    Ok(())
}

#[test]
fn member_expressions_resolve_in_the_record_scope() -> Result<(), RuntimeError> {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let mut script = Script::new();
    let recorder = script.push_expression(ScopeRecorder {
        seen: Rc::clone(&seen),
    });
    let record = name(&mut script, "r");
    let member = script.push_expression(Member {
        object: record,
        member: recorder,
        span: Span::default(),
    });
    let both = binary(&mut script, BinaryOperator::Equal, member, recorder);

    let mut process = process();
    let ns = Namespace::new();
    process.globals().set("r", Value::Record(ns.clone()));
    let mut evaluator = Evaluator::new(Rc::new(script), vec![process.globals().clone()]);

    let value = evaluator.evaluate(both, &mut process)?;
    assert!(value.is_truthy());
    {
        let seen = seen.borrow();
        assert_eq!(seen.len(), 2);
        assert!(seen[0].as_ref().is_some_and(|scope| scope.ptr_eq(&ns)));
        assert!(seen[1].is_none());
    }
    assert!(evaluator.names().is_none());

    seen.borrow_mut().clear();
    evaluator.evaluate(recorder, &mut process)?;
    assert!(seen.borrow()[0].is_none());
    Ok(())
}

#[test]
fn names_missing_from_a_record_are_undefined_members() {
    let mut script = Script::new();
    let record = name(&mut script, "r");
    let missing = name(&mut script, "missing");
    let member = script.push_expression(Member {
        object: record,
        member: missing,
        span: Span::default(),
    });

    let mut process = process();
    process.globals().set("r", Value::Record(Namespace::new()));
    // Visible as a global, but not a member of `r`.
    process.globals().set("missing", Value::from(1.0));
    let mut evaluator = Evaluator::new(Rc::new(script), vec![process.globals().clone()]);

    let error = evaluator
        .evaluate(member, &mut process)
        .expect_err("Members never fall back to globals.");
    assert!(matches!(error.kind, RuntimeErrorKind::UndefinedMember(ref name) if name == "missing"));
}

#[test]
fn evaluator_recovers_after_an_error() -> Result<(), RuntimeError> {
    let mut script = Script::new();
    let one = constant(&mut script, 1.0);
    let missing = name(&mut script, "missing");
    let broken = binary(&mut script, BinaryOperator::Add, one, missing);
    let two = constant(&mut script, 2.0);
    let fine = binary(&mut script, BinaryOperator::Add, one, two);

    let mut process = process();
    let mut evaluator = Evaluator::new(Rc::new(script), vec![process.globals().clone()]);

    let error = evaluator
        .evaluate(broken, &mut process)
        .expect_err("`missing` is not defined.");
    assert!(matches!(error.kind, RuntimeErrorKind::InvalidAccess(ref name) if name == "missing"));

    let value = evaluator.evaluate(fine, &mut process)?;
    assert_eq!(value.to_string(), "3");
    assert!(!evaluator.has_result());
    assert_eq!(evaluator.pending(), 0);
    Ok(())
}

#[test]
fn short_circuit_skips_the_right_operand() -> Result<(), RuntimeError> {
    let mut script = Script::new();
    let no = constant(&mut script, false);
    let missing = name(&mut script, "missing");
    let and = script.push_expression(ShortCircuit {
        operator: LogicalOperator::And,
        lhs: no,
        rhs: missing,
        span: Span::default(),
    });
    let yes = constant(&mut script, true);
    let or = script.push_expression(ShortCircuit {
        operator: LogicalOperator::Or,
        lhs: no,
        rhs: yes,
        span: Span::default(),
    });

    let mut process = process();
    let mut evaluator = Evaluator::new(Rc::new(script), vec![process.globals().clone()]);
    assert_eq!(evaluator.evaluate(and, &mut process)?.to_string(), "False");
    assert_eq!(evaluator.evaluate(or, &mut process)?.to_string(), "True");
    Ok(())
}

#[test]
fn lookup_walks_the_visible_namespaces_innermost_first() {
    let process = process();
    let locals = Namespace::new();
    locals.set("x", Value::from("local"));
    process.globals().set("x", Value::from("global"));
    process.globals().set("y", Value::from("global"));

    let evaluator = Evaluator::new(
        Rc::new(Script::new()),
        vec![locals.clone(), process.globals().clone()],
    );
    assert!(matches!(evaluator.lookup("x"), Ok(Value::Text(t)) if t == "local"));
    assert!(matches!(evaluator.lookup("y"), Ok(Value::Text(t)) if t == "global"));
    assert!(matches!(
        evaluator.lookup("z"),
        Err(RuntimeErrorKind::InvalidAccess(_))
    ));
    assert!(evaluator.innermost().is_some_and(|ns| ns.ptr_eq(&locals)));

    let mut out = Vec::new();
    evaluator.namespaces(&mut out);
    assert_eq!(out.len(), 2);
}

#[test]
fn expressions_without_a_result_are_errors() -> Result<(), RuntimeError> {
    let mut script = Script::new();
    let silent = script.push_expression(Silent);
    let one = constant(&mut script, 1.0);
    let sum = binary(&mut script, BinaryOperator::Add, one, silent);

    let mut process = process();
    let mut evaluator = Evaluator::new(Rc::new(script), vec![process.globals().clone()]);

    let error = evaluator
        .evaluate(silent, &mut process)
        .expect_err("Nothing was produced.");
    assert!(matches!(error.kind, RuntimeErrorKind::UnbalancedResults(0)));

    let error = evaluator
        .evaluate(sum, &mut process)
        .expect_err("The right operand produced nothing.");
    assert!(matches!(error.kind, RuntimeErrorKind::UnbalancedResults(0)));

    let value = evaluator.evaluate(one, &mut process)?;
    assert_eq!(value.to_string(), "1");
    assert_eq!(evaluator.pending(), 0);
    Ok(())
}
