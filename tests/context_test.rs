use dscript::{
    interpreter::{BufferedContext, Context, Process, ProcessConfig},
    script::{Script, Statement, StatementRef},
    value::{
        error::{JumpError, OwnershipError, RuntimeError},
        Array, Iteration, Namespace, Value,
    },
};
use pretty_assertions::assert_eq;
use std::{cell::RefCell, rc::Rc};

/// Writes its label and moves on.
#[derive(Debug)]
struct Step {
    label: &'static str,
}

impl Statement for Step {
    fn execute(
        &self,
        _this: StatementRef,
        context: &mut Context,
        process: &mut Process,
    ) -> Result<(), RuntimeError> {
        process.writeln(self.label);
        context.proceed();
        Ok(())
    }
}

struct Fixture {
    script: Rc<Script>,
    output: BufferedContext,
    process: Process,
    refs: Vec<StatementRef>,
}

/// Builds one statement per label and links the given runs of labels into
/// sequences.
fn fixture(labels: &[&'static str], sequences: &[&[usize]]) -> Fixture {
    let mut script = Script::new();
    let refs: Vec<StatementRef> = labels
        .iter()
        .map(|&label| script.push_statement(Step { label }))
        .collect();
    for sequence in sequences {
        let linked: Vec<StatementRef> = sequence.iter().map(|&index| refs[index]).collect();
        script.link(&linked);
    }
    let output = BufferedContext::new();
    let process = Process::new(output.clone(), ProcessConfig::default());
    Fixture {
        script: Rc::new(script),
        output,
        process,
        refs,
    }
}

fn base_context(fixture: &Fixture) -> Context {
    Context::base(Rc::clone(&fixture.script), fixture.process.globals().clone())
}

fn shared_array() -> Array {
    Rc::new(RefCell::new(vec![Value::from(1.0), Value::from(2.0)]))
}

fn iteration_over(items: &Array) -> Iteration {
    Iteration::new(Value::Array(Rc::clone(items))).expect("Arrays are iterable.")
}

// Statements: 0 L1, 1 after1, 2 L2, 3 after2, 4 X, 5 Y
const LABELS: [&str; 6] = ["L1", "after1", "L2", "after2", "X", "Y"];
const SEQUENCES: [&[usize]; 3] = [&[0, 1], &[2, 3], &[4, 5]];

/// Three frames: the base sequence sitting on L1, the body of L1 sitting on
/// L2, and the body of L2 sitting on X.
fn nested(fixture: &Fixture) -> Context {
    let &[l1, _, l2, _, x, _] = &fixture.refs[..] else {
        unreachable!("The fixture has six statements.");
    };
    let mut context = base_context(fixture);
    context.start(Some(l1), None, None, None);
    context.start(Some(l2), Some(l1), Some(l1), Some(l1));
    context.start(Some(x), Some(l2), Some(l2), Some(l2));
    context
}

#[test]
fn statements_run_in_sequence() -> Result<(), RuntimeError> {
    let mut fixture = fixture(&["A", "B", "C"], &[&[0, 1, 2]]);
    let mut context = base_context(&fixture);
    context.start(Some(fixture.refs[0]), None, None, None);
    while context.execute(&mut fixture.process)? {}

    assert_eq!(fixture.output.contents(), "A\nB\nC\n");
    assert_eq!(context.depth(), 0);
    assert_eq!(context.current(), None);
    Ok(())
}

#[test]
fn exhausted_sequence_resumes_at_fallback() -> Result<(), RuntimeError> {
    let mut fixture = fixture(&LABELS, &SEQUENCES);
    let refs = fixture.refs.clone();
    let mut context = base_context(&fixture);
    context.start(Some(refs[0]), None, None, None);
    context.start(Some(refs[5]), Some(refs[1]), None, None);

    assert!(context.execute(&mut fixture.process)?);
    assert_eq!(fixture.output.contents(), "Y\n");
    assert_eq!(context.depth(), 1);
    assert_eq!(context.current(), Some(refs[1]));
    Ok(())
}

#[test]
fn empty_sequence_falls_through() {
    let fixture = fixture(&LABELS, &SEQUENCES);
    let refs = fixture.refs.clone();
    let mut context = base_context(&fixture);
    context.start(Some(refs[0]), None, None, None);
    context.start(None, Some(refs[1]), None, None);

    assert_eq!(context.depth(), 1);
    assert_eq!(context.current(), Some(refs[1]));
}

#[test]
fn break_resumes_after_the_innermost_loop() {
    let fixture = fixture(&LABELS, &SEQUENCES);
    let refs = fixture.refs.clone();
    let mut context = nested(&fixture);

    assert_eq!(context.jump_break(1), Ok(()));
    assert_eq!(context.depth(), 2);
    assert_eq!(context.current(), Some(refs[3]));
}

#[test]
fn multi_level_break_resumes_after_the_outer_loop() {
    let fixture = fixture(&LABELS, &SEQUENCES);
    let refs = fixture.refs.clone();
    let mut context = nested(&fixture);

    assert_eq!(context.jump_break(2), Ok(()));
    assert_eq!(context.depth(), 1);
    assert_eq!(context.current(), Some(refs[1]));
}

#[test]
fn break_skips_frames_without_targets() {
    let fixture = fixture(&LABELS, &SEQUENCES);
    let refs = fixture.refs.clone();
    let mut context = nested(&fixture);
    // A conditional body: no jump targets of its own.
    context.start(Some(refs[5]), Some(refs[4]), None, None);

    assert_eq!(context.jump_break(1), Ok(()));
    assert_eq!(context.depth(), 2);
    assert_eq!(context.current(), Some(refs[3]));
}

#[test]
fn continue_returns_to_the_loop_statement() {
    let fixture = fixture(&LABELS, &SEQUENCES);
    let refs = fixture.refs.clone();
    let mut context = nested(&fixture);

    assert_eq!(context.jump_continue(), Ok(()));
    assert_eq!(context.depth(), 2);
    assert_eq!(context.current(), Some(refs[2]));
}

#[test]
fn jumps_without_targets_fail() {
    let fixture = fixture(&LABELS, &SEQUENCES);
    let refs = fixture.refs.clone();

    let mut context = base_context(&fixture);
    context.start(Some(refs[0]), None, None, None);
    assert_eq!(context.jump_continue(), Err(JumpError::NoContinueTarget));
    assert_eq!(context.depth(), 0);

    let mut context = base_context(&fixture);
    context.start(Some(refs[0]), None, None, None);
    assert_eq!(context.jump_break(1), Err(JumpError::NoBreakTarget));
}

#[test]
fn break_count_is_validated() {
    let fixture = fixture(&LABELS, &SEQUENCES);

    let mut context = nested(&fixture);
    assert_eq!(context.jump_break(0), Err(JumpError::InvalidBreakCount));
    assert_eq!(context.depth(), 3);

    let mut context = nested(&fixture);
    assert_eq!(
        context.jump_break(3),
        Err(JumpError::TooFewCompounds { remaining: 1 })
    );
}

#[test]
fn break_releases_iteration_values() {
    let fixture = fixture(&LABELS, &SEQUENCES);
    let refs = fixture.refs.clone();
    let outer = shared_array();
    let inner = shared_array();

    let mut context = base_context(&fixture);
    context.start(Some(refs[0]), None, None, None);
    context.set_iteration_value(Some(iteration_over(&outer)));
    context.start(Some(refs[2]), Some(refs[0]), Some(refs[0]), Some(refs[0]));
    context.set_iteration_value(Some(iteration_over(&inner)));
    context.start(Some(refs[4]), Some(refs[2]), Some(refs[2]), Some(refs[2]));
    assert_eq!(Rc::strong_count(&outer), 2);
    assert_eq!(Rc::strong_count(&inner), 2);

    assert_eq!(context.jump_break(1), Ok(()));
    assert_eq!(Rc::strong_count(&inner), 1);
    assert_eq!(Rc::strong_count(&outer), 2);

    // The body of L1 is now the innermost breakable frame.
    assert_eq!(context.jump_break(1), Ok(()));
    assert_eq!(context.current(), Some(refs[1]));
    assert_eq!(Rc::strong_count(&outer), 1);
    assert!(context.iteration_value().is_none());
}

#[test]
fn continue_keeps_the_loop_cursor() {
    let fixture = fixture(&LABELS, &SEQUENCES);
    let refs = fixture.refs.clone();
    let items = shared_array();

    let mut context = base_context(&fixture);
    context.start(Some(refs[2]), None, None, None);
    context.set_iteration_value(Some(iteration_over(&items)));
    context.start(Some(refs[4]), Some(refs[2]), Some(refs[2]), Some(refs[2]));

    assert_eq!(context.jump_continue(), Ok(()));
    assert_eq!(Rc::strong_count(&items), 2);
    assert_eq!(context.iteration_value().map(Iteration::position), Some(0));
}

#[test]
fn reset_and_drop_release_iteration_values() {
    let fixture = fixture(&LABELS, &SEQUENCES);
    let refs = fixture.refs.clone();
    let items = shared_array();

    let mut context = base_context(&fixture);
    context.start(Some(refs[0]), None, None, None);
    context.set_iteration_value(Some(iteration_over(&items)));
    context.reset();
    assert_eq!(context.depth(), 0);
    assert_eq!(Rc::strong_count(&items), 1);

    context.start(Some(refs[0]), None, None, None);
    context.set_iteration_value(Some(iteration_over(&items)));
    assert_eq!(Rc::strong_count(&items), 2);
    drop(context);
    assert_eq!(Rc::strong_count(&items), 1);
}

#[test]
fn replacing_the_iteration_value_drops_the_old_one() {
    let fixture = fixture(&LABELS, &SEQUENCES);
    let refs = fixture.refs.clone();
    let first = shared_array();
    let second = shared_array();

    let mut context = base_context(&fixture);
    context.start(Some(refs[0]), None, None, None);
    context.set_iteration_value(Some(iteration_over(&first)));
    context.set_iteration_value(Some(iteration_over(&second)));
    assert_eq!(Rc::strong_count(&first), 1);
    assert_eq!(Rc::strong_count(&second), 2);
}

#[test]
fn only_owned_namespaces_can_be_taken() {
    let fixture = fixture(&LABELS, &SEQUENCES);

    let mut context = base_context(&fixture);
    assert!(!context.owns_namespace());
    assert_eq!(context.take_namespace().map(|_| ()), Err(OwnershipError));

    let mut context = Context::namespace(
        Rc::clone(&fixture.script),
        vec![fixture.process.globals().clone()],
    );
    let names = context.names().clone();
    let taken = context.take_namespace().expect("Record blocks own their names.");
    assert!(taken.ptr_eq(&names));
    assert_eq!(context.take_namespace().map(|_| ()), Err(OwnershipError));
}

#[test]
fn dropping_a_call_context_clears_its_locals_only() {
    let fixture = fixture(&LABELS, &SEQUENCES);
    let locals = Namespace::new();
    locals.set("x", Value::from(1.0));

    let context = Context::function_call(
        Rc::clone(&fixture.script),
        locals.clone(),
        fixture.process.globals().clone(),
    );
    assert_eq!(context.visible().len(), 2);
    drop(context);
    assert!(locals.is_empty());

    let context = base_context(&fixture);
    drop(context);
    assert!(!fixture.process.globals().is_empty());
}
