use super::error::{RuntimeError, RuntimeErrorKind};
use super::Value;
use crate::lexer::LineBreaks;
use ariadne::{Color, ColorGenerator, Fmt, Label, Report, ReportKind, Source};
use std::path::Path;

const ARIADNE_MSG: &str = "Ariadne produces valid utf-8 strings";
const ARIADNE_WRITE_MSG: &str = "Write into buffer should not fail.";

pub trait ValueFormatter {
    fn format(&self, value: &Value) -> String;
    fn format_error(&self, error: &RuntimeError) -> String;
}

pub struct DebugFormatter;

impl ValueFormatter for DebugFormatter {
    fn format(&self, value: &Value) -> String {
        format!("{value:?}")
    }

    fn format_error(&self, error: &RuntimeError) -> String {
        format!("{error:?}")
    }
}

/// One-line reports: `(line) [Runtime] message`.
pub struct BasicFormatter {
    line_breaks: LineBreaks,
}

impl BasicFormatter {
    pub fn new(text: &str) -> Self {
        let line_breaks = LineBreaks::new(text);
        Self { line_breaks }
    }
}

impl ValueFormatter for BasicFormatter {
    fn format(&self, value: &Value) -> String {
        format!("{value}")
    }

    fn format_error(&self, error: &RuntimeError) -> String {
        match error.span {
            Some(span) => {
                let line = self.line_breaks.get_line_from_span(span);
                format!("({line}) [Runtime] {}", error.kind)
            }
            None => format!("[Runtime] {}", error.kind),
        }
    }
}

pub struct PrettyFormatter<'src> {
    text: &'src str,
    path: &'src Path,
}

impl<'src> PrettyFormatter<'src> {
    pub fn new(text: &'src str, path: &'src Path) -> Self {
        Self { text, path }
    }

    fn describe(kind: &RuntimeErrorKind) -> (&'static str, String) {
        let mut colors = ColorGenerator::new();
        match kind {
            RuntimeErrorKind::NonNumeric(v) => (
                "Expected a single numeric operand",
                format!("{} is not a number", v.type_name().fg(Color::BrightRed)),
            ),
            RuntimeErrorKind::NonNumerics(lhs, rhs) => (
                "Expected both operands to be numeric",
                format!(
                    "One or both of {} and {} is not numeric",
                    lhs.type_name().fg(colors.next()),
                    rhs.type_name().fg(colors.next()),
                ),
            ),
            RuntimeErrorKind::NonAddable(lhs, rhs) => (
                "Expected both operands to be numbers, texts or arrays",
                format!(
                    "{} and {} cannot be added",
                    lhs.type_name().fg(colors.next()),
                    rhs.type_name().fg(colors.next()),
                ),
            ),
            RuntimeErrorKind::NonComparable(lhs, rhs) => (
                "Expected two numbers or two texts",
                format!(
                    "{} and {} have no ordering",
                    lhs.type_name().fg(colors.next()),
                    rhs.type_name().fg(colors.next()),
                ),
            ),
            RuntimeErrorKind::InvalidAccess(name) => (
                "Attempted to access a name that is not defined",
                format!("{} is not defined here", name.fg(Color::BrightRed)),
            ),
            RuntimeErrorKind::UndefinedMember(name) => (
                "Attempted to access an undefined member of a record",
                format!("The `{}` member is not defined", name.fg(Color::BrightYellow)),
            ),
            RuntimeErrorKind::NonRecord(v) => (
                "Attempted to access a member of a non-record value",
                format!("{} has no members", v.type_name().fg(Color::BrightRed)),
            ),
            RuntimeErrorKind::InvalidCallee(v) => (
                "Attempted to call a value that is not callable",
                format!("{} is not callable", v.type_name().fg(Color::BrightRed)),
            ),
            RuntimeErrorKind::InvalidArgumentCount { actual, expected } => (
                "Attempted to call a function with the wrong number of arguments",
                format!(
                    "Function has {} parameters but got {} arguments instead",
                    expected.fg(Color::BrightCyan),
                    actual.fg(Color::BrightRed),
                ),
            ),
            RuntimeErrorKind::InvalidArgument(v) => (
                "Invalid argument",
                format!("{} is not accepted here", v.fg(Color::BrightRed)),
            ),
            RuntimeErrorKind::NonIterable(v) => (
                "Expected an array, text or record",
                format!("{} cannot be iterated", v.type_name().fg(Color::BrightRed)),
            ),
            RuntimeErrorKind::NonIndexable(v) => (
                "Attempted to index a value that has no elements",
                format!("{} cannot be indexed", v.type_name().fg(Color::BrightRed)),
            ),
            RuntimeErrorKind::IndexOutOfRange { index, length } => (
                "Index out of range",
                format!(
                    "Index {} is outside a sequence of length {}",
                    index.fg(Color::BrightRed),
                    length.fg(Color::BrightCyan),
                ),
            ),
            kind => ("Script aborted", kind.to_string()),
        }
    }
}

impl<'src> ValueFormatter for PrettyFormatter<'src> {
    fn format(&self, value: &Value) -> String {
        format!("{value}")
    }

    fn format_error(&self, error: &RuntimeError) -> String {
        let path = self
            .path
            .to_str()
            .expect("Non-UTF8 paths are not supported!");
        let span = error.span.unwrap_or_default();
        let (message, label) = Self::describe(&error.kind);
        let mut output = std::io::Cursor::new(Vec::new());
        Report::build(ReportKind::Error, (path, span.range()))
            .with_code(error.code())
            .with_message(message)
            .with_label(
                Label::new((path, span.range()))
                    .with_message(label)
                    .with_color(Color::BrightRed),
            )
            .finish()
            .write((path, Source::from(self.text)), &mut output)
            .expect(ARIADNE_WRITE_MSG);
        String::from_utf8(output.into_inner()).expect(ARIADNE_MSG)
    }
}
