use super::{ParserError, ParserErrorKind};
use crate::lexer::{LexicalErrorKind, LineBreaks};
use ariadne::{Color, Fmt, Label, Report, ReportKind, Source};
use std::path::Path;

const ARIADNE_MSG: &str = "Ariadne produces valid utf-8 strings";
const ARIADNE_WRITE_MSG: &str = "Write into buffer should not fail.";

pub trait ParserFormatter {
    fn format_error(&self, error: &ParserError) -> String;
}

pub struct DebugParserFormatter;

impl ParserFormatter for DebugParserFormatter {
    fn format_error(&self, error: &ParserError) -> String {
        format!("{error:?}")
    }
}

/// One-line reports: `(line) [Parser] message`.
pub struct BasicParserFormatter {
    line_breaks: LineBreaks,
}

impl BasicParserFormatter {
    pub fn new(text: &str) -> Self {
        Self {
            line_breaks: LineBreaks::new(text),
        }
    }
}

impl ParserFormatter for BasicParserFormatter {
    fn format_error(&self, error: &ParserError) -> String {
        let line = self.line_breaks.get_line_from_span(error.span);
        format!("({line}) [Parser] {}", error.kind)
    }
}

pub struct PrettyParserFormatter<'src> {
    text: &'src str,
    path: &'src Path,
}

impl<'src> PrettyParserFormatter<'src> {
    pub fn new(text: &'src str, path: &'src Path) -> Self {
        Self { text, path }
    }
}

impl<'src> ParserFormatter for PrettyParserFormatter<'src> {
    fn format_error(&self, error: &ParserError) -> String {
        let path = self
            .path
            .to_str()
            .expect("Non-UTF8 paths are not supported!");
        let span = error.span;
        let (message, label) = match &error.kind {
            ParserErrorKind::UnexpectedToken { actual, expected } => (
                "Expected a different token",
                format!(
                    "Expected {} but got {}",
                    expected.fg(Color::BrightCyan),
                    actual.fg(Color::BrightRed)
                ),
            ),
            ParserErrorKind::NonExpression(kind) => (
                "Expected a valid expression operator or atom token",
                format!("Not an expression token {}", kind.fg(Color::BrightRed)),
            ),
            ParserErrorKind::InvalidAssignmentTarget => (
                "Expected a name, member or element to assign to",
                "Cannot assign to this expression".into(),
            ),
            ParserErrorKind::InvalidBreakCount => (
                "Expected a whole number of loops",
                "Not a loop count".into(),
            ),
            ParserErrorKind::UnexpectedEof => ("Unexpected EOF", "File ends here...".into()),
            ParserErrorKind::Lexical(error) => match error.kind {
                LexicalErrorKind::Unrecognized(c) => (
                    "Encountered an unrecognized character",
                    format!("Unrecognized character {}", c.fg(Color::BrightRed)),
                ),
                LexicalErrorKind::UnclosedString => (
                    "Encountered an unterminated string",
                    "This string is never closed".into(),
                ),
            },
        };
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
