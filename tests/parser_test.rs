use dscript::{
    lexer::{LexicalError, LexicalErrorKind, TokenKind},
    parser::{
        formatter::{BasicParserFormatter, ParserFormatter},
        Parser, ParserErrorKind,
    },
};
use pretty_assertions::assert_eq;

fn parse_error(source: &str) -> ParserErrorKind {
    Parser::new(source)
        .parse()
        .expect_err("Source should not parse.")
        .kind
}

#[test]
fn empty_sources_have_no_first_statement() {
    for source in ["", "\n\n", "; ;\n", "# only a comment"] {
        let script = Parser::new(source).parse().expect("Empty scripts parse.");
        assert_eq!(script.first(), None, "Source {source:?}");
        assert_eq!(script.statement_count(), 0);
    }
}

#[test]
fn full_script_parses() {
    let source = "
x = [1, 2, 3]
record Point
    x = 0; y = 0
    def norm(): return self.x * self.x + self.y * self.y
end
def sum(items)
    total = 0
    for item in items: total += item
    return total
end
i = 0
while i < 10
    i += 1
    if i % 2 == 0: continue
    elsif i > 7
        break
    else: pass
end
Point.x = sum(x)
x[-1] -= 1
del i
print Point.norm(), len(x)
";
    let script = Parser::new(source).parse().expect("Script is well formed.");
    assert!(script.first().is_some());
    assert!(script.statement_count() > 10);
}

#[test]
fn single_line_and_block_forms_mix() {
    let sources = [
        "if x: pass\nelse\n    pass\nend\n",
        "if x\n    pass\nelse: pass\n",
        "while x: x -= 1\n",
        "def f(a, b): return a\n",
        "record Empty;\nrecord Also",
        "for c in \"abc\"\nend\n",
    ];
    for source in sources {
        assert!(
            Parser::new(source).parse().is_ok(),
            "Failed to parse {source:?}"
        );
    }
}

#[test]
fn unterminated_blocks_hit_eof() {
    assert_eq!(parse_error("while True\n    pass\n"), ParserErrorKind::UnexpectedEof);
    assert_eq!(parse_error("record R\n    x = 1\n"), ParserErrorKind::UnexpectedEof);
    assert_eq!(parse_error("if x\n    pass\nelse"), ParserErrorKind::UnexpectedEof);
    assert_eq!(parse_error("x = "), ParserErrorKind::UnexpectedEof);
}

#[test]
fn assignment_targets_are_checked() {
    assert_eq!(parse_error("1 = 2\n"), ParserErrorKind::InvalidAssignmentTarget);
    assert_eq!(parse_error("f() = 2\n"), ParserErrorKind::InvalidAssignmentTarget);
    assert_eq!(parse_error("(a) += 2\n"), ParserErrorKind::InvalidAssignmentTarget);
    assert!(Parser::new("a.b[0].c = 1\n").parse().is_ok());
}

#[test]
fn unexpected_tokens_are_reported() {
    assert_eq!(
        parse_error("print )\n"),
        ParserErrorKind::NonExpression(TokenKind::RightParenthesis)
    );
    assert_eq!(
        parse_error("end\n"),
        ParserErrorKind::NonExpression(TokenKind::KeywordEnd)
    );
    assert_eq!(
        parse_error("if x y\n"),
        ParserErrorKind::UnexpectedToken {
            actual: TokenKind::Ident,
            expected: TokenKind::Colon,
        }
    );
    assert_eq!(
        parse_error("def f(a b): pass\n"),
        ParserErrorKind::UnexpectedToken {
            actual: TokenKind::Ident,
            expected: TokenKind::RightParenthesis,
        }
    );
    assert_eq!(
        parse_error("while x: pass end\n"),
        ParserErrorKind::UnexpectedToken {
            actual: TokenKind::KeywordEnd,
            expected: TokenKind::Newline,
        }
    );
}

#[test]
fn break_counts_are_whole_numbers() {
    assert_eq!(parse_error("break 1.5\n"), ParserErrorKind::InvalidBreakCount);
    assert!(Parser::new("break 3\n").parse().is_ok());
}

#[test]
fn lexical_errors_surface_through_the_parser() {
    assert!(matches!(
        parse_error("x = \"open\n"),
        ParserErrorKind::Lexical(LexicalError {
            kind: LexicalErrorKind::UnclosedString,
            ..
        })
    ));
    assert!(matches!(
        parse_error("x = $\n"),
        ParserErrorKind::Lexical(LexicalError {
            kind: LexicalErrorKind::Unrecognized('$'),
            ..
        })
    ));
}

#[test]
fn errors_report_their_line() {
    let source = "x = 1\ny = 2\nprint )\n";
    let error = Parser::new(source)
        .parse()
        .expect_err("The third line is broken.");
    let formatter = BasicParserFormatter::new(source);
    assert_eq!(
        formatter.format_error(&error),
        "(3) [Parser] Expected an expression but got RIGHT_PAREN"
    );
}
