use std::{
    fs::{read_dir, read_to_string},
    path::Path,
};

use color_eyre::{eyre::Context, Result};
use dscript::{
    interpreter::{BufferedContext, Process, ProcessConfig},
    parser::{
        formatter::{BasicParserFormatter, ParserFormatter},
        Parser,
    },
    value::formatter::{BasicFormatter, ValueFormatter},
};
use pretty_assertions::assert_eq;

#[test]
fn test_assignment() -> Result<()> {
    let input_dir = Path::new("./test_data/interpreter/assignment");
    test_engine(input_dir)
}

#[test]
fn test_operator() -> Result<()> {
    let input_dir = Path::new("./test_data/interpreter/operator");
    test_engine(input_dir)
}

#[test]
fn test_if() -> Result<()> {
    let input_dir = Path::new("./test_data/interpreter/if");
    test_engine(input_dir)
}

#[test]
fn test_loop() -> Result<()> {
    let input_dir = Path::new("./test_data/interpreter/loop");
    test_engine(input_dir)
}

#[test]
fn test_jump() -> Result<()> {
    let input_dir = Path::new("./test_data/interpreter/jump");
    test_engine(input_dir)
}

#[test]
fn test_function() -> Result<()> {
    let input_dir = Path::new("./test_data/interpreter/function");
    test_engine(input_dir)
}

#[test]
fn test_record() -> Result<()> {
    let input_dir = Path::new("./test_data/interpreter/record");
    test_engine(input_dir)
}

#[test]
fn test_native() -> Result<()> {
    let input_dir = Path::new("./test_data/interpreter/native");
    test_engine(input_dir)
}

#[test]
fn test_values() -> Result<()> {
    let input_dir = Path::new("./test_data/interpreter/values");
    test_engine(input_dir)
}

#[test]
fn test_parser_errors() -> Result<()> {
    let input_dir = Path::new("./test_data/interpreter/parser_errors");
    test_engine(input_dir)
}

struct TestCase {
    name: String,
    source: String,
    output: String,
    parser_errors: String,
    runtime_errors: String,
}

impl TestCase {
    pub fn check(&self) {
        let mut parser = Parser::new(&self.source);
        let script = match parser.parse() {
            Ok(script) => script,
            Err(error) => {
                let formatter = BasicParserFormatter::new(&self.source);
                assert_eq!(
                    self.parser_errors,
                    formatter.format_error(&error),
                    "Failed test {} at parsing stage.",
                    self.name,
                );
                return;
            }
        };
        assert_eq!(
            self.parser_errors, "",
            "Test {} was expected to fail parsing.",
            self.name
        );

        let output = BufferedContext::new();
        let mut process = Process::new(output.clone(), ProcessConfig::default());
        let outcome = process.run(script).and_then(|()| process.execute());
        let runtime_errors = match outcome {
            Ok(()) => String::new(),
            Err(error) => BasicFormatter::new(&self.source).format_error(&error),
        };
        assert_eq!(
            self.runtime_errors, runtime_errors,
            "Failed test {} at runtime.",
            self.name,
        );
        assert_eq!(
            self.output,
            output.contents(),
            "Failed test {} at print.",
            self.name
        );
    }
}

fn test_engine(input_dir: &Path) -> Result<()> {
    let mut succeeded = true;
    for entry in read_dir(input_dir).context("Failed to open input test data folder")? {
        let entry = entry?;
        let path = entry.path();

        let Some(extension) = path.extension() else {
            continue;
        };

        if extension != "ds" {
            continue;
        }

        println!("Parsing {path:?}");
        let test_case = parse_test_case(&path)?;
        println!("Checking {}", test_case.name);

        let res = std::panic::catch_unwind(|| {
            test_case.check();
        });
        if res.is_err() {
            println!("\tFails test case {}", test_case.name);
            succeeded = false;
        }
    }

    assert!(succeeded, "Some test cases in {input_dir:?} failed.");
    Ok(())
}

fn expectation<'a>(line: &'a str, marker: &str) -> Option<&'a str> {
    let index = line.find(marker)?;
    Some(line[index + marker.len()..].trim())
}

fn parse_test_case(input_path: &Path) -> Result<TestCase> {
    let test_name = AsRef::<Path>::as_ref(
        input_path
            .file_name()
            .expect("File name can't be none as the path is to a real file."),
    )
    .to_string_lossy();

    let input = read_to_string(input_path).context("Failed to open input test data file")?;

    let mut expected_outputs = Vec::new();
    let mut expected_parser_errors = Vec::new();
    let mut expected_runtime_errors = Vec::new();

    for (line_index, line) in input.lines().enumerate() {
        let line_number = line_index + 1;
        if let Some(expected) = expectation(line, "# expect:") {
            expected_outputs.push(expected.to_string());
        } else if let Some(expected) = expectation(line, "# expect parse error:") {
            expected_parser_errors.push(format!("({line_number}) [Parser] {expected}"));
        } else if let Some(expected) = expectation(line, "# expect runtime error:") {
            expected_runtime_errors.push(format!("({line_number}) [Runtime] {expected}"));
        }
    }

    expected_outputs.push(String::new());
    Ok(TestCase {
        name: test_name.into_owned(),
        source: input,
        output: expected_outputs.join("\n"),
        parser_errors: expected_parser_errors.join("\n"),
        runtime_errors: expected_runtime_errors.join("\n"),
    })
}
