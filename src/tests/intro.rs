//! Introductory assignments

use std::time::Duration;

use crate::models::{TestCase, TestContext, TestFactory, TestModule, TestResult};

const EXISTS: TestFactory = TestFactory::new("exists", exists);
const NOT_EMPTY: TestFactory = TestFactory::new("not_empty", not_empty);
const GREETS: TestFactory = TestFactory::new("greets", greets);

const LOADED: TestFactory = TestFactory::new("loaded", loaded);
const DEFINES_FIZZBUZZ: TestFactory = TestFactory::new("defines_fizzbuzz", defines_fizzbuzz);
const USES_MODULO: TestFactory = TestFactory::new("uses_modulo", uses_modulo);
const PRINTS_WORDS: TestFactory = TestFactory::new("prints_words", prints_words);

/// hello: print a greeting
pub fn hello() -> TestModule {
    TestModule::new("hello").tests([EXISTS, NOT_EMPTY, GREETS])
}

/// fizzbuzz: loop from 1 to 100 printing Fizz, Buzz and FizzBuzz
pub fn fizzbuzz() -> TestModule {
    TestModule::new("fizzbuzz")
        .before(|ctx| {
            if !ctx.file_path().exists() {
                anyhow::bail!("{} does not exist", ctx.label());
            }
            Ok(())
        })
        .tests([PRINTS_WORDS, USES_MODULO, DEFINES_FIZZBUZZ])
}

fn exists() -> TestCase {
    TestCase::new("the file exists", |ctx| {
        Ok(Some(TestResult::check(
            "the file exists",
            ctx.file_path().exists(),
            format!("{} was not found", ctx.label()),
        )))
    })
    .order(0)
    .timeout(Duration::from_secs(1))
}

fn not_empty() -> TestCase {
    TestCase::new("the file is not empty", |ctx| {
        let source = source_or_empty(ctx);
        Ok(Some(TestResult::check(
            "the file is not empty",
            !source.trim().is_empty(),
            "the file contains no code",
        )))
    })
    .order(1)
    .timeout(Duration::from_secs(1))
    .depends_on(EXISTS)
}

fn greets() -> TestCase {
    TestCase::new("prints \"Hello, world!\"", |ctx| {
        let source = source_or_empty(ctx).to_lowercase();
        Ok(Some(TestResult::check(
            "prints \"Hello, world!\"",
            source.contains("hello, world"),
            "no greeting found; did you spell \"Hello, world!\" exactly?",
        )))
    })
    .order(2)
    .depends_on(NOT_EMPTY)
}

/// Administrative: fails the run if the source cannot be read, reports nothing
fn loaded() -> TestCase {
    TestCase::new("source can be read", |ctx| {
        ctx.read_source()?;
        Ok(None)
    })
    .order(0)
}

fn defines_fizzbuzz() -> TestCase {
    TestCase::new("defines fizzbuzz", |ctx| {
        let source = ctx.read_source()?;
        Ok(Some(TestResult::check(
            "defines fizzbuzz",
            source.contains("fizzbuzz("),
            "no function named fizzbuzz was found",
        )))
    })
    .order(1)
    .depends_on(LOADED)
}

fn uses_modulo() -> TestCase {
    TestCase::new("uses the modulo operator", |ctx| {
        let source = ctx.read_source()?;
        Ok(Some(TestResult::check(
            "uses the modulo operator",
            source.contains('%'),
            "divisibility is easiest to check with %",
        )))
    })
    .order(2)
    .depends_on(LOADED)
}

fn prints_words() -> TestCase {
    TestCase::new("mentions Fizz and Buzz", |ctx| {
        let source = ctx.read_source()?;
        let missing: Vec<_> = ["Fizz", "Buzz"]
            .into_iter()
            .filter(|word| !source.contains(word))
            .collect();
        Ok(Some(TestResult::check(
            "mentions Fizz and Buzz",
            missing.is_empty(),
            format!("missing: {}", missing.join(", ")),
        )))
    })
    .order(3)
    .depends_on(DEFINES_FIZZBUZZ)
}

fn source_or_empty(ctx: &TestContext) -> String {
    ctx.read_source().unwrap_or_default()
}

#[cfg(test)]
mod unit_tests {
    use super::*;
    use crate::executor::{resolve, run_module, HeartbeatSink, RunOptions};
    use crate::models::Heartbeat;
    use crate::output::Reporter;
    use std::io::Write;

    #[derive(Default)]
    struct Collect {
        results: Vec<TestResult>,
        errors: Vec<String>,
    }

    impl HeartbeatSink for Collect {
        fn heartbeat(&mut self, _heartbeat: Heartbeat) {}
    }

    impl Reporter for Collect {
        fn announce(&mut self, _label: &str) {}
        fn display(&mut self, result: &TestResult) {
            self.results.push(result.clone());
        }
        fn display_error(&mut self, message: &str) {
            self.errors.push(message.to_string());
        }
    }

    fn student_file(name: &str, content: &str) -> (tempfile::TempDir, TestContext) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        write!(file, "{content}").unwrap();
        (dir, TestContext::new(path))
    }

    #[test]
    fn test_hello_passes() {
        let (_dir, ctx) = student_file("hello.py", "print(\"Hello, world!\")\n");
        let mut sink = Collect::default();
        run_module(&hello(), &ctx, &RunOptions::default(), &mut sink).unwrap();

        assert_eq!(sink.results.len(), 3);
        assert!(sink.results.iter().all(|r| r.passed()));
    }

    #[test]
    fn test_hello_missing_greeting() {
        let (_dir, ctx) = student_file("hello.py", "print('hi')\n");
        let mut sink = Collect::default();
        run_module(&hello(), &ctx, &RunOptions::default(), &mut sink).unwrap();

        let failed: Vec<_> = sink.results.iter().filter(|r| !r.passed()).collect();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].description, "prints \"Hello, world!\"");
    }

    #[test]
    fn test_fizzbuzz_resolution_shares_loaded() {
        let tests = fizzbuzz()
            .factories()
            .iter()
            .map(|f| f.create())
            .collect();
        let order: Vec<_> = resolve(tests).unwrap().iter().map(|t| t.id()).collect();
        assert_eq!(order, vec!["loaded", "defines_fizzbuzz", "prints_words", "uses_modulo"]);
    }

    #[test]
    fn test_fizzbuzz_reports_in_order() {
        let source = "def fizzbuzz(n):\n    for i in range(1, n + 1):\n        print('FizzBuzz' if i % 15 == 0 else 'Fizz' if i % 3 == 0 else 'Buzz' if i % 5 == 0 else i)\n";
        let (_dir, ctx) = student_file("fizzbuzz.py", source);
        let mut sink = Collect::default();
        run_module(&fizzbuzz(), &ctx, &RunOptions::default(), &mut sink).unwrap();

        let descriptions: Vec<_> = sink.results.iter().map(|r| r.description.as_str()).collect();
        assert_eq!(
            descriptions,
            vec!["defines fizzbuzz", "uses the modulo operator", "mentions Fizz and Buzz"]
        );
        assert!(sink.results.iter().all(|r| r.passed()));
    }

    #[test]
    fn test_fizzbuzz_setup_requires_file() {
        let ctx = TestContext::new("/nonexistent/fizzbuzz.py");
        let mut sink = Collect::default();
        let err = run_module(&fizzbuzz(), &ctx, &RunOptions::default(), &mut sink).unwrap_err();

        assert!(err.to_string().starts_with("Something went wrong at setup:"));
        assert!(sink.results.is_empty());
        assert!(sink.errors.is_empty());
    }
}
