//! Test cases and the factories that create them

use anyhow::{Context, Result};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::TestResult;

/// Body of a test case. `Ok(None)` keeps the test out of the report.
pub type TestBody = Box<dyn Fn(&TestContext) -> Result<Option<TestResult>> + Send + Sync>;

/// What a running test knows about the file under grading
#[derive(Clone, Debug)]
pub struct TestContext {
    file_path: PathBuf,
    label: String,
}

impl TestContext {
    pub fn new(file_path: impl Into<PathBuf>) -> Self {
        let file_path = file_path.into();
        let label = file_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| file_path.to_string_lossy().to_string());
        Self { file_path, label }
    }

    /// Absolute path of the graded source file
    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    /// File name shown when the module is announced
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Read the graded source file
    pub fn read_source(&self) -> Result<String> {
        std::fs::read_to_string(&self.file_path)
            .with_context(|| format!("Failed to read {}", self.file_path.display()))
    }
}

/// Zero-argument constructor for a test case.
///
/// The factory name is the test's identity: two instances built by the same
/// factory are the same test as far as ordering and deduplication go.
#[derive(Clone, Copy)]
pub struct TestFactory {
    name: &'static str,
    build: fn() -> TestCase,
}

impl TestFactory {
    pub const fn new(name: &'static str, build: fn() -> TestCase) -> Self {
        Self { name, build }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Build a fresh instance
    pub fn create(&self) -> TestCase {
        let mut test = (self.build)();
        test.id = self.name;
        test
    }
}

impl PartialEq for TestFactory {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for TestFactory {}

impl fmt::Debug for TestFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TestFactory").field(&self.name).finish()
    }
}

/// A single executable check
pub struct TestCase {
    id: &'static str,
    description: String,
    timeout: Option<Duration>,
    order: u32,
    dependencies: Vec<TestFactory>,
    body: TestBody,
}

impl TestCase {
    pub fn new<F>(description: impl Into<String>, body: F) -> Self
    where
        F: Fn(&TestContext) -> Result<Option<TestResult>> + Send + Sync + 'static,
    {
        Self {
            id: "",
            description: description.into(),
            timeout: None,
            order: 0,
            dependencies: Vec::new(),
            body: Box::new(body),
        }
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Presentation key; results are displayed in ascending order
    pub fn order(mut self, order: u32) -> Self {
        self.order = order;
        self
    }

    pub fn depends_on(mut self, factory: TestFactory) -> Self {
        self.dependencies.push(factory);
        self
    }

    pub fn id(&self) -> &'static str {
        self.id
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Declared timeout, or `default` when the test declares none
    pub fn timeout_or(&self, default: Duration) -> Duration {
        self.timeout.unwrap_or(default)
    }

    pub fn sort_key(&self) -> u32 {
        self.order
    }

    pub fn dependencies(&self) -> &[TestFactory] {
        &self.dependencies
    }

    /// Whether `other` declares the same test: description, timeout, order
    /// and dependencies all match
    pub fn same_declaration(&self, other: &TestCase) -> bool {
        self.description == other.description
            && self.timeout == other.timeout
            && self.order == other.order
            && self.dependencies == other.dependencies
    }

    pub fn run(&self, ctx: &TestContext) -> Result<Option<TestResult>> {
        (self.body)(ctx)
    }
}

impl fmt::Debug for TestCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestCase")
            .field("id", &self.id)
            .field("description", &self.description)
            .field("timeout", &self.timeout)
            .field("order", &self.order)
            .field("dependencies", &self.dependencies)
            .finish()
    }
}
