//! Test modules and the registry of test specifications
//!
//! A test module is the explicit list of test factories for one graded file,
//! plus optional `before`/`after` hooks that run once around the whole module.

use anyhow::Result;
use std::fmt;

use super::{TestContext, TestFactory};

/// Lifecycle hook run outside the timed test loop
pub type Hook = Box<dyn Fn(&TestContext) -> Result<()> + Send + Sync>;

/// The test factories and hooks for one graded file
pub struct TestModule {
    name: String,
    factories: Vec<TestFactory>,
    before: Option<Hook>,
    after: Option<Hook>,
}

impl TestModule {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            factories: Vec::new(),
            before: None,
            after: None,
        }
    }

    /// Register a test factory; registration order is discovery order
    pub fn test(mut self, factory: TestFactory) -> Self {
        self.factories.push(factory);
        self
    }

    pub fn tests(mut self, factories: impl IntoIterator<Item = TestFactory>) -> Self {
        self.factories.extend(factories);
        self
    }

    pub fn before<F>(mut self, hook: F) -> Self
    where
        F: Fn(&TestContext) -> Result<()> + Send + Sync + 'static,
    {
        self.before = Some(Box::new(hook));
        self
    }

    pub fn after<F>(mut self, hook: F) -> Self
    where
        F: Fn(&TestContext) -> Result<()> + Send + Sync + 'static,
    {
        self.after = Some(Box::new(hook));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn factories(&self) -> &[TestFactory] {
        &self.factories
    }

    pub fn before_hook(&self) -> Option<&Hook> {
        self.before.as_ref()
    }

    pub fn after_hook(&self) -> Option<&Hook> {
        self.after.as_ref()
    }
}

impl fmt::Debug for TestModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestModule")
            .field("name", &self.name)
            .field("factories", &self.factories)
            .field("before", &self.before.is_some())
            .field("after", &self.after.is_some())
            .finish()
    }
}

/// A registered test specification
#[derive(Clone, Copy, Debug)]
pub struct SpecEntry {
    /// Module path the specification lives under, e.g. `intro`
    pub module: &'static str,
    /// Base name matched against the graded file's stem
    pub name: &'static str,
    pub build: fn() -> TestModule,
}

impl SpecEntry {
    pub const fn new(module: &'static str, name: &'static str, build: fn() -> TestModule) -> Self {
        Self {
            module,
            name,
            build,
        }
    }

    /// `module/name`, the key a worker is launched with
    pub fn key(&self) -> String {
        format!("{}/{}", self.module, self.name)
    }
}

/// All test specifications known to this binary
#[derive(Clone, Debug, Default)]
pub struct SpecRegistry {
    entries: Vec<SpecEntry>,
}

impl SpecRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(mut self, entry: SpecEntry) -> Self {
        self.entries.push(entry);
        self
    }

    pub fn entries(&self) -> &[SpecEntry] {
        &self.entries
    }

    /// Look up a specification by its `module/name` key
    pub fn get(&self, key: &str) -> Option<&SpecEntry> {
        self.entries.iter().find(|e| e.key() == key)
    }

    /// Distinct module paths, in registration order
    pub fn modules(&self) -> Vec<&'static str> {
        let mut modules: Vec<&'static str> = Vec::new();
        for entry in &self.entries {
            if !modules.contains(&entry.module) {
                modules.push(entry.module);
            }
        }
        modules
    }
}
