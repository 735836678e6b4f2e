//! Test registration.
//!
//! Tests are declared on a [`SuiteBuilder`], either directly or inside a named [`Module`]. Declaration order is
//! execution order and report order: modules appear in the order they were opened, tests in the order they were
//! registered within each module. Consecutive top-level registrations share one unnamed group.
//!
//! [`SuiteBuilder::build`] freezes the declarations into an immutable [`Suite`], which the runner consumes once.

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use crate::failure::{IntoTestResult, TestResult};

/// The future a registered body produces.
pub type BoxFuture = Pin<Box<dyn Future<Output = TestResult> + Send + 'static>>;

pub(crate) type Body = Box<dyn FnOnce() -> BoxFuture + Send + 'static>;

/// How a test takes part in the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Runs and must pass.
    Normal,
    /// Runs; a failure is tolerated.
    Todo,
    /// Never runs; always reported as passing.
    Skip,
}

/// Static description of a registered test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestInfo {
    pub name: String,
    pub module: Option<String>,
    pub mode: Mode,
}

/// A registered test: its description and its body.
pub struct TestDescriptor {
    pub info: TestInfo,
    body: Body,
}

impl TestDescriptor {
    pub(crate) fn into_parts(self) -> (TestInfo, Body) {
        (self.info, self.body)
    }
}

impl fmt::Debug for TestDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestDescriptor").field("info", &self.info).finish_non_exhaustive()
    }
}

/// A group of tests, optionally named.
#[derive(Debug)]
pub struct Module {
    name: Option<String>,
    tests: Vec<TestDescriptor>,
}

impl Module {
    fn new(name: Option<String>) -> Self {
        Self {
            name,
            tests: Vec::new(),
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Register a test that must pass.
    pub fn test<F, Fut>(&mut self, name: impl Into<String>, body: F) -> &mut Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future + Send + 'static,
        Fut::Output: IntoTestResult,
    {
        self.register(name.into(), Mode::Normal, body)
    }

    /// Register a test that runs but is allowed to fail.
    pub fn todo<F, Fut>(&mut self, name: impl Into<String>, body: F) -> &mut Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future + Send + 'static,
        Fut::Output: IntoTestResult,
    {
        self.register(name.into(), Mode::Todo, body)
    }

    /// Register a test that is reported but never run.
    pub fn skip<F, Fut>(&mut self, name: impl Into<String>, body: F) -> &mut Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future + Send + 'static,
        Fut::Output: IntoTestResult,
    {
        self.register(name.into(), Mode::Skip, body)
    }

    fn register<F, Fut>(&mut self, name: String, mode: Mode, body: F) -> &mut Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future + Send + 'static,
        Fut::Output: IntoTestResult,
    {
        let body: Body = Box::new(move || -> BoxFuture { Box::pin(async move { body().await.into_test_result() }) });
        self.tests.push(TestDescriptor {
            info: TestInfo {
                name,
                module: self.name.clone(),
                mode,
            },
            body,
        });
        self
    }
}

/// Collects test declarations before a run.
#[derive(Debug, Default)]
pub struct SuiteBuilder {
    modules: Vec<Module>,
}

impl SuiteBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a named module. Its tests are labelled `<module> - <test>`.
    pub fn module(&mut self, name: impl Into<String>) -> &mut Module {
        self.push_module(Some(name.into()))
    }

    pub fn test<F, Fut>(&mut self, name: impl Into<String>, body: F) -> &mut Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future + Send + 'static,
        Fut::Output: IntoTestResult,
    {
        self.top_level().test(name, body);
        self
    }

    pub fn todo<F, Fut>(&mut self, name: impl Into<String>, body: F) -> &mut Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future + Send + 'static,
        Fut::Output: IntoTestResult,
    {
        self.top_level().todo(name, body);
        self
    }

    pub fn skip<F, Fut>(&mut self, name: impl Into<String>, body: F) -> &mut Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future + Send + 'static,
        Fut::Output: IntoTestResult,
    {
        self.top_level().skip(name, body);
        self
    }

    /// Number of tests registered so far.
    pub fn len(&self) -> usize {
        self.modules.iter().map(|m| m.tests.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Freeze the declarations.
    pub fn build(self) -> Suite {
        Suite {
            tests: self.modules.into_iter().flat_map(|m| m.tests).collect(),
        }
    }

    fn top_level(&mut self) -> &mut Module {
        if matches!(self.modules.last(), Some(last) if last.name.is_none()) {
            let index = self.modules.len() - 1;
            return &mut self.modules[index];
        }
        self.push_module(None)
    }

    fn push_module(&mut self, name: Option<String>) -> &mut Module {
        let index = self.modules.len();
        self.modules.push(Module::new(name));
        &mut self.modules[index]
    }
}

/// An immutable, ordered set of tests ready to run.
#[derive(Debug)]
pub struct Suite {
    tests: Vec<TestDescriptor>,
}

impl Suite {
    pub fn len(&self) -> usize {
        self.tests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tests.is_empty()
    }

    pub fn tests(&self) -> impl Iterator<Item = &TestInfo> {
        self.tests.iter().map(|t| &t.info)
    }

    pub(crate) fn into_tests(self) -> Vec<TestDescriptor> {
        self.tests
    }
}
