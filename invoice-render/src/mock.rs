//! Scripted engine doubles.
//!
//! [`MockFactory`] stands in for a WebDriver endpoint so the session state
//! machine and the HTTP boundary can be exercised without a browser. The
//! factory records every engine call in a shared [`MockState`], can be told
//! to fail at a chosen pipeline stage, and can delay navigation to provoke
//! timeouts.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::capture::PrintOptions;
use crate::engine::{EngineFactory, RenderEngine, Viewport};
use crate::error::{Category, Error};

/// Pipeline stage at which a mock engine should fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailAt {
    Launch,
    Navigate,
    Evaluate,
    Print,
}

/// Shared call log, inspectable after a session has run
#[derive(Debug, Clone, Default)]
pub struct MockState {
    calls: Arc<Mutex<Vec<&'static str>>>,
    navigated: Arc<Mutex<Option<String>>>,
    evaluations: Arc<Mutex<Vec<(String, Vec<Value>)>>>,
}

impl MockState {
    fn record(&self, call: &'static str) {
        self.calls.lock().unwrap().push(call);
    }

    /// Engine calls in the order they were issued
    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    /// Whether the engine was released
    pub fn closed(&self) -> bool {
        self.calls().contains(&"close")
    }

    /// The last url handed to `navigate`
    pub fn last_navigated(&self) -> Option<String> {
        self.navigated.lock().unwrap().clone()
    }

    /// Every `(script, args)` pair handed to `evaluate`
    pub fn evaluations(&self) -> Vec<(String, Vec<Value>)> {
        self.evaluations.lock().unwrap().clone()
    }
}

/// [`EngineFactory`] producing [`MockEngine`]s wired to a shared [`MockState`]
#[derive(Debug, Clone)]
pub struct MockFactory {
    pub state: MockState,
    fail_at: Option<FailAt>,
    navigate_delay: Duration,
    pdf_bytes: Vec<u8>,
}

impl Default for MockFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl MockFactory {
    pub fn new() -> Self {
        MockFactory {
            state: MockState::default(),
            fail_at: None,
            navigate_delay: Duration::ZERO,
            pdf_bytes: b"%PDF-1.4\n%mock document\n".to_vec(),
        }
    }

    pub fn failing_at(stage: FailAt) -> Self {
        MockFactory {
            fail_at: Some(stage),
            ..Self::new()
        }
    }

    /// Delay every `navigate` call, e.g. past the session's navigation
    /// timeout
    pub fn with_navigate_delay(self, delay: Duration) -> Self {
        MockFactory {
            navigate_delay: delay,
            ..self
        }
    }

    pub fn with_pdf_bytes(self, bytes: Vec<u8>) -> Self {
        MockFactory {
            pdf_bytes: bytes,
            ..self
        }
    }
}

#[async_trait]
impl EngineFactory for MockFactory {
    async fn launch(&self, _viewport: Viewport) -> Result<Box<dyn RenderEngine>, Error> {
        if self.fail_at == Some(FailAt::Launch) {
            return Err(Error::from(String::from("mock engine refused to launch"))
                .categorize(Category::EngineLaunch));
        }
        Ok(Box::new(MockEngine {
            state: self.state.clone(),
            fail_at: self.fail_at,
            navigate_delay: self.navigate_delay,
            pdf_bytes: self.pdf_bytes.clone(),
        }))
    }
}

struct MockEngine {
    state: MockState,
    fail_at: Option<FailAt>,
    navigate_delay: Duration,
    pdf_bytes: Vec<u8>,
}

#[async_trait]
impl RenderEngine for MockEngine {
    async fn navigate(&mut self, url: &str) -> Result<(), Error> {
        self.state.record("navigate");
        *self.state.navigated.lock().unwrap() = Some(url.to_string());
        if !self.navigate_delay.is_zero() {
            tokio::time::sleep(self.navigate_delay).await;
        }
        if self.fail_at == Some(FailAt::Navigate) {
            return Err(Error::from(String::from("mock navigation refused"))
                .categorize(Category::Navigation));
        }
        Ok(())
    }

    async fn evaluate(&mut self, script: &str, args: Vec<Value>) -> Result<Value, Error> {
        self.state.record("evaluate");
        self.state
            .evaluations
            .lock()
            .unwrap()
            .push((script.to_string(), args));
        if self.fail_at == Some(FailAt::Evaluate) {
            return Err(Error::from(String::from("mock script exception"))
                .categorize(Category::Injection));
        }
        Ok(Value::Bool(true))
    }

    async fn print_to_pdf(&mut self, _options: &PrintOptions) -> Result<Vec<u8>, Error> {
        self.state.record("print");
        if self.fail_at == Some(FailAt::Print) {
            return Err(
                Error::from(String::from("mock print refused")).categorize(Category::Capture)
            );
        }
        Ok(self.pdf_bytes.clone())
    }

    async fn close(&mut self) -> Result<(), Error> {
        self.state.record("close");
        Ok(())
    }
}
