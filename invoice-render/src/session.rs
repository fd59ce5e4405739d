//! Browser session lifecycle.
//!
//! One [`BrowserSession`] serves exactly one render request. The stages run
//! strictly in order — launch, navigate, inject, settle, capture — and any
//! failure short-circuits the remaining stages. Close is the one
//! unconditional action: it runs on every path out of every stage, success
//! or failure, so no engine session is ever left behind.

use std::future::Future;
use std::time::Duration;

use tokio::time::{sleep, timeout};
use tracing::{debug, warn};

use crate::capture::{self, PdfDocument};
use crate::engine::{EngineFactory, RenderEngine, Viewport};
use crate::error::{AddContext, Category, Error};
use crate::inject;
use crate::invoice::Payload;

/// Per-session knobs. The settle duration is a heuristic quiet period, not
/// an event-driven guarantee: it exists to let fonts, images, and the page's
/// own recompute cycle finish before capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    pub viewport: Viewport,
    pub navigation_timeout: Duration,
    pub script_timeout: Duration,
    pub settle: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            viewport: Viewport::default(),
            navigation_timeout: Duration::from_secs(45),
            script_timeout: Duration::from_secs(30),
            settle: Duration::from_millis(900),
        }
    }
}

/// A live engine session driving one render request
pub struct BrowserSession {
    engine: Box<dyn RenderEngine>,
    config: SessionConfig,
}

impl std::fmt::Debug for BrowserSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BrowserSession")
            .field("engine", &"<dyn RenderEngine>")
            .field("config", &self.config)
            .finish()
    }
}

impl BrowserSession {
    /// Acquire a fresh, isolated engine session
    ///
    /// # Errors
    /// [`Error`] with the `EngineLaunch` category if the engine cannot be
    /// acquired. Launch failures are fatal; there is no retry.
    pub async fn launch(
        factory: &dyn EngineFactory,
        config: SessionConfig,
    ) -> Result<Self, Error> {
        debug!(stage = "launch", "launching rendering engine");
        let engine = factory
            .launch(config.viewport)
            .await
            .add_context("launching rendering engine")?;
        Ok(Self { engine, config })
    }

    /// Run the remaining pipeline stages against `url`, then release the
    /// engine. The release happens whether the pipeline succeeded or not; a
    /// failed release on an otherwise successful run is logged, not
    /// surfaced.
    pub async fn run(mut self, url: &str, payload: &Payload) -> Result<PdfDocument, Error> {
        let outcome = self.drive(url, payload).await;
        debug!(stage = "close", "releasing rendering engine");
        if let Err(close_err) = self.engine.close().await {
            warn!(error = %close_err, "rendering engine did not close cleanly");
        }
        outcome
    }

    async fn drive(&mut self, url: &str, payload: &Payload) -> Result<PdfDocument, Error> {
        let config = self.config;

        debug!(stage = "navigate", url, "loading target page");
        bounded(
            config.navigation_timeout,
            Category::Navigation,
            self.engine.navigate(url),
        )
        .await
        .add_context("loading target page")?;

        debug!(stage = "inject", "writing payload into page");
        bounded(
            config.script_timeout,
            Category::Injection,
            inject::apply(self.engine.as_mut(), payload),
        )
        .await
        .add_context("injecting invoice data")?;

        debug!(stage = "settle", settle_ms = config.settle.as_millis() as u64, "waiting for page to settle");
        sleep(config.settle).await;

        debug!(stage = "capture", "printing page to pdf");
        let document = capture::print(self.engine.as_mut())
            .await
            .add_context("capturing rendered invoice")?;
        Ok(document)
    }
}

/// Run a pipeline stage under a time budget, attributing a blown budget to
/// the stage's failure category
async fn bounded<T>(
    limit: Duration,
    stage: Category,
    fut: impl Future<Output = Result<T, Error>>,
) -> Result<T, Error> {
    match timeout(limit, fut).await {
        Ok(outcome) => outcome,
        Err(_) => Err(Error::timeout(limit).categorize(stage)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{FailAt, MockFactory};

    async fn run_session(factory: &MockFactory) -> Result<PdfDocument, Error> {
        let session = BrowserSession::launch(factory, SessionConfig::default())
            .await
            .unwrap();
        session
            .run("https://invoices.example.com/form", &Payload::default())
            .await
    }

    #[tokio::test]
    async fn stages_run_in_order_and_close_last() {
        let factory = MockFactory::new();
        let document = run_session(&factory).await.unwrap();
        assert!(document.has_pdf_signature());
        assert_eq!(
            factory.state.calls(),
            ["navigate", "evaluate", "print", "close"]
        );
        assert_eq!(
            factory.state.last_navigated().as_deref(),
            Some("https://invoices.example.com/form")
        );
    }

    #[tokio::test]
    async fn navigation_failure_short_circuits_but_still_closes() {
        let factory = MockFactory::failing_at(FailAt::Navigate);
        let err = run_session(&factory).await.unwrap_err();
        assert_eq!(err.category(), Category::Navigation);
        let calls = factory.state.calls();
        assert!(!calls.contains(&"evaluate"));
        assert!(!calls.contains(&"print"));
        assert!(factory.state.closed());
    }

    #[tokio::test]
    async fn injection_failure_skips_capture_and_closes() {
        let factory = MockFactory::failing_at(FailAt::Evaluate);
        let err = run_session(&factory).await.unwrap_err();
        assert_eq!(err.category(), Category::Injection);
        assert!(!factory.state.calls().contains(&"print"));
        assert!(factory.state.closed());
    }

    #[tokio::test]
    async fn capture_failure_surfaces_its_category_and_closes() {
        let factory = MockFactory::failing_at(FailAt::Print);
        let err = run_session(&factory).await.unwrap_err();
        assert_eq!(err.category(), Category::Capture);
        assert!(factory.state.closed());
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_navigation_times_out_as_a_navigation_error() {
        let factory = MockFactory::new().with_navigate_delay(Duration::from_secs(120));
        let err = run_session(&factory).await.unwrap_err();
        assert_eq!(err.category(), Category::Navigation);
        assert!(factory.state.closed());
    }

    #[tokio::test]
    async fn launch_failure_is_fatal_and_categorized() {
        let factory = MockFactory::failing_at(FailAt::Launch);
        let err = BrowserSession::launch(&factory, SessionConfig::default())
            .await
            .unwrap_err();
        assert_eq!(err.category(), Category::EngineLaunch);
    }
}
