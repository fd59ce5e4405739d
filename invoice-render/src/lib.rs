//! Render invoices to PDF by driving a real browser engine.
//!
//! This crate loads a deployed HTML invoice page in headless chrome(ium),
//! fills the page's own form fields from a caller-supplied payload so the
//! page's client-side recalculation logic does the layout and totals, waits
//! for the page to visually settle, and captures the result through the
//! browser's print-to-PDF pipeline. Totals, tax rules, and formatting are
//! owned by the target page, never recomputed here.
//!
//! One [`BrowserSession`] is created per render and torn down at the end of
//! it regardless of outcome; sessions are never pooled or reused.
//!
//! # Example
//!
//! ```rust
//! use invoice_render::{PartyBuilder, PayloadBuilder, RenderRequestBuilder};
//!
//! let request = RenderRequestBuilder::default()
//!     .url("https://invoices.example.com/form")
//!     .data(
//!         PayloadBuilder::default()
//!             .seller(PartyBuilder::default().name("Acme Co").build().unwrap())
//!             .build()
//!             .unwrap(),
//!     )
//!     .build()
//!     .unwrap();
//! assert_eq!(request.pdf_filename(), "invoice.pdf");
//! ```

pub mod capture;
pub mod engine;
pub mod error;
pub mod inject;
pub mod invoice;
#[cfg(any(test, feature = "test-utils"))]
pub mod mock;
pub mod session;

pub use capture::{PageSize, PdfDocument, PrintOptions};
pub use engine::{
    DEFAULT_WEBDRIVER_PORT, EngineFactory, RenderEngine, Viewport, WebDriverFactory,
    start_chromedriver,
};
pub use error::{Category, Error};
pub use invoice::{
    InvoiceMeta, InvoiceMetaBuilder, Party, PartyBuilder, Payload, PayloadBuilder, ProductLine,
    ProductLineBuilder, RenderRequest, RenderRequestBuilder,
};
pub use session::{BrowserSession, SessionConfig};

use error::AddContext;

/// Render one invoice: launch an isolated engine session, load `url`, inject
/// `payload`, settle, and capture a PDF. The session is released on every
/// exit path.
///
/// # Arguments
///
/// - `factory`: source of isolated engine sessions
/// - `config`: per-session timeouts, viewport, and settle duration
/// - `url`: the deployed invoice page to load
/// - `payload`: invoice data to write into the page
///
/// # Returns
///
/// - The captured [`PdfDocument`] if every stage succeeds
///
/// # Errors
///
/// Returns `Err(crate::Error)` categorized by the stage that failed:
/// - acquiring the engine session (`EngineLaunch`)
/// - loading the target page (`Navigation`)
/// - running the injection script (`Injection`)
/// - printing the page (`Capture`)
pub async fn render_invoice(
    factory: &dyn EngineFactory,
    config: SessionConfig,
    url: &str,
    payload: &Payload,
) -> Result<PdfDocument, Error> {
    let session = BrowserSession::launch(factory, config)
        .await
        .add_context("rendering invoice")?;
    session
        .run(url, payload)
        .await
        .add_context("rendering invoice")
}
