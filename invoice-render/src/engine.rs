//! Narrow abstraction over the rendering engine.
//!
//! [`BrowserSession`](crate::session::BrowserSession) drives the pipeline
//! through [`RenderEngine`] and [`EngineFactory`] only, so the underlying
//! driver can be swapped without touching the state machine. The production
//! implementation speaks WebDriver to headless chrome(ium) through
//! [`fantoccini`]; each [`EngineFactory::launch`] call opens a fresh,
//! isolated WebDriver session that shares nothing with any other request.

use std::{
    net::TcpListener,
    process::{Child, Command, Stdio},
    thread,
    time::Duration,
};

use async_trait::async_trait;
use fantoccini::{
    Client, ClientBuilder,
    wd::{PrintConfigurationBuilder, PrintMargins, PrintSize},
};
use serde_json::{Map, Value};

use crate::capture::{PageSize, PrintOptions};
use crate::error::{AddContext, Category, Error};

pub const DEFAULT_WEBDRIVER_PORT: u16 = 4444;

/// Fixed logical viewport applied to every launched engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Viewport {
            width: 1200,
            height: 800,
        }
    }
}

/// One live, isolated rendering-engine session. Implementations categorize
/// their own failures: `navigate` raises `Navigation` errors, `evaluate`
/// raises `Injection` errors, `print_to_pdf` raises `Capture` errors.
#[async_trait]
pub trait RenderEngine: Send {
    /// Load the given url and wait for the page to settle its initial load
    async fn navigate(&mut self, url: &str) -> Result<(), Error>;

    /// Run a script inside the loaded page's own context. `args` must be
    /// plain serializable data; the script sees them as `arguments`.
    async fn evaluate(&mut self, script: &str, args: Vec<Value>) -> Result<Value, Error>;

    /// Produce a PDF byte buffer from the current page state
    async fn print_to_pdf(&mut self, options: &PrintOptions) -> Result<Vec<u8>, Error>;

    /// Release every resource held by this session
    async fn close(&mut self) -> Result<(), Error>;
}

/// Launches isolated engine sessions. One factory serves the whole process;
/// one engine serves exactly one request.
#[async_trait]
pub trait EngineFactory: Send + Sync {
    async fn launch(&self, viewport: Viewport) -> Result<Box<dyn RenderEngine>, Error>;
}

/// [`EngineFactory`] backed by a WebDriver endpoint (chromedriver)
#[derive(Debug, Clone)]
pub struct WebDriverFactory {
    webdriver_url: String,
}

impl WebDriverFactory {
    pub fn new(webdriver_url: &str) -> Self {
        Self {
            webdriver_url: webdriver_url.to_string(),
        }
    }
}

#[async_trait]
impl EngineFactory for WebDriverFactory {
    async fn launch(&self, viewport: Viewport) -> Result<Box<dyn RenderEngine>, Error> {
        let mut caps = Map::new();
        caps.insert(
            "goog:chromeOptions".to_string(),
            serde_json::json!({
                "args": ["--headless", "--disable-gpu"]
            }),
        );
        let client = ClientBuilder::native()
            .capabilities(caps)
            .connect(&self.webdriver_url)
            .await
            .map_err(Error::from)
            .add_context("connecting to webdriver")?;
        if let Err(e) = client.set_window_size(viewport.width, viewport.height).await {
            // The session exists at this point; it must not outlive the
            // failed launch.
            let _ = client.clone().close().await;
            return Err(Error::from(e)
                .categorize(Category::EngineLaunch)
                .add_context("sizing browser window"));
        }
        Ok(Box::new(WebDriverEngine { client }))
    }
}

struct WebDriverEngine {
    client: Client,
}

#[async_trait]
impl RenderEngine for WebDriverEngine {
    async fn navigate(&mut self, url: &str) -> Result<(), Error> {
        self.client
            .goto(url)
            .await
            .map_err(Error::from)
            .map_err(|e| e.categorize(Category::Navigation))
            .add_context("navigating to target page")
    }

    async fn evaluate(&mut self, script: &str, args: Vec<Value>) -> Result<Value, Error> {
        self.client
            .execute(script, args)
            .await
            .map_err(Error::from)
            .map_err(|e| e.categorize(Category::Injection))
            .add_context("executing script in page context")
    }

    async fn print_to_pdf(&mut self, options: &PrintOptions) -> Result<Vec<u8>, Error> {
        let margin_cm = options.margin_mm / 10.0;
        let size = match options.page {
            PageSize::A4 => PrintSize::A4,
        };
        let configuration = PrintConfigurationBuilder::default()
            .size(size)
            .background(options.background)
            .margins(PrintMargins {
                top: margin_cm,
                left: margin_cm,
                right: margin_cm,
                bottom: margin_cm,
            })
            .build()
            .map_err(Error::from)
            .add_context("configuring print job")?;
        self.client
            .print(configuration)
            .await
            .map_err(Error::from)
            .map_err(|e| e.categorize(Category::Capture))
            .add_context("printing page to pdf")
    }

    async fn close(&mut self) -> Result<(), Error> {
        self.client
            .clone()
            .close()
            .await
            .map_err(Error::from)
            .add_context("closing browser session")
    }
}

/// Starts ChromeDriver as a child process on the given port
///
/// # Returns
/// - [`Child`] if ChromeDriver successfully starts and the port is available
///
/// # Errors
/// - [`Error`] if the chromedriver binary is not in the path, or if the port
/// is not available, or if the chromedriver process fails to start for any
/// other reason
pub fn start_chromedriver(port: u16) -> Result<Child, Error> {
    if is_port_in_use(port) {
        return Err(Error::from(format!("Port {port} is already in use"))
            .categorize(Category::EngineLaunch)
            .add_context("starting chromedriver"));
    }

    let mut child = Command::new("chromedriver")
        .arg(format!("--port={port}"))
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()?;

    for _ in 0..100 {
        if is_port_in_use(port) {
            return Ok(child);
        }

        if child
            .try_wait()
            .map_err(Error::from)
            .add_context("starting chromedriver")?
            .is_some()
        {
            return Err(
                Error::from(String::from("Chromedriver has stopped unexpectedly"))
                    .categorize(Category::EngineLaunch)
                    .add_context("starting chromedriver"),
            )?;
        }

        thread::sleep(Duration::from_millis(10));
    }

    // Double-check port is now in use
    if !is_port_in_use(port) {
        // Kill the child process if it didn't bind to the port
        child.kill()?;
        return Err(
            Error::from(format!("Chromedriver failed to bind to port {port}"))
                .categorize(Category::EngineLaunch)
                .add_context("starting chromedriver"),
        )?;
    }

    Ok(child)
}

/// Check if a given port is currently in use
///
/// # Arguments
/// - `port` The port number to check
///
/// # Returns
/// - `true` if the TCP port is currently on use on the localhost
/// - `false` if the TCP port is not being used on localhost
fn is_port_in_use(port: u16) -> bool {
    TcpListener::bind(format!("localhost:{port}")).is_err()
}
