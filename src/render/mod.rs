//! Diagram renderer surface.
//!
//! The rendering library itself is an external collaborator; this module
//! models the slice of its API the transformer consumes — one-time
//! initialization with auto-start disabled, then an explicit render pass over
//! the marked elements. [`ClientScriptRenderer`] is the production
//! implementation for static sites: it injects the library bundle and a
//! bootstrap script so the browser performs the actual drawing, which is
//! exactly how the original documentation pages were wired.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use thiserror::Error;

use crate::page::HtmlPage;
use crate::selector::Selector;
use crate::transform::DocumentTree;

/// The bundle the original deployment loaded from jsDelivr.
pub const DEFAULT_SCRIPT_SRC: &str =
    "https://cdn.jsdelivr.net/npm/mermaid@10/dist/mermaid.min.js";

/// Matches a mermaid library bundle in a script `src`.
static BUNDLE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)mermaid[^/]*\.m?js").expect("valid regex"));

/// Renderer initialization options, serialized camelCase for the library.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderConfig {
    /// Whether the library may scan and render on its own at load time.
    /// Off by default: the transformer controls render timing explicitly.
    pub start_on_load: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme: Option<Theme>,
}

/// Built-in themes of the rendering library.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Default,
    Dark,
    Forest,
    Neutral,
}

/// Error raised by a renderer.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("page has no <body> or <html> element to attach the loader to")]
    NoAttachPoint,
    #[error("renderer configuration could not be encoded: {0}")]
    Config(#[from] serde_json::Error),
}

/// The external rendering surface consumed by the transformer.
pub trait DiagramRenderer<T: DocumentTree> {
    /// One-time configuration; called before any render pass.
    fn initialize(&mut self, config: &RenderConfig);

    /// Render `targets`. `overrides` of `None` means library defaults.
    ///
    /// # Errors
    ///
    /// Implementation-specific; failures abort the pass.
    fn init(
        &mut self,
        overrides: Option<&RenderConfig>,
        targets: &[T::NodeRef],
        page: &mut T,
    ) -> Result<(), RenderError>;
}

/// Production renderer for static sites: injects the library `<script src>`
/// (unless one is already present) and a bootstrap script that initializes
/// the library with auto-start disabled and renders the marked elements on
/// `DOMContentLoaded`.
#[derive(Debug, Clone)]
pub struct ClientScriptRenderer {
    script_src: Option<String>,
    target_selector: Selector,
    config: Option<RenderConfig>,
}

impl ClientScriptRenderer {
    /// Renderer loading the default bundle and targeting `.mermaid`.
    pub fn new() -> Self {
        Self {
            script_src: Some(DEFAULT_SCRIPT_SRC.to_string()),
            target_selector: Selector::for_class("mermaid").expect("default selector parses"),
            config: None,
        }
    }

    /// Load the library from a different URL.
    #[must_use]
    pub fn with_script_src(mut self, src: impl Into<String>) -> Self {
        self.script_src = Some(src.into());
        self
    }

    /// Skip the library `<script src>` tag; only the bootstrap is injected.
    #[must_use]
    pub fn without_script(mut self) -> Self {
        self.script_src = None;
        self
    }

    /// Selector the browser-side render call scans for.
    #[must_use]
    pub fn with_target_selector(mut self, selector: Selector) -> Self {
        self.target_selector = selector;
        self
    }

    fn has_bundle(page: &HtmlPage) -> bool {
        static SCRIPT: Lazy<Selector> =
            Lazy::new(|| Selector::parse("script").expect("valid selector"));
        page.query(&SCRIPT).iter().any(|id| {
            page.element(*id)
                .and_then(|el| el.attr("src"))
                .is_some_and(|src| BUNDLE_RE.is_match(src))
        })
    }
}

impl Default for ClientScriptRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl DiagramRenderer<HtmlPage> for ClientScriptRenderer {
    fn initialize(&mut self, config: &RenderConfig) {
        self.config = Some(config.clone());
    }

    fn init(
        &mut self,
        overrides: Option<&RenderConfig>,
        targets: &[<HtmlPage as DocumentTree>::NodeRef],
        page: &mut HtmlPage,
    ) -> Result<(), RenderError> {
        let attach = page
            .find_element("body")
            .or_else(|| page.find_element("html"))
            .ok_or(RenderError::NoAttachPoint)?;

        if let Some(src) = &self.script_src
            && !Self::has_bundle(page)
        {
            let loader = page.create_element("script", &[("src", src.as_str())]);
            page.append_child(attach, loader);
        }

        let config = overrides
            .cloned()
            .or_else(|| self.config.clone())
            .unwrap_or_default();
        let config_json = serde_json::to_string(&config)?;
        let bootstrap = format!(
            "document.addEventListener(\"DOMContentLoaded\", function () {{\n  \
             mermaid.initialize({config_json});\n  \
             mermaid.init(undefined, document.querySelectorAll(\"{selector}\"));\n\
             }});",
            selector = self.target_selector,
        );
        let script = page.create_element("script", &[]);
        page.append_text(script, &bootstrap);
        page.append_child(attach, script);

        tracing::debug!(targets = targets.len(), "installed client render bootstrap");
        Ok(())
    }
}

/// Marks only; renders nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullRenderer;

impl<T: DocumentTree> DiagramRenderer<T> for NullRenderer {
    fn initialize(&mut self, _config: &RenderConfig) {}

    fn init(
        &mut self,
        _overrides: Option<&RenderConfig>,
        _targets: &[T::NodeRef],
        _page: &mut T,
    ) -> Result<(), RenderError> {
        Ok(())
    }
}

/// One recorded `init` call.
#[derive(Debug, Clone)]
pub struct InitCall {
    pub overrides: Option<RenderConfig>,
    pub target_count: usize,
}

/// Records calls instead of rendering; backs dry runs and the call-count
/// assertions in tests.
#[derive(Debug, Default)]
pub struct RecordingRenderer {
    initialize_calls: Vec<RenderConfig>,
    init_calls: Vec<InitCall>,
    order: Vec<&'static str>,
}

impl RecordingRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configurations passed to `initialize`, in call order.
    pub fn initialize_calls(&self) -> &[RenderConfig] {
        &self.initialize_calls
    }

    /// Recorded `init` calls, in call order.
    pub fn init_calls(&self) -> &[InitCall] {
        &self.init_calls
    }

    /// Interleaved call names, e.g. `["initialize", "init"]`.
    pub fn call_order(&self) -> &[&'static str] {
        &self.order
    }
}

impl<T: DocumentTree> DiagramRenderer<T> for RecordingRenderer {
    fn initialize(&mut self, config: &RenderConfig) {
        self.initialize_calls.push(config.clone());
        self.order.push("initialize");
    }

    fn init(
        &mut self,
        overrides: Option<&RenderConfig>,
        targets: &[T::NodeRef],
        _page: &mut T,
    ) -> Result<(), RenderError> {
        self.init_calls.push(InitCall {
            overrides: overrides.cloned(),
            target_count: targets.len(),
        });
        self.order.push("init");
        Ok(())
    }
}
