//! Application driver: one-shot pass or watch loop.

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::page::HtmlPage;
use crate::render::{ClientScriptRenderer, NullRenderer, RecordingRenderer, RenderConfig, Theme};
use crate::selector::Selector;
use crate::transform::{
    BlockTransformer, DEFAULT_CONTAINER_SELECTOR, DEFAULT_SOURCE_SELECTOR, TransformSummary,
};
use crate::watcher::FileWatcher;

/// Owns the input/output paths and options, and runs the pass.
pub struct App {
    input: PathBuf,
    output: Option<PathBuf>,
    in_place: bool,
    watch: bool,
    no_inject: bool,
    dry_run: bool,
    theme: Option<Theme>,
    script_src: Option<String>,
    source_selector: Option<String>,
    container_selector: Option<String>,
    marker_class: Option<String>,
}

impl App {
    /// Create a new application for the given page.
    pub fn new(input: PathBuf) -> Self {
        Self {
            input,
            output: None,
            in_place: false,
            watch: false,
            no_inject: false,
            dry_run: false,
            theme: None,
            script_src: None,
            source_selector: None,
            container_selector: None,
            marker_class: None,
        }
    }

    /// Write the result to a file instead of stdout.
    #[must_use]
    pub fn with_output(mut self, output: Option<PathBuf>) -> Self {
        self.output = output;
        self
    }

    /// Rewrite the input file in place.
    #[must_use]
    pub const fn with_in_place(mut self, enabled: bool) -> Self {
        self.in_place = enabled;
        self
    }

    /// Re-run the pass whenever the input file changes.
    #[must_use]
    pub const fn with_watch(mut self, enabled: bool) -> Self {
        self.watch = enabled;
        self
    }

    /// Only mark the blocks; do not inject the render bootstrap.
    #[must_use]
    pub const fn with_no_inject(mut self, enabled: bool) -> Self {
        self.no_inject = enabled;
        self
    }

    /// Report what would change without writing anything.
    #[must_use]
    pub const fn with_dry_run(mut self, enabled: bool) -> Self {
        self.dry_run = enabled;
        self
    }

    /// Renderer theme passed through to the library configuration.
    #[must_use]
    pub const fn with_theme(mut self, theme: Option<Theme>) -> Self {
        self.theme = theme;
        self
    }

    /// Load the rendering library from a different URL.
    #[must_use]
    pub fn with_script_src(mut self, src: Option<String>) -> Self {
        self.script_src = src;
        self
    }

    /// Override the source block / container selectors.
    #[must_use]
    pub fn with_selectors(mut self, source: Option<String>, container: Option<String>) -> Self {
        self.source_selector = source;
        self.container_selector = container;
        self
    }

    /// Override the marker class on replacement elements.
    #[must_use]
    pub fn with_marker_class(mut self, marker_class: Option<String>) -> Self {
        self.marker_class = marker_class;
        self
    }

    /// Run the configured pass, then keep watching if requested.
    ///
    /// # Errors
    ///
    /// Returns an error for unreadable input, invalid selectors, renderer
    /// failures, or unwritable output.
    pub fn run(&self) -> Result<()> {
        if self.watch && !self.in_place && self.output.is_none() {
            anyhow::bail!("--watch needs --in-place or --output");
        }

        let transformer = self.build_transformer()?;
        self.process(&transformer)?;

        if self.watch {
            self.watch_loop(&transformer)?;
        }
        Ok(())
    }

    fn build_transformer(&self) -> Result<BlockTransformer> {
        let source = self
            .source_selector
            .as_deref()
            .unwrap_or(DEFAULT_SOURCE_SELECTOR);
        let container = self
            .container_selector
            .as_deref()
            .unwrap_or(DEFAULT_CONTAINER_SELECTOR);
        let source = Selector::parse(source)
            .with_context(|| format!("Invalid source selector `{source}`"))?;
        let container = Selector::parse(container)
            .with_context(|| format!("Invalid container selector `{container}`"))?;

        let config = RenderConfig {
            start_on_load: false,
            theme: self.theme,
        };
        let mut transformer = BlockTransformer::new(config).with_selectors(source, container);
        if let Some(marker) = &self.marker_class {
            transformer = transformer
                .with_marker_class(marker)
                .with_context(|| format!("Invalid marker class `{marker}`"))?;
        }
        Ok(transformer)
    }

    fn process(&self, transformer: &BlockTransformer) -> Result<()> {
        let source = fs::read_to_string(&self.input)
            .with_context(|| format!("Failed to read {}", self.input.display()))?;
        let mut page = HtmlPage::parse(&source);

        let summary = if self.dry_run {
            let mut renderer = RecordingRenderer::new();
            transformer.run(&mut page, &mut renderer)?
        } else if self.no_inject {
            let mut renderer = NullRenderer;
            transformer.run(&mut page, &mut renderer)?
        } else {
            let mut renderer = self.client_renderer(transformer);
            transformer.run(&mut page, &mut renderer)?
        };
        tracing::info!(
            matched = summary.matched,
            replaced = summary.replaced,
            skipped = summary.skipped,
            rendered = summary.rendered,
            "processed {}",
            self.input.display()
        );

        if self.dry_run {
            print_summary(&self.input, &summary);
            return Ok(());
        }

        let html = page.to_html();
        match self.destination() {
            Some(path) => fs::write(&path, html)
                .with_context(|| format!("Failed to write {}", path.display()))?,
            None => print!("{html}"),
        }
        Ok(())
    }

    fn client_renderer(&self, transformer: &BlockTransformer) -> ClientScriptRenderer {
        let mut renderer =
            ClientScriptRenderer::new().with_target_selector(transformer.marker_selector().clone());
        if let Some(src) = &self.script_src {
            renderer = renderer.with_script_src(src.clone());
        }
        renderer
    }

    fn destination(&self) -> Option<PathBuf> {
        if self.in_place {
            Some(self.input.clone())
        } else {
            self.output.clone()
        }
    }

    fn watch_loop(&self, transformer: &BlockTransformer) -> Result<()> {
        let mut watcher = FileWatcher::new(&self.input, Duration::from_millis(200))
            .context("Failed to watch input file")?;
        tracing::info!("watching {} for changes", watcher.target_path().display());
        loop {
            std::thread::sleep(Duration::from_millis(250));
            if watcher.take_change_ready() {
                if let Err(err) = self.process(transformer) {
                    tracing::warn!(%err, "reprocessing failed");
                }
            }
        }
    }
}

fn print_summary(input: &std::path::Path, summary: &TransformSummary) {
    println!(
        "{}: {} matched, {} replaced, {} skipped, {} render targets",
        input.display(),
        summary.matched,
        summary.replaced,
        summary.skipped,
        summary.rendered
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const PAGE: &str = concat!(
        "<html><body>",
        "<div class=\"highlight-mermaid notranslate\"><div class=\"highlight\">",
        "<pre>graph TD; A--&gt;B</pre>",
        "</div></div>",
        "</body></html>",
    );

    #[test]
    fn test_run_writes_transformed_output_file() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("page.html");
        let output = dir.path().join("out.html");
        std::fs::write(&input, PAGE).unwrap();

        App::new(input)
            .with_output(Some(output.clone()))
            .run()
            .unwrap();

        let html = std::fs::read_to_string(&output).unwrap();
        assert!(html.contains("<div class=\"mermaid\">graph TD; A--&gt;B</div>"));
        assert!(!html.contains("highlight-mermaid"));
        assert!(html.contains("mermaid.initialize"));
    }

    #[test]
    fn test_in_place_rewrites_input() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("page.html");
        std::fs::write(&input, PAGE).unwrap();

        App::new(input.clone()).with_in_place(true).run().unwrap();

        let html = std::fs::read_to_string(&input).unwrap();
        assert!(html.contains("<div class=\"mermaid\">"));
    }

    #[test]
    fn test_no_inject_skips_bootstrap() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("page.html");
        let output = dir.path().join("out.html");
        std::fs::write(&input, PAGE).unwrap();

        App::new(input)
            .with_output(Some(output.clone()))
            .with_no_inject(true)
            .run()
            .unwrap();

        let html = std::fs::read_to_string(&output).unwrap();
        assert!(html.contains("<div class=\"mermaid\">"));
        assert!(!html.contains("<script"));
    }

    #[test]
    fn test_dry_run_writes_nothing() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("page.html");
        let output = dir.path().join("out.html");
        std::fs::write(&input, PAGE).unwrap();

        App::new(input.clone())
            .with_output(Some(output.clone()))
            .with_dry_run(true)
            .run()
            .unwrap();

        assert!(!output.exists());
        assert_eq!(std::fs::read_to_string(&input).unwrap(), PAGE);
    }

    #[test]
    fn test_invalid_selector_reported() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("page.html");
        std::fs::write(&input, PAGE).unwrap();

        let err = App::new(input)
            .with_selectors(Some("div > pre".to_string()), None)
            .run()
            .unwrap_err();
        assert!(err.to_string().contains("Invalid source selector"));
    }

    #[test]
    fn test_watch_requires_a_destination() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("page.html");
        std::fs::write(&input, PAGE).unwrap();

        let err = App::new(input).with_watch(true).run().unwrap_err();
        assert!(err.to_string().contains("--watch"));
    }

    #[test]
    fn test_missing_input_reported() {
        let err = App::new(PathBuf::from("/nonexistent/page.html"))
            .run()
            .unwrap_err();
        assert!(err.to_string().contains("Failed to read"));
    }
}
