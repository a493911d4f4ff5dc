//! The block transformation pass.
//!
//! [`BlockTransformer`] finds statically rendered diagram source blocks,
//! replaces each block's styled container with a bare marked element holding
//! the same text, and then hands the full set of marked elements to a
//! [`DiagramRenderer`](crate::render::DiagramRenderer). It is generic over
//! [`DocumentTree`] so the pass runs identically against a real page and a
//! fake tree in tests.

use crate::render::{DiagramRenderer, RenderConfig, RenderError};
use crate::selector::{Selector, SelectorError};

/// Default selector for source blocks (Sphinx highlight output).
pub const DEFAULT_SOURCE_SELECTOR: &str = ".highlight-mermaid pre";
/// Default selector for the styled container to replace.
pub const DEFAULT_CONTAINER_SELECTOR: &str = ".highlight-mermaid";
/// Default class carried by replacement elements, consumed by the renderer.
pub const DEFAULT_MARKER_CLASS: &str = "mermaid";

/// Tree-manipulation interface the transformer works against.
///
/// The document is injected rather than global so the pass can run headlessly;
/// `query` must return matches in document order, and `text_of` must return
/// text verbatim — diagram syntax is whitespace-sensitive.
pub trait DocumentTree {
    /// Cheap node handle, stable across mutations.
    type NodeRef: Copy + PartialEq;

    /// All nodes matching `selector`, in document order.
    fn query(&self, selector: &Selector) -> Vec<Self::NodeRef>;

    /// Full text content of `node`, unmodified.
    fn text_of(&self, node: Self::NodeRef) -> String;

    /// Nearest ancestor of `node` matching `selector`, or `None`.
    fn nearest_ancestor(&self, node: Self::NodeRef, selector: &Selector)
    -> Option<Self::NodeRef>;

    /// Create a detached element carrying `marker_class` and `text`.
    fn create_marked(&mut self, marker_class: &str, text: &str) -> Self::NodeRef;

    /// Swap `replacement` into `old`'s tree position. Returns `false` without
    /// side effects when `old` has no parent.
    fn replace(&mut self, old: Self::NodeRef, replacement: Self::NodeRef) -> bool;
}

/// Counters describing one pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransformSummary {
    /// Source blocks matched by the source selector.
    pub matched: usize,
    /// Containers replaced with marked elements.
    pub replaced: usize,
    /// Blocks skipped (no container, or container already detached).
    pub skipped: usize,
    /// Marked elements handed to the renderer, from the fresh query.
    pub rendered: usize,
}

/// One-shot converter of source blocks into render targets.
#[derive(Debug, Clone)]
pub struct BlockTransformer {
    source_selector: Selector,
    container_selector: Selector,
    marker_class: String,
    marker_selector: Selector,
    config: RenderConfig,
}

impl BlockTransformer {
    /// Transformer with the default selectors and marker class.
    pub fn new(config: RenderConfig) -> Self {
        Self {
            source_selector: Selector::parse(DEFAULT_SOURCE_SELECTOR)
                .expect("default selector parses"),
            container_selector: Selector::parse(DEFAULT_CONTAINER_SELECTOR)
                .expect("default selector parses"),
            marker_class: DEFAULT_MARKER_CLASS.to_string(),
            marker_selector: Selector::for_class(DEFAULT_MARKER_CLASS)
                .expect("default marker class parses"),
            config,
        }
    }

    /// Override the source and container selectors.
    #[must_use]
    pub fn with_selectors(mut self, source: Selector, container: Selector) -> Self {
        self.source_selector = source;
        self.container_selector = container;
        self
    }

    /// Override the marker class assigned to replacement elements.
    ///
    /// # Errors
    ///
    /// Returns an error if `marker_class` is not a plain class token.
    pub fn with_marker_class(mut self, marker_class: &str) -> Result<Self, SelectorError> {
        self.marker_selector = Selector::for_class(marker_class)?;
        self.marker_class = marker_class.to_string();
        Ok(self)
    }

    /// The marker class assigned to replacement elements.
    pub fn marker_class(&self) -> &str {
        &self.marker_class
    }

    /// Selector matching the marker class, used for the phase-two query.
    pub const fn marker_selector(&self) -> &Selector {
        &self.marker_selector
    }

    /// Run the two-phase pass: transform every matched block, then initialize
    /// the renderer (auto-start stays off) and render a fresh query of marked
    /// elements.
    ///
    /// Blocks without a reachable container are skipped silently and do not
    /// stop the pass; the renderer sees whatever marked elements exist in the
    /// mutated document, including any present before the pass.
    ///
    /// # Errors
    ///
    /// Propagates renderer failures; the transformation phase itself cannot
    /// fail.
    pub fn run<T, R>(&self, page: &mut T, renderer: &mut R) -> Result<TransformSummary, RenderError>
    where
        T: DocumentTree,
        R: DiagramRenderer<T> + ?Sized,
    {
        let sources = page.query(&self.source_selector);
        let mut summary = TransformSummary {
            matched: sources.len(),
            ..TransformSummary::default()
        };

        for block in sources {
            let text = page.text_of(block);
            let Some(container) = page.nearest_ancestor(block, &self.container_selector) else {
                summary.skipped += 1;
                continue;
            };
            let marked = page.create_marked(&self.marker_class, &text);
            if page.replace(container, marked) {
                summary.replaced += 1;
            } else {
                summary.skipped += 1;
            }
        }

        renderer.initialize(&self.config);
        let targets = page.query(&self.marker_selector);
        summary.rendered = targets.len();
        renderer.init(None, &targets, page)?;
        Ok(summary)
    }
}

impl Default for BlockTransformer {
    fn default() -> Self {
        Self::new(RenderConfig::default())
    }
}
