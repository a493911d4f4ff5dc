use merganser::page::HtmlPage;
use merganser::render::{ClientScriptRenderer, NullRenderer, RecordingRenderer};
use merganser::selector::Selector;
use merganser::transform::BlockTransformer;

use proptest::prelude::*;

/// A page shaped like Sphinx book-theme output.
fn sphinx_page(blocks: &[String]) -> String {
    let mut body = String::new();
    for block in blocks {
        body.push_str(&format!(
            "<div class=\"highlight-mermaid notranslate\">\
             <div class=\"highlight\"><pre><span></span>{block}</pre></div>\
             </div>",
        ));
    }
    format!(
        "<!DOCTYPE html><html><head><title>Docs</title></head>\
         <body><main>{body}</main></body></html>"
    )
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn marker() -> Selector {
    Selector::for_class("mermaid").unwrap()
}

#[test]
fn test_spec_scenario_end_to_end() {
    let source = sphinx_page(&[escape("graph TD; A-->B"), escape("graph TD; C-->D")]);
    let mut page = HtmlPage::parse(&source);
    let mut renderer = RecordingRenderer::new();
    let summary = BlockTransformer::default()
        .run(&mut page, &mut renderer)
        .unwrap();

    assert_eq!(summary.matched, 2);
    assert_eq!(summary.replaced, 2);
    assert_eq!(summary.rendered, 2);

    let targets = page.query(&marker());
    assert_eq!(targets.len(), 2);
    assert_eq!(page.text_content(targets[0]), "graph TD; A-->B");
    assert_eq!(page.text_content(targets[1]), "graph TD; C-->D");
    assert!(
        page.query(&Selector::parse(".highlight-mermaid").unwrap())
            .is_empty()
    );
    assert_eq!(renderer.init_calls().len(), 1);
    assert_eq!(renderer.init_calls()[0].target_count, 2);
}

#[test]
fn test_full_pipeline_with_client_renderer() {
    let source = sphinx_page(&[escape("sequenceDiagram\n    Alice->>Bob: Hello")]);
    let mut page = HtmlPage::parse(&source);
    let mut renderer = ClientScriptRenderer::new();
    BlockTransformer::default()
        .run(&mut page, &mut renderer)
        .unwrap();

    let html = page.to_html();
    assert!(html.contains("<div class=\"mermaid\">"));
    assert!(html.contains("mermaid.initialize({\"startOnLoad\":false})"));
    assert!(html.contains("document.querySelectorAll(\".mermaid\")"));
    assert!(html.contains("cdn.jsdelivr.net/npm/mermaid@10"));

    // The written page still holds the diagram source verbatim.
    let reparsed = HtmlPage::parse(&html);
    let targets = reparsed.query(&marker());
    assert_eq!(targets.len(), 1);
    assert_eq!(
        reparsed.text_content(targets[0]),
        "sequenceDiagram\n    Alice->>Bob: Hello"
    );
}

#[test]
fn test_page_without_blocks_gets_bootstrap_but_no_mutation() {
    let source = "<!DOCTYPE html><html><body><p>no diagrams here</p></body></html>";
    let mut page = HtmlPage::parse(source);
    let mut renderer = ClientScriptRenderer::new();
    let summary = BlockTransformer::default()
        .run(&mut page, &mut renderer)
        .unwrap();

    assert_eq!(summary.matched, 0);
    assert_eq!(summary.rendered, 0);
    let html = page.to_html();
    assert!(html.contains("<p>no diagrams here</p>"));
    assert!(html.contains("mermaid.initialize"));
}

#[test]
fn test_unwrapped_block_survives_untouched() {
    // One proper block, one pre outside any container.
    let source = "<html><body>\
                  <div class=\"highlight-mermaid\"><pre>graph TD; A--&gt;B</pre></div>\
                  <div class=\"highlight\"><pre>graph TD; X--&gt;Y</pre></div>\
                  </body></html>";
    let transformer = BlockTransformer::default().with_selectors(
        Selector::parse("pre").unwrap(),
        Selector::parse(".highlight-mermaid").unwrap(),
    );
    let mut page = HtmlPage::parse(source);
    let mut renderer = NullRenderer;
    let summary = transformer.run(&mut page, &mut renderer).unwrap();

    assert_eq!(summary.matched, 2);
    assert_eq!(summary.replaced, 1);
    assert_eq!(summary.skipped, 1);

    let html = page.to_html();
    assert!(html.contains("<div class=\"mermaid\">graph TD; A--&gt;B</div>"));
    assert!(html.contains("<div class=\"highlight\"><pre>graph TD; X--&gt;Y</pre></div>"));
}

proptest! {
    /// Block text rides through parse, transform, and serialize unchanged.
    #[test]
    fn prop_block_text_preserved_byte_for_byte(text in "[ -~\n\t]{0,200}") {
        let source = sphinx_page(&[escape(&text)]);
        let mut page = HtmlPage::parse(&source);
        let mut renderer = NullRenderer;
        BlockTransformer::default().run(&mut page, &mut renderer).unwrap();

        let targets = page.query(&Selector::for_class("mermaid").unwrap());
        prop_assert_eq!(targets.len(), 1);
        prop_assert_eq!(page.text_content(targets[0]), text.clone());

        let reparsed = HtmlPage::parse(&page.to_html());
        let targets = reparsed.query(&Selector::for_class("mermaid").unwrap());
        prop_assert_eq!(reparsed.text_content(targets[0]), text);
    }
}
