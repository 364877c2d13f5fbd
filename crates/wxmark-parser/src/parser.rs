//! The rendering orchestrator

use markdown_it::MarkdownIt;
use std::path::Path;
use tracing::{debug, info};

use crate::context::RenderContext;
use crate::error::{RenderError, RenderResult};
use crate::extension::Extension;
use crate::extensions::default_extensions;
use crate::extensions::overrides::add_overrides;
use crate::front_matter::strip_front_matter;

/// Default limit for [`WxParser::render_file`]
pub const DEFAULT_MAX_FILE_SIZE: usize = 10 * 1024 * 1024;

/// Renders Markdown into WeChat article HTML through a chain of extensions.
///
/// The engine is built on first use. Rendering takes `&mut self`, so one
/// parser never runs two renders at once; use one parser per concurrent
/// render.
pub struct WxParser {
    context: RenderContext,
    extensions: Vec<Box<dyn Extension>>,
    engine: Option<MarkdownIt>,
    max_file_size: usize,
}

impl WxParser {
    /// Parser with the standard extension chain
    pub fn new(context: RenderContext) -> Self {
        let extensions = default_extensions(&context);
        Self::with_extensions(context, extensions)
    }

    /// Parser with a custom extension chain, registered in the given order
    pub fn with_extensions(context: RenderContext, extensions: Vec<Box<dyn Extension>>) -> Self {
        Self {
            context,
            extensions,
            engine: None,
            max_file_size: DEFAULT_MAX_FILE_SIZE,
        }
    }

    pub fn with_max_file_size(mut self, max: usize) -> Self {
        self.max_file_size = max;
        self
    }

    pub fn context(&self) -> &RenderContext {
        &self.context
    }

    /// Names of the registered extensions, in order
    pub fn extension_names(&self) -> Vec<&'static str> {
        self.extensions.iter().map(|e| e.name()).collect()
    }

    fn build_engine(&self) -> RenderResult<MarkdownIt> {
        let mut md = MarkdownIt::new();
        markdown_it::plugins::cmark::add(&mut md);
        markdown_it::plugins::html::add(&mut md);
        markdown_it::plugins::extra::tables::add(&mut md);
        markdown_it::plugins::extra::strikethrough::add(&mut md);
        md.ext.insert(self.context.clone());

        for extension in &self.extensions {
            extension.register(&mut md)?;
            debug!(extension = extension.name(), "registered extension");
        }
        self.prepare();
        add_overrides(&mut md, self.context.clone());

        info!(extensions = self.extensions.len(), "markdown engine ready");
        Ok(md)
    }

    /// Reset every extension's per-render state
    pub fn prepare(&self) {
        for extension in &self.extensions {
            extension.prepare();
        }
    }

    /// Run every extension's postprocess hook, in registration order
    pub fn postprocess(&self, html: String, md: &MarkdownIt) -> String {
        self.extensions
            .iter()
            .fold(html, |html, extension| extension.postprocess(html, md))
    }

    /// Render Markdown source to HTML
    pub fn parse(&mut self, content: &str) -> RenderResult<String> {
        let md = match self.engine.take() {
            Some(md) => md,
            None => self.build_engine()?,
        };

        self.prepare();
        let html = md.parse(content).render();
        let html = self.postprocess(html, &md);

        self.engine = Some(md);
        Ok(html)
    }

    /// Render a note file, skipping its front matter
    pub async fn render_file(&mut self, path: impl AsRef<Path>) -> RenderResult<String> {
        let path = path.as_ref();
        let size = tokio::fs::metadata(path).await?.len() as usize;
        if size > self.max_file_size {
            return Err(RenderError::FileTooLarge {
                size,
                max: self.max_file_size,
            });
        }

        let content = tokio::fs::read_to_string(path).await?;
        debug!(path = %path.display(), size, "rendering file");
        self.parse(strip_front_matter(&content))
    }

    /// Give every extension a chance to finish before publishing
    pub fn before_publish(&self) {
        for extension in &self.extensions {
            extension.before_publish();
        }
    }

    /// Release per-session state held by the extensions
    pub fn cleanup(&self) {
        for extension in &self.extensions {
            extension.cleanup();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extensions::{FootnoteExtension, MathExtension, TopicExtension};
    use crate::settings::RenderSettings;
    use markdown_it::parser::inline::{InlineRule, InlineState};
    use markdown_it::{Node, NodeValue, Renderer};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Claims `#word` as literal code, competing with topics
    #[derive(Debug)]
    struct Hashcode;

    impl NodeValue for Hashcode {
        fn render(&self, node: &Node, fmt: &mut dyn Renderer) {
            fmt.open("code", &[]);
            fmt.contents(&node.children);
            fmt.close("code");
        }
    }

    struct HashcodeScanner;

    impl InlineRule for HashcodeScanner {
        const MARKER: char = '#';

        fn run(state: &mut InlineState) -> Option<(Node, usize)> {
            let input = &state.src[state.pos..state.pos_max];
            let len = input.find(char::is_whitespace).unwrap_or(input.len());
            if len < 2 {
                return None;
            }
            let mut node = Node::new(Hashcode);
            node.children.push(Node::new(markdown_it::parser::inline::Text {
                content: input[..len].to_string(),
            }));
            Some((node, len))
        }
    }

    struct HashcodeExtension;

    impl Extension for HashcodeExtension {
        fn name(&self) -> &'static str {
            "hashcode"
        }

        fn register(&self, md: &mut MarkdownIt) -> RenderResult<()> {
            md.inline.add_rule::<HashcodeScanner>();
            Ok(())
        }
    }

    struct Refusing;

    impl Extension for Refusing {
        fn name(&self) -> &'static str {
            "refusing"
        }

        fn register(&self, _md: &mut MarkdownIt) -> RenderResult<()> {
            Err(RenderError::Registration {
                extension: "refusing",
                reason: "not today".to_string(),
            })
        }
    }

    struct Counting {
        prepared: Arc<AtomicUsize>,
    }

    impl Extension for Counting {
        fn name(&self) -> &'static str {
            "counting"
        }

        fn register(&self, _md: &mut MarkdownIt) -> RenderResult<()> {
            Ok(())
        }

        fn prepare(&self) {
            self.prepared.fetch_add(1, Ordering::SeqCst);
        }

        fn postprocess(&self, html: String, _md: &MarkdownIt) -> String {
            format!("{}<!-- counted -->", html)
        }
    }

    #[test]
    fn test_default_chain_order() {
        let parser = WxParser::new(RenderContext::default());
        assert_eq!(
            parser.extension_names(),
            vec![
                "local-file",
                "blockquote",
                "block-mark",
                "svg-icon",
                "footnote",
                "link",
                "highlight",
                "code",
                "comment",
                "topic",
                "heading",
                "math"
            ]
        );
    }

    #[test]
    fn test_empty_line_only_when_enabled() {
        let settings = RenderSettings {
            enable_empty_line: true,
            ..Default::default()
        };
        let parser = WxParser::new(RenderContext::new(settings));
        let names = parser.extension_names();
        assert_eq!(names[names.len() - 2], "empty-line");
    }

    #[test]
    fn test_registration_order_decides_conflicts() {
        let context = RenderContext::default();

        let mut topic_first = WxParser::with_extensions(
            context.clone(),
            vec![Box::new(TopicExtension), Box::new(HashcodeExtension)],
        );
        let html = topic_first.parse("see #rust").unwrap();
        assert!(html.contains("wx_topic_link"));

        let mut code_first = WxParser::with_extensions(
            context,
            vec![Box::new(HashcodeExtension), Box::new(TopicExtension)],
        );
        let html = code_first.parse("see #rust").unwrap();
        assert!(html.contains("<code>#rust</code>"));
    }

    #[test]
    fn test_order_irrelevant_without_overlap() {
        let input = "Mass $m$ here[^1].\n\n[^1]: Source";

        let mut a = WxParser::with_extensions(
            RenderContext::default(),
            vec![
                Box::new(FootnoteExtension::new()),
                Box::new(MathExtension::new(RenderContext::default())),
            ],
        );
        let mut b = WxParser::with_extensions(
            RenderContext::default(),
            vec![
                Box::new(MathExtension::new(RenderContext::default())),
                Box::new(FootnoteExtension::new()),
            ],
        );
        assert_eq!(a.parse(input).unwrap(), b.parse(input).unwrap());
    }

    #[test]
    fn test_registration_failure_surfaces() {
        let mut parser = WxParser::with_extensions(RenderContext::default(), vec![Box::new(Refusing)]);
        let err = parser.parse("text").unwrap_err();
        assert!(matches!(err, RenderError::Registration { extension: "refusing", .. }));
    }

    #[test]
    fn test_prepare_at_build_and_every_render() {
        let prepared = Arc::new(AtomicUsize::new(0));
        let mut parser = WxParser::with_extensions(
            RenderContext::default(),
            vec![Box::new(Counting {
                prepared: prepared.clone(),
            })],
        );

        let html = parser.parse("one").unwrap();
        assert!(html.ends_with("<!-- counted -->"));
        assert_eq!(prepared.load(Ordering::SeqCst), 2);
        parser.parse("two").unwrap();
        assert_eq!(prepared.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_render_file_strips_front_matter() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("post.md");
        std::fs::write(&path, "---\ntitle: Post\n---\n# Hello\n").unwrap();

        let mut parser = WxParser::new(RenderContext::default());
        let html = parser.render_file(&path).await.unwrap();
        assert_eq!(html, "<h1>Hello</h1>\n");
    }

    #[tokio::test]
    async fn test_render_file_size_limit() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("big.md");
        std::fs::write(&path, "x".repeat(64)).unwrap();

        let mut parser = WxParser::new(RenderContext::default()).with_max_file_size(16);
        let err = parser.render_file(&path).await.unwrap_err();
        assert!(matches!(err, RenderError::FileTooLarge { size: 64, max: 16 }));
    }
}
