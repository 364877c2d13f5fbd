//! External links
//!
//! WeChat articles cannot link out, so external links are shown either as
//! `text[href]` or as `text[n]` with a numbered list appended to the
//! article. Links that already show their target and links into WeChat
//! itself stay ordinary anchors.

use markdown_it::common::utils::escape_html;
use markdown_it::parser::core::CoreRule;
use markdown_it::parser::extset::MarkdownItExt;
use markdown_it::plugins::cmark::inline::link::Link;
use markdown_it::{MarkdownIt, Node};
use parking_lot::Mutex;
use std::sync::Arc;

use crate::context::{in_embed, RenderContext};
use crate::error::RenderResult;
use crate::extension::Extension;
use crate::settings::LinkStyle;
use crate::token::{collect_text, LinkMode, LinkToken, WxToken};

const WECHAT_PREFIXES: &[&str] = &["https://mp.weixin.qq.com/mp", "https://mp.weixin.qq.com/s"];

#[derive(Debug, Clone)]
struct LinkHandle {
    context: RenderContext,
    links: Arc<Mutex<Vec<String>>>,
}

impl MarkdownItExt for LinkHandle {}

pub struct LinkExtension {
    context: RenderContext,
    links: Arc<Mutex<Vec<String>>>,
}

impl LinkExtension {
    pub fn new(context: RenderContext) -> Self {
        Self {
            context,
            links: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// External links collected in the last render
    pub fn links(&self) -> Vec<String> {
        self.links.lock().clone()
    }
}

impl Extension for LinkExtension {
    fn name(&self) -> &'static str {
        "link"
    }

    fn register(&self, md: &mut MarkdownIt) -> RenderResult<()> {
        md.ext.insert(LinkHandle {
            context: self.context.clone(),
            links: self.links.clone(),
        });
        md.add_rule::<RewriteLinks>();
        Ok(())
    }

    fn prepare(&self) {
        self.links.lock().clear();
    }

    fn postprocess(&self, html: String, _md: &MarkdownIt) -> String {
        if self.context.settings.link_style != LinkStyle::Footnote {
            return html;
        }
        let links = self.links.lock();
        if links.is_empty() {
            return html;
        }

        let items: String = links
            .iter()
            .map(|href| format!("<li>{}&nbsp;↩</li>", escape_html(href)))
            .collect();
        format!(
            "{}<section class=\"footnotes\"><hr><ol>{}</ol></section>",
            html, items
        )
    }
}

/// Decide how a link is shown. External links are appended to `links`.
fn classify(href: &str, text: &str, style: LinkStyle, links: &mut Vec<String>) -> LinkMode {
    if href.starts_with("mailto:") {
        return LinkMode::TextOnly;
    }
    if text.starts_with(href) || WECHAT_PREFIXES.iter().any(|p| href.starts_with(p)) {
        return LinkMode::Anchor;
    }

    links.push(href.to_string());
    match style {
        LinkStyle::Footnote => LinkMode::Numbered(links.len()),
        LinkStyle::Inline => LinkMode::Inline,
    }
}

struct RewriteLinks;

impl CoreRule for RewriteLinks {
    fn run(root: &mut Node, md: &MarkdownIt) {
        if in_embed(md) {
            return;
        }
        let Some(handle) = md.ext.get::<LinkHandle>() else {
            return;
        };
        let style = handle.context.settings.link_style;
        let mut links = handle.links.lock();

        root.walk_mut(|node, _| {
            let Some(link) = node.cast::<Link>() else {
                return;
            };
            let href = link.url.clone();
            let text = collect_text(node);
            let mode = classify(&href, &text, style, &mut links);
            node.replace(WxToken::Link(LinkToken { href, mode }));
        });
    }
}
