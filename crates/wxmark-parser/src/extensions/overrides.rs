//! WeChat-specific rendering of built-in Markdown elements
//!
//! Images, lists, list items and thematic breaks are rewritten after all
//! extensions have run, and soft line breaks become hard breaks. This pass
//! is registered last so nothing registered earlier can shadow it.

use markdown_it::parser::core::CoreRule;
use markdown_it::parser::extset::MarkdownItExt;
use markdown_it::plugins::cmark::block::hr::ThematicBreak;
use markdown_it::plugins::cmark::block::list::{BulletList, ListItem, OrderedList};
use markdown_it::plugins::cmark::inline::image::Image;
use markdown_it::plugins::cmark::inline::newline::{Hardbreak, Softbreak};
use markdown_it::{MarkdownIt, Node};
use tracing::warn;

use crate::context::{in_embed, RenderContext};
use crate::images::ImageInfo;
use crate::token::{collect_text, ImageToken, WxToken};

#[derive(Debug, Clone)]
struct OverrideHandle(RenderContext);

impl MarkdownItExt for OverrideHandle {}

/// Install the element overrides. Must run after every extension.
pub fn add_overrides(md: &mut MarkdownIt, context: RenderContext) {
    md.ext.insert(OverrideHandle(context));
    md.add_rule::<ApplyOverrides>();
}

/// Resolve an image URL, registering local files for upload
fn image_src(context: &RenderContext, url: &str) -> String {
    if url.starts_with("http") {
        return url.to_string();
    }

    let decoded = urlencoding::decode(url)
        .map(|d| d.into_owned())
        .unwrap_or_else(|_| url.to_string());
    match context.assets.get_resource_path(&decoded) {
        Some(resource) => {
            context.images.set_image(
                &resource.res_url,
                ImageInfo::local(resource.res_url.clone(), resource.file_path),
            );
            resource.res_url
        }
        None => {
            warn!(path = %decoded, "local image not found");
            url.to_string()
        }
    }
}

struct ApplyOverrides;

impl CoreRule for ApplyOverrides {
    fn run(root: &mut Node, md: &MarkdownIt) {
        if in_embed(md) {
            return;
        }
        let Some(OverrideHandle(context)) = md.ext.get::<OverrideHandle>() else {
            return;
        };
        let figcaption = context.settings.use_figcaption;

        root.walk_mut(|node, _| {
            if node.is::<Softbreak>() {
                node.replace(Hardbreak);
            } else if let Some(image) = node.cast::<Image>() {
                let url = image.url.clone();
                let title = image.title.clone();
                let alt = collect_text(node);
                let src = image_src(context, &url);
                node.children.clear();
                node.replace(WxToken::Image(ImageToken {
                    src,
                    alt,
                    title,
                    figcaption,
                }));
            } else if node.is::<BulletList>() {
                node.replace(WxToken::List {
                    ordered: false,
                    start: None,
                });
            } else if let Some(list) = node.cast::<OrderedList>() {
                let start = Some(list.start);
                node.replace(WxToken::List {
                    ordered: true,
                    start,
                });
            } else if node.is::<ListItem>() {
                node.replace(WxToken::ListItem);
            } else if node.is::<ThematicBreak>() {
                node.replace(WxToken::Rule);
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::AssetManager;
    use crate::settings::RenderSettings;

    fn render_with(input: &str, context: RenderContext) -> String {
        let mut md = MarkdownIt::new();
        markdown_it::plugins::cmark::add(&mut md);
        add_overrides(&mut md, context);
        md.parse(input).render()
    }

    fn render(input: &str) -> String {
        render_with(input, RenderContext::default())
    }

    #[test]
    fn test_soft_breaks_become_hard() {
        assert_eq!(render("a\nb"), "<p>a<br>\nb</p>\n");
    }

    #[test]
    fn test_bullet_list() {
        let html = render("- one\n- two");
        assert!(html.contains("<ul class=\"list-paddingleft-1\">"));
        assert!(html.contains("<li><section><span data-leaf=\"\">"));
        assert!(html.contains("one") && html.contains("two"));
    }

    #[test]
    fn test_ordered_list_start() {
        let html = render("3. three\n4. four");
        assert!(html.contains("<ol start=\"3\" class=\"list-paddingleft-1\">"));

        let html = render("1. one");
        assert!(html.contains("<ol class=\"list-paddingleft-1\">"));
    }

    #[test]
    fn test_horizontal_rule() {
        assert_eq!(render("***"), "<hr>\n");
    }

    #[test]
    fn test_remote_image() {
        let html = render("![Cat](https://example.com/cat.png)");
        assert!(html.contains("<img src=\"https://example.com/cat.png\" alt=\"Cat\">"));
    }

    #[test]
    fn test_local_image_with_figcaption() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("my cat.png"), b"png").unwrap();
        let settings = RenderSettings {
            use_figcaption: true,
            ..Default::default()
        };
        let context = RenderContext::new(settings).with_assets(AssetManager::new().with_vault(dir.path()));

        let html = render_with("![Cat](my%20cat.png)", context.clone());
        assert!(html.contains("<figure><img src=\"file://"));
        assert!(html.contains("my%20cat.png\" alt=\"Cat\"><figcaption>Cat</figcaption></figure>"));
        assert_eq!(context.images.len(), 1);
        assert_eq!(context.images.images()[0].file_path, dir.path().join("my cat.png"));
    }
}
