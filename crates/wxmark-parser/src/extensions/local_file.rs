//! Obsidian embeds: `![[image.png|300x200]]`, `![[icon.svg|24|center]]`,
//! `![[Note]]`, `![[Note#Heading]]` and `![[Note#^block-id]]`
//!
//! Embeds must stand alone on their line. Images are registered with the
//! local image registry for upload, SVG files are inlined and notes are
//! rendered recursively up to `max_embed_depth` levels deep.

use markdown_it::common::utils::escape_html;
use markdown_it::parser::block::{BlockRule, BlockState};
use markdown_it::parser::core::CoreRule;
use markdown_it::parser::extset::MarkdownItExt;
use markdown_it::plugins::cmark::block::blockquote::BlockquoteScanner;
use markdown_it::{MarkdownIt, Node};
use parking_lot::Mutex;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::context::RenderContext;
use crate::error::RenderResult;
use crate::extension::Extension;
use crate::front_matter::strip_front_matter;
use crate::images::ImageInfo;
use crate::settings::EmbedStyle;
use crate::token::WxToken;

const IMAGE_EXTENSIONS: &[&str] = &[".png", ".jpg", ".jpeg", ".gif", ".bmp", ".webp"];
const SVG_POSITIONS: &[&str] = &["left", "center", "right"];

#[derive(Debug, Default)]
struct EmbedState {
    next_id: AtomicUsize,
    /// Notes currently being rendered, outermost first
    stack: Mutex<Vec<PathBuf>>,
}

impl EmbedState {
    fn next_id(&self) -> String {
        format!("fid-{}", self.next_id.fetch_add(1, Ordering::Relaxed))
    }
}

#[derive(Debug, Clone)]
struct EmbedHandle {
    context: RenderContext,
    state: Arc<EmbedState>,
}

impl MarkdownItExt for EmbedHandle {}

pub struct LocalFileExtension {
    context: RenderContext,
    state: Arc<EmbedState>,
}

impl LocalFileExtension {
    pub fn new(context: RenderContext) -> Self {
        Self {
            context,
            state: Arc::new(EmbedState::default()),
        }
    }
}

impl Extension for LocalFileExtension {
    fn name(&self) -> &'static str {
        "local-file"
    }

    fn register(&self, md: &mut MarkdownIt) -> RenderResult<()> {
        md.ext.insert(EmbedHandle {
            context: self.context.clone(),
            state: self.state.clone(),
        });
        md.block
            .add_rule::<EmbedScanner>()
            .before::<BlockquoteScanner>();
        md.add_rule::<ResolveEmbeds>();
        Ok(())
    }

    fn prepare(&self) {
        self.state.next_id.store(0, Ordering::Relaxed);
        self.state.stack.lock().clear();
    }
}

/// `path|WxH` of an image embed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageLink {
    pub path: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

fn is_image(path: &str) -> bool {
    let lower = path.to_lowercase();
    IMAGE_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
}

pub fn parse_image_link(link: &str) -> Option<ImageLink> {
    let mut parts = link.split('|');
    let path = parts.next()?.trim();
    if !is_image(path) {
        return None;
    }

    let (mut width, mut height) = (None, None);
    if let (Some(size), None) = (parts.next(), parts.next()) {
        let size = size.to_lowercase();
        let mut dims = size.split('x');
        width = dims.next().and_then(|w| w.trim().parse().ok());
        height = dims.next().and_then(|h| h.trim().parse().ok());
    }
    Some(ImageLink {
        path: path.to_string(),
        width,
        height,
    })
}

/// `file.svg|size|position` of an SVG embed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SvgLink {
    pub filename: String,
    pub style: String,
    pub class: String,
}

pub fn parse_svg_link(link: &str) -> SvgLink {
    let items: Vec<&str> = link.split('|').map(str::trim).collect();
    let filename = items[0].to_string();

    let (size, position) = match items.as_slice() {
        [_, item] if SVG_POSITIONS.contains(item) => ("", *item),
        [_, item] => (*item, "left"),
        [_, first, second] if SVG_POSITIONS.contains(first) => (*second, *first),
        [_, first, second] => (*first, *second),
        _ => ("", "left"),
    };
    let position = if SVG_POSITIONS.contains(&position) {
        position
    } else {
        "left"
    };

    let style = match size.split_once('x') {
        _ if size.is_empty() => "width:100%;height:100%".to_string(),
        Some((w, h)) => format!("width:{}px;height:{}px;", w, h),
        None => format!("width:{}px;", size),
    };
    SvgLink {
        filename,
        style,
        class: format!("note-embed-svg-{}", position),
    }
}

/// `Note#Heading` or `Note#^block` of a note embed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteLink {
    pub path: String,
    pub heading: Option<String>,
    pub block: Option<String>,
}

pub fn parse_note_link(link: &str) -> NoteLink {
    let info = link.split('|').next().unwrap_or(link);
    let mut items = info.splitn(2, '#');
    let path = items.next().unwrap_or_default().trim().to_string();
    let (mut heading, mut block) = (None, None);
    if let Some(anchor) = items.next().map(str::trim).filter(|a| !a.is_empty()) {
        if anchor.starts_with('^') {
            block = Some(anchor.to_string());
        } else {
            heading = Some(anchor.to_string());
        }
    }
    NoteLink {
        path,
        heading,
        block,
    }
}

fn heading_level(line: &str) -> usize {
    let trimmed = line.trim_start();
    let level = trimmed.chars().take_while(|&c| c == '#').count();
    let after = trimmed[level..].chars().next();
    if (1..=6).contains(&level) && matches!(after, None | Some(' ') | Some('\t')) {
        level
    } else {
        0
    }
}

/// The section under `heading`, up to the next heading of the same or a
/// higher level
pub fn extract_heading_section(content: &str, heading: &str) -> String {
    let wanted = heading.trim();
    let mut lines = content.lines();
    let mut result = String::new();

    let level = loop {
        let Some(line) = lines.next() else {
            return result;
        };
        let level = heading_level(line);
        if level > 0 && line.trim_start()[level..].trim() == wanted {
            result.push_str(line);
            result.push('\n');
            break level;
        }
    };

    for line in lines {
        let current = heading_level(line);
        if current > 0 && current <= level {
            break;
        }
        result.push_str(line);
        result.push('\n');
    }
    result
}

fn is_structured(line: &str) -> bool {
    let trimmed = line.trim_start();
    let numbered = trimmed
        .split_once('.')
        .is_some_and(|(n, _)| !n.is_empty() && n.chars().all(|c| c.is_ascii_digit()));
    trimmed.starts_with('-') || trimmed.starts_with('>') || trimmed.starts_with('|') || numbered
}

/// The block tagged with `^id`, without the marker.
///
/// A marker on a list item, quote line or table row yields just that
/// line; otherwise the whole paragraph around the marker is returned.
pub fn extract_block(content: &str, block: &str) -> String {
    let lines: Vec<&str> = content.lines().collect();
    let Some(index) = lines.iter().position(|l| l.contains(block)) else {
        return String::new();
    };

    let marked = lines[index].replace(block, "").trim_end().to_string();
    if is_structured(lines[index]) {
        return marked.trim().to_string();
    }

    let mut start = index;
    while start > 0 {
        let previous = lines[start - 1];
        if previous.trim().is_empty() || heading_level(previous) > 0 {
            break;
        }
        start -= 1;
    }

    let mut result: Vec<&str> = lines[start..index].to_vec();
    result.push(&marked);
    result.join("\n")
}

fn missing(path: &str) -> String {
    format!(
        "<span class=\"note-embed-missing\">找不到文件：{}</span>",
        escape_html(path)
    )
}

fn render_image(handle: &EmbedHandle, link: &ImageLink) -> String {
    let Some(resource) = handle.context.assets.get_resource_path(&link.path) else {
        warn!(path = %link.path, "embedded image not found");
        return missing(&link.path);
    };

    handle.context.images.set_image(
        &resource.res_url,
        ImageInfo::local(resource.res_url.clone(), resource.file_path.clone()),
    );

    let mut html = format!(
        "<img src=\"{}\" alt=\"{}\"",
        escape_html(&resource.res_url),
        escape_html(&link.path)
    );
    if let Some(width) = link.width {
        html.push_str(&format!(" width=\"{}\"", width));
    }
    if let Some(height) = link.height {
        html.push_str(&format!(" height=\"{}\"", height));
    }
    html.push_str(" />");
    html
}

fn render_svg(handle: &EmbedHandle, target: &str) -> String {
    let link = parse_svg_link(target);
    let svg = handle
        .context
        .assets
        .find_file(&link.filename)
        .and_then(|path| std::fs::read_to_string(path).ok());
    let Some(svg) = svg else {
        warn!(file = %link.filename, "embedded svg not found");
        return missing(&link.filename);
    };

    format!(
        "<span class=\"{}\"><span class=\"note-embed-svg\" id=\"{}\" style=\"{}\">{}</span></span>",
        link.class,
        handle.state.next_id(),
        link.style,
        svg
    )
}

/// A resolved embed: finished markup, or the parsed nodes of a note
enum Resolved {
    Html(String),
    Note {
        id: String,
        quote: bool,
        children: Vec<Node>,
    },
}

fn render_note(handle: &EmbedHandle, md: &MarkdownIt, target: &str) -> Resolved {
    let link = parse_note_link(target);
    if link.path.is_empty() {
        return Resolved::Html(missing(target));
    }

    let (path, content) = match handle.context.assets.read_note(&link.path) {
        Ok(note) => note,
        Err(e) => {
            warn!(path = %link.path, error = %e, "embedded note not found");
            return Resolved::Html(missing(&link.path));
        }
    };

    {
        let stack = handle.state.stack.lock();
        let max_depth = handle.context.settings.max_embed_depth;
        if stack.len() >= max_depth || stack.contains(&path) {
            warn!(path = %path.display(), depth = stack.len(), "embed depth exceeded");
            return Resolved::Html(format!(
                "<span class=\"note-embed-missing\">嵌入层级过深：{}</span>",
                escape_html(&link.path)
            ));
        }
    }

    let body = strip_front_matter(&content);
    let section = match (&link.heading, &link.block) {
        (Some(heading), _) => extract_heading_section(body, heading),
        (None, Some(block)) => extract_block(body, block),
        (None, None) => body.to_string(),
    };

    let id = handle.state.next_id();
    debug!(path = %path.display(), id = %id, "rendering embedded note");

    // numbering passes skip this parse and number the spliced nodes later
    let depth = md.ext.get::<RenderContext>().unwrap_or(&handle.context);
    let mut parsed = {
        let _nested = depth.embeds.enter();
        handle.state.stack.lock().push(path);
        let parsed = md.parse(&section);
        handle.state.stack.lock().pop();
        parsed
    };

    Resolved::Note {
        id,
        quote: handle.context.settings.embed_style == EmbedStyle::Quote,
        children: std::mem::take(&mut parsed.children),
    }
}

struct EmbedScanner;

impl BlockRule for EmbedScanner {
    fn run(state: &mut BlockState) -> Option<(Node, usize)> {
        let line = state.get_line(state.line).trim();
        let target = line.strip_prefix("![[")?.strip_suffix("]]")?;
        if target.is_empty() || target.contains("]]") {
            return None;
        }

        let mut node = Node::new(WxToken::Embed {
            target: target.to_string(),
            html: None,
        });
        node.srcmap = state.get_map(state.line, state.line);
        Some((node, 1))
    }
}

struct ResolveEmbeds;

impl CoreRule for ResolveEmbeds {
    fn run(root: &mut Node, md: &MarkdownIt) {
        let Some(handle) = md.ext.get::<EmbedHandle>() else {
            return;
        };

        root.walk_mut(|node, _| {
            let target = match node.cast::<WxToken>() {
                Some(WxToken::Embed { target, html: None }) => target.clone(),
                _ => return,
            };

            let resolved = if let Some(image) = parse_image_link(&target) {
                Resolved::Html(render_image(handle, &image))
            } else if target.ends_with(".svg") || target.contains(".svg|") {
                Resolved::Html(render_svg(handle, &target))
            } else {
                render_note(handle, md, &target)
            };

            match resolved {
                Resolved::Html(html) => node.replace(WxToken::Embed {
                    target,
                    html: Some(html),
                }),
                Resolved::Note {
                    id,
                    quote,
                    children,
                } => {
                    node.replace(WxToken::NoteEmbed { id, quote });
                    node.children = children;
                }
            }
        });
    }
}
