//! Headings with optional hierarchical numbering

use markdown_it::parser::core::CoreRule;
use markdown_it::parser::extset::MarkdownItExt;
use markdown_it::plugins::cmark::block::heading::ATXHeading;
use markdown_it::plugins::cmark::block::lheading::SetextHeader;
use markdown_it::{MarkdownIt, Node};
use parking_lot::Mutex;
use std::sync::Arc;

use crate::context::{in_embed, RenderContext};
use crate::error::RenderResult;
use crate::extension::Extension;
use crate::token::{HeadingToken, WxToken};

/// Deepest level that is counted
pub const COUNTED_LEVELS: usize = 4;

/// Per-level heading counters for the current render
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct HeadingCounter {
    counts: [usize; COUNTED_LEVELS],
}

impl HeadingCounter {
    /// Count a heading and return its number, e.g. `1.2.`
    ///
    /// Deeper counters restart whenever a shallower heading appears.
    pub fn next(&mut self, level: usize) -> Option<String> {
        if level == 0 || level > COUNTED_LEVELS {
            return None;
        }
        self.counts[level - 1] += 1;
        for deeper in &mut self.counts[level..] {
            *deeper = 0;
        }

        let counts = &self.counts[..level];
        let first = counts.iter().position(|&c| c > 0).unwrap_or(0);
        let number: String = counts[first..].iter().map(|c| format!("{}.", c)).collect();
        Some(number)
    }

    pub fn counts(&self) -> [usize; COUNTED_LEVELS] {
        self.counts
    }

    pub fn reset(&mut self) {
        self.counts = [0; COUNTED_LEVELS];
    }
}

#[derive(Debug, Clone)]
struct HeadingHandle {
    context: RenderContext,
    counter: Arc<Mutex<HeadingCounter>>,
}

impl MarkdownItExt for HeadingHandle {}

pub struct HeadingExtension {
    context: RenderContext,
    counter: Arc<Mutex<HeadingCounter>>,
}

impl HeadingExtension {
    pub fn new(context: RenderContext) -> Self {
        Self {
            context,
            counter: Arc::new(Mutex::new(HeadingCounter::default())),
        }
    }

    pub fn counter(&self) -> HeadingCounter {
        self.counter.lock().clone()
    }
}

impl Extension for HeadingExtension {
    fn name(&self) -> &'static str {
        "heading"
    }

    fn register(&self, md: &mut MarkdownIt) -> RenderResult<()> {
        md.ext.insert(HeadingHandle {
            context: self.context.clone(),
            counter: self.counter.clone(),
        });
        md.add_rule::<NumberHeadings>();
        Ok(())
    }

    fn prepare(&self) {
        self.counter.lock().reset();
    }
}

struct NumberHeadings;

impl CoreRule for NumberHeadings {
    fn run(root: &mut Node, md: &MarkdownIt) {
        if in_embed(md) {
            return;
        }
        let Some(handle) = md.ext.get::<HeadingHandle>() else {
            return;
        };
        let show = handle.context.settings.heading_numbers;
        let mut counter = handle.counter.lock();

        root.walk_mut(|node, _| {
            let level = if let Some(h) = node.cast::<ATXHeading>() {
                h.level as usize
            } else if let Some(h) = node.cast::<SetextHeader>() {
                h.level as usize
            } else {
                return;
            };

            let number = counter.next(level).filter(|_| show);
            node.replace(WxToken::Heading(HeadingToken { level, number }));
        });
    }
}
