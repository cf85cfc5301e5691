//! Structured rich text as delivered by the CMS
//!
//! A rich text field is an ordered list of blocks. Each block carries its
//! plain text and a list of spans (bold, italic, links, labels) addressed by
//! UTF-16 offsets into that text. Rendering escapes every piece of text and
//! only emits attributes that went through [`safe_url`], so the output can be
//! embedded in a page as-is.

use serde::{Deserialize, Serialize};

use crate::helpers::{html_escape, post_path, safe_url};

/// A rich text field
pub type RichText = Vec<RichTextBlock>;

/// One block of rich text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RichTextBlock {
    #[serde(rename = "type")]
    pub kind: BlockKind,

    #[serde(default)]
    pub text: String,

    #[serde(default)]
    pub spans: Vec<Span>,

    /// Image source, for image blocks
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Image alternative text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oembed: Option<Embed>,
}

impl RichTextBlock {
    /// A plain block of the given kind
    pub fn new(kind: BlockKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
            spans: Vec::new(),
            url: None,
            alt: None,
            oembed: None,
        }
    }

    /// A plain paragraph
    pub fn paragraph(text: impl Into<String>) -> Self {
        Self::new(BlockKind::Paragraph, text)
    }

    /// Attach a span to the block
    pub fn with_span(mut self, span: Span) -> Self {
        self.spans.push(span);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BlockKind {
    Paragraph,
    Heading1,
    Heading2,
    Heading3,
    Heading4,
    Heading5,
    Heading6,
    Preformatted,
    ListItem,
    OListItem,
    Image,
    Embed,
    #[serde(other)]
    Unknown,
}

impl BlockKind {
    /// Element wrapping a text block, `None` for non-text blocks
    fn tag(self) -> Option<&'static str> {
        match self {
            BlockKind::Paragraph => Some("p"),
            BlockKind::Heading1 => Some("h1"),
            BlockKind::Heading2 => Some("h2"),
            BlockKind::Heading3 => Some("h3"),
            BlockKind::Heading4 => Some("h4"),
            BlockKind::Heading5 => Some("h5"),
            BlockKind::Heading6 => Some("h6"),
            BlockKind::Preformatted => Some("pre"),
            BlockKind::ListItem | BlockKind::OListItem => Some("li"),
            BlockKind::Image | BlockKind::Embed | BlockKind::Unknown => None,
        }
    }

    /// List element grouping consecutive items of this kind
    fn list_tag(self) -> Option<&'static str> {
        match self {
            BlockKind::ListItem => Some("ul"),
            BlockKind::OListItem => Some("ol"),
            _ => None,
        }
    }
}

/// Inline formatting over a range of a block's text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Span {
    /// UTF-16 offset where the span starts
    pub start: usize,
    /// UTF-16 offset where the span ends (exclusive)
    pub end: usize,
    #[serde(rename = "type")]
    pub kind: SpanKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<SpanData>,
}

impl Span {
    pub fn new(start: usize, end: usize, kind: SpanKind) -> Self {
        Self {
            start,
            end,
            kind,
            data: None,
        }
    }

    /// A hyperlink span pointing at a web URL
    pub fn link(start: usize, end: usize, url: impl Into<String>) -> Self {
        Self {
            start,
            end,
            kind: SpanKind::Hyperlink,
            data: Some(SpanData {
                url: Some(url.into()),
                ..SpanData::default()
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SpanKind {
    Strong,
    Em,
    Hyperlink,
    Label,
    #[serde(other)]
    Unknown,
}

/// Extra data for hyperlink and label spans
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpanData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Uid of the target document for links between documents
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

/// oEmbed payload of an embed block
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Embed {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embed_url: Option<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

/// Plain text of a rich text field, blocks joined by a single space
pub fn as_text(blocks: &[RichTextBlock]) -> String {
    blocks
        .iter()
        .map(|block| block.text.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Render a rich text field to HTML for a site served from `/`
pub fn as_html(blocks: &[RichTextBlock]) -> String {
    as_html_with_root(blocks, "/")
}

/// Render a rich text field to HTML, resolving document links under `root`
pub fn as_html_with_root(blocks: &[RichTextBlock], root: &str) -> String {
    let mut html = String::new();
    let mut open_list: Option<&'static str> = None;

    for block in blocks {
        let list_tag = block.kind.list_tag();
        if open_list != list_tag {
            if let Some(tag) = open_list {
                html.push_str(&format!("</{}>", tag));
            }
            if let Some(tag) = list_tag {
                html.push_str(&format!("<{}>", tag));
            }
            open_list = list_tag;
        }

        match block.kind {
            BlockKind::Image => html.push_str(&render_image(block)),
            BlockKind::Embed => html.push_str(&render_embed(block)),
            BlockKind::Unknown => {
                tracing::debug!("Skipping unsupported rich text block");
            }
            kind => {
                if let Some(tag) = kind.tag() {
                    html.push_str(&format!(
                        "<{tag}>{}</{tag}>",
                        render_spans(&block.text, &block.spans, root)
                    ));
                }
            }
        }
    }

    if let Some(tag) = open_list {
        html.push_str(&format!("</{}>", tag));
    }

    html
}

fn render_image(block: &RichTextBlock) -> String {
    match block.url.as_deref().and_then(safe_url) {
        Some(src) => format!(
            r#"<p class="block-img"><img src="{}" alt="{}" /></p>"#,
            html_escape(src),
            html_escape(block.alt.as_deref().unwrap_or(""))
        ),
        None => String::new(),
    }
}

fn render_embed(block: &RichTextBlock) -> String {
    let Some(embed) = &block.oembed else {
        return String::new();
    };
    let Some(url) = embed.embed_url.as_deref().and_then(safe_url) else {
        return String::new();
    };

    let url = html_escape(url);
    let title = embed
        .title
        .as_deref()
        .map(html_escape)
        .unwrap_or_else(|| url.clone());
    format!(
        r#"<div data-oembed="{url}" data-oembed-type="{}"><a href="{url}" target="_blank" rel="noopener noreferrer">{title}</a></div>"#,
        html_escape(embed.kind.as_deref().unwrap_or("embed")),
    )
}

/// Opening and closing markup of a span, `None` when it renders as plain text
fn span_tags(span: &Span, root: &str) -> Option<(String, &'static str)> {
    match span.kind {
        SpanKind::Strong => Some(("<strong>".to_string(), "</strong>")),
        SpanKind::Em => Some(("<em>".to_string(), "</em>")),
        SpanKind::Hyperlink => {
            let data = span.data.as_ref()?;
            let href = match (&data.url, &data.uid) {
                (Some(url), _) => safe_url(url)?.to_string(),
                (None, Some(uid)) => post_path(root, uid),
                (None, None) => return None,
            };
            let target = if data.target.as_deref() == Some("_blank") {
                r#" target="_blank" rel="noopener noreferrer""#
            } else {
                ""
            };
            Some((
                format!(r#"<a href="{}"{}>"#, html_escape(&href), target),
                "</a>",
            ))
        }
        SpanKind::Label => {
            let label = span.data.as_ref()?.label.as_deref()?;
            Some((format!(r#"<span class="{}">"#, html_escape(label)), "</span>"))
        }
        SpanKind::Unknown => None,
    }
}

/// Byte index of a UTF-16 offset, clamped to the end of the text
fn byte_index(text: &str, utf16_offset: usize) -> usize {
    let mut units = 0;
    for (index, c) in text.char_indices() {
        if units >= utf16_offset {
            return index;
        }
        units += c.len_utf16();
    }
    text.len()
}

fn escape_text(text: &str) -> String {
    html_escape(text).replace('\n', "<br />")
}

/// A span resolved to byte offsets and markup
struct Marked {
    start: usize,
    end: usize,
    open: String,
    close: &'static str,
}

/// Render block text with its spans as properly nested markup
///
/// The text is cut at every span boundary. For each piece the set of
/// covering spans is computed; spans are reopened as needed so overlapping
/// ranges still produce well-formed HTML.
fn render_spans(text: &str, spans: &[Span], root: &str) -> String {
    let spans: Vec<Marked> = spans
        .iter()
        .filter_map(|span| {
            let start = byte_index(text, span.start);
            let end = byte_index(text, span.end);
            if start >= end {
                return None;
            }
            span_tags(span, root).map(|(open, close)| Marked {
                start,
                end,
                open,
                close,
            })
        })
        .collect();

    if spans.is_empty() {
        return escape_text(text);
    }

    let mut boundaries: Vec<usize> = vec![0, text.len()];
    for span in &spans {
        boundaries.push(span.start);
        boundaries.push(span.end);
    }
    boundaries.sort_unstable();
    boundaries.dedup();

    // Outer spans first: earlier start, then longer range
    let mut order: Vec<usize> = (0..spans.len()).collect();
    order.sort_by(|&a, &b| {
        spans[a]
            .start
            .cmp(&spans[b].start)
            .then(spans[b].end.cmp(&spans[a].end))
    });

    let mut html = String::with_capacity(text.len() * 2);
    let mut stack: Vec<usize> = Vec::new();

    for window in boundaries.windows(2) {
        let (from, to) = (window[0], window[1]);
        let active: Vec<usize> = order
            .iter()
            .copied()
            .filter(|&i| spans[i].start <= from && spans[i].end >= to)
            .collect();

        let common = stack
            .iter()
            .zip(active.iter())
            .take_while(|(a, b)| a == b)
            .count();
        while stack.len() > common {
            if let Some(i) = stack.pop() {
                html.push_str(spans[i].close);
            }
        }
        for &i in &active[common..] {
            html.push_str(&spans[i].open);
            stack.push(i);
        }

        html.push_str(&escape_text(&text[from..to]));
    }

    while let Some(i) = stack.pop() {
        html.push_str(spans[i].close);
    }

    html
}
