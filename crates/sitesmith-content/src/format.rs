//! Block formatter for editor-authored text fields.
//!
//! Text is split into paragraph blocks on blank lines. Each block is either
//! passed through as HTML, turned into a YouTube or image embed, or wrapped
//! in a paragraph with `<br>` line breaks.

use std::sync::LazyLock;

use regex::Regex;

static HTML_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^<(?:p|div|h[1-6]|ul|ol|li|blockquote|hr|table|pre)(?:[\s>/]|$)")
        .expect("html block pattern is valid")
});

static YOUTUBE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^https?://(?:www\.|m\.)?(?:youtu\.be/|youtube\.com/(?:embed/|v/|shorts/|watch\?v=|watch\?\S*?&v=))([A-Za-z0-9_-]{11})(?:[^A-Za-z0-9_\n-][^\n]*)?$",
    )
    .expect("youtube pattern is valid")
});

static IMAGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)^https?://[^<>"'\s]+\.(?:jpg|jpeg|png|gif|webp|svg)$"#)
        .expect("image pattern is valid")
});

static PARAGRAPH_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{2,}").expect("paragraph break pattern is valid"));

/// Classification of a single trimmed text block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block<'a> {
    /// Already starts with a block-level HTML tag.
    Html(&'a str),
    /// A YouTube link; holds the 11-character video id.
    YouTube(&'a str),
    /// A bare image URL.
    Image(&'a str),
    /// Anything else.
    Text(&'a str),
}

impl Block<'_> {
    /// Render the block to HTML.
    pub fn to_html(&self) -> String {
        match self {
            Block::Html(html) => (*html).to_string(),
            Block::YouTube(id) => format!(
                concat!(
                    r#"<div class="embedded-video" style="position: relative; padding-bottom: 56.25%; height: 0; overflow: hidden; max-width: 100%; margin: 1.5em 0;">"#,
                    r#"<iframe style="position: absolute; top: 0; left: 0; width: 100%; height: 100%;" src="https://www.youtube.com/embed/{}" title="YouTube video player" frameborder="0" "#,
                    r#"allow="accelerometer; autoplay; clipboard-write; encrypted-media; gyroscope; picture-in-picture" allowfullscreen></iframe></div>"#
                ),
                id
            ),
            Block::Image(url) => format!(
                r#"<p class="embedded-image"><img src="{}" alt="Embedded content" loading="lazy" style="max-width: 100%; height: auto; display: block; margin: 0 auto;" /></p>"#,
                url
            ),
            Block::Text(text) => format!("<p>{}</p>", text.replace('\n', "<br>")),
        }
    }
}

/// Classify a trimmed block. HTML wins over YouTube, YouTube over images.
pub fn classify_block(block: &str) -> Block<'_> {
    if HTML_BLOCK.is_match(block) {
        return Block::Html(block);
    }

    if let Some(id) = YOUTUBE.captures(block).and_then(|c| c.get(1)) {
        return Block::YouTube(id.as_str());
    }

    if IMAGE.is_match(block) {
        return Block::Image(block);
    }

    Block::Text(block)
}

/// Convert a multi-line text field to HTML.
pub fn format_content(text: &str) -> String {
    if text.trim().is_empty() {
        return String::new();
    }

    let normalized = text.replace("\r\n", "\n").replace('\r', "\n");

    PARAGRAPH_BREAK
        .split(&normalized)
        .map(str::trim)
        .filter(|block| !block.is_empty())
        .map(|block| classify_block(block).to_html())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Like [`format_content`], treating an absent field as empty.
pub fn format_optional(text: Option<&str>) -> String {
    text.map(format_content).unwrap_or_default()
}
