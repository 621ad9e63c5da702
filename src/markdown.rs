//! Text → HTML for chat bubbles.
//!
//! Each chat entry carries a [`RenderMode`] chosen when the entry is created.
//! Bot output is rendered as Markdown and then restricted to a fixed set of
//! structural tags without attributes; everything else is escaped text.

use crate::utils::escape_html;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    /// Backend text: Markdown restricted to the allow-listed tags.
    TrustedMarkdown,
    /// User input and error details: escaped, newlines become `<br>`.
    PlainEscaped,
}

/// Tags that may appear in rendered bot output.
pub const ALLOWED_TAGS: [&str; 16] = [
    "strong", "em", "code", "pre", "br", "p", "ul", "ol", "li", "h1", "h2", "h3", "h4", "h5",
    "h6", "blockquote",
];

pub fn render(text: &str, mode: RenderMode) -> String {
    match mode {
        RenderMode::PlainEscaped => render_plain(text),
        RenderMode::TrustedMarkdown => render_markdown(text),
    }
}

/// Escape markup and turn newlines into `<br>`.
pub fn render_plain(text: &str) -> String {
    escape_html(text).replace('\n', "<br>")
}

#[cfg(not(feature = "markdown"))]
pub fn render_markdown(text: &str) -> String {
    render_plain(text)
}

#[cfg(feature = "markdown")]
pub fn render_markdown(text: &str) -> String {
    use pulldown_cmark::{html, Options, Parser};

    let parser = Parser::new_ext(text, Options::empty()).filter_map(sanitize_event);
    let mut out = String::with_capacity(text.len() + text.len() / 2);
    html::push_html(&mut out, parser);
    out
}

/// Rewrite one parser event so the HTML writer can only emit allow-listed,
/// attribute-free tags.  Raw HTML is demoted to text, links and images keep
/// their text content only.
#[cfg(feature = "markdown")]
fn sanitize_event(event: pulldown_cmark::Event<'_>) -> Option<pulldown_cmark::Event<'_>> {
    use pulldown_cmark::{CodeBlockKind, Event, Tag, TagEnd};

    match event {
        Event::Html(raw) | Event::InlineHtml(raw) => Some(Event::Text(raw)),
        Event::InlineMath(raw) | Event::DisplayMath(raw) => Some(Event::Text(raw)),
        Event::SoftBreak => Some(Event::HardBreak),
        Event::Rule | Event::FootnoteReference(_) | Event::TaskListMarker(_) => None,

        Event::Start(tag) => match tag {
            Tag::Link { .. } | Tag::Image { .. } => None,
            Tag::HtmlBlock => Some(Event::Start(Tag::Paragraph)),
            Tag::Heading { level, .. } => Some(Event::Start(Tag::Heading {
                level,
                id: None,
                classes: Vec::new(),
                attrs: Vec::new(),
            })),
            // A fenced language would become a `class` attribute.
            Tag::CodeBlock(_) => Some(Event::Start(Tag::CodeBlock(CodeBlockKind::Indented))),
            // `start` attribute dropped.
            Tag::List(Some(_)) => Some(Event::Start(Tag::List(Some(1)))),
            Tag::BlockQuote(_) => Some(Event::Start(Tag::BlockQuote(None))),
            Tag::Paragraph
            | Tag::List(None)
            | Tag::Item
            | Tag::Emphasis
            | Tag::Strong => Some(Event::Start(tag)),
            _ => None,
        },
        Event::End(tag) => match tag {
            TagEnd::Link | TagEnd::Image => None,
            TagEnd::HtmlBlock => Some(Event::End(TagEnd::Paragraph)),
            TagEnd::BlockQuote(_) => Some(Event::End(TagEnd::BlockQuote(None))),
            TagEnd::Paragraph
            | TagEnd::Heading(_)
            | TagEnd::CodeBlock
            | TagEnd::List(_)
            | TagEnd::Item
            | TagEnd::Emphasis
            | TagEnd::Strong => Some(Event::End(tag)),
            _ => None,
        },
        other => Some(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_is_escaped_and_line_broken() {
        assert_eq!(
            render("<b>hola</b>\nmundo & más", RenderMode::PlainEscaped),
            "&lt;b&gt;hola&lt;/b&gt;<br>mundo &amp; más"
        );
    }

    #[test]
    fn script_in_bot_message_is_neutralised() {
        let html = render("<script>alert(1)</script>", RenderMode::TrustedMarkdown);
        assert!(!html.contains("<script"), "{}", html);
        assert!(html.contains("&lt;script&gt;"), "{}", html);
    }

    #[test]
    fn inline_html_with_event_handler_is_text() {
        let html = render("mira <img src=x onerror=alert(1)> aquí", RenderMode::TrustedMarkdown);
        assert!(!html.contains("<img"), "{}", html);
        assert!(html.contains("&lt;img"), "{}", html);
    }

    #[cfg(feature = "markdown")]
    #[test]
    fn structure_is_rendered() {
        let html = render(
            "## Resumen\n\n**Críticas**: 2\n\n- uno\n- *dos*\n\n> cita\n\n`npm audit`",
            RenderMode::TrustedMarkdown,
        );
        assert!(html.contains("<h2>Resumen</h2>"), "{}", html);
        assert!(html.contains("<strong>Críticas</strong>"), "{}", html);
        assert!(html.contains("<li><em>dos</em></li>"), "{}", html);
        assert!(html.contains("<blockquote>"), "{}", html);
        assert!(html.contains("<code>npm audit</code>"), "{}", html);
    }

    #[cfg(feature = "markdown")]
    #[test]
    fn links_keep_only_their_text() {
        let html = render("[pulsa](javascript:alert(1)) y ![logo](http://x/y.png)", RenderMode::TrustedMarkdown);
        assert!(!html.contains("href"), "{}", html);
        assert!(!html.contains("<img"), "{}", html);
        assert!(!html.contains("javascript:"), "{}", html);
        assert!(html.contains("pulsa"), "{}", html);
        assert!(html.contains("logo"), "{}", html);
    }

    /// Every opening or closing tag name in `html`.
    fn tag_names(html: &str) -> Vec<String> {
        html.split('<')
            .skip(1)
            .map(|rest| {
                rest.trim_start_matches('/')
                    .chars()
                    .take_while(|c| c.is_ascii_alphanumeric())
                    .collect()
            })
            .collect()
    }

    #[test]
    fn only_allow_listed_tags_survive() {
        let html = render(
            "# T\n\n<div onclick=\"x()\">hola</div>\n\n---\n\n<iframe src=x></iframe>\n\n1. a\n\n[l](http://e)",
            RenderMode::TrustedMarkdown,
        );
        for tag in tag_names(&html) {
            assert!(ALLOWED_TAGS.contains(&tag.as_str()), "unexpected <{}> in {}", tag, html);
        }
    }

    #[cfg(feature = "markdown")]
    #[test]
    fn fenced_code_and_ordered_lists_carry_no_attributes() {
        let html = render("```rust\nfn main() {}\n```\n\n3. tres\n4. cuatro", RenderMode::TrustedMarkdown);
        assert!(html.contains("<pre><code>fn main() {}"), "{}", html);
        assert!(html.contains("<ol>"), "{}", html);
        assert!(!html.contains("class="), "{}", html);
        assert!(!html.contains("start="), "{}", html);
    }
}
