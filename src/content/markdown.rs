//! Markdown rendering.
//!
//! Renders with footnotes, tables, strikethrough, and smart punctuation
//! enabled. Images are emitted directly with `loading="lazy"` so media
//! below the fold does not block page load.

use pulldown_cmark::{html, Event, Options, Parser, Tag, TagEnd};

use super::highlight::escape_html;

/// Renders markdown to HTML.
pub fn render_markdown(input: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_FOOTNOTES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_SMART_PUNCTUATION);

    let parser = Parser::new_ext(input, options);

    let mut events = Vec::new();
    let mut iter = parser.into_iter();
    while let Some(event) = iter.next() {
        match event {
            Event::Start(Tag::Image {
                dest_url, title, ..
            }) => {
                // collect the alt text up to the matching end tag
                let mut alt = String::new();
                for inner in iter.by_ref() {
                    match inner {
                        Event::End(TagEnd::Image) => break,
                        Event::Text(text) | Event::Code(text) => alt.push_str(&text),
                        Event::SoftBreak | Event::HardBreak => alt.push(' '),
                        _ => {}
                    }
                }

                let mut tag = format!(
                    r#"<img src="{}" alt="{}" loading="lazy""#,
                    escape_html(&dest_url),
                    escape_html(&alt)
                );
                if !title.is_empty() {
                    tag.push_str(&format!(r#" title="{}""#, escape_html(&title)));
                }
                tag.push('>');
                events.push(Event::Html(tag.into()));
            }
            other => events.push(other),
        }
    }

    let mut output = String::new();
    html::push_html(&mut output, events.into_iter());
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_basic_markdown() {
        let html = render_markdown("# Title\n\nSome *emphasis*.");
        assert!(html.contains("<h1>Title</h1>"));
        assert!(html.contains("<em>emphasis</em>"));
    }

    #[test]
    fn images_load_lazily() {
        let html = render_markdown("![Rust](https://example.com/example.png)");
        assert_eq!(
            html,
            "<p><img src=\"https://example.com/example.png\" alt=\"Rust\" loading=\"lazy\"></p>\n"
        );
    }

    #[test]
    fn image_title_is_preserved() {
        let html = render_markdown("![alt](https://example.com/a.png \"the title\")");
        assert!(html.contains(r#"title="the title""#));
        assert!(html.contains(r#"loading="lazy""#));
    }

    #[test]
    fn raw_html_passes_through() {
        let html = render_markdown("<figure class=\"highlight rust\"><table></table></figure>");
        assert!(html.contains("<figure class=\"highlight rust\">"));
    }

    #[test]
    fn footnotes_are_supported() {
        let html = render_markdown("text[^1]\n\n[^1]: note");
        assert!(html.contains("footnote"));
    }

    #[test]
    fn tables_are_supported() {
        let html = render_markdown("| a | b |\n|---|---|\n| 1 | 2 |");
        assert!(html.contains("<table>"));
    }
}
