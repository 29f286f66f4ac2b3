//! Highlighted code figure markup.
//!
//! Emits the `<figure class="highlight">` table layout used by the rendered
//! site: an optional caption row, a line-number gutter, and HTML-escaped
//! code lines. Syntax coloring itself happens client-side; the markup only
//! carries the language class.

/// Rendering options for one code figure.
#[derive(Debug, Clone)]
pub struct HighlightOptions {
    pub lang: Option<String>,
    /// Pre-rendered caption markup (`<span>…</span>` plus optional link).
    pub caption: Option<String>,
    pub gutter: bool,
    pub first_line: usize,
}

impl Default for HighlightOptions {
    fn default() -> Self {
        Self {
            lang: None,
            caption: None,
            gutter: true,
            first_line: 1,
        }
    }
}

/// Renders code into a highlighted figure.
pub fn highlight(code: &str, options: &HighlightOptions) -> String {
    let lang = options.lang.as_deref().unwrap_or("plaintext");
    let lines: Vec<&str> = code.split('\n').collect();

    let mut out = String::with_capacity(code.len() + 256);
    out.push_str(&format!(r#"<figure class="highlight {lang}">"#));

    if let Some(caption) = &options.caption {
        out.push_str(&format!("<figcaption>{caption}</figcaption>"));
    }

    out.push_str("<table><tr>");

    if options.gutter {
        out.push_str(r#"<td class="gutter"><pre>"#);
        for number in options.first_line..options.first_line + lines.len() {
            out.push_str(&format!(r#"<span class="line">{number}</span><br>"#));
        }
        out.push_str("</pre></td>");
    }

    out.push_str(r#"<td class="code"><pre>"#);
    for line in &lines {
        out.push_str(&format!(
            r#"<span class="line">{}</span><br>"#,
            escape_html(line)
        ));
    }
    out.push_str("</pre></td></tr></table></figure>");
    out
}

/// Escapes text for safe embedding in HTML content and attributes.
pub(crate) fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_code_content() {
        let html = highlight("if a < b && b > c {}", &HighlightOptions::default());
        assert!(html.contains("if a &lt; b &amp;&amp; b &gt; c {}"));
        assert!(!html.contains("a < b"));
    }

    #[test]
    fn carries_the_language_class() {
        let options = HighlightOptions {
            lang: Some("rust".to_string()),
            ..HighlightOptions::default()
        };
        let html = highlight("fn main() {}", &options);
        assert!(html.starts_with(r#"<figure class="highlight rust">"#));
    }

    #[test]
    fn defaults_to_plaintext() {
        let html = highlight("text", &HighlightOptions::default());
        assert!(html.starts_with(r#"<figure class="highlight plaintext">"#));
    }

    #[test]
    fn renders_caption_and_gutter() {
        let options = HighlightOptions {
            lang: Some("js".to_string()),
            caption: Some("<span>Example</span>".to_string()),
            ..HighlightOptions::default()
        };
        let html = highlight("a\nb", &options);
        assert!(html.contains("<figcaption><span>Example</span></figcaption>"));
        assert!(html.contains(r#"<td class="gutter"><pre><span class="line">1</span><br><span class="line">2</span><br></pre></td>"#));
    }

    #[test]
    fn gutter_can_be_disabled() {
        let options = HighlightOptions {
            gutter: false,
            ..HighlightOptions::default()
        };
        let html = highlight("a", &options);
        assert!(!html.contains(r#"class="gutter""#));
    }

    #[test]
    fn escape_html_covers_quotes() {
        assert_eq!(escape_html(r#"a"b'c"#), "a&quot;b&#39;c");
    }
}
