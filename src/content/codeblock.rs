//! Fenced code block normalization.
//!
//! Scans Markdown for fenced code blocks (3+ backticks or tildes), possibly
//! nested inside blockquote markers up to three levels deep, and replaces
//! each with a highlighted figure. The scanner is an explicit line-based
//! state machine: a fence opens on a line of its own and closes on the next
//! line with the same blockquote depth, fence character, and fence length.
//! Everything between and around matched fences passes through unchanged,
//! and an unclosed fence stays verbatim.

use std::sync::LazyLock;

use regex::Regex;

use super::highlight::{highlight, HighlightOptions};

/// Info string form "lang caption url [label]".
static ALL_OPTIONS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\S+)\s+(.+?)\s+(https?://\S+|/\S+)\s*(.+)?").unwrap());

/// Info string form "lang [caption]".
static LANG_CAPTION_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\S+)\s*(.+)?").unwrap());

const MAX_QUOTE_DEPTH: usize = 3;

/// Replaces every fenced code block in `markdown` with highlighted figure
/// markup. Returns the input unchanged when it contains no fence markers.
pub fn format_code_blocks(markdown: &str) -> String {
    if !markdown.contains("```") && !markdown.contains("~~~") {
        return markdown.to_string();
    }

    let mut out = String::with_capacity(markdown.len());
    for segment in scan(markdown) {
        match segment {
            Segment::Text(text) => out.push_str(text),
            Segment::Fence(block) => block.render_into(&mut out),
        }
    }
    out
}

enum Segment<'a> {
    /// Verbatim input text.
    Text(&'a str),
    /// A matched fenced block ready for re-emission.
    Fence(FencedBlock<'a>),
}

struct FencedBlock<'a> {
    /// Blockquote prefix of the opening line, trailing whitespace included.
    prefix: &'a str,
    depth: usize,
    info: &'a str,
    /// Body lines with their terminators.
    body: Vec<&'a str>,
    /// Line terminator of the closing fence.
    trailer: &'a str,
}

struct FenceOpen<'a> {
    prefix: &'a str,
    depth: usize,
    ch: u8,
    len: usize,
    info: &'a str,
}

/// Splits the input into text and fence segments.
fn scan(input: &str) -> Vec<Segment<'_>> {
    let lines: Vec<&str> = input.split_inclusive('\n').collect();

    // byte offset of each line start, plus the end of input
    let mut starts = Vec::with_capacity(lines.len() + 1);
    let mut offset = 0;
    for line in &lines {
        starts.push(offset);
        offset += line.len();
    }
    starts.push(offset);

    let mut segments = Vec::new();
    let mut text_from = 0;
    let mut i = 0;
    while i < lines.len() {
        let Some(open) = parse_fence_open(lines[i]) else {
            i += 1;
            continue;
        };
        let Some(close) = find_close(&lines, i + 1, &open) else {
            // unclosed fence stays verbatim
            i += 1;
            continue;
        };

        if text_from < i {
            segments.push(Segment::Text(&input[starts[text_from]..starts[i]]));
        }
        segments.push(Segment::Fence(FencedBlock {
            prefix: open.prefix,
            depth: open.depth,
            info: open.info,
            body: lines[i + 1..close].to_vec(),
            trailer: if lines[close].ends_with('\n') { "\n" } else { "" },
        }));
        i = close + 1;
        text_from = i;
    }
    if text_from < lines.len() {
        segments.push(Segment::Text(&input[starts[text_from]..]));
    }
    segments
}

/// Parses a line as a fence opener. The line may carry up to
/// [`MAX_QUOTE_DEPTH`] blockquote markers before the fence.
fn parse_fence_open(line: &str) -> Option<FenceOpen<'_>> {
    let trimmed = strip_terminator(line);
    let (depth, fence_start) = leading_quote_depth(trimmed);
    let rest = &trimmed[fence_start..];

    let ch = *rest.as_bytes().first()?;
    if ch != b'`' && ch != b'~' {
        return None;
    }
    let len = rest.bytes().take_while(|&b| b == ch).count();
    if len < 3 {
        return None;
    }

    let info = rest[len..].trim_matches([' ', '\t']);
    // an info string ending in a backtick is inline code, not a fence
    if info.ends_with('`') {
        return None;
    }

    Some(FenceOpen {
        prefix: &trimmed[..fence_start],
        depth,
        ch,
        len,
        info,
    })
}

/// Finds the closing line for `open`: same blockquote depth, same fence
/// character and length, nothing but whitespace after.
fn find_close(lines: &[&str], from: usize, open: &FenceOpen<'_>) -> Option<usize> {
    for (i, line) in lines.iter().enumerate().skip(from) {
        let trimmed = strip_terminator(line);
        let (depth, fence_start) = leading_quote_depth(trimmed);
        if depth != open.depth {
            continue;
        }
        let rest = &trimmed[fence_start..];
        let count = rest.bytes().take_while(|&b| b == open.ch).count();
        if count != open.len {
            continue;
        }
        if !rest[count..].trim_matches([' ', '\t']).is_empty() {
            continue;
        }
        return Some(i);
    }
    None
}

fn strip_terminator(line: &str) -> &str {
    line.strip_suffix('\n')
        .map(|l| l.strip_suffix('\r').unwrap_or(l))
        .unwrap_or(line)
}

/// Counts leading blockquote markers (each optionally surrounded by
/// horizontal whitespace) and returns `(depth, offset past the prefix)`.
fn leading_quote_depth(line: &str) -> (usize, usize) {
    let bytes = line.as_bytes();
    let mut idx = 0;
    let mut depth = 0;
    loop {
        let mut j = idx;
        while j < bytes.len() && is_hws(bytes[j]) {
            j += 1;
        }
        if depth < MAX_QUOTE_DEPTH && j < bytes.len() && bytes[j] == b'>' {
            depth += 1;
            idx = j + 1;
        } else {
            idx = j;
            break;
        }
    }
    (depth, idx)
}

fn is_hws(b: u8) -> bool {
    b == b' ' || b == b'\t'
}

/// Removes up to `depth` blockquote markers from the front of a body line,
/// along with one whitespace character following the last marker.
fn strip_quote_markers(line: &str, depth: usize) -> &str {
    if depth == 0 {
        return line;
    }
    let bytes = line.as_bytes();
    let mut idx = 0;
    let mut removed = 0;
    while removed < depth {
        let mut j = idx;
        while j < bytes.len() && is_hws(bytes[j]) {
            j += 1;
        }
        if j < bytes.len() && bytes[j] == b'>' {
            idx = j + 1;
            removed += 1;
        } else {
            break;
        }
    }
    if idx < bytes.len() && is_hws(bytes[idx]) {
        idx += 1;
    }
    &line[idx..]
}

impl FencedBlock<'_> {
    fn render_into(&self, out: &mut String) {
        let (lang, caption) = parse_info(self.info);

        let mut content: String = self
            .body
            .iter()
            .map(|line| strip_quote_markers(line, self.depth))
            .collect();
        if content.ends_with('\n') {
            content.pop();
            if content.ends_with('\r') {
                content.pop();
            }
        }

        let options = HighlightOptions {
            lang,
            caption,
            gutter: true,
            first_line: 1,
        };

        out.push_str(self.prefix);
        out.push('\n');
        out.push_str(&highlight(&content, &options));
        out.push('\n');
        out.push_str(self.trailer);
    }
}

/// Extracts `(lang, caption markup)` from a fence info string. Anything
/// after a `=` is ignored. The caption becomes a `<span>`, followed by a
/// link anchor when the info string carried a URL.
fn parse_info(info: &str) -> (Option<String>, Option<String>) {
    let args = info.split('=').next().unwrap_or("");
    if args.trim().is_empty() {
        return (None, None);
    }

    if let Some(caps) = ALL_OPTIONS_RE.captures(args) {
        let lang = caps[1].to_string();
        let mut caption = format!("<span>{}</span>", &caps[2]);
        let label = caps.get(4).map_or("link", |m| m.as_str());
        caption.push_str(&format!(r#"<a href="{}">{}</a>"#, &caps[3], label));
        return (Some(lang), Some(caption));
    }

    if let Some(caps) = LANG_CAPTION_RE.captures(args) {
        let lang = caps[1].to_string();
        let caption = caps.get(2).map(|m| format!("<span>{}</span>", m.as_str()));
        return (Some(lang), caption);
    }

    (None, None)
}
