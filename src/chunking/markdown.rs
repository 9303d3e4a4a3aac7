//! Markdown to plain-text normalization.
//!
//! Documents arrive as markdown-ish text (often mixed Persian/English) and
//! are re-rendered to plain text that keeps the semantic structure visible:
//! headings stay `#`-prefixed, list items become bullets, code blocks keep
//! their fences and language tag, tables are flattened behind a `[table]`
//! marker, and links keep only their visible text. Raw HTML is stripped to
//! its text content and HTML comments are removed entirely.
//!
//! Malformed markdown never fails here; the event stream simply degrades to
//! plain text.

use once_cell::sync::Lazy;
use pulldown_cmark::{CodeBlockKind, Event, Options, Parser, Tag, TagEnd};
use regex::Regex;

static HTML_COMMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<!--.*?-->").unwrap());
static HTML_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").unwrap());
static EXCESS_NEWLINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());
static HORIZONTAL_WS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[ \t]{2,}").unwrap());

/// Normalize raw document text into structured plain text.
pub fn normalize(raw: &str) -> String {
    let prepared = prepare(raw);
    if prepared.is_empty() {
        return String::new();
    }
    let rendered = render_plain(&prepared);
    cleanup(&rendered)
}

/// Structural pre-pass: drop HTML comments, normalize line endings, collapse
/// runs of blank lines.
fn prepare(raw: &str) -> String {
    let text = raw.replace("\r\n", "\n").replace('\r', "\n");
    let text = HTML_COMMENT.replace_all(&text, "");
    EXCESS_NEWLINES.replace_all(&text, "\n\n").trim().to_string()
}

fn cleanup(text: &str) -> String {
    let without_controls: String = text
        .chars()
        .filter(|c| *c == '\n' || !c.is_control())
        .collect();
    let collapsed = HORIZONTAL_WS.replace_all(&without_controls, " ");
    EXCESS_NEWLINES
        .replace_all(&collapsed, "\n\n")
        .trim()
        .to_string()
}

struct PlainRenderer {
    out: String,
    in_code_block: bool,
    link_titles: Vec<String>,
    table_cell_index: usize,
    in_table: bool,
}

impl PlainRenderer {
    fn new() -> Self {
        Self {
            out: String::new(),
            in_code_block: false,
            link_titles: Vec::new(),
            table_cell_index: 0,
            in_table: false,
        }
    }

    /// Ensure the output ends with a paragraph break before a new block.
    fn break_paragraph(&mut self) {
        while self.out.ends_with(' ') {
            self.out.pop();
        }
        if self.out.is_empty() {
            return;
        }
        while self.out.ends_with("\n\n\n") {
            self.out.pop();
        }
        if self.out.ends_with("\n\n") {
            return;
        }
        if self.out.ends_with('\n') {
            self.out.push('\n');
        } else {
            self.out.push_str("\n\n");
        }
    }

    fn push_text(&mut self, text: &str) {
        if self.in_code_block {
            self.out.push_str(text);
        } else {
            self.out.push_str(&text.replace(['\n', '\t'], " "));
        }
    }

    fn start_tag(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Paragraph => {
                if !self.in_table {
                    self.break_paragraph();
                }
            }
            Tag::Heading { level, .. } => {
                self.break_paragraph();
                for _ in 0..level as usize {
                    self.out.push('#');
                }
                self.out.push(' ');
            }
            Tag::CodeBlock(kind) => {
                self.break_paragraph();
                self.out.push_str("```");
                if let CodeBlockKind::Fenced(lang) = kind {
                    self.out.push_str(lang.trim());
                }
                self.out.push('\n');
                self.in_code_block = true;
            }
            Tag::Item => {
                if !self.out.ends_with('\n') && !self.out.is_empty() {
                    self.out.push('\n');
                }
                self.out.push_str("- ");
            }
            Tag::Link { title, .. } => {
                self.link_titles.push(title.to_string());
            }
            Tag::Table(_) => {
                self.break_paragraph();
                self.out.push_str("[table]");
                self.in_table = true;
            }
            Tag::TableHead | Tag::TableRow => {
                self.out.push('\n');
                self.table_cell_index = 0;
            }
            Tag::TableCell => {
                if self.table_cell_index > 0 {
                    self.out.push_str(" | ");
                }
                self.table_cell_index += 1;
            }
            Tag::HtmlBlock => {}
            _ => {}
        }
    }

    fn end_tag(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Paragraph => {
                if !self.in_table {
                    self.break_paragraph();
                }
            }
            TagEnd::Heading(_) => self.break_paragraph(),
            TagEnd::CodeBlock => {
                if !self.out.ends_with('\n') {
                    self.out.push('\n');
                }
                self.out.push_str("```");
                self.in_code_block = false;
                self.break_paragraph();
            }
            TagEnd::Item => {
                if !self.out.ends_with('\n') {
                    self.out.push('\n');
                }
            }
            TagEnd::Link => {
                if let Some(title) = self.link_titles.pop() {
                    if !title.trim().is_empty() {
                        self.out.push_str(&format!(" ({})", title.trim()));
                    }
                }
            }
            TagEnd::Table => {
                self.in_table = false;
                self.break_paragraph();
            }
            TagEnd::List(_) => self.break_paragraph(),
            _ => {}
        }
    }
}

fn render_plain(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);

    let parser = Parser::new_ext(markdown, options);
    let mut renderer = PlainRenderer::new();

    for event in parser {
        match event {
            Event::Start(tag) => renderer.start_tag(tag),
            Event::End(tag) => renderer.end_tag(tag),
            Event::Text(text) => renderer.push_text(&text),
            Event::Code(code) => {
                renderer.out.push('`');
                renderer.out.push_str(&code);
                renderer.out.push('`');
            }
            Event::Html(html) | Event::InlineHtml(html) => {
                let stripped = HTML_TAG.replace_all(&html, " ");
                renderer.push_text(stripped.trim());
            }
            Event::SoftBreak => renderer.out.push(' '),
            Event::HardBreak => renderer.out.push('\n'),
            Event::Rule => renderer.break_paragraph(),
            Event::TaskListMarker(done) => {
                renderer.out.push_str(if done { "[x] " } else { "[ ] " });
            }
            Event::FootnoteReference(_) => {}
            _ => {}
        }
    }

    renderer.out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headings_keep_hash_prefixes() {
        let out = normalize("# Title\n\nSome body text here.\n\n## Section");
        assert!(out.contains("# Title"));
        assert!(out.contains("## Section"));
    }

    #[test]
    fn html_comments_are_removed() {
        let out = normalize("Before <!-- hidden\ncomment --> after.");
        assert!(!out.contains("hidden"));
        assert!(out.contains("Before"));
        assert!(out.contains("after."));
    }

    #[test]
    fn code_blocks_keep_fences_and_language() {
        let out = normalize("```rust\nfn main() {}\n```");
        assert!(out.contains("```rust"));
        assert!(out.contains("fn main() {}"));
        assert!(out.trim_end().ends_with("```"));
    }

    #[test]
    fn inline_code_keeps_backticks() {
        let out = normalize("Call `foo()` to start.");
        assert!(out.contains("`foo()`"));
    }

    #[test]
    fn links_keep_visible_text_and_title() {
        let out = normalize("See [the docs](https://example.com \"API reference\") for more.");
        assert!(out.contains("the docs (API reference)"));
        assert!(!out.contains("https://example.com"));
    }

    #[test]
    fn links_without_title_keep_text_only() {
        let out = normalize("See [the docs](https://example.com).");
        assert!(out.contains("the docs"));
        assert!(!out.contains('('));
    }

    #[test]
    fn tables_are_flattened_with_marker() {
        let md = "| Name | Age |\n|------|-----|\n| Sara | 30 |";
        let out = normalize(md);
        assert!(out.contains("[table]"));
        assert!(out.contains("Name | Age"));
        assert!(out.contains("Sara | 30"));
    }

    #[test]
    fn raw_html_is_stripped_to_text() {
        let out = normalize("<div class=\"x\">kept text</div>\n\nplain paragraph");
        assert!(out.contains("kept text"));
        assert!(!out.contains("<div"));
    }

    #[test]
    fn list_items_become_bullets() {
        let out = normalize("- first item\n- second item");
        assert!(out.contains("- first item"));
        assert!(out.contains("- second item"));
    }

    #[test]
    fn persian_text_survives_normalization() {
        let out = normalize("# عنوان\n\nاین یک پاراگراف فارسی است.");
        assert!(out.contains("# عنوان"));
        assert!(out.contains("این یک پاراگراف فارسی است."));
    }

    #[test]
    fn empty_input_yields_empty_output() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("   \n\n  "), "");
    }

    #[test]
    fn blank_line_runs_collapse() {
        let out = normalize("first paragraph\n\n\n\n\nsecond paragraph");
        assert!(!out.contains("\n\n\n"));
        assert_eq!(out.matches("paragraph").count(), 2);
    }
}
