use tracing::debug;

use crate::context::RenderContext;
use crate::extension::Extension;
use crate::toc::{TocNode, build_toc};
use crate::token::{Block, BlockKind, CodeBlock, Inline, InlineKind, List, plain_text};

/// Deterministic formatting: 2-space indentation and LF newlines.
struct HtmlWriter {
    out: String,
    indent: usize,
    toc_slots: Vec<TocSlot>,
}

/// A deferred table-of-contents position, filled once every heading is known.
struct TocSlot {
    offset: usize,
    indent: usize,
}

impl HtmlWriter {
    fn new(indent: usize) -> Self {
        Self {
            out: String::new(),
            indent,
            toc_slots: Vec::new(),
        }
    }

    fn line(&mut self, line: &str) {
        for _ in 0..self.indent {
            self.out.push_str("  ");
        }
        self.out.push_str(line);
        self.out.push('\n');
    }

    fn finish(mut self) -> String {
        if self.out.ends_with('\n') {
            self.out.pop();
        }
        self.out
    }
}

/// Renders a token tree into HTML, recording headings into the pass context.
pub struct HtmlRenderer<'c> {
    writer: HtmlWriter,
    context: &'c mut RenderContext,
}

impl<'c> HtmlRenderer<'c> {
    pub fn new(context: &'c mut RenderContext) -> Self {
        Self {
            writer: HtmlWriter::new(0),
            context,
        }
    }

    pub(crate) fn line(&mut self, line: &str) {
        self.writer.line(line);
    }

    pub(crate) fn indent(&mut self) {
        self.writer.indent += 1;
    }

    pub(crate) fn dedent(&mut self) {
        self.writer.indent = self.writer.indent.saturating_sub(1);
    }

    pub(crate) fn toc_slot(&mut self) {
        self.writer.toc_slots.push(TocSlot {
            offset: self.writer.out.len(),
            indent: self.writer.indent,
        });
    }

    pub fn blocks(&mut self, blocks: &[Block]) {
        for block in blocks {
            self.block(block);
        }
    }

    pub fn block(&mut self, block: &Block) {
        if let Some(extension) = Extension::of_block(&block.kind) {
            extension.render_block(block, self);
            return;
        }

        match &block.kind {
            BlockKind::Heading { level, title } => self.heading(*level, title),
            BlockKind::Paragraph { content } => {
                let content = self.inlines(content);
                self.line(&format!("<p>{}</p>", content));
            }
            BlockKind::BlockQuote { blocks } => {
                self.line("<blockquote>");
                self.indent();
                self.blocks(blocks);
                self.dedent();
                self.line("</blockquote>");
            }
            BlockKind::List(list) => self.list(list),
            BlockKind::CodeBlock(code) => self.code_block(code),
            BlockKind::MathBlock { tex } => {
                self.line(&format!(
                    "<div class=\"math-display\">\\[{}\\]</div>",
                    escape_html(tex)
                ));
            }
            BlockKind::ThematicBreak => self.line("<hr />"),
            BlockKind::Callout(_) | BlockKind::TocPlaceholder => {}
        }
    }

    /// Numbers the heading, registers it, and writes it with its anchor and counter.
    fn heading(&mut self, level: u8, title: &[Inline]) {
        let record = self.context.record_heading(level, plain_text(title));
        let slug = escape_attr(&record.slug);
        let title = self.inlines(title);
        self.line(&format!(
            "<h{level} id=\"{slug}\"><a class=\"anchor\" href=\"#{slug}\"><span class=\"section-counter counter\">{}</span></a> {title}</h{level}>",
            record.counter
        ));
    }

    fn list(&mut self, list: &List) {
        let tag = if list.ordered { "ol" } else { "ul" };
        let start_attr = match (list.ordered, list.start) {
            (true, Some(start)) if start != 1 => format!(" start=\"{}\"", start),
            _ => String::new(),
        };
        self.line(&format!("<{}{}>", tag, start_attr));
        self.indent();
        for item in &list.items {
            self.line("<li>");
            self.indent();
            for block in &item.blocks {
                match &block.kind {
                    BlockKind::Paragraph { content } if list.tight => {
                        let content = self.inlines(content);
                        self.line(&content);
                    }
                    _ => self.block(block),
                }
            }
            self.dedent();
            self.line("</li>");
        }
        self.dedent();
        self.line(&format!("</{}>", tag));
    }

    /// Code text is written verbatim between the tags, so inner lines are never indented.
    fn code_block(&mut self, code: &CodeBlock) {
        let class = code
            .lang
            .as_deref()
            .map(|lang| format!(" class=\"language-{}\"", escape_attr(lang)))
            .unwrap_or_default();
        self.line(&format!(
            "<pre class=\"code\"><code{}>{}</code></pre>",
            class,
            escape_html(&code.text)
        ));
    }

    pub fn inlines(&mut self, inlines: &[Inline]) -> String {
        let mut out = String::new();
        for inline in inlines {
            if let Some(extension) = Extension::of_inline(&inline.kind) {
                out.push_str(&extension.render_inline(inline, self));
                continue;
            }
            match &inline.kind {
                InlineKind::Text(text) => out.push_str(&escape_html(text)),
                InlineKind::CodeSpan(text) => {
                    out.push_str("<code>");
                    out.push_str(&escape_html(text));
                    out.push_str("</code>");
                }
                InlineKind::MathInline { tex, display } => {
                    if *display {
                        out.push_str("<span class=\"math-display\">\\[");
                        out.push_str(&escape_html(tex));
                        out.push_str("\\]</span>");
                    } else {
                        out.push_str("<span class=\"math-inline\">\\(");
                        out.push_str(&escape_html(tex));
                        out.push_str("\\)</span>");
                    }
                }
                InlineKind::SoftBreak => out.push(' '),
                InlineKind::HardBreak => out.push_str("<br />"),
                InlineKind::Emph(children) => {
                    out.push_str("<em>");
                    out.push_str(&self.inlines(children));
                    out.push_str("</em>");
                }
                InlineKind::Strong(children) => {
                    out.push_str("<strong>");
                    out.push_str(&self.inlines(children));
                    out.push_str("</strong>");
                }
                InlineKind::Strikethrough(children) => {
                    out.push_str("<del>");
                    out.push_str(&self.inlines(children));
                    out.push_str("</del>");
                }
                InlineKind::Link {
                    url,
                    title,
                    children,
                } => {
                    out.push_str("<a href=\"");
                    out.push_str(&escape_url_attr(url));
                    out.push('"');
                    if let Some(title) = title {
                        out.push_str(" title=\"");
                        out.push_str(&escape_attr(title));
                        out.push('"');
                    }
                    out.push('>');
                    out.push_str(&self.inlines(children));
                    out.push_str("</a>");
                }
                InlineKind::Image { url, title, alt } => {
                    out.push_str(&figure(url, title.as_deref(), &plain_text(alt)));
                }
                InlineKind::HtmlSpan { raw } => out.push_str(raw),
                InlineKind::Highlight(_) | InlineKind::Color { .. } | InlineKind::Hidden(_) => {}
            }
        }
        out
    }

    /// Fills every deferred table-of-contents slot from the complete registry.
    pub fn finish(self) -> String {
        let HtmlRenderer {
            mut writer,
            context,
        } = self;
        if !writer.toc_slots.is_empty() {
            let toc = build_toc(context.headings().as_slice());
            debug!(
                slots = writer.toc_slots.len(),
                entries = toc.len(),
                "filling table of contents"
            );
            for slot in writer.toc_slots.drain(..).rev() {
                let mut sub = HtmlWriter::new(slot.indent);
                write_toc(&mut sub, &toc);
                writer.out.insert_str(slot.offset, &sub.out);
            }
        }
        writer.finish()
    }
}

/// Images render as a figure with an optional caption taken from the title.
fn figure(url: &str, title: Option<&str>, alt: &str) -> String {
    let mut out = String::from("<div class=\"figure\"><div class=\"image\"><img src=\"");
    out.push_str(&escape_url_attr(url));
    out.push_str("\" alt=\"");
    out.push_str(&escape_attr(alt));
    out.push('"');
    if let Some(title) = title {
        out.push_str(" title=\"");
        out.push_str(&escape_attr(title));
        out.push('"');
    }
    out.push_str(" /></div>");
    if let Some(title) = title.filter(|title| !title.is_empty()) {
        out.push_str("<div class=\"caption\">");
        out.push_str(&escape_html(title));
        out.push_str("</div>");
    }
    out.push_str("</div>");
    out
}

/// Renders a standalone table of contents for `nodes`.
pub fn toc_html(nodes: &[TocNode]) -> String {
    let mut writer = HtmlWriter::new(0);
    write_toc(&mut writer, nodes);
    writer.finish()
}

fn write_toc(writer: &mut HtmlWriter, nodes: &[TocNode]) {
    writer.line("<div class=\"toc\">");
    writer.indent += 1;
    if nodes.is_empty() {
        writer.line("<ul></ul>");
    } else {
        write_toc_list(writer, nodes);
    }
    writer.indent -= 1;
    writer.line("</div>");
}

fn write_toc_list(writer: &mut HtmlWriter, nodes: &[TocNode]) {
    writer.line("<ul>");
    writer.indent += 1;
    for node in nodes {
        let record = &node.record;
        let entry = format!(
            "<a href=\"#{}\"><span class=\"toc-counter counter\">{}</span> {}</a>",
            escape_attr(&record.slug),
            escape_html(&record.counter),
            escape_html(&record.title)
        );
        if node.children.is_empty() {
            writer.line(&format!("<li>{}</li>", entry));
            continue;
        }
        writer.line(&format!("<li>{}", entry));
        writer.indent += 1;
        write_toc_list(writer, &node.children);
        writer.indent -= 1;
        writer.line("</li>");
    }
    writer.indent -= 1;
    writer.line("</ul>");
}

pub(crate) fn escape_html(text: &str) -> String {
    let mut out = String::new();
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
    out
}

pub(crate) fn escape_attr(text: &str) -> String {
    let mut out = String::new();
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}

fn escape_url_attr(text: &str) -> String {
    let mut encoded = String::new();
    for &byte in text.as_bytes() {
        match byte {
            b' ' => encoded.push_str("%20"),
            b'\\' => encoded.push_str("%5C"),
            0x00..=0x1F | 0x7F..=0xFF => {
                encoded.push_str(&format!("%{:02X}", byte));
            }
            _ => encoded.push(byte as char),
        }
    }
    escape_attr(&encoded)
}

#[cfg(test)]
mod tests {
    use super::{figure, toc_html};
    use crate::registry::HeadingRecord;
    use crate::toc::build_toc;

    #[test]
    fn empty_toc_is_a_well_formed_container() {
        assert_eq!(toc_html(&[]), "<div class=\"toc\">\n  <ul></ul>\n</div>");
    }

    #[test]
    fn toc_nests_children_inside_their_item() {
        let records = vec![
            HeadingRecord::new(1, "A", "a", "1"),
            HeadingRecord::new(2, "A1", "a1", "1.1"),
            HeadingRecord::new(1, "B", "b", "2"),
        ];
        let html = toc_html(&build_toc(&records));
        let expected = [
            "<div class=\"toc\">",
            "  <ul>",
            "    <li><a href=\"#a\"><span class=\"toc-counter counter\">1</span> A</a>",
            "      <ul>",
            "        <li><a href=\"#a1\"><span class=\"toc-counter counter\">1.1</span> A1</a></li>",
            "      </ul>",
            "    </li>",
            "    <li><a href=\"#b\"><span class=\"toc-counter counter\">2</span> B</a></li>",
            "  </ul>",
            "</div>",
        ]
        .join("\n");
        assert_eq!(html, expected);
    }

    #[test]
    fn figure_caption_comes_from_title() {
        assert_eq!(
            figure("a b.png", Some("Fig <1>"), "alt"),
            "<div class=\"figure\"><div class=\"image\"><img src=\"a%20b.png\" alt=\"alt\" title=\"Fig &lt;1&gt;\" /></div><div class=\"caption\">Fig &lt;1&gt;</div></div>"
        );
        assert_eq!(
            figure("x.png", None, ""),
            "<div class=\"figure\"><div class=\"image\"><img src=\"x.png\" alt=\"\" /></div></div>"
        );
    }
}
