use std::panic;

use notedown_core::{Block, BlockKind, Inline, InlineKind, Notedown, Span, render};

const CASES: usize = 200;
const MAX_PIECES: usize = 160;
const CHARSET: &[char] = &[
    'a', 'b', 'x', 'Z', '0', '7', ' ', ' ', '\n', '\n', '\t', '#', '*', '_', '`', '$', '[', ']',
    '(', ')', '{', '}', '!', '<', '>', ':', '+', '-', '=', '~', '.', '/', '\\', '"', 'é', '→',
];
const SNIPPETS: &[&str] = &[
    "{note}\n", "{/note}\n", "{def:2}\n", "{/def:2}\n", "{warn}\n", "{/warn}\n", "{toc}\n",
    "{toc}\n\n", "==", "===", "{c:red}", "{c:#0f0}", "{/c}", "{h}", "{/h}", "# ", "### ", "- ",
    "1. ", "> ", "```\n", "$$\n", "\n\n", "  ",
];

#[test]
fn render_never_panics_on_random_input() -> Result<(), Box<dyn std::error::Error>> {
    let mut rng = Lcg::new(0x7f4a_2d91_13b4_55a1);
    for case in 0..CASES {
        let source = random_source(&mut rng);
        let result = panic::catch_unwind(|| render(&source));
        match result {
            Ok(Ok(_)) => {}
            Ok(Err(err)) => return Err(format!("case {} failed: {}", case, err).into()),
            Err(_) => return Err(format!("render panicked for case {}: {:?}", case, source).into()),
        }
    }
    Ok(())
}

#[test]
fn spans_are_in_bounds_on_random_input() -> Result<(), Box<dyn std::error::Error>> {
    let mut rng = Lcg::new(0x91d4_2f8e_c1a3_044f);
    let mut session = Notedown::new();
    session.init()?;
    for case in 0..CASES {
        let source = random_source(&mut rng);
        let lexed = session.engine().lex(&source);
        let root = Span {
            start: 0,
            end: source.len(),
        };
        if let Err(message) = check_block_seq(&lexed.blocks, root, source.len(), "blocks") {
            return Err(format!(
                "span check failed for case {}: {}\nSource:\n---\n{}\n---",
                case, message, source
            )
            .into());
        }
    }
    Ok(())
}

#[test]
fn heading_registry_matches_rendered_headings() -> Result<(), Box<dyn std::error::Error>> {
    let mut rng = Lcg::new(0x0bad_cafe_1234_5678);
    let mut session = Notedown::new();
    for case in 0..CASES {
        let source = random_source(&mut rng);
        let rendered = session.render(&source)?;
        let anchors = rendered.html.matches("class=\"section-counter counter\"").count();
        if anchors != rendered.headings.len() {
            return Err(format!(
                "case {}: {} heading anchors but {} registry records",
                case,
                anchors,
                rendered.headings.len()
            )
            .into());
        }
    }
    Ok(())
}

fn check_block_seq(
    blocks: &[Block],
    parent: Span,
    source_len: usize,
    context: &str,
) -> Result<(), String> {
    let mut prev_end = parent.start;
    for (idx, block) in blocks.iter().enumerate() {
        let label = format!("{}[{}]", context, idx);
        check_span(block.span, source_len, &label)?;
        if block.span.start < parent.start || block.span.end > parent.end {
            return Err(format!(
                "{} span {:?} not within parent {:?}",
                label, block.span, parent
            ));
        }
        if block.span.start < prev_end {
            return Err(format!(
                "{} span {:?} overlaps previous end {}",
                label, block.span, prev_end
            ));
        }
        prev_end = block.span.end;
        check_block(block, source_len, &label)?;
    }
    Ok(())
}

fn check_block(block: &Block, source_len: usize, context: &str) -> Result<(), String> {
    match &block.kind {
        BlockKind::Paragraph { content } => check_inline_seq(
            content,
            block.span,
            source_len,
            &format!("{}.paragraph", context),
        )?,
        BlockKind::Heading { title, .. } => check_inline_seq(
            title,
            block.span,
            source_len,
            &format!("{}.heading", context),
        )?,
        BlockKind::List(list) => {
            for (idx, item) in list.items.iter().enumerate() {
                let label = format!("{}.list.items[{}]", context, idx);
                check_span(item.span, source_len, &label)?;
                if item.span.start < block.span.start || item.span.end > block.span.end {
                    return Err(format!(
                        "{} span {:?} not within list {:?}",
                        label, item.span, block.span
                    ));
                }
                check_block_seq(
                    &item.blocks,
                    item.span,
                    source_len,
                    &format!("{}.blocks", label),
                )?;
            }
        }
        BlockKind::BlockQuote { blocks } => check_block_seq(
            blocks,
            block.span,
            source_len,
            &format!("{}.blockquote", context),
        )?,
        BlockKind::Callout(callout) => {
            check_inline_seq(
                &callout.title,
                block.span,
                source_len,
                &format!("{}.callout.title", context),
            )?;
            check_block_seq(
                &callout.body,
                block.span,
                source_len,
                &format!("{}.callout.body", context),
            )?;
        }
        BlockKind::CodeBlock(_)
        | BlockKind::MathBlock { .. }
        | BlockKind::ThematicBreak
        | BlockKind::TocPlaceholder => {}
    }
    Ok(())
}

fn check_inline_seq(
    inlines: &[Inline],
    parent: Span,
    source_len: usize,
    context: &str,
) -> Result<(), String> {
    let mut prev_end = parent.start;
    for (idx, inline) in inlines.iter().enumerate() {
        let label = format!("{}[{}]", context, idx);
        check_span(inline.span, source_len, &label)?;
        if inline.span.start < parent.start || inline.span.end > parent.end {
            return Err(format!(
                "{} span {:?} not within parent {:?}",
                label, inline.span, parent
            ));
        }
        if inline.span.start < prev_end {
            return Err(format!(
                "{} span {:?} overlaps previous end {}",
                label, inline.span, prev_end
            ));
        }
        prev_end = inline.span.end;
        check_inline(inline, source_len, &label)?;
    }
    Ok(())
}

fn check_inline(inline: &Inline, source_len: usize, context: &str) -> Result<(), String> {
    let children = match &inline.kind {
        InlineKind::Emph(children)
        | InlineKind::Strong(children)
        | InlineKind::Strikethrough(children)
        | InlineKind::Highlight(children)
        | InlineKind::Hidden(children)
        | InlineKind::Color { children, .. }
        | InlineKind::Link { children, .. } => children,
        InlineKind::Image { alt, .. } => alt,
        InlineKind::Text(_)
        | InlineKind::CodeSpan(_)
        | InlineKind::SoftBreak
        | InlineKind::HardBreak
        | InlineKind::MathInline { .. }
        | InlineKind::HtmlSpan { .. } => return Ok(()),
    };
    check_inline_seq(
        children,
        inline.span,
        source_len,
        &format!("{}.children", context),
    )
}

fn check_span(span: Span, source_len: usize, context: &str) -> Result<(), String> {
    if span.start > span.end {
        return Err(format!("{} inverted span {:?}", context, span));
    }
    if span.end > source_len {
        return Err(format!(
            "{} span {:?} out of bounds (len={})",
            context, span, source_len
        ));
    }
    Ok(())
}

fn random_source(rng: &mut Lcg) -> String {
    let pieces = rng.gen_range(0, MAX_PIECES + 1);
    let mut out = String::new();
    for _ in 0..pieces {
        if rng.gen_range(0, 4) == 0 {
            out.push_str(SNIPPETS[rng.gen_range(0, SNIPPETS.len())]);
        } else {
            out.push(CHARSET[rng.gen_range(0, CHARSET.len())]);
        }
    }
    out
}

struct Lcg {
    state: u64,
}

impl Lcg {
    fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    fn next(&mut self) -> u64 {
        self.state = self.state.wrapping_mul(6364136223846793005).wrapping_add(1);
        self.state
    }

    fn gen_range(&mut self, min: usize, max: usize) -> usize {
        if max <= min {
            return min;
        }
        let span = max - min;
        let value = (self.next() >> 33) as usize;
        min + (value % span)
    }
}
