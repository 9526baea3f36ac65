// steward-cli/src/rendering.rs

//! Terminal rendering for Markdown answers.
//!
//! Prose goes through termimad. Fenced and indented code blocks are pulled out
//! and highlighted with syntect, since termimad prints them uncoloured.

use anyhow::{anyhow, Result};
use lazy_static::lazy_static;
use pulldown_cmark::{CodeBlockKind, Event, Options, Parser, Tag, TagEnd};
use pulldown_cmark_to_cmark::cmark;
use std::io::{self, Write};
use syntect::{
    easy::HighlightLines,
    highlighting::{FontStyle, Theme, ThemeSet},
    parsing::SyntaxSet,
    util::LinesWithEndings,
};
use termimad::{
    crossterm::style::{Attribute, Color, ResetColor, SetAttribute, SetForegroundColor},
    MadSkin,
};

const CODE_THEME_NAME: &str = "base16-ocean.dark";

lazy_static! {
    static ref SYNTAX_SET: SyntaxSet = SyntaxSet::load_defaults_newlines();
    static ref THEME_SET: ThemeSet = ThemeSet::load_defaults();
}

#[derive(Debug, PartialEq)]
enum Segment {
    Prose(String),
    Code {
        language: Option<String>,
        code: String,
    },
}

/// Splits Markdown into prose runs and code blocks, in document order.
fn split_segments(markdown: &str) -> Result<Vec<Segment>> {
    fn flush_prose(events: &mut Vec<Event<'_>>, segments: &mut Vec<Segment>) -> Result<()> {
        if events.is_empty() {
            return Ok(());
        }
        let mut prose = String::new();
        cmark(events.iter(), &mut prose).map_err(|e| anyhow!("Markdown generation error: {}", e))?;
        segments.push(Segment::Prose(prose));
        events.clear();
        Ok(())
    }

    let mut segments = Vec::new();
    let mut prose_events: Vec<Event<'_>> = Vec::new();
    let mut code: Option<(Option<String>, String)> = None;

    for event in Parser::new_ext(markdown, Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH) {
        match event {
            Event::Start(Tag::CodeBlock(kind)) => {
                flush_prose(&mut prose_events, &mut segments)?;
                let language = match kind {
                    CodeBlockKind::Fenced(info) => info
                        .split_whitespace()
                        .next()
                        .map(str::to_string),
                    CodeBlockKind::Indented => None,
                };
                code = Some((language, String::new()));
            }
            Event::End(TagEnd::CodeBlock) => {
                if let Some((language, text)) = code.take() {
                    segments.push(Segment::Code { language, code: text });
                }
            }
            Event::Text(text) if code.is_some() => {
                if let Some((_, buffer)) = code.as_mut() {
                    buffer.push_str(&text);
                }
            }
            other => {
                if code.is_none() {
                    prose_events.push(other);
                }
            }
        }
    }
    flush_prose(&mut prose_events, &mut segments)?;
    Ok(segments)
}

fn syntax_token(language: &str) -> String {
    let lower = language.to_lowercase();
    match lower.as_str() {
        "shell" | "bash" | "sh" | "zsh" => "bash",
        "javascript" | "js" => "javascript",
        "typescript" | "ts" => "typescript",
        "python" | "py" => "python",
        "yaml" | "yml" => "yaml",
        "rust" | "rs" => "rust",
        "markdown" | "md" => "markdown",
        "csharp" | "cs" => "c#",
        _ => lower.as_str(),
    }
    .to_string()
}

fn highlight_code<W: Write>(writer: &mut W, code: &str, language: Option<&str>, theme: &Theme) -> Result<()> {
    let syntax = language
        .map(syntax_token)
        .and_then(|token| SYNTAX_SET.find_syntax_by_token(&token))
        .unwrap_or_else(|| SYNTAX_SET.find_syntax_plain_text());
    let mut highlighter = HighlightLines::new(syntax, theme);

    for line in LinesWithEndings::from(code) {
        let ranges = highlighter
            .highlight_line(line, &SYNTAX_SET)
            .map_err(|e| anyhow!("Syntax highlighting error: {}", e))?;
        for (style, text) in ranges {
            let fg = style.foreground;
            if fg.a > 0 {
                write!(writer, "{}", SetForegroundColor(Color::Rgb { r: fg.r, g: fg.g, b: fg.b }))?;
            }
            if style.font_style.contains(FontStyle::BOLD) {
                write!(writer, "{}", SetAttribute(Attribute::Bold))?;
            }
            if style.font_style.contains(FontStyle::ITALIC) {
                write!(writer, "{}", SetAttribute(Attribute::Italic))?;
            }
            write!(writer, "{}{}{}", text, SetAttribute(Attribute::Reset), ResetColor)?;
        }
    }
    Ok(())
}

pub struct MarkdownRenderer {
    skin: MadSkin,
    code_theme: Option<&'static Theme>,
}

impl Default for MarkdownRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl MarkdownRenderer {
    pub fn new() -> Self {
        let mut skin = MadSkin::default();
        skin.inline_code.set_fg(Color::Cyan);
        skin.inline_code.set_bg(Color::Reset);
        skin.code_block.set_fg(Color::Reset);
        skin.code_block.set_bg(Color::Reset);
        Self {
            skin,
            code_theme: THEME_SET.themes.get(CODE_THEME_NAME),
        }
    }

    pub fn render<W: Write>(&self, writer: &mut W, markdown: &str) -> Result<()> {
        for segment in split_segments(markdown)? {
            match segment {
                Segment::Prose(text) => self
                    .skin
                    .write_text_on(writer, &text)
                    .map_err(|e| anyhow!("Termimad rendering error: {}", e))?,
                Segment::Code { language, code } => {
                    writeln!(writer)?;
                    match self.code_theme {
                        Some(theme) => highlight_code(writer, &code, language.as_deref(), theme)?,
                        None => write!(writer, "{}", code)?,
                    }
                    writeln!(writer)?;
                }
            }
        }
        writer.flush()?;
        Ok(())
    }
}

/// Renders `markdown_text` to stdout.
pub fn print_formatted(markdown_text: &str) -> Result<()> {
    let mut stdout = io::stdout().lock();
    MarkdownRenderer::new().render(&mut stdout, markdown_text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_segments_separates_code_blocks() {
        let markdown = "Intro text\n\n```rust\nfn main() {}\n```\n\n    indented();\n\nOutro text\n";
        let segments = split_segments(markdown).unwrap();
        assert_eq!(segments.len(), 4);
        assert!(matches!(&segments[0], Segment::Prose(p) if p.contains("Intro text")));
        assert_eq!(
            segments[1],
            Segment::Code {
                language: Some("rust".to_string()),
                code: "fn main() {}\n".to_string()
            }
        );
        assert_eq!(
            segments[2],
            Segment::Code {
                language: None,
                code: "indented();\n".to_string()
            }
        );
        assert!(matches!(&segments[3], Segment::Prose(p) if p.contains("Outro text")));
    }

    #[test]
    fn test_split_segments_plain_text() {
        let segments = split_segments("Just **words**.").unwrap();
        assert_eq!(segments.len(), 1);
        assert!(matches!(&segments[0], Segment::Prose(p) if p.contains("**words**")));
        assert!(split_segments("").unwrap().is_empty());
    }

    #[test]
    fn test_render_writes_prose_and_code() {
        let mut out: Vec<u8> = Vec::new();
        MarkdownRenderer::new()
            .render(&mut out, "Hello there\n\n```sh\necho hi\n```\n")
            .unwrap();
        let rendered = String::from_utf8_lossy(&out);
        assert!(rendered.contains("Hello"));
        assert!(rendered.contains("echo"));
    }

    #[test]
    fn test_syntax_token_aliases() {
        assert_eq!(syntax_token("PY"), "python");
        assert_eq!(syntax_token("zsh"), "bash");
        assert_eq!(syntax_token("go"), "go");
    }
}
