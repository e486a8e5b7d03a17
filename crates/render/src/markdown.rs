//! Markdown rendering with GFM extensions.

use pulldown_cmark::{html::push_html, Options, Parser};

/// Render markdown to HTML.
///
/// Tables, strikethrough, task lists and footnotes are enabled. Raw HTML
/// passes through unchanged.
pub fn render_markdown(content: &str) -> String {
    let options = Options::ENABLE_TABLES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS
        | Options::ENABLE_FOOTNOTES;

    let parser = Parser::new_ext(content, options);
    let mut html = String::with_capacity(content.len() * 2);
    push_html(&mut html, parser);
    html
}
