//! Markdown rendering for post bodies.
//!
//! Only the post-detail endpoint renders HTML; listings return raw markdown to
//! keep pages cheap. CommonMark plus the extensions authors actually use:
//! tables, strikethrough, footnotes, and task lists.

use pulldown_cmark::{html, Options, Parser};

pub(super) fn render_html(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_FOOTNOTES);
    options.insert(Options::ENABLE_TASKLISTS);

    let parser = Parser::new_ext(markdown, options);
    let mut out = String::with_capacity(markdown.len() * 2);
    html::push_html(&mut out, parser);
    out
}
