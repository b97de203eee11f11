// src/sanitize.rs
//! HTML fragment → Slack message text.
//!
//! The steps run in a fixed order: link rewriting has to happen before tag
//! stripping (the strip pattern skips anything containing `|`), and newline
//! escaping has to come after whitespace collapsing.

use once_cell::sync::OnceCell;
use regex::{NoExpand, Regex};

/// Literal backslash-n pair understood by the webhook payload encoding.
pub const NEWLINE_ESCAPE: &str = r"\n";

fn re_link() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| {
        // Link text may hold other markup but never the start of another `<a `,
        // so an unclosed anchor cannot swallow the next link.
        Regex::new(
            r#"(?i)<a\s[^>]*?\bhref="(?P<url>[^"]*)"[^>]*>(?P<text>(?:[^<]|<[^a<]|<a[^\s<])*?)</a\s*>"#,
        )
        .unwrap()
    })
}

fn re_paragraph() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| Regex::new(r"(?i)<p(?:\s[^>]*)?>").unwrap())
}

fn re_tag() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| Regex::new(r"<[^>|]*>").unwrap())
}

fn re_ws_run() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| Regex::new(r"(?-u:\s){2,}").unwrap())
}

fn re_newline() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| Regex::new(r"\r\n|\n|\r").unwrap())
}

/// Flatten a markup fragment into notification text. Never fails.
pub fn sanitize(fragment: &str) -> String {
    if fragment.is_empty() {
        return String::new();
    }

    // 1) <a href="URL">TEXT</a> -> <URL|TEXT>
    let out = re_link().replace_all(fragment, "<${url}|${text}>");

    // 2) paragraph opens become escaped blank lines
    let escaped_break = format!("{NEWLINE_ESCAPE}{NEWLINE_ESCAPE}");
    let out = re_paragraph().replace_all(&out, NoExpand(&escaped_break));

    // 3) drop remaining tags, keeping the link syntax from step 1
    let out = re_tag().replace_all(&out, "");

    // 4) collapse ASCII whitespace runs; NBSP and friends are content
    let out = re_ws_run().replace_all(&out, " ");

    // 5) any surviving real newline is escaped too
    re_newline()
        .replace_all(&out, NoExpand(NEWLINE_ESCAPE))
        .into_owned()
}

/// Inverse of the escaping done in steps 2 and 5, applied when a message is
/// handed to a JSON serializer that does its own escaping.
pub fn unescape_newlines(s: &str) -> String {
    s.replace(NEWLINE_ESCAPE, "\n")
}
