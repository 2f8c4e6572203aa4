use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref TAG: Regex = Regex::new(r"<[^>]*>").unwrap();
    static ref LINE_BREAKS: Regex = Regex::new(r"(\r\n|\n|\r){2,}").unwrap();
    static ref HORIZONTAL_SPACE: Regex = Regex::new(r"[ \t]+").unwrap();
}

const ENTITIES: [(&str, &str); 6] = [
    ("&nbsp;", " "),
    ("&amp;", "&"),
    ("&lt;", "<"),
    ("&gt;", ">"),
    ("&quot;", "\""),
    ("&#39;", "'"),
];

/// Turns extracted article markup into plain text.
///
/// Tags are dropped, the common entities decoded, runs of line breaks
/// collapsed to one blank line and runs of spaces/tabs to a single space.
pub fn clean_text(html: &str) -> String {
    let stripped = TAG.replace_all(html, "");
    let decoded = ENTITIES
        .iter()
        .fold(stripped.into_owned(), |text, (entity, plain)| text.replace(entity, plain));
    let paragraphs = LINE_BREAKS.replace_all(&decoded, "\n\n");
    HORIZONTAL_SPACE
        .replace_all(&paragraphs, " ")
        .trim()
        .to_string()
}
