//! Final textual pass over a serialized document.

use std::sync::LazyLock;

use regex::Regex;

use crate::head::HEAD_MARKER;

static COMMENT_SENTINEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?s)<pre class="a-comment">(.*?)</pre>"#).unwrap());

/// Strip head markers and turn comment sentinels into HTML comments.
///
/// Every `<pre class="a-comment">X</pre>` becomes `<!-- X -->`, with `X`
/// copied verbatim and matched non-greedily across lines.
#[must_use]
pub fn finalize(html: &str) -> String {
    let stripped = html.replace(HEAD_MARKER, "");
    COMMENT_SENTINEL
        .replace_all(&stripped, "<!-- ${1} -->")
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_head_marker() {
        let html = r#"<title data-mpa-head="true">T</title><meta data-mpa-head="true" name="a"/>"#;
        assert_eq!(finalize(html), r#"<title>T</title><meta name="a"/>"#);
    }

    #[test]
    fn test_comment_sentinel() {
        assert_eq!(
            finalize(r#"<div><pre class="a-comment">hello</pre></div>"#),
            "<div><!-- hello --></div>"
        );
    }

    #[test]
    fn test_comment_sentinel_is_non_greedy() {
        let html = r#"<pre class="a-comment">a</pre><pre>keep</pre><pre class="a-comment">b</pre>"#;
        assert_eq!(finalize(html), "<!-- a --><pre>keep</pre><!-- b -->");
    }

    #[test]
    fn test_comment_sentinel_multiline() {
        let html = "<pre class=\"a-comment\">line one\nline two</pre>";
        assert_eq!(finalize(html), "<!-- line one\nline two -->");
    }

    #[test]
    fn test_text_copied_verbatim() {
        let html = r#"<pre class="a-comment"><b>$1 & more</b></pre>"#;
        assert_eq!(finalize(html), "<!-- <b>$1 & more</b> -->");
    }

    #[test]
    fn test_plain_document_untouched() {
        let html = "<!doctype html><html><body><pre class=\"code\">x</pre></body></html>";
        assert_eq!(finalize(html), html);
    }
}
