use crate::api::Comment;

/// Escape the characters that would let user text turn into markup
///
/// `&` is left alone so that sanitizing twice yields the same string: text coming back from the
/// service was already escaped on its way in, and must not get escaped again when rendered.
/// The price is that an entity the user typed literally, like `a &lt; b`, cannot be told apart
/// from one added here, so [`display_text`] shows it as `a < b`.
pub fn sanitize(s: &str, hardened: bool) -> String {
    let mut res = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '<' => res.push_str("&lt;"),
            '>' => res.push_str("&gt;"),
            '"' if hardened => res.push_str("&quot;"),
            '\'' if hardened => res.push_str("&#39;"),
            c => res.push(c),
        }
    }
    res
}

/// Turn sanitized text back into what should appear on screen
///
/// The result must only ever be rendered as a text node, never parsed as markup.
pub fn display_text(escaped: &str) -> String {
    escaped
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
}

pub fn sanitize_comment(mut c: Comment, hardened: bool) -> Comment {
    c.username = sanitize(&c.username, hardened);
    c.content = sanitize(&c.content, hardened);
    c
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn script_tag_becomes_entities() {
        assert_eq!(
            sanitize("<script>alert(1)</script>", false),
            "&lt;script&gt;alert(1)&lt;/script&gt;"
        );
    }

    #[test]
    fn quotes_only_when_hardened() {
        let s = r#"<a href="x" title='y'>"#;
        assert_eq!(sanitize(s, false), r#"&lt;a href="x" title='y'&gt;"#);
        assert_eq!(
            sanitize(s, true),
            "&lt;a href=&quot;x&quot; title=&#39;y&#39;&gt;"
        );
    }

    #[test]
    fn idempotent() {
        for s in ["<b>bold</b>", "it's \"quoted\"", "a &lt; b", "plain", "<<>>"] {
            for hardened in [false, true] {
                let once = sanitize(s, hardened);
                assert_eq!(sanitize(&once, hardened), once, "sanitizing {s:?} twice");
            }
        }
    }

    #[test]
    fn typed_entities_display_decoded() {
        let stored = sanitize("a &lt; b <i>", true);
        assert_eq!(stored, "a &lt; b &lt;i&gt;");
        assert_eq!(display_text(&stored), "a < b <i>");
    }

    #[test]
    fn display_shows_what_was_typed() {
        bolero::check!()
            .with_type::<(String, bool)>()
            .for_each(|(s, hardened)| {
                if !s.contains('&') {
                    assert_eq!(display_text(&sanitize(s, *hardened)), *s);
                }
            });
    }

    #[test]
    fn no_markup_survives() {
        bolero::check!().with_type::<String>().for_each(|s| {
            let res = sanitize(s, true);
            assert!(!res.contains(['<', '>', '"', '\'']), "{s:?} gave {res:?}");
        });
    }
}
