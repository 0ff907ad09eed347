use once_cell::sync::Lazy;
use regex::Regex;

static SCRIPT_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<script[^>]*>.*?</script\s*>").expect("valid script regex"));
static STYLE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<style[^>]*>.*?</style\s*>").expect("valid style regex"));
static CHROME_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<(?:nav|header|footer)\b[^>]*>.*?</(?:nav|header|footer)\s*>")
        .expect("valid chrome regex")
});
static TAG_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").expect("valid tag regex"));
static SPACE_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"[ \t]+").expect("valid space regex"));

// `&amp;` goes last so `&amp;lt;` decodes to `&lt;`, not `<`.
const ENTITIES: &[(&str, &str)] = &[
    ("&lt;", "<"),
    ("&gt;", ">"),
    ("&quot;", "\""),
    ("&#39;", "'"),
    ("&mdash;", "\u{2014}"),
    ("&ndash;", "\u{2013}"),
    ("&nbsp;", " "),
    ("&rarr;", "\u{2192}"),
    ("&larr;", "\u{2190}"),
    ("&amp;", "&"),
];

/// Reduces an HTML document to readable text, one non-blank line per line.
pub fn extract_text(html: &str) -> String {
    let html = SCRIPT_REGEX.replace_all(html, "");
    let html = STYLE_REGEX.replace_all(&html, "");
    let html = CHROME_REGEX.replace_all(&html, "");
    let text = TAG_REGEX.replace_all(&html, " ");

    let mut text = text.into_owned();
    for (entity, replacement) in ENTITIES {
        if text.contains(entity) {
            text = text.replace(entity, replacement);
        }
    }
    let text = SPACE_REGEX.replace_all(&text, " ");

    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_scripts_and_inline_tags() {
        let html = "<script>bad()</script><p>Hello <b>world</b></p>";
        assert_eq!(extract_text(html), "Hello world");
    }

    #[test]
    fn removes_page_chrome_and_styles() {
        let html = r#"<html><head><style type="text/css">body { color: red }</style></head>
<body>
  <header><h1>Site</h1></header>
  <nav class="top"><a href="/">Home</a></nav>
  <article>
    <p>First paragraph.</p>

    <p>Second   paragraph.</p>
  </article>
  <footer>Copyright</footer>
</body></html>"#;
        assert_eq!(extract_text(html), "First paragraph.\nSecond paragraph.");
    }

    #[test]
    fn decodes_common_entities() {
        let html = "<p>Fish &amp; chips &mdash; &lt;tasty&gt; &#39;yes&#39; &rarr; done</p>";
        assert_eq!(extract_text(html), "Fish & chips \u{2014} <tasty> 'yes' \u{2192} done");
    }

    #[test]
    fn does_not_double_decode_escaped_entities() {
        assert_eq!(extract_text("a &amp;lt; b"), "a &lt; b");
    }

    #[test]
    fn multiline_script_is_removed() {
        let html = "<SCRIPT type=\"module\">\nconst x = '<p>no</p>';\n</SCRIPT>\n<p>yes</p>";
        assert_eq!(extract_text(html), "yes");
    }

    #[test]
    fn malformed_markup_degrades() {
        assert_eq!(extract_text("<p>open <b>never closed"), "open never closed");
        assert_eq!(extract_text(""), "");
    }

    #[test]
    fn header_prefix_does_not_swallow_unrelated_tags() {
        let html = "<headline>Big news</headline>";
        assert_eq!(extract_text(html), "Big news");
    }
}
