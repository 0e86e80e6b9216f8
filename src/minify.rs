//! Output transforms: HTML minification and feed XML cleanup.

/// Minifies an HTML document: comments are dropped and whitespace collapsed.
/// Closing tags and the `<html>`/`<head>` opening tags are kept so pages stay
/// readable by naive consumers.
pub fn html(input: &[u8]) -> Vec<u8> {
    let mut cfg = minify_html::Cfg::new();
    cfg.keep_closing_tags = true;
    cfg.keep_html_and_head_opening_tags = true;
    cfg.keep_comments = false;
    cfg.minify_css = true;
    minify_html::minify(input, &cfg)
}

/// Cleans feed XML up by trimming every line and dropping blank ones. Line
/// breaks are kept since they may separate words inside text content.
pub fn xml(input: &str) -> String {
    input
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Whether an output file should go through [`html`].
pub fn is_html(path: &std::path::Path) -> bool {
    path.extension().map_or(false, |ext| ext == "html")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_html_collapses_whitespace() {
        let input = b"<html>\n  <head>\n  </head>\n  <body>\n    <p>Hello</p>\n  </body>\n</html>";
        let out = String::from_utf8_lossy(&html(input)).into_owned();
        assert!(!out.contains("\n  "));
        assert!(out.contains("<p>Hello</p>"));
        assert!(out.len() < input.len());
    }

    #[test]
    fn test_html_removes_comments() {
        let out = html(b"<p>kept</p><!-- dropped -->");
        let out = String::from_utf8_lossy(&out);
        assert!(out.contains("kept"));
        assert!(!out.contains("dropped"));
    }

    #[test]
    fn test_xml() {
        let input = "<?xml version=\"1.0\"?>\n<rss>\n\n  <channel>\n    <title>Sum to Zero</title>\n  </channel>\n</rss>\n";
        assert_eq!(
            "<?xml version=\"1.0\"?>\n<rss>\n<channel>\n<title>Sum to Zero</title>\n</channel>\n</rss>",
            xml(input)
        );
    }

    #[test]
    fn test_xml_keeps_words_apart() {
        let input = "<description><![CDATA[<p>Every small room rings at a\n    handful of low frequencies set by its\n    dimensions.</p>]]></description>\n";
        let out = xml(input);
        assert!(out.contains("set by its\ndimensions."));
        assert!(!out.contains("itsdimensions"));
        assert!(!out.contains("\n    "));
    }

    #[test]
    fn test_is_html() {
        assert!(is_html(Path::new("en/index.html")));
        assert!(!is_html(Path::new("en/feed.xml")));
        assert!(!is_html(Path::new("_redirects")));
    }
}
