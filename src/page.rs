//! Defines [`Page`], a parsed content file, and its conversion into a
//! template value.

use chrono::{DateTime, Utc};
use gtmpl_value::Value;
use serde::Deserialize;
use std::path::PathBuf;
use url::Url;

use crate::date::{self, DateLocale};
use crate::markdown;
use crate::value::{self, object};

/// The kind of source a page was parsed from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Kind {
    /// The body is markdown, already rendered to HTML.
    Markdown,

    /// The body is a template, rendered with the page's data at write time.
    Html,
}

/// Front matter `pagination` settings: render the page once per chunk of a
/// collection.
#[derive(Deserialize, Clone, Debug, PartialEq)]
pub struct Pagination {
    /// The name of the collection to paginate (e.g., `posts_en`).
    pub collection: String,

    /// Items per page. Defaults to the project's `index_page_size`.
    #[serde(default)]
    pub size: Option<usize>,

    /// Paginate the collection in reverse (e.g., newest posts first).
    #[serde(default)]
    pub reverse: bool,
}

/// A content file parsed from the input directory.
#[derive(Clone, Debug)]
pub struct Page {
    /// The source path relative to the input directory.
    pub source: PathBuf,

    pub kind: Kind,

    /// The page's permalink, e.g. `/en/posts/hello/`.
    pub url: String,

    /// The output file relative to the output directory.
    pub output_path: PathBuf,

    /// The page's language code.
    pub lang: String,

    /// The locale used for the page's readable dates.
    pub date_locale: DateLocale,

    pub title: String,

    pub date: DateTime<Utc>,

    /// The layout to wrap the page body in, if any.
    pub layout: Option<String>,

    pub pagination: Option<Pagination>,

    /// The complete front matter (always a mapping).
    pub data: serde_yaml::Value,

    /// The page body: HTML for markdown pages, template source for HTML
    /// pages.
    pub body: String,
}

impl Page {
    /// Returns the part of the body before the fold and whether the body was
    /// folded. HTML pages have no summary.
    pub fn summary(&self) -> (&str, bool) {
        match self.kind {
            Kind::Markdown => markdown::summary(&self.body),
            Kind::Html => ("", false),
        }
    }

    /// The source file name without extension, or the directory name for
    /// `index` files.
    pub fn file_slug(&self) -> String {
        let stem = self
            .source
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        match stem.as_str() {
            "index" => self
                .source
                .parent()
                .and_then(|p| p.file_name())
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default(),
            _ => stem,
        }
    }

    /// Converts the page into a template value. The result is a
    /// [`Value::Object`] with fields `url`, `absolute_url`, `lang`,
    /// `date_locale`, `title`, `date` (RFC 3339), `readable_date`, `summary`,
    /// `summarized`, `file_slug`, `input_path` and `data` (the front matter).
    pub fn to_value(&self, site_root: &Url) -> Value {
        let (summary, summarized) = self.summary();
        object(vec![
            ("url", Value::String(self.url.clone())),
            ("absolute_url", Value::String(self.absolute_url(site_root))),
            ("lang", Value::String(self.lang.clone())),
            (
                "date_locale",
                Value::String(self.date_locale.as_str().to_owned()),
            ),
            ("title", Value::String(self.title.clone())),
            ("date", Value::String(date::to_rfc3339(&self.date))),
            (
                "readable_date",
                Value::String(date::readable_date(&self.date, self.date_locale)),
            ),
            ("summary", Value::String(summary.to_owned())),
            ("summarized", Value::Bool(summarized)),
            ("file_slug", Value::String(self.file_slug())),
            (
                "input_path",
                Value::String(self.source.to_string_lossy().into_owned()),
            ),
            ("data", value::from_yaml(&self.data)),
        ])
    }

    /// The page's URL joined onto the site root.
    pub fn absolute_url(&self, site_root: &Url) -> String {
        absolute_url(site_root, &self.url)
    }
}

/// Joins a permalink onto the site root, keeping any path the site root has
/// (`https://example.org/blog/` + `/en/` = `https://example.org/blog/en/`).
pub fn absolute_url(site_root: &Url, permalink: &str) -> String {
    match site_root.join(permalink.trim_start_matches('/')) {
        Ok(url) => url.to_string(),
        Err(_) => format!("{}{}", site_root, permalink.trim_start_matches('/')),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::path::Path;

    fn page(source: &str, kind: Kind, body: &str) -> Page {
        Page {
            source: PathBuf::from(source),
            kind,
            url: crate::url::permalink(Path::new(source)),
            output_path: PathBuf::new(),
            lang: "en".to_owned(),
            date_locale: DateLocale::EnUs,
            title: "Hello".to_owned(),
            date: date::parse_date("2024-03-05").unwrap(),
            layout: None,
            pagination: None,
            data: serde_yaml::Value::Mapping(Default::default()),
            body: body.to_owned(),
        }
    }

    #[test]
    fn test_summary() {
        let p = page("en/posts/a.md", Kind::Markdown, "<p>a</p><!-- more --><p>b</p>");
        assert_eq!(("<p>a</p>", true), p.summary());
        let p = page("en/posts/index.html", Kind::Html, "{{ .content }}");
        assert_eq!(("", false), p.summary());
    }

    #[test]
    fn test_file_slug() {
        assert_eq!("a", page("en/posts/a.md", Kind::Markdown, "").file_slug());
        assert_eq!("posts", page("en/posts/index.html", Kind::Html, "").file_slug());
    }

    #[test]
    fn test_absolute_url() -> Result<(), url::ParseError> {
        let root = Url::parse("https://example.org/blog/")?;
        assert_eq!("https://example.org/blog/en/", absolute_url(&root, "/en/"));
        assert_eq!("https://example.org/blog/", absolute_url(&root, "/"));
        Ok(())
    }

    #[test]
    fn test_to_value() -> Result<(), url::ParseError> {
        let root = Url::parse("https://example.org/")?;
        let v = page("en/posts/a.md", Kind::Markdown, "<p>a</p>").to_value(&root);
        assert_eq!(
            Some(&Value::String("/en/posts/a/".to_owned())),
            value::field(&v, "url")
        );
        assert_eq!(
            Some(&Value::String("05 Mar 2024".to_owned())),
            value::field(&v, "readable_date")
        );
        assert_eq!(
            Some(&Value::String("2024-03-05T00:00:00Z".to_owned())),
            value::field(&v, "date")
        );
        Ok(())
    }
}
