//! Permalink rules and the conversion of links between source files into
//! links between output pages.
//!
//! Sources map to "pretty" permalinks: `en/posts/hello.md` is published at
//! `/en/posts/hello/` (written to `en/posts/hello/index.html`) and
//! `en/index.md` at `/en/`.

use std::path::{Component, Path, PathBuf};
use url::{ParseError, Url};

const MARKDOWN_EXTENSION: &str = ".md";
const INDEX_STEM: &str = "index";

/// Computes the permalink of a source file given its path relative to the
/// input directory.
pub fn permalink(relative_source: &Path) -> String {
    let mut segments: Vec<String> = relative_source
        .components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();

    if let Some(last) = segments.pop() {
        let stem = match Path::new(&last).file_stem() {
            Some(stem) => stem.to_string_lossy().into_owned(),
            None => last,
        };
        if stem != INDEX_STEM {
            segments.push(stem);
        }
    }

    let mut out = String::from("/");
    for segment in segments {
        out.push_str(&segment);
        out.push('/');
    }
    out
}

/// Computes the output file (relative to the output directory) for a
/// permalink. Directory-style permalinks get an `index.html`; permalinks
/// naming a file (`/404.html`, `/feed.xml`) are written as-is.
pub fn output_path(permalink: &str) -> PathBuf {
    let trimmed = permalink.trim_start_matches('/');
    let names_file = !permalink.ends_with('/')
        && trimmed
            .rsplit('/')
            .next()
            .map_or(false, |last| last.contains('.'));
    match names_file {
        true => PathBuf::from(trimmed),
        false => {
            let mut path = PathBuf::new();
            for segment in trimmed.split('/').filter(|s| !s.is_empty()) {
                path.push(segment);
            }
            path.join("index.html")
        }
    }
}

/// Normalizes a user-provided permalink: a leading slash is added, and a
/// trailing one unless the permalink names a file.
pub fn normalize_permalink(permalink: &str) -> String {
    let mut out = String::with_capacity(permalink.len() + 2);
    if !permalink.starts_with('/') {
        out.push('/');
    }
    out.push_str(permalink);
    let names_file = out
        .rsplit('/')
        .next()
        .map_or(false, |last| last.contains('.'));
    if !out.ends_with('/') && !names_file {
        out.push('/');
    }
    out
}

/// The first path segment of a permalink (`en` for `/en/posts/`).
pub fn first_segment(permalink: &str) -> Option<&str> {
    permalink
        .trim_start_matches('/')
        .split('/')
        .next()
        .filter(|s| !s.is_empty())
}

/// Replaces the leading language segment of `permalink`, e.g.
/// `/en/posts/x/` becomes `/pt/posts/x/`. Returns `None` if the permalink
/// doesn't start with `from`.
pub fn swap_language(permalink: &str, from: &str, to: &str) -> Option<String> {
    let prefix = format!("/{}/", from);
    permalink
        .strip_prefix(&prefix)
        .map(|rest| format!("/{}/{}", to, rest))
}

/// The permalink of page `number` (1-based) of a paginated page.
pub fn paginated(permalink: &str, number: usize) -> String {
    match number {
        0 | 1 => permalink.to_owned(),
        _ => format!("{}page/{}/", permalink, number),
    }
}

/// Converts links found in a source file. Relative links to other markdown
/// sources are rewritten to the permalink of the target page; everything else
/// is left alone.
pub struct Converter {
    base: Url,
}

impl Converter {
    /// Constructs a new `Converter` for links found in `relative_source` (the
    /// path of the source file relative to the input directory).
    pub fn new(relative_source: &Path) -> Result<Converter> {
        let source: Vec<String> = relative_source
            .components()
            .filter_map(|c| match c {
                Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
                _ => None,
            })
            .collect();
        Ok(Converter {
            base: Url::parse("file:///")?.join(&source.join("/"))?,
        })
    }

    /// Returns the rewritten link, or `None` if `link` should be kept as is.
    pub fn convert(&self, link: &str) -> Result<Option<String>> {
        if link.starts_with('/') || link.starts_with('#') {
            return Ok(None);
        }
        match Url::parse(link) {
            Ok(_) => return Ok(None),
            Err(ParseError::RelativeUrlWithoutBase) => (),
            Err(e) => return Err(e),
        }

        let (path, fragment) = match link.find('#') {
            Some(i) => (&link[..i], &link[i..]),
            None => (link, ""),
        };
        if !path.ends_with(MARKDOWN_EXTENSION) {
            return Ok(None);
        }

        let target = self.base.join(path)?;
        let target_path = target.path().trim_start_matches('/').to_owned();
        Ok(Some(format!(
            "{}{}",
            permalink(Path::new(&target_path)),
            fragment
        )))
    }
}

type Result<T> = std::result::Result<T, ParseError>;
