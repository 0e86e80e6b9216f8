//! Defines the [`Parser`] and [`Error`] types: the logic for parsing content
//! files from the input directory into [`Page`]s.

use chrono::{DateTime, Utc};
use log::debug;
use serde::{de, Deserialize, Deserializer};
use std::{
    collections::HashMap,
    fmt,
    fs::File,
    path::{Path, PathBuf},
};
use walkdir::{DirEntry, WalkDir};

use crate::{
    config::Config,
    date, markdown,
    page::{Kind, Page, Pagination},
    url,
};

/// Parses [`Page`] objects from source files.
pub struct Parser<'a> {
    config: &'a Config,
}

#[derive(Deserialize, Default)]
struct Frontmatter {
    #[serde(default, deserialize_with = "scalar")]
    title: Option<String>,

    #[serde(default, deserialize_with = "scalar")]
    date: Option<String>,

    #[serde(default)]
    lang: Option<String>,

    #[serde(default)]
    layout: Option<String>,

    #[serde(default)]
    permalink: Option<String>,

    #[serde(default)]
    pagination: Option<Pagination>,
}

const FENCE: &str = "---";

// Accepts any YAML scalar as a string, so `title: 1999` is the title "1999".
fn scalar<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<serde_yaml::Value>::deserialize(deserializer)? {
        None | Some(serde_yaml::Value::Null) => None,
        Some(serde_yaml::Value::String(s)) => Some(s),
        Some(serde_yaml::Value::Number(n)) => Some(n.to_string()),
        Some(serde_yaml::Value::Bool(b)) => Some(b.to_string()),
        Some(_) => return Err(de::Error::custom("expected a string, number or boolean")),
    })
}

impl<'a> Parser<'a> {
    pub fn new(config: &'a Config) -> Parser<'a> {
        Parser { config }
    }

    /// Searches the input directory for content files (`.md` and `.html`)
    /// and returns them sorted by URL. Files and directories whose names
    /// start with `_` are skipped, as is everything under a passthrough
    /// path. Each content file is structured as follows:
    ///
    /// 1. Optional YAML front matter between two `---` lines
    /// 2. Body (markdown or an HTML template)
    ///
    /// For example:
    ///
    /// ```md
    /// ---
    /// title: Hello, world!
    /// date: 2021-04-16
    /// layout: post.html
    /// ---
    /// # Hello
    ///
    /// World
    /// ```
    pub fn parse_pages(&self) -> Result<Vec<Page>> {
        let input = &self.config.input_directory;
        let mut pages = Vec::new();
        let walker = WalkDir::new(input)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| !self.is_skipped(entry));
        for result in walker {
            let entry = result?;
            if !entry.file_type().is_file() {
                continue;
            }
            let kind = match entry.path().extension().and_then(|e| e.to_str()) {
                Some("md") => Kind::Markdown,
                Some("html") => Kind::Html,
                _ => continue,
            };
            // strip_prefix() should never fail since walkdir yields paths
            // under `input`
            let relative = match entry.path().strip_prefix(input) {
                Ok(relative) => relative,
                Err(_) => continue,
            };
            pages.push(self.parse_page(relative, kind)?);
        }

        let mut seen: HashMap<&str, &Path> = HashMap::new();
        for page in &pages {
            if let Some(first) = seen.insert(&page.url, &page.source) {
                return Err(Error::DuplicatePermalink {
                    url: page.url.clone(),
                    first: first.to_owned(),
                    second: page.source.clone(),
                });
            }
        }

        pages.sort_by(|a, b| a.url.cmp(&b.url));
        Ok(pages)
    }

    fn is_skipped(&self, entry: &DirEntry) -> bool {
        if entry.depth() == 0 {
            return false;
        }
        let underscored = entry
            .file_name()
            .to_str()
            .map_or(false, |name| name.starts_with('_'));
        underscored || self.config.passthrough.iter().any(|p| entry.path() == p)
    }

    /// Parses a single [`Page`] from its path relative to the input
    /// directory.
    pub fn parse_page(&self, relative_path: &Path, kind: Kind) -> Result<Page> {
        match self._parse_page(relative_path, kind) {
            Ok(p) => Ok(p),
            Err(e) => Err(Error::Annotated(
                format!("parsing page `{}`", relative_path.display()),
                Box::new(e),
            )),
        }
    }

    fn _parse_page(&self, relative_path: &Path, kind: Kind) -> Result<Page> {
        debug!("parsing {}", relative_path.display());
        use std::io::Read;
        let full_path = self.config.input_directory.join(relative_path);
        let mut contents = String::new();
        let mut file = File::open(&full_path)?;
        file.read_to_string(&mut contents)?;

        let (yaml, body) = split_frontmatter(&contents)?;
        let data: serde_yaml::Value = match yaml {
            Some(yaml) => serde_yaml::from_str(yaml)?,
            None => serde_yaml::Value::Null,
        };
        let data = match data {
            serde_yaml::Value::Null => serde_yaml::Value::Mapping(Default::default()),
            mapping @ serde_yaml::Value::Mapping(_) => mapping,
            _ => return Err(Error::FrontmatterNotMapping),
        };
        let frontmatter: Frontmatter = serde_yaml::from_value(data.clone())?;

        let date: DateTime<Utc> = match &frontmatter.date {
            Some(value) => date::parse_date(value).map_err(|err| Error::InvalidDate {
                value: value.clone(),
                err,
            })?,
            None => DateTime::from(file.metadata()?.modified()?),
        };

        let permalink = match &frontmatter.permalink {
            Some(permalink) => url::normalize_permalink(permalink),
            None => url::permalink(relative_path),
        };

        let lang = match frontmatter.lang {
            Some(lang) => match self.config.language(&lang) {
                Some(_) => lang,
                None => return Err(Error::UnknownLanguage(lang)),
            },
            None => match url::first_segment(&permalink) {
                Some(segment) if self.config.language(segment).is_some() => segment.to_owned(),
                _ => self.config.default_language.clone(),
            },
        };
        let date_locale = match self.config.language(&lang) {
            Some(language) => language.date_locale,
            None => date::DateLocale::for_language(&lang),
        };

        let body = match kind {
            Kind::Markdown => {
                let mut html = String::new();
                markdown::to_html(&mut html, relative_path, body)?;
                html
            }
            Kind::Html => body.to_owned(),
        };

        Ok(Page {
            source: relative_path.to_owned(),
            kind,
            output_path: url::output_path(&permalink),
            url: permalink,
            lang,
            date_locale,
            title: frontmatter.title.unwrap_or_default(),
            date,
            layout: frontmatter.layout,
            pagination: frontmatter.pagination,
            data,
            body,
        })
    }
}

/// Splits a source file into its YAML front matter (if any) and its body.
fn split_frontmatter(input: &str) -> Result<(Option<&str>, &str)> {
    let input = input.strip_prefix('\u{feff}').unwrap_or(input);
    let rest = match input.strip_prefix(FENCE) {
        Some(rest) if rest.starts_with('\n') || rest.starts_with("\r\n") => rest,
        _ => return Ok((None, input)),
    };

    // The first line is what remains of the opening fence line.
    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if offset > 0 && line.trim_end() == FENCE {
            return Ok((Some(&rest[..offset]), &rest[offset + line.len()..]));
        }
        offset += line.len();
    }
    Err(Error::FrontmatterMissingEndFence)
}

/// Represents the result of a [`Page`]-parse operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error parsing a [`Page`] object.
#[derive(Debug)]
pub enum Error {
    /// Returned when a source file opens a front matter fence (`---`) but
    /// never closes it.
    FrontmatterMissingEndFence,

    /// Returned when the front matter isn't a YAML mapping.
    FrontmatterNotMapping,

    /// Returned when there was an error parsing the front matter as YAML.
    DeserializeYaml(serde_yaml::Error),

    /// Returned when the front matter `date` can't be parsed.
    InvalidDate {
        value: String,
        err: chrono::ParseError,
    },

    /// Returned when the front matter names a language that isn't
    /// configured.
    UnknownLanguage(String),

    /// Returned when two source files map to the same permalink.
    DuplicatePermalink {
        url: String,
        first: PathBuf,
        second: PathBuf,
    },

    /// Returned when the markdown body can't be converted.
    Markdown(markdown::Error),

    /// Returned for other I/O errors.
    Io(std::io::Error),

    /// Returned for WalkDir I/O errors.
    WalkDir(walkdir::Error),

    /// An error with an annotation.
    Annotated(String, Box<Error>),
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::FrontmatterMissingEndFence => {
                write!(f, "Missing closing `---`")
            }
            Error::FrontmatterNotMapping => {
                write!(f, "Front matter must be a YAML mapping")
            }
            Error::DeserializeYaml(err) => err.fmt(f),
            Error::InvalidDate { value, err } => {
                write!(f, "invalid date `{}`: {}", value, err)
            }
            Error::UnknownLanguage(lang) => {
                write!(f, "language `{}` is not configured", lang)
            }
            Error::DuplicatePermalink { url, first, second } => write!(
                f,
                "`{}` and `{}` are both published at `{}`",
                first.display(),
                second.display(),
                url
            ),
            Error::Markdown(err) => err.fmt(f),
            Error::Io(err) => err.fmt(f),
            Error::WalkDir(err) => err.fmt(f),
            Error::Annotated(annotation, err) => {
                write!(f, "{}: {}", &annotation, err)
            }
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::FrontmatterMissingEndFence => None,
            Error::FrontmatterNotMapping => None,
            Error::DeserializeYaml(err) => Some(err),
            Error::InvalidDate { value: _, err } => Some(err),
            Error::UnknownLanguage(_) => None,
            Error::DuplicatePermalink { .. } => None,
            Error::Markdown(err) => Some(err),
            Error::Io(err) => Some(err),
            Error::WalkDir(err) => Some(err),
            Error::Annotated(_, err) => Some(err),
        }
    }
}

impl From<markdown::Error> for Error {
    fn from(err: markdown::Error) -> Error {
        Error::Markdown(err)
    }
}

impl From<serde_yaml::Error> for Error {
    /// Converts a [`serde_yaml::Error`] into an [`Error`]. It allows us to use
    /// the `?` operator for [`serde_yaml`] deserialization functions.
    fn from(err: serde_yaml::Error) -> Error {
        Error::DeserializeYaml(err)
    }
}

impl From<walkdir::Error> for Error {
    /// Converts a [`walkdir::Error`] into an [`Error`]. It allows us to
    /// use the `?` operator for directory walks.
    fn from(err: walkdir::Error) -> Error {
        Error::WalkDir(err)
    }
}

impl From<std::io::Error> for Error {
    /// Converts a [`std::io::Error`] into an [`Error`]. It allows us to
    /// use the `?` operator for fallible I/O functions.
    fn from(err: std::io::Error) -> Error {
        Error::Io(err)
    }
}
