use gtmpl_value::Value;
use log::debug;
use serde_yaml::{Mapping, Value as Yaml};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use crate::collection::Collections;
use crate::config::Config;
use crate::data::deep_merge;
use crate::i18n::Dictionary;
use crate::minify;
use crate::navigation::{self, Navigation};
use crate::page::{absolute_url, Kind, Page};
use crate::template::{self, Templates};
use crate::url;
use crate::value::{self, object, optional};

/// Responsible for templating and writing HTML pages to disk from [`Page`]
/// sources.
pub struct Writer<'a> {
    pub config: &'a Config,

    /// The layouts and partials.
    pub templates: &'a Templates,

    /// The global data. Each page's front matter is deep-merged over it.
    pub data: &'a Mapping,

    /// The interface strings; each page gets the table for its language as
    /// `.strings`.
    pub dictionary: &'a Dictionary,

    /// The site menu; each page gets it localized as `.nav`.
    pub navigation: &'a Navigation,

    pub collections: &'a Collections<'a>,

    pub pages: &'a [Page],
}

/// One output file. Paginated pages produce one [`Unit`] per page of items;
/// every other page produces exactly one.
struct Unit<'p> {
    page: &'p Page,

    /// The URL of this output file (differs from `page.url` for the second
    /// and later pages of a paginated page).
    url: String,

    /// The target location relative to the output directory.
    output_path: PathBuf,

    /// The URL for the previous page, if any.
    prev: Option<String>,

    /// The URL for the next page, if any.
    next: Option<String>,

    /// The `.pagination` value of paginated pages.
    pagination: Option<Value>,
}

impl Writer<'_> {
    /// Renders every page and writes it to the output directory. Returns
    /// the number of files written.
    pub fn write_pages(&self) -> Result<usize> {
        let shared = Shared {
            collections: self.collections.to_value(&self.config.site_root),
            site: self.site_value(),
            urls: self.pages.iter().map(|p| p.url.as_str()).collect(),
        };

        let mut seen_dirs: HashSet<PathBuf> = HashSet::new();
        let mut written = 0;
        for page in self.pages {
            let body_template = match page.kind {
                Kind::Html => Some(
                    self.templates
                        .parse_body(&page.source.to_string_lossy(), &page.body)?,
                ),
                Kind::Markdown => None,
            };
            for unit in self.units(page)? {
                let html = self.render(&unit, body_template.as_ref(), &shared)?;
                let path = self.config.output_directory.join(&unit.output_path);
                // there should always be a dir
                if let Some(dir) = path.parent() {
                    if seen_dirs.insert(dir.to_owned()) {
                        std::fs::create_dir_all(dir)?;
                    }
                }
                write_output(&path, html.as_bytes(), self.config.minify)?;
                debug!("wrote {}", path.display());
                written += 1;
            }
        }
        Ok(written)
    }

    fn units<'p>(&self, page: &'p Page) -> Result<Vec<Unit<'p>>> {
        let settings = match &page.pagination {
            Some(settings) => settings,
            None => {
                let (prev, next) = self.collections.neighbours(page);
                return Ok(vec![Unit {
                    page,
                    url: page.url.clone(),
                    output_path: page.output_path.clone(),
                    prev: prev.map(str::to_owned),
                    next: next.map(str::to_owned),
                    pagination: None,
                }]);
            }
        };

        let mut items: Vec<&Page> = self
            .collections
            .get(&settings.collection)
            .ok_or_else(|| Error::UnknownCollection {
                page: page.source.clone(),
                name: settings.collection.clone(),
            })?
            .to_vec();
        if settings.reverse {
            items.reverse();
        }
        let size = settings.size.unwrap_or(self.config.index_page_size).max(1);
        let total_pages = match items.len() % size {
            0 => (items.len() / size).max(1),
            _ => items.len() / size + 1,
        };

        (1..=total_pages)
            .map(|number| {
                let start = (number - 1) * size;
                let chunk = &items[start.min(items.len())..(start + size).min(items.len())];
                let url = url::paginated(&page.url, number);
                if number > 1 {
                    if let Some(other) = self.pages.iter().find(|p| p.url == url) {
                        return Err(Error::PaginationCollision {
                            url,
                            page: page.source.clone(),
                            other: other.source.clone(),
                        });
                    }
                }
                let prev = match number > 1 {
                    true => Some(url::paginated(&page.url, number - 1)),
                    false => None,
                };
                let next = match number < total_pages {
                    true => Some(url::paginated(&page.url, number + 1)),
                    false => None,
                };
                let pagination = object(vec![
                    (
                        "items",
                        Value::Array(
                            chunk
                                .iter()
                                .map(|p| p.to_value(&self.config.site_root))
                                .collect(),
                        ),
                    ),
                    ("page_number", Value::from(number as u64)),
                    ("total_pages", Value::from(total_pages as u64)),
                    ("prev", optional(prev.as_deref())),
                    ("next", optional(next.as_deref())),
                ]);
                Ok(Unit {
                    page,
                    output_path: match number {
                        1 => page.output_path.clone(),
                        _ => url::output_path(&url),
                    },
                    url,
                    prev,
                    next,
                    pagination: Some(pagination),
                })
            })
            .collect()
    }

    fn render(
        &self,
        unit: &Unit,
        body_template: Option<&gtmpl::Template>,
        shared: &Shared,
    ) -> Result<String> {
        let mut value = self.unit_value(unit, shared);
        let body = match body_template {
            Some(template) => template::render(template, value.clone())?,
            None => unit.page.body.clone(),
        };
        Ok(match &unit.page.layout {
            Some(layout) => {
                if let Value::Object(m) = &mut value {
                    m.insert("content".to_owned(), Value::String(body));
                }
                template::render(self.templates.layout(layout)?, value)?
            }
            None => body,
        })
    }

    /// Builds the template value for a unit: global data deep-merged with
    /// the page's front matter, plus `page`, `content`, `collections`,
    /// `strings`, `nav`, `alternates`, `site`, `prev`, `next` and
    /// `pagination`.
    fn unit_value(&self, unit: &Unit, shared: &Shared) -> Value {
        let page = unit.page;
        let mut data = Yaml::Mapping(self.data.clone());
        deep_merge(&mut data, page.data.clone());
        let mut m = match value::from_yaml(&data) {
            Value::Object(m) => m,
            _ => HashMap::new(),
        };

        let mut page_value = page.to_value(&self.config.site_root);
        if let Value::Object(fields) = &mut page_value {
            fields.insert("url".to_owned(), Value::String(unit.url.clone()));
            fields.insert(
                "absolute_url".to_owned(),
                Value::String(absolute_url(&self.config.site_root, &unit.url)),
            );
        }

        m.insert("page".to_owned(), page_value);
        m.insert("content".to_owned(), Value::String(String::new()));
        m.insert("collections".to_owned(), shared.collections.clone());
        m.insert(
            "strings".to_owned(),
            Value::Object(
                self.dictionary
                    .strings(&page.lang)
                    .into_iter()
                    .map(|(k, v)| (k, Value::String(v)))
                    .collect(),
            ),
        );
        m.insert(
            "nav".to_owned(),
            Value::Array(
                self.navigation
                    .localized(&page.lang, &page.url)
                    .iter()
                    .map(navigation::Item::to_value)
                    .collect(),
            ),
        );
        m.insert(
            "alternates".to_owned(),
            Value::Array(
                self.alternates(page, &shared.urls)
                    .into_iter()
                    .map(|(lang, url)| {
                        object(vec![
                            ("lang", Value::String(lang)),
                            ("url", Value::String(url)),
                        ])
                    })
                    .collect(),
            ),
        );
        m.insert("site".to_owned(), shared.site.clone());
        m.insert("prev".to_owned(), optional(unit.prev.as_deref()));
        m.insert("next".to_owned(), optional(unit.next.as_deref()));
        m.insert(
            "pagination".to_owned(),
            unit.pagination.clone().unwrap_or(Value::Nil),
        );
        Value::Object(m)
    }

    /// Finds the counterpart of `page` in every other language: the
    /// navigation's translation of its URL, else the same path under the
    /// other language if such a page exists, else that language's home page.
    fn alternates(&self, page: &Page, urls: &HashSet<&str>) -> Vec<(String, String)> {
        self.config
            .language_codes()
            .filter(|code| *code != page.lang)
            .map(|code| {
                let url = match self.navigation.translate_url(&page.url, code) {
                    Some(url) => url.to_owned(),
                    None => match url::swap_language(&page.url, &page.lang, code) {
                        Some(swapped) if urls.contains(swapped.as_str()) => swapped,
                        _ => navigation::language_home(code),
                    },
                };
                (code.to_owned(), url)
            })
            .collect()
    }

    fn site_value(&self) -> Value {
        let config = self.config;
        object(vec![
            ("title", Value::String(config.title.clone())),
            ("description", Value::String(config.description.clone())),
            ("url", Value::String(config.site_root.to_string())),
            (
                "default_language",
                Value::String(config.default_language.clone()),
            ),
            (
                "languages",
                Value::Array(
                    config
                        .language_codes()
                        .map(|code| Value::String(code.to_owned()))
                        .collect(),
                ),
            ),
        ])
    }
}

/// Values that are identical for every page.
struct Shared<'a> {
    collections: Value,
    site: Value,
    urls: HashSet<&'a str>,
}

fn write_output(path: &Path, contents: &[u8], minified: bool) -> io::Result<()> {
    if minified && minify::is_html(path) {
        std::fs::write(path, minify::html(contents))
    } else {
        std::fs::write(path, contents)
    }
}

/// The result of a fallible page-writing operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error in a page-writing operation.
#[derive(Debug)]
pub enum Error {
    /// An error loading or applying a template.
    Template(template::Error),

    /// A page paginates a collection that doesn't exist.
    UnknownCollection { page: PathBuf, name: String },

    /// A later page of a paginated page has the permalink of another page.
    PaginationCollision {
        url: String,
        page: PathBuf,
        other: PathBuf,
    },

    /// An error writing the output files.
    Io(io::Error),
}

impl From<io::Error> for Error {
    /// Converts an [`io::Error`] into an [`Error`]. This allows us to use the
    /// `?` operator for fallible I/O operations.
    fn from(err: io::Error) -> Error {
        Error::Io(err)
    }
}

impl From<template::Error> for Error {
    /// Converts a [`template::Error`] into an [`Error`]. This allows us to
    /// use the `?` operator for fallible template operations.
    fn from(err: template::Error) -> Error {
        Error::Template(err)
    }
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as presentable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Template(err) => err.fmt(f),
            Error::UnknownCollection { page, name } => write!(
                f,
                "`{}` paginates unknown collection `{}`",
                page.display(),
                name
            ),
            Error::PaginationCollision { url, page, other } => write!(
                f,
                "`{}` paginates onto `{}`, the permalink of `{}`",
                page.display(),
                url,
                other.display()
            ),
            Error::Io(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Template(err) => Some(err),
            Error::UnknownCollection { .. } => None,
            Error::PaginationCollision { .. } => None,
            Error::Io(err) => Some(err),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::config::Language;
    use crate::date::{parse_date, DateLocale};
    use crate::page::Pagination;
    use crate::value::field;
    use ::url::Url;

    fn config() -> Config {
        Config {
            project_root: PathBuf::from("/blog"),
            site_root: Url::parse("https://example.org/").unwrap(),
            title: "Sum to Zero".to_owned(),
            description: String::new(),
            author: None,
            default_language: "en".to_owned(),
            languages: vec![Language::new("en"), Language::new("pt")],
            input_directory: PathBuf::from("/blog/src"),
            output_directory: PathBuf::from("/blog/_site"),
            index_page_size: 2,
            minify: false,
            passthrough: Vec::new(),
        }
    }

    fn page(url: &str, date: &str, pagination: Option<&str>) -> Page {
        let lang = url::first_segment(url).unwrap_or("en").to_owned();
        Page {
            source: PathBuf::from(format!("{}.md", url.trim_matches('/'))),
            kind: Kind::Markdown,
            url: url.to_owned(),
            output_path: url::output_path(url),
            date_locale: DateLocale::for_language(&lang),
            lang,
            title: String::new(),
            date: parse_date(date).unwrap(),
            layout: None,
            pagination: pagination.map(|yaml| serde_yaml::from_str::<Pagination>(yaml).unwrap()),
            data: Yaml::Mapping(Default::default()),
            body: String::new(),
        }
    }

    fn posts() -> Vec<Page> {
        vec![
            page("/en/posts/a/", "2024-01-01", None),
            page("/en/posts/b/", "2024-02-01", None),
            page("/en/posts/c/", "2024-03-01", None),
            page("/en/posts/d/", "2024-04-01", None),
        ]
    }

    fn with_writer<T>(pages: &[Page], f: impl FnOnce(&Writer) -> T) -> T {
        let config = config();
        let templates = Templates::load(Path::new("./testdata/no-such-includes")).unwrap();
        let data = Mapping::new();
        let dictionary = Dictionary::default();
        let navigation: Navigation = serde_yaml::from_str(
            "- key: about\n  urls: {en: /en/about/, pt: /pt/sobre/}\n",
        )
        .unwrap();
        let collections = Collections::new(pages, config.language_codes());
        f(&Writer {
            config: &config,
            templates: &templates,
            data: &data,
            dictionary: &dictionary,
            navigation: &navigation,
            collections: &collections,
            pages,
        })
    }

    fn item_urls(unit: &Unit) -> Vec<String> {
        let items = unit.pagination.as_ref().and_then(|p| field(p, "items"));
        match items {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|item| match field(item, "url") {
                    Some(Value::String(url)) => Some(url.clone()),
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        }
    }

    fn total_pages(unit: &Unit) -> Option<Value> {
        unit.pagination
            .as_ref()
            .and_then(|p| field(p, "total_pages"))
            .cloned()
    }

    #[test]
    fn test_units_exact_multiple() -> Result<()> {
        let mut pages = posts();
        pages.push(page("/en/posts/", "2024-01-01", Some("collection: posts_en")));
        with_writer(&pages, |writer| {
            // size falls back to `index_page_size` (2), so 4 posts fill two pages
            let units = writer.units(&pages[4])?;
            assert_eq!(2, units.len());
            assert_eq!("/en/posts/", units[0].url);
            assert_eq!(PathBuf::from("en/posts/index.html"), units[0].output_path);
            assert_eq!("/en/posts/page/2/", units[1].url);
            assert_eq!(
                PathBuf::from("en/posts/page/2/index.html"),
                units[1].output_path
            );
            assert_eq!(None, units[0].prev);
            assert_eq!(Some("/en/posts/page/2/"), units[0].next.as_deref());
            assert_eq!(Some("/en/posts/"), units[1].prev.as_deref());
            assert_eq!(None, units[1].next);
            assert_eq!(Some(Value::from(2u64)), total_pages(&units[1]));
            assert_eq!(vec!["/en/posts/a/", "/en/posts/b/"], item_urls(&units[0]));
            Ok(())
        })
    }

    #[test]
    fn test_units_size_and_reverse() -> Result<()> {
        let mut pages = posts();
        pages.push(page(
            "/en/posts/",
            "2024-01-01",
            Some("collection: posts_en\nsize: 3\nreverse: true"),
        ));
        with_writer(&pages, |writer| {
            let units = writer.units(&pages[4])?;
            assert_eq!(2, units.len());
            assert_eq!(
                vec!["/en/posts/d/", "/en/posts/c/", "/en/posts/b/"],
                item_urls(&units[0])
            );
            assert_eq!(vec!["/en/posts/a/"], item_urls(&units[1]));
            Ok(())
        })
    }

    #[test]
    fn test_units_empty_collection() -> Result<()> {
        let pages = vec![page("/pt/posts/", "2024-01-01", Some("collection: posts_pt"))];
        with_writer(&pages, |writer| {
            let units = writer.units(&pages[0])?;
            assert_eq!(1, units.len());
            assert_eq!(Some(Value::from(1u64)), total_pages(&units[0]));
            assert!(item_urls(&units[0]).is_empty());
            assert_eq!((None, None), (units[0].prev.clone(), units[0].next.clone()));
            Ok(())
        })
    }

    #[test]
    fn test_units_unknown_collection() {
        let pages = vec![page("/en/posts/", "2024-01-01", Some("collection: posts_es"))];
        with_writer(&pages, |writer| match writer.units(&pages[0]) {
            Err(Error::UnknownCollection { name, .. }) => assert_eq!("posts_es", name),
            Err(other) => panic!("unexpected error: {}", other),
            Ok(_) => panic!("expected an unknown collection error"),
        })
    }

    #[test]
    fn test_units_pagination_collision() {
        let mut pages = posts();
        pages.push(page("/en/posts/", "2024-01-01", Some("collection: posts_en")));
        pages.push(page("/en/posts/page/2/", "2024-01-01", None));
        with_writer(&pages, |writer| match writer.units(&pages[4]) {
            Err(Error::PaginationCollision { url, other, .. }) => {
                assert_eq!("/en/posts/page/2/", url);
                assert_eq!(PathBuf::from("en/posts/page/2.md"), other);
            }
            Err(other) => panic!("unexpected error: {}", other),
            Ok(_) => panic!("expected a pagination collision"),
        })
    }

    #[test]
    fn test_units_post_neighbours() -> Result<()> {
        let pages = posts();
        with_writer(&pages, |writer| {
            let units = writer.units(&pages[1])?;
            assert_eq!(1, units.len());
            assert_eq!(Some("/en/posts/a/"), units[0].prev.as_deref());
            assert_eq!(Some("/en/posts/c/"), units[0].next.as_deref());
            assert!(units[0].pagination.is_none());
            Ok(())
        })
    }

    #[test]
    fn test_alternates() {
        let pages = vec![
            page("/en/about/", "2024-01-01", None),
            page("/en/posts/a/", "2024-01-01", None),
            page("/pt/posts/a/", "2024-01-01", None),
            page("/en/posts/b/", "2024-01-01", None),
        ];
        with_writer(&pages, |writer| {
            let urls: HashSet<&str> = pages.iter().map(|p| p.url.as_str()).collect();
            let alternates = |page: &Page| writer.alternates(page, &urls);

            // the menu knows the translation
            assert_eq!(vec![("pt".to_owned(), "/pt/sobre/".to_owned())], alternates(&pages[0]));
            // the same path exists in the other language
            assert_eq!(
                vec![("pt".to_owned(), "/pt/posts/a/".to_owned())],
                alternates(&pages[1])
            );
            // otherwise the other language's home page
            assert_eq!(vec![("pt".to_owned(), "/pt/".to_owned())], alternates(&pages[3]));
            assert_eq!(
                vec![("en".to_owned(), "/en/posts/a/".to_owned())],
                alternates(&pages[2])
            );
        })
    }
}
