//! Exports the [`build_site`] function which stitches together the high-level
//! steps of building the output static site: loading the global data
//! ([`crate::data`]), parsing the pages ([`crate::parser`]), rendering them
//! ([`crate::write`]), generating the feeds of each language
//! ([`crate::feed`]) and copying the passthrough assets
//! ([`crate::passthrough`]).

use log::{info, warn};
use serde_yaml::{Mapping, Value as Yaml};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::collection::Collections;
use crate::config::Config;
use crate::data::{self, Error as DataError};
use crate::feed::{self, Error as FeedError, FeedConfig};
use crate::i18n::Dictionary;
use crate::minify;
use crate::navigation::{language_home, Navigation};
use crate::page::{absolute_url, Page};
use crate::parser::{Error as ParseError, Parser};
use crate::passthrough::{self, Error as PassthroughError};
use crate::template::{Error as TemplateError, Templates};
use crate::write::{Error as WriteError, Writer};

/// The file marking an output directory as ours to clean.
pub const WATERMARK: &str = ".duoblog";

/// What a build produced.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Summary {
    /// The number of HTML (and other templated) files written.
    pub pages: usize,

    /// The number of feed files written.
    pub feeds: usize,

    /// The number of passthrough files copied.
    pub copied: usize,
}

/// The inputs of a site, loaded and validated but not yet written.
struct Site {
    data: Mapping,
    dictionary: Dictionary,
    navigation: Navigation,
    pages: Vec<Page>,
    templates: Templates,
}

impl Site {
    fn load(config: &Config) -> Result<Site> {
        info!("Loading data from {}", config.data_directory().display());
        let data = data::load(&config.data_directory())?;
        let dictionary = Dictionary::from_data(data.get(&Yaml::from("i18n")))
            .map_err(|err| Error::InvalidData { name: "i18n", err })?;
        let navigation = Navigation::from_data(data.get(&Yaml::from("navigation")))
            .map_err(|err| Error::InvalidData {
                name: "navigation",
                err,
            })?;

        let languages: Vec<&str> = config.language_codes().collect();
        for (key, lang) in dictionary.missing(&languages) {
            warn!("Missing `{}` translation for `{}`", lang, key);
        }

        info!("Parsing pages from {}", config.input_directory.display());
        let pages = Parser::new(config).parse_pages()?;

        info!("Loading templates from {}", config.includes_directory().display());
        let templates = Templates::load(&config.includes_directory())?;

        Ok(Site {
            data,
            dictionary,
            navigation,
            pages,
            templates,
        })
    }
}

/// Loads and validates everything a build needs without writing any output.
/// Returns the number of pages found.
pub fn check_site(config: &Config) -> Result<usize> {
    let site = Site::load(config)?;
    let collections = Collections::new(&site.pages, config.language_codes());
    for page in &site.pages {
        if let Some(layout) = &page.layout {
            site.templates.layout(layout)?;
        }
        if let Some(pagination) = &page.pagination {
            if collections.get(&pagination.collection).is_none() {
                return Err(Error::Write(WriteError::UnknownCollection {
                    page: page.source.clone(),
                    name: pagination.collection.clone(),
                }));
            }
        }
    }
    Ok(site.pages.len())
}

/// Builds the site from a [`Config`] object. This calls into
/// [`Parser::parse_pages`], [`Writer::write_pages`], [`feed::rss`],
/// [`feed::atom`] and [`passthrough::copy_all`] which do the heavy-lifting.
pub fn build_site(config: &Config) -> Result<Summary> {
    let site = Site::load(config)?;
    let collections = Collections::new(&site.pages, config.language_codes());

    prepare_output(&config.output_directory)?;

    info!(
        "Writing {} pages to {}",
        site.pages.len(),
        config.output_directory.display()
    );
    let writer = Writer {
        config,
        templates: &site.templates,
        data: &site.data,
        dictionary: &site.dictionary,
        navigation: &site.navigation,
        collections: &collections,
        pages: &site.pages,
    };
    let pages = writer.write_pages()?;

    info!("Writing feeds");
    let mut feeds = 0;
    for lang in config.language_codes() {
        feeds += write_feeds(config, &site.dictionary, lang, collections.posts(lang))?;
    }

    info!("Copying passthrough assets");
    let copied = passthrough::copy_all(config)?;

    Ok(Summary {
        pages,
        feeds,
        copied,
    })
}

// Writes `/<lang>/feed.xml` (RSS) and `/<lang>/feed.atom` (Atom). `posts`
// come oldest first.
fn write_feeds(
    config: &Config,
    dictionary: &Dictionary,
    lang: &str,
    posts: &[&Page],
) -> Result<usize> {
    let home = language_home(lang);
    let feed_config = FeedConfig {
        title: translated_or(dictionary, "title", lang, &config.title),
        description: translated_or(dictionary, "tagline", lang, &config.description),
        lang,
        author: config.author.as_ref(),
        site_root: &config.site_root,
        home_page: absolute_url(&config.site_root, &home),
        feed_url: absolute_url(&config.site_root, &format!("{}feed.atom", home)),
    };

    // feeds list the newest posts first
    let posts: Vec<&Page> = posts.iter().rev().copied().collect();
    let posts = posts.as_slice();

    let dir = config.output_directory.join(lang);
    std::fs::create_dir_all(&dir)?;
    let outputs = [
        ("feed.xml", feed::rss(&feed_config, posts)?),
        ("feed.atom", feed::atom(&feed_config, posts)),
    ];
    for (name, xml) in &outputs {
        let xml = match config.minify {
            true => minify::xml(xml),
            false => xml.clone(),
        };
        std::fs::write(dir.join(name), xml)?;
    }
    Ok(outputs.len())
}

fn translated_or(dictionary: &Dictionary, key: &str, lang: &str, fallback: &str) -> String {
    match dictionary.translate(key, lang) {
        translated if translated == key => fallback.to_owned(),
        translated => translated.to_owned(),
    }
}

// Deletes the output directory only if a previous build left the watermark
// in it. The watermark is only written into directories this build created
// or found empty; anything else is overwritten in place and never cleaned.
fn prepare_output(dir: &Path) -> Result<()> {
    if dir.join(WATERMARK).is_file() {
        info!("Cleaning {}", dir.display());
        std::fs::remove_dir_all(dir).map_err(|err| Error::Clean {
            path: dir.to_owned(),
            err,
        })?;
    } else if dir.exists() && std::fs::read_dir(dir)?.next().is_some() {
        warn!(
            "{} was not created by a previous build; overwriting files in place",
            dir.display()
        );
        return Ok(());
    }
    std::fs::create_dir_all(dir)?;
    std::fs::write(dir.join(WATERMARK), "")?;
    Ok(())
}

pub type Result<T> = std::result::Result<T, Error>;

/// The error type for building a site. Errors can be during loading data,
/// parsing, templating, writing, cleaning the output directory, creating
/// feeds, copying assets, and other I/O.
#[derive(Debug)]
pub enum Error {
    /// Returned for errors loading global data.
    Data(DataError),

    /// Returned when a data file the generator reads itself (`i18n`,
    /// `navigation`) has the wrong shape.
    InvalidData {
        name: &'static str,
        err: serde_yaml::Error,
    },

    /// Returned for errors during parsing.
    Parse(ParseError),

    /// Returned for errors loading templates.
    Template(TemplateError),

    /// Returned for errors writing [`Page`]s to disk as HTML files.
    Write(WriteError),

    /// Returned for I/O problems while cleaning the output directory.
    Clean { path: PathBuf, err: std::io::Error },

    /// Returned for errors creating a feed.
    Feed(FeedError),

    /// Returned for errors copying passthrough assets.
    Passthrough(PassthroughError),

    /// Returned for other I/O errors.
    Io(std::io::Error),
}

impl fmt::Display for Error {
    /// Implements [`fmt::Display`] for [`Error`].
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Data(err) => err.fmt(f),
            Error::InvalidData { name, err } => write!(f, "Invalid `{}` data: {}", name, err),
            Error::Parse(err) => err.fmt(f),
            Error::Template(err) => err.fmt(f),
            Error::Write(err) => err.fmt(f),
            Error::Clean { path, err } => {
                write!(f, "Cleaning directory '{}': {}", path.display(), err)
            }
            Error::Feed(err) => err.fmt(f),
            Error::Passthrough(err) => err.fmt(f),
            Error::Io(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    /// Implements [`std::error::Error`] for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Data(err) => Some(err),
            Error::InvalidData { name: _, err } => Some(err),
            Error::Parse(err) => Some(err),
            Error::Template(err) => Some(err),
            Error::Write(err) => Some(err),
            Error::Clean { path: _, err } => Some(err),
            Error::Feed(err) => Some(err),
            Error::Passthrough(err) => Some(err),
            Error::Io(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for Error {
    /// Converts [`std::io::Error`]s into [`Error`]. This allows us to use the
    /// `?` operator.
    fn from(err: std::io::Error) -> Error {
        Error::Io(err)
    }
}

impl From<DataError> for Error {
    /// Converts [`DataError`]s into [`Error`]. This allows us to use the `?`
    /// operator.
    fn from(err: DataError) -> Error {
        Error::Data(err)
    }
}

impl From<ParseError> for Error {
    /// Converts [`ParseError`]s into [`Error`]. This allows us to use the `?`
    /// operator.
    fn from(err: ParseError) -> Error {
        Error::Parse(err)
    }
}

impl From<TemplateError> for Error {
    /// Converts [`TemplateError`]s into [`Error`]. This allows us to use the
    /// `?` operator.
    fn from(err: TemplateError) -> Error {
        Error::Template(err)
    }
}

impl From<WriteError> for Error {
    /// Converts [`WriteError`]s into [`Error`]. This allows us to use the `?`
    /// operator.
    fn from(err: WriteError) -> Error {
        Error::Write(err)
    }
}

impl From<FeedError> for Error {
    /// Converts [`FeedError`]s into [`Error`]. This allows us to use the `?`
    /// operator.
    fn from(err: FeedError) -> Error {
        Error::Feed(err)
    }
}

impl From<PassthroughError> for Error {
    /// Converts [`PassthroughError`]s into [`Error`]. This allows us to use
    /// the `?` operator.
    fn from(err: PassthroughError) -> Error {
        Error::Passthrough(err)
    }
}
