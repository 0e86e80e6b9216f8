use crate::url::Converter as LinkConverter;
use pulldown_cmark::{html, CowStr, Event, LinkType, Options, Parser, Tag};
use std::fmt;
use std::path::Path;
use url::ParseError as UrlParseError;

/// The marker separating a post's summary from the rest of its body.
pub const FOLD_TAG: &str = "<!-- more -->";

/// Converts markdown to HTML, appending the result to `out`.
///
/// * `relative_source` is the path of the source file relative to the input
///   directory. Relative links to other markdown sources are resolved against
///   it and rewritten to the target's permalink.
/// * `markdown` is the body of the source file (front matter excluded).
pub fn to_html(
    out: &mut String,
    relative_source: &Path,
    markdown: &str,
) -> Result<(), Error> {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_FOOTNOTES);
    options.insert(Options::ENABLE_SMART_PUNCTUATION);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_TASKLISTS);

    let event_converter = EventConverter {
        link_converter: LinkConverter::new(relative_source)?,
    };
    let events = Parser::new_ext(markdown, options)
        .map(|ev| event_converter.convert(ev))
        .collect::<Result<Vec<Event>, UrlParseError>>()?;
    html::push_html(out, events.into_iter());
    Ok(())
}

/// Splits rendered HTML at the [`FOLD_TAG`]. Returns the summary and whether
/// the body was actually folded.
pub fn summary(body: &str) -> (&str, bool) {
    match body.find(FOLD_TAG) {
        Some(i) => (&body[..i], true),
        None => (body, false),
    }
}

struct EventConverter {
    link_converter: LinkConverter,
}

impl EventConverter {
    fn convert_tag<'b>(&self, tag: Tag<'b>) -> Result<Tag<'b>, UrlParseError> {
        Ok(match tag {
            // Links between sources (`hello.md`) need to point at the
            // published page (`/en/posts/hello/`).
            Tag::Link(
                link @ (LinkType::Inline
                | LinkType::Reference
                | LinkType::ReferenceUnknown
                | LinkType::Shortcut
                | LinkType::ShortcutUnknown
                | LinkType::Collapsed
                | LinkType::CollapsedUnknown),
                url,
                title,
            ) => match self.link_converter.convert(&url)? {
                Some(converted) => Tag::Link(link, CowStr::Boxed(converted.into_boxed_str()), title),
                None => Tag::Link(link, url, title),
            },
            _ => tag,
        })
    }

    fn convert<'b>(&self, ev: Event<'b>) -> Result<Event<'b>, UrlParseError> {
        Ok(match ev {
            Event::Start(tag) => Event::Start(self.convert_tag(tag)?),
            Event::End(tag) => Event::End(self.convert_tag(tag)?),
            _ => ev,
        })
    }
}

/// Represents an error converting markdown to HTML.
#[derive(Debug)]
pub enum Error {
    /// Returned when there is a problem parsing URLs.
    UrlParse(UrlParseError),
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::UrlParse(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::UrlParse(err) => Some(err),
        }
    }
}

impl From<UrlParseError> for Error {
    /// Converts a [`url::ParseError`] into an [`Error`]. It allows us to use
    /// the `?` operator for URL parsing and joining functions.
    fn from(err: UrlParseError) -> Error {
        Error::UrlParse(err)
    }
}
