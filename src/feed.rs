//! Support for creating per-language RSS and Atom feeds from a list of
//! posts.

use crate::config::Author;
use crate::page::Page;
use atom_syndication::{
    Entry, EntryBuilder, FeedBuilder, FixedDateTime, Link, LinkBuilder, Person, PersonBuilder,
    Text,
};
use chrono::{DateTime, Utc};
use rss::validation::{Validate, ValidationError};
use rss::{ChannelBuilder, GuidBuilder, Item, ItemBuilder};
use std::fmt;
use url::Url;

/// Bundled configuration for creating the feeds of one language.
pub struct FeedConfig<'a> {
    pub title: String,
    pub description: String,
    pub lang: &'a str,
    pub author: Option<&'a Author>,

    /// The site root; post permalinks are joined onto it.
    pub site_root: &'a Url,

    /// The absolute URL of the language's home page.
    pub home_page: String,

    /// The absolute URL the feed itself is published at.
    pub feed_url: String,
}

/// Creates an RSS 2.0 channel from some configuration ([`FeedConfig`]) and a
/// list of [`Page`]s (newest first) and returns it as XML.
pub fn rss(config: &FeedConfig, posts: &[&Page]) -> Result<String> {
    let items: Vec<Item> = posts.iter().map(|post| rss_item(config, post)).collect();
    let channel = ChannelBuilder::default()
        .title(config.title.clone())
        .link(config.home_page.clone())
        .description(config.description.clone())
        .language(Some(config.lang.to_owned()))
        .last_build_date(Some(Utc::now().to_rfc2822()))
        .items(items)
        .build();
    channel.validate()?;
    Ok(channel.to_string())
}

fn rss_item(config: &FeedConfig, post: &Page) -> Item {
    let link = post.absolute_url(config.site_root);
    let (summary, _) = post.summary();
    ItemBuilder::default()
        .title(Some(post.title.clone()))
        .link(Some(link.clone()))
        .guid(Some(GuidBuilder::default().permalink(true).value(link).build()))
        .description(Some(summary.to_owned()))
        .pub_date(Some(post.date.to_rfc2822()))
        .author(config.author.and_then(rss_author))
        .build()
}

// RSS wants `email (Name)`; without an email there is nothing valid to put
// there.
fn rss_author(author: &Author) -> Option<String> {
    author
        .email
        .as_ref()
        .map(|email| format!("{} ({})", email, author.name))
}

/// Creates an Atom feed from some configuration ([`FeedConfig`]) and a list
/// of [`Page`]s (newest first) and returns it as XML.
pub fn atom(config: &FeedConfig, posts: &[&Page]) -> String {
    let updated = posts
        .iter()
        .map(|p| p.date)
        .max()
        .unwrap_or_else(Utc::now);

    let entries: Vec<Entry> = posts
        .iter()
        .map(|post| {
            let link = post.absolute_url(config.site_root);
            let (summary, _) = post.summary();
            EntryBuilder::default()
                .title(Text::plain(post.title.clone()))
                .id(link.clone())
                .updated(fixed(post.date))
                .published(Some(fixed(post.date)))
                .authors(author_to_people(config.author))
                .links(vec![alternate_link(link)])
                .summary(Some(Text::html(summary.to_owned())))
                .build()
        })
        .collect();

    let self_link: Link = LinkBuilder::default()
        .href(config.feed_url.clone())
        .rel("self".to_string())
        .mime_type(Some("application/atom+xml".to_string()))
        .build();

    FeedBuilder::default()
        .title(Text::plain(config.title.clone()))
        .subtitle(Some(Text::plain(config.description.clone())))
        .id(config.home_page.clone())
        .updated(fixed(updated))
        .authors(author_to_people(config.author))
        .links(vec![self_link, alternate_link(config.home_page.clone())])
        .lang(Some(config.lang.to_owned()))
        .entries(entries)
        .build()
        .to_string()
}

fn fixed(date: DateTime<Utc>) -> FixedDateTime {
    date.fixed_offset()
}

fn alternate_link(href: String) -> Link {
    LinkBuilder::default()
        .href(href)
        .rel("alternate".to_string())
        .build()
}

fn author_to_people(author: Option<&Author>) -> Vec<Person> {
    match author {
        Some(author) => vec![PersonBuilder::default()
            .name(author.name.clone())
            .email(author.email.clone())
            .build()],
        None => Vec::new(),
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Represents a problem creating a feed.
#[derive(Debug)]
pub enum Error {
    /// Returned when the generated RSS channel is invalid (e.g., a bad
    /// link).
    RssValidation(ValidationError),
}

impl fmt::Display for Error {
    /// Implements [`fmt::Display`] for [`Error`].
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::RssValidation(err) => write!(f, "invalid RSS feed: {}", err),
        }
    }
}

impl std::error::Error for Error {
    /// Implements [`std::error::Error`] for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::RssValidation(err) => Some(err),
        }
    }
}

impl From<ValidationError> for Error {
    /// Converts [`ValidationError`]s into [`Error`]. This allows us to use
    /// the `?` operator in fallible feed operations.
    fn from(err: ValidationError) -> Error {
        Error::RssValidation(err)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::date::{parse_date, DateLocale};
    use crate::page::Kind;
    use std::path::PathBuf;

    fn post(url: &str, title: &str, date: &str, body: &str) -> Page {
        Page {
            source: PathBuf::from("en/posts/x.md"),
            kind: Kind::Markdown,
            url: url.to_owned(),
            output_path: PathBuf::new(),
            lang: "en".to_owned(),
            date_locale: DateLocale::EnUs,
            title: title.to_owned(),
            date: parse_date(date).unwrap(),
            layout: None,
            pagination: None,
            data: serde_yaml::Value::Mapping(Default::default()),
            body: body.to_owned(),
        }
    }

    fn fixture<'a>(root: &'a Url, author: Option<&'a Author>) -> FeedConfig<'a> {
        FeedConfig {
            title: "Sum to Zero".to_owned(),
            description: "a blog about audio".to_owned(),
            lang: "en",
            author,
            site_root: root,
            home_page: "https://example.org/en/".to_owned(),
            feed_url: "https://example.org/en/feed.atom".to_owned(),
        }
    }

    #[test]
    fn test_rss() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let root = Url::parse("https://example.org/")?;
        let author = Author {
            name: "Ana".to_owned(),
            email: Some("ana@example.org".to_owned()),
        };
        let posts = vec![
            post("/en/posts/b/", "Bass traps", "2024-03-05", "<p>b</p><!-- more --><p>rest</p>"),
            post("/en/posts/a/", "Room modes", "2024-01-01", "<p>a</p>"),
        ];
        let refs: Vec<&Page> = posts.iter().collect();
        let xml = rss(&fixture(&root, Some(&author)), &refs)?;
        let channel = rss::Channel::read_from(xml.as_bytes())?;
        assert_eq!("Sum to Zero", channel.title());
        assert_eq!(Some("en"), channel.language());
        assert_eq!(2, channel.items().len());
        let first = &channel.items()[0];
        assert_eq!(Some("Bass traps"), first.title());
        assert_eq!(Some("https://example.org/en/posts/b/"), first.link());
        assert_eq!(Some("<p>b</p>"), first.description());
        assert_eq!(Some("ana@example.org (Ana)"), first.author());
        Ok(())
    }

    #[test]
    fn test_atom() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let root = Url::parse("https://example.org/")?;
        let posts = vec![post("/en/posts/a/", "Room modes", "2024-01-01", "<p>a</p>")];
        let refs: Vec<&Page> = posts.iter().collect();
        let xml = atom(&fixture(&root, None), &refs);
        let feed: atom_syndication::Feed = xml.parse()?;
        assert_eq!("Sum to Zero", feed.title().as_str());
        assert_eq!(1, feed.entries().len());
        assert_eq!("https://example.org/en/posts/a/", feed.entries()[0].id());
        assert_eq!("2024-01-01T00:00:00+00:00", feed.updated().to_rfc3339());
        Ok(())
    }

    #[test]
    fn test_empty_feeds() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let root = Url::parse("https://example.org/")?;
        let xml = rss(&fixture(&root, None), &[])?;
        assert!(xml.contains("<channel>"));
        assert!(atom(&fixture(&root, None), &[]).contains("<feed"));
        Ok(())
    }
}
