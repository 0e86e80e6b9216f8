//! Named, sorted lists of pages exposed to templates as `.collections`.
//!
//! * `all`: every page, oldest first.
//! * `posts_<lang>`: the posts of one language, oldest first. A post is a
//!   page under `/<lang>/posts/` other than the post listing itself.
//!
//! Listings that want the newest posts first paginate with `reverse: true`.

use gtmpl_value::Value;
use std::collections::BTreeMap;
use url::Url;

use crate::page::Page;

/// The name of the collection holding every page.
pub const ALL: &str = "all";

/// The name of the post collection of a language (`posts_en`).
pub fn posts_name(lang: &str) -> String {
    format!("posts_{}", lang)
}

/// Whether `page` is one of the posts of `lang`.
pub fn is_post(page: &Page, lang: &str) -> bool {
    page.url.starts_with(&format!("/{}/posts/", lang)) && !page.url.ends_with("/posts/")
}

/// The collections of a site. Each collection borrows its pages.
pub struct Collections<'a> {
    collections: BTreeMap<String, Vec<&'a Page>>,
}

impl<'a> Collections<'a> {
    /// Builds `all` and one `posts_<lang>` collection per language.
    pub fn new<'l>(pages: &'a [Page], languages: impl Iterator<Item = &'l str>) -> Self {
        let mut collections = BTreeMap::new();

        let mut all: Vec<&Page> = pages.iter().collect();
        all.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.url.cmp(&b.url)));
        collections.insert(ALL.to_owned(), all);

        for lang in languages {
            let mut posts: Vec<&Page> = pages.iter().filter(|p| is_post(p, lang)).collect();
            posts.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.url.cmp(&b.url)));
            collections.insert(posts_name(lang), posts);
        }

        Collections { collections }
    }

    pub fn get(&self, name: &str) -> Option<&[&'a Page]> {
        self.collections.get(name).map(Vec::as_slice)
    }

    /// The posts of `lang`, oldest first.
    pub fn posts(&self, lang: &str) -> &[&'a Page] {
        self.get(&posts_name(lang)).unwrap_or(&[])
    }

    /// Returns the URLs of the posts before (older) and after (newer) `page`
    /// in its language's post list.
    pub fn neighbours(&self, page: &Page) -> (Option<&'a str>, Option<&'a str>) {
        let posts = self.posts(&page.lang);
        match posts.iter().position(|p| p.url == page.url) {
            None => (None, None),
            Some(i) => (
                match i < 1 {
                    true => None,
                    false => Some(posts[i - 1].url.as_str()),
                },
                posts.get(i + 1).copied().map(|p| p.url.as_str()),
            ),
        }
    }

    /// Converts every collection into an array of page values.
    pub fn to_value(&self, site_root: &Url) -> Value {
        Value::Object(
            self.collections
                .iter()
                .map(|(name, pages)| {
                    (
                        name.clone(),
                        Value::Array(pages.iter().map(|p| p.to_value(site_root)).collect()),
                    )
                })
                .collect(),
        )
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::date::{parse_date, DateLocale};
    use crate::page::Kind;
    use std::path::PathBuf;

    fn page(url: &str, lang: &str, date: &str) -> Page {
        Page {
            source: PathBuf::from(url.trim_matches('/')),
            kind: Kind::Markdown,
            url: url.to_owned(),
            output_path: PathBuf::new(),
            lang: lang.to_owned(),
            date_locale: DateLocale::for_language(lang),
            title: String::new(),
            date: parse_date(date).unwrap(),
            layout: None,
            pagination: None,
            data: serde_yaml::Value::Mapping(Default::default()),
            body: String::new(),
        }
    }

    fn pages() -> Vec<Page> {
        vec![
            page("/en/", "en", "2024-01-01"),
            page("/en/posts/", "en", "2024-01-01"),
            page("/en/posts/old/", "en", "2023-05-01"),
            page("/en/posts/new/", "en", "2024-02-01"),
            page("/en/posts/mid/", "en", "2023-11-20"),
            page("/pt/posts/novo/", "pt", "2024-02-02"),
            page("/pt/sobre/", "pt", "2022-01-01"),
        ]
    }

    fn urls(pages: &[&Page]) -> Vec<String> {
        pages.iter().map(|p| p.url.clone()).collect()
    }

    #[test]
    fn test_posts_filtered_and_sorted() {
        let pages = pages();
        let c = Collections::new(&pages, vec!["en", "pt"].into_iter());
        assert_eq!(
            vec!["/en/posts/old/", "/en/posts/mid/", "/en/posts/new/"],
            urls(c.posts("en"))
        );
        assert_eq!(vec!["/pt/posts/novo/"], urls(c.posts("pt")));
        assert!(c.posts("fr").is_empty());
    }

    #[test]
    fn test_all_oldest_first() {
        let pages = pages();
        let c = Collections::new(&pages, vec!["en"].into_iter());
        let all = urls(c.get(ALL).unwrap_or(&[]));
        assert_eq!("/pt/sobre/", all[0]);
        assert_eq!("/pt/posts/novo/", all[all.len() - 1]);
        assert_eq!(pages.len(), all.len());
    }

    #[test]
    fn test_neighbours() {
        let pages = pages();
        let c = Collections::new(&pages, vec!["en", "pt"].into_iter());
        assert_eq!(
            (Some("/en/posts/old/"), Some("/en/posts/new/")),
            c.neighbours(&pages[4])
        );
        assert_eq!((Some("/en/posts/mid/"), None), c.neighbours(&pages[3]));
        assert_eq!((None, Some("/en/posts/mid/")), c.neighbours(&pages[2]));
        assert_eq!((None, None), c.neighbours(&pages[5]));
        assert_eq!((None, None), c.neighbours(&pages[0]));
    }
}
