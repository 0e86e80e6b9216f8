//! Defines [`Navigation`], the site menu loaded from the `navigation` global
//! data. Each entry carries a label and a URL per language, which is also
//! what lets a page find its counterpart in another language.

use gtmpl_value::Value;
use serde::Deserialize;
use std::collections::BTreeMap;

use crate::value::object;

/// One menu entry.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct Entry {
    pub key: String,

    #[serde(default)]
    pub labels: BTreeMap<String, String>,

    #[serde(default)]
    pub urls: BTreeMap<String, String>,
}

/// An [`Entry`] resolved for a single language.
#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    pub key: String,
    pub label: String,
    pub url: String,

    /// Whether `url` is the URL of the page being rendered.
    pub active: bool,
}

impl Item {
    pub fn to_value(&self) -> Value {
        object(vec![
            ("key", Value::String(self.key.clone())),
            ("label", Value::String(self.label.clone())),
            ("url", Value::String(self.url.clone())),
            ("active", Value::Bool(self.active)),
        ])
    }
}

#[derive(Deserialize, Default, Debug, Clone, PartialEq)]
#[serde(transparent)]
pub struct Navigation(Vec<Entry>);

/// The home page URL for a language (`/en/`).
pub fn language_home(lang: &str) -> String {
    format!("/{}/", lang)
}

impl Navigation {
    /// Builds the menu from the `navigation` global data. A missing entry
    /// yields an empty menu.
    pub fn from_data(data: Option<&serde_yaml::Value>) -> Result<Navigation, serde_yaml::Error> {
        match data {
            Some(value) => serde_yaml::from_value(value.clone()),
            None => Ok(Navigation::default()),
        }
    }

    fn entry(&self, key: &str) -> Option<&Entry> {
        self.0.iter().find(|e| e.key == key)
    }

    /// Returns the URL of the entry `key` in `lang`.
    pub fn url_for(&self, key: &str, lang: &str) -> Option<&str> {
        self.entry(key)?.urls.get(lang).map(String::as_str)
    }

    /// Returns the label of the entry `key` in `lang`.
    pub fn label_for(&self, key: &str, lang: &str) -> Option<&str> {
        self.entry(key)?.labels.get(lang).map(String::as_str)
    }

    /// Resolves every entry for `lang`. Missing labels fall back to the entry
    /// key and missing URLs to the language's home page.
    pub fn localized(&self, lang: &str, current_url: &str) -> Vec<Item> {
        self.0
            .iter()
            .map(|entry| {
                let url = entry
                    .urls
                    .get(lang)
                    .cloned()
                    .unwrap_or_else(|| language_home(lang));
                Item {
                    key: entry.key.clone(),
                    label: entry
                        .labels
                        .get(lang)
                        .cloned()
                        .unwrap_or_else(|| entry.key.clone()),
                    active: url == current_url,
                    url,
                }
            })
            .collect()
    }

    /// Finds the entry having `url` in any language and returns its URL in
    /// `lang`.
    pub fn translate_url(&self, url: &str, lang: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|e| e.urls.values().any(|u| u == url))
            .and_then(|e| e.urls.get(lang))
            .map(String::as_str)
    }
}
