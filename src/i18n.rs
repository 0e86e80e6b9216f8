//! Defines the [`Dictionary`] of translated interface strings, loaded from the
//! `i18n` global data:
//!
//! ```yaml
//! read_more:
//!   en: Read More →
//!   pt: Ler Mais →
//! ```

use serde::Deserialize;
use std::collections::BTreeMap;

/// Translations keyed by string key, then by language code.
#[derive(Deserialize, Default, Debug, Clone, PartialEq)]
#[serde(transparent)]
pub struct Dictionary(BTreeMap<String, BTreeMap<String, String>>);

impl Dictionary {
    /// Builds a dictionary from the `i18n` global data. A missing entry yields
    /// an empty dictionary.
    pub fn from_data(data: Option<&serde_yaml::Value>) -> Result<Dictionary, serde_yaml::Error> {
        match data {
            Some(value) => serde_yaml::from_value(value.clone()),
            None => Ok(Dictionary::default()),
        }
    }

    /// Returns the translation of `key` for `lang`. Unknown keys, missing
    /// languages and empty translations all fall back to `key` itself.
    pub fn translate<'a>(&'a self, key: &'a str, lang: &str) -> &'a str {
        self.0
            .get(key)
            .and_then(|translations| translations.get(lang))
            .map(String::as_str)
            .filter(|s| !s.is_empty())
            .unwrap_or(key)
    }

    /// Returns every key translated into `lang`, with the same fallback as
    /// [`Dictionary::translate`].
    pub fn strings(&self, lang: &str) -> BTreeMap<String, String> {
        self.0
            .keys()
            .map(|key| (key.clone(), self.translate(key, lang).to_owned()))
            .collect()
    }

    /// Lists the `(key, language)` pairs lacking a translation.
    pub fn missing<'a>(&'a self, languages: &[&'a str]) -> Vec<(&'a str, &'a str)> {
        let mut missing = Vec::new();
        for (key, translations) in &self.0 {
            for lang in languages {
                if translations.get(*lang).map_or(true, |s| s.is_empty()) {
                    missing.push((key.as_str(), *lang));
                }
            }
        }
        missing
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn dictionary() -> Dictionary {
        serde_yaml::from_str(
            r#"
read_more:
  en: "Read More →"
  pt: "Ler Mais →"
contact:
  en: Contact
  pt: ""
home:
  en: Home
"#,
        )
        .unwrap()
    }

    #[test]
    fn test_translate() {
        let d = dictionary();
        assert_eq!("Read More →", d.translate("read_more", "en"));
        assert_eq!("Ler Mais →", d.translate("read_more", "pt"));
    }

    #[test]
    fn test_translate_falls_back_to_key() {
        let d = dictionary();
        assert_eq!("home", d.translate("home", "pt"));
        assert_eq!("contact", d.translate("contact", "pt"));
        assert_eq!("no_such_key", d.translate("no_such_key", "en"));
    }

    #[test]
    fn test_strings() {
        let strings = dictionary().strings("pt");
        assert_eq!(3, strings.len());
        assert_eq!(Some("Ler Mais →"), strings.get("read_more").map(String::as_str));
        assert_eq!(Some("home"), strings.get("home").map(String::as_str));
    }

    #[test]
    fn test_missing() {
        let d = dictionary();
        assert_eq!(vec![("contact", "pt"), ("home", "pt")], d.missing(&["en", "pt"]));
    }

    #[test]
    fn test_from_missing_data() -> Result<(), serde_yaml::Error> {
        assert_eq!(Dictionary::default(), Dictionary::from_data(None)?);
        Ok(())
    }
}
