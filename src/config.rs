//! Loads the project file (`duoblog.yaml`) and resolves it into a [`Config`].

use anyhow::{anyhow, bail, Context, Result};
use serde::Deserialize;
use std::fs::File;
use std::path::{Path, PathBuf};
use url::Url;

use crate::date::DateLocale;

/// The name of the project file searched for by [`Config::from_directory`].
pub const PROJECT_FILE: &str = "duoblog.yaml";

#[derive(Deserialize)]
struct PageSize(usize);
impl Default for PageSize {
    fn default() -> Self {
        PageSize(10)
    }
}

#[derive(Deserialize)]
struct Minify(bool);
impl Default for Minify {
    fn default() -> Self {
        Minify(true)
    }
}

fn default_language() -> String {
    String::from("en")
}

fn default_input_directory() -> PathBuf {
    PathBuf::from("src")
}

fn default_output_directory() -> PathBuf {
    PathBuf::from("_site")
}

#[derive(Deserialize)]
struct Project {
    site_root: Url,

    #[serde(default)]
    title: String,

    #[serde(default)]
    description: String,

    #[serde(default)]
    author: Option<Author>,

    #[serde(default = "default_language")]
    default_language: String,

    #[serde(default)]
    languages: Vec<LanguageEntry>,

    #[serde(default = "default_input_directory")]
    input_directory: PathBuf,

    #[serde(default = "default_output_directory")]
    output_directory: PathBuf,

    #[serde(default)]
    index_page_size: PageSize,

    #[serde(default)]
    minify: Minify,

    #[serde(default)]
    passthrough: Vec<PathBuf>,
}

#[derive(Deserialize)]
struct LanguageEntry {
    code: String,

    #[serde(default)]
    date_locale: Option<String>,
}

/// The author of the site. Used for feed metadata.
#[derive(Deserialize, Clone, Debug, PartialEq)]
pub struct Author {
    pub name: String,

    #[serde(default)]
    pub email: Option<String>,
}

/// A language the site is published in.
#[derive(Clone, Debug, PartialEq)]
pub struct Language {
    /// The language code, also the first URL segment of the language's pages
    /// (e.g., `en` for `/en/posts/`).
    pub code: String,

    /// The locale used for month names in readable dates.
    pub date_locale: DateLocale,
}

impl Language {
    pub fn new(code: &str) -> Language {
        Language {
            code: code.to_owned(),
            date_locale: DateLocale::for_language(code),
        }
    }
}

/// The resolved project configuration. All paths are absolute or relative to
/// the working directory (never to the project root).
#[derive(Clone, Debug)]
pub struct Config {
    pub project_root: PathBuf,
    pub site_root: Url,
    pub title: String,
    pub description: String,
    pub author: Option<Author>,
    pub default_language: String,
    pub languages: Vec<Language>,
    pub input_directory: PathBuf,
    pub output_directory: PathBuf,
    pub index_page_size: usize,
    pub minify: bool,
    pub passthrough: Vec<PathBuf>,
}

impl Config {
    /// Searches `dir` and its ancestors for a [`PROJECT_FILE`] and loads the
    /// first one found. `output_directory` overrides the project's output
    /// directory when provided.
    pub fn from_directory(
        dir: &Path,
        output_directory: Option<&Path>,
    ) -> Result<Config> {
        let path = dir.join(PROJECT_FILE);
        if path.exists() {
            Config::from_project_file(&path, output_directory)
                .with_context(|| format!("Loading configuration `{}`", path.display()))
        } else {
            match dir.parent() {
                Some(parent) => Config::from_directory(parent, output_directory),
                None => Err(anyhow!(
                    "Could not find `{}` in any parent directory",
                    PROJECT_FILE
                )),
            }
        }
    }

    pub fn from_project_file(
        path: &Path,
        output_directory: Option<&Path>,
    ) -> Result<Config> {
        let file = File::open(path)
            .with_context(|| format!("Opening project file `{}`", path.display()))?;
        let project: Project = serde_yaml::from_reader(file)?;
        let project_root = path.parent().ok_or_else(|| {
            anyhow!(
                "Can't get parent directory for provided project file path '{:?}'",
                path
            )
        })?;
        Config::from_project(project, project_root, output_directory)
    }

    fn from_project(
        project: Project,
        project_root: &Path,
        output_directory: Option<&Path>,
    ) -> Result<Config> {
        if project.site_root.cannot_be_a_base() {
            bail!("`site_root` must be an absolute URL: {}", project.site_root);
        }
        if project.index_page_size.0 < 1 {
            bail!("`index_page_size` must be at least 1");
        }

        let languages: Vec<Language> = match project.languages.is_empty() {
            true => vec![Language::new(&project.default_language)],
            false => project
                .languages
                .iter()
                .map(|entry| {
                    Ok(Language {
                        code: entry.code.clone(),
                        date_locale: match &entry.date_locale {
                            Some(tag) => tag.parse()?,
                            None => DateLocale::for_language(&entry.code),
                        },
                    })
                })
                .collect::<Result<_>>()?,
        };
        if !languages.iter().any(|l| l.code == project.default_language) {
            bail!(
                "`default_language` `{}` is not one of the configured `languages`",
                project.default_language
            );
        }

        // `Url::join` drops the last path segment unless it ends in a slash.
        let mut site_root = project.site_root;
        if !site_root.path().ends_with('/') {
            let path = format!("{}/", site_root.path());
            site_root.set_path(&path);
        }

        Ok(Config {
            project_root: project_root.to_owned(),
            site_root,
            title: project.title,
            description: project.description,
            author: project.author,
            default_language: project.default_language,
            languages,
            input_directory: project_root.join(project.input_directory),
            output_directory: match output_directory {
                Some(dir) => dir.to_owned(),
                None => project_root.join(project.output_directory),
            },
            index_page_size: project.index_page_size.0,
            minify: project.minify.0,
            passthrough: project
                .passthrough
                .iter()
                .map(|relpath| project_root.join(relpath))
                .collect(),
        })
    }

    /// Returns the configured language codes in configuration order.
    pub fn language_codes(&self) -> impl Iterator<Item = &str> {
        self.languages.iter().map(|l| l.code.as_str())
    }

    /// Looks up a configured language by code.
    pub fn language(&self, code: &str) -> Option<&Language> {
        self.languages.iter().find(|l| l.code == code)
    }

    /// The directory holding global data files.
    pub fn data_directory(&self) -> PathBuf {
        self.input_directory.join("_data")
    }

    /// The directory holding partial templates and layouts.
    pub fn includes_directory(&self) -> PathBuf {
        self.input_directory.join("_includes")
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn project(yaml: &str) -> Result<Config> {
        let project: Project = serde_yaml::from_str(yaml)?;
        Config::from_project(project, Path::new("/blog"), None)
    }

    #[test]
    fn test_defaults() -> Result<()> {
        let config = project("site_root: https://example.org/blog")?;
        assert_eq!("https://example.org/blog/", config.site_root.as_str());
        assert_eq!("en", config.default_language);
        assert_eq!(vec![Language::new("en")], config.languages);
        assert_eq!(PathBuf::from("/blog/src"), config.input_directory);
        assert_eq!(PathBuf::from("/blog/_site"), config.output_directory);
        assert_eq!(10, config.index_page_size);
        assert!(config.minify);
        Ok(())
    }

    #[test]
    fn test_languages_and_passthrough() -> Result<()> {
        let config = project(
            r#"
site_root: https://example.org/
default_language: pt
languages:
  - code: en
  - code: pt
    date_locale: pt_BR
passthrough:
  - src/_redirects
minify: false
"#,
        )?;
        assert_eq!(vec!["en", "pt"], config.language_codes().collect::<Vec<_>>());
        assert_eq!(
            Some(DateLocale::PtBr),
            config.language("pt").map(|l| l.date_locale)
        );
        assert_eq!(vec![PathBuf::from("/blog/src/_redirects")], config.passthrough);
        assert!(!config.minify);
        Ok(())
    }

    #[test]
    fn test_default_language_must_be_configured() {
        let result = project(
            "site_root: https://example.org/\ndefault_language: fr\nlanguages: [{code: en}]",
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_page_size_must_be_positive() {
        assert!(project("site_root: https://example.org/\nindex_page_size: 0").is_err());
    }

    #[test]
    fn test_unknown_date_locale() {
        let result = project(
            "site_root: https://example.org/\nlanguages: [{code: en, date_locale: xx_YY}]",
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_from_directory_searches_parents() -> Result<()> {
        let config =
            Config::from_directory(Path::new("./testdata/site/src/en/posts"), None)?;
        assert_eq!(Path::new("./testdata/site"), config.project_root);
        Ok(())
    }
}
