//! Global data: every YAML file in the `_data` directory is exposed to
//! templates under its file stem (`_data/i18n.yaml` becomes `.i18n`). Page
//! front matter is deep-merged over this data.

use chrono::{Datelike, Utc};
use log::debug;
use serde_yaml::{Mapping, Value as Yaml};
use std::fmt;
use std::fs::{read_dir, File};
use std::path::{Path, PathBuf};

/// Loads the global data from `dir`. A missing directory yields only the
/// built-in `year`.
pub fn load(dir: &Path) -> Result<Mapping> {
    let mut data = Mapping::new();
    data.insert(Yaml::from("year"), Yaml::from(Utc::now().year() as i64));

    if !dir.is_dir() {
        return Ok(data);
    }

    let mut paths: Vec<PathBuf> = Vec::new();
    for result in read_dir(dir)? {
        let path = result?.path();
        if path.is_file() && is_yaml(&path) {
            paths.push(path);
        }
    }
    // `foo.yaml` and `foo.yml` merge in a stable order.
    paths.sort();

    for path in paths {
        let stem = match path.file_stem().and_then(|s| s.to_str()) {
            Some(stem) => stem.to_owned(),
            None => return Err(Error::InvalidFileName(path)),
        };
        debug!("loading data file {}", path.display());
        let contents: Yaml = File::open(&path)
            .map_err(Error::Io)
            .and_then(|f| {
                serde_yaml::from_reader(f).map_err(|err| Error::DeserializeYaml {
                    path: path.clone(),
                    err,
                })
            })?;
        let key = Yaml::from(stem);
        match data.get_mut(&key) {
            Some(existing) => deep_merge(existing, contents),
            None => {
                data.insert(key, contents);
            }
        }
    }

    Ok(data)
}

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    )
}

/// Merges `overlay` into `base`. Mappings merge key by key, sequences are
/// concatenated, and anything else in `overlay` replaces `base`.
pub fn deep_merge(base: &mut Yaml, overlay: Yaml) {
    match (base, overlay) {
        (Yaml::Mapping(base), Yaml::Mapping(overlay)) => {
            for (k, v) in overlay {
                match base.get_mut(&k) {
                    Some(existing) => deep_merge(existing, v),
                    None => {
                        base.insert(k, v);
                    }
                }
            }
        }
        (Yaml::Sequence(base), Yaml::Sequence(overlay)) => base.extend(overlay),
        (base, overlay) => *base = overlay,
    }
}

/// Represents the result of loading global data.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error loading global data.
#[derive(Debug)]
pub enum Error {
    /// Returned when a data file isn't valid YAML.
    DeserializeYaml {
        path: PathBuf,
        err: serde_yaml::Error,
    },

    /// Returned when a data file's name can't be used as a key.
    InvalidFileName(PathBuf),

    /// Returned for other I/O errors.
    Io(std::io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::DeserializeYaml { path, err } => {
                write!(f, "Parsing data file '{}': {}", path.display(), err)
            }
            Error::InvalidFileName(path) => {
                write!(f, "invalid data file name: {:?}", path)
            }
            Error::Io(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::DeserializeYaml { path: _, err } => Some(err),
            Error::InvalidFileName(_) => None,
            Error::Io(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Error {
        Error::Io(err)
    }
}
