//! Copies static assets (files or whole directories) into the output
//! directory unmodified.

use log::debug;
use std::fmt;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::config::Config;

/// Copies every passthrough path of `config` and returns the number of files
/// copied.
pub fn copy_all(config: &Config) -> Result<usize> {
    let mut copied = 0;
    for source in &config.passthrough {
        let target = config.output_directory.join(destination(config, source));
        copied += copy(source, &target)?;
    }
    Ok(copied)
}

/// Where a passthrough path lands, relative to the output directory. Paths
/// inside the input directory keep their input-relative location
/// (`src/static/css` → `static/css`); anything else keeps its location
/// relative to the project root.
pub fn destination(config: &Config, source: &Path) -> PathBuf {
    if let Ok(relative) = source.strip_prefix(&config.input_directory) {
        return relative.to_owned();
    }
    match source.strip_prefix(&config.project_root) {
        Ok(relative) => relative.to_owned(),
        Err(_) => source
            .file_name()
            .map(PathBuf::from)
            .unwrap_or_default(),
    }
}

/// Copies the file or directory `source` to `target`, creating parent
/// directories as needed. Returns the number of files copied.
pub fn copy(source: &Path, target: &Path) -> Result<usize> {
    if !source.exists() {
        return Err(Error::MissingSource(source.to_owned()));
    }

    let mut copied = 0;
    for result in WalkDir::new(source).sort_by_file_name() {
        let entry = result?;
        // strip_prefix() can't fail for paths yielded under `source`
        let relative = match entry.path().strip_prefix(source) {
            Ok(relative) => relative,
            Err(_) => continue,
        };
        let dst = match relative.as_os_str().is_empty() {
            true => target.to_owned(),
            false => target.join(relative),
        };
        if entry.file_type().is_dir() {
            std::fs::create_dir_all(&dst).map_err(|err| Error::Copy {
                path: dst.clone(),
                err,
            })?;
            continue;
        }
        if let Some(parent) = dst.parent() {
            std::fs::create_dir_all(parent).map_err(|err| Error::Copy {
                path: parent.to_owned(),
                err,
            })?;
        }
        std::fs::copy(entry.path(), &dst).map_err(|err| Error::Copy {
            path: entry.path().to_owned(),
            err,
        })?;
        debug!("copied {} to {}", entry.path().display(), dst.display());
        copied += 1;
    }
    Ok(copied)
}

pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error copying passthrough assets.
#[derive(Debug)]
pub enum Error {
    /// Returned when a configured passthrough path doesn't exist.
    MissingSource(PathBuf),

    /// Returned for I/O problems while copying.
    Copy { path: PathBuf, err: std::io::Error },

    /// Returned for errors walking a directory.
    WalkDir(walkdir::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::MissingSource(path) => {
                write!(f, "passthrough path '{}' does not exist", path.display())
            }
            Error::Copy { path, err } => write!(f, "Copying '{}': {}", path.display(), err),
            Error::WalkDir(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::MissingSource(_) => None,
            Error::Copy { path: _, err } => Some(err),
            Error::WalkDir(err) => Some(err),
        }
    }
}

impl From<walkdir::Error> for Error {
    fn from(err: walkdir::Error) -> Error {
        Error::WalkDir(err)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::fs;

    fn config(root: &Path) -> anyhow::Result<Config> {
        let file = root.join(crate::config::PROJECT_FILE);
        fs::write(
            &file,
            "site_root: https://example.org/\npassthrough: [src/static, src/_redirects, LICENSE]\n",
        )?;
        Config::from_project_file(&file, None)
    }

    #[test]
    fn test_destination() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let config = config(dir.path())?;
        assert_eq!(
            PathBuf::from("static"),
            destination(&config, &config.passthrough[0])
        );
        assert_eq!(
            PathBuf::from("_redirects"),
            destination(&config, &config.passthrough[1])
        );
        assert_eq!(
            PathBuf::from("LICENSE"),
            destination(&config, &config.passthrough[2])
        );
        Ok(())
    }

    #[test]
    fn test_copy_all() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let root = dir.path();
        fs::create_dir_all(root.join("src/static/css"))?;
        fs::write(root.join("src/static/css/style.css"), "body{}")?;
        fs::write(root.join("src/static/robots.txt"), "User-agent: *")?;
        fs::write(root.join("src/_redirects"), "/ /en/ 302")?;
        fs::write(root.join("LICENSE"), "GPL")?;

        let config = config(root)?;
        assert_eq!(4, copy_all(&config)?);
        let out = &config.output_directory;
        assert_eq!("body{}", fs::read_to_string(out.join("static/css/style.css"))?);
        assert_eq!("User-agent: *", fs::read_to_string(out.join("static/robots.txt"))?);
        assert_eq!("/ /en/ 302", fs::read_to_string(out.join("_redirects"))?);
        assert_eq!("GPL", fs::read_to_string(out.join("LICENSE"))?);
        Ok(())
    }

    #[test]
    fn test_missing_source() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let config = config(dir.path())?;
        match copy_all(&config) {
            Err(Error::MissingSource(path)) => assert_eq!(config.passthrough[0], path),
            other => panic!("unexpected result: {:?}", other),
        }
        Ok(())
    }
}
