//! Loads the site's templates from the `_includes` directory:
//!
//! * `_includes/*.html` are partials (`{{define "name"}}...{{end}}` blocks)
//!   available to every layout and to every HTML page body.
//! * `_includes/layouts/<name>.html` are layouts, selected by a page's
//!   `layout: <name>.html` front matter.

use gtmpl::{Context, Template};
use gtmpl_value::Value;
use log::debug;
use std::collections::HashMap;
use std::fmt;
use std::fs::{read_dir, File};
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::filters;

/// The parsed layouts plus the partial source shared by every template.
pub struct Templates {
    partials: String,
    layouts: HashMap<String, Template>,
}

impl Templates {
    /// Loads partials and layouts from `includes_directory`. A missing
    /// directory yields no layouts.
    pub fn load(includes_directory: &Path) -> Result<Templates> {
        let mut partials = String::new();
        for path in html_files(includes_directory)? {
            read_template_file(&path, &mut partials)?;
            partials.push(' ');
        }

        let mut layouts = HashMap::new();
        for path in html_files(&includes_directory.join("layouts"))? {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            let mut contents = partials.clone();
            read_template_file(&path, &mut contents)?;
            debug!("parsing layout {}", name);
            let template = parse(&name, &contents)?;
            layouts.insert(name, template);
        }

        Ok(Templates { partials, layouts })
    }

    /// Returns the layout called `name` (e.g., `post.html`).
    pub fn layout(&self, name: &str) -> Result<&Template> {
        self.layouts
            .get(name)
            .ok_or_else(|| Error::UnknownLayout(name.to_owned()))
    }

    /// Parses an HTML page body, with the partials available to it.
    pub fn parse_body(&self, name: &str, body: &str) -> Result<Template> {
        let mut contents = self.partials.clone();
        contents.push_str(body);
        parse(name, &contents)
    }
}

/// Applies `template` to `value` and returns the output.
pub fn render(template: &Template, value: Value) -> Result<String> {
    let context = Context::from(value).map_err(Error::Render)?;
    let mut out: Vec<u8> = Vec::new();
    template.execute(&mut out, &context).map_err(Error::Render)?;
    String::from_utf8(out).map_err(|e| Error::Render(e.to_string()))
}

fn parse(name: &str, contents: &str) -> Result<Template> {
    let mut template = Template::default();
    filters::register(&mut template);
    template
        .parse(contents)
        .map_err(|err| Error::ParseTemplate {
            name: name.to_owned(),
            err,
        })?;
    Ok(template)
}

// Lists the `.html` files directly inside `dir`, sorted by name.
fn html_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut files = Vec::new();
    for entry in read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && path.extension().map_or(false, |e| e == "html") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn read_template_file(path: &Path, contents: &mut String) -> Result<()> {
    File::open(path)
        .and_then(|mut file| file.read_to_string(contents))
        .map_err(|err| Error::OpenTemplateFile {
            path: path.to_owned(),
            err,
        })?;
    Ok(())
}

pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error loading or applying templates.
#[derive(Debug)]
pub enum Error {
    /// Returned for I/O problems while opening template files.
    OpenTemplateFile { path: PathBuf, err: std::io::Error },

    /// Returned for errors parsing template files.
    ParseTemplate { name: String, err: String },

    /// Returned when a page asks for a layout that doesn't exist.
    UnknownLayout(String),

    /// Returned for errors while applying a template.
    Render(String),

    /// Returned for other I/O errors.
    Io(std::io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::OpenTemplateFile { path, err } => {
                write!(f, "Opening template file '{}': {}", path.display(), err)
            }
            Error::ParseTemplate { name, err } => {
                write!(f, "Parsing template `{}`: {}", name, err)
            }
            Error::UnknownLayout(name) => write!(f, "unknown layout `{}`", name),
            Error::Render(err) => err.fmt(f),
            Error::Io(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::OpenTemplateFile { path: _, err } => Some(err),
            Error::ParseTemplate { .. } => None,
            Error::UnknownLayout(_) => None,
            Error::Render(_) => None,
            Error::Io(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Error {
        Error::Io(err)
    }
}
