//! Template functions. gtmpl functions are plain function pointers, so
//! anything a function looks up (the string table, the menu) is passed in as
//! an argument:
//!
//! ```text
//! {{ t .strings "read_more" }}
//! {{ readable_date .page.date .page.date_locale }}
//! {{ localized_url .nav "about" }}
//! ```

use gtmpl_value::{Func, Value};

use crate::date::{self, DateLocale};
use crate::value::field;

/// Every function registered on the site's templates.
pub const FUNCS: &[(&str, Func)] = &[
    ("t", t),
    ("readable_date", readable_date),
    ("localized_url", localized_url),
];

/// Registers [`FUNCS`] on a template. Must be called before parsing.
pub fn register(template: &mut gtmpl::Template) {
    for (name, func) in FUNCS {
        template.add_func(name, *func);
    }
}

fn string_arg<'a>(name: &str, args: &'a [Value], i: usize) -> Result<&'a str, String> {
    match args.get(i) {
        Some(Value::String(s)) => Ok(s),
        Some(other) => Err(format!(
            "{}: argument {} must be a string, got {:?}",
            name, i, other
        )),
        None => Err(format!("{}: missing argument {}", name, i)),
    }
}

/// `t TABLE KEY`: looks `KEY` up in a per-language string table (`.strings`),
/// falling back to `KEY` itself.
pub fn t(args: &[Value]) -> Result<Value, String> {
    if args.len() != 2 {
        return Err(format!("t: expected 2 arguments, got {}", args.len()));
    }
    let key = string_arg("t", args, 1)?;
    Ok(match field(&args[0], key) {
        Some(Value::String(s)) if !s.is_empty() => Value::String(s.clone()),
        _ => Value::String(key.to_owned()),
    })
}

/// `readable_date DATE [LOCALE]`: formats an RFC 3339 date as `dd LLL yyyy`
/// in UTC. `LOCALE` is a tag like `pt_PT` (default `en_US`). Unparseable
/// dates are returned unchanged.
pub fn readable_date(args: &[Value]) -> Result<Value, String> {
    if args.is_empty() || args.len() > 2 {
        return Err(format!(
            "readable_date: expected 1 or 2 arguments, got {}",
            args.len()
        ));
    }
    let input = string_arg("readable_date", args, 0)?;
    let locale = match args.get(1) {
        Some(_) => string_arg("readable_date", args, 1)?
            .parse::<DateLocale>()
            .map_err(|e| format!("readable_date: {}", e))?,
        None => DateLocale::EnUs,
    };
    Ok(Value::String(match date::parse_date(input) {
        Ok(date) => date::readable_date(&date, locale),
        Err(_) => input.to_owned(),
    }))
}

/// `localized_url NAV KEY`: returns the URL of the menu item `KEY` in a
/// localized menu (`.nav`), or `/` when there is no such item.
pub fn localized_url(args: &[Value]) -> Result<Value, String> {
    if args.len() != 2 {
        return Err(format!(
            "localized_url: expected 2 arguments, got {}",
            args.len()
        ));
    }
    let key = string_arg("localized_url", args, 1)?;
    let items: &[Value] = match &args[0] {
        Value::Array(items) => items,
        _ => &[],
    };
    let url = items
        .iter()
        .find(|item| matches!(field(item, "key"), Some(Value::String(k)) if k == key))
        .and_then(|item| match field(item, "url") {
            Some(Value::String(url)) => Some(url.clone()),
            _ => None,
        })
        .unwrap_or_else(|| String::from("/"));
    Ok(Value::String(url))
}
