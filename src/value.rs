//! Conversions from YAML data and our own types into template [`Value`]s.

use gtmpl_value::Value;
use serde_yaml::Value as Yaml;
use std::collections::HashMap;

/// Converts parsed YAML (global data, front matter) into a template value.
/// Mapping keys that aren't strings are stringified; YAML null becomes
/// [`Value::Nil`].
pub fn from_yaml(yaml: &Yaml) -> Value {
    match yaml {
        Yaml::Null => Value::Nil,
        Yaml::Bool(b) => Value::Bool(*b),
        Yaml::Number(n) => match (n.as_i64(), n.as_u64(), n.as_f64()) {
            (Some(i), _, _) => Value::from(i),
            (None, Some(u), _) => Value::from(u),
            (None, None, Some(f)) => Value::from(f),
            (None, None, None) => Value::Nil,
        },
        Yaml::String(s) => Value::String(s.clone()),
        Yaml::Sequence(seq) => Value::Array(seq.iter().map(from_yaml).collect()),
        Yaml::Mapping(mapping) => {
            let mut m: HashMap<String, Value> = HashMap::with_capacity(mapping.len());
            for (k, v) in mapping {
                if let Some(key) = key_to_string(k) {
                    m.insert(key, from_yaml(v));
                }
            }
            Value::Object(m)
        }
    }
}

/// Renders a YAML mapping key as a template field name.
pub fn key_to_string(key: &Yaml) -> Option<String> {
    match key {
        Yaml::String(s) => Some(s.clone()),
        Yaml::Bool(b) => Some(b.to_string()),
        Yaml::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Builds a [`Value::Object`] from field/value pairs.
pub fn object<I, K>(fields: I) -> Value
where
    I: IntoIterator<Item = (K, Value)>,
    K: Into<String>,
{
    Value::Object(fields.into_iter().map(|(k, v)| (k.into(), v)).collect())
}

/// Converts an optional string (usually a URL) into a value, mapping `None`
/// to [`Value::Nil`] so templates can test it with `{{if}}`.
pub fn optional(opt: Option<&str>) -> Value {
    match opt {
        Some(s) => Value::String(s.to_owned()),
        None => Value::Nil,
    }
}

/// Looks a field up in an object or map value.
pub fn field<'a>(value: &'a Value, name: &str) -> Option<&'a Value> {
    match value {
        Value::Object(m) | Value::Map(m) => m.get(name),
        _ => None,
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_from_yaml() -> Result<(), serde_yaml::Error> {
        let yaml: Yaml = serde_yaml::from_str(
            r#"
title: Hello
count: 3
draft: false
tags: [a, b]
nested:
  2024: leap
nothing: ~
"#,
        )?;
        let value = from_yaml(&yaml);
        assert_eq!(Some(&Value::String("Hello".to_owned())), field(&value, "title"));
        assert_eq!(Some(&Value::from(3i64)), field(&value, "count"));
        assert_eq!(Some(&Value::Bool(false)), field(&value, "draft"));
        assert_eq!(
            Some(&Value::Array(vec![
                Value::String("a".to_owned()),
                Value::String("b".to_owned())
            ])),
            field(&value, "tags")
        );
        let nested = field(&value, "nested").cloned().unwrap_or(Value::Nil);
        assert_eq!(Some(&Value::String("leap".to_owned())), field(&nested, "2024"));
        assert_eq!(Some(&Value::Nil), field(&value, "nothing"));
        Ok(())
    }

    #[test]
    fn test_optional() {
        assert_eq!(Value::Nil, optional(None));
        assert_eq!(Value::String("/en/".to_owned()), optional(Some("/en/")));
    }
}
