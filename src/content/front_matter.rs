use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer};

use crate::content::ValidationError;
use crate::text_utils::parse_date_time;

const FENCE: &str = "---";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct FrontMatter {
    #[serde(deserialize_with = "deserialize_scalar")]
    pub title: Option<String>,
    #[serde(deserialize_with = "deserialize_scalar")]
    pub date: Option<String>,
    #[serde(deserialize_with = "deserialize_scalar")]
    pub slug: Option<String>,
    #[serde(deserialize_with = "deserialize_names")]
    pub categories: Vec<String>,
    #[serde(deserialize_with = "deserialize_names")]
    pub tags: Vec<String>,
    #[serde(deserialize_with = "deserialize_scalar")]
    pub author: Option<String>,
    pub draft: bool,
    #[serde(deserialize_with = "deserialize_scalar")]
    pub url: Option<String>,
    #[serde(deserialize_with = "deserialize_scalar")]
    pub layout: Option<String>,
    #[serde(deserialize_with = "deserialize_scalar")]
    pub description: Option<String>,
}

impl FrontMatter {
    /// Splits `raw` into its front matter and the body that follows.
    pub fn parse<'a>(raw: &'a str, file: &str) -> Result<(FrontMatter, &'a str), ValidationError> {
        let (yaml, body) = split(raw, file)?;
        if yaml.trim().is_empty() {
            return Ok((FrontMatter::default(), body));
        }

        let front_matter = serde_yaml::from_str::<FrontMatter>(yaml).map_err(|e| {
            ValidationError::InvalidFrontMatter { file: file.to_string(), reason: e.to_string() }
        })?;
        Ok((front_matter, body))
    }

    pub fn required_title(&self, file: &str) -> Result<String, ValidationError> {
        match self.title {
            Some(ref title) if !title.trim().is_empty() => Ok(title.trim().to_string()),
            _ => Err(ValidationError::MissingField { file: file.to_string(), field: "title" }),
        }
    }

    pub fn required_date(&self, file: &str) -> Result<NaiveDateTime, ValidationError> {
        match self.date {
            Some(ref value) => parse_date(value, file),
            None => Err(ValidationError::MissingField { file: file.to_string(), field: "date" }),
        }
    }

    pub fn optional_date(&self, file: &str) -> Result<Option<NaiveDateTime>, ValidationError> {
        match self.date {
            Some(ref value) => parse_date(value, file).map(Some),
            None => Ok(None),
        }
    }
}

fn parse_date(value: &str, file: &str) -> Result<NaiveDateTime, ValidationError> {
    parse_date_time(value).map_err(|reason| ValidationError::InvalidDate {
        file: file.to_string(),
        value: value.to_string(),
        reason,
    })
}

fn split<'a>(raw: &'a str, file: &str) -> Result<(&'a str, &'a str), ValidationError> {
    let content = raw.strip_prefix('\u{feff}').unwrap_or(raw);
    let content = content.trim_start_matches(['\r', '\n']);

    let Some(first_line_end) = content.find('\n') else {
        return Err(ValidationError::MissingFrontMatter { file: file.to_string() });
    };
    if content[..first_line_end].trim_end() != FENCE {
        return Err(ValidationError::MissingFrontMatter { file: file.to_string() });
    }

    let rest = &content[first_line_end + 1..];
    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == FENCE {
            let yaml = &rest[..offset];
            let body = &rest[offset + line.len()..];
            return Ok((yaml, body));
        }
        offset += line.len();
    }

    Err(ValidationError::UnterminatedFrontMatter { file: file.to_string() })
}

/// Any YAML scalar as text, so `title: 2024` or an unquoted date still reads
/// as a string.
fn deserialize_scalar<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<serde_yaml::Value> = Option::deserialize(deserializer)?;
    Ok(match value {
        None | Some(serde_yaml::Value::Null) => None,
        Some(serde_yaml::Value::String(s)) => Some(s),
        Some(serde_yaml::Value::Bool(b)) => Some(b.to_string()),
        Some(serde_yaml::Value::Number(n)) => Some(n.to_string()),
        Some(other) => {
            use serde::de::Error;
            return Err(D::Error::custom(format!("expected a plain value, found {:?}", other)));
        }
    })
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NameList {
    List(Vec<serde_yaml::Value>),
    Text(String),
}

/// Category and tag names, given either as a YAML list or as one string
/// separated by commas (or spaces, when there is no comma). Duplicates keep
/// their first position.
fn deserialize_names<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let names: Vec<String> = match Option::<NameList>::deserialize(deserializer)? {
        None => vec![],
        Some(NameList::List(items)) => items
            .into_iter()
            .filter_map(|item| match item {
                serde_yaml::Value::String(s) => Some(s),
                serde_yaml::Value::Number(n) => Some(n.to_string()),
                serde_yaml::Value::Bool(b) => Some(b.to_string()),
                _ => None,
            })
            .collect(),
        Some(NameList::Text(text)) => split_names(&text),
    };

    let mut unique: Vec<String> = Vec::with_capacity(names.len());
    for name in names {
        let name = name.trim().to_string();
        if !name.is_empty() && !unique.contains(&name) {
            unique.push(name);
        }
    }
    Ok(unique)
}

fn split_names(text: &str) -> Vec<String> {
    if text.contains(',') {
        text.split(',').map(|s| s.to_string()).collect()
    } else {
        text.split_whitespace().map(|s| s.to_string()).collect()
    }
}
