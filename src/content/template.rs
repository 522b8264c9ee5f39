use serde::{Deserialize, Serialize};

use crate::content::{Model, ParseContext, ValidationError, RECORD_VERSION};

/// A template source, named by its path under the templates directory.
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    pub name: String,
    pub source: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TemplateRecord {
    pub version: u32,
    pub source: String,
}

impl Model for Template {
    const TABLE: &'static str = "templates";
    const EXTENSIONS: Option<&'static [&'static str]> = Some(&["html", "htm", "xml", "tpl", "mustache"]);

    type Record = TemplateRecord;

    fn filename(&self) -> &str {
        &self.name
    }

    fn parse(raw: &str, filename: &str, _ctx: &ParseContext) -> Result<Template, ValidationError> {
        Ok(Template {
            name: filename.to_string(),
            source: raw.to_string(),
        })
    }

    fn to_record(&self) -> TemplateRecord {
        TemplateRecord {
            version: RECORD_VERSION,
            source: self.source.clone(),
        }
    }

    fn from_record(filename: &str, record: TemplateRecord, _ctx: &ParseContext) -> Option<Template> {
        if record.version != RECORD_VERSION {
            return None;
        }
        Some(Template {
            name: filename.to_string(),
            source: record.source,
        })
    }

    // Templates only feed other outputs.
    fn output_path(&self) -> Option<String> {
        None
    }
}

#[cfg(test)]
mod tests {
    use crate::content::{parse_from_cache, serialize};

    use super::*;

    #[test]
    fn test_round_trip() {
        let ctx = ParseContext::new("templates", "");
        let template = Template::parse("<h1>{{title}}</h1>", "post.html", &ctx).unwrap();
        assert_eq!(template.name, "post.html");
        assert_eq!(template.output_path(), None);

        let value = serialize(&template).unwrap();
        assert_eq!(parse_from_cache::<Template>("post.html", &value, &ctx), Some(template));
    }
}
