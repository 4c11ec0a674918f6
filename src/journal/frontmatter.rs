use crate::error::MigrateError;
use serde_json::Value;
use std::collections::BTreeMap;

/// A Markdown document split into its frontmatter fields and body text.
#[derive(Debug, Clone, PartialEq)]
pub struct Document<'a> {
    pub fields: BTreeMap<String, Value>,
    pub body: &'a str,
}

/// Split YAML frontmatter off a Markdown document.
///
/// The block must open on the first line with `---` (an optional BOM is
/// allowed) and close with `---` or `...`. Without both delimiters the whole
/// input is body and the field map is empty. A block whose YAML is not a
/// mapping is an error.
pub fn split_frontmatter(input: &str) -> Result<Document<'_>, MigrateError> {
    let no_frontmatter = Document {
        fields: BTreeMap::new(),
        body: input,
    };

    let mut lines = input.split_inclusive('\n');
    let Some(first) = lines.next() else {
        return Ok(no_frontmatter);
    };
    if first.trim_start_matches('\u{feff}').trim_end() != "---" {
        return Ok(no_frontmatter);
    }

    let yaml_start = first.len();
    let mut offset = yaml_start;
    let mut yaml_end = None;
    for line in lines {
        let trimmed = line.trim_end();
        if trimmed == "---" || trimmed == "..." {
            yaml_end = Some(offset);
            offset += line.len();
            break;
        }
        offset += line.len();
    }

    let Some(yaml_end) = yaml_end else {
        return Ok(no_frontmatter);
    };

    let fields = parse_yaml_to_json_map(&input[yaml_start..yaml_end])?;
    Ok(Document {
        fields,
        body: &input[offset..],
    })
}

/// Parse a YAML string into a JSON-compatible map so later lookups deal with
/// one value model.
fn parse_yaml_to_json_map(yaml: &str) -> Result<BTreeMap<String, Value>, MigrateError> {
    if yaml.trim().is_empty() {
        return Ok(BTreeMap::new());
    }

    let yaml_value: serde_yaml::Value =
        serde_yaml::from_str(yaml).map_err(|err| MigrateError::MetadataShape(err.to_string()))?;
    let json_value: Value = serde_json::to_value(yaml_value)
        .map_err(|err| MigrateError::MetadataShape(err.to_string()))?;

    match json_value {
        Value::Object(map) => Ok(map.into_iter().collect()),
        Value::Null => Ok(BTreeMap::new()),
        other => Err(MigrateError::MetadataShape(format!(
            "frontmatter must be a mapping, found {}",
            kind_of(&other)
        ))),
    }
}

pub(crate) fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "mapping",
    }
}
