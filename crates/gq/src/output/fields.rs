//! Field catalog output formatting.

use grid_filter_rs::{FieldRegistry, FieldType};
use serde::Serialize;

use super::helpers::{format_header, pad};

/// JSON output structure for the fields command.
#[derive(Serialize)]
pub struct FieldsListOutput<'a> {
    pub fields: Vec<FieldOutput<'a>>,
}

/// JSON output structure for a single field.
#[derive(Serialize)]
pub struct FieldOutput<'a> {
    pub key: &'a str,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<&'a str>,
}

/// Formats a catalog as JSON.
pub fn format_fields_json(registry: &FieldRegistry) -> Result<String, serde_json::Error> {
    let fields = registry
        .iter()
        .map(|f| FieldOutput {
            key: &f.key,
            field_type: f.field_type,
            label: f.label.as_deref(),
        })
        .collect();

    serde_json::to_string_pretty(&FieldsListOutput { fields })
}

/// Formats a catalog as a table.
pub fn format_fields_table(registry: &FieldRegistry, use_colors: bool) -> String {
    let key_width = registry
        .iter()
        .map(|f| f.key.chars().count())
        .max()
        .unwrap_or(0)
        .max("Key".len());

    let mut output = format_header(
        &format!("{} {:<8} {}", pad("Key", key_width), "Type", "Label"),
        use_colors,
    );
    for field in registry.iter() {
        let line = format!(
            "{} {:<8} {}",
            pad(&field.key, key_width),
            field.field_type.to_string(),
            field.label.as_deref().unwrap_or("")
        );
        output.push_str(line.trim_end());
        output.push('\n');
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use grid_filter_rs::FilterField;

    fn registry() -> FieldRegistry {
        FieldRegistry::new([
            FilterField::new("patient", FieldType::String).with_label("Patient"),
            FilterField::new("qualityFraction", FieldType::Number),
        ])
    }

    #[test]
    fn test_fields_table() {
        let table = format_fields_table(&registry(), false);
        let lines: Vec<_> = table.lines().collect();
        assert_eq!(lines[0], "Key             Type     Label");
        assert_eq!(lines[1], "patient         string   Patient");
        assert_eq!(lines[2], "qualityFraction number");
    }

    #[test]
    fn test_fields_json() {
        let json: serde_json::Value =
            serde_json::from_str(&format_fields_json(&registry()).unwrap()).unwrap();
        assert_eq!(json["fields"][0]["key"], "patient");
        assert_eq!(json["fields"][0]["type"], "string");
        assert!(json["fields"][1].get("label").is_none());
    }
}
