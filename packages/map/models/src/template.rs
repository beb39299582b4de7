//! Popup templates with `{key}` placeholders.

use serde::{Deserialize, Serialize};

use crate::{Attributes, PopupBody, PopupField, PopupSection};

/// One templated field of a popup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldTemplate {
    /// Label shown before the value.
    pub label: String,
    /// Attribute key the value is read from.
    pub key: String,
    /// Appended to present values (e.g., `" m"`).
    #[serde(default)]
    pub suffix: Option<String>,
    /// Overrides the template placeholder for this field.
    #[serde(default)]
    pub placeholder: Option<String>,
}

/// Template for a popup section.
///
/// With `fields` the section renders as labelled values; otherwise the
/// `message` template is rendered. Both `title` and `message` may reference
/// attributes as `{key}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PopupTemplate {
    /// Section title template.
    pub title: String,
    /// Field templates, in display order.
    #[serde(default)]
    pub fields: Vec<FieldTemplate>,
    /// Message template used when `fields` is empty.
    #[serde(default)]
    pub message: Option<String>,
    /// Text substituted for missing or empty values.
    #[serde(default = "default_placeholder")]
    pub placeholder: String,
}

fn default_placeholder() -> String {
    "unknown".to_string()
}

impl PopupTemplate {
    /// Renders this template against `attributes`.
    #[must_use]
    pub fn render(&self, attributes: &Attributes) -> PopupSection {
        let lookup = |key: &str| lookup_value(attributes, key);
        let title = render_text(&self.title, lookup, &self.placeholder);

        let body = if self.fields.is_empty() {
            PopupBody::Message(
                self.message
                    .as_deref()
                    .map(|m| render_text(m, lookup, &self.placeholder))
                    .unwrap_or_default(),
            )
        } else {
            PopupBody::Fields(
                self.fields
                    .iter()
                    .map(|field| {
                        let value = lookup(&field.key).map_or_else(
                            || {
                                field
                                    .placeholder
                                    .clone()
                                    .unwrap_or_else(|| self.placeholder.clone())
                            },
                            |v| format!("{v}{}", field.suffix.as_deref().unwrap_or_default()),
                        );
                        PopupField {
                            label: field.label.clone(),
                            value,
                        }
                    })
                    .collect(),
            )
        };

        PopupSection { title, body }
    }
}

fn lookup_value<'a>(attributes: &'a Attributes, key: &str) -> Option<&'a str> {
    attributes
        .get(key)
        .and_then(Option::as_deref)
        .filter(|v| !v.trim().is_empty())
}

/// Replaces every `{key}` in `template` with `lookup(key)`, or with
/// `placeholder` when the lookup yields nothing. An unterminated `{` is
/// kept verbatim.
#[must_use]
pub fn render_text<'a>(
    template: &str,
    lookup: impl Fn(&str) -> Option<&'a str>,
    placeholder: &str,
) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        let Some(end) = after.find('}') else {
            out.push_str(&rest[start..]);
            return out;
        };
        let key = after[..end].trim();
        out.push_str(lookup(key).unwrap_or(placeholder));
        rest = &after[end + 1..];
    }

    out.push_str(rest);
    out
}
