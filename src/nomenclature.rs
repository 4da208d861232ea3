//! Fields, selections and the label generator.
//!
//! A label is built by walking the fields in order and appending each
//! field's selected value, joined by the separator. Fields without a name
//! or without a selection are skipped entirely.

use serde::Deserialize;

/// A named attribute with ordered candidate values and at most one selection
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Field {
    pub name: String,
    #[serde(default)]
    pub values: Vec<String>,
    /// Index into `values`
    #[serde(skip)]
    pub selected: Option<usize>,
}

impl Field {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            values: Vec::new(),
            selected: None,
        }
    }

    /// Build a field with candidate values and nothing selected
    pub fn with_values<I, S>(name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            values: values.into_iter().map(Into::into).collect(),
            selected: None,
        }
    }

    pub fn selected_value(&self) -> Option<&str> {
        self.selected
            .and_then(|i| self.values.get(i))
            .map(String::as_str)
    }

    /// Append a candidate value and select it.
    /// Returns false (and changes nothing) for blank input.
    pub fn add_value(&mut self, value: &str) -> bool {
        let value = value.trim();
        if value.is_empty() {
            return false;
        }
        self.values.push(value.to_string());
        self.selected = Some(self.values.len() - 1);
        true
    }

    /// Select the value with this text, if present
    pub fn select(&mut self, value: &str) -> bool {
        match self.values.iter().position(|v| v == value) {
            Some(idx) => {
                self.selected = Some(idx);
                true
            }
            None => false,
        }
    }

    /// Move the selection forward; an unselected field starts at the first value
    pub fn select_next(&mut self) {
        if self.values.is_empty() {
            return;
        }
        self.selected = Some(match self.selected {
            Some(i) => (i + 1) % self.values.len(),
            None => 0,
        });
    }

    /// Move the selection backward; an unselected field starts at the last value
    pub fn select_prev(&mut self) {
        if self.values.is_empty() {
            return;
        }
        self.selected = Some(match self.selected {
            Some(i) => i.checked_sub(1).unwrap_or(self.values.len() - 1),
            None => self.values.len() - 1,
        });
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }
}

/// Generate labels from `(name, selected value)` pairs.
///
/// Starts from a single empty label, so an empty input yields `[""]`.
pub fn generate_labels<'a, I>(selections: I, separator: &str) -> Vec<String>
where
    I: IntoIterator<Item = (&'a str, Option<&'a str>)>,
{
    let mut labels = vec![String::new()];

    for (name, value) in selections {
        let value = match value {
            Some(v) if !name.is_empty() && !v.is_empty() => v,
            _ => continue,
        };

        labels = labels
            .into_iter()
            .map(|mut label| {
                if !label.is_empty() {
                    label.push_str(separator);
                }
                label.push_str(value);
                label
            })
            .collect();
    }

    labels
}

/// Generate labels from the current field set
pub fn generate(fields: &[Field], separator: &str) -> Vec<String> {
    generate_labels(
        fields.iter().map(|f| (f.name.as_str(), f.selected_value())),
        separator,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn selected(name: &str, value: &str) -> Field {
        let mut field = Field::new(name);
        if !value.is_empty() {
            field.add_value(value);
        }
        field
    }

    #[test]
    fn test_joins_selected_values_in_field_order() {
        let fields = vec![
            selected("Type", "A"),
            selected("Color", "Red"),
            selected("Size", "XL"),
        ];
        assert_eq!(generate(&fields, "-"), vec!["A-Red-XL".to_string()]);
    }

    #[test]
    fn test_field_without_selection_is_skipped() {
        let fields = vec![selected("Type", "A"), selected("Color", "")];
        assert_eq!(generate(&fields, "-"), vec!["A".to_string()]);

        // Candidate values exist, but none is selected
        let mut unselected = Field::with_values("Color", ["Red", "Blue"]);
        unselected.clear_selection();
        let fields = vec![unselected, selected("Size", "M")];
        assert_eq!(generate(&fields, "-"), vec!["M".to_string()]);
    }

    #[test]
    fn test_field_without_name_is_skipped() {
        let fields = vec![selected("", "A"), selected("Color", "B")];
        assert_eq!(generate(&fields, "/"), vec!["B".to_string()]);
    }

    #[test]
    fn test_empty_field_list_yields_single_empty_label() {
        assert_eq!(generate(&[], "-"), vec![String::new()]);
    }

    #[test]
    fn test_separator_substitution() {
        let pairs = [("a", Some("A")), ("b", Some("B"))];
        assert_eq!(generate_labels(pairs, "_"), vec!["A_B".to_string()]);
        assert_eq!(generate_labels(pairs, ""), vec!["AB".to_string()]);
        assert_eq!(generate_labels(pairs, " :: "), vec!["A :: B".to_string()]);
    }

    #[test]
    fn test_no_leading_separator_after_skipped_fields() {
        let pairs = [("a", None), ("b", Some("")), ("c", Some("C")), ("d", Some("D"))];
        assert_eq!(generate_labels(pairs, "-"), vec!["C-D".to_string()]);
    }

    #[test]
    fn test_add_value_trims_and_selects() {
        let mut field = Field::new("Size");
        assert!(field.add_value("  S "));
        assert!(field.add_value("M"));
        assert!(!field.add_value("   "));
        assert_eq!(field.values, vec!["S", "M"]);
        assert_eq!(field.selected_value(), Some("M"));
    }

    #[test]
    fn test_selection_cycles_and_wraps() {
        let mut field = Field::with_values("Size", ["S", "M", "L"]);
        assert_eq!(field.selected_value(), None);

        field.select_next();
        assert_eq!(field.selected_value(), Some("S"));
        field.select_prev();
        assert_eq!(field.selected_value(), Some("L"));
        field.select_next();
        assert_eq!(field.selected_value(), Some("S"));

        field.clear_selection();
        field.select_prev();
        assert_eq!(field.selected_value(), Some("L"));

        assert!(field.select("M"));
        assert!(!field.select("XXL"));
        assert_eq!(field.selected_value(), Some("M"));
    }

    #[test]
    fn test_selection_on_empty_field_is_noop() {
        let mut field = Field::new("Empty");
        field.select_next();
        field.select_prev();
        assert_eq!(field.selected, None);
    }
}
