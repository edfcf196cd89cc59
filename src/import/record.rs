//! One parsed CSV row.

use serde::ser::{Serialize, SerializeMap, Serializer};

/// Header/value pairs of a CSV row, in column order.
///
/// Serializes to a JSON object whose keys keep that order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportRecord {
    fields: Vec<(String, String)>,
}

impl ImportRecord {
    /// Pair row values with headers. Columns past the header row are keyed
    /// `_{index}`; missing trailing columns are left out.
    pub fn from_row<'a>(
        headers: impl IntoIterator<Item = &'a str>,
        values: impl IntoIterator<Item = &'a str>,
    ) -> Self {
        let headers: Vec<&str> = headers.into_iter().collect();
        let mut record = Self::default();
        for (index, value) in values.into_iter().enumerate() {
            let key = match headers.get(index) {
                Some(header) => (*header).to_string(),
                None => format!("_{}", index),
            };
            record.insert(key, value.to_string());
        }
        record
    }

    /// Set a field. A repeated key keeps its first position and takes the
    /// new value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(k, _)| *k == key) {
            Some(field) => field.1 = value,
            None => self.fields.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ImportRecord {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = Self::default();
        for (k, v) in iter {
            record.insert(k, v);
        }
        record
    }
}

impl Serialize for ImportRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (key, value) in &self.fields {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_keeps_column_order() {
        let record = ImportRecord::from_row(["title", "price", "count"], ["Lamp", "12.5", "3"]);
        assert_eq!(
            record.to_json().unwrap(),
            r#"{"title":"Lamp","price":"12.5","count":"3"}"#
        );
    }

    #[test]
    fn test_extra_columns_keyed_by_index() {
        let record = ImportRecord::from_row(["name", "price"], ["Lamp", "12", "oops", "x"]);
        assert_eq!(record.get("_2"), Some("oops"));
        assert_eq!(record.get("_3"), Some("x"));
        assert_eq!(record.len(), 4);
    }

    #[test]
    fn test_short_row_omits_missing_columns() {
        let record = ImportRecord::from_row(["name", "price", "count"], ["Lamp"]);
        assert_eq!(record.to_json().unwrap(), r#"{"name":"Lamp"}"#);
    }

    #[test]
    fn test_duplicate_header_last_value_wins() {
        let record = ImportRecord::from_row(["name", "price", "name"], ["A", "1", "B"]);
        assert_eq!(record.to_json().unwrap(), r#"{"name":"B","price":"1"}"#);
    }

    #[test]
    fn test_values_pass_through_verbatim() {
        let record: ImportRecord = [("price", " not a number ")].into_iter().collect();
        assert_eq!(record.get("price"), Some(" not a number "));
    }
}
