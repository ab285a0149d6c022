use serde::{Deserialize, Serialize};

/// Insertion-ordered association list of payment fields.
///
/// The gateway's signing protocol hashes fields in the order they were
/// assembled, NOT alphabetically, so this must never be backed by an
/// unordered map. Duplicate keys are kept as-is; the gateway never sends
/// them and we never build them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSet {
    entries: Vec<(String, String)>,
}

impl FieldSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.push((key.into(), value.into()));
    }

    /// Push only when a value is present. Absent and empty values are
    /// excluded from the canonical string anyway; skipping them here keeps
    /// the assembled set closer to what goes over the wire.
    pub fn push_opt(&mut self, key: impl Into<String>, value: Option<impl Into<String>>) {
        if let Some(v) = value {
            self.entries.push((key.into(), v.into()));
        }
    }

    /// First value for a key, if any.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(String, String)> for FieldSet {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preserves_insertion_order() {
        let mut fields = FieldSet::new();
        fields.push("b", "2");
        fields.push("a", "1");

        let keys: Vec<&str> = fields.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["b", "a"]);
    }

    #[test]
    fn get_returns_first_match() {
        let mut fields = FieldSet::new();
        fields.push("amount", "100.00");
        assert_eq!(fields.get("amount"), Some("100.00"));
        assert_eq!(fields.get("missing"), None);
    }

    #[test]
    fn push_opt_skips_none() {
        let mut fields = FieldSet::new();
        fields.push_opt("email_address", Some("x@y.com"));
        fields.push_opt("cell_number", None::<String>);
        assert_eq!(fields.len(), 1);
    }
}
