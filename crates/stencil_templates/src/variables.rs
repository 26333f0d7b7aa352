//! Variables handed to the renderer.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Ordered mapping from variable name to a scalar or nested value.
///
/// Passed to the renderer as-is. Defaults are the caller's business; nothing is
/// injected here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TemplateVariables(Map<String, Value>);

impl TemplateVariables {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(name.into(), value.into());
    }

    pub fn extend(&mut self, other: TemplateVariables) {
        self.0.extend(other.0);
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// String value of a variable, if it is a string.
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.0.get(name).and_then(Value::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for TemplateVariables {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_insertion_order_preserved() {
        let vars = TemplateVariables::new()
            .with("zeta", "last")
            .with("alpha", 1)
            .with("nested", json!({"a": [1, 2]}));

        let keys: Vec<_> = vars.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, ["zeta", "alpha", "nested"]);
        assert_eq!(vars.get_str("zeta"), Some("last"));
        assert_eq!(vars.get_str("alpha"), None);
    }

    #[test]
    fn test_serializes_as_plain_object() {
        let vars: TemplateVariables = [("name", "Widget")].into_iter().collect();
        assert_eq!(serde_json::to_value(&vars).unwrap(), json!({"name": "Widget"}));
    }
}
