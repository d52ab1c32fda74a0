//! Model parameter overrides rendered as `.model` continuation lines.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Ordered set of model parameter overrides (e.g. `vth0`, `u0`, `vsat`).
///
/// Renders as one SPICE continuation line per parameter, `+name=value`,
/// in insertion order, suitable for [`NetlistParameters::pre_setup`].
///
/// [`NetlistParameters::pre_setup`]: super::NetlistParameters::pre_setup
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModelParams(IndexMap<String, f64>);

impl ModelParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a parameter, keeping its original position if already present.
    pub fn set(&mut self, name: impl Into<String>, value: f64) -> &mut Self {
        self.0.insert(name.into(), value);
        self
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.0.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Render as continuation lines without a trailing newline.
    pub fn to_spice(&self) -> String {
        self.iter()
            .map(|(name, value)| format!("+{}={}", name, value))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl<K: Into<String>> FromIterator<(K, f64)> for ModelParams {
    fn from_iter<I: IntoIterator<Item = (K, f64)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_renders_in_insertion_order() {
        let params: ModelParams = [("vth0", 0.7), ("u0", 400.0), ("vsat", 1e5), ("k1", 0.0)]
            .into_iter()
            .collect();
        assert_eq!(params.to_spice(), "+vth0=0.7\n+u0=400\n+vsat=100000\n+k1=0");
    }

    #[test]
    fn test_set_overwrites_in_place() {
        let mut params = ModelParams::new();
        params.set("vth0", 0.7).set("u0", 400.0).set("vth0", 0.45);
        assert_eq!(params.len(), 2);
        assert_eq!(params.get("vth0"), Some(0.45));
        assert_eq!(params.to_spice(), "+vth0=0.45\n+u0=400");
    }

    #[test]
    fn test_empty_renders_nothing() {
        assert!(ModelParams::new().to_spice().is_empty());
    }

    #[test]
    fn test_json_object_keeps_order() {
        let params: ModelParams = serde_json::from_str(r#"{"u0": 400, "vth0": 0.7}"#).unwrap();
        assert_eq!(params.iter().next(), Some(("u0", 400.0)));
    }
}
