//! Types for ngspice simulation results.

use serde::Serialize;

/// Name of the sweep index column ngspice prepends to every printed table.
pub const INDEX_COLUMN: &str = "Index";

/// A table of simulation values parsed from ngspice `print` output.
///
/// Columns are named verbatim from the header line (e.g. `"Index"`, `"v(d)"`,
/// `"i(vds)"`). Rows keep the order ngspice emitted them in, which is the
/// sweep order. Every row has exactly `columns().len()` values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationResult {
    columns: Vec<String>,
    rows: Vec<Vec<f64>>,
    /// Simulator stderr captured during the run that produced this table.
    #[serde(skip_serializing_if = "String::is_empty")]
    diagnostics: String,
}

/// A result whose designated current column has been perturbed.
///
/// Structurally identical to [`SimulationResult`].
pub type NoisyResult = SimulationResult;

impl SimulationResult {
    /// Build a table from columns and rows.
    ///
    /// Returns `None` if any row length differs from the column count.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<f64>>) -> Option<Self> {
        if rows.iter().any(|row| row.len() != columns.len()) {
            return None;
        }
        Some(Self {
            columns,
            rows,
            diagnostics: String::new(),
        })
    }

    /// Attach captured simulator diagnostics.
    pub fn with_diagnostics(mut self, diagnostics: impl Into<String>) -> Self {
        self.diagnostics = diagnostics.into();
        self
    }

    /// Column names, in header order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Column names excluding the sweep index column.
    pub fn signal_columns(&self) -> Vec<&str> {
        self.columns
            .iter()
            .map(String::as_str)
            .filter(|name| *name != INDEX_COLUMN)
            .collect()
    }

    /// Data rows, in emission order.
    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    /// Get a row by position.
    pub fn row(&self, index: usize) -> Option<&[f64]> {
        self.rows.get(index).map(Vec::as_slice)
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of a column by exact name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// All values of one column.
    pub fn column(&self, name: &str) -> Option<Vec<f64>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(|row| row[idx]).collect())
    }

    /// Simulator stderr captured with this result (empty if none).
    pub fn diagnostics(&self) -> &str {
        &self.diagnostics
    }

    /// Render as a whitespace-aligned text table.
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        for name in &self.columns {
            out.push_str(&format!("{:>16}", name));
        }
        out.push('\n');
        for row in &self.rows {
            for value in row {
                out.push_str(&format!("{:>16.6e}", value));
            }
            out.push('\n');
        }
        out
    }

    pub(crate) fn rows_mut(&mut self) -> &mut [Vec<f64>] {
        &mut self.rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> SimulationResult {
        SimulationResult::new(
            vec!["Index".into(), "v(d)".into(), "i(vds)".into()],
            vec![vec![0.0, 0.0, 0.0], vec![1.0, 0.05, 1.2e-6]],
        )
        .unwrap()
    }

    #[test]
    fn test_rejects_ragged_rows() {
        let table = SimulationResult::new(
            vec!["Index".into(), "v(d)".into()],
            vec![vec![0.0, 1.0], vec![1.0]],
        );
        assert!(table.is_none());
    }

    #[test]
    fn test_column_lookup() {
        let table = sample();
        assert_eq!(table.column_index("i(vds)"), Some(2));
        assert_eq!(table.column("v(d)").unwrap(), vec![0.0, 0.05]);
        assert!(table.column("I(VDS)").is_none());
    }

    #[test]
    fn test_signal_columns_skip_index() {
        assert_eq!(sample().signal_columns(), vec!["v(d)", "i(vds)"]);
    }

    #[test]
    fn test_to_text_has_header_and_rows() {
        let text = sample().to_text();
        assert_eq!(text.lines().count(), 3);
        assert!(text.lines().next().unwrap().contains("i(vds)"));
    }
}
