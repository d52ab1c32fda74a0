//! `.control` block builder for DC bias sweeps.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// One swept source: `name start stop step`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepSource {
    pub name: String,
    pub start: f64,
    pub stop: f64,
    pub step: f64,
}

impl SweepSource {
    pub fn new(name: impl Into<String>, start: f64, stop: f64, step: f64) -> Self {
        Self {
            name: name.into(),
            start,
            stop,
            step,
        }
    }

    fn to_spice(&self) -> String {
        format!("{} {} {} {}", self.name, self.start, self.stop, self.step)
    }
}

/// A `dc` analysis over one source, optionally nested in a second.
///
/// `primary` is the inner (fast) loop, as in ngspice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DcSweep {
    pub primary: SweepSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary: Option<SweepSource>,
}

impl DcSweep {
    pub fn single(primary: SweepSource) -> Self {
        Self {
            primary,
            secondary: None,
        }
    }

    pub fn nested(primary: SweepSource, secondary: SweepSource) -> Self {
        Self {
            primary,
            secondary: Some(secondary),
        }
    }

    fn to_spice(&self) -> String {
        match &self.secondary {
            Some(secondary) => format!("dc {} {}", self.primary.to_spice(), secondary.to_spice()),
            None => format!("dc {}", self.primary.to_spice()),
        }
    }
}

/// Fixed source values, one sweep, and the vectors to print.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepStep {
    /// Sources held at a fixed value for this step (`alter <name> <value>`).
    #[serde(default)]
    pub alter: IndexMap<String, f64>,
    pub sweep: DcSweep,
    pub print: Vec<String>,
}

impl SweepStep {
    pub fn new(sweep: DcSweep, print: &[&str]) -> Self {
        Self {
            alter: IndexMap::new(),
            sweep,
            print: print.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn with_alter(mut self, source: impl Into<String>, value: f64) -> Self {
        self.alter.insert(source.into(), value);
        self
    }
}

/// Renders a `.control ... .endc` section for the netlist body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlBlock {
    /// Digits printed per value (`set numdgt`).
    pub numdgt: u32,
    /// Print line width; wide enough that tables are not wrapped.
    pub width: u32,
    /// Page height; large enough that tables are not paginated.
    pub height: u64,
    /// Suppress the scale vector column (`set noprintscale`).
    pub noprintscale: bool,
    pub steps: Vec<SweepStep>,
}

impl Default for ControlBlock {
    fn default() -> Self {
        Self {
            numdgt: 16,
            width: 1_000,
            height: 1_000_000_000_000,
            noprintscale: true,
            steps: Vec::new(),
        }
    }
}

/// Vectors printed by [`ControlBlock::default_characterization`].
pub const DEFAULT_PRINT: [&str; 4] = ["V(D)", "V(G)", "V(B)", "I(Vds)"];

impl ControlBlock {
    pub fn with_step(mut self, step: SweepStep) -> Self {
        self.steps.push(step);
        self
    }

    /// Output and transfer curves at two body biases each.
    ///
    /// Output curves sweep Vds 0..1.65 V for Vgs 0..1.5 V at Vbs = 0 and
    /// -0.75 V. Transfer curves sweep Vgs -0.5..1.65 V for Vbs -1.5..0 V at
    /// Vds = 0.1 and 1.5 V.
    pub fn default_characterization() -> Self {
        let output = || {
            DcSweep::nested(
                SweepSource::new("Vds", 0.0, 1.65, 0.05),
                SweepSource::new("Vgs", 0.0, 1.5, 0.3),
            )
        };
        let transfer = || {
            DcSweep::nested(
                SweepSource::new("Vgs", -0.5, 1.65, 0.01),
                SweepSource::new("Vbs", -1.5, 0.0, 0.3),
            )
        };

        Self::default()
            .with_step(SweepStep::new(output(), &DEFAULT_PRINT).with_alter("Vbs", 0.0))
            .with_step(SweepStep::new(output(), &DEFAULT_PRINT).with_alter("Vbs", -0.75))
            .with_step(SweepStep::new(transfer(), &DEFAULT_PRINT).with_alter("Vds", 0.1))
            .with_step(SweepStep::new(transfer(), &DEFAULT_PRINT).with_alter("Vds", 1.5))
    }

    /// Render the block, suitable for [`NetlistParameters::body_setup`].
    ///
    /// [`NetlistParameters::body_setup`]: super::NetlistParameters::body_setup
    pub fn to_spice(&self) -> String {
        let mut lines = vec![".control".to_string(), String::new()];
        lines.push(format!("set numdgt={}", self.numdgt));
        lines.push(format!("set width={}", self.width));
        lines.push(format!("set height={}", self.height));
        if self.noprintscale {
            lines.push("set noprintscale".to_string());
        }

        for step in &self.steps {
            lines.push(String::new());
            for (source, value) in &step.alter {
                lines.push(format!("alter {} {}", source, value));
            }
            lines.push(step.sweep.to_spice());
            if !step.print.is_empty() {
                lines.push(format!("print {}", step.print.join(" ")));
            }
        }

        lines.push(String::new());
        lines.push(".endc".to_string());
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_sweep_rendering() {
        let block = ControlBlock::default().with_step(SweepStep::new(
            DcSweep::single(SweepSource::new("Vgs", 0.0, 1.8, 0.1)),
            &["I(Vds)"],
        ));
        let expected = "\
.control

set numdgt=16
set width=1000
set height=1000000000000
set noprintscale

dc Vgs 0 1.8 0.1
print I(Vds)

.endc";
        assert_eq!(block.to_spice(), expected);
    }

    #[test]
    fn test_default_characterization() {
        let text = ControlBlock::default_characterization().to_spice();
        assert!(text.starts_with(".control\n"));
        assert!(text.ends_with("\n.endc"));
        assert!(text.contains("alter Vbs -0.75\ndc Vds 0 1.65 0.05 Vgs 0 1.5 0.3\n"));
        assert!(text.contains("alter Vds 1.5\ndc Vgs -0.5 1.65 0.01 Vbs -1.5 0 0.3\n"));
        assert_eq!(text.matches("print V(D) V(G) V(B) I(Vds)").count(), 4);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let block: ControlBlock = serde_json::from_str(
            r#"{"steps": [{"sweep": {"primary": {"name": "Vds", "start": 0, "stop": 1, "step": 0.5}},
                           "print": ["I(Vds)"], "alter": {"Vgs": 1.2}}]}"#,
        )
        .unwrap();
        assert_eq!(block.numdgt, 16);
        assert!(block.to_spice().contains("alter Vgs 1.2\ndc Vds 0 1 0.5\nprint I(Vds)"));
    }
}
