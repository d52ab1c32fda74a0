//! Netlist generation for single-transistor characterization.
//!
//! The generated circuit is a four-terminal MOSFET `M1` with ideal voltage
//! sources on gate, drain and bulk, all referenced to a grounded source node.
//! Analysis commands are supplied by the caller in the body block, typically
//! rendered from a [`ControlBlock`].

mod control;
mod params;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use control::{ControlBlock, DEFAULT_PRINT, DcSweep, SweepSource, SweepStep};
pub use params::ModelParams;

/// BSIM4 level/version pair written on the model card.
pub const MODEL_LEVEL: u32 = 54;
pub const MODEL_VERSION: &str = "4.8.2";

/// Inputs substituted into the characterization template.
///
/// Temperature is in °C, length and width in micrometers. No ranges are
/// enforced. `pre_setup` and `body_setup` are inserted verbatim and must
/// already be valid simulator input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetlistParameters {
    pub model_name: String,
    pub model_type: String,
    /// Model parameter lines placed directly under the `.model` card.
    #[serde(default)]
    pub pre_setup: String,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default = "default_dimension")]
    pub length: f64,
    #[serde(default = "default_dimension")]
    pub width: f64,
    /// Control/analysis directives placed after the device statement.
    #[serde(default)]
    pub body_setup: String,
}

fn default_temperature() -> f64 {
    27.0
}

fn default_dimension() -> f64 {
    10.0
}

impl NetlistParameters {
    /// Parameters for a 10u x 10u device at 27 °C with empty text blocks.
    pub fn new(model_name: impl Into<String>, model_type: impl Into<String>) -> Self {
        Self {
            model_name: model_name.into(),
            model_type: model_type.into(),
            pre_setup: String::new(),
            temperature: default_temperature(),
            length: default_dimension(),
            width: default_dimension(),
            body_setup: String::new(),
        }
    }

    pub fn with_pre_setup(mut self, pre_setup: impl Into<String>) -> Self {
        self.pre_setup = pre_setup.into();
        self
    }

    pub fn with_body_setup(mut self, body_setup: impl Into<String>) -> Self {
        self.body_setup = body_setup.into();
        self
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    /// Set channel length and width in micrometers.
    pub fn with_geometry(mut self, length: f64, width: f64) -> Self {
        self.length = length;
        self.width = width;
        self
    }
}

/// Simulator input text produced by [`generate`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Netlist(String);

impl Netlist {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Netlist {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Netlist {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Render the characterization netlist.
///
/// Pure and deterministic: equal parameters always give byte-identical text.
pub fn generate(params: &NetlistParameters) -> Netlist {
    let NetlistParameters {
        model_name,
        model_type,
        pre_setup,
        temperature,
        length,
        width,
        body_setup,
    } = params;

    Netlist(format!(
        "\
* auto-generated simulation
.model {model_name} {model_type} level={MODEL_LEVEL} version={MODEL_VERSION}

{pre_setup}

.temp {temperature}

* Terminal bias setup
Vgs G S 0      ; Gate-to-Source voltage
Vds D S 0      ; Drain-to-Source voltage
Vbs B S 0      ; Bulk-to-Source voltage
Vs  S 0 0      ; Source to ground (0V reference)

M1 D G S B {model_name} L={length}u W={width}u


.option GMIN=1e-15

{body_setup}

.end
"
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> NetlistParameters {
        NetlistParameters::new("my_nmos", "nmos")
            .with_pre_setup("+vth0=0.7\n+u0=400")
            .with_body_setup(".control\nop\n.endc")
            .with_temperature(27.0)
            .with_geometry(10.0, 2.5)
    }

    #[test]
    fn test_generate_is_deterministic() {
        assert_eq!(generate(&params()), generate(&params()));
    }

    #[test]
    fn test_model_card_and_instance() {
        let netlist = generate(&params());
        let text = netlist.as_str();
        assert!(text.starts_with("* auto-generated simulation\n"));
        assert!(text.contains(".model my_nmos nmos level=54 version=4.8.2\n"));
        assert!(text.contains("\nM1 D G S B my_nmos L=10u W=2.5u\n"));
        assert!(text.contains("\n.temp 27\n"));
        assert!(text.contains("\n.option GMIN=1e-15\n"));
        assert!(text.ends_with(".end\n"));
    }

    #[test]
    fn test_model_name_appears_twice() {
        let netlist = generate(&params());
        assert_eq!(netlist.as_str().matches("my_nmos").count(), 2);
    }

    #[test]
    fn test_free_text_blocks_verbatim_and_ordered() {
        let p = params();
        let text = generate(&p).into_string();
        let pre = text.find(&p.pre_setup).expect("pre_setup present");
        let device = text.find("\nM1 ").expect("device present");
        let body = text.find(&p.body_setup).expect("body_setup present");
        let end = text.rfind(".end").unwrap();
        assert!(pre < device && device < body && body < end);
    }

    #[test]
    fn test_bias_sources() {
        let text = generate(&params()).into_string();
        for source in ["Vgs G S 0", "Vds D S 0", "Vbs B S 0", "Vs  S 0 0"] {
            assert!(text.contains(source), "missing {source}");
        }
    }

    #[test]
    fn test_free_text_is_not_escaped() {
        let p = NetlistParameters::new("m", "pmos").with_body_setup("{weird} ; $ text\n.end");
        assert!(generate(&p).as_str().contains("{weird} ; $ text\n.end\n\n.end\n"));
    }

    #[test]
    fn test_fractional_values() {
        let p = NetlistParameters::new("m", "nmos")
            .with_temperature(-40.5)
            .with_geometry(0.18, 1.0);
        let text = generate(&p).into_string();
        assert!(text.contains(".temp -40.5\n"));
        assert!(text.contains("L=0.18u W=1u"));
    }
}
