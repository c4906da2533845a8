use crate::error::YbusError;
use crate::regulator::{ieee123_regulators, RegulatorSetting};
use derive_builder::Builder;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Embedding used for the voltage regulators fused with a line or switch.
#[derive(Debug, PartialEq, Copy, Clone, Default, Serialize, Deserialize)]
pub enum RegulatorPolicy {
    /// Lossless turns-ratio transformation.
    #[default]
    Ideal,
    /// Turns ratio plus the regulator's own series impedance.
    NonIdeal,
}

impl FromStr for RegulatorPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ideal" => Ok(RegulatorPolicy::Ideal),
            "non-ideal" | "nonideal" | "non_ideal" => Ok(RegulatorPolicy::NonIdeal),
            _ => Err(format!(
                "unknown regulator policy {:?} (expected \"ideal\" or \"non-ideal\")",
                s
            )),
        }
    }
}

impl fmt::Display for RegulatorPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegulatorPolicy::Ideal => write!(f, "ideal"),
            RegulatorPolicy::NonIdeal => write!(f, "non-ideal"),
        }
    }
}

/// Normally-open switches of the IEEE 123-bus feeder.
pub fn default_open_switches() -> Vec<String> {
    vec!["Line.sw7".to_string(), "Line.sw8".to_string()]
}

/// Assembly options. Fixed for the lifetime of an assembly run.
#[derive(Debug, Clone, Builder)]
#[builder(build_fn(validate = "Self::validate"))]
pub struct YbusOpt {
    /// Regulator embedding policy.
    #[builder(default)]
    pub reg_policy: RegulatorPolicy,

    /// Regularization added to the transformer self admittance.
    #[builder(default = "1e-5")]
    pub epsilon: f64,

    /// Base apparent power (kVA), from the substation transformer.
    #[builder(default = "5000.0")]
    pub kva_base: f64,

    /// Base line-to-line voltage (kV) at the substation secondary.
    #[builder(default = "4.16")]
    pub kvll_base: f64,

    /// Regulators fused with the line or switch they feed, keyed by the
    /// name of that line or switch.
    #[builder(default = "ieee123_regulators()")]
    pub regulators: Vec<(String, RegulatorSetting)>,

    /// Switches left out of the model.
    #[builder(default = "default_open_switches()")]
    pub open_switches: Vec<String>,
}

impl YbusOptBuilder {
    fn validate(&self) -> Result<(), String> {
        if let Some(epsilon) = self.epsilon {
            if !(epsilon > 0.0) {
                return Err(format!("epsilon must be positive: {}", epsilon));
            }
        }
        if let Some(kva) = self.kva_base {
            if !(kva > 0.0) {
                return Err(format!("kva_base must be positive: {}", kva));
            }
        }
        if let Some(kv) = self.kvll_base {
            if !(kv > 0.0) {
                return Err(format!("kvll_base must be positive: {}", kv));
            }
        }
        Ok(())
    }
}

impl From<YbusOptBuilderError> for YbusError {
    fn from(err: YbusOptBuilderError) -> Self {
        YbusError::Config(err.to_string())
    }
}

impl Default for YbusOpt {
    fn default() -> Self {
        Self {
            reg_policy: RegulatorPolicy::default(),
            epsilon: 1e-5,
            kva_base: 5000.0,
            kvll_base: 4.16,
            regulators: ieee123_regulators(),
            open_switches: default_open_switches(),
        }
    }
}

impl YbusOpt {
    /// Base apparent power (VA).
    pub fn s_base(&self) -> f64 {
        self.kva_base * 1000.0
    }

    /// Base line-to-neutral voltage (V).
    pub fn v_base(&self) -> f64 {
        self.kvll_base * 1000.0 / f64::sqrt(3.0)
    }

    pub fn z_base(&self) -> f64 {
        self.v_base().powi(2) / self.s_base()
    }

    pub fn y_base(&self) -> f64 {
        1.0 / self.z_base()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bases() {
        let opt = YbusOpt::default();
        assert_eq!(opt.s_base(), 5e6);
        let v = 4160.0 / f64::sqrt(3.0);
        assert!((opt.z_base() - v * v / 5e6).abs() < 1e-12);
        assert!((opt.y_base() * opt.z_base() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_builder_defaults_match() -> anyhow::Result<()> {
        let opt = YbusOptBuilder::default()
            .reg_policy(RegulatorPolicy::NonIdeal)
            .build()?;
        assert_eq!(opt.reg_policy, RegulatorPolicy::NonIdeal);
        assert_eq!(opt.epsilon, YbusOpt::default().epsilon);
        assert_eq!(opt.regulators.len(), 4);
        assert_eq!(opt.open_switches, default_open_switches());
        Ok(())
    }

    #[test]
    fn test_builder_rejects_bad_epsilon() {
        let res = YbusOptBuilder::default().epsilon(0.0).build();
        assert!(res.is_err());
        let err: YbusError = res.unwrap_err().into();
        assert!(matches!(err, YbusError::Config(_)));
    }

    #[test]
    fn test_policy_from_str() {
        assert_eq!("ideal".parse(), Ok(RegulatorPolicy::Ideal));
        assert_eq!("Non-Ideal".parse(), Ok(RegulatorPolicy::NonIdeal));
        assert!("lossy".parse::<RegulatorPolicy>().is_err());
        assert_eq!(RegulatorPolicy::NonIdeal.to_string(), "non-ideal");
    }
}
