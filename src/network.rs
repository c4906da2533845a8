use crate::dense::Mat;
use crate::math::NPHASE;
use num_complex::Complex64;
use serde::Serialize;

/// Reduced network handed to the load model and power flow solver.
///
/// `Y`, `Y_NS` and `Y_SS` are per-unit and indexed by the energized phase
/// slots in `avBusInd` order; the reference bus phases are partitioned out
/// as the last three.
#[derive(Debug, Clone, Serialize)]
pub struct Network {
    /// Buses in global order, reference bus last.
    #[serde(rename = "busNames")]
    pub bus_names: Vec<String>,

    /// Base apparent power (VA).
    #[serde(rename = "Sbase")]
    pub s_base: f64,

    /// Number of buses excluding the reference.
    #[serde(rename = "N")]
    pub n: usize,

    /// Admittance between non-reference phases.
    #[serde(rename = "Y")]
    pub y: Mat<Complex64>,

    /// Admittance from non-reference phases to the reference bus.
    #[serde(rename = "Y_NS")]
    pub y_ns: Mat<Complex64>,

    /// Reference bus self admittance.
    #[serde(rename = "Y_SS")]
    pub y_ss: Mat<Complex64>,

    /// Same as `y`.
    #[serde(rename = "Ybus")]
    pub y_bus: Mat<Complex64>,

    /// Energized global phase slots, ascending.
    #[serde(rename = "avBusInd")]
    pub av_bus_ind: Vec<usize>,

    /// Bus list including buses only reached through regulators.
    #[serde(skip)]
    pub bus_names_with_regs: Vec<String>,
}

impl Network {
    /// Bus name and phase (1-based) of a global phase slot.
    pub fn slot_label(&self, slot: usize) -> (&str, usize) {
        (&self.bus_names[slot / NPHASE], slot % NPHASE + 1)
    }

    /// `bus.phase` labels of the rows of `Y`.
    pub fn row_labels(&self) -> Vec<String> {
        let n = self.av_bus_ind.len().saturating_sub(NPHASE);
        self.av_bus_ind[..n]
            .iter()
            .map(|&slot| {
                let (bus, phase) = self.slot_label(slot);
                format!("{}.{}", bus, phase)
            })
            .collect()
    }
}

/// Branch matrices kept alongside the network.
#[derive(Debug, Clone, Serialize)]
pub struct Branches {
    /// Device names in branch order.
    pub names: Vec<String>,

    /// Block-diagonal branch admittance.
    #[serde(rename = "Ybranch")]
    pub y_branch: Mat<Complex64>,

    /// Signed branch to bus incidence.
    #[serde(rename = "C")]
    pub incidence: Mat<f64>,

    /// Energized branch phase slots.
    #[serde(rename = "avBranchInd")]
    pub av_branch_ind: Vec<usize>,
}
