//! Step-voltage regulator models.
//!
//! A regulator is never stamped on its own. It is fused with the line or
//! switch fed from its output terminals and the pair is embedded as one
//! branch: the primitive blocks of the line are transformed by the regulator
//! gain `Av = diag(1 - 0.00625 * tap)`, its inverse `Ai` and, for the
//! non-ideal policy, the regulator series impedance `Zreg` (Bazrafshan et
//! al., 2018, eq. 12 and 18).

use crate::assemble::{CrossMode, Stamp};
use crate::dense::Mat;
use crate::error::{Result, YbusError};
use crate::math::{J, NPHASE};
use crate::opts::RegulatorPolicy;
use crate::primitive::Primitive;
use num_complex::Complex64;
use serde::{Deserialize, Serialize};

/// Per-unit voltage change for one tap step.
pub const TAP_STEP: f64 = 0.00625;

/// Regulator topology.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum RegulatorModel {
    /// Three-phase gang operated.
    Gang,
    /// Single-phase, phase A only.
    SinglePhaseA,
    /// Open-wye, phases A and C.
    TwoPhaseAC,
    /// Three single-phase units tapped individually.
    Individual,
}

impl RegulatorModel {
    /// Phases carried by the regulator, in A, B, C order.
    pub fn phases(&self) -> [bool; NPHASE] {
        match self {
            RegulatorModel::Gang | RegulatorModel::Individual => [true, true, true],
            RegulatorModel::SinglePhaseA => [true, false, false],
            RegulatorModel::TwoPhaseAC => [true, false, true],
        }
    }
}

/// Fixed tap and impedance data for one regulator instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegulatorSetting {
    pub model: RegulatorModel,

    /// Tap position per phase, in -16..=16. Ignored for phases the model
    /// does not carry.
    pub taps: [i32; NPHASE],

    /// Rated apparent power of the regulator (VA).
    pub rating_va: f64,

    /// Winding multiplier applied to the reactance.
    pub windings: f64,

    /// Series reactance (p.u. on the regulator rating).
    pub reactance: f64,
}

/// Gain, inverse gain and series impedance of a regulator, in per-unit.
#[derive(Debug, Clone)]
pub struct RegulatorGains {
    pub av: Mat<Complex64>,
    pub ai: Mat<Complex64>,
    pub zreg: Mat<Complex64>,
}

impl RegulatorSetting {
    pub fn gang(taps: [i32; NPHASE]) -> Self {
        Self {
            model: RegulatorModel::Gang,
            taps,
            rating_va: 5_000_000.0,
            windings: 3.0,
            reactance: 0.00001,
        }
    }

    pub fn single_phase_a(tap_a: i32) -> Self {
        Self {
            model: RegulatorModel::SinglePhaseA,
            taps: [tap_a, 0, 0],
            ..Self::single_unit()
        }
    }

    pub fn two_phase_ac(tap_a: i32, tap_c: i32) -> Self {
        Self {
            model: RegulatorModel::TwoPhaseAC,
            taps: [tap_a, 0, tap_c],
            ..Self::single_unit()
        }
    }

    pub fn individual(taps: [i32; NPHASE]) -> Self {
        Self {
            model: RegulatorModel::Individual,
            taps,
            ..Self::single_unit()
        }
    }

    fn single_unit() -> Self {
        Self {
            model: RegulatorModel::Individual,
            taps: [0; NPHASE],
            rating_va: 2_000_000.0,
            windings: 1.0,
            reactance: 0.0001,
        }
    }

    /// Turns ratio `1 - 0.00625 * tap` per phase, zero on absent phases.
    pub fn ratios(&self) -> [f64; NPHASE] {
        let phases = self.model.phases();
        let mut ar = [0.0; NPHASE];
        for p in 0..NPHASE {
            if phases[p] {
                ar[p] = 1.0 - TAP_STEP * self.taps[p] as f64;
            }
        }
        ar
    }

    /// Builds `Av`, `Ai` and `Zreg` for a system base of `s_base` VA.
    pub fn gains(&self, s_base: f64) -> Result<RegulatorGains> {
        let phases = self.model.phases();
        let ar = self.ratios();
        let zt = J * (self.reactance * (s_base / self.rating_va) * self.windings);

        let av = Mat::with_diagonal(&ar.map(|a| Complex64::new(a, 0.0)));

        let ai = match self.model {
            RegulatorModel::Gang | RegulatorModel::Individual => av.inverse().ok_or_else(|| {
                YbusError::Singular(format!("regulator gain with taps {:?}", self.taps))
            })?,
            RegulatorModel::SinglePhaseA | RegulatorModel::TwoPhaseAC => {
                let mut inv = [Complex64::default(); NPHASE];
                for p in (0..NPHASE).filter(|&p| phases[p]) {
                    if ar[p] == 0.0 {
                        return Err(YbusError::Singular(format!(
                            "regulator gain on phase {} with tap {}",
                            p, self.taps[p]
                        )));
                    }
                    inv[p] = Complex64::new(1.0 / ar[p], 0.0);
                }
                Mat::with_diagonal(&inv)
            }
        };

        let mut zreg = [Complex64::default(); NPHASE];
        for p in (0..NPHASE).filter(|&p| phases[p]) {
            zreg[p] = zt / ar[p];
        }

        Ok(RegulatorGains {
            av,
            ai,
            zreg: Mat::with_diagonal(&zreg),
        })
    }
}

/// Regulators of the IEEE 123-bus feeder, keyed by the line or switch each
/// one is fused with.
pub fn ieee123_regulators() -> Vec<(String, RegulatorSetting)> {
    vec![
        ("Line.sw1".to_string(), RegulatorSetting::gang([7, 7, 7])),
        ("Line.l11".to_string(), RegulatorSetting::single_phase_a(-1)),
        ("Line.l25".to_string(), RegulatorSetting::two_phase_ac(0, -1)),
        ("Line.l117".to_string(), RegulatorSetting::individual([8, 1, 5])),
    ]
}

/// Embeds a regulator into the primitive of the line it is fused with.
pub fn embed_regulator(
    prim: &Primitive,
    gains: &RegulatorGains,
    policy: RegulatorPolicy,
) -> Result<Stamp> {
    let ai = &gains.ai;
    let ai_t = ai.transpose();
    let (y_nmn, y_nmm, y_mnn, y_mnm) = (&prim.y_nmn, &prim.y_nmm, &prim.y_mnn, &prim.y_mnm);

    let (nn, nm, mn, mm) = match policy {
        RegulatorPolicy::Ideal => {
            let nn = &(ai * y_nmn) * &ai_t;
            let nm = -&(ai * y_nmm);
            let mn = -&(y_mnn * &ai_t);
            (nn, nm, mn, y_mnm.clone())
        }
        RegulatorPolicy::NonIdeal => {
            let eye = Mat::identity(NPHASE);
            // Ai' * Zreg * Ai
            let aza = &(&ai_t * &gains.zreg) * ai;

            let fr = &eye + &(y_nmn * &aza);
            let fr_inv = fr.inverse().ok_or_else(|| {
                YbusError::Singular("regulator embedding matrix Fr".to_string())
            })?;
            let fri_t = &eye - &(&(&aza * &fr_inv) * y_nmn);

            let ai_fr = ai * &fr_inv;
            let nn = &(&ai_fr * y_nmn) * &ai_t;
            let nm = -&(&ai_fr * y_nmm);
            let mn = -&(&(y_mnn * &fri_t) * &ai_t);
            let mm = y_mnm - &(&(&(y_mnn * &aza) * &fr_inv) * y_nmm);
            (nn, nm, mn, mm)
        }
    };

    Ok(Stamp {
        nn,
        nm,
        mn,
        mm,
        branch: prim.y_branch.clone(),
        incidence: prim.incidence.clone(),
        cross: CrossMode::Accumulate,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cmplx;

    fn assert_close(a: &Mat<Complex64>, b: &Mat<Complex64>, tol: f64) {
        for (x, y) in a.values().iter().zip(b.values()) {
            assert!((x - y).norm() <= tol, "{} != {}", x, y);
        }
    }

    fn line(phases: &[usize]) -> Primitive {
        let z = Mat::new(3, 3)
            .values(vec![
                cmplx!(2.0, -6.0),
                cmplx!(-0.5, 2.0),
                cmplx!(-0.4, 1.5),
                cmplx!(-0.5, 2.0),
                cmplx!(2.1, -6.2),
                cmplx!(-0.6, 1.8),
                cmplx!(-0.4, 1.5),
                cmplx!(-0.6, 1.8),
                cmplx!(1.9, -5.8),
            ])
            .build()
            .unwrap();
        let sub = z.select(phases, phases);
        let y_diag = &sub + &Mat::with_diagonal(&vec![cmplx!(0.0, 0.01); phases.len()]);
        Primitive::scatter(phases, phases, &y_diag, &sub)
    }

    #[test]
    fn test_ratios() {
        let close = |a: [f64; 3], b: [f64; 3]| a.iter().zip(b).all(|(x, y)| (x - y).abs() < 1e-15);

        let reg = RegulatorSetting::single_phase_a(-1);
        assert!(close(reg.ratios(), [1.00625, 0.0, 0.0]));

        let reg = RegulatorSetting::individual([8, 1, 5]);
        assert!(close(reg.ratios(), [0.95, 0.99375, 0.96875]));

        let reg = RegulatorSetting::gang([0, 0, 0]);
        assert_eq!(reg.ratios(), [1.0; 3]);
    }

    #[test]
    fn test_gains_partial_phases() {
        let reg = RegulatorSetting::two_phase_ac(0, -1);
        let g = reg.gains(5e6).unwrap();
        assert_eq!(g.ai.get(0, 0), cmplx!(1.0));
        assert_eq!(g.ai.get(1, 1), cmplx!(0.0));
        assert!((g.ai.get(2, 2) - cmplx!(1.0 / 1.00625)).norm() < 1e-15);

        // (5e6 / 2e6) * 1 * 1e-4
        let zt = 2.5e-4;
        assert!((g.zreg.get(2, 2) - cmplx!(0.0, zt / 1.00625)).norm() < 1e-15);
        assert_eq!(g.zreg.get(1, 1), cmplx!(0.0));
    }

    #[test]
    fn test_singular_gain() {
        let reg = RegulatorSetting::gang([160, 0, 0]);
        assert!(matches!(reg.gains(5e6), Err(YbusError::Singular(_))));
    }

    #[test]
    fn test_ideal_unit_gain_is_line() {
        let prim = line(&[0, 1, 2]);
        let reg = RegulatorSetting::gang([0, 0, 0]);
        let stamp = embed_regulator(&prim, &reg.gains(5e6).unwrap(), RegulatorPolicy::Ideal).unwrap();
        let plain = prim.line_stamp();

        assert_eq!(stamp.nn, plain.nn);
        assert_eq!(stamp.nm, plain.nm);
        assert_eq!(stamp.mn, plain.mn);
        assert_eq!(stamp.mm, plain.mm);
        assert_eq!(stamp.cross, CrossMode::Accumulate);
    }

    #[test]
    fn test_non_ideal_approaches_ideal() {
        let prim = line(&[0, 1, 2]);
        let mut reg = RegulatorSetting::individual([8, 1, 5]);
        reg.reactance = 1e-12;
        let g = reg.gains(5e6).unwrap();

        let ideal = embed_regulator(&prim, &g, RegulatorPolicy::Ideal).unwrap();
        let lossy = embed_regulator(&prim, &g, RegulatorPolicy::NonIdeal).unwrap();
        assert_close(&ideal.nn, &lossy.nn, 1e-9);
        assert_close(&ideal.nm, &lossy.nm, 1e-9);
        assert_close(&ideal.mn, &lossy.mn, 1e-9);
        assert_close(&ideal.mm, &lossy.mm, 1e-9);

        reg.reactance = 0.0001;
        let g = reg.gains(5e6).unwrap();
        let lossy = embed_regulator(&prim, &g, RegulatorPolicy::NonIdeal).unwrap();
        assert!((&ideal.nn - &lossy.nn).values().iter().any(|v| v.norm() > 1e-9));
    }

    #[test]
    fn test_single_phase_ideal() {
        let prim = line(&[0]);
        let reg = RegulatorSetting::single_phase_a(-1);
        let stamp =
            embed_regulator(&prim, &reg.gains(5e6).unwrap(), RegulatorPolicy::Ideal).unwrap();

        for block in [&stamp.nn, &stamp.nm, &stamp.mn, &stamp.mm] {
            for p in 1..3 {
                for q in 0..3 {
                    assert_eq!(block.get(p, q), cmplx!(0.0));
                    assert_eq!(block.get(q, p), cmplx!(0.0));
                }
            }
        }

        let ar = 1.00625;
        assert!((stamp.nn.get(0, 0) * ar * ar - prim.y_nmn.get(0, 0)).norm() < 1e-12);
        assert!((stamp.nm.get(0, 0) * ar + prim.y_nmm.get(0, 0)).norm() < 1e-12);
        assert!((stamp.mn.get(0, 0) * ar + prim.y_mnn.get(0, 0)).norm() < 1e-12);
        assert_eq!(stamp.mm.get(0, 0), prim.y_mnm.get(0, 0));
    }

    #[test]
    fn test_single_phase_non_ideal_scalar() {
        let prim = line(&[0]);
        let mut reg = RegulatorSetting::single_phase_a(-1);
        reg.reactance = 0.01;
        let g = reg.gains(5e6).unwrap();
        let stamp = embed_regulator(&prim, &g, RegulatorPolicy::NonIdeal).unwrap();

        let ar = 1.00625;
        let z = cmplx!(0.0, 0.01 * 2.5) / ar;
        assert!((g.zreg.get(0, 0) - z).norm() < 1e-15);

        let a = prim.y_nmn.get(0, 0);
        let b = prim.y_nmm.get(0, 0);
        let d = prim.y_mnm.get(0, 0);
        assert_eq!(prim.y_mnn.get(0, 0), b);

        // Fr = 1 + a z / ar^2, and Fri' reduces to 1 / Fr
        let fr = 1.0 + a * z / (ar * ar);
        let close = |x: Complex64, y: Complex64| (x - y).norm() <= 1e-12 * y.norm().max(1.0);
        assert!(close(stamp.nn.get(0, 0), a / (ar * ar * fr)));
        assert!(close(stamp.nm.get(0, 0), -b / (ar * fr)));
        assert!(close(stamp.mn.get(0, 0), -b / (fr * ar)));
        assert!(close(stamp.mm.get(0, 0), d - b * b * z / (ar * ar * fr)));
        assert!((fr - 1.0).norm() > 1e-4);

        for block in [&stamp.nn, &stamp.nm, &stamp.mn, &stamp.mm] {
            for p in 1..3 {
                assert_eq!(block.get(p, p), cmplx!(0.0));
                assert_eq!(block.get(0, p), cmplx!(0.0));
            }
        }
    }
}
