//! Per-device primitive admittance blocks.
//!
//! Every device is described by four 3x3 blocks in per-unit
//!
//! ```text
//!      | In |   | Ynm_n  -Ynm_m |   | Vn |
//!      |    | = |               | * |    |
//!      | Im |   | -Ymn_n  Ymn_m |   | Vm |
//! ```
//!
//! plus the branch through-admittance and the 0/1 incidence mask. Rows and
//! columns are the device's phases placed in the full A, B, C frame; phases
//! the device does not carry stay zero.

use crate::assemble::{CrossMode, Stamp};
use crate::circuit::Circuit;
use crate::cmplx;
use crate::debug::format_block;
use crate::dense::Mat;
use crate::error::{Result, YbusError};
use crate::math::{J, NPHASE};
use crate::opts::YbusOpt;
use crate::topology::{Device, DeviceKind};
use num_complex::Complex64;

/// Switch series impedance (ohm/mile), real and imaginary parts.
const SWITCH_Z: [[(f64, f64); NPHASE]; NPHASE] = [
    [(0.4576, 1.0780), (0.1560, 0.5017), (0.1535, 0.3849)],
    [(0.1560, 0.5017), (0.4666, 1.0482), (0.1580, 0.4236)],
    [(0.1535, 0.3849), (0.1580, 0.4236), (0.4615, 1.0651)],
];

/// Switch shunt susceptance (micro-siemens/mile).
const SWITCH_B: [[f64; NPHASE]; NPHASE] = [
    [5.6765, -1.8319, -0.6982],
    [-1.8319, 5.9809, -1.1645],
    [-0.6982, -1.1645, 5.3971],
];

const FEET_PER_MILE: f64 = 5280.0;

/// Nominal switch length (ft).
const SWITCH_LENGTH: f64 = 1e-3;

/// Substation transformer impedance (p.u. on its own rating).
const XFMR_Z: (f64, f64) = (0.0127, 0.0272);

/// Substation transformer rating (VA).
const XFMR_RATING: f64 = 150_000.0;

#[derive(Debug, Clone, PartialEq)]
pub struct Primitive {
    /// Self admittance at the sending end.
    pub y_nmn: Mat<Complex64>,
    /// Mutual admittance, sending to receiving.
    pub y_nmm: Mat<Complex64>,
    /// Mutual admittance, receiving to sending.
    pub y_mnn: Mat<Complex64>,
    /// Self admittance at the receiving end.
    pub y_mnm: Mat<Complex64>,
    /// Branch through-admittance.
    pub y_branch: Mat<Complex64>,
    /// Branch phase to bus phase incidence.
    pub incidence: Mat<f64>,
}

impl Primitive {
    /// Places per-unit self and mutual blocks at the `rows` x `cols`
    /// phase positions of a 3x3 frame.
    pub fn scatter(
        rows: &[usize],
        cols: &[usize],
        y_diag: &Mat<Complex64>,
        y_off: &Mat<Complex64>,
    ) -> Self {
        let place = |src: &Mat<Complex64>| {
            let mut block = Mat::zeros(NPHASE, NPHASE);
            block.set_at(rows, cols, src);
            block
        };
        let mut incidence = Mat::zeros(NPHASE, NPHASE);
        incidence.set_at(rows, cols, &Mat::identity(rows.len()));

        Self {
            y_nmn: place(y_diag),
            y_nmm: place(y_off),
            y_mnn: place(y_off),
            y_mnm: place(y_diag),
            y_branch: place(y_off),
            incidence,
        }
    }

    /// Stamp of an ordinary line, switch or transformer: self blocks
    /// accumulate, cross blocks overwrite.
    pub fn line_stamp(&self) -> Stamp {
        Stamp {
            nn: self.y_nmn.clone(),
            nm: -&self.y_nmm,
            mn: -&self.y_mnn,
            mm: self.y_mnm.clone(),
            branch: self.y_branch.clone(),
            incidence: self.incidence.clone(),
            cross: CrossMode::Overwrite,
        }
    }
}

/// Splits a node order into the phase positions (0-based) of terminal 1
/// (rows) and terminal 2 (columns).
pub fn terminal_phases(element: &str, nodes: &[usize]) -> Result<(Vec<usize>, Vec<usize>)> {
    let n = nodes.len();
    if n == 0 || n % 2 != 0 || n / 2 > NPHASE {
        return Err(YbusError::Shape {
            element: element.to_string(),
            reason: format!("expected 2 to {} nodes in pairs, found {}", 2 * NPHASE, n),
        });
    }
    if let Some(&node) = nodes.iter().find(|&&node| node == 0 || node > NPHASE) {
        return Err(YbusError::Shape {
            element: element.to_string(),
            reason: format!("node {} is not a phase conductor", node),
        });
    }
    let rows = nodes[..n / 2].iter().map(|&node| node - 1).collect();
    let cols = nodes[n / 2..].iter().map(|&node| node - 1).collect();
    Ok((rows, cols))
}

/// Unpacks a primitive admittance into the terminal 1 self block and the
/// sign-corrected mutual block.
pub fn unpack_y_prim(
    element: &str,
    packed: &[f64],
    n: usize,
) -> Result<(Mat<Complex64>, Mat<Complex64>)> {
    if packed.len() != 2 * n * n {
        return Err(YbusError::Shape {
            element: element.to_string(),
            reason: format!(
                "primitive admittance has {} values, expected 2 * {} * {}",
                packed.len(),
                n,
                n
            ),
        });
    }
    let entry = |i: usize, j: usize| cmplx!(packed[i * 2 * n + 2 * j], packed[i * 2 * n + 2 * j + 1]);

    let h = n / 2;
    let mut y_diag = Mat::zeros(h, h);
    let mut y_off = Mat::zeros(h, h);
    for i in 0..h {
        for j in 0..h {
            y_diag.set(i, j, entry(i, j));
            y_off.set(i, j, -entry(i, h + j));
        }
    }
    Ok((y_diag, y_off))
}

/// Primitive of a line, from the admittance supplied by the circuit.
pub fn line_primitive(ckt: &dyn Circuit, element: &str, opt: &YbusOpt) -> Result<Primitive> {
    let nodes = ckt.node_order(element)?;
    let (rows, cols) = terminal_phases(element, &nodes)?;
    let (y_diag, y_off) = unpack_y_prim(element, &ckt.y_prim(element)?, nodes.len())?;

    let y_base = opt.y_base();
    Ok(Primitive::scatter(
        &rows,
        &cols,
        &y_diag.map(|y| y / y_base),
        &y_off.map(|y| y / y_base),
    ))
}

/// Primitive of a switch. Switches are ideal shorts in the circuit model,
/// so a short three-phase line section is used instead.
pub fn switch_primitive(ckt: &dyn Circuit, element: &str, opt: &YbusOpt) -> Result<Primitive> {
    let nodes = ckt.node_order(element)?;
    let (rows, cols) = terminal_phases(element, &nodes)?;
    if rows.len() != NPHASE {
        return Err(YbusError::Shape {
            element: element.to_string(),
            reason: format!("switch model is three-phase, found {} phases", rows.len()),
        });
    }

    let mut z_series = Mat::zeros(NPHASE, NPHASE);
    let mut y_shunt = Mat::zeros(NPHASE, NPHASE);
    for i in 0..NPHASE {
        for j in 0..NPHASE {
            let (r, x) = SWITCH_Z[i][j];
            z_series.set(i, j, cmplx!(r, x) / FEET_PER_MILE);
            y_shunt.set(i, j, J * 1e-6 * SWITCH_B[i][j] / FEET_PER_MILE);
        }
    }

    let y_series = z_series
        .scale(cmplx!(SWITCH_LENGTH))
        .inverse()
        .ok_or_else(|| YbusError::Singular(format!("series impedance of {}", element)))?;
    let y_diag = &y_series + &y_shunt.scale(cmplx!(0.5 * SWITCH_LENGTH));

    let y_base = opt.y_base();
    Ok(Primitive::scatter(
        &rows,
        &cols,
        &y_diag.map(|y| y / y_base),
        &y_series.map(|y| y / y_base),
    ))
}

/// Y-Delta step-down transformer. The delta winding admittance is rank
/// deficient, so `epsilon * |yt|` is added to the self blocks and half of it
/// to the mutual blocks.
pub fn transformer_primitive(opt: &YbusOpt) -> Primitive {
    let zt = cmplx!(XFMR_Z.0, XFMR_Z.1) * (opt.s_base() / XFMR_RATING) * 3.0;
    let yt = cmplx!(1.0) / zt;

    let mut y2 = Mat::zeros(NPHASE, NPHASE);
    for i in 0..NPHASE {
        for j in 0..NPHASE {
            y2.set(i, j, if i == j { 2.0 * yt / 3.0 } else { -yt / 3.0 });
        }
    }
    let reg = |eps: f64| Mat::with_diagonal(&[cmplx!(yt.norm() * eps); NPHASE]);
    let y2_hat1 = &y2 + &reg(opt.epsilon);
    let y2_hat2 = &y2 + &reg(opt.epsilon / 2.0);

    Primitive {
        y_nmn: y2_hat1.clone(),
        y_nmm: y2_hat2.clone(),
        y_mnn: y2_hat2,
        y_mnm: y2_hat1,
        y_branch: y2,
        incidence: Mat::identity(NPHASE),
    }
}

/// Primitive of a branch device, before any regulator embedding.
pub fn device_primitive(ckt: &dyn Circuit, device: &Device, opt: &YbusOpt) -> Result<Primitive> {
    let prim = match &device.kind {
        DeviceKind::Line | DeviceKind::Regulated { switch: false, .. } => {
            line_primitive(ckt, &device.name, opt)?
        }
        DeviceKind::Switch | DeviceKind::Regulated { switch: true, .. } => {
            switch_primitive(ckt, &device.name, opt)?
        }
        DeviceKind::Transformer => transformer_primitive(opt),
    };
    log::trace!("{} Ynm_n:\n{}", device.name, format_block(&prim.y_nmn));
    Ok(prim)
}
