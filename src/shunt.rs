use crate::circuit::Circuit;
use crate::dense::Mat;
use crate::error::{Result, YbusError};
use crate::index::BusIndex;
use crate::math::{J, NPHASE};
use crate::opts::YbusOpt;
use crate::sparse::block_entries;
use crate::topology::Capacitor;
use num_complex::Complex64;
use sparsetools::coo::Coo;
use std::collections::BTreeMap;

/// Per-phase admittance block of a capacitor bank. Each phase is an
/// independent shunt carrying an equal share of the bank rating.
pub fn capacitor_block(
    ckt: &dyn Circuit,
    cap: &Capacitor,
    opt: &YbusOpt,
) -> Result<Mat<Complex64>> {
    let nodes = ckt.node_order(&cap.name)?;
    let n = nodes.len();
    if n == 0 || n % 2 != 0 || n / 2 > NPHASE {
        return Err(YbusError::Shape {
            element: cap.name.clone(),
            reason: format!("expected 2 to {} nodes in pairs, found {}", 2 * NPHASE, n),
        });
    }
    let phases = &nodes[..n / 2];
    if let Some(&node) = phases.iter().find(|&&node| node == 0 || node > NPHASE) {
        return Err(YbusError::Shape {
            element: cap.name.clone(),
            reason: format!("node {} is not a phase conductor", node),
        });
    }

    let kvar = ckt.capacitor_kvar(&cap.name)?;
    let y = J * (kvar / phases.len() as f64) * 1000.0 / opt.s_base();

    let mut block = Mat::zeros(NPHASE, NPHASE);
    for &node in phases {
        block.set(node - 1, node - 1, y);
    }
    Ok(block)
}

/// Capacitor shunt admittance, same shape as the nodal admittance and
/// nonzero on diagonal blocks only.
pub fn make_ycap(
    ckt: &dyn Circuit,
    caps: &[Capacitor],
    index: &BusIndex,
    opt: &YbusOpt,
) -> Result<Coo<usize, Complex64>> {
    let mut blocks: BTreeMap<[usize; NPHASE], Mat<Complex64>> = BTreeMap::new();

    for cap in caps {
        let jn = index.slots(&cap.bus, &cap.name)?;
        let block = capacitor_block(ckt, cap, opt)?;
        log::debug!("{}: bus {}, {:?}", cap.name, cap.bus, block.diagonal().collect::<Vec<_>>());
        if blocks.insert(jn, block).map_or(false, |b| !b.is_zero()) {
            log::warn!("{} replaces the capacitor already at bus {}", cap.name, cap.bus);
        }
    }

    let mut y_cap = Coo::with_size(index.n_phase(), index.n_phase());
    for (jn, block) in &blocks {
        for (i, j, v) in block_entries(jn, jn, block) {
            y_cap.push(i, j, v);
        }
    }
    Ok(y_cap)
}
