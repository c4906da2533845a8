use crate::circuit::Circuit;
use crate::dense::Mat;
use crate::error::Result;
use crate::index::BusIndex;
use crate::math::{phase_slots, NPHASE};
use crate::opts::YbusOpt;
use crate::primitive::device_primitive;
use crate::regulator::embed_regulator;
use crate::sparse::block_entries;
use crate::topology::{DeviceKind, Topology};
use num_complex::Complex64;
use sparsetools::coo::Coo;
use std::collections::BTreeMap;

/// How the off-diagonal (bus to bus) blocks of a stamp are written.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CrossMode {
    /// Added onto whatever is already there.
    Accumulate,
    /// Replaces the existing block. A second device between the same pair
    /// of buses discards the first one's coupling.
    Overwrite,
}

/// Signed contribution of one device to the nodal and branch matrices.
#[derive(Debug, Clone)]
pub struct Stamp {
    pub nn: Mat<Complex64>,
    pub nm: Mat<Complex64>,
    pub mn: Mat<Complex64>,
    pub mm: Mat<Complex64>,
    pub branch: Mat<Complex64>,
    pub incidence: Mat<f64>,
    pub cross: CrossMode,
}

/// Global matrices accumulated over all devices of one topology.
///
/// The nodal admittance is kept as `3x3` blocks keyed by bus pair until
/// [`Assembly::ytilde`] flushes it into triplet form. Branch admittance and
/// incidence are pushed straight into triplets.
pub struct Assembly {
    nb: usize,
    nodal: BTreeMap<(usize, usize), Mat<Complex64>>,
    /// Block-diagonal branch admittance, `3 nl x 3 nl`.
    pub ybranch: Coo<usize, Complex64>,
    /// Signed incidence, `3 nl x 3 nb`.
    pub incidence: Coo<usize, f64>,
}

impl Assembly {
    pub fn new(nb: usize, nl: usize) -> Self {
        Self {
            nb,
            nodal: BTreeMap::new(),
            ybranch: Coo::with_size(NPHASE * nl, NPHASE * nl),
            incidence: Coo::with_size(NPHASE * nl, NPHASE * nb),
        }
    }

    fn add_block(&mut self, n: usize, m: usize, block: &Mat<Complex64>) {
        match self.nodal.get_mut(&(n, m)) {
            Some(existing) => *existing = &*existing + block,
            None => {
                self.nodal.insert((n, m), block.clone());
            }
        }
    }

    fn occupied(&self, n: usize, m: usize) -> bool {
        self.nodal.get(&(n, m)).map_or(false, |b| !b.is_zero())
    }

    /// Writes the stamp of branch `br` between buses `n` and `m`.
    pub fn stamp(&mut self, element: &str, br: usize, n: usize, m: usize, stamp: &Stamp) {
        self.add_block(n, n, &stamp.nn);
        match stamp.cross {
            CrossMode::Accumulate => {
                self.add_block(n, m, &stamp.nm);
                self.add_block(m, n, &stamp.mn);
            }
            CrossMode::Overwrite => {
                if self.occupied(n, m) || self.occupied(m, n) {
                    log::warn!(
                        "{} overwrites the coupling between buses {} and {}",
                        element,
                        n,
                        m
                    );
                }
                self.nodal.insert((n, m), stamp.nm.clone());
                self.nodal.insert((m, n), stamp.mn.clone());
            }
        }
        self.add_block(m, m, &stamp.mm);

        let (jn, jm, jbr) = (phase_slots(n), phase_slots(m), phase_slots(br));
        for (i, j, v) in block_entries(&jbr, &jbr, &stamp.branch) {
            self.ybranch.push(i, j, v);
        }
        for (i, j, v) in block_entries(&jbr, &jn, &stamp.incidence) {
            self.incidence.push(i, j, v);
        }
        for (i, j, v) in block_entries(&jbr, &jm, &stamp.incidence) {
            self.incidence.push(i, j, -v);
        }
    }

    /// Nodal admittance `Ytilde`, `3 nb x 3 nb`.
    pub fn ytilde(&self) -> Coo<usize, Complex64> {
        let mut ytilde = Coo::with_size(NPHASE * self.nb, NPHASE * self.nb);
        for (&(n, m), block) in &self.nodal {
            let (jn, jm) = (phase_slots(n), phase_slots(m));
            for (i, j, v) in block_entries(&jn, &jm, block) {
                ytilde.push(i, j, v);
            }
        }
        ytilde
    }
}

/// Stamps every branch device of `topo` into a fresh assembly.
pub fn assemble(
    ckt: &dyn Circuit,
    topo: &Topology,
    index: &BusIndex,
    opt: &YbusOpt,
) -> Result<Assembly> {
    let mut asm = Assembly::new(index.len(), topo.devices.len());

    for (br, device) in topo.devices.iter().enumerate() {
        let n = index.position(&device.from_bus, &device.name)?;
        let m = index.position(&device.to_bus, &device.name)?;

        let prim = device_primitive(ckt, device, opt)?;
        let stamp = match &device.kind {
            DeviceKind::Regulated { setting, .. } => {
                log::debug!(
                    "{}: {:?} regulator, taps {:?}, {} embedding",
                    device.name,
                    setting.model,
                    setting.taps,
                    opt.reg_policy
                );
                let gains = setting.gains(opt.s_base())?;
                embed_regulator(&prim, &gains, opt.reg_policy)?
            }
            _ => prim.line_stamp(),
        };
        log::debug!(
            "{}: branch {}, {} -> {}",
            device.name,
            br,
            device.from_bus,
            device.to_bus
        );

        asm.stamp(&device.name, br, n, m, &stamp);
    }
    Ok(asm)
}
