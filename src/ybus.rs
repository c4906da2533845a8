use crate::assemble::assemble;
use crate::circuit::Circuit;
use crate::error::Result;
use crate::index::BusIndex;
use crate::network::{Branches, Network};
use crate::opts::YbusOpt;
use crate::reduce::reduce;
use crate::shunt::make_ycap;
use crate::sparse::Triplets;
use crate::topology::Topology;

/// Builds the three-phase admittance matrix of a feeder.
///
/// Devices are read from `ckt`, stamped into `3 nb x 3 nb` nodal and
/// branch matrices, combined with the capacitor shunts and reduced to the
/// energized phases. The returned network is partitioned around the
/// voltage source bus:
///
/// ```text
///      | I_N |   | Y     Y_NS |   | V_N |
///      |     | = |            | * |     |
///      | I_S |   | Y_SN  Y_SS |   | V_S |
/// ```
///
/// All admittances are per-unit on `opt.kva_base` and `opt.kvll_base`.
pub fn make_ybus(ckt: &dyn Circuit, opt: &YbusOpt) -> Result<(Network, Branches)> {
    let topo = Topology::from_circuit(ckt, opt)?;
    log::info!(
        "{} branch devices, {} regulators, {} capacitors, source bus {}",
        topo.devices.len(),
        topo.regulators.len(),
        topo.capacitors.len(),
        topo.source_bus
    );

    let index = BusIndex::new(topo.branch_pairs(), &topo.source_bus)?;
    let with_regs = BusIndex::new(topo.pairs_with_regulators(), &topo.source_bus)?;
    log::debug!(
        "{} buses ({} with regulator terminals)",
        index.len(),
        with_regs.len()
    );

    let asm = assemble(ckt, &topo, &index, opt)?;
    let y_cap = make_ycap(ckt, &topo.capacitors, &index, opt)?;

    let network = reduce(&asm, &y_cap, &index, &with_regs, opt.s_base())?;

    let incidence = Triplets::from(&asm.incidence);
    let av_branch_ind = incidence.nonzero_rows();
    log::debug!(
        "{} of {} branch phases energized",
        av_branch_ind.len(),
        incidence.shape().0
    );

    let branches = Branches {
        names: topo.devices.iter().map(|d| d.name.clone()).collect(),
        y_branch: Triplets::from(&asm.ybranch).to_dense(),
        incidence: incidence.to_dense(),
        av_branch_ind,
    };
    Ok((network, branches))
}
