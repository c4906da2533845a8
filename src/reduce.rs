use crate::assemble::Assembly;
use crate::dense::Mat;
use crate::error::{Result, YbusError};
use crate::index::BusIndex;
use crate::math::{phase_slots, NPHASE};
use crate::network::Network;
use crate::sparse::Triplets;
use num_complex::Complex64;
use sparsetools::coo::Coo;

/// Global phase slots touched by at least one device.
///
/// The nonzero rows of the nodal admittance must coincide with the
/// nonzero columns of the incidence matrix.
pub fn energized(
    ytilde: &Coo<usize, Complex64>,
    incidence: &Coo<usize, f64>,
) -> Result<Vec<usize>> {
    let av_bus = Triplets::from(ytilde).nonzero_rows();
    let av_app = Triplets::from(incidence).nonzero_cols();
    if av_bus != av_app {
        let missing: Vec<usize> = av_bus
            .iter()
            .filter(|i| !av_app.contains(i))
            .chain(av_app.iter().filter(|i| !av_bus.contains(i)))
            .copied()
            .collect();
        return Err(YbusError::Inconsistent(format!(
            "admittance and incidence disagree on energized phases {:?}",
            missing
        )));
    }
    Ok(av_bus)
}

/// Splits `y_net` into the non-reference block, the cross block and the
/// reference block, the reference being the last three rows and columns.
pub fn partition(
    y_net: &Mat<Complex64>,
) -> (Mat<Complex64>, Mat<Complex64>, Mat<Complex64>) {
    let nn = y_net.rows() - NPHASE;
    let rest: Vec<usize> = (0..nn).collect();
    let sub: Vec<usize> = (nn..y_net.rows()).collect();

    let y = y_net.select(&rest, &rest);
    let y_ns = y_net.select(&rest, &sub);
    let y_ss = y_net.select(&sub, &sub);
    (y, y_ns, y_ss)
}

/// Restricts the assembled and capacitor matrices to the energized phases
/// and partitions the result around the reference bus.
///
/// `with_regs` lists the bus names in the ordering that keeps regulator
/// secondaries, reported alongside the network.
pub fn reduce(
    asm: &Assembly,
    y_cap: &Coo<usize, Complex64>,
    index: &BusIndex,
    with_regs: &BusIndex,
    s_base: f64,
) -> Result<Network> {
    let ytilde = asm.ytilde();
    let av_bus_ind = energized(&ytilde, &asm.incidence)?;

    let sref = phase_slots(index.len() - 1);
    if av_bus_ind.len() < NPHASE || av_bus_ind[av_bus_ind.len() - NPHASE..] != sref {
        return Err(YbusError::MissingReference(format!(
            "reference bus {} must be energized on all three phases",
            index.reference()
        )));
    }

    let y_bus_s = Triplets::from(&ytilde).select(&av_bus_ind, &av_bus_ind);
    let y_cap_s = Triplets::from(y_cap).select(&av_bus_ind, &av_bus_ind);
    let y_net = &y_bus_s + &y_cap_s;

    let (y, y_ns, y_ss) = partition(&y_net);
    log::info!(
        "reduced network: {} of {} phases energized, Y is {}x{}",
        av_bus_ind.len(),
        index.n_phase(),
        y.rows(),
        y.cols()
    );

    Ok(Network {
        bus_names: index.names().to_vec(),
        s_base,
        n: index.n(),
        y_bus: y.clone(),
        y,
        y_ns,
        y_ss,
        av_bus_ind,
        bus_names_with_regs: with_regs.names().to_vec(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assemble::{CrossMode, Stamp};
    use crate::cmplx;

    fn single_phase(phase: usize, y: f64) -> Stamp {
        let mut blk = Mat::zeros(3, 3);
        blk.set(phase, phase, cmplx!(y));
        let mut c = Mat::zeros(3, 3);
        c.set(phase, phase, 1.0);
        Stamp {
            nn: blk.clone(),
            nm: -&blk,
            mn: -&blk,
            mm: blk.clone(),
            branch: blk,
            incidence: c,
            cross: CrossMode::Overwrite,
        }
    }

    fn three_phase(y: f64) -> Stamp {
        let eye: Mat<f64> = Mat::identity(3);
        let blk = eye.map(|v| cmplx!(v * y));
        Stamp {
            nn: blk.clone(),
            nm: -&blk,
            mn: -&blk,
            mm: blk.clone(),
            branch: blk,
            incidence: eye,
            cross: CrossMode::Overwrite,
        }
    }

    #[test]
    fn test_partial_phases_dropped() -> anyhow::Result<()> {
        let index = BusIndex::new([("sourcebus", "1"), ("1", "2")], "sourcebus")?;
        let mut asm = Assembly::new(index.len(), 2);
        asm.stamp("Line.a", 0, 2, 0, &three_phase(1.0));
        asm.stamp("Line.b", 1, 0, 1, &single_phase(1, 4.0));

        let y_cap = Coo::with_size(9, 9);
        let net = reduce(&asm, &y_cap, &index, &index, 5e6)?;

        assert_eq!(net.av_bus_ind, vec![0, 1, 2, 4, 6, 7, 8]);
        assert_eq!(net.y.shape(), (4, 4));
        assert_eq!(net.y_ns.shape(), (4, 3));
        assert_eq!(net.y_ss.shape(), (3, 3));
        assert_eq!(net.y.get(1, 1), cmplx!(5.0));
        assert_eq!(net.y.get(3, 1), cmplx!(-4.0));
        assert_eq!(net.y_ns.get(0, 0), cmplx!(-1.0));
        assert_eq!(net.y_bus, net.y);
        assert_eq!(net.row_labels(), vec!["1.1", "1.2", "1.3", "2.2"]);
        assert_eq!(net.slot_label(8), ("sourcebus", 3));
        assert_eq!(net.bus_names_with_regs, vec!["1", "2", "sourcebus"]);
        Ok(())
    }

    #[test]
    fn test_reference_not_energized() -> anyhow::Result<()> {
        let index = BusIndex::new([("sourcebus", "1")], "sourcebus")?;
        let mut asm = Assembly::new(index.len(), 1);
        asm.stamp("Line.a", 0, 1, 0, &single_phase(0, 1.0));

        let res = reduce(&asm, &Coo::with_size(6, 6), &index, &index, 5e6);
        assert!(matches!(res, Err(YbusError::MissingReference(_))));
        Ok(())
    }

    #[test]
    fn test_capacitor_added_on_energized_phases() -> anyhow::Result<()> {
        let index = BusIndex::new([("sourcebus", "1")], "sourcebus")?;
        let mut asm = Assembly::new(index.len(), 1);
        asm.stamp("Line.a", 0, 1, 0, &three_phase(1.0));

        let mut y_cap = Coo::with_size(6, 6);
        y_cap.push(2, 2, cmplx!(0.0, 0.5));
        let net = reduce(&asm, &y_cap, &index, &index, 5e6)?;

        assert_eq!(net.y.get(2, 2), cmplx!(1.0, 0.5));
        assert_eq!(net.y.get(0, 0), cmplx!(1.0));
        assert_eq!(net.y_ss.get(2, 2), cmplx!(1.0));
        Ok(())
    }

    #[test]
    fn test_energized_mismatch() {
        // incidence covers all three phases, admittance only the first
        let mut stamp = single_phase(0, 1.0);
        stamp.incidence = Mat::identity(3);
        let mut asm = Assembly::new(2, 1);
        asm.stamp("Line.a", 0, 0, 1, &stamp);

        let ytilde = asm.ytilde();
        let res = energized(&ytilde, &asm.incidence);
        assert!(matches!(res, Err(YbusError::Inconsistent(_))));
    }
}
