use crate::circuit::{CircuitData, Element};
use crate::network::{Branches, Network};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

/// Circuit export: one entry per element, in engine order.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct CircuitFile {
    pub elements: Vec<Element>,
}

#[derive(Serialize)]
struct NetworkFile<'a> {
    #[serde(flatten)]
    network: &'a Network,

    #[serde(skip_serializing_if = "Option::is_none")]
    branches: Option<&'a Branches>,
}

pub fn load_circuit(path: &Path) -> Result<CircuitData> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let case: CircuitFile = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("reading circuit {}", path.display()))?;
    log::debug!("{}: {} elements", path.display(), case.elements.len());
    Ok(CircuitData::new(case.elements))
}

/// Writes the network, and optionally the branch matrices, as JSON.
pub fn save_network(path: &Path, network: &Network, branches: Option<&Branches>) -> Result<()> {
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut w = BufWriter::new(file);
    write_network(&mut w, network, branches)?;
    w.flush()?;
    Ok(())
}

pub fn write_network<W: Write>(w: W, network: &Network, branches: Option<&Branches>) -> Result<()> {
    serde_json::to_writer_pretty(w, &NetworkFile { network, branches })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit::Circuit;
    use crate::opts::YbusOpt;
    use crate::ybus::make_ybus;
    use std::env;

    fn casedata(name: &str) -> Result<std::path::PathBuf> {
        let manifest_dir = env::var("CARGO_MANIFEST_DIR")?;
        Ok(Path::new(&manifest_dir).join("casedata").join(name))
    }

    #[test]
    fn test_load_circuit() -> Result<()> {
        let ckt = load_circuit(&casedata("feeder4.json")?)?;

        assert_eq!(ckt.element_names().len(), 6);
        assert_eq!(ckt.bus_names("Line.l12")?, vec!["1.1.2.3", "2.1.2.3"]);
        assert_eq!(ckt.node_order("Line.l23")?, vec![1, 1]);
        assert_eq!(ckt.y_prim("Line.l23")?.len(), 8);
        assert_eq!(ckt.capacitor_kvar("Capacitor.c3")?, 50.0);
        Ok(())
    }

    #[test]
    fn test_missing_file() {
        let res = load_circuit(Path::new("no/such/feeder.json"));
        assert!(res.is_err());
    }

    #[test]
    fn test_write_network() -> Result<()> {
        let ckt = load_circuit(&casedata("feeder4.json")?)?;
        let opt = YbusOpt {
            regulators: vec![],
            ..Default::default()
        };
        let (network, branches) = make_ybus(&ckt, &opt)?;

        let mut buf = Vec::new();
        write_network(&mut buf, &network, None)?;
        let v: serde_json::Value = serde_json::from_slice(&buf)?;
        assert_eq!(v["busNames"][3], "sourcebus");
        assert_eq!(v["N"], 3);
        assert_eq!(v["Sbase"], 5e6);
        assert!(v.get("branches").is_none());
        assert!(v.get("bus_names_with_regs").is_none());

        let mut buf = Vec::new();
        write_network(&mut buf, &network, Some(&branches))?;
        let v: serde_json::Value = serde_json::from_slice(&buf)?;
        assert_eq!(v["branches"]["names"][0], "Line.l01");
        assert!(v["branches"]["avBranchInd"].is_array());
        Ok(())
    }
}
