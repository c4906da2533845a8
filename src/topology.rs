use crate::circuit::Circuit;
use crate::error::{Result, YbusError};
use crate::opts::YbusOpt;
use crate::regulator::RegulatorSetting;
use std::collections::{HashMap, HashSet};

/// Role of a branch device, resolved once when the circuit is read.
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceKind {
    Line,
    Switch,
    Transformer,
    /// Line or switch fused with the regulator feeding it.
    Regulated {
        switch: bool,
        setting: RegulatorSetting,
    },
}

/// Directed two-terminal device.
#[derive(Debug, Clone, PartialEq)]
pub struct Device {
    pub name: String,
    pub from_bus: String,
    pub to_bus: String,
    pub kind: DeviceKind,
}

/// Shunt capacitor bank.
#[derive(Debug, Clone, PartialEq)]
pub struct Capacitor {
    pub name: String,
    pub bus: String,
}

/// Branch devices, regulators and capacitors of a feeder.
#[derive(Debug, Clone)]
pub struct Topology {
    /// Bus of the voltage source (substation).
    pub source_bus: String,

    /// Branch devices in branch order: lines, switches, transformers.
    pub devices: Vec<Device>,

    /// Regulator transformers. Only their buses are used, the regulator
    /// itself is modeled through the device it is fused with.
    pub regulators: Vec<Device>,

    pub capacitors: Vec<Capacitor>,
}

/// Strips node suffixes: `"83.1.2.3"` becomes `"83"`.
pub fn bus_id(name: &str) -> &str {
    name.split('.').next().unwrap_or(name)
}

/// Line terminals at a regulator output carry an `r` suffix (`"150r"`).
/// Stripping it connects the line to the regulator input bus.
fn line_bus_id(name: &str) -> &str {
    let id = bus_id(name);
    id.strip_suffix('r').unwrap_or(id)
}

fn terminals<'a>(element: &str, buses: &'a [String]) -> Result<(&'a str, &'a str)> {
    match buses {
        [b1, b2, ..] => Ok((b1.as_str(), b2.as_str())),
        _ => Err(YbusError::Shape {
            element: element.to_string(),
            reason: format!("two terminals required, found {}", buses.len()),
        }),
    }
}

/// A branch must join two distinct buses.
fn distinct_terminals(device: Device) -> Result<Device> {
    if device.from_bus == device.to_bus {
        return Err(YbusError::Shape {
            element: device.name,
            reason: format!("both terminals resolve to bus {}", device.from_bus),
        });
    }
    Ok(device)
}

impl Topology {
    pub fn from_circuit(ckt: &dyn Circuit, opt: &YbusOpt) -> Result<Self> {
        let fused: HashMap<&str, &RegulatorSetting> = opt
            .regulators
            .iter()
            .map(|(name, setting)| (name.as_str(), setting))
            .collect();
        let open: HashSet<&str> = opt.open_switches.iter().map(|s| s.as_str()).collect();

        let mut source_bus: Option<String> = None;
        let mut lines = Vec::new();
        let mut switches = Vec::new();
        let mut transformers = Vec::new();
        let mut regulators = Vec::new();
        let mut capacitors = Vec::new();

        for name in ckt.element_names() {
            let (class, short) = match name.split_once('.') {
                Some((class, short)) => (class.to_ascii_lowercase(), short.to_ascii_lowercase()),
                None => continue,
            };

            match class.as_str() {
                "vsource" => {
                    let buses = ckt.bus_names(&name)?;
                    let bus = buses.first().ok_or_else(|| YbusError::Shape {
                        element: name.clone(),
                        reason: "source has no terminals".to_string(),
                    })?;
                    if let Some(prev) = &source_bus {
                        log::warn!("ignoring {} (reference bus already set to {})", name, prev);
                        continue;
                    }
                    source_bus = Some(bus_id(bus).to_string());
                }
                "line" => {
                    let switch = short.contains("sw");
                    if switch && open.contains(name.as_str()) {
                        log::debug!("skipping open switch {}", name);
                        continue;
                    }
                    let buses = ckt.bus_names(&name)?;
                    let (b1, b2) = terminals(&name, &buses)?;
                    let kind = match fused.get(name.as_str()) {
                        Some(&setting) => DeviceKind::Regulated {
                            switch,
                            setting: setting.clone(),
                        },
                        None if switch => DeviceKind::Switch,
                        None => DeviceKind::Line,
                    };
                    let device = Device {
                        name: name.clone(),
                        from_bus: line_bus_id(b1).to_string(),
                        to_bus: line_bus_id(b2).to_string(),
                        kind,
                    };
                    let device = distinct_terminals(device)?;
                    if switch {
                        switches.push(device);
                    } else {
                        lines.push(device);
                    }
                }
                "transformer" => {
                    let buses = ckt.bus_names(&name)?;
                    let (b1, b2) = terminals(&name, &buses)?;
                    let device = Device {
                        name: name.clone(),
                        from_bus: bus_id(b1).to_string(),
                        to_bus: bus_id(b2).to_string(),
                        kind: DeviceKind::Transformer,
                    };
                    if short.contains("reg") {
                        regulators.push(device);
                    } else {
                        transformers.push(distinct_terminals(device)?);
                    }
                }
                "capacitor" => {
                    let buses = ckt.bus_names(&name)?;
                    let bus = buses.first().ok_or_else(|| YbusError::Shape {
                        element: name.clone(),
                        reason: "capacitor has no terminals".to_string(),
                    })?;
                    capacitors.push(Capacitor {
                        name: name.clone(),
                        bus: bus_id(bus).to_string(),
                    });
                }
                _ => {}
            }
        }

        let source_bus = source_bus.ok_or_else(|| {
            YbusError::MissingReference("circuit has no voltage source".to_string())
        })?;

        let mut devices = lines;
        devices.append(&mut switches);
        devices.append(&mut transformers);

        for name in fused.keys() {
            if !devices.iter().any(|d| d.name == *name) {
                log::warn!("regulated device {} not found in circuit", name);
            }
        }

        Ok(Self {
            source_bus,
            devices,
            regulators,
            capacitors,
        })
    }

    /// Terminal bus pairs of the branch devices.
    pub fn branch_pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.devices
            .iter()
            .map(|d| (d.from_bus.as_str(), d.to_bus.as_str()))
    }

    /// Terminal bus pairs of the branch devices followed by the regulators.
    pub fn pairs_with_regulators(&self) -> impl Iterator<Item = (&str, &str)> {
        self.branch_pairs().chain(
            self.regulators
                .iter()
                .map(|d| (d.from_bus.as_str(), d.to_bus.as_str())),
        )
    }
}
