use crate::error::{Result, YbusError};
use crate::math::{phase_slots, NPHASE};
use std::collections::HashMap;

/// Ordered, duplicate-free bus list with the reference bus last.
#[derive(Debug, Clone)]
pub struct BusIndex {
    names: Vec<String>,
    position: HashMap<String, usize>,
}

impl BusIndex {
    /// Collects the buses of `pairs` in first-seen order and moves
    /// `reference` to the end.
    pub fn new<'a, I>(pairs: I, reference: &str) -> Result<Self>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut names: Vec<String> = Vec::new();
        let mut position: HashMap<String, usize> = HashMap::new();
        for (b1, b2) in pairs {
            for bus in [b1, b2] {
                if !position.contains_key(bus) {
                    position.insert(bus.to_string(), names.len());
                    names.push(bus.to_string());
                }
            }
        }

        let i = position.get(reference).copied().ok_or_else(|| {
            YbusError::MissingReference(format!(
                "reference bus {:?} is not connected to any device",
                reference
            ))
        })?;
        let sbus = names.remove(i);
        names.push(sbus);

        let position = names
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), i))
            .collect();

        Ok(Self { names, position })
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Number of buses excluding the reference.
    pub fn n(&self) -> usize {
        self.names.len() - 1
    }

    /// Number of global phase slots.
    pub fn n_phase(&self) -> usize {
        self.names.len() * NPHASE
    }

    pub fn reference(&self) -> &str {
        &self.names[self.names.len() - 1]
    }

    /// Position of `bus`, or an error naming the `element` that referenced it.
    pub fn position(&self, bus: &str, element: &str) -> Result<usize> {
        self.position
            .get(bus)
            .copied()
            .ok_or_else(|| YbusError::UnknownBus {
                element: element.to_string(),
                bus: bus.to_string(),
            })
    }

    /// Global phase slots of `bus`.
    pub fn slots(&self, bus: &str, element: &str) -> Result<[usize; NPHASE]> {
        Ok(phase_slots(self.position(bus, element)?))
    }
}
