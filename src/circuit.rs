use crate::error::{Result, YbusError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Read-only view of a compiled circuit, as exposed by a circuit simulation
/// engine. Element names follow the `Class.name` convention
/// (`Line.l1`, `Transformer.xfm1`, `Capacitor.c83`, `Vsource.source`).
pub trait Circuit {
    /// Names of all elements, in engine order.
    fn element_names(&self) -> Vec<String>;

    /// Bus names of each terminal. Entries may carry node suffixes
    /// (`"83.1.2.3"`).
    fn bus_names(&self, element: &str) -> Result<Vec<String>>;

    /// Node (phase) numbers of every conductor, terminal by terminal.
    /// Phases are 1-indexed, 0 is ground.
    fn node_order(&self, element: &str) -> Result<Vec<usize>>;

    /// Primitive admittance (ohm/siemens domain) as `n x n` complex values,
    /// row-major with interleaved real and imaginary parts.
    fn y_prim(&self, element: &str) -> Result<Vec<f64>>;

    /// Rated reactive power of a capacitor bank (kvar).
    fn capacitor_kvar(&self, element: &str) -> Result<f64>;
}

/// One circuit element with the data the assembly reads from it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Element {
    /// Element name, `Class.name`.
    pub name: String,

    /// Terminal bus names.
    pub buses: Vec<String>,

    /// Terminal node numbers.
    #[serde(default)]
    pub nodes: Vec<usize>,

    /// Packed primitive admittance.
    #[serde(default)]
    pub y_prim: Vec<f64>,

    /// Capacitor rating (kvar).
    #[serde(default)]
    pub kvar: Option<f64>,
}

/// In-memory circuit, typically exported from a simulation engine.
#[derive(Debug, Clone, Default)]
pub struct CircuitData {
    elements: Vec<Element>,
    by_name: HashMap<String, usize>,
}

impl CircuitData {
    pub fn new(elements: Vec<Element>) -> Self {
        let by_name = elements
            .iter()
            .enumerate()
            .map(|(i, e)| (e.name.clone(), i))
            .collect();
        Self { elements, by_name }
    }

    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    pub fn element(&self, name: &str) -> Result<&Element> {
        self.by_name
            .get(name)
            .map(|&i| &self.elements[i])
            .ok_or_else(|| YbusError::UnknownElement(name.to_string()))
    }
}

impl From<Vec<Element>> for CircuitData {
    fn from(elements: Vec<Element>) -> Self {
        CircuitData::new(elements)
    }
}

impl Circuit for CircuitData {
    fn element_names(&self) -> Vec<String> {
        self.elements.iter().map(|e| e.name.clone()).collect()
    }

    fn bus_names(&self, element: &str) -> Result<Vec<String>> {
        Ok(self.element(element)?.buses.clone())
    }

    fn node_order(&self, element: &str) -> Result<Vec<usize>> {
        Ok(self.element(element)?.nodes.clone())
    }

    fn y_prim(&self, element: &str) -> Result<Vec<f64>> {
        Ok(self.element(element)?.y_prim.clone())
    }

    fn capacitor_kvar(&self, element: &str) -> Result<f64> {
        let elem = self.element(element)?;
        elem.kvar.ok_or_else(|| YbusError::Shape {
            element: element.to_string(),
            reason: "capacitor has no kvar rating".to_string(),
        })
    }
}
