mod assemble;
mod circuit;
mod dense;
mod error;
mod index;
mod loadcase;
mod math;
mod network;
mod opts;
mod primitive;
mod reduce;
mod regulator;
mod shunt;
mod sparse;
mod topology;
mod ybus;

pub mod debug;

#[cfg(test)]
mod tests;

pub use assemble::*;
pub use circuit::*;
pub use dense::*;
pub use error::*;
pub use index::*;
pub use loadcase::*;
pub use math::*;
pub use network::*;
pub use opts::*;
pub use primitive::*;
pub use reduce::*;
pub use regulator::*;
pub use shunt::*;
pub use sparse::*;
pub use topology::*;
pub use ybus::*;
