//! thermal-network: the thermal resistor graph (§4.1) and its sparse
//! modified-nodal-analysis assembly (§4.2).

pub mod mna;
pub mod network;

pub use mna::{MNABuilder, MnaOptions, MnaSystem};
pub use network::{Neighbor, Node, NodeView, ThermalNetwork};
