//! The undirected thermal resistor network (spec.md §3, §4.1).

use std::fmt;

use thermal_core::{ThermalError, ThermalResult};

/// A single `(peer, resistance)` adjacency record. Stored twice — once per
/// endpoint — so neighbor iteration during MNA assembly is O(deg(node))
/// rather than requiring a global edge scan.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub peer: usize,
    pub r: f64,
}

/// A node in the thermal network.
#[derive(Debug, Clone)]
pub struct Node {
    /// Temperature (K); `None` while unsolved.
    pub t: Option<f64>,
    /// Thermal capacitance (J/K); `c == 0.0` means capacitance-free.
    pub c: f64,
    /// Injected heat flow (W); may be signed.
    pub hf: f64,
    /// Coupling conductance to the reference ambient (W/K).
    pub htc: f64,
    /// Ordered `(peer, r)` adjacency.
    pub neighbors: Vec<Neighbor>,
}

impl Default for Node {
    fn default() -> Self {
        Self {
            t: None,
            c: 0.0,
            hf: 0.0,
            htc: 0.0,
            neighbors: Vec::new(),
        }
    }
}

impl Node {
    /// This node is a "source" node (spec.md §3): it carries injected heat
    /// flow or a finite HTC to ambient. Source nodes define `B`'s columns.
    pub fn is_source(&self) -> bool {
        self.hf != 0.0 || self.htc != 0.0
    }
}

/// Render a node for debug/trace logging: id, temperature, capacitance,
/// injected heat flow, ambient coupling, and adjacency.
pub struct NodeView<'a> {
    pub index: usize,
    pub node: &'a Node,
}

impl fmt::Display for NodeView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ID: {}, T: {:?}, C: {}, HF: {}, HTC: {}",
            self.index, self.node.t, self.node.c, self.node.hf, self.node.htc
        )?;
        if !self.node.neighbors.is_empty() {
            write!(f, ", N: [")?;
            for n in &self.node.neighbors {
                write!(f, "{}({}) ", n.peer, n.r)?;
            }
            write!(f, "]")?;
        }
        Ok(())
    }
}

/// The thermal network: a mutable adjacency-list graph of `Node`s.
///
/// Constructed with a fixed node count; nodes may be appended afterwards
/// (e.g. virtual power-block aggregator nodes, spec.md §4.6). Edges and
/// node attributes may be mutated only up until the network is handed to an
/// `MNABuilder`; after assembly, only `set_t` should be called (to write
/// back a solved temperature field).
#[derive(Debug, Clone, Default)]
pub struct ThermalNetwork {
    nodes: Vec<Node>,
}

impl ThermalNetwork {
    /// Build a network with `n` nodes, all at default (unsolved) state.
    pub fn new(n: usize) -> Self {
        Self {
            nodes: vec![Node::default(); n],
        }
    }

    /// Number of nodes. Indices `[0, size())` are stable for the network's
    /// lifetime.
    pub fn size(&self) -> usize {
        self.nodes.len()
    }

    /// Append a node, returning its new stable index.
    pub fn append_node(&mut self, t: Option<f64>) -> usize {
        let index = self.nodes.len();
        let mut node = Node::default();
        node.t = t;
        self.nodes.push(node);
        index
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn node(&self, i: usize) -> &Node {
        &self.nodes[i]
    }

    fn check_index(&self, what: &'static str, i: usize) -> ThermalResult<()> {
        if i >= self.nodes.len() {
            return Err(ThermalError::IndexOob {
                what,
                index: i,
                len: self.nodes.len(),
            });
        }
        Ok(())
    }

    pub fn set_t(&mut self, i: usize, t: f64) {
        self.nodes[i].t = Some(t);
    }

    pub fn set_c(&mut self, i: usize, c: f64) {
        self.nodes[i].c = c;
    }

    pub fn set_hf(&mut self, i: usize, hf: f64) {
        self.nodes[i].hf = hf;
    }

    pub fn add_hf(&mut self, i: usize, hf: f64) {
        self.nodes[i].hf += hf;
    }

    pub fn set_htc(&mut self, i: usize, htc: f64) {
        self.nodes[i].htc = htc;
    }

    pub fn add_htc(&mut self, i: usize, htc: f64) {
        self.nodes[i].htc += htc;
    }

    /// Insert or parallel-merge a resistive edge between `a` and `b`.
    ///
    /// If an edge already exists, it is replaced by the parallel
    /// combination `r_old*r_new / (r_old+r_new)` on both endpoints
    /// (spec.md §3's edge contract). Self-loops are rejected. `r` must be
    /// finite and positive; non-positive/non-finite values are a
    /// programming error here (assembly separately ignores non-positive
    /// resistances it encounters, per the documented contract) — callers
    /// that may pass a non-positive value should filter before calling.
    pub fn set_r(&mut self, a: usize, b: usize, r: f64) -> ThermalResult<()> {
        self.check_index("setR.a", a)?;
        self.check_index("setR.b", b)?;
        if a == b {
            return Err(ThermalError::SelfLoop { index: a });
        }
        thermal_core::ensure_finite(r, "setR.r")?;

        if let Some(existing) = self.nodes[a].neighbors.iter().position(|n| n.peer == b) {
            let r_old = self.nodes[a].neighbors[existing].r;
            let merged = (r_old * r) / (r_old + r);
            self.nodes[a].neighbors[existing].r = merged;
            let back = self.nodes[b]
                .neighbors
                .iter()
                .position(|n| n.peer == a)
                .expect("adjacency symmetry invariant violated");
            self.nodes[b].neighbors[back].r = merged;
            return Ok(());
        }

        self.nodes[a].neighbors.push(Neighbor { peer: b, r });
        self.nodes[b].neighbors.push(Neighbor { peer: a, r });
        Ok(())
    }

    /// Count of "source" nodes: `hf != 0 || htc != 0` (spec.md §3). Their
    /// ascending-index enumeration order defines `B`'s column order.
    pub fn source_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_source()).count()
    }

    /// Ascending-index list of source node indices.
    pub fn source_indices(&self) -> Vec<usize> {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| n.is_source())
            .map(|(i, _)| i)
            .collect()
    }

    pub fn total_hf(&self) -> f64 {
        self.nodes.iter().map(|n| n.hf).sum()
    }

    pub fn total_htc(&self) -> f64 {
        self.nodes.iter().map(|n| n.htc).sum()
    }

    pub fn view(&self, i: usize) -> NodeView<'_> {
        NodeView {
            index: i,
            node: &self.nodes[i],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edge_symmetry_on_insert() {
        let mut net = ThermalNetwork::new(2);
        net.set_r(0, 1, 10.0).unwrap();
        assert_eq!(net.node(0).neighbors[0], Neighbor { peer: 1, r: 10.0 });
        assert_eq!(net.node(1).neighbors[0], Neighbor { peer: 0, r: 10.0 });
    }

    #[test]
    fn parallel_merge_on_repeated_set_r() {
        let mut net = ThermalNetwork::new(2);
        net.set_r(0, 1, 2.0).unwrap();
        net.set_r(0, 1, 3.0).unwrap();
        // (2*3)/(2+3) = 1.2
        assert!((net.node(0).neighbors[0].r - 1.2).abs() < 1e-12);
        assert!((net.node(1).neighbors[0].r - 1.2).abs() < 1e-12);
    }

    #[test]
    fn repeated_set_r_matches_conductance_sum_formula() {
        let mut net = ThermalNetwork::new(2);
        let rs = [5.0, 7.0, 3.0];
        for &r in &rs {
            net.set_r(0, 1, r).unwrap();
        }
        let expected = 1.0 / rs.iter().map(|r| 1.0 / r).sum::<f64>();
        assert!((net.node(0).neighbors[0].r - expected).abs() < 1e-9);
    }

    #[test]
    fn self_loop_rejected() {
        let mut net = ThermalNetwork::new(1);
        assert!(matches!(
            net.set_r(0, 0, 1.0),
            Err(ThermalError::SelfLoop { index: 0 })
        ));
    }

    #[test]
    fn source_count_matches_hf_or_htc() {
        let mut net = ThermalNetwork::new(3);
        net.set_hf(0, 1.0);
        net.set_htc(1, 0.5);
        assert_eq!(net.source_count(), 2);
        assert_eq!(net.source_indices(), vec![0, 1]);
    }

    #[test]
    fn append_node_returns_stable_index() {
        let mut net = ThermalNetwork::new(2);
        let idx = net.append_node(None);
        assert_eq!(idx, 2);
        assert_eq!(net.size(), 3);
    }
}
