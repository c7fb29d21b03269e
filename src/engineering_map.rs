use std::fmt;
use std::path::{Path, PathBuf};

use petgraph::dot::{Config, Dot};
use petgraph::graph::{DiGraph, NodeIndex};

use crate::error::Result;
use crate::host::{HETEROLOGOUS_MODULE, MVA_GENES};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Precursor,
    Mva,
    Heterologous,
    Product,
}

impl NodeKind {
    fn fill(self) -> &'static str {
        match self {
            NodeKind::Precursor => "lightgrey",
            NodeKind::Mva => "lightblue",
            NodeKind::Heterologous => "orange",
            NodeKind::Product => "gold",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Node {
    pub label: String,
    pub kind: NodeKind,
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label)
    }
}

const PRECURSOR: &str = "Acetyl-CoA";

/// Linear route: precursor → native MVA genes → heterologous crt module → product.
/// HMG1 and HMG2 share one node.
pub fn build_route(product: &str) -> DiGraph<Node, ()> {
    let mut graph = DiGraph::new();

    let mut chain: Vec<(String, NodeKind)> = vec![(PRECURSOR.to_string(), NodeKind::Precursor)];
    for (gene, _, _) in MVA_GENES {
        match *gene {
            "HMG1" => chain.push(("HMG1/2".to_string(), NodeKind::Mva)),
            "HMG2" => {}
            g => chain.push((g.to_string(), NodeKind::Mva)),
        }
    }
    chain.extend(HETEROLOGOUS_MODULE.iter().map(|g| (g.to_string(), NodeKind::Heterologous)));
    chain.push((product.to_string(), NodeKind::Product));

    let mut prev: Option<NodeIndex> = None;
    for (label, kind) in chain {
        let idx = graph.add_node(Node { label, kind });
        if let Some(p) = prev {
            graph.add_edge(p, idx, ());
        }
        prev = Some(idx);
    }
    graph
}

pub fn render_dot(graph: &DiGraph<Node, ()>) -> String {
    // Edge weights are unit; map them to "" so `Dot` gets a `Display` edge type.
    let graph = graph.map(|_, n| n, |_, _| "");
    let dot = Dot::with_attr_getters(
        &graph,
        &[Config::EdgeNoLabel],
        &|_, _| String::new(),
        &|_, (_, node)| format!("style=filled, fillcolor={}", node.kind.fill()),
    );
    format!("{}", dot)
}

pub fn write_map(outdir: &Path, product: &str) -> Result<PathBuf> {
    let path = outdir.join("engineering_map.dot");
    std::fs::write(&path, render_dot(&build_route(product)))?;
    Ok(path)
}

// ── Tests ──
