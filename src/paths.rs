//! Depth-bounded backward search for chains of capabilities.

use crate::datapath::{Node, RawPath};
use crate::graph::{CapabilityGraph, sink_nodes, supports_source};

/// Every chain of at most `depth` edges leading from `source` to `destination`.
///
/// The search starts at the destination. A capability that can reach the
/// destination yields a one-edge path when it can also read the source, and,
/// while depth remains, is extended backwards through each of its declared
/// source interfaces. Paths are returned source-first; each call builds fresh
/// vectors so no partial path is shared between branches.
pub fn find_paths(
    graph: &CapabilityGraph,
    source: &Node,
    destination: &Node,
    depth: usize,
) -> Vec<RawPath> {
    let mut paths = Vec::new();
    if depth == 0 {
        return paths;
    }
    for entry in graph.entries() {
        let capability = entry.capability();
        for sink in sink_nodes(capability, destination) {
            if supports_source(capability, source) {
                paths.push(vec![entry.edge(source.clone(), sink.clone())]);
            }
            if depth == 1 {
                continue;
            }
            for interface in capability.source_interfaces() {
                let intermediate = Node::physical(interface.clone());
                for mut prefix in find_paths(graph, source, &intermediate, depth - 1) {
                    prefix.push(entry.edge(intermediate.clone(), sink.clone()));
                    paths.push(prefix);
                }
            }
        }
    }
    tracing::trace!(
        destination = %destination,
        depth,
        found = paths.len(),
        "constructed candidate paths"
    );
    paths
}
