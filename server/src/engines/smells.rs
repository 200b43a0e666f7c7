//! Dependency-smell engine (spec §4.7): fan-in/fan-out, instability, and
//! cyclic/hub/god/unstable-dependency classification over an injected
//! dependency graph. Instability formula grounded in the teacher's
//! `CouplingAnalyzer`; SCC detection uses `petgraph` instead of a hand-rolled
//! Tarjan pass.

use crate::config::SmellThresholds;
use crate::model::{ComponentMetrics, DependencyGraph, DependencySmell, Severity, SmellKind};
use petgraph::algo::tarjan_scc;
use petgraph::graphmap::DiGraphMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmellReport {
    pub metrics: Vec<ComponentMetrics>,
    pub smells: Vec<DependencySmell>,
    pub cyclic_count: usize,
    pub god_count: usize,
    pub hub_count: usize,
    pub unstable_count: usize,
}

pub fn analyze(graph: &DependencyGraph, thresholds: &SmellThresholds) -> SmellReport {
    let mut fan_in: HashMap<&str, usize> = HashMap::new();
    let mut fan_out: HashMap<&str, usize> = HashMap::new();
    for node in &graph.nodes {
        fan_in.entry(node.id.as_str()).or_insert(0);
        fan_out.entry(node.id.as_str()).or_insert(0);
    }
    for edge in &graph.edges {
        *fan_out.entry(edge.from.as_str()).or_insert(0) += 1;
        *fan_in.entry(edge.to.as_str()).or_insert(0) += 1;
    }

    let mut metrics: Vec<ComponentMetrics> = graph
        .nodes
        .iter()
        .map(|n| {
            let fi = *fan_in.get(n.id.as_str()).unwrap_or(&0);
            let fo = *fan_out.get(n.id.as_str()).unwrap_or(&0);
            let instability = if fi + fo == 0 {
                0.0
            } else {
                fo as f64 / (fi + fo) as f64
            };
            ComponentMetrics {
                id: n.id.clone(),
                fan_in: fi,
                fan_out: fo,
                instability,
            }
        })
        .collect();
    metrics.sort_by(|a, b| a.id.cmp(&b.id));

    let instability_of: HashMap<&str, f64> = metrics.iter().map(|m| (m.id.as_str(), m.instability)).collect();

    let mut smells = Vec::new();

    // Cyclic dependency: every SCC of size >= 2.
    let mut pg: DiGraphMap<&str, ()> = DiGraphMap::new();
    for node in &graph.nodes {
        pg.add_node(node.id.as_str());
    }
    for edge in &graph.edges {
        pg.add_edge(edge.from.as_str(), edge.to.as_str(), ());
    }
    let mut sccs: Vec<Vec<String>> = tarjan_scc(&pg)
        .into_iter()
        .filter(|c| c.len() >= 2)
        .map(|mut c| {
            c.sort();
            c.into_iter().map(String::from).collect()
        })
        .collect();
    sccs.sort();
    let cyclic_count = sccs.len();
    for component in sccs {
        smells.push(DependencySmell {
            kind: SmellKind::CyclicDependency,
            severity: Severity::Critical,
            description: format!("cyclic dependency among {} components", component.len()),
            components: component,
        });
    }

    let mut god_ids: std::collections::HashSet<String> = std::collections::HashSet::new();
    let mut god_count = 0;
    let mut hub_count = 0;

    for m in &metrics {
        if m.fan_in >= thresholds.god_fan_in && m.fan_out >= thresholds.god_fan_out {
            god_ids.insert(m.id.clone());
            god_count += 1;
            smells.push(DependencySmell {
                kind: SmellKind::GodComponent,
                severity: Severity::Critical,
                components: vec![m.id.clone()],
                description: format!(
                    "{} has fan-in {} and fan-out {} (god component)",
                    m.id, m.fan_in, m.fan_out
                ),
            });
        }
    }

    for m in &metrics {
        if god_ids.contains(&m.id) {
            continue;
        }
        if m.fan_in + m.fan_out >= thresholds.hub_threshold {
            hub_count += 1;
            smells.push(DependencySmell {
                kind: SmellKind::HubLikeDependency,
                severity: Severity::High,
                components: vec![m.id.clone()],
                description: format!(
                    "{} has total degree {} (hub-like)",
                    m.id,
                    m.fan_in + m.fan_out
                ),
            });
        }
    }

    let mut unstable_count = 0;
    let mut edges_sorted = graph.edges.clone();
    edges_sorted.sort_by(|a, b| (a.from.as_str(), a.to.as_str()).cmp(&(b.from.as_str(), b.to.as_str())));
    for edge in &edges_sorted {
        let i_u = *instability_of.get(edge.from.as_str()).unwrap_or(&0.0);
        let i_v = *instability_of.get(edge.to.as_str()).unwrap_or(&0.0);
        if i_u <= thresholds.stable_threshold && i_v >= thresholds.unstable_threshold {
            unstable_count += 1;
            smells.push(DependencySmell {
                kind: SmellKind::UnstableDependency,
                severity: Severity::High,
                components: vec![edge.from.clone(), edge.to.clone()],
                description: format!(
                    "stable component {} depends on unstable component {}",
                    edge.from, edge.to
                ),
            });
        }
    }

    SmellReport {
        metrics,
        smells,
        cyclic_count,
        god_count,
        hub_count,
        unstable_count,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DependencyEdge, DependencyNode};

    fn node(id: &str) -> DependencyNode {
        DependencyNode {
            id: id.to_string(),
            name: id.to_string(),
        }
    }

    fn edge(from: &str, to: &str) -> DependencyEdge {
        DependencyEdge {
            from: from.to_string(),
            to: to.to_string(),
        }
    }

    #[test]
    fn hub_vs_god_classification() {
        // H has fan-in 18, fan-out 5; thresholds Hub=20, God=(10,10).
        let mut graph = DependencyGraph::default();
        graph.nodes.push(node("H"));
        for i in 0..18 {
            let dep = format!("in{i}");
            graph.nodes.push(node(&dep));
            graph.edges.push(edge(&dep, "H"));
        }
        for i in 0..5 {
            let dep = format!("out{i}");
            graph.nodes.push(node(&dep));
            graph.edges.push(edge("H", &dep));
        }

        let thresholds = SmellThresholds::default();
        let report = analyze(&graph, &thresholds);
        assert_eq!(report.hub_count, 1);
        assert_eq!(report.god_count, 0);

        // Raising fan-out to 12 should make it a god component only.
        for i in 5..12 {
            let dep = format!("out{i}");
            graph.nodes.push(node(&dep));
            graph.edges.push(edge("H", &dep));
        }
        let report2 = analyze(&graph, &thresholds);
        assert_eq!(report2.god_count, 1);
        assert!(!report2
            .smells
            .iter()
            .any(|s| s.kind == SmellKind::HubLikeDependency && s.components == vec!["H".to_string()]));
    }

    #[test]
    fn cycle_of_two_is_flagged() {
        let mut graph = DependencyGraph::default();
        graph.nodes.push(node("a"));
        graph.nodes.push(node("b"));
        graph.edges.push(edge("a", "b"));
        graph.edges.push(edge("b", "a"));
        let report = analyze(&graph, &SmellThresholds::default());
        assert_eq!(report.cyclic_count, 1);
    }

    #[test]
    fn unstable_dependency_detected() {
        let mut graph = DependencyGraph::default();
        graph.nodes.push(node("stable"));
        graph.nodes.push(node("unstable"));
        graph.edges.push(edge("stable", "unstable"));
        // stable: fan-in 3, fan-out 1 => instability 0.25 (<= 0.3)
        for i in 0..3 {
            let dep = format!("dep{i}");
            graph.nodes.push(node(&dep));
            graph.edges.push(edge(&dep, "stable"));
        }
        // unstable: fan-in 1 (from stable), fan-out 3 => instability 0.75 (>= 0.7)
        for i in 0..3 {
            let dep = format!("downstream{i}");
            graph.nodes.push(node(&dep));
            graph.edges.push(edge("unstable", &dep));
        }
        let report = analyze(&graph, &SmellThresholds::default());
        assert_eq!(report.unstable_count, 1);
    }
}
