// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! The merging half of topology reconciliation.
//!
//! The target model requires both ends of a switch to live in the same
//! voltage level and all ends of a transformer to live in the same
//! substation.  Source descriptions do not: a switch may connect two voltage
//! levels and a transformer two or three substations.  Such equipment
//! contributes edges to a container adjacency graph; every connected
//! component of that graph is a merge group that collapses into its
//! representative, the other members surviving as aliases.
//!
//! Switch status is irrelevant here: an open switch still forces its two
//! voltage levels into one.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::unionfind::UnionFind;
use petgraph::visit::EdgeRef;

use crate::model::{ContainerCategory, ContainerIdx};
use crate::Error;

/// Container adjacency and merge groups.
impl crate::NetworkModel {
    /// Reconciles containers after an equipment-defining batch: resolves
    /// node placements, rebuilds the container adjacency and recomputes the
    /// merge groups.
    ///
    /// Recomputing over an unchanged adjacency must reproduce the previous
    /// representatives exactly; anything else means the selection rule was
    /// not applied consistently and aborts loudly.
    pub(crate) fn reconcile(&mut self) -> Result<(), Error> {
        self.resolve_placements()?;

        let edges = self.container_adjacency();
        let representatives = self.merge_groups(&edges);

        if self.last_adjacency.as_ref() == Some(&edges) {
            if representatives != self.last_representatives {
                return Err(Error::non_deterministic_merge(format!(
                    "Merge group recomputation over identical adjacency chose different \
                     representatives: {:?} then {:?}.",
                    self.last_representatives, representatives
                )));
            }
            return Ok(());
        }

        self.apply_merge_groups(&representatives);
        self.last_adjacency = Some(edges);
        self.last_representatives = representatives;
        Ok(())
    }

    /// Builds the canonical edge set of the container adjacency: one
    /// voltage-level edge per switch whose ends resolve to different voltage
    /// levels, one substation edge per pair of substations connected by a
    /// switch or touched by a transformer.  Ends on boundary nodes are
    /// ignored.
    fn container_adjacency(&self) -> BTreeSet<(String, String)> {
        let mut edges = BTreeSet::new();

        for entity in &self.entities {
            if entity.class.spans_one_voltage_level() {
                let Some((first, second)) = self.switch_ends(&entity.nodes) else {
                    continue;
                };
                self.add_adjacency(&mut edges, first, second);

                let parents = (self.containers[first].parent, self.containers[second].parent);
                if let (Some(first_parent), Some(second_parent)) = parents {
                    self.add_adjacency(&mut edges, first_parent, second_parent);
                }
            } else if entity.class.spans_one_substation() {
                let substations = self.end_substations(&entity.nodes);
                for other in substations.iter().skip(1) {
                    self.add_adjacency(&mut edges, substations[0], *other);
                }
            }
        }

        edges
    }

    /// The resolved voltage levels of a switch's two ends, or `None` when an
    /// end is a boundary node or unplaced.
    fn switch_ends(&self, nodes: &[crate::model::NodeIdx]) -> Option<(ContainerIdx, ContainerIdx)> {
        let [first, second] = nodes else {
            return None;
        };
        if self.is_boundary_node(*first) || self.is_boundary_node(*second) {
            return None;
        }
        Some((self.nodes[*first].resolved?, self.nodes[*second].resolved?))
    }

    /// The substations a transformer's ends touch, skipping boundary ends
    /// and ends homed in voltage levels without a substation.
    fn end_substations(&self, nodes: &[crate::model::NodeIdx]) -> Vec<ContainerIdx> {
        nodes
            .iter()
            .filter(|&&node| !self.is_boundary_node(node))
            .filter_map(|&node| self.nodes[node].resolved)
            .filter_map(|voltage_level| self.containers[voltage_level].parent)
            .collect()
    }

    fn is_boundary_node(&self, node: crate::model::NodeIdx) -> bool {
        let declared = self.nodes[node].declared;
        self.containers[declared].category == ContainerCategory::Boundary
    }

    fn add_adjacency(
        &self,
        edges: &mut BTreeSet<(String, String)>,
        first: ContainerIdx,
        second: ContainerIdx,
    ) {
        if first == second {
            return;
        }
        let first_id = &self.containers[first].id;
        let second_id = &self.containers[second].id;
        let edge = if first_id <= second_id {
            (first_id.clone(), second_id.clone())
        } else {
            (second_id.clone(), first_id.clone())
        };
        edges.insert(edge);
    }

    /// Computes the merge groups of the adjacency as the connected
    /// components of an undirected container graph, and selects each group's
    /// representative.  Returns a map from every merged-away container to
    /// its representative.
    fn merge_groups(&self, edges: &BTreeSet<(String, String)>) -> BTreeMap<String, String> {
        let mut graph: UnGraph<ContainerIdx, ()> = UnGraph::new_undirected();
        let mut graph_indices: HashMap<ContainerIdx, NodeIndex> = HashMap::new();

        for (first_id, second_id) in edges {
            let first = self.container_index[first_id];
            let second = self.container_index[second_id];
            let first_node = *graph_indices
                .entry(first)
                .or_insert_with(|| graph.add_node(first));
            let second_node = *graph_indices
                .entry(second)
                .or_insert_with(|| graph.add_node(second));
            graph.add_edge(first_node, second_node, ());
        }

        let mut components = UnionFind::<usize>::new(graph.node_count());
        for edge in graph.edge_references() {
            components.union(edge.source().index(), edge.target().index());
        }

        let mut groups: HashMap<usize, Vec<ContainerIdx>> = HashMap::new();
        for node in graph.node_indices() {
            groups
                .entry(components.find(node.index()))
                .or_default()
                .push(graph[node]);
        }

        let mut representatives = BTreeMap::new();
        for members in groups.values() {
            if members.len() < 2 {
                continue;
            }
            let representative = self.representative_of(members);
            for &member in members {
                let member_id = &self.containers[member].id;
                if *member_id != representative {
                    representatives.insert(member_id.clone(), representative.clone());
                }
            }
        }
        representatives
    }

    /// The lexicographically smallest member id, preferring real containers
    /// over fictitious ones so a merged group never loses its substation.
    fn representative_of(&self, members: &[ContainerIdx]) -> String {
        members
            .iter()
            .filter(|&&member| !self.containers[member].fictitious)
            .map(|&member| &self.containers[member].id)
            .min()
            .or_else(|| members.iter().map(|&member| &self.containers[member].id).min())
            .cloned()
            .unwrap_or_default()
    }

    /// Records the merge groups: the lookup table resolves merged-away
    /// identifiers to their representative and each representative collects
    /// the merged identifiers (and any aliases they already carried) as
    /// aliases.  Containers themselves are never deleted or rewritten.
    fn apply_merge_groups(&mut self, representatives: &BTreeMap<String, String>) {
        // The groups are recomputed from the full adjacency every time, so
        // aliases recorded by an earlier reconciliation land directly on the
        // final representative here; members never chain.
        for container in &mut self.containers {
            container.aliases.clear();
        }
        for (merged_id, representative_id) in representatives {
            let representative = self.container_index[representative_id];
            self.containers[representative]
                .aliases
                .insert(merged_id.clone());
        }

        self.merged = representatives
            .iter()
            .map(|(merged, representative)| (merged.clone(), representative.clone()))
            .collect();

        if !representatives.is_empty() {
            tracing::warn!(
                "{} container(s) merged into their representatives: {:?}.",
                representatives.len(),
                representatives
            );
        }
    }

    /// Resolves a container index through the merge mapping.
    pub(crate) fn representative_idx(&self, container: ContainerIdx) -> ContainerIdx {
        match self.merged.get(&self.containers[container].id) {
            Some(representative_id) => self.container_index[representative_id],
            None => container,
        }
    }
}
