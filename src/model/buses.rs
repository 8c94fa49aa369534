// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! The node-to-bus reduction: collapsing the connectivity nodes of a voltage
//! level that are joined through closed, non-retained switches into
//! electrical buses for the simplified (bus-branch) view.
//!
//! The partition is a derived view over the active variant's switch state;
//! it is recomputed on every call and never stored, so variants with
//! different switch states can never diverge from structural truth.

use std::collections::{BTreeMap, HashMap};

use petgraph::unionfind::UnionFind;

use crate::model::NodeIdx;
use crate::{AttributeValue, Error};

/// The bus partition of one voltage level.
///
/// Every connectivity node of the voltage level appears in exactly one
/// cell; cells and their members are ordered by identifier, so equal inputs
/// produce equal views.
#[derive(Clone, Debug, PartialEq)]
pub struct BusView {
    buses: Vec<Vec<String>>,
}

impl BusView {
    /// The cells of the partition.  Isolated nodes form singleton cells.
    pub fn buses(&self) -> &[Vec<String>] {
        &self.buses
    }

    /// The cell containing the given node, if the node is part of the view.
    pub fn bus_of(&self, node_id: &str) -> Option<&[String]> {
        self.buses
            .iter()
            .find(|cell| cell.iter().any(|member| member == node_id))
            .map(Vec::as_slice)
    }
}

/// Bus view computation and validation.
impl crate::NetworkModel {
    /// Computes the bus partition of the given voltage level against the
    /// active variant's switch state.
    ///
    /// Two nodes share a bus iff they are joined by a path of switches that
    /// are simultaneously closed and not retained.  Retained switches stay
    /// visible as distinct electrical nodes even when closed, because the
    /// simplified view must still represent them as switchable.
    pub fn bus_view(&self, voltage_level_id: &str) -> Result<BusView, Error> {
        let members = self.voltage_level_nodes(voltage_level_id)?;
        let local: HashMap<NodeIdx, usize> = members
            .iter()
            .enumerate()
            .map(|(position, &node)| (node, position))
            .collect();

        let mut partition = UnionFind::<usize>::new(members.len());
        for entity in &self.entities {
            if !entity.class.spans_one_voltage_level() || entity.retained {
                continue;
            }
            let [first, second] = entity.nodes[..] else {
                continue;
            };
            let (Some(&first_local), Some(&second_local)) = (local.get(&first), local.get(&second))
            else {
                continue;
            };
            if self.switch_is_closed(entity) {
                partition.union(first_local, second_local);
            }
        }

        let mut cells: BTreeMap<usize, Vec<String>> = BTreeMap::new();
        for (position, &node) in members.iter().enumerate() {
            cells
                .entry(partition.find(position))
                .or_default()
                .push(self.nodes[node].id.clone());
        }

        let mut buses: Vec<Vec<String>> = cells.into_values().collect();
        for cell in &mut buses {
            cell.sort_unstable();
        }
        buses.sort_unstable();
        Ok(BusView { buses })
    }

    /// Checks the computed partition against the source-declared node-to-bus
    /// assignment of the same voltage level.  Testing support, not used in
    /// production.
    ///
    /// A declared node that never produced a live bus (dead or isolated) is
    /// tolerated; a node with a live bus that the declaration does not
    /// predict, or a live cell spanning several declared buses, is a hard
    /// inconsistency.
    pub fn validate_bus_view(
        &self,
        voltage_level_id: &str,
        declared: &HashMap<String, String>,
    ) -> Result<(), Error> {
        let view = self.bus_view(voltage_level_id)?;
        let mut seen_buses: HashMap<&str, &[String]> = HashMap::new();

        for cell in view.buses() {
            if !self.cell_is_live(cell) {
                continue;
            }
            let mut declared_bus = None;
            for member in cell {
                let Some(bus) = declared.get(member) else {
                    return Err(Error::bus_view_mismatch(format!(
                        "Node {} has a live bus but is not predicted by the source grouping.",
                        member
                    )));
                };
                match declared_bus {
                    None => declared_bus = Some(bus.as_str()),
                    Some(previous) if previous != bus => {
                        return Err(Error::bus_view_mismatch(format!(
                            "Bus cell {:?} spans declared buses {} and {}.",
                            cell, previous, bus
                        )));
                    }
                    Some(_) => {}
                }
            }
            let bus = declared_bus.unwrap_or_default();
            if let Some(previous) = seen_buses.insert(bus, cell) {
                return Err(Error::bus_view_mismatch(format!(
                    "Declared bus {} covers distinct live cells {:?} and {:?}.",
                    bus, previous, cell
                )));
            }
        }
        Ok(())
    }

    /// The connectivity nodes homed in the given voltage level, resolved
    /// through the merge mapping.
    fn voltage_level_nodes(&self, voltage_level_id: &str) -> Result<Vec<NodeIdx>, Error> {
        let representative = self.representative_idx(self.container_idx(voltage_level_id)?);
        Ok((0..self.nodes.len())
            .filter(|&node| {
                self.nodes[node]
                    .resolved
                    .map(|voltage_level| self.representative_idx(voltage_level) == representative)
                    .unwrap_or(false)
            })
            .collect())
    }

    /// A switch is closed unless its "open" attribute is true in the active
    /// variant.
    fn switch_is_closed(&self, switch: &crate::model::Entity) -> bool {
        let Some(&entity) = self.entity_index.get(&switch.id) else {
            return false;
        };
        let Some(state) = self.variants.get(&self.active_variant) else {
            return false;
        };
        !matches!(
            state.overlay.get(&(entity, "open".to_string())),
            Some(entry) if entry.value == AttributeValue::Bool(true)
        )
    }

    /// A cell is live when non-switch equipment attaches to one of its
    /// nodes.
    fn cell_is_live(&self, cell: &[String]) -> bool {
        self.entities.iter().any(|entity| {
            !entity.class.spans_one_voltage_level()
                && entity.nodes.iter().any(|&node| {
                    cell.iter().any(|member| *member == self.nodes[node].id)
                })
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use crate::model::test_utils::NetworkBuilder;
    use crate::{Error, UpdatePolicy};

    /// Nodes 0..4 in one voltage level: 0-1 closed switch, 0-2 open switch,
    /// 0-3 closed retained switch, 4 isolated.
    fn busbar_scenario() -> Result<crate::NetworkModel, Error> {
        let mut builder = NetworkBuilder::new();
        builder.substation("S1");
        builder.voltage_level("VL1", "S1");
        for node in ["0", "1", "2", "3", "4"] {
            builder.node(node, "VL1");
        }
        builder.switch("SW_01", "0", "1");
        builder.switch("SW_02", "0", "2");
        builder.retained_switch("SW_03", "0", "3");
        builder.load("LD0", "0");
        builder.load("LD3", "3");
        let mut model = builder.model()?;
        model.apply(&NetworkBuilder::switch_state_batch("SW_02", true))?;
        Ok(model)
    }

    #[test]
    fn test_bus_partition() -> Result<(), Error> {
        let model = busbar_scenario()?;
        let view = model.bus_view("VL1")?;

        assert_eq!(
            view.buses(),
            &[
                vec!["0".to_string(), "1".to_string()],
                vec!["2".to_string()],
                vec!["3".to_string()],
                vec!["4".to_string()],
            ]
        );
        assert_eq!(
            view.bus_of("1").map(|cell| cell.to_vec()),
            Some(vec!["0".to_string(), "1".to_string()])
        );
        Ok(())
    }

    #[test]
    fn test_partition_follows_switch_state() -> Result<(), Error> {
        let mut model = busbar_scenario()?;

        // Closing the 0-2 switch absorbs node 2 into the 0-1 bus.
        model.apply(&NetworkBuilder::switch_state_batch("SW_02", false))?;
        let view = model.bus_view("VL1")?;
        assert_eq!(
            view.bus_of("2").map(|cell| cell.to_vec()),
            Some(vec!["0".to_string(), "1".to_string(), "2".to_string()])
        );

        // Opening the 0-1 switch splits the bus again.
        model.apply(&NetworkBuilder::switch_state_batch("SW_01", true))?;
        let view = model.bus_view("VL1")?;
        assert_eq!(view.bus_of("1").map(|cell| cell.to_vec()), Some(vec!["1".to_string()]));
        Ok(())
    }

    #[test]
    fn test_partition_is_variant_scoped() -> Result<(), Error> {
        let mut model = busbar_scenario()?;
        model.clone_variant(crate::INITIAL_VARIANT_ID, "study")?;
        model.set_active_variant("study")?;
        // Retain keeps the SW_02 state applied before the clone.
        model.apply_batch(
            &NetworkBuilder::switch_state_batch("SW_01", true),
            "study",
            UpdatePolicy::Retain,
        )?;

        let study_view = model.bus_view("VL1")?;
        assert_eq!(
            study_view.bus_of("0").map(|cell| cell.to_vec()),
            Some(vec!["0".to_string()])
        );

        model.set_active_variant(crate::INITIAL_VARIANT_ID)?;
        let initial_view = model.bus_view("VL1")?;
        assert_eq!(
            initial_view.bus_of("0").map(|cell| cell.to_vec()),
            Some(vec!["0".to_string(), "1".to_string()])
        );
        Ok(())
    }

    #[test]
    fn test_validation_accepts_matching_declaration() -> Result<(), Error> {
        let model = busbar_scenario()?;
        let declared: HashMap<String, String> = [
            ("0", "TN_A"),
            ("1", "TN_A"),
            ("2", "TN_B"),
            ("3", "TN_C"),
            // Node 4 is dead and intentionally absent.
        ]
        .into_iter()
        .map(|(node, bus)| (node.to_string(), bus.to_string()))
        .collect();

        model.validate_bus_view("VL1", &declared)
    }

    #[test]
    fn test_validation_tolerates_dead_declared_nodes() -> Result<(), Error> {
        let model = busbar_scenario()?;
        let declared: HashMap<String, String> = [
            ("0", "TN_A"),
            ("1", "TN_A"),
            ("2", "TN_B"),
            ("3", "TN_C"),
            // Node 4 never produced a live bus; declaring it is fine.
            ("4", "TN_D"),
        ]
        .into_iter()
        .map(|(node, bus)| (node.to_string(), bus.to_string()))
        .collect();

        model.validate_bus_view("VL1", &declared)
    }

    #[test]
    fn test_validation_flags_unpredicted_live_node() -> Result<(), Error> {
        let model = busbar_scenario()?;
        let declared: HashMap<String, String> = [("0", "TN_A"), ("3", "TN_C")]
            .into_iter()
            .map(|(node, bus)| (node.to_string(), bus.to_string()))
            .collect();

        // Node 1 shares a live bus with node 0 but is not declared.
        assert!(model.validate_bus_view("VL1", &declared).is_err());
        Ok(())
    }

    #[test]
    fn test_validation_flags_split_declared_bus() -> Result<(), Error> {
        let model = busbar_scenario()?;
        let declared: HashMap<String, String> = [
            ("0", "TN_A"),
            ("1", "TN_A"),
            ("2", "TN_B"),
            // Declares 3 on the same bus as 0, but the retained switch
            // keeps them distinct.
            ("3", "TN_A"),
        ]
        .into_iter()
        .map(|(node, bus)| (node.to_string(), bus.to_string()))
        .collect();

        assert!(model.validate_bus_view("VL1", &declared).is_err());
        Ok(())
    }
}
