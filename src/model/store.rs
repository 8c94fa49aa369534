// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! Methods for creating entities, containers and connectivity nodes in a
//! [`NetworkModel`] from equipment-pass records.
//!
//! Identifiers are assigned once, at first creation, and never rebound:
//! re-sending a record for an existing identifier leaves the stored
//! structure untouched.

use std::collections::{BTreeMap, BTreeSet};

use crate::model::merge::{MergeReport, SkipReason};
use crate::model::{ConnectivityNode, Container, ContainerCategory, ContainerIdx, Entity, EntityIdx};
use crate::{ContainerKind, ContainerRecord, EquipmentClass, EquipmentRecord, NodeRecord};

/// Arena population from equipment-pass records.
impl crate::NetworkModel {
    pub(crate) fn ingest_containers(&mut self, records: &[ContainerRecord]) {
        for record in records {
            if let Some(&idx) = self.container_index.get(&record.id) {
                // A placeholder substation gets its name once the real
                // record arrives; everything else stays as first declared.
                if self.containers[idx].name.is_empty() {
                    self.containers[idx].name = record.name.clone();
                } else {
                    tracing::debug!("Container {} already exists, record ignored.", record.id);
                }
                continue;
            }

            let (category, parent) = match &record.kind {
                ContainerKind::Substation => (ContainerCategory::Substation, None),
                ContainerKind::VoltageLevel { substation } => {
                    let parent = self.substation_or_placeholder(substation);
                    (ContainerCategory::VoltageLevel, Some(parent))
                }
                ContainerKind::Line => (ContainerCategory::Line, None),
                ContainerKind::Boundary => (ContainerCategory::Boundary, None),
            };

            self.add_container(&record.id, &record.name, category, parent, false);
        }
    }

    pub(crate) fn ingest_nodes(&mut self, records: &[NodeRecord], report: &mut MergeReport) {
        for record in records {
            if self.node_index.contains_key(&record.id) {
                tracing::debug!("Node {} already exists, record ignored.", record.id);
                continue;
            }

            let Some(&declared) = self.container_index.get(&record.container) else {
                tracing::warn!(
                    "Node {} declared in unknown container {}, record skipped.",
                    record.id,
                    record.container
                );
                report.skip(&record.id, None, SkipReason::UnknownReference);
                continue;
            };

            let idx = self.nodes.len();
            self.nodes.push(ConnectivityNode {
                id: record.id.clone(),
                declared,
                resolved: None,
            });
            self.node_index.insert(record.id.clone(), idx);
        }
    }

    pub(crate) fn ingest_equipment(&mut self, records: &[EquipmentRecord], report: &mut MergeReport) {
        for record in records {
            if self.entity_index.contains_key(&record.id) {
                tracing::debug!("Entity {} already exists, record ignored.", record.id);
                continue;
            }
            self.convert_equipment(record, report);
        }
    }

    /// Turns one equipment record into a typed entity, dispatching on its
    /// class.  A record that fails its class's structural checks is skipped
    /// and reported; the rest of the batch is unaffected.
    fn convert_equipment(&mut self, record: &EquipmentRecord, report: &mut MergeReport) {
        if let Some(expected) = record.class.expected_node_count() {
            if record.nodes.len() != expected {
                tracing::warn!(
                    "{}:{} attaches to {} node(s), expected {}; record skipped.",
                    record.class,
                    record.id,
                    record.nodes.len(),
                    expected
                );
                report.skip(&record.id, None, SkipReason::WrongNodeCount);
                return;
            }
        }

        let mut nodes = Vec::with_capacity(record.nodes.len());
        for node_id in &record.nodes {
            match self.node_index.get(node_id) {
                Some(&idx) => nodes.push(idx),
                None => {
                    tracing::error!(
                        "{}:{} references undeclared node {}; record skipped.",
                        record.class,
                        record.id,
                        node_id
                    );
                    report.skip(&record.id, None, SkipReason::UnresolvedPlacement);
                    return;
                }
            }
        }

        let retained = match record.class {
            class if class.spans_one_voltage_level() => record.retained,
            // Retained only makes sense for switches.
            _ => false,
        };

        let idx = self.entities.len();
        self.entities.push(Entity {
            id: record.id.clone(),
            name: record.name.clone(),
            class: record.class,
            nodes,
            retained,
        });
        self.entity_index.insert(record.id.clone(), idx);
    }

    /// Creates a placeholder entity of class `Unsupported` for an identifier
    /// first seen in an equipment batch's attribute updates.
    pub(crate) fn create_unsupported(&mut self, id: &str) -> EntityIdx {
        let idx = self.entities.len();
        self.entities.push(Entity {
            id: id.to_string(),
            name: String::new(),
            class: EquipmentClass::Unsupported,
            nodes: Vec::new(),
            retained: false,
        });
        self.entity_index.insert(id.to_string(), idx);
        idx
    }

    pub(crate) fn add_container(
        &mut self,
        id: &str,
        name: &str,
        category: ContainerCategory,
        parent: Option<ContainerIdx>,
        fictitious: bool,
    ) -> ContainerIdx {
        let idx = self.containers.len();
        self.containers.push(Container {
            id: id.to_string(),
            name: name.to_string(),
            category,
            parent,
            fictitious,
            properties: BTreeMap::new(),
            aliases: BTreeSet::new(),
        });
        self.container_index.insert(id.to_string(), idx);
        idx
    }

    /// Voltage level records may arrive before the substation they belong
    /// to; the substation is then created as a placeholder and its name is
    /// filled in when its own record arrives.
    fn substation_or_placeholder(&mut self, id: &str) -> ContainerIdx {
        if let Some(&idx) = self.container_index.get(id) {
            return idx;
        }
        tracing::debug!("Substation {} referenced before declaration.", id);
        self.add_container(id, "", ContainerCategory::Substation, None, false)
    }
}

#[cfg(test)]
mod tests {
    use crate::model::test_utils::NetworkBuilder;
    use crate::model::ContainerCategory;
    use crate::{EquipmentClass, Error};

    #[test]
    fn test_identifier_never_rebound() -> Result<(), Error> {
        let mut builder = NetworkBuilder::new();
        builder.substation("S1");
        builder.voltage_level("VL1", "S1");
        builder.node("N1", "VL1");
        builder.load("LD1", "N1");
        let mut model = builder.model()?;

        // A second equipment batch redeclares LD1 as a generator; the
        // original entity must survive unchanged.
        let mut second = NetworkBuilder::new();
        second.substation("S1");
        second.voltage_level("VL1", "S1");
        second.node("N1", "VL1");
        second.generator("LD1", "N1");
        model.apply(&second.equipment_batch())?;

        assert_eq!(model.entity("LD1")?.class(), EquipmentClass::Load);
        Ok(())
    }

    #[test]
    fn test_node_in_unknown_container_skipped() -> Result<(), Error> {
        let mut builder = NetworkBuilder::new();
        builder.substation("S1");
        builder.voltage_level("VL1", "S1");
        builder.node("N1", "VL1");
        builder.node("N2", "VL_MISSING");
        builder.load("LD1", "N1");
        let mut model = crate::NetworkModel::new(Default::default());
        let report = model.apply(&builder.equipment_batch())?;

        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].entity_id, "N2");
        assert!(model.entity("LD1").is_ok());
        Ok(())
    }

    #[test]
    fn test_wrong_node_count_skipped() -> Result<(), Error> {
        let mut builder = NetworkBuilder::new();
        builder.substation("S1");
        builder.voltage_level("VL1", "S1");
        builder.node("N1", "VL1");
        builder.equipment("SW1", EquipmentClass::Breaker, &["N1"]);
        let mut model = crate::NetworkModel::new(Default::default());
        let report = model.apply(&builder.equipment_batch())?;

        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].entity_id, "SW1");
        assert!(model.entity("SW1").is_err());
        Ok(())
    }

    #[test]
    fn test_substation_placeholder_creation() -> Result<(), Error> {
        let mut builder = NetworkBuilder::new();
        // Voltage level declared before its substation record.
        builder.voltage_level("VL1", "S1");
        builder.node("N1", "VL1");
        builder.load("LD1", "N1");
        let model = builder.model()?;

        assert_eq!(
            model.container("S1")?.category(),
            ContainerCategory::Substation
        );
        Ok(())
    }
}
