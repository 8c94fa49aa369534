// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! This module is only compiled when running unit tests and contains features
//! that are shared by all tests of the `model` module.
//!
//! The central piece is the [`NetworkBuilder`], which can declaratively build
//! complex network configurations for use in tests.  Every declared element
//! gets a display name derived from its identifier, so tests can assert on
//! names without repeating them.

use crate::{
    AttributeUpdate, AttributeValue, ContainerKind, ContainerRecord, EquipmentClass,
    EquipmentRecord, Error, NetworkModel, NodeRecord, ProfileBatch, ProfileKind,
};

/// A builder for assembling equipment profile batches declaratively.
pub(crate) struct NetworkBuilder {
    containers: Vec<ContainerRecord>,
    nodes: Vec<NodeRecord>,
    equipment: Vec<EquipmentRecord>,
}

impl NetworkBuilder {
    /// Creates a new `NetworkBuilder`.
    pub(crate) fn new() -> Self {
        NetworkBuilder {
            containers: vec![],
            nodes: vec![],
            equipment: vec![],
        }
    }

    fn container(&mut self, id: &str, kind: ContainerKind) {
        self.containers.push(ContainerRecord {
            id: id.to_string(),
            name: format!("{id} name"),
            kind,
        });
    }

    /// Declares a substation.
    pub(crate) fn substation(&mut self, id: &str) {
        self.container(id, ContainerKind::Substation);
    }

    /// Declares a voltage level inside the given substation.
    pub(crate) fn voltage_level(&mut self, id: &str, substation: &str) {
        self.container(
            id,
            ContainerKind::VoltageLevel {
                substation: substation.to_string(),
            },
        );
    }

    /// Declares a line grouping.
    pub(crate) fn line_grouping(&mut self, id: &str) {
        self.container(id, ContainerKind::Line);
    }

    /// Declares a boundary grouping.
    pub(crate) fn boundary_grouping(&mut self, id: &str) {
        self.container(id, ContainerKind::Boundary);
    }

    /// Declares a connectivity node in the given container.
    pub(crate) fn node(&mut self, id: &str, container: &str) {
        self.nodes.push(NodeRecord {
            id: id.to_string(),
            container: container.to_string(),
        });
    }

    /// Declares equipment of an arbitrary class at the given nodes.
    pub(crate) fn equipment(&mut self, id: &str, class: EquipmentClass, nodes: &[&str]) {
        self.equipment.push(EquipmentRecord {
            id: id.to_string(),
            name: format!("{id} name"),
            class,
            nodes: nodes.iter().map(|node| node.to_string()).collect(),
            retained: false,
        });
    }

    /// Declares a load at the given node.
    pub(crate) fn load(&mut self, id: &str, node: &str) {
        self.equipment(id, EquipmentClass::Load, &[node]);
    }

    /// Declares a generator at the given node.
    pub(crate) fn generator(&mut self, id: &str, node: &str) {
        self.equipment(id, EquipmentClass::Generator, &[node]);
    }

    /// Declares a switch between two nodes.
    pub(crate) fn switch(&mut self, id: &str, first: &str, second: &str) {
        self.equipment(id, EquipmentClass::Switch, &[first, second]);
    }

    /// Declares a switch that stays visible in the simplified view.
    pub(crate) fn retained_switch(&mut self, id: &str, first: &str, second: &str) {
        self.equipment(id, EquipmentClass::Switch, &[first, second]);
        self.equipment
            .last_mut()
            .expect("equipment was just pushed")
            .retained = true;
    }

    /// Declares a two-winding transformer between two nodes.
    pub(crate) fn transformer(&mut self, id: &str, first: &str, second: &str) {
        self.equipment(
            id,
            EquipmentClass::TwoWindingsTransformer,
            &[first, second],
        );
    }

    /// Declares a three-winding transformer between three nodes.
    pub(crate) fn three_winding_transformer(
        &mut self,
        id: &str,
        first: &str,
        second: &str,
        third: &str,
    ) {
        self.equipment(
            id,
            EquipmentClass::ThreeWindingsTransformer,
            &[first, second, third],
        );
    }

    /// Builds an equipment profile batch from the declared elements.
    pub(crate) fn equipment_batch(&self) -> ProfileBatch {
        let mut batch = ProfileBatch::new(ProfileKind::Equipment, "test-eq");
        batch.containers = self.containers.clone();
        batch.nodes = self.nodes.clone();
        batch.equipment = self.equipment.clone();
        batch
    }

    /// Builds a fresh model with the declared elements applied as a single
    /// equipment batch.
    pub(crate) fn model(&self) -> Result<NetworkModel, Error> {
        let mut model = NetworkModel::new(Default::default());
        model.apply(&self.equipment_batch())?;
        Ok(model)
    }

    /// A steady state batch setting the open/closed state of one switch.
    pub(crate) fn switch_state_batch(switch_id: &str, open: bool) -> ProfileBatch {
        let mut batch = ProfileBatch::new(ProfileKind::SteadyState, "test-ssh");
        batch
            .updates
            .push(AttributeUpdate::new(switch_id, "open", AttributeValue::Bool(open)));
        batch
    }
}
