// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! The placement half of topology reconciliation: every connectivity node is
//! homed in a voltage level, synthesizing a fictitious one when the node's
//! only declared home is a line or boundary grouping (or a bare substation)
//! that is not a real voltage level of the target model.

use crate::model::{ContainerCategory, ContainerIdx, NodeIdx};
use crate::Error;

/// Property key on a fictitious voltage level holding the identifier of the
/// originating logical grouping.
pub const ORIGINAL_CONTAINER_ID_PROPERTY: &str = "originalContainerId";
/// Property key on a fictitious voltage level holding the name of the
/// originating logical grouping.
pub const ORIGINAL_CONTAINER_NAME_PROPERTY: &str = "originalContainerName";

/// Placement resolution.
impl crate::NetworkModel {
    /// Homes every connectivity node in a voltage level.  Runs as the first
    /// step of reconciliation; placements are resolved once and are stable
    /// thereafter.
    pub(crate) fn resolve_placements(&mut self) -> Result<(), Error> {
        for node in 0..self.nodes.len() {
            if self.nodes[node].resolved.is_some() {
                continue;
            }
            let voltage_level = self.resolve_placement(node)?;
            self.nodes[node].resolved = Some(voltage_level);
        }
        Ok(())
    }

    /// Returns the voltage level the given node belongs to: its declared
    /// container when that is a real voltage level, a fictitious voltage
    /// level otherwise.
    fn resolve_placement(&mut self, node: NodeIdx) -> Result<ContainerIdx, Error> {
        let declared = self.nodes[node].declared;
        match self.containers[declared].category {
            ContainerCategory::VoltageLevel => Ok(declared),
            _ => self.fictitious_voltage_level_for(declared),
        }
    }

    /// Returns the fictitious voltage level for the given grouping, creating
    /// it on first use.  Exactly one fictitious voltage level exists per
    /// distinct originating grouping; it has no substation parent and carries
    /// back-reference properties to the grouping it stands in for.
    fn fictitious_voltage_level_for(&mut self, grouping: ContainerIdx) -> Result<ContainerIdx, Error> {
        let fictitious_id = format!("{}_VL", self.containers[grouping].id);
        if let Some(&idx) = self.container_index.get(&fictitious_id) {
            if !self.containers[idx].fictitious {
                return Err(Error::internal(format!(
                    "Container {} exists but is not the expected fictitious voltage level.",
                    fictitious_id
                )));
            }
            return Ok(idx);
        }

        let original_id = self.containers[grouping].id.clone();
        let original_name = self.containers[grouping].name.clone();
        tracing::debug!(
            "Created fictitious voltage level {} for container {}.",
            fictitious_id,
            original_id
        );

        let idx = self.add_container(
            &fictitious_id,
            &original_name,
            ContainerCategory::VoltageLevel,
            None,
            true,
        );
        self.containers[idx]
            .properties
            .insert(ORIGINAL_CONTAINER_ID_PROPERTY.to_string(), original_id);
        self.containers[idx]
            .properties
            .insert(ORIGINAL_CONTAINER_NAME_PROPERTY.to_string(), original_name);
        Ok(idx)
    }
}

#[cfg(test)]
mod tests {
    use super::{ORIGINAL_CONTAINER_ID_PROPERTY, ORIGINAL_CONTAINER_NAME_PROPERTY};
    use crate::model::test_utils::NetworkBuilder;
    use crate::Error;

    #[test]
    fn test_fictitious_voltage_level_per_grouping() -> Result<(), Error> {
        let mut builder = NetworkBuilder::new();
        builder.boundary_grouping("BOUNDARY_A");
        builder.node("N1", "BOUNDARY_A");
        builder.node("N2", "BOUNDARY_A");
        builder.line_grouping("LINE_B");
        builder.node("N3", "LINE_B");
        builder.load("LD1", "N1");
        builder.load("LD2", "N2");
        builder.load("LD3", "N3");
        let model = builder.model()?;

        // One fictitious voltage level per distinct originating grouping.
        let vl_a = model.container("BOUNDARY_A_VL")?;
        assert!(vl_a.is_fictitious());
        let vl_b = model.container("LINE_B_VL")?;
        assert!(vl_b.is_fictitious());

        assert_eq!(
            model.container_property("BOUNDARY_A_VL", ORIGINAL_CONTAINER_ID_PROPERTY)?,
            Some("BOUNDARY_A")
        );
        assert_eq!(
            model.container_property("LINE_B_VL", ORIGINAL_CONTAINER_NAME_PROPERTY)?,
            Some("LINE_B name")
        );

        // No substation parent.
        assert!(model.substation_of("BOUNDARY_A_VL")?.is_none());
        assert!(model.substation_of("LINE_B_VL")?.is_none());
        Ok(())
    }

    #[test]
    fn test_equipment_in_fictitious_voltage_level_gets_buses() -> Result<(), Error> {
        let mut builder = NetworkBuilder::new();
        builder.line_grouping("LINE_A");
        builder.node("N1", "LINE_A");
        builder.node("N2", "LINE_A");
        builder.switch("SW1", "N1", "N2");
        builder.load("LD1", "N1");
        let model = builder.model()?;

        // The junction points still produce a valid bus through the
        // synthesized voltage level.
        let view = model.bus_view("LINE_A_VL")?;
        assert_eq!(view.buses(), &[vec!["N1".to_string(), "N2".to_string()]]);
        Ok(())
    }

    #[test]
    fn test_node_declared_in_substation_gets_fictitious_home() -> Result<(), Error> {
        let mut builder = NetworkBuilder::new();
        builder.substation("S1");
        builder.node("N1", "S1");
        builder.load("LD1", "N1");
        let model = builder.model()?;

        let vl = model.container("S1_VL")?;
        assert!(vl.is_fictitious());
        assert!(model.substation_of("S1_VL")?.is_none());
        Ok(())
    }
}
