// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! Methods for retrieving entities, containers and attribute values from a
//! [`NetworkModel`][crate::NetworkModel].

use std::collections::BTreeSet;

use crate::model::{Container, ContainerCategory, ContainerIdx, Entity};
use crate::{AttributeValue, Error};

/// Entity, container and attribute retrieval.
impl crate::NetworkModel {
    /// Returns the entity with the given identifier.
    pub fn entity(&self, entity_id: &str) -> Result<&Entity, Error> {
        self.entity_index
            .get(entity_id)
            .map(|&idx| &self.entities[idx])
            .ok_or_else(|| Error::entity_not_found(format!("Entity {} not found.", entity_id)))
    }

    /// Returns the container with the given identifier, resolving through
    /// merge aliases transparently: looking up a merged-away identifier
    /// returns the representative's data.
    pub fn container(&self, container_id: &str) -> Result<&Container, Error> {
        self.container_idx(container_id)
            .map(|idx| &self.containers[idx])
    }

    /// Returns the identifiers merged into the given container.
    pub fn aliases(&self, container_id: &str) -> Result<&BTreeSet<String>, Error> {
        self.container(container_id).map(|c| &c.aliases)
    }

    /// Returns a property recorded on the given container, used to recover
    /// the original grouping behind a fictitious voltage level.
    pub fn container_property(
        &self,
        container_id: &str,
        key: &str,
    ) -> Result<Option<&str>, Error> {
        self.container(container_id)
            .map(|c| c.properties.get(key).map(String::as_str))
    }

    /// Returns the substation of a voltage level, or `None` for fictitious
    /// voltage levels, which have no substation parent.
    pub fn substation_of(&self, voltage_level_id: &str) -> Result<Option<&Container>, Error> {
        let voltage_level = self.container(voltage_level_id)?;
        if voltage_level.category != ContainerCategory::VoltageLevel {
            return Err(Error::container_not_found(format!(
                "Container {} is not a voltage level.",
                voltage_level_id
            )));
        }
        Ok(voltage_level
            .parent
            .map(|parent| &self.containers[self.representative_idx(parent)]))
    }

    /// Returns an attribute value of the active variant, or `None` when the
    /// attribute is undefined there.
    pub fn attribute(
        &self,
        entity_id: &str,
        attribute: &str,
    ) -> Result<Option<&AttributeValue>, Error> {
        self.attribute_in(&self.active_variant, entity_id, attribute)
    }

    /// Returns an attribute value of the given variant, or `None` when the
    /// attribute is undefined there.
    pub fn attribute_in(
        &self,
        variant: &str,
        entity_id: &str,
        attribute: &str,
    ) -> Result<Option<&AttributeValue>, Error> {
        let entity = *self
            .entity_index
            .get(entity_id)
            .ok_or_else(|| Error::entity_not_found(format!("Entity {} not found.", entity_id)))?;
        let state = self.variants.get(variant).ok_or_else(|| {
            Error::variant_not_found(format!("Variant {} does not exist.", variant))
        })?;
        Ok(state
            .overlay
            .get(&(entity, attribute.to_string()))
            .map(|entry| &entry.value))
    }

    /// Returns an iterator over all entities, in creation order.
    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.entities.iter()
    }

    /// Returns an iterator over all containers, in creation order, merged-away
    /// members included.
    pub fn containers(&self) -> impl Iterator<Item = &Container> {
        self.containers.iter()
    }

    pub(crate) fn container_idx(&self, container_id: &str) -> Result<ContainerIdx, Error> {
        let resolved = self
            .merged
            .get(container_id)
            .map(String::as_str)
            .unwrap_or(container_id);
        self.container_index.get(resolved).copied().ok_or_else(|| {
            Error::container_not_found(format!("Container {} not found.", container_id))
        })
    }
}
