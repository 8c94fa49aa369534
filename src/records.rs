// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! This module contains the record types handed over by the profile loader.
//!
//! The loader is an external collaborator: it turns exchange-format files into
//! flat, already-dereferenced and type-decoded records.  This library never
//! parses the exchange syntax itself.

use crate::EquipmentClass;

/// The profile kinds a batch can belong to.
///
/// Each kind owns the attributes it sets; a later batch of the same kind
/// supersedes the previous one for those attributes only.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ProfileKind {
    /// The equipment skeleton: containers, connectivity nodes, elements.
    Equipment,
    /// Equipment living on the boundary between modelling areas.
    BoundaryEquipment,
    /// Steady-state setpoints and switch status hypotheses.
    SteadyState,
    /// Declared node-to-bus assignments.
    Topology,
    /// Solved-state results (voltages, angles, flows).
    SolvedState,
}

impl ProfileKind {
    /// Returns true for the kinds that may define new structure (containers,
    /// nodes, equipment).  All other kinds can only mutate attributes of
    /// already existing entities.
    pub fn defines_equipment(&self) -> bool {
        matches!(self, ProfileKind::Equipment | ProfileKind::BoundaryEquipment)
    }
}

impl std::fmt::Display for ProfileKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProfileKind::Equipment => write!(f, "Equipment"),
            ProfileKind::BoundaryEquipment => write!(f, "BoundaryEquipment"),
            ProfileKind::SteadyState => write!(f, "SteadyState"),
            ProfileKind::Topology => write!(f, "Topology"),
            ProfileKind::SolvedState => write!(f, "SolvedState"),
        }
    }
}

/// A type-decoded attribute value.
#[derive(Clone, Debug, PartialEq)]
pub enum AttributeValue {
    Double(f64),
    Int(i64),
    Bool(bool),
    Text(String),
    /// A reference to another entity, by identifier.
    Reference(String),
}

/// One flat `(entity, attribute, value)` triple of a batch.
#[derive(Clone, Debug, PartialEq)]
pub struct AttributeUpdate {
    pub entity_id: String,
    pub attribute: String,
    pub value: AttributeValue,
}

impl AttributeUpdate {
    pub fn new(
        entity_id: impl Into<String>,
        attribute: impl Into<String>,
        value: AttributeValue,
    ) -> Self {
        Self {
            entity_id: entity_id.into(),
            attribute: attribute.into(),
            value,
        }
    }
}

/// The kind of container or logical grouping a [`ContainerRecord`] declares.
///
/// `Line` and `Boundary` groupings are not real containers in the target
/// model; connectivity nodes declared inside them are homed in synthesized
/// fictitious voltage levels.
#[derive(Clone, Debug, PartialEq)]
pub enum ContainerKind {
    Substation,
    VoltageLevel { substation: String },
    Line,
    Boundary,
}

/// A container or logical grouping declared by the equipment pass.
#[derive(Clone, Debug, PartialEq)]
pub struct ContainerRecord {
    pub id: String,
    pub name: String,
    pub kind: ContainerKind,
}

/// A connectivity node declared inside a container or logical grouping.
#[derive(Clone, Debug, PartialEq)]
pub struct NodeRecord {
    pub id: String,
    pub container: String,
}

/// A network element declared by the equipment pass.
///
/// `nodes` lists the connectivity nodes its terminals attach to, in terminal
/// order.  `retained` is only meaningful for the switch family: a retained
/// switch stays visible as a distinct electrical node in the bus view even
/// when closed.
#[derive(Clone, Debug, PartialEq)]
pub struct EquipmentRecord {
    pub id: String,
    pub name: String,
    pub class: EquipmentClass,
    pub nodes: Vec<String>,
    pub retained: bool,
}

/// One concrete application of a profile's data to the model.
///
/// Non-equipment kinds carry only `updates`; the structural record sets are
/// meaningful for `Equipment` and `BoundaryEquipment` batches.
#[derive(Clone, Debug, PartialEq)]
pub struct ProfileBatch {
    pub kind: ProfileKind,
    /// Base identifier of the source dataset, used for diagnostics only.
    pub source_id: String,
    pub containers: Vec<ContainerRecord>,
    pub nodes: Vec<NodeRecord>,
    pub equipment: Vec<EquipmentRecord>,
    pub updates: Vec<AttributeUpdate>,
}

impl ProfileBatch {
    /// Creates an empty batch of the given kind.
    pub fn new(kind: ProfileKind, source_id: impl Into<String>) -> Self {
        Self {
            kind,
            source_id: source_id.into(),
            containers: Vec::new(),
            nodes: Vec::new(),
            equipment: Vec::new(),
            updates: Vec::new(),
        }
    }
}

/// What happens to attributes a superseding batch does not mention.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UpdatePolicy {
    /// Unmentioned attributes owned by the batch's kind reset to undefined.
    Reset,
    /// Unmentioned attributes owned by the batch's kind keep their value.
    Retain,
}
