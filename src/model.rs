// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! A single consistent in-memory model of a power network, built up
//! incrementally from partial profile datasets.

mod buses;
mod containers;
mod merge;
mod placement;
mod retrieval;
mod store;
mod variants;

#[cfg(test)]
pub(crate) mod test_utils;

pub use buses::BusView;
pub use merge::{MergeReport, SkipReason, Skipped};
pub use placement::{ORIGINAL_CONTAINER_ID_PROPERTY, ORIGINAL_CONTAINER_NAME_PROPERTY};
pub use variants::INITIAL_VARIANT_ID;

use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::{AttributeValue, EquipmentClass, NetworkConfig, ProfileKind};

/// Entities, containers and connectivity nodes are held in arenas and
/// addressed with plain indices; all cross-references go through lookup
/// tables, so container merges only rewrite table entries.
pub(crate) type EntityIdx = usize;
pub(crate) type ContainerIdx = usize;
pub(crate) type NodeIdx = usize;

/// How much of the model the applied batches have filled in.
///
/// The level is monotonic: it is promoted when the corresponding batch kind
/// has been applied at least once and only lowered through
/// [`force_completeness`][NetworkModel::force_completeness].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum CompletenessLevel {
    /// Only the equipment skeleton is present.
    Equipment,
    /// Steady-state setpoints have been applied on top of the skeleton.
    SteadyStateHypothesis,
}

/// The category of a [`Container`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContainerCategory {
    Substation,
    VoltageLevel,
    /// A line-type logical grouping; not a real container of the target model.
    Line,
    /// A boundary-area logical grouping; not a real container of the target model.
    Boundary,
}

impl std::fmt::Display for ContainerCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContainerCategory::Substation => write!(f, "Substation"),
            ContainerCategory::VoltageLevel => write!(f, "VoltageLevel"),
            ContainerCategory::Line => write!(f, "Line"),
            ContainerCategory::Boundary => write!(f, "Boundary"),
        }
    }
}

/// A physical container (substation or voltage level) or a logical grouping
/// (line or boundary area) of the source description.
#[derive(Debug)]
pub struct Container {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) category: ContainerCategory,
    pub(crate) parent: Option<ContainerIdx>,
    pub(crate) fictitious: bool,
    pub(crate) properties: BTreeMap<String, String>,
    pub(crate) aliases: BTreeSet<String>,
}

impl Container {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn category(&self) -> ContainerCategory {
        self.category
    }

    /// Returns true for voltage levels synthesized by the topology
    /// reconciler for nodes with no real container.
    pub fn is_fictitious(&self) -> bool {
        self.fictitious
    }
}

/// An identified network element.
///
/// Attribute values are not stored here; they live in variant overlays, keyed
/// by entity and attribute name, together with their provenance.
#[derive(Debug, PartialEq)]
pub struct Entity {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) class: EquipmentClass,
    pub(crate) nodes: Vec<NodeIdx>,
    pub(crate) retained: bool,
}

impl Entity {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn class(&self) -> EquipmentClass {
        self.class
    }

    /// Whether this switch is kept visible as a distinct electrical node in
    /// the bus view even when closed.
    pub fn is_retained(&self) -> bool {
        self.retained
    }
}

/// A connectivity node: a fine-grained connection point declared inside a
/// container or logical grouping.
#[derive(Debug)]
pub(crate) struct ConnectivityNode {
    pub(crate) id: String,
    /// The container the source description declares this node in.  Stable.
    pub(crate) declared: ContainerIdx,
    /// The (pre-merge) voltage level the reconciler homed this node in:
    /// either `declared` itself or a fictitious voltage level.
    pub(crate) resolved: Option<ContainerIdx>,
}

/// One variant's mutable attribute state.
///
/// Structural facts (identities, containers, placements, aliases) are shared
/// by all variants; only this overlay is copied when a variant is cloned.
#[derive(Clone, Debug, Default)]
pub(crate) struct VariantState {
    pub(crate) overlay: HashMap<(EntityIdx, String), AttributeEntry>,
}

/// An attribute value together with its provenance: the profile kind and
/// batch sequence number that last set it.  Provenance is `None` after
/// derived metadata has been stripped.
#[derive(Clone, Debug)]
pub(crate) struct AttributeEntry {
    pub(crate) value: AttributeValue,
    pub(crate) origin: Option<(ProfileKind, u64)>,
}

/// A single consistent in-memory network model, incrementally built from
/// profile batches.
pub struct NetworkModel {
    pub(crate) config: NetworkConfig,

    pub(crate) entities: Vec<Entity>,
    pub(crate) entity_index: HashMap<String, EntityIdx>,
    pub(crate) containers: Vec<Container>,
    pub(crate) container_index: HashMap<String, ContainerIdx>,
    pub(crate) nodes: Vec<ConnectivityNode>,
    pub(crate) node_index: HashMap<String, NodeIdx>,

    /// Merged-away container id to representative id.  Lookups by a merged
    /// identifier resolve through this table; the containers themselves are
    /// never deleted.
    pub(crate) merged: HashMap<String, String>,

    /// Canonical edge set of the last container adjacency, used to detect a
    /// recomputation over identical input.
    pub(crate) last_adjacency: Option<BTreeSet<(String, String)>>,
    /// Representatives chosen by the last merge-group computation.
    pub(crate) last_representatives: BTreeMap<String, String>,

    pub(crate) variants: HashMap<String, VariantState>,
    pub(crate) active_variant: String,

    pub(crate) completeness: CompletenessLevel,
    /// Monotonic batch counter, recorded in attribute provenance.
    pub(crate) batch_seq: u64,
}

impl NetworkModel {
    /// Creates an empty model with the given configuration.
    ///
    /// The model starts with a single variant, [`INITIAL_VARIANT_ID`], which
    /// is also the active one.
    pub fn new(config: NetworkConfig) -> Self {
        let mut variants = HashMap::new();
        variants.insert(INITIAL_VARIANT_ID.to_string(), VariantState::default());

        Self {
            config,
            entities: Vec::new(),
            entity_index: HashMap::new(),
            containers: Vec::new(),
            container_index: HashMap::new(),
            nodes: Vec::new(),
            node_index: HashMap::new(),
            merged: HashMap::new(),
            last_adjacency: None,
            last_representatives: BTreeMap::new(),
            variants,
            active_variant: INITIAL_VARIANT_ID.to_string(),
            completeness: CompletenessLevel::Equipment,
            batch_seq: 0,
        }
    }

    /// Returns the model's completeness level.
    pub fn completeness(&self) -> CompletenessLevel {
        self.completeness
    }

    /// Lowers the completeness level explicitly.
    ///
    /// Promotion only ever happens through batch application, so a request
    /// above the current level is a no-op.  Attribute values applied by
    /// earlier batches are unaffected.
    pub fn force_completeness(&mut self, level: CompletenessLevel) {
        if level < self.completeness {
            self.completeness = level;
        }
    }
}
