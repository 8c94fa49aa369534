// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

/*!
# Grid Network Model

This is a library for building and maintaining a single consistent in-memory
model of a power network from several partial, independently-arriving
datasets ("profiles") that describe the same physical network at increasing
levels of detail: equipment skeleton, steady-state setpoints, topology and
solved state.

It solves two tightly coupled problems:

- an **incremental merge engine** that lets profile batches arrive in any
  combination and order, overwrite or retain prior attribute values, and be
  replayed against independent variants of the same network, and
- a **topology reconciler** that repairs structural violations: equipment
  whose source description spans container boundaries the target model
  forbids is fixed by merging containers or synthesizing fictitious ones,
  deterministically.

## Building a model

The main struct is [`NetworkModel`].  An empty model is created with
[`new`][NetworkModel::new] and filled by applying [`ProfileBatch`]es with
[`apply_batch`][NetworkModel::apply_batch] (or
[`apply`][NetworkModel::apply], which targets the active variant with the
configured policy).  The raw profile loader that produces batches from
exchange-format files is an external collaborator; this library only
consumes flat, already type-decoded records.

An equipment batch must be applied before any other batch can reference an
entity.  After every equipment-defining batch the model reconciles its
containers:

- voltage levels connected by switches are merged into one, and substations
  connected by transformers are merged into one, with the representative
  chosen deterministically;
- connectivity nodes declared in line or boundary groupings are homed in
  synthesized fictitious voltage levels, so no valid equipment is ever
  dropped for lack of a container.

## Supersession

A later batch of the same profile kind fully supersedes the previous one for
the attributes that kind owns.  Attributes it does not mention either reset
to undefined (the default) or keep their previous value, per
[`UpdatePolicy`].  Updates naming unknown entities are skipped and reported
through the returned [`MergeReport`], never fatal.

## Variants

Variants share all structural facts and differ only in attribute values.
They are created by [`clone_variant`][NetworkModel::clone_variant] and
selected with [`set_active_variant`][NetworkModel::set_active_variant].

## Bus view

[`bus_view`][NetworkModel::bus_view] collapses the connectivity nodes of a
voltage level that are joined through closed, non-retained switches into
electrical buses.  The partition is derived from the active variant's switch
state on every call and is never stored.
*/

mod config;
pub use config::NetworkConfig;

mod equipment_class;
pub use equipment_class::EquipmentClass;

mod records;
pub use records::{
    AttributeUpdate, AttributeValue, ContainerKind, ContainerRecord, EquipmentRecord, NodeRecord,
    ProfileBatch, ProfileKind, UpdatePolicy,
};

mod model;
pub use model::{
    BusView, CompletenessLevel, Container, ContainerCategory, Entity, MergeReport, NetworkModel,
    SkipReason, Skipped, INITIAL_VARIANT_ID, ORIGINAL_CONTAINER_ID_PROPERTY,
    ORIGINAL_CONTAINER_NAME_PROPERTY,
};

mod error;
pub use error::Error;
