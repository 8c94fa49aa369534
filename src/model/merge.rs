// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! The profile merge engine: ordered application of profile batches onto the
//! model, supersession of earlier batches of the same kind, and completeness
//! promotion.
//!
//! Batches may arrive in any combination and order; the only ordering rule
//! is that an entity must have been defined by an equipment batch before a
//! non-equipment batch can update it.  Updates naming unknown entities are
//! skipped and reported, never fatal.

use std::collections::HashSet;

use crate::model::{AttributeEntry, CompletenessLevel, EntityIdx};
use crate::{Error, ProfileBatch, ProfileKind, UpdatePolicy};

/// Why a record or update of a batch was skipped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SkipReason {
    /// A non-equipment update named an entity the store does not know.
    UnknownReference,
    /// An equipment record referenced a node or container that cannot be
    /// resolved to a usable placement.
    UnresolvedPlacement,
    /// An equipment record attached to the wrong number of nodes for its
    /// class.
    WrongNodeCount,
}

/// One skipped record or update of a batch.
#[derive(Clone, Debug, PartialEq)]
pub struct Skipped {
    pub entity_id: String,
    /// The attribute of the skipped update; `None` for structural records.
    pub attribute: Option<String>,
    pub reason: SkipReason,
}

/// The per-batch outcome: how many updates were applied and which records
/// were dropped.  Skips are diagnostics, not errors; the batch as a whole
/// still applies.
#[derive(Clone, Debug, PartialEq)]
pub struct MergeReport {
    /// The batch's source identifier.
    pub source_id: String,
    pub kind: ProfileKind,
    pub applied: usize,
    pub skipped: Vec<Skipped>,
}

impl MergeReport {
    fn new(batch: &ProfileBatch) -> Self {
        Self {
            source_id: batch.source_id.clone(),
            kind: batch.kind,
            applied: 0,
            skipped: Vec::new(),
        }
    }

    pub(crate) fn skip(&mut self, entity_id: &str, attribute: Option<&str>, reason: SkipReason) {
        self.skipped.push(Skipped {
            entity_id: entity_id.to_string(),
            attribute: attribute.map(str::to_string),
            reason,
        });
    }
}

/// Batch application.
impl crate::NetworkModel {
    /// Applies a batch to the active variant with the configured policy.
    pub fn apply(&mut self, batch: &ProfileBatch) -> Result<MergeReport, Error> {
        let variant = self.active_variant.clone();
        let policy = self.config.update_policy();
        self.apply_batch(batch, &variant, policy)
    }

    /// Applies one profile batch to the given variant.
    ///
    /// Equipment-defining batches create containers, nodes and entities and
    /// then reconcile the container structure; these structural facts are
    /// shared by every variant.  The batch's attribute updates land in the
    /// target variant's overlay and fully supersede the previous batch of
    /// the same kind: attributes that kind owns but the batch does not
    /// mention are reset to undefined under [`UpdatePolicy::Reset`] and kept
    /// under [`UpdatePolicy::Retain`].  Attributes owned by other kinds are
    /// never touched.
    pub fn apply_batch(
        &mut self,
        batch: &ProfileBatch,
        variant: &str,
        policy: UpdatePolicy,
    ) -> Result<MergeReport, Error> {
        if !self.variants.contains_key(variant) {
            return Err(Error::variant_not_found(format!(
                "Variant {} does not exist.",
                variant
            )));
        }

        self.batch_seq += 1;
        let seq = self.batch_seq;
        let mut report = MergeReport::new(batch);
        tracing::debug!(
            "Applying {} batch {} (seq {}) to variant {}.",
            batch.kind,
            batch.source_id,
            seq,
            variant
        );

        if batch.kind.defines_equipment() {
            self.ingest_containers(&batch.containers);
            self.ingest_nodes(&batch.nodes, &mut report);
            self.ingest_equipment(&batch.equipment, &mut report);
            self.reconcile()?;
        }

        let mut resolved: Vec<(EntityIdx, &crate::AttributeUpdate)> =
            Vec::with_capacity(batch.updates.len());
        let mut mentioned: HashSet<(EntityIdx, &str)> = HashSet::new();
        for update in &batch.updates {
            let entity = match self.entity_index.get(&update.entity_id) {
                Some(&entity) => entity,
                None if batch.kind.defines_equipment() => {
                    // The equipment pass always creates missing entities.
                    self.create_unsupported(&update.entity_id)
                }
                None => {
                    tracing::warn!(
                        "Batch {}: update for unknown entity {} skipped.",
                        batch.source_id,
                        update.entity_id
                    );
                    report.skip(
                        &update.entity_id,
                        Some(&update.attribute),
                        SkipReason::UnknownReference,
                    );
                    continue;
                }
            };
            mentioned.insert((entity, update.attribute.as_str()));
            resolved.push((entity, update));
        }

        let state = self
            .variants
            .get_mut(variant)
            .ok_or_else(|| Error::internal(format!("Variant {} vanished mid-batch.", variant)))?;

        // Supersede the previous batch of this kind: drop every value it
        // set that the new batch does not mention, unless retaining.
        if policy == UpdatePolicy::Reset {
            state.overlay.retain(|(entity, attribute), entry| {
                !matches!(entry.origin, Some((kind, _)) if kind == batch.kind)
                    || mentioned.contains(&(*entity, attribute.as_str()))
            });
        }

        for (entity, update) in resolved {
            state.overlay.insert(
                (entity, update.attribute.clone()),
                AttributeEntry {
                    value: update.value.clone(),
                    origin: Some((batch.kind, seq)),
                },
            );
            report.applied += 1;
        }

        if batch.kind == ProfileKind::SteadyState
            && self.completeness < CompletenessLevel::SteadyStateHypothesis
        {
            self.completeness = CompletenessLevel::SteadyStateHypothesis;
        }

        Ok(report)
    }

    /// Discards provenance and alias bookkeeping, for callers that know no
    /// further updates will arrive (see
    /// [`NetworkConfig::strip_derived_metadata_after_import`][crate::NetworkConfig]).
    ///
    /// Plain reads keep working; alias sets become empty and a later batch
    /// can no longer supersede values applied before the strip.
    pub fn strip_derived_metadata(&mut self) {
        for state in self.variants.values_mut() {
            for entry in state.overlay.values_mut() {
                entry.origin = None;
            }
        }
        for container in &mut self.containers {
            container.aliases.clear();
        }
    }
}
