// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! This module contains the configuration options for the `NetworkModel`.

/// Configuration options for the `NetworkModel`.
#[derive(Clone, Default, Debug)]
pub struct NetworkConfig {
    /// Whether attributes owned by a profile kind but not mentioned in a later
    /// batch of that kind keep their previous value.  When this is `false`,
    /// such attributes reset to undefined.
    pub retain_previous_values_on_update: bool,

    /// Whether provenance and alias bookkeeping should be discarded once no
    /// further updates are expected.  Callers that set this are expected to
    /// call [`strip_derived_metadata`][crate::NetworkModel::strip_derived_metadata]
    /// after the last batch has been applied.
    pub strip_derived_metadata_after_import: bool,
}

impl NetworkConfig {
    /// Returns the update policy selected by this configuration.
    pub fn update_policy(&self) -> crate::UpdatePolicy {
        if self.retain_previous_values_on_update {
            crate::UpdatePolicy::Retain
        } else {
            crate::UpdatePolicy::Reset
        }
    }
}
