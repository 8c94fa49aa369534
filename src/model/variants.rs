// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! Variant management.
//!
//! A variant is an independently mutable overlay of attribute values on top
//! of the shared structural model.  Cloning a variant copies only the
//! overlay; identities, containers, placements and aliases are shared and
//! visible from every variant.

use crate::Error;

/// The variant every model starts with.
pub const INITIAL_VARIANT_ID: &str = "initial";

/// Variant operations.
impl crate::NetworkModel {
    /// Creates a new variant as a copy of an existing one's attribute
    /// overlay.
    pub fn clone_variant(&mut self, source: &str, new_name: &str) -> Result<(), Error> {
        if self.variants.contains_key(new_name) {
            return Err(Error::invalid_record(format!(
                "Variant {} already exists.",
                new_name
            )));
        }
        let state = self
            .variants
            .get(source)
            .ok_or_else(|| Error::variant_not_found(format!("Variant {} does not exist.", source)))?
            .clone();
        self.variants.insert(new_name.to_string(), state);
        Ok(())
    }

    /// Selects the variant that attribute reads and bus views target.
    pub fn set_active_variant(&mut self, name: &str) -> Result<(), Error> {
        if !self.variants.contains_key(name) {
            return Err(Error::variant_not_found(format!(
                "Variant {} does not exist.",
                name
            )));
        }
        self.active_variant = name.to_string();
        Ok(())
    }

    /// The name of the active variant.
    pub fn active_variant(&self) -> &str {
        &self.active_variant
    }

    /// The names of all variants, sorted.
    pub fn variant_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.variants.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::INITIAL_VARIANT_ID;
    use crate::model::test_utils::NetworkBuilder;
    use crate::{AttributeUpdate, AttributeValue, Error, ProfileBatch, ProfileKind, UpdatePolicy};

    fn small_model() -> Result<crate::NetworkModel, Error> {
        let mut builder = NetworkBuilder::new();
        builder.substation("S1");
        builder.voltage_level("VL1", "S1");
        builder.node("N1", "VL1");
        builder.load("LD1", "N1");
        builder.model()
    }

    #[test]
    fn test_variant_isolation() -> Result<(), Error> {
        let mut model = small_model()?;
        let mut base = ProfileBatch::new(ProfileKind::SteadyState, "ssh0");
        base.updates
            .push(AttributeUpdate::new("LD1", "p", AttributeValue::Double(5.0)));
        model.apply(&base)?;

        model.clone_variant(INITIAL_VARIANT_ID, "study")?;

        let mut update = ProfileBatch::new(ProfileKind::SteadyState, "ssh1");
        update
            .updates
            .push(AttributeUpdate::new("LD1", "p", AttributeValue::Double(9.0)));
        model.apply_batch(&update, "study", UpdatePolicy::Reset)?;

        assert_eq!(
            model.attribute_in(INITIAL_VARIANT_ID, "LD1", "p")?,
            Some(&AttributeValue::Double(5.0))
        );
        assert_eq!(
            model.attribute_in("study", "LD1", "p")?,
            Some(&AttributeValue::Double(9.0))
        );

        // Structure is shared: both variants see the same entities.
        model.set_active_variant("study")?;
        assert_eq!(model.entity("LD1")?.id(), "LD1");
        Ok(())
    }

    #[test]
    fn test_clone_copies_the_source_overlay() -> Result<(), Error> {
        let mut model = small_model()?;
        let mut base = ProfileBatch::new(ProfileKind::SteadyState, "ssh0");
        base.updates
            .push(AttributeUpdate::new("LD1", "p", AttributeValue::Double(5.0)));
        model.apply(&base)?;

        model.clone_variant(INITIAL_VARIANT_ID, "study")?;
        assert_eq!(
            model.attribute_in("study", "LD1", "p")?,
            Some(&AttributeValue::Double(5.0))
        );
        Ok(())
    }

    #[test]
    fn test_variant_bookkeeping_errors() -> Result<(), Error> {
        let mut model = small_model()?;
        assert!(model.clone_variant("missing", "study").is_err());
        model.clone_variant(INITIAL_VARIANT_ID, "study")?;
        assert!(model.clone_variant(INITIAL_VARIANT_ID, "study").is_err());
        assert!(model.set_active_variant("missing").is_err());

        model.set_active_variant("study")?;
        assert_eq!(model.active_variant(), "study");
        assert_eq!(model.variant_names(), ["initial", "study"]);
        Ok(())
    }
}
