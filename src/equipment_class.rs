// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! This module defines the `EquipmentClass` enum, which represents the class
//! of a network element as declared by the source description.

use std::fmt::Display;

/// The class of a network element.
///
/// The class set is standard-defined and closed in practice; classes that this
/// library does not know are mapped to `Unsupported` by the loader and are
/// stored but never contribute container adjacency.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EquipmentClass {
    Switch,
    Breaker,
    Disconnector,
    BusbarSection,
    Load,
    Generator,
    ShuntCompensator,
    StaticVarCompensator,
    AcLineSegment,
    SeriesCompensator,
    DanglingLine,
    TwoWindingsTransformer,
    ThreeWindingsTransformer,
    AcDcConverter,
    TapChanger,
    OperationalLimit,
    ControlArea,
    Unsupported,
}

impl Display for EquipmentClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EquipmentClass::Switch => write!(f, "Switch"),
            EquipmentClass::Breaker => write!(f, "Breaker"),
            EquipmentClass::Disconnector => write!(f, "Disconnector"),
            EquipmentClass::BusbarSection => write!(f, "BusbarSection"),
            EquipmentClass::Load => write!(f, "Load"),
            EquipmentClass::Generator => write!(f, "Generator"),
            EquipmentClass::ShuntCompensator => write!(f, "ShuntCompensator"),
            EquipmentClass::StaticVarCompensator => write!(f, "StaticVarCompensator"),
            EquipmentClass::AcLineSegment => write!(f, "ACLineSegment"),
            EquipmentClass::SeriesCompensator => write!(f, "SeriesCompensator"),
            EquipmentClass::DanglingLine => write!(f, "DanglingLine"),
            EquipmentClass::TwoWindingsTransformer => write!(f, "TwoWindingsTransformer"),
            EquipmentClass::ThreeWindingsTransformer => write!(f, "ThreeWindingsTransformer"),
            EquipmentClass::AcDcConverter => write!(f, "ACDCConverter"),
            EquipmentClass::TapChanger => write!(f, "TapChanger"),
            EquipmentClass::OperationalLimit => write!(f, "OperationalLimit"),
            EquipmentClass::ControlArea => write!(f, "ControlArea"),
            EquipmentClass::Unsupported => write!(f, "Unsupported"),
        }
    }
}

impl EquipmentClass {
    /// Returns true for the switch family, whose ends must all end up in the
    /// same voltage level of the target model.
    pub fn spans_one_voltage_level(&self) -> bool {
        matches!(
            self,
            EquipmentClass::Switch | EquipmentClass::Breaker | EquipmentClass::Disconnector
        )
    }

    /// Returns true for the transformer family, whose ends must all end up in
    /// the same substation of the target model.
    pub fn spans_one_substation(&self) -> bool {
        matches!(
            self,
            EquipmentClass::TwoWindingsTransformer | EquipmentClass::ThreeWindingsTransformer
        )
    }

    /// Returns true for equipment that connects two voltage levels without
    /// forcing them into one container.
    pub fn is_line_like(&self) -> bool {
        matches!(
            self,
            EquipmentClass::AcLineSegment
                | EquipmentClass::SeriesCompensator
                | EquipmentClass::DanglingLine
        )
    }

    /// The number of connectivity nodes an element of this class attaches to,
    /// or `None` when the class does not attach to nodes at all (tap changers,
    /// limits, control areas) or the count is not checked (`Unsupported`).
    pub fn expected_node_count(&self) -> Option<usize> {
        match self {
            EquipmentClass::Switch
            | EquipmentClass::Breaker
            | EquipmentClass::Disconnector
            | EquipmentClass::AcLineSegment
            | EquipmentClass::SeriesCompensator
            | EquipmentClass::TwoWindingsTransformer => Some(2),
            EquipmentClass::ThreeWindingsTransformer => Some(3),
            EquipmentClass::BusbarSection
            | EquipmentClass::Load
            | EquipmentClass::Generator
            | EquipmentClass::ShuntCompensator
            | EquipmentClass::StaticVarCompensator
            | EquipmentClass::DanglingLine
            | EquipmentClass::AcDcConverter => Some(1),
            EquipmentClass::TapChanger
            | EquipmentClass::OperationalLimit
            | EquipmentClass::ControlArea
            | EquipmentClass::Unsupported => None,
        }
    }
}
