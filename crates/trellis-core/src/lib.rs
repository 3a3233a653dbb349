//! Trellis Core Types and Definitions
//!
//! This crate provides the foundational types shared by the Trellis
//! interaction graph and its collaborators. It includes:
//!
//! - **Identifiers**: Efficient string-interned identifiers ([`identifier::Id`])
//! - **Geometry**: Basic geometric types ([`geometry`] module)
//! - **Semantic**: The sequence interaction model the graph is built from ([`semantic`] module)
//! - **Notation**: The graphical view tree laid over the interaction ([`notation`] module)

pub mod geometry;
pub mod identifier;
pub mod notation;
pub mod semantic;
