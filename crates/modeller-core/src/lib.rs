//! Modeller Core Types and Definitions
//!
//! This crate provides the foundational types shared by the diagram
//! composition engine and the canvas synchronization engine:
//!
//! - **Catalogue**: Elements, relationships and properties ([`catalogue`] module)
//! - **Identifiers**: Case-preserving markup identifiers ([`identifier::Identifier`])
//! - **Text**: Note wrapping and label helpers ([`text`] module)
//! - **Geometry**: Canvas coordinates, sizes and bounds ([`geometry`] module)

pub mod catalogue;
pub mod geometry;
pub mod identifier;
pub mod text;
