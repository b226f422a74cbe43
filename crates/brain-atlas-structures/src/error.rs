// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

use thiserror::Error;

use crate::graph::StructureId;

/// Errors raised while building or querying the structure graph
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StructureError {
    /// Two nodes share the same id
    #[error("Duplicate structure id {0}")]
    DuplicateStructure(StructureId),

    /// A node references a parent that is not part of the graph
    #[error("Structure {id} references unknown parent {parent}")]
    UnknownParent { id: StructureId, parent: StructureId },

    /// Parent links loop back on themselves
    #[error("Structure {0} is part of a parent cycle")]
    Cycle(StructureId),

    /// The raw ontology payload could not be decoded
    #[error("Invalid structure graph payload: {0}")]
    InvalidPayload(String),
}

/// Result type for structure graph operations
pub type StructureResult<T> = Result<T, StructureError>;
