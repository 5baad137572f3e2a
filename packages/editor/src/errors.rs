//! Error types for the editor

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Structural failures of tree operations. Every variant leaves the tree
/// exactly as it was before the call.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MutationError {
    #[error("Node cannot hold children: {0}")]
    InvalidContainer(String),

    #[error("Cannot move {node_id} into its own subtree ({target_id})")]
    CyclicMove { node_id: String, target_id: String },

    #[error("Node not found: {0}")]
    NotFound(String),

    #[error("Setting text on {node_id} would discard {children} child node(s)")]
    WouldDiscardChildren { node_id: String, children: usize },

    #[error("Cannot wrap content of {node_id}: <{child_tag}> is block-level")]
    UnsafeWrap { node_id: String, child_tag: String },

    #[error("Id already in use: {0}")]
    DuplicateId(String),

    #[error("Invalid id: {0:?}")]
    InvalidId(String),

    #[error("Unknown element template: {0}")]
    UnknownTemplate(String),

    /// Tag, attribute or class name that would not read back as written
    #[error("Invalid name: {0:?}")]
    InvalidName(String),

    #[error("Invalid style declaration: {property}: {value}")]
    InvalidStyle { property: String, value: String },
}

#[derive(Error, Debug)]
pub enum EditorError {
    #[error("Parse error: {0}")]
    Parse(#[from] mosaic_markup::ParseError),

    #[error("Mutation error: {0}")]
    Mutation(#[from] MutationError),

    #[error("Clipboard is empty")]
    EmptyClipboard,

    #[error("Nothing is selected")]
    EmptySelection,

    #[error("No saved block named {0:?}")]
    UnknownBlock(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Flat error classification reported to collaborators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    InvalidContainer,
    CyclicMove,
    NotFound,
    WouldDiscardChildren,
    UnsafeWrap,
    ParseFailure,
    DuplicateId,
    InvalidId,
    UnknownTemplate,
    InvalidName,
    InvalidStyle,
    UnknownBlock,
    EmptyClipboard,
    EmptySelection,
    InvalidConfig,
}

impl MutationError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            MutationError::InvalidContainer(_) => ErrorKind::InvalidContainer,
            MutationError::CyclicMove { .. } => ErrorKind::CyclicMove,
            MutationError::NotFound(_) => ErrorKind::NotFound,
            MutationError::WouldDiscardChildren { .. } => ErrorKind::WouldDiscardChildren,
            MutationError::UnsafeWrap { .. } => ErrorKind::UnsafeWrap,
            MutationError::DuplicateId(_) => ErrorKind::DuplicateId,
            MutationError::InvalidId(_) => ErrorKind::InvalidId,
            MutationError::UnknownTemplate(_) => ErrorKind::UnknownTemplate,
            MutationError::InvalidName(_) => ErrorKind::InvalidName,
            MutationError::InvalidStyle { .. } => ErrorKind::InvalidStyle,
        }
    }
}

impl EditorError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            EditorError::Parse(_) => ErrorKind::ParseFailure,
            EditorError::Mutation(e) => e.kind(),
            EditorError::EmptyClipboard => ErrorKind::EmptyClipboard,
            EditorError::EmptySelection => ErrorKind::EmptySelection,
            EditorError::UnknownBlock(_) => ErrorKind::UnknownBlock,
            EditorError::Config(_) => ErrorKind::InvalidConfig,
        }
    }
}

pub type EditorResult<T> = Result<T, EditorError>;
