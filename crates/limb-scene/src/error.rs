//! Error types for the scene runtime
//!
//! Every runtime operation either succeeds completely or reports one of these
//! errors without touching the scene. Callers are expected to propagate them.

/// Result alias used throughout the scene crate
pub type SceneResult<T> = Result<T, SceneError>;

/// Errors raised by the scene runtime
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SceneError {
    /// A node handle or name does not resolve to a live node
    #[error("node not found: {0}")]
    NodeNotFound(String),

    /// A node with this name already exists
    #[error("node name already in use: {0}")]
    NameCollision(String),

    /// Node names must be non-empty and free of plug separators
    #[error("invalid node name: {0:?}")]
    InvalidName(String),

    /// Plug does not resolve to an attribute on the node
    #[error("attribute not found: {node}.{attr}")]
    AttributeNotFound {
        /// Node name
        node: String,
        /// Requested attribute path
        attr: String,
    },

    /// Dynamic attribute name already taken
    #[error("attribute already exists: {node}.{attr}")]
    AttributeExists {
        /// Node name
        node: String,
        /// Attribute name
        attr: String,
    },

    /// Write or connection into a locked plug
    #[error("attribute is locked: {0}")]
    LockedAttribute(String),

    /// Direct write into a plug that has an incoming connection
    #[error("attribute is driven by a connection: {0}")]
    DrivenAttribute(String),

    /// Destination plug already has an incoming connection
    #[error("destination already connected: {0}")]
    AlreadyConnected(String),

    /// Write into a computed output
    #[error("attribute is read-only: {0}")]
    ReadOnly(String),

    /// Value type cannot be stored in or coerced to the plug's type
    #[error("type mismatch on {plug}: expected {expected}, found {found}")]
    TypeMismatch {
        /// Plug path
        plug: String,
        /// Expected value type
        expected: &'static str,
        /// Supplied value type
        found: &'static str,
    },

    /// Connection would close a loop in the dependency graph
    #[error("connection {from} -> {to} would create a cycle")]
    CycleDetected {
        /// Source plug
        from: String,
        /// Destination plug
        to: String,
    },

    /// Reparenting would place a node under its own descendant
    #[error("cannot parent {child} under {parent}: would create a hierarchy cycle")]
    HierarchyCycle {
        /// Child node name
        child: String,
        /// Requested parent name
        parent: String,
    },

    /// Pull evaluation exceeded the recursion guard
    #[error("evaluation cycle while computing {0}")]
    EvaluationCycle(String),

    /// Operation requires a transform-like node
    #[error("not a transform: {0}")]
    NotATransform(String),

    /// Operation requires a curve node
    #[error("not a curve: {0}")]
    NotACurve(String),

    /// A matrix that must be inverted is singular
    #[error("singular matrix while evaluating {0}")]
    SingularMatrix(String),

    /// Index outside a curve's control points or an array attribute
    #[error("index {index} out of range on {node}")]
    IndexOutOfRange {
        /// Node name
        node: String,
        /// Offending index
        index: usize,
    },
}

impl SceneError {
    /// True for errors caused by a missing node or attribute reference
    #[must_use]
    pub fn is_reference_error(&self) -> bool {
        matches!(
            self,
            SceneError::NodeNotFound(_) | SceneError::AttributeNotFound { .. }
        )
    }

    /// True for errors caused by the state of an attribute (locks, connections)
    #[must_use]
    pub fn is_attribute_state_error(&self) -> bool {
        matches!(
            self,
            SceneError::LockedAttribute(_)
                | SceneError::DrivenAttribute(_)
                | SceneError::AlreadyConnected(_)
                | SceneError::ReadOnly(_)
        )
    }
}
