//! fOS DOM - Document Object Model
//!
//! Arena-backed DOM tree plus the event model that directive bindings run on:
//! listener registration, capture/target/bubble dispatch across
//! window → document → nodes, and element geometry.

mod node;
mod tree;
mod document;
mod geometry;
mod events;
mod listeners;
mod dom;

pub use node::{Node, NodeData, ElementData, TextData, Attribute};
pub use tree::{DomTree, Children};
pub use document::Document;
pub use geometry::ElementGeometry;
pub use events::{Event, EventPhase, EventDetail, KeyboardEventInit, MouseEventInit, KeyModifiers, MouseButton};
pub use listeners::{EventTarget, ListenerId, ListenerOptions, ListenerStore, ListenerCallback};
pub use dom::{Dom, WeakDom, HostGlobals, ObserverId, RemovalObserver};

/// Node identifier (index into arena)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    /// Root (document) node ID
    pub const ROOT: NodeId = NodeId(0);

    /// Sentinel for "no node" links
    pub const NONE: NodeId = NodeId(u32::MAX);

    /// Check that this is not the `NONE` sentinel
    #[inline]
    pub fn is_valid(self) -> bool {
        self != Self::NONE
    }

    #[inline]
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

/// DOM operation error
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomError {
    #[error("Unknown node: {0:?}")]
    UnknownNode(NodeId),

    #[error("Node {0:?} is not an element")]
    NotAnElement(NodeId),

    #[error("Cannot insert {child:?} under {parent:?}")]
    HierarchyRequest { parent: NodeId, child: NodeId },
}
