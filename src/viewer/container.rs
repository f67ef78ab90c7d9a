use parking_lot::Mutex;
use std::fmt;
use uuid::Uuid;

/// Identity of a surface node inside a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(Uuid);

impl NodeId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

/// Drawing surface a viewer instance is bound to.
///
/// A fresh node is created for every instance so the engine never inherits
/// state from a previous one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurfaceNode {
    pub id: NodeId,
    pub width: String,
    pub height: String,
    pub position: String,
}

impl SurfaceNode {
    /// Node that fills its container.
    pub fn filling() -> Self {
        Self {
            id: NodeId::new(),
            width: "100%".to_string(),
            height: "100%".to_string(),
            position: "relative".to_string(),
        }
    }

    /// Element id used when the node is materialized in a document.
    pub fn dom_id(&self) -> String {
        format!("glimps-viewer-{}", self.id)
    }
}

/// Host-owned region the viewer attaches its surface node to.
///
/// The viewer never replaces other content of the container; it only adds
/// and removes the nodes it created.
pub trait ViewerContainer: Send + Sync {
    fn attach(&self, node: &SurfaceNode);
    /// Returns whether the node was present.
    fn detach(&self, id: NodeId) -> bool;
    fn contains(&self, id: NodeId) -> bool;
    fn children(&self) -> Vec<NodeId>;
}

/// In-process container, used by headless hosts and tests.
#[derive(Debug, Default)]
pub struct MemoryContainer {
    nodes: Mutex<Vec<SurfaceNode>>,
}

impl MemoryContainer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn nodes(&self) -> Vec<SurfaceNode> {
        self.nodes.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.nodes.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.lock().is_empty()
    }
}

impl ViewerContainer for MemoryContainer {
    fn attach(&self, node: &SurfaceNode) {
        let mut nodes = self.nodes.lock();
        if !nodes.iter().any(|n| n.id == node.id) {
            nodes.push(node.clone());
        }
    }

    fn detach(&self, id: NodeId) -> bool {
        let mut nodes = self.nodes.lock();
        let before = nodes.len();
        nodes.retain(|n| n.id != id);
        nodes.len() != before
    }

    fn contains(&self, id: NodeId) -> bool {
        self.nodes.lock().iter().any(|n| n.id == id)
    }

    fn children(&self) -> Vec<NodeId> {
        self.nodes.lock().iter().map(|n| n.id).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attach_detach() {
        let container = MemoryContainer::new();
        let node = SurfaceNode::filling();

        container.attach(&node);
        container.attach(&node);
        assert_eq!(container.len(), 1);
        assert!(container.contains(node.id));

        assert!(container.detach(node.id));
        assert!(!container.detach(node.id));
        assert!(container.is_empty());
    }

    #[test]
    fn test_nodes_are_unique() {
        let a = SurfaceNode::filling();
        let b = SurfaceNode::filling();
        assert_ne!(a.id, b.id);
        assert_ne!(a.dom_id(), b.dom_id());
        assert!(a.dom_id().starts_with("glimps-viewer-"));
    }
}
