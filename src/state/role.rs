//! This server's position in the tree.

use crate::network::Route;

/// Root/parent state of the local server.
///
/// The server is root exactly when it has no parent route.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NetworkRole {
    parent: Option<Route>,
}

impl NetworkRole {
    /// A freshly started server: root, no parent.
    pub fn root() -> Self {
        Self::default()
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    pub fn parent(&self) -> Option<Route> {
        self.parent
    }

    pub fn set_parent(&mut self, route: Route) {
        self.parent = Some(route);
    }

    /// Drop the parent link, making this server root.
    pub fn clear_parent(&mut self) {
        self.parent = None;
    }

    pub fn is_parent(&self, route: Route) -> bool {
        self.parent == Some(route)
    }
}
