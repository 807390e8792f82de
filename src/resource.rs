//! Protocol resource bookkeeping.
//!
//! Every tablet and tool keeps its per-client resources split in two: those belonging to the
//! client that currently holds focus, and everyone else's. Events are only ever delivered to
//! the focused half.

use smallvec::SmallVec;

use crate::{
    compositor::{ClientId, DeviceId, ResourceId},
    protocol::{Interface, ObjectKind, Revision},
    tool::ToolKey,
};

/// A bound protocol object.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Resource {
    pub id: ResourceId,
    pub client: ClientId,
    pub interface: Interface,
    pub version: u32,
}
impl Resource {
    #[must_use]
    pub fn revision(&self) -> Revision {
        self.interface.revision()
    }
    /// Whether this resource receives tablet/tool announcements for its client and revision.
    #[must_use]
    pub fn is_parent(&self) -> bool {
        self.interface.is_parent()
    }
    /// Whether focus notifications are sent on this resource.
    #[must_use]
    pub fn is_carrier(&self) -> bool {
        self.interface.kind() == self.revision().carrier()
    }
}

pub(crate) type ResourceList = SmallVec<[Resource; 4]>;

/// A change of focus, as seen by one partition.
#[derive(Clone, Copy, Debug)]
pub(crate) enum Migration {
    /// Move all of one client's resources into focus.
    Focus(ClientId),
    /// Move one client's resources back out of focus.
    Unfocus(ClientId),
}

/// Disjoint focused/unfocused resource lists.
#[derive(Debug, Default)]
pub(crate) struct ResourcePartition {
    unfocused: ResourceList,
    focused: ResourceList,
}
impl ResourcePartition {
    pub(crate) fn insert(&mut self, resource: Resource, focused: bool) {
        debug_assert!(!self.iter().any(|r| r.id == resource.id));
        if focused {
            self.focused.push(resource);
        } else {
            self.unfocused.push(resource);
        }
    }
    pub(crate) fn remove(&mut self, id: ResourceId) -> Option<Resource> {
        for list in [&mut self.unfocused, &mut self.focused] {
            if let Some(idx) = list.iter().position(|r| r.id == id) {
                return Some(list.remove(idx));
            }
        }
        None
    }
    /// The resource bound by `client` for `revision`, in either list.
    pub(crate) fn lookup(&self, client: ClientId, revision: Revision) -> Option<&Resource> {
        self.iter()
            .find(|r| r.client == client && r.revision() == revision)
    }
    pub(crate) fn focused(&self) -> &[Resource] {
        &self.focused
    }
    pub(crate) fn iter(&self) -> impl Iterator<Item = &Resource> {
        self.unfocused.iter().chain(self.focused.iter())
    }
    /// Move resources between the lists. Returns the moved resources in their original order.
    ///
    /// This is the only operation that moves a resource from one list to the other.
    pub(crate) fn migrate(&mut self, migration: Migration) -> ResourceList {
        let (from, to, client) = match migration {
            Migration::Focus(client) => (&mut self.unfocused, &mut self.focused, client),
            Migration::Unfocus(client) => (&mut self.focused, &mut self.unfocused, client),
        };
        let mut moved = ResourceList::new();
        from.retain(|r| {
            if r.client == client {
                moved.push(*r);
                false
            } else {
                true
            }
        });
        to.extend_from_slice(&moved);
        moved
    }
    /// Empty both lists, unfocused first.
    pub(crate) fn drain(&mut self) -> ResourceList {
        let mut all = std::mem::take(&mut self.unfocused);
        all.append(&mut self.focused);
        all
    }
}

/// What a resource is bound to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Object {
    Manager,
    Seat,
    Tablet(DeviceId),
    Tool(ToolKey),
}

/// Reverse index from resource to object, for request dispatch.
#[derive(Debug, Default)]
pub(crate) struct Owners(std::collections::HashMap<ResourceId, (Resource, Object)>);
impl Owners {
    pub(crate) fn insert(&mut self, resource: Resource, object: Object) {
        debug_assert_eq!(
            resource.interface.kind(),
            match object {
                Object::Manager => ObjectKind::Manager,
                Object::Seat => ObjectKind::Seat,
                Object::Tablet(_) => ObjectKind::Tablet,
                Object::Tool(_) => ObjectKind::Tool,
            }
        );
        self.0.insert(resource.id, (resource, object));
    }
    pub(crate) fn get(&self, id: ResourceId) -> Option<(Resource, Object)> {
        self.0.get(&id).copied()
    }
    pub(crate) fn remove(&mut self, id: ResourceId) -> Option<(Resource, Object)> {
        self.0.remove(&id)
    }
    pub(crate) fn owned_by(&self, client: ClientId) -> SmallVec<[ResourceId; 8]> {
        self.0
            .values()
            .filter(|(r, _)| r.client == client)
            .map(|(r, _)| r.id)
            .collect()
    }
}
