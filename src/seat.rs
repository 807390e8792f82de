//! # The tablet seat
//!
//! Groups the tablets and tools of the one seat this crate serves, along with every client's
//! manager and seat bindings.

use std::collections::HashMap;

use smallvec::SmallVec;

use crate::{
    compositor::{ClientId, DeviceId, ResourceId},
    device::Device,
    protocol::{ObjectKind, Serializer},
    resource::{Object, Resource, ResourceList},
    tablet::{Tablet, Tools},
    tool::{Tool, ToolKey},
    Context,
};

#[derive(Debug, Default)]
pub struct TabletSeat {
    pub(crate) tablets: HashMap<DeviceId, Tablet>,
    pub(crate) tools: Tools,
    /// Manager and seat resources, every client and revision.
    pub(crate) bindings: ResourceList,
}

impl TabletSeat {
    #[must_use]
    pub fn tablet(&self, device: DeviceId) -> Option<&Tablet> {
        self.tablets.get(&device)
    }
    pub fn tablets(&self) -> impl Iterator<Item = &Tablet> {
        self.tablets.values()
    }
    #[must_use]
    pub fn tool(&self, key: ToolKey) -> Option<&Tool> {
        self.tools.get(&key)
    }
    pub fn tools(&self) -> impl Iterator<Item = &Tool> {
        self.tools.values()
    }

    /// Start tracking a tablet and announce it to every bound client.
    /// Returns false for non-tablets and already tracked devices.
    pub(crate) fn register_device(&mut self, device: Device, cx: &mut Context) -> bool {
        if !device.is_tablet() {
            tracing::trace!(
                device = ?device.id,
                kind = device.device_type.as_ref(),
                "not a tablet"
            );
            return false;
        }
        if self.tablets.contains_key(&device.id) {
            return false;
        }
        tracing::info!(device = ?device.id, name = %device.name, "tablet added");
        let id = device.id;
        let mut tablet = Tablet::new(device);
        for parent in self.bindings.iter().filter(|binding| binding.is_parent()) {
            tablet.create_new_resource(parent, cx);
        }
        self.tablets.insert(id, tablet);
        true
    }

    /// Stop tracking a tablet, along with the tools last seen on it. Tools in proximity of
    /// another tablet are left alone.
    pub(crate) fn unregister_device(&mut self, device: DeviceId, cx: &mut Context) -> bool {
        let Some(tablet) = self.tablets.remove(&device) else {
            return false;
        };
        tablet.destroy(&mut self.tools, &self.bindings, cx);
        let orphans: SmallVec<[ToolKey; 4]> = self
            .tools
            .values()
            .filter(|tool| tool.tablet == device)
            .map(Tool::key)
            .filter(|key| !self.tablets.values().any(|tablet| tablet.tool_key() == Some(*key)))
            .collect();
        for key in orphans {
            if let Some(tool) = self.tools.remove(&key) {
                tool.destroy(cx);
            }
        }
        true
    }

    /// Record a manager or seat binding, announcing existing tablets on parents.
    pub(crate) fn bind(&mut self, resource: Resource, cx: &mut Context) {
        let object = if resource.interface.kind() == ObjectKind::Seat {
            Object::Seat
        } else {
            Object::Manager
        };
        cx.owners.insert(resource, object);
        self.bindings.push(resource);
        tracing::info!(
            client = ?resource.client,
            interface = resource.interface.name(),
            id = ?resource.id,
            "bound"
        );

        let seat = cx.host.seat_resource(resource.client);
        for message in resource.revision().serializer().manager_bound(&resource, seat) {
            cx.send(message);
        }
        if !resource.is_parent() {
            return;
        }
        for tablet in self.tablets.values_mut() {
            tablet.create_new_resource(&resource, cx);
        }
        for tablet in self.tablets.values_mut() {
            tablet.refresh_client(resource.client, &mut self.tools, &self.bindings, cx);
        }
    }

    /// Drop a resource from whichever list holds it. No events are sent.
    pub(crate) fn forget(&mut self, id: ResourceId, object: Object) {
        match object {
            Object::Manager | Object::Seat => self.bindings.retain(|binding| binding.id != id),
            Object::Tablet(device) => {
                if let Some(tablet) = self.tablets.get_mut(&device) {
                    tablet.resources.remove(id);
                }
            }
            Object::Tool(key) => {
                if let Some(tool) = self.tools.get_mut(&key) {
                    tool.resources.remove(id);
                }
            }
        }
    }

    /// Whether any binding belongs to `client`.
    #[must_use]
    pub fn is_bound(&self, client: ClientId) -> bool {
        self.bindings.iter().any(|binding| binding.client == client)
    }
}
