//! # Compositor-side [Tablet](tablet) and [Tool](tool) protocol state 🐙🪑
//!
//! Serves the early experimental *`wl_tablet`* protocol and *`tablet_unstable_v1`* from inside a
//! Wayland compositor. Both revisions may be served at once, with each client receiving events
//! in whichever revision it bound.
//!
//! This crate owns the state machine: which tablets and tools exist, which client surface a
//! tablet's tool is focused on, what each client has been told, and which surface is acting as a
//! tablet's cursor. Everything else (picking, painting, the socket) belongs to the host, which
//! exposes it through [`Compositor`](compositor::Compositor).
//!
//! To get started, create a [`Builder`], then feed the resulting [`TabletManager`] hot-plug
//! events, client bindings and requests, and input events.
//!
//! ## Event flow
//! Every tablet event goes through two calls, in order:
//! 1. [`TabletManager::update`], which adjusts focus and tool state and may emit proximity events,
//! 2. [`TabletManager::handle_event`], which delivers motion, axes and buttons to the focus.
//!
//! [`TabletManager::update_cursor_position`] may be called at any point after `update` to move the
//! tablet's cursor.

#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod builder;
pub mod compositor;
pub mod cursor;
pub mod device;
pub mod events;
pub mod protocol;
mod resource;
pub mod seat;
pub mod tablet;
pub mod tool;
mod util;
mod watch;

pub use builder::Builder;
pub use resource::Resource;
pub use util::from_fixed;

use builder::Config;
use compositor::{ClientId, Compositor, DeviceId, ResourceId, SurfaceId};
use cursor::{Commit, CursorRoles};
use device::Device;
use events::{EventKind, InputEvent, Propagation};
use protocol::{DecodeError, Interface, Message, Notification, ObjectKind, Request, Serializer};
use resource::{Object, Owners};
use seat::TabletSeat;
use watch::{SurfaceWatches, Watcher};

/// Errors from handling a client request.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum RequestError {
    /// The sender, or an object argument, is not a resource we know of.
    #[error("unknown resource {0:?}")]
    UnknownResource(ResourceId),
    #[error(transparent)]
    Decode(#[from] DecodeError),
    /// The cursor surface already has another role. A protocol error has been posted.
    #[error("surface {surface:?} already has a different role")]
    RoleConflict { surface: SurfaceId },
}

/// Everything a transition may touch besides the tablet and tool themselves.
pub(crate) struct Context<'a> {
    pub(crate) host: &'a mut dyn Compositor,
    pub(crate) owners: &'a mut Owners,
    pub(crate) watches: &'a mut SurfaceWatches,
    pub(crate) cursors: &'a mut CursorRoles,
    pub(crate) config: &'a Config,
}
impl Context<'_> {
    pub(crate) fn send(&mut self, message: Message) {
        tracing::trace!(
            sender = ?message.sender_id,
            opcode = message.opcode,
            args = message.args.len(),
            "event"
        );
        self.host.send(message);
    }
    /// Serialize and send a notification on `receiver`.
    pub(crate) fn notify(
        &mut self,
        receiver: &Resource,
        counterpart: Option<ResourceId>,
        notification: &Notification,
    ) {
        match receiver.revision().serializer().notify(receiver, counterpart, notification) {
            Some(message) => self.send(message),
            None => tracing::warn!(
                receiver = ?receiver.id,
                client = ?receiver.client,
                ?notification,
                "client lacks the counterpart object, event dropped"
            ),
        }
    }
    /// Send `removed` if the resource has one, then invalidate it.
    pub(crate) fn remove_resource(&mut self, resource: &Resource) {
        if let Some(message) = resource.revision().serializer().removed(resource) {
            self.send(message);
        }
        self.owners.remove(resource.id);
        self.host.destroy_resource(resource.id);
    }
}

/// Serves the tablet protocols for one seat. This is the main entry point.
///
/// Create with a [`Builder`]. Tear down with [`TabletManager::destroy`].
#[derive(Debug)]
pub struct TabletManager {
    config: Config,
    seat: TabletSeat,
    owners: Owners,
    watches: SurfaceWatches,
    cursors: CursorRoles,
}

impl TabletManager {
    pub(crate) fn new(config: Config) -> Self {
        Self {
            config,
            seat: TabletSeat::default(),
            owners: Owners::default(),
            watches: SurfaceWatches::default(),
            cursors: CursorRoles::default(),
        }
    }

    fn parts<'a>(&'a mut self, host: &'a mut dyn Compositor) -> (&'a mut TabletSeat, Context<'a>) {
        let Self {
            config,
            seat,
            owners,
            watches,
            cursors,
        } = self;
        (
            seat,
            Context {
                host,
                owners,
                watches,
                cursors,
                config,
            },
        )
    }

    /// The manager globals to advertise, with their versions.
    pub fn globals(&self) -> impl Iterator<Item = (Interface, u32)> + '_ {
        self.config
            .revisions
            .iter()
            .map(|revision| (Interface::manager(*revision), revision.version()))
    }
    #[must_use]
    pub fn seat(&self) -> &TabletSeat {
        &self.seat
    }
    #[must_use]
    pub fn tablet(&self, device: DeviceId) -> Option<&tablet::Tablet> {
        self.seat.tablet(device)
    }
    /// See [`ToolKey::new`](tool::ToolKey::new).
    #[must_use]
    pub fn tool(&self, key: tool::ToolKey) -> Option<&tool::Tool> {
        self.seat.tool(key)
    }
    /// The cursor role of a surface, if it was ever given one.
    #[must_use]
    pub fn cursor_role(&self, surface: SurfaceId) -> Option<&cursor::CursorRole> {
        self.cursors.get(surface)
    }

    /// A device was plugged in, or found at startup. Non-tablets are ignored.
    ///
    /// Returns whether the device is now tracked as a new tablet.
    pub fn register_device(&mut self, device: Device, host: &mut dyn Compositor) -> bool {
        let (seat, mut cx) = self.parts(host);
        seat.register_device(device, &mut cx)
    }
    /// A device was unplugged. Returns whether it was a tracked tablet.
    pub fn unregister_device(&mut self, device: DeviceId, host: &mut dyn Compositor) -> bool {
        let (seat, mut cx) = self.parts(host);
        seat.unregister_device(device, &mut cx)
    }
    /// Whether the event comes from a tracked tablet.
    #[must_use]
    pub fn consumes_event(&self, event: &InputEvent) -> bool {
        self.seat.tablets.contains_key(&event.device)
    }

    /// A client bound a manager global, or created a tablet seat. `id` is the client-allocated
    /// object.
    ///
    /// Binding the same global twice yields two independent resources.
    pub fn bind_client(
        &mut self,
        client: ClientId,
        interface: Interface,
        id: ResourceId,
        version: u32,
        host: &mut dyn Compositor,
    ) -> Resource {
        debug_assert!(matches!(interface.kind(), ObjectKind::Manager | ObjectKind::Seat));
        let resource = Resource {
            id,
            client,
            interface,
            version: version.min(interface.revision().version()),
        };
        let (seat, mut cx) = self.parts(host);
        seat.bind(resource, &mut cx);
        resource
    }

    /// Dispatch a request sent by a client on one of our resources.
    /// # Errors
    /// Unknown senders or arguments, malformed requests and cursor role conflicts. Only the
    /// last is a protocol violation, for which an error has already been posted.
    pub fn dispatch_request(
        &mut self,
        message: &Message,
        host: &mut dyn Compositor,
    ) -> Result<(), RequestError> {
        let Some((receiver, object)) = self.owners.get(message.sender_id) else {
            tracing::warn!(
                sender = ?message.sender_id,
                opcode = message.opcode,
                "request on unknown resource"
            );
            return Err(RequestError::UnknownResource(message.sender_id));
        };
        let request = receiver.revision().serializer().decode(&receiver, message)?;
        tracing::trace!(
            client = ?receiver.client,
            interface = receiver.interface.name(),
            ?request,
            "request"
        );
        match request {
            Request::Destroy => {
                self.resource_destroyed(receiver.id);
                host.destroy_resource(receiver.id);
                Ok(())
            }
            Request::GetTabletSeat { id, .. } => {
                let interface = Interface::UnstableSeat;
                self.bind_client(receiver.client, interface, id, receiver.version, host);
                Ok(())
            }
            Request::SetCursor {
                serial,
                surface,
                hotspot,
                tablet,
            } => {
                let scene = &*host;
                let surface = match surface {
                    Some(id) => Some(
                        scene
                            .surface_from_resource(receiver.client, id)
                            .ok_or(RequestError::UnknownResource(id))?,
                    ),
                    None => None,
                };
                let Some(device) = self.cursor_target(object, tablet)? else {
                    return Ok(());
                };
                let (seat, mut cx) = self.parts(host);
                match seat.tablets.get_mut(&device) {
                    Some(tablet) => {
                        tablet.set_cursor_request(&receiver, serial, surface, hotspot, &mut cx)
                    }
                    None => Ok(()),
                }
            }
        }
    }

    /// The tablet a `set_cursor` applies to. For tool resources, only while that tool is
    /// current on it.
    fn cursor_target(
        &self,
        object: Object,
        tablet: Option<ResourceId>,
    ) -> Result<Option<DeviceId>, RequestError> {
        match object {
            Object::Tablet(device) => Ok(Some(device)),
            Object::Tool(key) => {
                let device = match tablet {
                    Some(id) => match self.owners.get(id) {
                        Some((_, Object::Tablet(device))) => device,
                        _ => return Err(RequestError::UnknownResource(id)),
                    },
                    None => match self.seat.tools.get(&key) {
                        Some(tool) => tool.tablet,
                        None => return Ok(None),
                    },
                };
                let current = self
                    .seat
                    .tablets
                    .get(&device)
                    .is_some_and(|tablet| tablet.tool_key() == Some(key));
                Ok(current.then_some(device))
            }
            Object::Manager | Object::Seat => Ok(None),
        }
    }

    /// The transport destroyed a resource. It is dropped from all lists without further events.
    pub fn resource_destroyed(&mut self, resource: ResourceId) {
        if let Some((_, object)) = self.owners.remove(resource) {
            self.seat.forget(resource, object);
        }
    }
    /// Drop every resource of a disconnected client.
    pub fn client_disconnected(&mut self, client: ClientId) {
        for id in self.owners.owned_by(client) {
            self.resource_destroyed(id);
        }
    }

    /// Bookkeeping for a tablet event, ahead of [`TabletManager::handle_event`].
    pub fn update(&mut self, event: &InputEvent, host: &mut dyn Compositor) {
        let (seat, mut cx) = self.parts(host);
        let TabletSeat {
            tablets,
            tools,
            bindings,
        } = seat;
        if let Some(tablet) = tablets.get_mut(&event.device) {
            tablet.update(event, tools, bindings, &mut cx);
        }
    }
    /// Deliver a tablet event to its focus. Events from untracked devices propagate.
    pub fn handle_event(&mut self, event: &InputEvent, host: &mut dyn Compositor) -> Propagation {
        let (seat, mut cx) = self.parts(host);
        let TabletSeat {
            tablets,
            tools,
            bindings,
        } = seat;
        match tablets.get_mut(&event.device) {
            Some(tablet) => tablet.handle_event(event, tools, bindings, &mut cx),
            None => Propagation::Propagate,
        }
    }
    /// Move the tablet's cursor to the event's position, or its last known one.
    pub fn update_cursor_position(&mut self, event: &InputEvent, host: &mut dyn Compositor) {
        let (seat, mut cx) = self.parts(host);
        if let Some(tablet) = seat.tablets.get_mut(&event.device) {
            let position = match event.kind {
                EventKind::Motion { position, .. } => position,
                _ => tablet.position(),
            };
            tablet.update_cursor_position(position, &mut cx);
        }
    }

    /// A surface committed. Updates its cursor sprite if it is acting as one.
    pub fn surface_committed(
        &mut self,
        surface: SurfaceId,
        commit: &Commit,
        host: &mut dyn Compositor,
    ) {
        let Some(role) = self.cursors.get_mut(surface) else {
            return;
        };
        role.commit(commit, &mut *host);
        let (seat, mut cx) = self.parts(host);
        for tablet in seat.tablets.values().filter(|tablet| tablet.shows_cursor(surface)) {
            tablet.update_cursor(&mut cx);
        }
    }

    /// A surface is being destroyed. Every tablet focused on it or showing it as a cursor lets
    /// go of it first, then its cursor role is dropped.
    pub fn surface_destroyed(&mut self, surface: SurfaceId, host: &mut dyn Compositor) {
        let watchers = self.watches.watchers(surface);
        let (seat, mut cx) = self.parts(host);
        let TabletSeat {
            tablets,
            tools,
            bindings,
        } = seat;
        for watcher in watchers {
            let (Watcher::Focus(device) | Watcher::Cursor(device)) = watcher;
            if let Some(tablet) = tablets.get_mut(&device) {
                tablet.surface_destroyed(watcher, tools, bindings, &mut cx);
            }
        }
        cx.cursors.remove(surface);
    }

    /// Remove every tablet and tool, in unplug order.
    pub fn destroy(mut self, host: &mut dyn Compositor) {
        let devices: Vec<DeviceId> = self.seat.tablets.keys().copied().collect();
        for device in devices {
            self.unregister_device(device, host);
        }
        let (seat, mut cx) = self.parts(host);
        for (_, tool) in seat.tools.drain() {
            tool.destroy(&mut cx);
        }
        debug_assert!(cx.watches.is_empty());
        tracing::debug!(bindings = seat.bindings.len(), "tablet manager destroyed");
    }
}
