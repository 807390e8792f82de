//! # Tablets
//!
//! A tablet is the physical device reporting tool interactions, and the owner of the focus
//! they produce. A tablet has at most one current [tool](crate::tool) at a time, picks the
//! surface under it on idle motion, and delivers proximity, motion, axis and button events to
//! the client owning that surface.
//!
//! Which protocol object an event is sent on depends on the receiving client's revision, see
//! [`protocol`](crate::protocol). Either way both the tablet's and the tool's resources of the
//! focused client are kept in their focused lists for exactly as long as that client holds focus.

use std::collections::HashMap;

use crate::{
    compositor::{ClientId, RendererId, ResourceId, Role, Serial, Surface, SurfaceId},
    cursor::CursorImage,
    device::Device,
    events::{Axes, EventKind, InputEvent, Propagation},
    protocol::{Interface, Notification, ObjectKind, Revision, Serializer},
    resource::{Migration, Object, Resource, ResourcePartition},
    tool::{Buttons, Capabilities, Tool, ToolDescriptor, ToolKey},
    watch::{WatchToken, Watcher},
    Context, RequestError,
};

pub(crate) type Tools = HashMap<ToolKey, Tool>;

/// `wl_pointer.error.role`, the code used for cursor role conflicts.
pub(crate) const ROLE_ERROR: u32 = 0;

/// The tip.
const PRIMARY_BUTTON: u32 = 1;

/// A surface held alive-watched.
#[derive(Debug)]
struct Held {
    surface: Surface,
    watch: WatchToken,
}

/// See [module level docs](`crate::tablet`) for details.
#[derive(Debug)]
pub struct Tablet {
    device: Device,
    pub(crate) resources: ResourcePartition,
    /// Surface under the tool as of the last pick, regardless of grabs.
    current: Option<Surface>,
    focus: Option<Held>,
    tool: Option<ToolKey>,
    position: [f64; 2],
    time: u32,
    proximity_serial: Serial,
    down_serial: Serial,
    button_serial: Serial,
    cursor: Option<Held>,
    renderer: Option<RendererId>,
}

impl Tablet {
    pub(crate) fn new(device: Device) -> Self {
        Self {
            device,
            resources: ResourcePartition::default(),
            current: None,
            focus: None,
            tool: None,
            position: [0.0, 0.0],
            time: 0,
            proximity_serial: Serial::default(),
            down_serial: Serial::default(),
            button_serial: Serial::default(),
            cursor: None,
            renderer: None,
        }
    }
    #[must_use]
    pub fn device(&self) -> &Device {
        &self.device
    }
    /// The surface receiving this tablet's events.
    #[must_use]
    pub fn focus(&self) -> Option<&Surface> {
        self.focus.as_ref().map(|held| &held.surface)
    }
    /// The surface picked under the tool, which differs from focus during grabs.
    #[must_use]
    pub fn current(&self) -> Option<&Surface> {
        self.current.as_ref()
    }
    /// The tool in proximity, if any.
    #[must_use]
    pub fn tool(&self) -> Option<ToolDescriptor> {
        self.tool.map(|key| key.descriptor)
    }
    #[must_use]
    pub fn tool_key(&self) -> Option<ToolKey> {
        self.tool
    }
    /// Serial of the latest proximity-in. `set_cursor` must quote this or something recent.
    #[must_use]
    pub fn proximity_serial(&self) -> Serial {
        self.proximity_serial
    }
    #[must_use]
    pub fn down_serial(&self) -> Serial {
        self.down_serial
    }
    #[must_use]
    pub fn button_serial(&self) -> Serial {
        self.button_serial
    }
    /// Last known stage position.
    #[must_use]
    pub fn position(&self) -> [f64; 2] {
        self.position
    }
    #[must_use]
    pub fn cursor_surface(&self) -> Option<&Surface> {
        self.cursor.as_ref().map(|held| &held.surface)
    }
    #[must_use]
    pub fn renderer(&self) -> Option<RendererId> {
        self.renderer
    }
    #[must_use]
    pub fn lookup_resource(&self, client: ClientId, revision: Revision) -> Option<&Resource> {
        self.resources.lookup(client, revision)
    }

    fn current_tool<'t>(&self, tools: &'t mut Tools) -> Option<&'t mut Tool> {
        self.tool.and_then(move |key| tools.get_mut(&key))
    }

    /// Create and announce a resource for the client owning `parent`.
    pub(crate) fn create_new_resource(&mut self, parent: &Resource, cx: &mut Context) -> Resource {
        let interface = Interface::tablet(parent.revision());
        let resource = Resource {
            id: cx.host.create_resource(parent.client, interface, parent.version),
            client: parent.client,
            interface,
            version: parent.version,
        };
        self.resources.insert(resource, false);
        cx.owners.insert(resource, Object::Tablet(self.device.id));
        let serializer = parent.revision().serializer();
        for message in serializer.tablet_added(parent, &resource, &self.device) {
            cx.send(message);
        }
        resource
    }

    /// The object paired with `receiver` in focus events.
    fn counterpart(&self, receiver: &Resource, tool: Option<&Tool>) -> Option<ResourceId> {
        let counterpart = match receiver.interface.kind() {
            ObjectKind::Tablet => tool?.lookup_resource(receiver.client, receiver.revision()),
            ObjectKind::Tool => self.resources.lookup(receiver.client, receiver.revision()),
            ObjectKind::Manager | ObjectKind::Seat => None,
        };
        counterpart.map(|resource| resource.id)
    }

    /// Send to every focused resource carrying focus events.
    ///
    /// Tool resources only count when their client holds this tablet's focus, since the tool may
    /// be focused elsewhere too.
    fn deliver(&self, tool: Option<&Tool>, notification: &Notification, cx: &mut Context) {
        let focused = self.resources.focused();
        let tool_focused = tool
            .map(|tool| tool.resources.focused())
            .unwrap_or_default()
            .iter()
            .filter(|resource| {
                focused.iter().any(|tablet| {
                    tablet.client == resource.client && tablet.revision() == resource.revision()
                })
            });
        for receiver in focused
            .iter()
            .chain(tool_focused)
            .filter(|resource| resource.is_carrier())
        {
            let counterpart = self.counterpart(receiver, tool);
            cx.notify(receiver, counterpart, notification);
        }
    }

    /// Move `client`'s resources into focus and greet the ones that just arrived.
    fn enter(&mut self, client: ClientId, tool: &mut Tool, parents: &[Resource], cx: &mut Context) {
        let Some(surface) = self.focus.as_ref().map(|held| held.surface) else {
            return;
        };
        let mut entrants = self.resources.migrate(Migration::Focus(client));
        entrants.extend(tool.resources.migrate(Migration::Focus(client)));
        entrants.extend(tool.ensure_client_resource(client, true, parents, cx));
        if entrants.is_empty() {
            return;
        }
        self.proximity_serial = cx.host.next_serial();
        let notification = Notification::ProximityIn {
            serial: self.proximity_serial,
            time: self.time,
            surface: surface.resource,
        };
        for entrant in entrants.iter().filter(|resource| resource.is_carrier()) {
            let counterpart = self.counterpart(entrant, Some(&*tool));
            cx.notify(entrant, counterpart, &notification);
        }
    }

    pub(crate) fn set_focus(
        &mut self,
        surface: Option<Surface>,
        mut tool: Option<&mut Tool>,
        parents: &[Resource],
        cx: &mut Context,
    ) {
        let unchanged = match (&self.focus, &surface) {
            (Some(held), Some(surface)) => held.surface.is(surface),
            (None, None) => true,
            _ => false,
        };
        if unchanged {
            return;
        }
        if let Some(old) = self.focus.take() {
            self.deliver(tool.as_deref(), &Notification::ProximityOut { time: self.time }, cx);
            let client = old.surface.client;
            self.resources.migrate(Migration::Unfocus(client));
            if let Some(tool) = tool.as_deref_mut() {
                tool.resources.migrate(Migration::Unfocus(client));
            }
            cx.watches.cancel(old.watch);
            tracing::debug!(device = ?self.device.id, surface = ?old.surface.id, "focus left");
        }
        if let (Some(surface), Some(tool)) = (surface, tool) {
            let watch = cx.watches.watch(surface.id, Watcher::Focus(self.device.id));
            self.focus = Some(Held { surface, watch });
            tracing::debug!(
                device = ?self.device.id,
                surface = ?surface.id,
                client = ?surface.client,
                "focus entered"
            );
            self.enter(surface.client, tool, parents, cx);
        }
        self.update_cursor(cx);
    }

    /// Bring a client that bound while already holding focus up to date.
    pub(crate) fn refresh_client(
        &mut self,
        client: ClientId,
        tools: &mut Tools,
        parents: &[Resource],
        cx: &mut Context,
    ) {
        if self.focus().map(|surface| surface.client) != Some(client) {
            return;
        }
        if let Some(tool) = self.current_tool(tools) {
            self.enter(client, tool, parents, cx);
        }
    }

    fn repick(&mut self, tools: &mut Tools, parents: &[Resource], cx: &mut Context) {
        self.current = cx.host.surface_at(self.position);
        let focus = if cx.host.event_route().is_grab() {
            None
        } else {
            self.current
        };
        let tool = self.current_tool(tools);
        self.set_focus(focus, tool, parents, cx);
        self.update_cursor(cx);
    }

    /// Adjust bookkeeping for an event before it is delivered.
    pub(crate) fn update(
        &mut self,
        event: &InputEvent,
        tools: &mut Tools,
        parents: &[Resource],
        cx: &mut Context,
    ) {
        self.time = event.time;
        match event.kind {
            EventKind::ProximityIn { tool } => self.proximity_in(tool, tools, parents, cx),
            EventKind::ProximityOut => self.proximity_out(tools, parents, cx),
            EventKind::Motion { position, .. } => {
                self.position = position;
                let idle = self
                    .current_tool(tools)
                    .map_or(true, |tool| tool.pressed.is_empty());
                // Implicit grab while any button is held.
                if idle {
                    self.repick(tools, parents, cx);
                }
            }
            EventKind::Button { button, state } => {
                if let Some(tool) = self.current_tool(tools) {
                    tool.account_button(button, state.is_pressed());
                }
            }
            EventKind::Scroll { .. } => {}
        }
    }

    fn proximity_in(
        &mut self,
        descriptor: ToolDescriptor,
        tools: &mut Tools,
        parents: &[Resource],
        cx: &mut Context,
    ) {
        let key = ToolKey::new(descriptor, self.device.id);
        if self.tool.is_some_and(|current| current != key) {
            // Lost the proximity-out of the previous tool.
            self.proximity_out(tools, parents, cx);
        }
        if self.renderer.is_none() {
            let renderer = cx.host.create_renderer();
            self.renderer = Some(renderer);
            if let Some(role) = self
                .cursor
                .as_ref()
                .and_then(|held| cx.cursors.get_mut(held.surface.id))
            {
                role.set_renderer(Some(renderer), &mut *cx.host);
            }
        }
        let (device, capabilities) = (self.device.id, self.device.axes);
        let tool = tools.entry(key).or_insert_with(|| {
            tracing::info!(tool = ?key, ?device, "tool added");
            Tool::new(key, capabilities, device)
        });
        tool.tablet = device;
        self.tool = Some(key);
        tracing::debug!(?device, tool = ?key, "proximity in");
    }

    fn proximity_out(&mut self, tools: &mut Tools, parents: &[Resource], cx: &mut Context) {
        let tool = self.current_tool(tools);
        self.set_focus(None, tool, parents, cx);
        if let Some(tool) = self.current_tool(tools) {
            tool.pressed = Buttons::empty();
        }
        tracing::debug!(device = ?self.device.id, tool = ?self.tool, "proximity out");
        self.tool = None;
        self.update_cursor(cx);
        self.release_renderer(cx);
    }

    fn release_renderer(&mut self, cx: &mut Context) {
        let Some(renderer) = self.renderer.take() else {
            return;
        };
        if let Some(role) = self
            .cursor
            .as_ref()
            .and_then(|held| cx.cursors.get_mut(held.surface.id))
        {
            if role.renderer() == Some(renderer) {
                role.set_renderer(None, &mut *cx.host);
            }
        }
        cx.host.destroy_renderer(renderer);
    }

    /// Deliver an event to the focused client.
    pub(crate) fn handle_event(
        &mut self,
        event: &InputEvent,
        tools: &mut Tools,
        parents: &[Resource],
        cx: &mut Context,
    ) -> Propagation {
        self.time = event.time;
        match event.kind {
            // Focus waits for the first motion.
            EventKind::ProximityIn { .. } => {}
            EventKind::ProximityOut => {
                let tool = self.current_tool(tools);
                self.set_focus(None, tool, parents, cx);
            }
            EventKind::Motion { position, axes } => {
                let tool = self.current_tool(tools).map(|tool| &*tool);
                self.notify_motion(position, axes.as_ref(), tool, cx);
            }
            EventKind::Button { button, state } => {
                let tool = self.current_tool(tools).map(|tool| &*tool);
                self.notify_button(button, state.is_pressed(), tool, cx);
            }
            EventKind::Scroll { .. } => return Propagation::Propagate,
        }
        Propagation::Stop
    }

    fn notify_motion(
        &self,
        position: [f64; 2],
        axes: Option<&Axes>,
        tool: Option<&Tool>,
        cx: &mut Context,
    ) {
        let Some(held) = &self.focus else {
            return;
        };
        let [x, y] = cx.host.surface_local(&held.surface, position);
        let scale = f64::from(held.surface.scale.max(1));
        let time = self.time;
        self.deliver(
            tool,
            &Notification::Motion {
                time,
                position: [x / scale, y / scale],
            },
            cx,
        );
        let Some(axes) = axes else {
            return;
        };
        let capabilities = tool.map_or(Capabilities::empty(), Tool::capabilities);
        if capabilities.contains(Capabilities::PRESSURE) {
            if let Some(value) = axes.pressure.get() {
                self.deliver(tool, &Notification::Pressure { time, value }, cx);
            }
        }
        if capabilities.contains(Capabilities::DISTANCE) {
            if let Some(value) = axes.distance.get() {
                self.deliver(tool, &Notification::Distance { time, value }, cx);
            }
        }
        if capabilities.contains(Capabilities::TILT) {
            if let Some(value) = axes.tilt {
                self.deliver(tool, &Notification::Tilt { time, value }, cx);
            }
        }
        self.deliver(tool, &Notification::Frame { time }, cx);
    }

    fn notify_button(&mut self, button: u32, pressed: bool, tool: Option<&Tool>, cx: &mut Context) {
        if self.focus.is_none() {
            return;
        }
        let time = self.time;
        let notification = match (button, pressed) {
            (PRIMARY_BUTTON, true) => {
                self.down_serial = cx.host.next_serial();
                Notification::Down {
                    serial: self.down_serial,
                    time,
                }
            }
            (PRIMARY_BUTTON, false) => Notification::Up { time },
            _ => {
                self.button_serial = cx.host.next_serial();
                Notification::Button {
                    serial: self.button_serial,
                    time,
                    button,
                    pressed,
                }
            }
        };
        self.deliver(tool, &notification, cx);
    }

    /// A client asking for a cursor surface while focused.
    ///
    /// Requests from unfocused clients, with a stale serial, or without a tool in proximity
    /// are ignored.
    pub(crate) fn set_cursor_request(
        &mut self,
        requester: &Resource,
        serial: Serial,
        surface: Option<Surface>,
        hotspot: [i32; 2],
        cx: &mut Context,
    ) -> Result<(), RequestError> {
        let Some(held) = &self.focus else {
            tracing::debug!(device = ?self.device.id, "set_cursor without focus");
            return Ok(());
        };
        let Some(renderer) = self.renderer else {
            return Ok(());
        };
        if held.surface.client != requester.client {
            tracing::debug!(
                device = ?self.device.id,
                client = ?requester.client,
                "set_cursor from unfocused client"
            );
            return Ok(());
        }
        if !serial.is_fresh_against(self.proximity_serial) {
            tracing::debug!(
                device = ?self.device.id,
                serial = serial.0,
                latest = self.proximity_serial.0,
                "stale set_cursor serial"
            );
            return Ok(());
        }
        if let Some(surface) = &surface {
            if cx.host.assign_role(surface.id, Role::TabletCursor).is_err() {
                cx.host.post_error(
                    requester.id,
                    ROLE_ERROR,
                    format!("wl_surface@{} already has a different role", surface.resource.0),
                );
                return Err(RequestError::RoleConflict {
                    surface: surface.id,
                });
            }
            let role = cx.cursors.ensure(*surface);
            role.set_renderer(Some(renderer), &mut *cx.host);
            role.set_hotspot(hotspot, &mut *cx.host);
        }
        self.set_cursor_surface(surface, cx);
        Ok(())
    }

    pub(crate) fn set_cursor_surface(&mut self, surface: Option<Surface>, cx: &mut Context) {
        let unchanged = match (&self.cursor, &surface) {
            (Some(held), Some(surface)) => held.surface.is(surface),
            (None, None) => true,
            _ => false,
        };
        if unchanged {
            return;
        }
        if let Some(old) = self.cursor.take() {
            cx.watches.cancel(old.watch);
        }
        if let Some(surface) = surface {
            let watch = cx.watches.watch(surface.id, Watcher::Cursor(self.device.id));
            self.cursor = Some(Held { surface, watch });
        }
        tracing::debug!(
            device = ?self.device.id,
            surface = ?surface.map(|s| s.id),
            "cursor surface set"
        );
        self.update_cursor(cx);
    }

    /// Whether `surface` is shown as this tablet's cursor.
    pub(crate) fn shows_cursor(&self, surface: SurfaceId) -> bool {
        self.cursor.as_ref().is_some_and(|held| held.surface.id == surface)
    }

    /// Push the appropriate image to the renderer.
    ///
    /// A cursor surface is only shown over surfaces of the client that set it.
    pub(crate) fn update_cursor(&self, cx: &mut Context) {
        let Some(renderer) = self.renderer else {
            return;
        };
        let image = match (&self.tool, &self.current, &self.cursor) {
            (None, _, _) => None,
            (Some(_), Some(current), Some(held)) if current.client == held.surface.client => {
                cx.cursors
                    .get(held.surface.id)
                    .filter(|role| role.has_buffer())
                    .map(|role| CursorImage::Sprite(*role.sprite()))
            }
            (Some(_), _, _) => Some(CursorImage::Theme(cx.config.fallback_cursor)),
        };
        cx.host.set_cursor(renderer, image.as_ref());
    }

    pub(crate) fn update_cursor_position(&mut self, position: [f64; 2], cx: &mut Context) {
        self.position = position;
        let Some(renderer) = self.renderer else {
            return;
        };
        cx.host.set_position(renderer, position);
        if let Some(role) = self
            .cursor
            .as_ref()
            .and_then(|held| cx.cursors.get_mut(held.surface.id))
        {
            role.prepare_at(position, &*cx.host);
            self.update_cursor(cx);
        }
    }

    /// A watched surface is going away.
    pub(crate) fn surface_destroyed(
        &mut self,
        watcher: Watcher,
        tools: &mut Tools,
        parents: &[Resource],
        cx: &mut Context,
    ) {
        match watcher {
            Watcher::Focus(_) => {
                if let (Some(current), Some(focus)) = (self.current, self.focus().copied()) {
                    if current.is(&focus) {
                        self.current = None;
                    }
                }
                let tool = self.current_tool(tools);
                self.set_focus(None, tool, parents, cx);
            }
            Watcher::Cursor(_) => self.set_cursor_surface(None, cx),
        }
    }

    /// Unwind everything and invalidate all resources.
    pub(crate) fn destroy(mut self, tools: &mut Tools, parents: &[Resource], cx: &mut Context) {
        tracing::info!(device = ?self.device.id, name = %self.device.name, "tablet removed");
        let tool = self.current_tool(tools);
        self.set_focus(None, tool, parents, cx);
        self.set_cursor_surface(None, cx);
        self.tool = None;
        if let Some(renderer) = self.renderer {
            cx.host.set_cursor(renderer, None);
        }
        self.release_renderer(cx);
        for resource in self.resources.drain() {
            cx.remove_resource(&resource);
        }
    }
}
