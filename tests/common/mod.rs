//! A recording compositor to drive `TabletManager` with.
#![allow(dead_code)]

use std::collections::{HashMap, HashSet};

use octoseat::{
    compositor::{
        BufferId, ClientId, CursorBackend, DeviceId, EventRoute, RendererId, ResourceId, Role,
        RoleConflict, Scene, Serial, Surface, SurfaceId, SurfaceRoles, Transport,
    },
    cursor::{CursorImage, CursorSprite},
    device::{Device, DeviceMode, DeviceType},
    events::{Axes, ButtonState, EventKind, InputEvent, NicheF32, Propagation},
    protocol::{Argument, Interface, Message},
    tool::{Capabilities, ToolDescriptor, Type},
    TabletManager,
};

pub const WACOM: DeviceId = DeviceId(1);
pub const HUION: DeviceId = DeviceId(2);
pub const PEN: ToolDescriptor = ToolDescriptor {
    serial: 0x0000_0001_0000_0abc,
    tool_type: Type::Pen,
};

#[derive(Clone, Debug, PartialEq)]
pub enum CursorCall {
    Create(RendererId),
    Destroy(RendererId),
    Set(RendererId, Option<CursorImage>),
    Position(RendererId, [f64; 2]),
    Realize(RendererId, BufferId),
    Update(RendererId),
}

#[derive(Debug, Default)]
pub struct Mock {
    next_id: u64,
    serial: u32,
    next_renderer: u64,
    pub sent: Vec<Message>,
    pub created: Vec<(ResourceId, ClientId, Interface)>,
    pub destroyed: Vec<ResourceId>,
    pub errors: Vec<(ResourceId, u32, String)>,
    pub seats: HashMap<ClientId, ResourceId>,
    pub surfaces: HashMap<(ClientId, ResourceId), Surface>,
    /// What `surface_at` returns outside of `layout`.
    pub under: Option<Surface>,
    /// `[x, y, width, height]` stage rectangles, searched before `under`.
    pub layout: Vec<([f64; 4], Surface)>,
    pub route: EventRoute,
    pub roles: HashMap<SurfaceId, Role>,
    /// Surfaces holding some role this crate doesn't know about.
    pub foreign_roles: HashSet<SurfaceId>,
    pub cursor: Vec<CursorCall>,
    pub renderers: HashSet<RendererId>,
}

impl Mock {
    pub fn new() -> Self {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
        Self {
            next_id: 1000,
            ..Self::default()
        }
    }
    /// A client surface known to the scene.
    pub fn add_surface(&mut self, client: ClientId, id: u64) -> Surface {
        let surface = Surface {
            id: SurfaceId(id),
            client,
            resource: ResourceId(id + 500),
            scale: 1,
        };
        self.surfaces.insert((client, surface.resource), surface);
        surface
    }
    /// Drain everything sent so far.
    pub fn take(&mut self) -> Vec<Message> {
        std::mem::take(&mut self.sent)
    }
    /// Server-created objects of an interface for a client, in creation order.
    pub fn created_of(&self, client: ClientId, interface: Interface) -> Vec<ResourceId> {
        self.created
            .iter()
            .filter(|(_, c, i)| *c == client && *i == interface)
            .map(|(id, _, _)| *id)
            .collect()
    }
    pub fn last_cursor_image(&self) -> Option<Option<CursorImage>> {
        self.cursor.iter().rev().find_map(|call| match call {
            CursorCall::Set(_, image) => Some(*image),
            _ => None,
        })
    }
}

impl Transport for Mock {
    fn next_serial(&mut self) -> Serial {
        self.serial = self.serial.wrapping_add(1);
        Serial(self.serial)
    }
    fn create_resource(
        &mut self,
        client: ClientId,
        interface: Interface,
        _version: u32,
    ) -> ResourceId {
        let id = ResourceId(self.next_id);
        self.next_id += 1;
        self.created.push((id, client, interface));
        id
    }
    fn destroy_resource(&mut self, resource: ResourceId) {
        self.destroyed.push(resource);
    }
    fn send(&mut self, message: Message) {
        self.sent.push(message);
    }
    fn post_error(&mut self, resource: ResourceId, code: u32, message: String) {
        self.errors.push((resource, code, message));
    }
    fn seat_resource(&self, client: ClientId) -> Option<ResourceId> {
        self.seats.get(&client).copied()
    }
}

impl Scene for Mock {
    fn event_route(&self) -> EventRoute {
        self.route
    }
    fn surface_at(&self, [x, y]: [f64; 2]) -> Option<Surface> {
        self.layout
            .iter()
            .find(|([left, top, width, height], _)| {
                (*left..left + width).contains(&x) && (*top..top + height).contains(&y)
            })
            .map(|(_, surface)| *surface)
            .or(self.under)
    }
    /// Surfaces sit at (100, 100).
    fn surface_local(&self, _surface: &Surface, position: [f64; 2]) -> [f64; 2] {
        [position[0] - 100.0, position[1] - 100.0]
    }
    fn surface_from_resource(&self, client: ClientId, resource: ResourceId) -> Option<Surface> {
        self.surfaces.get(&(client, resource)).copied()
    }
}

impl SurfaceRoles for Mock {
    fn assign_role(&mut self, surface: SurfaceId, role: Role) -> Result<(), RoleConflict> {
        if self.foreign_roles.contains(&surface) {
            return Err(RoleConflict);
        }
        match self.roles.insert(surface, role) {
            Some(old) if old != role => Err(RoleConflict),
            _ => Ok(()),
        }
    }
}

impl CursorBackend for Mock {
    fn create_renderer(&mut self) -> RendererId {
        self.next_renderer += 1;
        let renderer = RendererId(self.next_renderer);
        self.renderers.insert(renderer);
        self.cursor.push(CursorCall::Create(renderer));
        renderer
    }
    fn destroy_renderer(&mut self, renderer: RendererId) {
        assert!(self.renderers.remove(&renderer), "renderer destroyed twice");
        self.cursor.push(CursorCall::Destroy(renderer));
    }
    fn set_cursor(&mut self, renderer: RendererId, image: Option<&CursorImage>) {
        assert!(self.renderers.contains(&renderer), "set_cursor on dead renderer");
        self.cursor.push(CursorCall::Set(renderer, image.copied()));
    }
    fn set_position(&mut self, renderer: RendererId, position: [f64; 2]) {
        self.cursor.push(CursorCall::Position(renderer, position));
    }
    fn realize_from_buffer(
        &mut self,
        renderer: RendererId,
        _sprite: &CursorSprite,
        buffer: BufferId,
    ) {
        self.cursor.push(CursorCall::Realize(renderer, buffer));
    }
    fn force_update(&mut self, renderer: RendererId) {
        self.cursor.push(CursorCall::Update(renderer));
    }
}

pub fn wacom() -> Device {
    Device {
        id: WACOM,
        name: "Wacom Pen".into(),
        vendor_id: "056a".into(),
        product_id: "0302".into(),
        device_type: DeviceType::Pen,
        mode: DeviceMode::Physical,
        axes: Capabilities::all(),
    }
}

/// A second tablet, with pressure only.
pub fn huion() -> Device {
    Device {
        id: HUION,
        name: "Huion Kamvas".into(),
        vendor_id: "256c".into(),
        product_id: "006d".into(),
        device_type: DeviceType::Pen,
        mode: DeviceMode::Physical,
        axes: Capabilities::PRESSURE,
    }
}

/// The same event, reported by `device`.
pub fn on(device: DeviceId, event: InputEvent) -> InputEvent {
    InputEvent { device, ..event }
}

pub fn event(time: u32, kind: EventKind) -> InputEvent {
    InputEvent {
        device: WACOM,
        time,
        kind,
    }
}

pub fn proximity_in(time: u32) -> InputEvent {
    proximity_in_with(time, PEN)
}
pub fn proximity_in_with(time: u32, tool: ToolDescriptor) -> InputEvent {
    event(time, EventKind::ProximityIn { tool })
}
pub fn proximity_out(time: u32) -> InputEvent {
    event(time, EventKind::ProximityOut)
}
pub fn motion(time: u32, position: [f64; 2]) -> InputEvent {
    event(
        time,
        EventKind::Motion {
            position,
            axes: None,
        },
    )
}
pub fn motion_with_pressure(time: u32, position: [f64; 2], pressure: f32) -> InputEvent {
    event(
        time,
        EventKind::Motion {
            position,
            axes: Some(Axes {
                pressure: NicheF32::new_some(pressure).unwrap(),
                ..Axes::default()
            }),
        },
    )
}
pub fn button(time: u32, button: u32, pressed: bool) -> InputEvent {
    let state = if pressed {
        ButtonState::Pressed
    } else {
        ButtonState::Released
    };
    event(time, EventKind::Button { button, state })
}

/// `update` then `handle_event`, as the input pipeline would.
pub fn drive(manager: &mut TabletManager, mock: &mut Mock, event: InputEvent) {
    manager.update(&event, mock);
    assert_eq!(manager.handle_event(&event, mock), Propagation::Stop);
}

/// `(sender, opcode)` of each message.
pub fn summary(messages: &[Message]) -> Vec<(ResourceId, u16)> {
    messages.iter().map(|m| (m.sender_id, m.opcode)).collect()
}

pub fn request(sender: ResourceId, opcode: u16, args: Vec<Argument>) -> Message {
    Message {
        sender_id: sender,
        opcode,
        args: args.into_iter().collect(),
    }
}

pub fn uint(arg: &Argument) -> u32 {
    match arg {
        Argument::Uint(value) => *value,
        other => panic!("expected uint, got {other:?}"),
    }
}
pub fn object(arg: &Argument) -> ResourceId {
    match arg {
        Argument::Object(id) | Argument::NewId(id) => *id,
        other => panic!("expected object, got {other:?}"),
    }
}
pub fn fixed(arg: &Argument) -> f64 {
    match arg {
        Argument::Fixed(value) => octoseat::from_fixed(*value),
        other => panic!("expected fixed, got {other:?}"),
    }
}
