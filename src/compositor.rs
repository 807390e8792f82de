//! # The host compositor
//!
//! This crate owns tablet bookkeeping and nothing else. Picking, cursor painting, the wire
//! transport and the surface role system belong to the display server it is embedded in,
//! which describes them to us through the traits in this module.
//!
//! Every entry point on [`TabletManager`](crate::TabletManager) takes a `&mut dyn Compositor`.
//! [`Compositor`] is implemented automatically for anything implementing all four pieces.
//!
//! All IDs here are opaque handles minted by the host. They are only ever compared, never
//! interpreted.

use crate::{
    cursor::{CursorImage, CursorSprite},
    protocol::{Interface, Message},
};

macro_rules! opaque_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
        pub struct $name(pub u64);
    };
}

opaque_id!(
    /// A connected client.
    ClientId
);
opaque_id!(
    /// A protocol object living on some client's connection.
    ///
    /// [`ResourceId::NULL`] is how the transport spells a null object argument.
    ResourceId
);
opaque_id!(
    /// A `wl_surface`, independent of which resource refers to it.
    SurfaceId
);
opaque_id!(
    /// An input device as enumerated by the input subsystem.
    DeviceId
);
opaque_id!(
    /// A buffer attached to a surface. Doubles as the texture key handed to the cursor backend.
    BufferId
);
opaque_id!(
    /// One on-screen cursor.
    RendererId
);

impl ResourceId {
    pub const NULL: ResourceId = ResourceId(0);
    /// `None` for the null object.
    #[must_use]
    pub fn non_null(self) -> Option<Self> {
        (self != Self::NULL).then_some(self)
    }
}

/// A serial from the display-wide monotonic allocator.
#[derive(Clone, Copy, Debug, Default, Hash, PartialEq, Eq)]
pub struct Serial(pub u32);
impl Serial {
    /// Whether a serial quoted back by a client is no older than `latest` by more than
    /// half of the serial space. Serials ahead of `latest` wrap around to "ancient".
    #[must_use]
    pub fn is_fresh_against(self, latest: Serial) -> bool {
        latest.0.wrapping_sub(self.0) <= u32::MAX / 2
    }
}
impl From<u32> for Serial {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

/// A client surface as seen by the scene graph.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Surface {
    pub id: SurfaceId,
    /// Owning client.
    pub client: ClientId,
    /// The `wl_surface` resource, on the owning client's connection.
    pub resource: ResourceId,
    /// Integer buffer scale.
    pub scale: i32,
}
impl Surface {
    /// Same underlying surface, regardless of its current scale.
    #[must_use]
    pub fn is(&self, other: &Surface) -> bool {
        self.id == other.id
    }
}

/// Which consumer the display is currently routing input to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, strum::AsRefStr)]
pub enum EventRoute {
    #[default]
    Normal,
    WaylandPopup,
    /// An interactive move/resize.
    WindowOp,
    CompositorGrab,
    /// A click on server-side decorations.
    FrameButton,
}
impl EventRoute {
    /// Compositor-level grabs always win over client focus.
    #[must_use]
    pub fn is_grab(self) -> bool {
        matches!(self, Self::WindowOp | Self::CompositorGrab | Self::FrameButton)
    }
}

/// Roles this crate hands out.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::AsRefStr)]
pub enum Role {
    TabletCursor,
}

/// The surface already holds some other role.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("surface already has a different role")]
pub struct RoleConflict;

/// Resource transport. Framing, connection handling and serial allocation live behind this.
pub trait Transport {
    fn next_serial(&mut self) -> Serial;
    /// Create a server-initiated object (a `new_id` argument of an event).
    fn create_resource(&mut self, client: ClientId, interface: Interface, version: u32)
        -> ResourceId;
    fn destroy_resource(&mut self, resource: ResourceId);
    fn send(&mut self, message: Message);
    /// Post a fatal protocol error, terminating the client.
    fn post_error(&mut self, resource: ResourceId, code: u32, message: String);
    /// The client's `wl_seat` our seat is associated with, if it bound one.
    fn seat_resource(&self, client: ClientId) -> Option<ResourceId>;
}

/// Scene graph queries.
pub trait Scene {
    fn event_route(&self) -> EventRoute;
    /// The client surface at a stage position, if any.
    fn surface_at(&self, position: [f64; 2]) -> Option<Surface>;
    /// Transform a stage position into the surface actor's local, unscaled coordinates.
    fn surface_local(&self, surface: &Surface, position: [f64; 2]) -> [f64; 2];
    /// Resolve a `wl_surface` argument sent by `client`.
    fn surface_from_resource(&self, client: ClientId, resource: ResourceId) -> Option<Surface>;
    /// Scale of the monitor containing `position`.
    fn monitor_scale_at(&self, _position: [f64; 2]) -> f32 {
        1.0
    }
    /// Whether the surface belongs to the X11 compatibility layer, whose cursors are
    /// already scaled.
    fn is_xwayland(&self, _surface: &Surface) -> bool {
        false
    }
}

/// The surface role system.
pub trait SurfaceRoles {
    /// Give `surface` a role. Assigning the role it already has succeeds.
    #[allow(clippy::missing_errors_doc)]
    fn assign_role(&mut self, surface: SurfaceId, role: Role) -> Result<(), RoleConflict>;
}

/// Cursor painting.
pub trait CursorBackend {
    fn create_renderer(&mut self) -> RendererId;
    fn destroy_renderer(&mut self, renderer: RendererId);
    /// Show `image`, or hide the cursor for `None`.
    fn set_cursor(&mut self, renderer: RendererId, image: Option<&CursorImage>);
    fn set_position(&mut self, renderer: RendererId, position: [f64; 2]);
    /// Import `buffer` as the texture of `sprite`.
    fn realize_from_buffer(
        &mut self,
        renderer: RendererId,
        sprite: &CursorSprite,
        buffer: BufferId,
    );
    fn force_update(&mut self, renderer: RendererId);
}

/// Everything the host provides.
pub trait Compositor: Transport + Scene + SurfaceRoles + CursorBackend {}
impl<T: Transport + Scene + SurfaceRoles + CursorBackend + ?Sized> Compositor for T {}
