//! # Wire protocol revisions
//!
//! Two revisions of the tablet protocol can be served side by side. They differ in which
//! object carries the focus event stream:
//!
//! * [`Revision::Legacy`]: the early experimental `wl_tablet`. Events go on the *tablet*
//!   resource, naming the tool, and every event carries a timestamp.
//! * [`Revision::UnstableV1`]: `zwp_tablet_v1`. Events go on the *tool* resource, naming
//!   the tablet, and only `frame` is timestamped.
//!
//! The state machine speaks only in [`Notification`]s and the [`Serializer`] of the receiving
//! resource's revision turns those into [`Message`]s.

use enum_dispatch::enum_dispatch;
use smallvec::SmallVec;

use crate::{
    compositor::{ResourceId, Serial},
    device::Device,
    resource::Resource,
    tool::Tool,
};

/// A wire message. This crate never sends file descriptors.
pub type Message = wayland_backend::protocol::Message<ResourceId, std::convert::Infallible>;
pub type Argument = wayland_backend::protocol::Argument<ResourceId, std::convert::Infallible>;
pub(crate) type Messages = SmallVec<[Message; 4]>;

/// Build a [`Message`] with inline arguments.
macro_rules! message {
    ($sender:expr, $opcode:expr $(, $arg:expr)* $(,)?) => {
        $crate::protocol::Message {
            sender_id: $sender,
            opcode: $opcode,
            args: ::smallvec::smallvec![$($arg),*],
        }
    };
}
pub(crate) use message;

#[cfg(legacy_tablet)]
pub mod legacy;
#[cfg(unstable_tablet)]
pub mod unstable;

/// A NUL-free string argument.
pub(crate) fn string(text: &str) -> Argument {
    let text = std::ffi::CString::new(text.replace('\0', "")).unwrap_or_default();
    Argument::Str(Some(Box::new(text)))
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::AsRefStr, strum::EnumIter)]
pub enum Revision {
    Legacy,
    UnstableV1,
}
impl Revision {
    /// Revisions built into this crate.
    pub fn iter_compiled() -> impl Iterator<Item = Self> {
        <Self as strum::IntoEnumIterator>::iter().filter(|revision| revision.is_compiled())
    }
    #[must_use]
    pub fn is_compiled(self) -> bool {
        match self {
            Self::Legacy => cfg!(legacy_tablet),
            Self::UnstableV1 => cfg!(unstable_tablet),
        }
    }
    /// Highest version of the manager global served.
    #[must_use]
    #[allow(clippy::unused_self)]
    pub fn version(self) -> u32 {
        1
    }
    /// The object kind focus events are sent on.
    #[must_use]
    pub fn carrier(self) -> ObjectKind {
        match self {
            Self::Legacy => ObjectKind::Tablet,
            Self::UnstableV1 => ObjectKind::Tool,
        }
    }
    pub(crate) fn serializer(self) -> ProtocolSerializer {
        match self {
            #[cfg(legacy_tablet)]
            Self::Legacy => legacy::Legacy.into(),
            #[cfg(unstable_tablet)]
            Self::UnstableV1 => unstable::UnstableV1.into(),
            // Resources can only be created for compiled revisions.
            #[allow(unreachable_patterns)]
            _ => not_compiled(self),
        }
    }
}

#[cold]
fn not_compiled(revision: Revision) -> ! {
    panic!("{} support was not compiled in", revision.as_ref())
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    Manager,
    Seat,
    Tablet,
    Tool,
}

/// Every interface served, across revisions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::AsRefStr, strum::IntoStaticStr)]
pub enum Interface {
    #[strum(serialize = "wl_tablet_manager")]
    LegacyManager,
    #[strum(serialize = "wl_tablet")]
    LegacyTablet,
    #[strum(serialize = "wl_tablet_tool")]
    LegacyTool,
    #[strum(serialize = "zwp_tablet_manager_v1")]
    UnstableManager,
    #[strum(serialize = "zwp_tablet_seat_v1")]
    UnstableSeat,
    #[strum(serialize = "zwp_tablet_v1")]
    UnstableTablet,
    #[strum(serialize = "zwp_tablet_tool_v1")]
    UnstableTool,
}
impl Interface {
    /// The protocol name, e.g. `zwp_tablet_v1`.
    #[must_use]
    pub fn name(self) -> &'static str {
        self.into()
    }
    #[must_use]
    pub fn revision(self) -> Revision {
        match self {
            Self::LegacyManager | Self::LegacyTablet | Self::LegacyTool => Revision::Legacy,
            Self::UnstableManager
            | Self::UnstableSeat
            | Self::UnstableTablet
            | Self::UnstableTool => Revision::UnstableV1,
        }
    }
    #[must_use]
    pub fn kind(self) -> ObjectKind {
        match self {
            Self::LegacyManager | Self::UnstableManager => ObjectKind::Manager,
            Self::UnstableSeat => ObjectKind::Seat,
            Self::LegacyTablet | Self::UnstableTablet => ObjectKind::Tablet,
            Self::LegacyTool | Self::UnstableTool => ObjectKind::Tool,
        }
    }
    /// Whether tablets and tools are announced on this interface.
    #[must_use]
    pub fn is_parent(self) -> bool {
        matches!(self, Self::LegacyManager | Self::UnstableSeat)
    }
    /// The global for a revision.
    #[must_use]
    pub fn manager(revision: Revision) -> Self {
        match revision {
            Revision::Legacy => Self::LegacyManager,
            Revision::UnstableV1 => Self::UnstableManager,
        }
    }
    #[must_use]
    pub fn tablet(revision: Revision) -> Self {
        match revision {
            Revision::Legacy => Self::LegacyTablet,
            Revision::UnstableV1 => Self::UnstableTablet,
        }
    }
    #[must_use]
    pub fn tool(revision: Revision) -> Self {
        match revision {
            Revision::Legacy => Self::LegacyTool,
            Revision::UnstableV1 => Self::UnstableTool,
        }
    }
}

/// State machine output, before serialization.
///
/// Focus events name the *counterpart* object (the tool on a legacy tablet resource, the tablet
/// on an unstable tool resource) which is supplied separately to [`Serializer::notify`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum Notification {
    ProximityIn {
        serial: Serial,
        time: u32,
        surface: ResourceId,
    },
    ProximityOut {
        time: u32,
    },
    Down {
        serial: Serial,
        time: u32,
    },
    Up {
        time: u32,
    },
    /// Surface-local, scale-adjusted.
    Motion {
        time: u32,
        position: [f64; 2],
    },
    Pressure {
        time: u32,
        value: f32,
    },
    Distance {
        time: u32,
        value: f32,
    },
    Tilt {
        time: u32,
        value: [f32; 2],
    },
    Button {
        serial: Serial,
        time: u32,
        button: u32,
        pressed: bool,
    },
    Frame {
        time: u32,
    },
}

/// A decoded client request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Request {
    /// `set_cursor` on a tablet (legacy) or a tool.
    SetCursor {
        serial: Serial,
        surface: Option<ResourceId>,
        hotspot: [i32; 2],
        /// The tablet named by a legacy tool's request.
        tablet: Option<ResourceId>,
    },
    /// `zwp_tablet_manager_v1.get_tablet_seat`.
    GetTabletSeat { id: ResourceId, seat: ResourceId },
    /// Any of the destructor requests.
    Destroy,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("{interface} has no request with opcode {opcode}")]
    UnknownOpcode {
        interface: &'static str,
        opcode: u16,
    },
    #[error("malformed arguments to {interface} request {opcode}")]
    BadArguments {
        interface: &'static str,
        opcode: u16,
    },
}

/// Turns state machine output into the messages of one revision, and back again for requests.
#[enum_dispatch]
pub(crate) trait Serializer {
    /// Sent on a freshly bound manager.
    fn manager_bound(&self, manager: &Resource, seat: Option<ResourceId>) -> Messages;
    /// Announce a new tablet resource on `parent`. Includes the tablet's static details.
    fn tablet_added(&self, parent: &Resource, tablet: &Resource, device: &Device) -> Messages;
    /// Announce a new tool resource on `parent`. Includes the tool's static details.
    fn tool_added(&self, parent: &Resource, tool: &Resource, details: &Tool) -> Messages;
    /// The final event on a tablet or tool resource being invalidated, if it has one.
    fn removed(&self, resource: &Resource) -> Option<Message>;
    /// Serialize a focus event for `receiver`. `None` if the receiver does not carry this
    /// notification, or it names a required counterpart the client never got.
    fn notify(
        &self,
        receiver: &Resource,
        counterpart: Option<ResourceId>,
        notification: &Notification,
    ) -> Option<Message>;
    /// Decode a request sent on a resource of this revision.
    fn decode(&self, receiver: &Resource, message: &Message) -> Result<Request, DecodeError>;
}

#[enum_dispatch(Serializer)]
pub(crate) enum ProtocolSerializer {
    #[cfg(legacy_tablet)]
    Legacy(legacy::Legacy),
    #[cfg(unstable_tablet)]
    UnstableV1(unstable::UnstableV1),
}
