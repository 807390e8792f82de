//! # `wl_tablet`
//!
//! The early experimental revision. No published XML exists for it, so its layout is defined
//! here:
//!
//! ```text
//! wl_tablet_manager
//!   event 0  seat(object wl_seat)
//!   event 1  device_added(new_id wl_tablet, string name, uint vid, uint pid, uint type)
//!   event 2  tool_added(new_id wl_tablet_tool)
//! wl_tablet
//!   request 0  set_cursor(uint serial, object? wl_surface, int hotspot_x, int hotspot_y)
//!   request 1  release()
//!   event 0   proximity_in(uint serial, uint time, object wl_tablet_tool, object wl_surface)
//!   event 1   proximity_out(uint time)
//!   event 2   motion(uint time, fixed x, fixed y)
//!   event 3   down(uint serial, uint time)
//!   event 4   up(uint time)
//!   event 5   pressure(uint time, fixed value)
//!   event 6   distance(uint time, fixed value)
//!   event 7   tilt(uint time, fixed x, fixed y)
//!   event 8   button(uint serial, uint time, uint button, uint state)
//!   event 9   frame(uint time)
//!   event 10  removed()
//! wl_tablet_tool
//!   request 0  set_cursor(uint serial, object? wl_surface, int hotspot_x, int hotspot_y, object? wl_tablet)
//!   request 1  destroy()
//!   event 0   type(uint)
//!   event 1   serial(uint hi, uint lo)
//!   event 2   capability(uint bitfield)
//!   event 3   done()
//!   event 4   removed()
//! ```
//!
//! Axis values are normalized to `[0, 65535]` (tilt `[-65535, 65535]`) and sent as fixed point.
//! A `vid`/`pid` that failed to parse is sent as zero.

use smallvec::smallvec;

use super::{
    string, Argument, DecodeError, Interface, Message, Messages, Notification, Request, Serializer,
};
use crate::{
    compositor::{ResourceId, Serial},
    device::Device,
    resource::Resource,
    tool::Tool,
    util::{scale_signed, scale_unsigned, to_fixed},
};

/// Opcodes of the legacy interfaces.
pub mod opcode {
    pub mod manager {
        pub const EVT_SEAT: u16 = 0;
        pub const EVT_DEVICE_ADDED: u16 = 1;
        pub const EVT_TOOL_ADDED: u16 = 2;
    }
    pub mod tablet {
        pub const REQ_SET_CURSOR: u16 = 0;
        pub const REQ_RELEASE: u16 = 1;

        pub const EVT_PROXIMITY_IN: u16 = 0;
        pub const EVT_PROXIMITY_OUT: u16 = 1;
        pub const EVT_MOTION: u16 = 2;
        pub const EVT_DOWN: u16 = 3;
        pub const EVT_UP: u16 = 4;
        pub const EVT_PRESSURE: u16 = 5;
        pub const EVT_DISTANCE: u16 = 6;
        pub const EVT_TILT: u16 = 7;
        pub const EVT_BUTTON: u16 = 8;
        pub const EVT_FRAME: u16 = 9;
        pub const EVT_REMOVED: u16 = 10;
    }
    pub mod tool {
        pub const REQ_SET_CURSOR: u16 = 0;
        pub const REQ_DESTROY: u16 = 1;

        pub const EVT_TYPE: u16 = 0;
        pub const EVT_SERIAL: u16 = 1;
        pub const EVT_CAPABILITY: u16 = 2;
        pub const EVT_DONE: u16 = 3;
        pub const EVT_REMOVED: u16 = 4;
    }
}

/// Fixed point of a normalized axis. Full scale is well within the 24 bit integer part.
fn fixed_axis(value: u32) -> Argument {
    Argument::Fixed(to_fixed(f64::from(value)))
}
fn fixed_signed_axis(value: i32) -> Argument {
    Argument::Fixed(to_fixed(f64::from(value)))
}

pub(crate) struct Legacy;

impl Serializer for Legacy {
    fn manager_bound(&self, manager: &Resource, seat: Option<ResourceId>) -> Messages {
        seat.map(|seat| message!(manager.id, opcode::manager::EVT_SEAT, Argument::Object(seat)))
            .into_iter()
            .collect()
    }
    fn tablet_added(&self, parent: &Resource, tablet: &Resource, device: &Device) -> Messages {
        let usb_id = device.usb_id();
        smallvec![message!(
            parent.id,
            opcode::manager::EVT_DEVICE_ADDED,
            Argument::NewId(tablet.id),
            string(&device.name),
            Argument::Uint(usb_id.map_or(0, |id| id.vid)),
            Argument::Uint(usb_id.map_or(0, |id| id.pid)),
            Argument::Uint(0),
        )]
    }
    fn tool_added(&self, parent: &Resource, tool: &Resource, details: &Tool) -> Messages {
        let serial = details.descriptor().serial;
        #[allow(clippy::cast_possible_truncation)]
        let (hi, lo) = ((serial >> 32) as u32, serial as u32);
        smallvec![
            message!(parent.id, opcode::manager::EVT_TOOL_ADDED, Argument::NewId(tool.id)),
            message!(
                tool.id,
                opcode::tool::EVT_TYPE,
                Argument::Uint(details.descriptor().tool_type.code())
            ),
            message!(tool.id, opcode::tool::EVT_SERIAL, Argument::Uint(hi), Argument::Uint(lo)),
            message!(
                tool.id,
                opcode::tool::EVT_CAPABILITY,
                Argument::Uint(details.capabilities().bits())
            ),
            message!(tool.id, opcode::tool::EVT_DONE),
        ]
    }
    fn removed(&self, resource: &Resource) -> Option<Message> {
        match resource.interface {
            Interface::LegacyTablet => Some(message!(resource.id, opcode::tablet::EVT_REMOVED)),
            Interface::LegacyTool => Some(message!(resource.id, opcode::tool::EVT_REMOVED)),
            _ => None,
        }
    }
    fn notify(
        &self,
        receiver: &Resource,
        counterpart: Option<ResourceId>,
        notification: &Notification,
    ) -> Option<Message> {
        use opcode::tablet as op;
        if receiver.interface != Interface::LegacyTablet {
            return None;
        }
        let id = receiver.id;
        let message = match *notification {
            Notification::ProximityIn {
                serial: Serial(serial),
                time,
                surface,
            } => message!(
                id,
                op::EVT_PROXIMITY_IN,
                Argument::Uint(serial),
                Argument::Uint(time),
                Argument::Object(counterpart?),
                Argument::Object(surface),
            ),
            Notification::ProximityOut { time } => {
                message!(id, op::EVT_PROXIMITY_OUT, Argument::Uint(time))
            }
            Notification::Motion {
                time,
                position: [x, y],
            } => message!(
                id,
                op::EVT_MOTION,
                Argument::Uint(time),
                Argument::Fixed(to_fixed(x)),
                Argument::Fixed(to_fixed(y)),
            ),
            Notification::Down {
                serial: Serial(serial),
                time,
            } => message!(id, op::EVT_DOWN, Argument::Uint(serial), Argument::Uint(time)),
            Notification::Up { time } => message!(id, op::EVT_UP, Argument::Uint(time)),
            Notification::Pressure { time, value } => message!(
                id,
                op::EVT_PRESSURE,
                Argument::Uint(time),
                fixed_axis(scale_unsigned(value)),
            ),
            Notification::Distance { time, value } => message!(
                id,
                op::EVT_DISTANCE,
                Argument::Uint(time),
                fixed_axis(scale_unsigned(value)),
            ),
            Notification::Tilt {
                time,
                value: [x, y],
            } => message!(
                id,
                op::EVT_TILT,
                Argument::Uint(time),
                fixed_signed_axis(scale_signed(x)),
                fixed_signed_axis(scale_signed(y)),
            ),
            Notification::Button {
                serial: Serial(serial),
                time,
                button,
                pressed,
            } => message!(
                id,
                op::EVT_BUTTON,
                Argument::Uint(serial),
                Argument::Uint(time),
                Argument::Uint(button),
                Argument::Uint(u32::from(pressed)),
            ),
            Notification::Frame { time } => message!(id, op::EVT_FRAME, Argument::Uint(time)),
        };
        Some(message)
    }
    fn decode(&self, receiver: &Resource, message: &Message) -> Result<Request, DecodeError> {
        let interface = receiver.interface.name();
        let opcode = message.opcode;
        let bad = || DecodeError::BadArguments { interface, opcode };
        match (receiver.interface, opcode) {
            (Interface::LegacyTablet, opcode::tablet::REQ_SET_CURSOR) => {
                match message.args.as_slice() {
                    [
                        Argument::Uint(serial),
                        Argument::Object(surface),
                        Argument::Int(x),
                        Argument::Int(y),
                    ] => Ok(Request::SetCursor {
                        serial: Serial(*serial),
                        surface: surface.non_null(),
                        hotspot: [*x, *y],
                        tablet: None,
                    }),
                    _ => Err(bad()),
                }
            }
            (Interface::LegacyTool, opcode::tool::REQ_SET_CURSOR) => match message.args.as_slice() {
                [
                    Argument::Uint(serial),
                    Argument::Object(surface),
                    Argument::Int(x),
                    Argument::Int(y),
                    Argument::Object(tablet),
                ] => Ok(Request::SetCursor {
                    serial: Serial(*serial),
                    surface: surface.non_null(),
                    hotspot: [*x, *y],
                    tablet: tablet.non_null(),
                }),
                _ => Err(bad()),
            },
            (Interface::LegacyTablet, opcode::tablet::REQ_RELEASE)
            | (Interface::LegacyTool, opcode::tool::REQ_DESTROY) => {
                if message.args.is_empty() {
                    Ok(Request::Destroy)
                } else {
                    Err(bad())
                }
            }
            _ => Err(DecodeError::UnknownOpcode { interface, opcode }),
        }
    }
}
