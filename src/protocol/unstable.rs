//! # `tablet_unstable_v1`
//!
//! Opcodes and enum values come straight from the published protocol, via `wayland-protocols`.

use smallvec::{smallvec, SmallVec};
use wayland_protocols::wp::tablet::zv1::server::{
    zwp_tablet_manager_v1, zwp_tablet_seat_v1, zwp_tablet_tool_v1, zwp_tablet_v1,
};

use super::{
    string, Argument, DecodeError, Interface, Message, Messages, Notification, Request, Serializer,
};
use crate::{
    compositor::{ResourceId, Serial},
    device::Device,
    resource::Resource,
    tool::{Capabilities, Tool, Type},
    util::{scale_signed, scale_unsigned, to_fixed},
};

/// Opcodes of the unstable interfaces, re-exported under short names.
pub mod opcode {
    use super::{zwp_tablet_manager_v1, zwp_tablet_seat_v1, zwp_tablet_tool_v1, zwp_tablet_v1};

    pub mod manager {
        use super::zwp_tablet_manager_v1 as m;
        pub const REQ_GET_TABLET_SEAT: u16 = m::REQ_GET_TABLET_SEAT_OPCODE;
        pub const REQ_DESTROY: u16 = m::REQ_DESTROY_OPCODE;
    }
    pub mod seat {
        use super::zwp_tablet_seat_v1 as m;
        pub const REQ_DESTROY: u16 = m::REQ_DESTROY_OPCODE;
        pub const EVT_TABLET_ADDED: u16 = m::EVT_TABLET_ADDED_OPCODE;
        pub const EVT_TOOL_ADDED: u16 = m::EVT_TOOL_ADDED_OPCODE;
    }
    pub mod tablet {
        use super::zwp_tablet_v1 as m;
        pub const REQ_DESTROY: u16 = m::REQ_DESTROY_OPCODE;
        pub const EVT_NAME: u16 = m::EVT_NAME_OPCODE;
        pub const EVT_ID: u16 = m::EVT_ID_OPCODE;
        pub const EVT_DONE: u16 = m::EVT_DONE_OPCODE;
        pub const EVT_REMOVED: u16 = m::EVT_REMOVED_OPCODE;
    }
    pub mod tool {
        use super::zwp_tablet_tool_v1 as m;
        pub const REQ_SET_CURSOR: u16 = m::REQ_SET_CURSOR_OPCODE;
        pub const REQ_DESTROY: u16 = m::REQ_DESTROY_OPCODE;
        pub const EVT_TYPE: u16 = m::EVT_TYPE_OPCODE;
        pub const EVT_HARDWARE_SERIAL: u16 = m::EVT_HARDWARE_SERIAL_OPCODE;
        pub const EVT_CAPABILITY: u16 = m::EVT_CAPABILITY_OPCODE;
        pub const EVT_DONE: u16 = m::EVT_DONE_OPCODE;
        pub const EVT_REMOVED: u16 = m::EVT_REMOVED_OPCODE;
        pub const EVT_PROXIMITY_IN: u16 = m::EVT_PROXIMITY_IN_OPCODE;
        pub const EVT_PROXIMITY_OUT: u16 = m::EVT_PROXIMITY_OUT_OPCODE;
        pub const EVT_DOWN: u16 = m::EVT_DOWN_OPCODE;
        pub const EVT_UP: u16 = m::EVT_UP_OPCODE;
        pub const EVT_MOTION: u16 = m::EVT_MOTION_OPCODE;
        pub const EVT_PRESSURE: u16 = m::EVT_PRESSURE_OPCODE;
        pub const EVT_DISTANCE: u16 = m::EVT_DISTANCE_OPCODE;
        pub const EVT_TILT: u16 = m::EVT_TILT_OPCODE;
        pub const EVT_BUTTON: u16 = m::EVT_BUTTON_OPCODE;
        pub const EVT_FRAME: u16 = m::EVT_FRAME_OPCODE;
    }
}

fn wire_type(tool_type: Type) -> zwp_tablet_tool_v1::Type {
    use zwp_tablet_tool_v1::Type as Wire;
    match tool_type {
        Type::Pen => Wire::Pen,
        Type::Eraser => Wire::Eraser,
        Type::Brush => Wire::Brush,
        Type::Pencil => Wire::Pencil,
        Type::Airbrush => Wire::Airbrush,
        Type::Finger => Wire::Finger,
        Type::Mouse => Wire::Mouse,
        Type::Lens => Wire::Lens,
    }
}

/// One `capability` event per supported axis.
fn wire_capabilities(capabilities: Capabilities) -> SmallVec<[zwp_tablet_tool_v1::Capability; 3]> {
    use zwp_tablet_tool_v1::Capability as Wire;
    capabilities
        .iter_axes()
        .map(|axis| match axis {
            crate::tool::Axis::Pressure => Wire::Pressure,
            crate::tool::Axis::Distance => Wire::Distance,
            crate::tool::Axis::Tilt => Wire::Tilt,
        })
        .collect()
}

pub(crate) struct UnstableV1;

impl Serializer for UnstableV1 {
    fn manager_bound(&self, _manager: &Resource, _seat: Option<ResourceId>) -> Messages {
        // Devices are announced on the tablet seat instead.
        Messages::new()
    }
    fn tablet_added(&self, parent: &Resource, tablet: &Resource, device: &Device) -> Messages {
        use opcode::tablet as op;
        let mut messages: Messages = smallvec![
            message!(parent.id, opcode::seat::EVT_TABLET_ADDED, Argument::NewId(tablet.id)),
            message!(tablet.id, op::EVT_NAME, string(&device.name)),
        ];
        if let Some(usb_id) = device.usb_id() {
            messages.push(message!(
                tablet.id,
                op::EVT_ID,
                Argument::Uint(usb_id.vid),
                Argument::Uint(usb_id.pid),
            ));
        }
        messages.push(message!(tablet.id, op::EVT_DONE));
        messages
    }
    fn tool_added(&self, parent: &Resource, tool: &Resource, details: &Tool) -> Messages {
        use opcode::tool as op;
        let serial = details.descriptor().serial;
        #[allow(clippy::cast_possible_truncation)]
        let (hi, lo) = ((serial >> 32) as u32, serial as u32);
        let mut messages: Messages = smallvec![
            message!(parent.id, opcode::seat::EVT_TOOL_ADDED, Argument::NewId(tool.id)),
            message!(
                tool.id,
                op::EVT_TYPE,
                Argument::Uint(wire_type(details.descriptor().tool_type) as u32)
            ),
            message!(tool.id, op::EVT_HARDWARE_SERIAL, Argument::Uint(hi), Argument::Uint(lo)),
        ];
        messages.extend(
            wire_capabilities(details.capabilities())
                .into_iter()
                .map(|cap| message!(tool.id, op::EVT_CAPABILITY, Argument::Uint(cap as u32))),
        );
        messages.push(message!(tool.id, op::EVT_DONE));
        messages
    }
    fn removed(&self, resource: &Resource) -> Option<Message> {
        match resource.interface {
            Interface::UnstableTablet => Some(message!(resource.id, opcode::tablet::EVT_REMOVED)),
            Interface::UnstableTool => Some(message!(resource.id, opcode::tool::EVT_REMOVED)),
            _ => None,
        }
    }
    fn notify(
        &self,
        receiver: &Resource,
        counterpart: Option<ResourceId>,
        notification: &Notification,
    ) -> Option<Message> {
        use opcode::tool as op;
        if receiver.interface != Interface::UnstableTool {
            return None;
        }
        let id = receiver.id;
        let message = match *notification {
            Notification::ProximityIn {
                serial: Serial(serial),
                surface,
                ..
            } => message!(
                id,
                op::EVT_PROXIMITY_IN,
                Argument::Uint(serial),
                Argument::Object(counterpart?),
                Argument::Object(surface),
            ),
            Notification::ProximityOut { .. } => message!(id, op::EVT_PROXIMITY_OUT),
            Notification::Motion {
                position: [x, y], ..
            } => message!(
                id,
                op::EVT_MOTION,
                Argument::Fixed(to_fixed(x)),
                Argument::Fixed(to_fixed(y)),
            ),
            Notification::Down {
                serial: Serial(serial),
                ..
            } => message!(id, op::EVT_DOWN, Argument::Uint(serial)),
            Notification::Up { .. } => message!(id, op::EVT_UP),
            Notification::Pressure { value, .. } => {
                message!(id, op::EVT_PRESSURE, Argument::Uint(scale_unsigned(value)))
            }
            Notification::Distance { value, .. } => {
                message!(id, op::EVT_DISTANCE, Argument::Uint(scale_unsigned(value)))
            }
            Notification::Tilt { value: [x, y], .. } => message!(
                id,
                op::EVT_TILT,
                Argument::Int(scale_signed(x)),
                Argument::Int(scale_signed(y)),
            ),
            Notification::Button {
                serial: Serial(serial),
                button,
                pressed,
                ..
            } => {
                let state = if pressed {
                    zwp_tablet_tool_v1::ButtonState::Pressed
                } else {
                    zwp_tablet_tool_v1::ButtonState::Released
                };
                message!(
                    id,
                    op::EVT_BUTTON,
                    Argument::Uint(serial),
                    Argument::Uint(button),
                    Argument::Uint(state as u32),
                )
            }
            Notification::Frame { time } => message!(id, op::EVT_FRAME, Argument::Uint(time)),
        };
        Some(message)
    }
    fn decode(&self, receiver: &Resource, message: &Message) -> Result<Request, DecodeError> {
        let interface = receiver.interface.name();
        let opcode = message.opcode;
        let bad = || DecodeError::BadArguments { interface, opcode };
        let args = message.args.as_slice();
        match (receiver.interface, opcode) {
            (Interface::UnstableManager, opcode::manager::REQ_GET_TABLET_SEAT) => match args {
                [Argument::NewId(id), Argument::Object(seat)] => Ok(Request::GetTabletSeat {
                    id: *id,
                    seat: *seat,
                }),
                _ => Err(bad()),
            },
            (Interface::UnstableTool, opcode::tool::REQ_SET_CURSOR) => match args {
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
            },
            (Interface::UnstableManager, opcode::manager::REQ_DESTROY)
            | (Interface::UnstableSeat, opcode::seat::REQ_DESTROY)
            | (Interface::UnstableTablet, opcode::tablet::REQ_DESTROY)
            | (Interface::UnstableTool, opcode::tool::REQ_DESTROY) => {
                if args.is_empty() {
                    Ok(Request::Destroy)
                } else {
                    Err(bad())
                }
            }
            _ => Err(DecodeError::UnknownOpcode { interface, opcode }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        compositor::{ClientId, DeviceId},
        device::{DeviceMode, DeviceType},
        tool::{ToolDescriptor, ToolKey},
    };

    fn resource(id: u64, interface: Interface) -> Resource {
        Resource {
            id: ResourceId(id),
            client: ClientId(1),
            interface,
            version: 1,
        }
    }

    fn device(product_id: &str) -> Device {
        Device {
            id: DeviceId(1),
            name: "Wacom Pen".into(),
            vendor_id: "056a".into(),
            product_id: product_id.into(),
            device_type: DeviceType::Pen,
            mode: DeviceMode::Physical,
            axes: Capabilities::all(),
        }
    }

    fn opcodes(messages: &Messages) -> Vec<u16> {
        messages.iter().map(|m| m.opcode).collect()
    }

    #[test]
    fn tablet_burst() {
        let seat = resource(1, Interface::UnstableSeat);
        let tablet = resource(2, Interface::UnstableTablet);
        let burst = UnstableV1.tablet_added(&seat, &tablet, &device("0302"));
        assert_eq!(
            opcodes(&burst),
            [
                opcode::seat::EVT_TABLET_ADDED,
                opcode::tablet::EVT_NAME,
                opcode::tablet::EVT_ID,
                opcode::tablet::EVT_DONE
            ]
        );
        assert!(matches!(
            burst[2].args.as_slice(),
            [Argument::Uint(0x056a), Argument::Uint(0x0302)]
        ));
    }

    #[test]
    fn tablet_burst_without_id() {
        let seat = resource(1, Interface::UnstableSeat);
        let tablet = resource(2, Interface::UnstableTablet);
        let burst = UnstableV1.tablet_added(&seat, &tablet, &device("??"));
        assert_eq!(
            opcodes(&burst),
            [
                opcode::seat::EVT_TABLET_ADDED,
                opcode::tablet::EVT_NAME,
                opcode::tablet::EVT_DONE
            ]
        );
    }

    #[test]
    fn tool_burst() {
        let seat = resource(1, Interface::UnstableSeat);
        let tool_resource = resource(3, Interface::UnstableTool);
        let descriptor = ToolDescriptor {
            serial: 0x1_0000_0002,
            tool_type: Type::Pen,
        };
        let tool = Tool::new(
            ToolKey::new(descriptor, DeviceId(1)),
            Capabilities::PRESSURE | Capabilities::TILT,
            DeviceId(1),
        );
        let burst = UnstableV1.tool_added(&seat, &tool_resource, &tool);
        assert_eq!(
            opcodes(&burst),
            [
                opcode::seat::EVT_TOOL_ADDED,
                opcode::tool::EVT_TYPE,
                opcode::tool::EVT_HARDWARE_SERIAL,
                opcode::tool::EVT_CAPABILITY,
                opcode::tool::EVT_CAPABILITY,
                opcode::tool::EVT_DONE
            ]
        );
        assert!(matches!(
            burst[1].args.as_slice(),
            [Argument::Uint(0x140)]
        ));
        assert!(matches!(
            burst[2].args.as_slice(),
            [Argument::Uint(1), Argument::Uint(2)]
        ));
    }

    #[test]
    fn only_tools_carry_focus() {
        let tablet = resource(2, Interface::UnstableTablet);
        assert!(UnstableV1
            .notify(&tablet, None, &Notification::Up { time: 0 })
            .is_none());
        let tool = resource(3, Interface::UnstableTool);
        let msg = UnstableV1
            .notify(
                &tool,
                None,
                &Notification::Tilt {
                    time: 0,
                    value: [-1.0, 0.5],
                },
            )
            .unwrap();
        assert!(matches!(
            msg.args.as_slice(),
            [Argument::Int(-65535), Argument::Int(32767)]
        ));
    }

    #[test]
    fn get_tablet_seat() {
        let manager = resource(1, Interface::UnstableManager);
        let msg = message!(
            manager.id,
            opcode::manager::REQ_GET_TABLET_SEAT,
            Argument::NewId(ResourceId(5)),
            Argument::Object(ResourceId(6)),
        );
        assert_eq!(
            UnstableV1.decode(&manager, &msg),
            Ok(Request::GetTabletSeat {
                id: ResourceId(5),
                seat: ResourceId(6)
            })
        );
    }
}
