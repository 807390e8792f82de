#![cfg(feature = "tablet-legacy")]

mod common;

use common::*;
use octoseat::{
    compositor::{BufferId, ClientId, EventRoute, ResourceId, Surface},
    cursor::{Commit, CursorImage, ThemeCursor},
    device::DeviceType,
    protocol::{legacy::opcode as op, Argument, Interface, Message, Revision},
    tool::ToolKey,
    Builder, RequestError, TabletManager,
};

const ALICE: ClientId = ClientId(1);
const BOB: ClientId = ClientId(2);
const ALICE_MANAGER: ResourceId = ResourceId(100);

struct Setup {
    manager: TabletManager,
    mock: Mock,
    surface: Surface,
    tablet: ResourceId,
}

/// Alice bound the legacy manager, the Wacom is plugged in and her surface is under the pen.
fn setup() -> Setup {
    let mut mock = Mock::new();
    mock.seats.insert(ALICE, ResourceId(50));
    let mut manager = Builder::new().unstable_v1(false).build().unwrap();
    manager.bind_client(ALICE, Interface::LegacyManager, ALICE_MANAGER, 1, &mut mock);
    assert!(manager.register_device(wacom(), &mut mock));
    let surface = mock.add_surface(ALICE, 1);
    mock.under = Some(surface);
    let tablet = mock.created_of(ALICE, Interface::LegacyTablet)[0];
    mock.take();
    Setup {
        manager,
        mock,
        surface,
        tablet,
    }
}

/// `setup`, with the pen in proximity and focused on Alice's surface.
fn focused() -> (Setup, ResourceId) {
    let mut s = setup();
    drive(&mut s.manager, &mut s.mock, proximity_in(10));
    drive(&mut s.manager, &mut s.mock, motion(11, [110.0, 120.0]));
    let tool = s.mock.created_of(ALICE, Interface::LegacyTool)[0];
    s.mock.take();
    (s, tool)
}

#[test]
fn bind_and_hotplug() {
    let mut mock = Mock::new();
    mock.seats.insert(ALICE, ResourceId(50));
    let mut manager = Builder::new().build().unwrap();
    manager.bind_client(ALICE, Interface::LegacyManager, ALICE_MANAGER, 1, &mut mock);
    let sent = mock.take();
    assert_eq!(summary(&sent), [(ALICE_MANAGER, op::manager::EVT_SEAT)]);
    assert_eq!(object(&sent[0].args[0]), ResourceId(50));

    assert!(manager.register_device(wacom(), &mut mock));
    let sent = mock.take();
    let tablet = mock.created_of(ALICE, Interface::LegacyTablet);
    assert_eq!(tablet.len(), 1);
    assert_eq!(summary(&sent), [(ALICE_MANAGER, op::manager::EVT_DEVICE_ADDED)]);
    let args = &sent[0].args;
    assert_eq!(object(&args[0]), tablet[0]);
    assert!(matches!(&args[1], Argument::Str(Some(name)) if name.to_bytes() == b"Wacom Pen"));
    assert_eq!(uint(&args[2]), 0x056a);
    assert_eq!(uint(&args[3]), 0x0302);

    // Already tracked.
    assert!(!manager.register_device(wacom(), &mut mock));
    let mut keyboard = wacom();
    keyboard.id = octoseat::compositor::DeviceId(2);
    keyboard.device_type = DeviceType::Keyboard;
    assert!(!manager.register_device(keyboard, &mut mock));
    assert!(mock.take().is_empty());
}

#[test]
fn unparsable_ids_are_zero() {
    let mut mock = Mock::new();
    let mut manager = Builder::new().build().unwrap();
    manager.bind_client(ALICE, Interface::LegacyManager, ALICE_MANAGER, 1, &mut mock);
    let mut device = wacom();
    device.vendor_id = "wacom".into();
    manager.register_device(device, &mut mock);
    let sent = mock.take();
    assert_eq!(uint(&sent[0].args[2]), 0);
    assert_eq!(uint(&sent[0].args[3]), 0);
}

#[test]
fn proximity_then_motion_focuses() {
    let Setup {
        mut manager,
        mut mock,
        surface,
        tablet,
    } = setup();

    // Focus waits for motion.
    drive(&mut manager, &mut mock, proximity_in(10));
    assert!(mock.take().is_empty());
    assert_eq!(manager.tablet(WACOM).unwrap().tool(), Some(PEN));
    assert!(matches!(mock.cursor.as_slice(), [CursorCall::Create(_)]));

    drive(&mut manager, &mut mock, motion_with_pressure(11, [110.0, 120.0], 0.5));
    let sent = mock.take();
    let tool_resource = mock.created_of(ALICE, Interface::LegacyTool)[0];
    assert_eq!(
        summary(&sent),
        [
            (ALICE_MANAGER, op::manager::EVT_TOOL_ADDED),
            (tool_resource, op::tool::EVT_TYPE),
            (tool_resource, op::tool::EVT_SERIAL),
            (tool_resource, op::tool::EVT_CAPABILITY),
            (tool_resource, op::tool::EVT_DONE),
            (tablet, op::tablet::EVT_PROXIMITY_IN),
            (tablet, op::tablet::EVT_MOTION),
            (tablet, op::tablet::EVT_PRESSURE),
            (tablet, op::tablet::EVT_FRAME),
        ]
    );
    assert_eq!(uint(&sent[1].args[0]), 0x140);
    assert_eq!((uint(&sent[2].args[0]), uint(&sent[2].args[1])), (1, 0xabc));
    assert_eq!(uint(&sent[3].args[0]), 0b111);

    let proximity = &sent[5].args;
    let serial = manager.tablet(WACOM).unwrap().proximity_serial();
    assert_eq!(uint(&proximity[0]), serial.0);
    assert_eq!(uint(&proximity[1]), 11);
    assert_eq!(object(&proximity[2]), tool_resource);
    assert_eq!(object(&proximity[3]), surface.resource);

    // Surface-local.
    let motion = &sent[6].args;
    assert_eq!((fixed(&motion[1]), fixed(&motion[2])), (10.0, 20.0));
    assert_eq!(fixed(&sent[7].args[1]), 32767.0);

    assert_eq!(manager.tablet(WACOM).unwrap().focus(), Some(&surface));
    assert_eq!(
        mock.last_cursor_image(),
        Some(Some(CursorImage::Theme(ThemeCursor::Crosshair)))
    );
}

#[test]
fn motion_without_axes_has_no_frame() {
    let (mut s, _) = focused();
    drive(&mut s.manager, &mut s.mock, motion(12, [111.0, 121.0]));
    assert_eq!(summary(&s.mock.take()), [(s.tablet, op::tablet::EVT_MOTION)]);
}

#[test]
fn tip_and_buttons() {
    let (mut s, _) = focused();
    let tablet = s.tablet;

    drive(&mut s.manager, &mut s.mock, button(12, 1, true));
    let sent = s.mock.take();
    assert_eq!(summary(&sent), [(tablet, op::tablet::EVT_DOWN)]);
    assert_eq!(uint(&sent[0].args[0]), s.manager.tablet(WACOM).unwrap().down_serial().0);

    drive(&mut s.manager, &mut s.mock, button(13, 2, true));
    drive(&mut s.manager, &mut s.mock, button(14, 2, false));
    drive(&mut s.manager, &mut s.mock, button(15, 1, false));
    let sent = s.mock.take();
    assert_eq!(
        summary(&sent),
        [
            (tablet, op::tablet::EVT_BUTTON),
            (tablet, op::tablet::EVT_BUTTON),
            (tablet, op::tablet::EVT_UP),
        ]
    );
    assert_eq!(uint(&sent[0].args[2]), 2);
    assert_eq!(uint(&sent[0].args[3]), 1);
    assert_eq!(uint(&sent[1].args[3]), 0);
    assert_ne!(uint(&sent[0].args[0]), uint(&sent[1].args[0]));
}

#[test]
fn held_buttons_keep_focus() {
    let (mut s, _) = focused();
    let other = s.mock.add_surface(BOB, 2);

    drive(&mut s.manager, &mut s.mock, button(12, 1, true));
    s.mock.under = Some(other);
    s.mock.take();
    drive(&mut s.manager, &mut s.mock, motion(13, [300.0, 300.0]));
    let sent = s.mock.take();
    assert_eq!(summary(&sent), [(s.tablet, op::tablet::EVT_MOTION)]);
    assert_eq!(fixed(&sent[0].args[1]), 200.0);
    assert_eq!(s.manager.tablet(WACOM).unwrap().focus(), Some(&s.surface));

    drive(&mut s.manager, &mut s.mock, button(14, 1, false));
    s.mock.take();
    drive(&mut s.manager, &mut s.mock, motion(15, [301.0, 300.0]));
    // Bob never bound, so only Alice hears about it.
    assert_eq!(summary(&s.mock.take()), [(s.tablet, op::tablet::EVT_PROXIMITY_OUT)]);
    assert_eq!(s.manager.tablet(WACOM).unwrap().focus(), Some(&other));
}

#[test]
fn proximity_out_unfocuses_and_hides() {
    let (mut s, _) = focused();
    drive(&mut s.manager, &mut s.mock, proximity_out(20));
    let sent = s.mock.take();
    assert_eq!(summary(&sent), [(s.tablet, op::tablet::EVT_PROXIMITY_OUT)]);
    assert_eq!(uint(&sent[0].args[0]), 20);

    let tablet = s.manager.tablet(WACOM).unwrap();
    assert_eq!(tablet.focus(), None);
    assert_eq!(tablet.tool(), None);
    assert_eq!(tablet.renderer(), None);
    assert!(matches!(
        s.mock.cursor.as_slice(),
        [.., CursorCall::Set(_, None), CursorCall::Destroy(_)]
    ));
    assert!(s.mock.renderers.is_empty());

    // The tool outlives proximity.
    assert!(s.manager.tool(ToolKey::new(PEN, WACOM)).is_some());
}

#[test]
fn grabs_withhold_focus() {
    let mut s = setup();
    s.mock.route = EventRoute::CompositorGrab;
    drive(&mut s.manager, &mut s.mock, proximity_in(10));
    drive(&mut s.manager, &mut s.mock, motion(11, [110.0, 120.0]));
    assert!(s.mock.take().is_empty());
    let tablet = s.manager.tablet(WACOM).unwrap();
    assert_eq!(tablet.focus(), None);
    assert_eq!(tablet.current(), Some(&s.surface));

    s.mock.route = EventRoute::Normal;
    drive(&mut s.manager, &mut s.mock, motion(12, [110.0, 120.0]));
    let sent = s.mock.take();
    assert!(summary(&sent).contains(&(s.tablet, op::tablet::EVT_PROXIMITY_IN)));
}

#[test]
fn double_bind_gets_independent_tablets() {
    let mut mock = Mock::new();
    let mut manager = Builder::new().build().unwrap();
    let second = ResourceId(101);
    manager.bind_client(ALICE, Interface::LegacyManager, ALICE_MANAGER, 1, &mut mock);
    manager.bind_client(ALICE, Interface::LegacyManager, second, 1, &mut mock);
    manager.register_device(wacom(), &mut mock);
    let sent = mock.take();
    assert_eq!(
        summary(&sent),
        [
            (ALICE_MANAGER, op::manager::EVT_DEVICE_ADDED),
            (second, op::manager::EVT_DEVICE_ADDED),
        ]
    );
    assert_ne!(object(&sent[0].args[0]), object(&sent[1].args[0]));

    let surface = mock.add_surface(ALICE, 1);
    mock.under = Some(surface);
    drive(&mut manager, &mut mock, proximity_in(10));
    drive(&mut manager, &mut mock, motion(11, [110.0, 120.0]));
    let sent = summary(&mock.take());
    let tablets = mock.created_of(ALICE, Interface::LegacyTablet);
    let proximity_ins: Vec<_> = sent
        .iter()
        .filter(|(sender, opcode)| {
            tablets.contains(sender) && *opcode == op::tablet::EVT_PROXIMITY_IN
        })
        .map(|(sender, _)| *sender)
        .collect();
    assert_eq!(proximity_ins, tablets);
    assert_eq!(mock.created_of(ALICE, Interface::LegacyTool).len(), 1);
}

#[test]
fn late_bind_while_focused() {
    let mut mock = Mock::new();
    let mut manager = Builder::new().build().unwrap();
    manager.register_device(wacom(), &mut mock);
    let surface = mock.add_surface(ALICE, 1);
    mock.under = Some(surface);
    drive(&mut manager, &mut mock, proximity_in(10));
    drive(&mut manager, &mut mock, motion(11, [110.0, 120.0]));
    assert!(mock.take().is_empty());
    assert_eq!(manager.tablet(WACOM).unwrap().focus(), Some(&surface));

    manager.bind_client(ALICE, Interface::LegacyManager, ALICE_MANAGER, 1, &mut mock);
    let tablet = mock.created_of(ALICE, Interface::LegacyTablet)[0];
    let tool_resource = mock.created_of(ALICE, Interface::LegacyTool)[0];
    assert_eq!(
        summary(&mock.take()),
        [
            (ALICE_MANAGER, op::manager::EVT_DEVICE_ADDED),
            (ALICE_MANAGER, op::manager::EVT_TOOL_ADDED),
            (tool_resource, op::tool::EVT_TYPE),
            (tool_resource, op::tool::EVT_SERIAL),
            (tool_resource, op::tool::EVT_CAPABILITY),
            (tool_resource, op::tool::EVT_DONE),
            (tablet, op::tablet::EVT_PROXIMITY_IN),
        ]
    );
}

#[test]
fn focus_surface_destroyed() {
    let (mut s, _) = focused();
    s.manager.surface_destroyed(s.surface.id, &mut s.mock);
    assert_eq!(summary(&s.mock.take()), [(s.tablet, op::tablet::EVT_PROXIMITY_OUT)]);
    let tablet = s.manager.tablet(WACOM).unwrap();
    assert_eq!(tablet.focus(), None);
    assert_eq!(tablet.current(), None);

    // Nothing left to deliver to.
    s.mock.under = None;
    drive(&mut s.manager, &mut s.mock, motion(12, [0.0, 0.0]));
    assert!(s.mock.take().is_empty());
}

fn set_cursor(tablet: ResourceId, serial: u32, surface: ResourceId, hotspot: [i32; 2]) -> Message {
    request(
        tablet,
        op::tablet::REQ_SET_CURSOR,
        vec![
            Argument::Uint(serial),
            Argument::Object(surface),
            Argument::Int(hotspot[0]),
            Argument::Int(hotspot[1]),
        ],
    )
}

#[test]
fn cursor_surface_lifecycle() {
    let (mut s, _) = focused();
    let cursor = s.mock.add_surface(ALICE, 2);
    let serial = s.manager.tablet(WACOM).unwrap().proximity_serial().0;

    // From the future.
    let stale = set_cursor(s.tablet, serial.wrapping_add(1), cursor.resource, [3, 4]);
    assert_eq!(s.manager.dispatch_request(&stale, &mut s.mock), Ok(()));
    assert_eq!(s.manager.tablet(WACOM).unwrap().cursor_surface(), None);
    assert!(s.mock.roles.is_empty());

    let fresh = set_cursor(s.tablet, serial, cursor.resource, [3, 4]);
    assert_eq!(s.manager.dispatch_request(&fresh, &mut s.mock), Ok(()));
    assert_eq!(s.manager.tablet(WACOM).unwrap().cursor_surface(), Some(&cursor));
    assert_eq!(s.manager.cursor_role(cursor.id).unwrap().hotspot(), [3, 4]);
    // Nothing attached yet.
    assert_eq!(s.mock.last_cursor_image(), Some(None));

    s.manager.surface_committed(
        cursor.id,
        &Commit {
            buffer: Some(BufferId(9)),
            newly_attached: true,
            scale: 1,
        },
        &mut s.mock,
    );
    let renderer = s.manager.tablet(WACOM).unwrap().renderer().unwrap();
    assert!(s.mock.cursor.contains(&CursorCall::Realize(renderer, BufferId(9))));
    assert!(matches!(
        s.mock.last_cursor_image(),
        Some(Some(CursorImage::Sprite(sprite)))
            if sprite.texture == Some(BufferId(9)) && sprite.hotspot == [3, 4]
    ));

    s.manager.surface_destroyed(cursor.id, &mut s.mock);
    assert_eq!(s.manager.tablet(WACOM).unwrap().cursor_surface(), None);
    assert!(s.manager.cursor_role(cursor.id).is_none());
    assert_eq!(
        s.mock.last_cursor_image(),
        Some(Some(CursorImage::Theme(ThemeCursor::Crosshair)))
    );
}

#[test]
fn extreme_hotspot_saturates() {
    let (mut s, _) = focused();
    let cursor = s.mock.add_surface(ALICE, 2);
    let serial = s.manager.tablet(WACOM).unwrap().proximity_serial().0;
    let request = set_cursor(s.tablet, serial, cursor.resource, [i32::MAX, i32::MIN]);
    assert_eq!(s.manager.dispatch_request(&request, &mut s.mock), Ok(()));
    s.manager.surface_committed(
        cursor.id,
        &Commit {
            buffer: Some(BufferId(9)),
            newly_attached: true,
            scale: 2,
        },
        &mut s.mock,
    );
    assert!(matches!(
        s.mock.last_cursor_image(),
        Some(Some(CursorImage::Sprite(sprite))) if sprite.hotspot == [i32::MAX, i32::MIN]
    ));

    // Detaching drops the hotspot along with the texture.
    s.manager.surface_committed(
        cursor.id,
        &Commit {
            buffer: None,
            newly_attached: true,
            scale: 2,
        },
        &mut s.mock,
    );
    assert_eq!(s.manager.cursor_role(cursor.id).unwrap().sprite().hotspot, [0, 0]);
    assert_eq!(s.mock.last_cursor_image(), Some(None));
}

#[test]
fn cursor_sprite_stays_with_its_client() {
    let (mut s, _) = focused();
    let cursor = s.mock.add_surface(ALICE, 2);
    let serial = s.manager.tablet(WACOM).unwrap().proximity_serial().0;
    let request = set_cursor(s.tablet, serial, cursor.resource, [1, 1]);
    assert_eq!(s.manager.dispatch_request(&request, &mut s.mock), Ok(()));
    s.manager.surface_committed(
        cursor.id,
        &Commit {
            buffer: Some(BufferId(9)),
            newly_attached: true,
            scale: 1,
        },
        &mut s.mock,
    );
    assert!(matches!(
        s.mock.last_cursor_image(),
        Some(Some(CursorImage::Sprite(_)))
    ));

    s.manager.bind_client(BOB, Interface::LegacyManager, ResourceId(300), 1, &mut s.mock);
    let bob_surface = s.mock.add_surface(BOB, 3);
    s.mock.under = Some(bob_surface);
    drive(&mut s.manager, &mut s.mock, motion(12, [150.0, 150.0]));
    let tablet = s.manager.tablet(WACOM).unwrap();
    assert_eq!(tablet.focus(), Some(&bob_surface));
    assert_eq!(tablet.cursor_surface(), Some(&cursor));
    assert_eq!(
        s.mock.last_cursor_image(),
        Some(Some(CursorImage::Theme(ThemeCursor::Crosshair)))
    );

    s.mock.under = Some(s.surface);
    drive(&mut s.manager, &mut s.mock, motion(13, [110.0, 110.0]));
    assert!(matches!(
        s.mock.last_cursor_image(),
        Some(Some(CursorImage::Sprite(sprite))) if sprite.texture == Some(BufferId(9))
    ));
}

#[test]
fn cursor_role_conflict() {
    let (mut s, _) = focused();
    let cursor = s.mock.add_surface(ALICE, 2);
    s.mock.foreign_roles.insert(cursor.id);
    let serial = s.manager.tablet(WACOM).unwrap().proximity_serial().0;
    let request = set_cursor(s.tablet, serial, cursor.resource, [0, 0]);
    assert_eq!(
        s.manager.dispatch_request(&request, &mut s.mock),
        Err(RequestError::RoleConflict { surface: cursor.id })
    );
    assert_eq!(
        s.mock.errors,
        [(s.tablet, 0, "wl_surface@502 already has a different role".to_owned())]
    );
    assert_eq!(s.manager.tablet(WACOM).unwrap().cursor_surface(), None);
}

#[test]
fn cursor_from_unfocused_client_ignored() {
    let (mut s, _) = focused();
    let bob_manager = ResourceId(300);
    s.manager.bind_client(BOB, Interface::LegacyManager, bob_manager, 1, &mut s.mock);
    let bob_tablet = s.mock.created_of(BOB, Interface::LegacyTablet)[0];
    let cursor = s.mock.add_surface(BOB, 3);
    let serial = s.manager.tablet(WACOM).unwrap().proximity_serial().0;
    let request = set_cursor(bob_tablet, serial, cursor.resource, [0, 0]);
    assert_eq!(s.manager.dispatch_request(&request, &mut s.mock), Ok(()));
    assert_eq!(s.manager.tablet(WACOM).unwrap().cursor_surface(), None);
    assert!(s.mock.roles.is_empty());
}

#[test]
fn unknown_surface_argument() {
    let (mut s, _) = focused();
    let serial = s.manager.tablet(WACOM).unwrap().proximity_serial().0;
    let request = set_cursor(s.tablet, serial, ResourceId(777), [0, 0]);
    assert_eq!(
        s.manager.dispatch_request(&request, &mut s.mock),
        Err(RequestError::UnknownResource(ResourceId(777)))
    );
}

#[test]
fn unplug_removes_tablet_then_tools() {
    let (mut s, tool_resource) = focused();
    assert!(s.manager.unregister_device(WACOM, &mut s.mock));
    assert_eq!(
        summary(&s.mock.take()),
        [
            (s.tablet, op::tablet::EVT_PROXIMITY_OUT),
            (s.tablet, op::tablet::EVT_REMOVED),
            (tool_resource, op::tool::EVT_REMOVED),
        ]
    );
    assert!(s.mock.destroyed.contains(&s.tablet));
    assert!(s.mock.destroyed.contains(&tool_resource));
    assert!(s.manager.tool(ToolKey::new(PEN, WACOM)).is_none());
    assert!(s.mock.renderers.is_empty());
    assert!(!s.manager.unregister_device(WACOM, &mut s.mock));
}

#[test]
fn release_and_disconnect() {
    let (mut s, _) = focused();
    let release = request(s.tablet, op::tablet::REQ_RELEASE, vec![]);
    assert_eq!(s.manager.dispatch_request(&release, &mut s.mock), Ok(()));
    assert!(s.mock.destroyed.contains(&s.tablet));
    assert!(s
        .manager
        .tablet(WACOM)
        .unwrap()
        .lookup_resource(ALICE, Revision::Legacy)
        .is_none());
    assert_eq!(
        s.manager.dispatch_request(&release, &mut s.mock),
        Err(RequestError::UnknownResource(s.tablet))
    );

    s.manager.client_disconnected(ALICE);
    assert!(!s.manager.seat().is_bound(ALICE));
    drive(&mut s.manager, &mut s.mock, button(12, 1, true));
    assert!(s.mock.take().is_empty());
}

#[test]
fn teardown_removes_everything() {
    let (s, tool_resource) = focused();
    let Setup {
        manager,
        mut mock,
        tablet,
        ..
    } = s;
    manager.destroy(&mut mock);
    let sent = summary(&mock.take());
    assert!(sent.contains(&(tablet, op::tablet::EVT_REMOVED)));
    assert!(sent.contains(&(tool_resource, op::tool::EVT_REMOVED)));
    assert!(mock.renderers.is_empty());
}

#[test]
fn consumes_only_tablets() {
    let s = setup();
    assert!(s.manager.consumes_event(&proximity_in(1)));
    let mut foreign = proximity_in(1);
    foreign.device = octoseat::compositor::DeviceId(99);
    assert!(!s.manager.consumes_event(&foreign));
}

#[test]
fn cursor_follows_position() {
    let (mut s, _) = focused();
    let renderer = s.manager.tablet(WACOM).unwrap().renderer().unwrap();
    s.manager.update_cursor_position(&motion(12, [130.0, 140.0]), &mut s.mock);
    assert_eq!(
        s.mock.cursor.last(),
        Some(&CursorCall::Position(renderer, [130.0, 140.0]))
    );
    // Non-motion events reuse the last position.
    s.manager.update_cursor_position(&button(13, 1, true), &mut s.mock);
    assert_eq!(
        s.mock.cursor.last(),
        Some(&CursorCall::Position(renderer, [130.0, 140.0]))
    );
}
