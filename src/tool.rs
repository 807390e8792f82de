//! # Tools
//!
//! Also called a *stylus* or *pointer*, these represent the device that the user holds to interact with a tablet.
//! "Tools" do not correspond directly with physical objects, for example a
//! single stylus with a tip and eraser represents *two* tools, one for each end.
//!
//! A tool is identified by its hardware serial and [`Type`] - see [`ToolDescriptor`]. Tools are
//! created the first time they come into proximity of any tablet and live until the tablet
//! they were last seen on is removed. They may roam between several connected tablets in the meantime.
//!
//! Tools that report no serial can't be told apart across tablets, so each tablet gets its own,
//! see [`ToolKey`].

use crate::{
    compositor::{ClientId, DeviceId},
    protocol::{Interface, Revision, Serializer},
    resource::{Object, Resource, ResourceList, ResourcePartition},
    Context,
};

bitflags::bitflags! {
    /// Bitflags describing the axes a tool reports beyond position. See [`Axis`] for descriptions.
    #[derive(Clone, Copy, Default, Debug, PartialEq, Eq, Hash)]
    pub struct Capabilities: u32 {
        const PRESSURE = 1;
        const DISTANCE = 2;
        const TILT = 4;
    }
}

impl Capabilities {
    pub fn iter_axes(&self) -> impl Iterator<Item = Axis> {
        self.intersection(Self::all())
            .iter()
            .map(|flags| match flags {
                Self::PRESSURE => Axis::Pressure,
                Self::DISTANCE => Axis::Distance,
                Self::TILT => Axis::Tilt,
                // We know this is exhaustive due to intersection(all)
                _ => unreachable!(),
            })
    }
}

#[derive(Clone, Copy, Debug, strum::EnumCount, PartialEq, Eq, strum::AsRefStr)]
pub enum Axis {
    /// Force applied perpendicular to the tablet surface, normalized to `[0, 1]`.
    Pressure,
    /// Height above the tablet surface, normalized to `[0, 1]`.
    Distance,
    /// Forward-back and left-right tilt, normalized to `[-1, 1]`.
    Tilt,
}
impl From<Axis> for Capabilities {
    fn from(value: Axis) -> Self {
        match value {
            Axis::Pressure => Capabilities::PRESSURE,
            Axis::Distance => Capabilities::DISTANCE,
            Axis::Tilt => Capabilities::TILT,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::AsRefStr, strum::EnumIter)]
pub enum Type {
    Pen,
    /// A nib found on the reverse of some styli primarily intended to erase.
    Eraser,
    Brush,
    Pencil,
    /// A tool designed to work above the surface of the pad, making extensive
    /// use of the `Distance` and `Tilt` axes.
    Airbrush,
    /// A touch.
    Finger,
    /// A mouse-like device that rests on the pad and provides absolute coordinates.
    Mouse,
    /// A mouse-like device that rests on the pad with a transparent crosshair for visibility.
    Lens,
}
impl Type {
    /// The kernel `BTN_TOOL_*` code, which is also what both protocol revisions put on the wire.
    #[must_use]
    pub fn code(self) -> u32 {
        match self {
            Self::Pen => 0x140,
            Self::Eraser => 0x141,
            Self::Brush => 0x142,
            Self::Pencil => 0x143,
            Self::Airbrush => 0x144,
            Self::Finger => 0x145,
            Self::Mouse => 0x146,
            Self::Lens => 0x147,
        }
    }
}

/// The physical identity of a tool. Two events naming equal descriptors name the same tool.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ToolDescriptor {
    /// An identifier that is baked into the hardware of the tool, zero if unknown.
    pub serial: u64,
    pub tool_type: Type,
}

/// How the seat tells tools apart.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ToolKey {
    pub descriptor: ToolDescriptor,
    /// The tablet owning the tool, for tools without a serial.
    pub tablet: Option<DeviceId>,
}
impl ToolKey {
    /// The key of `descriptor` as reported by `tablet`.
    #[must_use]
    pub fn new(descriptor: ToolDescriptor, tablet: DeviceId) -> Self {
        Self {
            descriptor,
            tablet: (descriptor.serial == 0).then_some(tablet),
        }
    }
}

bitflags::bitflags! {
    /// Buttons held on a tool. Button code `n` is bit `n - 1`.
    #[derive(Clone, Copy, Default, Debug, PartialEq, Eq, Hash)]
    pub struct Buttons: u32 {
        /// The tip, button code 1.
        const PRIMARY = 1;
        const SECONDARY = 1 << 1;
        const TERTIARY = 1 << 2;
        const _ = !0;
    }
}
impl Buttons {
    /// The bit for a button code. `None` for codes the mask can't represent.
    #[must_use]
    pub fn from_code(code: u32) -> Option<Self> {
        (1..=32)
            .contains(&code)
            .then(|| Self::from_bits_retain(1 << (code - 1)))
    }
}

/// A tool and its per-client resources. See [module level docs](`crate::tool`) for details.
#[derive(Debug)]
pub struct Tool {
    key: ToolKey,
    capabilities: Capabilities,
    pub(crate) pressed: Buttons,
    /// The tablet that most recently reported proximity for this tool.
    pub(crate) tablet: DeviceId,
    pub(crate) resources: ResourcePartition,
}

impl Tool {
    pub(crate) fn new(key: ToolKey, capabilities: Capabilities, tablet: DeviceId) -> Self {
        Self {
            key,
            capabilities,
            pressed: Buttons::empty(),
            tablet,
            resources: ResourcePartition::default(),
        }
    }
    #[must_use]
    pub fn descriptor(&self) -> ToolDescriptor {
        self.key.descriptor
    }
    #[must_use]
    pub fn key(&self) -> ToolKey {
        self.key
    }
    #[must_use]
    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }
    /// Buttons currently held.
    #[must_use]
    pub fn pressed(&self) -> Buttons {
        self.pressed
    }
    /// The tablet last reporting proximity.
    #[must_use]
    pub fn tablet(&self) -> DeviceId {
        self.tablet
    }
    /// The resource `client` has bound for this tool in `revision`, if any.
    #[must_use]
    pub fn lookup_resource(&self, client: ClientId, revision: Revision) -> Option<&Resource> {
        self.resources.lookup(client, revision)
    }

    /// Record a button transition. Codes outside the mask are ignored.
    pub(crate) fn account_button(&mut self, code: u32, pressed: bool) {
        if let Some(bit) = Buttons::from_code(code) {
            self.pressed.set(bit, pressed);
        }
    }

    /// Make sure `client` has a resource for this tool in every revision it has a parent for,
    /// announcing any that are new. Returns the newly created resources.
    pub(crate) fn ensure_client_resource(
        &mut self,
        client: ClientId,
        focused: bool,
        parents: &[Resource],
        cx: &mut Context,
    ) -> ResourceList {
        let mut created = ResourceList::new();
        for parent in parents.iter().filter(|p| p.client == client && p.is_parent()) {
            if self.resources.lookup(client, parent.revision()).is_some() {
                continue;
            }
            created.push(self.create_new_resource(parent, focused, cx));
        }
        created
    }

    fn create_new_resource(
        &mut self,
        parent: &Resource,
        focused: bool,
        cx: &mut Context,
    ) -> Resource {
        let interface = Interface::tool(parent.revision());
        let resource = Resource {
            id: cx.host.create_resource(parent.client, interface, parent.version),
            client: parent.client,
            interface,
            version: parent.version,
        };
        self.resources.insert(resource, focused);
        cx.owners.insert(resource, Object::Tool(self.key));
        tracing::debug!(
            tool = ?self.key,
            resource = ?resource.id,
            client = ?resource.client,
            "tool resource created"
        );
        for message in parent.revision().serializer().tool_added(parent, &resource, self) {
            cx.send(message);
        }
        resource
    }

    /// Notify and invalidate every remaining resource.
    pub(crate) fn destroy(mut self, cx: &mut Context) {
        tracing::info!(tool = ?self.key, "tool removed");
        for resource in self.resources.drain() {
            cx.remove_resource(&resource);
        }
    }
}
