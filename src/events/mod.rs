//! Input from the tablet hardware.
//!
//! The input subsystem hands each tablet event to [`TabletManager`](crate::TabletManager) in
//! two steps: [`update`](crate::TabletManager::update) adjusts bookkeeping (focus, tool
//! lifetimes, button state), then [`handle_event`](crate::TabletManager::handle_event)
//! delivers it to the focused client. Events are always for a specific tablet device and
//! carry the input subsystem's millisecond timestamp.
//!
//! For example, a quick tap:
//! <pre>
//!   ProximityIn
//!   Motion
//!   Button(1, Pressed)
//!   Button(1, Released)
//!   ProximityOut
//! </pre>

use crate::{
    compositor::DeviceId,
    tool::{Axis, Capabilities, ToolDescriptor},
};
pub use crate::util::NicheF32;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct InputEvent {
    /// The tablet reporting this event.
    pub device: DeviceId,
    /// Milliseconds, unspecified epoch.
    pub time: u32,
    pub kind: EventKind,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum EventKind {
    /// A tool entered sensing range. Focus is only decided on the following motion.
    ProximityIn { tool: ToolDescriptor },
    /// The current tool left sensing range.
    ProximityOut,
    /// Position in stage coordinates, with optional axis readings.
    Motion {
        position: [f64; 2],
        axes: Option<Axes>,
    },
    /// Button code 1 is the tip.
    Button { button: u32, state: ButtonState },
    /// Scroll from tool wheels or pad strips. Not consumed here.
    Scroll { delta: [f64; 2] },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::AsRefStr)]
pub enum ButtonState {
    Pressed,
    Released,
}
impl ButtonState {
    #[must_use]
    pub fn is_pressed(self) -> bool {
        self == Self::Pressed
    }
}

/// Axis readings travelling with a motion. Axes the tool didn't report are `None`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Axes {
    /// `[0, 1]`
    pub pressure: NicheF32,
    /// `[0, 1]`
    pub distance: NicheF32,
    /// `[-1, 1]` in each direction.
    pub tilt: Option<[f32; 2]>,
}
impl Axes {
    /// Axes present in this reading.
    #[must_use]
    pub fn present(&self) -> Capabilities {
        let mut present = Capabilities::empty();
        present.set(Axis::Pressure.into(), self.pressure.get().is_some());
        present.set(Axis::Distance.into(), self.distance.get().is_some());
        present.set(Axis::Tilt.into(), self.tilt.is_some());
        present
    }
}

/// Whether an event should continue to other consumers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[must_use]
pub enum Propagation {
    Stop,
    Propagate,
}
