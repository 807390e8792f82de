#[derive(thiserror::Error, Debug)]
pub enum NicheF32Error {
    /// Attempted to make a non-NaN value our of NaN.
    #[error("provided value was NaN")]
    NaN,
}

/// An Option type where NaN is the niche.
///
/// Axis payloads from the input subsystem carry one of these per axis, so that an event can
/// report pressure but not distance without the size cost of `Option<f32>` in every slot.
#[derive(Copy, Clone, PartialOrd)]
pub struct NicheF32(f32);
impl NicheF32 {
    pub const NONE: NicheF32 = NicheF32(f32::NAN);
    /// Wrap a non-`NaN` value. Fails with `None` if the value was `NaN`.
    #[must_use]
    pub fn new_some(value: f32) -> Option<Self> {
        (!value.is_nan()).then_some(Self(value))
    }
    /// Get a `None` niche.
    #[must_use]
    pub const fn new_none() -> Self {
        Self::NONE
    }
    /// Get the optional value within. If `Some`, guaranteed to not be `NaN`.
    #[must_use]
    pub fn get(self) -> Option<f32> {
        (!self.0.is_nan()).then_some(self.0)
    }
}
impl TryFrom<Option<f32>> for NicheF32 {
    type Error = NicheF32Error;
    fn try_from(value: Option<f32>) -> Result<Self, Self::Error> {
        if value.is_some_and(f32::is_nan) {
            Err(NicheF32Error::NaN)
        } else {
            Ok(NicheF32(value.unwrap_or(f32::NAN)))
        }
    }
}
impl Default for NicheF32 {
    fn default() -> Self {
        Self::new_none()
    }
}
impl std::fmt::Debug for NicheF32 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self.get())
    }
}
impl PartialEq for NicheF32 {
    fn eq(&self, other: &Self) -> bool {
        self.get() == other.get()
    }
}
impl PartialEq<f32> for NicheF32 {
    fn eq(&self, other: &f32) -> bool {
        self.get().is_some_and(|value| value == *other)
    }
}

/// Full scale of normalized axes on the wire.
pub(crate) const AXIS_MAX: f32 = 65535.0;

/// Map a normalized `[0, 1]` axis onto `[0, AXIS_MAX]`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub(crate) fn scale_unsigned(value: f32) -> u32 {
    (value.clamp(0.0, 1.0) * AXIS_MAX) as u32
}

/// Map a normalized `[-1, 1]` axis onto `[-AXIS_MAX, AXIS_MAX]`.
#[allow(clippy::cast_possible_truncation)]
pub(crate) fn scale_signed(value: f32) -> i32 {
    (value.clamp(-1.0, 1.0) * AXIS_MAX) as i32
}

/// Encode as the protocol's signed 24.8 fixed point.
#[allow(clippy::cast_possible_truncation)]
pub(crate) fn to_fixed(value: f64) -> i32 {
    (value * 256.0).round() as i32
}

/// Decode a signed 24.8 fixed point value.
#[must_use]
pub fn from_fixed(value: i32) -> f64 {
    f64::from(value) / 256.0
}
