//! # Devices
//!
//! Input devices as the input subsystem reports them on hot-plug. Only a subset are tablets,
//! see [`Device::is_tablet`].

use crate::{compositor::DeviceId, tool::Capabilities};

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub struct UsbId {
    /// Vendor ID
    pub vid: u32,
    /// Product ID
    pub pid: u32,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum UsbIdError {
    #[error("no hexadecimal digits in {0:?}")]
    NotHex(String),
    #[error("{0:?} does not fit in 32 bits")]
    Overflow(String),
}

impl UsbId {
    /// Parse the vendor and product strings of a device.
    ///
    /// Each accepts what a `%x` conversion would: optional leading whitespace, an optional `0x`
    /// prefix, then hex digits up to the first character that isn't one.
    /// # Errors
    /// If either string has no leading hex digits, or they overflow 32 bits.
    pub fn parse(vendor: &str, product: &str) -> Result<Self, UsbIdError> {
        Ok(Self {
            vid: parse_hex(vendor)?,
            pid: parse_hex(product)?,
        })
    }
}

fn parse_hex(text: &str) -> Result<u32, UsbIdError> {
    let trimmed = text.trim_start();
    let prefixed = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"));
    let digits = prefixed.unwrap_or(trimmed);
    let end = digits
        .find(|c: char| !c.is_ascii_hexdigit())
        .unwrap_or(digits.len());
    let digits = &digits[..end];
    if digits.is_empty() {
        // A prefix with nothing after it still read its leading zero.
        return match prefixed {
            Some(_) => Ok(0),
            None => Err(UsbIdError::NotHex(text.to_owned())),
        };
    }
    u32::from_str_radix(digits, 16).map_err(|_| UsbIdError::Overflow(text.to_owned()))
}

/// Kind of an input device. Only the tablet-like ones are tracked.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::AsRefStr)]
pub enum DeviceType {
    Pointer,
    Keyboard,
    Touchpad,
    Touchscreen,
    /// A tablet reporting through an unspecified tool.
    Tablet,
    Pen,
    Eraser,
    /// A puck or mouse-like tool.
    Cursor,
    Pad,
}

/// Where a device sits in the input hierarchy.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum DeviceMode {
    /// An aggregate device like the virtual core pointer. Never tracked.
    Logical,
    #[default]
    Physical,
    /// Detached from any logical device.
    Floating,
}

#[derive(Debug, Clone)]
pub struct Device {
    pub id: DeviceId,
    /// Human readable name.
    pub name: String,
    /// Hexadecimal vendor string, e.g. `"056a"`.
    pub vendor_id: String,
    /// Hexadecimal product string, e.g. `"0302"`.
    pub product_id: String,
    pub device_type: DeviceType,
    pub mode: DeviceMode,
    /// Axes the device advertises. New tools inherit these.
    pub axes: Capabilities,
}

impl Device {
    /// A physical device of one of the tablet-like kinds.
    #[must_use]
    pub fn is_tablet(&self) -> bool {
        self.mode != DeviceMode::Logical
            && matches!(
                self.device_type,
                DeviceType::Tablet | DeviceType::Pen | DeviceType::Eraser | DeviceType::Cursor
            )
    }
    /// The parsed vendor/product pair, `None` if either failed to parse.
    #[must_use]
    pub fn usb_id(&self) -> Option<UsbId> {
        match UsbId::parse(&self.vendor_id, &self.product_id) {
            Ok(id) => Some(id),
            Err(err) => {
                tracing::debug!(device = ?self.id, %err, "unparsable device id");
                None
            }
        }
    }
}
