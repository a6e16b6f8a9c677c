//! Single-byte command arguments.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A mode name that matches no variant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} {value:?} (expected one of: {expected})")]
pub struct ParseModeError {
    pub kind: &'static str,
    pub value: String,
    pub expected: String,
}

macro_rules! byte_modes {
    (
        $(#[$meta:meta])*
        $name:ident, $kind:literal {
            $($(#[$vmeta:meta])* $variant:ident = $byte:literal => $text:literal,)+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $($(#[$vmeta])* #[serde(rename = $text)] $variant,)+
        }

        impl $name {
            /// Every variant, in wire-value order.
            pub const ALL: &'static [$name] = &[$($name::$variant,)+];

            /// The payload byte sent for this variant.
            pub fn as_byte(self) -> u8 {
                match self {
                    $($name::$variant => $byte,)+
                }
            }

            /// The variant carried by a payload byte, if any.
            pub fn from_byte(byte: u8) -> Option<Self> {
                match byte {
                    $($byte => Some($name::$variant),)+
                    _ => None,
                }
            }

            pub fn name(self) -> &'static str {
                match self {
                    $($name::$variant => $text,)+
                }
            }
        }

        impl FromStr for $name {
            type Err = ParseModeError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::ALL
                    .iter()
                    .copied()
                    .find(|mode| mode.name().eq_ignore_ascii_case(s))
                    .ok_or_else(|| ParseModeError {
                        kind: $kind,
                        value: s.to_string(),
                        expected: Self::ALL
                            .iter()
                            .map(|mode| mode.name())
                            .collect::<Vec<_>>()
                            .join(", "),
                    })
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.name())
            }
        }
    };
}

byte_modes! {
    /// Base gimbal motion and calibration actions.
    GimbalAction, "gimbal action" {
        Stop = 0x00 => "stop",
        Up = 0x01 => "up",
        Down = 0x02 => "down",
        Left = 0x03 => "left",
        Right = 0x04 => "right",
        Center = 0x05 => "center",
        FollowMode = 0x06 => "follow-mode",
        LockMode = 0x07 => "lock-mode",
        ToggleMode = 0x08 => "toggle-mode",
        Calibrate = 0x09 => "calibrate",
        CeilingMount = 0x0A => "ceiling-mount",
        InvertedMount = 0x0B => "inverted-mount",
        LevelCalibrate = 0x0C => "level-calibrate",
        VerticalCalibrate = 0x0D => "vertical-calibrate",
    }
}

byte_modes! {
    /// Recording control.
    RecordState, "record state" {
        Stop = 0x00 => "stop",
        Start = 0x01 => "start",
        Toggle = 0x0A => "toggle",
    }
}

byte_modes! {
    /// Visible-light zoom steps.
    ZoomMode, "zoom mode" {
        Zoom1x = 0x00 => "1x",
        Zoom2x = 0x01 => "2x",
        Zoom3x = 0x02 => "3x",
        Zoom4x = 0x03 => "4x",
        ZoomIn = 0x0A => "in",
        ZoomOut = 0x0B => "out",
    }
}

byte_modes! {
    /// Thermal false-color palettes.
    ColorMode, "color mode" {
        WhiteHot = 0x01 => "white-hot",
        Sepia = 0x03 => "sepia",
        Ironbow = 0x04 => "ironbow",
        Rainbow = 0x05 => "rainbow",
        Night = 0x06 => "night",
        Aurora = 0x07 => "aurora",
        RedHot = 0x08 => "red-hot",
        Jungle = 0x09 => "jungle",
        Medical = 0x0A => "medical",
        BlackHot = 0x0B => "black-hot",
        GoldHot = 0x0C => "gold-hot",
    }
}

byte_modes! {
    /// Physical mounting orientation.
    InstallMode, "install mode" {
        /// Hanging below the mount.
        Lift = 0x0A => "lift",
        /// Upright on the mount.
        Reverse = 0x0B => "reverse",
    }
}

/// Recording state reported by the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RecordingStatus {
    Idle,
    Recording,
}

impl RecordingStatus {
    /// Status byte `01` means recording; anything else is idle.
    pub fn from_byte(byte: u8) -> Self {
        if byte == 0x01 {
            RecordingStatus::Recording
        } else {
            RecordingStatus::Idle
        }
    }

    pub fn is_recording(self) -> bool {
        self == RecordingStatus::Recording
    }
}

impl fmt::Display for RecordingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordingStatus::Idle => f.write_str("idle"),
            RecordingStatus::Recording => f.write_str("recording"),
        }
    }
}
