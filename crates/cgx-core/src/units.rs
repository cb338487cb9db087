//! Unit newtypes for the quantities carried by the network model.
//!
//! Power flows, set points and limits in the converted network are expressed
//! in engineering units (MW, Mvar, kV, degrees). Keeping them as distinct types
//! stops a reactive set point from being written into an active-power field,
//! which is an easy mistake when the source graph stores everything as `f64`.
//!
//! ```
//! use cgx_core::units::{Degrees, Megawatts};
//!
//! let p = Megawatts(12.5);
//! assert_eq!((-p).value(), -12.5);
//!
//! let alpha = Degrees(90.0).to_radians();
//! assert!((alpha.sin() - 1.0).abs() < 1e-12);
//! ```

use serde::{Deserialize, Serialize};
use std::ops::{Add, Mul, Neg, Sub};

macro_rules! impl_unit_ops {
    ($type:ty, $unit_name:literal) => {
        impl Add for $type {
            type Output = Self;
            fn add(self, rhs: Self) -> Self::Output {
                Self(self.0 + rhs.0)
            }
        }

        impl Sub for $type {
            type Output = Self;
            fn sub(self, rhs: Self) -> Self::Output {
                Self(self.0 - rhs.0)
            }
        }

        impl Neg for $type {
            type Output = Self;
            fn neg(self) -> Self::Output {
                Self(-self.0)
            }
        }

        impl Mul<f64> for $type {
            type Output = Self;
            fn mul(self, rhs: f64) -> Self::Output {
                Self(self.0 * rhs)
            }
        }

        impl std::fmt::Display for $type {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{:.4} {}", self.0, $unit_name)
            }
        }

        impl $type {
            #[inline]
            pub const fn new(value: f64) -> Self {
                Self(value)
            }

            /// Raw numeric value
            #[inline]
            pub const fn value(self) -> f64 {
                self.0
            }

            #[inline]
            pub fn abs(self) -> Self {
                Self(self.0.abs())
            }

            #[inline]
            pub fn is_nan(self) -> bool {
                self.0.is_nan()
            }

            #[inline]
            pub fn min(self, other: Self) -> Self {
                Self(self.0.min(other.0))
            }

            #[inline]
            pub fn max(self, other: Self) -> Self {
                Self(self.0.max(other.0))
            }
        }
    };
}

/// Active power in megawatts (MW).
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[repr(transparent)]
pub struct Megawatts(pub f64);

impl_unit_ops!(Megawatts, "MW");

/// Reactive power in megavolt-amperes reactive (Mvar).
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[repr(transparent)]
pub struct Megavars(pub f64);

impl_unit_ops!(Megavars, "Mvar");

/// Voltage in kilovolts (kV).
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[repr(transparent)]
pub struct Kilovolts(pub f64);

impl_unit_ops!(Kilovolts, "kV");

/// Current in amperes (A), used for operational current limits.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[repr(transparent)]
pub struct Amperes(pub f64);

impl_unit_ops!(Amperes, "A");

/// Angle in radians.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[repr(transparent)]
pub struct Radians(pub f64);

impl_unit_ops!(Radians, "rad");

/// Angle in degrees. Tap-changer step tables and bus angles are stored in degrees.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[repr(transparent)]
pub struct Degrees(pub f64);

impl_unit_ops!(Degrees, "°");

impl Radians {
    #[inline]
    pub fn to_degrees(self) -> Degrees {
        Degrees(self.0.to_degrees())
    }

    #[inline]
    pub fn sin(self) -> f64 {
        self.0.sin()
    }

    #[inline]
    pub fn cos(self) -> f64 {
        self.0.cos()
    }

    #[inline]
    pub fn tan(self) -> f64 {
        self.0.tan()
    }

    pub const ZERO: Self = Self(0.0);
}

impl Degrees {
    #[inline]
    pub fn to_radians(self) -> Radians {
        Radians(self.0.to_radians())
    }

    pub const ZERO: Self = Self(0.0);

    /// Right angle, the default winding connection angle of phase shifters.
    pub const RIGHT: Self = Self(90.0);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn power_arithmetic_keeps_units() {
        let p1 = Megawatts(100.0);
        let p2 = Megawatts(40.0);

        assert_eq!((p1 + p2).value(), 140.0);
        assert_eq!((p1 - p2).value(), 60.0);
        assert_eq!((-p1).value(), -100.0);
        assert_eq!((p2 * 0.5).value(), 20.0);
    }

    #[test]
    fn angle_round_trip_through_radians() {
        let rad = Degrees(180.0).to_radians();
        assert!((rad.value() - std::f64::consts::PI).abs() < 1e-12);
        assert!((rad.to_degrees().value() - 180.0).abs() < 1e-12);
        assert!((Degrees(30.0).to_radians().sin() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn display_includes_unit_suffix() {
        assert_eq!(format!("{}", Kilovolts(400.0)), "400.0000 kV");
        assert_eq!(format!("{}", Megavars(-2.5)), "-2.5000 Mvar");
        assert_eq!(format!("{}", Degrees(45.0)), "45.0000 °");
    }
}
