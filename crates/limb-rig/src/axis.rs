//! Signed axis labels (`X`, `-Y`, `+z`, ...) and their directions

use crate::error::RigError;
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One of the three coordinate axes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Axis {
    /// X axis
    X,
    /// Y axis
    Y,
    /// Z axis
    Z,
}

impl Axis {
    /// Channel suffix used to address components (`translateX`, `scaleZ`)
    #[must_use]
    pub fn suffix(self) -> char {
        match self {
            Axis::X => 'X',
            Axis::Y => 'Y',
            Axis::Z => 'Z',
        }
    }

    /// Component index (0, 1, 2)
    #[must_use]
    pub fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }
}

/// An axis with a direction
///
/// Parsed case-insensitively from `X`, `+X` or `-X` style labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SignedAxis {
    axis: Axis,
    negative: bool,
}

impl SignedAxis {
    /// +X
    pub const POS_X: SignedAxis = SignedAxis::new(Axis::X, false);
    /// -X
    pub const NEG_X: SignedAxis = SignedAxis::new(Axis::X, true);
    /// +Y
    pub const POS_Y: SignedAxis = SignedAxis::new(Axis::Y, false);
    /// -Y
    pub const NEG_Y: SignedAxis = SignedAxis::new(Axis::Y, true);
    /// +Z
    pub const POS_Z: SignedAxis = SignedAxis::new(Axis::Z, false);
    /// -Z
    pub const NEG_Z: SignedAxis = SignedAxis::new(Axis::Z, true);

    /// All six signed axes
    pub const ALL: [SignedAxis; 6] = [
        SignedAxis::POS_X,
        SignedAxis::NEG_X,
        SignedAxis::POS_Y,
        SignedAxis::NEG_Y,
        SignedAxis::POS_Z,
        SignedAxis::NEG_Z,
    ];

    /// Create a signed axis
    #[must_use]
    pub const fn new(axis: Axis, negative: bool) -> Self {
        Self { axis, negative }
    }

    /// Underlying base axis
    #[must_use]
    pub fn axis(self) -> Axis {
        self.axis
    }

    /// Whether the axis points down its base axis
    #[must_use]
    pub fn is_negative(self) -> bool {
        self.negative
    }

    /// `1.0` or `-1.0`
    #[must_use]
    pub fn sign(self) -> f64 {
        if self.negative {
            -1.0
        } else {
            1.0
        }
    }

    /// Channel suffix of the base axis
    #[must_use]
    pub fn suffix(self) -> char {
        self.axis.suffix()
    }

    /// Unit direction
    #[must_use]
    pub fn vector(self) -> Vector3<f64> {
        let mut v = Vector3::zeros();
        v[self.axis.index()] = self.sign();
        v
    }

    /// `{attr}{suffix}`, e.g. `scaleX`
    #[must_use]
    pub fn component(self, attr: &str) -> String {
        format!("{attr}{}", self.suffix())
    }
}

impl FromStr for SignedAxis {
    type Err = RigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let label = s.trim();
        let (negative, rest) = match label.as_bytes().first() {
            Some(b'-') => (true, &label[1..]),
            Some(b'+') => (false, &label[1..]),
            _ => (false, label),
        };
        let axis = match rest.to_ascii_uppercase().as_str() {
            "X" => Axis::X,
            "Y" => Axis::Y,
            "Z" => Axis::Z,
            _ => return Err(RigError::InvalidAxis(format!("unrecognized axis label {s:?}"))),
        };
        Ok(Self::new(axis, negative))
    }
}

impl TryFrom<String> for SignedAxis {
    type Error = RigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SignedAxis> for String {
    fn from(value: SignedAxis) -> Self {
        value.to_string()
    }
}

impl fmt::Display for SignedAxis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.negative {
            write!(f, "-{}", self.suffix())
        } else {
            write!(f, "{}", self.suffix())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_signed_labels() {
        assert_eq!("X".parse::<SignedAxis>().unwrap(), SignedAxis::POS_X);
        assert_eq!("+y".parse::<SignedAxis>().unwrap(), SignedAxis::POS_Y);
        assert_eq!(" -Z ".parse::<SignedAxis>().unwrap(), SignedAxis::NEG_Z);
    }

    #[test]
    fn rejects_unknown_labels() {
        for label in ["", "W", "--X", "XY", "-"] {
            let err = label.parse::<SignedAxis>().unwrap_err();
            assert!(matches!(err, RigError::InvalidAxis(_)), "{label:?}");
        }
    }

    #[test]
    fn vectors_are_signed_units() {
        assert_eq!(SignedAxis::NEG_Y.vector(), Vector3::new(0.0, -1.0, 0.0));
        for axis in SignedAxis::ALL {
            assert!((axis.vector().norm() - 1.0).abs() < f64::EPSILON);
        }
    }

    #[test]
    fn display_round_trips_through_parse() {
        for axis in SignedAxis::ALL {
            assert_eq!(axis.to_string().parse::<SignedAxis>().unwrap(), axis);
        }
        assert_eq!(SignedAxis::NEG_X.component("scale"), "scaleX");
    }
}
