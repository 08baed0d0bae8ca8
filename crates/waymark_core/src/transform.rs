//! Overworld/Nether coordinate linking and record readout.
//!
//! # Responsibility
//! - Map horizontal coordinates between the two linked dimensions.
//! - Parse stored coordinate text leniently for presentation.
//!
//! # Invariants
//! - The ratio between dimensions is fixed at 8; Y is never scaled.
//! - Parse failures never raise; they yield a zeroed, flagged readout.

use crate::model::waymark::{Dimension, Waymark};

/// Horizontal scale between Overworld and Nether.
pub const NETHER_RATIO: f64 = 8.0;

/// Horizontal position in the dimension linked to a waymark.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinkedCoordinate {
    pub target: Dimension,
    pub x: f64,
    pub z: f64,
}

impl LinkedCoordinate {
    pub fn x_label(&self) -> String {
        format_axis(self.x)
    }

    pub fn z_label(&self) -> String {
        format_axis(self.z)
    }

    /// Heading shown next to the linked values.
    pub fn caption(&self) -> &'static str {
        match self.target {
            Dimension::Nether => "Nether Link (÷8)",
            Dimension::Overworld => "Overworld Link (×8)",
        }
    }
}

/// Parsed coordinates of one waymark, ready to present.
#[derive(Debug, Clone, PartialEq)]
pub struct CoordinateReadout {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub linked: LinkedCoordinate,
    /// Set when any axis failed to parse; values are then all zero.
    pub flagged: bool,
}

impl CoordinateReadout {
    /// Teleport command for the stored position.
    pub fn teleport_command(&self) -> String {
        format!(
            "/tp {} {} {}",
            format_axis(self.x),
            format_axis(self.y),
            format_axis(self.z)
        )
    }
}

pub fn overworld_to_nether(x: f64, z: f64) -> (f64, f64) {
    (x / NETHER_RATIO, z / NETHER_RATIO)
}

pub fn nether_to_overworld(x: f64, z: f64) -> (f64, f64) {
    (x * NETHER_RATIO, z * NETHER_RATIO)
}

/// Maps `(x, z)` in `from` to the linked dimension.
pub fn link(from: Dimension, x: f64, z: f64) -> LinkedCoordinate {
    let (x, z) = match from {
        Dimension::Overworld => overworld_to_nether(x, z),
        Dimension::Nether => nether_to_overworld(x, z),
    };
    LinkedCoordinate {
        target: from.linked(),
        x,
        z,
    }
}

/// Formats one axis value with two decimals.
pub fn format_axis(value: f64) -> String {
    format!("{value:.2}")
}

/// Parses coordinate text. Accepts surrounding whitespace.
pub fn parse_axis(text: &str) -> Option<f64> {
    text.trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
}

/// Builds the presentation readout for a waymark.
pub fn readout(waymark: &Waymark) -> CoordinateReadout {
    let parsed = (
        parse_axis(&waymark.x),
        parse_axis(&waymark.y),
        parse_axis(&waymark.z),
    );
    match parsed {
        (Some(x), Some(y), Some(z)) => CoordinateReadout {
            x,
            y,
            z,
            linked: link(waymark.dimension, x, z),
            flagged: false,
        },
        _ => CoordinateReadout {
            x: 0.0,
            y: 0.0,
            z: 0.0,
            linked: LinkedCoordinate {
                target: waymark.dimension.linked(),
                x: 0.0,
                z: 0.0,
            },
            flagged: true,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::waymark::{Waymark, WaymarkDraft};

    fn waymark(x: &str, y: &str, z: &str, dimension: Dimension) -> Waymark {
        Waymark::from_draft(
            WaymarkDraft::new("probe", x, y, z, dimension),
            "01/01 00:00",
            None,
        )
    }

    #[test]
    fn overworld_spawn_links_to_nether_eighths() {
        let linked = link(Dimension::Overworld, 100.0, -200.0);
        assert_eq!(linked.target, Dimension::Nether);
        assert_eq!(linked.x_label(), "12.50");
        assert_eq!(linked.z_label(), "-25.00");
    }

    #[test]
    fn nether_links_back_times_eight() {
        let linked = link(Dimension::Nether, 12.5, -25.0);
        assert_eq!(linked.target, Dimension::Overworld);
        assert_eq!(linked.x, 100.0);
        assert_eq!(linked.z, -200.0);
        assert_eq!(linked.caption(), "Overworld Link (×8)");
    }

    #[test]
    fn forward_then_inverse_is_identity_within_tolerance() {
        let samples = [
            (0.0, 0.0),
            (1.0, -1.0),
            (123.456, -987.654),
            (-30_000_000.0, 29_999_999.9),
            (7.0, 3.3),
        ];
        for (x, z) in samples {
            let (nx, nz) = overworld_to_nether(x, z);
            let (ox, oz) = nether_to_overworld(nx, nz);
            assert!((ox - x).abs() <= 0.01, "x drifted for {x}");
            assert!((oz - z).abs() <= 0.01, "z drifted for {z}");
        }
    }

    #[test]
    fn readout_keeps_y_and_builds_teleport_command() {
        let readout = readout(&waymark("100", "64", "-200", Dimension::Overworld));
        assert!(!readout.flagged);
        assert_eq!(readout.y, 64.0);
        assert_eq!(readout.teleport_command(), "/tp 100.00 64.00 -200.00");
    }

    #[test]
    fn readout_flags_unparsable_text_and_zeroes_values() {
        let readout = readout(&waymark("abc", "64", "1", Dimension::Nether));
        assert!(readout.flagged);
        assert_eq!((readout.x, readout.y, readout.z), (0.0, 0.0, 0.0));
        assert_eq!(readout.linked.x_label(), "0.00");
        assert_eq!(readout.linked.target, Dimension::Overworld);
    }

    #[test]
    fn parse_axis_rejects_non_finite_values() {
        assert_eq!(parse_axis(" 12.5 "), Some(12.5));
        assert_eq!(parse_axis("inf"), None);
        assert_eq!(parse_axis("NaN"), None);
    }
}
