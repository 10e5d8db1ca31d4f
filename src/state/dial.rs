//! Visual mapping of the remaining countdown time onto a circular dial.

use std::f64::consts::PI;

/// Radius of the dial in SVG user units; the dial is centred on the origin.
const RADIUS: f64 = 50.0;

/// Everything a client needs to draw the countdown dial.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dial {
    /// Elapsed portion of the dial, in degrees (0 to 360).
    pub angle: u32,
    /// SVG path describing the elapsed sector.
    pub path: String,
    /// Fill color ranging from green (full time) to red (no time left).
    pub color: String,
}

impl Dial {
    /// Compute the dial for `remaining` seconds out of `duration`.
    pub fn new(remaining: f64, duration: f64) -> Self {
        let angle = arc_angle(remaining, duration);
        Self {
            angle,
            path: arc_path(angle),
            color: ramp_color(remaining, duration),
        }
    }
}

fn fraction(remaining: f64, duration: f64) -> f64 {
    if duration <= 0.0 {
        return 0.0;
    }
    (remaining / duration).clamp(0.0, 1.0)
}

/// Elapsed angle: `360 - round(360 * remaining / duration)`.
pub fn arc_angle(remaining: f64, duration: f64) -> u32 {
    360 - (360.0 * fraction(remaining, duration)).round() as u32
}

/// Sector path starting at twelve o'clock and sweeping clockwise by `angle` degrees.
pub fn arc_path(angle: u32) -> String {
    let radians = f64::from(angle) * PI / 180.0;
    let x = RADIUS * radians.sin();
    let y = -RADIUS * radians.cos();
    let large_arc = if angle <= 180 { 0 } else { 1 };
    format!("M 0 -50 A 50 50 0 {large_arc} 1 {x:.3} {y:.3} L 0 0 Z")
}

/// Two-segment ramp over `0..=511`: the upper half fades red in while green stays
/// full, the lower half fades green out while red stays full.
pub fn ramp_color(remaining: f64, duration: f64) -> String {
    let x = ((512.0 * fraction(remaining, duration)).floor() as u32).min(511);
    let (red, green) = if x > 255 { (511 - x, 0xff) } else { (0xff, x) };
    format!("#{red:02x}{green:02x}00")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_time_is_green_and_empty() {
        let dial = Dial::new(60.0, 60.0);
        assert_eq!(dial.angle, 0);
        assert_eq!(dial.color, "#00ff00");
        assert_eq!(dial.path, "M 0 -50 A 50 50 0 0 1 0.000 -50.000 L 0 0 Z");
    }

    #[test]
    fn no_time_left_is_red() {
        assert_eq!(ramp_color(0.0, 60.0), "#ff0000");
        assert_eq!(arc_angle(0.0, 60.0), 360);
    }

    #[test]
    fn half_time_is_yellow_and_half_swept() {
        assert_eq!(ramp_color(30.0, 60.0), "#ffff00");
        assert_eq!(arc_angle(30.0, 60.0), 180);
        assert_eq!(
            arc_path(180),
            "M 0 -50 A 50 50 0 0 1 0.000 50.000 L 0 0 Z"
        );
    }

    #[test]
    fn color_segments_meet_in_the_middle() {
        assert_eq!(ramp_color(45.0, 60.0), "#7fff00");
        assert_eq!(ramp_color(15.0, 60.0), "#ff8000");
    }

    #[test]
    fn quarter_sweep_uses_small_arc() {
        assert_eq!(arc_path(90), "M 0 -50 A 50 50 0 0 1 50.000 -0.000 L 0 0 Z");
        assert!(arc_path(270).contains(" 1 1 -50.000 "));
    }

    #[test]
    fn out_of_range_values_are_clamped() {
        assert_eq!(arc_angle(75.0, 60.0), 0);
        assert_eq!(ramp_color(-1.0, 60.0), "#ff0000");
        assert_eq!(arc_angle(5.0, 0.0), 360);
    }
}
