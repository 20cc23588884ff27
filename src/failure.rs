//! Break decision and display stress for a single member.
//!
//! The model is deliberately simple: a member breaks when its length leaves
//! the band `[(2 - max_stretch) * rest, max_stretch * rest]`. Both bounds are
//! exclusive, so a member sitting exactly on a threshold survives.

/// Outcome of evaluating one member.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Verdict {
    /// Current length divided by rest length.
    pub ratio: f64,
    /// Normalised deformation for display.
    pub stress: f64,
    /// Whether the member breaks at this ratio.
    pub failed: bool,
}

/// Current length divided by rest length; `1.0` is undeformed.
#[must_use]
pub fn deformation_ratio(current_length: f64, rest_length: f64) -> f64 {
    current_length / rest_length
}

/// Display stress `|1 - ratio| * scale`; not used to decide failure.
#[must_use]
pub fn stress(ratio: f64, scale: f64) -> f64 {
    (1.0 - ratio).abs() * scale
}

/// Whether a member at `ratio` breaks.
///
/// # Examples
/// ```
/// use trussim::failure::breaks;
///
/// assert!(!breaks(1.12, 1.12));
/// assert!(breaks(1.13, 1.12));
/// assert!(breaks(0.87, 1.12));
/// ```
#[must_use]
pub fn breaks(ratio: f64, max_stretch: f64) -> bool {
    ratio > max_stretch || ratio < 2.0 - max_stretch
}

/// Evaluate a member of the given lengths and material threshold.
#[must_use]
pub fn evaluate(current_length: f64, rest_length: f64, max_stretch: f64, stress_scale: f64) -> Verdict {
    let ratio = deformation_ratio(current_length, rest_length);
    Verdict {
        ratio,
        stress: stress(ratio, stress_scale),
        failed: breaks(ratio, max_stretch),
    }
}
