//! Easing curves
//!
//! Map linear progress in `[0, 1]` onto eased progress.

/// Easing function applied to animation progress
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum Easing {
    Linear,
    /// `1 - 2^(-10t)`, snapped to exactly 1 at `t == 1`
    #[default]
    EaseOutExpo,
    EaseOutCubic,
    EaseInOut,
}

impl Easing {
    /// Apply the curve to `t`
    ///
    /// `t` is clamped to `[0, 1]`. Every curve returns exactly 0 at 0 and
    /// exactly 1 at 1.
    pub fn apply(&self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::EaseOutExpo => {
                // 2^-10 would leave a residue of ~0.001 at the end
                if t >= 1.0 {
                    1.0
                } else {
                    1.0 - 2f64.powf(-10.0 * t)
                }
            }
            Easing::EaseOutCubic => 1.0 - (1.0 - t).powi(3),
            Easing::EaseInOut => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
                }
            }
        }
    }
}
