//! Blending between two LOD levels.

use crate::math::ease_in_out_quad;
use serde::{Deserialize, Serialize};

/// How a level switch is presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TransitionMode {
    /// Switch instantly.
    #[default]
    None,
    /// Draw both levels with complementary alpha.
    Fade,
    /// Draw both levels with complementary dither patterns.
    CrossFade,
    /// Lerp vertex positions. Falls back to an instant switch when the
    /// levels have different vertex counts.
    Morph,
}

/// An in-progress switch from one level to another.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LodTransition {
    /// Level being faded out.
    pub from: usize,
    /// Level being faded in.
    pub to: usize,
    elapsed: f64,
    duration: f64,
}

impl LodTransition {
    /// Start a transition.
    pub fn new(from: usize, to: usize, duration: f64) -> Self {
        Self {
            from,
            to,
            elapsed: 0.0,
            duration,
        }
    }

    /// Advance by `dt` seconds. Returns `true` once finished.
    pub fn advance(&mut self, dt: f64) -> bool {
        self.elapsed += dt.max(0.0);
        self.is_finished()
    }

    /// Whether the transition has run its full duration.
    #[inline]
    pub fn is_finished(&self) -> bool {
        self.elapsed >= self.duration
    }

    /// Linear progress in 0.0-1.0.
    #[inline]
    pub fn progress(&self) -> f64 {
        if self.duration <= 0.0 {
            1.0
        } else {
            (self.elapsed / self.duration).clamp(0.0, 1.0)
        }
    }

    /// Eased weight of the incoming level.
    #[inline]
    pub fn alpha(&self) -> f64 {
        ease_in_out_quad(self.progress())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alpha_eases() {
        let mut t = LodTransition::new(0, 1, 1.0);
        assert_eq!(t.alpha(), 0.0);
        t.advance(0.25);
        assert!((t.alpha() - 0.125).abs() < 1e-12);
        t.advance(0.25);
        assert!((t.alpha() - 0.5).abs() < 1e-12);
        assert!(!t.is_finished());
        assert!(t.advance(0.5));
        assert_eq!(t.alpha(), 1.0);
    }

    #[test]
    fn test_zero_duration() {
        let t = LodTransition::new(0, 1, 0.0);
        assert!(t.is_finished());
        assert_eq!(t.alpha(), 1.0);
    }
}
