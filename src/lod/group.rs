//! LOD levels and level selection.

use super::transition::{LodTransition, TransitionMode};
use crate::geometry::Mesh;
use crate::math::Aabb;
use log::debug;
use std::borrow::Cow;

/// One level of detail.
#[derive(Debug, Clone)]
pub struct LodLevel {
    /// Geometry for this level.
    pub mesh: Mesh,
    /// Farthest camera distance this level is meant for.
    pub max_distance: f64,
    /// Smallest screen coverage (fraction of the horizontal field of view)
    /// this level is meant for.
    pub screen_coverage: f64,
}

impl LodLevel {
    /// Create a level.
    pub fn new(mesh: Mesh, max_distance: f64, screen_coverage: f64) -> Self {
        Self {
            mesh,
            max_distance,
            screen_coverage,
        }
    }
}

/// Metric used to pick a level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LodMetric {
    /// Camera distance with hysteresis.
    #[default]
    Distance,
    /// Projected size relative to the field of view.
    ScreenCoverage,
}

/// What to draw for a group this frame.
#[derive(Debug, Clone)]
pub enum LodDraw<'a> {
    /// One level, drawn normally.
    Single(&'a Mesh),
    /// Outgoing and incoming levels blended by `alpha`.
    Fade {
        /// Outgoing level.
        from: &'a Mesh,
        /// Incoming level.
        to: &'a Mesh,
        /// Weight of the incoming level.
        alpha: f64,
    },
    /// Outgoing and incoming levels dithered by `alpha`.
    CrossFade {
        /// Outgoing level.
        from: &'a Mesh,
        /// Incoming level.
        to: &'a Mesh,
        /// Share of pixels taken by the incoming level.
        alpha: f64,
    },
    /// Vertex-blended mesh.
    Morph(Cow<'a, Mesh>),
}

/// A set of levels for one object, sorted by increasing `max_distance`.
#[derive(Debug, Clone)]
pub struct LodGroup {
    levels: Vec<LodLevel>,
    current: usize,
    /// Distance band around a switch point in which the level is kept.
    pub hysteresis: f64,
    /// Transition style for level switches.
    pub mode: TransitionMode,
    /// Transition length in seconds.
    pub duration: f64,
    /// Selection metric used by the renderer.
    pub metric: LodMetric,
    transition: Option<LodTransition>,
    anchor: Option<f64>,
}

impl LodGroup {
    /// Create a group; levels are sorted by `max_distance`.
    pub fn new(mut levels: Vec<LodLevel>) -> Self {
        levels.sort_by(|a, b| a.max_distance.total_cmp(&b.max_distance));
        Self {
            levels,
            current: 0,
            hysteresis: 0.0,
            mode: TransitionMode::None,
            duration: 0.0,
            metric: LodMetric::Distance,
            transition: None,
            anchor: None,
        }
    }

    /// Set the hysteresis band.
    pub fn with_hysteresis(mut self, hysteresis: f64) -> Self {
        self.hysteresis = hysteresis.max(0.0);
        self
    }

    /// Set the transition style.
    pub fn with_transition(mut self, mode: TransitionMode, duration: f64) -> Self {
        self.mode = mode;
        self.duration = duration.max(0.0);
        self
    }

    /// Set the selection metric.
    pub fn with_metric(mut self, metric: LodMetric) -> Self {
        self.metric = metric;
        self
    }

    /// Levels in ascending distance order.
    #[inline]
    pub fn levels(&self) -> &[LodLevel] {
        &self.levels
    }

    /// Index of the active level.
    #[inline]
    pub fn current(&self) -> usize {
        self.current
    }

    /// The active level.
    #[inline]
    pub fn current_level(&self) -> Option<&LodLevel> {
        self.levels.get(self.current)
    }

    /// The running transition, if any.
    #[inline]
    pub fn transition(&self) -> Option<&LodTransition> {
        self.transition.as_ref()
    }

    /// Bounds of everything [`LodGroup::draw`] may emit: the active level,
    /// joined with the outgoing level while a transition runs. Morphed
    /// vertices lie between the two levels' vertices, so the union covers
    /// them too.
    pub fn bounds(&self) -> Aabb {
        let current = self.current_level().map_or(Aabb::EMPTY, |l| l.mesh.bounds());
        match self.transition.and_then(|t| self.levels.get(t.from)) {
            Some(from) if self.mode != TransitionMode::None => current.union(&from.mesh.bounds()),
            _ => current,
        }
    }

    /// Pick the level for a camera distance.
    ///
    /// Without hysteresis this is the first level whose `max_distance`
    /// covers `distance` (the last level beyond that). The current level is
    /// kept while `distance` stays within `hysteresis` of its own
    /// `max_distance` or of the distance at which it was chosen.
    pub fn select_by_distance(&mut self, distance: f64) -> usize {
        if self.levels.is_empty() {
            return 0;
        }
        if let Some(anchor) = self.anchor {
            let boundary = self.levels[self.current].max_distance;
            if (distance - boundary).abs() < self.hysteresis
                || (distance - anchor).abs() < self.hysteresis
            {
                return self.current;
            }
        }
        let target = self
            .levels
            .iter()
            .position(|l| l.max_distance >= distance)
            .unwrap_or(self.levels.len() - 1);
        self.switch_to(target, distance);
        self.current
    }

    /// Pick the level for a screen coverage (fraction of the horizontal field
    /// of view): the first level whose threshold is at most `coverage`.
    pub fn select_by_coverage(&mut self, coverage: f64) -> usize {
        if self.levels.is_empty() {
            return 0;
        }
        let target = self
            .levels
            .iter()
            .position(|l| l.screen_coverage <= coverage)
            .unwrap_or(self.levels.len() - 1);
        self.switch_to(target, coverage);
        self.current
    }

    fn switch_to(&mut self, target: usize, at: f64) {
        if self.anchor.is_some() && target == self.current {
            return;
        }
        let first = self.anchor.is_none();
        self.anchor = Some(at);
        if target == self.current {
            return;
        }
        debug!("lod switch {} -> {} at {:.2}", self.current, target, at);
        if !first && self.mode != TransitionMode::None && self.duration > 0.0 {
            self.transition = Some(LodTransition::new(self.current, target, self.duration));
        } else {
            self.transition = None;
        }
        self.current = target;
    }

    /// Advance the running transition by `dt` seconds.
    pub fn update(&mut self, dt: f64) {
        if let Some(t) = self.transition.as_mut() {
            if t.advance(dt) {
                self.transition = None;
            }
        }
    }

    /// Geometry to draw this frame.
    pub fn draw(&self) -> Option<LodDraw<'_>> {
        let current = &self.current_level()?.mesh;
        let Some(t) = self.transition else {
            return Some(LodDraw::Single(current));
        };
        let Some(from) = self.levels.get(t.from).map(|l| &l.mesh) else {
            return Some(LodDraw::Single(current));
        };
        let alpha = t.alpha();
        Some(match self.mode {
            TransitionMode::None => LodDraw::Single(current),
            TransitionMode::Fade => LodDraw::Fade { from, to: current, alpha },
            TransitionMode::CrossFade => LodDraw::CrossFade { from, to: current, alpha },
            TransitionMode::Morph => match from.morph_towards(current, alpha) {
                Some(mesh) => LodDraw::Morph(Cow::Owned(mesh)),
                None => LodDraw::Single(current),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material::Material;
    use crate::math::Vector3;
    use std::sync::Arc;

    fn mesh(vertices: usize) -> Mesh {
        Mesh::new(vec![Vector3::ZERO; vertices], vec![], Arc::new(Material::default()))
    }

    fn group() -> LodGroup {
        LodGroup::new(vec![
            LodLevel::new(mesh(3), 30.0, 0.1),
            LodLevel::new(mesh(3), 10.0, 0.5),
        ])
        .with_hysteresis(5.0)
    }

    #[test]
    fn test_levels_sorted() {
        let g = group();
        assert_eq!(g.levels()[0].max_distance, 10.0);
        assert_eq!(g.levels()[1].max_distance, 30.0);
    }

    #[test]
    fn test_distance_selection() {
        let mut g = LodGroup::new(vec![
            LodLevel::new(mesh(3), 10.0, 0.5),
            LodLevel::new(mesh(3), 30.0, 0.1),
        ]);
        assert_eq!(g.select_by_distance(5.0), 0);
        assert_eq!(g.select_by_distance(10.0), 0);
        assert_eq!(g.select_by_distance(10.5), 1);
        assert_eq!(g.select_by_distance(100.0), 1);
    }

    #[test]
    fn test_hysteresis() {
        let mut g = group();
        for d in [9.0, 12.0, 9.0] {
            assert_eq!(g.select_by_distance(d), 0);
        }
        let mut g = group();
        let picks: Vec<_> = [9.0, 16.0, 9.0].iter().map(|d| g.select_by_distance(*d)).collect();
        assert_eq!(picks, vec![0, 1, 0]);
    }

    #[test]
    fn test_coverage_selection() {
        let mut g = group();
        assert_eq!(g.select_by_coverage(0.8), 0);
        assert_eq!(g.select_by_coverage(0.2), 1);
        assert_eq!(g.select_by_coverage(0.01), 1);
    }

    #[test]
    fn test_fade_transition() {
        let mut g = group().with_transition(TransitionMode::Fade, 1.0);
        g.select_by_distance(0.0);
        assert!(g.transition().is_none());
        g.select_by_distance(50.0);
        g.update(0.5);
        match g.draw() {
            Some(LodDraw::Fade { alpha, .. }) => assert!((alpha - 0.5).abs() < 1e-12),
            other => panic!("expected fade, got {other:?}"),
        }
        g.update(0.6);
        assert!(matches!(g.draw(), Some(LodDraw::Single(_))));
    }

    #[test]
    fn test_morph_needs_matching_vertices() {
        let mut g = LodGroup::new(vec![
            LodLevel::new(mesh(3), 10.0, 0.5),
            LodLevel::new(mesh(4), 30.0, 0.1),
        ])
        .with_transition(TransitionMode::Morph, 1.0);
        g.select_by_distance(0.0);
        g.select_by_distance(20.0);
        assert!(matches!(g.draw(), Some(LodDraw::Single(_))));
    }

    #[test]
    fn test_bounds_cover_outgoing_level() {
        let material = Arc::new(Material::default());
        for mode in [TransitionMode::Fade, TransitionMode::CrossFade, TransitionMode::Morph] {
            let mut g = LodGroup::new(vec![
                LodLevel::new(Mesh::cube(24.0, material.clone()), 10.0, 0.5),
                LodLevel::new(Mesh::cube(6.0, material.clone()), 30.0, 0.1),
            ])
            .with_transition(mode, 1.0);
            g.select_by_distance(0.0);
            g.select_by_distance(20.0);
            g.update(0.3);
            let bounds = g.bounds();
            assert!(bounds.contains_box(&g.levels()[0].mesh.bounds()), "{:?}", mode);
            if let Some(LodDraw::Morph(mesh)) = g.draw() {
                assert!(bounds.contains_box(&mesh.bounds()));
            }

            g.update(1.0);
            assert!(g.transition().is_none());
            assert_eq!(g.bounds(), g.levels()[1].mesh.bounds());
        }
    }

    #[test]
    fn test_empty_group() {
        let mut g = LodGroup::new(vec![]);
        assert_eq!(g.select_by_distance(3.0), 0);
        assert!(g.draw().is_none());
        assert!(g.bounds().is_empty());
    }
}
