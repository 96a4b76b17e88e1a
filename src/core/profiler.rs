//! Per-phase frame timing and counters.

use super::DropReason;
use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Pipeline phases timed by the [`Profiler`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Scene callbacks and transform propagation.
    Update,
    /// Frustum culling and LOD selection.
    Cull,
    /// Tile/job binning.
    Bin,
    /// Triangle setup and rasterization.
    Raster,
    /// Combining per-worker scratch buffers.
    Merge,
    /// Antialiasing resolve.
    Resolve,
    /// Encoding and writing the frame.
    Present,
}

impl Phase {
    /// All phases, in pipeline order.
    pub const ALL: [Phase; 7] = [
        Phase::Update,
        Phase::Cull,
        Phase::Bin,
        Phase::Raster,
        Phase::Merge,
        Phase::Resolve,
        Phase::Present,
    ];

    /// Short label used in the summary line.
    pub const fn label(self) -> &'static str {
        match self {
            Phase::Update => "upd",
            Phase::Cull => "cull",
            Phase::Bin => "bin",
            Phase::Raster => "rast",
            Phase::Merge => "merge",
            Phase::Resolve => "aa",
            Phase::Present => "out",
        }
    }
}

/// Counters for one frame. Workers keep their own copy and merge at the end.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Nodes that survived frustum culling.
    pub nodes_visible: u64,
    /// Triangles handed to the pipeline.
    pub triangles_submitted: u64,
    /// Triangles that reached the rasterizer (after clipping splits).
    pub triangles_drawn: u64,
    /// Lines that reached the rasterizer.
    pub lines_drawn: u64,
    /// Framebuffer cells written.
    pub pixels_written: u64,
    /// Dropped primitives, indexed by [`DropReason::index`].
    pub drops: [u64; 4],
    /// Pool allocations that spilled to the heap.
    pub pool_overflows: u64,
}

impl FrameStats {
    /// Count a dropped primitive.
    #[inline]
    pub fn record_drop(&mut self, reason: DropReason) {
        self.drops[reason.index()] += 1;
    }

    /// Dropped primitives for a reason.
    #[inline]
    pub fn dropped(&self, reason: DropReason) -> u64 {
        self.drops[reason.index()]
    }

    /// Fold another worker's counters into these.
    pub fn merge(&mut self, other: &FrameStats) {
        self.nodes_visible += other.nodes_visible;
        self.triangles_submitted += other.triangles_submitted;
        self.triangles_drawn += other.triangles_drawn;
        self.lines_drawn += other.lines_drawn;
        self.pixels_written += other.pixels_written;
        for (a, b) in self.drops.iter_mut().zip(other.drops.iter()) {
            *a += b;
        }
        self.pool_overflows += other.pool_overflows;
    }
}

/// Rolling per-phase timings plus the counters of the last finished frame.
#[derive(Debug)]
pub struct Profiler {
    window: usize,
    history: [VecDeque<Duration>; 7],
    frame_times: VecDeque<Duration>,
    current: [Duration; 7],
    frame_start: Option<Instant>,
    stats: FrameStats,
    last_stats: FrameStats,
    frames: u64,
}

impl Default for Profiler {
    fn default() -> Self {
        Self::new(60)
    }
}

impl Profiler {
    /// Profiler averaging over the last `window` frames.
    pub fn new(window: usize) -> Self {
        Self {
            window: window.max(1),
            history: Default::default(),
            frame_times: VecDeque::new(),
            current: [Duration::ZERO; 7],
            frame_start: None,
            stats: FrameStats::default(),
            last_stats: FrameStats::default(),
            frames: 0,
        }
    }

    /// Start timing a frame and clear the counters.
    pub fn begin_frame(&mut self) {
        self.current = [Duration::ZERO; 7];
        self.stats = FrameStats::default();
        self.frame_start = Some(Instant::now());
    }

    /// Close the frame and push its timings into the rolling window.
    pub fn end_frame(&mut self) {
        for (history, spent) in self.history.iter_mut().zip(self.current.iter()) {
            push_bounded(history, *spent, self.window);
        }
        if let Some(start) = self.frame_start.take() {
            push_bounded(&mut self.frame_times, start.elapsed(), self.window);
        }
        self.last_stats = std::mem::take(&mut self.stats);
        self.frames += 1;
    }

    /// Add time to a phase of the current frame.
    #[inline]
    pub fn record(&mut self, phase: Phase, spent: Duration) {
        self.current[phase as usize] += spent;
    }

    /// Run `f` and charge its duration to `phase`.
    pub fn time<R>(&mut self, phase: Phase, f: impl FnOnce() -> R) -> R {
        let start = Instant::now();
        let result = f();
        self.record(phase, start.elapsed());
        result
    }

    /// Counters of the frame in progress.
    #[inline]
    pub fn stats_mut(&mut self) -> &mut FrameStats {
        &mut self.stats
    }

    /// Counters of the frame in progress.
    #[inline]
    pub fn stats(&self) -> &FrameStats {
        &self.stats
    }

    /// Counters of the last finished frame.
    #[inline]
    pub fn last_stats(&self) -> &FrameStats {
        &self.last_stats
    }

    /// Frames completed.
    #[inline]
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Mean duration of a phase over the window.
    pub fn average(&self, phase: Phase) -> Duration {
        mean(&self.history[phase as usize])
    }

    /// Mean wall time per frame over the window.
    pub fn average_frame(&self) -> Duration {
        mean(&self.frame_times)
    }

    /// Frames per second implied by the average frame time.
    pub fn fps(&self) -> f64 {
        let secs = self.average_frame().as_secs_f64();
        if secs > 0.0 { 1.0 / secs } else { 0.0 }
    }

    /// One-line summary for the debug row.
    pub fn summary_line(&self) -> String {
        let mut line = format!("{:.1} fps |", self.fps());
        for phase in Phase::ALL {
            let ms = self.average(phase).as_secs_f64() * 1000.0;
            line.push_str(&format!(" {} {:.2}ms", phase.label(), ms));
        }
        let s = &self.last_stats;
        line.push_str(&format!(
            " | tris {}/{} px {}",
            s.triangles_drawn, s.triangles_submitted, s.pixels_written
        ));
        for reason in DropReason::ALL {
            line.push_str(&format!(" {} {}", reason.label(), s.dropped(reason)));
        }
        if s.pool_overflows > 0 {
            line.push_str(&format!(" overflow {}", s.pool_overflows));
        }
        line
    }
}

fn push_bounded(queue: &mut VecDeque<Duration>, value: Duration, window: usize) {
    if queue.len() == window {
        queue.pop_front();
    }
    queue.push_back(value);
}

fn mean(queue: &VecDeque<Duration>) -> Duration {
    if queue.is_empty() {
        return Duration::ZERO;
    }
    queue.iter().sum::<Duration>() / queue.len() as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rolling_average() {
        let mut profiler = Profiler::new(2);
        for ms in [10, 20, 40] {
            profiler.begin_frame();
            profiler.record(Phase::Raster, Duration::from_millis(ms));
            profiler.end_frame();
        }
        // Window of 2 keeps 20 and 40.
        assert_eq!(profiler.average(Phase::Raster), Duration::from_millis(30));
        assert_eq!(profiler.average(Phase::Merge), Duration::ZERO);
        assert_eq!(profiler.frames(), 3);
    }

    #[test]
    fn test_stats_merge_and_summary() {
        let mut a = FrameStats::default();
        a.record_drop(DropReason::Backface);
        a.triangles_drawn = 3;
        let mut b = FrameStats::default();
        b.record_drop(DropReason::Backface);
        b.pixels_written = 9;
        a.merge(&b);
        assert_eq!(a.dropped(DropReason::Backface), 2);
        assert_eq!(a.pixels_written, 9);

        let mut profiler = Profiler::default();
        profiler.begin_frame();
        *profiler.stats_mut() = a;
        profiler.end_frame();
        let line = profiler.summary_line();
        assert!(line.contains("backface 2"));
        assert!(line.contains("px 9"));
    }
}
