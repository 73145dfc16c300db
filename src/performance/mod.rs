//! # Performance Metrics
//!
//! Frame timing for the render loop: [`FrameClock`] measures the elapsed time
//! handed to the camera, and [`PerformanceMonitor`] keeps a rolling window of
//! frame times plus the draw statistics of the last frame, logged periodically.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use crate::gfx::rendering::FrameStats;

/// Measures the time between consecutive frames
#[derive(Debug)]
pub struct FrameClock {
    last: Option<Instant>,
    max_dt: Duration,
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameClock {
    pub fn new() -> Self {
        Self {
            last: None,
            // Stalls (window drags, breakpoints) would otherwise turn into huge steps.
            max_dt: Duration::from_millis(250),
        }
    }

    /// Seconds since the previous tick; zero on the first tick.
    pub fn tick(&mut self) -> Duration {
        self.tick_at(Instant::now())
    }

    fn tick_at(&mut self, now: Instant) -> Duration {
        let dt = match self.last {
            Some(last) => now.saturating_duration_since(last).min(self.max_dt),
            None => Duration::ZERO,
        };
        self.last = Some(now);
        dt
    }
}

/// Rolling performance metrics
#[derive(Debug, Clone)]
pub struct PerformanceMetrics {
    /// Current frames per second
    pub fps: f32,
    /// Average frame time in milliseconds
    pub frame_time_ms: f32,
    /// Minimum frame time in the current window
    pub min_frame_time_ms: f32,
    /// Maximum frame time in the current window
    pub max_frame_time_ms: f32,
    /// Number of draw calls in the last frame
    pub draw_calls: u32,
    /// Number of vertices submitted in the last frame
    pub vertex_count: u64,
}

impl Default for PerformanceMetrics {
    fn default() -> Self {
        Self {
            fps: 0.0,
            frame_time_ms: 0.0,
            min_frame_time_ms: 0.0,
            max_frame_time_ms: 0.0,
            draw_calls: 0,
            vertex_count: 0,
        }
    }
}

/// Performance monitoring system
pub struct PerformanceMonitor {
    /// Ring buffer of recent frame times for averaging
    frame_times: VecDeque<Duration>,
    /// Maximum number of frame times to keep for averaging
    max_samples: usize,
    current_metrics: PerformanceMetrics,
    /// Time accumulated since metrics were last logged
    since_report: Duration,
    report_interval: Duration,
}

impl Default for PerformanceMonitor {
    fn default() -> Self {
        Self::new()
    }
}

impl PerformanceMonitor {
    pub fn new() -> Self {
        Self::with_config(120, Duration::from_secs(5))
    }

    pub fn with_config(max_samples: usize, report_interval: Duration) -> Self {
        Self {
            frame_times: VecDeque::with_capacity(max_samples),
            max_samples: max_samples.max(1),
            current_metrics: PerformanceMetrics::default(),
            since_report: Duration::ZERO,
            report_interval,
        }
    }

    /// Records one presented frame.
    pub fn record_frame(&mut self, frame_time: Duration, stats: &FrameStats) {
        if self.frame_times.len() >= self.max_samples {
            self.frame_times.pop_front();
        }
        self.frame_times.push_back(frame_time);

        self.current_metrics.draw_calls = stats.draw_calls;
        self.current_metrics.vertex_count = stats.vertices;
        self.update_metrics();

        self.since_report += frame_time;
        if self.since_report >= self.report_interval {
            self.since_report = Duration::ZERO;
            let m = &self.current_metrics;
            log::debug!(
                "{:.1} fps, {:.2}ms avg ({:.2}-{:.2}), {} draws, {} vertices",
                m.fps,
                m.frame_time_ms,
                m.min_frame_time_ms,
                m.max_frame_time_ms,
                m.draw_calls,
                m.vertex_count
            );
        }
    }

    fn update_metrics(&mut self) {
        if self.frame_times.is_empty() {
            return;
        }

        let total_time: Duration = self.frame_times.iter().sum();
        let avg_frame_time = total_time / self.frame_times.len() as u32;
        let avg_frame_time_ms = avg_frame_time.as_secs_f32() * 1000.0;

        self.current_metrics.frame_time_ms = avg_frame_time_ms;
        self.current_metrics.fps = if avg_frame_time_ms > 0.0 {
            1000.0 / avg_frame_time_ms
        } else {
            0.0
        };

        if let (Some(min_time), Some(max_time)) =
            (self.frame_times.iter().min(), self.frame_times.iter().max())
        {
            self.current_metrics.min_frame_time_ms = min_time.as_secs_f32() * 1000.0;
            self.current_metrics.max_frame_time_ms = max_time.as_secs_f32() * 1000.0;
        }
    }

    pub fn metrics(&self) -> &PerformanceMetrics {
        &self.current_metrics
    }

    pub fn samples(&self) -> usize {
        self.frame_times.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_tick_is_zero_then_elapsed() {
        let mut clock = FrameClock::new();
        let start = Instant::now();
        assert_eq!(clock.tick_at(start), Duration::ZERO);
        assert_eq!(
            clock.tick_at(start + Duration::from_millis(16)),
            Duration::from_millis(16)
        );
    }

    #[test]
    fn test_long_stall_is_capped() {
        let mut clock = FrameClock::new();
        let start = Instant::now();
        clock.tick_at(start);
        assert_eq!(
            clock.tick_at(start + Duration::from_secs(3)),
            Duration::from_millis(250)
        );
    }

    #[test]
    fn test_monitor_averages_window() {
        let mut monitor = PerformanceMonitor::with_config(2, Duration::from_secs(60));
        let stats = FrameStats {
            frame_index: 0,
            draw_calls: 7,
            vertices: 60,
        };
        monitor.record_frame(Duration::from_millis(40), &stats);
        monitor.record_frame(Duration::from_millis(10), &stats);
        monitor.record_frame(Duration::from_millis(30), &stats);

        let m = monitor.metrics();
        assert_eq!(monitor.samples(), 2);
        assert!((m.frame_time_ms - 20.0).abs() < 1e-3);
        assert!((m.fps - 50.0).abs() < 1e-2);
        assert!((m.min_frame_time_ms - 10.0).abs() < 1e-3);
        assert_eq!(m.draw_calls, 7);
        assert_eq!(m.vertex_count, 60);
    }
}
