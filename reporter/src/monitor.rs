//! monitor.rs
//!
//! Frame loop for one road.
//!
//! - Runs the detector on one frame out of `skip_frames`; the frames in
//!   between reuse the last detections for counting and never report.
//! - A failed read reopens the source from the start and resets the
//!   frame counter. There is no retry limit.
//! - Reporting is awaited inline, so a slow service slows the loop.
//! - `run` sleeps `frame_interval` between frames, which is also where a
//!   shutdown signal gets a chance to win the select in `main`.

use std::time::Duration;
use tracing::{debug, info};

use crate::counting::{count_vehicles, FrameCount};
use crate::decision::{LightState, ThresholdPolicy, TrafficLight};
use crate::report::ReportClient;
use crate::source::{Detector, FrameSource};
use crate::types::{ClassMap, Detection};

/// What one loop iteration saw and did.
#[derive(Clone, Debug)]
pub struct Step {
    pub frame_index: u64,
    pub detected: bool,
    pub reported: bool,
    pub count: FrameCount,
    pub light: LightState,
    pub overlay: Vec<String>,
}

pub struct Monitor<S, D> {
    road_id: String,
    skip_frames: u64,
    classes: ClassMap,
    policy: ThresholdPolicy,
    light: TrafficLight,
    source: S,
    detector: D,
    client: ReportClient,
    frame_count: u64,
    last_detections: Option<Vec<Detection>>,
    frame_interval: Duration,
}

impl<S: FrameSource, D: Detector> Monitor<S, D> {
    pub fn new(
        road_id: &str,
        skip_frames: u64,
        classes: ClassMap,
        policy: ThresholdPolicy,
        source: S,
        detector: D,
        client: ReportClient,
    ) -> Self {
        Self {
            road_id: road_id.to_string(),
            skip_frames: skip_frames.max(1),
            classes,
            policy,
            light: TrafficLight::default(),
            source,
            detector,
            client,
            frame_count: 0,
            last_detections: None,
            frame_interval: Duration::from_millis(33),
        }
    }

    pub fn with_frame_interval(mut self, frame_interval: Duration) -> Self {
        self.frame_interval = frame_interval;
        self
    }

    pub async fn step(&mut self) -> Step {
        let frame = match self.source.read() {
            Some(f) => Some(f),
            None => {
                debug!("source ended, reopening");
                self.source.reopen();
                self.frame_count = 0;
                self.source.read()
            }
        };

        let frame_index = self.frame_count;
        let mut count = FrameCount::default();
        let mut detected = false;
        let mut reported = false;

        if let Some(frame) = frame {
            if self.frame_count % self.skip_frames == 0 {
                let dets = self.detector.detect(&frame);
                count = count_vehicles(&dets, &self.classes);
                self.last_detections = Some(dets);
                detected = true;

                if self.policy.exceeds(count.total) {
                    self.client.submit(count.total, &count.types).await;
                    reported = true;
                }
            } else if let Some(dets) = &self.last_detections {
                count = count_vehicles(dets, &self.classes);
            }
            self.frame_count += 1;
        }

        let light = self.light.observe(count.total, &self.policy);
        let overlay = self.overlay(&count, light);
        Step { frame_index, detected, reported, count, light, overlay }
    }

    /// Runs until `max_frames` steps have been taken, forever when `None`.
    pub async fn run(&mut self, max_frames: Option<u64>) {
        info!("Monitoring {} road, reporting above {}", self.road_id, self.policy.max_other());
        let (mut steps, mut reports) = (0u64, 0u64);
        loop {
            let s = self.step().await;
            debug!(
                "frame {}{} [{}] {} vehicle(s): {}",
                s.frame_index,
                if s.detected { " (detect)" } else { "" },
                s.light.as_str(),
                s.count.total,
                s.overlay.join(" | ")
            );
            steps += 1;
            if s.reported { reports += 1; }
            if max_frames.is_some_and(|m| steps >= m) {
                break;
            }
            if self.frame_interval.is_zero() {
                tokio::task::yield_now().await;
            } else {
                tokio::time::sleep(self.frame_interval).await;
            }
        }
        info!("Stopped after {steps} frame(s), {reports} report(s)");
    }

    fn overlay(&self, count: &FrameCount, light: LightState) -> Vec<String> {
        let mut lines = vec![
            format!("Vehicles: {}", count.total),
            format!("Monitoring: {} Road", capitalize(&self.road_id)),
            format!("Other Roads: {}", self.policy.describe()),
            format!("Light: {} {:?}", light.as_str(), light.bgr()),
        ];
        lines.extend(count.labels.iter().cloned());
        lines
    }
}

/// First character upper-cased, the rest lower-cased.
fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}
