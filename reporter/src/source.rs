//! source.rs
//!
//! Frame sources and detectors.
//!
//! - `FrameSource` yields frames until it ends or fails, and can be
//!   reopened from the start.
//! - `Detector` turns a frame into zero or more detections, each with a
//!   class id and an optional tracking id.
//! - The replay pair reads a JSON-lines file where every line is one frame
//!   with its recorded detections, so the reporter runs without a model.
//!   Reads are plain buffered `std::fs` I/O: one short line per frame, and
//!   the monitor sleeps between frames.

use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::PathBuf;
use tracing::{debug, warn};

use crate::types::{ClassMap, Detection, Frame};

pub trait FrameSource {
    /// `None` when the source is exhausted or unreadable.
    fn read(&mut self) -> Option<Frame>;
    fn reopen(&mut self);
}

pub trait Detector {
    fn detect(&mut self, frame: &Frame) -> Vec<Detection>;
}

pub struct ReplaySource {
    path: PathBuf,
    lines: Option<Lines<BufReader<File>>>,
}

impl ReplaySource {
    /// Does not fail on a missing file: reads just return `None` until a
    /// reopen finds it.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let mut s = Self { path: path.into(), lines: None };
        s.reopen();
        s
    }
}

impl FrameSource for ReplaySource {
    fn read(&mut self) -> Option<Frame> {
        let lines = self.lines.as_mut()?;
        loop {
            match lines.next()? {
                Ok(l) if l.trim().is_empty() => continue,
                Ok(l) => match serde_json::from_str::<Frame>(&l) {
                    Ok(f) => return Some(f),
                    Err(e) => {
                        warn!("replay {}: bad frame: {e}", self.path.display());
                        return None;
                    }
                },
                Err(e) => {
                    warn!("replay {}: {e}", self.path.display());
                    return None;
                }
            }
        }
    }

    fn reopen(&mut self) {
        self.lines = match File::open(&self.path) {
            Ok(f) => {
                debug!("replay {} opened", self.path.display());
                Some(BufReader::new(f).lines())
            }
            Err(e) => {
                warn!("replay {}: {e}", self.path.display());
                None
            }
        };
    }
}

/// Hands back the detections recorded with the frame, keeping only our
/// vehicle classes above the confidence floor.
pub struct ReplayDetector {
    classes: ClassMap,
    min_conf: f32,
}

impl ReplayDetector {
    pub fn new(classes: ClassMap, min_conf: f32) -> Self {
        Self { classes, min_conf }
    }
}

impl Detector for ReplayDetector {
    fn detect(&mut self, frame: &Frame) -> Vec<Detection> {
        frame
            .detections
            .iter()
            .filter(|d| self.classes.contains(d.class_id) && d.conf >= self.min_conf)
            .cloned()
            .collect()
    }
}
