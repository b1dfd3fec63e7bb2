//! decision.rs
//!
//! When to report, and the on-screen traffic light.
//!
//! - The road is reported only when its count is strictly above the largest
//!   of the configured counts for the other roads. Those counts are fixed;
//!   they are never refreshed from real measurements.
//! - The light steps green -> yellow -> red -> green every time that same
//!   condition holds. It is display state only and is never transmitted.

use std::collections::BTreeMap;

#[derive(Clone, Debug, Default)]
pub struct ThresholdPolicy {
    pub other_roads: BTreeMap<String, u32>,
}

impl ThresholdPolicy {
    pub fn new(other_roads: BTreeMap<String, u32>) -> Self {
        Self { other_roads }
    }

    /// 0 when no other road is configured.
    pub fn max_other(&self) -> u32 {
        self.other_roads.values().copied().max().unwrap_or(0)
    }

    pub fn exceeds(&self, count: u32) -> bool {
        count > self.max_other()
    }

    /// `north: 5, south: 10, west: 7`
    pub fn describe(&self) -> String {
        self.other_roads
            .iter()
            .map(|(road, n)| format!("{road}: {n}"))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LightState {
    #[default]
    Green,
    Yellow,
    Red,
}

impl LightState {
    pub fn next(self) -> Self {
        match self {
            Self::Green => Self::Yellow,
            Self::Yellow => Self::Red,
            Self::Red => Self::Green,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Green => "green",
            Self::Yellow => "yellow",
            Self::Red => "red",
        }
    }

    /// BGR overlay colour.
    pub fn bgr(self) -> (u8, u8, u8) {
        match self {
            Self::Green => (0, 255, 0),
            Self::Yellow => (0, 255, 255),
            Self::Red => (0, 0, 255),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct TrafficLight {
    state: LightState,
}

impl TrafficLight {
    /// Advances one step iff `count` is over the threshold; returns the
    /// state after the update.
    pub fn observe(&mut self, count: u32, policy: &ThresholdPolicy) -> LightState {
        if policy.exceeds(count) {
            self.state = self.state.next();
        }
        self.state
    }
}
