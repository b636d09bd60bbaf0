// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//

//! The trigger scheduler.
//!
//! Owns every channel's state and drives it forward in tick time. Channels
//! are advanced in a stable order (document order), so all of them observe
//! the same tick count within one pass.

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info};

use crate::audio::Device;
use crate::channel::ChannelState;

/// Decides, tick by tick, whether each channel should (re)issue a play call.
pub struct TriggerScheduler {
    channels: Vec<ChannelState>,
    rng: StdRng,
}

impl TriggerScheduler {
    /// Creates a scheduler over the given channels.
    pub fn new(channels: Vec<ChannelState>) -> TriggerScheduler {
        TriggerScheduler::with_rng(channels, StdRng::from_entropy())
    }

    /// Creates a scheduler with an explicit generator, so the exponential
    /// sampling is deterministic under test.
    pub fn with_rng(channels: Vec<ChannelState>, rng: StdRng) -> TriggerScheduler {
        TriggerScheduler { channels, rng }
    }

    /// The channels under management.
    #[cfg(test)]
    pub fn channels(&self) -> &[ChannelState] {
        &self.channels
    }

    /// Starts every effective-looping channel. Called exactly once, at
    /// startup; the device keeps the loops running from there.
    pub fn start_looping(&self, device: &dyn Device) {
        for channel in &self.channels {
            if channel.is_looping() {
                info!(channel = channel.id(), "Starting loop.");
                device.play(channel.id(), channel.sound(), true);
            }
        }
    }

    /// Advances all scheduled channels by `delta_ticks` and issues a one-shot
    /// play for each channel that fires audibly. Muted channels fire and
    /// rearm like any other, but their play call is suppressed.
    pub fn advance(&mut self, device: &dyn Device, delta_ticks: u64) {
        for channel in self.channels.iter_mut() {
            if channel.advance(delta_ticks, &mut self.rng) && !channel.is_muted() {
                debug!(channel = channel.id(), "Trigger fired.");
                device.play(channel.id(), channel.sound(), false);
            }
        }
    }
}
