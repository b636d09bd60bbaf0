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

//! The driver loop.
//!
//! Construction is the startup pass: every sound loads (all-or-nothing),
//! every channel's device gains are set once, and every channel is logged.
//! Running starts the loops and then polls the scheduler at a fixed tick
//! rate until interrupted.

use std::error::Error;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{info, span, Level};

use crate::audio;
use crate::channel::ChannelState;
use crate::config::ChannelParameters;
use crate::playsync::CancelHandle;
use crate::rate::TICK_RATE;
use crate::scheduler::TriggerScheduler;

/// Plays an ambient mix until interrupted.
pub struct Player {
    /// The device to play audio through.
    device: Arc<dyn audio::Device>,
    /// The scheduler that owns all channel state.
    scheduler: TriggerScheduler,
}

impl Player {
    /// Creates a new player. Loads every channel's sound and configures the
    /// device's per-channel gains; any failure here aborts the whole run.
    pub fn new(
        device: Arc<dyn audio::Device>,
        parameters: Vec<ChannelParameters>,
    ) -> Result<Player, Box<dyn Error>> {
        let mut channels = Vec::with_capacity(parameters.len());
        for channel_parameters in parameters {
            let sound = device.load_sound(&channel_parameters.sound_id)?;
            let channel = ChannelState::new(channel_parameters, sound)?;

            // The device gain folds the channel volume into the balance
            // gains; both are fixed for the lifetime of the run.
            let volume = channel.volume();
            device.set_gains(
                channel.id(),
                channel.left_gain() * volume,
                channel.right_gain() * volume,
            );

            info!(muted = channel.is_muted(), "Loaded {}.", channel);
            channels.push(channel);
        }

        Ok(Player {
            device,
            scheduler: TriggerScheduler::new(channels),
        })
    }

    /// Runs the mix until the cancel handle trips: starts all looping
    /// channels once, then advances the scheduler at the fixed tick rate.
    pub fn run(mut self, cancel_handle: CancelHandle) {
        let span = span!(Level::INFO, "player");
        let _enter = span.enter();

        self.scheduler.start_looping(self.device.as_ref());
        info!(device = %self.device, "Playing ambient mix. Press CTRL+C to exit.");

        let period = Duration::from_secs(1) / TICK_RATE;
        let mut deadline = Instant::now();
        while !cancel_handle.is_cancelled() {
            deadline += period;
            let now = Instant::now();
            if deadline > now {
                spin_sleep::sleep(deadline - now);
            } else if now > deadline + period {
                // A stalled host must not cause a burst of catch-up ticks.
                deadline = now;
            }

            self.scheduler.advance(self.device.as_ref(), 1);
        }

        info!("Playback interrupted, shutting down.");
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use crate::audio::mock;
    use crate::config::PlaybackMode;
    use crate::rate::RateUnit;

    use super::*;

    fn parameters(id: u16, mode: PlaybackMode) -> ChannelParameters {
        ChannelParameters {
            id,
            sound_id: format!("{}", 1000 + id),
            name: format!("channel-{}", id),
            volume_percent: 100,
            mode,
            random_count: 60.0,
            random_unit: RateUnit::Minute,
            muted: false,
            balance_percent: 0,
        }
    }

    #[test]
    fn test_missing_sound_aborts_startup() {
        let device = Arc::new(mock::Device::new());
        device.fail_to_load("1001");

        let result = Player::new(
            device,
            vec![
                parameters(0, PlaybackMode::Looping),
                parameters(1, PlaybackMode::Randomized),
            ],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_gains_are_set_once_at_startup() {
        let device = Arc::new(mock::Device::new());

        let mut panned = parameters(0, PlaybackMode::Looping);
        panned.volume_percent = 50;
        panned.balance_percent = 100;

        Player::new(device.clone(), vec![panned]).expect("unable to build player");

        // Balance 100 kills the left side; volume scales what remains.
        let (left, right) = device.gains(0).expect("gains must be set");
        assert_eq!(left, 0.0);
        assert_eq!(right, 0.5);
    }

    #[test]
    fn test_run_starts_loops_and_stops_on_cancel() {
        let device = Arc::new(mock::Device::new());
        let player = Player::new(
            device.clone(),
            vec![
                parameters(0, PlaybackMode::Looping),
                parameters(1, PlaybackMode::Randomized),
            ],
        )
        .expect("unable to build player");

        let cancel_handle = CancelHandle::new();
        let join = {
            let cancel_handle = cancel_handle.clone();
            thread::spawn(move || player.run(cancel_handle))
        };

        // Let the loop take a few ticks, then interrupt.
        thread::sleep(Duration::from_millis(350));
        cancel_handle.cancel();
        assert!(join.join().is_ok());

        assert_eq!(device.play_count(0, true), 1);
        assert_eq!(device.play_count(0, false), 0);
        assert_eq!(device.play_count(1, true), 0);
    }
}
