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

//! Per-channel playback state.
//!
//! A channel owns its parameters, its loaded sound, its derived stereo gains,
//! and the scheduling state the trigger scheduler mutates. The scheduling
//! state has a single writer: the scheduler's advance step.

use std::fmt;

use rand::Rng;

use crate::audio::Sound;
use crate::config::{ChannelParameters, PlaybackMode};
use crate::rate::{InvalidRateError, TriggerRate};

/// The state of one mix channel.
pub struct ChannelState {
    parameters: ChannelParameters,
    sound: Sound,
    left_gain: f32,
    right_gain: f32,
    /// The inter-arrival distribution. Only present for channels that get
    /// randomized one-shot scheduling.
    rate: Option<TriggerRate>,
    /// Ticks accumulated since the last firing (or since arming).
    elapsed_ticks: u64,
    /// The sampled wait until the next firing. None until first armed.
    next_trigger_ticks: Option<f64>,
}

impl ChannelState {
    /// Creates the state for a channel from its parameters and loaded sound.
    pub fn new(parameters: ChannelParameters, sound: Sound) -> Result<ChannelState, InvalidRateError> {
        let (left_gain, right_gain) = balance_gains(parameters.balance_percent);
        let rate = if parameters.is_scheduled() {
            Some(TriggerRate::per_ticks(
                parameters.random_count,
                parameters.random_unit,
            )?)
        } else {
            None
        };

        Ok(ChannelState {
            parameters,
            sound,
            left_gain,
            right_gain,
            rate,
            elapsed_ticks: 0,
            next_trigger_ticks: None,
        })
    }

    /// The zero-based channel index.
    pub fn id(&self) -> u16 {
        self.parameters.id
    }

    /// The channel's loaded sound.
    pub fn sound(&self) -> &Sound {
        &self.sound
    }

    /// True if the channel plays as a continuous loop. Muting takes a channel
    /// out of the loop path and into one-shot scheduling.
    pub fn is_looping(&self) -> bool {
        !self.parameters.is_scheduled()
    }

    /// True if the channel is muted.
    pub fn is_muted(&self) -> bool {
        self.parameters.muted
    }

    /// The left gain derived from the balance, in [0, 1].
    pub fn left_gain(&self) -> f32 {
        self.left_gain
    }

    /// The right gain derived from the balance, in [0, 1].
    pub fn right_gain(&self) -> f32 {
        self.right_gain
    }

    /// The channel volume as a scale factor in [0, 1].
    pub fn volume(&self) -> f32 {
        f32::from(self.parameters.volume_percent) / 100.0
    }

    /// Advances the channel's scheduling state by the given number of ticks.
    /// Returns true when the channel fires. The very first call only arms the
    /// channel: it samples a wait and does not accumulate time. Whether a
    /// firing is audible is the caller's concern; a muted channel still fires
    /// so that unmuting resumes a live process rather than starting cold.
    pub fn advance<R: Rng + ?Sized>(&mut self, delta_ticks: u64, rng: &mut R) -> bool {
        let Some(rate) = self.rate else {
            return false;
        };

        let Some(next_trigger_ticks) = self.next_trigger_ticks else {
            self.next_trigger_ticks = Some(rate.sample(rng));
            return false;
        };

        self.elapsed_ticks += delta_ticks;

        // Strict comparison: on equality the channel fires on a later tick.
        if self.elapsed_ticks as f64 > next_trigger_ticks {
            self.elapsed_ticks = 0;
            self.next_trigger_ticks = Some(rate.sample(rng));
            return true;
        }

        false
    }

    #[cfg(test)]
    pub(crate) fn elapsed_ticks(&self) -> u64 {
        self.elapsed_ticks
    }

    #[cfg(test)]
    pub(crate) fn next_trigger_ticks(&self) -> Option<f64> {
        self.next_trigger_ticks
    }

    #[cfg(test)]
    pub(crate) fn set_next_trigger_ticks(&mut self, ticks: f64) {
        self.next_trigger_ticks = Some(ticks);
    }
}

/// Derives the stereo gains from a balance percentage. A centered balance
/// leaves both sides at unity; panning attenuates the opposite side only.
fn balance_gains(balance_percent: i8) -> (f32, f32) {
    let balance = f32::from(balance_percent) / 100.0;
    let left = if balance_percent <= 0 { 1.0 } else { 1.0 - balance };
    let right = if balance_percent >= 0 { 1.0 } else { 1.0 + balance };
    (left, right)
}

impl fmt::Display for ChannelState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.parameters.mode == PlaybackMode::Randomized {
            write!(
                f,
                "Channel {} : {} (random {} per {}), {}.ogg (volume {}, balance {})",
                self.parameters.id,
                self.parameters.name,
                self.parameters.random_count,
                self.parameters.random_unit,
                self.parameters.sound_id,
                self.parameters.volume_percent,
                self.parameters.balance_percent,
            )
        } else {
            write!(
                f,
                "Channel {} : {} (looping), {}.ogg (volume {}, balance {})",
                self.parameters.id,
                self.parameters.name,
                self.parameters.sound_id,
                self.parameters.volume_percent,
                self.parameters.balance_percent,
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use crate::rate::RateUnit;

    use super::*;

    fn parameters(mode: PlaybackMode, muted: bool, balance_percent: i8) -> ChannelParameters {
        ChannelParameters {
            id: 0,
            sound_id: "2523".to_string(),
            name: "Thunder".to_string(),
            volume_percent: 100,
            mode,
            random_count: 60.0,
            random_unit: RateUnit::Minute,
            muted,
            balance_percent,
        }
    }

    fn state(mode: PlaybackMode, muted: bool, balance_percent: i8) -> ChannelState {
        let sound = Sound::from_samples(vec![0.0; 8], 1, 44100);
        ChannelState::new(parameters(mode, muted, balance_percent), sound)
            .expect("unable to build channel state")
    }

    #[test]
    fn test_balance_gains() {
        assert_eq!(balance_gains(0), (1.0, 1.0));
        assert_eq!(balance_gains(100), (0.0, 1.0));
        assert_eq!(balance_gains(-100), (1.0, 0.0));
        assert_eq!(balance_gains(-50), (1.0, 0.5));
        assert_eq!(balance_gains(50), (0.5, 1.0));
    }

    #[test]
    fn test_effective_mode() {
        assert!(state(PlaybackMode::Looping, false, 0).is_looping());
        assert!(!state(PlaybackMode::Randomized, false, 0).is_looping());
        // A muted looping channel is not looping: it gets one-shot scheduling.
        assert!(!state(PlaybackMode::Looping, true, 0).is_looping());
    }

    #[test]
    fn test_first_advance_arms_without_firing() {
        let mut channel = state(PlaybackMode::Randomized, false, 0);
        let mut rng = StdRng::seed_from_u64(1);

        assert!(channel.next_trigger_ticks().is_none());
        assert!(!channel.advance(1, &mut rng));
        assert!(channel.next_trigger_ticks().is_some());
        assert_eq!(channel.elapsed_ticks(), 0);
    }

    #[test]
    fn test_equality_does_not_fire() {
        let mut channel = state(PlaybackMode::Randomized, false, 0);
        let mut rng = StdRng::seed_from_u64(1);
        channel.advance(1, &mut rng);
        channel.set_next_trigger_ticks(5.0);

        for _ in 0..5 {
            assert!(!channel.advance(1, &mut rng));
        }
        assert_eq!(channel.elapsed_ticks(), 5);

        // 6 > 5.0 fires.
        channel.set_next_trigger_ticks(5.0);
        assert!(channel.advance(1, &mut rng));
    }

    #[test]
    fn test_firing_resets_and_resamples() {
        let mut channel = state(PlaybackMode::Randomized, false, 0);
        let mut rng = StdRng::seed_from_u64(1);
        channel.advance(1, &mut rng);
        channel.set_next_trigger_ticks(0.5);

        assert!(channel.advance(1, &mut rng));
        assert_eq!(channel.elapsed_ticks(), 0);
        let resampled = channel.next_trigger_ticks().expect("must be rearmed");
        assert!(resampled != 0.5);
    }

    #[test]
    fn test_looping_channel_never_fires() {
        let mut channel = state(PlaybackMode::Looping, false, 0);
        let mut rng = StdRng::seed_from_u64(1);

        for _ in 0..1000 {
            assert!(!channel.advance(1, &mut rng));
        }
        assert!(channel.next_trigger_ticks().is_none());
        assert_eq!(channel.elapsed_ticks(), 0);
    }

    #[test]
    fn test_muted_channel_still_fires() {
        let mut channel = state(PlaybackMode::Randomized, true, 0);
        let mut rng = StdRng::seed_from_u64(1);
        channel.advance(1, &mut rng);
        channel.set_next_trigger_ticks(0.5);

        // The firing happens; suppressing the audible play is the
        // scheduler's job.
        assert!(channel.advance(1, &mut rng));
    }

    #[test]
    fn test_banner_formats() {
        let looping = state(PlaybackMode::Looping, false, -30);
        assert_eq!(
            looping.to_string(),
            "Channel 0 : Thunder (looping), 2523.ogg (volume 100, balance -30)"
        );

        let random = state(PlaybackMode::Randomized, false, 0);
        assert_eq!(
            random.to_string(),
            "Channel 0 : Thunder (random 60 per 1m), 2523.ogg (volume 100, balance 0)"
        );
    }
}
