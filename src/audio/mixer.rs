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

//! Core channel mixing logic, independent of any audio backend.
//!
//! The mixer holds one slot per configured channel. A slot carries the
//! channel's stereo gains (set once at startup) and at most one playing
//! voice. Starting a sound on a slot replaces whatever that slot was
//! playing, which is exactly the restart semantics one-shot triggers want.

use std::sync::Arc;

use parking_lot::RwLock;

use super::sound::Sound;

/// A sound being played on a channel slot.
struct Voice {
    sound: Sound,
    /// Current playback position in frames.
    position: usize,
    looped: bool,
}

/// One mixer slot per configured channel.
struct Slot {
    left_gain: f32,
    right_gain: f32,
    voice: Option<Voice>,
}

/// Mixes the channel slots into interleaved stereo output.
#[derive(Clone)]
pub struct Mixer {
    slots: Arc<RwLock<Vec<Slot>>>,
}

impl Mixer {
    /// Creates a mixer with `num_channels` silent slots at unity gain.
    pub fn new(num_channels: u16) -> Mixer {
        let slots = (0..num_channels)
            .map(|_| Slot {
                left_gain: 1.0,
                right_gain: 1.0,
                voice: None,
            })
            .collect();
        Mixer {
            slots: Arc::new(RwLock::new(slots)),
        }
    }

    /// Sets the stereo gains for a channel slot.
    pub fn set_gains(&self, channel: u16, left: f32, right: f32) {
        let mut slots = self.slots.write();
        if let Some(slot) = slots.get_mut(channel as usize) {
            slot.left_gain = left;
            slot.right_gain = right;
        }
    }

    /// Starts the given sound on a channel slot, replacing anything the slot
    /// was already playing.
    pub fn start(&self, channel: u16, sound: &Sound, looped: bool) {
        let mut slots = self.slots.write();
        if let Some(slot) = slots.get_mut(channel as usize) {
            slot.voice = Some(Voice {
                sound: sound.clone(),
                position: 0,
                looped,
            });
        }
    }

    /// Mixes all active voices into `output`, an interleaved stereo buffer.
    /// Finished one-shot voices are cleared; looping voices wrap around.
    pub fn process_into(&self, output: &mut [f32]) {
        output.fill(0.0);

        let mut slots = self.slots.write();
        for slot in slots.iter_mut() {
            let Some(voice) = slot.voice.as_mut() else {
                continue;
            };

            let frames = voice.sound.frames();
            if frames == 0 {
                slot.voice = None;
                continue;
            }

            let mut finished = false;
            for frame in output.chunks_exact_mut(2) {
                let (left, right) = voice.sound.stereo_frame(voice.position);
                frame[0] += left * slot.left_gain;
                frame[1] += right * slot.right_gain;

                voice.position += 1;
                if voice.position >= frames {
                    if voice.looped {
                        voice.position = 0;
                    } else {
                        finished = true;
                        break;
                    }
                }
            }

            if finished {
                slot.voice = None;
            }
        }
    }

    /// Returns true if the given channel slot currently has a voice.
    #[cfg(test)]
    pub fn is_active(&self, channel: u16) -> bool {
        self.slots
            .read()
            .get(channel as usize)
            .is_some_and(|slot| slot.voice.is_some())
    }
}
