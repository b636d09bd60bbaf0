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

//! Sound loading for the ambient mix.
//!
//! Sounds are decoded entirely into memory at startup. An ambient mix plays
//! the same handful of files for hours, so trading memory for zero-latency
//! triggers is the right call.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use symphonia::core::audio::{AudioBuffer, AudioBufferRef, Signal};
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use symphonia::default::{get_codecs, get_probe};
use tracing::info;

/// Typed error for sound resolution failures. All of these are fatal at
/// startup: an ambient mix missing a sound is not partially startable.
#[derive(Debug, thiserror::Error)]
pub enum SoundError {
    #[error("unable to open sound {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unrecognized sound format {}: {source}", path.display())]
    Format {
        path: PathBuf,
        #[source]
        source: SymphoniaError,
    },

    #[error("no decodable audio track in {}", path.display())]
    NoTrack { path: PathBuf },

    #[error("sound {} does not declare a sample rate", path.display())]
    NoSampleRate { path: PathBuf },

    #[error("unable to decode sound {}: {source}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: SymphoniaError,
    },

    #[error("sound {} contains no audio data", path.display())]
    Empty { path: PathBuf },
}

/// A fully decoded sound, ready for playback.
/// The sample data is stored in an Arc so handles are cheap to share.
#[derive(Clone)]
pub struct Sound {
    /// Interleaved f32 samples at the device sample rate.
    data: Arc<Vec<f32>>,
    /// Number of channels in the decoded data.
    channels: u16,
    /// Sample rate of the decoded data.
    sample_rate: u32,
}

impl Sound {
    /// Decodes the file at `path` into memory, resampling to
    /// `target_sample_rate` if necessary.
    pub fn load(path: &Path, target_sample_rate: u32) -> Result<Sound, SoundError> {
        let file = File::open(path).map_err(|e| SoundError::Open {
            path: path.to_path_buf(),
            source: e,
        })?;
        let mss = MediaSourceStream::new(Box::new(file), Default::default());

        // A hint helps the format registry guess the container.
        let mut hint = Hint::new();
        if let Some(extension) = path.extension().and_then(|ext| ext.to_str()) {
            hint.with_extension(extension);
        }

        let probed = get_probe()
            .format(
                &hint,
                mss,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .map_err(|e| SoundError::Format {
                path: path.to_path_buf(),
                source: e,
            })?;
        let mut format = probed.format;

        let track = format
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or_else(|| SoundError::NoTrack {
                path: path.to_path_buf(),
            })?;
        let track_id = track.id;
        let params = track.codec_params.clone();

        let source_rate = params.sample_rate.ok_or_else(|| SoundError::NoSampleRate {
            path: path.to_path_buf(),
        })?;

        let mut decoder =
            get_codecs()
                .make(&params, &DecoderOptions::default())
                .map_err(|e| SoundError::Decode {
                    path: path.to_path_buf(),
                    source: e,
                })?;

        // Channel count is usually in the codec parameters, but some
        // containers only reveal it once the first packet decodes.
        let mut channels = params.channels.map(|c| c.count() as u16).unwrap_or(0);
        let mut samples: Vec<f32> = Vec::new();

        loop {
            let packet = match format.next_packet() {
                Ok(packet) => packet,
                // End of stream. Some decoders signal EOF as a decode error.
                Err(SymphoniaError::IoError(e))
                    if e.kind() == std::io::ErrorKind::UnexpectedEof =>
                {
                    break;
                }
                Err(SymphoniaError::DecodeError(_)) => break,
                Err(SymphoniaError::ResetRequired) => {
                    decoder.reset();
                    continue;
                }
                Err(e) => {
                    return Err(SoundError::Decode {
                        path: path.to_path_buf(),
                        source: e,
                    })
                }
            };

            if packet.track_id() != track_id {
                continue;
            }

            let decoded = match decoder.decode(&packet) {
                Ok(decoded) => decoded,
                // A single malformed packet is skippable.
                Err(SymphoniaError::DecodeError(_)) => continue,
                Err(SymphoniaError::ResetRequired) => {
                    decoder.reset();
                    continue;
                }
                Err(e) => {
                    return Err(SoundError::Decode {
                        path: path.to_path_buf(),
                        source: e,
                    })
                }
            };

            if channels == 0 {
                channels = decoded.spec().channels.count() as u16;
            }
            append_interleaved(&decoded, &mut samples);
        }

        if channels == 0 || samples.is_empty() {
            return Err(SoundError::Empty {
                path: path.to_path_buf(),
            });
        }

        let data = if source_rate != target_sample_rate {
            info!(
                path = %path.display(),
                source_rate,
                target_rate = target_sample_rate,
                "Resampling sound"
            );
            resample_linear(&samples, channels, source_rate, target_sample_rate)
        } else {
            samples
        };

        let sound = Sound {
            data: Arc::new(data),
            channels,
            sample_rate: target_sample_rate,
        };

        info!(
            path = %path.display(),
            channels,
            sample_rate = target_sample_rate,
            duration_ms = sound.duration().as_millis(),
            memory_kb = sound.memory_size() / 1024,
            "Sound loaded"
        );

        Ok(sound)
    }

    /// Returns the number of frames in the sound.
    pub fn frames(&self) -> usize {
        self.data.len() / self.channels as usize
    }

    /// Returns the playback duration of the sound.
    pub fn duration(&self) -> Duration {
        Duration::from_secs_f64(self.frames() as f64 / f64::from(self.sample_rate))
    }

    /// Returns the memory size of the decoded data in bytes.
    pub fn memory_size(&self) -> usize {
        self.data.len() * std::mem::size_of::<f32>()
    }

    /// Returns the given frame reduced to a stereo pair. Mono sounds feed
    /// both sides; anything beyond two channels contributes its first two.
    pub(crate) fn stereo_frame(&self, frame: usize) -> (f32, f32) {
        let base = frame * self.channels as usize;
        let left = self.data[base];
        let right = if self.channels > 1 {
            self.data[base + 1]
        } else {
            left
        };
        (left, right)
    }
}

#[cfg(test)]
impl Sound {
    /// Creates a sound directly from interleaved samples (test only).
    pub fn from_samples(data: Vec<f32>, channels: u16, sample_rate: u32) -> Sound {
        assert!(channels > 0, "a sound must have at least one channel");
        Sound {
            data: Arc::new(data),
            channels,
            sample_rate,
        }
    }

    /// Returns the number of channels (test only).
    pub fn channels(&self) -> u16 {
        self.channels
    }

    /// Returns the sample rate of the decoded data (test only).
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}

impl std::fmt::Debug for Sound {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sound")
            .field("channels", &self.channels)
            .field("sample_rate", &self.sample_rate)
            .field("frames", &self.frames())
            .finish()
    }
}

/// Appends a decoded buffer to `out` as interleaved f32 samples.
fn append_interleaved(decoded: &AudioBufferRef<'_>, out: &mut Vec<f32>) {
    match decoded {
        AudioBufferRef::U8(buf) => interleave(buf, out, |s| (f32::from(s) - 128.0) / 128.0),
        AudioBufferRef::U16(buf) => interleave(buf, out, |s| (f32::from(s) - 32768.0) / 32768.0),
        AudioBufferRef::U24(buf) => {
            interleave(buf, out, |s| (s.inner() as f32 - 8_388_608.0) / 8_388_608.0)
        }
        AudioBufferRef::U32(buf) => {
            interleave(buf, out, |s| (s as f64 / 2_147_483_648.0 - 1.0) as f32)
        }
        AudioBufferRef::S8(buf) => interleave(buf, out, |s| f32::from(s) / 128.0),
        AudioBufferRef::S16(buf) => interleave(buf, out, |s| f32::from(s) / 32768.0),
        AudioBufferRef::S24(buf) => interleave(buf, out, |s| s.inner() as f32 / 8_388_608.0),
        AudioBufferRef::S32(buf) => interleave(buf, out, |s| (s as f64 / 2_147_483_648.0) as f32),
        AudioBufferRef::F32(buf) => interleave(buf, out, |s| s),
        AudioBufferRef::F64(buf) => interleave(buf, out, |s| s as f32),
    }
}

/// Interleaves a planar buffer into `out`, converting each sample with `f`.
fn interleave<S, F>(buf: &AudioBuffer<S>, out: &mut Vec<f32>, f: F)
where
    S: symphonia::core::sample::Sample + Copy,
    F: Fn(S) -> f32,
{
    let channels = buf.spec().channels.count();
    let frames = buf.frames();
    out.reserve(frames * channels);
    for frame in 0..frames {
        for channel in 0..channels {
            out.push(f(buf.chan(channel)[frame]));
        }
    }
}

/// Resamples interleaved samples using linear interpolation. Plenty for
/// ambient textures; a proper band-limited resampler is not worth the
/// dependency here.
fn resample_linear(samples: &[f32], channels: u16, source_rate: u32, target_rate: u32) -> Vec<f32> {
    let ratio = f64::from(target_rate) / f64::from(source_rate);
    let channels = channels as usize;
    let source_frames = samples.len() / channels;
    let target_frames = (source_frames as f64 * ratio).ceil() as usize;

    let mut output = Vec::with_capacity(target_frames * channels);
    for target_frame in 0..target_frames {
        let source_pos = target_frame as f64 / ratio;
        let source_frame = source_pos.floor() as usize;
        let frac = source_pos.fract() as f32;

        for channel in 0..channels {
            let idx0 = source_frame * channels + channel;
            let idx1 = (source_frame + 1) * channels + channel;

            let s0 = samples.get(idx0).copied().unwrap_or(0.0);
            let s1 = samples.get(idx1).copied().unwrap_or(s0);

            output.push(s0 + (s1 - s0) * frac);
        }
    }

    output
}
