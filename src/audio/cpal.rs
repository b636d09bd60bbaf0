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
use std::{
    error::Error,
    fmt,
    path::PathBuf,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread,
    time::Duration,
};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use tracing::{debug, error, info};

use super::mixer::Mixer;
use super::sound::{Sound, SoundError};

/// Directory the template's sound identifiers are resolved from, relative to
/// the current working directory.
const SOUNDS_DIR: &str = "sounds";

/// A small wrapper around the default cpal output device. Owns the mixer and
/// the thread that keeps the output stream alive.
pub struct Device {
    /// The name of the device.
    name: String,
    /// The output stream sample rate. Sounds are resampled to this on load.
    sample_rate: u32,
    /// Where sound identifiers are resolved from.
    sounds_dir: PathBuf,
    /// The channel mixer feeding the output stream.
    mixer: Mixer,
    /// Tells the stream thread to shut down.
    shutdown: Arc<AtomicBool>,
    /// Handle to the stream thread (keeps it alive).
    stream_thread: Option<thread::JoinHandle<()>>,
}

impl Device {
    /// Gets the default output device and starts its output stream with the
    /// given number of mix channels.
    pub fn get(num_channels: u16) -> Result<Device, Box<dyn Error>> {
        let (device, name, stream_config, sample_format) = {
            // ALSA and friends are noisy during discovery. Suppress it.
            let _shh_stdout = shh::stdout()?;
            let _shh_stderr = shh::stderr()?;

            let host = cpal::default_host();
            let device = host
                .default_output_device()
                .ok_or("no default audio output device found")?;
            let name = device.name()?;
            let default_config = device.default_output_config()?;

            // The mix is stereo by construction (per-channel balance), so the
            // stream is always two channels at the device's preferred rate.
            let stream_config = cpal::StreamConfig {
                channels: 2,
                sample_rate: default_config.sample_rate(),
                buffer_size: cpal::BufferSize::Default,
            };
            (device, name, stream_config, default_config.sample_format())
        };

        let sample_rate = stream_config.sample_rate;
        let mixer = Mixer::new(num_channels);
        let shutdown = Arc::new(AtomicBool::new(false));
        let stream_thread = start_stream_thread(
            device,
            stream_config,
            sample_format,
            mixer.clone(),
            shutdown.clone(),
        );

        info!(device = name, sample_rate, "Audio output ready.");

        Ok(Device {
            name,
            sample_rate,
            sounds_dir: PathBuf::from(SOUNDS_DIR),
            mixer,
            shutdown,
            stream_thread: Some(stream_thread),
        })
    }
}

impl super::Device for Device {
    fn load_sound(&self, sound_id: &str) -> Result<Sound, SoundError> {
        let path = self.sounds_dir.join(format!("{}.ogg", sound_id));
        Sound::load(&path, self.sample_rate)
    }

    fn set_gains(&self, channel: u16, left: f32, right: f32) {
        self.mixer.set_gains(channel, left, right);
    }

    fn play(&self, channel: u16, sound: &Sound, looped: bool) {
        self.mixer.start(channel, sound, looped);
        debug!(channel, looped, "Play issued.");
    }
}

impl Drop for Device {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);
        if let Some(thread) = self.stream_thread.take() {
            let _ = thread.join();
        }
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (cpal)", self.name)
    }
}

/// Spawns the thread that owns the cpal stream. The stream itself is not
/// Send, so it has to be created and kept alive on a dedicated thread.
fn start_stream_thread(
    device: cpal::Device,
    config: cpal::StreamConfig,
    sample_format: cpal::SampleFormat,
    mixer: Mixer,
    shutdown: Arc<AtomicBool>,
) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let stream_result = match sample_format {
            cpal::SampleFormat::F32 => build_stream::<f32>(&device, &config, mixer),
            cpal::SampleFormat::I16 => build_stream::<i16>(&device, &config, mixer),
            cpal::SampleFormat::I32 => build_stream::<i32>(&device, &config, mixer),
            cpal::SampleFormat::U16 => build_stream::<u16>(&device, &config, mixer),
            other => {
                error!(format = %other, "Unsupported output sample format");
                return;
            }
        };

        match stream_result {
            Ok(stream) => {
                if let Err(e) = stream.play() {
                    error!(err = %e, "Failed to start output stream");
                    return;
                }
                info!("Output stream started.");

                // Keep the stream alive until the device is dropped.
                while !shutdown.load(Ordering::Relaxed) {
                    thread::sleep(Duration::from_millis(100));
                }
            }
            Err(e) => error!(err = %e, "Failed to create output stream"),
        }
    })
}

/// Builds an output stream for the given sample type, mixing into a scratch
/// f32 buffer and converting into the device format.
fn build_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    mixer: Mixer,
) -> Result<cpal::Stream, cpal::BuildStreamError>
where
    T: cpal::SizedSample + cpal::FromSample<f32>,
{
    let mut scratch: Vec<f32> = Vec::new();
    device.build_output_stream(
        config,
        move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
            scratch.resize(data.len(), 0.0);
            mixer.process_into(&mut scratch);
            for (dst, &src) in data.iter_mut().zip(scratch.iter()) {
                *dst = T::from_sample(src);
            }
        },
        |err| error!(err = %err, "Output stream error"),
        None,
    )
}
