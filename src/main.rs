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
mod audio;
mod channel;
mod config;
mod player;
mod playsync;
mod rate;
mod scheduler;

use std::error::Error;
use std::path::PathBuf;

use clap::{crate_version, Parser};
use tracing::{error, info, warn};

use crate::player::Player;
use crate::playsync::CancelHandle;

#[derive(Parser)]
#[clap(
    author = "Michael Wilson",
    version = crate_version!(),
    about = "An ambient mix player."
)]
struct Cli {
    /// The XML audio template of the ambient mix to play. Sound identifiers
    /// are resolved against the "sounds/" directory in the current working
    /// directory.
    file: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let channels = config::parse_template(&cli.file)?;
    if channels.is_empty() {
        warn!("Template contains no channels with sounds assigned.");
    }

    let num_channels = channels.iter().map(|channel| channel.id + 1).max().unwrap_or(0);
    let device = audio::get_device(num_channels)?;
    let player = Player::new(device, channels)?;

    let cancel_handle = CancelHandle::new();
    {
        let cancel_handle = cancel_handle.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!(err = %e, "Unable to listen for the interrupt signal.");
                return;
            }
            info!("Interrupt received.");
            cancel_handle.cancel();
        });
    }

    tokio::task::spawn_blocking(move || player.run(cancel_handle)).await?;

    Ok(())
}
