//! Audio output implementation using rodio.
//!
//! rodio's `OutputStream` is not `Send`, so all audio objects live on a
//! dedicated thread. [`RodioAudioOutput`] is a cheap handle that forwards
//! commands to that thread and waits for the reply.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink, Source};
use tracing::{debug, warn};

use super::chime;
use super::error::SoundError;
use super::AudioOutput;

type Reply = Sender<Result<(), SoundError>>;

enum AudioCommand {
    Load { path: PathBuf, reply: Reply },
    Play { reply: Reply },
    Pause,
    SetVolume(f32),
    Alarm {
        path: PathBuf,
        volume: f32,
        reply: Reply,
    },
}

/// Handle to the audio thread.
#[derive(Debug)]
pub struct RodioAudioOutput {
    tx: Sender<AudioCommand>,
}

impl RodioAudioOutput {
    /// Spawns the audio thread and opens the default output device.
    ///
    /// # Errors
    ///
    /// Returns `SoundError::DeviceNotAvailable` if no audio output device
    /// is available.
    pub fn new() -> Result<Self, SoundError> {
        let (tx, rx) = mpsc::channel::<AudioCommand>();
        let (ready_tx, ready_rx) = mpsc::channel::<Result<(), SoundError>>();

        thread::Builder::new()
            .name("audio-output".to_string())
            .spawn(move || {
                let (stream, handle) = match OutputStream::try_default() {
                    Ok(pair) => pair,
                    Err(e) => {
                        let _ = ready_tx.send(Err(SoundError::DeviceNotAvailable(e.to_string())));
                        return;
                    }
                };
                let _ = ready_tx.send(Ok(()));
                AudioThread {
                    _stream: stream,
                    handle,
                    ambient: None,
                    volume: 1.0,
                }
                .run(rx);
            })
            .map_err(|e| SoundError::StreamError(e.to_string()))?;

        ready_rx
            .recv()
            .map_err(|e| SoundError::DeviceNotAvailable(e.to_string()))??;
        debug!("Audio output stream initialized");

        Ok(Self { tx })
    }

    fn send(&self, command: AudioCommand) -> Result<(), SoundError> {
        self.tx
            .send(command)
            .map_err(|_| SoundError::StreamError("audio thread stopped".to_string()))
    }

    fn request(&self, build: impl FnOnce(Reply) -> AudioCommand) -> Result<(), SoundError> {
        let (reply_tx, reply_rx) = mpsc::channel();
        self.send(build(reply_tx))?;
        reply_rx
            .recv()
            .map_err(|_| SoundError::StreamError("audio thread stopped".to_string()))?
    }
}

impl AudioOutput for RodioAudioOutput {
    fn load(&self, path: &Path) -> Result<(), SoundError> {
        let path = path.to_path_buf();
        self.request(|reply| AudioCommand::Load { path, reply })
    }

    fn play(&self) -> Result<(), SoundError> {
        self.request(|reply| AudioCommand::Play { reply })
    }

    fn pause(&self) {
        if let Err(e) = self.send(AudioCommand::Pause) {
            warn!("Failed to pause ambient track: {}", e);
        }
    }

    fn set_volume(&self, volume: f32) {
        if let Err(e) = self.send(AudioCommand::SetVolume(volume)) {
            warn!("Failed to set volume: {}", e);
        }
    }

    fn play_alarm(&self, path: &Path, volume: f32) -> Result<(), SoundError> {
        let path = path.to_path_buf();
        self.request(|reply| AudioCommand::Alarm {
            path,
            volume,
            reply,
        })
    }

    fn is_available(&self) -> bool {
        true
    }
}

/// Audio state owned by the audio thread.
struct AudioThread {
    _stream: OutputStream,
    handle: OutputStreamHandle,
    ambient: Option<Sink>,
    volume: f32,
}

impl AudioThread {
    fn run(mut self, rx: Receiver<AudioCommand>) {
        while let Ok(command) = rx.recv() {
            match command {
                AudioCommand::Load { path, reply } => {
                    let _ = reply.send(self.load(&path));
                }
                AudioCommand::Play { reply } => {
                    let _ = reply.send(self.play());
                }
                AudioCommand::Pause => {
                    if let Some(sink) = &self.ambient {
                        sink.pause();
                    }
                }
                AudioCommand::SetVolume(volume) => {
                    self.volume = volume;
                    if let Some(sink) = &self.ambient {
                        sink.set_volume(volume);
                    }
                }
                AudioCommand::Alarm {
                    path,
                    volume,
                    reply,
                } => {
                    let _ = reply.send(self.alarm(&path, volume));
                }
            }
        }
        debug!("Audio thread stopped");
    }

    fn new_sink(&self) -> Result<Sink, SoundError> {
        Sink::try_new(&self.handle).map_err(|e| SoundError::StreamError(e.to_string()))
    }

    /// Replaces the ambient sink with a paused, looping source.
    fn load(&mut self, path: &Path) -> Result<(), SoundError> {
        let decoder = open_decoder(path)?;
        let sink = self.new_sink()?;
        sink.pause();
        sink.set_volume(self.volume);
        sink.append(decoder.repeat_infinite());

        if let Some(previous) = self.ambient.replace(sink) {
            previous.stop();
        }
        debug!("Loaded ambient track {}", path.display());
        Ok(())
    }

    fn play(&self) -> Result<(), SoundError> {
        match &self.ambient {
            Some(sink) => {
                sink.play();
                Ok(())
            }
            None => Err(SoundError::PlaybackError(
                "no ambient track loaded".to_string(),
            )),
        }
    }

    /// Plays the alarm file, or the synthesized chime if it can't be read.
    fn alarm(&self, path: &Path, volume: f32) -> Result<(), SoundError> {
        let sink = self.new_sink()?;
        sink.set_volume(volume);

        match open_decoder(path) {
            Ok(decoder) => sink.append(decoder),
            Err(e) => {
                debug!("Alarm file unavailable ({}), playing chime", e);
                chime::append_chime(&sink);
            }
        }
        sink.detach();
        Ok(())
    }
}

fn open_decoder(path: &Path) -> Result<Decoder<BufReader<File>>, SoundError> {
    let file = File::open(path)
        .map_err(|e| SoundError::FileNotFound(format!("{}: {}", path.display(), e)))?;
    Decoder::new(BufReader::new(file)).map_err(|e| SoundError::DecodeError(e.to_string()))
}

/// Creates the rodio output, returning None if audio is unavailable.
#[must_use]
pub fn try_create_output() -> Option<RodioAudioOutput> {
    match RodioAudioOutput::new() {
        Ok(output) => Some(output),
        Err(e) => {
            warn!("Audio not available, sound disabled: {}", e);
            None
        }
    }
}
