//! Native audio output.
//!
//! Implements the playback channel boundary on top of rodio. One
//! [`AudioEngine`] owns the output stream; each [`RodioChannel`] it hands out
//! is an independent sink that can hold one source at a time.

use crate::playback::{ChannelError, MediaSource, PlaybackChannel};
use anyhow::{Context, Result};
use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink, Source};
use std::fs::File;
use std::io::{BufReader, Cursor, Read, Seek};
use std::time::Duration;

/// Owns the audio output stream.
///
/// The stream must outlive every channel created from it.
pub struct AudioEngine {
    /// Audio output stream (must be kept alive).
    _stream: OutputStream,
    /// Audio output handle for creating sinks.
    stream_handle: OutputStreamHandle,
}

impl AudioEngine {
    /// Opens the default output device.
    ///
    /// # Errors
    ///
    /// Returns error if no output device can be opened.
    pub fn new() -> Result<Self> {
        let (stream, stream_handle) =
            OutputStream::try_default().context("Failed to open audio output")?;
        Ok(Self {
            _stream: stream,
            stream_handle,
        })
    }

    /// Creates a new, empty playback channel on this output.
    pub fn channel(&self, name: &'static str) -> RodioChannel {
        RodioChannel {
            name,
            handle: self.stream_handle.clone(),
            sink: None,
            source: None,
            volume: 1.0,
            looping: false,
        }
    }
}

/// One playback lane backed by a rodio sink.
///
/// The sink is built lazily on `play()` from the loaded source, so loop and
/// volume set before `play()` take effect. Replacing the source drops the
/// sink, which abandons the previous playback.
pub struct RodioChannel {
    name: &'static str,
    handle: OutputStreamHandle,
    sink: Option<Sink>,
    source: Option<MediaSource>,
    volume: f32,
    looping: bool,
}

impl RodioChannel {
    fn build_sink(&self, source: &MediaSource) -> Result<Sink, ChannelError> {
        let sink =
            Sink::try_new(&self.handle).map_err(|e| ChannelError::Output(e.to_string()))?;
        sink.set_volume(self.volume);

        match source {
            MediaSource::Memory { bytes, .. } => {
                append_decoded(&sink, Cursor::new(bytes.clone()), self.looping)?
            }
            MediaSource::File(path) => {
                let file = File::open(path).map_err(|e| {
                    ChannelError::Output(format!("failed to open {}: {}", path.display(), e))
                })?;
                append_decoded(&sink, BufReader::new(file), self.looping)?
            }
        }
        Ok(sink)
    }
}

/// Decodes `reader` and queues it on `sink`, repeating forever if `looping`.
fn append_decoded<R>(sink: &Sink, reader: R, looping: bool) -> Result<(), ChannelError>
where
    R: Read + Seek + Send + Sync + 'static,
{
    let decoder = Decoder::new(reader).map_err(|e| ChannelError::Unsupported(e.to_string()))?;
    if looping {
        sink.append(decoder.repeat_infinite());
    } else {
        sink.append(decoder);
    }
    Ok(())
}

impl PlaybackChannel for RodioChannel {
    fn set_source(&mut self, source: Option<MediaSource>) {
        if let Some(sink) = self.sink.take() {
            sink.stop();
        }
        self.source = source;
    }

    fn play(&mut self) -> Result<(), ChannelError> {
        if let Some(sink) = &self.sink {
            sink.play();
            return Ok(());
        }
        let source = self.source.as_ref().ok_or(ChannelError::NoSource)?;
        let sink = self.build_sink(source)?;
        tracing::debug!(channel = self.name, %source, "Started sink");
        self.sink = Some(sink);
        Ok(())
    }

    fn pause(&mut self) {
        if let Some(sink) = &self.sink {
            sink.pause();
        }
    }

    fn set_current_time(&mut self, position: Duration) {
        if let Some(sink) = &self.sink {
            if let Err(e) = sink.try_seek(position) {
                tracing::debug!(channel = self.name, "Seek not supported: {:?}", e);
            }
        }
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume = volume;
        if let Some(sink) = &self.sink {
            sink.set_volume(volume);
        }
    }

    fn set_loop(&mut self, looping: bool) {
        self.looping = looping;
    }

    fn has_ended(&self) -> bool {
        self.sink.as_ref().is_some_and(|sink| sink.empty())
    }
}
