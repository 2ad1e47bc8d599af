//! Native output through the platform's default audio device.

use cpal::{
    traits::{DeviceTrait, HostTrait, StreamTrait},
    FromSample, SampleFormat, SizedSample, Stream, StreamConfig,
};
use ferry_crossing_system_synthesis::{Destination, DeviceError, DeviceProvider, OutputDevice};

/// Opens the host's default output device.
#[derive(Clone, Copy, Debug)]
pub(crate) struct CpalProvider;

impl DeviceProvider for CpalProvider {
    fn open(&mut self) -> Result<Box<dyn OutputDevice>, DeviceError> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or(DeviceError::Unavailable)?;
        let supported = device
            .default_output_config()
            .map_err(|error| DeviceError::Configuration(error.to_string()))?;
        log::debug!(
            "opened audio output at {} Hz, {} channels, {:?}",
            supported.sample_rate().0,
            supported.channels(),
            supported.sample_format()
        );

        Ok(Box::new(CpalDevice {
            device,
            sample_format: supported.sample_format(),
            config: supported.into(),
            stream: None,
            playing: false,
        }))
    }
}

struct CpalDevice {
    device: cpal::Device,
    config: StreamConfig,
    sample_format: SampleFormat,
    stream: Option<Stream>,
    playing: bool,
}

impl CpalDevice {
    fn build<T>(&self, destination: Destination) -> Result<Stream, DeviceError>
    where
        T: SizedSample + FromSample<f32>,
    {
        let channels = usize::from(self.config.channels).max(1);
        let mut mono = Vec::new();
        self.device
            .build_output_stream(
                &self.config,
                move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                    mono.resize(data.len() / channels, 0.0);
                    destination.render(&mut mono);
                    for (frame, sample) in data.chunks_mut(channels).zip(&mono) {
                        let value = T::from_sample(*sample);
                        frame.fill(value);
                    }
                },
                |error| log::error!("audio output stream error: {error}"),
                None,
            )
            .map_err(|error| DeviceError::Stream(error.to_string()))
    }
}

impl OutputDevice for CpalDevice {
    fn sample_rate(&self) -> u32 {
        self.config.sample_rate.0
    }

    fn connect(&mut self, destination: Destination) -> Result<(), DeviceError> {
        let stream = match self.sample_format {
            SampleFormat::F32 => self.build::<f32>(destination)?,
            SampleFormat::I16 => self.build::<i16>(destination)?,
            SampleFormat::U16 => self.build::<u16>(destination)?,
            other => {
                return Err(DeviceError::Configuration(format!(
                    "unsupported output sample format {other:?}"
                )))
            }
        };
        self.stream = Some(stream);
        self.playing = false;
        Ok(())
    }

    fn is_suspended(&self) -> bool {
        !self.playing
    }

    fn resume(&mut self) -> Result<(), DeviceError> {
        let stream = self
            .stream
            .as_ref()
            .ok_or_else(|| DeviceError::Stream("output stream is not connected".into()))?;
        stream
            .play()
            .map_err(|error| DeviceError::Stream(error.to_string()))?;
        self.playing = true;
        Ok(())
    }
}
