//! WAV file reading and writing.

use crate::{Error, Result};
use hound::{SampleFormat as HoundFormat, WavReader, WavWriter};
use std::path::Path;
use tribecal_analysis::{AudioBuffer, RawAudio, RawSamples, SampleFormat, prepare};

/// WAV file metadata extracted without loading sample data.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WavInfo {
    /// Number of audio channels (1 = mono, 2 = stereo).
    pub channels: u16,
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Declared sample format.
    pub format: SampleFormat,
    /// Total number of sample frames (samples per channel).
    pub num_frames: u64,
    /// Duration in seconds.
    pub duration_secs: f64,
}

fn unreadable(path: &Path) -> impl FnOnce(hound::Error) -> Error + '_ {
    move |source| Error::UnreadableAudio {
        path: path.to_path_buf(),
        source,
    }
}

fn sample_format(path: &Path, spec: hound::WavSpec) -> Result<SampleFormat> {
    let is_float = spec.sample_format == HoundFormat::Float;
    SampleFormat::from_bits(spec.bits_per_sample, is_float).ok_or_else(|| {
        Error::UnsupportedFormat {
            path: path.to_path_buf(),
            bits_per_sample: spec.bits_per_sample,
            kind: if is_float { "float" } else { "int" },
        }
    })
}

/// Read WAV metadata without loading sample data.
pub fn read_wav_info<P: AsRef<Path>>(path: P) -> Result<WavInfo> {
    let path = path.as_ref();
    let reader = WavReader::open(path).map_err(unreadable(path))?;
    let spec = reader.spec();
    let format = sample_format(path, spec)?;
    let num_frames = u64::from(reader.len()) / u64::from(spec.channels.max(1));

    Ok(WavInfo {
        channels: spec.channels,
        sample_rate: spec.sample_rate,
        format,
        num_frames,
        duration_secs: num_frames as f64 / f64::from(spec.sample_rate.max(1)),
    })
}

/// Decode a WAV file into raw interleaved samples and their declared format.
///
/// Integer samples are returned unscaled; use [`prepare`] (or
/// [`load_buffer`]) to normalize them.
pub fn decode<P: AsRef<Path>>(path: P) -> Result<(RawAudio, SampleFormat)> {
    let path = path.as_ref();
    let reader = WavReader::open(path).map_err(unreadable(path))?;
    let spec = reader.spec();
    let format = sample_format(path, spec)?;

    let samples = match format {
        SampleFormat::Float32 => RawSamples::Float(
            reader
                .into_samples::<f32>()
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(unreadable(path))?,
        ),
        SampleFormat::Int16 | SampleFormat::Int24 | SampleFormat::Int32 => RawSamples::Int(
            reader
                .into_samples::<i32>()
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(unreadable(path))?,
        ),
    };

    tracing::debug!(
        path = %path.display(),
        channels = spec.channels,
        sample_rate = spec.sample_rate,
        ?format,
        "decoded wav"
    );

    Ok((
        RawAudio {
            samples,
            channels: spec.channels,
            sample_rate: spec.sample_rate,
        },
        format,
    ))
}

/// Decode and prepare a WAV file as a mono [`AudioBuffer`].
///
/// # Example
/// ```ignore
/// let buffer = load_buffer("reference.wav")?;
/// println!("Loaded {:.2} s at {} Hz", buffer.duration_secs(), buffer.sample_rate());
/// ```
pub fn load_buffer<P: AsRef<Path>>(path: P) -> Result<AudioBuffer> {
    let path = path.as_ref();
    let (raw, format) = decode(path)?;
    prepare(raw, format).map_err(|source| Error::Analysis {
        path: path.to_path_buf(),
        source,
    })
}

/// Write a buffer as a mono 32-bit float WAV file.
pub fn write_wav<P: AsRef<Path>>(path: P, buffer: &AudioBuffer) -> Result<()> {
    let path = path.as_ref();
    let to_write_error = |source| Error::Write {
        path: path.to_path_buf(),
        source,
    };

    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: buffer.sample_rate(),
        bits_per_sample: 32,
        sample_format: HoundFormat::Float,
    };
    let mut writer = WavWriter::create(path, spec).map_err(to_write_error)?;

    for &sample in buffer.samples() {
        writer.write_sample(sample).map_err(to_write_error)?;
    }

    writer.finalize().map_err(to_write_error)
}
