//! Command-line front end for the `hxaudio` library: inspect, list, and
//! extract entries from an hx-family container.

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use log::{error, info};

use hxaudio::class::Payload;
use hxaudio::codec::convert;
use hxaudio::container::{Container, ContainerError, ContainerIo, ContainerOptions, ErrorSink};
use hxaudio::version::Version;
use hxaudio::wav::write_wav;

/// Inspect, list, and extract entries from hx-family audio containers.
#[derive(Debug, Parser)]
#[command(name = "hxtool", version, about)]
struct Cli {
    /// Path to the container file (extension selects the platform version).
    input: PathBuf,

    /// Print a one-line summary of the container's version and entry count.
    #[arg(long)]
    info: bool,

    /// Print every entry's CUUID and class name.
    #[arg(long)]
    list: bool,

    /// Extract a single entry's audio to a WAV file, by CUUID (hex).
    #[arg(long, value_name = "CUUID")]
    extract: Option<String>,

    /// Extract every `WaveFileIdObj` entry's audio to WAV files.
    #[arg(long)]
    extract_archive: bool,

    /// Output directory for extracted files (created if missing).
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,
}

/// Keeps one open file handle per path across repeated reads, the way
/// `hxtool`'s read callback keeps a single handle open for a title's
/// large shared data file rather than reopening it per extracted
/// stream.
struct FsIo {
    base_dir: PathBuf,
    open_files: HashMap<String, File>,
}

impl FsIo {
    fn new(base_dir: PathBuf) -> Self {
        Self { base_dir, open_files: HashMap::new() }
    }
}

impl ErrorSink for FsIo {
    fn error(&mut self, message: &str) {
        error!("{message}");
    }
}

impl ContainerIo for FsIo {
    fn read(&mut self, path: &str, pos: u64, size: &mut u64) -> Option<Vec<u8>> {
        if !self.open_files.contains_key(path) {
            let file = File::open(self.base_dir.join(path)).ok()?;
            let _ = self.open_files.insert(path.to_owned(), file);
        }
        let file = self.open_files.get_mut(path)?;
        file.seek(SeekFrom::Start(pos)).ok()?;

        let mut buf = vec![0u8; *size as usize];
        let read = file.read(&mut buf).ok()?;
        buf.truncate(read);
        *size = read as u64;
        Some(buf)
    }

    fn write(&mut self, path: &str, data: &[u8]) -> bool {
        fs::write(self.base_dir.join(path), data).is_ok()
    }
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), ContainerError> {
    let extension = cli.input.extension().and_then(|e| e.to_str()).unwrap_or_default();
    let version = Version::from_extension(extension).ok_or_else(|| ContainerError::unsupported_version(extension))?;

    let mut io = FsIo::new(cli.input.parent().map(Path::to_path_buf).unwrap_or_default());
    let file_name = cli.input.file_name().and_then(|n| n.to_str()).unwrap_or_default().to_owned();

    let mut size = u64::MAX;
    let data = io.read(&file_name, 0, &mut size).ok_or_else(|| ContainerError::callback_failure(file_name.clone()))?;

    let container = Container::read(&data, version, ContainerOptions::default(), &mut io)?;

    if cli.info || (!cli.list && cli.extract.is_none() && !cli.extract_archive) {
        println!("{version}: {} entries", container.entries.len());
    }

    if cli.list {
        for entry in &container.entries {
            println!("{} {}", entry.cuuid, entry.payload.tag().canonical_name());
        }
    }

    if let Some(cuuid_hex) = &cli.extract {
        let cuuid = u64::from_str_radix(cuuid_hex.trim_start_matches("0x"), 16)
            .map_err(|_| ContainerError::callback_failure(cuuid_hex.clone()))?;
        let entry = container
            .entries
            .iter()
            .find(|e| e.cuuid.get() == cuuid)
            .ok_or_else(|| ContainerError::callback_failure(cuuid_hex.clone()))?;
        extract_entry(entry, &cli.out_dir)?;
    }

    if cli.extract_archive {
        fs::create_dir_all(&cli.out_dir).map_err(|_| ContainerError::callback_failure(cli.out_dir.display().to_string()))?;
        for entry in &container.entries {
            if matches!(entry.payload, Payload::WaveFileId(_)) {
                extract_entry(entry, &cli.out_dir)?;
            }
        }
    }

    Ok(())
}

fn extract_entry(entry: &hxaudio::class::Entry, out_dir: &Path) -> Result<(), ContainerError> {
    let Payload::WaveFileId(wave) = &entry.payload else {
        info!("entry {} is not a WaveFileIdObj, skipping extraction", entry.cuuid);
        return Ok(());
    };

    let pcm = convert(&wave.audio_stream, hxaudio::audio::AudioFormat::Pcm)
        .map_err(|_| ContainerError::corrupt_extra_wave_data())?;
    let wav_bytes = write_wav(&pcm.info, &pcm.data);

    fs::create_dir_all(out_dir).map_err(|_| ContainerError::callback_failure(out_dir.display().to_string()))?;
    let out_path = out_dir.join(format!("{}.wav", wave.name));
    let mut file = File::create(&out_path).map_err(|_| ContainerError::callback_failure(out_path.display().to_string()))?;
    file.write_all(&wav_bytes).map_err(|_| ContainerError::callback_failure(out_path.display().to_string()))?;

    info!("extracted {} -> {}", entry.cuuid, out_path.display());
    Ok(())
}
