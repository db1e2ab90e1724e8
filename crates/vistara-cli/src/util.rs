use std::{
    fs::File,
    io::{self, BufWriter, StdoutLock, Write},
    path::{Path, PathBuf},
};

use anyhow::Context;
use vistara_pipeline::AnalyticsConfig;
use vistara_records::DistrictPeriodRecord;

/// Where a command writes its JSON: a file when `--output` is given, stdout otherwise.
pub struct Output {
    sink: Sink,
    label: String,
}

enum Sink {
    Stdout(StdoutLock<'static>),
    File(BufWriter<File>),
}

impl Output {
    /// Writes `value` as pretty JSON to `output_path`, or stdout when `None`.
    pub fn save_json<T>(value: &T, output_path: Option<PathBuf>) -> anyhow::Result<()>
    where
        T: serde::Serialize,
    {
        let mut output = match output_path {
            Some(path) => Output::create(&path)?,
            None => Output::stdout(),
        };
        output.write_json(value)?;
        log::info!("wrote {}", output.label);
        Ok(())
    }

    fn stdout() -> Self {
        Self {
            sink: Sink::Stdout(io::stdout().lock()),
            label: "stdout".to_owned(),
        }
    }

    fn create(path: &Path) -> anyhow::Result<Self> {
        let file = File::create(path)
            .with_context(|| format!("Failed to create output file: {}", path.display()))?;
        Ok(Self {
            sink: Sink::File(BufWriter::new(file)),
            label: path.display().to_string(),
        })
    }

    fn write_json<T>(&mut self, value: &T) -> anyhow::Result<()>
    where
        T: serde::Serialize,
    {
        let writer: &mut dyn Write = match &mut self.sink {
            Sink::Stdout(w) => w,
            Sink::File(w) => w,
        };
        serde_json::to_writer_pretty(&mut *writer, value)
            .with_context(|| format!("Failed to write JSON to {}", self.label))?;
        writeln!(writer)
            .and_then(|()| writer.flush())
            .with_context(|| format!("Failed to finish writing {}", self.label))
    }
}

pub fn read_json_file<T, P>(file_kind: &str, path: P) -> anyhow::Result<T>
where
    T: serde::de::DeserializeOwned,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let file = File::open(path)
        .with_context(|| format!("Failed to open {} file: {}", file_kind, path.display()))?;

    let reader = io::BufReader::new(file);
    let value = serde_json::from_reader(reader).with_context(|| {
        format!(
            "Failed to parse {} JSON file: {}",
            file_kind,
            path.display()
        )
    })?;

    Ok(value)
}

/// Reads a JSON array of district records.
pub fn read_records_file<P>(path: P) -> anyhow::Result<Vec<DistrictPeriodRecord>>
where
    P: AsRef<Path>,
{
    let records: Vec<DistrictPeriodRecord> = read_json_file("records", path)?;
    log::info!("read {} records", records.len());
    Ok(records)
}

/// Reads an analytics config, falling back to the defaults without a path.
pub fn read_config_file<P>(path: Option<P>) -> anyhow::Result<AnalyticsConfig>
where
    P: AsRef<Path>,
{
    match path {
        Some(path) => read_json_file("config", path),
        None => Ok(AnalyticsConfig::default()),
    }
}
