use std::{
    fs::File,
    io::{self, BufReader, BufWriter, Write},
    path::{Path, PathBuf},
};

use anyhow::Context as _;
use carvolve_training::{Progress, ProgressDisplay};

/// Destination of a JSON document: a file, or stdout when no path is given.
pub struct Output {
    writer: Box<dyn Write>,
    label: String,
}

impl Output {
    /// Writes `value` as pretty JSON to `output_path`, or to stdout.
    pub fn save_json<T>(value: &T, output_path: Option<PathBuf>) -> anyhow::Result<()>
    where
        T: serde::Serialize,
    {
        let mut output = match output_path {
            Some(path) => Output::create(&path)?,
            None => Output {
                writer: Box::new(io::stdout().lock()),
                label: "stdout".to_owned(),
            },
        };
        output.write_json(value)
    }

    fn create(path: &Path) -> anyhow::Result<Self> {
        let file = File::create(path)
            .with_context(|| format!("Failed to create output file: {}", path.display()))?;
        Ok(Output {
            writer: Box::new(BufWriter::new(file)),
            label: path.display().to_string(),
        })
    }

    fn write_json<T>(&mut self, value: &T) -> anyhow::Result<()>
    where
        T: serde::Serialize,
    {
        serde_json::to_writer_pretty(&mut self.writer, value)
            .with_context(|| format!("Failed to write JSON to {}", self.label))?;
        writeln!(self.writer)
            .and_then(|()| self.writer.flush())
            .with_context(|| format!("Failed to finish writing {}", self.label))?;
        Ok(())
    }
}

pub fn read_json_file<T, P>(file_kind: &str, path: P) -> anyhow::Result<T>
where
    T: serde::de::DeserializeOwned,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let file = File::open(path)
        .with_context(|| format!("Failed to open {file_kind} file: {}", path.display()))?;
    serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Failed to parse {file_kind} JSON file: {}", path.display()))
}

/// Overwrites one stderr line with the generation and genome counters.
#[derive(Debug, Default)]
pub struct StderrProgress {
    quiet: bool,
}

impl StderrProgress {
    pub fn new(quiet: bool) -> Self {
        Self { quiet }
    }
}

impl ProgressDisplay for StderrProgress {
    fn show(&mut self, progress: &Progress) {
        if self.quiet {
            return;
        }
        let Progress {
            generation,
            genome,
            population_size,
        } = *progress;
        eprint!("\rGeneration #{generation}: genome {genome:>3}/{population_size}");
        if genome == population_size {
            eprintln!();
        }
    }
}

#[cfg(test)]
mod tests {
    use serde::{Deserialize, Serialize};

    use super::*;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Sample {
        name: String,
        value: f32,
    }

    #[test]
    fn test_json_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sample.json");
        let sample = Sample {
            name: "ring".to_owned(),
            value: 1.5,
        };
        Output::save_json(&sample, Some(path.clone())).unwrap();
        let loaded: Sample = read_json_file("sample", &path).unwrap();
        assert_eq!(loaded, sample);
    }

    #[test]
    fn test_read_missing_file_names_kind() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_json_file::<Sample, _>("config", dir.path().join("missing.json"))
            .unwrap_err();
        assert!(err.to_string().contains("config file"));
    }
}
