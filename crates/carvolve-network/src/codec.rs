//! Plain-text persistence for a single network.
//!
//! The file holds one decimal value per line: the fitness first, then every weight
//! in canonical order (transition, destination neuron, source neuron). For the 3-7-2
//! reference topology that is 1 + 21 + 14 = 36 lines.
//!
//! Values are written with Rust's shortest round-trip formatting, so loading a saved
//! file reproduces the weights bit for bit.
//!
//! # Saving
//!
//! [`save`] always replaces the whole file. The content is written to a sibling
//! `*.tmp` file which is then renamed over the target, so a concurrent reader sees
//! either the previous network or the new one, never a partial write. A failed save
//! removes the temporary file and leaves the target as it was.
//!
//! # Loading
//!
//! [`load`] treats a missing or empty file as [`LoadOutcome::Empty`] and leaves the
//! network untouched. Anything else must parse completely: a malformed line or a
//! wrong number of weights is an error and the network is not modified.

use std::{
    fs::{self, File},
    io::{self, BufRead, BufReader, BufWriter, Write},
    num::ParseFloatError,
    path::{Path, PathBuf},
    str::{self, Utf8Error},
};

use crate::{NeuralNetwork, ShapeError};

/// Errors raised while reading or writing a network file.
#[derive(
    Debug, derive_more::Display, derive_more::Error, derive_more::From, derive_more::IsVariant,
)]
pub enum CodecError {
    #[display("I/O error: {_0}")]
    #[from]
    Io(io::Error),
    #[display("line {line}: {token:?} is not a number")]
    Parse {
        line: usize,
        token: String,
        source: ParseFailure,
    },
    #[display("line {line}: {value} is not a finite number")]
    NonFinite { line: usize, value: f32 },
    #[display("{_0}")]
    #[from]
    Shape(ShapeError),
}

/// Why a line could not be read as a number.
#[derive(
    Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error, derive_more::From,
)]
pub enum ParseFailure {
    #[display("invalid UTF-8: {_0}")]
    Encoding(Utf8Error),
    #[display("{_0}")]
    Number(ParseFloatError),
}

/// Result of reading a network file.
#[derive(Debug, Clone, Copy, PartialEq, derive_more::IsVariant)]
pub enum LoadOutcome {
    /// The file was missing or held no data; the network kept its weights.
    Empty,
    /// Weights were replaced and the stored fitness was recorded as best fitness.
    Loaded { fitness: f32 },
}

impl LoadOutcome {
    #[must_use]
    pub fn fitness(self) -> Option<f32> {
        match self {
            LoadOutcome::Empty => None,
            LoadOutcome::Loaded { fitness } => Some(fitness),
        }
    }
}

/// Writes the network's fitness and weights in the persisted text layout.
pub fn write_network<W>(mut writer: W, network: &NeuralNetwork) -> io::Result<()>
where
    W: Write,
{
    writeln!(writer, "{}", network.fitness())?;
    for w in network.weights() {
        writeln!(writer, "{w}")?;
    }
    writer.flush()
}

/// Parses a network file into `network`'s existing topology.
///
/// On success the weights are replaced and `best_fitness` is set to the stored
/// fitness. On any error the network is left unchanged.
pub fn read_network<R>(reader: R, network: &mut NeuralNetwork) -> Result<LoadOutcome, CodecError>
where
    R: BufRead,
{
    let mut lines = reader.split(b'\n').collect::<Result<Vec<_>, _>>()?;
    while lines.last().is_some_and(|l| l.trim_ascii().is_empty()) {
        lines.pop();
    }
    let Some((first, rest)) = lines.split_first() else {
        return Ok(LoadOutcome::Empty);
    };

    let fitness = parse_value(1, first)?;
    let expected = network.topology().weight_count();
    if rest.len() != expected {
        return Err(ShapeError::WeightCount {
            expected,
            actual: rest.len(),
        }
        .into());
    }
    let weights = rest
        .iter()
        .enumerate()
        .map(|(i, line)| parse_value(i + 2, line))
        .collect::<Result<Vec<_>, _>>()?;

    network.set_weights(weights)?;
    network.set_best_fitness(fitness);
    Ok(LoadOutcome::Loaded { fitness })
}

fn parse_value(line: usize, bytes: &[u8]) -> Result<f32, CodecError> {
    let parse_error = |source: ParseFailure| CodecError::Parse {
        line,
        token: String::from_utf8_lossy(bytes.trim_ascii()).into_owned(),
        source,
    };
    let token = str::from_utf8(bytes)
        .map_err(|e| parse_error(e.into()))?
        .trim();
    let value = token
        .parse::<f32>()
        .map_err(|e| parse_error(e.into()))?;
    if !value.is_finite() {
        return Err(CodecError::NonFinite { line, value });
    }
    Ok(value)
}

/// Saves `network` to `path`, replacing any previous content.
pub fn save<P>(path: P, network: &NeuralNetwork) -> Result<(), CodecError>
where
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let tmp_path = temp_path(path)?;
    let file = File::create(&tmp_path)?;
    let written = write_and_replace(file, &tmp_path, path, network);
    if written.is_err() {
        fs::remove_file(&tmp_path).ok();
    }
    written?;
    log::debug!("saved network to {}", path.display());
    Ok(())
}

fn write_and_replace(
    file: File,
    tmp_path: &Path,
    path: &Path,
    network: &NeuralNetwork,
) -> io::Result<()> {
    let mut writer = BufWriter::new(file);
    write_network(&mut writer, network)?;
    writer
        .into_inner()
        .map_err(io::IntoInnerError::into_error)?
        .sync_all()?;
    fs::rename(tmp_path, path)
}

/// Loads the network stored at `path` into `network`.
///
/// A missing file is reported as [`LoadOutcome::Empty`].
pub fn load<P>(path: P, network: &mut NeuralNetwork) -> Result<LoadOutcome, CodecError>
where
    P: AsRef<Path>,
{
    let file = match File::open(path.as_ref()) {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            log::debug!("{} does not exist", path.as_ref().display());
            return Ok(LoadOutcome::Empty);
        }
        Err(e) => return Err(e.into()),
    };
    read_network(BufReader::new(file), network)
}

fn temp_path(path: &Path) -> io::Result<PathBuf> {
    let Some(file_name) = path.file_name() else {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("not a file path: {}", path.display()),
        ));
    };
    let mut tmp_name = file_name.to_owned();
    tmp_name.push(".tmp");
    Ok(path.with_file_name(tmp_name))
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng as _;
    use rand_pcg::Pcg32;

    use super::*;
    use crate::Topology;

    fn reference_network(seed: u64) -> NeuralNetwork {
        NeuralNetwork::random(Topology::reference(), &mut Pcg32::seed_from_u64(seed))
    }

    #[test]
    fn test_write_layout() {
        let topology = Topology::new(vec![2, 1]).unwrap();
        let mut net = NeuralNetwork::from_weights(topology, vec![0.25, -0.5]).unwrap();
        net.set_fitness(7.5);
        let mut buf = Vec::new();
        write_network(&mut buf, &net).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "7.5\n0.25\n-0.5\n");
    }

    #[test]
    fn test_roundtrip_is_bit_exact() {
        let mut original = reference_network(1);
        original.set_fitness(42.125);
        let mut buf = Vec::new();
        write_network(&mut buf, &original).unwrap();
        assert_eq!(buf.iter().filter(|&&b| b == b'\n').count(), 36);

        let mut loaded = reference_network(2);
        let outcome = read_network(buf.as_slice(), &mut loaded).unwrap();
        assert_eq!(outcome, LoadOutcome::Loaded { fitness: 42.125 });
        assert_eq!(loaded.weights(), original.weights());
        assert!((loaded.best_fitness() - 42.125).abs() < f32::EPSILON);
    }

    #[test]
    fn test_empty_input_keeps_weights() {
        let mut net = reference_network(3);
        let before = net.weights().to_vec();
        for input in ["", "\n\n", "  \n"] {
            let outcome = read_network(input.as_bytes(), &mut net).unwrap();
            assert!(outcome.is_empty());
        }
        assert_eq!(net.weights(), before.as_slice());
    }

    #[test]
    fn test_rejects_non_numeric_line() {
        let mut net = NeuralNetwork::from_weights(Topology::new(vec![2, 1]).unwrap(), vec![0.0; 2])
            .unwrap();
        let err = read_network("1.0\n0.5\nabc\n".as_bytes(), &mut net).unwrap_err();
        assert!(
            matches!(&err, CodecError::Parse { line: 3, token, .. } if token == "abc"),
            "{err}"
        );
        assert_eq!(net.weights(), &[0.0, 0.0]);
    }

    #[test]
    fn test_rejects_non_finite_value() {
        let mut net = NeuralNetwork::from_weights(Topology::new(vec![2, 1]).unwrap(), vec![0.0; 2])
            .unwrap();
        let err = read_network("1.0\nNaN\n0.5\n".as_bytes(), &mut net).unwrap_err();
        assert!(matches!(err, CodecError::NonFinite { line: 2, .. }), "{err}");
    }

    #[test]
    fn test_rejects_invalid_utf8_line() {
        let mut net = NeuralNetwork::from_weights(Topology::new(vec![2, 1]).unwrap(), vec![0.0; 2])
            .unwrap();
        let input = b"1.0\n0.5\n\xff\xfe\n";
        let err = read_network(&input[..], &mut net).unwrap_err();
        assert!(
            matches!(
                err,
                CodecError::Parse {
                    line: 3,
                    source: ParseFailure::Encoding(_),
                    ..
                }
            ),
            "{err}"
        );
        assert_eq!(net.weights(), &[0.0, 0.0]);
    }

    #[test]
    fn test_accepts_crlf_line_endings() {
        let mut net = NeuralNetwork::from_weights(Topology::new(vec![2, 1]).unwrap(), vec![0.0; 2])
            .unwrap();
        let outcome = read_network("3.5\r\n0.25\r\n-1\r\n".as_bytes(), &mut net).unwrap();
        assert_eq!(outcome.fitness(), Some(3.5));
        assert_eq!(net.weights(), &[0.25, -1.0]);
    }

    #[test]
    fn test_rejects_wrong_weight_count() {
        let mut net = reference_network(4);
        let err = read_network("1.0\n0.5\n0.25\n".as_bytes(), &mut net).unwrap_err();
        assert!(matches!(
            err,
            CodecError::Shape(ShapeError::WeightCount {
                expected: 35,
                actual: 2
            })
        ));

        let too_many = std::iter::repeat_n("0.1\n", 37).collect::<String>();
        let err = read_network(too_many.as_bytes(), &mut net).unwrap_err();
        assert!(matches!(
            err,
            CodecError::Shape(ShapeError::WeightCount {
                expected: 35,
                actual: 36
            })
        ));
    }

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let mut net = reference_network(5);
        let outcome = load(dir.path().join("missing.dat"), &mut net).unwrap();
        assert_eq!(outcome, LoadOutcome::Empty);
        assert_eq!(outcome.fitness(), None);
    }

    #[test]
    fn test_save_truncates_previous_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("best.dat");
        let mut big = NeuralNetwork::random(
            Topology::new(vec![8, 8, 8]).unwrap(),
            &mut Pcg32::seed_from_u64(6),
        );
        big.set_fitness(1.0);
        save(&path, &big).unwrap();

        let mut small = reference_network(7);
        small.set_fitness(2.0);
        save(&path, &small).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 36);
        assert!(!dir.path().join("best.dat.tmp").exists());
    }

    #[test]
    fn test_failed_save_removes_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        // a directory cannot be replaced by a file
        let path = dir.path().join("best.dat");
        fs::create_dir(&path).unwrap();

        let err = save(&path, &reference_network(8)).unwrap_err();
        assert!(err.is_io(), "{err}");
        assert!(!dir.path().join("best.dat.tmp").exists());
        assert!(path.is_dir());
    }
}
