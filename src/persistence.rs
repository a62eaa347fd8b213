//! Checkpoint persistence for populations.
//!
//! Checkpoints are JSON documents holding the run metadata, the current
//! generation number, and every genome's connection genes. Loading
//! rebuilds genomes through a genome builder, so the reconstructed
//! population carries freshly derived graph structures.

use crate::genome::{ConnectionSet, GenomeBuilder, GenomeMetadata};
use crate::population::Population;
use crate::scalar::Scalar;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt;
use std::fs;
use std::io;
use std::path::Path;
use std::sync::Arc;

/// Current checkpoint format version.
const FORMAT_VERSION: u32 = 1;

/// One connection gene in checkpoint form.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct ConnectionModel {
    source: u32,
    target: u32,
    weight: f64,
}

/// One genome in checkpoint form.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct GenomeModel {
    id: u32,
    birth_generation: u32,
    connections: Vec<ConnectionModel>,
}

/// A saved population checkpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Checkpoint {
    version: u32,
    generation: u32,
    metadata: GenomeMetadata,
    genomes: Vec<GenomeModel>,
}

/// Error saving or loading a checkpoint.
#[derive(Debug)]
pub enum PersistenceError {
    /// File I/O failed.
    Io(io::Error),
    /// The checkpoint document could not be (de)serialized.
    Format(serde_json::Error),
    /// The checkpoint was written by an incompatible format version.
    UnsupportedVersion(u32),
    /// The checkpoint's metadata does not match the builder's metadata.
    MetadataMismatch,
}

impl fmt::Display for PersistenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::Format(e) => write!(f, "checkpoint format error: {e}"),
            Self::UnsupportedVersion(v) => {
                write!(f, "unsupported checkpoint format version: {v}")
            }
            Self::MetadataMismatch => {
                write!(f, "checkpoint metadata does not match the genome builder")
            }
        }
    }
}

impl Error for PersistenceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Format(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for PersistenceError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<serde_json::Error> for PersistenceError {
    fn from(e: serde_json::Error) -> Self {
        Self::Format(e)
    }
}

/// Save a population checkpoint to `path`.
///
/// # Errors
///
/// Returns an error if serialization or file I/O fails.
pub fn save_checkpoint<W: Scalar>(
    population: &Population<W>,
    path: &Path,
) -> Result<(), PersistenceError> {
    let genomes = population
        .genomes()
        .iter()
        .map(|genome| {
            let connections = genome.connections();
            GenomeModel {
                id: genome.id(),
                birth_generation: genome.birth_generation(),
                connections: (0..connections.len())
                    .map(|i| {
                        let (source, target, weight) = connections.get(i);
                        ConnectionModel {
                            source,
                            target,
                            weight: weight.to_f64(),
                        }
                    })
                    .collect(),
            }
        })
        .collect();

    let checkpoint = Checkpoint {
        version: FORMAT_VERSION,
        generation: population.generation_seq().peek(),
        metadata: (**population.metadata()).clone(),
        genomes,
    };

    let json = serde_json::to_vec_pretty(&checkpoint)?;
    fs::write(path, json)?;
    Ok(())
}

/// Load a population checkpoint from `path`, rebuilding every genome
/// through `builder`.
///
/// # Errors
///
/// Returns an error if file I/O or parsing fails, the format version is
/// unsupported, or the checkpoint metadata does not match the builder's.
pub fn load_checkpoint<W: Scalar>(
    path: &Path,
    builder: Arc<dyn GenomeBuilder<W>>,
) -> Result<Population<W>, PersistenceError> {
    let json = fs::read(path)?;
    let checkpoint: Checkpoint = serde_json::from_slice(&json)?;

    if checkpoint.version != FORMAT_VERSION {
        return Err(PersistenceError::UnsupportedVersion(checkpoint.version));
    }
    if checkpoint.metadata != **builder.metadata() {
        return Err(PersistenceError::MetadataMismatch);
    }

    let metadata = Arc::clone(builder.metadata());
    let genomes = checkpoint
        .genomes
        .iter()
        .map(|model| {
            let mut connections = ConnectionSet::with_capacity(model.connections.len());
            for conn in &model.connections {
                connections.push(conn.source, conn.target, W::from_f64(conn.weight));
            }
            connections.sort();
            Arc::new(builder.create(model.id, model.birth_generation, connections))
        })
        .collect();

    let population = Population::new(metadata, builder, genomes);
    population.generation_seq().set_next(checkpoint.generation);
    Ok(population)
}
