//! Wrappers for the external bioinformatics tools the pipeline drives.
//!
//! Each wrapper builds a flat argument list, spawns the tool as a blocking
//! subprocess, and parses its textual output. The tools themselves are black
//! boxes; a non-zero exit status is the only failure signal honored here.

pub mod diamond;
pub mod mock;
pub mod prodigal;
pub mod traits;

pub use diamond::{AlignerMode, DiamondAligner, OutputFormat};
pub use mock::MockAligner;
pub use prodigal::{GeneFormat, GenePrediction, ProcedureMode, Prodigal};
pub use traits::{Aligner, DatabaseFormatter, SearchEngine};
