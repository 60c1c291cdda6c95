//! Tensorboard metrics
use super::{BuildMetricsSink, MetricsSink};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tensorboard_rs::summary_writer::SummaryWriter as TbSummaryWriter;

/// Configuration for [`TensorBoardSink`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TensorBoardConfig {
    /// Directory in which event files are written.
    pub log_dir: PathBuf,
}

impl TensorBoardConfig {
    pub fn new<P: Into<PathBuf>>(log_dir: P) -> Self {
        Self {
            log_dir: log_dir.into(),
        }
    }
}

impl BuildMetricsSink for TensorBoardConfig {
    type Sink = TensorBoardSink;

    fn build_sink(&self) -> io::Result<Self::Sink> {
        TensorBoardSink::new(&self.log_dir)
    }
}

/// Sink that writes scalars to a tensorboard event file.
pub struct TensorBoardSink {
    writer: TbSummaryWriter,
    log_dir: PathBuf,
}

impl fmt::Debug for TensorBoardSink {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("TensorBoardSink")
            .field("log_dir", &self.log_dir)
            .finish()
    }
}

impl TensorBoardSink {
    /// Open a sink writing to a new event file in `log_dir`.
    ///
    /// The directory is created if it does not exist.
    pub fn new<P: AsRef<Path>>(log_dir: P) -> io::Result<Self> {
        let log_dir = log_dir.as_ref();
        fs::create_dir_all(log_dir)?;
        Ok(Self {
            writer: TbSummaryWriter::new(log_dir),
            log_dir: log_dir.to_path_buf(),
        })
    }
}

impl MetricsSink for TensorBoardSink {
    #[allow(clippy::cast_possible_truncation)]
    fn add_scalar(&mut self, tag: &str, value: f64, step: usize) {
        self.writer.add_scalar(tag, value as f32, step);
    }

    fn flush(&mut self) {
        self.writer.flush();
    }
}

impl Drop for TensorBoardSink {
    fn drop(&mut self) {
        self.writer.flush();
    }
}
