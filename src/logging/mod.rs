//! Training metrics sinks
mod memory;
mod tensorboard;

pub use memory::{RecordingSink, ScalarRecord};
pub use tensorboard::{TensorBoardConfig, TensorBoardSink};

use std::io;

/// Receives scalar training metrics indexed by a global step.
pub trait MetricsSink {
    /// Record a scalar value.
    ///
    /// # Args
    /// * `tag` - Name of the time series the value belongs to.
    /// * `value` - The value to record.
    /// * `step` - Global step index of the value.
    fn add_scalar(&mut self, tag: &str, value: f64, step: usize);

    /// Write out any buffered values.
    fn flush(&mut self);
}

/// Sink that discards everything.
impl MetricsSink for () {
    fn add_scalar(&mut self, _: &str, _: f64, _: usize) {}

    fn flush(&mut self) {}
}

/// Send every value to both sinks.
impl<A, B> MetricsSink for (A, B)
where
    A: MetricsSink,
    B: MetricsSink,
{
    fn add_scalar(&mut self, tag: &str, value: f64, step: usize) {
        self.0.add_scalar(tag, value, step);
        self.1.add_scalar(tag, value, step);
    }

    fn flush(&mut self) {
        self.0.flush();
        self.1.flush();
    }
}

impl<T: MetricsSink + ?Sized> MetricsSink for &'_ mut T {
    fn add_scalar(&mut self, tag: &str, value: f64, step: usize) {
        T::add_scalar(self, tag, value, step)
    }

    fn flush(&mut self) {
        T::flush(self)
    }
}

impl<T: MetricsSink + ?Sized> MetricsSink for Box<T> {
    fn add_scalar(&mut self, tag: &str, value: f64, step: usize) {
        T::add_scalar(self, tag, value, step)
    }

    fn flush(&mut self) {
        T::flush(self)
    }
}

/// Build a [`MetricsSink`] for a training run.
pub trait BuildMetricsSink {
    type Sink: MetricsSink + Send;

    /// Open a new sink.
    fn build_sink(&self) -> io::Result<Self::Sink>;
}

impl BuildMetricsSink for () {
    type Sink = ();

    fn build_sink(&self) -> io::Result<Self::Sink> {
        Ok(())
    }
}

impl<A, B> BuildMetricsSink for (A, B)
where
    A: BuildMetricsSink,
    B: BuildMetricsSink,
{
    type Sink = (A::Sink, B::Sink);

    fn build_sink(&self) -> io::Result<Self::Sink> {
        Ok((self.0.build_sink()?, self.1.build_sink()?))
    }
}

impl<T: BuildMetricsSink + ?Sized> BuildMetricsSink for Box<T> {
    type Sink = T::Sink;

    fn build_sink(&self) -> io::Result<Self::Sink> {
        T::build_sink(self)
    }
}
