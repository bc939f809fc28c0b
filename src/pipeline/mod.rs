//! Pipeline module - Decode a flow file, notify observers, warp an image.
//!
//! This is the thin caller around the codec and the warp. It owns the
//! configuration and the observer list; image loading and saving stay with
//! the caller.

mod observer;

use std::io;
use std::path::Path;

pub use observer::{FlowObserver, StatsLogObserver, TextDumpObserver};

use crate::compute::{FloatImage, FlowField, Raster, warp_with};
use crate::format::{FlowError, read_flow_file};
use crate::schema::{ConfigError, WarpConfig};

/// Errors raised by [`WarpPipeline`].
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Flow(#[from] FlowError),

    #[error("Flow observer failed: {0}")]
    Observer(#[source] io::Error),
}

/// Decode, observe and warp with one configuration.
///
/// Usage:
/// ```ignore
/// let mut pipeline = WarpPipeline::new(WarpConfig::default())?
///     .with_observer(Box::new(StatsLogObserver));
/// let output = pipeline.run("frame.flo", &source)?;
/// ```
pub struct WarpPipeline {
    config: WarpConfig,
    observers: Vec<Box<dyn FlowObserver>>,
}

impl WarpPipeline {
    /// Validate `config` and register a text dump observer if it asks for one.
    pub fn new(config: WarpConfig) -> Result<Self, PipelineError> {
        config.validate()?;

        let mut observers: Vec<Box<dyn FlowObserver>> = Vec::new();
        if let Some(dump) = &config.dump {
            observers.push(Box::new(TextDumpObserver::new(&dump.x_path, &dump.y_path)));
        }

        Ok(Self { config, observers })
    }

    pub fn with_observer(mut self, observer: Box<dyn FlowObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    pub fn config(&self) -> &WarpConfig {
        &self.config
    }

    /// Read a flow file and hand it to every observer.
    pub fn load_flow<P: AsRef<Path>>(&mut self, path: P) -> Result<FlowField, PipelineError> {
        let path = path.as_ref();
        let flow = read_flow_file(path)?;
        log::info!(
            "read {}: {}x{} flow field",
            path.display(),
            flow.width(),
            flow.height()
        );

        for observer in &mut self.observers {
            observer.on_flow(&flow).map_err(PipelineError::Observer)?;
        }
        Ok(flow)
    }

    /// Warp `source` by an already decoded field.
    pub fn warp<S: Raster + Sync + ?Sized>(
        &self,
        flow: &FlowField,
        source: &S,
    ) -> Result<FloatImage, PipelineError> {
        log::debug!(
            "warping {}x{}x{} image (policy {:?}, parallel {})",
            source.width(),
            source.height(),
            source.channels(),
            self.config.unknown_policy,
            self.config.parallel
        );
        Ok(warp_with(flow, source, &self.config)?)
    }

    /// Load the flow file at `flow_path` and warp `source` with it.
    pub fn run<P: AsRef<Path>, S: Raster + Sync + ?Sized>(
        &mut self,
        flow_path: P,
        source: &S,
    ) -> Result<FloatImage, PipelineError> {
        let flow = self.load_flow(flow_path)?;
        self.warp(&flow, source)
    }
}
