//! Chart output port trait.

use crate::domain::chart::ChartOutput;
use crate::domain::error::FvgError;
use std::path::Path;

/// Port for handing line series, shapes and status to a renderer.
pub trait ChartPort {
    fn write(&self, chart: &ChartOutput, output_path: &Path) -> Result<(), FvgError>;
}
