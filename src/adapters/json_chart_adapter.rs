//! JSON chart writer.

use crate::domain::chart::ChartOutput;
use crate::domain::error::FvgError;
use crate::ports::chart_port::ChartPort;
use std::fs;
use std::path::Path;

#[derive(Debug, Default)]
pub struct JsonChartAdapter {
    pub compact: bool,
}

impl JsonChartAdapter {
    pub fn to_json(&self, chart: &ChartOutput) -> Result<String, FvgError> {
        let json = if self.compact {
            serde_json::to_string(chart)?
        } else {
            serde_json::to_string_pretty(chart)?
        };
        Ok(json)
    }
}

impl ChartPort for JsonChartAdapter {
    fn write(&self, chart: &ChartOutput, output_path: &Path) -> Result<(), FvgError> {
        let json = self.to_json(chart)?;
        fs::write(output_path, json)?;
        tracing::info!(
            path = %output_path.display(),
            lines = chart.lines.len(),
            shapes = chart.shapes.len(),
            "chart written"
        );
        Ok(())
    }
}
