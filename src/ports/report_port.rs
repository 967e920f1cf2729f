//! Report output port.

use std::path::Path;

use crate::domain::error::AdaptraderError;
use crate::domain::pipeline::PipelineReport;

/// Port for handing a finished run to the presentation side.
pub trait ReportPort {
    fn write(
        &self,
        report: &PipelineReport,
        symbol: &str,
        output_path: &Path,
    ) -> Result<(), AdaptraderError>;
}
