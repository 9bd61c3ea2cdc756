/*!
 * JSON report serialization.
 */

use log::debug;
use std::fs;
use std::path::Path;

use crate::errors::AppError;
use crate::reporting::RunReport;

/// Serializes a finalized [`RunReport`] to pretty-printed JSON.
pub struct JsonReportWriter;

impl JsonReportWriter {
    /// Write the report, creating parent directories as needed.
    ///
    /// A write failure here is a persistence error and fatal to the run.
    pub fn write(report: &RunReport, path: &Path) -> Result<(), AppError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| AppError::Persistence {
                    target: format!("report directory {}", parent.display()),
                    detail: e.to_string(),
                })?;
            }
        }

        let payload =
            serde_json::to_string_pretty(report).map_err(|e| AppError::Persistence {
                target: format!("report {}", path.display()),
                detail: e.to_string(),
            })?;

        fs::write(path, payload).map_err(|e| AppError::Persistence {
            target: format!("report {}", path.display()),
            detail: e.to_string(),
        })?;

        debug!("Report written | path={}", path.display());
        Ok(())
    }
}
