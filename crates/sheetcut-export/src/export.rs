//! Writes every visible sheet group of a cutting diagram to its own file.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::config::{FileFormat, RenderConfig};
use crate::diagram::CuttingDiagram;
use crate::error::{ExportError, PreconditionError};
use crate::render::render_sheet;
use crate::units::UnitProvider;

/// The only interactive collaborator of an export. `None` from either method means the
/// user backed out, which cancels the export.
pub trait DirectoryChooser {
    fn choose_directory(&mut self) -> Option<PathBuf>;
    /// Asked once, before any file is opened, when `folder` already exists in `parent`.
    fn confirm_overwrite(&mut self, folder: &str, parent: &Path) -> Option<bool>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOutcome {
    Exported {
        export_path: PathBuf,
        files: Vec<PathBuf>,
    },
    Cancelled,
    /// Preconditions failed; nothing was touched.
    Failed { errors: Vec<PreconditionError> },
}

/// `sheet_001.dxf` for a single sheet, `sheet_003_to_005.dxf` for a group of three.
#[must_use]
pub fn sheet_file_name(start_index: usize, count: usize, format: FileFormat) -> String {
    if count > 1 {
        format!(
            "sheet_{start_index:03}_to_{:03}.{}",
            start_index + count - 1,
            format.extension()
        )
    } else {
        format!("sheet_{start_index:03}.{}", format.extension())
    }
}

fn check_preconditions(
    diagram: Option<&CuttingDiagram>,
    config: &RenderConfig,
) -> Vec<PreconditionError> {
    let mut errors = Vec::new();
    match diagram {
        None => errors.push(PreconditionError::MissingDiagram),
        Some(d) if d.obsolete => errors.push(PreconditionError::ObsoleteDiagram),
        Some(d) if d.group.is_none() => errors.push(PreconditionError::MissingGroup),
        Some(_) => {}
    }
    if !config.file_format.is_supported_2d() {
        errors.push(PreconditionError::UnsupportedFormat(config.file_format));
    }
    errors
}

fn io_error(action: &'static str, path: &Path) -> impl FnOnce(std::io::Error) -> ExportError {
    let path = path.to_path_buf();
    move |source| ExportError::Io {
        action,
        path,
        source,
    }
}

/// Export `diagram` under a folder named after its material group, inside the directory
/// picked by `chooser`.
///
/// Precondition failures and cancellation are outcomes, not errors. I/O failures abort the
/// export and may leave files already written in place.
pub fn export(
    diagram: Option<&CuttingDiagram>,
    config: &RenderConfig,
    chooser: &mut dyn DirectoryChooser,
    units: &dyn UnitProvider,
) -> Result<ExportOutcome, ExportError> {
    let errors = check_preconditions(diagram, config);
    let (Some(diagram), Some(folder)) = (diagram, diagram.and_then(CuttingDiagram::folder_name))
    else {
        return Ok(ExportOutcome::Failed { errors });
    };
    if !errors.is_empty() {
        return Ok(ExportOutcome::Failed { errors });
    }

    let Some(parent) = chooser.choose_directory() else {
        debug!("no export directory chosen");
        return Ok(ExportOutcome::Cancelled);
    };
    let export_path = parent.join(&folder);

    if export_path.exists() {
        match chooser.confirm_overwrite(&folder, &parent) {
            Some(true) => {
                warn!(path = %export_path.display(), "replacing existing export folder");
                fs::remove_dir_all(&export_path).map_err(io_error("remove", &export_path))?;
            }
            Some(false) | None => {
                debug!(path = %export_path.display(), "overwrite declined");
                return Ok(ExportOutcome::Cancelled);
            }
        }
    }
    fs::create_dir_all(&export_path).map_err(io_error("create", &export_path))?;

    let unit = units.length_unit();
    let mut files = Vec::new();
    let mut sheet_index = 1usize;
    for sheet in &diagram.sheets {
        let count = sheet.count.max(1);
        let start_index = sheet_index;
        sheet_index += count;

        if config.hidden_sheet_indices.contains(&start_index) {
            debug!(sheet = start_index, count, "sheet group hidden");
            continue;
        }

        let path = export_path.join(sheet_file_name(start_index, count, config.file_format));
        debug!(path = %path.display(), parts = sheet.parts.len(), "writing sheet");
        let file = File::create(&path).map_err(io_error("create", &path))?;
        let mut out = BufWriter::new(file);
        render_sheet(&mut out, diagram, sheet, config, unit)
            .and_then(|()| out.flush())
            .map_err(io_error("write", &path))?;
        files.push(path);
    }

    info!(
        path = %export_path.display(),
        files = files.len(),
        format = %config.file_format,
        unit = %unit,
        "cutting diagram exported"
    );
    Ok(ExportOutcome::Exported { export_path, files })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagram::MaterialGroup;

    #[test]
    fn file_names_carry_the_index_range() {
        assert_eq!(sheet_file_name(1, 1, FileFormat::Dxf), "sheet_001.dxf");
        assert_eq!(sheet_file_name(1, 2, FileFormat::Dxf), "sheet_001_to_002.dxf");
        assert_eq!(sheet_file_name(12, 3, FileFormat::Svg), "sheet_012_to_014.svg");
    }

    #[test]
    fn preconditions_are_collected() {
        let config = RenderConfig {
            file_format: FileFormat::Stl,
            ..RenderConfig::default()
        };
        assert_eq!(
            check_preconditions(None, &config),
            vec![
                PreconditionError::MissingDiagram,
                PreconditionError::UnsupportedFormat(FileFormat::Stl)
            ]
        );

        let obsolete = CuttingDiagram {
            obsolete: true,
            group: Some(MaterialGroup {
                material_display_name: "Oak".into(),
                std_dimension: "18mm".into(),
            }),
            ..CuttingDiagram::default()
        };
        assert_eq!(
            check_preconditions(Some(&obsolete), &RenderConfig::default()),
            vec![PreconditionError::ObsoleteDiagram]
        );
        assert_eq!(
            check_preconditions(Some(&CuttingDiagram::default()), &RenderConfig::default()),
            vec![PreconditionError::MissingGroup]
        );
    }
}
