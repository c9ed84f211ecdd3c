use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;
use sheetcut_export::{
    export, DiagramDocument, DirectoryChooser, ExportOutcome, LabelSource, RenderConfig,
};
use tracing::warn;

use crate::error::CliError;
use crate::ExportArgs;

/// Destination fixed on the command line; overwrite answered by `--yes` or on stdin.
struct TerminalChooser {
    directory: PathBuf,
    assume_yes: bool,
}

impl DirectoryChooser for TerminalChooser {
    fn choose_directory(&mut self) -> Option<PathBuf> {
        Some(self.directory.clone())
    }

    fn confirm_overwrite(&mut self, folder: &str, parent: &Path) -> Option<bool> {
        if self.assume_yes {
            return Some(true);
        }
        let question = format!(
            "Folder \"{folder}\" already exists in {}. Replace it?",
            parent.display()
        );
        match ask(&question) {
            Ok(answer) => answer,
            Err(err) => {
                warn!("{err:#}");
                None
            }
        }
    }
}

/// `None` when stdin is closed before an answer arrives.
fn ask(question: &str) -> anyhow::Result<Option<bool>> {
    let mut stderr = io::stderr().lock();
    write!(stderr, "{question} [y/N] ").context("writing prompt")?;
    stderr.flush().context("writing prompt")?;

    let mut line = String::new();
    let read = io::stdin()
        .lock()
        .read_line(&mut line)
        .context("reading answer from stdin")?;
    if read == 0 {
        return Ok(None);
    }
    Ok(Some(matches!(
        line.trim().to_ascii_lowercase().as_str(),
        "y" | "yes"
    )))
}

fn load_config(args: &ExportArgs) -> Result<RenderConfig, CliError> {
    let mut config = match &args.config {
        Some(path) => RenderConfig::from_path(path)?,
        None => RenderConfig::default(),
    };
    if let Some(format) = args.format {
        config.file_format = format;
    }
    if args.names {
        config.label_source = LabelSource::Name;
    }
    if args.smooth {
        config.smoothing = true;
    }
    config
        .hidden_sheet_indices
        .extend(args.hidden_sheets.iter().copied());
    Ok(config)
}

pub fn run_export(args: ExportArgs) -> Result<(), CliError> {
    let diagram = DiagramDocument::load(&args.diagram)?.into_diagram()?;
    let config = load_config(&args)?;

    let mut chooser = TerminalChooser {
        directory: args.output.clone(),
        assume_yes: args.yes,
    };
    match export(Some(&diagram), &config, &mut chooser, &args.units)? {
        ExportOutcome::Exported { export_path, files } => {
            println!(
                "Exported {} file(s) to {}",
                files.len(),
                export_path.display()
            );
            Ok(())
        }
        ExportOutcome::Cancelled => {
            println!("Export cancelled.");
            Ok(())
        }
        ExportOutcome::Failed { errors } => Err(CliError::refused(&errors)),
    }
}
