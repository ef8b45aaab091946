use crate::argocd::ArgoApp;
use anyhow::{Context as anyhowContext, Result};
use log::info;
use prettydiff::{diff_lines, text::ContextConfig};
use std::{fs, io::ErrorKind, path::Path};

#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Output {
    Stdout,
    Written,
    Unchanged,
    DryRun,
}

pub(crate) fn render(app: &ArgoApp) -> Result<String> {
    serde_yaml::to_string(app).context(format!("serializing application {}", app.metadata.name))
}

/// Hand the manifest over. Without a target it goes to stdout. With one, the
/// file is only touched when `write` is set, otherwise the diff is shown.
pub(crate) fn emit(manifest: &str, target: Option<&Path>, write: bool) -> Result<Output> {
    let Some(path) = target else {
        print!("{manifest}");
        return Ok(Output::Stdout);
    };

    let existing = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => String::new(),
        Err(e) => return Err(e).context(format!("reading {}", path.display())),
    };

    if existing == manifest {
        info!("{} is up to date", path.display());
        return Ok(Output::Unchanged);
    }

    println!("#{}:\n----\n{}\n", path.display(), diff(&existing, manifest));

    if !write {
        info!("Dry run, pass --write to update {}", path.display());
        return Ok(Output::DryRun);
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).context(format!("creating {}", parent.display()))?;
    }
    fs::write(path, manifest).context(format!("writing {}", path.display()))?;
    info!("Wrote {}", path.display());

    Ok(Output::Written)
}

fn diff(original: &str, updated: &str) -> String {
    diff_lines(original, updated)
        .format_with_context(
            Some(ContextConfig {
                context_size: 2,
                skipping_marker: "---",
            }),
            true,
        )
        .to_string()
}
