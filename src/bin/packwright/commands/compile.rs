//! `packwright compile` command

use std::path::Path;

use anyhow::{bail, Result};

use crate::cli::CompileArgs;
use packwright::core::CompiledInstallation;
use packwright::ops::{compile, find_compile_error, manifest_base_dir, CompileOptions, ManifestSource};
use packwright::util::diagnostic::emit;
use packwright::util::fs::{relative_path, write_string};
use packwright::util::GlobalContext;

pub fn execute(args: CompileArgs, color: bool) -> Result<()> {
    let mut ctx = GlobalContext::new()?;
    ctx.set_color(color);
    let manifest = ctx.absolute(&args.manifest);
    if !manifest.is_file() {
        bail!(
            "could not find manifest {}\n\
             help: Pass the path to an installation XML file",
            manifest.display()
        );
    }
    let base_dir = manifest_base_dir(&manifest, args.base_dir.as_deref().map(|d| ctx.absolute(d)).as_deref());

    let config = ctx.load_config(&base_dir);
    let mut options = CompileOptions::new(&base_dir);
    options.apply_config(&config);
    options.home = Some(ctx.resolve_home(args.home.as_deref(), &config));
    if let Some(kind) = args.kind {
        options.kind = kind.into();
    }

    let installation = match compile(&ManifestSource::File(manifest.clone()), &options) {
        Ok(installation) => installation,
        Err(err) => {
            if let Some(compile_error) = find_compile_error(&err) {
                emit(&compile_error.to_diagnostic(), ctx.color());
                bail!("could not compile {}", manifest.display());
            }
            return Err(err);
        }
    };

    let warnings = installation.diagnostics.warning_count();
    if args.deny_warnings && warnings > 0 {
        bail!(
            "{} produced {} warning{} (--deny-warnings)",
            manifest.display(),
            warnings,
            if warnings == 1 { "" } else { "s" }
        );
    }

    match args.emit_json.as_deref() {
        Some(path) if path == Path::new("-") => {
            println!("{}", installation.to_json()?);
        }
        Some(path) => {
            write_string(&ctx.absolute(path), &installation.to_json()?)?;
            print_summary(&installation, &base_dir);
        }
        None => print_summary(&installation, &base_dir),
    }
    Ok(())
}

fn print_summary(installation: &CompiledInstallation, base_dir: &Path) {
    println!(
        "Compiled {} {} ({} installer)",
        installation.info.app_name, installation.info.app_version, installation.kind
    );
    for pack in &installation.packs {
        let marker = if pack.required { " (required)" } else { "" };
        println!(
            "  pack {}{}: {} files, {} bytes",
            pack.name,
            marker,
            pack.files.len(),
            pack.size()
        );
    }
    println!(
        "  {} panels, {} resources, {} language packs",
        installation.panels.len(),
        installation.resources.len(),
        installation.lang_packs.len()
    );
    for resource in &installation.resources {
        tracing::debug!(
            "resource {} <- {}",
            resource.id,
            relative_path(base_dir, &resource.origin).display()
        );
    }

    let warnings = installation.diagnostics.warning_count();
    if warnings > 0 {
        println!(
            "  {} warning{}",
            warnings,
            if warnings == 1 { "" } else { "s" }
        );
    }
}
