//! Pack assembly and pack inclusion.
//!
//! `<packs>` children are handled in document order. A `<refpack>` or
//! `<refpackset>` loads another manifest, runs its properties and resources
//! and then appends its packs through this same module, so packs from
//! included documents land exactly where they were referenced.
//!
//! File declarations come in three shapes:
//!
//! - `<file src targetdir [unpack]>` adds a file, a directory tree, or the
//!   entries of a zip archive under `targetdir`.
//! - `<singlefile src target>` adds one file under an explicit target.
//! - `<fileset dir targetdir ..>` adds whatever a [`FilesetScanner`] selects.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, Result};
use walkdir::WalkDir;

use crate::core::os::{any_windows, OsConstraint};
use crate::core::pack::{
    Blockable, Executable, ExecutableKind, OverrideType, Pack, PackFile, Parsable, UpdateCheck,
};
use crate::hooks::{FileContext, Phase};
use crate::ops::context::CompilerContext;
use crate::ops::document::Document;
use crate::ops::errors::CompileError;
use crate::ops::properties::define_properties;
use crate::ops::resources::add_resources;
use crate::ops::scope::{parse_bool, SourceScope};
use crate::util::archive;
use crate::util::fileset::{to_slash, FilesetScanner, PatternSet};
use crate::util::fs::normalize_path;
use crate::util::substitute::SubstitutionType;
use crate::util::xml::{self, Element};

/// Assemble every pack of the document's `<packs>` block.
pub fn add_packs(ctx: &mut CompilerContext, doc: &Document) -> Result<()> {
    let scope = &doc.scope;
    let block = scope.require_child(&doc.root, "packs")?;

    let mut declared = 0;
    for child in xml::child_elements(block) {
        match child.name.as_str() {
            "pack" => add_pack(ctx, scope, child)?,
            "refpack" => add_refpack(ctx, scope, child)?,
            "refpackset" => add_refpackset(ctx, scope, child)?,
            _ => continue,
        }
        declared += 1;
    }
    if declared == 0 {
        return Err(scope
            .structural(block, "<packs> requires a <pack>, <refpack> or <refpackset>")
            .into());
    }
    Ok(())
}

fn add_pack(ctx: &mut CompilerContext, scope: &SourceScope, element: &Element) -> Result<()> {
    let name = scope.require_attribute(element, "name")?;
    let description = xml::content(scope.require_child(element, "description")?).unwrap_or_default();
    let required = scope.require_yes_no(element, "required")?;
    let exclude_group = owned(element, "excludeGroup");

    if required {
        if let Some(group) = &exclude_group {
            return Err(CompileError::RequiredInExcludeGroup {
                file: scope.file().map(Path::to_path_buf),
                pack: name.to_string(),
                group: group.clone(),
            }
            .into());
        }
    }

    let mut pack = Pack::new(name, description);
    pack.required = required;
    pack.id = owned(element, "id");
    pack.image_id = owned(element, "packImgId");
    pack.loose = scope.yes_no(element, "loose", false);
    pack.hidden = scope.yes_no(element, "hidden", false);
    pack.uninstall = scope.yes_no(element, "uninstall", true);
    pack.preselected = scope.yes_no(element, "preselected", exclude_group.is_none());
    pack.exclude_group = exclude_group;
    pack.group = owned(element, "group");
    pack.parent = owned(element, "parent");
    pack.condition = owned(element, "condition");
    pack.os_constraints = OsConstraint::from_element(element);
    if let Some(groups) = xml::attr(element, "installGroups") {
        pack.install_groups = groups
            .split(',')
            .map(str::trim)
            .filter(|group| !group.is_empty())
            .map(str::to_string)
            .collect();
    }

    for parsable in xml::children_named(element, "parsable") {
        pack.parsables.push(Parsable {
            target: scope.require_attribute(parsable, "targetfile")?.to_string(),
            kind: SubstitutionType::lookup(xml::attr(parsable, "type")),
            encoding: owned(parsable, "encoding"),
            os_constraints: OsConstraint::from_element(parsable),
            condition: owned(parsable, "condition"),
        });
    }

    for executable in xml::children_named(element, "executable") {
        pack.executables.push(read_executable(scope, executable)?);
    }

    for file in xml::children_named(element, "file") {
        add_file(ctx, scope, file, &mut pack)?;
    }
    for file in xml::children_named(element, "singlefile") {
        add_single_file(ctx, scope, file, &mut pack)?;
    }
    for fileset in xml::children_named(element, "fileset") {
        add_fileset(ctx, scope, fileset, &mut pack)?;
    }

    for check in xml::children_named(element, "updatecheck") {
        pack.update_checks.push(UpdateCheck {
            includes: names_of(scope, check, "include")?,
            excludes: names_of(scope, check, "exclude")?,
            case_sensitive: xml::attr(check, "casesensitive").and_then(parse_bool),
        });
    }

    for depends in xml::children_named(element, "depends") {
        pack.dependencies
            .push(scope.require_attribute(depends, "packname")?.to_string());
    }

    for validator in xml::children_named(element, "validator") {
        pack.validators.push(scope.require_content(validator)?);
    }

    tracing::debug!("pack {} with {} files", pack.name, pack.files.len());
    ctx.packs.push(pack);
    Ok(())
}

/// Executable attributes are lenient: unknown values keep the defaults.
fn read_executable(scope: &SourceScope, element: &Element) -> Result<Executable> {
    let kind: ExecutableKind = lenient(element, "type");
    let mut args = Vec::new();
    if let Some(list) = xml::first_child(element, "args") {
        for arg in xml::children_named(list, "arg") {
            args.push(scope.require_attribute(arg, "value")?.to_string());
        }
    }

    Ok(Executable {
        target: scope.require_attribute(element, "targetfile")?.to_string(),
        stage: lenient(element, "stage"),
        kind,
        main_class: match kind {
            ExecutableKind::Jar => owned(element, "class"),
            ExecutableKind::Bin => None,
        },
        on_failure: lenient(element, "failure"),
        keep: scope.yes_no(element, "keep", false),
        args,
        os_constraints: OsConstraint::from_element(element),
        condition: owned(element, "condition"),
    })
}

fn lenient<T: FromStr + Default>(element: &Element, name: &str) -> T {
    xml::attr(element, name)
        .and_then(|value| value.parse().ok())
        .unwrap_or_default()
}

fn names_of(scope: &SourceScope, element: &Element, child: &str) -> Result<Vec<String>> {
    let mut names = Vec::new();
    for el in xml::children_named(element, child) {
        names.push(scope.require_attribute(el, "name")?.to_string());
    }
    Ok(names)
}

/// Install policies shared by every file one declaration produces.
struct FilePolicy {
    os_constraints: Vec<OsConstraint>,
    override_type: OverrideType,
    blockable: Blockable,
    condition: Option<String>,
}

impl FilePolicy {
    fn read(ctx: &mut CompilerContext, scope: &SourceScope, element: &Element) -> Result<Self> {
        let os_constraints = OsConstraint::from_element(element);
        let override_type = scope
            .enumerated::<OverrideType>(element, "override", OverrideType::EXPECTED)?
            .unwrap_or_default();
        let blockable = scope
            .enumerated::<Blockable>(element, "blockable", Blockable::EXPECTED)?
            .unwrap_or_default();

        // The constraint list stays as declared; files may be multi-platform.
        if blockable != Blockable::None && !any_windows(&os_constraints) {
            ctx.warn(
                scope.file(),
                format!(
                    "{}: 'blockable' will implicitly apply only on Windows target systems",
                    xml::describe(element)
                ),
            );
        }

        Ok(FilePolicy {
            os_constraints,
            override_type,
            blockable,
            condition: owned(element, "condition"),
        })
    }
}

/// Entries one declaration adds to a pack.
struct FileSink<'e> {
    element: &'e Element,
    policy: FilePolicy,
}

impl FileSink<'_> {
    fn push(
        &self,
        ctx: &mut CompilerContext,
        scope: &SourceScope,
        pack: &mut Pack,
        source: &Path,
        target: String,
    ) -> Result<()> {
        let stat = std::fs::metadata(source)
            .with_context(|| format!("failed to read metadata of {}", source.display()))?;
        let metadata = ctx
            .hooks
            .revise_metadata(FileContext {
                element: self.element,
                source,
                target: &target,
            })
            .map_err(|failure| scope.hook_failed(self.element, &failure.hook, failure.error.0))?;

        pack.files.push(PackFile {
            source: source.to_path_buf(),
            target,
            is_directory: stat.is_dir(),
            size: if stat.is_dir() { 0 } else { stat.len() },
            os_constraints: self.policy.os_constraints.clone(),
            override_type: self.policy.override_type,
            blockable: self.policy.blockable,
            condition: self.policy.condition.clone(),
            metadata,
        });
        Ok(())
    }

    /// Add `file` under `targetdir`, descending into directories.
    ///
    /// Empty directories are added as entries of their own.
    fn push_tree(
        &self,
        ctx: &mut CompilerContext,
        scope: &SourceScope,
        pack: &mut Pack,
        file: &Path,
        targetdir: &str,
    ) -> Result<()> {
        let name = file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let target = join_target(targetdir, &name);
        if !file.is_dir() {
            return self.push(ctx, scope, pack, file, target);
        }

        let children: Vec<PathBuf> = WalkDir::new(file)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
            .into_iter()
            .map(|entry| entry.map(|e| e.into_path()))
            .collect::<Result<_, _>>()
            .with_context(|| format!("failed to list {}", file.display()))?;

        if children.is_empty() {
            return self.push(ctx, scope, pack, file, target);
        }
        for child in children {
            self.push_tree(ctx, scope, pack, &child, &target)?;
        }
        Ok(())
    }
}

fn add_file(
    ctx: &mut CompilerContext,
    scope: &SourceScope,
    element: &Element,
    pack: &mut Pack,
) -> Result<()> {
    let src = scope.require_attribute(element, "src")?;
    let targetdir = scope.require_attribute(element, "targetdir")?;
    let sink = FileSink {
        element,
        policy: FilePolicy::read(ctx, scope, element)?,
    };
    let source = resolve_source(ctx, scope, element, src)?;

    if scope.yes_no(element, "unpack", false) {
        for entry in archive::extract_files(&source, &ctx.scratch)? {
            let target = join_target(targetdir, &entry.name);
            sink.push(ctx, scope, pack, &entry.location, target)?;
        }
        return Ok(());
    }
    sink.push_tree(ctx, scope, pack, &source, targetdir)
}

fn add_single_file(
    ctx: &mut CompilerContext,
    scope: &SourceScope,
    element: &Element,
    pack: &mut Pack,
) -> Result<()> {
    let src = scope.require_attribute(element, "src")?;
    let target = scope.require_attribute(element, "target")?;
    let sink = FileSink {
        element,
        policy: FilePolicy::read(ctx, scope, element)?,
    };
    let source = resolve_source(ctx, scope, element, src)?;
    sink.push(ctx, scope, pack, &source, target.to_string())
}

fn add_fileset(
    ctx: &mut CompilerContext,
    scope: &SourceScope,
    element: &Element,
    pack: &mut Pack,
) -> Result<()> {
    let dir = scope.require_attribute(element, "dir")?;
    let targetdir = scope.require_attribute(element, "targetdir")?;
    let base = ctx.locator.project_path(dir);
    if !base.is_dir() {
        return Err(scope.not_found(element, "fileset directory", dir).into());
    }

    let mut patterns = PatternSet::new();
    for include in names_of(scope, element, "include")? {
        patterns.include(include);
    }
    for exclude in names_of(scope, element, "exclude")? {
        patterns.exclude(exclude);
    }
    if let Some(list) = xml::attr(element, "includes") {
        patterns.include_list(list);
    }
    if let Some(list) = xml::attr(element, "excludes") {
        patterns.exclude_list(list);
    }

    let scan = FilesetScanner::new(&base, patterns)
        .case_sensitive(scope.yes_no(element, "casesensitive", true))
        .default_excludes(scope.yes_no(element, "defaultexcludes", true))
        .scan()?;

    let sink = FileSink {
        element,
        policy: FilePolicy::read(ctx, scope, element)?,
    };
    for relative in scan.files.iter().chain(scan.empty_dirs.iter()) {
        let target = join_target(targetdir, &to_slash(relative));
        sink.push(ctx, scope, pack, &base.join(relative), target)?;
    }
    Ok(())
}

/// Resolve a declared source path.
///
/// A path that does not exist as written is retried with install-time
/// variables substituted, then resolved against the base directory.
fn resolve_source(
    ctx: &CompilerContext,
    scope: &SourceScope,
    element: &Element,
    src: &str,
) -> Result<PathBuf> {
    let literal = ctx.locator.project_path(src);
    if literal.exists() {
        return Ok(literal);
    }
    let substituted = ctx
        .variables
        .substitute_variables(src, SubstitutionType::Plain)
        .ok()
        .map(|path| ctx.locator.project_path(&path))
        .filter(|path| path.exists());
    match substituted {
        Some(path) => Ok(path),
        None => Err(scope.not_found(element, "file", src).into()),
    }
}

fn join_target(targetdir: &str, name: &str) -> String {
    format!("{}/{}", targetdir.trim_end_matches('/'), name)
}

fn owned(element: &Element, name: &str) -> Option<String> {
    xml::attr(element, name)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

fn add_refpack(ctx: &mut CompilerContext, scope: &SourceScope, element: &Element) -> Result<()> {
    let file = scope.require_attribute(element, "file")?;
    let path = ctx.locator.project_path(file);
    if !path.is_file() {
        return Err(scope.not_found(element, "referenced manifest", file).into());
    }

    if !scope.yes_no(element, "selfcontained", false) {
        return include_manifest(ctx, &path, Document::load_file);
    }

    if !file.ends_with(".zip") {
        return Err(scope
            .structural(element, format!("self-contained reference {} must be a .zip bundle", file))
            .into());
    }
    include_manifest(ctx, &path, Document::load_bundle)
}

fn add_refpackset(ctx: &mut CompilerContext, scope: &SourceScope, element: &Element) -> Result<()> {
    let dir = scope.require_attribute(element, "dir")?;
    let includes = scope.require_attribute(element, "includes")?;
    let base = ctx.locator.project_path(dir);
    if !base.is_dir() {
        return Err(scope.not_found(element, "refpackset directory", dir).into());
    }

    let mut patterns = PatternSet::new();
    patterns.include_list(includes);
    let scan = FilesetScanner::new(&base, patterns)
        .default_excludes(false)
        .scan()?;
    for relative in &scan.files {
        include_manifest(ctx, &base.join(relative), Document::load_file)?;
    }
    Ok(())
}

/// Expand an included manifest into the current compilation.
fn include_manifest(
    ctx: &mut CompilerContext,
    path: &Path,
    load: fn(&Path) -> Result<Document>,
) -> Result<()> {
    let key = normalize_path(path);
    if ctx.include_chain.contains(&key) {
        return Err(CompileError::InclusionCycle {
            document: key,
            chain: ctx.include_chain.clone(),
        }
        .into());
    }

    tracing::debug!("including packs from {}", path.display());
    let mut doc = load(path)?;
    ctx.include_chain.push(key);
    let result = expand(ctx, &mut doc);
    ctx.include_chain.pop();
    result
}

fn expand(ctx: &mut CompilerContext, doc: &mut Document) -> Result<()> {
    ctx.phase(Phase::Properties, doc, define_properties)?;
    doc.substitute_properties(&ctx.properties)?;
    ctx.phase(Phase::Resources, doc, add_resources)?;
    ctx.phase(Phase::Packs, doc, add_packs)
}
