//! Implementation of `packwright compile`.

use std::path::{Path, PathBuf};

use anyhow::{bail, Result};

use crate::core::info::InstallerKind;
use crate::core::installation::CompiledInstallation;
use crate::core::rules::{ConditionFactory, DefaultConditionFactory};
use crate::hooks::{HookRegistry, Phase};
use crate::ops::context::CompilerContext;
use crate::ops::document::{Document, ManifestSource};
use crate::ops::info::{add_gui_prefs, add_info, add_installer_requirements, add_lang_packs, add_packaging};
use crate::ops::libraries::{add_jars, add_listeners, add_natives};
use crate::ops::packs::add_packs;
use crate::ops::panels::add_panels;
use crate::ops::properties::{define_properties, BASEDIR, MANIFEST_FILE};
use crate::ops::resources::{add_resources, merge_string_bundles};
use crate::ops::rules::{add_conditions, add_dynamic_variables, add_variables};
use crate::ops::validate::validate_packs;
use crate::util::config::Config;
use crate::util::fs::normalize_path;
use crate::util::substitute::MissingTokenPolicy;

/// Options for the compile command.
#[derive(Debug, Clone)]
pub struct CompileOptions {
    /// Project base directory; relative manifest paths resolve against it.
    pub base_dir: PathBuf,

    pub kind: InstallerKind,

    /// Installation home holding the built-in resources.
    pub home: Option<PathBuf>,

    /// Extra built-in resource roots, searched after the home.
    pub resource_dirs: Vec<PathBuf>,

    pub property_policy: MissingTokenPolicy,
    pub variable_policy: MissingTokenPolicy,
}

impl CompileOptions {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        CompileOptions {
            base_dir: base_dir.into(),
            kind: InstallerKind::Standard,
            home: None,
            resource_dirs: Vec::new(),
            property_policy: MissingTokenPolicy::Reject,
            variable_policy: MissingTokenPolicy::Keep,
        }
    }

    pub fn with_home(mut self, home: impl Into<PathBuf>) -> Self {
        self.home = Some(home.into());
        self
    }

    pub fn with_kind(mut self, kind: InstallerKind) -> Self {
        self.kind = kind;
        self
    }

    /// Take the settings a config file provides.
    pub fn apply_config(&mut self, config: &Config) {
        if let Some(kind) = config.kind() {
            self.kind = kind;
        }
        self.resource_dirs.extend(config.compile.resource_dirs.iter().cloned());
        if let Some(policy) = config.substitution.properties {
            self.property_policy = policy;
        }
        if let Some(policy) = config.substitution.variables {
            self.variable_policy = policy;
        }
    }

    /// Built-in resource roots in lookup order.
    pub fn search_path(&self) -> Vec<PathBuf> {
        self.home
            .iter()
            .chain(self.resource_dirs.iter())
            .cloned()
            .collect()
    }
}

/// Compile a manifest with the built-in hooks and condition factory.
pub fn compile(source: &ManifestSource, options: &CompileOptions) -> Result<CompiledInstallation> {
    let hooks = HookRegistry::new();
    compile_with(source, options, &hooks, &DefaultConditionFactory)
}

/// Compile a manifest against explicit collaborators.
pub fn compile_with(
    source: &ManifestSource,
    options: &CompileOptions,
    hook_registry: &HookRegistry,
    condition_factory: &dyn ConditionFactory,
) -> Result<CompiledInstallation> {
    if !options.base_dir.is_dir() {
        bail!(
            "base directory `{}` does not exist or is not a directory",
            options.base_dir.display()
        );
    }
    let mut options = options.clone();
    options.base_dir = normalize_path(&options.base_dir);

    let mut doc = Document::load(source)?;
    let mut ctx = CompilerContext::new(&options, hook_registry, condition_factory)?;
    ctx.properties
        .add(BASEDIR, options.base_dir.display().to_string());
    if let Some(path) = doc.file().map(normalize_path) {
        ctx.properties.add(MANIFEST_FILE, path.display().to_string());
        ctx.include_chain.push(path);
    }

    run_phases(&mut ctx, &mut doc)?;
    validate_packs(&mut ctx)?;

    let installation = ctx.into_installation();
    tracing::info!(
        "compiled {} {}: {} packs, {} panels, {} warnings",
        installation.info.app_name,
        installation.info.app_version,
        installation.packs.len(),
        installation.panels.len(),
        installation.diagnostics.warning_count()
    );
    Ok(installation)
}

fn run_phases(ctx: &mut CompilerContext, doc: &mut Document) -> Result<()> {
    ctx.phase(Phase::Properties, doc, define_properties)?;
    doc.substitute_properties(&ctx.properties)?;

    ctx.phase(Phase::Packaging, doc, add_packaging)?;
    ctx.phase(Phase::Listeners, doc, add_listeners)?;
    ctx.phase(Phase::Variables, doc, add_variables)?;
    ctx.phase(Phase::DynamicVariables, doc, add_dynamic_variables)?;
    ctx.phase(Phase::Conditions, doc, add_conditions)?;
    ctx.phase(Phase::Info, doc, add_info)?;
    ctx.phase(Phase::GuiPrefs, doc, add_gui_prefs)?;
    ctx.phase(Phase::LangPacks, doc, add_lang_packs)?;
    ctx.phase(Phase::Resources, doc, add_resources)?;
    ctx.phase(Phase::NativeLibraries, doc, add_natives)?;
    ctx.phase(Phase::Jars, doc, add_jars)?;
    ctx.phase(Phase::Panels, doc, add_panels)?;
    ctx.phase(Phase::Packs, doc, add_packs)?;
    ctx.phase(Phase::InstallerRequirements, doc, add_installer_requirements)?;
    ctx.phase(Phase::StringBundles, doc, merge_string_bundles)
}

/// The manifest path and base directory a CLI invocation compiles.
///
/// The base directory defaults to the manifest's parent directory.
pub fn manifest_base_dir(manifest: &Path, base_dir: Option<&Path>) -> PathBuf {
    match base_dir {
        Some(dir) => dir.to_path_buf(),
        None => manifest
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(".")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::info::RebootAction;
    use crate::core::pack::{Blockable, FileMetadata, OverrideType};
    use crate::core::panel::ActionStage;
    use crate::core::resource::CustomDataKind;
    use crate::hooks::{CompilerHook, FileContext, HookError};
    use crate::ops::errors::{find_compile_error, CompileError};
    use crate::test_support::{manifests, ProjectFixture, RecordingSink};
    use crate::util::archive::tests::write_zip;
    use crate::util::substitute::SubstitutionType;
    use tempfile::TempDir;

    fn readme_pack(name: &str) -> String {
        manifests::pack(
            name,
            r#"<file src="readme.txt" targetdir="$INSTALL_PATH"/>"#,
        )
    }

    // ========================================================================
    // Minimal manifests
    // ========================================================================

    #[test]
    fn test_minimal_manifest() {
        let tmp = TempDir::new().unwrap();
        let project = ProjectFixture::new()
            .with_manifest(manifests::installation("", readme_pack("core")))
            .with_file("readme.txt", "hello")
            .write_to(tmp.path())
            .unwrap();

        let installation = project.compile().unwrap();

        assert_eq!(installation.packs.len(), 1);
        let pack = installation.pack("core").unwrap();
        assert_eq!(pack.files.len(), 1);
        let file = &pack.files[0];
        assert!(file.source.is_absolute());
        assert!(file.source.exists());
        assert_eq!(file.target, "$INSTALL_PATH/readme.txt");
        assert_eq!(file.override_type, OverrideType::Update);
        assert_eq!(file.blockable, Blockable::None);
        assert_eq!(file.size, 5);

        assert_eq!(installation.info.app_name, "Demo");
        assert_eq!(installation.lang_packs.len(), 1);
        assert_eq!(installation.panels.len(), 1);
        assert!(installation.resource("installer.uninstaller").is_some());
        assert_eq!(installation.diagnostics.warning_count(), 0);
    }

    #[test]
    fn test_manifest_from_text() {
        let tmp = TempDir::new().unwrap();
        let project = ProjectFixture::new()
            .with_file("readme.txt", "hello")
            .write_to(tmp.path())
            .unwrap();

        let source = ManifestSource::Text(manifests::installation("", readme_pack("core")));
        let installation = compile(&source, &project.options()).unwrap();
        assert!(installation.pack("core").is_some());
    }

    #[test]
    fn test_missing_base_dir() {
        let tmp = TempDir::new().unwrap();
        let options = CompileOptions::new(tmp.path().join("missing"));
        let source = ManifestSource::Text(manifests::installation("", readme_pack("core")));

        let err = compile(&source, &options).unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }

    #[test]
    fn test_missing_uninstaller_runtime() {
        let tmp = TempDir::new().unwrap();
        let project = ProjectFixture::bare()
            .with_home_file("bin/langpacks/installer/eng.xml", "<langpack/>")
            .with_manifest(manifests::installation("", readme_pack("core")))
            .with_file("readme.txt", "hello")
            .write_to(tmp.path())
            .unwrap();

        let err = project.compile().unwrap_err();
        match find_compile_error(&err) {
            Some(CompileError::NotFound { path, .. }) => assert_eq!(path, "lib/uninstaller.jar"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_uninstaller_disabled() {
        let tmp = TempDir::new().unwrap();
        let manifest = manifests::installation("", readme_pack("core")).replace(
            "<appversion>1.0</appversion>",
            r#"<appversion>1.0</appversion><uninstaller write="no"/>"#,
        );
        let project = ProjectFixture::bare()
            .with_home_file("bin/langpacks/installer/eng.xml", "<langpack/>")
            .with_manifest(manifest)
            .with_file("readme.txt", "hello")
            .write_to(tmp.path())
            .unwrap();

        let installation = project.compile().unwrap();
        assert!(!installation.info.writes_uninstaller());
        assert!(installation.resource("installer.uninstaller").is_none());
        // The missing flag is only a warning.
        assert_eq!(installation.diagnostics.count_matching("No flag found"), 1);
    }

    #[test]
    fn test_uninstaller_name_and_path() {
        let tmp = TempDir::new().unwrap();
        let manifest = manifests::installation("", readme_pack("core")).replace(
            "<info>",
            r#"<info name="not-the-uninstaller.jar" path="/not/the/path">"#,
        );
        let project = ProjectFixture::new()
            .with_manifest(manifest)
            .with_file("readme.txt", "hello")
            .write_to(tmp.path())
            .unwrap();

        let info = project.compile().unwrap().info;
        assert_eq!(info.uninstaller_name.as_deref(), Some("uninstaller.jar"));
        assert_eq!(info.uninstaller_path.as_deref(), Some("$INSTALL_PATH/Uninstaller"));

        let tmp = TempDir::new().unwrap();
        let manifest = manifests::installation("", readme_pack("core")).replace(
            "<appversion>1.0</appversion>",
            r#"<appversion>1.0</appversion>
               <uninstaller name="remove.jar" path="$INSTALL_PATH/bin" condition="can.remove"/>"#,
        );
        let project = ProjectFixture::new()
            .with_manifest(manifest)
            .with_file("readme.txt", "hello")
            .write_to(tmp.path())
            .unwrap();

        let info = project.compile().unwrap().info;
        assert_eq!(info.uninstaller_name.as_deref(), Some("remove.jar"));
        assert_eq!(info.uninstaller_path.as_deref(), Some("$INSTALL_PATH/bin"));
        assert_eq!(info.uninstaller_condition.as_deref(), Some("can.remove"));
    }

    #[test]
    fn test_web_installer_requires_webdir() {
        let tmp = TempDir::new().unwrap();
        let project = ProjectFixture::new()
            .with_manifest(manifests::installation("", readme_pack("core")))
            .with_file("readme.txt", "hello")
            .write_to(tmp.path())
            .unwrap();

        let options = project.options().with_kind(InstallerKind::Web);
        let err = compile(&project.source(), &options).unwrap_err();
        assert!(err.to_string().contains("<webdir>"));
    }

    // ========================================================================
    // Packs
    // ========================================================================

    #[test]
    fn test_required_pack_in_exclude_group() {
        let tmp = TempDir::new().unwrap();
        let pack = r#"<pack name="jre" required="yes" excludeGroup="runtime"><description/></pack>"#;
        let project = ProjectFixture::new()
            .with_manifest(manifests::installation("", pack))
            .write_to(tmp.path())
            .unwrap();

        let err = project.compile().unwrap_err();
        match find_compile_error(&err) {
            Some(CompileError::RequiredInExcludeGroup { pack, group, .. }) => {
                assert_eq!(pack, "jre");
                assert_eq!(group, "runtime");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_exclude_group_defaults_to_not_preselected() {
        let tmp = TempDir::new().unwrap();
        let packs = r#"
            <pack name="jre-17" required="no" excludeGroup="jre"><description/></pack>
            <pack name="jre-21" required="no" excludeGroup="jre" preselected="yes"><description/></pack>
            <pack name="docs" required="no"><description/></pack>"#;
        let project = ProjectFixture::new()
            .with_manifest(manifests::installation("", packs))
            .write_to(tmp.path())
            .unwrap();

        let installation = project.compile().unwrap();
        assert!(!installation.pack("jre-17").unwrap().preselected);
        assert!(installation.pack("jre-21").unwrap().preselected);
        assert!(installation.pack("docs").unwrap().preselected);
        assert_eq!(installation.diagnostics.warning_count(), 0);
    }

    #[test]
    fn test_fileset_selection_is_sorted() {
        let tmp = TempDir::new().unwrap();
        let body = r#"<fileset dir="tree" targetdir="$INSTALL_PATH" includes="**/*.txt" excludes="skip/**"/>"#;
        let project = ProjectFixture::new()
            .with_manifest(manifests::installation("", manifests::pack("core", body)))
            .with_file("tree/zeta.txt", "z")
            .with_file("tree/alpha.txt", "a")
            .with_file("tree/docs/guide.txt", "g")
            .with_file("tree/docs/guide.md", "m")
            .with_file("tree/skip/ignored.txt", "i")
            .write_to(tmp.path())
            .unwrap();

        let installation = project.compile().unwrap();
        let targets: Vec<&str> = installation.packs[0]
            .files
            .iter()
            .map(|f| f.target.as_str())
            .collect();
        assert_eq!(
            targets,
            vec![
                "$INSTALL_PATH/alpha.txt",
                "$INSTALL_PATH/docs/guide.txt",
                "$INSTALL_PATH/zeta.txt",
            ]
        );
    }

    #[test]
    fn test_fileset_missing_directory() {
        let tmp = TempDir::new().unwrap();
        let body = r#"<fileset dir="nowhere" targetdir="$INSTALL_PATH"/>"#;
        let project = ProjectFixture::new()
            .with_manifest(manifests::installation("", manifests::pack("core", body)))
            .write_to(tmp.path())
            .unwrap();

        let err = project.compile().unwrap_err();
        assert!(matches!(
            find_compile_error(&err),
            Some(CompileError::NotFound { .. })
        ));
    }

    #[test]
    fn test_file_directory_keeps_empty_dirs() {
        let tmp = TempDir::new().unwrap();
        let body = r#"<file src="app" targetdir="$INSTALL_PATH"/>"#;
        let project = ProjectFixture::new()
            .with_manifest(manifests::installation("", manifests::pack("core", body)))
            .with_file("app/bin/run.sh", "#!/bin/sh")
            .with_dir("app/logs")
            .write_to(tmp.path())
            .unwrap();

        let installation = project.compile().unwrap();
        let files = &installation.packs[0].files;
        let targets: Vec<(&str, bool)> = files
            .iter()
            .map(|f| (f.target.as_str(), f.is_directory))
            .collect();
        assert_eq!(
            targets,
            vec![
                ("$INSTALL_PATH/app/bin/run.sh", false),
                ("$INSTALL_PATH/app/logs", true),
            ]
        );
    }

    #[test]
    fn test_unpacked_archive() {
        let tmp = TempDir::new().unwrap();
        let body = r#"<file src="bundle.zip" targetdir="$INSTALL_PATH/lib" unpack="true"/>"#;
        let project = ProjectFixture::new()
            .with_manifest(manifests::installation("", manifests::pack("core", body)))
            .write_to(tmp.path())
            .unwrap();
        write_zip(
            &project.path("bundle.zip"),
            &[("conf/", ""), ("conf/app.properties", "a=1"), ("app.jar", "PK")],
        );

        let installation = project.compile().unwrap();
        let files = &installation.packs[0].files;
        let targets: Vec<&str> = files.iter().map(|f| f.target.as_str()).collect();
        assert_eq!(
            targets,
            vec!["$INSTALL_PATH/lib/conf/app.properties", "$INSTALL_PATH/lib/app.jar"]
        );
        assert_eq!(std::fs::read_to_string(&files[0].source).unwrap(), "a=1");
    }

    #[test]
    fn test_source_path_with_variables() {
        let tmp = TempDir::new().unwrap();
        let sections = r#"<variables><variable name="flavor" value="linux"/></variables>"#;
        let body = r#"<singlefile src="dist/$${flavor}/tool" target="$INSTALL_PATH/bin/tool"/>"#;
        let project = ProjectFixture::new()
            .with_manifest(manifests::installation(sections, manifests::pack("core", body)))
            .with_file("dist/linux/tool", "elf")
            .write_to(tmp.path())
            .unwrap();

        let installation = project.compile().unwrap();
        let file = &installation.packs[0].files[0];
        assert!(file.source.ends_with("dist/linux/tool"));
        assert_eq!(file.target, "$INSTALL_PATH/bin/tool");
    }

    #[test]
    fn test_missing_file_names_element() {
        let tmp = TempDir::new().unwrap();
        let project = ProjectFixture::new()
            .with_manifest(manifests::installation("", readme_pack("core")))
            .write_to(tmp.path())
            .unwrap();

        let err = project.compile().unwrap_err();
        match find_compile_error(&err) {
            Some(CompileError::NotFound { element, path, file, .. }) => {
                assert!(element.starts_with("<file"));
                assert_eq!(path, "readme.txt");
                assert_eq!(file.as_deref(), Some(project.manifest.as_path()));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_invalid_override_value() {
        let tmp = TempDir::new().unwrap();
        let body = r#"<file src="readme.txt" targetdir="$INSTALL_PATH" override="sometimes"/>"#;
        let project = ProjectFixture::new()
            .with_manifest(manifests::installation("", manifests::pack("core", body)))
            .with_file("readme.txt", "hello")
            .write_to(tmp.path())
            .unwrap();

        let err = project.compile().unwrap_err();
        match find_compile_error(&err) {
            Some(CompileError::InvalidValue { attribute, value, .. }) => {
                assert_eq!(attribute, "override");
                assert_eq!(value, "sometimes");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_blockable_without_windows_warns() {
        let tmp = TempDir::new().unwrap();
        let body = r#"
            <file src="readme.txt" targetdir="$INSTALL_PATH" blockable="auto"/>
            <singlefile src="readme.txt" target="$INSTALL_PATH/win.txt" blockable="force">
              <os family="windows"/>
            </singlefile>"#;
        let project = ProjectFixture::new()
            .with_manifest(manifests::installation("", manifests::pack("core", body)))
            .with_file("readme.txt", "hello")
            .write_to(tmp.path())
            .unwrap();

        let installation = project.compile().unwrap();
        let files = &installation.packs[0].files;
        assert_eq!(files[0].blockable, Blockable::Auto);
        assert!(files[0].os_constraints.is_empty());
        assert_eq!(files[1].blockable, Blockable::Force);
        assert_eq!(installation.diagnostics.count_matching("'blockable'"), 1);
    }

    #[test]
    fn test_pack_children() {
        let tmp = TempDir::new().unwrap();
        let packs = r#"
            <pack name="core" required="yes" installGroups="full, minimal" id="core.id">
              <description>Core files</description>
              <parsable targetfile="$INSTALL_PATH/app.conf" type="javaprop"/>
              <executable targetfile="$INSTALL_PATH/setup.jar" type="jar" class="Setup" stage="postinstall" failure="abort">
                <args><arg value="--quiet"/></args>
              </executable>
              <updatecheck><include name="lib/**"/><exclude name="lib/keep.jar"/></updatecheck>
              <validator>com.acme.CoreValidator</validator>
            </pack>
            <pack name="docs" required="no" parent="core">
              <description>Docs</description>
              <depends packname="core"/>
            </pack>"#;
        let project = ProjectFixture::new()
            .with_manifest(manifests::installation("", packs))
            .write_to(tmp.path())
            .unwrap();

        let installation = project.compile().unwrap();
        let core = installation.pack("core").unwrap();
        assert!(core.required);
        assert_eq!(core.id.as_deref(), Some("core.id"));
        assert_eq!(core.install_groups, vec!["full", "minimal"]);
        assert_eq!(core.parsables[0].kind, SubstitutionType::JavaProperties);
        assert_eq!(core.executables[0].main_class.as_deref(), Some("Setup"));
        assert_eq!(core.executables[0].args, vec!["--quiet"]);
        assert_eq!(core.update_checks[0].includes, vec!["lib/**"]);
        assert_eq!(core.validators, vec!["com.acme.CoreValidator"]);

        let docs = installation.pack("docs").unwrap();
        assert_eq!(docs.dependencies, vec!["core"]);
        assert_eq!(installation.diagnostics.warning_count(), 0);
    }

    // ========================================================================
    // Graph validation
    // ========================================================================

    #[test]
    fn test_unresolved_dependency() {
        let tmp = TempDir::new().unwrap();
        let pack = manifests::pack("docs", r#"<depends packname="extras"/>"#);
        let project = ProjectFixture::new()
            .with_manifest(manifests::installation("", pack))
            .write_to(tmp.path())
            .unwrap();

        let err = project.compile().unwrap_err();
        match find_compile_error(&err) {
            Some(CompileError::UnresolvedDependency { pack, dependency }) => {
                assert_eq!(pack, "docs");
                assert_eq!(dependency, "extras");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_dependency_on_included_pack() {
        let tmp = TempDir::new().unwrap();
        let packs = format!(
            r#"{}<refpack file="extras/packs.xml"/>"#,
            manifests::pack("docs", r#"<depends packname="extras"/>"#)
        );
        let project = ProjectFixture::new()
            .with_manifest(manifests::installation("", packs))
            .with_file("extras/packs.xml", manifests::included(manifests::pack("extras", "")))
            .write_to(tmp.path())
            .unwrap();

        let installation = project.compile().unwrap();
        let names: Vec<&str> = installation.packs.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["docs", "extras"]);
    }

    #[test]
    fn test_unknown_parent_warns() {
        let tmp = TempDir::new().unwrap();
        let pack = r#"<pack name="docs" required="no" parent="ghost"><description/></pack>"#;
        let project = ProjectFixture::new()
            .with_manifest(manifests::installation("", pack))
            .write_to(tmp.path())
            .unwrap();

        let installation = project.compile().unwrap();
        assert_eq!(installation.diagnostics.count_matching("unknown parent"), 1);
    }

    // ========================================================================
    // Inclusion
    // ========================================================================

    #[test]
    fn test_refpack_runs_properties_and_resources() {
        let tmp = TempDir::new().unwrap();
        let included = r#"<installation version="1.0">
              <properties><property name="extra.name" value="plugins"/></properties>
              <resources><res id="plugin.readme" src="plugin.txt"/></resources>
              <packs><pack name="${extra.name}" required="no"><description/></pack></packs>
            </installation>"#;
        let project = ProjectFixture::new()
            .with_manifest(manifests::installation("", r#"<refpack file="inc.xml"/>"#))
            .with_file("inc.xml", included)
            .with_file("plugin.txt", "plugins")
            .write_to(tmp.path())
            .unwrap();

        let installation = project.compile().unwrap();
        assert!(installation.pack("plugins").is_some());
        assert!(installation.resource("plugin.readme").is_some());
    }

    #[test]
    fn test_refpackset_includes_in_sorted_order() {
        let tmp = TempDir::new().unwrap();
        let project = ProjectFixture::new()
            .with_manifest(manifests::installation(
                "",
                r#"<refpackset dir="modules" includes="*.xml"/>"#,
            ))
            .with_file("modules/b.xml", manifests::included(manifests::pack("beta", "")))
            .with_file("modules/a.xml", manifests::included(manifests::pack("alpha", "")))
            .with_file("modules/notes.txt", "not a manifest")
            .write_to(tmp.path())
            .unwrap();

        let installation = project.compile().unwrap();
        let names: Vec<&str> = installation.packs.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["alpha", "beta"]);
    }

    #[test]
    fn test_self_contained_bundle() {
        let tmp = TempDir::new().unwrap();
        let project = ProjectFixture::new()
            .with_manifest(manifests::installation(
                "",
                r#"<refpack file="plugin.zip" selfcontained="true"/>"#,
            ))
            .with_file("payload/plugin.txt", "from the project")
            .write_to(tmp.path())
            .unwrap();
        let bundled = manifests::included(manifests::pack(
            "plugin",
            r#"<file src="payload/plugin.txt" targetdir="$INSTALL_PATH"/>"#,
        ));
        write_zip(
            &project.path("plugin.zip"),
            &[
                ("META-INF/installation.xml", bundled.as_str()),
                ("payload/plugin.txt", "from the bundle"),
            ],
        );

        let installation = project.compile().unwrap();
        let file = &installation.pack("plugin").unwrap().files[0];
        assert_eq!(file.target, "$INSTALL_PATH/plugin.txt");
        assert_eq!(std::fs::read_to_string(&file.source).unwrap(), "from the project");
    }

    #[test]
    fn test_self_contained_bundle_sources_come_from_project() {
        let tmp = TempDir::new().unwrap();
        let project = ProjectFixture::new()
            .with_manifest(manifests::installation(
                "",
                r#"<refpack file="plugin.zip" selfcontained="true"/>"#,
            ))
            .write_to(tmp.path())
            .unwrap();
        let bundled = manifests::included(manifests::pack(
            "plugin",
            r#"<file src="payload/only-in-bundle.txt" targetdir="$INSTALL_PATH"/>"#,
        ));
        write_zip(
            &project.path("plugin.zip"),
            &[
                ("META-INF/installation.xml", bundled.as_str()),
                ("payload/only-in-bundle.txt", "bundled"),
            ],
        );

        let err = project.compile().unwrap_err();
        match find_compile_error(&err) {
            Some(CompileError::NotFound { path, .. }) => {
                assert_eq!(path, "payload/only-in-bundle.txt")
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_inclusion_cycle_is_fatal() {
        let tmp = TempDir::new().unwrap();
        let project = ProjectFixture::new()
            .with_manifest(manifests::installation("", r#"<refpack file="a.xml"/>"#))
            .with_file("a.xml", manifests::included(r#"<refpack file="b.xml"/>"#))
            .with_file("b.xml", manifests::included(r#"<refpack file="a.xml"/>"#))
            .write_to(tmp.path())
            .unwrap();

        let err = project.compile().unwrap_err();
        match find_compile_error(&err) {
            Some(CompileError::InclusionCycle { document, chain }) => {
                assert!(document.ends_with("a.xml"));
                assert_eq!(chain.len(), 3);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_same_document_from_two_branches() {
        let tmp = TempDir::new().unwrap();
        let project = ProjectFixture::new()
            .with_manifest(manifests::installation(
                "",
                r#"<refpack file="a.xml"/><refpack file="b.xml"/>"#,
            ))
            .with_file("a.xml", manifests::included(r#"<refpack file="common.xml"/>"#))
            .with_file("b.xml", manifests::included(r#"<refpack file="common.xml"/>"#))
            .with_file("common.xml", manifests::included(manifests::pack("common", "")))
            .write_to(tmp.path())
            .unwrap();

        let installation = project.compile().unwrap();
        assert_eq!(installation.packs.len(), 2);
    }

    // ========================================================================
    // Properties, variables and rules
    // ========================================================================

    #[test]
    fn test_properties_substitute_whole_tree() {
        let tmp = TempDir::new().unwrap();
        let sections = r#"<properties>
              <property name="pack.name" value="core"/>
              <property name="pack.label" value="${pack.name}-files"/>
              <property name="pack.name" value="ignored"/>
            </properties>"#;
        let project = ProjectFixture::new()
            .with_manifest(manifests::installation(
                sections,
                manifests::pack("${pack.label}", ""),
            ))
            .write_to(tmp.path())
            .unwrap();

        let installation = project.compile().unwrap();
        assert!(installation.pack("core-files").is_some());
    }

    #[test]
    fn test_property_escape_keeps_install_tokens() {
        let tmp = TempDir::new().unwrap();
        let body = r#"<singlefile src="readme.txt" target="$${INSTALL_PATH}/readme.txt"/>"#;
        let project = ProjectFixture::new()
            .with_manifest(manifests::installation("", manifests::pack("core", body)))
            .with_file("readme.txt", "hello")
            .write_to(tmp.path())
            .unwrap();

        let installation = project.compile().unwrap();
        assert_eq!(installation.packs[0].files[0].target, "${INSTALL_PATH}/readme.txt");
    }

    #[test]
    fn test_undefined_property_is_fatal() {
        let tmp = TempDir::new().unwrap();
        let project = ProjectFixture::new()
            .with_manifest(manifests::installation("", manifests::pack("${nope}", "")))
            .write_to(tmp.path())
            .unwrap();

        let err = project.compile().unwrap_err();
        match find_compile_error(&err) {
            Some(CompileError::UndefinedToken { name, .. }) => assert_eq!(name, "nope"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_builtin_properties() {
        let tmp = TempDir::new().unwrap();
        let body = r#"<singlefile src="${basedir}/readme.txt" target="$INSTALL_PATH/readme.txt"/>"#;
        let project = ProjectFixture::new()
            .with_manifest(manifests::installation("", manifests::pack("core", body)))
            .with_file("readme.txt", "hello")
            .write_to(tmp.path())
            .unwrap();

        let installation = project.compile().unwrap();
        assert!(installation.packs[0].files[0].source.exists());
    }

    #[test]
    fn test_variable_and_dynamic_variable_redefinition() {
        let tmp = TempDir::new().unwrap();
        let sections = r#"
            <variables>
              <variable name="app.home" value="/opt/first"/>
              <variable name="app.home" value="/opt/second"/>
            </variables>
            <dynamicvariables>
              <variable name="jdk" value="/usr/lib/jvm/11" condition="is.linux"/>
              <variable name="jdk" value="C:\jdk" condition="is.windows"/>
              <variable name="jdk" value="/usr/lib/jvm/17" condition="is.linux"/>
            </dynamicvariables>"#;
        let project = ProjectFixture::new()
            .with_manifest(manifests::installation(sections, manifests::pack("core", "")))
            .write_to(tmp.path())
            .unwrap();

        let installation = project.compile().unwrap();
        assert_eq!(installation.variables.get("app.home"), Some("/opt/second"));
        assert_eq!(installation.diagnostics.count_matching("being overwritten"), 1);

        let candidates = installation.dynamic_variables.get("jdk");
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[1].value, "/usr/lib/jvm/17");
        assert_eq!(candidates[1].condition.as_deref(), Some("is.linux"));
        assert_eq!(installation.diagnostics.count_matching("will be overwritten"), 1);
    }

    #[test]
    fn test_conditions_and_requirements() {
        let tmp = TempDir::new().unwrap();
        let sections = r#"
            <conditions>
              <condition id="is.linux" type="java"><java><class>OsVersion</class></java></condition>
              <condition id="is.linux" type="variable"><name>os</name><value>linux</value></condition>
              <condition type="missing-id"/>
            </conditions>
            <installerrequirements>
              <installerrequirement condition="is.linux" message="Linux only"/>
            </installerrequirements>"#;
        let project = ProjectFixture::new()
            .with_manifest(manifests::installation(sections, manifests::pack("core", "")))
            .write_to(tmp.path())
            .unwrap();

        let installation = project.compile().unwrap();
        assert_eq!(installation.conditions.len(), 1);
        assert_eq!(installation.conditions.get("is.linux").unwrap().kind, "variable");
        assert_eq!(installation.diagnostics.count_matching("will be overwritten"), 1);
        assert_eq!(installation.diagnostics.count_matching("could not be created"), 1);
        assert_eq!(installation.requirements[0].message, "Linux only");
    }

    // ========================================================================
    // Resources
    // ========================================================================

    #[test]
    fn test_string_bundles_merge() {
        let tmp = TempDir::new().unwrap();
        let sections = r#"<resources>
              <res id="packsLang.xml_eng" src="core-strings.xml"/>
              <res id="packsLang.xml_eng" src="extra-strings.xml"/>
              <res id="packsLang.xml_deu" src="deu-strings.xml"/>
            </resources>"#;
        let project = ProjectFixture::new()
            .with_manifest(manifests::installation(sections, manifests::pack("core", "")))
            .with_file("core-strings.xml", manifests::string_bundle(&["core", "docs"]))
            .with_file("extra-strings.xml", manifests::string_bundle(&["extras"]))
            .with_file("deu-strings.xml", manifests::string_bundle(&["kern"]))
            .write_to(tmp.path())
            .unwrap();

        let installation = project.compile().unwrap();

        let merged = installation.resource("packsLang.xml_eng").unwrap();
        let root = crate::util::xml::parse_file(&merged.location).unwrap();
        let ids: Vec<&str> = crate::util::xml::children_named(&root, "str")
            .filter_map(|s| crate::util::xml::attr(s, "id"))
            .collect();
        assert_eq!(ids, vec!["core", "docs", "extras"]);

        let single = installation.resource("packsLang.xml_deu").unwrap();
        assert!(single.location.ends_with("deu-strings.xml"));
        assert!(!single.canonicalized);
    }

    #[test]
    fn test_parsed_resource_substitutes_variables() {
        let tmp = TempDir::new().unwrap();
        let sections = r#"
            <variables><variable name="APP_VERSION" value="2.1"/></variables>
            <resources><res id="info.txt" src="info.txt" parse="yes"/></resources>"#;
        let project = ProjectFixture::new()
            .with_manifest(manifests::installation(sections, manifests::pack("core", "")))
            .with_file("info.txt", "version ${APP_VERSION}")
            .write_to(tmp.path())
            .unwrap();

        let installation = project.compile().unwrap();
        let resource = installation.resource("info.txt").unwrap();
        assert!(resource.substituted);
        assert_eq!(
            std::fs::read_to_string(&resource.location).unwrap(),
            "version 2.1"
        );
    }

    #[test]
    fn test_scratch_files_removed_with_installation() {
        let tmp = TempDir::new().unwrap();
        let sections = r#"
            <variables><variable name="A" value="1"/></variables>
            <resources><res id="a.txt" src="a.txt" parse="yes"/></resources>"#;
        let project = ProjectFixture::new()
            .with_manifest(manifests::installation(sections, manifests::pack("core", "")))
            .with_file("a.txt", "${A}")
            .write_to(tmp.path())
            .unwrap();

        let installation = project.compile().unwrap();
        let location = installation.resource("a.txt").unwrap().location.clone();
        assert!(location.exists());
        drop(installation);
        assert!(!location.exists());
    }

    // ========================================================================
    // Libraries, panels and GUI preferences
    // ========================================================================

    #[test]
    fn test_natives_and_jars_for_uninstaller() {
        let tmp = TempDir::new().unwrap();
        let sections = r#"
            <native type="acme" name="ShellLink.dll" stage="both"/>
            <jar src="lib/helper.jar" stage="uninstall"/>
            <jar src="lib/helper.jar"/>"#;
        let project = ProjectFixture::new()
            .with_home_file("bin/native/acme/ShellLink.dll", "MZ")
            .with_home_file("lib/uninstaller-ext.jar", "PK")
            .with_dir("lib")
            .with_manifest(manifests::installation(sections, manifests::pack("core", "")))
            .write_to(tmp.path())
            .unwrap();
        write_zip(
            &project.path("lib/helper.jar"),
            &[("com/", ""), ("com/acme/Helper.class", "cafebabe")],
        );

        let installation = project.compile().unwrap();

        assert_eq!(installation.natives.len(), 1);
        assert!(installation.natives[0].for_uninstaller);
        assert!(installation.resource("installer.uninstaller-ext").is_some());

        let kinds: Vec<CustomDataKind> = installation.custom_data.iter().map(|d| d.kind).collect();
        assert_eq!(kinds, vec![CustomDataKind::UninstallerLib, CustomDataKind::UninstallerJar]);
        assert_eq!(installation.custom_data[1].names, vec!["com/acme/Helper.class"]);
        assert_eq!(installation.jars.len(), 2);
        assert!(installation
            .jars
            .iter()
            .all(|jar| jar.location.ends_with("lib/helper.jar") && jar.bundled_as.is_none()));
    }

    #[test]
    fn test_uninstall_stage_libraries_ship_with_installer() {
        let tmp = TempDir::new().unwrap();
        let sections = r#"
            <native type="acme" name="Cleanup.dll" stage="uninstall"/>
            <jar src="lib/helper.jar" stage="uninstall"/>"#;
        let project = ProjectFixture::new()
            .with_home_file("bin/native/acme/Cleanup.dll", "MZ")
            .with_home_file("lib/uninstaller-ext.jar", "PK")
            .with_dir("lib")
            .with_manifest(manifests::installation(sections, manifests::pack("core", "")))
            .write_to(tmp.path())
            .unwrap();
        write_zip(&project.path("lib/helper.jar"), &[("com/acme/Helper.class", "cafebabe")]);

        let installation = project.compile().unwrap();

        assert_eq!(installation.natives.len(), 1);
        assert_eq!(installation.natives[0].name, "Cleanup.dll");
        assert!(installation.natives[0].for_uninstaller);
        assert_eq!(installation.jars.len(), 1);
        assert_eq!(installation.custom_data.len(), 2);
    }

    #[test]
    fn test_unknown_library_stage_warns() {
        let tmp = TempDir::new().unwrap();
        let sections = r#"<native type="acme" name="ShellLink.dll" stage="later"/>"#;
        let project = ProjectFixture::new()
            .with_home_file("bin/native/acme/ShellLink.dll", "MZ")
            .with_manifest(manifests::installation(sections, manifests::pack("core", "")))
            .write_to(tmp.path())
            .unwrap();

        let installation = project.compile().unwrap();

        assert_eq!(installation.natives.len(), 1);
        assert!(!installation.natives[0].for_uninstaller);
        assert!(installation.custom_data.is_empty());
        assert_eq!(installation.diagnostics.count_matching("Unknown stage 'later'"), 1);
    }

    #[test]
    fn test_missing_native_library() {
        let tmp = TempDir::new().unwrap();
        let sections = r#"<native type="acme" name="missing.dll"/>"#;
        let project = ProjectFixture::new()
            .with_manifest(manifests::installation(sections, manifests::pack("core", "")))
            .write_to(tmp.path())
            .unwrap();

        let err = project.compile().unwrap_err();
        match find_compile_error(&err) {
            Some(CompileError::NotFound { path, .. }) => {
                assert_eq!(path, "bin/native/acme/missing.dll")
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_runtime_listeners() {
        let tmp = TempDir::new().unwrap();
        let sections = r#"<listeners>
              <listener installer="SummaryLogger"/>
              <listener uninstaller="CleanupListener" jar="custom/cleanup.jar"/>
            </listeners>"#;
        let project = ProjectFixture::new()
            .with_home_file("bin/customActions/SummaryLogger.jar", "PK")
            .with_manifest(manifests::installation(sections, manifests::pack("core", "")))
            .write_to(tmp.path())
            .unwrap();

        let installation = project.compile().unwrap();
        let data = &installation.custom_data;
        assert_eq!(data.len(), 2);
        assert_eq!(data[0].kind, CustomDataKind::InstallerListener);
        assert!(data[0].location.is_some());
        assert_eq!(data[1].kind, CustomDataKind::UninstallerListener);
        assert!(data[1].location.is_none());
        assert_eq!(installation.diagnostics.count_matching("for listener CleanupListener"), 1);
    }

    #[test]
    fn test_panel_details() {
        let tmp = TempDir::new().unwrap();
        let panel = r#"<panel classname="TargetPanel" id="target">
              <configuration><param><key>dir</key><value>/opt</value></param></configuration>
              <validator classname="com.acme.Check"/>
              <help iso3="eng" src="help.html"/>
              <actions>
                <action stage="preactivate" classname="com.acme.Prep">
                  <param><key>mode</key><value>fast</value></param>
                </action>
              </actions>
            </panel>"#;
        let manifest = manifests::installation("", manifests::pack("core", ""))
            .replace(r#"<panel classname="HelloPanel" jar=""/>"#, panel);
        let project = ProjectFixture::new()
            .with_home_file("bin/panels/.keep", "")
            .with_manifest(manifest)
            .with_file("help.html", "<p>help</p>")
            .write_to(tmp.path())
            .unwrap();
        write_zip(
            &project.home.join("bin/panels/TargetPanel.jar"),
            &[("com/acme/panels/TargetPanel.class", "cafebabe")],
        );

        let installation = project.compile().unwrap();
        let panel = &installation.panels[0];
        assert_eq!(
            panel.qualified_class_name.as_deref(),
            Some("com.acme.panels.TargetPanel")
        );
        assert_eq!(panel.configuration.get("dir").map(String::as_str), Some("/opt"));
        assert_eq!(panel.validator.as_deref(), Some("com.acme.Check"));
        assert_eq!(
            panel.helps.get("eng").map(String::as_str),
            Some("target_1_help_eng.html")
        );
        assert!(installation.resource("target_1_help_eng.html").is_some());

        let actions = panel.actions_at(ActionStage::PreActivate);
        assert_eq!(actions[0].class_name, "com.acme.Prep");
        assert_eq!(actions[0].configuration.get("mode").map(String::as_str), Some("fast"));
    }

    #[test]
    fn test_missing_panel_jar_warns() {
        let tmp = TempDir::new().unwrap();
        let manifest = manifests::installation("", manifests::pack("core", ""))
            .replace(r#"jar="""#, "");
        let project = ProjectFixture::new()
            .with_manifest(manifest)
            .write_to(tmp.path())
            .unwrap();

        let installation = project.compile().unwrap();
        assert!(installation.panels[0].jar.is_none());
        assert_eq!(installation.diagnostics.count_matching("Panel jar"), 1);
    }

    #[test]
    fn test_gui_prefs_register_look_and_feel_jar() {
        let tmp = TempDir::new().unwrap();
        let sections = r#"<guiprefs resizable="no" width="800" height="600">
              <laf name="substance"><os family="unix"/><param name="variant" value="dark"/></laf>
              <laf name="substance"><os family="mac"/></laf>
              <modifier key="useButtonIcons" value="no"/>
            </guiprefs>"#;
        let project = ProjectFixture::new()
            .with_home_file("lib/substance.jar", "PK")
            .with_manifest(manifests::installation(sections, manifests::pack("core", "")))
            .write_to(tmp.path())
            .unwrap();

        let installation = project.compile().unwrap();
        let prefs = &installation.gui_prefs;
        assert!(!prefs.resizable);
        assert_eq!((prefs.width, prefs.height), (800, 600));
        assert_eq!(prefs.look_and_feels.len(), 2);
        assert_eq!(prefs.look_and_feels[0].os_families, vec!["unix"]);
        assert_eq!(prefs.modifiers.get("useButtonIcons").map(String::as_str), Some("no"));
        assert_eq!(installation.jars.len(), 1);
        assert_eq!(installation.jars[0].bundled_as.as_deref(), Some("lib/substance.jar"));
    }

    #[test]
    fn test_unknown_look_and_feel() {
        let tmp = TempDir::new().unwrap();
        let sections = r#"<guiprefs resizable="yes" width="800" height="600"><laf name="aqua"/></guiprefs>"#;
        let project = ProjectFixture::new()
            .with_manifest(manifests::installation(sections, manifests::pack("core", "")))
            .write_to(tmp.path())
            .unwrap();

        let err = project.compile().unwrap_err();
        assert!(matches!(
            find_compile_error(&err),
            Some(CompileError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_look_and_feel_requires_os() {
        let tmp = TempDir::new().unwrap();
        let sections = r#"<guiprefs resizable="yes" width="800" height="600"><laf name="substance"/></guiprefs>"#;
        let project = ProjectFixture::new()
            .with_home_file("lib/substance.jar", "PK")
            .with_manifest(manifests::installation(sections, manifests::pack("core", "")))
            .write_to(tmp.path())
            .unwrap();

        let err = project.compile().unwrap_err();
        match find_compile_error(&err) {
            Some(CompileError::Structural { message, .. }) => {
                assert_eq!(message, "<laf> requires at least one <os>")
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_packaging_and_info_details() {
        let tmp = TempDir::new().unwrap();
        let sections = r#"<packaging>
              <packager class="com.acme.SplitPackager"><options volumes="2"/></packager>
              <unpacker class="com.acme.SplitUnpacker"/>
            </packaging>"#;
        let manifest = manifests::installation(sections, manifests::pack("core", "")).replace(
            "<appversion>1.0</appversion>",
            r#"<appversion>1.0</appversion>
               <authors><author name="Ada" email="ada@example.com"/></authors>
               <run-privileged condition="is.windows"/>
               <rebootaction condition="needs.reboot">ask</rebootaction>"#,
        );
        let project = ProjectFixture::new()
            .with_manifest(manifest)
            .write_to(tmp.path())
            .unwrap();

        let installation = project.compile().unwrap();
        assert_eq!(installation.packaging.packager_class, "com.acme.SplitPackager");
        assert!(installation
            .packaging
            .packager_options
            .as_deref()
            .is_some_and(|o| o.contains("volumes")));
        let info = &installation.info;
        assert_eq!(info.unpacker_class, "com.acme.SplitUnpacker");
        assert_eq!(info.authors[0].email, "ada@example.com");
        assert!(info.requires_privileges);
        assert!(info.uninstaller_requires_privileges);
        assert_eq!(info.reboot_action, RebootAction::Ask);
        assert_eq!(info.uninstaller_path.as_deref(), Some("$INSTALL_PATH/Uninstaller"));
    }

    #[test]
    fn test_invalid_reboot_action() {
        let tmp = TempDir::new().unwrap();
        let manifest = manifests::installation("", manifests::pack("core", "")).replace(
            "<appversion>1.0</appversion>",
            "<appversion>1.0</appversion><rebootaction>sometimes</rebootaction>",
        );
        let project = ProjectFixture::new()
            .with_manifest(manifest)
            .write_to(tmp.path())
            .unwrap();

        let err = project.compile().unwrap_err();
        match find_compile_error(&err) {
            Some(CompileError::InvalidValue { value, .. }) => assert_eq!(value, "sometimes"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    // ========================================================================
    // Hooks and delivery
    // ========================================================================

    #[test]
    fn test_listener_hook_contributes_metadata() {
        let tmp = TempDir::new().unwrap();
        let sections = r#"<listeners><listener compiler="AdditionalData"/></listeners>"#;
        let body = r#"<file src="readme.txt" targetdir="$INSTALL_PATH">
              <additionaldata key="shortcut" value="yes"/>
            </file>"#;
        let project = ProjectFixture::new()
            .with_manifest(manifests::installation(sections, manifests::pack("core", body)))
            .with_file("readme.txt", "hello")
            .write_to(tmp.path())
            .unwrap();

        let installation = project.compile().unwrap();
        let metadata = &installation.packs[0].files[0].metadata;
        assert_eq!(metadata.get("shortcut").map(String::as_str), Some("yes"));
    }

    #[test]
    fn test_unknown_compiler_hook() {
        let tmp = TempDir::new().unwrap();
        let sections = r#"<listeners><listener compiler="Nope"/></listeners>"#;
        let project = ProjectFixture::new()
            .with_manifest(manifests::installation(sections, manifests::pack("core", "")))
            .write_to(tmp.path())
            .unwrap();

        let err = project.compile().unwrap_err();
        assert!(err.to_string().contains("unknown compiler hook 'Nope'"));
    }

    struct Rejecting;

    impl Rejecting {
        fn boxed() -> Box<dyn CompilerHook> {
            Box::new(Rejecting)
        }
    }

    impl CompilerHook for Rejecting {
        fn name(&self) -> &str {
            "Rejecting"
        }

        fn revise_metadata(
            &mut self,
            _metadata: FileMetadata,
            file: FileContext<'_>,
        ) -> Result<FileMetadata, HookError> {
            Err(HookError::new(format!("refusing {}", file.target)))
        }
    }

    #[test]
    fn test_hook_failure_aborts_with_element() {
        let tmp = TempDir::new().unwrap();
        let sections = r#"<listeners><listener compiler="Rejecting"/></listeners>"#;
        let project = ProjectFixture::new()
            .with_manifest(manifests::installation(sections, readme_pack("core")))
            .with_file("readme.txt", "hello")
            .write_to(tmp.path())
            .unwrap();

        let mut hooks = HookRegistry::empty();
        hooks.register("Rejecting", Rejecting::boxed);
        let err = compile_with(
            &project.source(),
            &project.options(),
            &hooks,
            &DefaultConditionFactory,
        )
        .unwrap_err();
        match find_compile_error(&err) {
            Some(CompileError::Hook { hook, element, message, .. }) => {
                assert_eq!(hook, "Rejecting");
                assert!(element.starts_with("<file"));
                assert_eq!(message, "refusing $INSTALL_PATH/readme.txt");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_deliver_in_packaging_order() {
        let tmp = TempDir::new().unwrap();
        let sections = r#"
            <variables><variable name="A" value="1"/></variables>
            <conditions><condition id="c" type="variable"/></conditions>"#;
        let project = ProjectFixture::new()
            .with_manifest(manifests::installation(sections, readme_pack("core")))
            .with_file("readme.txt", "hello")
            .write_to(tmp.path())
            .unwrap();
        let installation = project.compile().unwrap();

        let mut sink = RecordingSink::new();
        installation.deliver(&mut sink).unwrap();
        assert_eq!(
            sink.kinds(),
            vec![
                "packaging", "info", "guiprefs", "langpack", "resource", "panel", "pack",
                "variable", "condition"
            ]
        );
        assert_eq!(sink.calls_of("pack"), vec!["core"]);

        let mut failing = RecordingSink::failing_on("pack");
        assert!(installation.deliver(&mut failing).is_err());
    }
}
