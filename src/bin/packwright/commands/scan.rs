//! `packwright scan` command

use anyhow::Result;

use crate::cli::ScanArgs;
use packwright::util::fileset::{to_slash, FilesetScanner, PatternSet};
use packwright::util::GlobalContext;

pub fn execute(args: ScanArgs) -> Result<()> {
    let ctx = GlobalContext::new()?;
    let base = ctx.absolute(&args.dir);

    let mut patterns = PatternSet::new();
    for include in args.include {
        patterns.include_list(&include);
    }
    for exclude in args.exclude {
        patterns.exclude_list(&exclude);
    }

    let scan = FilesetScanner::new(&base, patterns)
        .case_sensitive(!args.case_insensitive)
        .default_excludes(!args.no_default_excludes)
        .scan()?;

    for file in &scan.files {
        println!("{}", to_slash(file));
    }
    for dir in &scan.empty_dirs {
        println!("{}/", to_slash(dir));
    }

    tracing::debug!(
        "{} files, {} empty directories under {}",
        scan.files.len(),
        scan.empty_dirs.len(),
        base.display()
    );
    Ok(())
}
