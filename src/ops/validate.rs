//! Whole-model checks run once every document has been expanded.

use std::collections::{BTreeMap, HashMap, HashSet};

use anyhow::Result;
use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};

use crate::core::pack::Pack;
use crate::ops::context::CompilerContext;
use crate::ops::errors::CompileError;

/// Validate the pack graph.
///
/// Unresolved dependencies, dependency cycles and required packs in an
/// exclude group are fatal. Several preselected packs in one exclude group
/// and unknown parents are reported as warnings.
pub fn validate_packs(ctx: &mut CompilerContext) -> Result<()> {
    check_dependencies(&ctx.packs)?;
    check_cycles(&ctx.packs)?;
    check_exclude_groups(&ctx.packs)?;

    let names: HashSet<&str> = ctx.packs.iter().map(|p| p.name.as_str()).collect();
    let mut warnings = Vec::new();
    for pack in &ctx.packs {
        if let Some(parent) = &pack.parent {
            if !names.contains(parent.as_str()) {
                warnings.push(format!(
                    "Pack '{}' names unknown parent pack '{}'",
                    pack.name, parent
                ));
            }
        }
    }
    for (group, packs) in preselected_by_group(&ctx.packs) {
        if packs.len() > 1 {
            warnings.push(format!(
                "Exclude group '{}' has more than one preselected pack: {}",
                group,
                packs.join(", ")
            ));
        }
    }

    for warning in warnings {
        ctx.warn(None, warning);
    }
    Ok(())
}

fn check_dependencies(packs: &[Pack]) -> Result<(), CompileError> {
    let names: HashSet<&str> = packs.iter().map(|p| p.name.as_str()).collect();
    for pack in packs {
        if let Some(missing) = pack
            .dependencies
            .iter()
            .find(|dep| !names.contains(dep.as_str()))
        {
            return Err(CompileError::UnresolvedDependency {
                pack: pack.name.clone(),
                dependency: missing.clone(),
            });
        }
    }
    Ok(())
}

fn check_cycles(packs: &[Pack]) -> Result<(), CompileError> {
    let mut graph = DiGraph::<&str, ()>::new();
    let mut nodes: HashMap<&str, NodeIndex> = HashMap::new();
    for pack in packs {
        nodes
            .entry(pack.name.as_str())
            .or_insert_with(|| graph.add_node(pack.name.as_str()));
    }
    for pack in packs {
        let from = nodes[pack.name.as_str()];
        for dependency in &pack.dependencies {
            if let Some(&to) = nodes.get(dependency.as_str()) {
                graph.add_edge(from, to, ());
            }
        }
    }

    for component in tarjan_scc(&graph) {
        let looped = component.len() > 1
            || component
                .first()
                .is_some_and(|&node| graph.contains_edge(node, node));
        if looped {
            let mut members: Vec<String> =
                component.iter().map(|&node| graph[node].to_string()).collect();
            members.sort();
            if let Some(first) = members.first().cloned() {
                members.push(first);
            }
            return Err(CompileError::DependencyCycle { packs: members });
        }
    }
    Ok(())
}

fn check_exclude_groups(packs: &[Pack]) -> Result<(), CompileError> {
    for pack in packs {
        if let (true, Some(group)) = (pack.required, &pack.exclude_group) {
            return Err(CompileError::RequiredInExcludeGroup {
                file: None,
                pack: pack.name.clone(),
                group: group.clone(),
            });
        }
    }
    Ok(())
}

fn preselected_by_group(packs: &[Pack]) -> BTreeMap<&str, Vec<&str>> {
    let mut groups: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for pack in packs.iter().filter(|p| p.preselected) {
        if let Some(group) = &pack.exclude_group {
            groups.entry(group.as_str()).or_default().push(pack.name.as_str());
        }
    }
    groups
}
