//! Reference rewriting: `require('<specifier>')` becomes `require(<id>)`
//!
//! Call sites come from the lexical scanner, so only real reference calls are touched and
//! every occurrence of a specifier is replaced, not just the first.

use anyhow::Result;
use log::{debug, warn};

use crate::{
    error::BundleError,
    module_graph::{ModuleGraph, ModuleId, ModuleRecord},
    scanner::{self, RequireArgument},
};

/// Rewritten text of `record`. Needs the fully built graph, since every dependency's id must
/// be final.
pub fn rewrite(record: &ModuleRecord, graph: &ModuleGraph) -> Result<String> {
    let code = &*record.raw_code;
    let calls = scanner::find_require_calls(code);

    // Edges come from this same text, so each one must have at least one call site
    for specifier in record.dependency_edges.keys() {
        if !calls.iter().any(|call| call.specifier() == Some(specifier.as_str())) {
            return Err(BundleError::MissingReference {
                id: record.id,
                specifier: specifier.clone(),
            }
            .into());
        }
    }

    let mut out = String::with_capacity(code.len());
    let mut last = 0;
    let mut replaced = 0usize;
    for call in &calls {
        let replacement = match call.argument {
            // Only the bundler may emit integer references; a literal one in source is quoted
            // so it cannot alias a bundled module
            RequireArgument::Id(id) => {
                warn!(
                    "Module {} calls require({id}) with a number; keeping it as the string '{id}'",
                    record.id
                );
                format!("'{id}'")
            }
            RequireArgument::Specifier(specifier) => {
                let Some(target) = record.dependency_edges.get(specifier) else {
                    warn!(
                        "Module {} references '{specifier}' which is not one of its dependencies",
                        record.id
                    );
                    continue;
                };
                let Some(target_id) = graph.id_of(target) else {
                    return Err(BundleError::DanglingEdge {
                        id: record.id,
                        specifier: specifier.to_owned(),
                        target: target.clone(),
                    }
                    .into());
                };
                replaced += 1;
                target_id.to_string()
            }
        };
        out.push_str(&code[last..call.argument_span.start]);
        out.push_str(&replacement);
        last = call.argument_span.end;
    }
    out.push_str(&code[last..]);

    debug!("Module {}: rewrote {replaced} references", record.id);
    Ok(out)
}

/// Rewrite every record in ascending id order, storing the result on the record
pub fn rewrite_all(graph: &mut ModuleGraph) -> Result<()> {
    let rewritten: Vec<(ModuleId, String)> = graph
        .modules()
        .map(|record| Ok((record.id, rewrite(record, graph)?)))
        .collect::<Result<_>>()?;

    for (id, code) in rewritten {
        if let Some(record) = graph.get_by_id_mut(id) {
            record.set_rewritten_code(code);
        }
    }
    Ok(())
}
