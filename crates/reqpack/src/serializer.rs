//! Bundle serialization
//!
//! Output layout: loader prelude, one `define(<id>, function(module, exports, require) { .. });`
//! unit per module in ascending id order, then `requireModule(<entry id>);`. Unit order does not
//! affect behaviour since the loader resolves ids lazily; it only keeps output reproducible.

use std::{fmt::Write as _, path::Path};

use anyhow::{Result, bail};
use cow_utils::CowUtils;
use log::debug;

use crate::{
    error::BundleError,
    module_graph::{ModuleGraph, ModuleId, ModuleRecord},
    runtime::PRELUDE,
    scanner::find_require_calls,
};

/// A serialized bundle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bundle {
    text: String,
    units: Vec<ModuleId>,
    entry_id: ModuleId,
}

impl Bundle {
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Size of the bundle text in bytes
    pub fn byte_len(&self) -> usize {
        self.text.len()
    }

    /// Module ids in emission order
    pub fn units(&self) -> &[ModuleId] {
        &self.units
    }

    pub fn entry_id(&self) -> ModuleId {
        self.entry_id
    }
}

/// Serialize a fully rewritten graph. Fails if any record has not been rewritten.
pub fn serialize(graph: &ModuleGraph, entry_id: ModuleId) -> Result<Bundle> {
    let Some(entry) = graph.get_by_id(entry_id) else {
        bail!("Entry module {entry_id} is not part of the module graph");
    };
    let base_dir = entry.path.parent();

    let mut text = String::with_capacity(
        PRELUDE.len() + graph.modules().map(|r| r.raw_code.len() + 96).sum::<usize>(),
    );
    text.push_str(PRELUDE);

    let mut units = Vec::with_capacity(graph.len());
    for record in graph.modules() {
        write_unit(&mut text, record, graph, base_dir)?;
        units.push(record.id);
    }

    let _ = writeln!(text, "requireModule({entry_id});");
    debug!("Serialized {} modules into {} bytes", units.len(), text.len());

    Ok(Bundle {
        text,
        units,
        entry_id,
    })
}

fn write_unit(
    out: &mut String,
    record: &ModuleRecord,
    graph: &ModuleGraph,
    base_dir: Option<&Path>,
) -> Result<()> {
    let Some(code) = record.rewritten_code() else {
        return Err(BundleError::SerializationError {
            id: record.id,
            path: record.path.clone(),
        }
        .into());
    };
    if let Some(dangling) = find_require_calls(code)
        .iter()
        .filter_map(|call| call.id())
        .find(|&id| graph.get_by_id(ModuleId::new(id)).is_none())
    {
        bail!(
            "Module {} ({}) references module {dangling}, which is not in the bundle",
            record.id,
            record.path.display()
        );
    }

    let label = base_dir
        .and_then(|dir| record.path.strip_prefix(dir).ok())
        .unwrap_or(&record.path)
        .display()
        .to_string();
    let _ = writeln!(out, "// {}", label.cow_replace('\n', " "));
    let _ = writeln!(out, "define({}, function(module, exports, require) {{", record.id);
    out.push_str(code);
    // A trailing line comment must not swallow the closing brace
    if !code.is_empty() && !code.ends_with('\n') {
        out.push('\n');
    }
    out.push_str("});\n");
    Ok(())
}
