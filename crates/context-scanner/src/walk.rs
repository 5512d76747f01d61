use crate::error::Result;
use context_ignore::IgnoreEngine;
use std::path::{Path, PathBuf};

/// Depth-first, ignore-aware walk collecting candidate file paths in
/// deterministic (name-sorted) order. Directory matches prune the subtree
/// entirely — nested ignore files inside an ignored directory are never
/// read.
pub(crate) fn collect_candidates(
    engine: &mut IgnoreEngine,
    abs_dir: &Path,
    rel_dir: &str,
    recursive: bool,
    include_hidden: bool,
    out: &mut Vec<PathBuf>,
) -> Result<()> {
    let mut entries: Vec<_> = std::fs::read_dir(abs_dir)?
        .filter_map(std::result::Result::ok)
        .collect();
    entries.sort_by_key(std::fs::DirEntry::file_name);

    for entry in entries {
        let name = entry.file_name().to_string_lossy().into_owned();
        if !include_hidden && name.starts_with('.') {
            continue;
        }

        let rel = if rel_dir.is_empty() {
            name.clone()
        } else {
            format!("{rel_dir}/{name}")
        };

        let file_type = match entry.file_type() {
            Ok(ft) => ft,
            Err(e) => {
                log::warn!("skipping {}: {e}", entry.path().display());
                continue;
            }
        };
        let is_dir = file_type.is_dir();

        if engine.is_ignored(&rel, is_dir) {
            continue;
        }

        if is_dir {
            if !recursive {
                continue;
            }
            let layer_mark = engine.layer_count();
            engine.add_layer_from_dir(&entry.path(), &rel)?;
            collect_candidates(
                engine,
                &entry.path(),
                &rel,
                recursive,
                include_hidden,
                out,
            )?;
            engine.truncate_layers(layer_mark);
        } else if file_type.is_file() {
            out.push(entry.path());
        }
    }

    Ok(())
}
