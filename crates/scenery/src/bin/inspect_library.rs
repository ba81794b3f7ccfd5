//! Load every definition in a scenery library and describe the result.
//!
//! Usage: `inspect_library <library dir> [resources dir] [--lines]`
//!
//! Writes one JSON record per definition to `library.json` in the current
//! directory and prints a summary, including any batched load problems.

use std::env;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use scenery::Library;
use scenery_decode::{AssetPaths, Definition, FactoryOptions, GeometryDefinition, Preview};

const OUTPUT_FILE: &str = "library.json";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let mut positional = Vec::new();
    let mut options = FactoryOptions::default();
    for arg in env::args().skip(1) {
        if arg == "--lines" {
            options.line_markings = true;
        } else {
            positional.push(PathBuf::from(arg));
        }
    }
    let Some(library_dir) = positional.first() else {
        return Err("usage: inspect_library <library dir> [resources dir] [--lines]".into());
    };
    let resources = positional
        .get(1)
        .cloned()
        .unwrap_or_else(|| PathBuf::from("Resources"));

    println!("Scanning {}...", library_dir.display());
    let files = Library::scan(library_dir)?;
    println!("   Found {} candidate files", files.len());

    let mut library = Library::new(AssetPaths::new(resources)).with_options(options);
    let report = library.load_batch(&files);
    library.allocate_all();
    println!("   {report}");
    println!(
        "   Arena: {} vertices, {} textures",
        library.arena().len(),
        library.textures().len()
    );

    let records: Vec<_> = files
        .iter()
        .filter_map(|path| {
            let definition = library.get(path)?;
            Some(describe(&library, path, definition))
        })
        .collect();
    let output_path = Path::new(OUTPUT_FILE);
    File::create(output_path)?
        .write_all(serde_json::to_string_pretty(&serde_json::Value::Array(records))?.as_bytes())?;
    println!("   Saved descriptions to {}", output_path.display());

    if let Some(summary) = report.summary() {
        println!("\n{summary}");
    }
    Ok(())
}

fn describe(library: &Library, path: &Path, definition: &Definition) -> serde_json::Value {
    let bbox = definition
        .bbox()
        .map(|b| [b.min_x, b.max_x, b.min_z, b.max_z]);
    let draw = library.draw_call(path).map(|call| {
        serde_json::json!({
            "base": call.base,
            "culled": call.culled,
            "no_cull": call.no_cull,
        })
    });
    let preview = definition.preview().map(|preview| match preview {
        Preview::Mesh {
            half_extent,
            offset,
        } => serde_json::json!({ "mesh": half_extent, "offset": offset.to_array() }),
        Preview::Texture { rect, aspect, .. } => {
            serde_json::json!({ "rect": [rect.0, rect.1, rect.2, rect.3], "aspect": aspect })
        }
        Preview::Network {
            half_extent,
            height,
        } => serde_json::json!({ "network": half_extent, "height": height }),
    });
    serde_json::json!({
        "path": path.display().to_string(),
        "category": format!("{:?}", definition.category()),
        "layer": definition.layer().to_string(),
        "texture": definition.texture().0,
        "previewable": definition.is_previewable(),
        "bbox": bbox,
        "draw": draw,
        "preview": preview,
    })
}
