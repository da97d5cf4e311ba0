// src/tasks/images.rs

//! `images`: lossless recompression of source images.
//!
//! PNGs are decoded and re-encoded with maximum compression and adaptive
//! filtering; the smaller of original and re-encoded bytes wins. Other
//! formats pass through unchanged. The result goes to the dev tree, and back
//! into the source tree only when it is smaller than the original.

use anyhow::Result;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{ImageEncoder, ImageFormat};
use tracing::debug;

use crate::tasks::output::{dest_path, emit};
use crate::tasks::{FileError, TaskContext, TaskDef, TaskReport};

pub fn run(def: &TaskDef, ctx: &TaskContext, report: &mut TaskReport) -> Result<()> {
    let dest = def.dest_dir()?;
    let src_base = def.source_spec()?.base.clone();

    for file in def.select(ctx)? {
        report.processed += 1;
        let original = match ctx.fs.read(&file.path) {
            Ok(bytes) => bytes,
            Err(e) => {
                report.errors.push(FileError::new(&file.path, format!("{e:#}")));
                continue;
            }
        };

        let is_png = file.rel.to_ascii_lowercase().ends_with(".png");
        let optimized = if is_png {
            match optimize_png(&original) {
                Ok(bytes) => bytes,
                Err(e) => {
                    report.errors.push(FileError::new(&file.path, e.to_string()));
                    continue;
                }
            }
        } else {
            original.clone()
        };

        if optimized.len() < original.len() {
            debug!(
                file = %file.rel,
                before = original.len(),
                after = optimized.len(),
                "image shrunk"
            );
            emit(ctx, report, dest_path(&src_base, &file.rel, None), &optimized)?;
        }
        emit(ctx, report, dest_path(dest, &file.rel, None), &optimized)?;
    }
    Ok(())
}

/// Re-encode a PNG losslessly; returns the input when that is not smaller.
pub fn optimize_png(bytes: &[u8]) -> image::ImageResult<Vec<u8>> {
    let img = image::load_from_memory_with_format(bytes, ImageFormat::Png)?;
    let mut out = Vec::new();
    PngEncoder::new_with_quality(&mut out, CompressionType::Best, FilterType::Adaptive)
        .write_image(img.as_bytes(), img.width(), img.height(), img.color())?;

    if out.len() < bytes.len() {
        Ok(out)
    } else {
        Ok(bytes.to_vec())
    }
}
