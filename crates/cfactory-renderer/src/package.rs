//! Renders every slide of a plan to PNG and packs them into a zip archive.
//!
//! Layout under `output_dir`:
//!
//! ```text
//! carousel_<unix-millis>/slide_1.png
//! carousel_<unix-millis>/slide_2.png
//! carousel_<unix-millis>.zip
//! ```
//!
//! The archive holds the slide files by bare name. All of this is blocking
//! filesystem and CPU work; async callers should run it on a blocking thread.

use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};

use cfactory_core::PlanStructure;
use image::ImageFormat;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::RenderError;
use crate::slide::SlideRenderer;

/// Local artifacts of one packaged carousel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackagedCarousel {
    pub zip_path: PathBuf,
    pub work_dir: PathBuf,
    pub slide_count: usize,
}

impl PackagedCarousel {
    /// Removes the slide directory and the archive. Missing paths are ignored.
    pub fn cleanup(&self) {
        remove_artifacts(&self.work_dir, &self.zip_path);
    }
}

/// Renders and zips every slide of `plan` in plan order.
///
/// On failure, anything written so far is removed before the error returns.
///
/// # Errors
///
/// Returns [`RenderError::EmptyPlan`] when the plan has no slides, or an
/// I/O, image, or zip error from writing the artifacts.
pub fn package_carousel(
    plan: &PlanStructure,
    renderer: &SlideRenderer,
    output_dir: &Path,
) -> Result<PackagedCarousel, RenderError> {
    if plan.slides.is_empty() {
        return Err(RenderError::EmptyPlan);
    }

    fs::create_dir_all(output_dir)?;
    let (work_dir, stem) = create_work_dir(output_dir)?;
    let zip_path = output_dir.join(format!("{stem}.zip"));

    match write_artifacts(plan, renderer, &work_dir, &zip_path) {
        Ok(slide_count) => {
            tracing::info!(
                zip = %zip_path.display(),
                slides = slide_count,
                "packaged carousel"
            );
            Ok(PackagedCarousel {
                zip_path,
                work_dir,
                slide_count,
            })
        }
        Err(e) => {
            remove_artifacts(&work_dir, &zip_path);
            Err(e)
        }
    }
}

fn write_artifacts(
    plan: &PlanStructure,
    renderer: &SlideRenderer,
    work_dir: &Path,
    zip_path: &Path,
) -> Result<usize, RenderError> {
    let mut used = HashSet::new();
    let mut files = Vec::with_capacity(plan.slides.len());

    for (idx, slide) in plan.slides.iter().enumerate() {
        let mut name = format!("slide_{}.png", slide.number);
        if !used.insert(name.clone()) {
            // Duplicate slide numbers keep their own file.
            name = format!("slide_{}_{}.png", slide.number, idx + 1);
            used.insert(name.clone());
        }

        let path = work_dir.join(&name);
        renderer
            .render_slide(slide)
            .save_with_format(&path, ImageFormat::Png)?;
        files.push((name, path));
    }

    let mut zip = ZipWriter::new(BufWriter::new(File::create(zip_path)?));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    for (name, path) in &files {
        zip.start_file(name.as_str(), options)?;
        io::copy(&mut File::open(path)?, &mut zip)?;
    }
    zip.finish()?;

    Ok(files.len())
}

/// Creates `carousel_<millis>` under `output_dir`, suffixing on collision.
fn create_work_dir(output_dir: &Path) -> Result<(PathBuf, String), RenderError> {
    let base = format!("carousel_{}", chrono::Utc::now().timestamp_millis());
    let mut attempt = 0u32;

    loop {
        let stem = if attempt == 0 {
            base.clone()
        } else {
            format!("{base}_{attempt}")
        };
        let dir = output_dir.join(&stem);

        match fs::create_dir(&dir) {
            Ok(()) => return Ok((dir, stem)),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => attempt += 1,
            Err(e) => return Err(e.into()),
        }
    }
}

fn remove_artifacts(work_dir: &Path, zip_path: &Path) {
    if let Err(e) = fs::remove_dir_all(work_dir) {
        if e.kind() != io::ErrorKind::NotFound {
            tracing::warn!(path = %work_dir.display(), error = %e, "failed to remove slide directory");
        }
    }
    if let Err(e) = fs::remove_file(zip_path) {
        if e.kind() != io::ErrorKind::NotFound {
            tracing::warn!(path = %zip_path.display(), error = %e, "failed to remove carousel archive");
        }
    }
}
