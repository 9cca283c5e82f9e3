//! Packaging tests: slides on disk, archive contents, cleanup.

use std::fs::File;

use cfactory_core::{PlanStructure, SlideDescriptor, Theme};
use cfactory_renderer::{package_carousel, FontSet, RenderError, SlideRenderer, HEIGHT, WIDTH};

fn slide(number: u32, kind: &str, headline: &str, body: Option<&str>) -> SlideDescriptor {
    SlideDescriptor {
        number,
        kind: kind.to_string(),
        headline: headline.to_string(),
        body_text: body.map(str::to_string),
        visual_hint: None,
    }
}

fn plan(slides: Vec<SlideDescriptor>) -> PlanStructure {
    PlanStructure {
        title: "Test plan".to_string(),
        description: None,
        slides,
        cta_final: None,
        extra: serde_json::Map::new(),
    }
}

fn renderer() -> SlideRenderer {
    SlideRenderer::new(Theme::Dark, FontSet::embedded().expect("embedded font"))
}

fn zip_names(path: &std::path::Path) -> Vec<String> {
    let archive = zip::ZipArchive::new(File::open(path).expect("open zip")).expect("read zip");
    let mut names: Vec<String> = archive.file_names().map(str::to_string).collect();
    names.sort();
    names
}

#[test]
fn packages_one_png_per_slide_into_zip() {
    let out = tempfile::tempdir().expect("tempdir");
    let plan = plan(vec![
        slide(1, "cover", "Как выйти в топ WB", None),
        slide(2, "body", "Шаг первый", Some("Заполните карточку товара полностью")),
        slide(3, "cta", "Подписывайся", None),
    ]);

    let packaged = package_carousel(&plan, &renderer(), out.path()).expect("package");

    assert_eq!(packaged.slide_count, 3);
    assert!(packaged.zip_path.exists());
    assert!(packaged.work_dir.is_dir());
    assert_eq!(packaged.zip_path.parent(), Some(out.path()));

    let dir_name = packaged
        .work_dir
        .file_name()
        .and_then(|n| n.to_str())
        .expect("dir name");
    assert!(dir_name.starts_with("carousel_"));
    assert_eq!(
        packaged.zip_path.file_name().and_then(|n| n.to_str()),
        Some(format!("{dir_name}.zip").as_str())
    );

    assert_eq!(
        zip_names(&packaged.zip_path),
        vec!["slide_1.png", "slide_2.png", "slide_3.png"]
    );

    let first = image::open(packaged.work_dir.join("slide_1.png")).expect("decode png");
    assert_eq!((first.width(), first.height()), (WIDTH, HEIGHT));
}

#[test]
fn cleanup_removes_all_artifacts() {
    let out = tempfile::tempdir().expect("tempdir");
    let packaged = package_carousel(&plan(vec![slide(1, "cover", "A", None)]), &renderer(), out.path())
        .expect("package");

    packaged.cleanup();

    assert!(!packaged.zip_path.exists());
    assert!(!packaged.work_dir.exists());
    // Idempotent.
    packaged.cleanup();
}

#[test]
fn empty_plan_is_rejected_without_writing() {
    let out = tempfile::tempdir().expect("tempdir");
    let err = package_carousel(&plan(vec![]), &renderer(), out.path()).expect_err("empty plan");

    assert!(matches!(err, RenderError::EmptyPlan));
    assert_eq!(std::fs::read_dir(out.path()).expect("read_dir").count(), 0);
}

#[test]
fn back_to_back_packages_get_distinct_directories() {
    let out = tempfile::tempdir().expect("tempdir");
    let plan = plan(vec![slide(1, "cover", "A", None)]);

    let first = package_carousel(&plan, &renderer(), out.path()).expect("first");
    let second = package_carousel(&plan, &renderer(), out.path()).expect("second");

    assert_ne!(first.work_dir, second.work_dir);
    assert_ne!(first.zip_path, second.zip_path);
}

#[test]
fn duplicate_slide_numbers_keep_every_slide() {
    let out = tempfile::tempdir().expect("tempdir");
    let plan = plan(vec![
        slide(1, "cover", "A", None),
        slide(1, "body", "B", None),
    ]);

    let packaged = package_carousel(&plan, &renderer(), out.path()).expect("package");

    assert_eq!(packaged.slide_count, 2);
    assert_eq!(
        zip_names(&packaged.zip_path),
        vec!["slide_1.png", "slide_1_2.png"]
    );
}
