//! End-to-end export of a filled-in report

use std::io::Cursor;

use chrono::NaiveDate;
use groomcard::rendering::{compose, Section};
use groomcard::rewrite::FailingRewriter;
use groomcard::settings::{rewrite_config, SettingsStore};
use groomcard::{
    enhance_notes_or_keep, export_report, normalize, Error, ExportConfig, Gender, PhotoRole,
    RasterConfig, Rasterizer, ReportDraft, RewriteError,
};
use image::{ImageFormat, Rgb, RgbImage};

fn png_fixture(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    });
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ImageFormat::Png).unwrap();
    out.into_inner()
}

fn mochi() -> ReportDraft {
    let mut draft = ReportDraft::new();
    draft.pet.name = "Mochi".into();
    draft.pet.breed = "Poodle".into();
    draft.pet.age = "3".into();
    draft.pet.weight = "4.2".into();
    draft.pet.gender = Gender::Female;
    draft.groomer_name = "Alex".into();
    draft.date = NaiveDate::from_ymd_opt(2024, 5, 17).unwrap();
    draft.services.insert("Bath");
    draft.services.insert("Nail Trim");
    draft.set_notes("very calm today");
    draft.template_id = "sweet-pink".into();
    draft
}

fn fast(pixel_ratio: f32) -> Rasterizer {
    Rasterizer::new(RasterConfig {
        pixel_ratio,
        settle_ms: 0,
        ..Default::default()
    })
}

#[test]
fn mochi_report_exports_at_three_x() {
    let mut draft = mochi();
    let after = normalize(&png_fixture(2400, 1600), &ExportConfig::default()).unwrap();
    assert_eq!((after.width, after.height), (1200, 800));
    draft.set_photo(PhotoRole::After, after);

    let doc = compose(&draft, draft.template());
    assert!(doc.sections.iter().any(|n| n.section == Section::Photos));

    let report = export_report(&draft, &fast(3.0)).unwrap();
    assert_eq!(report.file_name, "grooming-report-Mochi.png");
    assert_eq!(report.width, (doc.width * 3.0).ceil() as u32);
    assert_eq!(report.height, (doc.height * 3.0).ceil() as u32);

    let text = &report.text.text;
    for expected in ["Mochi", "Poodle", "4.2kg", "Bath", "Nail Trim", "AFTER", "very calm today"] {
        assert!(text.contains(expected), "missing {:?} in {:?}", expected, text);
    }
    assert!(!text.contains("BEFORE"));

    let img = image::load_from_memory(&report.png_data).unwrap().to_rgba8();
    assert_eq!(img.dimensions(), (report.width, report.height));
    // pink top border
    assert_eq!(img.get_pixel(30, 3).0, [0xdb, 0x27, 0x77, 255]);
}

#[test]
fn rewritten_notes_replace_raw_notes_on_the_card() {
    let mut draft = mochi();
    draft.set_enhanced_notes("Mochi was an absolute angel!");
    let report = export_report(&draft, &fast(1.0)).unwrap();
    assert!(report.text.text.contains("Mochi was an absolute angel!"));
    assert!(!report.text.text.contains("very calm today"));
}

#[test]
fn replacing_a_photo_keeps_one_per_role() {
    let config = ExportConfig::default();
    let mut draft = mochi();
    let first = normalize(&png_fixture(300, 200), &config).unwrap();
    let second = normalize(&png_fixture(200, 300), &config).unwrap();

    assert!(draft.set_photo(PhotoRole::Before, first.clone()).is_none());
    let replaced = draft.set_photo(PhotoRole::Before, second.clone()).unwrap();
    assert_eq!(replaced, first);
    assert_eq!(draft.photos().count(), 1);
    assert_eq!(draft.photo(PhotoRole::Before), Some(&second));
}

#[test]
fn repeated_exports_are_fresh_and_identical() {
    let draft = mochi();
    let rasterizer = fast(1.0);
    let a = export_report(&draft, &rasterizer).unwrap();
    let b = export_report(&draft, &rasterizer).unwrap();
    assert_eq!(rasterizer.renders(), 2);
    assert_eq!(a.png_data, b.png_data);
}

#[test]
fn export_reflects_edits_between_calls() {
    let mut draft = mochi();
    let rasterizer = fast(1.0);
    let a = export_report(&draft, &rasterizer).unwrap();
    draft.pet.name = "Biscuit".into();
    let b = export_report(&draft, &rasterizer).unwrap();
    assert_ne!(a.png_data, b.png_data);
    assert_ne!(a.text, b.text);
    assert_eq!(b.file_name, "grooming-report-Biscuit.png");
    assert!(b.text.text.contains("Biscuit"));
}

#[test]
fn empty_draft_uses_fallbacks() {
    let report = export_report(&ReportDraft::new(), &fast(1.0)).unwrap();
    assert_eq!(report.file_name, "grooming-report-pet.png");
    assert!(report.text.text.contains(groomcard::draft::FALLBACK_PET_NAME));
    assert!(report.text.text.contains(groomcard::draft::FALLBACK_NOTES));
    assert!(report.text.text.contains("No services selected"));
}

#[test]
fn plain_mochi_card_names_file_and_shows_notes() {
    let mut draft = ReportDraft::new();
    draft.pet.name = "Mochi".into();
    draft.set_notes("did great");
    draft.template_id = "modern-blue".into();

    let report = export_report(&draft, &fast(1.0)).unwrap();
    assert!(report.file_name.contains("Mochi"));
    assert!(report.text.text.contains("did great"));
    assert!(!report.text.text.contains("BEFORE"));
    assert!(!report.text.text.contains("AFTER"));
}

#[tokio::test]
async fn broken_rewrite_setup_still_exports_original_notes() {
    let dir = tempfile::tempdir().unwrap();
    let store = SettingsStore::at(dir.path().join("settings.toml"));
    std::fs::write(store.path(), "api_key = [").unwrap();

    // no explicit key: the unreadable file is a setup failure
    let setup = rewrite_config(None, store.load()).unwrap_err();
    assert!(matches!(setup, Error::ConfigError(_)));

    let mut draft = mochi();
    assert!(!enhance_notes_or_keep(&mut draft, Err(setup)).await);
    assert_eq!(draft.enhanced_notes(), None);

    // the service itself failing behaves the same
    let failing = FailingRewriter::new(RewriteError::RateLimited);
    assert!(!enhance_notes_or_keep(&mut draft, Ok(Some(&failing))).await);
    assert_eq!(failing.calls(), 1);

    let report = export_report(&draft, &fast(1.0)).unwrap();
    assert!(report.text.text.contains("very calm today"));
    assert!(!report.png_data.is_empty());

    // an explicit key does not need the settings file
    let config = rewrite_config(Some("k"), store.load()).unwrap().unwrap();
    assert_eq!(config.api_key, "k");
}
