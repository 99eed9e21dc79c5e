//! Export card example - builds a report and writes the PNG

use groomcard::draft::Gender;
use groomcard::{export_report, RasterConfig, Rasterizer, ReportDraft};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("Groomcard - Export Card Example\n");

    let mut draft = ReportDraft::new();
    draft.pet.name = "Mochi".to_string();
    draft.pet.breed = "Poodle".to_string();
    draft.pet.gender = Gender::Female;
    draft.groomer_name = "Alex".to_string();
    for service in ["Bath", "Haircut & Styling", "Nail Trim"] {
        draft.services.insert(service);
    }
    draft.set_notes("Very calm today, a little nervous during the nail trim.");
    draft.template_id = "nature-green".to_string();

    let rasterizer = Rasterizer::new(RasterConfig::default());
    let report = export_report(&draft, &rasterizer)?;
    let path = report.save("target/demo")?;

    println!("Saved: {}", path.display());
    println!("Size: {}x{} at {:.1}x", report.width, report.height, report.pixel_ratio);
    println!("\n{}", report.text.text);
    Ok(())
}
