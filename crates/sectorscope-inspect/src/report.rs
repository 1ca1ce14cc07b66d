use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::InspectError;

/// Triangle totals per surface kind.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TriangleCounts {
    pub floor: usize,
    pub ceiling: usize,
    pub wall: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoundSummary {
    pub name: String,
    pub rate: u32,
    pub channels: u8,
    pub bits: u8,
    pub frames: usize,
    pub seconds: f64,
}

/// Everything the inspector learned about one level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelReport {
    pub archive_entries: usize,
    pub tiles: usize,
    pub shade_tables: usize,
    pub level: String,
    pub sectors: usize,
    pub walls: usize,
    pub portals: usize,
    pub triangles: TriangleCounts,
    pub skipped_sections: u32,
    pub spawn_angle: f32,
    pub camera: [f32; 3],
    pub camera_sector: Option<u32>,
    pub visible_sectors: Vec<u32>,
    pub textures_cached: usize,
    pub sounds: Vec<SoundSummary>,
    pub build_ms: f64,
}

/// Version stamped into every written report.
pub const REPORT_FORMAT: u32 = 1;

#[derive(Serialize)]
struct ReportOut<'a> {
    format: u32,
    report: &'a LevelReport,
}

#[derive(Deserialize)]
struct ReportIn {
    format: u32,
    report: LevelReport,
}

/// Write a report as pretty JSON tagged with [`REPORT_FORMAT`].
pub fn write_report(writer: impl Write, report: &LevelReport) -> Result<(), InspectError> {
    let out = ReportOut {
        format: REPORT_FORMAT,
        report,
    };
    serde_json::to_writer_pretty(writer, &out).map_err(|e| InspectError::Report(e.to_string()))
}

/// Read a report written by [`write_report`]. Other format versions are rejected.
pub fn read_report(reader: impl Read) -> Result<LevelReport, InspectError> {
    let file: ReportIn =
        serde_json::from_reader(reader).map_err(|e| InspectError::Report(e.to_string()))?;
    if file.format != REPORT_FORMAT {
        return Err(InspectError::Report(format!(
            "unsupported report format {} (expected {REPORT_FORMAT})",
            file.format
        )));
    }
    Ok(file.report)
}

/// Save a report to `path`, creating parent directories.
pub fn save_report(path: &Path, report: &LevelReport) -> Result<(), InspectError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut writer = BufWriter::new(File::create(path)?);
    write_report(&mut writer, report)?;
    writer.flush()?;
    Ok(())
}

pub fn load_report(path: &Path) -> Result<LevelReport, InspectError> {
    read_report(BufReader::new(File::open(path)?))
}

/// Format a report as a markdown summary.
pub fn format_markdown(report: &LevelReport) -> String {
    let mut out = String::new();
    out.push_str(&format!("## {}\n\n", report.level));
    out.push_str("| Item | Value |\n");
    out.push_str("|------|-------|\n");
    out.push_str(&format!("| Archive entries | {} |\n", report.archive_entries));
    out.push_str(&format!("| Tiles | {} |\n", report.tiles));
    out.push_str(&format!("| Shade tables | {} |\n", report.shade_tables));
    out.push_str(&format!("| Sectors | {} |\n", report.sectors));
    out.push_str(&format!("| Walls | {} |\n", report.walls));
    out.push_str(&format!("| Portals | {} |\n", report.portals));
    out.push_str(&format!(
        "| Triangles (floor / ceiling / wall) | {} / {} / {} |\n",
        report.triangles.floor, report.triangles.ceiling, report.triangles.wall
    ));
    out.push_str(&format!("| Empty wall sections | {} |\n", report.skipped_sections));
    out.push_str(&format!("| Textures cached | {} |\n", report.textures_cached));
    out.push_str(&format!("| Geometry build (ms) | {:.2} |\n", report.build_ms));

    let [x, y, z] = report.camera;
    let sector = report
        .camera_sector
        .map_or_else(|| "none".to_string(), |s| s.to_string());
    out.push_str(&format!(
        "\nCamera ({x:.3}, {y:.3}, {z:.3}) in sector {sector}, facing {:.1} deg\n",
        report.spawn_angle.to_degrees()
    ));
    let visible: Vec<String> = report.visible_sectors.iter().map(u32::to_string).collect();
    out.push_str(&format!(
        "Visible sectors ({}): [{}]\n",
        visible.len(),
        visible.join(", ")
    ));

    if !report.sounds.is_empty() {
        out.push_str("\n| Sound | Rate | Channels | Bits | Frames | Seconds |\n");
        out.push_str("|-------|------|----------|------|--------|---------|\n");
        for s in &report.sounds {
            out.push_str(&format!(
                "| {} | {} | {} | {} | {} | {:.2} |\n",
                s.name, s.rate, s.channels, s.bits, s.frames, s.seconds
            ));
        }
    }

    out
}
