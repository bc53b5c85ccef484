use crate::database::{ElectionsDatabase, RosterEntry};
use crate::results::{self, ElectionResults, ResultsError};
use chrono::NaiveDate;
use std::path::PathBuf;

pub mod chart;
pub mod fonts;
pub mod layout;
pub mod pdf;

use chart::{PieChart, Slice};
use fonts::ReportFont;
use layout::{mm, Align, Block, Column, Composer, Frame, Paragraph, Rgb, Table, TableStyle};
use pdf::{Logo, PdfMetadata};

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("Results error: {0}")]
    Results(#[from] ResultsError),
    #[error("PDF error: {0}")]
    Pdf(String),
}

pub type ReportResult<T> = std::result::Result<T, ReportError>;

pub const DEFAULT_INSTITUTION: &str = "Unidad Educativa el Milenio 11 de Noviembre";
pub const DEFAULT_SUBTITLE: &str = "Votaciones 23 de noviembre del 2025";

const LOGO_HEIGHT: f32 = 48.0;

/// Institution-wide report configuration
#[derive(Debug, Clone)]
pub struct ReportSettings {
    pub institution: String,
    pub subtitle: String,
    pub font_path: Option<PathBuf>,
    pub logo_path: Option<PathBuf>,
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            institution: DEFAULT_INSTITUTION.to_string(),
            subtitle: DEFAULT_SUBTITLE.to_string(),
            font_path: Some(PathBuf::from(fonts::DEFAULT_FONT_PATH)),
            logo_path: None,
        }
    }
}

/// Per-request switches
#[derive(Debug, Clone, Copy, Default)]
pub struct ReportOptions {
    pub include_roster: bool,
}

pub struct GeneratedReport {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// Download name such as `Resultados_Consejo_Estudiantil_2025-11-24.pdf`
pub fn report_filename(process_name: &str, date: NaiveDate) -> String {
    format!(
        "Resultados_{}_{}.pdf",
        process_name.replace(' ', "_"),
        date.format("%Y-%m-%d")
    )
}

/// Compute results for a finalized process and render them to PDF
pub async fn generate_report(
    db: &ElectionsDatabase,
    process_id: i64,
    options: ReportOptions,
    settings: &ReportSettings,
) -> ReportResult<GeneratedReport> {
    let process = results::get_finalized_process(db, process_id).await?;
    let roster = if options.include_roster {
        Some(
            db.get_roster_for_process(&process)
                .await
                .map_err(ResultsError::from)?,
        )
    } else {
        None
    };
    let results = results::compute_results(db, process).await?;

    let bytes = render_results_pdf(&results, roster.as_deref(), settings)?;
    let filename = report_filename(&results.process.name, chrono::Local::now().date_naive());

    log::info!(
        "Rendered {} ({} bytes, roster: {})",
        filename,
        bytes.len(),
        options.include_roster
    );

    Ok(GeneratedReport { filename, bytes })
}

/// Render the results document; the roster section is added when given.
pub fn render_results_pdf(
    results: &ElectionResults,
    roster: Option<&[RosterEntry]>,
    settings: &ReportSettings,
) -> ReportResult<Vec<u8>> {
    let font = ReportFont::load_or_fallback(settings.font_path.as_deref());
    let logo = Logo::load_optional(settings.logo_path.as_deref());
    let frame = Frame::a4(mm(20.0));

    let blocks = build_blocks(results, roster, settings, logo.as_ref());
    let pages = Composer::new(&font, frame).compose(&blocks);

    let title = format!("Resultados Electorales - {}", results.process.name);
    pdf::write_document(pages, frame, &font, logo.as_ref(), PdfMetadata { title: &title })
}

fn percent(value: f64) -> String {
    format!("{:.2}%", value)
}

fn build_blocks(
    results: &ElectionResults,
    roster: Option<&[RosterEntry]>,
    settings: &ReportSettings,
    logo: Option<&Logo>,
) -> Vec<Block> {
    let tally = &results.tally;
    let mut blocks = Vec::new();

    // Header
    if let Some(logo) = logo {
        let (width, height) = logo.scaled(LOGO_HEIGHT);
        blocks.push(Block::Image { width, height });
        blocks.push(Block::Spacer(6.0));
    }
    blocks.push(Block::Paragraph(Paragraph::new(
        settings.institution.as_str(),
        14.0,
        16.0,
        Align::Center,
    )));
    blocks.push(Block::Spacer(2.0));
    blocks.push(Block::Paragraph(Paragraph::new(
        settings.subtitle.as_str(),
        10.0,
        12.0,
        Align::Center,
    )));
    blocks.push(Block::Spacer(8.0));
    blocks.push(Block::Paragraph(Paragraph::new(
        format!("Resultados Electorales - {}", results.process.name),
        12.0,
        14.0,
        Align::Center,
    )));
    blocks.push(Block::Spacer(8.0));
    blocks.push(Block::Paragraph(Paragraph::new(
        format!("Fecha: {}", results.process.date.format("%d/%m/%Y")),
        10.0,
        12.0,
        Align::Center,
    )));
    blocks.push(Block::Spacer(10.0));

    // Results table
    let mut rows = vec![vec![
        "Lista".to_string(),
        "Votos".to_string(),
        "Porcentaje".to_string(),
    ]];
    for list in &tally.lists {
        rows.push(vec![
            list.name.clone(),
            list.votes.to_string(),
            percent(list.percentage),
        ]);
    }
    rows.push(vec![
        "Votos en Blanco".to_string(),
        tally.blank.votes.to_string(),
        percent(tally.blank.percentage),
    ]);
    rows.push(vec![
        "Votos Nulos".to_string(),
        tally.null.votes.to_string(),
        percent(tally.null.percentage),
    ]);
    rows.push(vec![
        "TOTAL".to_string(),
        tally.total_votes.to_string(),
        "100.00%".to_string(),
    ]);

    blocks.push(Block::Table(Table {
        columns: vec![
            Column::new(mm(100.0), Align::Left),
            Column::new(mm(30.0), Align::Center),
            Column::new(mm(30.0), Align::Center),
        ],
        rows,
        header_rows: 1,
        style: TableStyle {
            header_background: Some(Rgb::hex(0xF1F5F9)),
            header_text: Rgb::hex(0x0F172A),
            body_background: Some(Rgb::WHITE),
            grid: Some((Rgb::GREY, 0.5)),
            ..TableStyle::default()
        },
    }));
    blocks.push(Block::Spacer(12.0));

    // Pie chart of shares; skipped whenever it cannot be built
    match results_chart(results) {
        Ok(chart) => {
            blocks.push(Block::Chart(chart));
            blocks.push(Block::Spacer(12.0));
        }
        Err(e) => log::debug!("Pie chart skipped: {}", e),
    }

    // Participation summary
    blocks.push(Block::Paragraph(Paragraph::new(
        "Resumen de Votación",
        12.0,
        14.0,
        Align::Left,
    )));
    blocks.push(Block::Spacer(6.0));
    blocks.push(Block::Table(Table {
        columns: vec![
            Column::new(mm(80.0), Align::Left),
            Column::new(mm(40.0), Align::Right),
        ],
        rows: vec![
            vec![
                "Votantes Habilitados".to_string(),
                tally.eligible_voters.to_string(),
            ],
            vec!["Votos Emitidos".to_string(), tally.total_votes.to_string()],
            vec!["No Votaron".to_string(), tally.not_voted.to_string()],
        ],
        header_rows: 0,
        style: TableStyle::default(),
    }));

    // Signature
    blocks.push(Block::Spacer(24.0));
    blocks.push(Block::Rule {
        color: Rgb::hex(0xCBD5E1),
        width: 0.8,
        padding: 6.0,
    });
    blocks.push(Block::Spacer(10.0));
    blocks.push(Block::Paragraph(Paragraph::new(
        "_______________________________",
        11.0,
        14.0,
        Align::Center,
    )));
    blocks.push(Block::Paragraph(Paragraph::new(
        "Firma Rectorado",
        11.0,
        14.0,
        Align::Center,
    )));
    blocks.push(Block::Spacer(12.0));

    if let Some(roster) = roster {
        blocks.push(Block::PageBreak);
        blocks.extend(roster_blocks(&results.process.name, roster));
    }

    blocks
}

fn results_chart(results: &ElectionResults) -> Result<PieChart, chart::ChartError> {
    let tally = &results.tally;
    let mut slices: Vec<Slice> = tally
        .lists
        .iter()
        .map(|l| Slice::new(format!("{} ({:.1}%)", l.name, l.percentage), l.percentage))
        .collect();
    slices.push(Slice::new(
        format!("Blancos ({:.1}%)", tally.blank.percentage),
        tally.blank.percentage,
    ));
    slices.push(Slice::new(
        format!("Nulos ({:.1}%)", tally.null.percentage),
        tally.null.percentage,
    ));

    PieChart::new(slices)
}

fn roster_blocks(process_name: &str, roster: &[RosterEntry]) -> Vec<Block> {
    let voted = roster.iter().filter(|e| e.voted).count();

    let mut rows = vec![vec![
        "Cédula".to_string(),
        "Nombres".to_string(),
        "Curso".to_string(),
        "Votó".to_string(),
    ]];
    rows.extend(roster.iter().map(|entry| {
        vec![
            entry.national_id.clone(),
            entry.full_name(),
            entry.class_group(),
            if entry.voted { "Sí" } else { "No" }.to_string(),
        ]
    }));

    vec![
        Block::Paragraph(Paragraph::new(
            format!("Padrón Electoral - {}", process_name),
            12.0,
            14.0,
            Align::Center,
        )),
        Block::Paragraph(Paragraph::new(
            format!("Votaron {} de {} estudiantes", voted, roster.len()),
            10.0,
            12.0,
            Align::Center,
        )),
        Block::Spacer(8.0),
        Block::Table(Table {
            columns: vec![
                Column::new(mm(30.0), Align::Left),
                Column::new(mm(80.0), Align::Left),
                Column::new(mm(35.0), Align::Left),
                Column::new(mm(20.0), Align::Center),
            ],
            rows,
            header_rows: 1,
            style: TableStyle {
                font_size: 9.0,
                padding: 3.0,
                header_background: Some(Rgb::hex(0xF1F5F9)),
                header_text: Rgb::hex(0x0F172A),
                grid: Some((Rgb::GREY, 0.5)),
                repeat_header: true,
                ..TableStyle::default()
            },
        }),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::ingestion::{tests::sample_snapshot, SnapshotImporter};
    use crate::database::ProcessInfo;
    use crate::model::ProcessStatus;
    use crate::results::tally::{tally, Tally};
    use crate::database::{ListVoteCount, VoteTotals};
    use lopdf::Document;
    use pretty_assertions::assert_eq;

    fn settings() -> ReportSettings {
        ReportSettings {
            font_path: None,
            ..ReportSettings::default()
        }
    }

    fn results_with(tally: Tally) -> ElectionResults {
        ElectionResults {
            process: ProcessInfo {
                id: 1,
                name: "Consejo Estudiantil".to_string(),
                date: NaiveDate::from_ymd_opt(2025, 11, 23).unwrap(),
                status: ProcessStatus::Finalized,
                period_id: 1,
                created_at: NaiveDate::from_ymd_opt(2025, 11, 1)
                    .unwrap()
                    .and_hms_opt(8, 0, 0)
                    .unwrap(),
            },
            tally,
        }
    }

    fn reference_results() -> ElectionResults {
        results_with(tally(
            &[
                ListVoteCount {
                    list_id: 2,
                    list_name: "B".to_string(),
                    votes: 45,
                },
                ListVoteCount {
                    list_id: 1,
                    list_name: "A".to_string(),
                    votes: 30,
                },
            ],
            VoteTotals {
                total: 100,
                blank: 10,
                null_votes: 15,
            },
            120,
        ))
    }

    fn roster(size: usize) -> Vec<RosterEntry> {
        (0..size)
            .map(|i| RosterEntry {
                id: i as i64,
                national_id: format!("06{:08}", i),
                first_names: format!("Estudiante {}", i),
                last_names: "Pérez".to_string(),
                grade: "10mo".to_string(),
                section: "A".to_string(),
                voted: i % 2 == 0,
            })
            .collect()
    }

    #[test]
    fn filename_replaces_spaces() {
        let date = NaiveDate::from_ymd_opt(2025, 11, 24).unwrap();
        assert_eq!(
            report_filename("Consejo Estudiantil 2025", date),
            "Resultados_Consejo_Estudiantil_2025_2025-11-24.pdf"
        );
    }

    #[test]
    fn summary_report_is_single_page() {
        let bytes = render_results_pdf(&reference_results(), None, &settings()).unwrap();

        assert!(bytes.starts_with(b"%PDF-"));
        let doc = Document::load_mem(&bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 1);
    }

    #[test]
    fn roster_adds_pages() {
        let entries = roster(150);
        let bytes = render_results_pdf(&reference_results(), Some(&entries), &settings()).unwrap();

        let doc = Document::load_mem(&bytes).unwrap();
        assert!(doc.get_pages().len() >= 4);
    }

    #[test]
    fn blocks_contain_results_rows_and_chart() {
        let results = reference_results();
        let blocks = build_blocks(&results, None, &settings(), None);

        let table = blocks
            .iter()
            .find_map(|b| match b {
                Block::Table(t) if t.header_rows == 1 => Some(t),
                _ => None,
            })
            .unwrap();
        let names: Vec<_> = table.rows.iter().map(|r| r[0].as_str()).collect();
        assert_eq!(
            names,
            vec!["Lista", "B", "A", "Votos en Blanco", "Votos Nulos", "TOTAL"]
        );
        assert_eq!(table.rows[1][2], "45.00%");

        let chart = blocks
            .iter()
            .find_map(|b| match b {
                Block::Chart(c) => Some(c),
                _ => None,
            })
            .unwrap();
        assert_eq!(chart.slices()[0].label, "B (45.0%)");
        assert!(!blocks.iter().any(|b| matches!(b, Block::PageBreak)));
    }

    #[test]
    fn chart_is_skipped_without_votes() {
        let results = results_with(tally(&[], VoteTotals::default(), 30));
        let blocks = build_blocks(&results, None, &settings(), None);

        assert!(!blocks.iter().any(|b| matches!(b, Block::Chart(_))));
        let bytes = render_results_pdf(&results, None, &settings()).unwrap();
        assert!(bytes.starts_with(b"%PDF-"));
    }

    #[test]
    fn roster_rows_say_si_or_no() {
        let entries = roster(3);
        let blocks = roster_blocks("Consejo", &entries);
        let table = blocks
            .iter()
            .find_map(|b| match b {
                Block::Table(t) => Some(t),
                _ => None,
            })
            .unwrap();

        let marks: Vec<_> = table.rows.iter().skip(1).map(|r| r[3].as_str()).collect();
        assert_eq!(marks, vec!["Sí", "No", "Sí"]);
        assert!(table.style.repeat_header);
    }

    #[tokio::test]
    async fn generate_report_refuses_open_process() {
        let db = ElectionsDatabase::create_in_memory().await.unwrap();
        SnapshotImporter::new(db.clone())
            .import(&sample_snapshot())
            .await
            .unwrap();

        let err = generate_report(&db, 2, ReportOptions::default(), &settings())
            .await
            .err()
            .unwrap();
        assert!(matches!(
            err,
            ReportError::Results(ResultsError::NotFinalized { .. })
        ));

        let report = generate_report(
            &db,
            1,
            ReportOptions {
                include_roster: true,
            },
            &settings(),
        )
        .await
        .unwrap();
        assert!(report.filename.starts_with("Resultados_Consejo_Estudiantil_"));
        assert_eq!(Document::load_mem(&report.bytes).unwrap().get_pages().len(), 2);
    }
}
