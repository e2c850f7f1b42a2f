use std::fmt::Write as _;
use std::path::Path;

use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::{UTF8_FULL, UTF8_FULL_CONDENSED};
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use bids_ingest::MappingTable;
use bids_model::{BatchReport, PhysioRunReport, PhysioScan, StepOutcome, SubjectStatus};

const RULE_WIDTH: usize = 60;

pub fn print_conversion_summary(report: &BatchReport, log_file: Option<&Path>) {
    println!("Session: {}", report.session);
    if let Some(path) = log_file {
        println!("Log file: {}", path.display());
    }
    if !report.subjects.is_empty() {
        println!("{}", conversion_table(report));
    }
    println!("{}", conversion_totals_table(report));
    if !report.unmatched.is_empty() {
        eprintln!("No mapping found:");
        for folder in &report.unmatched {
            eprintln!("- {folder}");
        }
    }
}

/// One row per matched subject folder.
pub fn conversion_table(report: &BatchReport) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Folder"),
        header_cell("Raw ID"),
        header_cell("Subject"),
        header_cell("Status"),
        header_cell("dcm2bids"),
        header_cell("Deface"),
        header_cell("Physio"),
        header_cell("Notes"),
    ]);
    apply_summary_table_style(&mut table);
    align_column(&mut table, 4, CellAlignment::Center);
    align_column(&mut table, 5, CellAlignment::Center);
    align_column(&mut table, 6, CellAlignment::Center);
    for subject in &report.subjects {
        table.add_row(vec![
            Cell::new(&subject.folder),
            Cell::new(&subject.raw_id),
            Cell::new(format!("sub-{}", subject.anonymized_id))
                .fg(Color::Blue)
                .add_attribute(Attribute::Bold),
            status_cell(subject.status()),
            step_cell(&subject.archive),
            step_cell(&subject.deface),
            presence_cell(subject.physio_present),
            subject
                .notes()
                .map_or_else(|| dim_cell("-"), Cell::new),
        ]);
    }
    table
}

pub fn conversion_totals_table(report: &BatchReport) -> Table {
    let mut table = Table::new();
    table.set_header(vec![header_cell("Outcome"), header_cell("Count")]);
    apply_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    table.add_row(vec![Cell::new("Converted"), count_cell(report.converted_count(), Color::Green)]);
    table.add_row(vec![
        Cell::new("Skipped (already converted)"),
        count_cell(report.skipped_count(), Color::Cyan),
    ]);
    table.add_row(vec![
        Cell::new("Not found in mapping"),
        count_cell(report.not_found_count(), Color::Yellow),
    ]);
    table.add_row(vec![
        Cell::new("Ambiguous matches"),
        count_cell(report.ambiguous_count(), Color::Yellow),
    ]);
    table.add_row(vec![
        Cell::new("Missing physio"),
        count_cell(report.missing_physio_count(), Color::Yellow),
    ]);
    table.add_row(vec![
        Cell::new("Failed"),
        count_cell(report.failed_count(), Color::Red).add_attribute(Attribute::Bold),
    ]);
    table
}

pub fn print_physio_dry_run(scan: &PhysioScan, log_file: Option<&Path>) {
    print!("{}", physio_dry_run_listing(scan, log_file));
}

/// Numbered listing of what a real physio run would convert.
pub fn physio_dry_run_listing(scan: &PhysioScan, log_file: Option<&Path>) -> String {
    let rule = "=".repeat(RULE_WIDTH);
    let separator = "-".repeat(RULE_WIDTH);
    let mut out = String::new();
    let _ = writeln!(out, "DRY RUN SUMMARY");
    let _ = writeln!(out, "{rule}");
    for (index, candidate) in scan.candidates.iter().enumerate() {
        let _ = writeln!(out, "{:02}. {}", index + 1, candidate.file_name());
        let _ = writeln!(out, "   raw id     : {}", candidate.raw_id);
        let _ = writeln!(out, "   anon id    : {}", candidate.anonymized_id);
        let _ = writeln!(out, "   target dir : {}", candidate.target_dir.display());
        let _ = writeln!(out, "{separator}");
    }
    let _ = writeln!(out, "Total {} files to convert", scan.candidates.len());
    if scan.skipped_count() > 0 {
        let _ = writeln!(
            out,
            "Skipped: {} without mapping, {} without anonymized id",
            scan.unmatched.len(),
            scan.missing_anonymized.len()
        );
    }
    if let Some(path) = log_file {
        let _ = writeln!(out, "Log file: {}", path.display());
    }
    let _ = writeln!(out, "Dry run complete, no conversions executed.");
    out
}

pub fn print_physio_summary(report: &PhysioRunReport, log_file: Option<&Path>) {
    if let Some(path) = log_file {
        println!("Log file: {}", path.display());
    }
    if !report.files.is_empty() {
        let mut table = Table::new();
        table.set_header(vec![
            header_cell("File"),
            header_cell("Subject"),
            header_cell("Result"),
            header_cell("Error"),
        ]);
        apply_table_style(&mut table);
        align_column(&mut table, 2, CellAlignment::Center);
        for file in &report.files {
            let error = match &file.outcome {
                StepOutcome::Failed { error } => Cell::new(error).fg(Color::Red),
                _ => dim_cell("-"),
            };
            table.add_row(vec![
                Cell::new(file.candidate.file_name()),
                Cell::new(format!("sub-{}", file.candidate.anonymized_id)),
                step_cell(&file.outcome),
                error,
            ]);
        }
        println!("{table}");
    }
    let mut totals = Table::new();
    totals.set_header(vec![header_cell("Outcome"), header_cell("Count")]);
    apply_table_style(&mut totals);
    align_column(&mut totals, 1, CellAlignment::Right);
    totals.add_row(vec![Cell::new("Converted"), count_cell(report.converted_count(), Color::Green)]);
    totals.add_row(vec![
        Cell::new("Skipped (no match)"),
        count_cell(report.skipped, Color::Yellow),
    ]);
    totals.add_row(vec![Cell::new("Errors"), count_cell(report.error_count(), Color::Red)]);
    println!("{totals}");
}

pub fn print_mapping_table(table: &MappingTable) {
    println!("Mapping: {}", table.source.display());
    println!("{}", mapping_table(table));
}

pub fn mapping_table(mapping: &MappingTable) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Row"),
        header_cell("Raw ID"),
        header_cell("Anonymized ID"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 0, CellAlignment::Right);
    for row in mapping.rows() {
        table.add_row(vec![
            dim_cell(row.row_number),
            raw_id_cell(&row.raw_id),
            if row.has_anonymized_id() {
                Cell::new(&row.anonymized_id)
            } else {
                Cell::new("missing").fg(Color::Yellow)
            },
        ]);
    }
    table
}

fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn apply_summary_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::DynamicFullWidth)
        .set_width(165);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn status_cell(status: SubjectStatus) -> Cell {
    match status {
        SubjectStatus::Converted => Cell::new("converted").fg(Color::Green),
        SubjectStatus::SkippedExisting => Cell::new("skipped").fg(Color::Cyan),
        SubjectStatus::Failed => Cell::new("FAILED")
            .fg(Color::Red)
            .add_attribute(Attribute::Bold),
    }
}

fn step_cell(outcome: &StepOutcome) -> Cell {
    match outcome {
        StepOutcome::Completed => Cell::new("✓")
            .fg(Color::Green)
            .add_attribute(Attribute::Bold),
        StepOutcome::Skipped { .. } => dim_cell("skipped"),
        StepOutcome::Failed { .. } => Cell::new("✗")
            .fg(Color::Red)
            .add_attribute(Attribute::Bold),
    }
}

fn presence_cell(present: bool) -> Cell {
    if present {
        Cell::new("✓").fg(Color::Green)
    } else {
        Cell::new("missing").fg(Color::Yellow)
    }
}

fn raw_id_cell(raw_id: &str) -> Cell {
    if raw_id.is_empty() {
        Cell::new("missing").fg(Color::Yellow)
    } else {
        Cell::new(raw_id)
    }
}

fn count_cell(count: usize, color: Color) -> Cell {
    if count > 0 {
        Cell::new(count).fg(color).add_attribute(Attribute::Bold)
    } else {
        dim_cell(count)
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
