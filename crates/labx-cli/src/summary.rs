use std::collections::BTreeSet;

use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::{UTF8_FULL, UTF8_FULL_CONDENSED};
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use labx_ingest::IngestOutcome;
use labx_map::ProfileMetadata;

use crate::types::{ExportStatus, ExportSummary};

pub fn print_ingest_summary(outcome: &IngestOutcome) {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Job"),
        header_cell("Customer"),
        header_cell("Requests"),
        header_cell("Samples"),
        header_cell("Tests"),
    ]);
    apply_summary_table_style(&mut table);
    for index in 2..5 {
        align_column(&mut table, index, CellAlignment::Right);
    }
    let mut total_samples = 0usize;
    let mut total_tests = 0usize;
    for job in &outcome.jobs {
        let requests: BTreeSet<_> = job
            .samples
            .iter()
            .filter_map(|sample| sample.request_id)
            .collect();
        total_samples += job.samples.len();
        total_tests += job.test_count();
        table.add_row(vec![
            Cell::new(&job.name)
                .fg(Color::Blue)
                .add_attribute(Attribute::Bold),
            Cell::new(job.customer_id.as_str()),
            Cell::new(requests.len()),
            Cell::new(job.samples.len()),
            count_cell(job.test_count(), Color::Green),
        ]);
    }
    table.add_row(vec![
        Cell::new("TOTAL")
            .fg(Color::Cyan)
            .add_attribute(Attribute::Bold),
        dim_cell("-"),
        Cell::new(outcome.converted.len()).add_attribute(Attribute::Bold),
        Cell::new(total_samples).add_attribute(Attribute::Bold),
        Cell::new(total_tests).add_attribute(Attribute::Bold),
    ]);
    println!("{table}");

    if !outcome.skipped.is_empty() {
        println!("Already converted: {}", join_ids(&outcome.skipped));
    }
    if !outcome.cancelled.is_empty() {
        eprintln!("Not converted (no customer chosen): {}", join_ids(&outcome.cancelled));
    }
    print_unmapped_table(outcome);
}

fn print_unmapped_table(outcome: &IngestOutcome) {
    if outcome.unmapped.is_empty() {
        return;
    }
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Customer"),
        header_cell("Analysis alias"),
        header_cell("Component alias"),
    ]);
    apply_table_style(&mut table);
    for unmapped in &outcome.unmapped {
        table.add_row(vec![
            Cell::new(unmapped.customer.as_str()),
            Cell::new(&unmapped.item.analysis_alias).fg(Color::Yellow),
            Cell::new(&unmapped.item.component_alias).fg(Color::Yellow),
        ]);
    }
    println!();
    println!("Unmapped items:");
    println!("{table}");
}

pub fn print_export_summary(summary: &ExportSummary) {
    println!("Output: {}", summary.output_dir.display());
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Job"),
        header_cell("Customer"),
        header_cell("Samples"),
        header_cell("Transaction"),
    ]);
    apply_summary_table_style(&mut table);
    align_column(&mut table, 2, CellAlignment::Right);
    for job in &summary.jobs {
        let status = match &job.status {
            ExportStatus::Written(path) => Cell::new(path.display()).fg(Color::Green),
            ExportStatus::Empty => dim_cell("nothing to send"),
            ExportStatus::NoProfile => Cell::new("no profile").fg(Color::Red),
        };
        table.add_row(vec![
            Cell::new(&job.job)
                .fg(Color::Blue)
                .add_attribute(Attribute::Bold),
            Cell::new(job.customer.as_str()),
            Cell::new(job.samples),
            status,
        ]);
    }
    println!("{table}");
}

pub fn print_customers(profiles: &[ProfileMetadata]) {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Customer"),
        header_cell("Policy"),
        header_cell("Fields"),
        header_cell("Components"),
        header_cell("Saved"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 2, CellAlignment::Right);
    align_column(&mut table, 3, CellAlignment::Right);
    for profile in profiles {
        table.add_row(vec![
            Cell::new(&profile.customer_id).add_attribute(Attribute::Bold),
            Cell::new(&profile.export_policy),
            Cell::new(profile.field_count),
            Cell::new(profile.component_count),
            profile
                .saved_at
                .as_deref()
                .map_or_else(|| dim_cell("-"), Cell::new),
        ]);
    }
    println!("{table}");
}

pub fn apply_table_style(table: &mut Table) {
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
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(140);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn count_cell(count: usize, color: Color) -> Cell {
    if count > 0 {
        Cell::new(count).fg(color)
    } else {
        dim_cell(count)
    }
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}

fn join_ids(ids: &[u64]) -> String {
    ids.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
