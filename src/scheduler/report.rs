//! Tabular optimisation report (spec.md §4.7).

use prettytable::{format, row, Table};
use serde::{Deserialize, Serialize};

/// Kind of event a `ReportRecord` documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecordKind {
    Init,
    Accept,
    Cool,
    Done,
}

impl RecordKind {
    fn as_str(&self) -> &'static str {
        match self {
            RecordKind::Init => "init",
            RecordKind::Accept => "accept",
            RecordKind::Cool => "cool",
            RecordKind::Done => "done",
        }
    }
}

/// One row of the optimisation report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportRecord {
    pub iteration: u64,
    pub temperature: f64,
    pub energy: f64,
    pub kind: RecordKind,
}

/// An ordered sequence of records appended on every accepted move and every
/// cooling step, plus a flag noting a cooperative abort.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Report {
    pub records: Vec<ReportRecord>,
    pub cancelled: bool,
}

impl Report {
    pub fn new() -> Self {
        Report::default()
    }

    pub fn push(&mut self, iteration: u64, temperature: f64, energy: f64, kind: RecordKind) {
        self.records.push(ReportRecord {
            iteration,
            temperature,
            energy,
            kind,
        });
    }

    /// Renders the report as a `prettytable-rs` table, matching the
    /// teacher's tabular dump convention (`scheduler/slotset.rs`).
    pub fn to_table(&self) -> Table {
        let mut table = Table::new();
        table.set_format(*format::consts::FORMAT_NO_LINESEP_WITH_TITLE);
        table.set_titles(row!["iteration", "temperature", "energy", "kind"]);
        for record in &self.records {
            table.add_row(row![
                record.iteration,
                format!("{:.6}", record.temperature),
                format!("{:.6}", record.energy),
                record.kind.as_str(),
            ]);
        }
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_preserves_insertion_order() {
        let mut report = Report::new();
        report.push(0, 10.0, 5.0, RecordKind::Init);
        report.push(1, 9.0, 4.0, RecordKind::Accept);
        report.push(1, 8.1, 4.0, RecordKind::Cool);
        assert_eq!(report.records.len(), 3);
        assert_eq!(report.records[0].kind, RecordKind::Init);
        assert_eq!(report.records.last().unwrap().kind, RecordKind::Cool);
    }

    #[test]
    fn serialises_round_trip_through_json() {
        let mut report = Report::new();
        report.push(0, 1.0, 2.0, RecordKind::Done);
        let json = serde_json::to_string(&report).unwrap();
        let back: Report = serde_json::from_str(&json).unwrap();
        assert_eq!(back.records.len(), 1);
    }
}
