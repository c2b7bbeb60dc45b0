use serde::Serialize;

use crate::detect::BBox;

/// Occupancy verdict for one table, indexed 1-based in detection order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct TableStatus {
    pub table_index: usize,
    pub occupied: bool,
}

/// Per-frame occupancy summary. Rebuilt from scratch on every frame.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct OccupancyReport {
    pub tables: Vec<TableStatus>,
    pub person_count: usize,
}

impl OccupancyReport {
    pub fn occupied_indices(&self) -> Vec<usize> {
        self.tables
            .iter()
            .filter(|t| t.occupied)
            .map(|t| t.table_index)
            .collect()
    }

    pub fn occupied_count(&self) -> usize {
        self.tables.iter().filter(|t| t.occupied).count()
    }

    /// One-line summary for logs.
    pub fn summary(&self) -> String {
        format!(
            "tables={} occupied={:?} people={}",
            self.tables.len(),
            self.occupied_indices(),
            self.person_count
        )
    }
}

/// For each table, whether any seat box lies strictly inside it.
///
/// Plain quadratic scan; the first contained seat settles a table.
pub fn table_occupancy(tables: &[BBox], seats: &[BBox]) -> Vec<bool> {
    tables
        .iter()
        .map(|table| seats.iter().any(|seat| seat.is_strictly_inside(table)))
        .collect()
}

/// Build table statuses with 1-based indices in the order tables were given.
pub fn table_statuses(tables: &[BBox], seats: &[BBox]) -> Vec<TableStatus> {
    table_occupancy(tables, seats)
        .into_iter()
        .enumerate()
        .map(|(i, occupied)| TableStatus {
            table_index: i + 1,
            occupied,
        })
        .collect()
}
