//! Read-only reporting projection over the ledger: per-day aggregates and
//! CSV export. No invariants of its own.

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::model::{Identity, Machine, Reservation};

use super::conflict::now_local;
use super::error::EngineError;
use super::Engine;

/// Aggregated booking counts for one date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyStats {
    pub date: NaiveDate,
    pub total: usize,
    /// Count per start hour.
    pub by_hour: BTreeMap<u8, usize>,
    /// Count per machine building; machines removed since booking attribute
    /// to the empty string.
    pub by_building: BTreeMap<String, usize>,
}

/// Export selection. An exact `date` wins over the `from`/`to` range; an
/// empty filter exports everything.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExportFilter {
    pub date: Option<NaiveDate>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub building: Option<String>,
}

impl ExportFilter {
    fn matches_date(&self, date: NaiveDate) -> bool {
        if let Some(exact) = self.date {
            return date == exact;
        }
        if let Some(from) = self.from
            && date < from
        {
            return false;
        }
        if let Some(to) = self.to
            && date > to
        {
            return false;
        }
        true
    }
}

const CSV_HEADER: &str = "id,userId,machineId,machineName,building,floor,date,start,end";

/// Quote a CSV field if it contains a separator, quote, or newline.
fn csv_field(raw: &str) -> String {
    if raw.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", raw.replace('"', "\"\""))
    } else {
        raw.to_string()
    }
}

impl Engine {
    /// Booking counts for `date` (default today), grouped by start hour and
    /// by building.
    pub fn stats(
        &self,
        caller: &Identity,
        date: Option<NaiveDate>,
    ) -> Result<DailyStats, EngineError> {
        Self::require_admin(caller)?;
        let date = date.unwrap_or_else(|| now_local().date());
        let rows = self.store.reservations.find(|r| r.date == date);
        let machines = self.machine_index(&rows);

        let mut by_hour: BTreeMap<u8, usize> = BTreeMap::new();
        let mut by_building: BTreeMap<String, usize> = BTreeMap::new();
        for r in &rows {
            *by_hour.entry(r.span.start).or_default() += 1;
            let building = machines
                .get(&r.machine_id)
                .map(|m| m.building.clone())
                .unwrap_or_default();
            *by_building.entry(building).or_default() += 1;
        }

        Ok(DailyStats {
            date,
            total: rows.len(),
            by_hour,
            by_building,
        })
    }

    /// Serialize matching reservations as CSV. UTF-8 with a byte-order mark
    /// so spreadsheet tools pick the encoding up; one header row, one row
    /// per reservation ordered by date then start hour.
    pub fn export_csv(
        &self,
        caller: &Identity,
        filter: &ExportFilter,
    ) -> Result<String, EngineError> {
        Self::require_admin(caller)?;
        let mut rows = self
            .store
            .reservations
            .find(|r| filter.matches_date(r.date));
        rows.sort_by_key(|r| (r.date, r.span.start, r.id));
        let machines = self.machine_index(&rows);

        if let Some(building) = &filter.building {
            rows.retain(|r| {
                machines
                    .get(&r.machine_id)
                    .is_some_and(|m| &m.building == building)
            });
        }

        let mut out = String::from("\u{feff}");
        out.push_str(CSV_HEADER);
        out.push('\n');
        for r in &rows {
            let (building, floor) = machines
                .get(&r.machine_id)
                .map(|m| (m.building.as_str(), m.floor.as_str()))
                .unwrap_or(("", ""));
            out.push_str(&format!(
                "{},{},{},{},{},{},{},{},{}\n",
                r.id,
                r.user_id,
                r.machine_id,
                csv_field(&r.machine_name),
                csv_field(building),
                csv_field(floor),
                r.date,
                r.span.start_label(),
                r.span.end_label(),
            ));
        }
        Ok(out)
    }

    /// Machine lookup for the machines referenced by a set of reservations.
    fn machine_index(&self, rows: &[Reservation]) -> HashMap<i64, Machine> {
        rows.iter()
            .filter_map(|r| self.store.machines.get(r.machine_id))
            .map(|m| (m.id, m))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csv_field_quoting() {
        assert_eq!(csv_field("A-01"), "A-01");
        assert_eq!(csv_field("laundry, west wing"), "\"laundry, west wing\"");
        assert_eq!(csv_field("say \"hi\""), "\"say \"\"hi\"\"\"");
    }

    #[test]
    fn filter_exact_date_wins_over_range() {
        let may1 = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let may2 = NaiveDate::from_ymd_opt(2024, 5, 2).unwrap();
        let filter = ExportFilter {
            date: Some(may1),
            from: Some(may2),
            to: Some(may2),
            building: None,
        };
        assert!(filter.matches_date(may1));
        assert!(!filter.matches_date(may2));
    }

    #[test]
    fn filter_range_bounds_inclusive() {
        let filter = ExportFilter {
            date: None,
            from: NaiveDate::from_ymd_opt(2024, 5, 1),
            to: NaiveDate::from_ymd_opt(2024, 5, 3),
            building: None,
        };
        assert!(filter.matches_date(NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()));
        assert!(filter.matches_date(NaiveDate::from_ymd_opt(2024, 5, 3).unwrap()));
        assert!(!filter.matches_date(NaiveDate::from_ymd_opt(2024, 4, 30).unwrap()));
        assert!(!filter.matches_date(NaiveDate::from_ymd_opt(2024, 5, 4).unwrap()));
    }

    #[test]
    fn empty_filter_matches_everything() {
        let filter = ExportFilter::default();
        assert!(filter.matches_date(NaiveDate::from_ymd_opt(2020, 1, 1).unwrap()));
    }
}
