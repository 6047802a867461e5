//! Table view engine: sort, filter and paginate clinical records for display.
//!
//! Views are recomputed from `(records, filter_text, current_page)` on every
//! request; nothing here is cached or mutated in place.

use historias_common::ClinicalRecord;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;

/// Rows shown per page.
pub const PAGE_SIZE: usize = 10;

/// Render-ready projection of one page of the record table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableView {
    pub rows: Vec<ClinicalRecord>,
    pub page: usize,
    pub total_pages: usize,
    /// 1-based position of the first row on this page, 0 when the page is empty.
    pub range_start: usize,
    pub range_end: usize,
    pub filtered_count: usize,
}

impl TableView {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Sort, filter and slice `records` for `current_page`.
///
/// Pages outside `[1, total_pages]` yield an empty row set; callers that want
/// clamping go through [`ViewState::view`].
pub fn render(records: &[ClinicalRecord], filter_text: &str, current_page: usize) -> TableView {
    let filtered = sorted_matches(records, filter_text);
    paginate(&filtered, current_page)
}

pub fn total_pages(filtered_count: usize) -> usize {
    filtered_count.div_ceil(PAGE_SIZE)
}

/// Records matching `filter_text`, most recent consultation first.
///
/// The sort is stable. Records whose `fechaConsulta` does not parse are kept
/// and placed after every dated record, in their original relative order.
pub fn sorted_matches<'a>(records: &'a [ClinicalRecord], filter_text: &str) -> Vec<&'a ClinicalRecord> {
    let needle = filter_text.to_lowercase();
    let mut matches: Vec<&ClinicalRecord> = records
        .iter()
        .filter(|r| matches_filter(r, &needle))
        .collect();
    matches.sort_by_cached_key(|r| Reverse(r.consulted_at()));
    matches
}

/// OR over nombre, edad, diagnostico and the raw fechaConsulta. `needle` must be lowercase.
pub fn matches_filter(record: &ClinicalRecord, needle: &str) -> bool {
    if needle.is_empty() {
        return true;
    }
    record.nombre.to_lowercase().contains(needle)
        || record.edad.is_some_and(|e| e.to_string().contains(needle))
        || record.diagnostico.to_lowercase().contains(needle)
        || record.fecha_consulta.to_lowercase().contains(needle)
}

fn paginate(filtered: &[&ClinicalRecord], current_page: usize) -> TableView {
    let page = current_page.max(1);
    let start = (page - 1).saturating_mul(PAGE_SIZE);
    let rows: Vec<ClinicalRecord> = filtered
        .iter()
        .skip(start)
        .take(PAGE_SIZE)
        .map(|r| (*r).clone())
        .collect();

    let (range_start, range_end) = if rows.is_empty() {
        (0, 0)
    } else {
        (start + 1, start + rows.len())
    };

    TableView {
        rows,
        page,
        total_pages: total_pages(filtered.len()),
        range_start,
        range_end,
        filtered_count: filtered.len(),
    }
}

// ---------------------------------------------------------------------------
// View state
// ---------------------------------------------------------------------------

/// Filter text and page of one table instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewState {
    pub filter_text: String,
    pub current_page: usize,
}

impl Default for ViewState {
    fn default() -> Self {
        Self { filter_text: String::new(), current_page: 1 }
    }
}

impl ViewState {
    pub fn new(filter_text: impl Into<String>, current_page: usize) -> Self {
        Self { filter_text: filter_text.into(), current_page: current_page.max(1) }
    }

    /// New filter text; going back to page 1 whenever the text changes.
    pub fn with_filter(self, filter_text: impl Into<String>) -> Self {
        let filter_text = filter_text.into();
        if filter_text == self.filter_text {
            return self;
        }
        Self { filter_text, current_page: 1 }
    }

    pub fn clamped(self, total_pages: usize) -> Self {
        let current_page = self.current_page.clamp(1, total_pages.max(1));
        Self { current_page, ..self }
    }

    pub fn next_page(self, total_pages: usize) -> Self {
        if self.current_page < total_pages {
            Self { current_page: self.current_page + 1, ..self }
        } else {
            self
        }
    }

    pub fn previous_page(self) -> Self {
        if self.current_page > 1 {
            Self { current_page: self.current_page - 1, ..self }
        } else {
            self
        }
    }

    /// Clamp the page against the filtered set, then render it.
    pub fn view(self, records: &[ClinicalRecord]) -> (Self, TableView) {
        let filtered = sorted_matches(records, &self.filter_text);
        let state = self.clamped(total_pages(filtered.len()));
        let view = paginate(&filtered, state.current_page);
        (state, view)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use historias_test_utils::{numbered_records, record};
    use pretty_assertions::assert_eq;

    fn ana_beto() -> Vec<ClinicalRecord> {
        vec![
            record("HC-001", "Ana", 34, "Migraña", "2024-01-05"),
            record("HC-002", "Beto", 51, "Hipertensión", "2024-03-01"),
        ]
    }

    fn names(view: &TableView) -> Vec<&str> {
        view.rows.iter().map(|r| r.nombre.as_str()).collect()
    }

    #[test]
    fn test_most_recent_first() {
        let view = render(&ana_beto(), "", 1);
        assert_eq!(names(&view), vec!["Beto", "Ana"]);
        assert_eq!(view.total_pages, 1);
        assert_eq!((view.range_start, view.range_end), (1, 2));
    }

    #[test]
    fn test_filter_is_case_insensitive() {
        let view = render(&ana_beto(), "ana", 1);
        assert_eq!(names(&view), vec!["Ana"]);
        let view = render(&ana_beto(), "HIPER", 1);
        assert_eq!(names(&view), vec!["Beto"]);
    }

    #[test]
    fn test_filter_matches_age_and_raw_date() {
        let records = ana_beto();
        assert_eq!(names(&render(&records, "51", 1)), vec!["Beto"]);
        assert_eq!(names(&render(&records, "2024-01", 1)), vec!["Ana"]);
    }

    #[test]
    fn test_record_without_age_is_listed_but_not_matched_by_age() {
        let mut records = ana_beto();
        records[1].edad = None;
        assert_eq!(render(&records, "", 1).filtered_count, 2);
        assert!(render(&records, "51", 1).is_empty());
        assert_eq!(names(&render(&records, "beto", 1)), vec!["Beto"]);
    }

    #[test]
    fn test_filter_does_not_search_other_fields() {
        // cedula and eps are not part of the searched fields
        let view = render(&ana_beto(), "sura", 1);
        assert!(view.is_empty());
    }

    #[test]
    fn test_no_results() {
        let view = render(&ana_beto(), "zzz", 1);
        assert!(view.rows.is_empty());
        assert_eq!(view.total_pages, 0);
        assert_eq!(view.filtered_count, 0);
        assert_eq!((view.range_start, view.range_end), (0, 0));
    }

    #[test]
    fn test_third_page_of_twenty_five() {
        let records = numbered_records(25);
        let view = render(&records, "", 3);
        assert_eq!(view.rows.len(), 5);
        assert_eq!(view.total_pages, 3);
        assert_eq!((view.range_start, view.range_end), (21, 25));
    }

    #[test]
    fn test_every_full_page_has_ten_rows() {
        let records = numbered_records(37);
        let total = render(&records, "", 1).total_pages;
        assert_eq!(total, 4);
        for page in 1..=total {
            let view = render(&records, "", page);
            let expected = if page == total { 7 } else { PAGE_SIZE };
            assert_eq!(view.rows.len(), expected, "page {}", page);
        }
    }

    #[test]
    fn test_out_of_range_page_is_empty_not_panic() {
        let records = numbered_records(5);
        assert!(render(&records, "", 9).rows.is_empty());
        assert!(render(&records, "", usize::MAX).rows.is_empty());
        // page 0 is read as page 1
        assert_eq!(render(&records, "", 0).rows.len(), 5);
    }

    #[test]
    fn test_sort_monotonic_across_pages() {
        let mut records = numbered_records(30);
        records.reverse();
        records.swap(3, 17);
        let mut dates = Vec::new();
        for page in 1..=3 {
            dates.extend(render(&records, "", page).rows.iter().map(|r| r.consulted_at()));
        }
        assert_eq!(dates.len(), 30);
        assert!(dates.windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn test_sort_is_stable_for_equal_dates() {
        let records = vec![
            record("HC-001", "Primero", 30, "A", "2024-02-02"),
            record("HC-002", "Segundo", 30, "B", "2024-02-02"),
            record("HC-003", "Tercero", 30, "C", "2024-02-02"),
        ];
        assert_eq!(names(&render(&records, "", 1)), vec!["Primero", "Segundo", "Tercero"]);
    }

    #[test]
    fn test_unparsable_dates_sort_last_in_input_order() {
        let records = vec![
            record("HC-001", "SinFecha1", 30, "A", "pendiente"),
            record("HC-002", "Viejo", 30, "B", "2023-01-01"),
            record("HC-003", "SinFecha2", 30, "C", ""),
            record("HC-004", "Nuevo", 30, "D", "2024-06-01T09:00:00Z"),
        ];
        assert_eq!(
            names(&render(&records, "", 1)),
            vec!["Nuevo", "Viejo", "SinFecha1", "SinFecha2"]
        );
    }

    #[test]
    fn test_every_filtered_row_contains_needle() {
        let mut records = numbered_records(40);
        records.push(record("HC-041", "María Ángela", 3, "Asma", "2024-04-04"));
        for needle in ["1", "paciente 2", "ÁNGELA", "asma", "2024-02"] {
            let lower = needle.to_lowercase();
            for page in 1..=5 {
                for row in render(&records, needle, page).rows {
                    assert!(matches_filter(&row, &lower), "{} should match {}", row.nombre, needle);
                }
            }
        }
    }

    #[test]
    fn test_changing_filter_resets_page() {
        let state = ViewState::new("", 3).with_filter("ana");
        assert_eq!(state.current_page, 1);
        let same = ViewState::new("ana", 3).with_filter("ana");
        assert_eq!(same.current_page, 3);
    }

    #[test]
    fn test_view_clamps_page() {
        let records = numbered_records(25);
        let (state, view) = ViewState::new("", 8).view(&records);
        assert_eq!(state.current_page, 3);
        assert_eq!(view.rows.len(), 5);

        let (state, view) = ViewState::new("zzz", 4).view(&records);
        assert_eq!(state.current_page, 1);
        assert!(view.is_empty());
    }

    #[test]
    fn test_page_navigation_bounds() {
        let state = ViewState::new("", 1).previous_page();
        assert_eq!(state.current_page, 1);
        let state = state.next_page(2).next_page(2);
        assert_eq!(state.current_page, 2);
        assert_eq!(state.previous_page().current_page, 1);
    }
}
