//! Fitment tables.
//!
//! The first row of each table is read as a header and mapped to fitment
//! fields by name. Tables whose headers do not cover year, make, and model
//! are not fitment tables and are skipped whole; every qualifying table on
//! the page contributes rows.

use scraper::{ElementRef, Html, Selector};

use fitdex_core::application::collapse_whitespace;
use fitdex_core::{Origin, VehicleApplication};

use crate::error::StrategyError;
use crate::patterns::parse_year_token;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Year,
    Make,
    Model,
    Trim,
    Engine,
}

fn header_field(text: &str) -> Option<Field> {
    match text.trim().to_lowercase().as_str() {
        "year" | "years" | "year range" | "model year" | "model years" => Some(Field::Year),
        "make" | "brand" | "manufacturer" => Some(Field::Make),
        "model" => Some(Field::Model),
        "trim" | "submodel" | "sub-model" => Some(Field::Trim),
        "engine" | "engine size" => Some(Field::Engine),
        _ => None,
    }
}

fn cell_text(cell: ElementRef<'_>) -> String {
    collapse_whitespace(&cell.text().collect::<Vec<_>>().join(" "))
}

/// # Errors
///
/// Does not fail on malformed markup; the parser repairs what it can and
/// rows missing a year, make, or model value are skipped.
pub fn extract(raw_content: &str) -> Result<Vec<VehicleApplication>, StrategyError> {
    let document = Html::parse_document(raw_content);
    let table_sel = Selector::parse("table").expect("valid selector");
    let row_sel = Selector::parse("tr").expect("valid selector");
    let cell_sel = Selector::parse("td, th").expect("valid selector");

    let mut applications = Vec::new();
    let mut tables_read = 0usize;
    for table in document.select(&table_sel) {
        let mut rows = table.select(&row_sel);
        let Some(header_row) = rows.next() else { continue };
        let columns: Vec<Option<Field>> = header_row
            .select(&cell_sel)
            .map(|cell| header_field(&cell_text(cell)))
            .collect();

        let has = |field: Field| columns.contains(&Some(field));
        if !(has(Field::Year) && has(Field::Make) && has(Field::Model)) {
            continue;
        }
        tables_read += 1;

        for row in rows {
            let cells: Vec<String> = row.select(&cell_sel).map(cell_text).collect();
            if let Some(app) = row_to_application(&columns, &cells) {
                applications.push(app);
            }
        }
    }
    tracing::debug!(
        tables = tables_read,
        records = applications.len(),
        "table extraction finished"
    );
    Ok(applications)
}

fn row_to_application(columns: &[Option<Field>], cells: &[String]) -> Option<VehicleApplication> {
    let mut years = None;
    let mut make = None;
    let mut model = None;
    let mut trim = None;
    let mut engine = None;

    for (field, cell) in columns.iter().zip(cells.iter()) {
        let Some(field) = field else { continue };
        if cell.is_empty() {
            continue;
        }
        match field {
            Field::Year => years = parse_year_token(cell),
            Field::Make => make = Some(cell.clone()),
            Field::Model => model = Some(cell.clone()),
            Field::Trim => trim = Some(cell.clone()),
            Field::Engine => engine = Some(cell.clone()),
        }
    }

    let (year_start, year_end) = years?;
    Some(VehicleApplication {
        make: make?,
        model: model?,
        year_start,
        year_end,
        trim,
        engine,
        origin: Origin::Official,
        confidence: 0.0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_mapped_table_yields_rows() {
        let html = r"<table>
            <tr><th>Year</th><th>Make</th><th>Model</th><th>Trim</th></tr>
            <tr><td>2016-2021</td><td>Honda</td><td>Civic</td><td>Si</td></tr>
            <tr><td>2019</td><td>Acura</td><td>ILX</td><td></td></tr>
        </table>";
        let apps = extract(html).unwrap();
        assert_eq!(apps.len(), 2);
        assert_eq!(apps[0].trim.as_deref(), Some("Si"));
        assert_eq!((apps[0].year_start, apps[0].year_end), (2016, 2021));
        assert!(apps[1].trim.is_none());
        assert_eq!((apps[1].year_start, apps[1].year_end), (2019, 2019));
    }

    #[test]
    fn synonym_headers_and_extra_columns() {
        let html = r"<table>
            <tr><th>Part #</th><th>Years</th><th>Brand</th><th>Model</th><th>Engine</th></tr>
            <tr><td>HB145</td><td>2005-2015</td><td>Toyota</td><td>Tacoma</td><td>4.0L V6</td></tr>
        </table>";
        let apps = extract(html).unwrap();
        assert_eq!(apps.len(), 1);
        assert_eq!(apps[0].make, "Toyota");
        assert_eq!(apps[0].engine.as_deref(), Some("4.0L V6"));
    }

    #[test]
    fn non_fitment_table_is_skipped() {
        let html = r"<table>
            <tr><th>Spec</th><th>Value</th></tr>
            <tr><td>Weight</td><td>4.2 lb</td></tr>
        </table>";
        let apps = extract(html).unwrap();
        assert!(apps.is_empty());
    }

    #[test]
    fn all_qualifying_tables_contribute() {
        let html = r"
        <table><tr><th>Spec</th><th>Value</th></tr><tr><td>Color</td><td>Red</td></tr></table>
        <table>
            <tr><th>Year</th><th>Make</th><th>Model</th></tr>
            <tr><td>2010-2015</td><td>Ford</td><td>F150</td></tr>
        </table>
        <table>
            <tr><th>Year</th><th>Make</th><th>Model</th></tr>
            <tr><td>2016</td><td>Ford</td><td>Mustang</td></tr>
        </table>";
        let apps = extract(html).unwrap();
        assert_eq!(apps.len(), 2);
        assert_eq!(apps[1].model, "Mustang");
    }

    #[test]
    fn row_with_unparsable_year_is_skipped() {
        let html = r"<table>
            <tr><th>Year</th><th>Make</th><th>Model</th></tr>
            <tr><td>all years</td><td>Honda</td><td>Civic</td></tr>
            <tr><td>2016</td><td>Honda</td><td>Civic</td></tr>
        </table>";
        let apps = extract(html).unwrap();
        assert_eq!(apps.len(), 1);
    }

    #[test]
    fn unclosed_tags_still_parse() {
        let html = r"<table>
            <tr><th>Year<th>Make<th>Model
            <tr><td>2016<td>Honda<td>Civic";
        let apps = extract(html).unwrap();
        assert_eq!(apps.len(), 1);
        assert_eq!(apps[0].model, "Civic");
    }
}
