// Reading voters from Excel workbooks.

use calamine::{open_workbook, DataType, Range, Reader, Xlsx};

use crate::sim::{
    io_common::{column_index, parse_row, LoadedVoter},
    *,
};

fn get_range(path: &str, worksheet_name_o: Option<&str>) -> SimResult<Range<DataType>> {
    debug!(
        "read_excel_voters: path: {:?} worksheet: {:?}",
        path, worksheet_name_o
    );
    let mut workbook: Xlsx<_> = open_workbook(path).context(OpeningExcelSnafu { path })?;

    // A worksheet name was provided, use it.
    if let Some(name) = worksheet_name_o {
        workbook
            .worksheet_range(name)
            .context(MissingWorksheetSnafu { path, name })?
            .context(OpeningExcelSnafu { path })
    } else {
        workbook
            .worksheet_range_at(0)
            .context(EmptyExcelSnafu { path })?
            .context(OpeningExcelSnafu { path })
    }
}

fn cell_to_string(cell: &DataType) -> String {
    match cell {
        DataType::String(s) => s.clone(),
        DataType::Int(i) => i.to_string(),
        // Whole numbers are stored as floats by most spreadsheets.
        DataType::Float(f) if f.fract() == 0.0 => format!("{}", *f as i64),
        DataType::Float(f) => f.to_string(),
        DataType::Bool(b) => b.to_string(),
        DataType::Empty => "".to_string(),
        x => {
            warn!("cell_to_string: unsupported cell {:?}", x);
            "".to_string()
        }
    }
}

/// Turns the rows of a worksheet into voters. The first row is the header.
pub fn voters_from_rows<'a, I>(mut rows: I) -> SimResult<Vec<LoadedVoter>>
where
    I: Iterator<Item = &'a [DataType]>,
{
    let header: Vec<String> = match rows.next() {
        Some(h) => h.iter().map(cell_to_string).collect(),
        None => whatever!("The worksheet is empty"),
    };
    let idx = column_index(&header)?;
    let mut res: Vec<LoadedVoter> = Vec::new();
    for (i, row) in rows.enumerate() {
        let lineno = i + 2;
        let cells: Vec<String> = row.iter().map(cell_to_string).collect();
        if cells.iter().all(|c| c.trim().is_empty()) {
            debug!("voters_from_rows: skipping empty row {}", lineno);
            continue;
        }
        res.push(parse_row(lineno, &cells, &idx)?);
    }
    Ok(res)
}

pub fn read_excel_voters(path: &str, worksheet_name: Option<&str>) -> SimResult<Vec<LoadedVoter>> {
    let wrange = get_range(path, worksheet_name)?;
    voters_from_rows(wrange.rows())
}
