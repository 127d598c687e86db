// Reads a translation table from the first worksheet of an Excel
// workbook.

use calamine::{open_workbook, Reader, Xlsx};
use snafu::{OptionExt, ResultExt};

use crate::quex::*;

pub fn read_rows(path: &str) -> QuexResult<Vec<Vec<String>>> {
    let p = path.to_string();
    let mut workbook: Xlsx<_> =
        open_workbook(p).context(OpeningExcelSnafu { path })?;
    let wrange = workbook
        .worksheet_range_at(0)
        .context(EmptyExcelSnafu {})?
        .context(OpeningExcelSnafu { path })?;

    let mut res: Vec<Vec<String>> = Vec::new();
    for (idx, row) in wrange.rows().enumerate() {
        debug!("read_rows: workbook row: {:?}", row);
        let mut cells: Vec<String> = Vec::new();
        for elt in row {
            match elt {
                calamine::DataType::String(s) => cells.push(s.clone()),
                calamine::DataType::Empty => cells.push(String::new()),
                calamine::DataType::Float(f) => cells.push(f.to_string()),
                calamine::DataType::Int(i) => cells.push(i.to_string()),
                _ => {
                    return ExcelWrongCellTypeSnafu {
                        lineno: (idx + 1) as u64,
                        content: format!("{:?}", elt),
                    }
                    .fail();
                }
            }
        }
        res.push(cells);
    }
    Ok(res)
}
