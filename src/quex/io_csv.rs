// Primitives for reading and writing translation tables as CSV.

use std::path::Path;

use snafu::ResultExt;

use crate::quex::*;

pub fn read_rows(path: &str) -> QuexResult<Vec<Vec<String>>> {
    let rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .context(CsvOpenSnafu {})?;
    let mut res: Vec<Vec<String>> = Vec::new();
    for (lineno, line_r) in rdr.into_records().enumerate() {
        let line = line_r.context(CsvLineParseSnafu {})?;
        debug!("read_rows: {:?} {:?}", lineno, line);
        res.push(line.iter().map(|s| s.to_string()).collect());
    }
    Ok(res)
}

pub fn write_rows(path: &Path, rows: &[Vec<String>]) -> QuexResult<()> {
    let mut wtr = csv::Writer::from_path(path).context(CsvOpenSnafu {})?;
    for row in rows {
        wtr.write_record(row).context(CsvWriteSnafu {})?;
    }
    wtr.flush().context(CsvFlushSnafu {})?;
    Ok(())
}
