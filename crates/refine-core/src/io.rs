//! CSV import/export for projects

use crate::error::{Error, Result};
use crate::table::{Cell, CellValue, Project, Row};
use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::Path;

/// Import a CSV file into a fresh project
pub fn import_csv<P: AsRef<Path>>(path: P) -> Result<Project> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| Error::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;
    import_from_reader(BufReader::new(file), path)
}

/// Import CSV data from a string (mainly for tests and fixtures)
pub fn import_csv_str(data: &str, name: &str) -> Result<Project> {
    import_from_reader(data.as_bytes(), Path::new(name))
}

fn import_from_reader<R: Read>(reader: R, path: &Path) -> Result<Project> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true) // Allow varying number of fields
        .from_reader(reader);

    let headers = csv_reader.headers().map_err(|e| Error::Csv {
        path: path.to_path_buf(),
        source: e,
    })?;

    let mut project = Project::new();
    for name in headers.iter() {
        project.add_column(name).map_err(|_| Error::CsvParse {
            path: path.to_path_buf(),
            message: format!("duplicate column '{}'", name),
        })?;
    }

    if project.column_count() == 0 {
        return Err(Error::CsvParse {
            path: path.to_path_buf(),
            message: "no columns found in CSV".to_string(),
        });
    }

    let column_count = project.column_count();
    for (row_idx, result) in csv_reader.records().enumerate() {
        let record = result.map_err(|e| Error::Csv {
            path: path.to_path_buf(),
            source: e,
        })?;

        let mut cells: Vec<Option<Cell>> = record
            .iter()
            .map(|field| match CellValue::parse(field) {
                CellValue::Empty => None,
                value => Some(Cell::new(value)),
            })
            .collect();

        // Pad with empty slots if the row is shorter than the header
        while cells.len() < column_count {
            cells.push(None);
        }

        if cells.len() > column_count {
            eprintln!(
                "Warning: row {} in {} has more cells than columns, truncating",
                row_idx + 1,
                path.display()
            );
            cells.truncate(column_count);
        }

        project.rows.push(Row::new(cells));
    }

    Ok(project)
}

/// Export a project as CSV, one field per column in cell-index order
pub fn export_csv<W: Write>(project: &Project, mut writer: W) -> Result<()> {
    let header: Vec<String> = project
        .columns
        .iter()
        .map(|c| escape_csv(&c.name))
        .collect();
    writeln!(writer, "{}", header.join(","))?;

    for row in &project.rows {
        let values: Vec<String> = project
            .columns
            .iter()
            .map(|c| {
                let value = row
                    .cell_value(c.cell_index)
                    .map(|v| v.to_string_value())
                    .unwrap_or_default();
                escape_csv(&value)
            })
            .collect();
        writeln!(writer, "{}", values.join(","))?;
    }
    Ok(())
}

/// Escape a value for CSV output
fn escape_csv(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') || s.contains('\r') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}
