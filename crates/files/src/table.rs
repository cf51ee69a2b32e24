//! Tab-separated table concatenation.
//!
//! Every table has a header row and an index in its first column. Combining
//! drops the per-file indices, takes the union of all columns in sorted
//! order, and numbers the merged rows from zero. Cells a table does not have
//! are left empty.
//!
//! Cells may be wrapped in double quotes, with `""` standing for a literal
//! quote, so they can hold tabs. A quoted cell cannot span lines.

use crate::error::{FilesError, Result};
use crate::extensions::Extensions;
use crate::listing::list_files;
use std::collections::{BTreeSet, HashMap};
use std::ffi::OsString;
use std::path::{Component, Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, warn};

const SEPARATOR: char = '\t';
const QUOTE: char = '"';

/// A parsed table without its index column.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    /// Column names in file order
    pub columns: Vec<String>,
    /// Rows keyed by column name
    pub rows: Vec<HashMap<String, String>>,
}

impl Table {
    /// Parse tab-separated text. `path` is only used in errors.
    pub fn parse(text: &str, path: &Path) -> Result<Self> {
        let mut lines = text.lines().enumerate().filter(|(_, l)| !l.trim().is_empty());

        let (_, header) = lines
            .next()
            .ok_or_else(|| FilesError::MissingHeader(path.to_path_buf()))?;
        let columns: Vec<String> = split_row(header).into_iter().skip(1).collect();

        let mut rows = Vec::new();
        for (n, line) in lines {
            let cells: Vec<String> = split_row(line).into_iter().skip(1).collect();
            if cells.len() > columns.len() {
                return Err(FilesError::Malformed {
                    path: path.to_path_buf(),
                    line: n + 1,
                    expected: columns.len() + 1,
                    found: cells.len() + 1,
                });
            }
            rows.push(
                columns
                    .iter()
                    .cloned()
                    .zip(cells)
                    .collect(),
            );
        }

        Ok(Self { columns, rows })
    }

    /// Append the rows of `tables`, aligning columns by name.
    pub fn concat(tables: impl IntoIterator<Item = Table>) -> Self {
        let mut columns = BTreeSet::new();
        let mut rows = Vec::new();
        for table in tables {
            columns.extend(table.columns);
            rows.extend(table.rows);
        }
        Self {
            columns: columns.into_iter().collect(),
            rows,
        }
    }

    /// Render with an empty-named index column numbering rows from zero.
    pub fn to_tsv(&self) -> String {
        let mut out = String::new();
        for column in &self.columns {
            out.push(SEPARATOR);
            push_cell(&mut out, column);
        }
        out.push('\n');

        for (index, row) in self.rows.iter().enumerate() {
            out.push_str(&index.to_string());
            for column in &self.columns {
                out.push(SEPARATOR);
                if let Some(cell) = row.get(column) {
                    push_cell(&mut out, cell);
                }
            }
            out.push('\n');
        }
        out
    }
}

/// Split one line into cells, removing the quotes around quoted cells.
fn split_row(line: &str) -> Vec<String> {
    let mut cells = Vec::new();
    let mut cell = String::new();
    let mut chars = line.chars().peekable();
    let mut quoted = false;
    let mut at_start = true;

    while let Some(c) = chars.next() {
        match c {
            QUOTE if quoted && chars.peek() == Some(&QUOTE) => {
                chars.next();
                cell.push(QUOTE);
            }
            QUOTE if quoted => quoted = false,
            QUOTE if at_start => quoted = true,
            SEPARATOR if !quoted => {
                cells.push(std::mem::take(&mut cell));
                at_start = true;
                continue;
            }
            other => cell.push(other),
        }
        at_start = false;
    }
    cells.push(cell);
    cells
}

/// Append `cell`, quoting it when it holds a separator, quote or line break.
fn push_cell(out: &mut String, cell: &str) {
    if cell.contains([SEPARATOR, QUOTE, '\n', '\r']) {
        out.push(QUOTE);
        out.push_str(&cell.replace(QUOTE, "\"\""));
        out.push(QUOTE);
    } else {
        out.push_str(cell);
    }
}

/// Where [`combine_tables`] writes its result: the folder path with `.csv`
/// appended, next to the folder.
///
/// Returns `None` when the path does not end in a folder name, as with `.`,
/// `..` or `/`.
pub fn combined_path(dir: &Path) -> Option<PathBuf> {
    let trimmed: PathBuf = dir.components().collect();
    if !matches!(trimmed.components().next_back(), Some(Component::Normal(_))) {
        return None;
    }
    let mut name = OsString::from(trimmed.as_os_str());
    name.push(".csv");
    Some(PathBuf::from(name))
}

async fn output_path(dir: &Path) -> Result<PathBuf> {
    if let Some(path) = combined_path(dir) {
        return Ok(path);
    }
    let resolved = fs::canonicalize(dir).await.map_err(FilesError::io(dir))?;
    combined_path(&resolved).ok_or_else(|| FilesError::NoFolderName(dir.to_path_buf()))
}

/// Concatenate every `.csv` table found under `dir` (recursively) into
/// `<dir>.csv`.
///
/// Returns the written path, or `None` when `dir` does not exist.
pub async fn combine_tables(dir: impl AsRef<Path>, print_progress: bool) -> Result<Option<PathBuf>> {
    let dir = dir.as_ref();
    if fs::metadata(dir).await.is_err() {
        warn!(dir = %dir.display(), "Nothing to combine, folder does not exist");
        return Ok(None);
    }

    let output = output_path(dir).await?;
    let files = list_files(dir, &Extensions::new(["csv"])).await?;
    if files.is_empty() {
        return Err(FilesError::NoTables(dir.to_path_buf()));
    }

    if print_progress {
        info!("Combining files started...");
    }
    let total = files.len();
    let mut tables = Vec::with_capacity(total);
    for (i, rel) in files.iter().enumerate() {
        let path = dir.join(rel);
        let text = fs::read_to_string(&path).await.map_err(FilesError::io(&path))?;
        tables.push(Table::parse(&text, &path)?);
        if print_progress {
            info!("{} out of {} is done", i + 1, total);
        }
    }

    let combined = Table::concat(tables);
    fs::write(&output, combined.to_tsv())
        .await
        .map_err(FilesError::io(&output))?;
    debug!(
        output = %output.display(),
        tables = total,
        rows = combined.rows.len(),
        "Combined tables"
    );
    if print_progress {
        info!("Combining files finished");
    }

    Ok(Some(output))
}
