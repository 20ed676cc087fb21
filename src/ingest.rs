//! CSV ingestion.
//!
//! The [`Ingestor`] drives the external RFC-4180 parser (the `csv` crate)
//! and folds decoded records into a [`GraphBuilder`]:
//!
//! - a record whose first cell begins with `#` is a comment and is dropped;
//! - a record whose first cell begins with `@` opens a new (sub)table: the
//!   rest of that cell names the result variable, the remaining cells name
//!   the premise variables in column order;
//! - any other record is a row of the current table: the first cell is the
//!   result value, the remaining cells are premise values, and an empty
//!   premise cell means "this premise does not matter".
//!
//! Header state persists across input files, so a continuation file may add
//! rows to the last table of the previous one.

use crate::error::{Error, Result};
use crate::table::{AddInference, GraphBuilder, NameId, ValId};
use std::rc::Rc;

/// Folds CSV records from one or more files into a fact-graph builder.
#[derive(Default)]
pub struct Ingestor {
    builder: GraphBuilder,
    header: Vec<NameId>,
}

impl Ingestor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ingest one file's bytes. Stops at the first malformed record.
    pub fn ingest(&mut self, path: &str, data: &[u8]) -> Result<()> {
        let file: Rc<str> = Rc::from(path);
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(data);

        let mut row: u32 = 0;
        for record in rdr.byte_records() {
            row += 1;
            let record = record.map_err(|source| Error::CsvSyntax {
                file: path.to_string(),
                source,
            })?;
            self.record(&file, row, &record)?;
        }
        Ok(())
    }

    fn record(&mut self, file: &Rc<str>, row: u32, record: &csv::ByteRecord) -> Result<()> {
        let first = record.get(0).unwrap_or(b"");
        if first.starts_with(b"#") {
            return Ok(());
        }
        if first.starts_with(b"@") {
            return self.header_record(file, row, record);
        }
        self.data_record(file, row, record)
    }

    fn header_record(&mut self, file: &Rc<str>, row: u32, record: &csv::ByteRecord) -> Result<()> {
        self.header.clear();
        for (c, cell) in record.iter().enumerate() {
            let bytes = if c == 0 { &cell[1..] } else { cell };
            if bytes.is_empty() {
                return Err(Error::EmptyHeaderName {
                    file: file.to_string(),
                    row,
                    col: c as u32 + 1,
                });
            }
            let name = self.builder.name(bytes);
            if self.header.contains(&name) {
                return Err(Error::DuplicateColumn {
                    file: file.to_string(),
                    row,
                    col: c as u32 + 1,
                    name: String::from_utf8_lossy(bytes).into_owned(),
                });
            }
            self.header.push(name);
        }
        Ok(())
    }

    fn data_record(&mut self, file: &Rc<str>, row: u32, record: &csv::ByteRecord) -> Result<()> {
        if self.header.is_empty() {
            return Err(Error::RowOutsideTable {
                file: file.to_string(),
                row,
            });
        }
        let mut result: Option<ValId> = None;
        let mut premises = Vec::new();
        for (c, cell) in record.iter().enumerate() {
            if cell.is_empty() {
                if c == 0 {
                    return Err(Error::EmptyResult {
                        file: file.to_string(),
                        row,
                    });
                }
                continue; // don't care
            }
            if c >= self.header.len() {
                return Err(Error::RowOverflow {
                    file: file.to_string(),
                    row,
                    col: c as u32 + 1,
                });
            }
            let val = self.builder.value(self.header[c], cell);
            if c == 0 {
                result = Some(val);
            } else {
                premises.push(val);
            }
        }
        if let Some(result) = result {
            match self
                .builder
                .add_inference(result, premises, file.clone(), row)
            {
                AddInference::Added => {}
                AddInference::Duplicate {
                    file: prior_file,
                    row: prior_row,
                } => {
                    return Err(Error::DuplicateInference {
                        file: file.to_string(),
                        row,
                        prior_file: prior_file.to_string(),
                        prior_row,
                    });
                }
            }
        }
        Ok(())
    }

    /// Hand back the accumulated builder.
    pub fn finish(self) -> GraphBuilder {
        self.builder
    }
}
