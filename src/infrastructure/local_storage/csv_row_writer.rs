// Copyright 2026 Google LLC
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Delimited record writer for exported tables.
//!
//! Quoting follows standard CSV rules whatever the delimiter: a field is
//! wrapped in quotes when it contains the active delimiter, a quote or a line
//! break, and embedded quotes are doubled. Every field is trimmed first.
//! A record made of a single empty field is written as a bare line break.

use crate::domain::entities::{Delimiter, FieldValue};
use crate::domain::errors::{ExportError, Result};
use csv::{QuoteStyle, WriterBuilder};
use std::borrow::Cow;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

const RECORD_TERMINATOR: &[u8] = b"\n";
const RECORD_BUFFER_BYTES: usize = 1024;

/// Streams a header and data rows into any byte sink.
pub struct CsvRowWriter<W: Write> {
    sink: W,
    encoder: WriterBuilder,
    /// Encoded bytes of the record being written.
    record: Vec<u8>,
}

impl CsvRowWriter<BufWriter<File>> {
    /// Creates (or truncates) `path` and writes to it through a buffer.
    pub fn create(path: &Path, delimiter: Delimiter) -> Result<Self> {
        let file = File::create(path).map_err(|e| {
            ExportError::WriteError(format!("cannot create {}: {}", path.display(), e))
        })?;
        Ok(Self::new(BufWriter::with_capacity(128 * 1024, file), delimiter))
    }
}

impl<W: Write> CsvRowWriter<W> {
    pub fn new(sink: W, delimiter: Delimiter) -> Self {
        let mut encoder = WriterBuilder::new();
        encoder
            .delimiter(delimiter.as_byte())
            .quote_style(QuoteStyle::Necessary)
            .buffer_capacity(RECORD_BUFFER_BYTES);
        Self {
            sink,
            encoder,
            record: Vec::with_capacity(RECORD_BUFFER_BYTES),
        }
    }

    /// Writes the header record, with `extra` as a trailing column name.
    pub fn write_header(&mut self, names: &[String], extra: Option<&str>) -> Result<()> {
        let mut fields: Vec<&str> = names.iter().map(|n| n.trim()).collect();
        if let Some(extra) = extra {
            fields.push(extra.trim());
        }
        self.write_fields(&fields)
    }

    /// Writes one data record, with `extra` as a trailing field.
    pub fn write_row(&mut self, values: &[FieldValue], extra: Option<&str>) -> Result<()> {
        let rendered: Vec<Cow<'_, str>> = values.iter().map(FieldValue::render).collect();
        let mut fields: Vec<&str> = rendered.iter().map(|v| v.trim()).collect();
        if let Some(extra) = extra {
            fields.push(extra.trim());
        }
        self.write_fields(&fields)
    }

    /// Flushes everything and hands back the sink.
    pub fn finish(mut self) -> Result<W> {
        self.sink
            .flush()
            .map_err(|e| ExportError::WriteError(e.to_string()))?;
        Ok(self.sink)
    }

    fn write_fields(&mut self, fields: &[&str]) -> Result<()> {
        // csv quotes a lone empty field as `""`; keep it an empty line
        self.record.clear();
        if let [""] = fields {
            self.record.extend_from_slice(RECORD_TERMINATOR);
        } else {
            let mut wtr = self.encoder.from_writer(&mut self.record);
            wtr.write_record(fields)?;
            wtr.flush()
                .map_err(|e| ExportError::WriteError(e.to_string()))?;
        }
        self.sink
            .write_all(&self.record)
            .map_err(|e| ExportError::WriteError(e.to_string()))
    }
}
