use std::io::{self, Write};

use crate::errors::ExportError;
use crate::row::{HEADER, ReportRow};

/// CSV writer for report rows that tracks bytes handed to the sink.
pub struct CsvSink<W: Write> {
    writer: csv::Writer<CountingWriter<W>>,
}

impl<W: Write> CsvSink<W> {
    /// Wraps `out` and writes the header line. Records end with CRLF.
    pub fn new(out: W) -> Result<Self, ExportError> {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .terminator(csv::Terminator::CRLF)
            .from_writer(CountingWriter::new(out));
        writer.write_record(HEADER)?;
        Ok(Self { writer })
    }

    pub fn write_row(&mut self, row: &ReportRow) -> Result<(), ExportError> {
        self.writer.write_record(row.to_record())?;
        Ok(())
    }

    /// Pushes buffered rows through to the sink.
    pub fn flush(&mut self) -> Result<(), ExportError> {
        self.writer.flush()?;
        Ok(())
    }

    pub fn bytes_written(&self) -> u64 {
        self.writer.get_ref().bytes_written()
    }

    /// Flushes and returns the total bytes written.
    pub fn finish(mut self) -> Result<u64, ExportError> {
        self.writer.flush()?;
        let counting = self
            .writer
            .into_inner()
            .map_err(|err| ExportError::Io(err.into_error()))?;
        Ok(counting.bytes_written())
    }
}

struct CountingWriter<W: Write> {
    inner: W,
    bytes: u64,
}

impl<W: Write> CountingWriter<W> {
    fn new(inner: W) -> Self {
        Self { inner, bytes: 0 }
    }

    fn bytes_written(&self) -> u64 {
        self.bytes
    }
}

impl<W: Write> Write for CountingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let size = self.inner.write(buf)?;
        self.bytes = self.bytes.saturating_add(size as u64);
        Ok(size)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

#[cfg(test)]
mod tests {
    use saleseed_core::Money;

    use super::*;
    use crate::row::SaleDate;

    #[test]
    fn quotes_fields_that_need_it() {
        let mut buffer = Vec::new();
        let mut sink = CsvSink::new(&mut buffer).unwrap();
        sink.write_row(&ReportRow {
            sale_id: 1,
            sale_date: SaleDate::parse("2024-01-01T00:00:00+00:00").unwrap(),
            reseller_username: "seed_user_00000".to_string(),
            product_sku: "SKU-000000".to_string(),
            product_name: "Widget, \"deluxe\"".to_string(),
            item_category: "Category 000".to_string(),
            quantity: 2,
            unit_price: Money::from_cents(150),
            line_total: Money::from_cents(300),
        })
        .unwrap();
        let bytes = sink.finish().unwrap();

        let text = String::from_utf8(buffer).unwrap();
        assert_eq!(bytes as usize, text.len());
        assert!(text.ends_with("\r\n"));
        assert_eq!(text.matches("\r\n").count(), 2);
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some(
                "sale_id,sale_date,reseller_username,product_sku,product_name,item_category,quantity,unit_price,line_total"
            )
        );
        assert_eq!(
            lines.next(),
            Some(
                "1,2024-01-01T00:00:00+00:00,seed_user_00000,SKU-000000,\"Widget, \"\"deluxe\"\"\",Category 000,2,1.50,3.00"
            )
        );
    }
}
