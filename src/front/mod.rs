//! Front-end helpers shared by the command line and the interactive shell.

use crate::models::ScanRecord;
use std::io::{self, Write};

/// Interactive line-oriented front end
pub mod shell;

pub use shell::{Command, Shell};

/// Print `Detected N QR code(s)` followed by one block per record.
pub fn write_results<W: Write>(out: &mut W, records: &[ScanRecord]) -> io::Result<()> {
    writeln!(out, "Detected {} QR code(s)", records.len())?;
    for (i, record) in records.iter().enumerate() {
        writeln!(out)?;
        writeln!(out, "Code #{}:", i + 1)?;
        writeln!(out, "  Data: {}", record.data)?;
        writeln!(out, "  Type: {}", record.code_type)?;
        writeln!(out, "  Source: {}", record.source)?;
        if let Some(path) = &record.path {
            writeln!(out, "  Path: {}", path.display())?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PixelPoint, QR_CODE_TYPE, SourceKind};

    #[test]
    fn summary_lists_each_code() {
        let record = ScanRecord::new(
            "hello",
            QR_CODE_TYPE,
            vec![
                PixelPoint::new(0, 0),
                PixelPoint::new(3, 0),
                PixelPoint::new(3, 3),
            ],
            SourceKind::Directory,
        )
        .with_path("in/a.png");
        let mut out = Vec::new();
        write_results(&mut out, &[record]).expect("write");
        let text = String::from_utf8(out).expect("utf8");
        assert_eq!(
            text,
            "Detected 1 QR code(s)\n\nCode #1:\n  Data: hello\n  Type: QRCODE\n  Source: directory\n  Path: in/a.png\n"
        );
    }
}
