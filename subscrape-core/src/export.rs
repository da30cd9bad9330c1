use std::fs;
use std::path::Path;

use crate::error::CoreError;
use crate::types::PostRecord;

/// Column order matches the record fields; spreadsheet tools key off this row.
pub const CSV_HEADER: &str = "id,title,author,created_at,body,score,comment_count,url";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Render records as a UTF-8 CSV document, header row first.
pub fn csv_string(records: &[PostRecord]) -> String {
    let mut out = String::with_capacity(CSV_HEADER.len() + 1 + records.len() * 128);
    out.push_str(CSV_HEADER);
    out.push('\n');

    for record in records {
        let row = [
            csv_field(&record.id),
            csv_field(&record.title),
            csv_field(&record.author),
            record.created_at.format(TIMESTAMP_FORMAT).to_string(),
            csv_field(&record.body),
            record.score.to_string(),
            record.comment_count.to_string(),
            csv_field(&record.url),
        ];
        out.push_str(&row.join(","));
        out.push('\n');
    }

    out
}

// Quote a field when it contains a separator, quote or line break; double
// embedded quotes.
fn csv_field(value: &str) -> String {
    if value.contains(&[',', '"', '\n', '\r'][..]) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

pub fn export_filename(subreddit: &str) -> String {
    format!("{}_last_6_months.csv", subreddit)
}

pub fn write_csv(path: impl AsRef<Path>, records: &[PostRecord]) -> Result<(), CoreError> {
    fs::write(path, csv_string(records))?;
    Ok(())
}
