//! Reading usage exports from disk.
//!
//! Two formats are understood: CSV with a header line, and a JSON array of
//! flat objects. The format is picked from the file extension; anything
//! that is not `.json` is read as CSV.

use std::{collections::BTreeMap, fs, path::Path};

use anyhow::{Context, Result, bail};
use billstar_core::fact::RawRow;

use crate::config::ColumnMapping;

/// Read every record in `path` and map it onto canonical columns.
pub fn read_rows(path: &Path, mapping: &ColumnMapping) -> Result<Vec<RawRow>> {
  let content =
    fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;

  let is_json = path
    .extension()
    .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

  let records = if is_json {
    parse_json(&content).with_context(|| format!("parsing {} as JSON", path.display()))?
  } else {
    parse_csv(&content).with_context(|| format!("parsing {} as CSV", path.display()))?
  };

  tracing::debug!(rows = records.len(), path = %path.display(), "read usage export");
  Ok(records.into_iter().map(|r| mapping.apply(r)).collect())
}

fn parse_csv(content: &str) -> Result<Vec<BTreeMap<String, String>>> {
  let mut reader = csv::ReaderBuilder::new()
    .flexible(true)
    .trim(csv::Trim::All)
    .from_reader(content.as_bytes());

  let mut records = Vec::new();
  for (line, result) in reader.deserialize().enumerate() {
    let record: BTreeMap<String, String> =
      result.with_context(|| format!("line {}", line + 2))?;
    records.push(record);
  }
  Ok(records)
}

fn parse_json(content: &str) -> Result<Vec<BTreeMap<String, String>>> {
  let values: Vec<serde_json::Map<String, serde_json::Value>> = serde_json::from_str(content)?;

  values
    .into_iter()
    .enumerate()
    .map(|(index, object)| {
      let mut record = BTreeMap::new();
      for (key, value) in object {
        let text = match value {
          serde_json::Value::Null => continue,
          serde_json::Value::String(s) => s,
          serde_json::Value::Number(n) => n.to_string(),
          serde_json::Value::Bool(b) => b.to_string(),
          other => bail!("record {index}: field {key:?} is not a scalar: {other}"),
        };
        record.insert(key, text);
      }
      Ok(record)
    })
    .collect()
}
