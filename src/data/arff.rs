//! ARFF loading
//!
//! Reads the dense subset of the Attribute-Relation File Format: `@relation`,
//! `@attribute` with nominal, numeric or string types, and comma separated
//! `@data` rows with `?` for missing values.

use super::dataset::{Dataset, Record, Value};
use super::schema::{AttributeDomain, AttributeMeta, Schema};
use crate::error::{BankTreeError, Result};
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info};

/// Load and parse an ARFF file
pub fn load_arff(path: impl AsRef<Path>) -> Result<Dataset> {
    let path = path.as_ref();
    let start = Instant::now();
    let file = File::open(path)?;
    let reader = BufReader::new(file);

    let mut parser = ArffParser::default();
    for (i, line) in reader.lines().enumerate() {
        parser.feed(i + 1, &line?)?;
    }
    let dataset = parser.finish()?;

    info!(
        path = %path.display(),
        rows = dataset.n_rows(),
        columns = dataset.n_columns(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Loaded ARFF dataset"
    );
    Ok(dataset)
}

/// Parse ARFF text held in memory
pub fn parse_arff(text: &str) -> Result<Dataset> {
    let mut parser = ArffParser::default();
    for (i, line) in text.lines().enumerate() {
        parser.feed(i + 1, line)?;
    }
    parser.finish()
}

#[derive(Default)]
struct ArffParser {
    relation: Option<String>,
    attributes: Vec<AttributeMeta>,
    seen: HashSet<String>,
    in_data: bool,
    records: Vec<Record>,
}

impl ArffParser {
    fn feed(&mut self, line_no: usize, raw: &str) -> Result<()> {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('%') {
            return Ok(());
        }

        if self.in_data {
            let record = self.parse_row(line_no, line)?;
            self.records.push(record);
            return Ok(());
        }

        let (keyword, rest) = match line.find(char::is_whitespace) {
            Some(pos) => (&line[..pos], line[pos..].trim()),
            None => (line, ""),
        };

        match keyword.to_ascii_lowercase().as_str() {
            "@relation" => {
                let (name, _) = take_name(rest).map_err(|m| BankTreeError::arff(line_no, m))?;
                self.relation = Some(name);
            }
            "@attribute" => {
                let attr = parse_attribute(rest).map_err(|m| BankTreeError::arff(line_no, m))?;
                if !self.seen.insert(attr.name.clone()) {
                    return Err(BankTreeError::arff(
                        line_no,
                        format!("duplicate attribute '{}'", attr.name),
                    ));
                }
                debug!(name = %attr.name, domain = %attr.domain.describe(), "ARFF attribute");
                self.attributes.push(attr);
            }
            "@data" => {
                if self.attributes.is_empty() {
                    return Err(BankTreeError::arff(line_no, "@data before any @attribute"));
                }
                self.in_data = true;
            }
            _ => {
                return Err(BankTreeError::arff(
                    line_no,
                    format!("unexpected header line '{}'", line),
                ));
            }
        }
        Ok(())
    }

    fn parse_row(&self, line_no: usize, line: &str) -> Result<Record> {
        if line.starts_with('{') {
            return Err(BankTreeError::arff(line_no, "sparse data rows are not supported"));
        }

        let fields = split_fields(line).map_err(|m| BankTreeError::arff(line_no, m))?;
        if fields.len() != self.attributes.len() {
            return Err(BankTreeError::arff(
                line_no,
                format!(
                    "expected {} values, found {}",
                    self.attributes.len(),
                    fields.len()
                ),
            ));
        }

        fields
            .into_iter()
            .zip(&self.attributes)
            .map(|(field, attr)| parse_value(field, attr).map_err(|m| BankTreeError::arff(line_no, m)))
            .collect()
    }

    fn finish(self) -> Result<Dataset> {
        if self.attributes.is_empty() {
            return Err(BankTreeError::arff(0, "no @attribute declarations"));
        }
        if !self.in_data {
            return Err(BankTreeError::arff(0, "missing @data section"));
        }
        let relation = self.relation.unwrap_or_default();
        Dataset::new(relation, Schema::new(self.attributes), self.records)
    }
}

fn parse_value(field: Field, attr: &AttributeMeta) -> std::result::Result<Value, String> {
    if !field.quoted && field.text == "?" {
        return Ok(Value::Missing);
    }

    match &attr.domain {
        AttributeDomain::Numeric => field
            .text
            .parse::<f64>()
            .map(Value::Number)
            .map_err(|_| format!("'{}' is not a number for attribute '{}'", field.text, attr.name)),
        AttributeDomain::Categorical(labels) => {
            if labels.iter().any(|l| *l == field.text) {
                Ok(Value::Text(field.text))
            } else {
                Err(format!(
                    "'{}' is not a declared value of attribute '{}'",
                    field.text, attr.name
                ))
            }
        }
        AttributeDomain::Text => Ok(Value::Text(field.text)),
        // The loader never declares boolean domains; they only come out of cleaning.
        AttributeDomain::Boolean { .. } => Err(format!(
            "attribute '{}' has a boolean domain, which ARFF cannot declare",
            attr.name
        )),
    }
}

fn parse_attribute(rest: &str) -> std::result::Result<AttributeMeta, String> {
    let (name, type_spec) = take_name(rest)?;
    let type_spec = type_spec.trim();
    if type_spec.is_empty() {
        return Err(format!("attribute '{}' has no type", name));
    }

    let domain = if let Some(inner) = type_spec.strip_prefix('{') {
        let inner = inner
            .strip_suffix('}')
            .ok_or_else(|| format!("unterminated nominal list for '{}'", name))?;
        let labels: Vec<String> = split_fields(inner)?
            .into_iter()
            .map(|f| f.text)
            .collect();
        if labels.is_empty() || labels.iter().any(|l| l.is_empty()) {
            return Err(format!("empty nominal value in '{}'", name));
        }
        AttributeDomain::Categorical(labels)
    } else {
        match type_spec.to_ascii_lowercase().as_str() {
            "numeric" | "real" | "integer" => AttributeDomain::Numeric,
            "string" => AttributeDomain::Text,
            other => return Err(format!("unsupported attribute type '{}' for '{}'", other, name)),
        }
    };

    Ok(AttributeMeta::new(name, domain))
}

/// Take a possibly quoted name off the front, returning it and the remainder
fn take_name(s: &str) -> std::result::Result<(String, &str), String> {
    let s = s.trim_start();
    let mut chars = s.char_indices();
    match chars.next() {
        None => Err("missing name".to_string()),
        Some((_, q @ ('\'' | '"'))) => {
            let mut name = String::new();
            let mut escaped = false;
            for (i, c) in chars {
                if escaped {
                    name.push(c);
                    escaped = false;
                } else if c == '\\' {
                    escaped = true;
                } else if c == q {
                    return Ok((name, &s[i + 1..]));
                } else {
                    name.push(c);
                }
            }
            Err("unterminated quoted name".to_string())
        }
        Some(_) => {
            let end = s.find(char::is_whitespace).unwrap_or(s.len());
            Ok((s[..end].to_string(), &s[end..]))
        }
    }
}

struct Field {
    text: String,
    quoted: bool,
}

/// Split a comma separated list, honouring single and double quotes
fn split_fields(line: &str) -> std::result::Result<Vec<Field>, String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    let mut quoted = false;
    let mut escaped = false;

    for c in line.chars() {
        if let Some(q) = quote {
            if escaped {
                current.push(c);
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            } else {
                current.push(c);
            }
            continue;
        }

        match c {
            '\'' | '"' if current.trim().is_empty() => {
                current.clear();
                quote = Some(c);
                quoted = true;
            }
            ',' => {
                fields.push(Field {
                    text: current.trim().to_string(),
                    quoted,
                });
                current.clear();
                quoted = false;
            }
            _ => current.push(c),
        }
    }

    if quote.is_some() {
        return Err("unterminated quoted value".to_string());
    }
    fields.push(Field {
        text: current.trim().to_string(),
        quoted,
    });
    Ok(fields)
}
