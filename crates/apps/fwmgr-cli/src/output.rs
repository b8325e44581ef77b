use anyhow::Result;
use comfy_table::{presets::UTF8_FULL, Cell, ContentArrangement, Table};
use serde::Serialize;
use serde_json::{Map, Value};

#[derive(Debug, Clone)]
pub struct Output {
    pub json: bool,
    pub quiet: bool,
}

impl Output {
    pub fn new(json: bool, quiet: bool) -> Self {
        Self { json, quiet }
    }

    pub fn emit_status<T: Serialize>(&self, value: &T) -> Result<()> {
        if self.quiet {
            return Ok(());
        }
        let json = serde_json::to_value(value)?;
        match &json {
            _ if self.json => println!("{}", serde_json::to_string_pretty(&json)?),
            Value::Object(fields) => println!("{}", fields_table(fields)),
            other => println!("{}", to_string(other)),
        }
        Ok(())
    }

    /// Objects as rows, one column per key seen across all of them.
    pub fn emit_records(&self, title: &str, records: &[Value]) -> Result<()> {
        if self.quiet {
            return Ok(());
        }
        if self.json {
            println!("{}", serde_json::to_string_pretty(records)?);
            return Ok(());
        }

        println!("{title} ({})", records.len());
        if !records.is_empty() {
            println!("{}", records_table(records));
        }
        Ok(())
    }

    pub fn emit_lines(&self, lines: &[String]) {
        if self.quiet {
            return;
        }
        for line in lines {
            println!("{line}");
        }
    }
}

fn table_with_header<I, S>(header: I) -> Table
where
    I: IntoIterator<Item = S>,
    S: Into<Cell>,
{
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header.into_iter().map(Into::into).collect::<Vec<Cell>>());
    table
}

fn fields_table(fields: &Map<String, Value>) -> Table {
    let mut table = table_with_header(["field", "value"]);
    for (key, value) in fields {
        table.add_row(vec![Cell::new(key), Cell::new(to_string(value))]);
    }
    table
}

pub(crate) fn record_columns(records: &[Value]) -> Vec<String> {
    let mut columns: Vec<String> = Vec::new();
    for record in records {
        if let Value::Object(obj) = record {
            for key in obj.keys() {
                if !columns.contains(key) {
                    columns.push(key.clone());
                }
            }
        }
    }
    columns
}

fn records_table(records: &[Value]) -> Table {
    let columns = record_columns(records);
    if columns.is_empty() {
        let mut table = table_with_header(["#", "value"]);
        for (idx, record) in records.iter().enumerate() {
            table.add_row(vec![Cell::new(idx + 1), Cell::new(to_string(record))]);
        }
        return table;
    }

    let mut table = table_with_header(columns.iter().map(String::as_str));
    for record in records {
        let row = columns
            .iter()
            .map(|column| Cell::new(record.get(column).map(to_string).unwrap_or_default()))
            .collect::<Vec<_>>();
        table.add_row(row);
    }
    table
}

pub(crate) fn to_string(value: &Value) -> String {
    match value {
        Value::Null => "null".into(),
        Value::Bool(v) => v.to_string(),
        Value::Number(v) => v.to_string(),
        Value::String(v) => v.clone(),
        Value::Array(items) if items.iter().all(Value::is_string) => {
            items.iter().filter_map(Value::as_str).collect::<Vec<_>>().join(", ")
        }
        other => serde_json::to_string(other).unwrap_or_else(|_| "<invalid>".into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn columns_follow_first_appearance() {
        let records = vec![
            json!({"name": "a", "subnet": ["10.0.0.0", "255.0.0.0"]}),
            json!({"name": "b", "comment": "lab"}),
        ];
        assert_eq!(record_columns(&records), vec!["name", "subnet", "comment"]);
    }

    #[test]
    fn string_arrays_render_inline() {
        assert_eq!(to_string(&json!(["10.0.0.0", "255.0.0.0"])), "10.0.0.0, 255.0.0.0");
        assert_eq!(to_string(&json!([1, 2])), "[1,2]");
        assert_eq!(to_string(&Value::Null), "null");
    }

    #[test]
    fn status_fields_become_rows() {
        let fields = json!({"adom": "root", "domains": ["lab", "root"]});
        let table = fields_table(fields.as_object().unwrap());
        assert_eq!(table.row_iter().count(), 2);
        assert!(table.to_string().contains("lab, root"));
    }

    #[test]
    fn table_has_a_row_per_record() {
        let table = records_table(&[json!({"name": "a"}), json!({"name": "b"}), json!("loose")]);
        assert_eq!(table.row_iter().count(), 3);
    }
}
