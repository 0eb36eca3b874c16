use serde_json::{Map, Value};
use std::io;

use super::{flatten_fields, is_row_array, ROW_FIELDS};

/// Write output as CSV to stdout.
///
/// Results carrying rows (schedule payments, yearly projections, ...) are
/// written one row per element; anything else becomes `field,value` pairs.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    match value {
        Value::Object(map) => {
            let result = match map.get("result") {
                Some(Value::Object(result)) => result,
                _ => map,
            };
            match primary_rows(result) {
                Some(rows) => write_array_csv(&mut wtr, rows),
                None => write_fields(&mut wtr, result),
            }
        }
        Value::Array(arr) => {
            write_array_csv(&mut wtr, arr);
        }
        _ => {
            let _ = wtr.write_record([&format_csv_value(value)]);
        }
    }

    let _ = wtr.flush();
}

fn primary_rows(result: &Map<String, Value>) -> Option<&[Value]> {
    ROW_FIELDS.iter().find_map(|field| {
        result
            .get(*field)
            .filter(|v| is_row_array(v))
            .and_then(Value::as_array)
            .map(Vec::as_slice)
    })
}

fn write_fields<W: io::Write>(wtr: &mut csv::Writer<W>, map: &Map<String, Value>) {
    let _ = wtr.write_record(["field", "value"]);
    for (key, val) in flatten_fields(map) {
        let _ = wtr.write_record([key.as_str(), &format_csv_value(&val)]);
    }
}

fn write_array_csv<W: io::Write>(wtr: &mut csv::Writer<W>, arr: &[Value]) {
    if arr.is_empty() {
        return;
    }

    if let Some(Value::Object(first)) = arr.first() {
        let headers: Vec<String> = flatten_fields(first).into_iter().map(|(k, _)| k).collect();
        let _ = wtr.write_record(&headers);

        for item in arr {
            if let Value::Object(map) = item {
                let flat = flatten_fields(map);
                let row: Vec<String> = headers
                    .iter()
                    .map(|h| {
                        flat.iter()
                            .find(|(k, _)| k == h)
                            .map(|(_, v)| format_csv_value(v))
                            .unwrap_or_default()
                    })
                    .collect();
                let _ = wtr.write_record(&row);
            }
        }
    } else {
        for item in arr {
            let _ = wtr.write_record([&format_csv_value(item)]);
        }
    }
}

fn format_csv_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn render(value: &Value) -> String {
        let mut wtr = csv::Writer::from_writer(Vec::new());
        let map = value["result"].as_object().unwrap();
        match primary_rows(map) {
            Some(rows) => write_array_csv(&mut wtr, rows),
            None => write_fields(&mut wtr, map),
        }
        String::from_utf8(wtr.into_inner().unwrap()).unwrap()
    }

    #[test]
    fn test_schedule_rows_flatten_remaining_amortization() {
        let value = json!({"result": {
            "regular_payment": "2439.24",
            "payments": [
                {"payment_number": 1, "remaining_amortization": {"status": "defined", "months": 299}},
                {"payment_number": 2, "remaining_amortization": {"status": "undefined"}},
            ],
        }});
        let out = render(&value);
        let mut lines = out.lines();
        assert_eq!(
            lines.next().unwrap(),
            "payment_number,remaining_amortization.months,remaining_amortization.status"
        );
        assert_eq!(lines.next().unwrap(), "1,299,defined");
        assert_eq!(lines.next().unwrap(), "2,,undefined");
    }

    #[test]
    fn test_scalar_results_are_field_value_pairs() {
        let value = json!({"result": {"penalty": "14400.00", "method": "IRD"}});
        let out = render(&value);
        assert!(out.starts_with("field,value\n"));
        assert!(out.contains("penalty,14400.00"));
    }
}
