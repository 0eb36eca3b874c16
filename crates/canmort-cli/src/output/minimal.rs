use serde_json::Value;

/// Headline field per command, tried in order. Dotted keys reach into
/// nested objects.
const PRIORITY_KEYS: [&str; 10] = [
    "payment",
    "trigger_rate",
    "blended_rate",
    "penalty",
    "probability_of_payoff",
    "impact.new_balance",
    "metrics.net_worth_10yr",
    "regular_payment",
    "remaining_balance",
    "expected.remaining_balance",
];

/// Print just the key answer value from the output, falling back to the
/// first field in the result object.
pub fn print_minimal(value: &Value) {
    println!("{}", minimal_line(value));
}

fn minimal_line(value: &Value) -> String {
    let result_obj = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    if let Value::Object(map) = result_obj {
        for key in PRIORITY_KEYS {
            if let Some(val) = lookup(result_obj, key) {
                if !val.is_null() {
                    return format_minimal(val);
                }
            }
        }

        if let Some((key, val)) = map.iter().next() {
            return format!("{}: {}", key, format_minimal(val));
        }
    }

    format_minimal(result_obj)
}

fn lookup<'a>(value: &'a Value, dotted: &str) -> Option<&'a Value> {
    dotted.split('.').try_fold(value, |v, part| v.get(part))
}

fn format_minimal(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
