//! Flattening of nested values into logfmt-compatible keys

use serde_json::Value;

/// Separator placed between a parent key and a member name or index
pub const KEY_SEPARATOR: char = '_';

/// Flatten a value into `(key, scalar)` leaves, in member order
///
/// Examples:
/// - `user: {"name": "Alice"}` → `user_name: "Alice"`
/// - `items: ["a", "b"]` → `items_0: "a"`, `items_1: "b"`
/// - `users: [{"name": "Alice"}]` → `users_0_name: "Alice"`
///
/// Empty collections produce no leaves.
pub fn flatten_value<'v>(key: &str, value: &'v Value) -> Vec<(String, &'v Value)> {
    let mut leaves = Vec::new();
    flatten_recursive(key.to_string(), value, &mut leaves);
    leaves
}

fn flatten_recursive<'v>(prefix: String, value: &'v Value, leaves: &mut Vec<(String, &'v Value)>) {
    match value {
        Value::Object(obj) => {
            for (name, member) in obj {
                flatten_recursive(format!("{}{}{}", prefix, KEY_SEPARATOR, name), member, leaves);
            }
        }
        Value::Array(arr) => {
            for (index, item) in arr.iter().enumerate() {
                flatten_recursive(format!("{}{}{}", prefix, KEY_SEPARATOR, index), item, leaves);
            }
        }
        _ => leaves.push((prefix, value)),
    }
}
