//! TOML adapter using toml_edit for format preservation

use serde_json::{Map, Value};
use toml_edit::{Array, ArrayOfTables, DocumentMut, InlineTable, Item, Table};

use crate::error::{Error, Result};
use crate::format::{Format, FormatAdapter};

/// Adapter for TOML files
#[derive(Debug, Default)]
pub struct TomlAdapter;

impl TomlAdapter {
    pub fn new() -> Self {
        Self
    }

    fn parse(source: &str) -> Result<DocumentMut> {
        source
            .parse()
            .map_err(|e: toml_edit::TomlError| Error::parse("TOML", e.to_string()))
    }
}

impl FormatAdapter for TomlAdapter {
    fn format(&self) -> Format {
        Format::Toml
    }

    fn load(&self, source: &str) -> Result<Value> {
        let doc = Self::parse(source)?;
        Ok(table_to_json(doc.as_table()))
    }

    fn serialize(&self, tree: &Value) -> Result<String> {
        let Value::Object(map) = tree else {
            return Err(Error::serialize("TOML", "top level must be a table"));
        };

        let mut doc = DocumentMut::new();
        for (key, value) in map {
            if let Some(item) = to_item(value)? {
                doc.insert(key, item);
            }
        }
        Ok(doc.to_string())
    }

    fn patch(&self, source: &str, delta: &Value) -> Result<String> {
        let Value::Object(map) = delta else {
            return Err(Error::NotAMap {
                path: String::new(),
            });
        };

        let mut doc = Self::parse(source)?;
        patch_table(doc.as_table_mut(), map)?;
        Ok(doc.to_string())
    }
}

fn table_to_json(table: &Table) -> Value {
    let mut map = Map::new();
    for (key, item) in table.iter() {
        map.insert(key.to_string(), item_to_json(item));
    }
    Value::Object(map)
}

fn item_to_json(item: &Item) -> Value {
    match item {
        Item::None => Value::Null,
        Item::Value(v) => value_to_json(v),
        Item::Table(t) => table_to_json(t),
        Item::ArrayOfTables(arr) => Value::Array(arr.iter().map(table_to_json).collect()),
    }
}

fn value_to_json(v: &toml_edit::Value) -> Value {
    match v {
        toml_edit::Value::String(s) => Value::String(s.value().to_string()),
        toml_edit::Value::Integer(i) => Value::Number((*i.value()).into()),
        toml_edit::Value::Float(f) => serde_json::Number::from_f64(*f.value())
            .map(Value::Number)
            .unwrap_or(Value::Null),
        toml_edit::Value::Boolean(b) => Value::Bool(*b.value()),
        toml_edit::Value::Datetime(d) => Value::String(d.value().to_string()),
        toml_edit::Value::Array(arr) => Value::Array(arr.iter().map(value_to_json).collect()),
        toml_edit::Value::InlineTable(t) => {
            let mut map = Map::new();
            for (key, value) in t.iter() {
                map.insert(key.to_string(), value_to_json(value));
            }
            Value::Object(map)
        }
    }
}

/// Convert a value tree node to an inline TOML value. Nulls have no TOML
/// form and are dropped.
fn to_value(value: &Value) -> Result<Option<toml_edit::Value>> {
    let converted = match value {
        Value::Null => return Ok(None),
        Value::Bool(b) => toml_edit::Value::from(*b),
        Value::Number(n) => match n.as_i64() {
            Some(i) => toml_edit::Value::from(i),
            None => n
                .as_f64()
                .map(toml_edit::Value::from)
                .ok_or_else(|| Error::serialize("TOML", format!("number {n} is out of range")))?,
        },
        Value::String(s) => toml_edit::Value::from(s.as_str()),
        Value::Array(items) => {
            let mut array = Array::new();
            for item in items {
                if let Some(v) = to_value(item)? {
                    array.push(v);
                }
            }
            toml_edit::Value::Array(array)
        }
        Value::Object(map) => {
            let mut inline = InlineTable::new();
            for (key, item) in map {
                if let Some(v) = to_value(item)? {
                    inline.insert(key.as_str(), v);
                }
            }
            toml_edit::Value::InlineTable(inline)
        }
    };
    Ok(Some(converted))
}

/// Convert a value tree node to a document item: maps become tables and
/// sequences of maps become arrays of tables.
fn to_item(value: &Value) -> Result<Option<Item>> {
    match value {
        Value::Object(map) => Ok(Some(Item::Table(table_from_map(map)?))),
        Value::Array(items) if !items.is_empty() && items.iter().all(Value::is_object) => {
            let mut tables = ArrayOfTables::new();
            for item in items {
                if let Value::Object(map) = item {
                    tables.push(table_from_map(map)?);
                }
            }
            Ok(Some(Item::ArrayOfTables(tables)))
        }
        other => Ok(to_value(other)?.map(Item::Value)),
    }
}

fn table_from_map(map: &Map<String, Value>) -> Result<Table> {
    let mut table = Table::new();
    for (key, value) in map {
        if let Some(item) = to_item(value)? {
            table.insert(key, item);
        }
    }
    // A table holding only sub-tables needs no header of its own
    table.set_implicit(!map.is_empty());
    Ok(table)
}

fn patch_table(table: &mut Table, delta: &Map<String, Value>) -> Result<()> {
    for (key, want) in delta {
        match table.get_mut(key) {
            Some(item) if !item.is_none() => patch_item(item, want)?,
            _ => {
                if let Some(item) = to_item(want)? {
                    table.insert(key, item);
                }
            }
        }
    }
    Ok(())
}

fn patch_item(item: &mut Item, want: &Value) -> Result<()> {
    match (item, want) {
        (Item::Table(table), Value::Object(map)) => patch_table(table, map),
        (Item::ArrayOfTables(tables), Value::Array(items)) => patch_tables_array(tables, items),
        (Item::Value(existing), want) => patch_value(existing, want),
        (item, want) => {
            *item = to_item(want)?.unwrap_or(Item::None);
            Ok(())
        }
    }
}

fn patch_tables_array(tables: &mut ArrayOfTables, items: &[Value]) -> Result<()> {
    for (index, want) in items.iter().enumerate() {
        let Value::Object(map) = want else {
            return Err(Error::serialize(
                "TOML",
                format!("array of tables element {index} must be a table"),
            ));
        };
        match tables.get_mut(index) {
            Some(table) => patch_table(table, map)?,
            None => tables.push(table_from_map(map)?),
        }
    }
    Ok(())
}

fn patch_value(existing: &mut toml_edit::Value, want: &Value) -> Result<()> {
    match (existing, want) {
        (toml_edit::Value::InlineTable(inline), Value::Object(map)) => {
            for (key, item) in map {
                match inline.get_mut(key) {
                    Some(value) => patch_value(value, item)?,
                    None => {
                        if let Some(value) = to_value(item)? {
                            inline.insert(key.as_str(), value);
                        }
                    }
                }
            }
            Ok(())
        }
        (toml_edit::Value::Array(array), Value::Array(items)) => {
            for (index, item) in items.iter().enumerate() {
                match array.get_mut(index) {
                    Some(value) => patch_value(value, item)?,
                    None => {
                        if let Some(value) = to_value(item)? {
                            array.push(value);
                        }
                    }
                }
            }
            Ok(())
        }
        (existing, want) => replace_value(existing, want),
    }
}

/// Swap a value in place, keeping the whitespace and comments around it.
fn replace_value(existing: &mut toml_edit::Value, want: &Value) -> Result<()> {
    if value_to_json(existing) == *want {
        return Ok(());
    }
    let Some(mut replacement) = to_value(want)? else {
        return Ok(());
    };
    *replacement.decor_mut() = existing.decor().clone();
    *existing = replacement;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_load_keeps_document_order() {
        let tree = TomlAdapter.load("[b]\ny = 2\n[a]\nx = 1\n").unwrap();
        let keys: Vec<_> = tree.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["b", "a"]);
    }

    #[test]
    fn test_load_array_of_tables() {
        let tree = TomlAdapter
            .load("[[bin]]\nname = \"first\"\n\n[[bin]]\nname = \"second\"\n")
            .unwrap();
        assert_eq!(tree, json!({"bin": [{"name": "first"}, {"name": "second"}]}));
    }

    #[test]
    fn test_patch_preserves_comments_and_unrelated_keys() {
        let source = "# project settings\n[tool.black]\nline-length = 88  # keep short\ntarget = \"py38\"\n\n[tool.other]\nkeep = 'me'\n";
        let patched = TomlAdapter
            .patch(source, &json!({"tool": {"black": {"line-length": 120}}}))
            .unwrap();
        assert_eq!(
            patched,
            "# project settings\n[tool.black]\nline-length = 120  # keep short\ntarget = \"py38\"\n\n[tool.other]\nkeep = 'me'\n"
        );
    }

    #[test]
    fn test_patch_inserts_missing_table() {
        let patched = TomlAdapter
            .patch("[a]\nx = 1\n", &json!({"b": {"y": true}}))
            .unwrap();
        let tree = TomlAdapter.load(&patched).unwrap();
        assert_eq!(tree, json!({"a": {"x": 1}, "b": {"y": true}}));
        assert!(patched.starts_with("[a]\nx = 1\n"));
    }

    #[test]
    fn test_patch_extends_inline_array() {
        let patched = TomlAdapter
            .patch("list = [\"a\", \"b\"]\n", &json!({"list": ["a", "b", "c"]}))
            .unwrap();
        assert_eq!(TomlAdapter.load(&patched).unwrap(), json!({"list": ["a", "b", "c"]}));
    }

    #[test]
    fn test_patch_array_of_tables_element_wise() {
        let source = "[[repo]]\nname = \"a\"\n\n[[repo]]\nname = \"b\"\nrev = \"1\"\n";
        let delta = json!({"repo": [{"name": "a"}, {"name": "b", "rev": "2"}, {"name": "c"}]});
        let patched = TomlAdapter.patch(source, &delta).unwrap();
        assert_eq!(TomlAdapter.load(&patched).unwrap(), delta);
    }

    #[test]
    fn test_serialize_nested_tables() {
        let text = TomlAdapter
            .serialize(&json!({"tool": {"black": {"line-length": 120}}}))
            .unwrap();
        assert_eq!(text, "[tool.black]\nline-length = 120\n");
    }

    #[test]
    fn test_parse_error() {
        assert!(matches!(
            TomlAdapter.load("[invalid\nkey = "),
            Err(Error::ParseError { .. })
        ));
    }
}
