use serde::Deserialize;
use serde_json::Value;

use crate::errors::{SnowflakeError, SnowflakeResult};

/// One row of a result set, keyed by column name.
///
/// Values are the raw JSON scalars from the wire; the map preserves the
/// column order of the result set.
pub type Row = serde_json::Map<String, Value>;

/// One entry of the result set's `rowType` metadata.
///
/// The wire carries more fields (database, schema, precision, ...) but only
/// the name and declared type matter for reshaping rows.
#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ColumnDescriptor {
    /// The name of the column
    pub name: String,
    /// The declared Snowflake type, passed through uninterpreted
    #[serde(rename = "type", default)]
    pub data_type: String,
}

/// Reshape raw positional rows into named records.
///
/// Each value is assigned under the name of the descriptor at the same
/// position. A row whose length does not match the descriptor count is an
/// error rather than being silently truncated or padded.
pub(crate) fn decode_rows(
    columns: &[ColumnDescriptor],
    data: Vec<Vec<Value>>,
) -> SnowflakeResult<Vec<Row>> {
    data.into_iter()
        .enumerate()
        .map(|(row, values)| {
            if values.len() != columns.len() {
                return Err(SnowflakeError::RowShapeMismatch {
                    row,
                    expected: columns.len(),
                    actual: values.len(),
                });
            }
            Ok(columns
                .iter()
                .zip(values)
                .map(|(column, value)| (column.name.clone(), value))
                .collect())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn columns(names: &[&str]) -> Vec<ColumnDescriptor> {
        names
            .iter()
            .map(|name| ColumnDescriptor {
                name: name.to_string(),
                data_type: "text".to_string(),
            })
            .collect()
    }

    #[test]
    fn rows_are_keyed_by_column_name() -> SnowflakeResult<()> {
        let rows = decode_rows(&columns(&["A", "B"]), vec![vec![json!(1), json!("x")]])?;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["A"], json!(1));
        assert_eq!(rows[0]["B"], json!("x"));
        Ok(())
    }

    #[test]
    fn column_order_is_preserved() -> SnowflakeResult<()> {
        let rows = decode_rows(
            &columns(&["FIRST", "SECOND", "THIRD"]),
            vec![vec![json!(1), json!(2), json!(3)]],
        )?;
        let names: Vec<&str> = rows[0].keys().map(String::as_str).collect();
        assert_eq!(names, ["FIRST", "SECOND", "THIRD"]);
        Ok(())
    }

    #[test]
    fn row_order_is_preserved() -> SnowflakeResult<()> {
        let rows = decode_rows(
            &columns(&["N"]),
            vec![vec![json!(3)], vec![json!(1)], vec![json!(2)]],
        )?;
        let values: Vec<i64> = rows.iter().map(|row| row["N"].as_i64().unwrap()).collect();
        assert_eq!(values, [3, 1, 2]);
        Ok(())
    }

    #[test]
    fn short_row_is_an_error() {
        let result = decode_rows(&columns(&["A", "B"]), vec![vec![json!(1)]]);
        assert!(matches!(
            result,
            Err(SnowflakeError::RowShapeMismatch {
                row: 0,
                expected: 2,
                actual: 1,
            })
        ));
    }

    #[test]
    fn long_row_is_an_error() {
        let result = decode_rows(
            &columns(&["A"]),
            vec![vec![json!(1)], vec![json!(2), json!(3)]],
        );
        assert!(matches!(
            result,
            Err(SnowflakeError::RowShapeMismatch {
                row: 1,
                expected: 1,
                actual: 2,
            })
        ));
    }

    #[test]
    fn descriptor_parses_wire_row_type() {
        let column: ColumnDescriptor = serde_json::from_value(json!({
            "name": "ORDER_ID",
            "database": "DW",
            "schema": "CORE",
            "table": "ORDERS",
            "type": "fixed",
            "nullable": false,
        }))
        .unwrap();
        assert_eq!(column.name, "ORDER_ID");
        assert_eq!(column.data_type, "fixed");
    }
}
