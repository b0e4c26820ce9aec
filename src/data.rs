use anyhow::{anyhow, bail, Context, Result};
use serde_json::{Map, Number, Value};
use std::io::Read;

use crate::format::{as_f64, instant_millis, value_to_string};
use crate::settings::{ColumnDescriptor, ColumnType, Encoding, Row, Settings};

/// A position on one axis: continuous (numbers, timestamps) or a category label
#[derive(Debug, Clone, PartialEq)]
pub enum Coord {
    Number(f64),
    Category(String),
}

impl Coord {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Coord::Number(v) => Some(*v),
            Coord::Category(_) => None,
        }
    }
}

/// One plotted datum
#[derive(Debug, Clone, PartialEq)]
pub struct Point {
    pub x: Coord,
    pub y: Coord,
    pub color_value: Option<Value>,
    pub size: Option<f64>,
    /// Group (split) key of the series the point belongs to
    pub key: String,
    /// The original record, for label/symbol/tooltip lookups
    pub row: Row,
}

/// Points sharing a group key
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub key: String,
    pub points: Vec<Point>,
}

impl Series {
    pub fn iter_points<'a>(series: &'a [Series]) -> impl Iterator<Item = &'a Point> + 'a {
        series.iter().flat_map(|s| s.points.iter())
    }
}

/// Rows from a JSON array of objects
pub fn rows_from_json(value: &Value) -> Result<Vec<Row>> {
    let array = value.as_array().ok_or_else(||
        anyhow!("Input data must be a JSON array of objects")
    )?;

    array
        .iter()
        .map(|item| {
            item.as_object()
                .cloned()
                .ok_or_else(|| anyhow!("Items in array must be objects"))
        })
        .collect()
}

/// Rows from CSV text.
///
/// Cells are typed by the matching column descriptor when there is one;
/// otherwise numbers are detected and everything else stays a string.
/// Empty cells become null.
pub fn rows_from_csv<R: Read>(reader: R, columns: &[ColumnDescriptor]) -> Result<Vec<Row>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers: Vec<String> = csv_reader
        .headers()
        .context("Failed to read CSV headers")?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let mut rows = Vec::new();
    for (idx, record) in csv_reader.records().enumerate() {
        let record = record.with_context(|| format!("Failed to read CSV row {}", idx + 1))?;
        let mut row = Map::new();
        for (header, cell) in headers.iter().zip(record.iter()) {
            let column_type = columns.iter().find(|c| &c.name == header).map(|c| c.column_type);
            row.insert(header.clone(), typed_cell(cell, column_type));
        }
        rows.push(row);
    }

    Ok(rows)
}

fn typed_cell(cell: &str, column_type: Option<ColumnType>) -> Value {
    if cell.is_empty() {
        return Value::Null;
    }
    let numeric = || {
        cell.parse::<i64>()
            .map(Value::from)
            .ok()
            .or_else(|| cell.parse::<f64>().ok().and_then(Number::from_f64).map(Value::Number))
    };
    match column_type {
        Some(ColumnType::String) | Some(ColumnType::Date) | Some(ColumnType::Datetime) => {
            Value::String(cell.to_string())
        }
        Some(ColumnType::Boolean) => match cell.to_ascii_lowercase().as_str() {
            "true" | "1" => Value::Bool(true),
            "false" | "0" => Value::Bool(false),
            _ => Value::String(cell.to_string()),
        },
        _ => numeric().unwrap_or_else(|| Value::String(cell.to_string())),
    }
}

/// Group key of a row: the split column values joined by `|`, empty when unsplit
pub fn group_key(settings: &Settings, row: &Row) -> String {
    settings
        .split_values
        .iter()
        .map(|col| row.get(col).map(value_to_string).unwrap_or_default())
        .collect::<Vec<_>>()
        .join("|")
}

/// Distinct values of a column in first-appearance order
pub fn distinct_values<'a, I>(rows: I, column: &str) -> Vec<Value>
where
    I: IntoIterator<Item = &'a Row>,
{
    let mut seen: Vec<Value> = Vec::new();
    for row in rows {
        let value = row.get(column).cloned().unwrap_or(Value::Null);
        if !seen.contains(&value) {
            seen.push(value);
        }
    }
    seen
}

/// Distinct group keys in first-appearance order
pub fn group_keys(settings: &Settings) -> Vec<String> {
    let mut keys: Vec<String> = Vec::new();
    for row in &settings.data {
        let key = group_key(settings, row);
        if !keys.contains(&key) {
            keys.push(key);
        }
    }
    keys
}

/// Drops rows belonging to legend groups the user has hidden.
///
/// A row is hidden when its group key, the string form of its categorical
/// color value or the string form of its symbol value is listed in `hideKeys`.
/// These are the labels the legends grey out.
pub fn filter_data_by_group(settings: &Settings) -> Vec<&Row> {
    if settings.hide_keys.is_empty() {
        return settings.data.iter().collect();
    }

    let color_col = settings
        .encoding(Encoding::Color)
        .filter(|c| settings.column_type(c).map(ColumnType::is_categorical).unwrap_or(false));
    let legend_cols: Vec<&str> = color_col
        .into_iter()
        .chain(settings.encoding(Encoding::Symbol))
        .collect();

    settings
        .data
        .iter()
        .filter(|row| {
            let key = group_key(settings, row);
            if !settings.split_values.is_empty() && settings.is_hidden(&key) {
                return false;
            }
            legend_cols.iter().all(|col| {
                let value = row.get(*col).map(value_to_string).unwrap_or_default();
                !settings.is_hidden(&value)
            })
        })
        .collect()
}

/// Converts a cell to an axis coordinate according to its column type.
pub fn coord_from(column_type: ColumnType, value: &Value) -> Result<Option<Coord>> {
    if value.is_null() {
        return Ok(None);
    }
    if column_type.is_categorical() {
        return Ok(Some(Coord::Category(value_to_string(value))));
    }
    let number = if column_type.is_temporal() {
        instant_millis(value)
    } else {
        as_f64(value)
    };
    match number {
        Some(v) if v.is_finite() => Ok(Some(Coord::Number(v))),
        _ => bail!("Failed to parse '{}' as {:?}", value_to_string(value), column_type),
    }
}

/// Numeric reading of an encoding value (color range / size); dates become milliseconds
pub fn numeric_value(column_type: ColumnType, value: &Value) -> Option<f64> {
    if column_type.is_temporal() {
        instant_millis(value)
    } else {
        as_f64(value)
    }
}

/// Builds the plotted series from (already filtered) rows.
///
/// X and Y come from the first two `mainValues` columns. Rows missing either
/// coordinate are skipped; rows whose coordinates cannot be read as the
/// column type are an error.
pub fn point_data(settings: &Settings, rows: &[&Row]) -> Result<Vec<Series>> {
    let (x_col, y_col) = match settings.main_values.as_slice() {
        [x, y, ..] => (x, y),
        _ => bail!("X/Y Scatter requires at least two columns (X Axis and Y Axis)"),
    };

    let color_col = settings.encoding(Encoding::Color);
    let size_col = settings.encoding(Encoding::Size);
    let size_type = size_col.and_then(|c| settings.column_type(c)).unwrap_or_default();

    let mut series: Vec<Series> = Vec::new();
    let mut skipped = 0usize;

    for (row_idx, row) in rows.iter().enumerate() {
        let x = coord_from(x_col.column_type, row.get(&x_col.name).unwrap_or(&Value::Null))
            .with_context(|| format!("Invalid value in column '{}' at row {}", x_col.name, row_idx + 1))?;
        let y = coord_from(y_col.column_type, row.get(&y_col.name).unwrap_or(&Value::Null))
            .with_context(|| format!("Invalid value in column '{}' at row {}", y_col.name, row_idx + 1))?;

        let (x, y) = match (x, y) {
            (Some(x), Some(y)) => (x, y),
            _ => {
                skipped += 1;
                continue;
            }
        };

        let key = group_key(settings, row);
        let point = Point {
            x,
            y,
            color_value: color_col.and_then(|c| row.get(c)).cloned(),
            size: size_col
                .and_then(|c| row.get(c))
                .and_then(|v| numeric_value(size_type, v)),
            key: key.clone(),
            row: (*row).clone(),
        };

        match series.iter_mut().find(|s| s.key == key) {
            Some(s) => s.points.push(point),
            None => series.push(Series { key, points: vec![point] }),
        }
    }

    if skipped > 0 {
        log::debug!("Skipped {} rows with a null X or Y value", skipped);
    }

    Ok(series)
}

/// Min/max of the finite values, `None` when there are none
pub fn extent<I: IntoIterator<Item = f64>>(values: I) -> Option<(f64, f64)> {
    values
        .into_iter()
        .filter(|v| v.is_finite())
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((min, max)) => Some((min.min(v), max.max(v))),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: Value) -> Row {
        value.as_object().unwrap().clone()
    }

    fn make_settings() -> Settings {
        Settings {
            real_values: vec![Some("x".into()), Some("y".into()), Some("region".into()), Some("pop".into())],
            main_values: vec![
                ColumnDescriptor::new("x", ColumnType::Float),
                ColumnDescriptor::new("y", ColumnType::Float),
                ColumnDescriptor::new("region", ColumnType::String),
                ColumnDescriptor::new("pop", ColumnType::Integer),
            ],
            data: vec![
                row(json!({"x": 1.0, "y": 2.0, "region": "north", "pop": 10, "kind": "a"})),
                row(json!({"x": 2.0, "y": 3.0, "region": "south", "pop": 20, "kind": "b"})),
                row(json!({"x": null, "y": 4.0, "region": "south", "pop": 30, "kind": "a"})),
            ],
            ..Default::default()
        }
    }

    #[test]
    fn test_rows_from_json() {
        let rows = rows_from_json(&json!([{"a": 1}, {"a": 2}])).unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows_from_json(&json!({"a": 1})).is_err());
        assert!(rows_from_json(&json!([1, 2])).is_err());
    }

    #[test]
    fn test_rows_from_csv_typing() {
        let csv = "x,y,name,when\n1,2.5,alpha,2024-01-01\n3,,beta,2024-01-02\n";
        let columns = vec![ColumnDescriptor::new("when", ColumnType::Date)];
        let rows = rows_from_csv(csv.as_bytes(), &columns).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["x"], json!(1));
        assert_eq!(rows[0]["y"], json!(2.5));
        assert_eq!(rows[0]["name"], json!("alpha"));
        assert_eq!(rows[0]["when"], json!("2024-01-01"));
        assert_eq!(rows[1]["y"], Value::Null);
    }

    #[test]
    fn test_point_data_skips_null_coordinates() {
        let settings = make_settings();
        let rows: Vec<&Row> = settings.data.iter().collect();
        let series = point_data(&settings, &rows).unwrap();
        assert_eq!(series.len(), 1);
        assert_eq!(series[0].points.len(), 2);
        assert_eq!(series[0].points[1].x, Coord::Number(2.0));
        assert_eq!(series[0].points[1].color_value, Some(json!("south")));
        assert_eq!(series[0].points[1].size, Some(20.0));
    }

    #[test]
    fn test_point_data_groups_by_split() {
        let mut settings = make_settings();
        settings.split_values = vec!["kind".into()];
        settings.data[2]["x"] = json!(5.0);
        let rows: Vec<&Row> = settings.data.iter().collect();
        let series = point_data(&settings, &rows).unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series[0].key, "a");
        assert_eq!(series[0].points.len(), 2);
        assert_eq!(series[1].key, "b");
    }

    #[test]
    fn test_point_data_requires_two_columns() {
        let mut settings = make_settings();
        settings.main_values.truncate(1);
        let rows: Vec<&Row> = settings.data.iter().collect();
        let err = point_data(&settings, &rows).unwrap_err();
        assert!(err.to_string().contains("at least two columns"));
    }

    #[test]
    fn test_point_data_rejects_non_numeric() {
        let mut settings = make_settings();
        settings.data[0]["y"] = json!("not_a_number");
        let rows: Vec<&Row> = settings.data.iter().collect();
        let err = point_data(&settings, &rows).unwrap_err();
        assert!(format!("{:#}", err).contains("Failed to parse"));
    }

    #[test]
    fn test_filter_data_by_group_color_value() {
        let mut settings = make_settings();
        settings.hide_keys = vec!["south".into()];
        let rows = filter_data_by_group(&settings);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["region"], json!("north"));
    }

    #[test]
    fn test_filter_data_by_group_split_key() {
        let mut settings = make_settings();
        settings.split_values = vec!["kind".into()];
        settings.hide_keys = vec!["a".into()];
        let rows = filter_data_by_group(&settings);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["kind"], json!("b"));
    }

    #[test]
    fn test_filter_data_by_group_symbol_value() {
        let mut settings = make_settings();
        settings.real_values = vec![Some("x".into()), Some("y".into()), None, None, Some("kind".into())];
        settings.hide_keys = vec!["a".into()];
        let rows = filter_data_by_group(&settings);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["kind"], json!("b"));

        // Unrelated columns are not matched against hidden keys
        settings.hide_keys = vec!["north".into()];
        assert_eq!(filter_data_by_group(&settings).len(), 3);
    }

    #[test]
    fn test_distinct_values_order() {
        let settings = make_settings();
        let values = distinct_values(&settings.data, "region");
        assert_eq!(values, vec![json!("north"), json!("south")]);
    }

    #[test]
    fn test_extent() {
        assert_eq!(extent(vec![3.0, -1.0, f64::NAN, 7.0]), Some((-1.0, 7.0)));
        assert_eq!(extent(Vec::new()), None);
    }
}
