//! Raw result rows as returned by a query executor
//!
//! A [`RawRow`] mirrors a driver record: named columns holding either a node,
//! a relationship or a scalar. Nothing here is trusted; [`RowReader`] turns
//! missing or mistyped data into [`InvalidRecordError`].

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::error::InvalidRecordError;
use crate::graph::{Address, AddressKind};

/// Property map of a node or relationship
pub type Properties = serde_json::Map<String, Value>;

/// Column names produced by the query templates
pub mod columns {
    pub const SOURCE: &str = "source";
    pub const RELATIONSHIP: &str = "r";
    pub const TARGET: &str = "target";
    pub const IS_FROM_SOURCE: &str = "isFromSource";
    pub const COUNT: &str = "count";
    pub const TOTAL_AMOUNT: &str = "total_amount";
}

/// Property names stored on nodes and relationships
pub mod properties {
    pub const ADDR: &str = "addr";
    pub const TYPE: &str = "type";
    pub const COUNT: &str = "count";
    pub const TOTAL_AMOUNT: &str = "total_amount";
}

/// One column value in a result row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RawValue {
    Node { properties: Properties },
    Relationship { properties: Properties },
    Scalar { value: Value },
}

impl RawValue {
    /// Address node with `addr` and `type` properties
    pub fn address_node(addr: &str, type_tag: i64) -> Self {
        let mut props = Properties::new();
        props.insert(properties::ADDR.to_string(), Value::from(addr));
        props.insert(properties::TYPE.to_string(), Value::from(type_tag));
        RawValue::Node { properties: props }
    }

    /// `SENT` relationship with `count` and `total_amount` properties
    pub fn sent(count: u64, total_amount: f64) -> Self {
        let mut props = Properties::new();
        props.insert(properties::COUNT.to_string(), Value::from(count));
        props.insert(properties::TOTAL_AMOUNT.to_string(), Value::from(total_amount));
        RawValue::Relationship { properties: props }
    }

    pub fn scalar(value: impl Into<Value>) -> Self {
        RawValue::Scalar {
            value: value.into(),
        }
    }
}

/// A single result row keyed by column name
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawRow {
    columns: BTreeMap<String, RawValue>,
}

impl RawRow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style column insert
    pub fn with(mut self, column: &str, value: RawValue) -> Self {
        self.columns.insert(column.to_string(), value);
        self
    }

    pub fn insert(&mut self, column: &str, value: RawValue) {
        self.columns.insert(column.to_string(), value);
    }

    pub fn get(&self, column: &str) -> Option<&RawValue> {
        self.columns.get(column)
    }

    pub fn remove(&mut self, column: &str) -> Option<RawValue> {
        self.columns.remove(column)
    }

    /// Neighborhood row: `source`, `r`, `isFromSource`, `target`
    pub fn neighborhood(source: RawValue, relationship: RawValue, is_from_source: bool, target: RawValue) -> Self {
        RawRow::new()
            .with(columns::SOURCE, source)
            .with(columns::RELATIONSHIP, relationship)
            .with(columns::IS_FROM_SOURCE, RawValue::scalar(is_from_source))
            .with(columns::TARGET, target)
    }

    /// Detail row: `isFromSource`, `count`, `total_amount`
    pub fn detail(is_from_source: bool, count: u64, total_amount: f64) -> Self {
        RawRow::new()
            .with(columns::IS_FROM_SOURCE, RawValue::scalar(is_from_source))
            .with(columns::COUNT, RawValue::scalar(count))
            .with(columns::TOTAL_AMOUNT, RawValue::scalar(total_amount))
    }
}

/// Typed, error-reporting access to one row of a batch
pub(crate) struct RowReader<'a> {
    index: usize,
    row: &'a RawRow,
}

impl<'a> RowReader<'a> {
    pub(crate) fn new(index: usize, row: &'a RawRow) -> Self {
        Self { index, row }
    }

    fn column(&self, column: &str) -> Result<&'a RawValue, InvalidRecordError> {
        self.row
            .get(column)
            .ok_or_else(|| InvalidRecordError::MissingColumn {
                row: self.index,
                column: column.to_string(),
            })
    }

    fn wrong_column(&self, column: &str, expected: &'static str) -> InvalidRecordError {
        InvalidRecordError::WrongColumnType {
            row: self.index,
            column: column.to_string(),
            expected,
        }
    }

    pub(crate) fn node(&self, column: &str) -> Result<&'a Properties, InvalidRecordError> {
        match self.column(column)? {
            RawValue::Node { properties } => Ok(properties),
            _ => Err(self.wrong_column(column, "node")),
        }
    }

    pub(crate) fn relationship(&self, column: &str) -> Result<&'a Properties, InvalidRecordError> {
        match self.column(column)? {
            RawValue::Relationship { properties } => Ok(properties),
            _ => Err(self.wrong_column(column, "relationship")),
        }
    }

    pub(crate) fn scalar_bool(&self, column: &str) -> Result<bool, InvalidRecordError> {
        match self.column(column)? {
            RawValue::Scalar {
                value: Value::Bool(flag),
            } => Ok(*flag),
            _ => Err(self.wrong_column(column, "boolean")),
        }
    }

    pub(crate) fn scalar_count(&self, column: &str) -> Result<u64, InvalidRecordError> {
        match self.column(column)? {
            RawValue::Scalar { value } => as_count(value).ok_or_else(|| self.wrong_column(column, "count")),
            _ => Err(self.wrong_column(column, "count")),
        }
    }

    pub(crate) fn scalar_amount(&self, column: &str) -> Result<f64, InvalidRecordError> {
        match self.column(column)? {
            RawValue::Scalar { value } => value.as_f64().ok_or_else(|| self.wrong_column(column, "number")),
            _ => Err(self.wrong_column(column, "number")),
        }
    }

    pub(crate) fn index(&self) -> usize {
        self.index
    }

    pub(crate) fn count_field(&self, column: &str, props: &Properties) -> Result<u64, InvalidRecordError> {
        let value = field(self.index, column, props, properties::COUNT)?;
        as_count(value).ok_or_else(|| wrong_field(self.index, column, properties::COUNT, "count"))
    }

    pub(crate) fn amount_field(&self, column: &str, props: &Properties) -> Result<f64, InvalidRecordError> {
        field(self.index, column, props, properties::TOTAL_AMOUNT)?
            .as_f64()
            .ok_or_else(|| wrong_field(self.index, column, properties::TOTAL_AMOUNT, "number"))
    }
}

fn field<'p>(
    row: usize,
    column: &str,
    props: &'p Properties,
    name: &str,
) -> Result<&'p Value, InvalidRecordError> {
    props.get(name).ok_or_else(|| InvalidRecordError::MissingField {
        row,
        column: column.to_string(),
        field: name.to_string(),
    })
}

fn wrong_field(row: usize, column: &str, name: &str, expected: &'static str) -> InvalidRecordError {
    InvalidRecordError::WrongFieldType {
        row,
        column: column.to_string(),
        field: name.to_string(),
        expected,
    }
}

/// Parse an address node's property map; `row` and `column` only feed errors.
pub(crate) fn read_address(
    row: usize,
    column: &str,
    props: &Properties,
) -> Result<Address, InvalidRecordError> {
    let addr = field(row, column, props, properties::ADDR)?
        .as_str()
        .ok_or_else(|| wrong_field(row, column, properties::ADDR, "string"))?;
    let type_tag = field(row, column, props, properties::TYPE)?
        .as_i64()
        .ok_or_else(|| wrong_field(row, column, properties::TYPE, "integer"))?;
    Ok(Address::new(
        addr.to_ascii_lowercase(),
        AddressKind::from_type_tag(type_tag),
    ))
}

/// Non-negative integral count; drivers without lossless integers hand back
/// floats, so integral floats are accepted too.
fn as_count(value: &Value) -> Option<u64> {
    if let Some(n) = value.as_u64() {
        return Some(n);
    }
    match value.as_f64() {
        Some(f) if f >= 0.0 && f.fract() == 0.0 && f <= u64::MAX as f64 => Some(f as u64),
        _ => None,
    }
}
