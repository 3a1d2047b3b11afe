//! Schema parsing and data validation strategies
//!
//! Compatibility resolution is agnostic to schema representation: it asks a
//! [`SchemaParser`] to turn registry text into some parsed form `S`, then asks
//! a [`SchemaValidator`] whether a data value satisfies it. Plain closures
//! implement both traits, so tests and embedders can swap in their own pair.
//!
//! Two pairs ship with the crate:
//! - [`JsonSchemaParser`] / [`JsonSchemaValidator`] (the default), validating
//!   `serde_json::Value` data against JSON Schema documents
//! - [`AvroParser`] / [`AvroValidator`], validating `apache_avro` values or
//!   JSON data against AVRO schemas

use std::fmt;

use apache_avro::types::Value as AvroValue;
use jsonschema::JSONSchema;
use serde::{Deserialize, Serialize};

use crate::error::StrategyError;

/// Turns registry schema text into a parsed schema
pub trait SchemaParser<S> {
    fn parse(&self, schema_text: &str) -> Result<S, StrategyError>;
}

/// Decides whether data satisfies a parsed schema
pub trait SchemaValidator<S, D: ?Sized> {
    fn validate(&self, schema: &S, data: &D) -> bool;
}

impl<S, F> SchemaParser<S> for F
where
    F: Fn(&str) -> Result<S, StrategyError>,
{
    fn parse(&self, schema_text: &str) -> Result<S, StrategyError> {
        self(schema_text)
    }
}

impl<S, D: ?Sized, F> SchemaValidator<S, D> for F
where
    F: Fn(&S, &D) -> bool,
{
    fn validate(&self, schema: &S, data: &D) -> bool {
        self(schema, data)
    }
}

/// Schema formats with a built-in strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemaFormat {
    /// JSON Schema documents, JSON data
    #[default]
    JsonSchema,
    /// AVRO schemas, AVRO values
    Avro,
}

impl fmt::Display for SchemaFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaFormat::JsonSchema => write!(f, "json-schema"),
            SchemaFormat::Avro => write!(f, "avro"),
        }
    }
}

/// Compiles schema text as a JSON Schema document
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSchemaParser;

impl SchemaParser<JSONSchema> for JsonSchemaParser {
    fn parse(&self, schema_text: &str) -> Result<JSONSchema, StrategyError> {
        let document: serde_json::Value = serde_json::from_str(schema_text)?;
        JSONSchema::compile(&document).map_err(|e| StrategyError::InvalidJsonSchema(e.to_string()))
    }
}

/// Checks JSON data against a compiled JSON Schema
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSchemaValidator;

impl SchemaValidator<JSONSchema, serde_json::Value> for JsonSchemaValidator {
    fn validate(&self, schema: &JSONSchema, data: &serde_json::Value) -> bool {
        schema.is_valid(data)
    }
}

/// Parses schema text as an AVRO schema
#[derive(Debug, Clone, Copy, Default)]
pub struct AvroParser;

impl SchemaParser<apache_avro::Schema> for AvroParser {
    fn parse(&self, schema_text: &str) -> Result<apache_avro::Schema, StrategyError> {
        Ok(apache_avro::Schema::parse_str(schema_text)?)
    }
}

/// Checks whether a value can be read with an AVRO schema.
///
/// A value is accepted when it validates as is or resolves against the schema,
/// so numbers are promoted (`int` data satisfies a `double` field), missing
/// fields take their defaults and fields unknown to the schema are ignored.
#[derive(Debug, Clone, Copy, Default)]
pub struct AvroValidator;

impl SchemaValidator<apache_avro::Schema, AvroValue> for AvroValidator {
    fn validate(&self, schema: &apache_avro::Schema, data: &AvroValue) -> bool {
        data.validate(schema) || data.clone().resolve(schema).is_ok()
    }
}

impl SchemaValidator<apache_avro::Schema, serde_json::Value> for AvroValidator {
    fn validate(&self, schema: &apache_avro::Schema, data: &serde_json::Value) -> bool {
        json_to_avro(data).resolve(schema).is_ok()
    }
}

/// Convert JSON data into an AVRO value for [`AvroValidator`].
///
/// Objects become records, integers become `Int` when they fit in 32 bits and
/// `Long` otherwise, and any other number becomes `Double`.
pub fn json_to_avro(value: &serde_json::Value) -> AvroValue {
    use serde_json::Value;

    match value {
        Value::Null => AvroValue::Null,
        Value::Bool(b) => AvroValue::Boolean(*b),
        Value::Number(n) => match n.as_i64() {
            Some(i) => i32::try_from(i).map(AvroValue::Int).unwrap_or(AvroValue::Long(i)),
            None => AvroValue::Double(n.as_f64().unwrap_or(f64::NAN)),
        },
        Value::String(s) => AvroValue::String(s.clone()),
        Value::Array(items) => AvroValue::Array(items.iter().map(json_to_avro).collect()),
        Value::Object(fields) => AvroValue::Record(
            fields
                .iter()
                .map(|(name, field)| (name.clone(), json_to_avro(field)))
                .collect(),
        ),
    }
}
