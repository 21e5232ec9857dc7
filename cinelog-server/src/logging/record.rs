//! Ordered key/value records handed to a [`LogSink`](super::LogSink).

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Int(i64),
    Str(String),
    List(Vec<String>),
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Int(value) => write!(f, "{value}"),
            FieldValue::Str(value) => f.write_str(value),
            FieldValue::List(values) => write!(f, "[{}]", values.join(", ")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogField {
    pub name: &'static str,
    pub value: FieldValue,
}

/// A structured record whose field order is the order fields were appended.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogRecord {
    fields: Vec<LogField>,
}

impl LogRecord {
    pub fn builder() -> RecordBuilder {
        RecordBuilder::default()
    }

    pub fn fields(&self) -> &[LogField] {
        &self.fields
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.fields.iter().map(|field| field.name).collect()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields
            .iter()
            .find(|field| field.name == name)
            .map(|field| &field.value)
    }

    pub fn int(&self, name: &str) -> Option<i64> {
        match self.get(name)? {
            FieldValue::Int(value) => Some(*value),
            _ => None,
        }
    }

    pub fn str(&self, name: &str) -> Option<&str> {
        match self.get(name)? {
            FieldValue::Str(value) => Some(value),
            _ => None,
        }
    }

    pub fn list(&self, name: &str) -> Option<&[String]> {
        match self.get(name)? {
            FieldValue::List(values) => Some(values),
            _ => None,
        }
    }
}

impl fmt::Display for LogRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, field) in self.fields.iter().enumerate() {
            if index > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{}={}", field.name, field.value)?;
        }
        Ok(())
    }
}

/// Appends fields in call order; there is no positional indexing.
#[derive(Debug, Clone, Default)]
pub struct RecordBuilder {
    fields: Vec<LogField>,
}

impl RecordBuilder {
    pub fn int(mut self, name: &'static str, value: impl Into<i64>) -> Self {
        self.push(name, FieldValue::Int(value.into()));
        self
    }

    pub fn str(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.push(name, FieldValue::Str(value.into()));
        self
    }

    pub fn list(mut self, name: &'static str, values: Vec<String>) -> Self {
        self.push(name, FieldValue::List(values));
        self
    }

    fn push(&mut self, name: &'static str, value: FieldValue) {
        self.fields.push(LogField { name, value });
    }

    pub fn build(self) -> LogRecord {
        LogRecord {
            fields: self.fields,
        }
    }
}
