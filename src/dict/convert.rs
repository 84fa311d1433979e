//! TOML interop: loading parsed tables into containers and deserializing
//! resolved snapshots into typed structs.

use serde::de::DeserializeOwned;

use super::container::MorfDict;
use super::error::DictError;
use super::value::{Table, Value};

impl From<toml::Value> for Value {
    fn from(value: toml::Value) -> Self {
        match value {
            toml::Value::String(s) => Value::String(s),
            toml::Value::Integer(i) => Value::Integer(i),
            toml::Value::Float(f) => Value::Float(f),
            toml::Value::Boolean(b) => Value::Boolean(b),
            toml::Value::Datetime(dt) => Value::String(dt.to_string()),
            toml::Value::Array(items) => {
                Value::List(items.into_iter().map(Value::from).collect())
            }
            toml::Value::Table(table) => Value::Table(from_toml_table(table)),
        }
    }
}

/// Converts a parsed TOML table into a plain [`Table`], ready to be written
/// into a container.
pub fn from_toml_table(table: toml::Table) -> Table {
    table
        .into_iter()
        .map(|(key, value)| (key, Value::from(value)))
        .collect()
}

/// Nested containers are resolved on the way out, so this conversion fails
/// wherever resolution does.
impl TryFrom<Value> for toml::Value {
    type Error = DictError;

    fn try_from(value: Value) -> Result<Self, DictError> {
        match value {
            Value::String(s) => Ok(toml::Value::String(s)),
            Value::Integer(i) => Ok(toml::Value::Integer(i)),
            Value::Float(f) => Ok(toml::Value::Float(f)),
            Value::Boolean(b) => Ok(toml::Value::Boolean(b)),
            Value::List(items) => Ok(toml::Value::Array(
                items
                    .into_iter()
                    .map(<toml::Value as TryFrom<Value>>::try_from)
                    .collect::<Result<_, _>>()?,
            )),
            Value::Table(table) => Ok(toml::Value::Table(to_toml_table(table)?)),
            Value::Dict(dict) => Ok(toml::Value::Table(to_toml_table(dict.to_dict()?)?)),
        }
    }
}

fn to_toml_table(table: Table) -> Result<toml::Table, DictError> {
    table
        .into_iter()
        .map(|(key, value)| Ok((key, <toml::Value as TryFrom<Value>>::try_from(value)?)))
        .collect()
}

impl MorfDict {
    /// Resolves every entry and deserializes the snapshot into `T`.
    ///
    /// This is the read-only endpoint of a configuration build: interpolation
    /// happens once here, and subsequent reads of `T` are plain field access.
    ///
    /// ```
    /// use morfdict::MorfDict;
    /// use serde::Deserialize;
    ///
    /// #[derive(Deserialize)]
    /// struct Database {
    ///     url: String,
    /// }
    ///
    /// let settings = MorfDict::interpolating();
    /// settings.set("url", "postgres://%(host)s/app")?;
    /// settings.set("host", "localhost")?;
    /// let db: Database = settings.build()?;
    /// assert_eq!(db.url, "postgres://localhost/app");
    /// # Ok::<(), morfdict::DictError>(())
    /// ```
    pub fn build<T: DeserializeOwned>(&self) -> Result<T, DictError> {
        let snapshot = self.to_dict()?;
        let value = toml::Value::Table(to_toml_table(snapshot)?);
        value.try_into().map_err(DictError::Deserialize)
    }
}
