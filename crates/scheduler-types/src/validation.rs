//! Schema validation for implementation configuration tables.
//!
//! Implementation tables (`[account.implementations.node]` and friends) are
//! free-form TOML. Each implementation declares a [`Schema`] describing the
//! keys it understands, and the factory checks the table before building
//! anything.

use thiserror::Error;

/// Errors that can occur while validating a configuration table.
#[derive(Debug, Error)]
pub enum ValidationError {
	#[error("Missing required field: {0}")]
	MissingField(String),
	#[error("Invalid value for field '{field}': {message}")]
	InvalidValue { field: String, message: String },
	#[error("Type mismatch for field '{field}': expected {expected}, got {actual}")]
	TypeMismatch {
		field: String,
		expected: String,
		actual: String,
	},
}

/// Expected type of a configuration value.
#[derive(Debug)]
pub enum FieldType {
	String,
	/// An integer with optional inclusive bounds.
	Integer { min: Option<i64>, max: Option<i64> },
}

/// Extra check run on a value after its type has been verified.
pub type FieldValidator = Box<dyn Fn(&toml::Value) -> Result<(), String> + Send + Sync>;

/// A named key inside a schema.
pub struct Field {
	pub name: String,
	pub field_type: FieldType,
	pub validator: Option<FieldValidator>,
}

impl std::fmt::Debug for Field {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Field")
			.field("name", &self.name)
			.field("field_type", &self.field_type)
			.field("validator", &self.validator.is_some())
			.finish()
	}
}

impl Field {
	pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
		Self {
			name: name.into(),
			field_type,
			validator: None,
		}
	}

	/// Attaches a custom check; the returned message becomes
	/// [`ValidationError::InvalidValue`].
	pub fn with_validator<F>(mut self, validator: F) -> Self
	where
		F: Fn(&toml::Value) -> Result<(), String> + Send + Sync + 'static,
	{
		self.validator = Some(Box::new(validator));
		self
	}

	fn check(&self, value: &toml::Value) -> Result<(), ValidationError> {
		validate_field_type(&self.name, value, &self.field_type)?;

		if let Some(validator) = &self.validator {
			validator(value).map_err(|message| ValidationError::InvalidValue {
				field: self.name.clone(),
				message,
			})?;
		}
		Ok(())
	}
}

/// Required and optional keys of a configuration table.
#[derive(Debug)]
pub struct Schema {
	pub required: Vec<Field>,
	pub optional: Vec<Field>,
}

impl Schema {
	pub fn new(required: Vec<Field>, optional: Vec<Field>) -> Self {
		Self { required, optional }
	}

	/// Validates a table: required keys must be present, and every present
	/// key must have the declared type and pass its validator.
	pub fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let table = config
			.as_table()
			.ok_or_else(|| ValidationError::TypeMismatch {
				field: "root".to_string(),
				expected: "table".to_string(),
				actual: config.type_str().to_string(),
			})?;

		for field in &self.required {
			let value = table
				.get(&field.name)
				.ok_or_else(|| ValidationError::MissingField(field.name.clone()))?;
			field.check(value)?;
		}

		for field in &self.optional {
			if let Some(value) = table.get(&field.name) {
				field.check(value)?;
			}
		}

		Ok(())
	}
}

fn type_mismatch(field_name: &str, expected: &str, value: &toml::Value) -> ValidationError {
	ValidationError::TypeMismatch {
		field: field_name.to_string(),
		expected: expected.to_string(),
		actual: value.type_str().to_string(),
	}
}

fn validate_field_type(
	field_name: &str,
	value: &toml::Value,
	expected_type: &FieldType,
) -> Result<(), ValidationError> {
	match expected_type {
		FieldType::String => {
			if !value.is_str() {
				return Err(type_mismatch(field_name, "string", value));
			}
		},
		FieldType::Integer { min, max } => {
			let int_val = value
				.as_integer()
				.ok_or_else(|| type_mismatch(field_name, "integer", value))?;

			if let Some(min_val) = min {
				if int_val < *min_val {
					return Err(ValidationError::InvalidValue {
						field: field_name.to_string(),
						message: format!("Value {} is less than minimum {}", int_val, min_val),
					});
				}
			}
			if let Some(max_val) = max {
				if int_val > *max_val {
					return Err(ValidationError::InvalidValue {
						field: field_name.to_string(),
						message: format!("Value {} is greater than maximum {}", int_val, max_val),
					});
				}
			}
		},
	}

	Ok(())
}

/// Validation entry point implemented by every pluggable implementation.
pub trait ConfigSchema: Send + Sync {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError>;
}

/// Validator for URL fields that must use `http` or `https`.
pub fn http_url_validator(value: &toml::Value) -> Result<(), String> {
	let url = value.as_str().unwrap_or_default();
	if url.starts_with("http://") || url.starts_with("https://") {
		Ok(())
	} else {
		Err(format!("Expected an http(s) URL, got '{}'", url))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn node_schema() -> Schema {
		Schema::new(
			vec![Field::new("rpc_url", FieldType::String).with_validator(http_url_validator)],
			vec![Field::new(
				"timeout_seconds",
				FieldType::Integer {
					min: Some(1),
					max: Some(300),
				},
			)],
		)
	}

	fn parse(text: &str) -> toml::Value {
		toml::from_str(text).unwrap()
	}

	#[test]
	fn test_valid_table() {
		let config = parse(
			r#"
rpc_url = "http://localhost:8545"
timeout_seconds = 10
"#,
		);
		assert!(node_schema().validate(&config).is_ok());
	}

	#[test]
	fn test_missing_required_field() {
		let err = node_schema().validate(&parse("timeout_seconds = 10")).unwrap_err();
		assert!(matches!(err, ValidationError::MissingField(f) if f == "rpc_url"));
	}

	#[test]
	fn test_validator_runs() {
		let err = node_schema()
			.validate(&parse(r#"rpc_url = "ws://localhost:8546""#))
			.unwrap_err();
		assert!(matches!(err, ValidationError::InvalidValue { field, .. } if field == "rpc_url"));
	}

	#[test]
	fn test_integer_bounds() {
		let config = parse(
			r#"
rpc_url = "http://localhost:8545"
timeout_seconds = 0
"#,
		);
		assert!(matches!(
			node_schema().validate(&config),
			Err(ValidationError::InvalidValue { .. })
		));
	}

	#[test]
	fn test_type_mismatch() {
		let err = node_schema().validate(&parse("rpc_url = 5")).unwrap_err();
		assert!(matches!(err, ValidationError::TypeMismatch { expected, .. } if expected == "string"));
	}
}
