use crate::error::{Result, ShipError};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// JSON argument blob forwarded to a contract method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JsonArgs(String);

impl JsonArgs {
    /// Parses and normalises `raw` to compact JSON.
    ///
    /// # Errors
    ///
    /// Returns `ShipError::InvalidField` if `raw` is not valid JSON.
    pub fn parse(field: &str, raw: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(raw)
            .map_err(|err| ShipError::invalid(field, format!("not valid JSON: {err}")))?;
        Ok(Self(value.to_string()))
    }

    #[must_use]
    pub fn empty_object() -> Self {
        Self("{}".to_string())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for JsonArgs {
    fn default() -> Self {
        Self::empty_object()
    }
}

impl fmt::Display for JsonArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Decimal token amount, kept as text so "0" stays distinct from unset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Amount(String);

impl Amount {
    /// # Errors
    ///
    /// Returns `ShipError::MissingField` for blank input and
    /// `ShipError::InvalidField` for anything but an unsigned decimal.
    pub fn parse(field: &str, raw: &str) -> Result<Self> {
        let value = raw.trim();
        if value.is_empty() {
            return Err(ShipError::missing(field));
        }
        let (whole, fraction) = value.split_once('.').unwrap_or((value, ""));
        let digits_only = |part: &str| part.chars().all(|c| c.is_ascii_digit());
        if whole.is_empty() || !digits_only(whole) || !digits_only(fraction) {
            return Err(ShipError::invalid(
                field,
                format!("expected an unsigned decimal amount, got '{value}'"),
            ));
        }
        if value.ends_with('.') {
            return Err(ShipError::invalid(field, "amount cannot end with '.'"));
        }
        Ok(Self(value.to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Optional initialization call sent along with a deploy.
///
/// Every field is optional and absent fields are omitted from the remote
/// call entirely.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeployParameters {
    pub init_function: Option<String>,
    pub init_args: Option<JsonArgs>,
    pub init_gas: Option<u64>,
    pub init_deposit: Option<Amount>,
}

impl DeployParameters {
    /// Builds parameters from raw CLI values.
    ///
    /// # Errors
    ///
    /// Returns `ShipError::InvalidField` for malformed args or deposit, and
    /// `ShipError::MissingField` when init values are given without a function.
    pub fn from_raw(
        init_function: Option<&str>,
        init_args: Option<&str>,
        init_gas: Option<u64>,
        init_deposit: Option<&str>,
    ) -> Result<Self> {
        let init_function = init_function
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(ToString::to_string);
        let params = Self {
            init_function,
            init_args: init_args
                .map(|raw| JsonArgs::parse("initArgs", raw))
                .transpose()?,
            init_gas,
            init_deposit: init_deposit
                .map(|raw| Amount::parse("initDeposit", raw))
                .transpose()?,
        };
        params.validate()?;
        Ok(params)
    }

    /// # Errors
    ///
    /// Returns `ShipError::MissingField` for `initFunction` when any other
    /// init value is present without it.
    pub fn validate(&self) -> Result<()> {
        let has_init_values =
            self.init_args.is_some() || self.init_gas.is_some() || self.init_deposit.is_some();
        if has_init_values && self.init_function.is_none() {
            return Err(ShipError::missing("initFunction"));
        }
        Ok(())
    }

    #[must_use]
    pub const fn has_init_call(&self) -> bool {
        self.init_function.is_some()
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn json_args_are_compacted() {
        let args = JsonArgs::parse("args", "{ \"solution\" : \"abc\" }").unwrap();
        assert_eq!(args.as_str(), r#"{"solution":"abc"}"#);
    }

    #[test]
    fn malformed_json_args_are_rejected() {
        let err = JsonArgs::parse("args", "{solution: abc").unwrap_err();
        assert!(matches!(err, ShipError::InvalidField { ref field, .. } if field == "args"));
    }

    #[test]
    fn zero_amount_is_kept_distinct_from_unset() {
        let params = DeployParameters::from_raw(Some("new"), None, None, Some("0")).unwrap();
        assert_eq!(params.init_deposit, Some(Amount::parse("d", "0").unwrap()));
        assert_eq!(params.init_gas, None);
        assert_eq!(params.init_args, None);
    }

    #[test]
    fn amount_rejects_non_decimal_text() {
        assert!(Amount::parse("amount", "1e24").is_err());
        assert!(Amount::parse("amount", "-1").is_err());
        assert!(Amount::parse("amount", "1.").is_err());
        assert!(Amount::parse("amount", "0.5").is_ok());
        assert!(matches!(
            Amount::parse("amount", " "),
            Err(ShipError::MissingField { .. })
        ));
    }

    #[test]
    fn init_values_without_function_are_rejected() {
        let err = DeployParameters::from_raw(None, Some("{}"), None, None).unwrap_err();
        assert_eq!(err.to_string(), "Missing required field: initFunction");
    }

    #[test]
    fn empty_parameters_are_valid() {
        let params = DeployParameters::from_raw(None, None, None, None).unwrap();
        assert!(!params.has_init_call());
        assert_eq!(params, DeployParameters::default());
    }
}
