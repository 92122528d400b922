//! Payload validation
//!
//! Explicit structural validators for the private payloads of each circuit.
//! Every rejection names the offending field (dotted path, with list indices)
//! and the reason, so callers can fix their request without guessing.

use serde_json::{Map, Value};
use thiserror::Error;

use super::CircuitKind;
use crate::crypto::{CodecError, FieldElement};

/// Transfer circuits take one or two input notes and one or two outputs
pub const MAX_TRANSFER_NOTES: usize = 2;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PayloadIssue {
    #[error("is required")]
    Missing,
    #[error("must be {0}")]
    WrongType(&'static str),
    #[error("{0}")]
    Encoding(CodecError),
    #[error("needs at least {0} entries")]
    TooFew(usize),
    #[error("allows at most {0} entries")]
    TooMany(usize),
    #[error("must be one of {0:?}")]
    NotInSet(&'static [&'static str]),
    #[error("does not fit in 64 bits")]
    OutOfRange,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{field} {issue}")]
pub struct PayloadError {
    pub field: String,
    pub issue: PayloadIssue,
}

impl PayloadError {
    pub fn new(field: impl Into<String>, issue: PayloadIssue) -> Self {
        Self {
            field: field.into(),
            issue,
        }
    }

    pub fn missing(field: impl Into<String>) -> Self {
        Self::new(field, PayloadIssue::Missing)
    }

    /// Codec failures are reported as encoding errors rather than schema errors
    pub fn is_encoding(&self) -> bool {
        matches!(self.issue, PayloadIssue::Encoding(_))
    }
}

fn parse_field(value: &Value) -> Result<FieldElement, PayloadIssue> {
    match value {
        Value::String(s) => FieldElement::parse(s).map_err(PayloadIssue::Encoding),
        Value::Number(n) => n
            .as_u64()
            .map(FieldElement::from_u64)
            .ok_or(PayloadIssue::WrongType("a non-negative integer or field element string")),
        _ => Err(PayloadIssue::WrongType("a field element string")),
    }
}

fn parse_amount(value: &Value) -> Result<u64, PayloadIssue> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .ok_or(PayloadIssue::WrongType("a non-negative integer")),
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
                return Err(PayloadIssue::WrongType("a decimal integer"));
            }
            s.parse::<u64>().map_err(|_| PayloadIssue::OutOfRange)
        }
        _ => Err(PayloadIssue::WrongType("a decimal integer")),
    }
}

/// Read-only cursor over one JSON object of a payload
pub struct PayloadReader<'a> {
    obj: &'a Map<String, Value>,
    prefix: String,
}

impl<'a> PayloadReader<'a> {
    pub fn new(value: &'a Value) -> Result<Self, PayloadError> {
        Self::at(value, String::new())
    }

    fn at(value: &'a Value, prefix: String) -> Result<Self, PayloadError> {
        match value {
            Value::Object(obj) => Ok(Self { obj, prefix }),
            _ => Err(PayloadError::new(
                if prefix.is_empty() { "payload".to_string() } else { prefix },
                PayloadIssue::WrongType("an object"),
            )),
        }
    }

    fn path(&self, name: &str) -> String {
        if self.prefix.is_empty() {
            name.to_string()
        } else {
            format!("{}.{}", self.prefix, name)
        }
    }

    fn raw(&self, name: &str) -> Option<&'a Value> {
        self.obj.get(name).filter(|v| !v.is_null())
    }

    pub fn field(&self, name: &str) -> Result<FieldElement, PayloadError> {
        self.field_opt(name)?
            .ok_or_else(|| PayloadError::missing(self.path(name)))
    }

    pub fn field_opt(&self, name: &str) -> Result<Option<FieldElement>, PayloadError> {
        self.raw(name)
            .map(|v| parse_field(v).map_err(|issue| PayloadError::new(self.path(name), issue)))
            .transpose()
    }

    pub fn amount(&self, name: &str) -> Result<u64, PayloadError> {
        self.amount_opt(name)?
            .ok_or_else(|| PayloadError::missing(self.path(name)))
    }

    pub fn amount_opt(&self, name: &str) -> Result<Option<u64>, PayloadError> {
        self.raw(name)
            .map(|v| parse_amount(v).map_err(|issue| PayloadError::new(self.path(name), issue)))
            .transpose()
    }

    pub fn string_opt(&self, name: &str) -> Result<Option<String>, PayloadError> {
        match self.raw(name) {
            None => Ok(None),
            Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.trim().to_string())),
            Some(_) => Err(PayloadError::new(self.path(name), PayloadIssue::WrongType("a string"))),
        }
    }

    /// A list of objects with `min..=max` entries
    pub fn objects(&self, name: &str, min: usize, max: usize) -> Result<Vec<PayloadReader<'a>>, PayloadError> {
        let items = match self.raw(name) {
            None => return Err(PayloadError::missing(self.path(name))),
            Some(Value::Array(items)) => items,
            Some(_) => {
                return Err(PayloadError::new(self.path(name), PayloadIssue::WrongType("an array")))
            }
        };
        if items.len() < min {
            return Err(PayloadError::new(self.path(name), PayloadIssue::TooFew(min)));
        }
        if items.len() > max {
            return Err(PayloadError::new(self.path(name), PayloadIssue::TooMany(max)));
        }
        items
            .iter()
            .enumerate()
            .map(|(i, item)| Self::at(item, format!("{}[{}]", self.path(name), i)))
            .collect()
    }

    /// A list of field elements with at least `min` entries
    pub fn fields(&self, name: &str, min: usize) -> Result<Vec<FieldElement>, PayloadError> {
        let items = match self.raw(name) {
            None if min == 0 => return Ok(Vec::new()),
            None => return Err(PayloadError::missing(self.path(name))),
            Some(Value::Array(items)) => items,
            Some(_) => {
                return Err(PayloadError::new(self.path(name), PayloadIssue::WrongType("an array")))
            }
        };
        if items.len() < min {
            return Err(PayloadError::new(self.path(name), PayloadIssue::TooFew(min)));
        }
        items
            .iter()
            .enumerate()
            .map(|(i, v)| {
                parse_field(v).map_err(|issue| PayloadError::new(format!("{}[{}]", self.path(name), i), issue))
            })
            .collect()
    }

    /// Destination account: a base58 address or any field element form.
    ///
    /// A string of 32 to 44 characters without `0x` that decodes to exactly
    /// 32 bytes is an address, even when it is all digits.
    pub fn destination(&self, name: &str) -> Result<FieldElement, PayloadError> {
        let value = self
            .raw(name)
            .ok_or_else(|| PayloadError::missing(self.path(name)))?;
        if let Value::String(s) = value {
            let s = s.trim();
            if (32..=44).contains(&s.len()) && !s.starts_with("0x") && !s.starts_with("0X") {
                if let Ok(fe) = FieldElement::from_base58_address(s) {
                    return Ok(fe);
                }
            }
        }
        match parse_field(value) {
            Ok(fe) => Ok(fe),
            Err(issue) => match value {
                Value::String(s) => FieldElement::from_base58_address(s)
                    .map_err(|e| PayloadError::new(self.path(name), PayloadIssue::Encoding(e))),
                _ => Err(PayloadError::new(self.path(name), issue)),
            },
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShieldPayload {
    pub mint: Option<String>,
    pub old_root: FieldElement,
    pub amount: u64,
    pub recipient: FieldElement,
    pub deposit_id: FieldElement,
    pub pool_id: FieldElement,
    pub blinding: FieldElement,
    pub mint_id: FieldElement,
}

impl ShieldPayload {
    pub fn parse(value: &Value) -> Result<Self, PayloadError> {
        let r = PayloadReader::new(value)?;
        Ok(Self {
            mint: r.string_opt("mint")?,
            old_root: r.field("oldRoot")?,
            amount: r.amount("amount")?,
            recipient: r.field("recipient")?,
            deposit_id: r.field("depositId")?,
            pool_id: r.field("poolId")?,
            blinding: r.field("blinding")?,
            mint_id: r.field("mintId")?,
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SpendInput {
    pub note_id: FieldElement,
    pub spending_key: FieldElement,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TransferOutput {
    pub amount: u64,
    pub recipient: FieldElement,
    pub blinding: FieldElement,
    pub amount_blinding: FieldElement,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransferPayload {
    pub mint: Option<String>,
    pub old_root: FieldElement,
    pub mint_id: FieldElement,
    pub pool_id: FieldElement,
    pub inputs: Vec<SpendInput>,
    pub outputs: Vec<TransferOutput>,
}

impl TransferPayload {
    pub fn parse(value: &Value) -> Result<Self, PayloadError> {
        let r = PayloadReader::new(value)?;
        let inputs = r
            .objects("inputs", 1, MAX_TRANSFER_NOTES)?
            .into_iter()
            .map(|i| -> Result<SpendInput, PayloadError> {
                Ok(SpendInput {
                    note_id: i.field("noteId")?,
                    spending_key: i.field("spendingKey")?,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        let outputs = r
            .objects("outputs", 1, MAX_TRANSFER_NOTES)?
            .into_iter()
            .map(|o| -> Result<TransferOutput, PayloadError> {
                Ok(TransferOutput {
                    amount: o.amount("amount")?,
                    recipient: o.field("recipient")?,
                    blinding: o.field("blinding")?,
                    amount_blinding: o.field_opt("amountBlinding")?.unwrap_or_default(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            mint: r.string_opt("mint")?,
            old_root: r.field("oldRoot")?,
            mint_id: r.field("mintId")?,
            pool_id: r.field("poolId")?,
            inputs,
            outputs,
        })
    }
}

/// Where unshielded funds go
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnshieldMode {
    /// Back to the origin token
    Origin,
    /// To the pool's twin token
    Twin,
}

impl UnshieldMode {
    const NAMES: &'static [&'static str] = &["origin", "ptkn", "twin", "0", "1"];

    pub fn as_field(&self) -> FieldElement {
        match self {
            UnshieldMode::Origin => FieldElement::zero(),
            UnshieldMode::Twin => FieldElement::from_u64(1),
        }
    }

    fn parse(value: &Value) -> Result<Self, PayloadIssue> {
        match value {
            Value::Number(n) => match n.as_u64() {
                Some(0) => Ok(UnshieldMode::Origin),
                Some(1) => Ok(UnshieldMode::Twin),
                _ => Err(PayloadIssue::NotInSet(Self::NAMES)),
            },
            Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "origin" | "0" => Ok(UnshieldMode::Origin),
                "ptkn" | "twin" | "1" => Ok(UnshieldMode::Twin),
                _ => Err(PayloadIssue::NotInSet(Self::NAMES)),
            },
            _ => Err(PayloadIssue::WrongType("a string or integer")),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnshieldPayload {
    pub mint: Option<String>,
    pub old_root: FieldElement,
    pub mint_id: FieldElement,
    pub pool_id: FieldElement,
    pub note_id: FieldElement,
    pub spending_key: FieldElement,
    pub amount: u64,
    pub fee: Option<u64>,
    pub note_amount: Option<u64>,
    pub destination: FieldElement,
    pub mode: UnshieldMode,
    pub recipient: Option<FieldElement>,
    pub blinding: Option<FieldElement>,
    pub amount_blinding: Option<FieldElement>,
}

impl UnshieldPayload {
    pub fn parse(value: &Value) -> Result<Self, PayloadError> {
        let r = PayloadReader::new(value)?;
        let mode = match r.raw("mode") {
            None => return Err(PayloadError::missing("mode")),
            Some(v) => UnshieldMode::parse(v).map_err(|issue| PayloadError::new("mode", issue))?,
        };
        Ok(Self {
            mint: r.string_opt("mint")?,
            old_root: r.field("oldRoot")?,
            mint_id: r.field("mintId")?,
            pool_id: r.field("poolId")?,
            note_id: r.field("noteId")?,
            spending_key: r.field("spendingKey")?,
            amount: r.amount("amount")?,
            fee: r.amount_opt("fee")?,
            note_amount: r.amount_opt("noteAmount")?,
            destination: r.destination("destination")?,
            mode,
            recipient: r.field_opt("recipient")?,
            blinding: r.field_opt("blinding")?,
            amount_blinding: r.field_opt("amountBlinding")?,
        })
    }
}

/// A validated payload for one of the circuits
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CircuitPayload {
    Shield(ShieldPayload),
    Transfer(TransferPayload),
    Unshield(UnshieldPayload),
}

impl CircuitPayload {
    pub fn parse(circuit: CircuitKind, value: &Value) -> Result<Self, PayloadError> {
        Ok(match circuit {
            CircuitKind::Shield => CircuitPayload::Shield(ShieldPayload::parse(value)?),
            CircuitKind::Transfer => CircuitPayload::Transfer(TransferPayload::parse(value)?),
            CircuitKind::Unshield => CircuitPayload::Unshield(UnshieldPayload::parse(value)?),
        })
    }

    pub fn circuit(&self) -> CircuitKind {
        match self {
            CircuitPayload::Shield(_) => CircuitKind::Shield,
            CircuitPayload::Transfer(_) => CircuitKind::Transfer,
            CircuitPayload::Unshield(_) => CircuitKind::Unshield,
        }
    }

    /// Ledger key of the asset, when the caller named one
    pub fn mint(&self) -> Option<&str> {
        match self {
            CircuitPayload::Shield(p) => p.mint.as_deref(),
            CircuitPayload::Transfer(p) => p.mint.as_deref(),
            CircuitPayload::Unshield(p) => p.mint.as_deref(),
        }
    }
}
