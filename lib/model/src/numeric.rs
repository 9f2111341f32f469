use crate::{ThinError, ThinResult};
use oxrdf::vocab::xsd;
use oxrdf::{Literal, NamedNodeRef};
use oxsdatatypes::{Decimal, Double, Float, Integer};
use std::cmp::Ordering;
use std::str::FromStr;

/// A numeric value of one of the XSD numeric types.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Numeric {
    Integer(Integer),
    Decimal(Decimal),
    Float(Float),
    Double(Double),
}

/// Two numeric values promoted to a common type.
///
/// The promotion follows the XPath type hierarchy: `integer < decimal < float < double`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum NumericPair {
    Integer(Integer, Integer),
    Decimal(Decimal, Decimal),
    Float(Float, Float),
    Double(Double, Double),
}

impl NumericPair {
    /// Promotes `lhs` and `rhs` to their least common numeric type.
    pub fn with_casts_from(lhs: Numeric, rhs: Numeric) -> Self {
        match (lhs, rhs) {
            (Numeric::Integer(lhs), Numeric::Integer(rhs)) => NumericPair::Integer(lhs, rhs),
            (Numeric::Integer(lhs), Numeric::Decimal(rhs)) => {
                NumericPair::Decimal(Decimal::from(lhs), rhs)
            }
            (Numeric::Decimal(lhs), Numeric::Integer(rhs)) => {
                NumericPair::Decimal(lhs, Decimal::from(rhs))
            }
            (Numeric::Decimal(lhs), Numeric::Decimal(rhs)) => NumericPair::Decimal(lhs, rhs),
            (Numeric::Integer(lhs), Numeric::Float(rhs)) => NumericPair::Float(lhs.into(), rhs),
            (Numeric::Float(lhs), Numeric::Integer(rhs)) => NumericPair::Float(lhs, rhs.into()),
            (Numeric::Decimal(lhs), Numeric::Float(rhs)) => NumericPair::Float(lhs.into(), rhs),
            (Numeric::Float(lhs), Numeric::Decimal(rhs)) => NumericPair::Float(lhs, rhs.into()),
            (Numeric::Float(lhs), Numeric::Float(rhs)) => NumericPair::Float(lhs, rhs),
            (lhs, rhs) => NumericPair::Double(lhs.to_double(), rhs.to_double()),
        }
    }
}

impl Numeric {
    /// Parses a numeric value from a literal with a numeric datatype.
    ///
    /// Returns `None` if the datatype is not numeric and an error if the lexical form is invalid.
    pub fn from_literal(literal: &Literal) -> Option<ThinResult<Self>> {
        let value = literal.value();
        let datatype = literal.datatype();
        if is_integer_datatype(datatype) {
            Some(Integer::from_str(value).map(Numeric::Integer).map_err(Into::into))
        } else if datatype == xsd::DECIMAL {
            Some(Decimal::from_str(value).map(Numeric::Decimal).map_err(Into::into))
        } else if datatype == xsd::FLOAT {
            Some(Float::from_str(value).map(Numeric::Float).map_err(Into::into))
        } else if datatype == xsd::DOUBLE {
            Some(Double::from_str(value).map(Numeric::Double).map_err(Into::into))
        } else {
            None
        }
    }

    /// Returns the canonical literal of this value.
    pub fn to_literal(self) -> Literal {
        match self {
            Numeric::Integer(value) => Literal::new_typed_literal(value.to_string(), xsd::INTEGER),
            Numeric::Decimal(value) => Literal::new_typed_literal(value.to_string(), xsd::DECIMAL),
            Numeric::Float(value) => Literal::new_typed_literal(value.to_string(), xsd::FLOAT),
            Numeric::Double(value) => Literal::new_typed_literal(value.to_string(), xsd::DOUBLE),
        }
    }

    fn to_double(self) -> Double {
        match self {
            Numeric::Integer(value) => value.into(),
            Numeric::Decimal(value) => value.into(),
            Numeric::Float(value) => value.into(),
            Numeric::Double(value) => value,
        }
    }

    /// [op:numeric-add](https://www.w3.org/TR/xpath-functions-31/#func-numeric-add)
    pub fn checked_add(self, rhs: Self) -> ThinResult<Self> {
        match NumericPair::with_casts_from(self, rhs) {
            NumericPair::Integer(lhs, rhs) => lhs.checked_add(rhs).map(Numeric::Integer),
            NumericPair::Decimal(lhs, rhs) => lhs.checked_add(rhs).map(Numeric::Decimal),
            NumericPair::Float(lhs, rhs) => Some(Numeric::Float(lhs + rhs)),
            NumericPair::Double(lhs, rhs) => Some(Numeric::Double(lhs + rhs)),
        }
        .ok_or(ThinError::default())
    }

    /// [op:numeric-subtract](https://www.w3.org/TR/xpath-functions-31/#func-numeric-subtract)
    pub fn checked_sub(self, rhs: Self) -> ThinResult<Self> {
        match NumericPair::with_casts_from(self, rhs) {
            NumericPair::Integer(lhs, rhs) => lhs.checked_sub(rhs).map(Numeric::Integer),
            NumericPair::Decimal(lhs, rhs) => lhs.checked_sub(rhs).map(Numeric::Decimal),
            NumericPair::Float(lhs, rhs) => Some(Numeric::Float(lhs - rhs)),
            NumericPair::Double(lhs, rhs) => Some(Numeric::Double(lhs - rhs)),
        }
        .ok_or(ThinError::default())
    }

    /// [op:numeric-multiply](https://www.w3.org/TR/xpath-functions-31/#func-numeric-multiply)
    pub fn checked_mul(self, rhs: Self) -> ThinResult<Self> {
        match NumericPair::with_casts_from(self, rhs) {
            NumericPair::Integer(lhs, rhs) => lhs.checked_mul(rhs).map(Numeric::Integer),
            NumericPair::Decimal(lhs, rhs) => lhs.checked_mul(rhs).map(Numeric::Decimal),
            NumericPair::Float(lhs, rhs) => Some(Numeric::Float(lhs * rhs)),
            NumericPair::Double(lhs, rhs) => Some(Numeric::Double(lhs * rhs)),
        }
        .ok_or(ThinError::default())
    }

    /// [op:numeric-divide](https://www.w3.org/TR/xpath-functions-31/#func-numeric-divide)
    ///
    /// Dividing two integers results in a decimal.
    pub fn checked_div(self, rhs: Self) -> ThinResult<Self> {
        match NumericPair::with_casts_from(self, rhs) {
            NumericPair::Integer(lhs, rhs) => {
                Decimal::from(lhs).checked_div(rhs).map(Numeric::Decimal)
            }
            NumericPair::Decimal(lhs, rhs) => lhs.checked_div(rhs).map(Numeric::Decimal),
            NumericPair::Float(lhs, rhs) => Some(Numeric::Float(lhs / rhs)),
            NumericPair::Double(lhs, rhs) => Some(Numeric::Double(lhs / rhs)),
        }
        .ok_or(ThinError::default())
    }

    /// [op:numeric-unary-minus](https://www.w3.org/TR/xpath-functions-31/#func-numeric-unary-minus)
    pub fn checked_neg(self) -> ThinResult<Self> {
        match self {
            Numeric::Integer(value) => value.checked_neg().map(Numeric::Integer),
            Numeric::Decimal(value) => value.checked_neg().map(Numeric::Decimal),
            Numeric::Float(value) => Some(Numeric::Float(-value)),
            Numeric::Double(value) => Some(Numeric::Double(-value)),
        }
        .ok_or(ThinError::default())
    }

    /// [fn:abs](https://www.w3.org/TR/xpath-functions-31/#func-abs)
    pub fn checked_abs(self) -> ThinResult<Self> {
        match self {
            Numeric::Integer(value) => value.checked_abs().map(Numeric::Integer),
            Numeric::Decimal(value) => value.checked_abs().map(Numeric::Decimal),
            Numeric::Float(value) => Some(Numeric::Float(value.abs())),
            Numeric::Double(value) => Some(Numeric::Double(value.abs())),
        }
        .ok_or(ThinError::default())
    }

    /// [fn:ceiling](https://www.w3.org/TR/xpath-functions-31/#func-ceiling)
    pub fn checked_ceil(self) -> ThinResult<Self> {
        match self {
            Numeric::Integer(value) => Some(Numeric::Integer(value)),
            Numeric::Decimal(value) => value.checked_ceil().map(Numeric::Decimal),
            Numeric::Float(value) => Some(Numeric::Float(value.ceil())),
            Numeric::Double(value) => Some(Numeric::Double(value.ceil())),
        }
        .ok_or(ThinError::default())
    }

    /// [fn:floor](https://www.w3.org/TR/xpath-functions-31/#func-floor)
    pub fn checked_floor(self) -> ThinResult<Self> {
        match self {
            Numeric::Integer(value) => Some(Numeric::Integer(value)),
            Numeric::Decimal(value) => value.checked_floor().map(Numeric::Decimal),
            Numeric::Float(value) => Some(Numeric::Float(value.floor())),
            Numeric::Double(value) => Some(Numeric::Double(value.floor())),
        }
        .ok_or(ThinError::default())
    }

    /// [fn:round](https://www.w3.org/TR/xpath-functions-31/#func-round)
    pub fn checked_round(self) -> ThinResult<Self> {
        match self {
            Numeric::Integer(value) => Some(Numeric::Integer(value)),
            Numeric::Decimal(value) => value.checked_round().map(Numeric::Decimal),
            Numeric::Float(value) => Some(Numeric::Float(value.round())),
            Numeric::Double(value) => Some(Numeric::Double(value.round())),
        }
        .ok_or(ThinError::default())
    }

    /// Compares two numeric values after promoting them to a common type.
    pub fn compare(self, rhs: Self) -> Option<Ordering> {
        match NumericPair::with_casts_from(self, rhs) {
            NumericPair::Integer(lhs, rhs) => Some(lhs.cmp(&rhs)),
            NumericPair::Decimal(lhs, rhs) => Some(lhs.cmp(&rhs)),
            NumericPair::Float(lhs, rhs) => lhs.partial_cmp(&rhs),
            NumericPair::Double(lhs, rhs) => lhs.partial_cmp(&rhs),
        }
    }

    /// The [effective boolean value](https://www.w3.org/TR/sparql11-query/#ebv) of the number.
    pub fn is_truthy(self) -> bool {
        match self {
            Numeric::Integer(value) => value != Integer::from(0_i64),
            Numeric::Decimal(value) => value != Decimal::from(0_i64),
            Numeric::Float(value) => {
                let value = f32::from(value);
                value != 0.0 && !value.is_nan()
            }
            Numeric::Double(value) => {
                let value = f64::from(value);
                value != 0.0 && !value.is_nan()
            }
        }
    }
}

/// Checks whether the datatype is `xsd:integer` or one of its derived types.
pub fn is_integer_datatype(datatype: NamedNodeRef<'_>) -> bool {
    static INTEGER_DATATYPES: &[NamedNodeRef<'_>; 13] = &[
        xsd::INTEGER,
        xsd::BYTE,
        xsd::SHORT,
        xsd::INT,
        xsd::LONG,
        xsd::UNSIGNED_BYTE,
        xsd::UNSIGNED_SHORT,
        xsd::UNSIGNED_INT,
        xsd::UNSIGNED_LONG,
        xsd::POSITIVE_INTEGER,
        xsd::NEGATIVE_INTEGER,
        xsd::NON_POSITIVE_INTEGER,
        xsd::NON_NEGATIVE_INTEGER,
    ];
    INTEGER_DATATYPES.contains(&datatype)
}

/// Checks if the datatype is a numeric datatype.
pub fn is_numeric_datatype(datatype: NamedNodeRef<'_>) -> bool {
    is_integer_datatype(datatype)
        || datatype == xsd::DECIMAL
        || datatype == xsd::FLOAT
        || datatype == xsd::DOUBLE
}
