use crate::setpoint::InputViolation;
use thiserror::Error;

/// A physical formula was evaluated outside the domain where it is defined.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    #[error("negative radicand in {what}: {value}")]
    NegativeRadicand { what: &'static str, value: f64 },

    #[error("division by zero in {what}")]
    DivisionByZero { what: &'static str },

    #[error("non-finite value for {what}: {value}")]
    NonFinite { what: &'static str, value: f64 },

    #[error("invalid geometry: crank radius {crank_radius} with rod length {rod_length}")]
    InvalidGeometry { crank_radius: f64, rod_length: f64 },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Input(#[from] InputViolation),
}

pub fn ensure_finite(value: f64, what: &'static str) -> Result<f64, DomainError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(DomainError::NonFinite { what, value })
    }
}

pub fn ensure_nonzero(value: f64, what: &'static str) -> Result<f64, DomainError> {
    if value == 0.0 {
        Err(DomainError::DivisionByZero { what })
    } else {
        Ok(value)
    }
}
