use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    #[error("malformed address {address:?}: {reason}")]
    Malformed {
        address: String,
        reason: &'static str,
    },

    #[error("invalid step {step:?} in address {address:?}")]
    InvalidStep { address: String, step: String },
}

impl AddressError {
    pub(crate) fn malformed(address: &str, reason: &'static str) -> Self {
        AddressError::Malformed {
            address: address.to_string(),
            reason,
        }
    }
}
