use num_bigint::BigUint;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AttackError>;

/// Everything that can go wrong during an attack run. A sub-step failure
/// aborts the whole run; none of these are retried internally.
#[derive(Debug, Error)]
pub enum AttackError {
    #[error("no factors of {cofactor} below 2^16")]
    NoSmallFactorsFound { cofactor: BigUint },

    #[error("element {element} does not have order {order}")]
    InvalidElementOrder { element: String, order: BigUint },

    #[error("exhausted all candidates modulo {order} without matching the target tag")]
    NoMatchFound { order: BigUint },

    #[error("moduli are not pairwise coprime (offending modulus {modulus})")]
    NonCoprimeModuli { modulus: BigUint },

    #[error("tame kangaroo did not land on g^(b + x) modulo {modulus}")]
    TameKangarooDivergence { modulus: BigUint },

    #[error("kangaroo collision produced a candidate that does not reproduce the target")]
    CollisionVerificationFailed,

    #[error("wild kangaroo escaped the interval without a collision")]
    NotFound,

    #[error("no point of order {order} found on curve {curve}")]
    PointSearchExhausted { order: BigUint, curve: String },

    #[error("the {0} attack is not implemented")]
    NotImplemented(&'static str),

    #[error("cancelled while {0}")]
    Cancelled(&'static str),
}
