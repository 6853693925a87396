mod cancel;
mod crt;
mod dh;
mod ecdh;
mod errors;
mod factor;
mod kangaroo;
mod subgroup;
#[cfg(test)]
mod test_support;

pub use cancel::CancelToken;
pub use crt::ResidueSystem;
pub use dh::{kangaroo_attack, small_subgroup_attack, DhParams};
pub use ecdh::{
    brute_force_point_multiplier, find_point_of_order, invalid_curve_attack, single_curve_attack,
    twist_attack, Curve, Point,
};
pub use errors::{AttackError, Result};
pub use factor::find_small_factors;
pub use kangaroo::catch_kangaroo;
pub use subgroup::{brute_force_secret_mod_order, find_element_of_small_order};
