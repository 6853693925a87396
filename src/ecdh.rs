// Invalid-curve attack on ECDH peers that skip point validation. The curve
// arithmetic a victim runs never uses every domain parameter, so a point
// taken from a *different* curve with a smooth order is processed without
// complaint and confines the shared secret to a small subgroup, exactly as
// in the prime-field case. Curve arithmetic itself is an external
// capability: the attack only asks for scalar multiplication, random points
// and the advertised group order.

use num_bigint::BigUint;
use num_traits::{ToPrimitive, Zero};
use rand::rngs::StdRng;
use rayon::prelude::*;

use crate::cancel::CancelToken;
use crate::crt::ResidueSystem;
use crate::errors::{AttackError, Result};
use crate::factor::find_small_factors;

/// An affine point. `(0, 0)` encodes the identity, matching the convention
/// of the curve implementations this attack is aimed at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Point {
    pub x: BigUint,
    pub y: BigUint,
}

impl Point {
    pub fn identity() -> Self {
        Self {
            x: Zero::zero(),
            y: Zero::zero(),
        }
    }

    pub fn is_identity(&self) -> bool {
        self.x.is_zero() && self.y.is_zero()
    }

    /// The byte encoding fed to the tag derivation: x || y, big endian.
    pub fn to_shared_secret_bytes(&self) -> Vec<u8> {
        [self.x.to_bytes_be(), self.y.to_bytes_be()].concat()
    }
}

/// The curve operations the attack consumes. Implementations are free to be
/// real Weierstrass curves or anything else group-shaped; the attack only
/// relies on the group structure and the advertised order.
pub trait Curve: Sync {
    fn name(&self) -> &str;

    fn order(&self) -> &BigUint;

    fn scalar_mult(&self, point: &Point, scalar: &BigUint) -> Point;

    fn random_point(&self, rng: &mut StdRng) -> Point;
}

/// Finds a point of order `order` on `curve` by multiplying random points by
/// `N / order`, rejecting the identity. Gives up with `PointSearchExhausted`
/// after `order` attempts; unlike the prime-field sampler this search is
/// bounded, but the cancel token is still honoured.
pub fn find_point_of_order(
    curve: &dyn Curve,
    order: &BigUint,
    rng: &mut StdRng,
    cancel: &CancelToken,
) -> Result<Point> {
    let scalar = curve.order() / order;
    let mut attempts: BigUint = Zero::zero();
    while &attempts < order {
        if cancel.is_cancelled() {
            return Err(AttackError::Cancelled("searching for a low-order point"));
        }
        let candidate = curve.scalar_mult(&curve.random_point(rng), &scalar);
        if !candidate.is_identity() {
            return Ok(candidate);
        }
        attempts += 1u64;
    }
    Err(AttackError::PointSearchExhausted {
        order: order.clone(),
        curve: curve.name().to_string(),
    })
}

/// The curve-group analog of the prime-field oracle solver: recovers the
/// victim's scalar modulo `order` from the tag it produced for `point`.
/// Candidates run over `[1, order]`; a match at `order` itself means the
/// scalar is divisible by `order`, so the result is reduced before return.
pub fn brute_force_point_multiplier(
    curve: &dyn Curve,
    point: &Point,
    order: &BigUint,
    target_tag: &[u8],
    derive_tag: impl Fn(&[u8]) -> Vec<u8> + Sync,
) -> Result<BigUint> {
    if !curve.scalar_mult(point, order).is_identity() {
        return Err(AttackError::InvalidElementOrder {
            element: format!("({}, {})", point.x, point.y),
            order: order.clone(),
        });
    }

    let bound = order.to_u64().unwrap_or(u64::MAX);
    (1..=bound)
        .into_par_iter()
        .find_map_first(|i| {
            let shared_point = curve.scalar_mult(point, &BigUint::from(i));
            (derive_tag(&shared_point.to_shared_secret_bytes()) == target_tag)
                .then(|| BigUint::from(i) % order)
        })
        .ok_or_else(|| AttackError::NoMatchFound {
            order: order.clone(),
        })
}

/// Recovers the victim's private scalar by sweeping a set of curves that
/// share the victim's field arithmetic but have smooth orders. Each curve
/// contributes residues for the small factors of its order; factors seen on
/// more than one curve are kept once, and the merged system is combined into
/// the scalar modulo the product of every distinct factor. Any sub-step
/// failure aborts the run.
pub fn invalid_curve_attack(
    curves: &[&dyn Curve],
    oracle: impl Fn(&Point) -> Vec<u8>,
    derive_tag: impl Fn(&[u8]) -> Vec<u8> + Sync,
    rng: &mut StdRng,
    cancel: &CancelToken,
) -> Result<BigUint> {
    let mut residues = ResidueSystem::new();
    for curve in curves {
        let factors = find_small_factors(curve.order())?;
        for order in &factors {
            let point = find_point_of_order(*curve, order, rng, cancel)?;
            let tag = oracle(&point);
            let residue = brute_force_point_multiplier(*curve, &point, order, &tag, &derive_tag)?;
            residues.push_unique(residue, order.clone());
        }
    }

    let (secret, _) = residues.combine()?;
    Ok(secret)
}

/// Small-subgroup attack against a single curve with a partially smooth
/// order. Deliberately unimplemented; the invalid-curve sweep covers the
/// interesting cases.
pub fn single_curve_attack(
    _curve: &dyn Curve,
    _oracle: impl Fn(&Point) -> Vec<u8>,
) -> Result<BigUint> {
    Err(AttackError::NotImplemented("single-curve small-subgroup"))
}

/// Twist attack on a Montgomery-ladder x-coordinate exchange. Deliberately
/// unimplemented.
pub fn twist_attack(
    _oracle: impl Fn(&BigUint) -> Vec<u8>,
    _get_public_key: impl FnOnce() -> BigUint,
) -> Result<BigUint> {
    Err(AttackError::NotImplemented("Montgomery twist"))
}

#[cfg(test)]
mod tests {
    use super::*;

    use num_bigint::RandBigInt;
    use num_traits::One;
    use rand::SeedableRng;

    use crate::test_support::{mix_key, P_2311};

    // The attack sees curves only through the `Curve` capability, so the
    // tests drive it with mock curves built on subgroups of the
    // multiplicative group modulo 2311 (2310 = 2 * 3 * 5 * 7 * 11). All
    // mocks share one field and one scalar operation, mirroring how invalid
    // curves share the victim's formulas, while advertising different smooth
    // orders.
    struct MockCurve {
        name: &'static str,
        order: BigUint,
        p: BigUint,
    }

    impl MockCurve {
        fn new(name: &'static str, order: u64) -> Self {
            Self {
                name,
                order: BigUint::from(order),
                p: BigUint::from(P_2311),
            }
        }
    }

    fn lift(value: BigUint) -> Point {
        if value.is_one() {
            Point::identity()
        } else {
            Point {
                x: value.clone(),
                y: value,
            }
        }
    }

    impl Curve for MockCurve {
        fn name(&self) -> &str {
            self.name
        }

        fn order(&self) -> &BigUint {
            &self.order
        }

        fn scalar_mult(&self, point: &Point, scalar: &BigUint) -> Point {
            lift(point.x.modpow(scalar, &self.p))
        }

        fn random_point(&self, rng: &mut StdRng) -> Point {
            let group_order = &self.p - BigUint::one();
            let element = rng
                .gen_biguint_range(&One::one(), &self.p)
                .modpow(&(group_order / &self.order), &self.p);
            lift(element)
        }
    }

    /// A curve whose points all collapse to the identity, so no point of any
    /// order can ever be found on it.
    struct DegenerateCurve {
        order: BigUint,
    }

    impl Curve for DegenerateCurve {
        fn name(&self) -> &str {
            "degenerate"
        }

        fn order(&self) -> &BigUint {
            &self.order
        }

        fn scalar_mult(&self, _point: &Point, _scalar: &BigUint) -> Point {
            Point::identity()
        }

        fn random_point(&self, _rng: &mut StdRng) -> Point {
            Point::identity()
        }
    }

    fn victim_oracle<'a>(secret: &'a BigUint, p: &'a BigUint) -> impl Fn(&Point) -> Vec<u8> + 'a {
        move |point: &Point| {
            let shared = lift(point.x.modpow(secret, p));
            mix_key(&shared.to_shared_secret_bytes())
        }
    }

    #[test]
    fn invalid_curve_attack_recovers_the_scalar_across_curves() {
        // Orders 6, 35 and 66 factor into {2, 3}, {5, 7} and {2, 3, 11}:
        // overlapping factor sets whose union pins the scalar modulo 2310.
        let curves = [
            MockCurve::new("toy-v1", 6),
            MockCurve::new("toy-v2", 35),
            MockCurve::new("toy-v3", 66),
        ];
        let curve_refs: Vec<&dyn Curve> = curves.iter().map(|c| c as &dyn Curve).collect();
        let p = BigUint::from(P_2311);
        let mut rng = StdRng::from_seed([101; 32]);
        let secret = rng.gen_biguint_range(&One::one(), &BigUint::from(2310u64));
        let oracle = victim_oracle(&secret, &p);

        let recovered =
            invalid_curve_attack(&curve_refs, oracle, mix_key, &mut rng, &CancelToken::new())
                .unwrap();

        assert_eq!(recovered, secret);
    }

    #[test]
    fn point_search_on_a_degenerate_curve_is_exhausted() {
        let curve = DegenerateCurve {
            order: BigUint::from(6u64),
        };
        let mut rng = StdRng::from_seed([101; 32]);

        let result =
            find_point_of_order(&curve, &BigUint::from(3u64), &mut rng, &CancelToken::new());

        assert!(matches!(
            result,
            Err(AttackError::PointSearchExhausted { .. })
        ));
    }

    #[test]
    fn found_points_have_the_requested_order() {
        let curve = MockCurve::new("toy", 66);
        let mut rng = StdRng::from_seed([101; 32]);

        for order in [2u64, 3, 11] {
            let order = BigUint::from(order);
            let point =
                find_point_of_order(&curve, &order, &mut rng, &CancelToken::new()).unwrap();

            assert!(!point.is_identity());
            assert!(curve.scalar_mult(&point, &order).is_identity());
        }
    }

    #[test]
    fn point_of_the_wrong_order_is_rejected_by_the_brute_force() {
        let curve = MockCurve::new("toy", 66);
        let mut rng = StdRng::from_seed([101; 32]);
        let point =
            find_point_of_order(&curve, &BigUint::from(11u64), &mut rng, &CancelToken::new())
                .unwrap();

        let result =
            brute_force_point_multiplier(&curve, &point, &BigUint::from(5u64), b"tag", mix_key);

        assert!(matches!(
            result,
            Err(AttackError::InvalidElementOrder { .. })
        ));
    }

    #[test]
    fn scalar_divisible_by_the_order_reduces_to_zero() {
        let curve = MockCurve::new("toy", 6);
        let p = BigUint::from(P_2311);
        let mut rng = StdRng::from_seed([101; 32]);
        let order = BigUint::from(3u64);
        let point = find_point_of_order(&curve, &order, &mut rng, &CancelToken::new()).unwrap();
        let secret = BigUint::from(6u64);
        let tag = victim_oracle(&secret, &p)(&point);

        let residue =
            brute_force_point_multiplier(&curve, &point, &order, &tag, mix_key).unwrap();

        assert!(residue.is_zero());
    }

    #[test]
    fn unported_attack_variants_report_not_implemented() {
        let curve = MockCurve::new("toy", 6);

        let single = single_curve_attack(&curve, |_| Vec::new());
        let twist = twist_attack(|_| Vec::new(), || BigUint::from(1u64));

        assert!(matches!(single, Err(AttackError::NotImplemented(_))));
        assert!(matches!(twist, Err(AttackError::NotImplemented(_))));
    }
}
