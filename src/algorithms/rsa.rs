//! Raw RSA operations over the two sub-moduli and their CRT combination

use alloc::vec::Vec;
use num_bigint::Sign::Plus;
use num_bigint::{BigInt, BigUint, IntoBigUint, ModInverse, RandBigInt};
use num_integer::Integer;
use num_traits::{One, Zero};
use rand_core::CryptoRngCore;
use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

use crate::errors::{Error, Result};

/// ⚠️ Raw RSA exponentiation `m^d mod n`. No padding is performed.
///
/// Used both for a party's full exponent and for an additive share of one.
#[inline]
pub fn rsa_sign_raw(m: &BigUint, d: &BigUint, n: &BigUint) -> BigUint {
    m.modpow(d, n)
}

/// Checks `s^e mod n == m` in constant time over the modulus width.
///
/// A signature that is not reduced modulo `n` never verifies.
pub fn rsa_verify_raw(m: &BigUint, s: &BigUint, e: &BigUint, n: &BigUint) -> bool {
    if n.is_zero() || s >= n || m >= n {
        return false;
    }

    let recovered = s.modpow(e, n);
    ct_eq_mod(&recovered, m, n)
}

/// Returns `(p-1)(q-1)` together with `d = e^-1 mod (p-1)(q-1)`.
pub fn compute_private_exponent(
    p: &BigUint,
    q: &BigUint,
    e: &BigUint,
) -> Result<(Zeroizing<BigUint>, Zeroizing<BigUint>)> {
    let phi = Zeroizing::new((p - BigUint::one()) * (q - BigUint::one()));
    let d = Zeroizing::new(inverse_mod(e, &phi).map_err(|_| {
        Error::arithmetic("public exponent is not invertible modulo the totient")
    })?);

    Ok((phi, d))
}

/// Splits `d` into `(d_client, d_server)` with
/// `d_client + d_server ≡ d (mod phi)`.
///
/// `d_client` is drawn uniformly below `2^bits` and then reduced modulo `phi`.
pub fn split_exponent<R: CryptoRngCore + ?Sized>(
    rng: &mut R,
    d: &BigUint,
    phi: &BigUint,
    bits: usize,
) -> (Zeroizing<BigUint>, Zeroizing<BigUint>) {
    let mut sample = Zeroizing::new(rng.gen_biguint(bits));
    *sample %= phi;
    let d_client = sample;

    // d, d_client < phi so the sum below never underflows
    let mut d_server = Zeroizing::new(d + phi);
    *d_server -= &*d_client;
    *d_server %= phi;

    (d_client, d_server)
}

/// Completes the client's signature share: `s1 = m^d_server * y mod n1`.
///
/// Equals `m^d1 mod n1` whenever `y = m^d_client mod n1` and the two shares
/// sum to `d1` modulo `φ(n1)`.
pub fn complete_client_share(
    m: &BigUint,
    y: &BigUint,
    d_server: &BigUint,
    n1: &BigUint,
) -> BigUint {
    let mut s1 = rsa_sign_raw(m, d_server, n1);
    s1 *= y;
    s1 %= n1;
    s1
}

/// Fraud check on a completed client share: `s1^e mod n1` must give back `m`.
pub fn check_client_share(m: &BigUint, s1: &BigUint, e: &BigUint, n1: &BigUint) -> Result<()> {
    if rsa_verify_raw(m, s1, e, n1) {
        Ok(())
    } else {
        Err(Error::FraudDetected)
    }
}

/// Garner's recombination of `s1 mod n1` and `s2 mod n2` for coprime moduli.
///
/// `t = (s2 - s1) * (n1^-1 mod n2) mod n2` and `s = s1 + n1 * t`, which is
/// the unique value below `n1 * n2` congruent to both residues.
pub fn crt_combine(s1: &BigUint, n1: &BigUint, s2: &BigUint, n2: &BigUint) -> Result<BigUint> {
    if s1 >= n1 || s2 >= n2 {
        return Err(Error::invariant("residue is not reduced modulo its modulus"));
    }

    let n1_inv = inverse_mod(n1, n2)
        .map_err(|_| Error::arithmetic("client modulus is not invertible modulo server modulus"))?;

    // (s2 - s1) mod n2 without leaving the unsigned domain
    let mut t = s2 + n2;
    t -= s1 % n2;
    t %= n2;
    t *= &n1_inv;
    t %= n2;

    let mut s = t * n1;
    s += s1;
    Ok(s)
}

/// Modular inverse `a^-1 mod m`, normalized into `[0, m)`.
pub(crate) fn inverse_mod(a: &BigUint, m: &BigUint) -> Result<BigUint> {
    if m.is_zero() {
        return Err(Error::arithmetic("modulus is zero"));
    }
    if m.is_one() {
        return Ok(BigUint::zero());
    }

    let a = a % m;
    if a.is_zero() {
        return Err(Error::arithmetic("zero has no inverse"));
    }

    let inv = a
        .mod_inverse(m)
        .ok_or_else(|| Error::arithmetic("no modular inverse exists"))?;

    let m_int = BigInt::from_biguint(Plus, m.clone());
    let inv = inv.mod_floor(&m_int);
    inv.into_biguint()
        .ok_or_else(|| Error::arithmetic("modular inverse is negative"))
}

/// Compares two residues as fixed-width big-endian strings.
pub(crate) fn ct_eq_mod(a: &BigUint, b: &BigUint, n: &BigUint) -> bool {
    let width = (n.bits() + 7) / 8;
    match (left_pad(&a.to_bytes_be(), width), left_pad(&b.to_bytes_be(), width)) {
        (Some(a), Some(b)) => a.as_slice().ct_eq(b.as_slice()).into(),
        _ => false,
    }
}

/// Returns a new vector of the given length, with 0s left padded.
#[inline]
fn left_pad(input: &[u8], padded_len: usize) -> Option<Zeroizing<Vec<u8>>> {
    if input.len() > padded_len {
        return None;
    }

    let mut out = Zeroizing::new(vec![0u8; padded_len]);
    out[padded_len - input.len()..].copy_from_slice(input);
    Some(out)
}
