use crate::utils::error::{Result, TailError};

/// φ(q) for every q in [1, up_to] via the multiplicative sieve,
/// O(up_to·log log up_to).  The returned table is indexed by q (slot 0 is
/// unused).  Allocates the full table; the streaming paths use [`totient`]
/// instead so memory stays flat regardless of cutoff.
pub fn totients(up_to: u64) -> Result<Vec<u64>> {
    if up_to < 1 {
        return Err(TailError::domain("up_to", up_to, "a cutoff of at least 1"));
    }
    let n = up_to as usize;
    let mut phi: Vec<u64> = (0..=up_to).collect();
    for p in 2..=n {
        if phi[p] == p as u64 {
            // p is prime: apply the (1 - 1/p) factor to every multiple
            let mut k = p;
            while k <= n {
                phi[k] -= phi[k] / p as u64;
                k += p;
            }
        }
    }
    Ok(phi)
}

/// φ(n) by trial division, O(√n) and allocation-free.
pub fn totient(n: u64) -> Result<u64> {
    if n < 1 {
        return Err(TailError::domain("q", n, "a modulus of at least 1"));
    }
    let mut x = n;
    let mut r = n;
    let mut p: u64 = 2;
    while p.saturating_mul(p) <= x {
        if x % p == 0 {
            while x % p == 0 {
                x /= p;
            }
            r -= r / p;
        }
        p += if p == 2 { 1 } else { 2 };
    }
    if x > 1 {
        r -= r / x;
    }
    Ok(r)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_totient_base_and_primes() {
        assert_eq!(totient(1).unwrap(), 1);
        for p in [2u64, 3, 5, 7, 11, 13, 101, 5237] {
            assert_eq!(totient(p).unwrap(), p - 1, "phi({}) should be p-1", p);
        }
    }

    #[test]
    fn test_totient_known_values() {
        assert_eq!(totient(12).unwrap(), 4);
        assert_eq!(totient(36).unwrap(), 12);
        assert_eq!(totient(1000).unwrap(), 400);
    }

    #[test]
    fn test_totient_multiplicative_on_coprime_factors() {
        // gcd(9, 25) = 1
        assert_eq!(
            totient(9 * 25).unwrap(),
            totient(9).unwrap() * totient(25).unwrap()
        );
        // gcd(8, 15) = 1
        assert_eq!(
            totient(8 * 15).unwrap(),
            totient(8).unwrap() * totient(15).unwrap()
        );
    }

    #[test]
    fn test_sieve_matches_trial_division() {
        let table = totients(2000).unwrap();
        for q in 1..=2000u64 {
            assert_eq!(table[q as usize], totient(q).unwrap(), "phi({}) mismatch", q);
        }
    }

    #[test]
    fn test_domain_errors() {
        assert!(totients(0).is_err());
        assert!(totient(0).is_err());
    }
}
