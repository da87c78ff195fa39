//! Property-based tests.

use num_bigint::BigUint;
use num_integer::Integer;
use num_traits::One;
use proptest::prelude::*;
use rand_chacha::ChaCha8Rng;
use rand_core::SeedableRng;
use rsa_cosign::hazmat::{compute_private_exponent, crt_combine, split_exponent};
use rsa_cosign::{
    verify, Channel, Client, MemoryChannel, MessageRecord, Party, ProtocolConfig, PublicKeyParts,
    RsaPublicKey, Server, Signature,
};

// p - 1 is coprime to 65537 for each of these
const PRIMES: &[u64] = &[999_979, 999_983, 1_000_003, 1_000_033, 1_000_037, 1_000_039];

prop_compose! {
    // WARNING: do *NOT* copy and paste this code. It's insecure and optimized for test speed.
    fn parties()(seed in any::<[u8; 32]>()) -> MemoryChannel {
        let mut rng = ChaCha8Rng::from_seed(seed);
        let config = ProtocolConfig::default().with_modulus_bits(256).unwrap();
        let mut channel = MemoryChannel::new();
        Client::new(config.clone()).generate(&mut channel, &mut rng).unwrap();
        Server::new(config).generate(&mut channel, &mut rng).unwrap();
        channel
    }
}

proptest! {
    #[test]
    fn exponent_split_sums_to_exponent(
        p in prop::sample::select(PRIMES),
        q in prop::sample::select(PRIMES),
        seed in any::<[u8; 32]>(),
    ) {
        prop_assume!(p != q);
        let mut rng = ChaCha8Rng::from_seed(seed);
        let e = BigUint::from(65537u32);
        let (phi, d) = compute_private_exponent(&BigUint::from(p), &BigUint::from(q), &e).unwrap();
        prop_assert_eq!((&e * &*d) % &*phi, BigUint::one());

        let (d_client, d_server) = split_exponent(&mut rng, &d, &phi, 40);
        prop_assert!(*d_client < *phi);
        prop_assert_eq!((&*d_client + &*d_server) % &*phi, (*d).clone());
    }

    #[test]
    fn crt_combination_round_trip(
        n1 in 2u64..u32::MAX as u64,
        n2 in 2u64..u32::MAX as u64,
        s1 in any::<u64>(),
        s2 in any::<u64>(),
    ) {
        prop_assume!(n1.gcd(&n2) == 1);
        let (s1, s2) = (s1 % n1, s2 % n2);
        let (n1, n2) = (BigUint::from(n1), BigUint::from(n2));

        let s = crt_combine(&BigUint::from(s1), &n1, &BigUint::from(s2), &n2).unwrap();
        prop_assert!(s < &n1 * &n2);
        prop_assert_eq!(&s % &n1, BigUint::from(s1));
        prop_assert_eq!(&s % &n2, BigUint::from(s2));
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn cosigned_signature_verifies(mut channel in parties(), m in any::<[u8; 24]>()) {
        let m = BigUint::from_bytes_be(&m);
        let config = ProtocolConfig::default().with_modulus_bits(256).unwrap();

        channel.send(&MessageRecord::new(m.clone())).unwrap();
        Client::new(config.clone()).sign(&mut channel).unwrap();
        Server::new(config.clone()).sign(&mut channel).unwrap();

        let public: RsaPublicKey = channel.receive().unwrap();
        let signature: Signature = channel.receive().unwrap();
        prop_assert_eq!(signature.m(), &m);
        prop_assert!(verify(&m, signature.s(), public.e(), public.n()));
        prop_assert!(!verify(&(m + 1u32), signature.s(), public.e(), public.n()));
        prop_assert!(Client::new(config).verify(&mut channel).is_ok());
    }
}
