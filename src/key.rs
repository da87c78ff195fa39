use core::fmt;
use core::mem;

use alloc::vec::Vec;
use num_bigint::BigUint;
use zeroize::Zeroize;

use crate::algorithms::rsa::rsa_verify_raw;
use crate::encoding::Record;
use crate::errors::{Error, Result};
use crate::signature::Signature;
use crate::traits::{PrivateKeyParts, PublicKeyParts};

/// The combined public key `(e, N)` with `N = n1 * n2`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RsaPublicKey {
    /// Public exponent
    e: BigUint,
    /// Combined modulus
    n: BigUint,
}

impl RsaPublicKey {
    /// Wraps an exponent and a combined modulus without further checks. Use
    /// [`combine_moduli`](crate::combine_moduli) to derive a checked key.
    pub fn new_unchecked(e: BigUint, n: BigUint) -> Self {
        RsaPublicKey { e, n }
    }

    /// Verifies `signature` against this key.
    pub fn verify(&self, signature: &Signature) -> Result<()> {
        if signature.m() >= &self.n {
            return Err(Error::invariant("message is not below the public modulus"));
        }
        if rsa_verify_raw(signature.m(), signature.s(), &self.e, &self.n) {
            Ok(())
        } else {
            Err(Error::invariant("signature does not verify"))
        }
    }
}

impl PublicKeyParts for RsaPublicKey {
    fn n(&self) -> &BigUint {
        &self.n
    }

    fn e(&self) -> &BigUint {
        &self.e
    }
}

impl Record for RsaPublicKey {
    const NAME: &'static str = "public_key.key";
    const LINES: usize = 2;

    fn to_values(&self) -> Vec<&BigUint> {
        vec![&self.e, &self.n]
    }

    fn from_values(values: &mut [BigUint]) -> Result<Self> {
        Ok(RsaPublicKey {
            e: mem::take(&mut values[0]),
            n: mem::take(&mut values[1]),
        })
    }
}

macro_rules! exponent_share {
    (
        $(#[$meta:meta])*
        $name:ident $(, $record:literal)?
    ) => {
        $(#[$meta])*
        #[derive(Clone, PartialEq, Eq)]
        pub struct $name {
            /// Private exponent or exponent share
            d: BigUint,
            /// Sub-modulus the exponent works under
            n: BigUint,
        }

        impl $name {
            /// Binds an exponent to its sub-modulus.
            pub fn new(d: BigUint, n: BigUint) -> Self {
                $name { d, n }
            }
        }

        impl PrivateKeyParts for $name {
            fn n(&self) -> &BigUint {
                &self.n
            }

            fn d(&self) -> &BigUint {
                &self.d
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_struct(stringify!($name))
                    .field("n_bits", &self.n.bits())
                    .finish_non_exhaustive()
            }
        }

        impl Zeroize for $name {
            fn zeroize(&mut self) {
                self.d.zeroize();
                self.n.zeroize();
            }
        }

        impl Drop for $name {
            fn drop(&mut self) {
                self.zeroize();
            }
        }

        $(
            impl Record for $name {
                const NAME: &'static str = $record;
                const LINES: usize = 2;
                const SECRET: bool = true;

                fn to_values(&self) -> Vec<&BigUint> {
                    vec![&self.d, &self.n]
                }

                fn from_values(values: &mut [BigUint]) -> Result<Self> {
                    Ok($name {
                        d: mem::take(&mut values[0]),
                        n: mem::take(&mut values[1]),
                    })
                }
            }
        )?
    };
}

exponent_share!(
    /// The client's share `d1_client` of the client private exponent, with `n1`.
    ClientKeyShare,
    "client_card.key"
);

exponent_share!(
    /// The server's share `d1_server` of the client private exponent, with `n1`.
    ServerShare,
    "for_server.key"
);

exponent_share!(
    /// The server's own full private exponent `d2`, with `n2`.
    ServerSubKey
);

/// Everything the server signs with: its share of the client exponent and
/// its own sub-key.
#[derive(Clone, PartialEq, Eq)]
pub struct ServerKey {
    client: ServerShare,
    own: ServerSubKey,
}

impl ServerKey {
    /// Pairs the client's hand-over share with the server's own sub-key.
    pub fn new(client: ServerShare, own: ServerSubKey) -> Self {
        ServerKey { client, own }
    }

    /// Server share of the client exponent, under `n1`.
    pub fn client_share(&self) -> &ServerShare {
        &self.client
    }

    /// Server's own exponent, under `n2`.
    pub fn own(&self) -> &ServerSubKey {
        &self.own
    }
}

impl fmt::Debug for ServerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerKey")
            .field("client", &self.client)
            .field("own", &self.own)
            .finish()
    }
}

impl Zeroize for ServerKey {
    fn zeroize(&mut self) {
        self.client.zeroize();
        self.own.zeroize();
    }
}

impl Record for ServerKey {
    const NAME: &'static str = "server.key";
    const LINES: usize = 4;
    const SECRET: bool = true;

    fn to_values(&self) -> Vec<&BigUint> {
        vec![&self.client.d, &self.client.n, &self.own.d, &self.own.n]
    }

    fn from_values(values: &mut [BigUint]) -> Result<Self> {
        Ok(ServerKey {
            client: ServerShare::from_values(&mut values[..2])?,
            own: ServerSubKey::new(mem::take(&mut values[2]), mem::take(&mut values[3])),
        })
    }
}

/// Output of the client's key generation: both additive shares of `d1`.
#[derive(Debug)]
pub struct ClientKeyMaterial {
    pub(crate) client: ClientKeyShare,
    pub(crate) server: ServerShare,
}

impl ClientKeyMaterial {
    /// Client sub-modulus `n1`.
    pub fn n(&self) -> &BigUint {
        &self.client.n
    }

    /// The share the client keeps.
    pub fn client_share(&self) -> &ClientKeyShare {
        &self.client
    }

    /// The share handed to the server.
    pub fn server_share(&self) -> &ServerShare {
        &self.server
    }

    /// Splits into the two shares.
    pub fn into_shares(self) -> (ClientKeyShare, ServerShare) {
        (self.client, self.server)
    }
}

// Both shares zeroize themselves on drop.
impl Zeroize for ClientKeyMaterial {
    fn zeroize(&mut self) {
        self.client.zeroize();
        self.server.zeroize();
    }
}

/// Key material produced for one role.
#[derive(Debug)]
pub enum KeyMaterial {
    /// Client: `d1` split into `(d1_client, d1_server)` under `n1`.
    Client(ClientKeyMaterial),
    /// Server: the whole exponent `d2` under `n2`.
    Server(ServerSubKey),
}

impl KeyMaterial {
    /// The sub-modulus of whichever role produced the material.
    pub fn n(&self) -> &BigUint {
        match self {
            KeyMaterial::Client(material) => material.n(),
            KeyMaterial::Server(key) => &key.n,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::{decode, encode};

    #[test]
    fn test_server_key_layout() {
        let key = ServerKey::new(
            ServerShare::new(BigUint::from(33u32), BigUint::from(143u32)),
            ServerSubKey::new(BigUint::from(145u32), BigUint::from(667u32)),
        );
        // d1_server, n1, d2, n2
        assert_eq!(encode(&key).as_str(), "21\n8F\n91\n29B\n");

        let decoded: ServerKey = decode(&encode(&key)).unwrap();
        assert_eq!(decoded, key);
        assert_eq!(decoded.client_share().n(), &BigUint::from(143u32));
        assert_eq!(decoded.own().d(), &BigUint::from(145u32));
    }

    #[test]
    fn test_debug_hides_exponent() {
        let share = ClientKeyShare::new(BigUint::from(0xabcdefu32), BigUint::from(143u32));
        let debug = format!("{:?}", share);
        assert!(debug.contains("n_bits: 8"));
        assert!(!debug.to_lowercase().contains("abcdef"));
        assert!(!debug.contains("11259375"));
    }

    #[test]
    fn test_zeroize() {
        let mut share = ServerShare::new(BigUint::from(33u32), BigUint::from(143u32));
        share.zeroize();
        assert_eq!(share.d(), &BigUint::default());
        assert_eq!(share.n(), &BigUint::default());
    }

    #[test]
    fn test_public_key_verify() {
        // N = 143 * 667, e = 17, signature built from the CRT test vectors
        let n = BigUint::from(143u32 * 667);
        let key = RsaPublicKey::new_unchecked(BigUint::from(17u32), n.clone());
        let m = BigUint::from(7u32);
        let d = crate::algorithms::rsa::inverse_mod(
            &BigUint::from(17u32),
            &BigUint::from(120u32 * 616),
        )
        .unwrap();
        let s = m.modpow(&d, &n);

        key.verify(&Signature::new(m.clone(), s.clone())).unwrap();
        assert!(key.verify(&Signature::new(m + 1u32, s.clone())).is_err());
        assert!(key.verify(&Signature::new(n, s)).is_err());
    }
}
