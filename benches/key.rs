#![feature(test)]

extern crate test;

use rand_chacha::{rand_core::SeedableRng, ChaCha8Rng};
use rsa_cosign::{
    Channel, Client, ClientKeyShare, KeyShareGenerator, MemoryChannel, Party, ProtocolConfig,
    Server, ServerKey, SigningSession,
};
use test::Bencher;

fn config(bits: usize) -> ProtocolConfig {
    ProtocolConfig::default().with_modulus_bits(bits).unwrap()
}

#[bench]
fn bench_client_1024_gen_key(b: &mut Bencher) {
    let mut rng = ChaCha8Rng::from_seed([42; 32]);
    let generator = KeyShareGenerator::new(config(1024));

    b.iter(|| {
        let key = generator.generate_client(&mut rng).unwrap();
        test::black_box(key);
    });
}

#[bench]
fn bench_server_2048_gen_key(b: &mut Bencher) {
    let mut rng = ChaCha8Rng::from_seed([42; 32]);
    let generator = KeyShareGenerator::new(config(2048));

    b.iter(|| {
        let key = generator.generate_server(&mut rng).unwrap();
        test::black_box(key);
    });
}

#[bench]
fn bench_cosign_2048(b: &mut Bencher) {
    let mut rng = ChaCha8Rng::from_seed([42; 32]);
    let config = config(2048);
    let (client, server) = (Client::new(config.clone()), Server::new(config.clone()));
    let mut channel = MemoryChannel::new();
    client.generate(&mut channel, &mut rng).unwrap();
    server.generate(&mut channel, &mut rng).unwrap();

    let client_key: ClientKeyShare = channel.receive().unwrap();
    let server_key: ServerKey = channel.receive().unwrap();
    let m = config.test_message().clone();

    b.iter(|| {
        let mut session = SigningSession::new(config.clone());
        session.client_sign(&client_key, &m).unwrap();
        let signature = session.server_sign(&server_key).unwrap().clone();
        test::black_box(signature);
    });
}
