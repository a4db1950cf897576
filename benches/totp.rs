use std::hint::black_box;

use criterion::{Criterion, criterion_group, criterion_main};
use keystep::{
  authenticator::Authenticator,
  config::AuthenticatorConfig,
  hotp::{HashAlgorithm, hotp_code},
};

const SECRET20: [u8; 20] = *b"abcdefghijklmnopqrst";

fn bench_totp(c: &mut Criterion) {
  let mut group = c.benchmark_group("totp");

  group.bench_function("hotp_sha1", |b| {
    b.iter(|| hotp_code(black_box(&SECRET20), black_box(12345), HashAlgorithm::Sha1, 6).unwrap())
  });

  group.bench_function("hotp_sha512", |b| {
    b.iter(|| hotp_code(black_box(&SECRET20), black_box(12345), HashAlgorithm::Sha512, 6).unwrap())
  });

  let secret = data_encoding::BASE32_NOPAD.encode(&SECRET20);

  // Worst case: the widest window with a code that matches no interval.
  let auth = Authenticator::new(AuthenticatorConfig::builder().window_size(17).build().unwrap());
  group.bench_function("authorize_window_17", |b| {
    b.iter(|| {
      auth.authorize_at(black_box(&secret), black_box(123_456), 1_700_000_000_000).unwrap()
    })
  });

  let auth = Authenticator::default();
  group.bench_function("create_credentials", |b| {
    b.iter(|| auth.create_credentials().unwrap())
  });

  group.finish();
}

criterion_group!(totp_bench, bench_totp);
criterion_main!(totp_bench);
