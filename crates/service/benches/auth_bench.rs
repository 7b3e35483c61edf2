use criterion::{criterion_group, criterion_main, Criterion};
use std::sync::Arc;
use std::time::Duration;

use service::auth::domain::{LoginInput, RegisterInput};
use service::auth::password::Argon2PasswordHasher;
use service::auth::repository::mock::InMemoryAccountStore;
use service::auth::token::{JwtTokenService, SystemClock, TokenService};
use service::auth::AuthService;

fn bench_login(c: &mut Criterion) {
    let tokens = JwtTokenService::new("bench-secret", "book-exchange", Duration::from_secs(3600), Arc::new(SystemClock)).unwrap();
    let svc = AuthService::new(
        Arc::new(InMemoryAccountStore::default()),
        Arc::new(Argon2PasswordHasher::default()),
        Arc::new(tokens),
    );

    // pre-create user outside of the benchmark using a tokio runtime
    let rt = tokio::runtime::Runtime::new().unwrap();
    rt.block_on(svc.register(RegisterInput {
        username: "bench".into(),
        email: "bench@example.com".into(),
        password: "Benchmark1!".into(),
    }))
    .unwrap();

    c.bench_function("auth_login_verify", |b| {
        b.iter(|| {
            let input = LoginInput { username: "bench".into(), password: "Benchmark1!".into(), email: None };
            rt.block_on(svc.login(input)).unwrap();
        });
    });

    c.bench_function("auth_login_unknown_user", |b| {
        b.iter(|| {
            let input = LoginInput { username: "nobody".into(), password: "Benchmark1!".into(), email: None };
            let _ = rt.block_on(svc.login(input));
        });
    });
}

fn bench_token(c: &mut Criterion) {
    let tokens = JwtTokenService::new("bench-secret", "book-exchange", Duration::from_secs(3600), Arc::new(SystemClock)).unwrap();
    let token = tokens.issue(uuid::Uuid::new_v4()).unwrap();
    c.bench_function("token_validate", |b| b.iter(|| tokens.validate(&token).unwrap()));
}

criterion_group!(benches, bench_login, bench_token);
criterion_main!(benches);
