#[macro_use]
extern crate bencher;
extern crate gridsynth;

use bencher::Bencher;

use gridsynth::diophantine::solve_droottwo;
use gridsynth::exact_synthesis::decompose;
use gridsynth::ring::DRootTwo;
use gridsynth::prelude::*;

fn bench_gridsynth_1e4(bencher: &mut Bencher) {
    let config = GridSynthConfig::new("0.5", "1e-4").unwrap().with_verify(false);
    bencher.iter(|| gridsynth(&config).unwrap());
}

fn bench_gridsynth_1e10(bencher: &mut Bencher) {
    let config = GridSynthConfig::new("0.5", "1e-10")
        .unwrap()
        .with_verify(false);
    bencher.iter(|| gridsynth(&config).unwrap());
}

fn bench_decompose(bencher: &mut Bencher) {
    let word: GateSequence = "HTHTSHTHTHTSHTHTHTHTSHTHTXHTHTHTHTHTSHT".parse().unwrap();
    let u = DOmegaUnitary::from_gates(&word);
    bencher.iter(|| decompose(&u).unwrap());
}

fn bench_diophantine(bencher: &mut Bencher) {
    // 1 - |w|² = |z|², so a solution exists.
    let word: GateSequence = "HTHTHTSHTHTHTHTHTHT".parse().unwrap();
    let u = DOmegaUnitary::from_gates(&word);
    let xi = DRootTwo::one() - u.w().norm_sq();
    bencher.iter(|| solve_droottwo(&xi, 100_000, 1).unwrap());
}

benchmark_group!(
    benches,
    bench_gridsynth_1e4,
    bench_gridsynth_1e10,
    bench_decompose,
    bench_diophantine,
);
benchmark_main!(benches);
