use criterion::{black_box, criterion_group, criterion_main, Criterion, BenchmarkId};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;
use coup_hub::{Coup, RulesConfig, Seat};

fn complete_game(num_players: u64, rng: &mut Pcg64) {
    let roster: Vec<Seat> = (0..num_players).map(|id| Seat::new(id, "bench")).collect();
    let Ok(mut coup) = Coup::new(&roster, RulesConfig::default(), rng) else {
        return;
    };
    coup = black_box(coup);

    for _ in 0..1000 {
        let mut actions = coup.actions();

        let random_index = rng.gen_range(0..actions.len());
        let random_action = actions.remove(random_index);

        coup = coup.apply_action(random_action, rng).unwrap();

        if coup.winner().is_some() {
            break;
        }
    }
}

fn criterion_benchmark(c: &mut Criterion) {
    let mut rng = Pcg64::seed_from_u64(0);
    let mut group = c.benchmark_group("complete_game");
    for num_players in 3..=6u64 {
        group.bench_with_input(BenchmarkId::from_parameter(num_players), &num_players, |b, &num_players| {
            b.iter(|| complete_game(num_players, &mut rng))
        });
    }
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
