use std::hint::black_box;

use binokel::agents::{ScriptedHuman, TracingSink};
use binokel::bridge::RoundBridge;
use binokel::controller::RoundController;
use binokel::deck::Deck;
use binokel::round::RoundMachine;
use binokel::protocol::Trigger;
use binokel::settings::{RoundRecord, RoundSettings};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};

fn bench_bot_round(c: &mut Criterion) {
    let mut g = c.benchmark_group("bot_round");
    for players in [3usize, 4] {
        let settings = RoundSettings::default().with_players(players);
        g.bench_with_input(BenchmarkId::new("players", players), &settings, |b, settings| {
            let mut seed = 0u64;
            b.iter(|| {
                seed = seed.wrapping_add(1);
                let record = RoundRecord::new(settings.clone(), 0, seed);
                let controller =
                    RoundController::new(record, ScriptedHuman::default(), TracingSink).unwrap();
                let mut bridge = RoundBridge::new();
                black_box(controller.play(&mut bridge).unwrap())
            })
        });
    }
    g.finish();
}

fn bench_machine_bidding(c: &mut Criterion) {
    let settings = RoundSettings::default();
    c.bench_function("machine_all_pass", |b| {
        b.iter(|| {
            let mut m = RoundMachine::new(&settings, 0).unwrap();
            m.fire(Trigger::GameStarted).unwrap();
            m.fire(Trigger::DealingFinished).unwrap();
            for _ in 0..settings.player_count {
                m.fire(black_box(Trigger::Passed)).unwrap();
                m.fire(Trigger::PlayerSwitched).unwrap();
            }
            black_box(m.state())
        })
    });
}

fn bench_deal(c: &mut Criterion) {
    let settings = RoundSettings::default();
    c.bench_function("deal_seeded", |b| {
        b.iter(|| Deck::deal_seeded(black_box(&settings), 0, black_box(7)))
    });
}

criterion_group!(benches, bench_bot_round, bench_machine_bidding, bench_deal);
criterion_main!(benches);
