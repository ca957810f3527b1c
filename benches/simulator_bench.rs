//! Simulator throughput benchmarks: trials per second at typical picklist
//! probe and full-analysis trial counts.
//!
//! Run with: `cargo bench`

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use kingmaker::data::roster::Roster;
use kingmaker::data::team::{MatchRecord, Phase, Team};
use kingmaker::rules::skyline::{Skyline, HIGH, LOW, MID};
use kingmaker::sim::{SimulationRequest, Simulator};

fn bench_roster() -> Roster {
    let teams: Vec<Team> = (1..=6u32)
        .map(|number| {
            let mut team = Team::new(number, format!("Team {number}"));
            team.qual_rank = Some(number);
            for m in 0..8u32 {
                let mut rec = MatchRecord {
                    match_number: m + 1,
                    mobility: m % 2 == 0,
                    endgame_level: if m % 3 == 0 { "deep" } else { "park" }.to_string(),
                    ..MatchRecord::default()
                };
                rec.set_count(Phase::Auto, LOW, 1 + m % 2);
                rec.set_count(Phase::Teleop, HIGH, number + m % 3);
                rec.set_count(Phase::Teleop, MID, 2);
                rec.set_count(Phase::Teleop, LOW, 1);
                team.matches.push(rec);
            }
            team
        })
        .collect();
    Roster::from_teams(teams)
}

fn bench_simulator(c: &mut Criterion) {
    let roster = bench_roster();
    let simulator = Simulator::new(&roster, &Skyline);

    let mut group = c.benchmark_group("simulator");
    group.sample_size(60);

    for trials in [100u32, 1000] {
        group.throughput(Throughput::Elements(u64::from(trials)));
        group.bench_function(format!("simulate_{trials}_trials"), |b| {
            let request = SimulationRequest {
                red: [1, 2, 3],
                blue: [4, 5, 6],
                trials,
                apply_defense: false,
                seed: 7,
            };
            b.iter(|| {
                let summary = simulator.simulate(black_box(&request)).unwrap();
                black_box(summary)
            });
        });
    }

    group.bench_function("simulate_1000_trials_with_defense", |b| {
        let request = SimulationRequest {
            red: [1, 2, 3],
            blue: [4, 5, 6],
            trials: 1000,
            apply_defense: true,
            seed: 7,
        };
        b.iter(|| {
            let summary = simulator.simulate(black_box(&request)).unwrap();
            black_box(summary)
        });
    });

    group.finish();
}

criterion_group!(benches, bench_simulator);
criterion_main!(benches);
