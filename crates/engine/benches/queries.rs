//! Benchmarks for the two query operations
//!
//! Run with: cargo bench --package engine

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use data_loader::{FoodRecord, FoodTable, MacroTarget};
use engine::{EngineConfig, RecommendationEngine};

const CATEGORIES: [&str; 5] = ["Meat", "Dairy", "Grain", "Fruit", "Vegetable"];

fn synthetic_engine(rows: usize) -> RecommendationEngine {
    let mut table = FoodTable::new();
    for i in 0..rows {
        let protein = (i * 7 % 35) as f64;
        let fat = (i * 5 % 25) as f64;
        let carbs = (i * 11 % 60) as f64;
        table.insert(FoodRecord::new(
            format!("Food {}", i),
            CATEGORIES[i % CATEGORIES.len()],
            protein * 4.0 + fat * 9.0 + carbs * 4.0,
            protein,
            fat,
            carbs,
        ));
    }
    RecommendationEngine::from_table(table, EngineConfig::default())
        .expect("Failed to build engine")
}

fn bench_similar_foods(c: &mut Criterion) {
    let engine = synthetic_engine(5000);

    c.bench_function("similar_foods", |b| {
        b.iter(|| black_box(engine.similar_foods(black_box("Food 42"), black_box(10))))
    });
}

fn bench_goal_aligned_foods(c: &mut Criterion) {
    let engine = synthetic_engine(5000);
    let remaining = MacroTarget::new(900.0, 60.0, 30.0, 110.0);
    let goals = MacroTarget::new(2200.0, 140.0, 70.0, 250.0);

    c.bench_function("goal_aligned_foods", |b| {
        b.iter(|| {
            black_box(engine.goal_aligned_foods(
                black_box(&remaining),
                Some(black_box(&goals)),
                black_box(10),
            ))
        })
    });
}

criterion_group!(benches, bench_similar_foods, bench_goal_aligned_foods);
criterion_main!(benches);
