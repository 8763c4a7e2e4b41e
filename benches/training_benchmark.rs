use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rvote::{create_voting_classifier, get_classifiers, Attribute, Classifier, Dataset, Instance};

fn create_bank_like_data(n_rows: usize) -> Dataset {
    let mut rng = StdRng::seed_from_u64(42);
    let mut data = Dataset::new(
        "synthetic",
        vec![
            Attribute::numeric("age"),
            Attribute::nominal("job", vec!["admin.".into(), "services".into(), "retired".into()]),
            Attribute::numeric("balance"),
            Attribute::nominal("housing", vec!["yes".into(), "no".into()]),
            Attribute::numeric("duration"),
            Attribute::nominal("y", vec!["no".into(), "yes".into()]),
        ],
    );

    for _ in 0..n_rows {
        let duration = rng.gen_range(0.0..1000.0);
        let subscribed = duration + rng.gen_range(-200.0..200.0) > 600.0;
        data.push(Instance::new(vec![
            Some(rng.gen_range(18.0..80.0)),
            Some(rng.gen_range(0..3) as f64),
            Some(rng.gen_range(-500.0..5000.0)),
            Some(rng.gen_range(0..2) as f64),
            Some(duration),
            Some(if subscribed { 1.0 } else { 0.0 }),
        ]))
        .unwrap();
    }
    data.set_class_index(5).unwrap();
    data
}

fn bench_training(c: &mut Criterion) {
    let mut group = c.benchmark_group("training");
    group.sample_size(10); // Fewer samples for training benchmarks

    let data = create_bank_like_data(2000);
    for model in get_classifiers() {
        let name = model.name().to_string();
        group.bench_with_input(BenchmarkId::new("fit", &name), &data, |b, data| {
            b.iter(|| {
                let mut model = model.clone();
                model.fit(black_box(data)).unwrap();
                model
            })
        });
    }

    group.finish();
}

fn bench_vote_prediction(c: &mut Criterion) {
    let mut group = c.benchmark_group("prediction");

    // Train ensemble once
    for n_rows in [500, 2000].iter() {
        let data = create_bank_like_data(*n_rows);
        let mut vote = create_voting_classifier();
        vote.fit(&data).unwrap();

        group.bench_with_input(BenchmarkId::new("vote", n_rows), &data, |b, data| {
            b.iter(|| {
                data.instances()
                    .iter()
                    .map(|i| vote.predict(black_box(i)).unwrap().class_index)
                    .sum::<usize>()
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_training, bench_vote_prediction);
criterion_main!(benches);
