use courserec::*;
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::collections::HashMap;

fn synthetic_table(n_users: usize, n_courses: usize) -> InteractionTable {
    let mut rows = Vec::new();
    for user in 0..n_users {
        for course in 0..n_courses {
            if (user + course) % 3 == 0 {
                continue; // leave unrated candidates for the recommender
            }
            let rating = 30.0 + ((user * 13 + course * 7) % 70) as f32;
            rows.push(Interaction::new(user, course, rating));
        }
    }
    InteractionTable::new(rows)
}

fn benchmark_svd_fit(c: &mut Criterion) {
    let table = synthetic_table(100, 50);

    c.bench_function("svd_fit_100x50", |b| {
        b.iter(|| {
            let model =
                SvdModel::fit(table.rows(), SvdParams::default(), (0.0, 100.0), 42).unwrap();
            black_box(model);
        });
    });
}

fn benchmark_svd_predict(c: &mut Criterion) {
    let table = synthetic_table(100, 50);
    let model = SvdModel::fit(table.rows(), SvdParams::default(), (0.0, 100.0), 42).unwrap();

    c.bench_function("svd_predict", |b| {
        b.iter(|| {
            black_box(model.predict(black_box(17), black_box(23)));
        });
    });
}

fn benchmark_recommend(c: &mut Criterion) {
    let table = synthetic_table(100, 50);
    let model = SvdModel::fit(table.rows(), SvdParams::default(), (0.0, 100.0), 42).unwrap();
    let labels: Vec<String> = (0..50).map(|i| format!("course-{i:03}")).collect();
    let encoder = IdEncoder::fit(&labels);
    let courses = CourseTable::default();
    let name_to_title = HashMap::new();

    c.bench_function("recommend_top3", |b| {
        b.iter(|| {
            let recs = recommend(
                black_box(0),
                &model,
                &table,
                &encoder,
                &name_to_title,
                &courses,
                3,
            )
            .unwrap();
            black_box(recs);
        });
    });
}

criterion_group!(
    benches,
    benchmark_svd_fit,
    benchmark_svd_predict,
    benchmark_recommend
);
criterion_main!(benches);
