use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use question_search::render::SEARCH_DISPLAY_LIMIT;
use question_search::{AssetSource, QuestionRecord, QuestionStore, filter, load_questions, render};

const PROTOCOLS: &[&str] = &["OSPF", "EIGRP", "RIP", "BGP", "VLAN", "STP", "ARP", "DHCP"];

fn synthetic_records(count: usize) -> Vec<QuestionRecord> {
    (0..count)
        .map(|i| {
            let protocol = PROTOCOLS[i % PROTOCOLS.len()];
            QuestionRecord::new(
                (i + 1).to_string(),
                format!("{}. Which statement about {protocol} is true?", i + 1),
            )
            .with_type("multiple_choice")
            .with_options([
                format!("{protocol} runs on every interface by default"),
                format!("{protocol} needs a manual neighbor statement"),
                "None of the above".to_string(),
            ])
            .with_correct_answers([format!("{protocol} needs a manual neighbor statement")])
            .with_explanation(format!("Check the {protocol} configuration guide."))
        })
        .collect()
}

fn bench_bundled_load(c: &mut Criterion) {
    c.bench_function("load::bundled", |b| {
        b.iter(|| {
            let records = load_questions(&AssetSource::Bundled).expect("bundled asset");
            black_box(records.len());
        });
    });
}

fn bench_filter(c: &mut Criterion) {
    let records = synthetic_records(2_000);
    const QUERIES: &[&str] = &["ospf", "neighbor statement", "question 1999", "zzz"];
    for &query in QUERIES {
        c.bench_with_input(BenchmarkId::new("filter", query), &query, |b, &query| {
            b.iter(|| black_box(filter(&records, query).len()));
        });
    }

    let mut store = QuestionStore::new(records);
    c.bench_function("store_apply::ospf", |b| {
        b.iter(|| {
            store.apply(black_box("ospf"));
            black_box(store.matched());
        });
    });
}

fn bench_render(c: &mut Criterion) {
    let mut store = QuestionStore::new(synthetic_records(2_000));
    store.apply("vlan");
    c.bench_function("render::search_page", |b| {
        b.iter(|| {
            let list = render(store.visible(SEARCH_DISPLAY_LIMIT), "vlan");
            black_box(list.len());
        });
    });
}

criterion_group!(benches, bench_bundled_load, bench_filter, bench_render);
criterion_main!(benches);
