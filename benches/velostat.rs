use chrono::{Datelike, Duration, NaiveDate};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::fmt::Write;
use velostat::{
    parse_bike_count_csv, AnalysisConfig, Coordinate, DataLoader, DataSource, Dataset,
    MinuteRange, Query, QueryFacade, Selection, SourceLayout, Station, StationRegistry,
};

const STATIONS: usize = 9;

/// One month of quarter-hour counts.
fn month_csv(year: i32, month: u32, seed: u64) -> String {
    let mut text = String::from("Zeit,Anzahl\n");
    let Some(start) = NaiveDate::from_ymd_opt(year, month, 1) else {
        return text;
    };
    let mut timestamp = start.and_hms_opt(0, 0, 0).unwrap_or_default();
    let mut i = seed;
    while timestamp.date().month0() + 1 == month {
        i = i.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        writeln!(text, "{},{}", timestamp.format("%Y-%m-%d %H:%M:%S"), i >> 58).ok();
        timestamp += Duration::minutes(15);
    }
    text
}

fn accidents_csv(rows: usize) -> String {
    let mut text = String::from("\"UMONAT\";\"UWOCHENTAG\";\"XGCSWGS84\";\"YGCSWGS84\"\n");
    for row in 0..rows {
        let lon = 7.55 + (row % 200) as f64 * 0.001;
        let lat = 51.90 + (row % 130) as f64 * 0.001;
        writeln!(
            text,
            "{};{};{};{}",
            row % 12 + 1,
            row % 7 + 1,
            lon.to_string().replace('.', ","),
            lat.to_string().replace('.', ",")
        )
        .ok();
    }
    text
}

fn station_id(index: usize) -> String {
    format!("1000{index:05}")
}

fn synthetic_dataset() -> Dataset {
    let registry = StationRegistry::from_stations((0..STATIONS).map(|index| {
        Station::new(
            station_id(index),
            None,
            Coordinate::new(7.56 + index as f64 * 0.02, 51.91 + index as f64 * 0.01),
        )
    }));
    let mut dataset = Dataset::new(registry);
    for index in 0..STATIONS {
        for month in 1..=12 {
            dataset.add_bike_counts(&station_id(index), &month_csv(2019, month, index as u64));
        }
    }
    dataset.add_accidents(&accidents_csv(5_000), None);
    dataset
}

fn bench_queries(c: &mut Criterion) {
    let dataset = synthetic_dataset();
    let config = AnalysisConfig::builder().years(vec![2019]).build();
    let facade = QueryFacade::new(&dataset, &config);

    let everything = Query::default();
    let monday_morning = Query::new(
        Selection::weekday(2).unwrap(),
        Selection::Only(5),
        MinuteRange::new(6 * 60, 10 * 60).ok(),
    );

    c.bench_function("query_all", |b| b.iter(|| facade.run(black_box(&everything))));
    c.bench_function("query_monday_morning", |b| {
        b.iter(|| facade.run(black_box(&monday_morning)))
    });
}

fn bench_parsing(c: &mut Criterion) {
    let counts = month_csv(2019, 5, 7);
    let accidents = accidents_csv(20_000);

    c.bench_function("parse_bike_count_csv", |b| {
        b.iter(|| parse_bike_count_csv("100020113", black_box(&counts)))
    });
    c.bench_function("parse_accident_csv", |b| {
        b.iter(|| velostat::parse_accident_csv(black_box(&accidents)))
    });
}

fn bench_ingest(c: &mut Criterion) {
    let dir = tempfile::tempdir().unwrap();
    let layout = SourceLayout::default();
    for month in 1..=12 {
        let path = dir.path().join(layout.bike_count_path("100020113", 2019, month));
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, month_csv(2019, month, 1)).unwrap();
    }
    std::fs::write(dir.path().join(layout.accident_path(2019)), accidents_csv(5_000)).unwrap();

    let config = AnalysisConfig::builder()
        .years(vec![2019])
        .station_ids(vec!["100020113".to_string()])
        .build();
    let loader = DataLoader::new(DataSource::directory(dir.path()));
    let runtime = tokio::runtime::Runtime::new().unwrap();

    c.bench_function("load_directory", |b| {
        b.to_async(&runtime).iter(|| loader.load(black_box(&config)))
    });
}

criterion_group!(benches, bench_queries, bench_parsing, bench_ingest);
criterion_main!(benches);
