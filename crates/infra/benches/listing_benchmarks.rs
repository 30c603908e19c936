use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use cardhub_cards::{Card, CardFilter, CardStatus};
use cardhub_core::{Cursor, CursorCodec, CursorKind, EmployeeId, Page, PageRequest};
use cardhub_employees::{ContactNumbers, Employee, OrgUnit};
use cardhub_infra::store::{CardStore, InMemoryDirectory};
use chrono::{Duration, TimeZone, Utc};
use tokio::runtime::Runtime;

const CARDS: i64 = 5_000;

fn employee(id: i64) -> Employee {
    Employee {
        id: EmployeeId::new(id),
        code: format!("E{id:05}"),
        display_name: format!("Employee {id}"),
        manager_id: EmployeeId::new(id % 50 + 1),
        department: OrgUnit::new(id % 7, "Dept"),
        position: OrgUnit::new(id % 11, "Position"),
        company: OrgUnit::new(1, "Acme"),
        email: String::new(),
        phone: String::new(),
        mobile: String::new(),
        created_at: Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap(),
    }
}

fn seeded() -> InMemoryDirectory {
    let dir = InMemoryDirectory::new();
    let numbers = ContactNumbers {
        phone: "+85621123456".into(),
        mobile: String::new(),
    };
    let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    for id in 1..=CARDS {
        let e = employee(id);
        dir.upsert_employee(e.clone()).unwrap();
        // Every fourth card shares a timestamp with its neighbour.
        let mut card = Card::new_from_employee(&e, &numbers, base + Duration::seconds(id / 4 * 4));
        if id % 3 == 0 {
            card.status = CardStatus::Approved;
        }
        dir.put_card(card).unwrap();
    }
    dir
}

fn card_key(card: &Card) -> Cursor {
    Cursor::new(CursorKind::Card, card.id.as_str(), card.created_at)
}

fn bench_keyset_walk(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let dir = seeded();
    let codec = CursorCodec::new(b"bench-cursor-key-bench-cursor-key".to_vec()).unwrap();

    let mut group = c.benchmark_group("card_listing_walk");
    for size in [20u32, 100] {
        group.throughput(Throughput::Elements(CARDS as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            b.iter(|| {
                rt.block_on(async {
                    let filter = CardFilter::default();
                    let mut request = PageRequest::first(size);
                    let mut total = 0usize;
                    loop {
                        let rows = dir.list_cards(&filter, &request).await.unwrap();
                        let page = Page::from_rows(rows, &request, &codec, card_key);
                        total += page.items.len();
                        if page.next_page_token.is_empty() {
                            break;
                        }
                        request = PageRequest::first(size)
                            .after(codec.decode(&page.next_page_token).unwrap());
                    }
                    black_box(total)
                })
            })
        });
    }
    group.finish();
}

fn bench_filtered_first_page(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let dir = seeded();

    let mut group = c.benchmark_group("card_listing_filtered");
    let filters = [
        (
            "status",
            CardFilter {
                status: Some(CardStatus::Approved),
                ..CardFilter::default()
            },
        ),
        ("manager", CardFilter::default().managed_by(EmployeeId::new(7))),
        (
            "display_name",
            CardFilter {
                display_name: Some("ee 12".into()),
                ..CardFilter::default()
            },
        ),
    ];
    for (name, filter) in filters {
        group.bench_function(name, |b| {
            b.iter(|| {
                rt.block_on(async {
                    black_box(dir.list_cards(&filter, &PageRequest::first(20)).await.unwrap())
                })
            })
        });
    }
    group.finish();
}

fn bench_cursor_codec(c: &mut Criterion) {
    let codec = CursorCodec::new(b"bench-cursor-key-bench-cursor-key".to_vec()).unwrap();
    let at = Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap();
    let token = codec.encode(CursorKind::Card, "A1B2C3D4E5F6", at);

    let mut group = c.benchmark_group("cursor_codec");
    group.bench_function("encode", |b| {
        b.iter(|| black_box(codec.encode(CursorKind::Card, black_box("A1B2C3D4E5F6"), at)))
    });
    group.bench_function("decode", |b| b.iter(|| black_box(codec.decode(black_box(&token)))));
    group.finish();
}

criterion_group!(
    benches,
    bench_keyset_walk,
    bench_filtered_first_page,
    bench_cursor_codec
);
criterion_main!(benches);
