//! Benchmarks for the Parley chat hub
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use parley::store::{SqliteStore, User};
use parley::websocket::{ChatHub, ClientEvent, HubConfig, ServerEvent};
use std::sync::Arc;

fn bench_user(i: usize) -> User {
    User {
        id: format!("user-{}", i),
        username: format!("user{}", i),
        avatar_url: String::new(),
        created_at: chrono::Utc::now(),
    }
}

fn bench_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode");

    let message = ServerEvent::Message {
        id: "7ad0c3c4-98fc-4b29-8bd1-bf00b6a2e7f1".to_string(),
        room_id: "general".to_string(),
        content: "The quick brown fox jumps over the lazy dog".to_string(),
        user: bench_user(1),
        created_at: chrono::Utc::now(),
    };

    group.bench_function("message_event", |b| {
        b.iter(|| serde_json::to_string(black_box(&message)).unwrap())
    });

    let typing = ServerEvent::Typing {
        room_id: "general".to_string(),
        user: bench_user(1),
        is_typing: true,
    };

    group.bench_function("typing_event", |b| {
        b.iter(|| serde_json::to_string(black_box(&typing)).unwrap())
    });

    group.finish();
}

fn bench_fanout(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();

    let mut group = c.benchmark_group("fanout");

    for size in [8usize, 64, 256] {
        group.throughput(Throughput::Elements(size as u64));

        group.bench_function(format!("typing_{}_members", size), |b| {
            b.iter_custom(|iters| {
                rt.block_on(async {
                    let store = Arc::new(SqliteStore::open_in_memory().unwrap());
                    let hub = Arc::new(ChatHub::new(
                        store,
                        HubConfig {
                            session_queue_capacity: 1 << 16,
                        },
                    ));

                    // Fill one room; every member drains its own queue.
                    let mut sender_id = String::new();
                    for i in 0..size {
                        let (id, mut rx) = hub.register(bench_user(i)).await;
                        hub.dispatch(
                            &id,
                            ClientEvent::JoinRoom {
                                room_id: "arena".to_string(),
                            },
                        )
                        .await;

                        tokio::spawn(async move { while rx.recv().await.is_some() {} });

                        if i == 0 {
                            sender_id = id;
                        }
                    }

                    let frame = r#"{"type":"typing","payload":{"room_id":"arena","is_typing":true}}"#;

                    let start = std::time::Instant::now();

                    for _ in 0..iters {
                        hub.dispatch_text(black_box(&sender_id), black_box(frame)).await;
                    }

                    start.elapsed()
                })
            });
        });
    }

    group.finish();
}

fn bench_persist(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();

    let mut group = c.benchmark_group("persist");

    group.bench_function("send_message_64_members", |b| {
        b.iter_custom(|iters| {
            rt.block_on(async {
                let store = Arc::new(SqliteStore::open_in_memory().unwrap());
                let author = store.upsert_user("bench", "").unwrap();
                let room = store.create_room("arena", &author.id).unwrap();

                let hub = Arc::new(ChatHub::new(
                    store.clone(),
                    HubConfig {
                        session_queue_capacity: 1 << 16,
                    },
                ));

                let (sender_id, mut sender_rx) = hub.register(author).await;
                tokio::spawn(async move { while sender_rx.recv().await.is_some() {} });
                hub.dispatch(
                    &sender_id,
                    ClientEvent::JoinRoom {
                        room_id: room.id.clone(),
                    },
                )
                .await;

                for i in 1..64 {
                    let (id, mut rx) = hub.register(bench_user(i)).await;
                    hub.dispatch(
                        &id,
                        ClientEvent::JoinRoom {
                            room_id: room.id.clone(),
                        },
                    )
                    .await;
                    tokio::spawn(async move { while rx.recv().await.is_some() {} });
                }

                let start = std::time::Instant::now();

                for _ in 0..iters {
                    hub.dispatch(
                        &sender_id,
                        ClientEvent::SendMessage {
                            room_id: room.id.clone(),
                            content: "benchmark message".to_string(),
                        },
                    )
                    .await;
                }

                start.elapsed()
            })
        });
    });

    group.finish();
}

criterion_group!(benches, bench_encode, bench_fanout, bench_persist);
criterion_main!(benches);
