// ABOUTME: Criterion benchmarks for message history cache operations
// ABOUTME: Measures append, warm reads, and history rebuilds on the in-memory backend
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Matchbox Chat

//! Criterion benchmarks for the message history cache.
//!
//! Uses the in-memory backend so results do not depend on a Redis instance.

#![allow(
    clippy::missing_docs_in_private_items,
    clippy::unwrap_used,
    missing_docs
)]

use chrono::Utc;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use matchbox_chat::cache::memory::InMemoryMessageCache;
use matchbox_chat::cache::MessageCacheProvider;
use matchbox_chat::config::CacheConfig;
use matchbox_chat::models::{ChatId, Message, MessageId, MessageStatus, ParticipantId};
use tokio::runtime::Runtime;

const CHATS: i64 = 1_000;

fn make_message(chat_id: i64, id: i64, content_len: usize) -> Message {
    Message {
        id: MessageId(id),
        chat_id: ChatId(chat_id),
        sender_id: ParticipantId(chat_id),
        content: "x".repeat(content_len),
        status: MessageStatus::Unread,
        created_at: Utc::now(),
    }
}

/// Create test cache configuration (no background cleanup for benchmarks)
fn test_cache_config(history_limit: usize) -> CacheConfig {
    CacheConfig {
        max_chats: 10_000,
        history_limit,
        redis_url: None,
        enable_background_cleanup: false,
        ..CacheConfig::default()
    }
}

/// Benchmark appends to warm chats at steady state (every append trims)
fn bench_cache_append(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let mut group = c.benchmark_group("cache_append");

    for limit in [10_usize, 50, 200] {
        let cache = InMemoryMessageCache::new_with_config(&test_cache_config(limit));
        rt.block_on(async {
            for chat in 0..CHATS {
                let history: Vec<Message> = (0..limit as i64)
                    .map(|id| make_message(chat, id, 64))
                    .collect();
                cache.replace(ChatId(chat), &history).await.unwrap();
            }
        });

        group.throughput(Throughput::Elements(1));
        group.bench_function(BenchmarkId::new("memory", limit), |b| {
            let mut next_id = limit as i64;
            b.iter(|| {
                let chat = next_id % CHATS;
                let message = make_message(chat, next_id, 64);
                next_id += 1;
                rt.block_on(async {
                    cache
                        .append(black_box(ChatId(chat)), black_box(&message))
                        .await
                })
            });
        });
    }

    group.finish();
}

/// Benchmark warm history reads versus misses
fn bench_cache_get(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let mut group = c.benchmark_group("cache_get");
    let cache = InMemoryMessageCache::new_with_config(&test_cache_config(50));

    rt.block_on(async {
        for chat in 0..CHATS {
            let history: Vec<Message> = (0..50).map(|id| make_message(chat, id, 256)).collect();
            cache.replace(ChatId(chat), &history).await.unwrap();
        }
    });

    group.bench_function("hit", |b| {
        let mut chat = 0_i64;
        b.iter(|| {
            chat = (chat + 1) % CHATS;
            rt.block_on(async { cache.get(black_box(ChatId(chat))).await })
        });
    });

    group.bench_function("miss", |b| {
        let mut chat = CHATS;
        b.iter(|| {
            chat += 1;
            rt.block_on(async { cache.get(black_box(ChatId(chat))).await })
        });
    });

    group.finish();
}

/// Benchmark warming a chat from a freshly read history
fn bench_cache_replace(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let mut group = c.benchmark_group("cache_replace");
    let cache = InMemoryMessageCache::new_with_config(&test_cache_config(50));

    for size in [10_i64, 50, 500] {
        let history: Vec<Message> = (0..size).map(|id| make_message(1, id, 128)).collect();
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("memory", size), &history, |b, history| {
            b.iter(|| rt.block_on(async { cache.replace(ChatId(1), black_box(history)).await }));
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_cache_append,
    bench_cache_get,
    bench_cache_replace,
);
criterion_main!(benches);
