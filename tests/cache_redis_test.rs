// ABOUTME: Integration tests for the Redis message history cache backend
// ABOUTME: Tests list trimming, presence marker, and scripted appends with a real Redis instance (CI-only)
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Matchbox Chat

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

use anyhow::Result;
use chrono::{SubsecRound, Utc};
use matchbox_chat::cache::{
    AppendOutcome, CacheLookup, MessageCache, MessageCacheProvider, RemoveOutcome,
};
use matchbox_chat::config::CacheConfig;
use matchbox_chat::models::{ChatId, Message, MessageId, MessageStatus, ParticipantId};
use serial_test::serial;
use std::time::{SystemTime, UNIX_EPOCH};

fn test_message(chat_id: ChatId, id: i64) -> Message {
    Message {
        id: MessageId(id),
        chat_id,
        sender_id: ParticipantId(1),
        content: format!("message {id}"),
        status: MessageStatus::Unread,
        created_at: Utc::now().trunc_subsecs(6),
    }
}

/// Chat id unlikely to collide with leftovers from earlier runs
fn unique_chat() -> ChatId {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_nanos());
    ChatId((nanos % 1_000_000_000_000) as i64)
}

/// Helper: Create Redis cache from `REDIS_URL` environment variable
/// Returns None if `REDIS_URL` is not set (allows skipping tests in non-Redis environments)
async fn create_redis_cache(history_limit: usize) -> Result<Option<MessageCache>> {
    let Ok(redis_url) = std::env::var("REDIS_URL") else {
        println!("REDIS_URL not set, skipping Redis cache tests");
        return Ok(None);
    };

    let config = CacheConfig {
        redis_url: Some(redis_url),
        history_limit,
        enable_background_cleanup: false, // Disable in tests
        ..CacheConfig::default()
    };

    let cache = <MessageCache as MessageCacheProvider>::new(config).await?;
    assert_eq!(cache.backend_name(), "redis");
    Ok(Some(cache))
}

/// Helper macro to skip test if Redis is not available
macro_rules! require_redis {
    ($cache:expr) => {
        match $cache {
            Some(cache) => cache,
            None => {
                println!("Skipping test: Redis not available");
                return Ok(());
            }
        }
    };
}

fn ids(lookup: &CacheLookup) -> Vec<i64> {
    match lookup {
        CacheLookup::Hit(messages) => messages.iter().map(|m| m.id.get()).collect(),
        CacheLookup::Miss => panic!("expected a warm chat"),
    }
}

#[tokio::test]
#[serial]
async fn test_redis_health_check() -> Result<()> {
    let cache = require_redis!(create_redis_cache(50).await?);
    cache.health_check().await?;
    Ok(())
}

#[tokio::test]
#[serial]
async fn test_redis_cold_and_warm_empty() -> Result<()> {
    let cache = require_redis!(create_redis_cache(50).await?);
    let chat = unique_chat();

    assert_eq!(cache.get(chat).await?, CacheLookup::Miss);
    assert_eq!(
        cache.append(chat, &test_message(chat, 1)).await?,
        AppendOutcome::Skipped
    );
    assert_eq!(cache.get(chat).await?, CacheLookup::Miss);

    cache.replace(chat, &[]).await?;
    assert_eq!(cache.get(chat).await?, CacheLookup::Hit(Vec::new()));

    cache.invalidate(chat).await?;
    Ok(())
}

#[tokio::test]
#[serial]
async fn test_redis_append_trims_list() -> Result<()> {
    let cache = require_redis!(create_redis_cache(3).await?);
    let chat = unique_chat();

    cache.replace(chat, &[test_message(chat, 1)]).await?;
    for id in 2..=5 {
        assert_eq!(
            cache.append(chat, &test_message(chat, id)).await?,
            AppendOutcome::Appended
        );
    }
    assert_eq!(ids(&cache.get(chat).await?), vec![3, 4, 5]);

    cache.invalidate(chat).await?;
    Ok(())
}

#[tokio::test]
#[serial]
async fn test_redis_replace_truncates_and_round_trips() -> Result<()> {
    let cache = require_redis!(create_redis_cache(2).await?);
    let chat = unique_chat();
    let messages: Vec<Message> = (1..=4).map(|id| test_message(chat, id)).collect();

    cache.replace(chat, &messages).await?;
    assert_eq!(
        cache.get(chat).await?,
        CacheLookup::Hit(messages[2..].to_vec())
    );

    cache.invalidate(chat).await?;
    Ok(())
}

#[tokio::test]
#[serial]
async fn test_redis_out_of_order_append_invalidates() -> Result<()> {
    let cache = require_redis!(create_redis_cache(50).await?);
    let chat = unique_chat();

    cache
        .replace(chat, &[test_message(chat, 10), test_message(chat, 20)])
        .await?;
    assert_eq!(
        cache.append(chat, &test_message(chat, 15)).await?,
        AppendOutcome::Invalidated
    );
    assert_eq!(cache.get(chat).await?, CacheLookup::Miss);
    Ok(())
}

#[tokio::test]
#[serial]
async fn test_redis_remove_one() -> Result<()> {
    let cache = require_redis!(create_redis_cache(50).await?);
    let chat = unique_chat();
    let messages: Vec<Message> = (1..=3).map(|id| test_message(chat, id)).collect();
    cache.replace(chat, &messages).await?;

    assert_eq!(
        cache.remove_one(chat, MessageId(2)).await?,
        RemoveOutcome::Removed
    );
    assert_eq!(
        cache.remove_one(chat, MessageId(2)).await?,
        RemoveOutcome::Absent
    );
    assert_eq!(ids(&cache.get(chat).await?), vec![1, 3]);

    cache.invalidate(chat).await?;
    assert_eq!(cache.get(chat).await?, CacheLookup::Miss);
    Ok(())
}

#[tokio::test]
#[serial]
async fn test_redis_remove_from_full_window_evicts_chat() -> Result<()> {
    let cache = require_redis!(create_redis_cache(3).await?);
    let chat = unique_chat();
    let messages: Vec<Message> = (1..=5).map(|id| test_message(chat, id)).collect();
    cache.replace(chat, &messages).await?;

    assert_eq!(
        cache.remove_one(chat, MessageId(4)).await?,
        RemoveOutcome::Invalidated
    );
    assert_eq!(cache.get(chat).await?, CacheLookup::Miss);
    Ok(())
}

#[tokio::test]
#[serial]
async fn test_redis_rebuild_refused_after_concurrent_write() -> Result<()> {
    let cache = require_redis!(create_redis_cache(50).await?);
    let chat = unique_chat();
    let snapshot = vec![test_message(chat, 1)];

    let generation = cache.generation(chat).await?;
    assert_eq!(
        cache.append(chat, &test_message(chat, 2)).await?,
        AppendOutcome::Skipped
    );
    assert!(!cache.replace_if_current(chat, &snapshot, generation).await?);
    assert_eq!(cache.get(chat).await?, CacheLookup::Miss);

    let generation = cache.generation(chat).await?;
    cache.invalidate(chat).await?;
    assert!(!cache.replace_if_current(chat, &snapshot, generation).await?);

    let generation = cache.generation(chat).await?;
    let fresh = vec![test_message(chat, 1), test_message(chat, 2)];
    assert!(cache.replace_if_current(chat, &fresh, generation).await?);
    assert_eq!(cache.get(chat).await?, CacheLookup::Hit(fresh));

    cache.invalidate(chat).await?;
    Ok(())
}
