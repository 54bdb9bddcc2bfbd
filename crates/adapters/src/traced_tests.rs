// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::channel::{FakeChannel, SendScript};

#[tokio::test]
async fn traced_channel_passes_results_through() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("debug")
        .with_test_writer()
        .try_init();

    let fake = FakeChannel::new();
    fake.script(UserId(2), SendScript::FailPermanent);
    let traced = TracedChannel::new(fake.clone());

    assert!(traced
        .send(UserId(1), &Payload::plain("hello"))
        .await
        .is_ok());
    assert!(matches!(
        traced.send(UserId(2), &Payload::plain("hello")).await,
        Err(SendError::Permanent(_))
    ));

    assert_eq!(fake.calls().len(), 2);
}
