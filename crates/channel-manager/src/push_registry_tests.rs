// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use parking_lot::Mutex as StdMutex;

struct RecordingHandler {
    calls: Arc<StdMutex<Vec<(String, String, Option<String>)>>>,
    accept: bool,
}

#[async_trait]
impl PushHandler for RecordingHandler {
    async fn send(&self, channel: &str, text: &str, media: Option<&str>) -> bool {
        self.calls
            .lock()
            .push((channel.to_string(), text.to_string(), media.map(str::to_string)));
        self.accept
    }
}

#[tokio::test]
async fn routes_to_the_handler_whose_prefix_matches() {
    let registry = PushRegistry::new();
    let calls = Arc::new(StdMutex::new(Vec::new()));
    registry.register(
        "tg-",
        Arc::new(RecordingHandler {
            calls: Arc::clone(&calls),
            accept: true,
        }),
    );

    let delivered = registry.send("tg-42", "hello", None).await;
    assert!(delivered);
    assert_eq!(calls.lock().len(), 1);
}

#[tokio::test]
async fn no_matching_prefix_returns_false_without_panicking() {
    let registry = PushRegistry::new();
    let delivered = registry.send("http-1", "hello", Some("image/png")).await;
    assert!(!delivered);
}

#[tokio::test]
async fn re_registering_a_prefix_replaces_the_handler_in_place() {
    let registry = PushRegistry::new();
    let first_calls = Arc::new(StdMutex::new(Vec::new()));
    let second_calls = Arc::new(StdMutex::new(Vec::new()));
    registry.register(
        "tg-",
        Arc::new(RecordingHandler {
            calls: Arc::clone(&first_calls),
            accept: true,
        }),
    );
    registry.register(
        "tg-",
        Arc::new(RecordingHandler {
            calls: Arc::clone(&second_calls),
            accept: true,
        }),
    );

    registry.send("tg-1", "hi", None).await;
    assert_eq!(first_calls.lock().len(), 0);
    assert_eq!(second_calls.lock().len(), 1);
}
