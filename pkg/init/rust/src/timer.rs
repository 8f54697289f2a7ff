// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use std::future::pending;
use std::pin::Pin;

use tokio::time::{Duration, Sleep, sleep};

/// Single-shot escalation clock. At most one expiry is ever pending: arming
/// replaces the previous deadline.
#[derive(Debug, Default)]
pub struct EscalationTimer {
    sleep: Option<Pin<Box<Sleep>>>,
}

impl EscalationTimer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arm(&mut self, after: Duration) {
        self.sleep = Some(Box::pin(sleep(after)));
    }

    pub fn cancel(&mut self) {
        self.sleep = None;
    }

    pub fn is_armed(&self) -> bool {
        self.sleep.is_some()
    }

    /// Resolves once the armed deadline passes, disarming the timer. Never
    /// resolves while disarmed. Cancel-safe.
    pub async fn expired(&mut self) {
        match self.sleep.as_mut() {
            Some(sleep) => {
                sleep.await;
                self.sleep = None;
            }
            None => pending().await,
        }
    }
}
