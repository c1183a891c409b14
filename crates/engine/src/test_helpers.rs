// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared fixtures for engine tests

use crate::{EngineConfig, Reconciler, ReconcilerDeps};
use std::time::Duration;
use wf_adapters::{
    FakeAdapters, FakeDriverAdapter, FakeEventBusAdapter, FakeKeyValueAdapter, FakeNotifyAdapter,
    FakePersistenceAdapter,
};
use wf_core::{Breed, Deployable, Scale};

pub type FakeReconciler = Reconciler<
    FakePersistenceAdapter,
    FakeEventBusAdapter,
    FakeKeyValueAdapter,
    FakeDriverAdapter,
    FakeNotifyAdapter,
>;

/// Breed run directly by the driver
pub fn container_breed(name: &str) -> Breed {
    Breed {
        name: name.to_string(),
        deployable: Deployable::new("container/docker", format!("{}:1.0", name)),
    }
}

/// Breed whose definition must be staged before scheduling
pub fn script_breed(name: &str) -> Breed {
    Breed {
        name: name.to_string(),
        deployable: Deployable::new("application/javascript", "run();"),
    }
}

pub fn small_scale() -> Scale {
    Scale {
        name: "small".to_string(),
        cpu: 0.2,
        memory: "128MB".to_string(),
        instances: 1,
    }
}

/// Short enough that timeout tests stay fast
pub fn test_config() -> EngineConfig {
    EngineConfig::with_call_timeout(Duration::from_millis(200))
}

pub fn reconciler(fake: &FakeAdapters) -> FakeReconciler {
    Reconciler::new(
        ReconcilerDeps {
            persistence: fake.persistence(),
            bus: fake.bus(),
            kv: fake.kv(),
            driver: fake.driver(),
            notify: fake.notify(),
        },
        test_config(),
    )
}
