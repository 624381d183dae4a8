//! Single-authority enforcement.
//!
//! [`SingletonGuard`] is the only path through which an orchestrator claims an
//! [`Environment`]. Registration is one-way: there is no unregister, and a
//! claim left behind by a dropped orchestrator still blocks new candidates.

use tracing::{info, warn};

use crate::environment::{ActiveOrchestrator, Environment};
use crate::errors::TransformError;

pub struct SingletonGuard;

impl SingletonGuard {
    /// Register `candidate` as the environment's only orchestrator.
    pub fn try_register(
        environment: &Environment,
        candidate: ActiveOrchestrator,
    ) -> Result<(), TransformError> {
        let name = candidate.to_string();
        match environment.set_active_orchestrator(candidate) {
            Ok(()) => {
                info!(
                    environment = environment.label(),
                    orchestrator = %name,
                    "orchestrator registered"
                );
                Ok(())
            }
            Err(existing) => {
                warn!(
                    environment = environment.label(),
                    candidate = %name,
                    existing = %existing,
                    "terminating orchestrator candidate: environment already claimed"
                );
                Err(TransformError::AlreadyActive {
                    environment: environment.label().to_string(),
                    existing,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_second_registration_fails() {
        let env = Environment::default().with_label("test");
        let first = ActiveOrchestrator::new("first");

        SingletonGuard::try_register(&env, first.clone()).unwrap();
        let err = SingletonGuard::try_register(&env, ActiveOrchestrator::new("second"))
            .unwrap_err();

        match err {
            TransformError::AlreadyActive {
                environment,
                existing,
            } => {
                assert_eq!(environment, "test");
                assert_eq!(existing, first);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_isolated_environments_do_not_interfere() {
        let a = Environment::default();
        let b = Environment::default();
        SingletonGuard::try_register(&a, ActiveOrchestrator::new("a")).unwrap();
        SingletonGuard::try_register(&b, ActiveOrchestrator::new("b")).unwrap();
    }

    #[test]
    fn test_concurrent_registration_has_one_winner() {
        let env = Environment::default();
        let winners = AtomicUsize::new(0);

        std::thread::scope(|s| {
            for i in 0..16 {
                let env = &env;
                let winners = &winners;
                s.spawn(move || {
                    let candidate = ActiveOrchestrator::new(format!("candidate-{i}"));
                    if SingletonGuard::try_register(env, candidate).is_ok() {
                        winners.fetch_add(1, Ordering::SeqCst);
                    }
                });
            }
        });

        assert_eq!(winners.load(Ordering::SeqCst), 1);
        assert!(env.active_orchestrator().is_some());
    }
}
