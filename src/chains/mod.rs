//! Event-chain domain: lifecycle events, observability logging, and the
//! plugin wiring for the tracker.
//!
//! The tracker's operations live on `ChainStore` in `shared`; this module
//! owns everything that happens *around* a chain mutation: the events
//! other domains listen for and the content-QA log lines.

use bevy::prelude::*;

use crate::shared::*;

pub struct ChainPlugin;

impl Plugin for ChainPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<ChainStore>()
            .init_resource::<ChainRegistry>()
            .add_event::<ChainStartedEvent>()
            .add_event::<ChainAdvancedEvent>()
            .add_event::<ChainCompletedEvent>()
            .add_systems(Update, log_chain_lifecycle);
    }
}

/// Echo chain lifecycle to the log for content QA.
pub fn log_chain_lifecycle(
    mut started: EventReader<ChainStartedEvent>,
    mut advanced: EventReader<ChainAdvancedEvent>,
    mut completed: EventReader<ChainCompletedEvent>,
) {
    for event in started.read() {
        info!("[Chains] Started: {}", event.chain);
    }
    for event in advanced.read() {
        info!(
            "[Chains] {} advanced to stage {} ({})",
            event.chain, event.stage_number, event.stage_name
        );
    }
    for event in completed.read() {
        info!("[Chains] Completed: {}", event.chain);
    }
}

#[cfg(test)]
mod tests {
    use crate::shared::*;
    use serde_json::json;
    use std::collections::HashMap;

    fn registry() -> ChainRegistry {
        let mut registry = ChainRegistry::default();
        registry.register(ChainDef {
            id: "witch_garden".to_string(),
            stages: vec![
                "meet".to_string(),
                "gather_herbs".to_string(),
                "brew".to_string(),
            ],
        });
        registry
    }

    #[test]
    fn test_start_chain_enters_stage_one() {
        let registry = registry();
        let mut store = ChainStore::default();

        assert!(!store.is_started("witch_garden"));
        assert_eq!(store.stage_number("witch_garden"), 0);

        assert!(store.start_chain(&registry, "witch_garden", HashMap::new()));
        assert!(store.is_started("witch_garden"));
        assert!(store.is_active("witch_garden"));
        assert_eq!(store.stage_number("witch_garden"), 1);
        assert_eq!(store.stage_name("witch_garden"), Some("meet"));
    }

    #[test]
    fn test_start_chain_is_idempotent() {
        let registry = registry();
        let mut store = ChainStore::default();

        let mut first = HashMap::new();
        first.insert("herbs_found".to_string(), json!(2));
        assert!(store.start_chain(&registry, "witch_garden", first));
        store
            .advance_to_stage(&registry, "witch_garden", "gather_herbs")
            .unwrap();

        // Second start with different metadata: no-op.
        let mut second = HashMap::new();
        second.insert("herbs_found".to_string(), json!(99));
        assert!(!store.start_chain(&registry, "witch_garden", second));

        assert_eq!(store.stage_number("witch_garden"), 2);
        assert_eq!(store.metadata("witch_garden", "herbs_found"), Some(&json!(2)));
    }

    #[test]
    fn test_start_chain_without_definition_uses_placeholder_stage() {
        let registry = registry();
        let mut store = ChainStore::default();
        assert!(store.start_chain(&registry, "undeclared_chain", HashMap::new()));
        assert_eq!(store.stage_number("undeclared_chain"), 1);
        assert_eq!(store.stage_name("undeclared_chain"), Some("start"));
    }

    #[test]
    fn test_advance_before_start_does_not_create_chain() {
        let registry = registry();
        let mut store = ChainStore::default();

        let result = store.advance_to_stage(&registry, "witch_garden", "brew");
        assert_eq!(
            result,
            Err(ChainError::NotStarted("witch_garden".to_string()))
        );
        assert!(!store.is_started("witch_garden"));
    }

    #[test]
    fn test_advance_can_skip_forward_but_not_backward() {
        let registry = registry();
        let mut store = ChainStore::default();
        store.start_chain(&registry, "witch_garden", HashMap::new());

        // Dialogue logic may jump straight past intermediate stages.
        assert_eq!(
            store.advance_to_stage(&registry, "witch_garden", "brew"),
            Ok(3)
        );

        let result = store.advance_to_stage(&registry, "witch_garden", "gather_herbs");
        assert_eq!(
            result,
            Err(ChainError::BackwardAdvance {
                chain: "witch_garden".to_string(),
                from: 3,
                to: 2,
            })
        );
        // Prior state preserved.
        assert_eq!(store.stage_number("witch_garden"), 3);
        assert_eq!(store.stage_name("witch_garden"), Some("brew"));
    }

    #[test]
    fn test_advance_to_unknown_stage_is_rejected() {
        let registry = registry();
        let mut store = ChainStore::default();
        store.start_chain(&registry, "witch_garden", HashMap::new());

        let result = store.advance_to_stage(&registry, "witch_garden", "summon_toad");
        assert_eq!(
            result,
            Err(ChainError::UnknownStage {
                chain: "witch_garden".to_string(),
                stage: "summon_toad".to_string(),
            })
        );
        assert_eq!(store.stage_number("witch_garden"), 1);
    }

    #[test]
    fn test_advance_next_walks_table_order() {
        let registry = registry();
        let mut store = ChainStore::default();
        store.start_chain(&registry, "witch_garden", HashMap::new());

        assert_eq!(store.advance_next(&registry, "witch_garden"), Ok(2));
        assert_eq!(store.stage_name("witch_garden"), Some("gather_herbs"));
        assert_eq!(store.advance_next(&registry, "witch_garden"), Ok(3));
        assert_eq!(
            store.advance_next(&registry, "witch_garden"),
            Err(ChainError::AtFinalStage("witch_garden".to_string()))
        );
        assert_eq!(store.stage_number("witch_garden"), 3);
    }

    #[test]
    fn test_completion_is_one_way() {
        let registry = registry();
        let mut store = ChainStore::default();
        store.start_chain(&registry, "witch_garden", HashMap::new());
        store.complete_chain("witch_garden").unwrap();

        assert!(store.is_completed("witch_garden"));
        assert!(!store.is_active("witch_garden"));

        // Later stage actions are accepted but the chain never reactivates.
        store
            .advance_to_stage(&registry, "witch_garden", "brew")
            .unwrap();
        assert!(store.is_completed("witch_garden"));
        assert!(!store.is_active("witch_garden"));
    }

    #[test]
    fn test_complete_unstarted_chain_is_rejected() {
        let mut store = ChainStore::default();
        assert_eq!(
            store.complete_chain("witch_garden"),
            Err(ChainError::NotStarted("witch_garden".to_string()))
        );
        assert!(!store.is_started("witch_garden"));
    }

    #[test]
    fn test_metadata_is_free_form_and_independent_of_stage() {
        let registry = registry();
        let mut store = ChainStore::default();

        // Metadata writes require a started chain.
        assert_eq!(
            store.set_metadata("witch_garden", "toads", json!(3)),
            Err(ChainError::NotStarted("witch_garden".to_string()))
        );

        store.start_chain(&registry, "witch_garden", HashMap::new());
        store
            .set_metadata("witch_garden", "toads", json!(3))
            .unwrap();
        store
            .set_metadata("witch_garden", "garden_plot", json!({"x": 4, "y": 7}))
            .unwrap();

        assert_eq!(store.metadata("witch_garden", "toads"), Some(&json!(3)));
        assert_eq!(
            store.metadata("witch_garden", "garden_plot"),
            Some(&json!({"x": 4, "y": 7}))
        );
        assert_eq!(store.metadata("witch_garden", "absent"), None);
        // Stage untouched by metadata writes.
        assert_eq!(store.stage_number("witch_garden"), 1);
    }

    #[test]
    fn test_store_serializes_round_trip() {
        let registry = registry();
        let mut store = ChainStore::default();
        store.start_chain(&registry, "witch_garden", HashMap::new());
        store
            .set_metadata("witch_garden", "toads", json!(3))
            .unwrap();
        store.complete_chain("witch_garden").unwrap();

        let encoded = serde_json::to_string(&store).unwrap();
        let decoded: ChainStore = serde_json::from_str(&encoded).unwrap();
        assert!(decoded.is_completed("witch_garden"));
        assert_eq!(decoded.stage_number("witch_garden"), 1);
        assert_eq!(decoded.metadata("witch_garden", "toads"), Some(&json!(3)));
    }
}
