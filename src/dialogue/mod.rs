//! Dialogue resolution: pick the line an NPC speaks, offer the gated
//! responses, and apply what a chosen response does.
//!
//! Scripts are ordered guard-clause lists. Several nodes share one logical
//! id; `resolve_line` scans in file order and the first gated match wins,
//! so authors put the most-restrictive variant first and the unconditional
//! fallback last. Response side effects apply synchronously before the
//! follow-up line resolves, so an action that starts a chain is visible to
//! the very next resolution.

use bevy::ecs::system::SystemParam;
use bevy::prelude::*;

use crate::conditions::gates_match;
use crate::shared::*;

pub struct DialoguePlugin;

impl Plugin for DialoguePlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<ScriptBook>()
            .init_resource::<DialogueSession>()
            .init_resource::<WorldClock>()
            .init_resource::<ActiveEffects>()
            .init_resource::<Masteries>()
            .init_resource::<FriendshipLedger>()
            .add_event::<InteractionRequestEvent>()
            .add_event::<ResponseChosenEvent>()
            .add_event::<BehaviorSignalEvent>()
            .add_event::<DialogueStartEvent>()
            .add_event::<DialogueEndEvent>()
            .add_event::<ItemGrantEvent>()
            .add_event::<FriendshipChangeEvent>()
            .add_event::<GameSignalEvent>()
            .add_systems(
                Update,
                (
                    handle_interaction_request,
                    handle_response_chosen,
                    apply_friendship_changes,
                ),
            );
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Resolution — pure functions over a script and a context snapshot
// ─────────────────────────────────────────────────────────────────────────────

/// Outcome of resolving a logical id: the winning node, its surface text,
/// and the indices of the responses whose own gates pass.
#[derive(Debug)]
pub struct ResolvedLine<'a> {
    pub node_index: usize,
    pub node: &'a DialogueNode,
    pub text: String,
    pub responses: Vec<usize>,
}

/// First node in script order whose id matches and whose full gate passes.
/// `None` means the caller falls back or suppresses the interaction.
pub fn resolve_line<'a>(
    script: &'a NpcScript,
    line_id: &str,
    ctx: &DialogueContext,
) -> Option<ResolvedLine<'a>> {
    let (node_index, node) = script
        .nodes
        .iter()
        .enumerate()
        .find(|(_, node)| node.id == line_id && gates_match(&node.gates, ctx))?;
    Some(ResolvedLine {
        node_index,
        node,
        text: surface_text(node, ctx),
        responses: eligible_responses(node, ctx),
    })
}

/// Surface text for a resolved node: weather override > time-of-day
/// override > season override > base text. Lets one node vary wording
/// without branching the script.
pub fn surface_text(node: &DialogueNode, ctx: &DialogueContext) -> String {
    if let Some(text) = node.weather_text.get(&ctx.weather) {
        return text.clone();
    }
    if let Some(text) = node.time_text.get(&ctx.time_of_day) {
        return text.clone();
    }
    if let Some(text) = node.season_text.get(&ctx.season) {
        return text.clone();
    }
    node.text.clone()
}

/// Indices of the responses whose own gates pass, in list order.
/// Empty means the node is a dead end and the conversation closes.
pub fn eligible_responses(node: &DialogueNode, ctx: &DialogueContext) -> Vec<usize> {
    node.responses
        .iter()
        .enumerate()
        .filter(|(_, response)| gates_match(&response.gates, ctx))
        .map(|(index, _)| index)
        .collect()
}

/// Assemble the per-interaction context snapshot.
pub fn build_context<'a>(
    npc_id: &str,
    clock: &WorldClock,
    player_pos: Vec2,
    effects: &'a ActiveEffects,
    masteries: &'a Masteries,
    friendships: &FriendshipLedger,
    chains: &'a ChainStore,
) -> DialogueContext<'a> {
    DialogueContext {
        season: clock.season,
        weather: clock.weather,
        time_of_day: clock.time_of_day,
        player_pos,
        tier: friendships.tier(npc_id),
        effects,
        masteries,
        chains,
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Action application — collect effects first, fire events after
// ─────────────────────────────────────────────────────────────────────────────

/// What actually happened when a response's actions ran. The system turns
/// these into events; keeping application pure keeps it testable.
#[derive(Debug, Clone, PartialEq)]
pub enum AppliedEffect {
    ChainStarted {
        chain: ChainId,
    },
    ChainAdvanced {
        chain: ChainId,
        stage_name: String,
        stage_number: u32,
    },
    ChainCompleted {
        chain: ChainId,
    },
    ItemGranted {
        item_id: ItemId,
        quantity: u8,
    },
    FriendshipChanged {
        npc_id: NpcId,
        amount: i32,
    },
    SignalEmitted {
        id: String,
    },
}

/// Apply a response's actions in order. Chain actions that reference
/// unknown chains or stages are content bugs: logged for QA, dropped,
/// never fatal.
pub fn apply_actions(
    actions: &[ResponseAction],
    store: &mut ChainStore,
    registry: &ChainRegistry,
) -> Vec<AppliedEffect> {
    let mut applied = Vec::new();

    for action in actions {
        match action {
            ResponseAction::StartChain { chain, metadata } => {
                if store.start_chain(registry, chain, metadata.clone()) {
                    applied.push(AppliedEffect::ChainStarted {
                        chain: chain.clone(),
                    });
                }
            }
            ResponseAction::SetStage { chain, stage } => {
                match store.advance_to_stage(registry, chain, stage) {
                    Ok(number) => applied.push(AppliedEffect::ChainAdvanced {
                        chain: chain.clone(),
                        stage_name: stage.clone(),
                        stage_number: number,
                    }),
                    Err(err) => warn!("[Dialogue] Dropped stage action: {}", err),
                }
            }
            ResponseAction::AdvanceChain { chain } => match store.advance_next(registry, chain) {
                Ok(number) => {
                    let stage_name = store.stage_name(chain).unwrap_or_default().to_string();
                    applied.push(AppliedEffect::ChainAdvanced {
                        chain: chain.clone(),
                        stage_name,
                        stage_number: number,
                    });
                }
                Err(err) => warn!("[Dialogue] Dropped advance action: {}", err),
            },
            ResponseAction::CompleteChain { chain } => match store.complete_chain(chain) {
                Ok(()) => applied.push(AppliedEffect::ChainCompleted {
                    chain: chain.clone(),
                }),
                Err(err) => warn!("[Dialogue] Dropped complete action: {}", err),
            },
            ResponseAction::SetChainMeta { chain, key, value } => {
                if let Err(err) = store.set_metadata(chain, key, value.clone()) {
                    warn!("[Dialogue] Dropped metadata action: {}", err);
                }
            }
            ResponseAction::GrantItem { item_id, quantity } => {
                applied.push(AppliedEffect::ItemGranted {
                    item_id: item_id.clone(),
                    quantity: *quantity,
                });
            }
            ResponseAction::AdjustFriendship { npc_id, amount } => {
                applied.push(AppliedEffect::FriendshipChanged {
                    npc_id: npc_id.clone(),
                    amount: *amount,
                });
            }
            ResponseAction::EmitSignal { id } => {
                applied.push(AppliedEffect::SignalEmitted { id: id.clone() });
            }
        }
    }

    applied
}

// ─────────────────────────────────────────────────────────────────────────────
// Session systems
// ─────────────────────────────────────────────────────────────────────────────

/// The active conversation, if any: which NPC, which node in its script,
/// and which response indices were offered to the player.
#[derive(Resource, Debug, Default)]
pub struct DialogueSession {
    pub npc_id: Option<NpcId>,
    pub node_index: Option<usize>,
    pub responses: Vec<usize>,
}

impl DialogueSession {
    pub fn is_open(&self) -> bool {
        self.npc_id.is_some()
    }

    fn close(&mut self) {
        self.npc_id = None;
        self.node_index = None;
        self.responses.clear();
    }
}

/// Read-only world/player inputs the context snapshot is assembled from.
#[derive(SystemParam)]
pub struct ContextSources<'w> {
    pub clock: Res<'w, WorldClock>,
    pub effects: Res<'w, ActiveEffects>,
    pub masteries: Res<'w, Masteries>,
    pub friendships: Res<'w, FriendshipLedger>,
}

/// Every event channel an interaction can write into.
#[derive(SystemParam)]
pub struct InteractionSinks<'w> {
    pub dialogue_start: EventWriter<'w, DialogueStartEvent>,
    pub dialogue_end: EventWriter<'w, DialogueEndEvent>,
    pub behavior: EventWriter<'w, BehaviorSignalEvent>,
    pub items: EventWriter<'w, ItemGrantEvent>,
    pub friendship: EventWriter<'w, FriendshipChangeEvent>,
    pub signals: EventWriter<'w, GameSignalEvent>,
    pub chain_started: EventWriter<'w, ChainStartedEvent>,
    pub chain_advanced: EventWriter<'w, ChainAdvancedEvent>,
    pub chain_completed: EventWriter<'w, ChainCompletedEvent>,
}

fn emit_effects(applied: Vec<AppliedEffect>, sinks: &mut InteractionSinks) {
    for effect in applied {
        match effect {
            AppliedEffect::ChainStarted { chain } => {
                sinks.chain_started.send(ChainStartedEvent { chain });
            }
            AppliedEffect::ChainAdvanced {
                chain,
                stage_name,
                stage_number,
            } => {
                sinks.chain_advanced.send(ChainAdvancedEvent {
                    chain,
                    stage_name,
                    stage_number,
                });
            }
            AppliedEffect::ChainCompleted { chain } => {
                sinks.chain_completed.send(ChainCompletedEvent { chain });
            }
            AppliedEffect::ItemGranted { item_id, quantity } => {
                sinks.items.send(ItemGrantEvent { item_id, quantity });
            }
            AppliedEffect::FriendshipChanged { npc_id, amount } => {
                sinks.friendship.send(FriendshipChangeEvent { npc_id, amount });
            }
            AppliedEffect::SignalEmitted { id } => {
                sinks.signals.send(GameSignalEvent { id });
            }
        }
    }
}

/// Show a resolved line. A line with no eligible responses is a dead end:
/// it still displays, but the session closes with it.
fn present_line(
    npc_id: &str,
    line: ResolvedLine,
    session: &mut DialogueSession,
    sinks: &mut InteractionSinks,
) {
    let response_texts = line
        .responses
        .iter()
        .filter_map(|&index| line.node.responses.get(index))
        .map(|response| response.text.clone())
        .collect::<Vec<_>>();

    sinks.dialogue_start.send(DialogueStartEvent {
        npc_id: npc_id.to_string(),
        text: line.text,
        responses: response_texts,
    });

    if line.responses.is_empty() {
        session.close();
        sinks.dialogue_end.send(DialogueEndEvent);
    } else {
        session.npc_id = Some(npc_id.to_string());
        session.node_index = Some(line.node_index);
        session.responses = line.responses;
    }
}

/// System: player initiated contact with an NPC. Resolve its entry line
/// and open a session, or end the interaction if nothing matches.
pub fn handle_interaction_request(
    mut requests: EventReader<InteractionRequestEvent>,
    scripts: Res<ScriptBook>,
    chains: Res<ChainStore>,
    sources: ContextSources,
    mut session: ResMut<DialogueSession>,
    player_query: Query<&Transform, With<Player>>,
    mut sinks: InteractionSinks,
) {
    for request in requests.read() {
        // The behavior machine notices contact even when the NPC has
        // nothing to say.
        sinks.behavior.send(BehaviorSignalEvent {
            npc_id: request.npc_id.clone(),
            signal: TALK_SIGNAL.to_string(),
        });

        let Some(script) = scripts.get(&request.npc_id) else {
            sinks.dialogue_end.send(DialogueEndEvent);
            continue;
        };

        let player_pos = player_query
            .get_single()
            .map(|transform| transform.translation.truncate())
            .unwrap_or(Vec2::ZERO);
        let ctx = build_context(
            &request.npc_id,
            &sources.clock,
            player_pos,
            &sources.effects,
            &sources.masteries,
            &sources.friendships,
            &chains,
        );

        match resolve_line(script, ENTRY_LINE, &ctx) {
            Some(line) => present_line(&request.npc_id, line, &mut session, &mut sinks),
            None => {
                session.close();
                sinks.dialogue_end.send(DialogueEndEvent);
            }
        }
    }
}

/// System: the player picked a response. Apply its actions, then follow
/// `next` through a fresh resolution; the mutations above are already
/// visible to it. A dangling `next` closes the conversation.
pub fn handle_response_chosen(
    mut chosen: EventReader<ResponseChosenEvent>,
    scripts: Res<ScriptBook>,
    registry: Res<ChainRegistry>,
    mut chains: ResMut<ChainStore>,
    sources: ContextSources,
    mut session: ResMut<DialogueSession>,
    player_query: Query<&Transform, With<Player>>,
    mut sinks: InteractionSinks,
) {
    for event in chosen.read() {
        let Some(npc_id) = session.npc_id.clone() else {
            warn!("[Dialogue] Response chosen with no open conversation");
            continue;
        };
        let (Some(script), Some(node_index)) = (scripts.get(&npc_id), session.node_index) else {
            session.close();
            sinks.dialogue_end.send(DialogueEndEvent);
            continue;
        };
        let Some(node) = script.nodes.get(node_index) else {
            session.close();
            sinks.dialogue_end.send(DialogueEndEvent);
            continue;
        };
        let Some(response) = session
            .responses
            .get(event.index)
            .and_then(|&index| node.responses.get(index))
        else {
            warn!(
                "[Dialogue] Response index {} out of range for `{}`",
                event.index, npc_id
            );
            continue;
        };

        let applied = apply_actions(&response.actions, &mut chains, &registry);
        emit_effects(applied, &mut sinks);

        match &response.next {
            Some(next_id) => {
                let player_pos = player_query
                    .get_single()
                    .map(|transform| transform.translation.truncate())
                    .unwrap_or(Vec2::ZERO);
                let ctx = build_context(
                    &npc_id,
                    &sources.clock,
                    player_pos,
                    &sources.effects,
                    &sources.masteries,
                    &sources.friendships,
                    &chains,
                );
                match resolve_line(script, next_id, &ctx) {
                    Some(line) => present_line(&npc_id, line, &mut session, &mut sinks),
                    None => {
                        warn!(
                            "[Dialogue] `{}` has no eligible node `{}`, closing conversation",
                            npc_id, next_id
                        );
                        session.close();
                        sinks.dialogue_end.send(DialogueEndEvent);
                    }
                }
            }
            None => {
                session.close();
                sinks.dialogue_end.send(DialogueEndEvent);
            }
        }
    }
}

/// System: fold friendship deltas from response actions into the ledger.
pub fn apply_friendship_changes(
    mut events: EventReader<FriendshipChangeEvent>,
    mut friendships: ResMut<FriendshipLedger>,
) {
    for event in events.read() {
        friendships.add(&event.npc_id, event.amount);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;

    fn node(id: &str, text: &str, gates: Vec<Gate>, responses: Vec<Response>) -> DialogueNode {
        DialogueNode {
            id: id.to_string(),
            text: text.to_string(),
            weather_text: HashMap::new(),
            time_text: HashMap::new(),
            season_text: HashMap::new(),
            gates,
            responses,
        }
    }

    fn response(text: &str, next: Option<&str>, actions: Vec<ResponseAction>) -> Response {
        Response {
            text: text.to_string(),
            next: next.map(str::to_string),
            gates: Vec::new(),
            actions,
        }
    }

    struct Fixture {
        effects: ActiveEffects,
        masteries: Masteries,
        chains: ChainStore,
        registry: ChainRegistry,
    }

    impl Fixture {
        fn new() -> Self {
            let mut registry = ChainRegistry::default();
            registry.register(ChainDef {
                id: "witch_garden".to_string(),
                stages: vec!["meet".to_string(), "gather_herbs".to_string()],
            });
            Self {
                effects: ActiveEffects::default(),
                masteries: Masteries::default(),
                chains: ChainStore::default(),
                registry,
            }
        }

        fn ctx(&self) -> DialogueContext<'_> {
            self.ctx_at(FriendshipTier::Stranger)
        }

        fn ctx_at(&self, tier: FriendshipTier) -> DialogueContext<'_> {
            DialogueContext {
                season: Season::Spring,
                weather: Weather::Clear,
                time_of_day: TimeOfDay::Day,
                player_pos: Vec2::ZERO,
                tier,
                effects: &self.effects,
                masteries: &self.masteries,
                chains: &self.chains,
            }
        }
    }

    fn quest_gate(min_stage: u32) -> Gate {
        Gate::QuestStage {
            chain: "witch_garden".to_string(),
            min_stage,
            max_stage: None,
        }
    }

    #[test]
    fn test_first_matching_node_wins() {
        let fx = Fixture::new();
        let script = NpcScript {
            npc_id: "hazel".to_string(),
            nodes: vec![
                node("greeting", "You found my garden!", vec![quest_gate(1)], vec![]),
                node("greeting", "Hello, stranger.", vec![], vec![]),
            ],
        };

        // Chain not started: the gated variant is skipped, fallback wins.
        let line = resolve_line(&script, "greeting", &fx.ctx()).unwrap();
        assert_eq!(line.node_index, 1);
        assert_eq!(line.text, "Hello, stranger.");
    }

    #[test]
    fn test_order_is_the_tie_break() {
        // Two variants with non-overlapping gates: for a context matching
        // only one, swapping their order must not change the winner.
        let mut fx = Fixture::new();
        fx.effects.apply("beast_tongue");

        let gated = node(
            "greeting",
            "Rrrrr... you understand me?!",
            vec![Gate::EffectActive {
                effect: "beast_tongue".to_string(),
            }],
            vec![],
        );
        let plain = node(
            "greeting",
            "The cat stares blankly.",
            vec![Gate::EffectAbsent {
                effect: "beast_tongue".to_string(),
            }],
            vec![],
        );

        let forward = NpcScript {
            npc_id: "whiskers".to_string(),
            nodes: vec![gated.clone(), plain.clone()],
        };
        let reversed = NpcScript {
            npc_id: "whiskers".to_string(),
            nodes: vec![plain, gated],
        };

        assert_eq!(
            resolve_line(&forward, "greeting", &fx.ctx()).unwrap().text,
            "Rrrrr... you understand me?!"
        );
        assert_eq!(
            resolve_line(&reversed, "greeting", &fx.ctx()).unwrap().text,
            "Rrrrr... you understand me?!"
        );
    }

    #[test]
    fn test_resolve_returns_none_when_nothing_matches() {
        let fx = Fixture::new();
        let script = NpcScript {
            npc_id: "hazel".to_string(),
            nodes: vec![node("greeting", "hi", vec![quest_gate(1)], vec![])],
        };
        assert!(resolve_line(&script, "greeting", &fx.ctx()).is_none());
        assert!(resolve_line(&script, "no_such_line", &fx.ctx()).is_none());
    }

    #[test]
    fn test_surface_text_priority() {
        let fx = Fixture::new();
        let mut n = node("greeting", "Nice day.", vec![], vec![]);
        n.season_text
            .insert(Season::Spring, "The seedlings are up!".to_string());
        n.time_text
            .insert(TimeOfDay::Day, "Good day to you.".to_string());
        n.weather_text
            .insert(Weather::Rainy, "Dreadful rain...".to_string());

        // Clear day in spring: weather map has no entry, time wins over season.
        assert_eq!(surface_text(&n, &fx.ctx()), "Good day to you.");

        let mut rainy = fx.ctx();
        rainy.weather = Weather::Rainy;
        assert_eq!(surface_text(&n, &rainy), "Dreadful rain...");

        let mut night = fx.ctx();
        night.time_of_day = TimeOfDay::Night;
        assert_eq!(surface_text(&n, &night), "The seedlings are up!");

        let mut plain = fx.ctx();
        plain.season = Season::Summer;
        plain.time_of_day = TimeOfDay::Night;
        assert_eq!(surface_text(&n, &plain), "Nice day.");
    }

    #[test]
    fn test_responses_filtered_by_own_gates() {
        let fx = Fixture::new();
        let mut ask = response("What are you brewing?", None, vec![]);
        ask.gates.push(Gate::FriendshipRange {
            min: FriendshipTier::Friend,
            max: None,
        });
        let n = node(
            "greeting",
            "hello",
            vec![],
            vec![response("Goodbye.", None, vec![]), ask],
        );

        assert_eq!(eligible_responses(&n, &fx.ctx()), vec![0]);
        assert_eq!(
            eligible_responses(&n, &fx.ctx_at(FriendshipTier::Friend)),
            vec![0, 1]
        );
    }

    #[test]
    fn test_start_chain_action_unlocks_next_resolution() {
        let mut fx = Fixture::new();
        let script = NpcScript {
            npc_id: "hazel".to_string(),
            nodes: vec![
                node(
                    "greeting",
                    "So you'll help with the garden?",
                    vec![quest_gate(1)],
                    vec![],
                ),
                node(
                    "greeting",
                    "My garden is overrun...",
                    vec![],
                    vec![response(
                        "I'll help.",
                        Some("greeting"),
                        vec![ResponseAction::StartChain {
                            chain: "witch_garden".to_string(),
                            metadata: HashMap::new(),
                        }],
                    )],
                ),
            ],
        };

        // Before the chain starts the gated node is never selected.
        let line = resolve_line(&script, "greeting", &fx.ctx()).unwrap();
        assert_eq!(line.node_index, 1);

        // Apply the response's actions, then re-resolve the same id:
        // the mutation is visible immediately.
        let chosen = &script.nodes[1].responses[0];
        let applied = apply_actions(&chosen.actions, &mut fx.chains, &fx.registry);
        assert_eq!(
            applied,
            vec![AppliedEffect::ChainStarted {
                chain: "witch_garden".to_string()
            }]
        );

        let line = resolve_line(&script, "greeting", &fx.ctx()).unwrap();
        assert_eq!(line.node_index, 0);
        assert_eq!(line.text, "So you'll help with the garden?");
    }

    #[test]
    fn test_actions_apply_in_order_with_sink_effects() {
        let mut fx = Fixture::new();
        let actions = vec![
            ResponseAction::StartChain {
                chain: "witch_garden".to_string(),
                metadata: HashMap::new(),
            },
            ResponseAction::SetChainMeta {
                chain: "witch_garden".to_string(),
                key: "herbs".to_string(),
                value: json!(0),
            },
            ResponseAction::AdvanceChain {
                chain: "witch_garden".to_string(),
            },
            ResponseAction::GrantItem {
                item_id: "herb_pouch".to_string(),
                quantity: 1,
            },
            ResponseAction::AdjustFriendship {
                npc_id: "hazel".to_string(),
                amount: 25,
            },
        ];

        let applied = apply_actions(&actions, &mut fx.chains, &fx.registry);
        assert_eq!(applied.len(), 4); // metadata writes emit no event
        assert_eq!(fx.chains.stage_number("witch_garden"), 2);
        assert_eq!(fx.chains.metadata("witch_garden", "herbs"), Some(&json!(0)));
        assert_eq!(
            applied[3],
            AppliedEffect::FriendshipChanged {
                npc_id: "hazel".to_string(),
                amount: 25,
            }
        );
    }

    #[test]
    fn test_actions_on_unknown_chain_degrade_to_noop() {
        let mut fx = Fixture::new();
        let actions = vec![
            ResponseAction::AdvanceChain {
                chain: "missing_chain".to_string(),
            },
            ResponseAction::CompleteChain {
                chain: "missing_chain".to_string(),
            },
            ResponseAction::SetStage {
                chain: "witch_garden".to_string(),
                stage: "gather_herbs".to_string(),
            },
        ];
        // Nothing started: every chain action drops; no panic, no chain created.
        let applied = apply_actions(&actions, &mut fx.chains, &fx.registry);
        assert!(applied.is_empty());
        assert!(!fx.chains.is_started("missing_chain"));
        assert!(!fx.chains.is_started("witch_garden"));
    }

    #[test]
    fn test_script_authored_in_ron_resolves_identically() {
        let fx = Fixture::new();
        // The core imposes a structural contract, not a file format: the
        // same script expressed in RON behaves the same.
        let script: NpcScript = ron::from_str(
            r#"(
                npc_id: "hazel",
                nodes: [
                    (
                        id: "greeting",
                        text: "You found my garden!",
                        gates: [QuestStage(chain: "witch_garden")],
                    ),
                    (
                        id: "greeting",
                        text: "Hello, stranger.",
                        responses: [
                            (
                                text: "I'll help.",
                                next: Some("greeting"),
                                actions: [StartChain(chain: "witch_garden")],
                            ),
                        ],
                    ),
                ],
            )"#,
        )
        .expect("script should deserialize from RON");

        let line = resolve_line(&script, "greeting", &fx.ctx()).unwrap();
        assert_eq!(line.text, "Hello, stranger.");
        assert_eq!(line.responses, vec![0]);
        // The serde defaults fill the omitted fields, including min_stage = 1.
        assert_eq!(
            script.nodes[0].gates[0],
            Gate::QuestStage {
                chain: "witch_garden".to_string(),
                min_stage: 1,
                max_stage: None,
            }
        );
    }
}
