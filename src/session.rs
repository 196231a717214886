//! A live battle bound to its external collaborators.
//!
//! [`BattleSession`] owns one battle's state behind an async mutex,
//! resolves turns with the engine, and settles rewards with the
//! collaborator services. Exactly one turn resolves at a time; a second
//! caller is rejected with [`BattleError::TurnInProgress`] rather than
//! queued.

use crate::battle::{BattleEngine, BattleError, BattleOutcome, BattleState, BattleTurnResult, PlayerAction};
use crate::collaborators::CollaboratorClient;
use crate::combatant::Combatant;
use crate::content;
use crate::equipment::EquipmentSlots;
use crate::scaling::generate_enemy;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, warn};

pub struct BattleSession {
    engine: BattleEngine,
    state: Mutex<BattleState>,
    client: Arc<dyn CollaboratorClient>,
    character: String,
}

impl BattleSession {
    /// Start a battle on a floor. The enemy comes from the hand-tuned
    /// table when one exists for the floor, otherwise the generator; the
    /// character's equipment is fetched from the sheet service, degrading
    /// to bare slots if the fetch fails.
    pub async fn start(
        client: Arc<dyn CollaboratorClient>,
        character: impl Into<String>,
        player: Combatant,
        floor: u32,
    ) -> Self {
        let character = character.into();
        let slots = match client.fetch_equipped_slots(&character).await {
            Ok(slots) => slots,
            Err(err) => {
                let err = BattleError::CollaboratorUnavailable(err.to_string());
                warn!(%character, %err, "equipment fetch failed; fighting bare-handed");
                EquipmentSlots::default()
            }
        };

        let enemy = generate_enemy(floor, content::authored_enemy(floor)).into_combatant();
        let state = BattleState::new(floor, player, enemy, slots);
        debug!(battle = %state.battle_id, floor, enemy = %state.enemy.name, "battle started");

        Self {
            engine: BattleEngine::new(),
            state: Mutex::new(state),
            client,
            character,
        }
    }

    /// Submit one action. Fails fast with `TurnInProgress` if another
    /// turn is mid-resolution.
    pub async fn submit_action(&self, action: PlayerAction) -> Result<BattleTurnResult, BattleError> {
        let mut rng = StdRng::from_entropy();
        self.submit_action_with_rng(action, &mut rng).await
    }

    /// Deterministic variant: the caller controls the random source.
    pub async fn submit_action_with_rng(
        &self,
        action: PlayerAction,
        rng: &mut StdRng,
    ) -> Result<BattleTurnResult, BattleError> {
        let mut guard = self
            .state
            .try_lock()
            .map_err(|_| BattleError::TurnInProgress)?;

        let result = self.engine.resolve_turn(&guard, &action, rng);
        *guard = result.state.clone();
        drop(guard);

        let banked = futures::future::join_all(
            result
                .skill_xp
                .iter()
                .map(|gain| self.client.apply_skill_xp(&self.character, gain)),
        )
        .await;
        for grant in banked {
            if let Err(err) = grant {
                warn!(%err, "failed to bank skill xp");
            }
        }

        if let Some(outcome) = &result.outcome {
            self.settle(&result, outcome).await;
        }
        Ok(result)
    }

    /// A snapshot of the current state.
    pub async fn state(&self) -> BattleState {
        self.state.lock().await.clone()
    }

    pub async fn is_over(&self) -> bool {
        self.state.lock().await.is_over()
    }

    /// Settle a concluded battle with the collaborators. Failures are
    /// logged and swallowed; the battle result stands either way.
    async fn settle(&self, result: &BattleTurnResult, outcome: &BattleOutcome) {
        let state = &result.state;
        let persist = self.client.persist_hp_mana(
            &self.character,
            state.player.hp.current(),
            state.player.mana.current(),
        );

        match outcome {
            BattleOutcome::EnemyDefeated {
                xp_reward,
                gold_reward,
            } => {
                let (persisted, xp, gold) = futures::join!(
                    persist,
                    self.client.grant_xp(&self.character, *xp_reward, "battle victory"),
                    self.client.grant_gold(&self.character, *gold_reward),
                );
                if let Err(err) = persisted {
                    warn!(%err, "failed to persist hp/mana");
                }
                match xp {
                    Ok(grant) if grant.leveled_up => {
                        debug!(level = grant.new_level, "character leveled up")
                    }
                    Ok(_) => {}
                    Err(err) => warn!(%err, "failed to grant xp"),
                }
                if let Err(err) = gold {
                    warn!(%err, "failed to grant gold");
                }
            }
            BattleOutcome::Fled | BattleOutcome::PlayerDefeated => {
                if let Err(err) = persist.await {
                    warn!(%err, "failed to persist hp/mana");
                }
            }
        }
    }
}
