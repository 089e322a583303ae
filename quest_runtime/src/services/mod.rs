//! Services shared by every quest runtime: signal queue, objective factory,
//! asset library, receivers, UI surface, and reward granting.

mod events;
mod receivers;

pub use events::*;
pub use receivers::*;

use std::any::Any;
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;
use std::sync::Arc;

use quest_graph::{QuestAsset, QuestAssetId, RewardEntry};
use tracing::debug;

use crate::config::QuestConfig;
use crate::error::{QuestError, Result};
use crate::objective::{ObjectiveFactory, ObjectiveSignal, ObjectiveSnapshot};
use crate::quest::{QuestInstanceId, QuestStatus};

/// Opaque handle to whatever world the host runs quests in.
pub type WorldContext = Rc<dyn Any>;

/// Opaque handle to the player rewards are granted to.
pub type PlayerContext = Rc<dyn Any>;

/// Identity of a quest instance as shown to UI and reward surfaces.
#[derive(Debug, Clone, PartialEq)]
pub struct QuestSummary {
    pub asset: QuestAssetId,
    pub instance: QuestInstanceId,
    pub title: String,
    pub status: QuestStatus,
}

/// On-screen quest tracker.
pub trait QuestUi {
    /// Called once when the surface is attached.
    fn attach(&mut self, _z_order: i32) {}

    fn init_objectives(&mut self, quest: &QuestSummary, objectives: &[ObjectiveSnapshot]);

    fn remove_objectives(&mut self, quest: &QuestSummary);

    fn set_visible(&mut self, _visible: bool) {}
}

/// Hands out quest rewards.
pub trait RewardGranter {
    fn grant_reward(&mut self, reward: &RewardEntry, player: Option<&PlayerContext>);
}

/// Quest assets available to the runtime, keyed by id.
#[derive(Debug, Default)]
pub struct AssetLibrary {
    assets: HashMap<QuestAssetId, Arc<QuestAsset>>,
}

impl AssetLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, asset: QuestAsset) -> QuestAssetId {
        self.register_shared(Arc::new(asset))
    }

    pub fn register_shared(&mut self, asset: Arc<QuestAsset>) -> QuestAssetId {
        let id = asset.id;
        self.assets.insert(id, asset);
        id
    }

    pub fn get(&self, id: QuestAssetId) -> Option<Arc<QuestAsset>> {
        self.assets.get(&id).cloned()
    }

    pub fn require(&self, id: QuestAssetId) -> Result<Arc<QuestAsset>> {
        self.get(id).ok_or(QuestError::UnknownAsset(id))
    }

    pub fn remove(&mut self, id: QuestAssetId) -> Option<Arc<QuestAsset>> {
        self.assets.remove(&id)
    }

    pub fn contains(&self, id: QuestAssetId) -> bool {
        self.assets.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }
}

/// A quest runtime reached a terminal status.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct QuestOutcome {
    pub asset: QuestAssetId,
    pub instance: QuestInstanceId,
    pub status: QuestStatus,
}

/// Everything a quest runtime needs from its surroundings.
///
/// Runtimes, optional objectives, and composite children all share one
/// instance, owned by the subsystem.
pub struct QuestServices {
    pub(crate) config: QuestConfig,
    pub(crate) signals: VecDeque<ObjectiveSignal>,
    pub(crate) factory: ObjectiveFactory,
    pub(crate) assets: AssetLibrary,
    pub(crate) receivers: ReceiverRegistry,
    pub(crate) ui: Option<Box<dyn QuestUi>>,
    pub(crate) rewards: Option<Box<dyn RewardGranter>>,
    pub(crate) player: Option<PlayerContext>,
    pub(crate) world: Option<WorldContext>,
    pub(crate) outcomes: Vec<QuestOutcome>,
    pub(crate) lifecycle: Vec<QuestLifecycleEvent>,
    /// Bumped at the start of every subsystem pump.
    pub(crate) pump: u64,
}

impl QuestServices {
    pub fn new(config: QuestConfig) -> Self {
        Self {
            config,
            signals: VecDeque::new(),
            factory: ObjectiveFactory::new(),
            assets: AssetLibrary::new(),
            receivers: ReceiverRegistry::new(),
            ui: None,
            rewards: None,
            player: None,
            world: None,
            outcomes: Vec::new(),
            lifecycle: Vec::new(),
            pump: 0,
        }
    }

    pub fn config(&self) -> &QuestConfig {
        &self.config
    }

    pub fn factory(&self) -> &ObjectiveFactory {
        &self.factory
    }

    pub fn factory_mut(&mut self) -> &mut ObjectiveFactory {
        &mut self.factory
    }

    pub fn assets(&self) -> &AssetLibrary {
        &self.assets
    }

    pub fn assets_mut(&mut self) -> &mut AssetLibrary {
        &mut self.assets
    }

    pub fn receivers(&self) -> &ReceiverRegistry {
        &self.receivers
    }

    pub fn receivers_mut(&mut self) -> &mut ReceiverRegistry {
        &mut self.receivers
    }

    pub fn set_ui(&mut self, mut ui: Box<dyn QuestUi>) {
        ui.attach(self.config.quest_screen_z_order);
        self.ui = Some(ui);
    }

    pub fn set_reward_granter(&mut self, granter: Box<dyn RewardGranter>) {
        self.rewards = Some(granter);
    }

    pub fn set_player_context(&mut self, player: PlayerContext) {
        self.player = Some(player);
    }

    pub fn set_world_context(&mut self, world: WorldContext) {
        self.world = Some(world);
    }

    pub fn world_context(&self) -> Option<&WorldContext> {
        self.world.as_ref()
    }

    /// Queue a signal for the next pump.
    pub fn push_signal(&mut self, signal: ObjectiveSignal) {
        self.signals.push_back(signal);
    }

    /// Take the next queued signal.
    pub fn pop_signal(&mut self) -> Option<ObjectiveSignal> {
        self.signals.pop_front()
    }

    pub fn pending_signals(&self) -> usize {
        self.signals.len()
    }

    pub(crate) fn broadcast_event(&mut self, quest: QuestAssetId, event: QuestEventType) {
        let reached = self.receivers.broadcast_event(quest, event);
        debug!(quest = %quest, event = %event, receivers = reached, "Broadcast quest event");
    }

    pub(crate) fn broadcast_tag(&mut self, quest: QuestAssetId, tag: &QuestTag) {
        let reached = self.receivers.broadcast_tag(quest, tag);
        debug!(quest = %quest, tag = %tag, receivers = reached, "Broadcast quest tag");
    }

    pub(crate) fn grant_reward(&mut self, reward: &RewardEntry) {
        match self.rewards.as_mut() {
            Some(granter) => granter.grant_reward(reward, self.player.as_ref()),
            None => debug!(reward = %reward.label, "No reward granter attached"),
        }
    }

    pub(crate) fn set_ui_visible(&mut self, visible: bool) {
        if let Some(ui) = self.ui.as_mut() {
            ui.set_visible(visible);
        }
    }

    pub(crate) fn show_objectives(&mut self, quest: &QuestSummary, objectives: &[ObjectiveSnapshot]) {
        if let Some(ui) = self.ui.as_mut() {
            ui.remove_objectives(quest);
            ui.init_objectives(quest, objectives);
        }
    }

    pub(crate) fn hide_objectives(&mut self, quest: &QuestSummary) {
        if let Some(ui) = self.ui.as_mut() {
            ui.remove_objectives(quest);
        }
    }
}

impl Default for QuestServices {
    fn default() -> Self {
        Self::new(QuestConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[derive(Default)]
    struct Ledger {
        granted: Rc<RefCell<Vec<String>>>,
    }

    impl RewardGranter for Ledger {
        fn grant_reward(&mut self, reward: &RewardEntry, player: Option<&PlayerContext>) {
            let who = player
                .and_then(|p| p.downcast_ref::<String>())
                .cloned()
                .unwrap_or_default();
            self.granted.borrow_mut().push(format!("{}:{}", who, reward.label));
        }
    }

    #[test]
    fn test_asset_library() {
        let mut library = AssetLibrary::new();
        let id = library.register(QuestAsset::new("Fetch"));

        assert!(library.contains(id));
        assert_eq!(library.require(id).unwrap().title, "Fetch");

        let missing = QuestAssetId::new();
        assert!(matches!(library.require(missing), Err(QuestError::UnknownAsset(m)) if m == missing));
    }

    #[test]
    fn test_reward_granting_uses_player_context() {
        let granted = Rc::new(RefCell::new(Vec::new()));
        let mut services = QuestServices::default();
        services.set_reward_granter(Box::new(Ledger {
            granted: granted.clone(),
        }));
        services.set_player_context(Rc::new("hero".to_string()));

        services.grant_reward(&RewardEntry::new("Gold", "10"));
        assert_eq!(*granted.borrow(), vec!["hero:Gold".to_string()]);
    }
}
