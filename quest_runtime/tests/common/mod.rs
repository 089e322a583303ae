#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use quest_graph::{NodeId, ObjectiveNode, QuestAsset, QuestAssetId, RewardEntry};
use quest_runtime::{
    ObjectiveSnapshot, PlayerContext, QuestEventType, QuestReceiver, QuestSubsystem,
    QuestSummary, QuestTag, QuestUi, RewardGranter, WorldContext,
};
use tracing_subscriber::EnvFilter;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn world() -> WorldContext {
    Rc::new("overworld".to_string())
}

pub fn subsystem() -> QuestSubsystem {
    init_tracing();
    let mut subsystem = QuestSubsystem::with_defaults();
    subsystem.set_world_context(world());
    subsystem
}

/// Entry followed by one external node per label.
pub fn chain(title: &str, labels: &[&str]) -> (QuestAsset, Vec<NodeId>) {
    let mut asset = QuestAsset::new(title);
    let mut previous = asset.add_node(ObjectiveNode::entry());
    let mut ids = Vec::new();
    for label in labels {
        let id = asset.add_node(ObjectiveNode::external(*label));
        asset.graph.link(previous, id).expect("link chain");
        ids.push(id);
        previous = id;
    }
    (asset, ids)
}

pub fn current_label(subsystem: &QuestSubsystem, quest: QuestAssetId) -> Option<String> {
    let runtime = subsystem.runtime(quest)?;
    let node = runtime.current_objective()?.node();
    runtime.asset().graph.node(node).map(|n| n.label().to_string())
}

pub fn complete_current(subsystem: &mut QuestSubsystem, quest: QuestAssetId) -> bool {
    let id = subsystem
        .current_objective(quest)
        .expect("quest has a current objective")
        .id();
    subsystem.complete_objective(id)
}

#[derive(Default)]
pub struct EventLog {
    pub events: RefCell<Vec<QuestEventType>>,
    pub tags: RefCell<Vec<String>>,
}

impl QuestReceiver for EventLog {
    fn on_quest_event(&self, _quest: QuestAssetId, event: QuestEventType) {
        self.events.borrow_mut().push(event);
    }

    fn on_quest_tag(&self, _quest: QuestAssetId, tag: &QuestTag) {
        self.tags.borrow_mut().push(tag.as_str().to_string());
    }
}

/// UI surface that writes every call to a shared log.
pub struct ScreenLog {
    pub log: Rc<RefCell<Vec<String>>>,
}

impl QuestUi for ScreenLog {
    fn attach(&mut self, z_order: i32) {
        self.log.borrow_mut().push(format!("attach:{}", z_order));
    }

    fn init_objectives(&mut self, quest: &QuestSummary, objectives: &[ObjectiveSnapshot]) {
        let labels: Vec<&str> = objectives.iter().map(|o| o.label.as_str()).collect();
        self.log
            .borrow_mut()
            .push(format!("init:{}:{}", quest.title, labels.join(",")));
    }

    fn remove_objectives(&mut self, quest: &QuestSummary) {
        self.log.borrow_mut().push(format!("remove:{}", quest.title));
    }

    fn set_visible(&mut self, visible: bool) {
        self.log.borrow_mut().push(format!("visible:{}", visible));
    }
}

pub struct Purse {
    pub granted: Rc<RefCell<Vec<String>>>,
}

impl RewardGranter for Purse {
    fn grant_reward(&mut self, reward: &RewardEntry, player: Option<&PlayerContext>) {
        let owner = player
            .and_then(|p| p.downcast_ref::<String>())
            .cloned()
            .unwrap_or_else(|| "nobody".to_string());
        self.granted
            .borrow_mut()
            .push(format!("{}:{}x{}", owner, reward.label, reward.value));
    }
}
