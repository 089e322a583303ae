//! Shared fixtures for unit tests.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use quest_graph::{NodeId, ObjectiveNode, QuestAsset};

use crate::objective::{Objective, ObjectiveContext, ObjectiveSnapshot};
use crate::quest::QuestRuntime;
use crate::services::{QuestServices, QuestSummary, QuestUi};

pub(crate) type Log = Rc<RefCell<Vec<String>>>;

/// External-style objective that logs its hooks.
pub(crate) struct Recorder {
    pub log: Log,
    pub label: String,
}

impl Objective for Recorder {
    fn execute(&mut self, _ctx: &mut ObjectiveContext<'_>) {
        self.log.borrow_mut().push(format!("execute:{}", self.label));
    }

    fn pause(&mut self, _ctx: &mut ObjectiveContext<'_>) {
        self.log.borrow_mut().push(format!("pause:{}", self.label));
    }

    fn resume(&mut self, _ctx: &mut ObjectiveContext<'_>) {
        self.log.borrow_mut().push(format!("resume:{}", self.label));
    }

    fn cleanup(&mut self, _ctx: &mut ObjectiveContext<'_>) {
        self.log.borrow_mut().push(format!("cleanup:{}", self.label));
    }

    fn name(&self) -> &str {
        "Recorder"
    }
}

/// Services whose `External` nodes are [`Recorder`]s writing to the returned log.
pub(crate) fn recording_services() -> (QuestServices, Log) {
    let log: Log = Rc::new(RefCell::new(Vec::new()));
    let mut services = QuestServices::default();
    let shared = log.clone();
    services.factory_mut().register("External", move |node| {
        Box::new(Recorder {
            log: shared.clone(),
            label: node.label().to_string(),
        })
    });
    (services, log)
}

/// Entry followed by one external node per label, linked in order.
pub(crate) fn chain_asset(labels: &[&str]) -> (QuestAsset, Vec<NodeId>) {
    let mut asset = QuestAsset::new("Chain");
    let entry = asset.add_node(ObjectiveNode::entry());
    let mut previous = entry;
    let mut ids = Vec::new();
    for label in labels {
        let id = asset.add_node(ObjectiveNode::external(*label));
        asset.graph.link(previous, id).unwrap();
        ids.push(id);
        previous = id;
    }
    (asset, ids)
}

pub(crate) fn started(asset: QuestAsset, services: &mut QuestServices) -> QuestRuntime {
    let mut runtime = QuestRuntime::new(Arc::new(asset), None);
    runtime.initialize(services, false);
    runtime.start(services);
    pump(&mut runtime, services);
    runtime
}

/// Drain the signal queue into a single runtime.
pub(crate) fn pump(runtime: &mut QuestRuntime, services: &mut QuestServices) {
    while let Some(signal) = services.pop_signal() {
        runtime.handle_signal(&signal, services);
    }
}

pub(crate) fn executed(log: &Log) -> Vec<String> {
    log.borrow()
        .iter()
        .filter(|entry| entry.starts_with("execute:"))
        .cloned()
        .collect()
}

/// UI surface that records what it was asked to show.
#[derive(Default)]
pub(crate) struct RecordingUi {
    pub shown: Rc<RefCell<Vec<Vec<String>>>>,
    pub removed: Rc<RefCell<usize>>,
}

impl QuestUi for RecordingUi {
    fn init_objectives(&mut self, _quest: &QuestSummary, objectives: &[ObjectiveSnapshot]) {
        self.shown
            .borrow_mut()
            .push(objectives.iter().map(|o| o.label.clone()).collect());
    }

    fn remove_objectives(&mut self, _quest: &QuestSummary) {
        *self.removed.borrow_mut() += 1;
    }
}
