//! Maps node kinds to behavior instances.

use std::collections::HashMap;

use quest_graph::{ObjectiveKind, ObjectiveNode};
use tracing::warn;

use super::{EntryObjective, ExternalObjective, Objective, WaitObjective};
use crate::sequence::SequenceObjective;
use crate::sub_quest::SubQuestObjective;

pub type ObjectiveConstructor = Box<dyn Fn(&ObjectiveNode) -> Box<dyn Objective>>;

/// Builds a fresh behavior for every runtime wrapper.
///
/// Constructors registered under a kind's type name take precedence over
/// the built-in behavior for that kind, so hosts can also replace e.g. `Wait`.
#[derive(Default)]
pub struct ObjectiveFactory {
    constructors: HashMap<String, ObjectiveConstructor>,
}

impl ObjectiveFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a constructor. Returns true if it replaced an earlier one.
    pub fn register<F>(&mut self, type_tag: impl Into<String>, constructor: F) -> bool
    where
        F: Fn(&ObjectiveNode) -> Box<dyn Objective> + 'static,
    {
        self.constructors
            .insert(type_tag.into(), Box::new(constructor))
            .is_some()
    }

    pub fn is_registered(&self, type_tag: &str) -> bool {
        self.constructors.contains_key(type_tag)
    }

    pub fn create(&self, node: &ObjectiveNode) -> Box<dyn Objective> {
        if let Some(constructor) = self.constructors.get(node.kind.type_name()) {
            return constructor(node);
        }

        match &node.kind {
            ObjectiveKind::Entry => Box::new(EntryObjective),
            ObjectiveKind::Wait(settings) => Box::new(WaitObjective::new(settings.clone())),
            ObjectiveKind::Sequence(settings) => Box::new(SequenceObjective::new(settings.mode)),
            ObjectiveKind::SubQuest(settings) => Box::new(SubQuestObjective::new(settings.clone())),
            ObjectiveKind::External => Box::new(ExternalObjective),
            ObjectiveKind::Custom { type_tag, .. } => {
                warn!(
                    type_tag = %type_tag,
                    node = %node.id,
                    "No constructor registered for objective type, waiting for external completion"
                );
                Box::new(ExternalObjective)
            }
        }
    }
}

impl std::fmt::Debug for ObjectiveFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut tags: Vec<&String> = self.constructors.keys().collect();
        tags.sort();
        f.debug_struct("ObjectiveFactory")
            .field("constructors", &tags)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objective::ObjectiveContext;

    struct Instant;

    impl Objective for Instant {
        fn execute(&mut self, ctx: &mut ObjectiveContext<'_>) {
            ctx.complete();
        }

        fn name(&self) -> &str {
            "Instant"
        }
    }

    #[test]
    fn test_builtin_kinds() {
        let factory = ObjectiveFactory::new();
        assert_eq!(factory.create(&ObjectiveNode::entry()).name(), "Launch");
        assert_eq!(factory.create(&ObjectiveNode::wait(1.0)).name(), "Wait");
        assert_eq!(factory.create(&ObjectiveNode::external("x")).name(), "External");
    }

    #[test]
    fn test_custom_registration() {
        let mut factory = ObjectiveFactory::new();
        assert!(!factory.register("Instant", |_| Box::new(Instant)));
        assert!(factory.is_registered("Instant"));

        let node = ObjectiveNode::new(ObjectiveKind::custom("Instant"));
        assert_eq!(factory.create(&node).name(), "Instant");

        let unknown = ObjectiveNode::new(ObjectiveKind::custom("Teleport"));
        assert_eq!(factory.create(&unknown).name(), "External");
    }

    #[test]
    fn test_builtin_override() {
        let mut factory = ObjectiveFactory::new();
        factory.register("Wait", |_| Box::new(Instant));
        assert_eq!(factory.create(&ObjectiveNode::wait(3.0)).name(), "Instant");
    }
}
