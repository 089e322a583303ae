//! Quest assets - a quest graph plus the metadata and rewards around it.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::{NodeId, ObjectiveNode, QuestAssetId, QuestGraph};

/// Broad classification of a quest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum QuestType {
    #[default]
    Main,
    Side,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub enum QuestDifficulty {
    #[default]
    Easy,
    Medium,
    Hard,
    VeryHard,
}

/// One reward handed out when a quest completes.
///
/// How a reward is granted is up to the host; `kind` and `properties`
/// carry whatever it needs to decide.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RewardEntry {
    pub label: String,
    pub value: String,
    pub kind: String,
    pub properties: HashMap<String, serde_json::Value>,
}

impl RewardEntry {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
            ..Self::default()
        }
    }

    /// Builder: set the reward kind.
    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = kind.into();
        self
    }

    /// Builder: attach a property.
    pub fn with_property(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.properties.insert(key.into(), value);
        self
    }
}

impl Default for RewardEntry {
    fn default() -> Self {
        Self {
            label: "Default Reward".to_string(),
            value: "1".to_string(),
            kind: String::new(),
            properties: HashMap::new(),
        }
    }
}

/// A complete quest definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestAsset {
    pub id: QuestAssetId,
    pub title: String,
    pub description: String,
    pub quest_type: QuestType,
    pub difficulty: QuestDifficulty,
    /// Whether a completed instance may be added again.
    pub repeatable: bool,
    pub rewards: Vec<RewardEntry>,
    pub graph: QuestGraph,
}

impl QuestAsset {
    /// Create an asset with an empty graph.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// Builder: set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Builder: set the quest type.
    pub fn with_type(mut self, quest_type: QuestType) -> Self {
        self.quest_type = quest_type;
        self
    }

    /// Builder: set the difficulty.
    pub fn with_difficulty(mut self, difficulty: QuestDifficulty) -> Self {
        self.difficulty = difficulty;
        self
    }

    /// Builder: mark as repeatable.
    pub fn repeatable(mut self) -> Self {
        self.repeatable = true;
        self
    }

    /// Builder: add a reward.
    pub fn with_reward(mut self, reward: RewardEntry) -> Self {
        self.rewards.push(reward);
        self
    }

    /// Shorthand for `self.graph.add_node`.
    pub fn add_node(&mut self, node: ObjectiveNode) -> NodeId {
        self.graph.add_node(node)
    }
}

impl Default for QuestAsset {
    fn default() -> Self {
        Self {
            id: QuestAssetId::new(),
            title: "Default Quest Title".to_string(),
            description: String::new(),
            quest_type: QuestType::default(),
            difficulty: QuestDifficulty::default(),
            repeatable: false,
            rewards: Vec::new(),
            graph: QuestGraph::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_asset_builder() {
        let asset = QuestAsset::new("The Lost Ring")
            .with_description("Find the ring")
            .with_type(QuestType::Side)
            .with_difficulty(QuestDifficulty::Hard)
            .repeatable()
            .with_reward(RewardEntry::new("Gold", "50").with_kind("currency"));

        assert_eq!(asset.title, "The Lost Ring");
        assert_eq!(asset.quest_type, QuestType::Side);
        assert!(asset.difficulty > QuestDifficulty::Medium);
        assert!(asset.repeatable);
        assert_eq!(asset.rewards[0].kind, "currency");
        assert!(asset.graph.is_empty());
    }

    #[test]
    fn test_defaults() {
        let asset = QuestAsset::default();
        assert_eq!(asset.title, "Default Quest Title");
        let reward = RewardEntry::default();
        assert_eq!(reward.label, "Default Reward");
        assert_eq!(reward.value, "1");
    }

    #[test]
    fn test_reward_properties_serialize() {
        let reward = RewardEntry::new("Item", "1").with_property("item", serde_json::json!("sword"));
        let json = serde_json::to_string(&reward).unwrap();
        let parsed: RewardEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.properties.get("item"), Some(&serde_json::json!("sword")));
    }
}
