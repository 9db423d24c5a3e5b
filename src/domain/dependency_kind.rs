/// Only `Blocks` edges take part in blocked/unblocked and critical-path
/// queries; every kind takes part in cycle prevention.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum DependencyType {
    #[default]
    Blocks,
    Related,
    Suggested,
}

closed_vocabulary!(DependencyType, "dependency type", [
    Blocks => "blocks",
    Related => "related",
    Suggested => "suggested",
]);

impl DependencyType {
    pub fn is_blocking(self) -> bool {
        self == DependencyType::Blocks
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum CreatedBy {
    #[default]
    User,
    AiSuggested,
}

closed_vocabulary!(CreatedBy, "dependency author", [
    User => "user",
    AiSuggested => "ai_suggested",
]);

#[cfg(test)]
mod tests {
    use super::{CreatedBy, DependencyType};
    use std::str::FromStr;

    #[test]
    fn defaults_match_storage_defaults() {
        assert_eq!(DependencyType::default(), DependencyType::Blocks);
        assert_eq!(CreatedBy::default(), CreatedBy::User);
    }

    #[test]
    fn only_blocks_is_blocking() {
        assert!(DependencyType::Blocks.is_blocking());
        assert!(!DependencyType::Related.is_blocking());
        assert!(!DependencyType::Suggested.is_blocking());
    }

    #[test]
    fn accepts_dashed_author_spelling() {
        assert_eq!(
            CreatedBy::from_str("ai-suggested").unwrap(),
            CreatedBy::AiSuggested
        );
    }
}
