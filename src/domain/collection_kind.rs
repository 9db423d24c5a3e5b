#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum CollectionType {
    #[default]
    Default,
    Quarterly,
    Monthly,
    Daily,
    Project,
    Custom,
}

closed_vocabulary!(CollectionType, "collection type", [
    Default => "DEFAULT",
    Quarterly => "QUARTERLY",
    Monthly => "MONTHLY",
    Daily => "DAILY",
    Project => "PROJECT",
    Custom => "CUSTOM",
]);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollectionSubType {
    Task,
    Event,
    Plan,
    Log,
    Custom,
}

closed_vocabulary!(CollectionSubType, "collection sub-type", [
    Task => "TASK",
    Event => "EVENT",
    Plan => "PLAN",
    Log => "LOG",
    Custom => "CUSTOM",
]);

#[cfg(test)]
mod tests {
    use super::{CollectionSubType, CollectionType};
    use std::str::FromStr;

    #[test]
    fn parses_types_case_insensitively() {
        assert_eq!(
            CollectionType::from_str("project").unwrap(),
            CollectionType::Project
        );
        assert_eq!(
            CollectionSubType::from_str("Log").unwrap(),
            CollectionSubType::Log
        );
        assert!(CollectionType::from_str("weekly").is_err());
    }
}
