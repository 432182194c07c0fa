//! Static badge shop catalog.

use serde::Serialize;

/// One purchasable badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Badge {
    pub name: &'static str,
    pub cost: i64,
}

/// Shop offers in display order.
pub const CATALOG: &[Badge] = &[
    Badge {
        name: "Merch Item #1",
        cost: 10,
    },
    Badge {
        name: "Rank",
        cost: 20,
    },
    Badge {
        name: "Merch Item #2",
        cost: 30,
    },
];

/// Look up a catalog entry by its exact name.
pub fn find(name: &str) -> Option<&'static Badge> {
    CATALOG.iter().find(|badge| badge.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find() {
        assert_eq!(find("Rank").map(|b| b.cost), Some(20));
        assert!(find("rank").is_none());
        assert!(find("Gold Star").is_none());
    }
}
