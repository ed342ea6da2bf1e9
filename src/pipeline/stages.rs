use serde::Serialize;

pub const CLOSED_WON: &str = "Closed Won";

/// One column of the sales pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Stage {
    pub id: &'static str,
    pub name: &'static str,
    pub color: &'static str,
    pub icon: &'static str,
}

/// Pipeline columns in left-to-right order.
pub const STAGES: [Stage; 5] = [
    Stage {
        id: "Lead",
        name: "Lead",
        color: "gray",
        icon: "UserPlus",
    },
    Stage {
        id: "Qualified",
        name: "Qualified",
        color: "blue",
        icon: "CheckCircle",
    },
    Stage {
        id: "Proposal",
        name: "Proposal",
        color: "yellow",
        icon: "FileText",
    },
    Stage {
        id: "Negotiation",
        name: "Negotiation",
        color: "orange",
        icon: "MessageSquare",
    },
    Stage {
        id: CLOSED_WON,
        name: "Closed Won",
        color: "green",
        icon: "Trophy",
    },
];

pub fn all() -> &'static [Stage] {
    &STAGES
}

pub fn find(stage_id: &str) -> Option<&'static Stage> {
    STAGES.iter().find(|s| s.id == stage_id)
}

pub fn is_known(stage_id: &str) -> bool {
    find(stage_id).is_some()
}
