// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Catalog of suggested skills offered to the profile editor.
//!
//! Profiles may also carry free-text skills outside this list.

use serde::Serialize;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

#[derive(Debug, Clone, Copy, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Skill {
    pub id: &'static str,
    pub label: &'static str,
}

#[derive(Debug, Clone, Copy, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SkillCategory {
    pub category: &'static str,
    pub skills: &'static [Skill],
}

pub const SKILL_CATALOG: &[SkillCategory] = &[
    SkillCategory {
        category: "transport",
        skills: &[
            Skill {
                id: "driving_license_b",
                label: "Driving license (category B)",
            },
            Skill {
                id: "offroad_experience",
                label: "Off-road driving experience",
            },
            Skill {
                id: "car_rental",
                label: "Can rent a car",
            },
        ],
    },
    SkillCategory {
        category: "languages",
        skills: &[
            Skill {
                id: "english_intermediate",
                label: "English (Intermediate)",
            },
            Skill {
                id: "german_basic",
                label: "German (Basic)",
            },
        ],
    },
    SkillCategory {
        category: "general",
        skills: &[
            Skill {
                id: "photographer",
                label: "Photographer",
            },
            Skill {
                id: "cook",
                label: "Cook",
            },
            Skill {
                id: "medical_training",
                label: "Medical training",
            },
            Skill {
                id: "survival_skills",
                label: "Wilderness survival",
            },
        ],
    },
];

/// Look up a catalog skill by ID.
pub fn find_skill(id: &str) -> Option<&'static Skill> {
    SKILL_CATALOG
        .iter()
        .flat_map(|c| c.skills.iter())
        .find(|s| s.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_skill_ids_unique() {
        let ids: Vec<_> = SKILL_CATALOG
            .iter()
            .flat_map(|c| c.skills.iter().map(|s| s.id))
            .collect();
        let unique: HashSet<_> = ids.iter().collect();
        assert_eq!(ids.len(), unique.len());
        assert_eq!(ids.len(), 9);
    }

    #[test]
    fn test_find_skill() {
        assert_eq!(find_skill("cook").map(|s| s.label), Some("Cook"));
        assert!(find_skill("juggling").is_none());
    }
}
