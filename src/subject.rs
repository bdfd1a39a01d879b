// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Subject taxonomy and keyword classifier

use serde::{Deserialize, Serialize};

/// Academic subject used for tagging messages and study sessions.
///
/// Declaration order is the classifier's tie-break order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Subject {
    #[serde(rename = "math")]
    Mathematics,
    Science,
    History,
    English,
    Art,
    Music,
    #[serde(rename = "pe")]
    PhysicalEducation,
    #[serde(rename = "social")]
    SocialStudies,
    Psychology,
    General,
}

impl Subject {
    /// Every subject, in taxonomy order
    pub const ALL: [Subject; 10] = [
        Subject::Mathematics,
        Subject::Science,
        Subject::History,
        Subject::English,
        Subject::Art,
        Subject::Music,
        Subject::PhysicalEducation,
        Subject::SocialStudies,
        Subject::Psychology,
        Subject::General,
    ];

    /// Short stable identifier
    pub fn id(self) -> &'static str {
        match self {
            Subject::Mathematics => "math",
            Subject::Science => "science",
            Subject::History => "history",
            Subject::English => "english",
            Subject::Art => "art",
            Subject::Music => "music",
            Subject::PhysicalEducation => "pe",
            Subject::SocialStudies => "social",
            Subject::Psychology => "psychology",
            Subject::General => "general",
        }
    }

    /// Display name
    pub fn name(self) -> &'static str {
        match self {
            Subject::Mathematics => "Mathematics",
            Subject::Science => "Science",
            Subject::History => "History",
            Subject::English => "English",
            Subject::Art => "Art",
            Subject::Music => "Music",
            Subject::PhysicalEducation => "Physical Education",
            Subject::SocialStudies => "Social Studies",
            Subject::Psychology => "Psychology",
            Subject::General => "General",
        }
    }

    /// Lowercase keywords that classify text into this subject.
    ///
    /// `General` is never detected; it can only be chosen explicitly.
    pub fn keywords(self) -> &'static [&'static str] {
        match self {
            Subject::Mathematics => &[
                "math", "mathematics", "algebra", "geometry", "calculus", "equation", "formula",
                "number",
            ],
            Subject::Science => &[
                "science", "biology", "chemistry", "physics", "experiment", "hypothesis",
                "molecule", "atom",
            ],
            Subject::History => &[
                "history", "historical", "war", "ancient", "civilization", "century",
                "revolution", "empire",
            ],
            Subject::English => &[
                "english", "literature", "essay", "grammar", "writing", "reading", "poem",
                "novel",
            ],
            Subject::Art => &[
                "art", "drawing", "painting", "sketch", "color", "design", "creative",
                "artistic",
            ],
            Subject::Music => &[
                "music", "musical", "song", "instrument", "melody", "rhythm", "chord", "compose",
            ],
            Subject::PhysicalEducation => &[
                "pe", "physical", "exercise", "sport", "fitness", "gym", "athletic", "health",
            ],
            Subject::SocialStudies => &[
                "social", "society", "culture", "community", "government", "politics",
                "economics",
            ],
            Subject::Psychology => &[
                "psychology", "behavior", "mind", "emotion", "cognitive", "mental", "brain",
            ],
            Subject::General => &[],
        }
    }

    /// Look up a subject by id or display name (case-insensitive)
    pub fn from_id(value: &str) -> Option<Subject> {
        let value = value.trim();
        Subject::ALL
            .into_iter()
            .find(|s| s.id().eq_ignore_ascii_case(value) || s.name().eq_ignore_ascii_case(value))
    }
}

impl std::fmt::Display for Subject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Classify free text by case-insensitive substring match.
///
/// Returns the first subject, in taxonomy order, with any keyword hit.
pub fn detect(text: &str) -> Option<Subject> {
    let lower = text.to_lowercase();
    Subject::ALL
        .into_iter()
        .find(|subject| subject.keywords().iter().any(|kw| lower.contains(kw)))
}
