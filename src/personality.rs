//! Response persona selection
//!
//! Maps user text onto one of a fixed set of response personas. Explicit
//! mode phrases win over keyword matching; the selector is total and always
//! returns a registered persona.

use serde::Deserialize;
use serde::Serialize;

/// Closed set of response personas. Adding one is a data change: extend the
/// enum, its keyword list, and its template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Persona {
    Teacher,
    Researcher,
    General,
}

/// Explicit override phrases, checked before any keyword matching.
const OVERRIDES: &[(&str, Persona)] = &[
    ("teaching mode", Persona::Teacher),
    ("teacher mode", Persona::Teacher),
    ("research mode", Persona::Researcher),
    ("analyst mode", Persona::Researcher),
    ("general mode", Persona::General),
    ("normal mode", Persona::General),
];

impl Persona {
    pub const ALL: [Self; 3] = [Self::Teacher, Self::Researcher, Self::General];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Teacher => "teacher",
            Self::Researcher => "researcher",
            Self::General => "general",
        }
    }

    /// Keywords whose presence selects this persona.
    const fn keywords(self) -> &'static [&'static str] {
        match self {
            Self::Teacher => &[
                "explain",
                "teach me",
                "walk me through",
                "step by step",
                "what is",
                "beginner",
            ],
            Self::Researcher => &[
                "compare",
                "analyze",
                "analysis",
                "in depth",
                "evidence",
                "trade-off",
                "survey",
            ],
            Self::General => &[],
        }
    }

    /// System-prompt template for this persona.
    #[must_use]
    pub const fn system_prompt(self) -> &'static str {
        match self {
            Self::Teacher => {
                "You are a patient security instructor. Explain concepts from the \
                 reference material step by step, define jargon on first use, and \
                 close with a short summary the learner can retain. Ground every \
                 statement in the provided context and cite sources by their \
                 bracketed citation number."
            }
            Self::Researcher => {
                "You are a meticulous security analyst. Answer precisely and in \
                 depth from the reference material, weigh conflicting sources \
                 explicitly, and cite sources by their bracketed citation number. \
                 When the material does not support a claim, say so instead of \
                 speculating."
            }
            Self::General => {
                "You are a helpful assistant answering questions about network \
                 security. Base your answer on the reference material, cite sources \
                 by their bracketed citation number, and say plainly when the \
                 material does not cover the question."
            }
        }
    }
}

/// Select a persona for the given user text. Total: always returns one of
/// the registered personas, defaulting to `General`.
#[must_use]
pub fn detect_personality(user_input: &str) -> Persona {
    let lowered = user_input.to_lowercase();

    // Explicit override phrases take precedence
    for (phrase, persona) in OVERRIDES {
        if lowered.contains(phrase) {
            return *persona;
        }
    }

    // Keyword matching per registered persona
    for persona in Persona::ALL {
        if persona
            .keywords()
            .iter()
            .any(|keyword| lowered.contains(keyword))
        {
            return persona;
        }
    }

    Persona::General
}
