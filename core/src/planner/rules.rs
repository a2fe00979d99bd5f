//! Fixed keyword rule table for instruction parsing.
//!
//! Table order is plan order: tasks are emitted in the order the rules are
//! listed here, not in the order the words appear in the instruction. This
//! is documented behavior, preserved on purpose.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RuleKind {
    Verification,
    Fix,
    Creation,
    FinalValidation,
}

pub(crate) struct PlanRule {
    pub kind: RuleKind,
    pub triggers: &'static [&'static str],
}

impl PlanRule {
    pub fn matches(&self, lowered_instruction: &str) -> bool {
        self.triggers.iter().any(|t| lowered_instruction.contains(t))
    }
}

/// Trigger vocabularies cover the Portuguese wording of the original tool
/// plus English equivalents.
pub(crate) const RULES: &[PlanRule] = &[
    PlanRule {
        kind: RuleKind::Verification,
        triggers: &["verifica", "verify", "check", "analisa", "analyze", "teste", "test"],
    },
    PlanRule {
        kind: RuleKind::Fix,
        triggers: &["corrige", "fix", "conserta", "resolve", "correct"],
    },
    PlanRule {
        kind: RuleKind::Creation,
        triggers: &[
            "crie", "criar", "adiciona", "novo", "nova", "gere", "create", "add", "new",
            "generate",
        ],
    },
    PlanRule {
        kind: RuleKind::FinalValidation,
        triggers: &["valida", "validate", "testa", "confirma", "confirm", "100%"],
    },
];

/// Nested vocabulary for the creation rule's object branch.
pub(crate) const FUNCTION_WORDS: &[&str] = &["função", "funcao", "function"];
pub(crate) const DIRECTORY_WORDS: &[&str] =
    &["pasta", "diretório", "diretorio", "folder", "directory"];
pub(crate) const FILE_WORDS: &[&str] = &["arquivo", "file"];
pub(crate) const MEMORY_WORDS: &[&str] = &[
    "memória",
    "memórias",
    "memorias",
    "memoria",
    "lembrança",
    "lembranças",
    "lembranca",
    "lembrancas",
    "memories",
    "memory",
];

/// Words announcing an explicit name for the created object.
pub(crate) const NAME_MARKERS: &[&str] = &["chamada", "chamado", "named", "called"];
