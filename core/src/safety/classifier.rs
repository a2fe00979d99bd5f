use std::sync::Arc;

use crate::config::SafetyConfig;

use super::advisor::SafetyAdvisor;
use super::denylist::{DENY_PATTERNS, DENY_SUBSTRINGS, METACHARACTERS};

/// Heuristic allow/deny gate for shell commands.
///
/// Decision order: substring denylist, regex denylist, advisor escalation for
/// long or metacharacter-bearing commands, otherwise allow. Fails closed
/// whenever the advisor is missing or errors.
pub struct SafetyClassifier {
    cfg: SafetyConfig,
    advisor: Option<Arc<dyn SafetyAdvisor>>,
}

impl SafetyClassifier {
    pub fn new(cfg: SafetyConfig) -> Self {
        Self { cfg, advisor: None }
    }

    pub fn with_advisor(cfg: SafetyConfig, advisor: Arc<dyn SafetyAdvisor>) -> Self {
        Self {
            cfg,
            advisor: Some(advisor),
        }
    }

    pub async fn is_safe(&self, command: &str) -> bool {
        let lowered = command.to_lowercase();

        for fragment in DENY_SUBSTRINGS {
            if lowered.contains(fragment) {
                tracing::debug!(%command, fragment, "denied by substring table");
                return false;
            }
        }

        for pattern in DENY_PATTERNS.iter() {
            if pattern.is_match(&lowered) {
                tracing::debug!(%command, pattern = %pattern.as_str(), "denied by pattern table");
                return false;
            }
        }

        if self.needs_escalation(command) {
            return self.advisor_verdict(command).await;
        }

        true
    }

    fn needs_escalation(&self, command: &str) -> bool {
        command.len() > self.cfg.max_plain_length
            || command.chars().any(|c| METACHARACTERS.contains(&c))
    }

    async fn advisor_verdict(&self, command: &str) -> bool {
        let Some(advisor) = self.advisor.as_ref() else {
            tracing::debug!(%command, "no advisor configured, escalated command denied");
            return false;
        };

        let prompt = verdict_prompt(command);
        match advisor.generate_response(&prompt).await {
            Ok(reply) => reply.to_uppercase().contains("SEGURO"),
            Err(e) => {
                // Err on the side of safety.
                tracing::warn!(%command, error = %e, "advisor check failed, denying");
                false
            }
        }
    }
}

fn verdict_prompt(command: &str) -> String {
    format!(
        "Analyze this shell command and decide whether it is safe to execute:\n\n\
         Command: {command}\n\n\
         Consider destructive commands (rm, del, format), remote code execution,\n\
         dangerous permission changes, injection attacks, fork bombs and DoS.\n\n\
         Answer with a single word: SEGURO or PERIGOSO"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct StaticAdvisor {
        reply: Option<&'static str>,
    }

    #[async_trait]
    impl SafetyAdvisor for StaticAdvisor {
        async fn generate_response(&self, _prompt: &str) -> anyhow::Result<String> {
            match self.reply {
                Some(r) => Ok(r.to_string()),
                None => Err(anyhow::anyhow!("advisor unavailable")),
            }
        }
    }

    fn classifier() -> SafetyClassifier {
        SafetyClassifier::new(SafetyConfig::default())
    }

    #[tokio::test]
    async fn denies_destructive_substrings() {
        let c = classifier();
        assert!(!c.is_safe("rm -rf /").await);
        assert!(!c.is_safe("sudo rm important.txt").await);
        assert!(!c.is_safe("shutdown -h now").await);
        assert!(!c.is_safe("echo hi && rm -rf src").await);
    }

    #[tokio::test]
    async fn denies_pattern_matches() {
        let c = classifier();
        assert!(!c.is_safe("dd if=/dev/zero of=/dev/sda").await);
        assert!(!c.is_safe("cat garbage > /dev/sda").await);
        assert!(!c.is_safe("mkfs.ext4 /dev/sdb1").await);
    }

    #[tokio::test]
    async fn allows_plain_commands() {
        let c = classifier();
        assert!(c.is_safe("ls -la").await);
        assert!(c.is_safe("mkdir ideias").await);
        assert!(c.is_safe("echo hello").await);
    }

    #[tokio::test]
    async fn escalation_fails_closed_without_advisor() {
        let c = classifier();
        // metacharacters
        assert!(!c.is_safe("echo $(whoami)").await);
        // over the length threshold
        let long = format!("echo {}", "a".repeat(60));
        assert!(!c.is_safe(&long).await);
    }

    #[tokio::test]
    async fn advisor_verdict_is_honored() {
        let safe = SafetyClassifier::with_advisor(
            SafetyConfig::default(),
            std::sync::Arc::new(StaticAdvisor {
                reply: Some("SEGURO"),
            }),
        );
        assert!(safe.is_safe("echo $(date)").await);

        let unsafe_c = SafetyClassifier::with_advisor(
            SafetyConfig::default(),
            std::sync::Arc::new(StaticAdvisor {
                reply: Some("PERIGOSO"),
            }),
        );
        assert!(!unsafe_c.is_safe("echo $(date)").await);
    }

    #[tokio::test]
    async fn advisor_errors_deny() {
        let c = SafetyClassifier::with_advisor(
            SafetyConfig::default(),
            std::sync::Arc::new(StaticAdvisor { reply: None }),
        );
        assert!(!c.is_safe("echo $(date)").await);
    }
}
