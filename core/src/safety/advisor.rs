use async_trait::async_trait;

/// External text-completion collaborator consulted for ambiguous commands.
///
/// The classifier sends a fixed prompt and parses the reply for a
/// SEGURO/PERIGOSO verdict; any error from the advisor is treated as a deny.
#[async_trait]
pub trait SafetyAdvisor: Send + Sync {
    async fn generate_response(&self, prompt: &str) -> anyhow::Result<String>;
}
