//! Statement generation from a natural-language prompt.
//!
//! [`TemplateStatementGenerator`] is the production generator today: it
//! ignores the prompt and returns a fixed statement over `data_points`
//! filtered by the statement id and a rolling day window. Any backend that
//! returns statement text using the recognised placeholders can replace it.

use async_trait::async_trait;
use tracing::debug;
use uuid::Uuid;

use crate::error::Result;
use crate::ports::StatementGenerator;

#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateStatementGenerator;

impl TemplateStatementGenerator {
    pub fn new() -> Self {
        Self
    }

    pub fn render(statement_id: Uuid) -> String {
        format!(
            r#"
            SELECT
                decay_value,
                decay_rate,
                items_flagged,
                notification_type,
                notification_category
            FROM data_points
            WHERE id = '{statement_id}'
            AND timestamp >= CURRENT_DATE - make_interval(days => :day_range);
            "#
        )
    }
}

#[async_trait]
impl StatementGenerator for TemplateStatementGenerator {
    async fn generate(&self, prompt: &str, statement_id: Uuid) -> Result<String> {
        debug!(%statement_id, prompt, "Generating statement from template");
        Ok(Self::render(statement_id))
    }
}
