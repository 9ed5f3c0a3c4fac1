//! Ask command handler.
//!
//! Runs the full question-answering pipeline and prints the answer.

use clap::Args;
use veye_core::{AppConfig, AppError, AppResult};
use veye_retrieval::AnswerStatus;

/// Ask a situational question and get a grounded answer
#[derive(Args, Debug)]
pub struct AskCommand {
    /// The question to ask
    pub question: String,

    /// Output as JSON with status and language metadata
    #[arg(long)]
    pub json: bool,
}

impl AskCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing ask command");

        let engine = super::build_engine(config)?;
        let answer = engine.answer_question(&self.question).await;

        if self.json {
            let output = serde_json::json!({
                "status": answer.status,
                "answer": answer.answer,
                "language": answer.language,
            });
            let json = serde_json::to_string_pretty(&output)
                .map_err(|e| AppError::Serialization(e.to_string()))?;
            println!("{}", json);
        } else {
            println!("{}", answer.answer);
        }

        // A degraded answer was still printed; the exit code reflects it
        if answer.status == AnswerStatus::Error {
            return Err(AppError::Retrieval(
                "Answer generation failed; apology returned".to_string(),
            ));
        }

        Ok(())
    }
}
