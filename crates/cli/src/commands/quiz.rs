//! `academaide quiz`: generate a quiz from course materials.

use tokio_util::sync::CancellationToken;

use academaide_config::AppConfig;
use academaide_pipeline::QuizRequest;

use crate::runtime::{CliResult, StoreMode, build_pipeline};

pub async fn run(
    config: AppConfig,
    mode: StoreMode,
    course_id: String,
    unit: Option<u32>,
    questions: Option<usize>,
) -> CliResult<()> {
    let pipeline = build_pipeline(&config, &mode).await?;

    let mut request = QuizRequest::new(course_id, unit);
    request.num_questions = questions;

    let quiz = pipeline.quiz().generate(&request, &CancellationToken::new()).await?;
    println!("{}", serde_json::to_string_pretty(&quiz)?);
    Ok(())
}
