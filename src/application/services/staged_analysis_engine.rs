use std::fmt::Write as _;
use std::sync::Arc;

use async_trait::async_trait;

use crate::application::ports::{
    AnalysisEngine, AnalysisEngineError, AnalysisRequest, DocumentReader, LlmClient, SearchHit,
    StagingStore, WebSearch,
};
use crate::domain::AnalysisStage;

/// Runs the configured stages in order. Every stage sees the query, the
/// document text and the previous stage's output; the last stage's output is
/// the analysis result.
pub struct StagedAnalysisEngine {
    stages: Vec<AnalysisStage>,
    llm_client: Arc<dyn LlmClient>,
    document_reader: Arc<dyn DocumentReader>,
    staging_store: Arc<dyn StagingStore>,
    web_search: Option<Arc<dyn WebSearch>>,
    max_document_chars: usize,
}

impl StagedAnalysisEngine {
    pub fn new(
        stages: Vec<AnalysisStage>,
        llm_client: Arc<dyn LlmClient>,
        document_reader: Arc<dyn DocumentReader>,
        staging_store: Arc<dyn StagingStore>,
        max_document_chars: usize,
    ) -> Self {
        Self {
            stages,
            llm_client,
            document_reader,
            staging_store,
            web_search: None,
            max_document_chars,
        }
    }

    pub fn with_web_search(mut self, web_search: Arc<dyn WebSearch>) -> Self {
        self.web_search = Some(web_search);
        self
    }

    pub fn stages(&self) -> &[AnalysisStage] {
        &self.stages
    }

    async fn search_context(&self, stage: &AnalysisStage, query: &str) -> Option<String> {
        if !stage.web_search {
            return None;
        }
        let web_search = self.web_search.as_ref()?;
        match web_search.search(query).await {
            Ok(hits) if hits.is_empty() => None,
            Ok(hits) => Some(format_hits(&hits)),
            Err(e) => {
                tracing::warn!(stage = %stage.name, error = %e, "Web search failed, continuing without it");
                None
            }
        }
    }
}

#[async_trait]
impl AnalysisEngine for StagedAnalysisEngine {
    #[tracing::instrument(skip(self, request), fields(path = %request.document_path))]
    async fn analyze(&self, request: &AnalysisRequest) -> Result<String, AnalysisEngineError> {
        if self.stages.is_empty() {
            return Err(AnalysisEngineError::EmptyPipeline);
        }

        let data = self.staging_store.fetch(&request.document_path).await?;
        let text = self.document_reader.extract_text(&data).await?;
        let document = truncate_chars(&text, self.max_document_chars);

        let query = request.query.as_str();
        let file_path = request.document_path.as_str();
        let mut previous: Option<String> = None;

        for stage in &self.stages {
            let search = self.search_context(stage, query).await;
            let system = system_prompt(stage, query);
            let prompt = stage_prompt(
                stage,
                query,
                file_path,
                &document,
                previous.as_deref(),
                search.as_deref(),
            );

            let output = self
                .llm_client
                .complete(&system, &prompt)
                .await
                .map_err(|source| AnalysisEngineError::Stage {
                    stage: stage.name.clone(),
                    source,
                })?;

            tracing::debug!(stage = %stage.name, output_chars = output.len(), "Stage completed");
            previous = Some(output);
        }

        previous.ok_or(AnalysisEngineError::EmptyPipeline)
    }
}

fn system_prompt(stage: &AnalysisStage, query: &str) -> String {
    format!(
        "You are a {}.\n{}\n\nYour goal: {}",
        stage.role,
        stage.backstory,
        stage.render_goal(query)
    )
}

fn stage_prompt(
    stage: &AnalysisStage,
    query: &str,
    file_path: &str,
    document: &str,
    previous: Option<&str>,
    search: Option<&str>,
) -> String {
    let mut prompt = String::new();
    let _ = writeln!(prompt, "{}\n", stage.render_instructions(query, file_path));
    let _ = writeln!(prompt, "Expected output: {}\n", stage.expected_output);
    let _ = writeln!(prompt, "User query: {}\n", query);

    if let Some(previous) = previous {
        let _ = writeln!(prompt, "Findings from the previous step:\n{}\n", previous);
    }
    if let Some(search) = search {
        let _ = writeln!(prompt, "Recent web search results:\n{}\n", search);
    }

    let _ = write!(prompt, "Document ({}):\n{}", file_path, document);
    prompt
}

fn format_hits(hits: &[SearchHit]) -> String {
    hits.iter()
        .map(|h| format!("- {} ({}): {}", h.title, h.link, h.snippet))
        .collect::<Vec<_>>()
        .join("\n")
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    let total = text.chars().count();
    if total <= max_chars {
        return text.to_string();
    }
    let head: String = text.chars().take(max_chars).collect();
    format!(
        "{}\n[document truncated: first {} of {} characters]",
        head, max_chars, total
    )
}

