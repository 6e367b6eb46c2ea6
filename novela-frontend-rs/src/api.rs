use story_utils::{
    AnalyzeSentenceRequest, ContinueStoryRequest, ContinueStoryResponse, GenerateStoryRequest,
    GenerateStoryResponse, SentenceAnalysis,
};

/// Errors talking to the AI backend. The display strings are shown to the
/// learner as-is, so they stay short and in the product language.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ApiError {
    #[error("서버에 연결할 수 없습니다. 잠시 후 다시 시도해주세요.")]
    Request(String),
    #[error("서버 오류가 발생했습니다 (HTTP {0}). 다시 시도해주세요.")]
    Status(String),
    #[error("서버 응답을 읽을 수 없습니다. 다시 시도해주세요.")]
    Parse(String),
}

async fn hit_ai_server(
    path: &str,
    request: impl serde::Serialize,
) -> Result<fetch_happen::Response, fetch_happen::Error> {
    let client = fetch_happen::Client;
    let url = if cfg!(feature = "local-backend") {
        "http://localhost:8080"
    } else {
        "https://novela-ai-backend.fly.dev"
    };
    let response = client
        .post(format!("{url}{path}"))
        .json(&request)?
        .send()
        .await?;
    Ok(response)
}

async fn post_json<Response: serde::de::DeserializeOwned>(
    path: &str,
    request: impl serde::Serialize,
) -> Result<Response, ApiError> {
    let response = hit_ai_server(path, request).await.map_err(|e| {
        log::error!("Request to {path} failed: {e:?}");
        ApiError::Request(format!("{e:?}"))
    })?;

    if !response.ok() {
        log::error!("Request to {path} returned HTTP {}", response.status());
        return Err(ApiError::Status(response.status().to_string()));
    }

    response.json().await.map_err(|e| {
        log::error!("Could not parse response from {path}: {e:?}");
        ApiError::Parse(format!("{e:?}"))
    })
}

/// One remote call per distinct sentence; stateless and safe to run
/// concurrently for different sentences. No retries here — the analysis
/// cache decides what happens after a failure.
pub(crate) async fn analyze_sentence(
    sentence: String,
    language: String,
) -> Result<SentenceAnalysis, ApiError> {
    post_json(
        "/analyze-sentence",
        AnalyzeSentenceRequest { sentence, language },
    )
    .await
}

pub(crate) async fn generate_story(
    request: GenerateStoryRequest,
) -> Result<GenerateStoryResponse, ApiError> {
    post_json("/generate-story", request).await
}

pub(crate) async fn continue_story(
    request: ContinueStoryRequest,
) -> Result<ContinueStoryResponse, ApiError> {
    post_json("/continue-story", request).await
}
