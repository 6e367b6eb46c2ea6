use axum::{
    Router,
    extract::Json,
    http::StatusCode,
    routing::{get, post},
};
use std::sync::LazyLock;
use std::time::Duration;
use story_utils::{
    AnalyzeSentenceRequest, ContinueStoryRequest, ContinueStoryResponse, GenerateStoryRequest,
    GenerateStoryResponse, GrammarItem, MAX_LEVEL, MIN_LEVEL, SentenceAnalysis, VocabularyItem,
};
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tysm::chat_completions::ChatClient;

static CLIENT: LazyLock<ChatClient> = LazyLock::new(|| ChatClient::from_env("gpt-4o").unwrap());

// The model is an external collaborator; a call that hangs should become a
// Failed analysis on the client, not a stuck request.
const LLM_TIMEOUT: Duration = Duration::from_secs(30);

async fn analyze_sentence(
    Json(request): Json<AnalyzeSentenceRequest>,
) -> Result<Json<SentenceAnalysis>, StatusCode> {
    let AnalyzeSentenceRequest { sentence, language } = request;

    if sentence.trim().is_empty() || language.trim().is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }

    let pinyin_instruction = if language.eq_ignore_ascii_case("chinese") {
        "Include the pinyin romanization in the pinyin field of every vocabulary item."
    } else {
        "Omit the pinyin field."
    };

    let system_prompt = format!(
        r#"You are a {language} language expert preparing material for Korean-speaking learners. Analyze the {language} sentence the user sends. Respond with JSON.

Begin with a brief "thoughts" field where you work through the sentence before committing to the analysis.

1. **Translation**: Translate the sentence in two steps. First, translate the original {language} sentence into natural, idiomatic English (not a literal translation). Then, translate that English sentence into Korean. The final output format must be "한국어 번역 (English Translation)".
2. **Grammar**: Identify key grammatical structures or rules used in the sentence (e.g., subjunctive mood, interrogative sentence, conditional tense). Do not just list parts of speech. For each rule, provide its name ("topic") and a brief explanation ("explanation"), both in Korean; you may quote the {language} text in parentheses.
3. **Vocabulary**: Identify **all nouns, verbs, adjectives, adverbs, and prepositions** from the sentence, excluding proper nouns. For each word:
    * **term**: the original {language} word as it appears in the sentence.
    * **lemma**: the dictionary form of the word. For verbs, the infinitive (e.g., for "hablo", the lemma is "hablar"). For nouns, the singular form (e.g., for "soldados", the lemma is "soldado").
    * **partOfSpeech**: the part of speech, in lowercase English (e.g., "noun", "verb").
    * **gender**: Masculine or Feminine when {language} assigns the word a grammatical gender, NotApplicable otherwise.
    * **definition**: the definition in both Korean and English, formatted as "한국어 뜻 (English meaning)". Keep it general rather than specific to this sentence (e.g., for "joven", use "젊은 (young)", not "젊은 남자 (young man)").

{pinyin_instruction}"#,
    );

    #[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
    struct SentenceAnalysisThoughts {
        #[allow(dead_code)]
        thoughts: String,
        translation: String,
        vocabulary: Vec<VocabularyItem>,
        grammar: Vec<GrammarItem>,
    }

    let user_prompt = format!("Sentence: {sentence}");

    let response: SentenceAnalysisThoughts =
        tokio::time::timeout(LLM_TIMEOUT, CLIENT.chat_with_system_prompt(system_prompt, &user_prompt))
            .await
            .map_err(|_| {
                eprintln!("Sentence analysis timed out after {LLM_TIMEOUT:?}");
                StatusCode::GATEWAY_TIMEOUT
            })?
            .inspect_err(|e| eprintln!("Error: {e:?}"))
            .map_err(|_e| StatusCode::INTERNAL_SERVER_ERROR)?;

    if response.translation.trim().is_empty() {
        eprintln!("Model returned an empty translation for: {sentence}");
        return Err(StatusCode::BAD_GATEWAY);
    }

    Ok(Json(SentenceAnalysis {
        translation: response.translation,
        vocabulary: response.vocabulary,
        grammar: response.grammar,
    }))
}

async fn generate_story(
    Json(request): Json<GenerateStoryRequest>,
) -> Result<Json<GenerateStoryResponse>, StatusCode> {
    let GenerateStoryRequest {
        topic,
        language,
        level,
    } = request;

    if topic.trim().is_empty() || language.trim().is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }
    if !(MIN_LEVEL..=MAX_LEVEL).contains(&level) {
        return Err(StatusCode::BAD_REQUEST);
    }

    let system_prompt = format!(
        r#"You are a creative writer who specializes in writing short stories in {language} for language learners.

Your task is to write a complete short story based on the given topic, language, and difficulty level. Respond with JSON.

Language: {language}
Vocabulary Level: {level} (1=beginner, 10=advanced)

1. **Title**: Generate a creative, short, and fitting title for the story in {language}.
2. **Story**: Write a complete story consisting of approximately 15-20 paragraphs. Each paragraph must be between 4 and 6 sentences long.
    - **Targeted Level**: The vocabulary and grammatical structures must be appropriate for the specified level.
    - **Consistent Point of View**: The story must be written in a consistent third-person point of view. Do not switch to first-person.
    - **Dialogue**: Enclose all character dialogue in double quotation marks.
    - The story must be engaging and have a clear beginning, middle, and end.
    - Return the paragraphs as an array of strings."#,
    );

    let user_prompt = format!("The overall topic of the story is: {topic}");

    let story: GenerateStoryResponse =
        tokio::time::timeout(LLM_TIMEOUT, CLIENT.chat_with_system_prompt(system_prompt, &user_prompt))
            .await
            .map_err(|_| {
                eprintln!("Story generation timed out after {LLM_TIMEOUT:?}");
                StatusCode::GATEWAY_TIMEOUT
            })?
            .inspect_err(|e| eprintln!("Error: {e:?}"))
            .map_err(|_e| StatusCode::INTERNAL_SERVER_ERROR)?;

    if story.title.trim().is_empty() || story.paragraphs.iter().all(|p| p.trim().is_empty()) {
        eprintln!("Model returned an empty story for topic: {topic}");
        return Err(StatusCode::BAD_GATEWAY);
    }

    Ok(Json(story))
}

async fn continue_story(
    Json(request): Json<ContinueStoryRequest>,
) -> Result<Json<ContinueStoryResponse>, StatusCode> {
    let ContinueStoryRequest {
        topic,
        language,
        level,
        lessons,
    } = request;

    if lessons.is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }
    if !(MIN_LEVEL..=MAX_LEVEL).contains(&level) {
        return Err(StatusCode::BAD_REQUEST);
    }

    let system_prompt = format!(
        r#"You are a creative writer continuing a short story in {language} for language learners.

The learner has read the story so far and wants the next installment. Respond with JSON containing a single "paragraph" field.

Vocabulary Level: {level} (1=beginner, 10=advanced)

Write exactly one new paragraph of 4-6 sentences that continues the story naturally. Keep the same third-person point of view, the same characters, and vocabulary appropriate for the level. Do not repeat or summarize earlier paragraphs."#,
    );

    // The tail of the story is enough context to continue from
    let recent = lessons
        .iter()
        .rev()
        .take(5)
        .rev()
        .cloned()
        .collect::<Vec<_>>()
        .join("\n\n");
    let user_prompt = format!("The overall topic of the story is: {topic}\n\nThe story so far:\n\n{recent}");

    let continuation: ContinueStoryResponse =
        tokio::time::timeout(LLM_TIMEOUT, CLIENT.chat_with_system_prompt(system_prompt, &user_prompt))
            .await
            .map_err(|_| {
                eprintln!("Story continuation timed out after {LLM_TIMEOUT:?}");
                StatusCode::GATEWAY_TIMEOUT
            })?
            .inspect_err(|e| eprintln!("Error: {e:?}"))
            .map_err(|_e| StatusCode::INTERNAL_SERVER_ERROR)?;

    if continuation.paragraph.trim().is_empty() {
        eprintln!("Model returned an empty continuation for topic: {topic}");
        return Err(StatusCode::BAD_GATEWAY);
    }

    Ok(Json(continuation))
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
        .expose_headers(Any);

    let app = Router::new()
        .route("/", get(|| async { "Hello from fly.io!" }))
        .route("/analyze-sentence", post(analyze_sentence))
        .route("/generate-story", post(generate_story))
        .route("/continue-story", post(continue_story))
        .layer(CompressionLayer::new())
        .layer(cors);

    let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await.unwrap();
    println!("Listening on port 8080");
    axum::serve(listener, app).await.unwrap();
}
