// Oracle backed by an OpenAI-compatible chat completion endpoint.

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use serde_json::json;
use serde_json::Value as JSValue;

use crate::sim::*;

#[derive(Debug, Clone, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Clone, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<JSValue>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct VoteAnswer {
    vote: i64,
}

/// The schema that constrains the answer to `{"vote": 1}` or `{"vote": 2}`.
fn vote_schema() -> JSValue {
    json!({
        "type": "json_schema",
        "json_schema": {
            "name": "ballot",
            "strict": true,
            "schema": {
                "type": "object",
                "properties": {
                    "vote": {"type": "integer", "enum": [1, 2]}
                },
                "required": ["vote"],
                "additionalProperties": false
            }
        }
    })
}

fn first_content(response: ChatResponse) -> Result<String, OracleError> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .ok_or_else(|| OracleError::MalformedResponse("no content in the response".to_string()))
}

fn parse_vote(content: &str) -> Result<i64, OracleError> {
    serde_json::from_str::<VoteAnswer>(content)
        .map(|a| a.vote)
        .map_err(|e| OracleError::MalformedResponse(format!("{}: {:?}", e, content)))
}

fn call_error(e: reqwest::Error) -> OracleError {
    if e.is_timeout() {
        OracleError::Timeout
    } else {
        OracleError::CallFailed(e.to_string())
    }
}

/// Sends one prompt per call. There is no retry: failed calls are absorbed by
/// the ensemble vote.
pub struct ChatOracle {
    api_key: String,
    http: Client,
    base_url: String,
    model: String,
    structured: bool,
}

impl ChatOracle {
    /// Reads the API key from the environment. A missing key is an error.
    pub fn from_settings(settings: &OracleSettings) -> SimResult<ChatOracle> {
        let api_key = match std::env::var(&settings.api_key_env) {
            Ok(k) if !k.trim().is_empty() => k,
            _ => {
                return MissingCredentialSnafu {
                    var: settings.api_key_env.clone(),
                }
                .fail()
            }
        };
        ChatOracle::new(&api_key, settings)
    }

    pub fn new(api_key: &str, settings: &OracleSettings) -> SimResult<ChatOracle> {
        let http = Client::builder()
            .timeout(settings.timeout)
            .build()
            .context(HttpClientSnafu {})?;
        info!(
            "Oracle: model {} at {} (structured output: {})",
            settings.model, settings.base_url, settings.structured_output
        );
        Ok(ChatOracle {
            api_key: api_key.to_string(),
            http,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            model: settings.model.clone(),
            structured: settings.structured_output,
        })
    }

    fn headers(&self) -> Result<HeaderMap, OracleError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", self.api_key))
                .map_err(|e| OracleError::Unavailable(e.to_string()))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(headers)
    }

    fn request(&self, prompt: &str, structured: bool) -> ChatRequest {
        ChatRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            response_format: if structured { Some(vote_schema()) } else { None },
        }
    }

    fn chat(&self, request: &ChatRequest) -> Result<String, OracleError> {
        let url = format!("{}/chat/completions", self.base_url);
        debug!("ChatOracle::chat: model {}", request.model);

        let response = self
            .http
            .post(&url)
            .headers(self.headers()?)
            .json(request)
            .send()
            .map_err(call_error)?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().unwrap_or_default();
            return Err(OracleError::CallFailed(format!(
                "API error ({}): {}",
                status, error_text
            )));
        }

        let chat_response: ChatResponse = response
            .json()
            .map_err(|e| OracleError::MalformedResponse(e.to_string()))?;
        first_content(chat_response)
    }
}

impl OracleCapability for ChatOracle {
    fn supports_structured_output(&self) -> bool {
        self.structured
    }

    fn structured_vote(&self, prompt: &str) -> Result<i64, OracleError> {
        let content = self.chat(&self.request(prompt, true))?;
        parse_vote(&content)
    }

    fn free_text(&self, prompt: &str) -> Result<String, OracleError> {
        self.chat(&self.request(prompt, false))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn settings(var: &str) -> OracleSettings {
        OracleSettings {
            model: DEFAULT_MODEL.to_string(),
            api_key_env: var.to_string(),
            base_url: "http://localhost:1/v1/".to_string(),
            timeout: Duration::from_secs(1),
            structured_output: true,
        }
    }

    #[test]
    fn missing_credential() {
        let res = ChatOracle::from_settings(&settings("VOTESIM_TEST_UNSET_API_KEY"));
        assert!(matches!(res, Err(SimError::MissingCredential { .. })));
    }

    #[test]
    fn request_body() {
        let oracle = ChatOracle::new("k", &settings("UNUSED")).unwrap();
        assert_eq!(oracle.base_url, "http://localhost:1/v1");
        let js = serde_json::to_value(oracle.request("Who?", true)).unwrap();
        assert_eq!(js["model"], json!("gpt-3.5-turbo"));
        assert_eq!(js["messages"][0]["content"], json!("Who?"));
        assert_eq!(
            js["response_format"]["json_schema"]["schema"]["properties"]["vote"]["enum"],
            json!([1, 2])
        );
        let js = serde_json::to_value(oracle.request("Who?", false)).unwrap();
        assert!(js.get("response_format").is_none());
    }

    #[test]
    fn responses() {
        let r: ChatResponse = serde_json::from_value(json!({
            "choices": [{"message": {"role": "assistant", "content": "{\"vote\": 2}"}}]
        }))
        .unwrap();
        let content = first_content(r).unwrap();
        assert_eq!(parse_vote(&content), Ok(2));
        assert!(matches!(
            parse_vote("2"),
            Err(OracleError::MalformedResponse(_))
        ));
        let empty: ChatResponse = serde_json::from_value(json!({"choices": []})).unwrap();
        assert!(first_content(empty).is_err());
    }
}
