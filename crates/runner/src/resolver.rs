//! Code source resolution.
//!
//! A code reference is either the script text itself or a pointer to
//! where the text lives (an HTTPS URL, possibly a notebook). The
//! [`CodeResolver`] trait is the seam for host-specific sources such as
//! stored named functions; this module ships the inline and URL
//! resolvers.

use async_trait::async_trait;
use gridpy_core::ScriptError;

/// Resolves a code reference to executable script text.
#[async_trait]
pub trait CodeResolver: Send + Sync {
    /// Resolve `reference` to script text, or fail with
    /// [`ScriptError::SourceResolution`].
    async fn resolve(&self, reference: &str) -> Result<String, ScriptError>;
}

/// Treats the reference as the script text itself.
pub struct InlineResolver;

#[async_trait]
impl CodeResolver for InlineResolver {
    async fn resolve(&self, reference: &str) -> Result<String, ScriptError> {
        Ok(reference.to_string())
    }
}

/// Fetches script text from an HTTPS URL.
///
/// Responses ending in `.ipynb` are parsed as notebooks and the first
/// code cell tagged `function` is extracted.
pub struct HttpResolver {
    client: reqwest::Client,
}

impl HttpResolver {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    async fn fetch(&self, url: &str) -> Result<String, ScriptError> {
        let response = self.client.get(url).send().await.map_err(|e| {
            ScriptError::SourceResolution(format!("Error fetching code from {url}: {e}"))
        })?;

        let status = response.status();
        if !status.is_success() {
            let message = match status.as_u16() {
                404 => format!("URL does not exist: {url} (status {status})"),
                401 => format!("URL requires authorization: {url} (status {status})"),
                _ => format!("Error fetching code from {url} (status {status})"),
            };
            return Err(ScriptError::SourceResolution(message));
        }

        let body = response.text().await.map_err(|e| {
            ScriptError::SourceResolution(format!("Error reading code from {url}: {e}"))
        })?;

        if url.ends_with(".ipynb") {
            extract_function_cell(&body)
        } else {
            Ok(body)
        }
    }
}

impl Default for HttpResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CodeResolver for HttpResolver {
    async fn resolve(&self, reference: &str) -> Result<String, ScriptError> {
        self.fetch(reference).await
    }
}

/// Extract the source of the first code cell tagged `function` from a
/// notebook document. Notebook cells store source as an array of lines.
pub fn extract_function_cell(notebook_json: &str) -> Result<String, ScriptError> {
    let notebook: serde_json::Value = serde_json::from_str(notebook_json)
        .map_err(|e| ScriptError::SourceResolution(format!("Malformed notebook: {e}")))?;

    let cells = notebook
        .get("cells")
        .and_then(|c| c.as_array())
        .ok_or_else(|| {
            ScriptError::SourceResolution("Notebook has no cells array".to_string())
        })?;

    for cell in cells {
        if cell.get("cell_type").and_then(|t| t.as_str()) != Some("code") {
            continue;
        }
        let tagged = cell
            .pointer("/metadata/tags")
            .and_then(|t| t.as_array())
            .map(|tags| tags.iter().any(|t| t.as_str() == Some("function")))
            .unwrap_or(false);
        if !tagged {
            continue;
        }
        let source = match cell.get("source") {
            Some(serde_json::Value::Array(lines)) => lines
                .iter()
                .filter_map(|l| l.as_str())
                .collect::<Vec<_>>()
                .join(""),
            Some(serde_json::Value::String(text)) => text.clone(),
            _ => String::new(),
        };
        return Ok(source);
    }

    Err(ScriptError::SourceResolution(
        "No code cell containing \"function\" tag found.".to_string(),
    ))
}

/// Dispatches `https://` references to [`HttpResolver`] and treats
/// everything else as inline script text.
pub struct DefaultResolver {
    http: HttpResolver,
}

impl DefaultResolver {
    pub fn new() -> Self {
        Self {
            http: HttpResolver::new(),
        }
    }
}

impl Default for DefaultResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CodeResolver for DefaultResolver {
    async fn resolve(&self, reference: &str) -> Result<String, ScriptError> {
        if reference.starts_with("https://") {
            self.http.resolve(reference).await
        } else {
            Ok(reference.to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
