//! Retrieval tool: exposes a knowledge-base retriever to the model.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use seedbot_types::{
    KnowledgeBase, Retriever, Tool, ToolContext, ToolDefinition, ToolError, ToolOutput,
};
use serde::Deserialize;

const NO_RESULTS: &str = "No relevant passages were found in the knowledge base.";

/// Searches a [`Retriever`] and returns the passages joined by blank lines.
pub struct RetrieverTool {
    name: String,
    description: String,
    retriever: Arc<dyn Retriever>,
}

#[derive(Deserialize)]
struct SearchInput {
    query: String,
}

impl RetrieverTool {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        retriever: Arc<dyn Retriever>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            retriever,
        }
    }

    /// The tool named and described for `kb`.
    pub fn for_knowledge_base(kb: KnowledgeBase, retriever: Arc<dyn Retriever>) -> Self {
        Self::new(kb.tool_name(), kb.tool_description(), retriever)
    }
}

impl Tool for RetrieverTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name.clone(),
            description: self.description.clone(),
            input_schema: serde_json::json!({
                "type": "object",
                "required": ["query"],
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "What to look up in the knowledge base"
                    }
                }
            }),
        }
    }

    fn execute(
        &self,
        input: serde_json::Value,
        ctx: ToolContext,
    ) -> Pin<Box<dyn Future<Output = Result<ToolOutput, ToolError>> + Send + '_>> {
        Box::pin(async move {
            let input: SearchInput =
                serde_json::from_value(input).map_err(|e| ToolError::InvalidInput {
                    tool: self.name.clone(),
                    message: e.to_string(),
                })?;

            let passages = self.retriever.search(&input.query).await?;
            tracing::debug!(
                session = %ctx.session_id,
                backend = self.retriever.name(),
                query = %input.query,
                hits = passages.len(),
                "retrieval"
            );

            if passages.is_empty() {
                return Ok(ToolOutput::text(NO_RESULTS));
            }
            let joined = passages
                .into_iter()
                .map(|p| p.text)
                .collect::<Vec<_>>()
                .join("\n\n");
            Ok(ToolOutput::text(joined))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use seedbot_types::{Passage, RetrievalError};

    struct FixedRetriever(Vec<Passage>);

    impl Retriever for FixedRetriever {
        fn search<'a>(
            &'a self,
            _query: &'a str,
        ) -> Pin<Box<dyn Future<Output = Result<Vec<Passage>, RetrievalError>> + Send + 'a>>
        {
            Box::pin(async move { Ok(self.0.clone()) })
        }

        fn name(&self) -> &str {
            "fixed"
        }
    }

    struct DownRetriever;

    impl Retriever for DownRetriever {
        fn search<'a>(
            &'a self,
            _query: &'a str,
        ) -> Pin<Box<dyn Future<Output = Result<Vec<Passage>, RetrievalError>> + Send + 'a>>
        {
            Box::pin(async { Err(RetrievalError::Unreachable("connection refused".into())) })
        }

        fn name(&self) -> &str {
            "down"
        }
    }

    fn ctx() -> ToolContext {
        ToolContext {
            session_id: "s1".into(),
        }
    }

    fn whitepaper_tool(retriever: impl Retriever + 'static) -> RetrieverTool {
        RetrieverTool::for_knowledge_base(KnowledgeBase::Whitepaper, Arc::new(retriever))
    }

    #[test]
    fn definition_requires_query() {
        let tool = whitepaper_tool(FixedRetriever(vec![]));
        let def = tool.definition();
        assert_eq!(def.name, "seedworld-whitepaper-search");
        assert_eq!(def.input_schema["required"][0], "query");
        assert_eq!(def.input_schema["properties"]["query"]["type"], "string");
    }

    #[tokio::test]
    async fn joins_passages_with_blank_line() {
        let tool = whitepaper_tool(FixedRetriever(vec![
            Passage::new("Seedworld is a UGC metaverse.", 0.9),
            Passage::new("Land is owned by players.", 0.8),
        ]));
        let output = tool
            .execute(serde_json::json!({"query": "what is seedworld"}), ctx())
            .await
            .unwrap();
        assert_eq!(
            output.text,
            "Seedworld is a UGC metaverse.\n\nLand is owned by players."
        );
    }

    #[tokio::test]
    async fn empty_result_says_so() {
        let tool = whitepaper_tool(FixedRetriever(vec![]));
        let output = tool
            .execute(serde_json::json!({"query": "weather"}), ctx())
            .await
            .unwrap();
        assert_eq!(output.text, NO_RESULTS);
        assert!(!output.is_error);
    }

    #[tokio::test]
    async fn missing_query_is_invalid_input() {
        let tool = whitepaper_tool(FixedRetriever(vec![]));
        match tool.execute(serde_json::json!({"q": "x"}), ctx()).await {
            Err(ToolError::InvalidInput { tool, .. }) => {
                assert_eq!(tool, "seedworld-whitepaper-search")
            }
            other => panic!("expected InvalidInput, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn retrieval_failure_propagates() {
        let tool = RetrieverTool::for_knowledge_base(KnowledgeBase::Orders, Arc::new(DownRetriever));
        let result = tool
            .execute(serde_json::json!({"query": "total sales"}), ctx())
            .await;
        assert!(matches!(
            result,
            Err(ToolError::Retrieval(RetrievalError::Unreachable(_)))
        ));
    }
}
