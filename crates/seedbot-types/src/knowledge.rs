//! The knowledge bases Seedbot can answer from.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which corpus the retrieval tool searches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KnowledgeBase {
    /// The Seedworld whitepaper, pre-ingested into a hosted vector index.
    #[default]
    Whitepaper,
    /// The order-details sales dataset, indexed in memory at startup.
    Orders,
}

impl KnowledgeBase {
    pub fn as_str(&self) -> &'static str {
        match self {
            KnowledgeBase::Whitepaper => "whitepaper",
            KnowledgeBase::Orders => "orders",
        }
    }

    /// Name of the retrieval tool exposed to the model.
    pub fn tool_name(&self) -> &'static str {
        match self {
            KnowledgeBase::Whitepaper => "seedworld-whitepaper-search",
            KnowledgeBase::Orders => "order_details_search",
        }
    }

    /// Description of the retrieval tool exposed to the model.
    pub fn tool_description(&self) -> &'static str {
        match self {
            KnowledgeBase::Whitepaper => {
                "Search the Seedworld whitepaper. Use this tool for any question about \
                 Seedworld: its economy, gameplay, NFTs, nodes, tokens, land ownership, \
                 staking, roadmap and team. Input is a focused search query."
            }
            KnowledgeBase::Orders => {
                "Search and analyze the complete order details dataset. This tool provides \
                 access to all order information including dates, customer data, product \
                 categories, quantities, prices, and sales figures. Use it for summarizing \
                 overall sales, identifying trends, analyzing customer behavior, or querying \
                 specific order details."
            }
        }
    }
}

impl fmt::Display for KnowledgeBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for KnowledgeBase {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "whitepaper" => Ok(KnowledgeBase::Whitepaper),
            "orders" | "order_details" => Ok(KnowledgeBase::Orders),
            other => Err(format!(
                "unknown knowledge base '{other}' (expected 'whitepaper' or 'orders')"
            )),
        }
    }
}
