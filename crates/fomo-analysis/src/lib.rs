//! Retrieval-augmented news analysis for one company.
//!
//! Looks up the company's recent news ids, embeds a company query with
//! Gemini, retrieves the matching articles from the Pinecone index, and asks
//! the generation model for a structured facts/opinions digest. The
//! [`NewsPipeline`] exposes all of it through [`fomo_core::Analyzer`].

pub mod digest;
pub mod error;
pub mod pipeline;
pub mod sources;
pub mod types;

mod embeddings;
mod http;
mod llm;
mod retry;
mod vector_store;

pub use digest::{build_digest_prompt, build_repair_prompt, company_query, parse_digest};
pub use embeddings::EmbeddingClient;
pub use error::AnalysisError;
pub use llm::GenerativeClient;
pub use pipeline::{check_connections, NewsIds, NewsPipeline};
pub use sources::extract_sources;
pub use types::{AnalysisConfig, NewsMatch};
pub use vector_store::VectorIndexClient;
