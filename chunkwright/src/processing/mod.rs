mod api_chunker;
mod gate;
mod noise;
mod splitter;
mod structural_chunker;
mod tokenizer;
mod validator;

pub mod api_detector;
pub mod extractors;
pub mod patterns;
pub mod pipeline;
pub mod recognizer;

pub use api_chunker::ApiRuleBasedChunker;
pub use api_detector::{ApiDetection, ApiSection, ApiStructureDetector, Endpoint};
pub use gate::{evaluate as evaluate_gate, GateDecision};
pub use noise::NoiseFilter;
pub use pipeline::{ChunkingPipeline, PipelineOutput, PipelineStats, SemanticChunkingService};
pub use recognizer::StructureRecognizer;
pub use splitter::TokenSplitter;
pub use structural_chunker::StructuralChunker;
pub use tokenizer::TokenCounter;
pub use validator::{SemanticChunkValidator, ValidationReport};
