use serde::Serialize;

use crate::config::Config;
use crate::error::Result;
use crate::models::{ChunkItem, DocumentIR, SemanticChunk, SkippedElement, SourceFormat};
use crate::processing::api_chunker::ApiRuleBasedChunker;
use crate::processing::api_detector::ApiStructureDetector;
use crate::processing::extractors::ExtractorRegistry;
use crate::processing::gate::{self, GateDecision};
use crate::processing::noise::NoiseFilter;
use crate::processing::recognizer::StructureRecognizer;
use crate::processing::splitter::TokenSplitter;
use crate::processing::structural_chunker::StructuralChunker;
use crate::processing::tokenizer::TokenCounter;
use crate::processing::validator::SemanticChunkValidator;

/// External semantic chunking backend, consulted only when the gate
/// recommends it. Output always passes through the validator; a failed
/// validation falls back to rule-based chunking.
pub trait SemanticChunkingService: Send + Sync {
    fn chunk(&self, ir: &DocumentIR) -> Result<Vec<SemanticChunk>>;
}

/// Counters describing what one pipeline run did.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineStats {
    pub source_format: SourceFormat,
    pub block_count: usize,
    pub gate_use_llm: bool,
    pub gate_reason: String,
    pub used_semantic_service: bool,
    pub semantic_fallback: bool,
    pub validation_warnings: usize,
    pub merged_items: usize,
    pub split_items: usize,
    pub truncated_items: usize,
    pub fallback_chunks: usize,
}

/// Final output: ordered chunk items plus the extraction skip report and
/// run statistics.
#[derive(Debug)]
pub struct PipelineOutput {
    pub chunks: Vec<ChunkItem>,
    pub skipped: Vec<SkippedElement>,
    pub stats: PipelineStats,
}

/// Runs the full chunking pipeline: extract, recognize structure, filter
/// noise, detect API sections, gate, chunk, validate, enforce token
/// budgets.
pub struct ChunkingPipeline {
    config: Config,
    registry: ExtractorRegistry,
    counter: TokenCounter,
    semantic_service: Option<Box<dyn SemanticChunkingService>>,
}

impl ChunkingPipeline {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            registry: ExtractorRegistry::new(),
            counter: TokenCounter::new(),
            semantic_service: None,
        }
    }

    pub fn with_semantic_service(mut self, service: Box<dyn SemanticChunkingService>) -> Self {
        self.semantic_service = Some(service);
        self
    }

    pub fn process(&self, text: &str, filename: &str) -> Result<PipelineOutput> {
        let format = SourceFormat::from_filename(filename);
        tracing::info!(filename, format = ?format, bytes = text.len(), "pipeline start");

        let extracted = self.registry.extractor_for(format).extract(text, filename);
        let ir = StructureRecognizer::recognize(&extracted, format);
        let ir = NoiseFilter::new(self.config.noise.clone()).filter(ir);

        let detection = ApiStructureDetector::new(self.config.api_keywords.clone()).detect(&ir);
        let decision = gate::evaluate(&ir, &detection, &self.config.gate);
        tracing::info!(
            use_llm = decision.use_llm,
            reason = %decision.reason,
            api_document = detection.is_api_document(),
            blocks = ir.blocks.len(),
            "gate decided"
        );

        let mut used_semantic_service = false;
        let mut semantic_fallback = false;
        let semantic_chunks = if decision.use_llm {
            match self.semantic_chunks(&ir) {
                Some(chunks) => {
                    used_semantic_service = true;
                    chunks
                }
                None => {
                    semantic_fallback = self.semantic_service.is_some();
                    self.rule_based_chunks(&ir, &detection)
                }
            }
        } else {
            self.rule_based_chunks(&ir, &detection)
        };

        let report = SemanticChunkValidator::new().validate(semantic_chunks, &ir);
        let report = if report.is_valid {
            report
        } else {
            // Service output carried hard errors (exclusivity conflicts,
            // unrecoverable blocks, strict title mismatches); discard it.
            tracing::warn!(
                errors = report.errors.len(),
                "semantic chunks rejected, re-chunking rule-based"
            );
            used_semantic_service = false;
            semantic_fallback = true;
            SemanticChunkValidator::new().validate(self.rule_based_chunks(&ir, &detection), &ir)
        };

        let fallback_chunks = report
            .chunks
            .iter()
            .filter(|c| c.notes.iter().any(|n| n.contains("fallback")))
            .count();
        let validation_warnings = report.warnings.len();

        let splitter = TokenSplitter::new(self.config.chunking.clone(), self.counter.clone());
        let items = splitter.split(report.chunks, &ir);

        let stats = PipelineStats {
            source_format: format,
            block_count: ir.blocks.len(),
            gate_use_llm: decision.use_llm,
            gate_reason: decision.reason,
            used_semantic_service,
            semantic_fallback,
            validation_warnings,
            merged_items: items.iter().filter(|i| i.merged).count(),
            split_items: items.iter().filter(|i| i.split).count(),
            truncated_items: items.iter().filter(|i| i.truncated).count(),
            fallback_chunks,
        };
        tracing::info!(
            chunks = items.len(),
            skipped = ir.skipped.len(),
            "pipeline complete"
        );

        Ok(PipelineOutput {
            chunks: items,
            skipped: ir.skipped,
            stats,
        })
    }

    /// Gate decision only; useful for callers that batch LLM work.
    pub fn gate_decision(&self, text: &str, filename: &str) -> GateDecision {
        let format = SourceFormat::from_filename(filename);
        let extracted = self.registry.extractor_for(format).extract(text, filename);
        let ir = StructureRecognizer::recognize(&extracted, format);
        let ir = NoiseFilter::new(self.config.noise.clone()).filter(ir);
        let detection = ApiStructureDetector::new(self.config.api_keywords.clone()).detect(&ir);
        gate::evaluate(&ir, &detection, &self.config.gate)
    }

    fn semantic_chunks(&self, ir: &DocumentIR) -> Option<Vec<SemanticChunk>> {
        let service = self.semantic_service.as_ref()?;
        match service.chunk(ir) {
            Ok(chunks) if !chunks.is_empty() => Some(chunks),
            Ok(_) => {
                tracing::warn!("semantic service returned no chunks, falling back");
                None
            }
            Err(e) => {
                tracing::warn!(error = %e, "semantic service failed, falling back");
                None
            }
        }
    }

    fn rule_based_chunks(
        &self,
        ir: &DocumentIR,
        detection: &crate::processing::api_detector::ApiDetection,
    ) -> Vec<SemanticChunk> {
        if detection.is_api_document() {
            ApiRuleBasedChunker::new().chunk(ir, detection)
        } else {
            StructuralChunker::new().chunk(ir)
        }
    }
}
