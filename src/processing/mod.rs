//! Resume analysis: segmentation, keyword matching, ATS rules, scoring and feedback

pub mod analyzer;
pub mod ats_rules;
pub mod capabilities;
pub mod embedding_manager;
pub mod embeddings;
pub mod entity_extractor;
pub mod feedback;
pub mod heading_classifier;
pub mod keyword_matcher;
pub mod resume;
pub mod scoring;
pub mod skill_lexicon;
pub mod text_processor;
