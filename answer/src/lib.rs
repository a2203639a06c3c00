pub mod engine;
pub mod entity;
pub mod graph;
pub mod retrieval;
pub mod scorer;
pub mod template;

pub use engine::{
    AnswerEngine, AnswerReply, AnswerSource, Resolution, ResolutionStrategy, RetrievalStrategy,
    TemplateStrategy,
};
pub use entity::EntityResolver;
pub use graph::GraphResolver;
pub use retrieval::RetrievalResolver;
pub use template::{Template, TemplateMatch, TemplateMatcher};
