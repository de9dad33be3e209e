//! Template rendering contract and the degraded fallback path.
//!
//! Route handlers return a key-value model; the registrar pairs it with the
//! route's template name into a [`ViewModel`] and renders it through a
//! [`TemplateEngine`]. Engines are built per route (and per error render)
//! from a zero-argument [`EngineFactory`] so that per-render state in one
//! engine instance cannot leak across routes. When the factory fails, the
//! [`FallbackRenderer`] serializes the raw model as JSON instead - rendering
//! never hard-fails just because templating did.

use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, warn};

/// The generic key-value mapping a route handler returns.
pub type Model = serde_json::Map<String, Value>;

/// A model paired with the template it should be rendered with.
#[derive(Debug, Clone)]
pub struct ViewModel {
    pub model: Model,
    pub template: String,
}

impl ViewModel {
    pub fn new(model: Model, template: impl Into<String>) -> Self {
        Self {
            model,
            template: template.into(),
        }
    }
}

/// Failures in engine construction or template evaluation.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("template engine construction failed: {0}")]
    Construct(String),
    #[error("template rendering failed")]
    Template(#[from] minijinja::Error),
    #[error("model serialization failed")]
    Serialize(#[from] serde_json::Error),
}

/// The template engine capability this core consumes.
///
/// Implementations must be usable from whatever worker thread the serving
/// layer dispatches on; each instance is bound to exactly one route.
pub trait TemplateEngine: Send + Sync {
    fn render(&self, view: &ViewModel) -> Result<String, RenderError>;
}

/// Zero-argument fallible constructor for the configured template engine.
pub type EngineFactory = Arc<dyn Fn() -> Result<Box<dyn TemplateEngine>, RenderError> + Send + Sync>;

/// Construct a fresh engine from the factory, degrading to the fallback
/// renderer (with a logged degradation) when construction fails.
#[must_use]
pub fn engine_or_fallback(factory: &EngineFactory) -> Box<dyn TemplateEngine> {
    match factory() {
        Ok(engine) => engine,
        Err(err) => {
            error!(error = %err, "could not construct template engine, degrading to fallback renderer");
            Box::new(FallbackRenderer)
        }
    }
}

/// Degraded rendering path: serializes the raw model as JSON, ignoring the
/// template name entirely.
#[derive(Debug, Default, Clone, Copy)]
pub struct FallbackRenderer;

impl TemplateEngine for FallbackRenderer {
    fn render(&self, view: &ViewModel) -> Result<String, RenderError> {
        warn!(
            template = %view.template,
            "rendering through fallback renderer, template engine unavailable"
        );
        Ok(serde_json::to_string(&view.model)?)
    }
}

/// MiniJinja-backed engine: templates loaded from a directory root or from
/// in-memory sources.
pub struct JinjaEngine {
    env: minijinja::Environment<'static>,
}

impl JinjaEngine {
    /// Engine reading templates from a directory root.
    #[must_use]
    pub fn from_dir(root: impl Into<PathBuf>) -> Self {
        let mut env = minijinja::Environment::new();
        env.set_loader(minijinja::path_loader(root.into()));
        Self { env }
    }

    /// Engine holding the given named template sources.
    pub fn from_templates<I, N, S>(templates: I) -> Result<Self, RenderError>
    where
        I: IntoIterator<Item = (N, S)>,
        N: Into<String>,
        S: Into<String>,
    {
        let mut env = minijinja::Environment::new();
        for (name, source) in templates {
            env.add_template_owned(name.into(), source.into())?;
        }
        Ok(Self { env })
    }

    /// Factory producing one directory-backed engine per call.
    #[must_use]
    pub fn dir_factory(root: impl Into<PathBuf>) -> EngineFactory {
        let root = root.into();
        Arc::new(move || Ok(Box::new(JinjaEngine::from_dir(root.clone())) as Box<dyn TemplateEngine>))
    }
}

impl TemplateEngine for JinjaEngine {
    fn render(&self, view: &ViewModel) -> Result<String, RenderError> {
        let template = self.env.get_template(&view.template)?;
        Ok(template.render(&view.model)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn model(pairs: &[(&str, Value)]) -> Model {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_fallback_serializes_model() {
        let view = ViewModel::new(model(&[("name", json!("rex"))]), "pet.html");
        let out = FallbackRenderer.render(&view).expect("render");
        assert_eq!(out, r#"{"name":"rex"}"#);
    }

    #[test]
    fn test_jinja_renders_named_template() {
        let engine =
            JinjaEngine::from_templates([("pet.html", "hello {{ name }}")]).expect("engine");
        let view = ViewModel::new(model(&[("name", json!("rex"))]), "pet.html");
        assert_eq!(engine.render(&view).expect("render"), "hello rex");
    }

    #[test]
    fn test_engine_or_fallback_degrades() {
        let factory: EngineFactory =
            Arc::new(|| Err(RenderError::Construct("engine exploded".into())));
        let engine = engine_or_fallback(&factory);
        let view = ViewModel::new(Model::new(), "missing.html");
        assert_eq!(engine.render(&view).expect("render"), "{}");
    }
}
