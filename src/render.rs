use anyhow::anyhow;
use minijinja::Environment;
use serde_json::Value;
use thiserror::Error;

pub const AUTHOR_LIST_TEMPLATE: &str = "authors/list.html";
pub const AUTHOR_DETAILS_TEMPLATE: &str = "authors/details.html";

#[derive(Error, Debug)]
#[error(transparent)]
pub struct RenderError(#[from] pub anyhow::Error);

/// Turns a named template and its data into markup.
pub trait Renderer: Send + Sync + 'static {
    fn render(&self, template: &str, context: &Value) -> Result<String, RenderError>;
}

/// Renders the HTML templates compiled into the binary.
#[derive(Debug)]
pub struct TemplateRenderer {
    env: Environment<'static>,
}

impl TemplateRenderer {
    pub fn new() -> anyhow::Result<Self> {
        let mut env = Environment::new();
        env.add_template("layout.html", include_str!("../templates/layout.html"))?;
        env.add_template(
            AUTHOR_LIST_TEMPLATE,
            include_str!("../templates/authors/list.html"),
        )?;
        env.add_template(
            AUTHOR_DETAILS_TEMPLATE,
            include_str!("../templates/authors/details.html"),
        )?;

        Ok(Self { env })
    }
}

impl Renderer for TemplateRenderer {
    fn render(&self, template: &str, context: &Value) -> Result<String, RenderError> {
        let render = || -> Result<String, minijinja::Error> {
            self.env.get_template(template)?.render(context)
        };

        render().map_err(|err| {
            let err = anyhow!(err).context(format!(r#"Failed to render template "{template}""#));
            RenderError(err)
        })
    }
}
