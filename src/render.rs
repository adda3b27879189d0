use serde::Serialize;
use tera::{Context, Tera};

use crate::error::{QueryRouterError, Result};
use crate::models::{AgentResult, Dispatch, Reply, SearchSnippet, WeatherOutcome};

const PAGE_TEMPLATE: &str = "page.html";
const DISPATCH_TEMPLATE: &str = "dispatch.html";

/// Per-tag values the response fragment is rendered from
#[derive(Debug, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum ResponseView<'a> {
    Weather {
        name: &'a str,
        region: &'a str,
        country: &'a str,
        icon_url: String,
        temperature: String,
        condition: &'a str,
    },
    WeatherUnavailable {
        reason: &'a str,
    },
    Search {
        snippets: &'a [SearchSnippet],
    },
    Chat {
        text: &'a str,
    },
    Failed {
        message: &'a str,
    },
}

impl<'a> From<&'a Dispatch> for ResponseView<'a> {
    fn from(dispatch: &'a Dispatch) -> Self {
        match &dispatch.reply {
            Reply::Answered { result } => match result {
                AgentResult::Weather(WeatherOutcome::Report(report)) => ResponseView::Weather {
                    name: &report.name,
                    region: &report.region,
                    country: &report.country,
                    icon_url: report.icon_url(),
                    temperature: report.temp_c.to_string(),
                    condition: &report.condition,
                },
                AgentResult::Weather(WeatherOutcome::Unavailable { reason }) => {
                    ResponseView::WeatherUnavailable { reason }
                }
                AgentResult::Search(snippets) => ResponseView::Search { snippets },
                AgentResult::Chat(text) => ResponseView::Chat { text },
            },
            Reply::Failed { message } => ResponseView::Failed { message },
        }
    }
}

fn template_error(e: tera::Error) -> QueryRouterError {
    QueryRouterError::Template(e.to_string())
}

/// HTML renderer for the query page. Templates are `.html`, so tera escapes
/// every user and provider value.
pub struct Renderer {
    tera: Tera,
}

impl Renderer {
    pub fn new() -> Result<Self> {
        let mut tera = Tera::default();
        tera.add_raw_templates(vec![
            (PAGE_TEMPLATE, include_str!("../templates/page.html")),
            (DISPATCH_TEMPLATE, include_str!("../templates/dispatch.html")),
        ])
        .map_err(template_error)?;
        Ok(Self { tera })
    }

    /// Full page: title, query box and, when a query was answered, the response
    pub fn page(&self, title: &str, dispatch: Option<&Dispatch>) -> Result<String> {
        let mut context = match dispatch {
            Some(d) => Context::from_serialize(ResponseView::from(d)).map_err(template_error)?,
            None => Context::new(),
        };
        context.insert("title", title);
        context.insert("query", dispatch.map(|d| d.query.as_str()).unwrap_or_default());
        context.insert("answered", &dispatch.is_some());

        self.tera
            .render(PAGE_TEMPLATE, &context)
            .map_err(template_error)
    }

    /// Response fragment for one dispatch, rendered per result tag
    pub fn dispatch(&self, dispatch: &Dispatch) -> Result<String> {
        let context =
            Context::from_serialize(ResponseView::from(dispatch)).map_err(template_error)?;
        self.tera
            .render(DISPATCH_TEMPLATE, &context)
            .map_err(template_error)
    }
}
