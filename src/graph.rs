//! Staged dispatch pipeline.
//!
//! A small state machine: `Classify` fans out through an intent-keyed table to
//! exactly one handler stage, and every handler stage moves unconditionally to
//! `Done`. Adding an intent means adding one stage and one route; the builder
//! refuses a table that leaves an intent unrouted.

use async_trait::async_trait;
use enumset::EnumSet;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::{QueryRouterError, Result};
use crate::handlers::{ChatHandler, Handlers, SearchHandler, WeatherHandler};
use crate::intent::IntentParser;
use crate::models::{AgentResult, Dispatch, Intent, Reply};
use crate::router::{Dispatcher, into_reply};

/// Classify, one handler, Done
const MAX_STEPS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Classify,
    Weather,
    Search,
    Chat,
    Done,
}

impl Stage {
    /// The intent a handler stage serves; `None` for Classify and Done
    pub fn serves(self) -> Option<Intent> {
        match self {
            Stage::Weather => Some(Intent::Weather),
            Stage::Search => Some(Intent::Search),
            Stage::Chat => Some(Intent::Chat),
            Stage::Classify | Stage::Done => None,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Classify => "classify",
            Stage::Weather => "weather",
            Stage::Search => "search",
            Stage::Chat => "chat",
            Stage::Done => "done",
        };
        f.write_str(name)
    }
}

/// Record threaded through the stages of one dispatch
#[derive(Debug, Clone, PartialEq)]
pub struct AgentState {
    pub query: String,
    /// Set by `Classify`
    pub intent: Option<Intent>,
    /// Set by the handler stage
    pub result: Option<Reply>,
}

impl AgentState {
    pub fn new(query: &str) -> Self {
        Self {
            query: query.to_string(),
            intent: None,
            result: None,
        }
    }
}

pub struct GraphBuilder {
    parser: Arc<dyn IntentParser>,
    handlers: Arc<Handlers>,
    routes: Vec<(Intent, Stage)>,
}

impl GraphBuilder {
    pub fn new(parser: Arc<dyn IntentParser>, handlers: Arc<Handlers>) -> Self {
        Self {
            parser,
            handlers,
            routes: Vec::new(),
        }
    }

    /// Add the conditional edge `Classify --intent--> stage`
    pub fn route(mut self, intent: Intent, stage: Stage) -> Self {
        self.routes.push((intent, stage));
        self
    }

    /// Validate the routing table and compile the graph
    pub fn build(self) -> Result<GraphDispatcher> {
        let mut seen: EnumSet<Intent> = EnumSet::empty();
        let mut edges = HashMap::new();

        for (intent, stage) in self.routes {
            if seen.contains(intent) {
                return Err(QueryRouterError::Graph(format!(
                    "intent '{intent}' is routed more than once"
                )));
            }
            if stage.serves() != Some(intent) {
                return Err(QueryRouterError::Graph(format!(
                    "intent '{intent}' is routed to stage '{stage}', which does not serve it"
                )));
            }
            seen.insert(intent);
            edges.insert(intent, stage);
        }

        let missing = EnumSet::<Intent>::all() - seen;
        if !missing.is_empty() {
            let names: Vec<&str> = missing.iter().map(|i| i.label()).collect();
            return Err(QueryRouterError::Graph(format!(
                "no route for intent(s): {}",
                names.join(", ")
            )));
        }

        Ok(GraphDispatcher {
            parser: self.parser,
            handlers: self.handlers,
            edges,
        })
    }
}

pub struct GraphDispatcher {
    parser: Arc<dyn IntentParser>,
    handlers: Arc<Handlers>,
    edges: HashMap<Intent, Stage>,
}

impl GraphDispatcher {
    /// classify -> {weather, search, chat} -> done
    pub fn standard(parser: Arc<dyn IntentParser>, handlers: Arc<Handlers>) -> Result<Self> {
        GraphBuilder::new(parser, handlers)
            .route(Intent::Weather, Stage::Weather)
            .route(Intent::Search, Stage::Search)
            .route(Intent::Chat, Stage::Chat)
            .build()
    }

    pub fn route_for(&self, intent: Intent) -> Option<Stage> {
        self.edges.get(&intent).copied()
    }

    /// Run one stage and return the next
    async fn step(&self, stage: Stage, state: &mut AgentState) -> Stage {
        match stage {
            Stage::Classify => {
                let intent = self.parser.parse(&state.query);
                state.intent = Some(intent);
                self.route_for(intent).unwrap_or(Stage::Done)
            }
            Stage::Weather => {
                let result = self
                    .handlers
                    .handle_weather(&state.query)
                    .await
                    .map(AgentResult::Weather);
                state.result = Some(into_reply(Intent::Weather, result));
                Stage::Done
            }
            Stage::Search => {
                let result = self
                    .handlers
                    .handle_search(&state.query)
                    .await
                    .map(AgentResult::Search);
                state.result = Some(into_reply(Intent::Search, result));
                Stage::Done
            }
            Stage::Chat => {
                let result = self
                    .handlers
                    .handle_chat(&state.query)
                    .await
                    .map(AgentResult::Chat);
                state.result = Some(into_reply(Intent::Chat, result));
                Stage::Done
            }
            Stage::Done => Stage::Done,
        }
    }

    /// Drive a state from `Classify` to `Done`
    pub async fn run(&self, mut state: AgentState) -> AgentState {
        let mut stage = Stage::Classify;
        for _ in 0..MAX_STEPS {
            if stage == Stage::Done {
                break;
            }
            let next = self.step(stage, &mut state).await;
            tracing::debug!("Stage {} -> {}", stage, next);
            stage = next;
        }
        if stage != Stage::Done {
            tracing::error!("Dispatch graph stopped at stage '{}' without finishing", stage);
        }
        state
    }
}

#[async_trait]
impl Dispatcher for GraphDispatcher {
    async fn dispatch(&self, query: &str) -> Dispatch {
        let state = self.run(AgentState::new(query)).await;

        match (state.intent, state.result) {
            (Some(intent), Some(reply)) => Dispatch {
                query: state.query,
                intent,
                reply,
            },
            (intent, _) => Dispatch {
                query: state.query,
                intent: intent.unwrap_or(Intent::Chat),
                reply: Reply::Failed {
                    message: "Dispatch graph finished without a result".to_string(),
                },
            },
        }
    }
}
