//! Full generation run over a set of resolved endpoints

use openapi_parser::OrganizedEndpoint;
use tracing::{debug, info};

use crate::compiler::MockCompiler;
use crate::config::Config;
use crate::evaluator::{Evaluation, MockEvaluator, ValueGenerator};
use crate::expression::MockExpression;
use crate::validator::CollectedErrors;

/// Mock of one response code
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseMock {
    pub code: String,
    pub expression: MockExpression,
    pub evaluation: Evaluation,
}

impl ResponseMock {
    /// Source text written into the mock module
    pub fn source(&self) -> String {
        self.evaluation.to_source()
    }
}

/// Mocks of every response of one endpoint
#[derive(Debug, Clone, PartialEq)]
pub struct EndpointMocks {
    pub endpoint: OrganizedEndpoint,
    pub responses: Vec<ResponseMock>,
}

impl EndpointMocks {
    /// Nullable paths of every JSON response, deduplicated
    pub fn nullable_paths(&self) -> Vec<String> {
        let mut paths: indexmap::IndexSet<String> = indexmap::IndexSet::new();
        for response in &self.endpoint.responses {
            if let Some(json) = response.json() {
                paths.extend(json.nullable_paths.iter().cloned());
            }
        }
        paths.into_iter().collect()
    }

    /// True if any response still needs faker at runtime
    pub fn uses_faker(&self) -> bool {
        self.responses.iter().any(|response| match &response.evaluation {
            Evaluation::Static(_) => false,
            Evaluation::Dynamic(expression) => expression.uses_faker(),
        })
    }
}

/// Result of a full run
#[derive(Debug, Clone, Default)]
pub struct MockRun {
    pub endpoints: Vec<EndpointMocks>,
    /// Example/schema mismatches found while compiling
    pub errors: CollectedErrors,
}

/// Compile (and, unless dynamic, evaluate) every response of `endpoints`
pub fn generate_mocks(endpoints: &[OrganizedEndpoint], config: &Config) -> MockRun {
    generate_mocks_with(endpoints, config, &mut MockEvaluator::new())
}

/// Same as [`generate_mocks`] with a caller-provided evaluator
pub fn generate_mocks_with<G: ValueGenerator>(
    endpoints: &[OrganizedEndpoint],
    config: &Config,
    evaluator: &mut MockEvaluator<G>,
) -> MockRun {
    let mut run = MockRun::default();

    for endpoint in endpoints {
        let context = config.context_for(&endpoint.path, endpoint.method);
        let compiler = MockCompiler::new(&context);

        let responses = endpoint
            .responses
            .iter()
            .map(|response| {
                let expression = compiler.compile_response(response.json(), &mut run.errors);
                let evaluation = if context.dynamic {
                    Evaluation::Dynamic(expression.clone())
                } else {
                    evaluator.evaluate(&expression)
                };

                ResponseMock {
                    code: response.code.clone(),
                    expression,
                    evaluation,
                }
            })
            .collect();

        debug!("Generated mocks for {} {}", endpoint.method, endpoint.path);
        run.endpoints.push(EndpointMocks {
            endpoint: endpoint.clone(),
            responses,
        });
    }

    info!("Generated mock data for {} endpoints", run.endpoints.len());
    run
}
