//! Sequential execution of the enabled features for one event.

use tracing::{debug, info, instrument, warn};

use crate::core::types::{AggregatedResult, ErrorPolicy, FeatureResult, GuardDecision};
use crate::features::{FeatureContext, Handler};
use crate::registry::{Descriptor, Registry};

/// Run every enabled feature for the event in `(priority, name)` order.
///
/// Results are folded into one [`AggregatedResult`]. The first result with a
/// non-zero exit code stops execution; nothing after it runs. When no feature
/// returns a result the exit code is 0.
#[instrument(skip_all, fields(event = %ctx.event.event_type, session = %ctx.event.session_id))]
pub fn run(registry: &Registry, ctx: &FeatureContext<'_>) -> AggregatedResult {
    let mut aggregated = AggregatedResult::default();
    for descriptor in registry.enabled_for(ctx.event.event_type, ctx.config) {
        let handler = registry.load(descriptor);
        aggregated.ran.push(descriptor.name.to_string());
        let Some(result) = invoke(descriptor, &handler, ctx) else {
            continue;
        };
        if aggregated.absorb(result) {
            info!(
                feature = descriptor.name,
                exit_code = aggregated.exit_code,
                "feature blocked, stopping pipeline"
            );
            break;
        }
    }
    debug!(ran = ?aggregated.ran, exit_code = aggregated.exit_code, "pipeline finished");
    aggregated
}

fn invoke(
    descriptor: &Descriptor,
    handler: &Handler,
    ctx: &FeatureContext<'_>,
) -> Option<FeatureResult> {
    match handler {
        Handler::Tracker(tracker) => tracker.run(ctx),
        Handler::Guard(guard) => {
            let decision = match guard.evaluate(ctx) {
                Ok(decision) => decision,
                Err(err) => on_guard_error(descriptor, &err),
            };
            decision.into_result(descriptor.name)
        }
    }
}

fn on_guard_error(descriptor: &Descriptor, err: &anyhow::Error) -> GuardDecision {
    match descriptor.on_error {
        ErrorPolicy::Proceed => {
            warn!(feature = descriptor.name, err = %format!("{err:#}"), "feature failed, proceeding");
            GuardDecision::Proceed
        }
        ErrorPolicy::Block => {
            warn!(feature = descriptor.name, err = %format!("{err:#}"), "feature failed, blocking");
            GuardDecision::block(format!(
                "{} could not evaluate this action: {err:#}",
                descriptor.name
            ))
        }
    }
}
