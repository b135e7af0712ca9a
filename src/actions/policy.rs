//! `policy.*` actions, wrapping the Feasibility Service (C3) and Robustness Evaluator (C8).

use super::{Action, ActionCost, ActionMetadata, ActionRuntimeKind, SideEffect};
use crate::models::poi::{DateContext, Poi};
use crate::models::policy::Policy;
use crate::models::schedule::DaySchedule;
use crate::planning::feasibility::is_poi_feasible;
use crate::planning::robustness::{evaluate_day_robustness, EvaluationConfig};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

pub struct PolicyValidateFeasibility;

#[derive(Deserialize)]
struct FeasibilityEntry {
    poi: Poi,
    arrival_min: u16,
}

#[async_trait]
impl Action for PolicyValidateFeasibility {
    fn name(&self) -> &'static str {
        "policy.validate_feasibility"
    }

    fn description(&self) -> &'static str {
        "Check each timeline entry against the Feasibility Service and report violations."
    }

    fn metadata(&self) -> ActionMetadata {
        ActionMetadata {
            kind: ActionRuntimeKind::Internal,
            cost: ActionCost::Low,
            side_effect: SideEffect::None,
            preconditions: &[],
            idempotent: true,
            cacheable: true,
        }
    }

    async fn run(&self, input: Value) -> Result<Value, String> {
        #[derive(Deserialize)]
        struct In {
            timeline: Vec<FeasibilityEntry>,
            policy: Policy,
            date_ctx: DateContext,
        }
        let In { timeline, policy, date_ctx } = serde_json::from_value(input).map_err(|e| e.to_string())?;

        let mut violations = Vec::new();
        for entry in &timeline {
            let result = is_poi_feasible(&entry.poi, entry.arrival_min, &policy, date_ctx);
            if !result.feasible {
                violations.push(serde_json::json!({
                    "poi_id": entry.poi.id,
                    "reason": result.reason.map(|r| r.code()),
                }));
            }
        }

        Ok(serde_json::json!({ "pass": violations.is_empty(), "violations": violations }))
    }
}

pub struct PolicyScoreRobustness;

#[async_trait]
impl Action for PolicyScoreRobustness {
    fn name(&self) -> &'static str {
        "policy.score_robustness"
    }

    fn description(&self) -> &'static str {
        "Run the Monte Carlo Robustness Evaluator over a schedule and return a single score plus full metrics."
    }

    fn metadata(&self) -> ActionMetadata {
        ActionMetadata {
            kind: ActionRuntimeKind::Internal,
            cost: ActionCost::Medium,
            side_effect: SideEffect::None,
            preconditions: &[],
            idempotent: true,
            cacheable: true,
        }
    }

    async fn run(&self, input: Value) -> Result<Value, String> {
        #[derive(Deserialize)]
        struct In {
            policy: Policy,
            schedule: DaySchedule,
            day_end_min: u32,
            date_ctx: DateContext,
            pois: std::collections::HashMap<String, Poi>,
            #[serde(default)]
            config: Option<EvaluationConfigWire>,
        }
        #[derive(Deserialize)]
        struct EvaluationConfigWire {
            samples: u32,
            seed: u32,
            on_time_slack_min: f64,
        }

        let In { policy, schedule, day_end_min, date_ctx, pois, config } =
            serde_json::from_value(input).map_err(|e| e.to_string())?;
        let config = config
            .map(|c| EvaluationConfig {
                samples: c.samples,
                seed: c.seed,
                on_time_slack_min: c.on_time_slack_min,
            })
            .unwrap_or_default();

        let report = evaluate_day_robustness(&policy, &schedule, day_end_min, date_ctx, &pois, config);
        Ok(serde_json::json!({ "score": report.on_time_prob, "metrics": report }))
    }
}
